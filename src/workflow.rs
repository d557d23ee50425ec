//! Sheet revision workflow.
//!
//! Sheets move between four states:
//!
//! ```text
//!            submit                 request correction
//!   Draft ----------> ToValidate -----------------------> ToCorrect
//!                      |    ^                                 |
//!              publish |    +------------- edit --------------+
//!                      v
//!                  Published --- edit ---> (fork) new ToValidate sheet
//! ```
//!
//! A published sheet is never edited in place: editing it forks a new sheet
//! whose origin is the published one. The fork is reviewed like any other
//! sheet while the original stays live.
//!
//! [`transition`] is the single place deciding what an action does to a sheet.
//! It has no access to storage; the database layer applies the returned
//! [`Transition`] inside one unit of work.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::SheetStatus;

/// Something a user asks to do with an existing sheet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Send a draft to review.
    Submit,
    /// Replace title, headers and sections.
    Edit,
    /// Replace the attachment list.
    EditAttachments,
    /// A reviewer sends the sheet back with a comment.
    RequestCorrection,
    /// Mark the sheet as featured.
    SetFront,
    /// Approve a sheet for publication.
    Publish,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::Edit => "edit",
            Self::EditAttachments => "edit attachments of",
            Self::RequestCorrection => "request correction on",
            Self::SetFront => "feature",
            Self::Publish => "publish",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What applying an action does to the stored sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The sheet is updated where it is and ends in `to` (possibly its current state).
    InPlace { to: SheetStatus },
    /// The sheet is left untouched and a new `ToValidate` revision is created
    /// with the sheet as its origin.
    Fork,
    /// The sheet is removed. With `cascade_revision`, a pending revision whose
    /// origin is this sheet is removed first.
    Remove { cascade_revision: bool },
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot {action} a sheet in state {from}")]
    InvalidTransition { from: SheetStatus, action: Action },

    /// Approving a revision would have to replace its origin. There is no
    /// agreed behavior for that yet.
    #[error("Publishing a revision of a published sheet is not supported")]
    PromotionUnsupported,
}

/// Status of a freshly created sheet.
pub fn initial_status(submit: bool) -> SheetStatus {
    if submit {
        SheetStatus::ToValidate
    } else {
        SheetStatus::Draft
    }
}

/// Decide what `action` does to a sheet in state `from`.
///
/// `has_origin` tells whether the sheet is a revision of a published sheet.
pub fn transition(
    from: SheetStatus,
    has_origin: bool,
    action: Action,
) -> Result<Transition, WorkflowError> {
    use SheetStatus::*;

    let invalid = WorkflowError::InvalidTransition { from, action };

    match (action, from) {
        (Action::Submit, Draft) => Ok(Transition::InPlace { to: ToValidate }),
        (Action::Submit, _) => Err(invalid),

        (Action::Edit, Draft) => Ok(Transition::InPlace { to: Draft }),
        (Action::Edit, ToValidate | ToCorrect) => Ok(Transition::InPlace { to: ToValidate }),
        (Action::Edit, Published) => Ok(Transition::Fork),

        (Action::EditAttachments | Action::SetFront, status) => {
            Ok(Transition::InPlace { to: status })
        }

        (Action::RequestCorrection, ToValidate) => Ok(Transition::InPlace { to: ToCorrect }),
        (Action::RequestCorrection, _) => Err(invalid),

        (Action::Publish, ToValidate) if has_origin => Err(WorkflowError::PromotionUnsupported),
        (Action::Publish, ToValidate) => Ok(Transition::InPlace { to: Published }),
        (Action::Publish, _) => Err(invalid),

        (Action::Delete, Draft | ToValidate) => Ok(Transition::Remove {
            cascade_revision: false,
        }),
        (Action::Delete, Published | ToCorrect) => Ok(Transition::Remove {
            cascade_revision: true,
        }),
    }
}

/// Whether a stored sheet satisfies the origin invariant: only sheets under
/// review may point at an origin, and published sheets never do.
pub fn is_consistent(status: SheetStatus, has_origin: bool) -> bool {
    !has_origin || matches!(status, SheetStatus::ToValidate | SheetStatus::ToCorrect)
}

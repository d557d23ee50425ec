use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::comment::Comment;

/// A documentation page with a review lifecycle.
///
/// Sheets belong to a [`SubCategory`](super::SubCategory) and own an ordered list
/// of headers (each with its own ordered sections) plus a list of attachments.
///
/// # Revisions
/// A published sheet is never edited in place. Editing it forks a new sheet
/// whose `origin_id` points back at the published one; the fork goes through
/// review while the original stays live. A sheet with an `origin_id` is always
/// `ToValidate` or `ToCorrect`, and a `Published` sheet never has one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    pub id: Uuid,
    pub sub_category_id: Uuid,
    pub title: String,
    /// Derived from the title, unique within the sub-category.
    pub slug: String,
    pub status: SheetStatus,
    /// Featured marker.
    pub front: bool,
    /// The published sheet this revision will replace.
    pub origin_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The review state of a sheet.
///
/// - `Draft`: Saved by its author, not yet submitted for review
/// - `ToValidate`: Awaiting approval
/// - `ToCorrect`: A reviewer requested changes
/// - `Published`: Live
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SheetStatus {
    Draft,
    ToValidate,
    ToCorrect,
    Published,
}

impl SheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::ToValidate => "to_validate",
            Self::ToCorrect => "to_correct",
            Self::Published => "published",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "to_validate" => Some(Self::ToValidate),
            "to_correct" => Some(Self::ToCorrect),
            "published" => Some(Self::Published),
            _ => None,
        }
    }
}

impl std::fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named block within a sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub id: Uuid,
    pub sheet_id: Uuid,
    pub title: String,
    pub position: i64,
    pub sections: Vec<Section>,
}

/// Leaf content unit of a header (markdown).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: Uuid,
    pub header_id: Uuid,
    pub content: String,
    pub position: i64,
}

/// A file reference attached to a sheet ("tools" of the sheet).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub sheet_id: Uuid,
    pub label: String,
    pub url: String,
    pub position: i64,
}

/// A sheet with its full content, used for detail responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetDetail {
    #[serde(flatten)]
    pub sheet: Sheet,
    pub headers: Vec<Header>,
    pub attachments: Vec<Attachment>,
}

/// Input for one header of a sheet, with its sections in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderInput {
    pub title: String,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionInput {
    pub content: String,
}

/// Input for creating a new sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSheetInput {
    pub title: String,
    #[serde(default)]
    pub headers: Vec<HeaderInput>,
    /// Submit for review right away. When false the sheet is saved as a draft.
    #[serde(default = "default_submit")]
    pub submit: bool,
}

fn default_submit() -> bool {
    true
}

/// Input for editing a sheet. The headers replace the existing ones wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditSheetInput {
    pub title: String,
    #[serde(default)]
    pub headers: Vec<HeaderInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentInput {
    pub label: String,
    pub url: String,
}

/// Input for the attachments ("tools") edit. Replaces the existing list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditAttachmentsInput {
    #[serde(default)]
    pub attachments: Vec<AttachmentInput>,
}

impl CreateSheetInput {
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.title, &self.headers)
    }
}

impl EditSheetInput {
    pub fn validate(&self) -> Result<()> {
        validate_content(&self.title, &self.headers)
    }
}

impl EditAttachmentsInput {
    pub fn validate(&self) -> Result<()> {
        for attachment in &self.attachments {
            if attachment.label.trim().is_empty() {
                return Err(Error::Validation("Attachment label is required".into()));
            }
            if attachment.url.trim().is_empty() {
                return Err(Error::Validation("Attachment url is required".into()));
            }
        }
        Ok(())
    }
}

fn validate_content(title: &str, headers: &[HeaderInput]) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Sheet title is required".into()));
    }
    if headers.iter().any(|h| h.title.trim().is_empty()) {
        return Err(Error::Validation("Header title is required".into()));
    }
    Ok(())
}

// ============================================================
// Workflow outcomes
// ============================================================

/// Result of a workflow action that leaves a single sheet in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetOutcome {
    pub sheet: SheetDetail,
    /// Confirmation shown to the user.
    pub message: String,
}

/// Result of editing a sheet.
///
/// When the edited sheet was published, `forked` is true and `sheet` is the
/// new revision rather than the published sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditOutcome {
    pub sheet: SheetDetail,
    pub forked: bool,
    pub message: String,
}

/// Result of a correction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionOutcome {
    pub sheet: Sheet,
    pub comment: Comment,
    pub message: String,
}

/// Result of deleting a sheet. `deleted` lists removed sheets in deletion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutcome {
    pub deleted: Vec<Uuid>,
    pub message: String,
}

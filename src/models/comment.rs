use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reviewer comment on a sheet.
///
/// Posting one against a sheet awaiting validation sends the sheet back to its
/// author for correction. Administrators can later edit or remove comments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub sheet_id: Uuid,
    /// Full name of the reviewer.
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCommentInput {
    pub author: String,
    pub content: String,
}

/// Input for the admin comment edit. All fields are optional for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCommentInput {
    pub author: Option<String>,
    pub content: Option<String>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An uploaded file listed in a sub-category.
///
/// Only the reference to the stored file is kept here; file bytes live
/// wherever the upload layer put them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub sub_category_id: Uuid,
    pub title: String,
    pub filename: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentInput {
    pub title: String,
    pub filename: String,
    pub description: Option<String>,
}

/// Input for updating a document. All fields are optional for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentInput {
    pub title: Option<String>,
    pub filename: Option<String>,
    /// An empty string clears the description.
    pub description: Option<String>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Top-level section of the documentation portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    /// Unique across categories.
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A group of sheets and documents inside a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubCategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    /// Unique within the parent category.
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryInput {
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubCategoryInput {
    pub title: String,
}

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::error::{Error, Result};
use crate::models::*;
use crate::slug;

fn category_from_row(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: parse_uuid(row.get::<_, String>(0)?),
        title: row.get(1)?,
        slug: row.get(2)?,
        created_at: parse_datetime(row.get::<_, String>(3)?),
    })
}

fn sub_category_from_row(row: &Row) -> rusqlite::Result<SubCategory> {
    Ok(SubCategory {
        id: parse_uuid(row.get::<_, String>(0)?),
        category_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        slug: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

pub(super) fn load_sub_category(conn: &Connection, id: Uuid) -> Result<Option<SubCategory>> {
    let sub_category = conn
        .query_row(
            "SELECT id, category_id, title, slug, created_at FROM sub_categories WHERE id = ?",
            [id.to_string()],
            sub_category_from_row,
        )
        .optional()?;
    Ok(sub_category)
}

fn require_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Title is required".into()));
    }
    Ok(())
}

impl Database {
    // ============================================================
    // Category operations
    // ============================================================

    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, title, slug, created_at FROM categories ORDER BY title")?;
        let categories = stmt
            .query_map([], category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(categories)
    }

    pub fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
        let conn = self.conn();
        let category = conn
            .query_row(
                "SELECT id, title, slug, created_at FROM categories WHERE id = ?",
                [id.to_string()],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let conn = self.conn();
        let category = conn
            .query_row(
                "SELECT id, title, slug, created_at FROM categories WHERE slug = ?",
                [slug],
                category_from_row,
            )
            .optional()?;
        Ok(category)
    }

    pub fn create_category(&self, input: CreateCategoryInput) -> Result<Category> {
        require_title(&input.title)?;

        let conn = self.conn();
        let slug = slug::unique_slug(&input.title, |candidate| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM categories WHERE slug = ?)",
                [candidate],
                |row| row.get::<_, bool>(0),
            )
        })?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO categories (id, title, slug, created_at) VALUES (?, ?, ?, ?)",
            (id.to_string(), &input.title, &slug, now.to_rfc3339()),
        )?;

        tracing::info!(category = %id, "Category {} created", slug);

        Ok(Category {
            id,
            title: input.title,
            slug,
            created_at: now,
        })
    }

    /// Delete a category with its sub-categories, sheets and documents.
    pub fn delete_category(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM categories WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    // ============================================================
    // Sub-category operations
    // ============================================================

    pub fn get_sub_categories(&self, category_id: Uuid) -> Result<Vec<SubCategory>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, category_id, title, slug, created_at
             FROM sub_categories WHERE category_id = ? ORDER BY title",
        )?;
        let sub_categories = stmt
            .query_map([category_id.to_string()], sub_category_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sub_categories)
    }

    pub fn get_sub_category(&self, id: Uuid) -> Result<Option<SubCategory>> {
        let conn = self.conn();
        load_sub_category(&conn, id)
    }

    pub fn get_sub_category_by_slugs(
        &self,
        category_slug: &str,
        sub_slug: &str,
    ) -> Result<Option<SubCategory>> {
        let conn = self.conn();
        let sub_category = conn
            .query_row(
                "SELECT s.id, s.category_id, s.title, s.slug, s.created_at
                 FROM sub_categories s JOIN categories c ON c.id = s.category_id
                 WHERE c.slug = ? AND s.slug = ?",
                [category_slug, sub_slug],
                sub_category_from_row,
            )
            .optional()?;
        Ok(sub_category)
    }

    pub fn create_sub_category(
        &self,
        category_id: Uuid,
        input: CreateSubCategoryInput,
    ) -> Result<SubCategory> {
        require_title(&input.title)?;
        self.get_category(category_id)?
            .ok_or(Error::NotFound("Category"))?;

        let conn = self.conn();
        let slug = slug::unique_slug(&input.title, |candidate| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM sub_categories WHERE category_id = ? AND slug = ?)",
                [category_id.to_string().as_str(), candidate],
                |row| row.get::<_, bool>(0),
            )
        })?;
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO sub_categories (id, category_id, title, slug, created_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                category_id.to_string(),
                &input.title,
                &slug,
                now.to_rfc3339(),
            ),
        )?;

        Ok(SubCategory {
            id,
            category_id,
            title: input.title,
            slug,
            created_at: now,
        })
    }
}

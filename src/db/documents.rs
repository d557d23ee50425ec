use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use super::catalog::load_sub_category;
use super::{merge_optional_text, parse_datetime, parse_uuid, Database};
use crate::error::{Error, Result};
use crate::models::*;

fn document_from_row(row: &Row) -> rusqlite::Result<Document> {
    Ok(Document {
        id: parse_uuid(row.get::<_, String>(0)?),
        sub_category_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        filename: row.get(3)?,
        description: row.get(4)?,
        created_at: parse_datetime(row.get::<_, String>(5)?),
        updated_at: parse_datetime(row.get::<_, String>(6)?),
    })
}

fn validate_document(title: &str, filename: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("Document title is required".into()));
    }
    if filename.trim().is_empty() {
        return Err(Error::Validation("Document file is required".into()));
    }
    Ok(())
}

impl Database {
    pub fn get_documents_by_sub_category(&self, sub_category_id: Uuid) -> Result<Vec<Document>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, sub_category_id, title, filename, description, created_at, updated_at
             FROM documents WHERE sub_category_id = ? ORDER BY title",
        )?;
        let documents = stmt
            .query_map([sub_category_id.to_string()], document_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(documents)
    }

    pub fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
        let conn = self.conn();
        let document = conn
            .query_row(
                "SELECT id, sub_category_id, title, filename, description, created_at, updated_at
                 FROM documents WHERE id = ?",
                [id.to_string()],
                document_from_row,
            )
            .optional()?;
        Ok(document)
    }

    pub fn create_document(
        &self,
        sub_category_id: Uuid,
        input: CreateDocumentInput,
    ) -> Result<Document> {
        validate_document(&input.title, &input.filename)?;

        let conn = self.conn();
        load_sub_category(&conn, sub_category_id)?.ok_or(Error::NotFound("Sub-category"))?;

        let id = Uuid::new_v4();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO documents (id, sub_category_id, title, filename, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                sub_category_id.to_string(),
                &input.title,
                &input.filename,
                &input.description,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        tracing::info!(document = %id, "Document {} uploaded", input.title);

        Ok(Document {
            id,
            sub_category_id,
            title: input.title,
            filename: input.filename,
            description: input.description,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn update_document(
        &self,
        id: Uuid,
        input: UpdateDocumentInput,
    ) -> Result<Option<Document>> {
        let Some(existing) = self.get_document(id)? else {
            return Ok(None);
        };

        let title = input.title.unwrap_or(existing.title);
        let filename = input.filename.unwrap_or(existing.filename);
        let description = merge_optional_text(input.description, existing.description);
        validate_document(&title, &filename)?;

        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "UPDATE documents SET title = ?, filename = ?, description = ?, updated_at = ? WHERE id = ?",
            (&title, &filename, &description, now.to_rfc3339(), id.to_string()),
        )?;

        Ok(Some(Document {
            id,
            sub_category_id: existing.sub_category_id,
            title,
            filename,
            description,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_document(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM documents WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}

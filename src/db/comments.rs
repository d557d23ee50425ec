use chrono::Utc;
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use super::{count_rows, parse_datetime, parse_uuid, Database, UnitOfWork};
use crate::error::{Error, Result};
use crate::models::*;

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: parse_uuid(row.get::<_, String>(0)?),
        sheet_id: parse_uuid(row.get::<_, String>(1)?),
        author: row.get(2)?,
        content: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
        updated_at: parse_datetime(row.get::<_, String>(5)?),
    })
}

pub(super) fn insert_comment(
    uow: &UnitOfWork<'_>,
    sheet_id: Uuid,
    input: CreateCommentInput,
) -> Result<Comment> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    uow.execute(
        "INSERT INTO comments (id, sheet_id, author, content, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            sheet_id.to_string(),
            &input.author,
            &input.content,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Comment {
        id,
        sheet_id,
        author: input.author,
        content: input.content,
        created_at: now,
        updated_at: now,
    })
}

impl Database {
    pub fn get_sheet_comments(&self, sheet_id: Uuid) -> Result<Vec<Comment>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, sheet_id, author, content, created_at, updated_at
             FROM comments WHERE sheet_id = ? ORDER BY created_at",
        )?;
        let comments = stmt
            .query_map([sheet_id.to_string()], comment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(comments)
    }

    /// Comments for the moderation index, newest first.
    pub fn get_comments_page(&self, page: u32, per_page: u32) -> Result<Page<Comment>> {
        let conn = self.conn();
        let total = count_rows(&conn, "comments")?;
        let mut stmt = conn.prepare(
            "SELECT id, sheet_id, author, content, created_at, updated_at
             FROM comments ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )?;
        let comments = stmt
            .query_map(
                (per_page as i64, Page::<Comment>::offset(page, per_page) as i64),
                comment_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Page::new(comments, page, per_page, total))
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        let conn = self.conn();
        let comment = conn
            .query_row(
                "SELECT id, sheet_id, author, content, created_at, updated_at
                 FROM comments WHERE id = ?",
                [id.to_string()],
                comment_from_row,
            )
            .optional()?;
        Ok(comment)
    }

    pub fn update_comment(&self, id: Uuid, input: UpdateCommentInput) -> Result<Option<Comment>> {
        let Some(existing) = self.get_comment(id)? else {
            return Ok(None);
        };

        let author = input.author.unwrap_or(existing.author);
        let content = input.content.unwrap_or(existing.content);
        if content.trim().is_empty() {
            return Err(Error::Validation("Comment content is required".into()));
        }
        if author.trim().is_empty() {
            return Err(Error::Validation("Comment author is required".into()));
        }

        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "UPDATE comments SET author = ?, content = ?, updated_at = ? WHERE id = ?",
            (&author, &content, now.to_rfc3339(), id.to_string()),
        )?;

        tracing::info!(comment = %id, "Comment updated");

        Ok(Some(Comment {
            id,
            sheet_id: existing.sheet_id,
            author,
            content,
            created_at: existing.created_at,
            updated_at: now,
        }))
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM comments WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}

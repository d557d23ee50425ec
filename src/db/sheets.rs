//! Sheet storage and the sheet revision workflow.
//!
//! Free functions in this module read through any connection and write
//! through a [`UnitOfWork`]. The `Database` methods at the bottom wrap one
//! workflow action each in a single unit of work.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::catalog::load_sub_category;
use super::comments::insert_comment;
use super::{parse_datetime, parse_uuid, Database, UnitOfWork};
use crate::error::{Error, Result};
use crate::models::*;
use crate::slug;
use crate::workflow::{self, Action, Transition, WorkflowError};

const SHEET_COLUMNS: &str =
    "id, sub_category_id, title, slug, status, front, origin_id, created_at, updated_at";

fn sheet_from_row(row: &Row) -> rusqlite::Result<Sheet> {
    Ok(Sheet {
        id: parse_uuid(row.get::<_, String>(0)?),
        sub_category_id: parse_uuid(row.get::<_, String>(1)?),
        title: row.get(2)?,
        slug: row.get(3)?,
        status: SheetStatus::from_str(&row.get::<_, String>(4)?).unwrap_or(SheetStatus::Draft),
        front: row.get::<_, i32>(5)? != 0,
        origin_id: row.get::<_, Option<String>>(6)?.map(parse_uuid),
        created_at: parse_datetime(row.get::<_, String>(7)?),
        updated_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

// ============================================================
// Reads
// ============================================================

fn load_sheet(conn: &Connection, id: Uuid) -> Result<Option<Sheet>> {
    let sheet = conn
        .query_row(
            &format!("SELECT {SHEET_COLUMNS} FROM sheets WHERE id = ?"),
            [id.to_string()],
            sheet_from_row,
        )
        .optional()?;
    Ok(sheet)
}

/// The pending revision whose origin is `origin_id`, if any.
fn find_by_origin(conn: &Connection, origin_id: Uuid) -> Result<Option<Sheet>> {
    let sheet = conn
        .query_row(
            &format!("SELECT {SHEET_COLUMNS} FROM sheets WHERE origin_id = ?"),
            [origin_id.to_string()],
            sheet_from_row,
        )
        .optional()?;
    Ok(sheet)
}

fn load_headers(conn: &Connection, sheet_id: Uuid) -> Result<Vec<Header>> {
    let mut stmt = conn.prepare(
        "SELECT id, sheet_id, title, position FROM headers WHERE sheet_id = ? ORDER BY position",
    )?;
    let mut headers = stmt
        .query_map([sheet_id.to_string()], |row| {
            Ok(Header {
                id: parse_uuid(row.get::<_, String>(0)?),
                sheet_id: parse_uuid(row.get::<_, String>(1)?),
                title: row.get(2)?,
                position: row.get(3)?,
                sections: Vec::new(),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare(
        "SELECT id, header_id, content, position FROM sections WHERE header_id = ? ORDER BY position",
    )?;
    for header in &mut headers {
        header.sections = stmt
            .query_map([header.id.to_string()], |row| {
                Ok(Section {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    header_id: parse_uuid(row.get::<_, String>(1)?),
                    content: row.get(2)?,
                    position: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
    }

    Ok(headers)
}

fn load_attachments(conn: &Connection, sheet_id: Uuid) -> Result<Vec<Attachment>> {
    let mut stmt = conn.prepare(
        "SELECT id, sheet_id, label, url, position FROM attachments
         WHERE sheet_id = ? ORDER BY position",
    )?;
    let attachments = stmt
        .query_map([sheet_id.to_string()], |row| {
            Ok(Attachment {
                id: parse_uuid(row.get::<_, String>(0)?),
                sheet_id: parse_uuid(row.get::<_, String>(1)?),
                label: row.get(2)?,
                url: row.get(3)?,
                position: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(attachments)
}

fn load_detail(conn: &Connection, sheet: Sheet) -> Result<SheetDetail> {
    let headers = load_headers(conn, sheet.id)?;
    let attachments = load_attachments(conn, sheet.id)?;
    Ok(SheetDetail {
        sheet,
        headers,
        attachments,
    })
}

/// Slug for `title` not used by another sheet of the sub-category. `owner` is
/// the sheet being renamed, whose current slug does not count as taken.
fn unique_sheet_slug(
    conn: &Connection,
    sub_category_id: Uuid,
    title: &str,
    owner: Option<Uuid>,
) -> Result<String> {
    let sub_category_id = sub_category_id.to_string();
    let owner = owner.map(|u| u.to_string());
    let slug = slug::unique_slug(title, |candidate| {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sheets WHERE sub_category_id = ? AND slug = ? AND id IS NOT ?)",
            params![sub_category_id, candidate, owner],
            |row| row.get::<_, bool>(0),
        )
    })?;
    Ok(slug)
}

// ============================================================
// Writes
// ============================================================

fn insert_sheet(uow: &UnitOfWork<'_>, sheet: &Sheet) -> Result<()> {
    if !workflow::is_consistent(sheet.status, sheet.origin_id.is_some()) {
        return Err(Error::IntegrityConflict(format!(
            "a {} sheet cannot be a revision",
            sheet.status
        )));
    }

    uow.execute(
        "INSERT INTO sheets (id, sub_category_id, title, slug, status, front, origin_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            sheet.id.to_string(),
            sheet.sub_category_id.to_string(),
            &sheet.title,
            &sheet.slug,
            sheet.status.as_str(),
            sheet.front as i32,
            sheet.origin_id.map(|u| u.to_string()),
            sheet.created_at.to_rfc3339(),
            sheet.updated_at.to_rfc3339(),
        ),
    )?;
    Ok(())
}

fn update_sheet(uow: &UnitOfWork<'_>, sheet: &Sheet) -> Result<()> {
    uow.execute(
        "UPDATE sheets SET title = ?, slug = ?, status = ?, front = ?, updated_at = ? WHERE id = ?",
        (
            &sheet.title,
            &sheet.slug,
            sheet.status.as_str(),
            sheet.front as i32,
            sheet.updated_at.to_rfc3339(),
            sheet.id.to_string(),
        ),
    )?;
    Ok(())
}

/// Replace every header (and its sections) of a sheet.
fn replace_headers(uow: &UnitOfWork<'_>, sheet_id: Uuid, headers: &[HeaderInput]) -> Result<()> {
    // Sections go with their headers
    uow.execute(
        "DELETE FROM headers WHERE sheet_id = ?",
        [sheet_id.to_string()],
    )?;

    for (position, header) in headers.iter().enumerate() {
        let header_id = Uuid::new_v4();
        uow.execute(
            "INSERT INTO headers (id, sheet_id, title, position) VALUES (?, ?, ?, ?)",
            (
                header_id.to_string(),
                sheet_id.to_string(),
                &header.title,
                position as i64,
            ),
        )?;

        for (position, section) in header.sections.iter().enumerate() {
            uow.execute(
                "INSERT INTO sections (id, header_id, content, position) VALUES (?, ?, ?, ?)",
                (
                    Uuid::new_v4().to_string(),
                    header_id.to_string(),
                    &section.content,
                    position as i64,
                ),
            )?;
        }
    }

    Ok(())
}

fn replace_attachments(
    uow: &UnitOfWork<'_>,
    sheet_id: Uuid,
    attachments: &[AttachmentInput],
) -> Result<()> {
    uow.execute(
        "DELETE FROM attachments WHERE sheet_id = ?",
        [sheet_id.to_string()],
    )?;

    for (position, attachment) in attachments.iter().enumerate() {
        uow.execute(
            "INSERT INTO attachments (id, sheet_id, label, url, position) VALUES (?, ?, ?, ?, ?)",
            (
                Uuid::new_v4().to_string(),
                sheet_id.to_string(),
                &attachment.label,
                &attachment.url,
                position as i64,
            ),
        )?;
    }

    Ok(())
}

fn clear_origin(uow: &UnitOfWork<'_>, sheet_id: Uuid) -> Result<()> {
    uow.execute(
        "UPDATE sheets SET origin_id = NULL WHERE id = ?",
        [sheet_id.to_string()],
    )?;
    Ok(())
}

/// Detach a sheet from its origin, then remove it with its content.
fn remove_sheet(uow: &UnitOfWork<'_>, sheet: &Sheet) -> Result<()> {
    if sheet.origin_id.is_some() {
        clear_origin(uow, sheet.id)?;
    }
    uow.execute("DELETE FROM sheets WHERE id = ?", [sheet.id.to_string()])?;
    Ok(())
}

/// Load a sheet for a workflow action and decide what the action does.
fn plan(uow: &UnitOfWork<'_>, id: Uuid, action: Action) -> Result<(Sheet, Transition)> {
    let sheet = load_sheet(uow, id)?.ok_or(Error::NotFound("Sheet"))?;
    let transition = workflow::transition(sheet.status, sheet.origin_id.is_some(), action)?;
    Ok((sheet, transition))
}

/// Reject a transition the caller has no way to apply.
fn unexpected(sheet: &Sheet, action: Action) -> Error {
    Error::Workflow(WorkflowError::InvalidTransition {
        from: sheet.status,
        action,
    })
}

// ============================================================
// Workflow operations
// ============================================================

impl Database {
    pub fn get_sheet(&self, id: Uuid) -> Result<Option<Sheet>> {
        let conn = self.conn();
        load_sheet(&conn, id)
    }

    pub fn get_sheet_detail(&self, id: Uuid) -> Result<Option<SheetDetail>> {
        let conn = self.conn();
        match load_sheet(&conn, id)? {
            Some(sheet) => Ok(Some(load_detail(&conn, sheet)?)),
            None => Ok(None),
        }
    }

    /// Find a sheet from its public address: category, sub-category and sheet slugs.
    pub fn get_sheet_by_slugs(
        &self,
        category_slug: &str,
        sub_slug: &str,
        sheet_slug: &str,
    ) -> Result<Option<SheetDetail>> {
        let Some(sub_category) = self.get_sub_category_by_slugs(category_slug, sub_slug)? else {
            return Ok(None);
        };

        let conn = self.conn();
        let sheet = conn
            .query_row(
                &format!("SELECT {SHEET_COLUMNS} FROM sheets WHERE sub_category_id = ? AND slug = ?"),
                [sub_category.id.to_string().as_str(), sheet_slug],
                sheet_from_row,
            )
            .optional()?;

        match sheet {
            Some(sheet) => Ok(Some(load_detail(&conn, sheet)?)),
            None => Ok(None),
        }
    }

    pub fn get_sheets_by_sub_category(&self, sub_category_id: Uuid) -> Result<Vec<Sheet>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SHEET_COLUMNS} FROM sheets WHERE sub_category_id = ? ORDER BY front DESC, title"
        ))?;
        let sheets = stmt
            .query_map([sub_category_id.to_string()], sheet_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sheets)
    }

    /// The revision currently staged for a published sheet.
    pub fn get_pending_revision(&self, id: Uuid) -> Result<Option<Sheet>> {
        let conn = self.conn();
        find_by_origin(&conn, id)
    }

    /// Create a sheet with its headers, submitted for review unless `input.submit` is false.
    pub fn create_sheet(&self, sub_category_id: Uuid, input: CreateSheetInput) -> Result<SheetOutcome> {
        input.validate()?;

        let detail = self.unit_of_work(|uow| {
            load_sub_category(uow, sub_category_id)?.ok_or(Error::NotFound("Sub-category"))?;

            let now = Utc::now();
            let sheet = Sheet {
                id: Uuid::new_v4(),
                sub_category_id,
                slug: unique_sheet_slug(uow, sub_category_id, &input.title, None)?,
                title: input.title.clone(),
                status: workflow::initial_status(input.submit),
                front: false,
                origin_id: None,
                created_at: now,
                updated_at: now,
            };

            insert_sheet(uow, &sheet)?;
            replace_headers(uow, sheet.id, &input.headers)?;
            load_detail(uow, sheet)
        })?;

        let message = format!("Sheet \"{}\" has been created", detail.sheet.title);
        tracing::info!(sheet = %detail.sheet.id, status = %detail.sheet.status, "{}", message);
        Ok(SheetOutcome {
            sheet: detail,
            message,
        })
    }

    /// Edit a sheet's title and content.
    ///
    /// Pending sheets are updated in place (`ToCorrect` goes back to
    /// `ToValidate`). A published sheet is left untouched: the edit is stored
    /// as a new revision pointing at it. Only one revision may be pending per
    /// published sheet; a second edit fails with an integrity conflict.
    pub fn edit_sheet(&self, id: Uuid, input: EditSheetInput) -> Result<EditOutcome> {
        input.validate()?;

        let (detail, forked) = self.unit_of_work(|uow| {
            let (mut sheet, transition) = plan(uow, id, Action::Edit)?;
            let now = Utc::now();

            match transition {
                Transition::InPlace { to } => {
                    if sheet.title != input.title {
                        sheet.slug = unique_sheet_slug(
                            uow,
                            sheet.sub_category_id,
                            &input.title,
                            Some(sheet.id),
                        )?;
                        sheet.title = input.title.clone();
                    }
                    sheet.status = to;
                    sheet.updated_at = now;

                    update_sheet(uow, &sheet)?;
                    replace_headers(uow, sheet.id, &input.headers)?;
                    Ok((load_detail(uow, sheet)?, false))
                }
                Transition::Fork => {
                    if let Some(pending) = find_by_origin(uow, sheet.id)? {
                        return Err(Error::IntegrityConflict(format!(
                            "sheet {} already has a pending revision {}",
                            sheet.id, pending.id
                        )));
                    }

                    let revision = Sheet {
                        id: Uuid::new_v4(),
                        sub_category_id: sheet.sub_category_id,
                        slug: unique_sheet_slug(uow, sheet.sub_category_id, &input.title, None)?,
                        title: input.title.clone(),
                        status: SheetStatus::ToValidate,
                        front: false,
                        origin_id: Some(sheet.id),
                        created_at: now,
                        updated_at: now,
                    };

                    insert_sheet(uow, &revision)?;
                    replace_headers(uow, revision.id, &input.headers)?;

                    let attachments: Vec<AttachmentInput> = load_attachments(uow, sheet.id)?
                        .into_iter()
                        .map(|a| AttachmentInput {
                            label: a.label,
                            url: a.url,
                        })
                        .collect();
                    replace_attachments(uow, revision.id, &attachments)?;

                    Ok((load_detail(uow, revision)?, true))
                }
                Transition::Remove { .. } => Err(unexpected(&sheet, Action::Edit)),
            }
        })?;

        let message = if forked {
            format!(
                "Changes to sheet \"{}\" have been submitted for review",
                detail.sheet.title
            )
        } else {
            format!("Sheet \"{}\" has been updated", detail.sheet.title)
        };
        tracing::info!(sheet = %detail.sheet.id, forked, "{}", message);

        Ok(EditOutcome {
            sheet: detail,
            forked,
            message,
        })
    }

    /// Send a draft to review.
    pub fn submit_sheet(&self, id: Uuid) -> Result<SheetOutcome> {
        self.apply_in_place(id, Action::Submit, |title| {
            format!("Sheet \"{title}\" has been submitted for review")
        })
    }

    /// Publish a sheet awaiting validation. Revisions of published sheets are rejected.
    pub fn publish_sheet(&self, id: Uuid) -> Result<SheetOutcome> {
        self.apply_in_place(id, Action::Publish, |title| {
            format!("Sheet \"{title}\" has been published")
        })
    }

    /// Mark a sheet as featured, whatever its state.
    pub fn set_front(&self, id: Uuid) -> Result<SheetOutcome> {
        self.apply_in_place(id, Action::SetFront, |title| {
            format!("Sheet \"{title}\" is now featured")
        })
    }

    fn apply_in_place(
        &self,
        id: Uuid,
        action: Action,
        message: impl FnOnce(&str) -> String,
    ) -> Result<SheetOutcome> {
        let detail = self.unit_of_work(|uow| {
            let (mut sheet, transition) = plan(uow, id, action)?;
            let Transition::InPlace { to } = transition else {
                return Err(unexpected(&sheet, action));
            };

            sheet.status = to;
            if action == Action::SetFront {
                sheet.front = true;
            }
            sheet.updated_at = Utc::now();

            update_sheet(uow, &sheet)?;
            load_detail(uow, sheet)
        })?;

        let message = message(&detail.sheet.title);
        tracing::info!(sheet = %detail.sheet.id, status = %detail.sheet.status, "{}", message);
        Ok(SheetOutcome {
            sheet: detail,
            message,
        })
    }

    /// Replace the attachments of a sheet. Content and status are untouched.
    pub fn edit_attachments(&self, id: Uuid, input: EditAttachmentsInput) -> Result<SheetOutcome> {
        input.validate()?;

        let detail = self.unit_of_work(|uow| {
            let (sheet, transition) = plan(uow, id, Action::EditAttachments)?;
            if !matches!(transition, Transition::InPlace { .. }) {
                return Err(unexpected(&sheet, Action::EditAttachments));
            }

            replace_attachments(uow, sheet.id, &input.attachments)?;
            load_detail(uow, sheet)
        })?;

        let message = format!(
            "Attachments of sheet \"{}\" have been updated",
            detail.sheet.title
        );
        tracing::info!(sheet = %detail.sheet.id, "{}", message);
        Ok(SheetOutcome {
            sheet: detail,
            message,
        })
    }

    /// Post a reviewer comment on a sheet awaiting validation and send it back
    /// for correction. Nothing is stored when the sheet is in any other state.
    pub fn request_correction(&self, id: Uuid, input: CreateCommentInput) -> Result<CorrectionOutcome> {
        if input.content.trim().is_empty() {
            return Err(Error::Validation("Comment content is required".into()));
        }
        if input.author.trim().is_empty() {
            return Err(Error::Validation("Comment author is required".into()));
        }

        let (sheet, comment) = self.unit_of_work(|uow| {
            let (mut sheet, transition) = plan(uow, id, Action::RequestCorrection)?;
            let Transition::InPlace { to } = transition else {
                return Err(unexpected(&sheet, Action::RequestCorrection));
            };

            let comment = insert_comment(uow, sheet.id, input)?;
            sheet.status = to;
            sheet.updated_at = Utc::now();
            update_sheet(uow, &sheet)?;
            Ok((sheet, comment))
        })?;

        let message = format!("Sheet \"{}\" has been sent back for correction", sheet.title);
        tracing::info!(sheet = %sheet.id, comment = %comment.id, "{}", message);
        Ok(CorrectionOutcome {
            sheet,
            comment,
            message,
        })
    }

    /// Delete a sheet.
    ///
    /// Deleting a published sheet (or one sent back for correction) also
    /// deletes its pending revision. Origin links are cleared before any row
    /// is removed, and everything happens in one unit of work.
    pub fn delete_sheet(&self, id: Uuid) -> Result<DeleteOutcome> {
        let (sheet, deleted) = self.unit_of_work(|uow| {
            let (sheet, transition) = plan(uow, id, Action::Delete)?;
            let Transition::Remove { cascade_revision } = transition else {
                return Err(unexpected(&sheet, Action::Delete));
            };

            let mut deleted = Vec::new();
            if cascade_revision {
                if let Some(revision) = find_by_origin(uow, sheet.id)? {
                    remove_sheet(uow, &revision)?;
                    deleted.push(revision.id);
                }
            }
            remove_sheet(uow, &sheet)?;
            deleted.push(sheet.id);

            Ok((sheet, deleted))
        })?;

        let message = format!("Sheet \"{}\" has been deleted", sheet.title);
        tracing::info!(sheet = %sheet.id, removed = deleted.len(), "{}", message);
        Ok(DeleteOutcome { deleted, message })
    }
}

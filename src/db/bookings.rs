use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use super::{count_rows, merge_optional_text, parse_date, parse_datetime, parse_uuid, Database};
use crate::error::{Error, Result};
use crate::models::*;

const BOOKING_COLUMNS: &str =
    "id, booker, resource, start_date, end_date, unit_price, amount, comment, created_at";

fn booking_from_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: parse_uuid(row.get::<_, String>(0)?),
        booker: row.get(1)?,
        resource: row.get(2)?,
        start_date: parse_date(row.get::<_, String>(3)?),
        end_date: parse_date(row.get::<_, String>(4)?),
        unit_price: row.get(5)?,
        amount: row.get(6)?,
        comment: row.get(7)?,
        created_at: parse_datetime(row.get::<_, String>(8)?),
    })
}

/// Check a booking and return its amount.
fn validate_booking(booker: &str, start: NaiveDate, end: NaiveDate, unit_price: i64) -> Result<i64> {
    if booker.trim().is_empty() {
        return Err(Error::Validation("Booker is required".into()));
    }
    if end <= start {
        return Err(Error::Validation(
            "End date must be after the start date".into(),
        ));
    }
    if unit_price < 0 {
        return Err(Error::Validation("Unit price cannot be negative".into()));
    }
    booking_amount(unit_price, start, end)
        .ok_or_else(|| Error::Validation("Amount is too large".into()))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl Database {
    /// Bookings for the moderation index, most recent stays first.
    pub fn get_bookings_page(&self, page: u32, per_page: u32) -> Result<Page<Booking>> {
        let conn = self.conn();
        let total = count_rows(&conn, "bookings")?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY start_date DESC, created_at DESC LIMIT ? OFFSET ?"
        ))?;
        let bookings = stmt
            .query_map(
                (per_page as i64, Page::<Booking>::offset(page, per_page) as i64),
                booking_from_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Page::new(bookings, page, per_page, total))
    }

    pub fn get_booking(&self, id: Uuid) -> Result<Option<Booking>> {
        let conn = self.conn();
        let booking = conn
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"),
                [id.to_string()],
                booking_from_row,
            )
            .optional()?;
        Ok(booking)
    }

    pub fn create_booking(&self, input: CreateBookingInput) -> Result<Booking> {
        let amount = validate_booking(
            &input.booker,
            input.start_date,
            input.end_date,
            input.unit_price,
        )?;

        let conn = self.conn();
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO bookings (id, booker, resource, start_date, end_date, unit_price, amount, comment, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.booker,
                &input.resource,
                format_date(input.start_date),
                format_date(input.end_date),
                input.unit_price,
                amount,
                &input.comment,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Booking {
            id,
            booker: input.booker,
            resource: input.resource,
            start_date: input.start_date,
            end_date: input.end_date,
            unit_price: input.unit_price,
            amount,
            comment: input.comment,
            created_at: now,
        })
    }

    /// Apply an admin edit. The amount is recomputed from the resulting dates and price.
    pub fn update_booking(&self, id: Uuid, input: UpdateBookingInput) -> Result<Option<Booking>> {
        let Some(existing) = self.get_booking(id)? else {
            return Ok(None);
        };

        let booker = input.booker.unwrap_or(existing.booker);
        let resource = input.resource.unwrap_or(existing.resource);
        let start_date = input.start_date.unwrap_or(existing.start_date);
        let end_date = input.end_date.unwrap_or(existing.end_date);
        let unit_price = input.unit_price.unwrap_or(existing.unit_price);
        let comment = merge_optional_text(input.comment, existing.comment);
        let amount = validate_booking(&booker, start_date, end_date, unit_price)?;

        let conn = self.conn();
        conn.execute(
            "UPDATE bookings SET booker = ?, resource = ?, start_date = ?, end_date = ?,
                 unit_price = ?, amount = ?, comment = ?
             WHERE id = ?",
            (
                &booker,
                &resource,
                format_date(start_date),
                format_date(end_date),
                unit_price,
                amount,
                &comment,
                id.to_string(),
            ),
        )?;

        tracing::info!(booking = %id, amount, "Booking updated");

        Ok(Some(Booking {
            id,
            booker,
            resource,
            start_date,
            end_date,
            unit_price,
            amount,
            comment,
            created_at: existing.created_at,
        }))
    }

    pub fn delete_booking(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM bookings WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }
}

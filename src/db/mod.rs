mod bookings;
mod catalog;
mod comments;
mod documents;
mod schema;
mod sheets;
mod unit_of_work;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::error::Result;

pub use unit_of_work::UnitOfWork;

/// Handle to the SQLite store, cheap to clone and shared by request handlers.
///
/// Every sheet workflow operation runs inside a [`UnitOfWork`]; plain CRUD on
/// catalog, documents and admin entities goes through the connection directly.
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn)
    }

    pub fn open_memory() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> anyhow::Result<()> {
        let conn = self.conn();
        schema::run_migrations(&conn)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database lock poisoned")
    }

    /// Run `work` in a single transaction.
    ///
    /// The transaction commits when `work` returns `Ok` and rolls back every
    /// write otherwise. The connection lock is held for the whole duration, so
    /// reads made inside `work` cannot be invalidated by another unit of work.
    pub fn unit_of_work<T>(&self, work: impl FnOnce(&UnitOfWork<'_>) -> Result<T>) -> Result<T> {
        let mut conn = self.conn();
        let uow = UnitOfWork::begin(&mut conn)?;
        match work(&uow) {
            Ok(value) => {
                uow.commit()?;
                Ok(value)
            }
            Err(e) => {
                uow.rollback();
                Err(e)
            }
        }
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_date(s: String) -> NaiveDate {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

/// Partial update of an optional text field: `None` keeps the stored value,
/// an empty string clears it.
fn merge_optional_text(input: Option<String>, existing: Option<String>) -> Option<String> {
    match input {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value),
        None => existing,
    }
}

/// Count rows for paginated listings.
fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })?;
    Ok(count as u64)
}

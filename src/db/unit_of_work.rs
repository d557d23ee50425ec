use std::cell::Cell;
use std::ops::Deref;

use rusqlite::{Connection, Params, Transaction, TransactionBehavior};

use crate::error::Result;

/// Writes of one request, committed together or not at all.
///
/// Reads go through the underlying connection (via `Deref`) and see the
/// writes already staged in this unit of work. Writes must go through
/// [`UnitOfWork::execute`].
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    writes: Cell<usize>,
}

impl<'conn> UnitOfWork<'conn> {
    pub(super) fn begin(conn: &'conn mut Connection) -> Result<Self> {
        // IMMEDIATE takes the write lock up front so checks made before a
        // write still hold when it happens.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(Self {
            tx,
            writes: Cell::new(0),
        })
    }

    /// Stage a write statement, returning the number of affected rows.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let rows = self.tx.execute(sql, params)?;
        self.writes.set(self.writes.get() + 1);
        Ok(rows)
    }

    /// Number of write statements staged so far.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub(super) fn commit(self) -> Result<()> {
        let writes = self.writes.get();
        self.tx.commit()?;
        tracing::debug!(writes, "Unit of work committed");
        Ok(())
    }

    pub(super) fn rollback(self) {
        let writes = self.writes.get();
        match self.tx.rollback() {
            Ok(()) => tracing::debug!(writes, "Unit of work rolled back"),
            Err(e) => tracing::error!("Failed to roll back unit of work: {}", e),
        }
    }
}

impl Deref for UnitOfWork<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.tx
    }
}

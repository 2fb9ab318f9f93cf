//! Explicit transactional scope for sample writes.
//!
//! # Responsibility
//! - Own the SQLite transaction shared by primary and secondary store writes.
//! - Remember whether any step inside the scope failed.
//!
//! # Invariants
//! - The transaction is opened `IMMEDIATE`: the database write lock is held
//!   from `begin` until commit/rollback, so read-then-decide steps (sibling
//!   numbering, alias uniqueness) cannot interleave with another writer.
//! - An aborted unit of work always rolls back, even when `commit` is called.
//! - Dropping a unit of work without committing rolls it back.

use super::{DbError, DbResult};
use log::{debug, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// One atomic unit of work over the sample database.
pub struct UnitOfWork<'conn> {
    tx: Transaction<'conn>,
    aborted: bool,
}

impl<'conn> UnitOfWork<'conn> {
    /// Starts a unit of work holding the database write lock.
    ///
    /// Blocks up to the connection busy timeout while another writer holds
    /// the lock.
    pub fn begin(conn: &'conn mut Connection) -> DbResult<Self> {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        debug!("event=uow_begin module=db status=ok");
        Ok(Self { tx, aborted: false })
    }

    /// Transactional connection handle passed to every store call.
    pub fn conn(&self) -> &Connection {
        &self.tx
    }

    /// Marks the unit of work as failed; it can only be rolled back from now on.
    pub fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Commits all writes, or rolls back and reports
    /// [`DbError::UnitOfWorkAborted`] when a step failed earlier.
    pub fn commit(self) -> DbResult<()> {
        if self.aborted {
            warn!("event=uow_commit module=db status=rejected reason=aborted");
            self.tx.rollback()?;
            return Err(DbError::UnitOfWorkAborted);
        }
        self.tx.commit()?;
        debug!("event=uow_commit module=db status=ok");
        Ok(())
    }

    /// Discards all writes made in this unit of work.
    pub fn rollback(self) -> DbResult<()> {
        self.tx.rollback()?;
        debug!("event=uow_rollback module=db status=ok");
        Ok(())
    }
}

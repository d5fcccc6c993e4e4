//! The ledger store: movements and balances behind one handle.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    db::audit_balance,
    ledger::{Scope, adjust_balance, current_balance},
    movement::{Movement, NewMovement, insert_movement, query_movements},
};

/// The result of committing a movement.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    /// The movement as stored.
    pub movement: Movement,
    /// The balance of the movement's scope right after the commit.
    pub balance: Decimal,
}

/// Durable storage for committed movements and the balance of each scope.
pub trait LedgerStore: Send + Sync {
    /// Insert `movement` and adjust the balance of `scope` as one atomic unit.
    ///
    /// Either both happen or neither does.
    fn commit(&self, scope: &Scope, movement: &NewMovement) -> Result<Commit, Error>;

    /// The movements of `scope` in `[start, end)`, oldest first.
    fn query_movements(&self, scope: &Scope, start: Date, end: Date) -> Result<Vec<Movement>, Error>;

    /// The balance of `scope`.
    fn current_balance(&self, scope: &Scope) -> Result<Decimal, Error>;
}

/// A [LedgerStore] backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    /// Create a new store from the SQLite `connection`.
    ///
    /// The connection must have been initialised with [crate::initialize_db].
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    /// Check that the cached balance of `scope` matches its movements.
    ///
    /// # Errors
    /// Returns [Error::BalanceMismatch] if the two disagree.
    pub fn audit(&self, scope: &Scope) -> Result<Decimal, Error> {
        audit_balance(scope, &*self.lock()?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection.lock().map_err(|_| Error::DatabaseLockError)
    }
}

impl LedgerStore for SqliteLedger {
    fn commit(&self, scope: &Scope, movement: &NewMovement) -> Result<Commit, Error> {
        let mut connection = self.lock()?;
        // IMMEDIATE takes the write lock up front so the balance read-modify-write
        // cannot interleave with another writer on the same file.
        let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let movement = insert_movement(scope, movement, &transaction)?;
        let balance = adjust_balance(scope, movement.kind.signed_cents(movement.amount), &transaction)?;

        transaction.commit()?;

        tracing::info!(
            "Committed movement {} ({} {}) to {scope}, balance is now {balance}",
            movement.id,
            movement.kind,
            movement.amount
        );

        Ok(Commit { movement, balance })
    }

    fn query_movements(&self, scope: &Scope, start: Date, end: Date) -> Result<Vec<Movement>, Error> {
        query_movements(scope, start, end, &*self.lock()?)
    }

    fn current_balance(&self, scope: &Scope) -> Result<Decimal, Error> {
        current_balance(scope, &*self.lock()?)
    }
}

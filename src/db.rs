//! Database initialisation and integrity checks.

use rusqlite::{Connection, Transaction, TransactionBehavior};
use rust_decimal::Decimal;

use crate::{
    Error,
    ledger::{Scope, create_balance_table, current_balance},
    movement::{create_movement_table, sum_movements},
};

/// Create the tables for the domain models if they do not exist.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_movement_table(&transaction)?;
    create_balance_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// Recompute the balance of `scope` from its movements and compare it with the
/// cached balance cell.
///
/// Returns the balance when both agree.
///
/// # Errors
/// Returns [Error::BalanceMismatch] if they disagree, or an SQL error.
pub fn audit_balance(scope: &Scope, connection: &Connection) -> Result<Decimal, Error> {
    let cached = current_balance(scope, connection)?;
    let computed = sum_movements(scope, connection)?;

    if cached != computed {
        tracing::warn!("Balance of {scope} is {cached} but its movements add up to {computed}");
        return Err(Error::BalanceMismatch { cached, computed });
    }

    Ok(cached)
}

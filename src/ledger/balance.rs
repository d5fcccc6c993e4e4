//! Database operations for the per-scope balance cell.

use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::{Error, ledger::Scope};

/// Add `delta_cents` to the balance of `scope` and return the new balance.
///
/// The balance cell is created on first use. Must run in the same SQL
/// transaction as the movement insert it accounts for.
pub fn adjust_balance(scope: &Scope, delta_cents: i64, connection: &Connection) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "INSERT INTO balance (scope, cents) VALUES (?1, ?2)
         ON CONFLICT(scope) DO UPDATE SET cents = cents + excluded.cents
         RETURNING cents",
        (scope, delta_cents),
        |row| row.get(0),
    )?;

    Ok(Decimal::new(cents, 2))
}

/// The balance of `scope`, zero if nothing has been committed yet.
pub fn current_balance(scope: &Scope, connection: &Connection) -> Result<Decimal, Error> {
    let cents: Option<i64> = connection
        .query_row("SELECT cents FROM balance WHERE scope = ?1", (scope,), |row| row.get(0))
        .optional()?;

    Ok(Decimal::new(cents.unwrap_or(0), 2))
}

/// Create the balance table, one row per scope.
pub fn create_balance_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS balance (
            scope TEXT PRIMARY KEY,
            cents INTEGER NOT NULL
        )",
        (),
    )?;

    Ok(())
}

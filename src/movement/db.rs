//! Database operations for the append-only movement table.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    ledger::Scope,
    movement::{Movement, NewMovement},
};

/// Insert a movement and return it with its generated ID.
///
/// This does not touch the balance, callers must adjust the balance in the
/// same SQL transaction. See [crate::ledger::SqliteLedger].
pub fn insert_movement(
    scope: &Scope,
    movement: &NewMovement,
    connection: &Connection,
) -> Result<Movement, Error> {
    let movement = connection
        .prepare(
            "INSERT INTO movement (scope, kind, amount, description, category, occurred_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             RETURNING id, scope, kind, amount, description, category, occurred_at",
        )?
        .query_row(
            (
                scope,
                movement.kind,
                movement.amount,
                movement.resolved_description(),
                movement.resolved_category(),
                movement.occurred_at,
            ),
            map_movement_row,
        )?;

    Ok(movement)
}

/// Retrieve the movements of `scope` that happened in `[start, end)`, oldest first.
pub fn query_movements(
    scope: &Scope,
    start: Date,
    end: Date,
    connection: &Connection,
) -> Result<Vec<Movement>, Error> {
    connection
        .prepare(
            "SELECT id, scope, kind, amount, description, category, occurred_at
             FROM movement
             WHERE scope = ?1 AND occurred_at >= ?2 AND occurred_at < ?3
             ORDER BY id ASC",
        )?
        .query_map((scope, start, end), map_movement_row)?
        .map(|maybe_movement| maybe_movement.map_err(|error| error.into()))
        .collect()
}

/// Income minus expenses over every movement of `scope`.
pub fn sum_movements(scope: &Scope, connection: &Connection) -> Result<Decimal, Error> {
    let cents: i64 = connection.query_row(
        "SELECT COALESCE(SUM(CASE kind WHEN 'income' THEN amount ELSE -amount END), 0)
         FROM movement WHERE scope = ?1",
        (scope,),
        |row| row.get(0),
    )?;

    Ok(Decimal::new(cents, 2))
}

/// Get the total number of movements in the database.
#[cfg(test)]
pub fn count_movements(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM movement;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the movement table in the database.
///
/// Amounts are stored in cents and are always positive.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_movement_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS movement (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            scope TEXT NOT NULL,
            kind TEXT NOT NULL CHECK(kind IN ('income', 'expense')),
            amount INTEGER NOT NULL CHECK(amount > 0),
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            occurred_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_movement_scope_date ON movement(scope, occurred_at);",
    )?;

    Ok(())
}

/// Map a database row to a [Movement].
pub fn map_movement_row(row: &Row) -> Result<Movement, rusqlite::Error> {
    let id = row.get(0)?;
    let scope = row.get(1)?;
    let kind = row.get(2)?;
    let amount = row.get(3)?;
    let description = row.get(4)?;
    let category = row.get(5)?;
    let occurred_at = row.get(6)?;

    Ok(Movement {
        id,
        scope,
        kind,
        amount,
        description,
        category,
        occurred_at,
    })
}

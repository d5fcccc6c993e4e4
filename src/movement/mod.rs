//! Committed income and expense records.
//!
//! This module contains the `Movement` model, the `Kind` and `Amount` value
//! types, and the queries for the append-only movement table.

mod db;
mod domain;

pub use db::{create_movement_table, insert_movement, map_movement_row, query_movements, sum_movements};
pub use domain::{Amount, Kind, Movement, NewMovement};

#[cfg(test)]
pub use db::count_movements;

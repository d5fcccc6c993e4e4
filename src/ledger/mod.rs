//! The ledger store: scopes, balance cells and atomic commits.

mod balance;
mod scope;
mod store;

pub use balance::{adjust_balance, create_balance_table, current_balance};
pub use scope::{Scope, ScopeMode};
pub use store::{Commit, LedgerStore, SqliteLedger};

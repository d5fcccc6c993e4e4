//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    config::LedgerConfig,
    db::initialize,
    ledger::{Scope, SqliteLedger},
    service::LedgerService,
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The entry points of the ledger, shared by every request.
    pub service: Arc<LedgerService>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// movements and balances, then check the shared balance against its
    /// movements. A mismatch is logged and does not stop the server.
    /// Per-conversation scopes are created on their first commit and are not
    /// checked.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, config: LedgerConfig) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let store = SqliteLedger::new(Arc::new(Mutex::new(db_connection)));

        if let Err(error) = store.audit(&Scope::Global) {
            tracing::warn!("Balance audit failed: {error}");
        }

        Ok(Self::from_service(LedgerService::new(Arc::new(store), config)))
    }

    /// Wrap an existing service.
    pub fn from_service(service: LedgerService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

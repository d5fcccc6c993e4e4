//! Caixa is the ledger behind a conversational cash book.
//!
//! Users record money coming in and going out by talking to a chat bot:
//! they pick an action, type the amount and a description, and confirm.
//! Confirmed movements are committed to a SQLite ledger together with the
//! running balance, and monthly reports are aggregated from the movements.
//!
//! This library provides the ledger service and a JSON API for the chat
//! transport.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod api;
mod app_state;
mod config;
mod confirmation;
mod conversation;
mod database_id;
mod db;
mod endpoints;
mod error;
mod ledger;
mod logging;
mod messages;
mod movement;
mod parser;
mod report;
mod routing;
mod service;
mod timezone;

pub use app_state::AppState;
pub use config::{DEFAULT_TIMEZONE, LedgerConfig};
pub use confirmation::RetryPolicy;
pub use conversation::{Action, ConfirmationToken};
pub use db::initialize as initialize_db;
pub use error::{Error, ErrorKind};
pub use ledger::{LedgerStore, Scope, ScopeMode, SqliteLedger};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use parser::InputFormat;
pub use report::{ReportGrouping, ReportSummary};
pub use routing::{add_tracing_layer, build_router};
pub use service::{DecisionOutcome, DecisionReply, LedgerService, TextReply};
pub use timezone::{Clock, get_local_offset};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

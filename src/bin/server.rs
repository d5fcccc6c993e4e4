use std::{
    fs::OpenOptions,
    net::SocketAddr,
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use axum_server::Handle;
use clap::{Parser, ValueEnum};
use rusqlite::Connection;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use caixa_bot::{
    AppState, DEFAULT_TIMEZONE, InputFormat, LedgerConfig, ReportGrouping, RetryPolicy, ScopeMode,
    add_tracing_layer, build_router, get_local_offset, graceful_shutdown,
};

/// The JSON API server for the caixa chat bot.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// The canonical timezone used to date movements, e.g. "America/Sao_Paulo".
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    timezone: String,

    /// Whether all conversations share one ledger.
    #[arg(long, value_enum, default_value_t = ScopeArg::Shared)]
    scope: ScopeArg,

    /// How users type movements.
    #[arg(long, value_enum, default_value_t = FormatArg::AmountFirst)]
    input_format: FormatArg,

    /// How report totals are grouped.
    #[arg(long, value_enum, default_value_t = GroupingArg::Kind)]
    grouping: GroupingArg,

    /// How many times a commit is attempted while the database is busy.
    #[arg(long, default_value_t = 3)]
    commit_attempts: u32,

    /// How long SQLite waits for a lock before reporting the database as busy, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScopeArg {
    Shared,
    PerConversation,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    AmountFirst,
    Delimited,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum GroupingArg {
    Kind,
    Category,
}

impl Args {
    fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            scope_mode: match self.scope {
                ScopeArg::Shared => ScopeMode::Shared,
                ScopeArg::PerConversation => ScopeMode::PerConversation,
            },
            input_format: match self.input_format {
                FormatArg::AmountFirst => InputFormat::AmountFirst,
                FormatArg::Delimited => InputFormat::Delimited,
            },
            report_grouping: match self.grouping {
                GroupingArg::Kind => ReportGrouping::Kind,
                GroupingArg::Category => ReportGrouping::Category,
            },
            local_timezone: self.timezone.clone(),
            retry: RetryPolicy {
                max_attempts: self.commit_attempts.max(1),
                ..RetryPolicy::default()
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();

    let args = Args::parse();

    if get_local_offset(&args.timezone).is_none() {
        tracing::error!("Invalid timezone {}", args.timezone);
        return ExitCode::FAILURE;
    }

    let conn = match open_database(&args) {
        Ok(conn) => conn,
        Err(error) => {
            tracing::error!("Could not open database {}: {error}", args.db_path);
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(conn, args.ledger_config()) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize the app state: {error}");
            return ExitCode::FAILURE;
        }
    };

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {}", addr);

    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn open_database(args: &Args) -> Result<Connection, caixa_bot::Error> {
    let conn = Connection::open(&args.db_path)?;
    conn.busy_timeout(Duration::from_millis(args.busy_timeout_ms))?;

    Ok(conn)
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    let debug_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .map(|log_file| {
            tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(Arc::new(log_file))
                .with_filter(filter::LevelFilter::DEBUG)
        });

    let (debug_log, log_file_error) = match debug_log {
        Ok(layer) => (Some(layer), None),
        Err(error) => (None, Some(error)),
    };

    tracing_subscriber::registry()
        .with(stdout_log)
        .with(debug_log)
        .init();

    if let Some(error) = log_file_error {
        tracing::warn!("Could not open debug.log, logging to stdout only: {error}");
    }
}

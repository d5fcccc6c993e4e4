//! Deployment settings for the ledger.

use crate::{
    confirmation::RetryPolicy, ledger::ScopeMode, parser::InputFormat, report::ReportGrouping,
};

/// The default timezone used to decide what "today" is.
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// The settings that differ between deployments of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Whether conversations share one ledger or each have their own.
    pub scope_mode: ScopeMode,
    /// How users type movements.
    pub input_format: InputFormat,
    /// How report totals are grouped.
    pub report_grouping: ReportGrouping,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
    /// How commits are retried when the database is busy.
    pub retry: RetryPolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            scope_mode: ScopeMode::default(),
            input_format: InputFormat::default(),
            report_grouping: ReportGrouping::default(),
            local_timezone: DEFAULT_TIMEZONE.to_owned(),
            retry: RetryPolicy::default(),
        }
    }
}

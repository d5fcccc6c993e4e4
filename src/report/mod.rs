//! Month reports over the ledger.

mod aggregation;
mod period;

pub use aggregation::{ReportGrouping, ReportLine, ReportSummary, summarize, summarize_scope};
pub use period::Period;

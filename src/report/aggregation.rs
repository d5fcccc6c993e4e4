//! Period reports over committed movements.
//!
//! Sums movements by kind (income/expense totals) or by category, and
//! computes the net result for the period.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    ledger::{LedgerStore, Scope},
    movement::{Kind, Movement},
    report::Period,
};

/// What report totals are keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportGrouping {
    /// One total for income and one for expenses.
    #[default]
    Kind,
    /// One total per category within each kind.
    Category,
}

/// The total of one group in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportLine {
    /// The kind of the movements in this group.
    pub kind: Kind,
    /// The kind label or the category name.
    pub label: String,
    /// The sum of the (positive) amounts in this group.
    pub total: Decimal,
}

/// The aggregated movements of one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// The month the report covers.
    pub period: Period,
    /// How [ReportSummary::totals] is grouped.
    pub grouping: ReportGrouping,
    /// Totals per group, income groups first, then expense groups, each
    /// sorted by label.
    pub totals: Vec<ReportLine>,
    /// The sum of all income in the period.
    pub income: Decimal,
    /// The sum of all expenses in the period.
    pub expense: Decimal,
    /// `income - expense`.
    pub net: Decimal,
}

#[cfg(test)]
impl ReportSummary {
    /// The total for the group `label` of `kind`, zero if there is no such group.
    pub fn total(&self, kind: Kind, label: &str) -> Decimal {
        self.totals
            .iter()
            .find(|line| line.kind == kind && line.label == label)
            .map(|line| line.total)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Aggregate the `movements` that fall in `period`.
///
/// Movements outside the period are ignored. An empty period yields zero
/// totals.
pub fn summarize(period: Period, grouping: ReportGrouping, movements: &[Movement]) -> ReportSummary {
    let mut groups: BTreeMap<(Kind, &str), Decimal> = BTreeMap::new();

    if grouping == ReportGrouping::Kind {
        groups.insert((Kind::Income, Kind::Income.label()), Decimal::ZERO);
        groups.insert((Kind::Expense, Kind::Expense.label()), Decimal::ZERO);
    }

    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;

    for movement in movements.iter().filter(|m| period.contains(m.occurred_at)) {
        let amount = movement.amount.as_decimal();

        match movement.kind {
            Kind::Income => income += amount,
            Kind::Expense => expense += amount,
        }

        let label = match grouping {
            ReportGrouping::Kind => movement.kind.label(),
            ReportGrouping::Category => movement.category.as_str(),
        };

        *groups.entry((movement.kind, label)).or_insert(Decimal::ZERO) += amount;
    }

    let totals = groups
        .into_iter()
        .map(|((kind, label), total)| ReportLine {
            kind,
            label: label.to_owned(),
            total,
        })
        .collect();

    ReportSummary {
        period,
        grouping,
        totals,
        income,
        expense,
        net: income - expense,
    }
}

/// Load the movements of `scope` in `period` from `store` and aggregate them.
pub fn summarize_scope(
    store: &dyn LedgerStore,
    scope: &Scope,
    period: Period,
    grouping: ReportGrouping,
) -> Result<ReportSummary, Error> {
    let movements = store.query_movements(scope, period.start(), period.end())?;
    let summary = summarize(period, grouping, &movements);

    tracing::info!(
        "Report for {scope} in {period}: {} movements, net {}",
        movements.len(),
        summary.net
    );

    Ok(summary)
}

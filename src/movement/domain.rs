//! Core movement domain types.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::MovementId, ledger::Scope};

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    /// Money received ("entrada").
    Income,
    /// Money spent ("saída").
    Expense,
}

impl Kind {
    /// The name used in storage and in confirmation tokens.
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    /// The capitalised, user facing name.
    ///
    /// Also the default description and category of a movement.
    pub fn label(self) -> &'static str {
        match self {
            Kind::Income => "Entrada",
            Kind::Expense => "Saída",
        }
    }

    /// The change to the balance, in cents, caused by a movement of `amount`
    /// with this kind.
    pub fn signed_cents(self, amount: Amount) -> i64 {
        match self {
            Kind::Income => amount.cents(),
            Kind::Expense => -amount.cents(),
        }
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "entrada" => Ok(Kind::Income),
            "expense" | "saida" | "saída" => Ok(Kind::Expense),
            other => Err(format!("unknown movement kind \"{other}\"")),
        }
    }
}

impl ToSql for Kind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Kind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// A positive amount of money with cent precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    /// Create an amount from a decimal value.
    ///
    /// The value is rounded to two decimal places, midpoint away from zero.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidAmount] if the rounded
    /// value is not positive or does not fit in the store's minor units.
    pub fn new(value: Decimal) -> Result<Self, Error> {
        let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let fits = rounded
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|cents| cents.to_i64())
            .is_some();

        if rounded <= Decimal::ZERO || !fits {
            return Err(Error::InvalidAmount(value.to_string()));
        }

        Ok(Self(rounded))
    }

    /// Parse an amount typed by a user.
    ///
    /// Both `.` and `,` are accepted as the decimal separator.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidAmount] if `text` is not a
    /// number or is not positive.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let normalised = text.trim().replace(',', ".");

        let value = Decimal::from_str(&normalised)
            .map_err(|_| Error::InvalidAmount(text.to_owned()))?;

        Self::new(value).map_err(|_| Error::InvalidAmount(text.to_owned()))
    }

    /// Create an amount from a number of cents without validation.
    ///
    /// The caller should ensure `cents` is positive.
    pub fn from_cents_unchecked(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The amount as a decimal value.
    pub fn as_decimal(self) -> Decimal {
        self.0
    }

    /// The amount in minor units.
    pub fn cents(self) -> i64 {
        // Checked in `new`.
        (self.0 * Decimal::ONE_HUNDRED).to_i64().unwrap_or(i64::MAX)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let cents = value.as_i64()?;

        if cents <= 0 {
            return Err(FromSqlError::OutOfRange(cents));
        }

        Ok(Self::from_cents_unchecked(cents))
    }
}

/// One committed income or expense record.
///
/// Movements are never changed or deleted once committed, corrections are
/// new movements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// The ID of the movement, increasing with every commit.
    pub id: MovementId,
    /// The ledger partition the movement belongs to.
    pub scope: Scope,
    /// Whether money came in or went out.
    pub kind: Kind,
    /// How much money moved. Always positive, see [Movement::kind] for the direction.
    pub amount: Amount,
    /// What the movement was for.
    pub description: String,
    /// The category used in reports.
    pub category: String,
    /// When the movement happened.
    pub occurred_at: Date,
}

impl Movement {
    /// Start describing a movement to be committed.
    ///
    /// Shortcut for [NewMovement] for discoverability.
    pub fn build(kind: Kind, amount: Amount, occurred_at: Date, description: &str) -> NewMovement {
        NewMovement {
            kind,
            amount,
            description: description.to_owned(),
            category: None,
            occurred_at,
        }
    }
}

/// A movement that has not been written to the ledger yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMovement {
    /// Whether money came in or went out.
    pub kind: Kind,
    /// How much money moved.
    pub amount: Amount,
    /// What the movement was for.
    ///
    /// An empty description is replaced with [Kind::label] on insert.
    pub description: String,
    /// The report category, defaults to [Kind::label].
    pub category: Option<String>,
    /// When the movement happened.
    pub occurred_at: Date,
}

impl NewMovement {
    /// Set the category for the movement.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    /// The category that will be stored.
    pub fn resolved_category(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category,
            _ => self.kind.label(),
        }
    }

    /// The description that will be stored.
    pub fn resolved_description(&self) -> &str {
        match self.description.trim() {
            "" => self.kind.label(),
            description => description,
        }
    }
}

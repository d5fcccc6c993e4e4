//! The per-conversation pending state.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{movement::Kind, parser::Candidate};

/// An action the user picked from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Record money received.
    Income,
    /// Record money spent.
    Expense,
    /// Pick a month to report on.
    MonthReport,
}

impl Action {
    /// The movement kind this action records, if any.
    pub fn kind(self) -> Option<Kind> {
        match self {
            Action::Income => Some(Kind::Income),
            Action::Expense => Some(Kind::Expense),
            Action::MonthReport => None,
        }
    }
}

/// A single-use token identifying one confirmation prompt.
///
/// Tokens are opaque to the transport: it must echo back exactly the token it
/// was given. A token is only honoured while the tracker still holds the
/// candidate it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfirmationToken(String);

impl ConfirmationToken {
    /// Wrap a token received from the transport.
    pub fn new(token: &str) -> Self {
        Self(token.to_owned())
    }

    /// Issue the token for prompt number `serial` about `candidate`.
    pub(super) fn issue(serial: u64, candidate: &Candidate) -> Self {
        Self(format!(
            "confirm_{serial}_{}_{}_{}",
            candidate.kind, candidate.amount, candidate.description
        ))
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ConfirmationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A candidate waiting for the user's decision, with the token of its prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// The token sent with the confirmation prompt.
    pub token: ConfirmationToken,
    /// The parsed movement.
    pub candidate: Candidate,
}

/// Where a conversation is in its current flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    /// Nothing is pending.
    #[default]
    Idle,
    /// Waiting for the amount and description of a movement of this kind.
    AwaitingInput(Kind),
    /// Waiting for the user to accept or reject a candidate.
    AwaitingConfirmation(PendingConfirmation),
    /// The candidate was accepted and is being written to the ledger.
    Committing(PendingConfirmation),
    /// Waiting for a "MM YYYY" month selection.
    AwaitingMonthSelection,
}

/// What the conversation is waiting for, without the held data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Awaited {
    /// Nothing, the conversation is idle.
    None,
    /// The amount and description of a movement.
    AmountAndDescription,
    /// An accept or reject decision.
    Confirmation,
    /// A month and year for a report.
    MonthSelection,
}

impl ConversationState {
    /// What the conversation is waiting for.
    pub fn awaited(&self) -> Awaited {
        match self {
            ConversationState::Idle => Awaited::None,
            ConversationState::AwaitingInput(_) => Awaited::AmountAndDescription,
            ConversationState::AwaitingConfirmation(_) | ConversationState::Committing(_) => {
                Awaited::Confirmation
            }
            ConversationState::AwaitingMonthSelection => Awaited::MonthSelection,
        }
    }

    /// The candidate held by this state, if any.
    pub fn candidate(&self) -> Option<&Candidate> {
        match self {
            ConversationState::AwaitingConfirmation(pending)
            | ConversationState::Committing(pending) => Some(&pending.candidate),
            _ => None,
        }
    }
}

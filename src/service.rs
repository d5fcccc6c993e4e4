//! The ledger service: the entry points the chat transport calls.
//!
//! Each entry point takes the conversation it came from and returns the reply
//! to show. Flow errors the user can recover from (bad input, stale buttons)
//! become replies, storage failures are returned as errors.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    Error, ErrorKind,
    config::LedgerConfig,
    confirmation::ConfirmationEngine,
    conversation::{Action, ConfirmationToken, ConversationState, PendingTracker, TextOutcome},
    database_id::ConversationId,
    ledger::{LedgerStore, Scope},
    messages,
    movement::Movement,
    report::{Period, ReportSummary, summarize_scope},
    timezone::Clock,
};

/// The reply to a line of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextReply {
    /// The next prompt, with the token to send back if it asks for a confirmation.
    Prompt {
        /// The text to show the user.
        prompt: String,
        /// Set when the prompt asks the user to confirm a movement.
        token: Option<ConfirmationToken>,
    },
    /// The text was not accepted and the conversation is back to idle.
    Error {
        /// What was wrong with the text.
        error: ErrorKind,
        /// The explanation to show the user.
        message: String,
    },
}

/// What a confirmation decision did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    /// The candidate was written to the ledger.
    Committed,
    /// The user rejected the candidate.
    Discarded,
    /// The token was stale, nothing changed.
    AlreadyProcessed,
}

/// The reply to a confirmation decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionReply {
    /// What the decision did.
    pub outcome: DecisionOutcome,
    /// The text to show the user.
    pub message: String,
    /// The stored movement, if the decision committed one.
    pub movement: Option<Movement>,
}

/// Ties the tracker, the confirmation engine and the ledger store together.
pub struct LedgerService {
    config: LedgerConfig,
    clock: Clock,
    store: Arc<dyn LedgerStore>,
    tracker: PendingTracker,
    confirmations: ConfirmationEngine,
}

impl LedgerService {
    /// Create a service over `store` that reads the date from the configured timezone.
    pub fn new(store: Arc<dyn LedgerStore>, config: LedgerConfig) -> Self {
        let clock = Clock::Timezone(config.local_timezone.clone());
        let confirmations = ConfirmationEngine::new(store.clone(), config.retry);

        Self {
            config,
            clock,
            store,
            tracker: PendingTracker::new(),
            confirmations,
        }
    }

    /// Replace the clock used to date movements and pick the current month.
    #[cfg(test)]
    pub(crate) fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// The current state of `conversation`.
    pub fn state(&self, conversation: ConversationId) -> ConversationState {
        self.tracker.state(conversation)
    }

    /// The ledger scope `conversation` reads and writes.
    pub fn scope_for(&self, conversation: ConversationId) -> Scope {
        self.config.scope_mode.scope_for(conversation)
    }

    /// The user picked `action` from the menu.
    ///
    /// Anything pending in the conversation is discarded.
    pub fn on_action_selected(&self, conversation: ConversationId, action: Action) -> String {
        self.tracker.select_action(conversation, action);

        match action.kind() {
            Some(kind) => messages::input_prompt(kind, self.config.input_format),
            None => messages::MONTH_PROMPT.to_owned(),
        }
    }

    /// The user typed `text`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the text completed a month selection and the
    /// report could not be loaded. Input errors are returned as
    /// [TextReply::Error].
    pub fn on_text_received(
        &self,
        conversation: ConversationId,
        text: &str,
    ) -> Result<TextReply, Error> {
        let expected_kind = match self.tracker.state(conversation) {
            ConversationState::AwaitingInput(kind) => Some(kind),
            _ => None,
        };

        match self
            .tracker
            .submit_text(conversation, text, self.config.input_format)
        {
            Ok(TextOutcome::Confirm(pending)) => Ok(TextReply::Prompt {
                prompt: messages::confirmation_prompt(&pending.candidate),
                token: Some(pending.token),
            }),
            Ok(TextOutcome::MonthSelected(period)) => {
                let summary = self.report(conversation, period)?;

                Ok(TextReply::Prompt {
                    prompt: messages::report(&summary),
                    token: None,
                })
            }
            Err(error) => Ok(TextReply::Error {
                error: error.kind(),
                message: messages::error_reply(&error, expected_kind, self.config.input_format),
            }),
        }
    }

    /// The user accepted or rejected the confirmation behind `token`.
    ///
    /// A token that is no longer pending, e.g. a repeated button press, gets
    /// the "already processed" reply and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns the commit error if an accepted candidate could not be stored.
    /// The candidate stays pending and the same token can be sent again.
    pub fn on_confirmation_decision(
        &self,
        conversation: ConversationId,
        token: &ConfirmationToken,
        accepted: bool,
    ) -> Result<DecisionReply, Error> {
        let decision = if accepted {
            let scope = self.scope_for(conversation);

            self.confirmations
                .accept(&self.tracker, conversation, token, &scope, &self.clock)
                .map(|commit| DecisionReply {
                    outcome: DecisionOutcome::Committed,
                    message: messages::committed(&commit),
                    movement: Some(commit.movement),
                })
        } else {
            self.confirmations
                .reject(&self.tracker, conversation, token)
                .map(|_| DecisionReply {
                    outcome: DecisionOutcome::Discarded,
                    message: messages::DISCARDED.to_owned(),
                    movement: None,
                })
        };

        match decision {
            Err(Error::StaleConfirmation) => {
                tracing::info!("Conversation {conversation} sent stale token {token}");

                Ok(DecisionReply {
                    outcome: DecisionOutcome::AlreadyProcessed,
                    message: messages::ALREADY_PROCESSED.to_owned(),
                    movement: None,
                })
            }
            decision => decision,
        }
    }

    /// Report on a month of the conversation's ledger.
    ///
    /// Without a month the current month is used. A month without a year
    /// means the month in the current year.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::InvalidPeriod] if only a year is given or the month is out of range,
    /// - or a store error if the movements could not be loaded.
    pub fn on_report_requested(
        &self,
        conversation: ConversationId,
        month: Option<u8>,
        year: Option<i32>,
    ) -> Result<ReportSummary, Error> {
        let period = match (month, year) {
            (Some(month), Some(year)) => Period::new(month, year)?,
            (Some(month), None) => Period::new(month, self.clock.today()?.year())?,
            (None, None) => Period::containing(self.clock.today()?)?,
            (None, Some(year)) => return Err(Error::InvalidPeriod(format!("??/{year}"))),
        };

        self.report(conversation, period)
    }

    /// The balance of the conversation's ledger.
    ///
    /// # Errors
    ///
    /// Returns a store error if the balance could not be read.
    pub fn on_balance_requested(&self, conversation: ConversationId) -> Result<Decimal, Error> {
        self.store.current_balance(&self.scope_for(conversation))
    }

    /// The user cancelled, drop whatever is pending.
    pub fn on_cancel(&self, conversation: ConversationId) -> String {
        let dropped = self.tracker.cancel(conversation);

        if let Some(candidate) = dropped.candidate()
            && !matches!(dropped, ConversationState::Committing(_))
        {
            self.confirmations.discard(candidate);
        }

        messages::CANCELLED.to_owned()
    }

    fn report(&self, conversation: ConversationId, period: Period) -> Result<ReportSummary, Error> {
        summarize_scope(
            self.store.as_ref(),
            &self.scope_for(conversation),
            period,
            self.config.report_grouping,
        )
    }
}

//! The pending-action tracker: one state machine per conversation.
//!
//! ```text
//! Idle -> AwaitingInput(kind) -> AwaitingConfirmation -> Committing -> Idle
//! Idle -> AwaitingMonthSelection -> Idle
//! ```
//!
//! Selecting an action from any state starts over, discarding whatever was
//! pending.

use std::{
    collections::HashMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use time::OffsetDateTime;

use crate::{
    Error,
    conversation::{Action, ConfirmationToken, ConversationState, PendingConfirmation},
    database_id::ConversationId,
    parser::{Candidate, InputFormat, parse},
    report::Period,
};

/// What a line of text completed.
#[derive(Debug, Clone, PartialEq)]
pub enum TextOutcome {
    /// A movement was parsed and now awaits confirmation.
    Confirm(PendingConfirmation),
    /// A month was selected for a report.
    MonthSelected(Period),
}

/// Holds the pending state of every conversation, in memory only.
#[derive(Debug)]
pub struct PendingTracker {
    conversations: Mutex<HashMap<ConversationId, ConversationState>>,
    next_serial: AtomicU64,
}

impl Default for PendingTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingTracker {
    /// Create a tracker where every conversation is idle.
    ///
    /// Token serials start at the current Unix time in nanoseconds, so a
    /// restarted process never reissues a token handed out before the restart.
    pub fn new() -> Self {
        let seed = u64::try_from(OffsetDateTime::now_utc().unix_timestamp_nanos()).unwrap_or(0);

        Self {
            conversations: Mutex::new(HashMap::new()),
            next_serial: AtomicU64::new(seed),
        }
    }

    /// The current state of `conversation`.
    pub fn state(&self, conversation: ConversationId) -> ConversationState {
        self.lock().get(&conversation).cloned().unwrap_or_default()
    }

    /// Start a new flow, replacing any pending state.
    pub fn select_action(&self, conversation: ConversationId, action: Action) {
        let next = match action.kind() {
            Some(kind) => ConversationState::AwaitingInput(kind),
            None => ConversationState::AwaitingMonthSelection,
        };

        let previous = self.lock().insert(conversation, next);

        if let Some(candidate) = previous.as_ref().and_then(ConversationState::candidate) {
            tracing::info!(
                "Conversation {conversation} selected {action:?}, discarding pending {} of {}",
                candidate.kind,
                candidate.amount
            );
        } else {
            tracing::debug!("Conversation {conversation} selected {action:?}");
        }
    }

    /// Feed a line of user text into the conversation's flow.
    ///
    /// On success the conversation moves on to the confirmation step or, for a
    /// month selection, back to idle. On a parse error the conversation is
    /// reset to idle and the user has to pick the action again.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::InvalidAmount], [Error::WrongFieldCount] or [Error::EmptyField] if the movement could not be parsed,
    /// - [Error::InvalidPeriod] if the month selection could not be parsed,
    /// - or [Error::NothingPending] if the conversation was not waiting for text, in which case its state is unchanged.
    pub fn submit_text(
        &self,
        conversation: ConversationId,
        text: &str,
        format: InputFormat,
    ) -> Result<TextOutcome, Error> {
        let mut conversations = self.lock();

        match conversations.remove(&conversation).unwrap_or_default() {
            ConversationState::AwaitingInput(kind) => {
                let candidate = parse(text, kind, format).inspect_err(|error| {
                    tracing::debug!("Conversation {conversation} sent invalid input: {error}");
                })?;

                let pending = PendingConfirmation {
                    token: self.issue_token(&candidate),
                    candidate,
                };
                conversations.insert(
                    conversation,
                    ConversationState::AwaitingConfirmation(pending.clone()),
                );

                Ok(TextOutcome::Confirm(pending))
            }
            ConversationState::AwaitingMonthSelection => {
                Period::parse(text).map(TextOutcome::MonthSelected)
            }
            ConversationState::Idle => Err(Error::NothingPending),
            state => {
                tracing::debug!(
                    "Conversation {conversation} sent text while awaiting {:?}",
                    state.awaited()
                );
                conversations.insert(conversation, state);
                Err(Error::NothingPending)
            }
        }
    }

    /// Claim the candidate behind `token` for committing.
    ///
    /// Only one caller can claim a given token. The conversation stays in the
    /// committing state until [PendingTracker::finish_commit] or
    /// [PendingTracker::restore] is called.
    ///
    /// # Errors
    ///
    /// Returns [Error::StaleConfirmation] if `token` is not the token held
    /// for the conversation.
    pub fn take_for_commit(
        &self,
        conversation: ConversationId,
        token: &ConfirmationToken,
    ) -> Result<Candidate, Error> {
        let mut conversations = self.lock();

        match conversations.get(&conversation) {
            Some(ConversationState::AwaitingConfirmation(pending)) if &pending.token == token => {
                let pending = pending.clone();
                let candidate = pending.candidate.clone();
                conversations.insert(conversation, ConversationState::Committing(pending));

                Ok(candidate)
            }
            _ => Err(Error::StaleConfirmation),
        }
    }

    /// Mark the commit claimed with `token` as done.
    pub fn finish_commit(&self, conversation: ConversationId, token: &ConfirmationToken) {
        let mut conversations = self.lock();

        if matches!(
            conversations.get(&conversation),
            Some(ConversationState::Committing(pending)) if &pending.token == token
        ) {
            conversations.remove(&conversation);
        }
    }

    /// Put a claimed candidate back so the user can retry the confirmation.
    ///
    /// Does nothing if the user started another flow in the meantime.
    pub fn restore(&self, conversation: ConversationId, token: &ConfirmationToken) {
        let mut conversations = self.lock();

        if let Some(ConversationState::Committing(pending)) = conversations.get(&conversation)
            && &pending.token == token
        {
            let pending = pending.clone();
            conversations.insert(conversation, ConversationState::AwaitingConfirmation(pending));
        }
    }

    /// Drop the candidate behind `token` and return to idle.
    ///
    /// # Errors
    ///
    /// Returns [Error::StaleConfirmation] if `token` is not the token awaiting
    /// a decision, including when it is already being committed.
    pub fn reject(
        &self,
        conversation: ConversationId,
        token: &ConfirmationToken,
    ) -> Result<Candidate, Error> {
        let mut conversations = self.lock();

        match conversations.get(&conversation) {
            Some(ConversationState::AwaitingConfirmation(pending)) if &pending.token == token => {
                let candidate = pending.candidate.clone();
                conversations.remove(&conversation);

                Ok(candidate)
            }
            _ => Err(Error::StaleConfirmation),
        }
    }

    /// Return to idle from any state, returning the state that was dropped.
    ///
    /// A commit already in flight is not affected.
    pub fn cancel(&self, conversation: ConversationId) -> ConversationState {
        let mut conversations = self.lock();

        match conversations.remove(&conversation) {
            Some(committing @ ConversationState::Committing(_)) => {
                conversations.insert(conversation, committing.clone());
                committing
            }
            previous => previous.unwrap_or_default(),
        }
    }

    fn issue_token(&self, candidate: &Candidate) -> ConfirmationToken {
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        ConfirmationToken::issue(serial, candidate)
    }

    // The map is left consistent after every statement, so a panic elsewhere
    // while holding the lock does not corrupt it.
    fn lock(&self) -> MutexGuard<'_, HashMap<ConversationId, ConversationState>> {
        self.conversations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread, time::Duration};

    use crate::{
        Error,
        conversation::{
            Action, Awaited, ConfirmationToken, ConversationState, PendingTracker, TextOutcome,
        },
        movement::{Amount, Kind},
        parser::{Candidate, InputFormat},
        report::Period,
    };

    const CONVERSATION: i64 = 42;

    fn confirm(tracker: &PendingTracker, kind: Action, text: &str) -> ConfirmationToken {
        tracker.select_action(CONVERSATION, kind);
        match tracker.submit_text(CONVERSATION, text, InputFormat::AmountFirst) {
            Ok(TextOutcome::Confirm(pending)) => pending.token,
            other => panic!("want confirmation prompt, got {other:?}"),
        }
    }

    #[test]
    fn new_conversation_is_idle() {
        let tracker = PendingTracker::new();

        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
        assert_eq!(tracker.state(CONVERSATION).awaited(), Awaited::None);
    }

    #[test]
    fn select_action_awaits_input() {
        let tracker = PendingTracker::new();

        tracker.select_action(CONVERSATION, Action::Expense);

        assert_eq!(
            tracker.state(CONVERSATION),
            ConversationState::AwaitingInput(Kind::Expense)
        );
        assert_eq!(tracker.state(CONVERSATION).awaited(), Awaited::AmountAndDescription);
    }

    #[test]
    fn valid_text_awaits_confirmation() {
        let tracker = PendingTracker::new();
        tracker.select_action(CONVERSATION, Action::Income);

        let outcome = tracker.submit_text(CONVERSATION, "100 Venda", InputFormat::AmountFirst);

        let Ok(TextOutcome::Confirm(pending)) = outcome else {
            panic!("want confirmation prompt, got {outcome:?}");
        };
        assert_eq!(
            pending.candidate,
            Candidate {
                kind: Kind::Income,
                amount: Amount::from_cents_unchecked(10_000),
                description: "Venda".to_owned(),
                category: None,
            }
        );
        assert!(pending.token.as_str().contains("income"));
        assert_eq!(
            tracker.state(CONVERSATION),
            ConversationState::AwaitingConfirmation(pending)
        );
    }

    #[test]
    fn invalid_text_resets_to_idle() {
        let tracker = PendingTracker::new();
        tracker.select_action(CONVERSATION, Action::Income);

        let outcome = tracker.submit_text(CONVERSATION, "Venda", InputFormat::AmountFirst);

        assert_eq!(outcome, Err(Error::InvalidAmount("Venda".to_owned())));
        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
    }

    #[test]
    fn text_while_idle_is_nothing_pending() {
        let tracker = PendingTracker::new();

        let outcome = tracker.submit_text(CONVERSATION, "100 Venda", InputFormat::AmountFirst);

        assert_eq!(outcome, Err(Error::NothingPending));
    }

    #[test]
    fn text_while_confirming_keeps_candidate() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");

        let outcome = tracker.submit_text(CONVERSATION, "200 Outra", InputFormat::AmountFirst);

        assert_eq!(outcome, Err(Error::NothingPending));
        assert!(tracker.take_for_commit(CONVERSATION, &token).is_ok());
    }

    #[test]
    fn month_selection_returns_period_and_idles() {
        let tracker = PendingTracker::new();
        tracker.select_action(CONVERSATION, Action::MonthReport);
        assert_eq!(tracker.state(CONVERSATION).awaited(), Awaited::MonthSelection);

        let outcome = tracker.submit_text(CONVERSATION, "12 2025", InputFormat::AmountFirst);

        assert_eq!(outcome, Ok(TextOutcome::MonthSelected(Period::new(12, 2025).unwrap())));
        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
    }

    #[test]
    fn bad_month_selection_idles() {
        let tracker = PendingTracker::new();
        tracker.select_action(CONVERSATION, Action::MonthReport);

        let outcome = tracker.submit_text(CONVERSATION, "dezembro", InputFormat::AmountFirst);

        assert_eq!(outcome, Err(Error::InvalidPeriod("dezembro".to_owned())));
        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
    }

    #[test]
    fn new_action_discards_pending_candidate() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");

        tracker.select_action(CONVERSATION, Action::Expense);

        assert_eq!(
            tracker.state(CONVERSATION),
            ConversationState::AwaitingInput(Kind::Expense)
        );
        assert_eq!(
            tracker.take_for_commit(CONVERSATION, &token),
            Err(Error::StaleConfirmation)
        );
    }

    #[test]
    fn token_can_only_be_claimed_once() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");

        assert!(tracker.take_for_commit(CONVERSATION, &token).is_ok());
        assert_eq!(
            tracker.take_for_commit(CONVERSATION, &token),
            Err(Error::StaleConfirmation)
        );

        tracker.finish_commit(CONVERSATION, &token);

        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
        assert_eq!(
            tracker.take_for_commit(CONVERSATION, &token),
            Err(Error::StaleConfirmation)
        );
    }

    #[test]
    fn identical_candidates_get_different_tokens() {
        let tracker = PendingTracker::new();
        let first = confirm(&tracker, Action::Income, "100 Venda");
        tracker.take_for_commit(CONVERSATION, &first).unwrap();
        tracker.finish_commit(CONVERSATION, &first);

        let second = confirm(&tracker, Action::Income, "100 Venda");

        assert_ne!(first, second);
        assert_eq!(
            tracker.take_for_commit(CONVERSATION, &first),
            Err(Error::StaleConfirmation)
        );
    }

    #[test]
    fn token_from_before_restart_is_stale() {
        let before_restart = PendingTracker::new();
        let old_token = confirm(&before_restart, Action::Income, "100 Venda");
        before_restart.take_for_commit(CONVERSATION, &old_token).unwrap();
        before_restart.finish_commit(CONVERSATION, &old_token);

        thread::sleep(Duration::from_millis(1));
        let after_restart = PendingTracker::new();
        let new_token = confirm(&after_restart, Action::Income, "100 Venda");

        assert_ne!(old_token, new_token);
        assert_eq!(
            after_restart.take_for_commit(CONVERSATION, &old_token),
            Err(Error::StaleConfirmation)
        );
        assert!(matches!(
            after_restart.state(CONVERSATION),
            ConversationState::AwaitingConfirmation(_)
        ));
    }

    #[test]
    fn token_of_other_conversation_is_stale() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");

        assert_eq!(tracker.take_for_commit(7, &token), Err(Error::StaleConfirmation));
        assert_eq!(tracker.reject(7, &token), Err(Error::StaleConfirmation));
    }

    #[test]
    fn restore_allows_retrying_the_same_token() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Expense, "50 Luz");
        tracker.take_for_commit(CONVERSATION, &token).unwrap();

        tracker.restore(CONVERSATION, &token);

        assert_eq!(tracker.state(CONVERSATION).awaited(), Awaited::Confirmation);
        assert!(tracker.take_for_commit(CONVERSATION, &token).is_ok());
    }

    #[test]
    fn restore_does_not_override_new_flow() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Expense, "50 Luz");
        tracker.take_for_commit(CONVERSATION, &token).unwrap();
        tracker.select_action(CONVERSATION, Action::MonthReport);

        tracker.restore(CONVERSATION, &token);

        assert_eq!(tracker.state(CONVERSATION), ConversationState::AwaitingMonthSelection);
    }

    #[test]
    fn reject_discards_candidate() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");

        let rejected = tracker.reject(CONVERSATION, &token).unwrap();

        assert_eq!(rejected.description, "Venda");
        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
        assert_eq!(tracker.reject(CONVERSATION, &token), Err(Error::StaleConfirmation));
    }

    #[test]
    fn reject_loses_to_claimed_commit() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");
        tracker.take_for_commit(CONVERSATION, &token).unwrap();

        assert_eq!(tracker.reject(CONVERSATION, &token), Err(Error::StaleConfirmation));
    }

    #[test]
    fn cancel_keeps_commit_in_flight() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");
        tracker.take_for_commit(CONVERSATION, &token).unwrap();

        let dropped = tracker.cancel(CONVERSATION);

        assert!(matches!(dropped, ConversationState::Committing(_)));
        assert!(matches!(tracker.state(CONVERSATION), ConversationState::Committing(_)));
    }

    #[test]
    fn cancel_drops_pending_candidate() {
        let tracker = PendingTracker::new();
        let token = confirm(&tracker, Action::Income, "100 Venda");

        tracker.cancel(CONVERSATION);

        assert_eq!(tracker.state(CONVERSATION), ConversationState::Idle);
        assert_eq!(
            tracker.take_for_commit(CONVERSATION, &token),
            Err(Error::StaleConfirmation)
        );
    }

    #[test]
    fn conversations_are_independent() {
        let tracker = PendingTracker::new();
        tracker.select_action(1, Action::Income);
        tracker.select_action(2, Action::MonthReport);

        tracker
            .submit_text(1, "10 Pix", InputFormat::AmountFirst)
            .unwrap();

        assert_eq!(tracker.state(1).awaited(), Awaited::Confirmation);
        assert_eq!(tracker.state(2).awaited(), Awaited::MonthSelection);
    }

    #[test]
    fn concurrent_claims_have_one_winner() {
        let tracker = Arc::new(PendingTracker::new());
        let token = confirm(&tracker, Action::Income, "100 Venda");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let tracker = tracker.clone();
                let token = token.clone();
                thread::spawn(move || tracker.take_for_commit(CONVERSATION, &token).is_ok())
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}

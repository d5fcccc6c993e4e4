//! The confirmation engine: turns an accepted candidate into a committed movement.
//!
//! A commit is claimed from the [PendingTracker] with the confirmation token
//! first, so a token delivered twice commits at most once. Transient store
//! errors are retried with exponential backoff. When the commit finally fails
//! the candidate is handed back to the tracker and the user can press confirm
//! again.

use std::{sync::Arc, thread, time::Duration};

use time::Date;

use crate::{
    Error,
    conversation::{ConfirmationToken, PendingTracker},
    database_id::ConversationId,
    ledger::{Commit, LedgerStore, Scope},
    movement::Movement,
    parser::Candidate,
    timezone::Clock,
};

/// How often and how patiently a commit is retried on store contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// The total number of attempts, including the first.
    pub max_attempts: u32,
    /// The wait before the second attempt, doubled for every attempt after it.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(25),
        }
    }
}

impl RetryPolicy {
    /// The wait after failed attempt number `attempt` (starting at 1).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }
}

/// Commits and discards candidates.
#[derive(Clone)]
pub struct ConfirmationEngine {
    store: Arc<dyn LedgerStore>,
    retry: RetryPolicy,
}

impl ConfirmationEngine {
    /// Create an engine writing to `store`.
    pub fn new(store: Arc<dyn LedgerStore>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Accept the candidate behind `token` and commit it, dated today
    /// according to `clock`.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::StaleConfirmation] if `token` is not the token held for the conversation,
    /// - [Error::InvalidTimezone] if `clock` cannot tell the date,
    /// - or the commit error, see [ConfirmationEngine::commit]. The candidate is then restored and the same token may be used again.
    pub fn accept(
        &self,
        tracker: &PendingTracker,
        conversation: ConversationId,
        token: &ConfirmationToken,
        scope: &Scope,
        clock: &Clock,
    ) -> Result<Commit, Error> {
        let candidate = tracker.take_for_commit(conversation, token)?;

        let result = clock
            .today()
            .and_then(|occurred_at| self.commit(scope, &candidate, occurred_at));

        match result {
            Ok(commit) => {
                tracker.finish_commit(conversation, token);
                Ok(commit)
            }
            Err(error) => {
                tracing::error!("Could not commit for conversation {conversation}: {error}");
                tracker.restore(conversation, token);
                Err(error)
            }
        }
    }

    /// Reject the candidate behind `token`.
    ///
    /// # Errors
    ///
    /// Returns [Error::StaleConfirmation] if `token` is not the token
    /// awaiting a decision for the conversation.
    pub fn reject(
        &self,
        tracker: &PendingTracker,
        conversation: ConversationId,
        token: &ConfirmationToken,
    ) -> Result<Candidate, Error> {
        let candidate = tracker.reject(conversation, token)?;
        self.discard(&candidate);

        Ok(candidate)
    }

    /// Write `candidate` to the ledger as a movement dated `occurred_at`.
    ///
    /// # Errors
    ///
    /// This function will return a:
    /// - [Error::StorageFatal] if the store stayed busy for every attempt,
    /// - or any non-transient store error, without retrying.
    pub fn commit(
        &self,
        scope: &Scope,
        candidate: &Candidate,
        occurred_at: Date,
    ) -> Result<Commit, Error> {
        let movement = Movement::build(
            candidate.kind,
            candidate.amount,
            occurred_at,
            &candidate.description,
        )
        .category(candidate.category.clone());

        let mut attempt = 1;

        loop {
            match self.store.commit(scope, &movement) {
                Ok(commit) => return Ok(commit),
                Err(error) if error.is_transient() && attempt < self.retry.max_attempts => {
                    let backoff = self.retry.backoff(attempt);
                    tracing::warn!(
                        "Commit attempt {attempt} of {} failed: {error}, retrying in {backoff:?}",
                        self.retry.max_attempts
                    );
                    thread::sleep(backoff);
                    attempt += 1;
                }
                Err(error) if error.is_transient() => {
                    return Err(Error::StorageFatal {
                        attempts: attempt,
                        reason: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Drop `candidate` without touching the ledger.
    pub fn discard(&self, candidate: &Candidate) {
        tracing::info!(
            "Discarded {} of {} ({})",
            candidate.kind,
            candidate.amount,
            candidate.description
        );
    }
}

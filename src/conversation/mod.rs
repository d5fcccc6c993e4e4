//! Per-conversation pending state.
//!
//! Each conversation holds at most one pending request: the action it is
//! waiting for and, once parsed, the candidate movement awaiting
//! confirmation. Nothing here is persisted, a restart drops every pending
//! request and users simply pick the action again.

mod state;
mod tracker;

pub use state::{Action, Awaited, ConfirmationToken, ConversationState, PendingConfirmation};
pub use tracker::{PendingTracker, TextOutcome};

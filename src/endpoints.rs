//! The API endpoints URIs.
//!
//! Every route is scoped to the conversation in its `{conversation_id}` parameter.

/// The route for selecting a menu action.
pub const ACTION: &str = "/api/conversations/{conversation_id}/action";
/// The route for sending a line of text.
pub const TEXT: &str = "/api/conversations/{conversation_id}/text";
/// The route for accepting or rejecting a confirmation.
pub const DECISION: &str = "/api/conversations/{conversation_id}/decision";
/// The route for cancelling the pending action.
pub const CANCEL: &str = "/api/conversations/{conversation_id}/cancel";
/// The route for a month report.
pub const REPORT: &str = "/api/conversations/{conversation_id}/report";
/// The route for the current balance.
pub const BALANCE: &str = "/api/conversations/{conversation_id}/balance";

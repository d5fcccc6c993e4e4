//! Identifier type definitions.

/// Alias for the integer type used for movement IDs in the database.
pub type MovementId = i64;

/// Identifies one conversation (one chat with one user) with the bot.
pub type ConversationId = i64;

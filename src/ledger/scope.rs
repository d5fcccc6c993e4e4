//! Ledger partitions.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::database_id::ConversationId;

/// The balance/ledger partition a movement belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// One ledger shared by every conversation.
    Global,
    /// A ledger private to one conversation.
    Conversation(ConversationId),
}

impl Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Global => write!(f, "global"),
            Scope::Conversation(id) => write!(f, "conversation:{id}"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "global" {
            return Ok(Scope::Global);
        }

        s.strip_prefix("conversation:")
            .and_then(|id| id.parse().ok())
            .map(Scope::Conversation)
            .ok_or_else(|| format!("invalid scope key \"{s}\""))
    }
}

impl ToSql for Scope {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_string()))
    }
}

impl FromSql for Scope {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: String| FromSqlError::Other(error.into()))
    }
}

/// How conversations are mapped onto ledger scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeMode {
    /// Every conversation writes to the [Scope::Global] ledger.
    #[default]
    Shared,
    /// Every conversation has its own ledger.
    PerConversation,
}

impl ScopeMode {
    /// The scope that `conversation` reads and writes.
    pub fn scope_for(self, conversation: ConversationId) -> Scope {
        match self {
            ScopeMode::Shared => Scope::Global,
            ScopeMode::PerConversation => Scope::Conversation(conversation),
        }
    }
}

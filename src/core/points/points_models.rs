// Domain models for the points system.
//
// These mirror the three persisted collections: users, transactions and
// activities. Nothing here knows about Discord or SQLite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A tracked Discord user.
///
/// Users are keyed globally by their Discord id (not per guild), so points
/// follow a member across every server the bot is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub discord_id: String,
    pub points: i64,
    /// Stored for schema compatibility; always the default of 1 today.
    pub level: i64,
    pub recorded_msgs: i64,
    /// RFC 3339 timestamp of the last tracked message.
    pub last_msg: Option<String>,
}

#[cfg(test)]
impl User {
    pub fn new(discord_id: impl Into<String>) -> Self {
        Self {
            discord_id: discord_id.into(),
            points: 0,
            level: 1,
            recorded_msgs: 0,
            last_msg: None,
        }
    }
}

/// A point change kept for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub user_id: String,
    pub delta_points: i64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Something notable the bot did (a finished trivia game, an AI answer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub kind: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Activity kinds written by the bot.
pub mod activity_kind {
    pub const TRIVIA_GAME: &str = "trivia_game";
    pub const AI_QUESTION: &str = "ai_question";
}

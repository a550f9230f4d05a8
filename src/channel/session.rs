use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use url::Url;
use uuid::Uuid;

/// Identifies one connection attempt; a reconnect always gets a new id
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Time-ordered (UUIDv7) id
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection status of a session.
///
/// `Connecting -> Open -> {Closed, Errored}`; frames are only applied while
/// `Open`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum SessionStatus {
    Connecting,
    Open,
    Closed,
    Errored(String),
}

impl SessionStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, SessionStatus::Open)
    }

    /// Closed and errored sessions never reopen
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Closed | SessionStatus::Errored(_))
    }
}

/// One logical subscription to a channel
#[derive(Clone, Debug, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub channel: String,
    pub url: Url,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    /// Set when the session reaches `Open`
    pub opened_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(channel: &str, url: Url) -> Self {
        Self {
            id: SessionId::new(),
            channel: channel.to_string(),
            url,
            status: SessionStatus::Connecting,
            created_at: Utc::now(),
            opened_at: None,
        }
    }

    /// Move to `next`, refusing transitions out of a terminal state or back
    /// to `Connecting`. Returns whether the status changed.
    pub fn transition(&mut self, next: SessionStatus) -> bool {
        if self.status.is_terminal() || next == SessionStatus::Connecting {
            return false;
        }
        if self.status == next {
            return false;
        }
        if next.is_open() {
            self.opened_at = Some(Utc::now());
        }
        self.status = next;
        true
    }
}

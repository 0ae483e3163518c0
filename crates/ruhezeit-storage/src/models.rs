use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Milliseconds in one minute, the unit sessions are planned in
const MILLIS_PER_MINUTE: i64 = 60 * 1000;

/// A timed focus session
///
/// Timestamps are Unix milliseconds. `end` stays empty while the session is
/// active; a record with `end` set is the most recently archived session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FocusSession {
    pub start: i64,
    /// Planned duration in minutes
    pub minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i64>,
    /// Number of domains blocked for this session
    pub blocked: usize,
    pub tabs_used: u32,
    /// Dynamic rule IDs installed for this session, one per blocked domain
    pub rule_ids: Vec<u32>,
}

impl FocusSession {
    /// Create an active session that owns the given rule IDs
    #[must_use]
    pub fn new(start: i64, minutes: u32, rule_ids: Vec<u32>) -> Self {
        Self {
            start,
            minutes,
            end: None,
            blocked: rule_ids.len(),
            tabs_used: 0,
            rule_ids,
        }
    }

    /// Check if the session has not been stopped yet
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.end.is_none()
    }

    /// When the session is planned to finish
    #[must_use]
    pub fn planned_end(&self) -> i64 {
        self.start + i64::from(self.minutes) * MILLIS_PER_MINUTE
    }

    /// Actual duration in milliseconds, available once the session ended
    #[must_use]
    pub fn duration_millis(&self) -> Option<i64> {
        self.end.map(|end| end - self.start)
    }
}

/// Archived summary of one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub session: FocusSession,
    pub summary: String,
    /// Creation timestamp (Unix milliseconds), also the deletion key
    pub created: i64,
}

/// Names of the AI capabilities a token can be stored for
pub const TOKEN_NAMES: [&str; 4] = ["prompt", "summarizer", "writer", "translator"];

/// Credentials for the AI capability family
///
/// Values are opaque; only presence matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiTokens {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summarizer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub writer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
}

impl AiTokens {
    /// Get a token by capability name; empty strings count as absent
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "prompt" => self.prompt.as_deref(),
            "summarizer" => self.summarizer.as_deref(),
            "writer" => self.writer.as_deref(),
            "translator" => self.translator.as_deref(),
            _ => None,
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }

    /// Set or clear a token by capability name
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a known capability
    pub fn set(&mut self, name: &str, value: Option<String>) -> Result<()> {
        let value = value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        match name {
            "prompt" => self.prompt = value,
            "summarizer" => self.summarizer = value,
            "writer" => self.writer = value,
            "translator" => self.translator = value,
            _ => anyhow::bail!("Unknown token name: {name}"),
        }
        Ok(())
    }

    /// Check if no token is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        TOKEN_NAMES.iter().all(|name| self.get(name).is_none())
    }
}

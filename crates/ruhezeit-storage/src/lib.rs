pub mod db;
pub mod kv;
pub mod migrations;
pub mod models;
pub mod session_store;

pub use db::Database;
pub use kv::{KeyValueStore, MemoryStore};
pub use models::{AiTokens, FocusSession, SummaryRecord, TOKEN_NAMES};
pub use session_store::{SessionStore, FOCUS_SESSION_KEY, SUMMARIES_KEY, TOKENS_KEY};

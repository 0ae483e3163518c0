//! Durable focus-session record and summary archive.
//!
//! Two logical keys: the current/last session and a newest-first archive of
//! summary records. Archive mutations read and rewrite the whole array under
//! an in-process lock; writers in other processes are not guarded.

use anyhow::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::kv::KeyValueStore;
use crate::models::{AiTokens, FocusSession, SummaryRecord};

/// Key holding the current or most recently ended session
pub const FOCUS_SESSION_KEY: &str = "ruhezeit_focus_session";
/// Key holding the summary archive array
pub const SUMMARIES_KEY: &str = "ruhezeit_session_summaries";
/// Key holding the AI capability token map
pub const TOKENS_KEY: &str = "ruhezeit_tokens";

#[derive(Clone)]
pub struct SessionStore {
    kv: Arc<dyn KeyValueStore>,
    archive_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            archive_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Get the underlying key-value store
    #[must_use]
    pub fn kv(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.kv)
    }

    /// Load the persisted session record, which may already have ended
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn load_session(&self) -> Result<Option<FocusSession>> {
        let Some(value) = self.kv.get(FOCUS_SESSION_KEY).await? else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(None);
        }
        match serde_json::from_value(value) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                log::warn!("Ignoring malformed stored focus session: {e}");
                Ok(None)
            }
        }
    }

    /// Persist the session record
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written
    pub async fn save_session(&self, session: &FocusSession) -> Result<()> {
        let value = serde_json::to_value(session)?;
        self.kv
            .set(FOCUS_SESSION_KEY, value)
            .await
            .context("Failed to persist focus session")
    }

    /// Get all archived summaries, newest first
    ///
    /// Entries that no longer parse are skipped, not dropped from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn summaries(&self) -> Result<Vec<SummaryRecord>> {
        let entries = self.raw_archive().await?;
        Ok(entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    log::warn!("Skipping malformed summary record: {e}");
                    None
                }
            })
            .collect())
    }

    /// Prepend a summary record to the archive
    ///
    /// No deduplication: two records for the same session are both kept.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written
    pub async fn append_summary(&self, record: &SummaryRecord) -> Result<()> {
        let _guard = self.archive_lock.lock().await;
        let mut entries = self.raw_archive().await?;
        entries.insert(0, serde_json::to_value(record)?);
        self.kv
            .set(SUMMARIES_KEY, Value::Array(entries))
            .await
            .context("Failed to write summary archive")?;
        log::debug!("Archived summary created at {}", record.created);
        Ok(())
    }

    /// Remove every archive entry whose creation timestamp equals `created`
    ///
    /// Returns the number of removed entries.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or written
    pub async fn delete_summary(&self, created: i64) -> Result<usize> {
        let _guard = self.archive_lock.lock().await;
        let entries = self.raw_archive().await?;
        let before = entries.len();
        let kept: Vec<Value> = entries
            .into_iter()
            .filter(|entry| entry.get("created").and_then(Value::as_i64) != Some(created))
            .collect();
        let removed = before - kept.len();
        self.kv
            .set(SUMMARIES_KEY, Value::Array(kept))
            .await
            .context("Failed to write summary archive")?;
        log::info!("Deleted {removed} summary record(s) created at {created}");
        Ok(removed)
    }

    /// Load the AI token map; missing or malformed maps are empty
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn tokens(&self) -> Result<AiTokens> {
        let Some(value) = self.kv.get(TOKENS_KEY).await? else {
            return Ok(AiTokens::default());
        };
        Ok(serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed token map: {e}");
            AiTokens::default()
        }))
    }

    /// Replace the AI token map
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written
    pub async fn save_tokens(&self, tokens: &AiTokens) -> Result<()> {
        self.kv
            .set(TOKENS_KEY, serde_json::to_value(tokens)?)
            .await
            .context("Failed to write token map")
    }

    /// Remove the AI token map entirely
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written
    pub async fn clear_tokens(&self) -> Result<()> {
        self.kv.remove(TOKENS_KEY).await
    }

    async fn raw_archive(&self) -> Result<Vec<Value>> {
        match self.kv.get(SUMMARIES_KEY).await? {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use serde_json::json;

    fn store() -> (SessionStore, Arc<MemoryStore>) {
        let kv = Arc::new(MemoryStore::new());
        (SessionStore::new(kv.clone()), kv)
    }

    fn record(start: i64, created: i64) -> SummaryRecord {
        SummaryRecord {
            session: FocusSession::new(start, 25, vec![]),
            summary: format!("summary {created}"),
            created,
        }
    }

    #[tokio::test]
    async fn test_session_round_trip_through_storage() {
        let (store, _) = store();
        assert_eq!(store.load_session().await.unwrap(), None);

        let session = FocusSession::new(100, 25, vec![1100]);
        store.save_session(&session).await.unwrap();
        assert_eq!(store.load_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn test_malformed_session_reads_as_none() {
        let (store, kv) = store();
        kv.set(FOCUS_SESSION_KEY, json!("garbage")).await.unwrap();
        assert_eq!(store.load_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_append_is_newest_first() {
        let (store, _) = store();
        store.append_summary(&record(1, 10)).await.unwrap();
        store.append_summary(&record(2, 20)).await.unwrap();

        let created: Vec<i64> = store
            .summaries()
            .await
            .unwrap()
            .iter()
            .map(|r| r.created)
            .collect();
        assert_eq!(created, vec![20, 10]);
    }

    #[tokio::test]
    async fn test_append_keeps_duplicates_for_same_session() {
        let (store, _) = store();
        store.append_summary(&record(1, 10)).await.unwrap();
        store.append_summary(&record(1, 11)).await.unwrap();
        assert_eq!(store.summaries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_timestamp() {
        let (store, _) = store();
        store.append_summary(&record(1, 10)).await.unwrap();
        store.append_summary(&record(1, 20)).await.unwrap();
        store.append_summary(&record(2, 20)).await.unwrap();
        store.append_summary(&record(3, 30)).await.unwrap();

        let removed = store.delete_summary(20).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = store.summaries().await.unwrap();
        let created: Vec<i64> = remaining.iter().map(|r| r.created).collect();
        assert_eq!(created, vec![30, 10]);
        assert_eq!(remaining[1].session.start, 1);
    }

    #[tokio::test]
    async fn test_delete_leaves_malformed_entries_untouched() {
        let (store, kv) = store();
        kv.set(SUMMARIES_KEY, json!([{ "created": 5 }, { "unexpected": true }]))
            .await
            .unwrap();
        assert!(store.summaries().await.unwrap().is_empty());

        store.delete_summary(5).await.unwrap();
        assert_eq!(
            kv.get(SUMMARIES_KEY).await.unwrap(),
            Some(json!([{ "unexpected": true }]))
        );
    }

    #[tokio::test]
    async fn test_non_array_archive_reads_as_empty() {
        let (store, kv) = store();
        kv.set(SUMMARIES_KEY, json!({ "not": "a list" })).await.unwrap();
        assert!(store.summaries().await.unwrap().is_empty());

        store.append_summary(&record(1, 10)).await.unwrap();
        assert_eq!(store.summaries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_all_kept() {
        let (store, _) = store();
        let mut handles = Vec::new();
        for created in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append_summary(&record(0, created)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.summaries().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_tokens_save_and_clear() {
        let (store, _) = store();
        assert!(store.tokens().await.unwrap().is_empty());

        let mut tokens = AiTokens::default();
        tokens.set("prompt", Some("p-123".to_string())).unwrap();
        store.save_tokens(&tokens).await.unwrap();
        assert_eq!(store.tokens().await.unwrap().get("prompt"), Some("p-123"));

        store.clear_tokens().await.unwrap();
        assert!(store.tokens().await.unwrap().is_empty());
    }
}

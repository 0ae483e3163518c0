//! Session summaries: generation with a local fallback, and archiving.

use anyhow::Result;
use ruhezeit_ai::Summarizer;
use ruhezeit_storage::{FocusSession, SessionStore, SummaryRecord};
use std::sync::Arc;

use crate::clock::Clock;
use crate::host::{Tab, TabHost};

/// Tabs sent to the summarization capability
pub const SUMMARY_SAMPLE_TABS: usize = 8;
/// Tabs listed by the local fallback summary
pub const FALLBACK_SAMPLE_TABS: usize = 5;
/// Returned only when the open tabs cannot be listed
pub const NO_SUMMARY: &str = "No summary available.";

/// Deterministic summary built from the first few tabs
#[must_use]
pub fn fallback_summary(tabs: &[Tab]) -> String {
    let labels: Vec<&str> = tabs
        .iter()
        .take(FALLBACK_SAMPLE_TABS)
        .map(Tab::label)
        .collect();
    format!("Session covered: {}", labels.join("; "))
}

pub struct SummaryGenerator {
    tabs: Arc<dyn TabHost>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl SummaryGenerator {
    #[must_use]
    pub fn new(tabs: Arc<dyn TabHost>, summarizer: Option<Arc<dyn Summarizer>>) -> Self {
        Self { tabs, summarizer }
    }

    /// Summarize what was open during `session`; never fails
    pub async fn generate(&self, session: &FocusSession) -> String {
        let tabs = match self.tabs.query_tabs().await {
            Ok(tabs) => tabs,
            Err(e) => {
                log::warn!("generateSessionSummary failed: {e:#}");
                return NO_SUMMARY.to_string();
            }
        };

        if let Some(summarizer) = &self.summarizer {
            let top_titles = tabs
                .iter()
                .take(SUMMARY_SAMPLE_TABS)
                .map(Tab::label)
                .collect::<Vec<_>>()
                .join("\n");

            match summarizer.summarize(&top_titles).await {
                Ok(summary) if !summary.trim().is_empty() => return summary,
                Ok(_) => log::debug!("Summarizer returned nothing for session {}", session.start),
                Err(e) => log::warn!("Summarizer failed for session {}: {e:#}", session.start),
            }
        }

        fallback_summary(&tabs)
    }
}

/// Generates a summary and prepends it to the archive
#[derive(Clone)]
pub struct SummaryArchiver {
    generator: Arc<SummaryGenerator>,
    store: SessionStore,
    clock: Arc<dyn Clock>,
}

impl SummaryArchiver {
    #[must_use]
    pub fn new(generator: Arc<SummaryGenerator>, store: SessionStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            generator,
            store,
            clock,
        }
    }

    /// Summarize `session` and archive the result
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be written
    pub async fn archive(&self, session: &FocusSession) -> Result<SummaryRecord> {
        let summary = self.generator.generate(session).await;
        let record = SummaryRecord {
            session: session.clone(),
            summary,
            created: self.clock.now_millis(),
        };
        self.store.append_summary(&record).await?;
        Ok(record)
    }
}

//! In-memory host fakes shared by unit tests.

use anyhow::Result;
use async_trait::async_trait;
use ruhezeit_ai::Summarizer;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::clock::Clock;
use crate::host::{GroupId, GroupUpdate, HostError, Rule, RuleHost, Tab, TabHost, TabId};

pub fn tab(id: TabId, url: &str, title: &str) -> Tab {
    Tab {
        id,
        url: Some(url.to_string()),
        title: Some(title.to_string()),
    }
}

#[derive(Default)]
pub struct FakeTabHost {
    pub tabs: Mutex<Vec<Tab>>,
    pub fail_query: AtomicBool,
    /// Time `query_tabs` waits before answering
    pub query_delay: Duration,
    /// Grouping fails for any group containing one of these tabs
    pub failing_tabs: Mutex<HashSet<TabId>>,
    pub groups: Mutex<Vec<(GroupId, Vec<TabId>)>>,
    pub updates: Mutex<Vec<(GroupId, GroupUpdate)>>,
}

impl FakeTabHost {
    pub fn with_tabs(tabs: Vec<Tab>) -> Self {
        Self {
            tabs: Mutex::new(tabs),
            ..Self::default()
        }
    }
}

#[async_trait]
impl TabHost for FakeTabHost {
    async fn query_tabs(&self) -> Result<Vec<Tab>> {
        if !self.query_delay.is_zero() {
            tokio::time::sleep(self.query_delay).await;
        }
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("tabs").into());
        }
        Ok(self.tabs.lock().unwrap().clone())
    }

    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        let failing = self.failing_tabs.lock().unwrap();
        if tab_ids.iter().any(|id| failing.contains(id)) {
            return Err(HostError::CallFailed("tab is not groupable".to_string()).into());
        }
        let mut groups = self.groups.lock().unwrap();
        let id = i64::try_from(groups.len()).unwrap() + 1;
        groups.push((id, tab_ids.to_vec()));
        Ok(id)
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<()> {
        self.updates.lock().unwrap().push((group_id, update.clone()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRuleHost {
    pub calls: Mutex<Vec<(Vec<Rule>, Vec<u32>)>>,
    pub fail: AtomicBool,
}

impl FakeRuleHost {
    pub fn added_ids(&self) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(add, _)| add.iter().map(|r| r.id))
            .collect()
    }

    pub fn removed_ids(&self) -> Vec<u32> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, remove)| remove.iter().copied())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl RuleHost for FakeRuleHost {
    async fn update_dynamic_rules(&self, add_rules: &[Rule], remove_rule_ids: &[u32]) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((add_rules.to_vec(), remove_rule_ids.to_vec()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(HostError::CallFailed("rule update rejected".to_string()).into());
        }
        Ok(())
    }
}

/// Clock that only moves when told to
pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(millis: i64) -> Self {
        Self(AtomicI64::new(millis))
    }

    pub fn advance(&self, millis: i64) {
        self.0.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Summarizer returning a canned answer or failing
pub struct FakeSummarizer {
    pub answer: Option<String>,
    pub inputs: Mutex<Vec<String>>,
}

impl FakeSummarizer {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            inputs: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.answer
            .clone()
            .ok_or_else(|| anyhow::anyhow!("summarizer offline"))
    }
}

//! Host adapter for running outside a browser.
//!
//! Open tabs are read from a JSON snapshot file. Created tab groups and the
//! dynamic rule set are kept in the key-value store so they can be inspected.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ruhezeit_storage::KeyValueStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::host::{GroupColor, GroupId, GroupUpdate, HostError, Rule, RuleHost, Tab, TabHost, TabId};

pub const TAB_GROUPS_KEY: &str = "ruhezeit_tab_groups";
pub const DYNAMIC_RULES_KEY: &str = "ruhezeit_dynamic_rules";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabGroupRecord {
    pub id: GroupId,
    pub tab_ids: Vec<TabId>,
    #[serde(default)]
    pub title: String,
    pub color: GroupColor,
    #[serde(default)]
    pub collapsed: bool,
}

pub struct LocalHost {
    snapshot: Option<PathBuf>,
    kv: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl LocalHost {
    /// `snapshot` is a JSON array of `{id, url, title}`; without one,
    /// tab operations report the capability as unavailable
    #[must_use]
    pub fn new(snapshot: Option<PathBuf>, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            snapshot,
            kv,
            lock: Mutex::new(()),
        }
    }

    /// Rules currently installed
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn dynamic_rules(&self) -> Result<Vec<Rule>> {
        self.load_list(DYNAMIC_RULES_KEY).await
    }

    /// Groups created so far
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn tab_groups(&self) -> Result<Vec<TabGroupRecord>> {
        self.load_list(TAB_GROUPS_KEY).await
    }

    async fn load_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.kv.get(key).await? {
            Some(value) => {
                serde_json::from_value(value).with_context(|| format!("Corrupt value under {key}"))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn save_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        self.kv.set(key, serde_json::to_value(items)?).await
    }
}

#[async_trait]
impl TabHost for LocalHost {
    async fn query_tabs(&self) -> Result<Vec<Tab>> {
        let path = self
            .snapshot
            .as_ref()
            .ok_or(HostError::Unavailable("tabs snapshot"))?;
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read tabs snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid tabs snapshot {}", path.display()))
    }

    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId> {
        if tab_ids.is_empty() {
            return Err(HostError::CallFailed("no tabs to group".to_string()).into());
        }
        let _guard = self.lock.lock().await;
        let mut groups: Vec<TabGroupRecord> = self.load_list(TAB_GROUPS_KEY).await?;

        // A tab belongs to at most one group
        for group in &mut groups {
            group.tab_ids.retain(|id| !tab_ids.contains(id));
        }
        groups.retain(|group| !group.tab_ids.is_empty());

        let id = groups.iter().map(|g| g.id).max().unwrap_or_default() + 1;
        groups.push(TabGroupRecord {
            id,
            tab_ids: tab_ids.to_vec(),
            title: String::new(),
            color: GroupColor::Grey,
            collapsed: false,
        });
        self.save_list(TAB_GROUPS_KEY, &groups).await?;
        Ok(id)
    }

    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut groups: Vec<TabGroupRecord> = self.load_list(TAB_GROUPS_KEY).await?;
        let group = groups
            .iter_mut()
            .find(|g| g.id == group_id)
            .ok_or_else(|| HostError::CallFailed(format!("no group with id {group_id}")))?;

        group.title.clone_from(&update.title);
        group.color = update.color;
        group.collapsed = update.collapsed;
        self.save_list(TAB_GROUPS_KEY, &groups).await
    }
}

#[async_trait]
impl RuleHost for LocalHost {
    async fn update_dynamic_rules(&self, add_rules: &[Rule], remove_rule_ids: &[u32]) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut rules: Vec<Rule> = self.load_list(DYNAMIC_RULES_KEY).await?;
        rules.retain(|rule| !remove_rule_ids.contains(&rule.id));

        let mut ids: HashSet<u32> = rules.iter().map(|r| r.id).collect();
        for rule in add_rules {
            if !ids.insert(rule.id) {
                return Err(HostError::CallFailed(format!("rule id {} is not unique", rule.id)).into());
            }
        }

        rules.extend_from_slice(add_rules);
        self.save_list(DYNAMIC_RULES_KEY, &rules).await
    }
}

//! Contracts of the browser runtime this crate orchestrates.
//!
//! Tab enumeration, tab grouping and dynamic network rules are provided by
//! the host; nothing here implements them.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type TabId = i64;
pub type GroupId = i64;

/// Read-only snapshot of an open tab
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tab {
    pub id: TabId,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl Tab {
    /// Title if it is non-empty, else the URL
    #[must_use]
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.url.as_deref())
            .unwrap_or_default()
    }
}

/// Colors supported for host tab groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupColor {
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl GroupColor {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grey => "grey",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Pink => "pink",
            Self::Purple => "purple",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
        }
    }
}

/// Properties applied to a freshly created tab group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUpdate {
    pub title: String,
    pub color: GroupColor,
    pub collapsed: bool,
}

/// Declarative network rule in the host's wire shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleAction {
    #[serde(rename = "type")]
    pub action_type: RuleActionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleActionType {
    Block,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

/// Request kinds a rule can apply to; only top-level documents are used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
}

/// Failures reported by a host adapter
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The host does not expose the capability at all
    #[error("host capability unavailable: {0}")]
    Unavailable(&'static str),
    /// The host rejected or failed the call
    #[error("host call failed: {0}")]
    CallFailed(String),
}

/// Tab enumeration and grouping primitives
#[async_trait]
pub trait TabHost: Send + Sync {
    /// List every open tab
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot enumerate tabs
    async fn query_tabs(&self) -> Result<Vec<Tab>>;

    /// Create a tab group containing `tab_ids`
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the grouping
    async fn group_tabs(&self, tab_ids: &[TabId]) -> Result<GroupId>;

    /// Set title, color and collapsed state of a group
    ///
    /// # Errors
    ///
    /// Returns an error if the group does not exist or the update is rejected
    async fn update_group(&self, group_id: GroupId, update: &GroupUpdate) -> Result<()>;
}

/// Dynamic network-rule management primitive
#[async_trait]
pub trait RuleHost: Send + Sync {
    /// Remove `remove_rule_ids`, then add `add_rules`, as one update
    ///
    /// # Errors
    ///
    /// Returns an error if the host rejects the update
    async fn update_dynamic_rules(&self, add_rules: &[Rule], remove_rule_ids: &[u32])
        -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tab_label_prefers_non_empty_title() {
        let tab = Tab {
            id: 1,
            url: Some("https://a.com".to_string()),
            title: Some("A".to_string()),
        };
        assert_eq!(tab.label(), "A");

        let tab = Tab {
            title: Some(String::new()),
            ..tab
        };
        assert_eq!(tab.label(), "https://a.com");

        assert_eq!(Tab::default().label(), "");
    }

    #[test]
    fn test_rule_wire_shape() {
        let rule = Rule {
            id: 1500,
            priority: 1,
            action: RuleAction {
                action_type: RuleActionType::Block,
            },
            condition: RuleCondition {
                url_filter: "twitter.com".to_string(),
                resource_types: vec![ResourceType::MainFrame],
            },
        };
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({
                "id": 1500,
                "priority": 1,
                "action": { "type": "block" },
                "condition": { "urlFilter": "twitter.com", "resourceTypes": ["main_frame"] }
            })
        );
    }

    #[test]
    fn test_group_color_names() {
        assert_eq!(GroupColor::Grey.as_str(), "grey");
        assert_eq!(serde_json::to_value(GroupColor::Cyan).unwrap(), json!("cyan"));
    }
}

//! Tab organization by domain.
//!
//! Tabs are bucketed by URL host, the largest buckets are kept up to a cap
//! that grows with the number of open tabs, and each kept bucket becomes a
//! titled, colored host tab group.

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use url::Url;

use crate::events::{Event, EventBus};
use crate::host::{GroupColor, GroupUpdate, Tab, TabHost, TabId};

/// Bucket for tabs whose URL has no usable host
pub const OTHER_KEY: &str = "OTHER";

/// Group colors assigned by position
pub const PALETTE: [GroupColor; 7] = [
    GroupColor::Blue,
    GroupColor::Green,
    GroupColor::Yellow,
    GroupColor::Red,
    GroupColor::Purple,
    GroupColor::Cyan,
    GroupColor::Orange,
];

/// A planned tab group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub domain: String,
    pub tab_ids: Vec<TabId>,
    pub title: String,
    pub color: GroupColor,
}

/// Outcome of one organize pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizeReport {
    pub tab_count: usize,
    pub groups: Vec<Group>,
    /// Domains whose host group could not be created or updated
    pub failed_domains: Vec<String>,
}

/// Normalized grouping key for a tab URL
#[must_use]
pub fn domain_key(url: Option<&str>) -> String {
    let host = url
        .and_then(|u| Url::parse(u).ok())
        .and_then(|u| u.host_str().map(ToString::to_string))
        .filter(|h| !h.is_empty());

    match host {
        Some(host) => host
            .strip_prefix("www.")
            .map_or_else(|| host.clone(), ToString::to_string),
        None => OTHER_KEY.to_string(),
    }
}

/// Maximum number of groups for a given number of tabs
#[must_use]
pub const fn group_cap(tab_count: usize) -> usize {
    match tab_count {
        0..=10 => 3,
        11..=20 => 5,
        _ => 7,
    }
}

/// Bucket tab IDs by domain key, in first-seen order of both keys and members
#[must_use]
pub fn bucket_by_domain(tabs: &[Tab]) -> Vec<(String, Vec<TabId>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<TabId>)> = Vec::new();

    for tab in tabs {
        let key = domain_key(tab.url.as_deref());
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(tab.id),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push((key, vec![tab.id]));
            }
        }
    }

    buckets
}

const COLOR_PATTERNS: [(&str, GroupColor); 3] = [
    (r"github|gitlab|git", GroupColor::Blue),
    (r"arxiv|pdf|research|doi|ieee", GroupColor::Green),
    (r"news|reddit|twitter|facebook|instagram", GroupColor::Yellow),
];

static COLOR_RULES: LazyLock<Vec<(Regex, GroupColor)>> = LazyLock::new(|| {
    COLOR_PATTERNS
        .iter()
        .filter_map(|(pattern, color)| match Regex::new(pattern) {
            Ok(re) => Some((re, *color)),
            Err(e) => {
                log::error!("Invalid color pattern {pattern}: {e}");
                None
            }
        })
        .collect()
});

/// Guess a color from the kind of site
#[must_use]
pub fn pick_color_for_domain(domain: &str) -> GroupColor {
    COLOR_RULES
        .iter()
        .find(|(re, _)| re.is_match(domain))
        .map_or(GroupColor::Grey, |(_, color)| *color)
}

/// Color for the group at `position`, guessing from the domain past the palette
#[must_use]
pub fn color_for_position(position: usize, domain: &str) -> GroupColor {
    PALETTE
        .get(position)
        .copied()
        .unwrap_or_else(|| pick_color_for_domain(domain))
}

/// Plan groups for a tab snapshot
#[must_use]
pub fn categorize(tabs: &[Tab]) -> Vec<Group> {
    let mut buckets = bucket_by_domain(tabs);
    // Stable: equal sizes keep first-seen order
    buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()));
    buckets.truncate(group_cap(tabs.len()));

    buckets
        .into_iter()
        .enumerate()
        .map(|(position, (domain, tab_ids))| Group {
            title: domain.to_uppercase(),
            color: color_for_position(position, &domain),
            domain,
            tab_ids,
        })
        .collect()
}

/// Applies [`categorize`] to the host's open tabs
pub struct Categorizer {
    tabs: Arc<dyn TabHost>,
    events: EventBus,
}

impl Categorizer {
    #[must_use]
    pub fn new(tabs: Arc<dyn TabHost>, events: EventBus) -> Self {
        Self { tabs, events }
    }

    /// Group all open tabs and announce completion
    ///
    /// A failure for one domain is logged and does not stop the others.
    ///
    /// # Errors
    ///
    /// Returns an error only if the tabs cannot be listed
    pub async fn organize(&self) -> Result<OrganizeReport> {
        let tabs = self
            .tabs
            .query_tabs()
            .await
            .context("Failed to query tabs")?;
        let groups = categorize(&tabs);
        let mut failed_domains = Vec::new();

        for group in &groups {
            if let Err(e) = self.apply_group(group).await {
                log::warn!("Failed to create/update tab group for {}: {e:#}", group.domain);
                failed_domains.push(group.domain.clone());
            }
        }

        log::info!(
            "Organized {} tabs into {} groups ({} failed)",
            tabs.len(),
            groups.len() - failed_domains.len(),
            failed_domains.len()
        );
        self.events.publish(Event::OrganizationDone { count: tabs.len() });

        Ok(OrganizeReport {
            tab_count: tabs.len(),
            groups,
            failed_domains,
        })
    }

    async fn apply_group(&self, group: &Group) -> Result<()> {
        let group_id = self.tabs.group_tabs(&group.tab_ids).await?;
        let update = GroupUpdate {
            title: group.title.clone(),
            color: group.color,
            collapsed: false,
        };
        self.tabs.update_group(group_id, &update).await
    }
}

//! Block-list to dynamic-rule translation.
//!
//! Rule IDs come from the clock: `(unix_secs mod 100000) + 1000` plus the
//! domain index. There is no persisted counter, so two sessions started in
//! the same second with block lists of equal length produce the same IDs.

use std::sync::Arc;

use crate::clock::Clock;
use crate::host::{ResourceType, Rule, RuleAction, RuleActionType, RuleCondition, RuleHost};

/// Keeps session rules clear of low IDs other extension features may use
pub const RULE_ID_OFFSET: u32 = 1000;
const RULE_ID_WINDOW: i64 = 100_000;
const BLOCK_RULE_PRIORITY: u32 = 1;

/// First rule ID for a session started at `unix_secs`
#[must_use]
pub fn base_rule_id(unix_secs: i64) -> u32 {
    u32::try_from(unix_secs.rem_euclid(RULE_ID_WINDOW)).unwrap_or_default() + RULE_ID_OFFSET
}

/// One top-level-document block rule per domain, numbered from `base_id`
#[must_use]
pub fn build_block_rules(domains: &[String], base_id: u32) -> Vec<Rule> {
    (base_id..)
        .zip(domains)
        .map(|(id, domain)| Rule {
            id,
            priority: BLOCK_RULE_PRIORITY,
            action: RuleAction {
                action_type: RuleActionType::Block,
            },
            condition: RuleCondition {
                url_filter: domain.clone(),
                resource_types: vec![ResourceType::MainFrame],
            },
        })
        .collect()
}

pub struct RuleManager {
    host: Arc<dyn RuleHost>,
    clock: Arc<dyn Clock>,
}

impl RuleManager {
    #[must_use]
    pub fn new(host: Arc<dyn RuleHost>, clock: Arc<dyn Clock>) -> Self {
        Self { host, clock }
    }

    /// Install block rules for `domains` and return their IDs
    ///
    /// The IDs are returned even if the host rejects the rules; the failure
    /// is only logged so that a session can still start with degraded blocking.
    pub async fn install(&self, domains: &[String]) -> Vec<u32> {
        let rules = build_block_rules(domains, base_rule_id(self.clock.now_secs()));
        let rule_ids: Vec<u32> = rules.iter().map(|r| r.id).collect();
        if rules.is_empty() {
            return rule_ids;
        }

        match self.host.update_dynamic_rules(&rules, &[]).await {
            Ok(()) => log::info!("Installed {} block rules: {rule_ids:?}", rules.len()),
            Err(e) => log::warn!("updateDynamicRules add error: {e:#}"),
        }
        rule_ids
    }

    /// Remove previously installed rules; failures are logged
    pub async fn remove(&self, rule_ids: &[u32]) {
        if rule_ids.is_empty() {
            return;
        }

        match self.host.update_dynamic_rules(&[], rule_ids).await {
            Ok(()) => log::info!("Removed block rules: {rule_ids:?}"),
            Err(e) => log::warn!("updateDynamicRules remove error: {e:#}"),
        }
    }
}

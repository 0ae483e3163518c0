use ruhezeit_ai::AiCapabilities;
use ruhezeit_storage::{KeyValueStore, SessionStore};
use std::sync::Arc;

use crate::categorizer::Categorizer;
use crate::clock::Clock;
use crate::config::Settings;
use crate::events::EventBus;
use crate::host::{RuleHost, TabHost};
use crate::router::MessageRouter;
use crate::rule_manager::RuleManager;
use crate::session_controller::SessionController;
use crate::summary::{SummaryArchiver, SummaryGenerator};

/// Runtime collaborators the extension is built on
pub struct Hosts {
    pub tabs: Arc<dyn TabHost>,
    pub rules: Arc<dyn RuleHost>,
    pub kv: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

/// One fully wired extension instance
pub struct Extension {
    pub events: EventBus,
    pub store: SessionStore,
    pub controller: Arc<SessionController>,
    pub categorizer: Arc<Categorizer>,
    pub router: Arc<MessageRouter>,
}

impl Extension {
    #[must_use]
    pub fn new(hosts: Hosts, ai: AiCapabilities, settings: &Settings) -> Self {
        let events = EventBus::default();
        let store = SessionStore::new(hosts.kv);

        let generator = Arc::new(SummaryGenerator::new(
            Arc::clone(&hosts.tabs),
            ai.summarizer(),
        ));
        let archiver = SummaryArchiver::new(generator, store.clone(), Arc::clone(&hosts.clock));
        let controller = Arc::new(
            SessionController::new(
                RuleManager::new(hosts.rules, Arc::clone(&hosts.clock)),
                store.clone(),
                archiver,
                events.clone(),
                hosts.clock,
            )
            .with_defaults(settings.focus_defaults()),
        );
        let categorizer = Arc::new(Categorizer::new(hosts.tabs, events.clone()));
        let router = Arc::new(MessageRouter::new(
            Arc::clone(&controller),
            Arc::clone(&categorizer),
            store.clone(),
            ai,
        ));

        Self {
            events,
            store,
            controller,
            categorizer,
            router,
        }
    }
}

pub mod app;
pub mod categorizer;
pub mod clock;
pub mod config;
pub mod events;
pub mod host;
pub mod local_host;
pub mod router;
pub mod rule_manager;
pub mod server;
pub mod session_controller;
pub mod summary;

#[cfg(test)]
mod testing;

pub use app::{Extension, Hosts};
pub use categorizer::{categorize, Categorizer, Group, OrganizeReport};
pub use clock::{Clock, SystemClock};
pub use config::{get_data_dir, Settings};
pub use events::{Event, EventBus};
pub use host::{HostError, RuleHost, Tab, TabHost};
pub use local_host::LocalHost;
pub use router::{MessageRouter, Request, Response};
pub use rule_manager::RuleManager;
pub use server::serve;
pub use session_controller::{SessionController, StoppedSession, Toggled};
pub use summary::{SummaryArchiver, SummaryGenerator};

use ruhezeit_storage::FocusSession;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default number of events buffered per subscriber
const DEFAULT_CAPACITY: usize = 64;

/// Broadcast to every UI surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Tab organization finished; `count` is the number of tabs processed
    #[serde(rename = "organization:done")]
    OrganizationDone { count: usize },
    #[serde(rename = "focus:started")]
    FocusStarted { session: FocusSession },
    #[serde(rename = "focus:ended")]
    FocusEnded { session: FocusSession },
}

/// Fan-out channel for [`Event`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Publish to current subscribers, returning how many received it
    pub fn publish(&self, event: Event) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                log::debug!("No listeners for event: {event:?}");
                0
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

//! Focus session lifecycle.
//!
//! Idle --start--> Active --stop--> Idle. At most one session is active;
//! start while active and stop while idle are silent no-ops. The check and
//! the transition happen under one lock that is held until the transition's
//! host calls finish, so a stop can never overtake a half-finished start.


use anyhow::Result;
use ruhezeit_storage::{FocusSession, SessionStore, SummaryRecord};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;

use crate::clock::Clock;
use crate::config::{DEFAULT_BLOCK_LIST, DEFAULT_FOCUS_MINUTES};
use crate::events::{Event, EventBus};
use crate::rule_manager::RuleManager;
use crate::summary::SummaryArchiver;

/// Values used when a start request leaves them out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusDefaults {
    pub minutes: u32,
    pub block_list: Vec<String>,
}

impl Default for FocusDefaults {
    fn default() -> Self {
        Self {
            minutes: DEFAULT_FOCUS_MINUTES,
            block_list: DEFAULT_BLOCK_LIST.iter().map(ToString::to_string).collect(),
        }
    }
}

/// A session that was just stopped
#[derive(Debug)]
pub struct StoppedSession {
    pub session: FocusSession,
    /// Background task archiving the automatic summary
    pub summary_task: JoinHandle<()>,
}

/// Result of [`SessionController::toggle`]
#[derive(Debug)]
pub enum Toggled {
    Started(FocusSession),
    Stopped(StoppedSession),
}

pub struct SessionController {
    active: Mutex<Option<FocusSession>>,
    rules: RuleManager,
    store: SessionStore,
    archiver: SummaryArchiver,
    events: EventBus,
    clock: Arc<dyn Clock>,
    defaults: FocusDefaults,
}

impl SessionController {
    #[must_use]
    pub fn new(
        rules: RuleManager,
        store: SessionStore,
        archiver: SummaryArchiver,
        events: EventBus,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            active: Mutex::new(None),
            rules,
            store,
            archiver,
            events,
            clock,
            defaults: FocusDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: FocusDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Re-adopt a persisted session that never ended
    ///
    /// Used when a new process takes over from one that was running a session.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn restore(&self) -> Result<Option<FocusSession>> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Ok(active.clone());
        }
        let restored = self.store.load_session().await?.filter(FocusSession::is_active);
        if let Some(session) = &restored {
            log::info!("Resumed focus session started at {}", session.start);
        }
        *active = restored.clone();
        Ok(restored)
    }

    /// Start a session; returns `None` if one is already active
    ///
    /// Zero or missing minutes and a missing block list use the defaults.
    pub async fn start(
        &self,
        minutes: Option<u32>,
        block_list: Option<Vec<String>>,
    ) -> Option<FocusSession> {
        let mut active = self.active.lock().await;
        self.start_locked(&mut active, minutes, block_list).await
    }

    /// Stop the active session; returns `None` if idle
    pub async fn stop(&self) -> Option<StoppedSession> {
        let mut active = self.active.lock().await;
        self.stop_locked(&mut active).await
    }

    /// Start a default session when idle, stop the active one otherwise
    pub async fn toggle(&self) -> Option<Toggled> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            self.stop_locked(&mut active).await.map(Toggled::Stopped)
        } else {
            self.start_locked(&mut active, None, None)
                .await
                .map(Toggled::Started)
        }
    }

    /// The active session, or else the last persisted one
    ///
    /// A returned session with `end` set is archived, not active.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read
    pub async fn get(&self) -> Result<Option<FocusSession>> {
        if let Some(session) = self.active.lock().await.clone() {
            return Ok(Some(session));
        }
        self.store.load_session().await
    }

    /// The in-memory active session only
    pub async fn active(&self) -> Option<FocusSession> {
        self.active.lock().await.clone()
    }

    /// Generate and archive a summary on behalf of a UI surface
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be written
    pub async fn summarize_session(&self, session: &FocusSession) -> Result<SummaryRecord> {
        self.archiver.archive(session).await
    }

    async fn start_locked(
        &self,
        active: &mut MutexGuard<'_, Option<FocusSession>>,
        minutes: Option<u32>,
        block_list: Option<Vec<String>>,
    ) -> Option<FocusSession> {
        if active.is_some() {
            log::debug!("Focus session already active, ignoring start");
            return None;
        }

        let minutes = minutes
            .filter(|m| *m > 0)
            .unwrap_or(self.defaults.minutes);
        let block_list = block_list.unwrap_or_else(|| self.defaults.block_list.clone());

        let start = self.clock.now_millis();
        let rule_ids = self.rules.install(&block_list).await;
        let session = FocusSession::new(start, minutes, rule_ids);

        if let Err(e) = self.store.save_session(&session).await {
            log::warn!("Failed to persist focus session: {e:#}");
        }
        **active = Some(session.clone());

        self.events.publish(Event::FocusStarted {
            session: session.clone(),
        });
        log::info!(
            "Focus started: {minutes} min, {} blocked domains",
            session.blocked
        );
        Some(session)
    }

    async fn stop_locked(
        &self,
        active: &mut MutexGuard<'_, Option<FocusSession>>,
    ) -> Option<StoppedSession> {
        let mut session = active.take()?;
        session.end = Some(self.clock.now_millis().max(session.start));

        if let Err(e) = self.store.save_session(&session).await {
            log::warn!("Failed to persist final focus session: {e:#}");
        }
        self.rules.remove(&session.rule_ids).await;

        self.events.publish(Event::FocusEnded {
            session: session.clone(),
        });
        log::info!(
            "Focus ended after {} ms",
            session.duration_millis().unwrap_or_default()
        );

        // Archived even if a UI surface also requests a summary for this session
        let archiver = self.archiver.clone();
        let ended = session.clone();
        let summary_task = tokio::spawn(async move {
            if let Err(e) = archiver.archive(&ended).await {
                log::warn!("Failed to auto-generate session summary: {e:#}");
            }
        });

        Some(StoppedSession {
            session,
            summary_task,
        })
    }
}

//! Request/response protocol spoken by UI surfaces.

use anyhow::Result;
use ruhezeit_ai::AiCapabilities;
use ruhezeit_storage::{FocusSession, SessionStore, SummaryRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

use crate::categorizer::Categorizer;
use crate::session_controller::SessionController;

/// Request sent by the panel or popup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    #[serde(rename = "organization:run")]
    OrganizationRun,
    #[serde(rename = "focus:start", rename_all = "camelCase")]
    FocusStart {
        #[serde(default)]
        minutes: Option<u32>,
        #[serde(default)]
        block_list: Option<Vec<String>>,
    },
    #[serde(rename = "focus:stop")]
    FocusStop,
    #[serde(rename = "focus:get")]
    FocusGet,
    #[serde(rename = "ai:summarizeSession")]
    SummarizeSession { session: FocusSession },
    #[serde(rename = "ai:getSummaries")]
    GetSummaries,
    #[serde(rename = "ai:deleteSummary")]
    DeleteSummary { created: i64 },
    #[serde(rename = "ai:prompt")]
    Prompt { prompt: String },
    #[serde(rename = "ai:summarize")]
    Summarize { text: String },
    #[serde(rename = "ai:write")]
    Write { prompt: String },
    #[serde(rename = "ai:translate", rename_all = "camelCase")]
    Translate { text: String, target_lang: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok { ok: bool },
    Session { session: Option<FocusSession> },
    Summary { summary: String },
    Summaries { summaries: Vec<SummaryRecord> },
    Prompt { result: String },
    Draft { draft: String },
    Translated { translated: String },
    Error { error: String },
}

impl Response {
    #[must_use]
    pub const fn ok() -> Self {
        Self::Ok { ok: true }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}

pub struct MessageRouter {
    controller: Arc<SessionController>,
    categorizer: Arc<Categorizer>,
    store: SessionStore,
    ai: AiCapabilities,
    /// Work that outlives the request that started it
    background: Mutex<JoinSet<()>>,
}

impl MessageRouter {
    #[must_use]
    pub fn new(
        controller: Arc<SessionController>,
        categorizer: Arc<Categorizer>,
        store: SessionStore,
        ai: AiCapabilities,
    ) -> Self {
        Self {
            controller,
            categorizer,
            store,
            ai,
            background: Mutex::new(JoinSet::new()),
        }
    }

    /// Wait for every background task started by earlier requests
    pub async fn finish_background(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.background.lock().await);
            if tasks.is_empty() {
                return;
            }
            log::debug!("Waiting for {} background tasks", tasks.len());
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    log::error!("Background task failed: {e}");
                }
            }
        }
    }

    async fn track<F>(&self, task: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.background.lock().await;
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Answer one request; failures become an `{error}` response
    pub async fn handle(&self, request: Request) -> Response {
        match self.dispatch(request).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("Message handler failed: {e:#}");
                Response::error(e.to_string())
            }
        }
    }

    /// Decode and answer a request given as JSON
    pub async fn handle_value(&self, value: Value) -> Response {
        match serde_json::from_value::<Request>(value) {
            Ok(request) => self.handle(request).await,
            Err(e) => {
                log::warn!("Rejected malformed request: {e}");
                Response::error(format!("invalid request: {e}"))
            }
        }
    }

    pub async fn handle_json(&self, text: &str) -> Response {
        match serde_json::from_str::<Value>(text) {
            Ok(value) => self.handle_value(value).await,
            Err(e) => {
                log::warn!("Rejected non-JSON request: {e}");
                Response::error(format!("invalid request: {e}"))
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Result<Response> {
        log::debug!("Handling {request:?}");
        let response = match request {
            Request::OrganizationRun => {
                // Completion is reported through the organization:done event
                let categorizer = Arc::clone(&self.categorizer);
                self.track(async move {
                    if let Err(e) = categorizer.organize().await {
                        log::warn!("organizeTabs failed: {e:#}");
                    }
                })
                .await;
                Response::ok()
            }
            Request::FocusStart {
                minutes,
                block_list,
            } => {
                self.controller.start(minutes, block_list).await;
                Response::ok()
            }
            Request::FocusStop => {
                if let Some(stopped) = self.controller.stop().await {
                    let summary_task = stopped.summary_task;
                    self.track(async move {
                        if let Err(e) = summary_task.await {
                            log::warn!("Summary task did not finish: {e}");
                        }
                    })
                    .await;
                }
                Response::ok()
            }
            Request::FocusGet => Response::Session {
                session: self.controller.get().await?,
            },
            Request::SummarizeSession { session } => Response::Summary {
                summary: self.controller.summarize_session(&session).await?.summary,
            },
            Request::GetSummaries => Response::Summaries {
                summaries: self.store.summaries().await?,
            },
            Request::DeleteSummary { created } => {
                let removed = self.store.delete_summary(created).await?;
                log::info!("Deleted {removed} summaries created at {created}");
                Response::ok()
            }
            Request::Prompt { prompt } => Response::Prompt {
                result: self.ai.send_prompt(&prompt).await,
            },
            Request::Summarize { text } => Response::Summary {
                summary: self.ai.summarize(&text).await,
            },
            Request::Write { prompt } => Response::Draft {
                draft: self.ai.generate_draft(&prompt).await,
            },
            Request::Translate { text, target_lang } => Response::Translated {
                translated: self.ai.translate(&text, &target_lang).await,
            },
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Extension, Hosts};
    use crate::config::Settings;
    use crate::events::Event;
    use crate::testing::{tab, FakeRuleHost, FakeTabHost, ManualClock};
    use ruhezeit_storage::MemoryStore;
    use serde_json::json;

    fn extension() -> (Extension, Arc<FakeTabHost>, Arc<FakeRuleHost>) {
        let tabs = Arc::new(FakeTabHost::with_tabs(vec![
            tab(1, "https://www.example.com/x", "Example X"),
            tab(2, "https://example.com/y", "Example Y"),
            tab(3, "https://docs.rs/", "Docs"),
        ]));
        let rules = Arc::new(FakeRuleHost::default());
        let hosts = Hosts {
            tabs: tabs.clone(),
            rules: rules.clone(),
            kv: Arc::new(MemoryStore::new()),
            clock: Arc::new(ManualClock::at(1_700_000_000_000)),
        };
        let ext = Extension::new(hosts, AiCapabilities::none(), &Settings::default());
        (ext, tabs, rules)
    }

    async fn call(ext: &Extension, request: Value) -> Value {
        serde_json::to_value(ext.router.handle_value(request).await).unwrap()
    }

    #[test]
    fn test_request_wire_names() {
        let request: Request = serde_json::from_value(json!({
            "type": "focus:start",
            "minutes": 50,
            "blockList": ["news.ycombinator.com"]
        }))
        .unwrap();
        assert_eq!(
            request,
            Request::FocusStart {
                minutes: Some(50),
                block_list: Some(vec!["news.ycombinator.com".to_string()]),
            }
        );

        let request: Request = serde_json::from_value(json!({ "type": "focus:start" })).unwrap();
        assert_eq!(
            request,
            Request::FocusStart {
                minutes: None,
                block_list: None
            }
        );

        let request: Request =
            serde_json::from_value(json!({ "type": "ai:deleteSummary", "created": 7 })).unwrap();
        assert_eq!(request, Request::DeleteSummary { created: 7 });
    }

    #[test]
    fn test_response_wire_shapes() {
        assert_eq!(serde_json::to_value(Response::ok()).unwrap(), json!({ "ok": true }));
        assert_eq!(
            serde_json::to_value(Response::Session { session: None }).unwrap(),
            json!({ "session": null })
        );
        assert_eq!(
            serde_json::to_value(Response::error("boom")).unwrap(),
            json!({ "error": "boom" })
        );
    }

    #[tokio::test]
    async fn test_focus_round_trip() {
        let (ext, _, rules) = extension();

        let reply = call(
            &ext,
            json!({ "type": "focus:start", "minutes": 25, "blockList": ["twitter.com"] }),
        )
        .await;
        assert_eq!(reply, json!({ "ok": true }));

        let active = call(&ext, json!({ "type": "focus:get" })).await;
        assert_eq!(active["session"]["blocked"], 1);
        assert_eq!(active["session"]["minutes"], 25);
        assert_eq!(active["session"]["ruleIds"].as_array().unwrap().len(), 1);
        assert!(active["session"].get("end").is_none());

        let reply = call(&ext, json!({ "type": "focus:stop" })).await;
        assert_eq!(reply, json!({ "ok": true }));
        assert_eq!(rules.removed_ids().len(), 1);

        let archived = call(&ext, json!({ "type": "focus:get" })).await;
        let end = archived["session"]["end"].as_i64().unwrap();
        assert!(end >= archived["session"]["start"].as_i64().unwrap());
    }

    #[tokio::test]
    async fn test_focus_get_when_nothing_persisted() {
        let (ext, _, _) = extension();
        assert_eq!(
            call(&ext, json!({ "type": "focus:get" })).await,
            json!({ "session": null })
        );
    }

    #[tokio::test]
    async fn test_second_start_keeps_original_session() {
        let (ext, _, _) = extension();
        call(&ext, json!({ "type": "focus:start", "minutes": 25 })).await;
        let first = call(&ext, json!({ "type": "focus:get" })).await;

        let reply = call(&ext, json!({ "type": "focus:start", "minutes": 5 })).await;
        assert_eq!(reply, json!({ "ok": true }));
        assert_eq!(call(&ext, json!({ "type": "focus:get" })).await, first);
    }

    #[tokio::test]
    async fn test_summaries_archive_and_delete() {
        let (ext, _, _) = extension();
        let session = FocusSession::new(1_000, 25, vec![]);

        let reply = call(
            &ext,
            json!({ "type": "ai:summarizeSession", "session": session }),
        )
        .await;
        assert_eq!(
            reply["summary"],
            "Session covered: Example X; Example Y; Docs"
        );

        let listed = call(&ext, json!({ "type": "ai:getSummaries" })).await;
        let summaries = listed["summaries"].as_array().unwrap();
        assert_eq!(summaries.len(), 1);
        let created = summaries[0]["created"].as_i64().unwrap();

        let reply = call(&ext, json!({ "type": "ai:deleteSummary", "created": created })).await;
        assert_eq!(reply, json!({ "ok": true }));
        assert_eq!(
            call(&ext, json!({ "type": "ai:getSummaries" })).await,
            json!({ "summaries": [] })
        );
    }

    #[tokio::test]
    async fn test_organization_run_reports_tab_count() {
        let (ext, tabs, _) = extension();
        let mut events = ext.events.subscribe();

        let reply = call(&ext, json!({ "type": "organization:run" })).await;
        assert_eq!(reply, json!({ "ok": true }));

        assert_eq!(events.recv().await.unwrap(), Event::OrganizationDone { count: 3 });
        assert_eq!(tabs.groups.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_prompt_without_capability_uses_mock() {
        let (ext, _, _) = extension();
        assert_eq!(
            call(&ext, json!({ "type": "ai:prompt", "prompt": "hello" })).await,
            json!({ "result": "mock response for: hello" })
        );
    }

    #[tokio::test]
    async fn test_text_capabilities_without_providers() {
        let (ext, _, _) = extension();
        assert_eq!(
            call(&ext, json!({ "type": "ai:summarize", "text": "short notes" })).await,
            json!({ "summary": "short notes" })
        );
        assert_eq!(
            call(&ext, json!({ "type": "ai:write", "prompt": "status update" })).await,
            json!({ "draft": "Draft for: status update" })
        );
        assert_eq!(
            call(
                &ext,
                json!({ "type": "ai:translate", "text": "Hallo", "targetLang": "en" })
            )
            .await,
            json!({ "translated": "Hallo" })
        );
    }

    #[tokio::test]
    async fn test_stop_summary_is_archived_once_background_finishes() {
        let (ext, _, _) = extension();
        call(&ext, json!({ "type": "focus:start" })).await;
        call(&ext, json!({ "type": "focus:stop" })).await;

        ext.router.finish_background().await;
        assert_eq!(ext.store.summaries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_requests_error() {
        let (ext, _, _) = extension();

        let reply = call(&ext, json!({ "type": "tabs:explode" })).await;
        assert!(reply["error"].as_str().unwrap().starts_with("invalid request"));

        let reply = call(&ext, json!({ "type": "ai:deleteSummary" })).await;
        assert!(reply.get("error").is_some());

        let reply = ext.router.handle_json("not json").await;
        assert!(matches!(reply, Response::Error { .. }));
    }
}

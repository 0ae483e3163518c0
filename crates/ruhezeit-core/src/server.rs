//! Line-delimited JSON message host.
//!
//! Each input line is a request, optionally carrying an `id` that is echoed
//! on its response line. Requests are answered concurrently, so responses
//! may come back out of order. Broadcast events are written as lines of
//! their own and carry a `type` field, which responses never do.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::events::{Event, EventBus};
use crate::router::{MessageRouter, Response};

/// Serve requests from `reader` until it reaches end of input
///
/// # Errors
///
/// Returns an error if reading requests or writing responses fails
pub async fn serve<R, W>(
    router: Arc<MessageRouter>,
    events: &EventBus,
    reader: R,
    writer: W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        writer.shutdown().await?;
        anyhow::Ok(())
    });

    let mut event_rx = events.subscribe();
    let event_tx = tx.clone();
    let (stop_events, mut events_stopped) = oneshot::channel::<()>();
    let forwarder = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                received = event_rx.recv() => match received {
                    Ok(event) => {
                        if !forward_event(&event_tx, &event) {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Client fell behind, {skipped} events dropped");
                    }
                    Err(RecvError::Closed) => return,
                },
                _ = &mut events_stopped => break,
            }
        }

        // Flush what was published before shutdown
        loop {
            match event_rx.try_recv() {
                Ok(event) => {
                    if !forward_event(&event_tx, &event) {
                        return;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Client fell behind, {skipped} events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return,
            }
        }
    });

    let mut requests = JoinSet::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        let router = Arc::clone(&router);
        let tx = tx.clone();
        requests.spawn(async move {
            let reply = answer(&router, &line).await;
            if tx.send(reply).is_err() {
                log::debug!("Response dropped, output closed");
            }
        });
    }

    log::info!("Input closed, finishing {} pending requests", requests.len());
    while let Some(result) = requests.join_next().await {
        if let Err(e) = result {
            log::error!("Request task failed: {e}");
        }
    }

    router.finish_background().await;

    if stop_events.send(()).is_err() {
        log::debug!("Event forwarder already stopped");
    }
    if let Err(e) = forwarder.await {
        log::error!("Event forwarder failed: {e}");
    }
    drop(tx);
    writer_task.await.context("Writer task failed")?
}

/// Queue `event` for output; false once the output is closed
fn forward_event(tx: &mpsc::UnboundedSender<String>, event: &Event) -> bool {
    match serde_json::to_string(event) {
        Ok(line) => tx.send(line).is_ok(),
        Err(e) => {
            log::warn!("Failed to encode event: {e}");
            true
        }
    }
}

async fn answer(router: &MessageRouter, line: &str) -> String {
    match serde_json::from_str::<Value>(line) {
        Ok(mut value) => {
            let id = value.as_object_mut().and_then(|fields| fields.remove("id"));
            let response = router.handle_value(value).await;
            encode_reply(id, &response)
        }
        Err(e) => {
            log::warn!("Rejected non-JSON request: {e}");
            encode_reply(None, &Response::error(format!("invalid request: {e}")))
        }
    }
}

fn encode_reply(id: Option<Value>, response: &Response) -> String {
    let mut value =
        serde_json::to_value(response).unwrap_or_else(|e| json!({ "error": e.to_string() }));
    if let (Some(id), Some(fields)) = (id, value.as_object_mut()) {
        fields.insert("id".to_string(), id);
    }
    value.to_string()
}

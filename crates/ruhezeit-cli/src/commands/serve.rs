use anyhow::Result;
use ruhezeit_core::serve;
use std::sync::Arc;
use tokio::io::BufReader;

use super::runtime::Runtime;

/// Speak the message protocol over stdin/stdout until stdin closes
pub async fn serve_command(rt: &Runtime) -> Result<()> {
    log::info!("Serving messages on stdio");
    if let Some(session) = rt.ext.controller.active().await {
        log::info!("Focus session from {} is still running", session.start);
    }

    serve(
        Arc::clone(&rt.ext.router),
        &rt.ext.events,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;

    log::info!("Message host stopped");
    Ok(())
}

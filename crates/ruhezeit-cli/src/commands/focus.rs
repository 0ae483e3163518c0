//! Focus session commands

use anyhow::Result;
use clap::Subcommand;
use ruhezeit_core::Toggled;
use ruhezeit_storage::FocusSession;

use super::helpers::format_millis;
use super::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum FocusAction {
    /// Start a focus session
    Start {
        /// Session length in minutes (default from settings)
        #[arg(short, long)]
        minutes: Option<u32>,
        /// Domain to block; repeat for more (default from settings)
        #[arg(short, long = "block")]
        block: Vec<String>,
    },
    /// Stop the running session and archive its summary
    Stop,
    /// Show the running or most recent session
    Status,
    /// Start a default session, or stop the running one
    Toggle,
}

/// Handle focus commands
pub async fn handle_focus_command(rt: &Runtime, action: FocusAction) -> Result<()> {
    match action {
        FocusAction::Start { minutes, block } => {
            let block_list = if block.is_empty() { None } else { Some(block) };
            match rt.ext.controller.start(minutes, block_list).await {
                Some(session) => {
                    println!("Focus session started");
                    print_session(&session);
                }
                None => println!("A focus session is already running. Use 'ruhezeit focus stop' first."),
            }
            Ok(())
        }
        FocusAction::Stop => stop(rt).await,
        FocusAction::Status => status(rt).await,
        FocusAction::Toggle => match rt.ext.controller.toggle().await {
            Some(Toggled::Started(session)) => {
                println!("Focus session started");
                print_session(&session);
                Ok(())
            }
            Some(Toggled::Stopped(stopped)) => {
                finish(rt, stopped.session, stopped.summary_task).await
            }
            None => Ok(()),
        },
    }
}

async fn stop(rt: &Runtime) -> Result<()> {
    match rt.ext.controller.stop().await {
        Some(stopped) => finish(rt, stopped.session, stopped.summary_task).await,
        None => {
            println!("No focus session is running");
            Ok(())
        }
    }
}

async fn finish(
    rt: &Runtime,
    session: FocusSession,
    summary_task: tokio::task::JoinHandle<()>,
) -> Result<()> {
    println!("Focus session ended");
    print_session(&session);

    // The process exits after this command, so wait for the archive write
    if let Err(e) = summary_task.await {
        log::warn!("Summary task did not finish: {e}");
    }
    let summaries = rt.ext.store.summaries().await?;
    if let Some(record) = summaries.iter().find(|r| r.session == session) {
        println!("\nSummary: {}", record.summary);
    }
    Ok(())
}

async fn status(rt: &Runtime) -> Result<()> {
    let Some(session) = rt.ext.controller.get().await? else {
        println!("No focus session recorded yet");
        return Ok(());
    };

    if session.is_active() {
        println!("Focus session running");
    } else {
        println!("Last focus session");
    }
    print_session(&session);

    let rules = rt.host.dynamic_rules().await?;
    if !rules.is_empty() {
        let filters: Vec<&str> = rules.iter().map(|r| r.condition.url_filter.as_str()).collect();
        println!("  Blocking:  {}", filters.join(", "));
    }
    Ok(())
}

fn print_session(session: &FocusSession) {
    println!("  Started:   {}", format_millis(session.start));
    println!("  Length:    {} minutes", session.minutes);
    match session.end {
        Some(end) => println!("  Ended:     {}", format_millis(end)),
        None => println!("  Ends:      {}", format_millis(session.planned_end())),
    }
    println!("  Blocked:   {} domains", session.blocked);
    if !session.rule_ids.is_empty() {
        println!("  Rule IDs:  {:?}", session.rule_ids);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_then_stop_archives_summary() {
        let rt = Runtime::in_memory(None).await;
        handle_focus_command(
            &rt,
            FocusAction::Start {
                minutes: Some(25),
                block: vec!["twitter.com".to_string()],
            },
        )
        .await
        .unwrap();
        assert_eq!(rt.host.dynamic_rules().await.unwrap().len(), 1);

        handle_focus_command(&rt, FocusAction::Stop).await.unwrap();
        assert!(rt.host.dynamic_rules().await.unwrap().is_empty());

        let summaries = rt.ext.store.summaries().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].summary, ruhezeit_core::summary::NO_SUMMARY);
    }

    #[tokio::test]
    async fn test_toggle_uses_default_block_list() {
        let rt = Runtime::in_memory(None).await;
        handle_focus_command(&rt, FocusAction::Toggle).await.unwrap();
        let session = rt.ext.controller.active().await.unwrap();
        assert_eq!(session.blocked, 3);

        handle_focus_command(&rt, FocusAction::Toggle).await.unwrap();
        assert!(rt.ext.controller.active().await.is_none());
    }

    #[tokio::test]
    async fn test_stop_and_status_when_idle() {
        let rt = Runtime::in_memory(None).await;
        handle_focus_command(&rt, FocusAction::Stop).await.unwrap();
        handle_focus_command(&rt, FocusAction::Status).await.unwrap();
        assert!(rt.ext.store.summaries().await.unwrap().is_empty());
    }
}

//! Session summary archive commands

use anyhow::Result;
use clap::Subcommand;
use ruhezeit_storage::SummaryRecord;
use tabled::{Table, Tabled};

use super::helpers::{format_millis, truncate_str};
use super::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum SummaryAction {
    /// List archived summaries, newest first
    List {
        /// Show full summary text
        #[arg(short, long)]
        full: bool,
    },
    /// Delete every summary with this creation timestamp
    Delete {
        /// Creation timestamp in Unix milliseconds (see `list`)
        created: i64,
    },
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Created")]
    created: i64,
    #[tabled(rename = "Session")]
    started: String,
    #[tabled(rename = "Minutes")]
    minutes: u32,
    #[tabled(rename = "Summary")]
    summary: String,
}

impl SummaryRow {
    fn new(record: &SummaryRecord, full: bool) -> Self {
        Self {
            created: record.created,
            started: format_millis(record.session.start),
            minutes: record.session.minutes,
            summary: if full {
                record.summary.clone()
            } else {
                truncate_str(&record.summary, 60)
            },
        }
    }
}

/// Handle summary archive commands
pub async fn handle_summary_command(rt: &Runtime, action: SummaryAction) -> Result<()> {
    match action {
        SummaryAction::List { full } => {
            let summaries = rt.ext.store.summaries().await?;
            if summaries.is_empty() {
                println!("No session summaries archived yet");
                return Ok(());
            }
            let rows: Vec<SummaryRow> = summaries
                .iter()
                .map(|record| SummaryRow::new(record, full))
                .collect();
            println!("{}", Table::new(rows));
            Ok(())
        }
        SummaryAction::Delete { created } => {
            let removed = rt.ext.store.delete_summary(created).await?;
            if removed == 0 {
                println!("No summary created at {created}");
            } else {
                println!("Deleted {removed} summary record(s)");
            }
            Ok(())
        }
    }
}

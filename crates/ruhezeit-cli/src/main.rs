mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::focus::{handle_focus_command, FocusAction};
use commands::runtime::Runtime;
use commands::summaries::{handle_summary_command, SummaryAction};
use commands::tokens::{handle_token_command, TokenAction};

#[derive(Parser)]
#[command(name = "ruhezeit")]
#[command(about = "Tab organization and focus sessions", long_about = None)]
struct Cli {
    /// JSON snapshot of open tabs: [{"id", "url", "title"}]
    #[arg(long, global = true)]
    tabs: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer UI requests as JSON lines on stdin/stdout
    Serve,
    /// Group open tabs by domain
    Organize,
    /// Focus session management
    Focus {
        #[command(subcommand)]
        action: FocusAction,
    },
    /// Archived session summaries
    Summaries {
        #[command(subcommand)]
        action: SummaryAction,
    },
    /// AI capability tokens
    Tokens {
        #[command(subcommand)]
        action: TokenAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the protocol in `serve`, so logs go to stderr
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let rt = Runtime::open(cli.tabs).await?;

    match cli.command {
        Commands::Serve => commands::serve::serve_command(&rt).await,
        Commands::Organize => commands::organize::organize_command(&rt).await,
        Commands::Focus { action } => handle_focus_command(&rt, action).await,
        Commands::Summaries { action } => handle_summary_command(&rt, action).await,
        Commands::Tokens { action } => handle_token_command(&rt, action).await,
    }
}

//! AI capability token commands

use anyhow::Result;
use clap::Subcommand;
use ruhezeit_storage::TOKEN_NAMES;

use super::helpers::mask_secret;
use super::runtime::Runtime;

#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Print a token (prompt, summarizer, writer, translator)
    Get { name: String },
    /// Store a token; an empty value removes it
    Set { name: String, value: String },
    /// List which capabilities have a token
    List,
    /// Remove every token
    Clear,
}

pub async fn handle_token_command(rt: &Runtime, action: TokenAction) -> Result<()> {
    let store = &rt.ext.store;
    match action {
        TokenAction::Get { name } => {
            let tokens = store.tokens().await?;
            match tokens.get(&name) {
                Some(value) => println!("{name} = {value}"),
                None => println!("{name} is not set"),
            }
        }
        TokenAction::Set { name, value } => {
            let mut tokens = store.tokens().await?;
            tokens.set(&name, Some(value))?;
            store.save_tokens(&tokens).await?;
            if tokens.get(&name).is_some() {
                println!("Set {name} token");
            } else {
                println!("Removed {name} token");
            }
        }
        TokenAction::List => {
            let tokens = store.tokens().await?;
            println!("AI capability tokens:");
            for name in TOKEN_NAMES {
                match tokens.get(name) {
                    Some(value) => println!("  {name:<11} {}", mask_secret(value)),
                    None => println!("  {name:<11} (not set)"),
                }
            }
        }
        TokenAction::Clear => {
            store.clear_tokens().await?;
            println!("Cleared all tokens");
        }
    }
    Ok(())
}

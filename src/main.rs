use anyhow::Result;
use clap::Parser;

use tasktrack::api::ApiClient;
use tasktrack::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let client = ApiClient::new()?;

    match cli.command {
        Commands::Add { id, title } => {
            cli::handle_add(&client, id, title).await?;
        }
        Commands::Done { id } => {
            cli::handle_set_done(&client, id, true).await?;
        }
        Commands::Undo { id } => {
            cli::handle_set_done(&client, id, false).await?;
        }
        Commands::Remove { id } => {
            cli::handle_remove(&client, id).await?;
        }
        Commands::List => {
            cli::handle_list(&client).await?;
        }
        Commands::Theme => {
            cli::handle_theme().await?;
        }
        Commands::Tui => {
            cli::handle_tui(client).await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::api::{ApiClient, Task};
use crate::render;
use crate::theme::ThemeStore;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    Add {
        /// Unique numeric id for the task
        id: u64,

        /// Title text (everything after the id)
        #[arg(trailing_var_arg = true)]
        title: Vec<String>,
    },

    /// Mark a task as done
    Done {
        /// Id of the task to mark done
        id: u64,
    },

    /// Mark a task as not done
    Undo {
        /// Id of the task to mark not done
        id: u64,
    },

    /// Delete a task
    Remove {
        /// Id of the task to delete
        id: u64,
    },

    /// List all tasks
    List,

    /// Toggle the light/dark theme preference
    Theme,

    /// Launch the interactive TUI
    Tui,
}

pub async fn handle_add(client: &ApiClient, id: u64, title: Vec<String>) -> Result<()> {
    let title = title.join(" ").trim().to_string();

    // Presence checks happen before any request goes out.
    if id == 0 || title.is_empty() {
        return Err(anyhow::anyhow!("Please enter both ID and title"));
    }

    let task = Task {
        id,
        title,
        done: false,
    };

    client.create(&task).await?;
    println!("Task {id} added successfully");

    Ok(())
}

pub async fn handle_set_done(client: &ApiClient, id: u64, done: bool) -> Result<()> {
    client.set_done(id, done).await?;

    let status = if done { "done" } else { "not done" };
    println!("Task {id} marked {status}");

    Ok(())
}

pub async fn handle_remove(client: &ApiClient, id: u64) -> Result<()> {
    client.remove(id).await?;
    println!("Task {id} removed successfully");

    Ok(())
}

pub async fn handle_list(client: &ApiClient) -> Result<()> {
    let tasks = client.list().await?;

    for line in render::list_lines(&render::rows(&tasks, None)) {
        println!("{line}");
    }

    Ok(())
}

pub async fn handle_theme() -> Result<()> {
    let store = ThemeStore::open()?;
    let theme = store.toggle().await?;

    println!("Theme set to {} {}", theme.as_str(), theme.toggle_label());

    Ok(())
}

pub async fn handle_tui(client: ApiClient) -> Result<()> {
    if !atty::is(atty::Stream::Stdout) {
        return Err(anyhow::anyhow!("The TUI requires an interactive terminal"));
    }

    let store = ThemeStore::open()?;
    crate::tui::run_tui(client, store)
        .await
        .map_err(|e| anyhow::anyhow!("TUI error: {}", e))
}

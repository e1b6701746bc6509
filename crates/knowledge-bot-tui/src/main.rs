use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use knowledge_bot_core::{config::BASE_URL_ENV, submit_new_message, Config, Conversation, QueryClient};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use logging::LogTarget;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "knowledge-bot", version)]
#[command(about = "Terminal chat client for a Knowledge Bot question-answering service")]
struct Cli {
    /// Base URL of the knowledge service (overrides the environment and config file)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a single question and print the answer with its sources
    Ask {
        /// Your question
        question: String,
    },
    /// Show the resolved configuration, or save a base URL
    Config {
        /// Base URL to store in the config file
        #[arg(long)]
        set_base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_target = match cli.command {
        None => LogTarget::File,
        Some(_) => LogTarget::Stderr,
    };
    logging::init(log_target)?;

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not read config file, using defaults");
        Config::new()
    });
    let base_url = config.resolve_base_url(cli.base_url.as_deref());
    let client = QueryClient::new(base_url.as_deref());

    match cli.command {
        None => run_chat(client).await,
        Some(Commands::Ask { question }) => ask(&client, &question).await,
        Some(Commands::Config { set_base_url }) => show_or_save_config(base_url, set_base_url),
    }
}

async fn run_chat(client: QueryClient) -> Result<()> {
    if client.base_url().is_none() {
        tracing::warn!("No base URL configured, queries will fail until one is set");
    }
    tracing::info!(base_url = ?client.base_url(), "Starting chat session");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let tx = events.sender();
    let mut app = App::new(client);

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event, &tx)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!(turns = app.conversation.len(), "Chat session ended");
    result
}

async fn ask(client: &QueryClient, question: &str) -> Result<()> {
    let mut conversation = Conversation::new();

    if submit_new_message(&mut conversation, client, question).await.is_none() {
        println!("{}", "Nothing to ask: the question is empty".yellow());
        return Ok(());
    }

    let Some(answer) = conversation.last() else {
        return Ok(());
    };

    if answer.error {
        eprintln!("{}", answer.content.red());
        std::process::exit(1);
    }

    println!("{}", answer.content);

    if !answer.sources.is_empty() {
        println!("\n{}", "Sources:".bold().blue());
        for (i, source) in answer.sources.iter().enumerate() {
            println!("  {} {}", format!("[{}]", i + 1).bold().yellow(), source.label());
        }
    }

    Ok(())
}

fn show_or_save_config(resolved: Option<String>, set_base_url: Option<String>) -> Result<()> {
    let path = Config::get_config_path()?;

    if let Some(url) = set_base_url {
        Config::save_base_url(url.trim())?;
        println!("{} {}", "Saved base URL to".green(), path.display());
        return Ok(());
    }

    println!("{}", "Knowledge Bot configuration".bold().blue());
    println!("{}", "=".repeat(30).dimmed());
    println!("  Config file: {}", path.display());
    match resolved {
        Some(url) => println!("  Base URL:    {}", url.green()),
        None => println!(
            "  Base URL:    {} (set {} or run `knowledge-bot config --set-base-url <url>`)",
            "not configured".red(),
            BASE_URL_ENV.bold()
        ),
    }
    if let Ok(path) = logging::log_file_path() {
        println!("  Log file:    {}", path.display());
    }

    Ok(())
}

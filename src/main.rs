use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

use folio_chat::config::Config;
use folio_chat::history::load_history;
use folio_chat::logging;
use folio_chat::session::SessionManager;
use folio_chat::storage::{FileStore, MemoryStore, SessionStore};
use folio_chat::transport::ChatTransport;
use folio_chat::{ChatMessage, ChatWidget, ConversationRole};

#[derive(Parser)]
#[command(name = "folio-chat")]
#[command(version)]
#[command(about = "Chat with a portfolio's AI assistant", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config file and CHAT_API_URL)
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Config file to use instead of ~/.folio-chat/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat {
        /// Named tab to resume; without it every run is a new tab
        #[arg(long)]
        tab: Option<String>,
    },
    /// Print the restored history of a tab
    History {
        /// Named tab to read; without it a fresh tab with no history is used
        #[arg(long)]
        tab: Option<String>,
    },
    /// Print the session id of a tab
    Session {
        /// Named tab to read; without it a fresh session id is minted
        #[arg(long)]
        tab: Option<String>,
    },
    /// Check that the backend is up
    Health,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from(path)?;
            config.apply_env(|key| std::env::var(key).ok());
            config
        }
        None => Config::load()?,
    };
    Ok(config.with_backend(cli.backend.clone()))
}

fn open_store(config: &Config, tab: Option<&str>) -> Result<Box<dyn SessionStore>> {
    match tab {
        Some(name) => Ok(Box::new(FileStore::open(&config.tabs_dir(), name)?)),
        None => Ok(Box::new(MemoryStore::new())),
    }
}

fn print_message(message: &ChatMessage) {
    match message.role {
        ConversationRole::User => println!("👤 {}", message.content),
        ConversationRole::Assistant => println!("🤖 {}", message.content),
    }
}

fn print_suggestions(widget: &ChatWidget) {
    let questions = widget.suggested_questions();
    if questions.is_empty() {
        return;
    }
    println!();
    println!("💡 Suggested questions:");
    for (i, q) in questions.iter().enumerate() {
        println!("  {}. {}", i + 1, q);
    }
}

fn prompt(widget: &ChatWidget) -> Result<()> {
    print!("{} > ", widget.placeholder());
    std::io::stdout().flush().context("Failed to flush stdout")
}

async fn run_chat(config: &Config, tab: Option<&str>) -> Result<()> {
    let store = open_store(config, tab)?;
    let mut widget = ChatWidget::new(config, store).context("Failed to build HTTP client")?;
    widget.open();
    widget.initialize().await;

    for message in widget.transcript().iter() {
        print_message(message);
    }
    print_suggestions(&widget);
    println!("(/close hides the chat, /open shows it again, /quit exits)");
    prompt(&widget)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                match line.trim() {
                    "/quit" | "/exit" => break,
                    "/open" => {
                        widget.open();
                        for message in widget.transcript().iter() {
                            print_message(message);
                        }
                    }
                    "/close" => {
                        widget.close();
                        println!("💬 Chat hidden. Type /open to bring it back.");
                    }
                    _ if !widget.is_open() => {
                        println!("💬 Chat is closed. Type /open first.");
                    }
                    text => {
                        let choice = text
                            .parse::<usize>()
                            .ok()
                            .and_then(|n| n.checked_sub(1))
                            .filter(|i| *i < widget.suggested_questions().len());
                        let accepted = match choice {
                            Some(i) => widget.submit_suggestion(i).await,
                            None => {
                                widget.set_input(text);
                                widget.submit_input().await
                            }
                        };
                        if accepted {
                            if let Some(sent) = widget.transcript().last() {
                                print_message(sent);
                            }
                            println!("🤖 …");
                            continue;
                        } else if widget.is_loading() {
                            println!("⏳ Still waiting for the last answer.");
                        }
                    }
                }
                prompt(&widget)?;
            }
            Some(reply) = widget.wait_reply(), if widget.is_loading() => {
                if widget.is_open() {
                    print_message(&reply);
                }
                prompt(&widget)?;
            }
        }
    }

    println!("👋 Bye!");
    Ok(())
}

async fn run_history(config: &Config, tab: Option<&str>) -> Result<()> {
    let store = open_store(config, tab)?;
    let Some(session_id) = store.get(folio_chat::session::SESSION_KEY) else {
        println!("📭 Tab '{}' has no session yet.", tab.unwrap_or("(new)"));
        return Ok(());
    };

    let transport = ChatTransport::new(config).context("Failed to build HTTP client")?;
    let messages = load_history(&transport, &session_id).await;
    if messages.is_empty() {
        println!("📭 No history for session {}", session_id);
        return Ok(());
    }

    println!("📜 History for session {}:\n", session_id);
    for message in &messages {
        print_message(message);
    }
    Ok(())
}

fn run_session(config: &Config, tab: Option<&str>) -> Result<()> {
    let store = open_store(config, tab)?;
    let mut session = SessionManager::new(store);
    println!("{}", session.get_or_create_session_id());
    Ok(())
}

async fn run_health(config: &Config) -> Result<()> {
    let transport = ChatTransport::new(config).context("Failed to build HTTP client")?;
    match transport.health().await {
        Ok(status) => {
            println!(
                "✅ {} is {} ({})",
                transport.base_url(),
                status.status,
                status.service.as_deref().unwrap_or("unknown service")
            );
            Ok(())
        }
        Err(e) => {
            anyhow::bail!("❌ {} is unreachable: {}", transport.base_url(), e)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;
    let config = load_config(&cli)?;

    match &cli.command {
        None => run_chat(&config, None).await,
        Some(Commands::Chat { tab }) => run_chat(&config, tab.as_deref()).await,
        Some(Commands::History { tab }) => run_history(&config, tab.as_deref()).await,
        Some(Commands::Session { tab }) => run_session(&config, tab.as_deref()),
        Some(Commands::Health) => run_health(&config).await,
    }
}

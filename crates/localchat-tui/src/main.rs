//! LocalChat terminal client.
//!
//! Chats with models served by a local LocalChat backend, keeps the
//! conversation history on disk, and uploads documents to the backend's
//! knowledge base.

use std::error::Error;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::supports_keyboard_enhancement;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod backend;
mod clipboard;
mod commands;
mod config;
mod event;
mod render;
mod state;
mod store;

use app::App;
use config::Config;
use event::{BackendCommand, UiEvent};
use localchat_client::{ApiClient, DEFAULT_API_URL};
use localchat_core::ConversationManager;
use store::FileStore;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "localchat=info";

#[derive(Parser)]
#[command(name = "localchat")]
#[command(about = "Chat with local models from the terminal")]
#[command(version)]
struct Cli {
    /// Base URL of the LocalChat backend
    #[arg(long, env = "LOCALCHAT_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Directory holding conversations and settings
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log file (default: <data dir>/localchat.log)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Wait for complete replies instead of streaming them
    #[arg(long, global = true)]
    no_stream: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Interactive chat (default)
    Chat,

    /// Print or save all conversations as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Export only the conversation with this id
        #[arg(long)]
        conversation: Option<String>,
    },

    /// Replace all conversations with the contents of a JSON export
    Import {
        /// File produced by `export`
        file: PathBuf,
    },

    /// List the models the backend offers
    Models,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config {
            api_url: self.api_url.clone(),
            log_file: self.log_file.clone(),
            streaming: !self.no_stream,
            ..Config::default()
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.config();

    // Logs go to a file so they never draw over the terminal UI.
    init_logging(&config.log_path());

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat_tui(config)?,
        Commands::Export {
            output,
            conversation,
        } => commands::export(&config.data_dir, conversation.as_deref(), output.as_deref())?,
        Commands::Import { file } => {
            let count = commands::import(&config.data_dir, &file)?;
            println!("Imported {} conversations", count);
        }
        Commands::Models => commands::list_models(&config.api_url)?,
    }

    Ok(())
}

fn init_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(path) else {
        return;
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_writer(std::sync::Mutex::new(file))
        .with_env_filter(filter)
        .with_ansi(false)
        .init();
}

fn run_chat_tui(config: Config) -> Result<(), Box<dyn Error>> {
    info!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "Starting chat TUI");

    let store = FileStore::open(&config.data_dir)?;
    let manager = ConversationManager::load(store)?;
    let client = ApiClient::new(&config.api_url);

    // Create channels for UI <-> backend communication
    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>(100);
    let (cmd_tx, cmd_rx) = mpsc::channel::<BackendCommand>(100);

    // Spawn background thread with its own tokio runtime
    let bg_handle = std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        rt.block_on(backend::run_backend(client, ui_tx, cmd_rx));
    });

    // Initialize terminal (enters alternate screen, enables raw mode)
    let terminal = ratatui::init();
    let enhanced_keys = enable_input_extensions();

    let mut app = App::new(manager, config.send_mode(), ui_rx, cmd_tx);
    let result = app.run(terminal);

    disable_input_extensions(enhanced_keys);
    ratatui::restore();

    // Wait for background thread to finish
    let _ = bg_handle.join();

    info!("TUI shutdown complete");

    result.map_err(|e| e.into())
}

/// Turn on bracketed paste and, where supported, distinct Shift+Enter.
fn enable_input_extensions() -> bool {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, EnableBracketedPaste);
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        );
    }
    enhanced
}

fn disable_input_extensions(enhanced: bool) {
    let mut stdout = io::stdout();
    if enhanced {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    let _ = execute!(stdout, DisableBracketedPaste);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_chat() {
        let cli = Cli::try_parse_from(["localchat", "--api-url", "http://box:9000"]).unwrap();
        assert!(cli.command.is_none());
        let config = cli.config();
        assert_eq!(config.api_url, "http://box:9000");
        assert!(config.streaming);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "localchat",
            "export",
            "-o",
            "out.json",
            "--no-stream",
            "--data-dir",
            "/tmp/lc",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Export {
                output: Some(PathBuf::from("out.json")),
                conversation: None,
            })
        );
        let config = cli.config();
        assert!(!config.streaming);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/lc"));
    }

    #[test]
    fn test_import_requires_file() {
        assert!(Cli::try_parse_from(["localchat", "import"]).is_err());
        let cli = Cli::try_parse_from(["localchat", "import", "backup.json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Import {
                file: PathBuf::from("backup.json")
            })
        );
    }
}

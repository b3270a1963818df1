mod logging;
mod repl;
mod settings;

use std::io::Read;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use cliptube_core::config::AppConfig;
use cliptube_core::persist::HistoryFile;
use cliptube_core::History;
use cliptube_scan::find_video_ids;

#[derive(Parser)]
#[command(name = "cliptube")]
#[command(about = "Watch the clipboard for YouTube links and play them")]
#[command(version)]
struct Cli {
    /// Log debug output to stderr as well as the log file.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Watch the clipboard and accept commands on stdin (the default).
    Run,
    /// Print the canonical URL of every video mentioned in TEXT (or stdin).
    Scan { text: Option<String> },
    /// Show or clear the recently opened list.
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Print the effective configuration.
    Show,
    /// Set KEY (e.g. `history.size`) to VALUE and save.
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init(cli.verbose)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => repl::run().await,
        Command::Scan { text } => scan(text),
        Command::History { action } => history(action.unwrap_or(HistoryAction::List)),
        Command::Config { action } => config(action.unwrap_or(ConfigAction::Show)),
    }
}

fn scan(text: Option<String>) -> Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            buf
        }
    };
    for id in find_video_ids(&text) {
        println!("{}", id.canonical_url());
    }
    Ok(())
}

fn history(action: HistoryAction) -> Result<()> {
    let config = AppConfig::load()?;
    let file = HistoryFile::new(AppConfig::history_path());

    match action {
        HistoryAction::List => {
            let history = file.load(config.history.size);
            if history.is_empty() {
                println!("No recently opened videos.");
            }
            for (n, entry) in history.items().iter().enumerate() {
                println!("{:>3}. {}  {}", n + 1, entry.title, entry.id.canonical_url());
            }
        }
        HistoryAction::Clear => {
            file.save(&History::new(config.history.size))?;
            tracing::info!(path = %file.path().display(), "History cleared");
            println!("History cleared.");
        }
    }
    Ok(())
}

fn config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => println!("{}", AppConfig::config_path().display()),
        ConfigAction::Show => {
            let config = AppConfig::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let mut config = AppConfig::load()?;
            settings::apply(&mut config, &key, &value)?;
            let config = config.sanitized();
            config.save()?;
            println!("{key} updated.");
        }
    }
    Ok(())
}

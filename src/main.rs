use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use fight_tracker_lib::commands::{players, screen, AppState};
use fight_tracker_lib::models::token::OcrCapture;
use fight_tracker_lib::services::config::ConfigManager;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fight-tracker")]
#[command(about = "Read battle-result screenshots and keep player fight statistics", long_about = None)]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true, env = "FIGHT_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one OCR capture and print the result
    Parse {
        /// OCR capture JSON file
        capture: PathBuf,
    },

    /// Submit one or more captures of the same fight
    Submit {
        /// OCR capture JSON files
        #[arg(required = true)]
        captures: Vec<PathBuf>,

        /// Submitter identity
        #[arg(long, env = "FIGHT_TRACKER_SUBMITTER", default_value = "local")]
        submitter: String,

        /// Move a name to the winners before confirming
        #[arg(long = "winner")]
        winners: Vec<String>,

        /// Move a name to the losers before confirming
        #[arg(long = "loser")]
        losers: Vec<String>,

        /// Drop a name from the result before confirming
        #[arg(long = "remove")]
        removed: Vec<String>,

        /// Count the result into player statistics
        #[arg(long)]
        confirm: bool,
    },

    /// List registered players
    Players,

    /// Show one player by name or alias
    Show { name: String },

    /// List players with unpaid results
    Unpaid,

    /// Mark every unpaid result as paid
    Pay,

    /// Register a player
    AddPlayer { name: String },

    /// Remove a player
    RemovePlayer { name: String },

    /// Give a player an alternative name
    AddAlias { player: String, alias: String },
}

fn read_capture(path: &Path) -> Result<OcrCapture> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read capture {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse capture {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_file(path),
        None => ConfigManager::new()?,
    };
    let config = manager.load_validated()?;
    fight_tracker_lib::init_logging(&config.logging)?;
    tracing::debug!(config = %manager.config_file_path().display(), "fight-tracker v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::from_config(&config).map_err(|e| anyhow!(e))?;

    match cli.command {
        Commands::Parse { capture } => {
            let capture = read_capture(&capture)?;
            let summary = screen::parse_screen(&state, &capture)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("{}", summary);
        }
        Commands::Submit {
            captures,
            submitter,
            winners,
            losers,
            removed,
            confirm,
        } => {
            let captures = captures
                .iter()
                .map(|path| read_capture(path))
                .collect::<Result<Vec<_>>>()?;

            let mut summary = screen::submit_screens(&state, &submitter, &captures)
                .await
                .map_err(|e| anyhow!(e))?;
            for name in &winners {
                summary = screen::add_winner(&state, &submitter, name)
                    .await
                    .map_err(|e| anyhow!(e))?;
            }
            for name in &losers {
                summary = screen::add_loser(&state, &submitter, name)
                    .await
                    .map_err(|e| anyhow!(e))?;
            }
            for name in &removed {
                summary = screen::remove_participant(&state, &submitter, name)
                    .await
                    .map_err(|e| anyhow!(e))?;
            }
            println!("{}", summary);

            if confirm {
                let outcome = screen::confirm(&state, &submitter)
                    .await
                    .map_err(|e| anyhow!(e))?;
                println!("{}", outcome);
            } else {
                screen::cancel(&state, &submitter)
                    .await
                    .map_err(|e| anyhow!(e))?;
                println!("Not counted (run again with --confirm to save)");
            }
        }
        Commands::Players => {
            for player in players::list_players(&state).await.map_err(|e| anyhow!(e))? {
                println!("{}\n", player);
            }
        }
        Commands::Show { name } => {
            let player = players::show_player(&state, &name)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("{}", player);
        }
        Commands::Unpaid => {
            let unpaid = players::list_unpaid(&state).await.map_err(|e| anyhow!(e))?;
            if unpaid.is_empty() {
                println!("Nothing to pay");
            }
            for player in unpaid {
                println!("{}\n", player);
            }
        }
        Commands::Pay => {
            let count = players::pay(&state).await.map_err(|e| anyhow!(e))?;
            println!("Marked {} player(s) as paid", count);
        }
        Commands::AddPlayer { name } => {
            let player = players::add_player(&state, &name)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("Registered {}", player.name);
        }
        Commands::RemovePlayer { name } => {
            if players::remove_player(&state, &name)
                .await
                .map_err(|e| anyhow!(e))?
            {
                println!("Removed {}", name);
            } else {
                println!("No player named {}", name);
            }
        }
        Commands::AddAlias { player, alias } => {
            players::add_alias(&state, &player, &alias)
                .await
                .map_err(|e| anyhow!(e))?;
            println!("{} is now also known as {}", player, alias);
        }
    }

    Ok(())
}

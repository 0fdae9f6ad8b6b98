//! Binary entrypoint for the DM Assistant client.
//!
//! Commands:
//! - `tui` (default) - the tabbed terminal client
//! - `parse <FILE|->` - print the fields extracted from an NPC write-up as JSON
//! - `fill-plan <FILE|->` - print the template replacements as JSON
//! - `export <FILE|->` - copy and fill the Google Docs template, print the URL
//! - `config` - print the effective configuration

use std::error::Error;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use dm_assistant::config::AppConfig;
use dm_assistant::core::docs::NpcDocumentExporter;
use dm_assistant::core::logging::{self, print_error, print_success};
use dm_assistant::core::npc::{FillPlan, NpcDraft, RegexNpcExtractor};
use dm_assistant::tui::{self, events::Focus};

#[derive(Parser)]
#[command(name = "dm-assistant")]
#[command(about = "Terminal client for the DM Assistant backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Tab shown when the TUI starts (chat, npcs, lore, rulebooks, maps)
    #[arg(short, long, default_value = "chat")]
    tab: Focus,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the terminal client
    Tui,
    /// Extract NPC fields from a write-up ("-" reads stdin)
    Parse { input: String },
    /// Show the placeholder replacements for a write-up ("-" reads stdin)
    FillPlan { input: String },
    /// Export a write-up to a filled Google Docs copy ("-" reads stdin)
    Export { input: String },
    /// Print the effective configuration as TOML (token masked)
    Config,
}

fn read_input(input: &str) -> io::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(Path::new(input))
    }
}

async fn run_command(command: Commands, config: &AppConfig, tab: Focus) -> Result<(), Box<dyn Error>> {
    match command {
        Commands::Tui => tui::run(config, tab).await?,
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Parse { input } => {
            let text = read_input(&input)?;
            let fields = NpcDraft::new(text).fields(RegexNpcExtractor::shared());
            println!("{}", serde_json::to_string_pretty(&fields)?);
        }
        Commands::FillPlan { input } => {
            let text = read_input(&input)?;
            let fields = NpcDraft::new(text).fields(RegexNpcExtractor::shared());
            println!("{}", serde_json::to_string_pretty(&FillPlan::from_fields(&fields))?);
        }
        Commands::Export { input } => {
            let draft = NpcDraft::new(read_input(&input)?);
            let exporter = NpcDocumentExporter::from_config(&config.google)
                .map_err(|e| format!("Google Docs export unavailable: {e}"))?;
            let doc = exporter
                .export(draft)
                .await
                .map_err(|e| format!("Export failed: {e}"))?;
            print_success(&format!("Created \"{}\" ({} fields filled)", doc.title, doc.filled));
            println!("{}", doc.url);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref());
    let command = cli.command.unwrap_or(Commands::Tui);

    // Held until main returns so buffered log lines reach the file.
    let _log_guard = match command {
        Commands::Tui => logging::init_tui(&config.logs_dir()),
        _ => logging::init(&config.logs_dir()),
    };
    tracing::info!(version = dm_assistant::VERSION, "dm-assistant starting");

    match run_command(command, &config, cli.tab).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use backbone::BackboneConfig;
use catalog::{EntityCatalog, EntityId};
use dialogue::{PenaltyState, Turn};
use session::TurnOrchestrator;

/// ConvRecs - conversational recommendation engine
#[derive(Parser)]
#[command(name = "conv-recs")]
#[command(
    about = "Conversational recommender driven by a pretrained sequence model",
    long_about = None
)]
struct Cli {
    /// Path to the dataset directory (entity tables)
    #[arg(short, long, default_value = "data/redial")]
    data_dir: PathBuf,

    /// Address of the model-inference service
    #[arg(long, default_value = "http://localhost:50051")]
    model_addr: String,

    /// Backbone model name
    #[arg(long, default_value = "barcor_redial")]
    model: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively with the recommender
    Chat,

    /// Generate a single reply for a message
    Reply {
        /// The user message
        #[arg(long)]
        message: String,

        /// JSON file with prior turns (array of {role, text})
        #[arg(long)]
        history_file: Option<PathBuf>,

        /// JSON file carrying the penalty state between calls;
        /// read if present, updated after the reply
        #[arg(long)]
        state_file: Option<PathBuf>,
    },

    /// Search the entity catalog by name
    Search {
        /// Substring to search for (case-insensitive)
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let Cli {
        data_dir,
        model_addr,
        model,
        command,
    } = Cli::parse();

    match command {
        Commands::Chat => handle_chat(&model, &data_dir, &model_addr).await?,
        Commands::Reply {
            message,
            history_file,
            state_file,
        } => {
            handle_reply(
                &model,
                &data_dir,
                &model_addr,
                &message,
                history_file,
                state_file,
            )
            .await?
        }
        Commands::Search { name } => handle_search(&data_dir, &name)?,
    }

    Ok(())
}

/// Load the catalog, connect to the model service and build the core.
async fn connect(model: &str, data_dir: &Path, model_addr: &str) -> Result<TurnOrchestrator> {
    println!(
        "Loading entity catalog from {} and connecting to {}...",
        data_dir.display(),
        model_addr
    );
    let start = Instant::now();
    let orchestrator =
        TurnOrchestrator::connect(model, data_dir, model_addr, BackboneConfig::default())
            .await
            .context("Failed to construct the recommender")?;
    println!("{} Ready in {:?}", "✓".green(), start.elapsed());
    Ok(orchestrator)
}

/// Handle the 'chat' command: a REPL that owns the turn history and the
/// penalty state and threads them through every reply.
async fn handle_chat(model: &str, data_dir: &Path, model_addr: &str) -> Result<()> {
    let orchestrator = connect(model, data_dir, model_addr).await?;
    println!("{}", "Chat started - empty line exits.".bold().blue());

    let mut history: Vec<Turn> = Vec::new();
    let mut state: Option<PenaltyState> = None;
    let stdin = io::stdin();

    loop {
        print!("{}", "you> ".green());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            break;
        }

        let (response, new_state) = orchestrator.reply(message, &history, state.take()).await?;
        println!("{} {}", "bot>".cyan(), response);

        history.push(Turn::user(message));
        history.push(Turn::system(&response));
        state = Some(new_state);
    }

    Ok(())
}

/// Handle the 'reply' command: one turn, history and state from files.
async fn handle_reply(
    model: &str,
    data_dir: &Path,
    model_addr: &str,
    message: &str,
    history_file: Option<PathBuf>,
    state_file: Option<PathBuf>,
) -> Result<()> {
    let orchestrator = connect(model, data_dir, model_addr).await?;

    let history: Vec<Turn> = match &history_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Reading history file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Parsing history file {}", path.display()))?
        }
        None => Vec::new(),
    };

    let state: Option<PenaltyState> = match &state_file {
        Some(path) if path.exists() => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Reading state file {}", path.display()))?;
            Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("Parsing state file {}", path.display()))?,
            )
        }
        _ => None,
    };

    let (response, state) = orchestrator.reply(message, &history, state).await?;
    println!("{response}");

    if let Some(path) = state_file {
        std::fs::write(&path, serde_json::to_string(&state)?)
            .with_context(|| format!("Writing state file {}", path.display()))?;
    }

    Ok(())
}

/// Handle the 'search' command: substring lookup over the entity table.
fn handle_search(data_dir: &Path, name: &str) -> Result<()> {
    let catalog = EntityCatalog::load_from_dir(data_dir)?;
    let needle = name.to_lowercase();

    let mut matches: Vec<(EntityId, &str, bool)> = catalog
        .surface_forms()
        .filter(|form| form.to_lowercase().contains(&needle))
        .filter_map(|form| catalog.id_of(form).map(|id| (id, form, catalog.is_item(id))))
        .collect();

    // Exact matches first, then alphabetically.
    matches.sort_by(|a, b| {
        let a_exact = a.1.to_lowercase() == needle;
        let b_exact = b.1.to_lowercase() == needle;
        b_exact.cmp(&a_exact).then_with(|| a.1.cmp(b.1))
    });

    println!("{}", format!("Search results for '{name}':").bold().blue());
    for (id, form, is_item) in matches.iter().take(20) {
        let tag = if *is_item { "item" } else { "concept" };
        println!("{id}: {form} [{tag}]");
    }
    if matches.is_empty() {
        println!("No entities matched.");
    }

    Ok(())
}

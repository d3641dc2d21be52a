//! sheet_agent - ask an LLM questions about a Google Sheets worksheet

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn, Level};

use sheet_agent::agent::{run_prompts, TEST_PROMPTS};
use sheet_agent::csv_handler::CSVHandler;
use sheet_agent::{logging, settings, AppConfig, GeminiAgent, SheetLoader, SheetRef};

#[derive(Parser)]
#[command(name = "sheet_agent")]
#[command(
    author,
    version,
    about = "Load a Google Sheets worksheet and ask an LLM agent questions about it"
)]
struct Cli {
    /// Spreadsheet key (the id in the sheet's URL)
    #[arg(short = 'k', long, env = "SHEET_AGENT_SHEET_KEY")]
    sheet_key: Option<String>,

    /// Worksheet (tab) name
    #[arg(short, long, env = "SHEET_AGENT_WORKSHEET")]
    worksheet: Option<String>,

    /// Service account key file
    #[arg(short, long)]
    credentials: Option<PathBuf>,

    /// Gemini model name
    #[arg(short, long)]
    model: Option<String>,

    /// Config file (default: ./sheet-agent.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prompt to run; repeat for several. Defaults to the built-in test suite
    #[arg(short, long = "prompt")]
    prompts: Vec<String>,

    /// Print the first N rows as CSV before prompting
    #[arg(long, value_name = "N")]
    preview: Option<usize>,

    /// Write the loaded table to a CSV file
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing, so .env values can fill clap's env-backed flags.
    let env_file = settings::load_env_file(None);
    let cli = Cli::parse();
    logging::init(if cli.verbose { Level::DEBUG } else { Level::WARN });
    match env_file {
        Ok(Some(path)) => debug!(path = %path.display(), "Loaded environment file"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable environment file"),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(key) = cli.sheet_key {
        config.sheet_key = key;
    }
    if let Some(worksheet) = cli.worksheet {
        config.worksheet = worksheet;
    }
    if let Some(path) = cli.credentials {
        config.loader.credentials_path = path;
    }
    if let Some(model) = cli.model {
        config.agent.model = model;
    }

    println!("--- Starting sheet agent ---");

    // The key is checked before anything is fetched.
    let agent = match GeminiAgent::from_env(&config.agent) {
        Ok(agent) => agent,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            eprintln!("Please set your API key to run the agent.");
            return Ok(ExitCode::FAILURE);
        }
    };
    println!("Agent ready (model: {})", agent.model());

    if config.sheet_key.trim().is_empty() || config.worksheet.trim().is_empty() {
        eprintln!("ERROR: Please provide both a Sheet Key and a Worksheet Name.");
        eprintln!("Use --sheet-key/--worksheet, SHEET_AGENT_* variables or sheet-agent.toml.");
        return Ok(ExitCode::FAILURE);
    }

    let sheet = SheetRef::new(config.sheet_key.clone(), config.worksheet.clone());
    let loader = SheetLoader::new(config.loader.clone());

    println!("Loading '{}' from Google Sheets...", sheet);
    let loaded = match loader.load(&sheet).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("ERROR: {}", e.report());
            return Ok(ExitCode::FAILURE);
        }
    };
    let table = loaded.table;
    println!(
        "Data loaded successfully! {} rows, {} columns.",
        table.row_count(),
        table.column_count()
    );

    if let Some(n) = cli.preview {
        println!("\n--- Data Preview ---");
        let stdout = io::stdout();
        CSVHandler::new()
            .write_table(&table.head(n), stdout.lock())
            .context("Failed to print preview")?;
        println!("--------------------");
    }

    if let Some(path) = &cli.export {
        CSVHandler::new()
            .export(&table, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Table written to {}", path.display());
    }

    let prompts: Vec<String> = if cli.prompts.is_empty() {
        TEST_PROMPTS.iter().map(|p| p.to_string()).collect()
    } else {
        cli.prompts
    };

    let failures = run_prompts(&agent, &table, &prompts, io::stdout().lock())
        .await
        .context("Failed to write agent output")?;

    if failures > 0 {
        eprintln!("{} of {} prompts failed.", failures, prompts.len());
    }
    Ok(ExitCode::SUCCESS)
}

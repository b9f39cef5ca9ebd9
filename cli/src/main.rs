mod formatter;
mod loader;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use derived::{BoxError, Engine};
use formatter::Formatter;
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "derive")]
#[command(about = "Derive attributes, rules and triggers from JSON documents.")]
#[command(
    long_about = "Every derived attribute is a subject-verb-object sentence evaluated against a JSON document.\nThe CLI loads sentences from a CSV or JSON file and evaluates them against a document."
)]
#[command(version)]
struct Cli {
    /// Log evaluation progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate sentences against a document and display the results
    ///
    /// Sentence files are CSV (header: attr,subject,verb,obj,action,params)
    /// or a JSON list of records.
    Run {
        /// Sentence definitions (.csv or .json)
        #[arg(short, long)]
        sentences: PathBuf,
        /// JSON document to evaluate against
        #[arg(short, long)]
        document: PathBuf,
        /// What to derive
        #[arg(short, long, value_enum, default_value_t = Mode::Attributes)]
        mode: Mode,
        /// Output raw JSON (for piping to other tools)
        #[arg(short = 'r', long)]
        raw: bool,
        /// Date the day-window verbs count back from (default: today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
    },
    /// Validate a sentence file and show its evaluation order
    Check {
        /// Sentence definitions (.csv or .json)
        #[arg(short, long)]
        sentences: PathBuf,
    },
    /// List every verb
    Verbs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Every public attribute
    Attributes,
    /// Public boolean attributes only
    Rules,
    /// Dispatch the actions of triggers that fire
    Triggers,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Run {
            sentences,
            document,
            mode,
            raw,
            today,
        } => run_command(sentences, document, *mode, *raw, *today),
        Commands::Check { sentences } => check_command(sentences),
        Commands::Verbs => {
            print!("{}", Formatter::default().format_verbs());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with_writer(io::stderr)
        .init();
}

fn load_engine(sentences: &Path) -> Result<Engine> {
    let records = loader::load_sentences(sentences)?;
    debug!(count = records.len(), path = %sentences.display(), "loaded sentences");
    Ok(Engine::from_records(records)?)
}

fn run_command(
    sentences: &Path,
    document: &Path,
    mode: Mode,
    raw: bool,
    today: Option<NaiveDate>,
) -> Result<()> {
    let mut engine = load_engine(sentences)?;
    if let Some(date) = today {
        engine = engine.with_reference_date(date);
    }
    let document = loader::load_document(document)?;
    let formatter = Formatter::default();

    match mode {
        Mode::Attributes => {
            let derived = engine.derive(&document)?;
            if raw {
                println!("{}", serde_json::to_string_pretty(&derived)?);
            } else {
                print!("{}", formatter.format_attributes(&derived));
            }
        }
        Mode::Rules => {
            let rules = engine.derive_rules(&document)?;
            if raw {
                println!("{}", serde_json::to_string_pretty(&rules)?);
            } else {
                print!("{}", formatter.format_rules(&rules));
            }
        }
        Mode::Triggers => {
            // Actions are only reported here; the CLI has no sink of its own
            let outcome = engine.derive_triggers(
                &document,
                &mut |action: &str, params: &Map<String, Value>| -> Result<(), BoxError> {
                    debug!(action, params = params.len(), "action dispatched");
                    Ok(())
                },
            )?;
            let mut stdout = io::stdout().lock();
            for action in &outcome.actions {
                writeln!(stdout, "{}", formatter.format_action(action))?;
            }
            if !raw {
                write!(stdout, "{}", formatter.format_attributes(&outcome.attributes))?;
            }
        }
    }

    Ok(())
}

fn check_command(sentences: &Path) -> Result<()> {
    let engine = load_engine(sentences)?;
    let order = engine.evaluation_order()?;
    println!("{} sentences are valid", engine.sentences().len());
    println!();
    print!("{}", Formatter::default().format_order(&order));
    Ok(())
}

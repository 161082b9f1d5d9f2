//! Fieldbase Command-Line Client
//!
//! Validates and compiles filter expressions, and runs them against a JSON
//! file of entries.

mod commands;
mod completer;
mod config;
mod executor;
mod formatter;
mod repl;

use clap::Parser;
use config::CliConfig;
use executor::Session;
use formatter::OutputFormat;
use std::path::PathBuf;

/// Fieldbase Command-Line Client
#[derive(Parser, Debug)]
#[command(name = "fieldbase")]
#[command(version, about = "Fieldbase filter language client")]
pub struct Args {
    /// Run a single filter and exit
    #[arg(short = 'c', long)]
    pub command: Option<String>,

    /// Run filters from file, one per line
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Field types as comma-separated name:TYPE pairs (e.g. age:INT,price:DEC)
    #[arg(short = 't', long)]
    pub types: Option<String>,

    /// Field types as a JSON object file (e.g. {"age": "INT"})
    #[arg(long)]
    pub types_file: Option<PathBuf>,

    /// JSON array of entries to filter; without it filters print as documents
    #[arg(short = 'r', long)]
    pub records: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Maximum parenthesis nesting depth
    #[arg(long, default_value_t = fieldbase_lang::DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Maximum number of conditions in one filter
    #[arg(long, default_value_t = fieldbase_lang::DEFAULT_MAX_TERMS)]
    pub max_terms: usize,

    /// Reject literals that do not convert to the field's declared type
    #[arg(long)]
    pub strict: bool,

    /// Only check syntax and print the parsed tree
    #[arg(long)]
    pub validate: bool,

    /// Report the impact of changing a field's type (field:TYPE) and exit
    #[arg(long, value_name = "FIELD:TYPE")]
    pub analyze: Option<String>,
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fieldbase_cli=info")),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::from(&args);
    let session = Session::load(&config)?;
    tracing::debug!(
        fields = session.field_types().len(),
        records = session.record_count(),
        "session loaded"
    );

    // Determine which mode to run in
    if let Some(spec) = &args.analyze {
        run_analyze_mode(&session, spec, config.format)
    } else if let Some(command) = &args.command {
        // Command mode: run a single filter and exit
        run_command_mode(&session, command, &config)
    } else if let Some(file) = &args.file {
        // Script mode: run filters from a file
        run_script_mode(&session, file, &config)
    } else {
        // REPL mode: interactive shell
        repl::run(session, config)
    }
}

/// Run a single filter and exit.
fn run_command_mode(
    session: &Session,
    command: &str,
    config: &CliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(config.format);

    match executor::run_line(session, command, config.validate_only, &*formatter) {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Run filters from a file.
///
/// Every filter runs; the script fails if any of them did.
fn run_script_mode(
    session: &Session,
    file: &PathBuf,
    config: &CliConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(file)?;
    let formatter = formatter::create_formatter(config.format);

    let results = executor::run_script(session, &content, config.validate_only, &*formatter);
    for (filter, result) in &results {
        match result {
            Ok(output) => {
                if !output.is_empty() {
                    println!("{}", output);
                }
            }
            Err(e) => eprintln!("Error in '{}':\n{}", filter, e),
        }
    }

    executor::script_status(&results)?;
    Ok(())
}

/// Print a type-change report and exit.
fn run_analyze_mode(
    session: &Session,
    spec: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let formatter = formatter::create_formatter(format);
    let output = executor::analyze(session, spec, &*formatter)?;
    println!("{}", output);
    Ok(())
}

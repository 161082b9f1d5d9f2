//! Interactive REPL implementation.

use crate::commands::{self, CommandResult};
use crate::completer::FieldbaseHelper;
use crate::config::CliConfig;
use crate::executor::{self, Session};
use crate::formatter;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Config, Editor};
use std::path::PathBuf;

/// Get the history file path.
fn history_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".fieldbase_history")
}

/// Field names offered for completion: declared types plus fields seen in
/// the loaded entries.
fn known_fields(session: &Session) -> Vec<String> {
    let mut fields: Vec<String> = session
        .field_types()
        .iter()
        .map(|(name, _)| name.to_string())
        .collect();
    for record in session.records().unwrap_or_default() {
        fields.extend(record.values.keys().cloned());
    }
    fields.sort();
    fields.dedup();
    fields
}

/// Run the interactive REPL.
pub fn run(mut session: Session, config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut format = config.format;
    let mut validate_only = config.validate_only;

    // Set up rustyline
    let rl_config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();

    let mut helper = FieldbaseHelper::new();
    helper.set_fields(known_fields(&session));
    let mut rl: Editor<FieldbaseHelper, DefaultHistory> = Editor::with_config(rl_config)?;
    rl.set_helper(Some(helper));

    // Load history
    let hist_path = history_path();
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    match session.records() {
        Some(records) => println!("Loaded {} entries", records.len()),
        None => println!("No entries loaded; filters print as store documents"),
    }
    println!("Fieldbase CLI - Type .help for commands, .exit to quit\n");

    // Main REPL loop
    loop {
        let prompt = if validate_only {
            "fieldbase (validate)> "
        } else {
            "fieldbase> "
        };

        match rl.readline(prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                // Handle dot-commands
                if commands::is_command(line) {
                    if line.eq_ignore_ascii_case(".validate") {
                        validate_only = !validate_only;
                        println!("Validate-only mode {}", if validate_only { "on" } else { "off" });
                        continue;
                    }

                    match commands::handle_command(line, &session, format) {
                        CommandResult::Exit => {
                            println!("Goodbye!");
                            break;
                        }
                        CommandResult::Output(msg) => {
                            println!("{}", msg);
                        }
                        CommandResult::SetFormat(fmt) => {
                            format = fmt;
                            println!("Output format set to {}", format);
                        }
                        CommandResult::SetStrict(strict) => {
                            session.set_strict(strict);
                            println!("Strict mode {}", if strict { "on" } else { "off" });
                        }
                        CommandResult::SetFieldType(field, field_type) => {
                            session.set_field_type(&field, field_type);
                            if let Some(helper) = rl.helper_mut() {
                                helper.set_fields(known_fields(&session));
                            }
                            println!("Field '{}' is now {}", field, field_type);
                        }
                        CommandResult::ShowHistory => {
                            let history = rl.history();
                            let len = history.len();
                            let start = len.saturating_sub(20);
                            for (i, entry) in history.iter().skip(start).enumerate() {
                                println!("{:4}  {}", start + i + 1, entry);
                            }
                        }
                        CommandResult::Clear => {
                            // ANSI clear screen
                            print!("\x1B[2J\x1B[1;1H");
                        }
                    }
                    continue;
                }

                // Run the filter
                let formatter = formatter::create_formatter(format);
                match executor::run_line(&session, line, validate_only, &*formatter) {
                    Ok(output) => {
                        if !output.is_empty() {
                            println!("{}", output);
                        }
                    }
                    Err(e) => {
                        println!("{}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                tracing::error!(error = %err, "readline failed");
                break;
            }
        }
    }

    // Save history
    if let Err(e) = rl.save_history(&hist_path) {
        tracing::warn!(path = %hist_path.display(), error = %e, "could not save history");
    }

    Ok(())
}

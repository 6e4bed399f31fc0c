//! REPL - interactive question loop
//!
//! Lines starting with `:` are session commands; anything else is a question.

use crate::output;
use crate::session::Session;
use anyhow::Result;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;

/// Session command parsed from a `:` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(String),
    History,
    Stats,
    Quit,
    Help,
    Unknown(String),
}

/// Parse a `:` command; `None` means the line is a question
pub fn parse_command(line: &str) -> Option<Command> {
    let rest = line.trim().strip_prefix(':')?;
    let mut parts = rest.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default().to_lowercase();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    Some(match name.as_str() {
        "load" | "reload" => Command::Load(arg.to_string()),
        "history" => Command::History,
        "stats" => Command::Stats,
        "quit" | "exit" | "q" => Command::Quit,
        "help" => Command::Help,
        _ => Command::Unknown(name),
    })
}

const COMMAND_HELP: &str = "Commands:\n  \
    :load <path>   replace the data document\n  \
    :history       recent questions\n  \
    :stats         index summary\n  \
    :quit          leave";

/// Start the REPL on stdin/stdout
pub fn start_repl(session: &mut Session, color: bool) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_repl_loop(session, stdin.lock(), stdout.lock(), color)
}

/// Main loop, generic over input and output so it can be driven in tests
pub fn run_repl_loop<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    mut out: W,
    color: bool,
) -> Result<()> {
    writeln!(
        out,
        "candict {} - ask about CAN objects. :help for commands.",
        env!("CARGO_PKG_VERSION")
    )?;
    let summary = session.summary();
    if summary.signals + summary.faults + summary.hardware_ids == 0 {
        writeln!(out, "No data loaded yet. Use :load <path>.")?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "candict> ")?;
        out.flush()?;

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => {
                writeln!(out, "Error reading input: {}", e)?;
                break;
            }
            None => break,
        };

        match parse_command(&line) {
            Some(Command::Quit) => break,
            Some(command) => run_command(session, command, &mut out)?,
            None => {
                if line.trim().is_empty() {
                    continue;
                }
                let result = session.ask(&line);
                writeln!(out, "{}", output::render_result(&result, color))?;
            }
        }
    }

    debug!("REPL closed after {} questions", session.history().len());
    Ok(())
}

fn run_command<W: Write>(session: &mut Session, command: Command, out: &mut W) -> Result<()> {
    match command {
        Command::Load(path) if path.is_empty() => {
            writeln!(out, "Usage: :load <path>")?;
        }
        Command::Load(path) => match session.reload(Path::new(&path)) {
            Ok(summary) => {
                writeln!(out, "Loaded {}", path)?;
                writeln!(out, "{}", output::render_summary(&summary))?;
            }
            Err(e) => {
                writeln!(out, "{} (previous data kept)", e)?;
            }
        },
        Command::History => writeln!(out, "{}", output::render_history(session.history()))?,
        Command::Stats => writeln!(out, "{}", output::render_summary(&session.summary()))?,
        Command::Help => writeln!(out, "{}", COMMAND_HELP)?,
        Command::Unknown(name) => writeln!(out, "Unknown command :{}. {}", name, COMMAND_HELP)?,
        Command::Quit => {}
    }
    Ok(())
}

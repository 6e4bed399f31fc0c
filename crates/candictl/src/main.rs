//! candictl - ask questions about a CAN vehicle data dictionary
//!
//! Loads the data document once, then answers plain-language questions
//! about signals, faults and hardware configurations.

use anyhow::Result;
use candict_shared::DictError;
use candictl::config::Config;
use candictl::errors::{EXIT_NOT_ANSWERED, EXIT_SOURCE_UNREADABLE, EXIT_SUCCESS, EXIT_USAGE};
use candictl::{output, repl, Session};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// Version is embedded at build time
const VERSION: &str = env!("CANDICT_VERSION");

#[derive(Parser)]
#[command(name = "candictl")]
#[command(about = "CAN data dictionary - signals, faults and hardware at a glance", long_about = None)]
#[command(version = VERSION)]
struct Cli {
    /// Data document (JSON)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Never call the text generator
    #[arg(long, global = true)]
    no_llm: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Ask {
        /// The question, e.g. "how many bus types"
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Interactive question loop
    Repl,

    /// Show index counts
    Stats,

    /// Print the effective configuration
    Config,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_session(cli: &Cli, config: &Config) -> Session {
    match Session::from_config(config, cli.data.as_deref(), !cli.no_llm) {
        Ok(session) => session,
        Err(e @ DictError::SourceUnreadable(_)) => {
            eprintln!("{}", e);
            process::exit(EXIT_SOURCE_UNREADABLE);
        }
        Err(e) => {
            eprintln!("{}", e);
            process::exit(EXIT_USAGE);
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    debug!("candictl v{} starting", VERSION);

    let config = Config::load(cli.config.as_deref());
    let color = std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();

    match &cli.command {
        Commands::Ask { question } => {
            let mut session = open_session(&cli, &config);
            let result = session.ask(&question.join(" "));
            output::display_result(&result, color);
            let code = if result.status.is_answer() {
                EXIT_SUCCESS
            } else {
                EXIT_NOT_ANSWERED
            };
            process::exit(code);
        }
        Commands::Repl => {
            let mut session = open_session(&cli, &config);
            repl::start_repl(&mut session, color)
        }
        Commands::Stats => {
            let session = open_session(&cli, &config);
            if let Some(source) = session.index().source() {
                println!("Source:         {}", source.display());
            }
            println!("{}", output::render_summary(&session.summary()));
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

mod export;
mod restore;
mod table;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "passphrase-export")]
#[command(version)]
#[command(
    about = "Extract Phabricator passphrase credentials from a mysqldump for a password manager import",
    long_about = None
)]
pub struct Cli {
    /// Log level (RUST_LOG overrides when set)
    #[arg(short = 'd', long, value_enum, global = true, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Error,
}

impl LogLevel {
    fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract credentials to CSV and run the converter on it
    Export {
        /// Dump containing the passphrase_credential and passphrase_secret tables
        #[arg(short, long)]
        passphrase_file: PathBuf,

        /// Dump containing the user table (may be the same file)
        #[arg(short, long)]
        user_file: PathBuf,

        /// Output base name; .csv and .1pif are appended (default: output_<date>-<time>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Save the loaded tables and assembled records as JSON (for debugging)
        #[arg(short, long)]
        save_intermediate: bool,

        /// YAML config file (placeholders, table names, converter)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Stop after writing the CSV file
        #[arg(long)]
        no_convert: bool,

        /// Show progress while scanning dumps
        #[arg(long)]
        progress: bool,
    },

    /// Print one table of a dump as JSON
    Table {
        /// Dump file (supports .gz, .bz2, .xz, .zst compression)
        file: PathBuf,

        /// Table name
        table: String,

        /// Key rows by this column instead of listing them
        #[arg(short, long)]
        index: Option<String>,

        /// YAML config file (placeholders)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replace quote placeholders in a converter output file
    Restore {
        /// File to fix up in place
        file: PathBuf,

        /// YAML config file (placeholders)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(cli.log_level);

    match cli.command {
        Commands::Export {
            passphrase_file,
            user_file,
            output,
            save_intermediate,
            config,
            no_convert,
            progress,
        } => export::run(export::ExportArgs {
            passphrase_file,
            user_file,
            output,
            save_intermediate,
            config,
            no_convert,
            progress,
        }),
        Commands::Table {
            file,
            table,
            index,
            config,
        } => table::run(file, table, index, config),
        Commands::Restore { file, config } => restore::run(file, config),
        Commands::Completions { shell } => {
            generate(
                shell,
                &mut Cli::command(),
                "passphrase-export",
                &mut io::stdout(),
            );
            Ok(())
        }
    }
}

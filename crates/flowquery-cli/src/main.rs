//! flowquery command-line tool
//!
//! Validates saved filters, merges them with extensions, and runs them
//! against JSON record files.

mod commands;
mod formatter;

use clap::{Parser, Subcommand};
use commands::{CliError, Entity, RunOptions};
use flowquery_core::{Dialect, EngineConfig};
use formatter::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// flowquery command-line tool
#[derive(Parser, Debug)]
#[command(name = "flowquery")]
#[command(version, about = "Validate, merge and run saved workflow filters")]
pub struct Args {
    /// Output format
    #[arg(long, default_value = "table", value_enum, global = true)]
    pub format: OutputFormat,

    /// Storage dialect used to normalize variable values
    #[arg(long, default_value = "h2", global = true)]
    pub dialect: Dialect,

    /// Upper bound for the number of listed results
    #[arg(long, global = true)]
    pub max_results: Option<usize>,

    /// Look up a user's groups again for every `or()` group
    #[arg(long, global = true)]
    pub no_group_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn to_config(&self) -> EngineConfig {
        let mut config =
            EngineConfig::new(self.dialect).with_user_group_cache(!self.no_group_cache);
        if let Some(max) = self.max_results {
            config = config.with_query_max_results(max);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a saved filter and report what it selects
    Check {
        /// Entity the filter targets
        #[arg(short, long, value_enum, default_value = "task")]
        entity: Entity,

        /// Saved filter JSON file
        filter: PathBuf,
    },

    /// Merge a saved filter with an extension and print the result
    Merge {
        #[arg(short, long, value_enum, default_value = "task")]
        entity: Entity,

        /// Saved filter JSON file
        base: PathBuf,

        /// Extension JSON file, applied on top of the base
        extension: PathBuf,
    },

    /// Execute a saved filter against a JSON record file
    Run {
        #[arg(short, long, value_enum, default_value = "task")]
        entity: Entity,

        /// Saved filter JSON file
        filter: PathBuf,

        /// Records to query (JSON array)
        #[arg(short, long)]
        data: PathBuf,

        /// Extension JSON file merged on top of the filter
        #[arg(long)]
        extend: Option<PathBuf>,

        /// User to groups memberships (JSON object)
        #[arg(long)]
        groups: Option<PathBuf>,

        /// Index of the first result
        #[arg(long, default_value_t = 0)]
        first: usize,

        /// Maximum number of results
        #[arg(long)]
        max: Option<usize>,

        /// Print the number of matches instead of the matches
        #[arg(long)]
        count: bool,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("flowquery_cli=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<String, CliError> {
    let config = args.to_config();
    let formatter = formatter::create_formatter(args.format);

    match args.command {
        Command::Check { entity, filter } => commands::check(entity, &filter, &*formatter),
        Command::Merge {
            entity,
            base,
            extension,
        } => commands::merge(entity, &base, &extension, &*formatter),
        Command::Run {
            entity,
            filter,
            data,
            extend,
            groups,
            first,
            max,
            count,
        } => {
            let options = RunOptions {
                filter,
                data,
                extend,
                groups,
                first,
                max,
                count,
            };
            commands::run(entity, &options, &config, &*formatter)
        }
    }
}

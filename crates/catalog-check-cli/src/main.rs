use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{CompilerArgs, SelectArgs};

/// Catalog compilation checks for infrastructure node definitions.
///
/// Compiles the catalog of every node found in a manifest directory (or a
/// scenario file) and reports which nodes fail.
///
/// EXAMPLES:
///     catalog-check run manifests --compiler puppet --compiler-arg=--compile --compiler-arg={node}
///     catalog-check run --include '^web' --require-fqdn
///     catalog-check run --scenario scenarios/prod.yaml --junit reports/catalog.xml
///     catalog-check list manifests --exclude legacy
///
/// ENVIRONMENT VARIABLES:
///     CATALOG_CHECK_*   Override catalog-check.toml settings
///     RUST_LOG          Log filter (default: error)
///     NO_COLOR          Set to any value to disable colored output
#[derive(Parser)]
#[command(name = "catalog-check")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the catalog of every selected node
    ///
    /// Exits with 0 when every catalog compiles, 1 when any node fails and
    /// 2 when the run could not be set up.
    ///
    /// EXAMPLES:
    ///     catalog-check run                         Use catalog-check.toml
    ///     catalog-check run manifests --verbose     One line per node
    ///     catalog-check run --require-fact=fqdn     Demand a fact first
    #[command(visible_alias = "r")]
    Run {
        #[command(flatten)]
        select: SelectArgs,
        #[command(flatten)]
        compiler: CompilerArgs,
        /// Fail nodes that do not define this fact
        #[arg(long, value_name = "FACT", conflicts_with = "require_fqdn")]
        require_fact: Option<String>,
        /// Shorthand for --require-fact=fqdn
        #[arg(long)]
        require_fqdn: bool,
        /// Directory of per-node fact files (<node>.yaml or <node>.json)
        #[arg(long, value_name = "DIR")]
        facts_dir: Option<std::path::PathBuf>,
        /// Write a JUnit XML report to this file
        #[arg(long, value_name = "FILE")]
        junit: Option<std::path::PathBuf>,
        /// Output results as JSON
        #[arg(long)]
        json: bool,
        /// One line per node instead of dots
        #[arg(long, short = 'v')]
        verbose: bool,
        /// Disable colored output (also set by NO_COLOR)
        #[arg(long)]
        no_color: bool,
    },

    /// List the nodes a run would compile
    ///
    /// EXAMPLES:
    ///     catalog-check list manifests
    ///     catalog-check list --scenario prod.yaml --include web
    #[command(visible_alias = "ls")]
    List {
        #[command(flatten)]
        select: SelectArgs,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "catalog_check=info" } else { "error" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Run {
            select,
            compiler,
            require_fact,
            require_fqdn,
            facts_dir,
            junit,
            json,
            verbose,
            no_color,
        } => {
            let args = commands::run::RunArgs {
                select,
                compiler,
                require_fact: if require_fqdn {
                    Some(catalog_check::FQDN_FACT.to_string())
                } else {
                    require_fact
                },
                facts_dir,
                junit,
                json,
                verbose,
                no_color: no_color || env::var("NO_COLOR").is_ok(),
            };
            commands::run::run(args)
        }
        Commands::List { select } => {
            commands::list::run(select)?;
            Ok(true)
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    init_tracing(verbose);

    match run(cli) {
        Ok(true) => process::exit(0),
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            process::exit(2);
        }
    }
}

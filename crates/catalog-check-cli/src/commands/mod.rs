//! Command implementations
//!
//! Settings are merged with the precedence CLI flags, then environment
//! (CATALOG_CHECK_*), then catalog-check.toml, then built-in defaults.

pub mod list;
pub mod run;

use anyhow::{bail, Context, Result};
use catalog_check::{CommandCompiler, Facts, Filter, ManifestNodeSource, Scenario};
use catalog_check_config::{CheckConfig, CompilerConfig, Config, ConfigLoader};
use clap::Args;
use std::path::{Path, PathBuf};

/// Include pattern used when none is configured
pub const DEFAULT_INCLUDE: &str = ".*";

/// Node selection arguments shared by `run` and `list`
#[derive(Args, Debug, Default)]
pub struct SelectArgs {
    /// Manifest directory to scan for node declarations
    pub dir: Option<PathBuf>,
    /// Only nodes whose name matches this regex
    #[arg(long, short = 'i', value_name = "REGEX")]
    pub include: Option<String>,
    /// Skip nodes whose name matches this regex
    #[arg(long, short = 'e', value_name = "REGEX")]
    pub exclude: Option<String>,
    /// Scenario file listing nodes and their facts
    #[arg(long, short = 's', value_name = "FILE", conflicts_with = "dir")]
    pub scenario: Option<PathBuf>,
    /// Configuration file (default: nearest catalog-check.toml)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// External compiler arguments
#[derive(Args, Debug, Default)]
pub struct CompilerArgs {
    /// Compiler program, run once per node
    #[arg(long, value_name = "PROGRAM")]
    pub compiler: Option<String>,
    /// Compiler argument (repeatable); `{node}` is replaced by the node name
    #[arg(long, value_name = "ARG", allow_hyphen_values = true)]
    pub compiler_arg: Vec<String>,
}

/// Where the nodes of a run come from
#[derive(Debug)]
pub enum NodeOrigin {
    Directory(ManifestNodeSource),
    Scenario(Scenario),
}

/// Load the configuration for a command
pub fn load_config(select: &SelectArgs) -> Result<Config> {
    let loader = ConfigLoader::new();
    let config = match &select.config {
        Some(path) => loader
            .load_from_file(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => {
            let start = select.dir.clone().unwrap_or_else(|| PathBuf::from("."));
            let start = if start.is_dir() { start } else { PathBuf::from(".") };
            loader
                .load_from_directory(&start)
                .context("failed to load configuration")?
        }
    };
    Ok(config)
}

/// Resolve the node source: --scenario, DIR, config scenario, config directory, "."
pub fn node_origin(select: &SelectArgs, settings: &CheckConfig) -> Result<NodeOrigin> {
    if let Some(path) = &select.scenario {
        return load_scenario(path);
    }
    if let Some(dir) = &select.dir {
        return open_directory(dir);
    }
    if let Some(path) = &settings.nodes.scenario {
        return load_scenario(path);
    }
    let dir = settings
        .nodes
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    open_directory(&dir)
}

fn load_scenario(path: &Path) -> Result<NodeOrigin> {
    let scenario = Scenario::load(path)?;
    Ok(NodeOrigin::Scenario(scenario))
}

fn open_directory(dir: &Path) -> Result<NodeOrigin> {
    Ok(NodeOrigin::Directory(ManifestNodeSource::new(dir)?))
}

/// Build the node filter from CLI flags and configuration
pub fn build_filter(select: &SelectArgs, settings: &CheckConfig) -> Result<Filter> {
    let include = select
        .include
        .as_deref()
        .or(settings.nodes.include.as_deref())
        .unwrap_or(DEFAULT_INCLUDE);
    let exclude = select
        .exclude
        .as_deref()
        .or(settings.nodes.exclude.as_deref());

    Ok(Filter::new(include, exclude)?)
}

/// Convert `[facts.defaults]` into facts
pub fn default_facts(settings: &CheckConfig) -> Result<Facts> {
    settings
        .facts
        .defaults
        .iter()
        .map(|(name, value)| {
            let value = serde_json::to_value(value)
                .with_context(|| format!("invalid default fact '{}'", name))?;
            Ok((name.clone(), value))
        })
        .collect()
}

/// Build the compiler from CLI flags or configuration
pub fn build_compiler(args: &CompilerArgs, settings: &CheckConfig) -> Result<CommandCompiler> {
    let config = match (&args.compiler, &settings.compiler) {
        (Some(program), Some(config)) => CompilerConfig {
            program: program.clone(),
            args: if args.compiler_arg.is_empty() {
                config.args.clone()
            } else {
                args.compiler_arg.clone()
            },
            ..config.clone()
        },
        (Some(program), None) => CompilerConfig {
            args: args.compiler_arg.clone(),
            ..CompilerConfig::new(program.clone())
        },
        (None, Some(config)) => {
            let mut config = config.clone();
            if !args.compiler_arg.is_empty() {
                config.args = args.compiler_arg.clone();
            }
            config
        }
        (None, None) => bail!(
            "no catalog compiler configured (use --compiler or [compiler] in catalog-check.toml)"
        ),
    };

    let mut compiler = CommandCompiler::new(config.program).args(config.args);
    if let Some(dir) = config.working_dir {
        compiler = compiler.with_working_dir(dir);
    }
    for (key, value) in config.env {
        compiler = compiler.env(key, value);
    }
    Ok(compiler)
}

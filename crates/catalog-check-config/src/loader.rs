//! Configuration Loader
//!
//! Handles loading configuration and applying environment overrides.

use crate::settings::{CheckConfig, CompilerConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the configuration file searched for
pub const CONFIG_FILE_NAME: &str = "catalog-check.toml";

/// Configuration loader
///
/// Loads configuration with the following precedence:
/// 1. Run config (catalog-check.toml) - lowest priority
/// 2. Environment variables (CATALOG_CHECK_*) - overrides file
/// 3. CLI flags - highest priority (handled by caller)
#[derive(Debug, Default)]
pub struct ConfigLoader;

/// Loaded configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Effective settings
    pub settings: CheckConfig,

    /// The file the settings came from, if any
    pub config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find catalog-check.toml. Without one,
    /// defaults plus environment overrides are returned.
    pub fn load_from_directory(&self, start_dir: &Path) -> ConfigResult<Config> {
        let (config_path, settings) = match self.find_config_file(start_dir) {
            Some(path) => {
                let settings = CheckConfig::load_from_file(&path)?;
                (Some(path), settings)
            }
            None => (None, CheckConfig::default()),
        };

        let settings = self.apply_env_overrides(settings)?;
        tracing::debug!(config = ?config_path, "loaded configuration");

        Ok(Config {
            settings,
            config_path,
        })
    }

    /// Load configuration from a specific file
    pub fn load_from_file(&self, config_path: &Path) -> ConfigResult<Config> {
        let settings = CheckConfig::load_from_file(config_path)?;
        let settings = self.apply_env_overrides(settings)?;

        Ok(Config {
            settings,
            config_path: Some(config_path.to_path_buf()),
        })
    }

    fn find_config_file(&self, start_dir: &Path) -> Option<PathBuf> {
        start_dir
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Apply environment variable overrides
    ///
    /// Environment variables follow the pattern: CATALOG_CHECK_<KEY>
    /// Example: CATALOG_CHECK_REQUIRE_FACT=fqdn
    fn apply_env_overrides(&self, mut config: CheckConfig) -> ConfigResult<CheckConfig> {
        if let Ok(include) = env::var("CATALOG_CHECK_INCLUDE") {
            config.nodes.include = Some(include);
        }

        if let Ok(exclude) = env::var("CATALOG_CHECK_EXCLUDE") {
            config.nodes.exclude = Some(exclude);
        }

        if let Ok(fact) = env::var("CATALOG_CHECK_REQUIRE_FACT") {
            config.facts.require = Some(fact);
        }

        if let Ok(dir) = env::var("CATALOG_CHECK_FACTS_DIR") {
            config.facts.directory = Some(PathBuf::from(dir));
        }

        if let Ok(program) = env::var("CATALOG_CHECK_COMPILER") {
            match config.compiler.as_mut() {
                Some(compiler) => compiler.program = program,
                None => config.compiler = Some(CompilerConfig::new(program)),
            }
        }

        if let Ok(junit) = env::var("CATALOG_CHECK_JUNIT") {
            config.report.junit = Some(PathBuf::from(junit));
        }

        if let Ok(verbose) = env::var("CATALOG_CHECK_VERBOSE") {
            config.report.verbose = Some(parse_bool("CATALOG_CHECK_VERBOSE", &verbose)?);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("expected a boolean, found '{}'", other),
        }),
    }
}

impl Config {
    /// Directory the config file lives in
    pub fn config_root(&self) -> Option<&Path> {
        self.config_path.as_deref().and_then(Path::parent)
    }

    /// Check if a config file was found
    pub fn has_file(&self) -> bool {
        self.config_path.is_some()
    }
}

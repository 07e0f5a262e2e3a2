//! Run configuration (catalog-check.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Run configuration from catalog-check.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CheckConfig {
    /// Where nodes come from and which are selected
    #[serde(default)]
    pub nodes: NodesConfig,

    /// Fact sources and requirements
    #[serde(default)]
    pub facts: FactsConfig,

    /// External catalog compiler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerConfig>,

    /// Report output
    #[serde(default)]
    pub report: ReportConfig,
}

/// Node selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct NodesConfig {
    /// Manifest directory to scan for node declarations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Scenario file listing nodes and facts (instead of a directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario: Option<PathBuf>,

    /// Include pattern (regex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,

    /// Exclude pattern (regex)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

/// Facts configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct FactsConfig {
    /// Directory of per-node fact files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// Fact every node must define
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require: Option<String>,

    /// Facts applied to every node unless overridden
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, toml::Value>,
}

/// External compiler command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Program to run
    pub program: String,

    /// Arguments; `{node}` is replaced by the node name
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Working directory for the program
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,

    /// Extra environment variables
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl CompilerConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }
}

/// Report configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig {
    /// JUnit XML output file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub junit: Option<PathBuf>,

    /// One line per node instead of dots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

impl CheckConfig {
    /// Load configuration from a file, resolving relative paths against its directory
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
                file: path.to_path_buf(),
                error: e,
            })?;

        config.validate()?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.nodes.directory.is_some() && self.nodes.scenario.is_some() {
            return Err(ConfigError::ValidationError(
                "nodes.directory and nodes.scenario are mutually exclusive".to_string(),
            ));
        }

        for (field, value) in [
            ("nodes.include", &self.nodes.include),
            ("nodes.exclude", &self.nodes.exclude),
            ("facts.require", &self.facts.require),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "value cannot be empty".to_string(),
                });
            }
        }

        if let Some(compiler) = &self.compiler {
            if compiler.program.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "compiler.program".to_string(),
                    reason: "program cannot be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Make every relative path absolute against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut Option<PathBuf>| {
            if let Some(p) = path.as_mut() {
                if p.is_relative() {
                    *p = base.join(&*p);
                }
            }
        };

        resolve(&mut self.nodes.directory);
        resolve(&mut self.nodes.scenario);
        resolve(&mut self.facts.directory);
        resolve(&mut self.report.junit);
        if let Some(compiler) = self.compiler.as_mut() {
            resolve(&mut compiler.working_dir);
        }
    }

    /// Effective verbosity (default: false)
    pub fn verbose(&self) -> bool {
        self.report.verbose.unwrap_or(false)
    }
}

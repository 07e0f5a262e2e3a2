//! Catalog compilers - the per-node compilation step
//!
//! The harness only cares whether a node's catalog compiles. How it compiles
//! is up to the [`CatalogCompiler`] implementation: an external command for
//! real runs, or a closure in tests.

use crate::facts::Facts;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Placeholder replaced by the node identity in command arguments
pub const NODE_PLACEHOLDER: &str = "{node}";

/// Reason a catalog failed to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileFailure {
    message: String,
}

impl CompileFailure {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            "catalog compilation failed".to_string()
        } else {
            message
        };
        Self { message }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CompileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CompileFailure {}

/// Compiles the catalog of one node
pub trait CatalogCompiler {
    fn compile(&self, node: &str, facts: &Facts) -> Result<(), CompileFailure>;
}

impl<F> CatalogCompiler for F
where
    F: Fn(&str, &Facts) -> Result<(), CompileFailure>,
{
    fn compile(&self, node: &str, facts: &Facts) -> Result<(), CompileFailure> {
        self(node, facts)
    }
}

/// Compiles by running an external program once per node
///
/// Facts are exported as `FACTER_<name>` environment variables. A zero exit
/// status means the catalog compiled.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
        }
    }

    /// Append an argument; `{node}` is substituted per node
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for `node` with placeholders substituted
    pub fn args_for(&self, node: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| arg.replace(NODE_PLACEHOLDER, node))
            .collect()
    }

    fn build_command(&self, node: &str, facts: &Facts) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args_for(node))
            .envs(&self.env)
            .envs(fact_env(facts))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl CatalogCompiler for CommandCompiler {
    fn compile(&self, node: &str, facts: &Facts) -> Result<(), CompileFailure> {
        let output = self
            .build_command(node, facts)
            .output()
            .map_err(|e| {
                CompileFailure::new(format!("failed to run compiler '{}': {}", self.program, e))
            })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let message = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("compiler exited with {}", output.status));

        Err(CompileFailure::new(message))
    }
}

/// `FACTER_<name>` variables for each fact
pub fn fact_env(facts: &Facts) -> Vec<(String, String)> {
    facts
        .iter()
        .map(|(name, value)| {
            let value = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (format!("FACTER_{}", name), value)
        })
        .collect()
}

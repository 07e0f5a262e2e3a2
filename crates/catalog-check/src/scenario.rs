//! Scenario files - nodes and their facts listed in one YAML document
//!
//! ```yaml
//! foo.example.com:
//!   fqdn: foo.example.com
//!   osfamily: Debian
//! default: {}
//! ```

use crate::discovery::NodeSource;
use crate::error::{CatalogCheckError, CheckResult};
use crate::facts::{FactResolver, Facts};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A fixed set of nodes with per-node facts
#[derive(Debug, Clone)]
pub struct Scenario {
    path: PathBuf,
    nodes: BTreeMap<String, Facts>,
}

impl Scenario {
    /// Load a scenario from a YAML file
    pub fn load(path: impl AsRef<Path>) -> CheckResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CatalogCheckError::ScenarioNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| CatalogCheckError::io(path, e))?;
        let mut scenario = Self::parse(&content).map_err(|e| match e {
            CatalogCheckError::ScenarioParse { error, .. } => CatalogCheckError::ScenarioParse {
                path: path.to_path_buf(),
                error,
            },
            other => other,
        })?;
        scenario.path = path.to_path_buf();
        Ok(scenario)
    }

    /// Parse scenario YAML that did not come from a file
    pub fn parse(content: &str) -> CheckResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self {
                path: PathBuf::new(),
                nodes: BTreeMap::new(),
            });
        }

        let raw: BTreeMap<String, Option<Facts>> =
            serde_yaml::from_str(content).map_err(|e| CatalogCheckError::ScenarioParse {
                path: PathBuf::new(),
                error: e.to_string(),
            })?;

        Ok(Self {
            path: PathBuf::new(),
            nodes: raw
                .into_iter()
                .map(|(node, facts)| (node, facts.unwrap_or_default()))
                .collect(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeSource for Scenario {
    fn nodes(&self) -> CheckResult<Vec<String>> {
        Ok(self.nodes.keys().cloned().collect())
    }

    fn location(&self) -> Option<&Path> {
        self.path.parent()
    }
}

impl FactResolver for Scenario {
    fn facts_for(&self, node: &str) -> CheckResult<Facts> {
        Ok(self.nodes.get(node).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    const SCENARIO: &str = r#"
web.example.com:
  fqdn: web.example.com
  processorcount: 4
default:
"#;

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.len(), 2);
        assert_eq!(scenario.nodes().unwrap(), vec!["default", "web.example.com"]);

        let facts = scenario.facts_for("web.example.com").unwrap();
        assert_eq!(facts.get("processorcount"), Some(&json!(4)));
        assert!(scenario.facts_for("default").unwrap().is_empty());
        assert!(scenario.facts_for("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_scenario() {
        let err = Scenario::load("/nonexistent/scenario.yaml").unwrap_err();
        assert!(matches!(err, CatalogCheckError::ScenarioNotFound { .. }));
    }

    #[test]
    fn test_load_invalid_scenario_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "- not\n- a mapping\n").unwrap();

        match Scenario::load(&path).unwrap_err() {
            CatalogCheckError::ScenarioParse { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_records_location() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prod.yaml");
        fs::write(&path, SCENARIO).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.path(), path.as_path());
        assert_eq!(scenario.location(), Some(dir.path()));
    }
}

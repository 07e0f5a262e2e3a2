//! Node facts and fact resolvers

use crate::error::{CatalogCheckError, CheckResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Facts known about a single node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Facts(BTreeMap<String, Value>);

impl Facts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    /// Set a fact, builder style
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Check whether `name` is present with a non-empty value
    pub fn is_defined(&self, name: &str) -> bool {
        match self.0.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Fill in every fact from `defaults` that is not already set
    pub fn merge_defaults(&mut self, defaults: &Facts) {
        for (name, value) in &defaults.0 {
            self.0
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Facts {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Looks up the facts for a node identity
pub trait FactResolver {
    /// Resolve all facts for `node`. Unknown nodes resolve to empty facts.
    fn facts_for(&self, node: &str) -> CheckResult<Facts>;
}

/// The same facts for every node
#[derive(Debug, Clone, Default)]
pub struct StaticFacts(pub Facts);

impl FactResolver for StaticFacts {
    fn facts_for(&self, _node: &str) -> CheckResult<Facts> {
        Ok(self.0.clone())
    }
}

/// Two resolvers stacked: facts from `upper` win over facts from `lower`
pub struct LayeredFacts {
    upper: Box<dyn FactResolver>,
    lower: Box<dyn FactResolver>,
}

impl LayeredFacts {
    pub fn new(upper: Box<dyn FactResolver>, lower: Box<dyn FactResolver>) -> Self {
        Self { upper, lower }
    }
}

impl FactResolver for LayeredFacts {
    fn facts_for(&self, node: &str) -> CheckResult<Facts> {
        let mut facts = self.upper.facts_for(node)?;
        facts.merge_defaults(&self.lower.facts_for(node)?);
        Ok(facts)
    }
}

/// Per-node fact files in a directory: `<node>.yaml`, `<node>.yml` or `<node>.json`
#[derive(Debug, Clone)]
pub struct FactsDirectory {
    root: PathBuf,
}

const FACT_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

impl FactsDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn fact_file(&self, node: &str) -> Option<PathBuf> {
        FACT_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{}.{}", node, ext)))
            .find(|path| path.is_file())
    }
}

impl FactResolver for FactsDirectory {
    fn facts_for(&self, node: &str) -> CheckResult<Facts> {
        let Some(path) = self.fact_file(node) else {
            tracing::debug!(node, dir = %self.root.display(), "no fact file");
            return Ok(Facts::new());
        };

        let content = fs::read_to_string(&path).map_err(|e| CatalogCheckError::io(&path, e))?;
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        parse_facts(&content, is_json).map_err(|e| CatalogCheckError::facts_load(&path, e))
    }
}

fn parse_facts(content: &str, is_json: bool) -> Result<Facts, String> {
    if is_json {
        return serde_json::from_str(content).map_err(|e| e.to_string());
    }
    // An empty YAML document means no facts
    if content.trim().is_empty() {
        return Ok(Facts::new());
    }
    let value: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
    match serde_json::to_value(value).map_err(|e| e.to_string())? {
        Value::Null => Ok(Facts::new()),
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(format!("expected a mapping of facts, found {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_is_defined() {
        let facts = Facts::new()
            .with("fqdn", "foo.example.com")
            .with("empty", "  ")
            .with("none", Value::Null)
            .with("list", json!([]))
            .with("cores", 4);

        assert!(facts.is_defined("fqdn"));
        assert!(facts.is_defined("cores"));
        assert!(!facts.is_defined("empty"));
        assert!(!facts.is_defined("none"));
        assert!(!facts.is_defined("list"));
        assert!(!facts.is_defined("missing"));
    }

    #[test]
    fn test_merge_defaults_keeps_resolved_values() {
        let mut facts = Facts::new().with("fqdn", "foo.example.com");
        let defaults = Facts::new()
            .with("fqdn", "default.example.com")
            .with("domain", "example.com");

        facts.merge_defaults(&defaults);

        assert_eq!(facts.get("fqdn"), Some(&json!("foo.example.com")));
        assert_eq!(facts.get("domain"), Some(&json!("example.com")));
    }

    #[test]
    fn test_facts_directory_yaml_and_json() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.yaml"), "fqdn: foo.example.com\nprocessors: 2\n").unwrap();
        fs::write(dir.path().join("bar.json"), r#"{"fqdn": "bar.example.com"}"#).unwrap();

        let resolver = FactsDirectory::new(dir.path());

        let foo = resolver.facts_for("foo").unwrap();
        assert_eq!(foo.get("fqdn"), Some(&json!("foo.example.com")));
        assert_eq!(foo.get("processors"), Some(&json!(2)));

        let bar = resolver.facts_for("bar").unwrap();
        assert_eq!(bar.get("fqdn"), Some(&json!("bar.example.com")));
    }

    #[test]
    fn test_facts_directory_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let facts = FactsDirectory::new(dir.path()).facts_for("nobody").unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_facts_directory_empty_yaml_is_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.yaml"), "").unwrap();
        let facts = FactsDirectory::new(dir.path()).facts_for("foo").unwrap();
        assert!(facts.is_empty());
    }

    #[test]
    fn test_facts_directory_rejects_non_mapping() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("foo.yaml"), "- a\n- b\n").unwrap();
        let err = FactsDirectory::new(dir.path()).facts_for("foo").unwrap_err();
        assert!(matches!(err, CatalogCheckError::FactsLoad { .. }));
    }

    #[test]
    fn test_static_facts() {
        let resolver = StaticFacts(Facts::new().with("env", "prod"));
        assert_eq!(
            resolver.facts_for("anything").unwrap().get("env"),
            Some(&json!("prod"))
        );
    }

    #[test]
    fn test_layered_facts_upper_wins() {
        let upper = StaticFacts(Facts::new().with("env", "staging"));
        let lower = StaticFacts(
            Facts::new()
                .with("env", "prod")
                .with("fqdn", "web.example.com"),
        );
        let layered = LayeredFacts::new(Box::new(upper), Box::new(lower));

        let facts = layered.facts_for("web").unwrap();
        assert_eq!(facts.get("env"), Some(&json!("staging")));
        assert_eq!(facts.get("fqdn"), Some(&json!("web.example.com")));
    }
}

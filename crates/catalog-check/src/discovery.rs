//! Node discovery - find node identities to compile

use crate::error::{CatalogCheckError, CheckResult};
use crate::filter::Filter;
use regex::Regex;
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Source of node identities for a run
pub trait NodeSource {
    /// Enumerate node identities. Order and duplicates do not matter; the
    /// runner sorts and de-duplicates.
    fn nodes(&self) -> CheckResult<Vec<String>>;

    /// Directory the identities come from, if any
    fn location(&self) -> Option<&Path> {
        None
    }
}

impl NodeSource for Vec<String> {
    fn nodes(&self) -> CheckResult<Vec<String>> {
        Ok(self.clone())
    }
}

impl NodeSource for [&str] {
    fn nodes(&self) -> CheckResult<Vec<String>> {
        Ok(self.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> NodeSource for [&str; N] {
    fn nodes(&self) -> CheckResult<Vec<String>> {
        self.as_slice().nodes()
    }
}

/// Identities of `source` selected by `filter`, sorted and de-duplicated
pub fn select_nodes<S>(source: &S, filter: &Filter) -> CheckResult<Vec<String>>
where
    S: NodeSource + ?Sized,
{
    let identities: BTreeSet<String> = source.nodes()?.into_iter().collect();
    Ok(identities
        .into_iter()
        .filter(|name| filter.matches(name))
        .collect())
}

/// Node declarations found in the manifests of a directory tree
///
/// Every `*.pp` file below the root is scanned for `node` blocks. Nodes
/// matched by a regular expression have no fixed identity and are skipped.
#[derive(Debug, Clone)]
pub struct ManifestNodeSource {
    root: PathBuf,
}

impl ManifestNodeSource {
    /// Create a source for `root`, which must be an existing directory
    pub fn new(root: impl Into<PathBuf>) -> CheckResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CatalogCheckError::directory_not_found(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl NodeSource for ManifestNodeSource {
    fn nodes(&self) -> CheckResult<Vec<String>> {
        if !self.root.is_dir() {
            return Err(CatalogCheckError::directory_not_found(&self.root));
        }

        let mut nodes = BTreeSet::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| CatalogCheckError::discovery(&self.root, e))?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension() != Some(OsStr::new("pp")) {
                continue;
            }

            let source =
                fs::read_to_string(path).map_err(|e| CatalogCheckError::discovery(path, e))?;
            let found = node_declarations(&source);
            tracing::debug!(manifest = %path.display(), count = found.len(), "scanned manifest");
            nodes.extend(found);
        }

        Ok(nodes.into_iter().collect())
    }

    fn location(&self) -> Option<&Path> {
        Some(self.root.as_path())
    }
}

/// One node name: quoted, a `/regex/` matcher, or a bare word
const NODE_NAME: &str = r#"'[^'\n]*'|"[^"\n]*"|/(?:[^/\\\n]|\\.)*/|[\w.:-]+"#;

fn node_header() -> &'static Regex {
    static HEADER: OnceLock<Regex> = OnceLock::new();
    HEADER.get_or_init(|| {
        let pattern = format!(
            r"(?m)^[ \t]*node\s+((?:{name})(?:\s*,\s*(?:{name}))*)(?:\s+inherits\s+(?:{name}))?\s*\{{",
            name = NODE_NAME
        );
        Regex::new(&pattern).expect("node header pattern is valid")
    })
}

fn node_name() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| Regex::new(NODE_NAME).expect("node name pattern is valid"))
}

/// Extract the concrete node names declared in a manifest
///
/// Regex matchers are skipped since they name no concrete node.
pub fn node_declarations(source: &str) -> Vec<String> {
    let stripped = strip_comments(source);
    let mut names = Vec::new();

    for caps in node_header().captures_iter(&stripped) {
        for token in node_name().find_iter(&caps[1]) {
            let raw = token.as_str();
            if raw.starts_with('/') {
                continue;
            }
            let name = raw.trim_matches(|c| c == '\'' || c == '"');
            if !name.is_empty() {
                names.push(name.to_string());
            }
        }
    }

    names
}

fn strip_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_node_declarations_forms() {
        let source = r#"
node 'foo.example.com' {
  include base
}

node "bar" { }

node default {
  notify { 'hello': }
}

node 'web01', 'web02' {
}

node db01 inherits default {
}
"#;
        assert_eq!(
            node_declarations(source),
            vec!["foo.example.com", "bar", "default", "web01", "web02", "db01"]
        );
    }

    #[test]
    fn test_node_declarations_skip_regex_and_comments() {
        let source = r#"
# node 'commented' { }
node /^web\d+$/ { }
node 'real' { } # trailing comment
"#;
        assert_eq!(node_declarations(source), vec!["real"]);
    }

    #[test]
    fn test_node_declarations_ignore_node_attributes() {
        let source = r#"
node 'web' {
  haproxy::balancermember { 'x':
    node => 'backend01',
  }
}
class profile::lb {
}
"#;
        assert_eq!(node_declarations(source), vec!["web"]);
    }

    #[test]
    fn test_node_declarations_regex_with_comma() {
        let source = "node /a,b/, 'lb01' { }\nnode /^db\\/\\d+$/ { }\n";
        assert_eq!(node_declarations(source), vec!["lb01"]);
    }

    #[test]
    fn test_node_declarations_multiline_list() {
        let source = "node 'web01',\n     'web02'\n{\n}\n";
        assert_eq!(node_declarations(source), vec!["web01", "web02"]);
    }

    #[test]
    fn test_node_declarations_ignore_non_node_blocks() {
        let source = "class nodes { }\nnotify { 'node': }\n";
        assert!(node_declarations(source).is_empty());
    }

    #[test]
    fn test_manifest_source_walks_tree_sorted() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nodes")).unwrap();
        fs::write(dir.path().join("site.pp"), "node default { }\n").unwrap();
        fs::write(dir.path().join("nodes/web.pp"), "node 'web' { }\nnode 'app' { }\n").unwrap();
        fs::write(dir.path().join("README.md"), "node 'ignored' { }\n").unwrap();

        let source = ManifestNodeSource::new(dir.path()).unwrap();
        assert_eq!(source.nodes().unwrap(), vec!["app", "default", "web"]);
        assert_eq!(source.location(), Some(dir.path()));
    }

    #[test]
    fn test_manifest_source_deduplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.pp"), "node 'foo' { }\n").unwrap();
        fs::write(dir.path().join("b.pp"), "node 'foo' { }\n").unwrap();

        let source = ManifestNodeSource::new(dir.path()).unwrap();
        assert_eq!(source.nodes().unwrap(), vec!["foo"]);
    }

    #[test]
    fn test_manifest_source_missing_directory() {
        let err = ManifestNodeSource::new("/nonexistent/catalog-check/manifests").unwrap_err();
        assert!(matches!(err, CatalogCheckError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_select_nodes_sorts_and_filters() {
        let filter = Filter::all().with_exclude("^db").unwrap();
        let selected = select_nodes(&["web02", "db01", "web01", "web02"], &filter).unwrap();
        assert_eq!(selected, vec!["web01", "web02"]);
    }

    #[test]
    fn test_list_sources() {
        assert_eq!(["b", "a"].nodes().unwrap(), vec!["b", "a"]);
        assert_eq!(vec!["x".to_string()].nodes().unwrap(), vec!["x"]);
    }
}

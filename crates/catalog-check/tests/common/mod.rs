//! Shared helpers for catalog-check integration tests

#![allow(dead_code)]

use catalog_check::{CatalogCompiler, CompileFailure, Facts};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::rc::Rc;

/// Path of a fixture directory or file under `tests/fixtures`
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Compiler double with scripted outcomes that records every call
#[derive(Clone, Default)]
pub struct FakeCompiler {
    fail_all: Option<String>,
    failing: BTreeMap<String, String>,
    needs_fact: Option<String>,
    calls: Rc<RefCell<Vec<(String, Facts)>>>,
}

impl FakeCompiler {
    /// Every catalog compiles
    pub fn passing() -> Self {
        Self::default()
    }

    /// Every catalog fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            fail_all: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Fail only `node`
    pub fn fail_node(mut self, node: &str, message: &str) -> Self {
        self.failing.insert(node.to_string(), message.to_string());
        self
    }

    /// Fail compilation when `fact` was not handed to the compiler
    pub fn needing_fact(mut self, fact: &str) -> Self {
        self.needs_fact = Some(fact.to_string());
        self
    }

    /// Shared handle on the recorded calls
    pub fn calls(&self) -> Rc<RefCell<Vec<(String, Facts)>>> {
        Rc::clone(&self.calls)
    }
}

impl CatalogCompiler for FakeCompiler {
    fn compile(&self, node: &str, facts: &Facts) -> Result<(), CompileFailure> {
        self.calls
            .borrow_mut()
            .push((node.to_string(), facts.clone()));

        if let Some(message) = &self.fail_all {
            return Err(CompileFailure::new(message.clone()));
        }
        if let Some(message) = self.failing.get(node) {
            return Err(CompileFailure::new(message.clone()));
        }
        if let Some(fact) = &self.needs_fact {
            if !facts.is_defined(fact) {
                return Err(CompileFailure::new(format!(
                    "Evaluation Error: Unknown variable: '::{}'",
                    fact
                )));
            }
        }
        Ok(())
    }
}

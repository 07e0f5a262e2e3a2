//! Test runner - discover nodes, compile each catalog, aggregate the results

use crate::case::{CaseStatus, TestCase};
use crate::compiler::CatalogCompiler;
use crate::discovery::{select_nodes, ManifestNodeSource, NodeSource};
use crate::error::CheckResult;
use crate::facts::{FactResolver, Facts, LayeredFacts};
use crate::filter::Filter;
use crate::scenario::Scenario;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Fact most setups require before compiling
pub const FQDN_FACT: &str = "fqdn";

/// How a runner selects nodes and what it demands of them
#[derive(Default)]
pub struct RunnerOptions {
    filter: Filter,
    required_fact: Option<String>,
    facts: Option<Box<dyn FactResolver>>,
    default_facts: Facts,
}

impl RunnerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only create cases for nodes selected by `filter`
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Fail any node that does not define `fact` before compiling it
    pub fn require_fact(mut self, fact: impl Into<String>) -> Self {
        self.required_fact = Some(fact.into());
        self
    }

    /// Shorthand for requiring the `fqdn` fact
    pub fn require_fqdn(self) -> Self {
        self.require_fact(FQDN_FACT)
    }

    /// Resolve per-node facts with `resolver`
    pub fn with_facts(mut self, resolver: impl FactResolver + 'static) -> Self {
        self.facts = Some(Box::new(resolver));
        self
    }

    /// Facts every node gets unless its resolver supplies them
    pub fn with_default_facts(mut self, facts: Facts) -> Self {
        self.default_facts = facts;
        self
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
    pub duration: Duration,
}

impl RunSummary {
    pub fn from_cases(cases: &[TestCase]) -> Self {
        let mut summary = RunSummary {
            total: cases.len(),
            ..Default::default()
        };
        for case in cases {
            match case.passed() {
                Some(true) => summary.passed += 1,
                Some(false) => summary.failed += 1,
                None => summary.pending += 1,
            }
            summary.duration += case.duration();
        }
        summary
    }

    pub fn is_success(&self) -> bool {
        self.passed == self.total
    }
}

/// Compiles the catalog of every selected node, one at a time
///
/// Cases are created when the runner is built and run in discovery order.
/// The compiler may hold global state, so cases never run concurrently.
pub struct TestRunner {
    source_directory: Option<PathBuf>,
    test_cases: Vec<TestCase>,
    filter: Filter,
    required_fact: Option<String>,
    facts: Option<Box<dyn FactResolver>>,
    default_facts: Facts,
    compiler: Box<dyn CatalogCompiler>,
}

impl TestRunner {
    /// Build a runner for the nodes declared in the manifests under `dir`
    pub fn for_directory(
        dir: impl Into<PathBuf>,
        compiler: impl CatalogCompiler + 'static,
        options: RunnerOptions,
    ) -> CheckResult<Self> {
        let source = ManifestNodeSource::new(dir)?;
        Self::new(&source, compiler, options)
    }

    /// Build a runner for the nodes of a scenario file
    ///
    /// The scenario supplies the facts. When `options` also carries a
    /// resolver, its facts win and the scenario fills in the rest.
    pub fn from_scenario(
        scenario: Scenario,
        compiler: impl CatalogCompiler + 'static,
        options: RunnerOptions,
    ) -> CheckResult<Self> {
        let mut runner = Self::new(&scenario, compiler, options)?;
        runner.facts = Some(match runner.facts.take() {
            Some(resolver) => Box::new(LayeredFacts::new(resolver, Box::new(scenario))),
            None => Box::new(scenario),
        });
        Ok(runner)
    }

    /// Build a runner for the nodes of any source
    pub fn new<S>(
        source: &S,
        compiler: impl CatalogCompiler + 'static,
        options: RunnerOptions,
    ) -> CheckResult<Self>
    where
        S: NodeSource + ?Sized,
    {
        let mut runner = Self {
            source_directory: source.location().map(Path::to_path_buf),
            test_cases: Vec::new(),
            filter: Filter::all(),
            required_fact: None,
            facts: None,
            default_facts: Facts::new(),
            compiler: Box::new(compiler),
        };
        runner.apply(options);
        runner.test_cases = runner.discover(source)?;
        Ok(runner)
    }

    fn apply(&mut self, options: RunnerOptions) {
        let RunnerOptions {
            filter,
            required_fact,
            facts,
            default_facts,
        } = options;
        self.filter = filter;
        self.required_fact = required_fact;
        self.facts = facts;
        self.default_facts = default_facts;
    }

    fn discover<S>(&self, source: &S) -> CheckResult<Vec<TestCase>>
    where
        S: NodeSource + ?Sized,
    {
        let cases: Vec<TestCase> = select_nodes(source, &self.filter)?
            .into_iter()
            .map(TestCase::new)
            .collect();

        tracing::debug!(
            dir = ?self.source_directory,
            selected = cases.len(),
            "discovered nodes"
        );
        Ok(cases)
    }

    /// Cases in discovery order
    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    pub fn source_directory(&self) -> Option<&Path> {
        self.source_directory.as_deref()
    }

    pub fn required_fact(&self) -> Option<&str> {
        self.required_fact.as_deref()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Compile every case and report whether all of them passed
    ///
    /// A runner is single-use: finished cases are never run again, so a
    /// second call only re-aggregates the recorded outcomes.
    ///
    /// A panicking compiler fails only its own case. The panic hook is left
    /// alone, so the panic is still printed to stderr.
    pub fn run_tests(&mut self) -> bool {
        let ctx = ExecContext {
            compiler: self.compiler.as_ref(),
            facts: self.facts.as_deref(),
            default_facts: &self.default_facts,
            required_fact: self.required_fact.as_deref(),
        };

        for case in self.test_cases.iter_mut().filter(|c| !c.is_finished()) {
            let start = Instant::now();
            let outcome = ctx.execute(case.name());
            case.finish(outcome, start.elapsed());

            match case.status() {
                CaseStatus::Passed => {
                    tracing::info!(node = case.name(), duration = ?case.duration(), "catalog compiled")
                }
                CaseStatus::Failed { error } => {
                    tracing::warn!(node = case.name(), %error, "catalog check failed")
                }
                CaseStatus::Pending => {}
            }
        }

        self.all_passed()
    }

    /// True when every case has run and passed; vacuously true with no cases
    pub fn all_passed(&self) -> bool {
        self.test_cases.iter().all(|c| c.passed() == Some(true))
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary::from_cases(&self.test_cases)
    }
}

struct ExecContext<'a> {
    compiler: &'a dyn CatalogCompiler,
    facts: Option<&'a dyn FactResolver>,
    default_facts: &'a Facts,
    required_fact: Option<&'a str>,
}

impl ExecContext<'_> {
    #[tracing::instrument(skip_all, fields(node = %node))]
    fn execute(&self, node: &str) -> Result<(), String> {
        let mut facts = match self.facts {
            Some(resolver) => resolver
                .facts_for(node)
                .map_err(|e| format!("failed to resolve facts: {}", e))?,
            None => Facts::new(),
        };
        facts.merge_defaults(self.default_facts);

        if let Some(fact) = self.required_fact {
            if !facts.is_defined(fact) {
                return Err(missing_fact_message(fact));
            }
        }

        let compiler = self.compiler;
        match panic::catch_unwind(AssertUnwindSafe(|| compiler.compile(node, &facts))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(failure)) => Err(failure.message().to_string()),
            Err(payload) => Err(format!("compiler panicked: {}", panic_message(&*payload))),
        }
    }
}

/// Error recorded for a node lacking a required fact
pub fn missing_fact_message(fact: &str) -> String {
    format!("fact '{}' must be defined", fact)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompileFailure;
    use crate::facts::StaticFacts;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn passing(_node: &str, _facts: &Facts) -> Result<(), CompileFailure> {
        Ok(())
    }

    fn failing(node: &str, _facts: &Facts) -> Result<(), CompileFailure> {
        Err(CompileFailure::new(format!("Could not parse for environment production: {}", node)))
    }

    #[test]
    fn test_cases_are_sorted_and_unique() {
        let runner =
            TestRunner::new(&["foo", "default", "foo"], passing, RunnerOptions::new()).unwrap();
        let names: Vec<_> = runner.test_cases().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["default", "foo"]);
        assert!(runner.test_cases().iter().all(|c| c.passed().is_none()));
    }

    #[test]
    fn test_empty_run_is_vacuously_true() {
        let nodes: Vec<String> = Vec::new();
        let mut runner = TestRunner::new(&nodes, failing, RunnerOptions::new()).unwrap();
        assert!(runner.run_tests());
        assert_eq!(runner.summary().total, 0);
    }

    #[test]
    fn test_compilation_failure_message_recorded() {
        let mut runner = TestRunner::new(&["web"], failing, RunnerOptions::new()).unwrap();
        assert!(!runner.run_tests());

        let case = &runner.test_cases()[0];
        assert_eq!(case.passed(), Some(false));
        assert_eq!(
            case.error(),
            Some("Could not parse for environment production: web")
        );
        assert!(case.duration() > Duration::ZERO);
    }

    #[test]
    fn test_missing_fact_skips_compilation() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&calls);
        let compiler = move |node: &str, _facts: &Facts| -> Result<(), CompileFailure> {
            seen.borrow_mut().push(node.to_string());
            Ok(())
        };

        let options = RunnerOptions::new().require_fact("networking");
        let mut runner = TestRunner::new(&["foo"], compiler, options).unwrap();
        assert!(!runner.run_tests());

        assert!(calls.borrow().is_empty());
        assert_eq!(
            runner.test_cases()[0].error(),
            Some("fact 'networking' must be defined")
        );
    }

    #[test]
    fn test_default_facts_satisfy_requirement_and_reach_compiler() {
        let compiler = |_node: &str, facts: &Facts| {
            if facts.is_defined("domain") {
                Ok(())
            } else {
                Err(CompileFailure::new("no domain"))
            }
        };
        let options = RunnerOptions::new()
            .require_fqdn()
            .with_facts(StaticFacts(Facts::new().with("fqdn", "foo.example.com")))
            .with_default_facts(Facts::new().with("domain", "example.com"));

        let mut runner = TestRunner::new(&["foo"], compiler, options).unwrap();
        assert!(runner.run_tests());
    }

    #[test]
    fn test_panicking_compiler_is_contained() {
        let compiler = |node: &str, _facts: &Facts| -> Result<(), CompileFailure> {
            if node == "boom" {
                panic!("catalog exploded");
            }
            Ok(())
        };
        let mut runner =
            TestRunner::new(&["boom", "calm"], compiler, RunnerOptions::new()).unwrap();
        assert!(!runner.run_tests());

        let cases = runner.test_cases();
        assert_eq!(cases[0].error(), Some("compiler panicked: catalog exploded"));
        assert_eq!(cases[1].passed(), Some(true));
    }

    #[test]
    fn test_scenario_facts_layer_under_resolver() {
        let scenario =
            Scenario::parse("web:\n  fqdn: web.example.com\n  env: prod\ndb: {}\n").unwrap();
        let compiler = |_node: &str, facts: &Facts| -> Result<(), CompileFailure> {
            match facts.get("env").and_then(|v| v.as_str()) {
                Some("staging") => Ok(()),
                other => Err(CompileFailure::new(format!("unexpected env {:?}", other))),
            }
        };
        let options = RunnerOptions::new()
            .require_fqdn()
            .with_filter(Filter::include("web").unwrap())
            .with_facts(StaticFacts(Facts::new().with("env", "staging")));

        let mut runner = TestRunner::from_scenario(scenario, compiler, options).unwrap();
        let names: Vec<_> = runner.test_cases().iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["web"]);
        assert!(runner.run_tests());
    }

    #[test]
    fn test_second_run_does_not_recompile() {
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let compiler = move |_node: &str, _facts: &Facts| -> Result<(), CompileFailure> {
            *counter.borrow_mut() += 1;
            Ok(())
        };

        let mut runner = TestRunner::new(&["a", "b"], compiler, RunnerOptions::new()).unwrap();
        assert!(runner.run_tests());
        assert!(runner.run_tests());
        assert_eq!(*count.borrow(), 2);
    }

    #[test]
    fn test_summary_counts() {
        let compiler = |node: &str, _facts: &Facts| {
            if node.starts_with("db") {
                Err(CompileFailure::new("duplicate declaration"))
            } else {
                Ok(())
            }
        };
        let mut runner =
            TestRunner::new(&["db01", "web01", "web02"], compiler, RunnerOptions::new()).unwrap();

        let before = runner.summary();
        assert_eq!(before.pending, 3);
        assert!(!before.is_success());

        runner.run_tests();
        let after = runner.summary();
        assert_eq!((after.total, after.passed, after.failed, after.pending), (3, 2, 1, 0));
        assert!(after.duration > Duration::ZERO);
    }
}

//! Catalog compilation test harness
//!
//! Validates node definitions by compiling each node's catalog and checking
//! that compilation succeeds:
//! - Node discovery from manifests or scenario files
//! - Include/exclude filtering of node names
//! - Required-fact preconditions
//! - Sequential execution against a pluggable catalog compiler
//! - Console, JUnit and JSON reporting
//!
//! # Example
//!
//! ```no_run
//! use catalog_check::{CommandCompiler, Filter, RunnerOptions, TestRunner};
//!
//! let compiler = CommandCompiler::new("puppet").args(["master", "--compile", "{node}"]);
//! let options = RunnerOptions::new()
//!     .with_filter(Filter::new("web", None).unwrap())
//!     .require_fqdn();
//!
//! let mut runner = TestRunner::for_directory("manifests", compiler, options).unwrap();
//! let all_passed = runner.run_tests();
//! ```

pub mod case;
pub mod compiler;
pub mod discovery;
pub mod error;
pub mod facts;
pub mod filter;
pub mod report;
pub mod runner;
pub mod scenario;

// Re-export main types
pub use case::{CaseStatus, TestCase};
pub use compiler::{CatalogCompiler, CommandCompiler, CompileFailure};
pub use discovery::{select_nodes, ManifestNodeSource, NodeSource};
pub use error::{CatalogCheckError, CheckResult};
pub use facts::{FactResolver, Facts, FactsDirectory, LayeredFacts, StaticFacts};
pub use filter::Filter;
pub use report::{json_report, ConsoleReporter, JUnitReporter};
pub use runner::{missing_fact_message, RunSummary, RunnerOptions, TestRunner, FQDN_FACT};
pub use scenario::Scenario;

//! Run command - compile the catalog of every selected node

use super::{build_compiler, build_filter, default_facts, load_config, node_origin, NodeOrigin};
use super::{CompilerArgs, SelectArgs};
use anyhow::{Context, Result};
use catalog_check::{
    json_report, ConsoleReporter, FactsDirectory, JUnitReporter, RunnerOptions, TestCase,
    TestRunner,
};
use colored::*;
use std::path::{Path, PathBuf};

/// Arguments for the run command
#[derive(Debug, Default)]
pub struct RunArgs {
    pub select: SelectArgs,
    pub compiler: CompilerArgs,
    /// Fact every node must define before compiling
    pub require_fact: Option<String>,
    /// Directory of per-node fact files
    pub facts_dir: Option<PathBuf>,
    /// JUnit XML output file
    pub junit: Option<PathBuf>,
    /// Output in JSON format
    pub json: bool,
    /// One line per node
    pub verbose: bool,
    /// Disable colored output
    pub no_color: bool,
}

/// Run the catalog checks
///
/// Returns `Ok(false)` when at least one node failed.
pub fn run(args: RunArgs) -> Result<bool> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(&args.select)?;
    let settings = &config.settings;

    let mut options = RunnerOptions::new()
        .with_filter(build_filter(&args.select, settings)?)
        .with_default_facts(default_facts(settings)?);

    if let Some(fact) = args.require_fact.clone().or(settings.facts.require.clone()) {
        options = options.require_fact(fact);
    }
    if let Some(dir) = args.facts_dir.clone().or(settings.facts.directory.clone()) {
        options = options.with_facts(FactsDirectory::new(dir));
    }

    let compiler = build_compiler(&args.compiler, settings)?;
    tracing::info!(program = compiler.program(), "using catalog compiler");

    let mut runner = match node_origin(&args.select, settings)? {
        NodeOrigin::Directory(source) => TestRunner::new(&source, compiler, options)?,
        NodeOrigin::Scenario(scenario) => TestRunner::from_scenario(scenario, compiler, options)?,
    };

    let junit = args.junit.clone().or(settings.report.junit.clone());

    if runner.test_cases().is_empty() {
        write_junit(junit.as_deref(), runner.test_cases())?;
        if args.json {
            println!(
                "{}",
                serde_json::json!({
                    "tests": 0,
                    "passed": 0,
                    "failed": 0,
                    "message": "No nodes found"
                })
            );
        } else {
            println!("{}", "No nodes found.".yellow());
        }
        return Ok(true);
    }

    if !args.json {
        println!(
            "{} {} nodes",
            "Compiling".bold(),
            runner.test_cases().len()
        );
    }

    let all_passed = runner.run_tests();
    let cases = runner.test_cases();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json_report(cases))?);
    } else {
        let verbose = args.verbose || settings.verbose();
        ConsoleReporter::new(verbose)
            .with_no_color(args.no_color)
            .report(cases)
            .context("failed to write report")?;
    }

    write_junit(junit.as_deref(), cases)?;

    Ok(all_passed)
}

/// Write the JUnit report when one is configured, even for an empty run
fn write_junit(path: Option<&Path>, cases: &[TestCase]) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    JUnitReporter::default()
        .write_file(path, cases)
        .with_context(|| format!("failed to write JUnit report '{}'", path.display()))?;
    tracing::info!(path = %path.display(), "wrote JUnit report");
    Ok(())
}

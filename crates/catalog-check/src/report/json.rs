//! JSON reporter - machine-readable run results

use crate::case::TestCase;
use crate::runner::RunSummary;
use serde_json::{json, Value};

/// Machine-readable summary of a run
pub fn json_report(cases: &[TestCase]) -> Value {
    let summary = RunSummary::from_cases(cases);

    let results: Vec<_> = cases
        .iter()
        .map(|case| {
            json!({
                "name": case.name(),
                "passed": case.passed(),
                "error": case.error(),
                "duration_ms": case.duration().as_millis() as u64,
            })
        })
        .collect();

    json!({
        "tests": summary.total,
        "passed": summary.passed,
        "failed": summary.failed,
        "results": results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_json_report_fields() {
        let mut ok = TestCase::new("default");
        ok.finish(Ok(()), Duration::from_millis(12));
        let mut bad = TestCase::new("foo");
        bad.finish(Err("fact 'fqdn' must be defined".to_string()), Duration::from_millis(1));
        let pending = TestCase::new("later");

        let report = json_report(&[ok, bad, pending]);

        assert_eq!(report["tests"], 3);
        assert_eq!(report["passed"], 1);
        assert_eq!(report["failed"], 1);
        assert_eq!(report["results"][0]["duration_ms"], 12);
        assert_eq!(report["results"][0]["error"], Value::Null);
        assert_eq!(report["results"][1]["error"], "fact 'fqdn' must be defined");
        assert_eq!(report["results"][2]["passed"], Value::Null);
    }
}

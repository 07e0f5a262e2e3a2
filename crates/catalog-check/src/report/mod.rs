//! Reporting of finished runs
//!
//! Reporters only read test cases; they never influence the outcome.

pub mod console;
pub mod json;
pub mod junit;

pub use console::ConsoleReporter;
pub use json::json_report;
pub use junit::JUnitReporter;

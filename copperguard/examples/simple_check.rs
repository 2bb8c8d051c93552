//! Example: check a board snapshot with DrcCore.
//! Run with: cargo run --example simple_check [board.json] [rules.json]

use copperguard::{DrcCore, Severity};
use std::path::Path;

fn main() -> Result<(), copperguard::DrcError> {
    let board = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/mixed_board.json".to_string());
    let rules = std::env::args()
        .nth(2)
        .unwrap_or_else(|| "tests/fixtures/fab_rules.json".to_string());

    let report = DrcCore::check_files(Path::new(&board), Some(Path::new(&rules)), None)?;

    println!("Checked {} against '{}'", report.board, report.rule_set);
    for violation in &report.violations {
        let marker = match violation.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
            Severity::Ignore => "     ",
        };
        println!(
            "  {} [{}] {} at ({:.3}, {:.3})",
            marker,
            violation.code,
            violation.message,
            violation.position.x,
            violation.position.y
        );
    }

    let stats = report.stats();
    println!("{} errors, {} warnings", stats.errors, stats.warnings);
    Ok(())
}

//! Example: extending the engine with a provider of your own.
//! Run with: cargo run --example custom_provider [board.json]

use copperguard::board::BoardItem;
use copperguard::drc::{DrcContext, DrcTestProvider, DrcViolation, ErrorCode};
use copperguard::{
    CollectingReporter, DrcEngine, DrcOptions, RuleResolver, RuleSet, Severity,
};
use std::path::Path;
use std::sync::Arc;

/// Flags tracks shorter than their own width
struct StubTrackProvider;

impl DrcTestProvider for StubTrackProvider {
    fn name(&self) -> &str {
        "stub_tracks"
    }

    fn description(&self) -> &str {
        "Looking for stub tracks..."
    }

    fn error_codes(&self) -> &[ErrorCode] {
        &[ErrorCode::TrackWidth]
    }

    fn run(&self, ctx: &mut DrcContext<'_>) -> bool {
        let board = ctx.board();
        let total = board.traces.len();

        for (done, trace) in board.traces.iter().enumerate() {
            if !ctx.report_progress(done + 1, total) {
                return false;
            }

            if trace.length() < trace.width {
                let violation = DrcViolation::builder(ErrorCode::TrackWidth)
                    .detail(format!("(stub of {:.3} mm)", trace.length()))
                    .severity(Severity::Warning)
                    .item(&BoardItem::Track(trace))
                    .position(trace.midpoint())
                    .layer(Some(trace.layer.as_str()))
                    .build();
                ctx.report_violation(violation);
            }
        }

        true
    }
}

fn main() -> Result<(), copperguard::DrcError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/mixed_board.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_provider [board.json]");
        std::process::exit(1);
    }

    let board = copperguard::load_board(path)?;
    let rules = RuleSet::default();
    let resolver = RuleResolver::new(&rules, &board);

    let mut engine = DrcEngine::with_default_providers(DrcOptions::default());
    engine.add_provider(Arc::new(StubTrackProvider));

    let mut reporter = CollectingReporter::new();
    let summary = engine.run(&board, &resolver, &mut reporter);

    println!(
        "{} providers ran, {} violations",
        summary.providers_run.len(),
        summary.total
    );
    for message in &reporter.messages {
        println!("  note: {}", message);
    }
    for violation in &reporter.violations {
        println!("  [{:?}] {}", violation.severity, violation.message);
    }
    Ok(())
}

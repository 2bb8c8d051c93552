//! Track segment width

use super::{check_bounds, should_run, Measurement};
use crate::board::BoardItem;
use crate::drc::item::ErrorCode;
use crate::drc::provider::{DrcContext, DrcTestProvider};
use crate::rules::ConstraintKind;

pub struct TrackWidthProvider;

const CODES: &[ErrorCode] = &[ErrorCode::TrackWidth];

impl DrcTestProvider for TrackWidthProvider {
    fn name(&self) -> &str {
        "track_width"
    }

    fn description(&self) -> &str {
        "Checking track widths..."
    }

    fn error_codes(&self) -> &[ErrorCode] {
        CODES
    }

    fn run(&self, ctx: &mut DrcContext<'_>) -> bool {
        if !should_run(
            ctx,
            ErrorCode::TrackWidth,
            ConstraintKind::TrackWidth,
            "Track width",
        ) {
            return true;
        }

        let board = ctx.board();
        let total = board.traces.len();

        for (done, trace) in board.traces.iter().enumerate() {
            if ctx.is_error_limit_exceeded(ErrorCode::TrackWidth) {
                break;
            }

            if !ctx.report_progress(done + 1, total) {
                return false;
            }

            let item = BoardItem::Track(trace);
            let constraint = ctx.resolver().evaluate(
                ConstraintKind::TrackWidth,
                &item,
                None,
                Some(trace.layer.as_str()),
            );
            if constraint.is_ignored() {
                continue;
            }

            check_bounds(
                ctx,
                ErrorCode::TrackWidth,
                &constraint,
                "width",
                Measurement {
                    item: &item,
                    min: trace.width,
                    max: trace.width,
                    position: trace.midpoint(),
                    layer: Some(trace.layer.as_str()),
                },
            );
        }

        true
    }
}

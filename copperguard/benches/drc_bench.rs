use criterion::{black_box, criterion_group, criterion_main, Criterion};
use copperguard::board::{
    Board, Drill, Footprint, Pad, PadLayerShape, PadType, Padstack, Position, Trace,
    ALL_COPPER_LAYERS,
};
use copperguard::prelude::*;
use copperguard::CollectingReporter;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// A row of 40-pin headers with a pair of tracks between each pin
fn header_board(footprints: usize) -> Board {
    let mut board = Board::default();

    for f in 0..footprints {
        let y = f as f64 * 5.0;
        let pads = (0..40)
            .map(|i| Pad {
                uuid: format!("fp{}-pad{}", f, i),
                number: (i + 1).to_string(),
                pad_type: PadType::ThruHole,
                position: Position::new(i as f64 * 2.54, y),
                orientation: 0.0,
                padstack: Padstack::uniform(if i == 0 {
                    PadLayerShape::rect(1.7, 1.7)
                } else {
                    PadLayerShape::circle(1.7)
                }),
                drill: Some(Drill::round(1.0)),
                layers: vec![ALL_COPPER_LAYERS.to_string()],
                net: Some(i as u32 + 1),
                net_name: None,
            })
            .collect();

        board.footprints.push(Footprint {
            uuid: format!("fp{}", f),
            reference: format!("J{}", f + 1),
            value: "HDR_1x40".to_string(),
            position: Position::new(0.0, y),
            rotation: 0.0,
            pads,
        });

        for i in 0..39 {
            let x = i as f64 * 2.54 + 1.27;
            board.traces.push(Trace {
                uuid: format!("fp{}-trace{}", f, i),
                start: Position::new(x, y - 2.0),
                end: Position::new(x, y + 2.0),
                width: 0.2,
                layer: "F.Cu".to_string(),
                net: 100 + i as u32,
                net_name: None,
            });
        }
    }

    board
}

fn bench_annular_width(c: &mut Criterion) {
    let board = header_board(20);
    let rules = RuleSet::from_file(&fixture_path("annular_rules.json")).unwrap();
    let resolver = RuleResolver::new(&rules, &board);
    let engine = DrcEngine::with_default_providers(DrcOptions {
        providers: vec!["annular_width".to_string()],
        ..DrcOptions::default()
    });

    c.bench_function("annular_width_800_pads", |b| {
        b.iter(|| {
            let mut reporter = CollectingReporter::new();
            engine.run(black_box(&board), &resolver, &mut reporter)
        });
    });
}

fn bench_full_check(c: &mut Criterion) {
    let board = header_board(20);
    let rules = copperguard::generate_sample_rules();

    c.bench_function("full_check_800_pads", |b| {
        b.iter(|| DrcCore::check_board(black_box(&board), &rules, DrcOptions::default()));
    });
}

criterion_group!(benches, bench_annular_width, bench_full_check);
criterion_main!(benches);

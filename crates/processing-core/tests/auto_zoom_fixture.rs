use std::path::PathBuf;

use proptest::prelude::*;
use recast_processing_core::auto_zoom::{build_auto_zooms, AutoZoomOptions};
use recast_project_model::event::{parse_events, EventKind, RecordingEvent};
use recast_project_model::timeline::ZoomSignal;
use recast_project_model::viewport::Point2D;

fn load_fixture_events() -> Vec<RecordingEvent> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-project")
        .join("meta")
        .join("events.jsonl");

    let content = std::fs::read_to_string(path).expect("fixture events should be readable");
    parse_events(&content).expect("fixture events should parse")
}

#[test]
fn fixture_segments_are_stable() {
    let events = load_fixture_events();
    assert_eq!(events.len(), 8);

    let zooms = build_auto_zooms(&events, 10_000, &AutoZoomOptions::default());

    let summary: Vec<(&str, u64, u64, Option<ZoomSignal>)> = zooms
        .iter()
        .map(|z| (z.id.as_str(), z.start_ms, z.end_ms, z.source_signal))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("auto-zoom-1", 680, 3400, Some(ZoomSignal::Click)),
            ("auto-zoom-2", 1980, 4100, Some(ZoomSignal::Typing)),
            ("auto-zoom-3", 5880, 7500, Some(ZoomSignal::Focus)),
            ("auto-zoom-4", 9380, 10_000, Some(ZoomSignal::Click)),
        ]
    );

    assert_eq!(zooms[0].target(), Point2D::new(0.25, 0.35));
    assert_eq!(zooms[1].target(), Point2D::CENTER);
    assert_eq!(zooms[2].target(), Point2D::new(0.7, 0.6));
}

fn arb_events() -> impl Strategy<Value = Vec<RecordingEvent>> {
    // Distinct timestamps: ties keep input order, which a shuffle changes.
    prop::collection::btree_set(0u64..20_000, 0..40).prop_flat_map(|stamps| {
        let stamps: Vec<u64> = stamps.into_iter().collect();
        let n = stamps.len();
        (
            Just(stamps),
            prop::collection::vec(0u8..4, n),
            prop::collection::vec((0.0f64..=1.0, 0.0f64..=1.0), n),
        )
            .prop_map(|(stamps, kinds, positions)| {
                stamps
                    .into_iter()
                    .zip(kinds)
                    .zip(positions)
                    .enumerate()
                    .map(|(i, ((at_ms, kind), (x, y)))| {
                        let kind = match kind {
                            0 => EventKind::Click,
                            1 => EventKind::Typing,
                            2 => EventKind::Focus,
                            _ => EventKind::Cursor,
                        };
                        RecordingEvent::new(format!("e{i}"), kind, at_ms).at_position(x, y)
                    })
                    .collect()
            })
    })
}

proptest! {
    #[test]
    fn shuffled_input_yields_identical_segments(
        (events, shuffled) in arb_events()
            .prop_flat_map(|events| (Just(events.clone()), Just(events).prop_shuffle())),
        duration_ms in 1u64..25_000,
    ) {
        let options = AutoZoomOptions::default();
        let expected = build_auto_zooms(&events, duration_ms, &options);

        prop_assert_eq!(build_auto_zooms(&shuffled, duration_ms, &options), expected);
    }

    #[test]
    fn segments_stay_inside_recording(
        events in arb_events(),
        duration_ms in 1u64..25_000,
    ) {
        let zooms = build_auto_zooms(&events, duration_ms, &AutoZoomOptions::default());
        for pair in zooms.windows(2) {
            prop_assert!(pair[0].start_ms <= pair[1].start_ms);
        }
        for zoom in &zooms {
            prop_assert!(zoom.start_ms <= zoom.end_ms);
            prop_assert!(zoom.end_ms <= duration_ms);
        }
    }
}

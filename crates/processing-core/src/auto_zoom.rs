//! Auto-zoom segmentation: turns an interaction stream into zoom segments.
//!
//! # Algorithm
//!
//! 1. **Filter** events to the enabled signals and to `[0, duration]`,
//!    then stable-sort by timestamp.
//! 2. **Candidate** per event: starts [`LEAD_IN_MS`] before the event,
//!    runs `segment_ms` past it (capped at the duration), and targets the
//!    event position or the frame center.
//! 3. **Merge** left to right: a candidate with the same signal as the
//!    previous accepted segment, starting no more than `merge_gap_ms`
//!    after that segment ends, extends it and moves its target to the
//!    newest interaction.

use serde::{Deserialize, Serialize};

use recast_common::config::AutoZoomDefaults;
use recast_project_model::event::{EventKind, RecordingEvent};
use recast_project_model::timeline::{
    Timeline, TimelineError, ZoomMode, ZoomSegment, ZoomSignal,
};
use recast_project_model::viewport::Point2D;

/// How far before the triggering event a segment starts.
pub const LEAD_IN_MS: u64 = 120;

/// Prefix of generated segment ids.
pub const AUTO_ZOOM_ID_PREFIX: &str = "auto-zoom-";

/// Event categories that can be switched on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoZoomSignal {
    Clicks,
    Typing,
    Focus,
}

impl AutoZoomSignal {
    pub const ALL: [AutoZoomSignal; 3] = [
        AutoZoomSignal::Clicks,
        AutoZoomSignal::Typing,
        AutoZoomSignal::Focus,
    ];

    /// Signal recorded on segments this category produces.
    pub fn zoom_signal(self) -> ZoomSignal {
        match self {
            AutoZoomSignal::Clicks => ZoomSignal::Click,
            AutoZoomSignal::Typing => ZoomSignal::Typing,
            AutoZoomSignal::Focus => ZoomSignal::Focus,
        }
    }

    /// Category an event belongs to. Cursor samples have none.
    pub fn for_event(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::Click => Some(AutoZoomSignal::Clicks),
            EventKind::Typing => Some(AutoZoomSignal::Typing),
            EventKind::Focus => Some(AutoZoomSignal::Focus),
            EventKind::Cursor => None,
        }
    }
}

/// Tunables for [`build_auto_zooms`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoZoomOptions {
    pub include_clicks: bool,
    pub include_typing: bool,
    pub include_focus: bool,

    /// Level assigned to every generated segment.
    pub default_zoom_level: f64,

    /// How far past the triggering event a segment extends.
    pub segment_ms: u64,

    /// Largest gap bridged when merging same-signal segments.
    pub merge_gap_ms: u64,
}

impl Default for AutoZoomOptions {
    fn default() -> Self {
        Self {
            include_clicks: true,
            include_typing: true,
            include_focus: true,
            default_zoom_level: 1.8,
            segment_ms: 1500,
            merge_gap_ms: 280,
        }
    }
}

impl From<&AutoZoomDefaults> for AutoZoomOptions {
    fn from(defaults: &AutoZoomDefaults) -> Self {
        Self {
            include_clicks: defaults.include_clicks,
            include_typing: defaults.include_typing,
            include_focus: defaults.include_focus,
            default_zoom_level: defaults.zoom_level,
            segment_ms: defaults.segment_ms,
            merge_gap_ms: defaults.merge_gap_ms,
        }
    }
}

impl AutoZoomOptions {
    pub fn enabled(&self, signal: AutoZoomSignal) -> bool {
        match signal {
            AutoZoomSignal::Clicks => self.include_clicks,
            AutoZoomSignal::Typing => self.include_typing,
            AutoZoomSignal::Focus => self.include_focus,
        }
    }

    pub fn set(&mut self, signal: AutoZoomSignal, on: bool) {
        match signal {
            AutoZoomSignal::Clicks => self.include_clicks = on,
            AutoZoomSignal::Typing => self.include_typing = on,
            AutoZoomSignal::Focus => self.include_focus = on,
        }
    }

    fn signal_for(&self, kind: EventKind) -> Option<ZoomSignal> {
        AutoZoomSignal::for_event(kind)
            .filter(|signal| self.enabled(*signal))
            .map(AutoZoomSignal::zoom_signal)
    }
}

/// Build zoom segments from recorded interactions.
///
/// `events` may arrive in any order. Segments come back in ascending
/// start order and never leave `[0, duration_ms]`.
pub fn build_auto_zooms(
    events: &[RecordingEvent],
    duration_ms: u64,
    options: &AutoZoomOptions,
) -> Vec<ZoomSegment> {
    let duration_ms = duration_ms.max(1);

    let mut triggers: Vec<(&RecordingEvent, ZoomSignal)> = events
        .iter()
        .filter(|event| event.at_ms <= duration_ms)
        .filter_map(|event| options.signal_for(event.kind).map(|signal| (event, signal)))
        .collect();
    triggers.sort_by_key(|(event, _)| event.at_ms);

    let mut accepted: Vec<ZoomSegment> = vec![];

    for (event, signal) in triggers {
        let start_ms = event.at_ms.saturating_sub(LEAD_IN_MS);
        let end_ms = event
            .at_ms
            .saturating_add(options.segment_ms)
            .min(duration_ms);
        let target = event
            .position()
            .map(|(x, y)| Point2D::new(x, y))
            .unwrap_or(Point2D::CENTER);

        if let Some(previous) = accepted.last_mut() {
            let mergeable = previous.source_signal == Some(signal)
                && start_ms <= previous.end_ms.saturating_add(options.merge_gap_ms);
            if mergeable {
                previous.end_ms = previous.end_ms.max(end_ms);
                previous.manual_target = Some(target);
                continue;
            }
        }

        accepted.push(ZoomSegment {
            id: format!("{AUTO_ZOOM_ID_PREFIX}{}", accepted.len() + 1),
            start_ms,
            end_ms,
            level: options.default_zoom_level,
            mode: ZoomMode::Auto,
            manual_target: Some(target),
            instant: false,
            disabled: false,
            source_signal: Some(signal),
        });
    }

    tracing::debug!(
        events = events.len(),
        segments = accepted.len(),
        duration_ms,
        "Auto-zoom segmentation complete"
    );

    accepted
}

/// Swap a timeline's auto segments for freshly generated ones.
///
/// Manual segments keep their order and stay ahead of the generated
/// ones, so they take precedence wherever the two overlap.
pub fn replace_auto_zooms(
    timeline: &Timeline,
    generated: Vec<ZoomSegment>,
) -> Result<Timeline, TimelineError> {
    let mut segments: Vec<ZoomSegment> = timeline
        .zoom_segments
        .iter()
        .filter(|segment| segment.mode == ZoomMode::Manual)
        .cloned()
        .collect();
    segments.extend(generated);

    timeline.to_builder().zoom_segments(segments).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(id: &str, at_ms: u64) -> RecordingEvent {
        RecordingEvent::click(id, at_ms, 0.3, 0.4)
    }

    #[test]
    fn test_empty_events() {
        assert!(build_auto_zooms(&[], 10_000, &AutoZoomOptions::default()).is_empty());
    }

    #[test]
    fn test_single_click_segment() {
        let zooms = build_auto_zooms(&[click("c", 1000)], 10_000, &AutoZoomOptions::default());
        assert_eq!(zooms.len(), 1);

        let zoom = &zooms[0];
        assert_eq!(zoom.id, "auto-zoom-1");
        assert_eq!((zoom.start_ms, zoom.end_ms), (880, 2500));
        assert_eq!(zoom.level, 1.8);
        assert_eq!(zoom.mode, ZoomMode::Auto);
        assert_eq!(zoom.manual_target, Some(Point2D::new(0.3, 0.4)));
        assert_eq!(zoom.source_signal, Some(ZoomSignal::Click));
        assert!(!zoom.instant);
    }

    #[test]
    fn test_lead_in_and_duration_clamp() {
        let zooms = build_auto_zooms(&[click("c", 50)], 600, &AutoZoomOptions::default());
        assert_eq!((zooms[0].start_ms, zooms[0].end_ms), (0, 600));
    }

    #[test]
    fn test_events_past_duration_are_dropped() {
        let zooms = build_auto_zooms(
            &[click("a", 500), click("b", 20_000)],
            5_000,
            &AutoZoomOptions::default(),
        );
        assert_eq!(zooms.len(), 1);
        assert!(zooms[0].end_ms <= 5_000);
    }

    #[test]
    fn test_merge_within_gap() {
        // Second event one millisecond inside segment_ms + merge_gap_ms.
        let options = AutoZoomOptions::default();
        let second = 1000 + options.segment_ms + options.merge_gap_ms - 1;
        let zooms = build_auto_zooms(&[click("a", 1000), click("b", second)], 60_000, &options);
        assert_eq!(zooms.len(), 1);
        assert_eq!(zooms[0].end_ms, second + options.segment_ms);
    }

    #[test]
    fn test_merge_boundary_includes_lead_in() {
        let options = AutoZoomOptions::default();
        // The gap is measured from the candidate's lead-in start, not its
        // event time. An event exactly `segment_ms + merge_gap_ms` after
        // the first therefore still merges; the split happens only past
        // `segment_ms + merge_gap_ms + LEAD_IN_MS`.
        let naive_boundary = 1000 + options.segment_ms + options.merge_gap_ms;
        let still_merged = build_auto_zooms(
            &[click("a", 1000), click("b", naive_boundary)],
            60_000,
            &options,
        );
        assert_eq!(still_merged.len(), 1);

        let boundary = naive_boundary + LEAD_IN_MS;

        let merged = build_auto_zooms(&[click("a", 1000), click("b", boundary)], 60_000, &options);
        assert_eq!(merged.len(), 1);

        let split = build_auto_zooms(
            &[click("a", 1000), click("b", boundary + 1)],
            60_000,
            &options,
        );
        assert_eq!(split.len(), 2);
        assert_eq!(split[1].id, "auto-zoom-2");
    }

    #[test]
    fn test_merge_moves_target_to_latest_event() {
        let events = vec![
            RecordingEvent::click("a", 1000, 0.1, 0.1),
            RecordingEvent::click("b", 1500, 0.8, 0.9),
        ];
        let zooms = build_auto_zooms(&events, 10_000, &AutoZoomOptions::default());
        assert_eq!(zooms.len(), 1);
        assert_eq!(zooms[0].manual_target, Some(Point2D::new(0.8, 0.9)));
    }

    #[test]
    fn test_different_signals_do_not_merge() {
        let events = vec![
            click("a", 1000),
            RecordingEvent::new("t", EventKind::Typing, 1100),
        ];
        let zooms = build_auto_zooms(&events, 10_000, &AutoZoomOptions::default());
        assert_eq!(zooms.len(), 2);
        assert_eq!(zooms[1].source_signal, Some(ZoomSignal::Typing));
        assert_eq!(zooms[1].target(), Point2D::CENTER);
    }

    #[test]
    fn test_disabled_signals_and_cursor_are_ignored() {
        let mut options = AutoZoomOptions::default();
        options.set(AutoZoomSignal::Clicks, false);
        assert!(!options.enabled(AutoZoomSignal::Clicks));

        let events = vec![
            click("a", 1000),
            RecordingEvent::new("m", EventKind::Cursor, 1200).at_position(0.5, 0.5),
            RecordingEvent::new("f", EventKind::Focus, 4000),
        ];
        let zooms = build_auto_zooms(&events, 10_000, &options);
        assert_eq!(zooms.len(), 1);
        assert_eq!(zooms[0].source_signal, Some(ZoomSignal::Focus));
    }

    #[test]
    fn test_options_from_config_defaults() {
        let options = AutoZoomOptions::from(&AutoZoomDefaults::default());
        assert_eq!(options, AutoZoomOptions::default());
    }

    #[test]
    fn test_replace_auto_zooms_keeps_manual_first() {
        let stale = build_auto_zooms(&[click("a", 100)], 5_000, &AutoZoomOptions::default());
        let timeline = Timeline::builder()
            .zoom_segments(stale)
            .zoom_segment(ZoomSegment::manual("m", 0, 1000, 3.0))
            .build()
            .unwrap();

        let generated = build_auto_zooms(
            &[click("b", 2000), click("c", 4000)],
            5_000,
            &AutoZoomOptions::default(),
        );
        let replaced = replace_auto_zooms(&timeline, generated).unwrap();

        let ids: Vec<&str> = replaced.zoom_segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["m", "auto-zoom-1", "auto-zoom-2"]);
        assert_eq!(replaced.zoom_segments[1].start_ms, 1880);
    }
}

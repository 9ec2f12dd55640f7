//! The edit timeline: every decision applied to a single recorded source.
//!
//! Segment collections preserve insertion order and that order is part of
//! the authoring contract: where zoom segments overlap, the one declared
//! first wins. Timelines are edited as values. A [`TimelineBuilder`] takes
//! a copy, applies changes, and validates on [`TimelineBuilder::build`].

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::TimestampMs;
use crate::viewport::{NormalizedRect, Point2D};

/// Current on-disk schema version for timelines.
pub const TIMELINE_SCHEMA_VERSION: u32 = 1;

pub const MIN_ZOOM_LEVEL: f64 = 1.0;
pub const MAX_ZOOM_LEVEL: f64 = 4.0;
pub const MIN_SPEED_RATE: f64 = 0.25;
pub const MAX_SPEED_RATE: f64 = 4.0;

/// Canvas color used when a background has no usable color of its own.
pub const DEFAULT_CANVAS_COLOR: &str = "#1a1a1a";

/// Frame rates the exporter accepts.
pub const SUPPORTED_FPS: [u32; 2] = [30, 60];

/// How a zoom segment came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoomMode {
    /// Generated from interaction events.
    #[default]
    Auto,
    /// Placed by the user.
    Manual,
}

/// Interaction kind that triggered an auto zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoomSignal {
    Click,
    Typing,
    Focus,
}

/// A magnified interval of the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoomSegment {
    pub id: String,
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,

    /// Magnification in `[1, 4]`.
    pub level: f64,

    #[serde(default)]
    pub mode: ZoomMode,

    /// Normalized point to center on. `None` means frame center.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_target: Option<Point2D>,

    /// Jump straight to the zoom instead of easing in.
    #[serde(default)]
    pub instant: bool,

    /// Disabled segments stay in the timeline but are never rendered.
    #[serde(default)]
    pub disabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_signal: Option<ZoomSignal>,
}

impl ZoomSegment {
    /// A user-placed zoom centered on the frame.
    pub fn manual(id: impl Into<String>, start_ms: TimestampMs, end_ms: TimestampMs, level: f64) -> Self {
        Self {
            id: id.into(),
            start_ms,
            end_ms,
            level,
            mode: ZoomMode::Manual,
            manual_target: None,
            instant: false,
            disabled: false,
            source_signal: None,
        }
    }

    /// Set the normalized target point.
    pub fn with_target(mut self, x: f64, y: f64) -> Self {
        self.manual_target = Some(Point2D::new(x, y));
        self
    }

    /// Target point, defaulting to the frame center.
    pub fn target(&self) -> Point2D {
        self.manual_target.unwrap_or(Point2D::CENTER)
    }

    /// Level clamped to the supported range.
    pub fn clamped_level(&self) -> f64 {
        self.level.clamp(MIN_ZOOM_LEVEL, MAX_ZOOM_LEVEL)
    }

    /// Whether `t_ms` falls inside `[start_ms, end_ms]`.
    pub fn contains(&self, t_ms: TimestampMs) -> bool {
        t_ms >= self.start_ms && t_ms <= self.end_ms
    }
}

/// A playback-rate change over an interval.
///
/// Modeled and validated; the export compiler does not apply it yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedSegment {
    pub id: String,
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,

    /// Playback rate in `[0.25, 4]`.
    pub rate: f64,

    #[serde(default)]
    pub disable_smooth_mouse_movement: bool,
}

/// An interval removed from the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSegment {
    pub id: String,
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
}

/// A blurred region over an interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskSegment {
    pub id: String,
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
    pub rect: NormalizedRect,

    /// Blur radius in output pixels.
    #[serde(default)]
    pub blur: f64,
}

/// A spotlighted region; everything outside it is dimmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighlightSegment {
    pub id: String,
    pub start_ms: TimestampMs,
    pub end_ms: TimestampMs,
    pub rect: NormalizedRect,

    /// Opacity of the dimming layer in `[0, 1]`.
    #[serde(default)]
    pub dim_opacity: f64,
}

/// What fills the canvas behind the recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackgroundFill {
    /// Built-in wallpaper, referenced by name.
    Wallpaper { name: String },
    Gradient {
        gradient_from: String,
        gradient_to: String,
    },
    Color { color: String },
    /// Local image, cover-fit behind the recording.
    Image { image_path: PathBuf },
    None,
}

/// Canvas framing around the recording. Numeric knobs are output pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSettings {
    #[serde(flatten)]
    pub fill: BackgroundFill,

    #[serde(default)]
    pub padding: f64,

    #[serde(default)]
    pub rounded_corners: f64,

    #[serde(default)]
    pub inset: f64,

    #[serde(default)]
    pub shadow: f64,
}

impl Default for BackgroundSettings {
    fn default() -> Self {
        Self {
            fill: BackgroundFill::Color {
                color: DEFAULT_CANVAS_COLOR.to_string(),
            },
            padding: 56.0,
            rounded_corners: 20.0,
            inset: 0.0,
            shadow: 0.6,
        }
    }
}

/// Cursor treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorSettings {
    pub hidden: bool,
    /// Scale relative to the captured cursor.
    pub size: f64,
    /// Smoothing strength in `[0, 1]`.
    pub smoothing: f64,
    pub highlight_clicks: bool,
}

impl Default for CursorSettings {
    fn default() -> Self {
        Self {
            hidden: false,
            size: 1.0,
            smoothing: 0.3,
            highlight_clicks: false,
        }
    }
}

/// Audio treatment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub muted: bool,
    /// Linear gain, 1.0 = unchanged.
    pub volume: f64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            muted: false,
            volume: 1.0,
        }
    }
}

/// User preference for the video encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EncoderHint {
    #[default]
    Auto,
    Nvenc,
    Qsv,
    Amf,
    Mpeg4,
}

impl EncoderHint {
    pub fn as_str(self) -> &'static str {
        match self {
            EncoderHint::Auto => "auto",
            EncoderHint::Nvenc => "nvenc",
            EncoderHint::Qsv => "qsv",
            EncoderHint::Amf => "amf",
            EncoderHint::Mpeg4 => "mpeg4",
        }
    }
}

impl FromStr for EncoderHint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(EncoderHint::Auto),
            "nvenc" | "h264_nvenc" => Ok(EncoderHint::Nvenc),
            "qsv" | "h264_qsv" => Ok(EncoderHint::Qsv),
            "amf" | "h264_amf" => Ok(EncoderHint::Amf),
            "mpeg4" => Ok(EncoderHint::Mpeg4),
            other => Err(format!(
                "Unknown encoder hint: {other}. Use: auto, nvenc, qsv, amf, mpeg4"
            )),
        }
    }
}

/// Output frame and encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSettings {
    pub width: u32,
    pub height: u32,
    /// 30 or 60.
    pub fps: u32,
    #[serde(default)]
    pub encoder_hint: EncoderHint,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 60,
            encoder_hint: EncoderHint::Auto,
        }
    }
}

/// The complete set of edits for one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub id: String,

    /// Schema version.
    pub version: u32,

    /// Refreshed by the store on every save.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub zoom_segments: Vec<ZoomSegment>,

    #[serde(default)]
    pub speed_segments: Vec<SpeedSegment>,

    #[serde(default)]
    pub cut_segments: Vec<CutSegment>,

    #[serde(default)]
    pub mask_segments: Vec<MaskSegment>,

    #[serde(default)]
    pub highlight_segments: Vec<HighlightSegment>,

    #[serde(default)]
    pub background: BackgroundSettings,

    #[serde(default)]
    pub cursor: CursorSettings,

    #[serde(default)]
    pub audio: AudioSettings,

    #[serde(default)]
    pub export: ExportSettings,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// Empty timeline with a fresh id.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            version: TIMELINE_SCHEMA_VERSION,
            updated_at: None,
            zoom_segments: vec![],
            speed_segments: vec![],
            cut_segments: vec![],
            mask_segments: vec![],
            highlight_segments: vec![],
            background: BackgroundSettings::default(),
            cursor: CursorSettings::default(),
            audio: AudioSettings::default(),
            export: ExportSettings::default(),
        }
    }

    /// Start editing a fresh timeline.
    pub fn builder() -> TimelineBuilder {
        TimelineBuilder {
            timeline: Self::new(),
        }
    }

    /// Start editing a copy of this timeline.
    pub fn to_builder(&self) -> TimelineBuilder {
        TimelineBuilder {
            timeline: self.clone(),
        }
    }

    /// Zoom segments that take part in rendering, in declaration order.
    pub fn active_zoom_segments(&self) -> impl Iterator<Item = &ZoomSegment> {
        self.zoom_segments.iter().filter(|segment| !segment.disabled)
    }

    /// The zoom governing `t_ms`: the first active segment containing it.
    pub fn zoom_at(&self, t_ms: TimestampMs) -> Option<&ZoomSegment> {
        self.active_zoom_segments()
            .find(|segment| segment.contains(t_ms))
    }

    /// Check every invariant, reporting all violations at once.
    pub fn validate(&self) -> Result<(), TimelineError> {
        let mut violations = vec![];

        for zoom in &self.zoom_segments {
            check_span("zoom", &zoom.id, zoom.start_ms, zoom.end_ms, &mut violations);
            if !(MIN_ZOOM_LEVEL..=MAX_ZOOM_LEVEL).contains(&zoom.level) {
                violations.push(format!(
                    "zoom {}: level {} outside [{MIN_ZOOM_LEVEL}, {MAX_ZOOM_LEVEL}]",
                    zoom.id, zoom.level
                ));
            }
            if let Some(target) = zoom.manual_target {
                if !target.is_normalized() {
                    violations.push(format!(
                        "zoom {}: target ({}, {}) outside the unit square",
                        zoom.id, target.x, target.y
                    ));
                }
            }
        }

        for speed in &self.speed_segments {
            check_span("speed", &speed.id, speed.start_ms, speed.end_ms, &mut violations);
            if !(MIN_SPEED_RATE..=MAX_SPEED_RATE).contains(&speed.rate) {
                violations.push(format!(
                    "speed {}: rate {} outside [{MIN_SPEED_RATE}, {MAX_SPEED_RATE}]",
                    speed.id, speed.rate
                ));
            }
        }

        for cut in &self.cut_segments {
            check_span("cut", &cut.id, cut.start_ms, cut.end_ms, &mut violations);
        }

        for mask in &self.mask_segments {
            check_span("mask", &mask.id, mask.start_ms, mask.end_ms, &mut violations);
            check_rect("mask", &mask.id, &mask.rect, &mut violations);
        }

        for highlight in &self.highlight_segments {
            check_span(
                "highlight",
                &highlight.id,
                highlight.start_ms,
                highlight.end_ms,
                &mut violations,
            );
            check_rect("highlight", &highlight.id, &highlight.rect, &mut violations);
        }

        if self.export.width == 0 || self.export.height == 0 {
            violations.push(format!(
                "export: size {}x{} must be non-zero",
                self.export.width, self.export.height
            ));
        } else if self.export.width % 2 != 0 || self.export.height % 2 != 0 {
            // yuv420p output needs even dimensions.
            violations.push(format!(
                "export: size {}x{} must be even",
                self.export.width, self.export.height
            ));
        }
        if !SUPPORTED_FPS.contains(&self.export.fps) {
            violations.push(format!("export: fps {} must be 30 or 60", self.export.fps));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(TimelineError::Invalid { violations })
        }
    }
}

fn check_rect(kind: &str, id: &str, rect: &NormalizedRect, violations: &mut Vec<String>) {
    if !rect.is_normalized() {
        violations.push(format!(
            "{kind} {id}: rect ({}, {}, {}x{}) must be non-empty and inside the frame",
            rect.x, rect.y, rect.w, rect.h
        ));
    }
}

fn check_span(
    kind: &str,
    id: &str,
    start_ms: TimestampMs,
    end_ms: TimestampMs,
    violations: &mut Vec<String>,
) {
    if start_ms > end_ms {
        violations.push(format!("{kind} {id}: start {start_ms}ms is after end {end_ms}ms"));
    }
}

/// Applies edits to a copy of a timeline.
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    timeline: Timeline,
}

impl TimelineBuilder {
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.timeline.id = id.into();
        self
    }

    /// Append a zoom segment (lowest precedence so far).
    pub fn zoom_segment(mut self, segment: ZoomSegment) -> Self {
        self.timeline.zoom_segments.push(segment);
        self
    }

    /// Replace every zoom segment.
    pub fn zoom_segments(mut self, segments: Vec<ZoomSegment>) -> Self {
        self.timeline.zoom_segments = segments;
        self
    }

    /// Edit a zoom segment in place. Unknown ids are ignored.
    pub fn update_zoom_segment(mut self, id: &str, edit: impl FnOnce(&mut ZoomSegment)) -> Self {
        if let Some(segment) = self.timeline.zoom_segments.iter_mut().find(|s| s.id == id) {
            edit(segment);
        }
        self
    }

    pub fn remove_zoom_segment(mut self, id: &str) -> Self {
        self.timeline.zoom_segments.retain(|segment| segment.id != id);
        self
    }

    pub fn speed_segment(mut self, segment: SpeedSegment) -> Self {
        self.timeline.speed_segments.push(segment);
        self
    }

    pub fn cut_segment(mut self, segment: CutSegment) -> Self {
        self.timeline.cut_segments.push(segment);
        self
    }

    pub fn mask_segment(mut self, segment: MaskSegment) -> Self {
        self.timeline.mask_segments.push(segment);
        self
    }

    pub fn highlight_segment(mut self, segment: HighlightSegment) -> Self {
        self.timeline.highlight_segments.push(segment);
        self
    }

    pub fn background(mut self, background: BackgroundSettings) -> Self {
        self.timeline.background = background;
        self
    }

    pub fn cursor(mut self, cursor: CursorSettings) -> Self {
        self.timeline.cursor = cursor;
        self
    }

    pub fn audio(mut self, audio: AudioSettings) -> Self {
        self.timeline.audio = audio;
        self
    }

    pub fn export(mut self, export: ExportSettings) -> Self {
        self.timeline.export = export;
        self
    }

    /// Validate and return the edited timeline.
    pub fn build(self) -> Result<Timeline, TimelineError> {
        self.timeline.validate()?;
        Ok(self.timeline)
    }
}

/// Timeline invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimelineError {
    #[error("Invalid timeline: {}", violations.join("; "))]
    Invalid { violations: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_preserves_declaration_order() {
        let timeline = Timeline::builder()
            .zoom_segment(ZoomSegment::manual("a", 0, 1000, 2.0))
            .zoom_segment(ZoomSegment::manual("b", 500, 1500, 3.0))
            .build()
            .unwrap();
        let ids: Vec<&str> = timeline.zoom_segments.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_to_builder_leaves_original_untouched() {
        let original = Timeline::builder()
            .zoom_segment(ZoomSegment::manual("a", 0, 1000, 2.0))
            .build()
            .unwrap();
        let edited = original
            .to_builder()
            .update_zoom_segment("a", |s| s.end_ms = 2000)
            .build()
            .unwrap();
        assert_eq!(original.zoom_segments[0].end_ms, 1000);
        assert_eq!(edited.zoom_segments[0].end_ms, 2000);
        assert_eq!(original.id, edited.id);
    }

    #[test]
    fn test_zoom_at_prefers_first_declared_and_skips_disabled() {
        let mut hidden = ZoomSegment::manual("hidden", 0, 2000, 4.0);
        hidden.disabled = true;
        let timeline = Timeline::builder()
            .zoom_segment(hidden)
            .zoom_segment(ZoomSegment::manual("first", 0, 1000, 2.0))
            .zoom_segment(ZoomSegment::manual("second", 500, 1500, 3.0))
            .build()
            .unwrap();

        assert_eq!(timeline.zoom_at(700).unwrap().id, "first");
        assert_eq!(timeline.zoom_at(1200).unwrap().id, "second");
        assert!(timeline.zoom_at(1800).is_none());
    }

    #[test]
    fn test_validate_collects_every_violation() {
        let result = Timeline::builder()
            .zoom_segment(ZoomSegment::manual("z", 900, 100, 5.0).with_target(1.2, 0.5))
            .speed_segment(SpeedSegment {
                id: "s".to_string(),
                start_ms: 0,
                end_ms: 10,
                rate: 8.0,
                disable_smooth_mouse_movement: false,
            })
            .export(ExportSettings {
                width: 0,
                height: 720,
                fps: 24,
                encoder_hint: EncoderHint::Auto,
            })
            .build();

        let Err(TimelineError::Invalid { violations }) = result else {
            panic!("timeline should be rejected");
        };
        assert_eq!(violations.len(), 6);
    }

    #[test]
    fn test_validate_rejects_odd_export_size() {
        let result = Timeline::builder()
            .export(ExportSettings {
                width: 1279,
                height: 720,
                ..Default::default()
            })
            .build();

        let Err(TimelineError::Invalid { violations }) = result else {
            panic!("odd width should be rejected");
        };
        assert_eq!(violations, vec!["export: size 1279x720 must be even".to_string()]);
    }

    #[test]
    fn test_validate_rejects_regions_outside_the_frame() {
        let rect = NormalizedRect {
            x: 0.1,
            y: 0.1,
            w: 0.5,
            h: 0.5,
        };
        let ok = Timeline::builder()
            .mask_segment(MaskSegment {
                id: "m".to_string(),
                start_ms: 0,
                end_ms: 1000,
                rect,
                blur: 12.0,
            })
            .build();
        assert!(ok.is_ok());

        let result = Timeline::builder()
            .highlight_segment(HighlightSegment {
                id: "h".to_string(),
                start_ms: 0,
                end_ms: 1000,
                rect: NormalizedRect { x: 0.8, ..rect },
                dim_opacity: 0.5,
            })
            .build();
        let Err(TimelineError::Invalid { violations }) = result else {
            panic!("overflowing highlight should be rejected");
        };
        assert_eq!(violations.len(), 1);
        assert!(violations[0].starts_with("highlight h: rect"));
    }

    #[test]
    fn test_background_serializes_with_type_tag() {
        let background = BackgroundSettings {
            fill: BackgroundFill::Image {
                image_path: PathBuf::from("/tmp/wall.png"),
            },
            ..Default::default()
        };
        let value = serde_json::to_value(&background).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["image_path"], "/tmp/wall.png");
        assert_eq!(value["padding"], 56.0);

        let parsed: BackgroundSettings = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, background);
    }

    #[test]
    fn test_minimal_timeline_json_fills_defaults() {
        let parsed: Timeline = serde_json::from_str(r#"{"id":"t1","version":1}"#).unwrap();
        assert!(parsed.zoom_segments.is_empty());
        assert_eq!(parsed.export, ExportSettings::default());
        assert_eq!(parsed.audio.volume, 1.0);
    }

    #[test]
    fn test_encoder_hint_parsing() {
        assert_eq!("QSV".parse::<EncoderHint>().unwrap(), EncoderHint::Qsv);
        assert_eq!("h264_nvenc".parse::<EncoderHint>().unwrap(), EncoderHint::Nvenc);
        assert!("vp9".parse::<EncoderHint>().is_err());
    }
}

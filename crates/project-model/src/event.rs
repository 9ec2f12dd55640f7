//! Interaction events recorded alongside the screen capture.
//!
//! Events are stored in append-only JSONL format (`meta/events.jsonl`).
//! Pointer coordinates are normalized to `[0.0, 1.0]` relative to the
//! captured frame. Events are immutable once recorded; the only consumer
//! is the auto-zoom segmentation pass.

use serde::{Deserialize, Serialize};

/// Milliseconds since recording start.
pub type TimestampMs = u64;

/// What kind of interaction an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Mouse button press.
    Click,
    /// Keyboard input burst.
    Typing,
    /// Window or input focus change.
    Focus,
    /// Pointer movement sample. Never produces a zoom.
    Cursor,
}

/// A single recorded interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingEvent {
    /// Stable event identifier.
    pub id: String,

    pub kind: EventKind,

    /// Milliseconds since recording start.
    pub at_ms: TimestampMs,

    /// Normalized X position, when the event has one.
    #[serde(default, rename = "x", skip_serializing_if = "Option::is_none")]
    pub x_norm: Option<f64>,

    /// Normalized Y position, when the event has one.
    #[serde(default, rename = "y", skip_serializing_if = "Option::is_none")]
    pub y_norm: Option<f64>,

    /// Free-form data attached by the recorder (key codes, window titles).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
}

impl RecordingEvent {
    /// Create an event without a position.
    pub fn new(id: impl Into<String>, kind: EventKind, at_ms: TimestampMs) -> Self {
        Self {
            id: id.into(),
            kind,
            at_ms,
            x_norm: None,
            y_norm: None,
            payload: None,
        }
    }

    /// Create a click at a normalized position.
    pub fn click(id: impl Into<String>, at_ms: TimestampMs, x: f64, y: f64) -> Self {
        Self::new(id, EventKind::Click, at_ms).at_position(x, y)
    }

    /// Attach a normalized position.
    pub fn at_position(mut self, x: f64, y: f64) -> Self {
        self.x_norm = Some(x);
        self.y_norm = Some(y);
        self
    }

    /// Attach a payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Position if the event carries both coordinates.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.x_norm?, self.y_norm?))
    }
}

/// Parse events from JSONL content (one JSON object per line).
///
/// Blank lines and `#` header lines are skipped.
pub fn parse_events(jsonl: &str) -> Result<Vec<RecordingEvent>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL format.
pub fn serialize_events(events: &[RecordingEvent]) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}

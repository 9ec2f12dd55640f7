//! Progress reporting and transcoder diagnostic parsing.

use std::collections::VecDeque;

use serde::Serialize;

use crate::encoder::EncoderChoice;

/// Progress is measured against this fixed span regardless of the
/// recording length.
pub const PROGRESS_CEILING_SECS: f64 = 3600.0;

/// Diagnostic lines kept per attempt for error reports.
pub const DIAGNOSTIC_TAIL_LINES: usize = 30;

/// Export progress report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    pub stage: ExportStage,

    /// Encoder of the running attempt.
    pub encoder: Option<EncoderChoice>,

    /// Human-readable status line.
    pub message: String,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStage {
    Preparing,
    Rendering,
    Retrying,
    Complete,
    Failed,
}

impl ExportProgress {
    pub fn new(stage: ExportStage, progress: f64, message: impl Into<String>) -> Self {
        Self {
            progress,
            stage,
            encoder: None,
            message: message.into(),
        }
    }

    pub fn with_encoder(mut self, encoder: EncoderChoice) -> Self {
        self.encoder = Some(encoder);
        self
    }
}

/// Splits a byte stream into lines on `\n` or `\r`, holding partial
/// lines across chunks.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Complete, non-empty lines found in `chunk`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = vec![];
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if !self.pending.is_empty() {
                    lines.push(String::from_utf8_lossy(&self.pending).into_owned());
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Whatever trails the last separator.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(line)
    }
}

/// Rolling window of the most recent diagnostic lines.
#[derive(Debug, Clone)]
pub struct DiagnosticTail {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for DiagnosticTail {
    fn default() -> Self {
        Self::with_capacity(DIAGNOSTIC_TAIL_LINES)
    }
}

impl DiagnosticTail {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Retained lines, oldest first, joined with newlines.
    pub fn joined(&self) -> String {
        self.lines
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Seconds from a `time=HH:MM:SS.ss` token.
pub fn parse_progress_time(line: &str) -> Option<f64> {
    let marker = "time=";
    let start = line.find(marker)? + marker.len();
    let value = line[start..].split_whitespace().next()?;

    let mut parts = value.split(':');
    let hours: u64 = parts.next()?.parse().ok()?;
    let minutes: u64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }

    Some(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Fraction of [`PROGRESS_CEILING_SECS`], clamped to `[0, 1]`.
pub fn progress_ratio(elapsed_secs: f64) -> f64 {
    (elapsed_secs / PROGRESS_CEILING_SECS).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splitter_buffers_partial_lines() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"frame=  1 time=00:0").is_empty());
        assert_eq!(
            splitter.push(b"0:01.50 speed=1x\rframe=  2"),
            vec!["frame=  1 time=00:00:01.50 speed=1x"]
        );
        assert_eq!(splitter.push(b"\r\n"), vec!["frame=  2"]);
        assert_eq!(splitter.finish(), None);

        splitter.push(b"trailing");
        assert_eq!(splitter.finish().as_deref(), Some("trailing"));
    }

    #[test]
    fn test_tail_keeps_last_lines() {
        let mut tail = DiagnosticTail::default();
        for i in 0..45 {
            tail.push(format!("line {i}"));
        }
        assert_eq!(tail.len(), DIAGNOSTIC_TAIL_LINES);
        assert!(tail.joined().starts_with("line 15\n"));
        assert!(tail.joined().ends_with("line 44"));

        tail.clear();
        assert!(tail.is_empty());
    }

    #[test]
    fn test_parse_progress_time() {
        let line = "frame=  240 fps= 60 q=28.0 size=    512kB time=00:01:30.50 bitrate= 1.2kbits/s";
        assert_eq!(parse_progress_time(line), Some(90.5));
        assert_eq!(parse_progress_time("time=01:00:00.00"), Some(3600.0));
        assert_eq!(parse_progress_time("time=N/A bitrate=N/A"), None);
        assert_eq!(parse_progress_time("Stream mapping:"), None);
    }

    #[test]
    fn test_progress_ratio_uses_one_hour_ceiling() {
        assert_eq!(progress_ratio(1800.0), 0.5);
        assert_eq!(progress_ratio(7200.0), 1.0);
        assert_eq!(progress_ratio(-1.0), 0.0);
    }
}

//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the transcoder binary looked up on `PATH`.
pub const DEFAULT_TRANSCODER: &str = "ffmpeg";

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where projects are stored.
    pub projects_dir: PathBuf,

    /// Default export settings.
    pub render: RenderDefaults,

    /// Default auto-zoom tunables.
    pub auto_zoom: AutoZoomDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Default export parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderDefaults {
    /// Explicit transcoder binary. `None` resolves `ffmpeg` on `PATH`.
    pub transcoder_path: Option<PathBuf>,

    /// Encoder hint (`auto`, `nvenc`, `qsv`, `amf`, `mpeg4`).
    pub encoder_hint: String,

    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,
}

/// Default auto-zoom parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoZoomDefaults {
    pub include_clicks: bool,
    pub include_typing: bool,
    pub include_focus: bool,
    pub zoom_level: f64,
    pub segment_ms: u64,
    pub merge_gap_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "recast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: dirs_default_projects(),
            render: RenderDefaults::default(),
            auto_zoom: AutoZoomDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            transcoder_path: None,
            encoder_hint: "auto".to_string(),
            width: 1920,
            height: 1080,
            fps: 60,
        }
    }
}

impl Default for AutoZoomDefaults {
    fn default() -> Self {
        Self {
            include_clicks: true,
            include_typing: true,
            include_focus: true,
            zoom_level: 1.8,
            segment_ms: 1500,
            merge_gap_ms: 280,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

impl RenderDefaults {
    /// Transcoder to invoke: the configured path, else `ffmpeg` from `PATH`.
    pub fn resolve_transcoder(&self) -> PathBuf {
        match &self.transcoder_path {
            Some(path) => path.clone(),
            None => resolve_transcoder(DEFAULT_TRANSCODER),
        }
    }
}

/// Look up a binary on `PATH`, falling back to the bare name so the
/// spawn error later names what was missing.
pub fn resolve_transcoder(binary: &str) -> PathBuf {
    which::which(binary).unwrap_or_else(|_| PathBuf::from(binary))
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("recast").join("config.json")
}

/// Default projects directory.
fn dirs_default_projects() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("recast").join("projects")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig =
            serde_json::from_str(r#"{"render":{"encoder_hint":"qsv"}}"#).unwrap();
        assert_eq!(parsed.render.encoder_hint, "qsv");
        assert_eq!(parsed.render.fps, 60);
        assert_eq!(parsed.auto_zoom.segment_ms, 1500);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_explicit_transcoder_path_wins() {
        let defaults = RenderDefaults {
            transcoder_path: Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")),
            ..Default::default()
        };
        assert_eq!(
            defaults.resolve_transcoder(),
            PathBuf::from("/opt/ffmpeg/bin/ffmpeg")
        );
    }

    #[test]
    fn test_unknown_binary_falls_back_to_name() {
        let path = resolve_transcoder("recast-definitely-not-installed");
        assert_eq!(path, PathBuf::from("recast-definitely-not-installed"));
    }
}

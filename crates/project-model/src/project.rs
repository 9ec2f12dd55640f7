//! Project metadata and timeline persistence.
//!
//! A project directory looks like:
//!
//! ```text
//! <root>/
//!   sources/             recorded media
//!   meta/project.json    project metadata
//!   meta/events.jsonl    interaction events
//!   meta/timelines/      one <timeline-id>.json per timeline
//!   exports/             rendered output
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{parse_events, RecordingEvent};
use crate::timeline::{Timeline, TimelineError, TIMELINE_SCHEMA_VERSION};

/// Load/save contract for timelines.
///
/// `save` returns the stored value, with `updated_at` refreshed.
pub trait TimelineStore {
    fn load(&self, id: &str) -> Result<Timeline, ProjectError>;
    fn save(&self, timeline: Timeline) -> Result<Timeline, ProjectError>;
}

/// Stores each timeline as `<dir>/<id>.json`.
#[derive(Debug, Clone)]
pub struct FileTimelineStore {
    dir: PathBuf,
}

impl FileTimelineStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

impl TimelineStore for FileTimelineStore {
    fn load(&self, id: &str) -> Result<Timeline, ProjectError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(ProjectError::NotFound { path });
        }
        let timeline: Timeline = read_json(&path)?;

        if timeline.version != TIMELINE_SCHEMA_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                path,
                found: timeline.version,
                supported: TIMELINE_SCHEMA_VERSION,
            });
        }
        timeline.validate()?;
        Ok(timeline)
    }

    fn save(&self, mut timeline: Timeline) -> Result<Timeline, ProjectError> {
        timeline.validate()?;
        timeline.updated_at = Some(Utc::now());

        std::fs::create_dir_all(&self.dir).map_err(|e| ProjectError::IoError {
            path: self.dir.clone(),
            source: e,
        })?;
        write_json(&self.path_for(&timeline.id), &timeline)?;

        tracing::debug!(timeline_id = %timeline.id, "Timeline saved");
        Ok(timeline)
    }
}

/// Top-level project file (`meta/project.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    pub name: String,

    /// UUID.
    pub id: String,

    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,

    pub recording: RecordingInfo,

    #[serde(default)]
    pub sources: Sources,

    /// Timeline edited for this project.
    pub timeline_id: String,
}

/// What was captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingInfo {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    #[serde(default)]
    pub duration_ms: u64,
}

/// Source media paths, relative to the project root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_audio: Option<String>,
}

impl Project {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
        timeline_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: uuid::Uuid::new_v4().to_string(),
            created_at: now,
            modified_at: now,
            recording: RecordingInfo {
                width,
                height,
                fps,
                duration_ms: 0,
            },
            sources: Sources::default(),
            timeline_id: timeline_id.into(),
        }
    }
}

/// A project opened from disk.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    pub root: PathBuf,
    pub project: Project,
    pub timeline: Timeline,
}

impl LoadedProject {
    /// Create the directory layout and write an empty timeline.
    ///
    /// Export settings the timeline would reject fail before anything is
    /// written.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        let mut timeline = Timeline::new();
        timeline.export.width = width;
        timeline.export.height = height;
        timeline.export.fps = fps;
        timeline.validate()?;

        for subdir in ["sources", "meta", "exports"] {
            let dir = root.join(subdir);
            std::fs::create_dir_all(&dir).map_err(|e| ProjectError::IoError {
                path: dir.clone(),
                source: e,
            })?;
        }

        let mut loaded = Self {
            project: Project::new(name, width, height, fps, timeline.id.clone()),
            root,
            timeline,
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Open a project. A missing timeline file yields an empty timeline
    /// under the recorded id.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();
        let project_path = root.join("meta").join("project.json");
        if !project_path.exists() {
            return Err(ProjectError::NotFound { path: project_path });
        }
        let project: Project = read_json(&project_path)?;

        let store = FileTimelineStore::new(root.join("meta").join("timelines"));
        let timeline = match store.load(&project.timeline_id) {
            Ok(timeline) => timeline,
            Err(ProjectError::NotFound { .. }) => {
                tracing::warn!(timeline_id = %project.timeline_id, "Timeline missing, starting empty");
                let mut timeline = Timeline::new();
                timeline.id = project.timeline_id.clone();
                timeline
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            root,
            project,
            timeline,
        })
    }

    /// Write project metadata and the timeline.
    pub fn save(&mut self) -> Result<(), ProjectError> {
        self.project.modified_at = Utc::now();
        self.project.timeline_id = self.timeline.id.clone();

        self.timeline = self.timeline_store().save(self.timeline.clone())?;
        write_json(&self.root.join("meta").join("project.json"), &self.project)
    }

    pub fn timeline_store(&self) -> FileTimelineStore {
        FileTimelineStore::new(self.root.join("meta").join("timelines"))
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join("meta").join("events.jsonl")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.root.join("exports")
    }

    /// Absolute path of the screen recording, if one is registered.
    pub fn screen_path(&self) -> Option<PathBuf> {
        self.project.sources.screen.as_ref().map(|p| self.root.join(p))
    }

    pub fn system_audio_path(&self) -> Option<PathBuf> {
        self.project
            .sources
            .system_audio
            .as_ref()
            .map(|p| self.root.join(p))
    }

    /// Read `meta/events.jsonl`. A missing file means no events.
    pub fn load_events(&self) -> Result<Vec<RecordingEvent>, ProjectError> {
        let path = self.events_path();
        if !path.exists() {
            return Ok(vec![]);
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;
        parse_events(&content).map_err(|e| ProjectError::ParseError { path, source: e })
    }

    /// Human-readable list of missing sources.
    pub fn validate_sources(&self) -> Vec<String> {
        let mut errors = vec![];

        match self.screen_path() {
            Some(path) if !path.exists() => {
                errors.push(format!("Screen source missing: {}", path.display()));
            }
            Some(_) => {}
            None => errors.push("No screen source registered".to_string()),
        }

        if let Some(path) = self.system_audio_path() {
            if !path.exists() {
                errors.push(format!("System audio source missing: {}", path.display()));
            }
        }

        errors
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let content = std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    std::fs::write(path, json).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    ValidationError(#[from] TimelineError),

    #[error("Not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Unsupported schema version {found} in {path} (supported: {supported})")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },
}

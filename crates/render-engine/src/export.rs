//! Export jobs: validate, negotiate an encoder, render.

use std::path::PathBuf;

use recast_common::config::{resolve_transcoder, DEFAULT_TRANSCODER};
use recast_common::error::{RecastError, RecastResult};
use recast_project_model::project::LoadedProject;
use recast_project_model::timeline::Timeline;

use crate::encoder::{build_encoder_attempts, pick_encoder, query_available_encoders, EncoderChoice};
use crate::executor::{render_with_fallback, FailedAttempt, ProgressFn};
use crate::plan::{create_render_plan, RenderPlanOptions};
use crate::progress::{ExportProgress, ExportStage};

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Raw screen recording.
    pub input_path: PathBuf,

    /// Output file path.
    pub output_path: PathBuf,

    pub timeline: Timeline,

    /// Explicit transcoder binary. Looked up on `PATH` when unset.
    pub transcoder_path: Option<PathBuf>,

    pub options: RenderPlanOptions,
}

impl ExportJob {
    /// Job for a loaded project's registered screen source.
    pub fn for_project(project: &LoadedProject, output_path: impl Into<PathBuf>) -> RecastResult<Self> {
        let input_path = project
            .screen_path()
            .ok_or_else(|| RecastError::project("No screen source registered"))?;

        Ok(Self {
            input_path,
            output_path: output_path.into(),
            timeline: project.timeline.clone(),
            transcoder_path: None,
            options: RenderPlanOptions {
                system_audio: project.system_audio_path(),
                max_duration_ms: None,
            },
        })
    }

    pub fn with_transcoder(mut self, transcoder: impl Into<PathBuf>) -> Self {
        self.transcoder_path = Some(transcoder.into());
        self
    }
}

/// Result of a finished export.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub output_path: PathBuf,
    pub encoder: EncoderChoice,
    pub failed_attempts: Vec<FailedAttempt>,
    pub warnings: Vec<String>,
}

/// Export the timeline to a video file.
///
/// This is the main entry point for rendering.
pub async fn export_timeline(job: ExportJob, on_progress: ProgressFn<'_>) -> RecastResult<RenderOutcome> {
    tracing::info!(
        input = %job.input_path.display(),
        output = %job.output_path.display(),
        "Starting export"
    );

    on_progress(ExportProgress::new(
        ExportStage::Preparing,
        0.0,
        "Preparing export",
    ));

    job.timeline
        .validate()
        .map_err(|e| RecastError::project(e.to_string()))?;

    if !job.input_path.exists() {
        return Err(RecastError::FileNotFound {
            path: job.input_path.clone(),
        });
    }

    if let Some(parent) = job.output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let transcoder = job
        .transcoder_path
        .clone()
        .unwrap_or_else(|| resolve_transcoder(DEFAULT_TRANSCODER));

    let available = query_available_encoders(&transcoder).await;
    let preferred = pick_encoder(&available, job.timeline.export.encoder_hint);
    let attempts = build_encoder_attempts(&available, preferred);

    tracing::info!(
        transcoder = %transcoder.display(),
        preferred = %preferred,
        attempts = ?attempts.iter().map(|e| e.ffmpeg_name()).collect::<Vec<_>>(),
        "Encoder chain negotiated"
    );

    let make_plan = |encoder: EncoderChoice| {
        create_render_plan(
            &job.timeline,
            &job.input_path,
            &job.output_path,
            &transcoder,
            encoder,
            &job.options,
        )
    };

    // Warnings do not depend on the encoder; surface them once.
    let warnings = make_plan(preferred).warnings;
    for warning in &warnings {
        tracing::warn!(warning = %warning, "Export degraded");
        on_progress(ExportProgress::new(ExportStage::Preparing, 0.0, warning.clone()));
    }

    let success = render_with_fallback(&attempts, make_plan, on_progress).await?;

    if !success.failed_attempts.is_empty() {
        tracing::info!(
            encoder = %success.encoder,
            failed = success.failed_attempts.len(),
            "Export recovered after encoder fallback"
        );
    }

    Ok(RenderOutcome {
        output_path: job.output_path,
        encoder: success.encoder,
        failed_attempts: success.failed_attempts,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: ExportProgress) {}

    #[tokio::test]
    async fn test_missing_input_is_rejected() {
        let job = ExportJob {
            input_path: PathBuf::from("/nonexistent/recast/screen.mkv"),
            output_path: std::env::temp_dir().join("recast_export_missing_input.mp4"),
            timeline: Timeline::new(),
            transcoder_path: Some(PathBuf::from("/nonexistent/ffmpeg")),
            options: RenderPlanOptions::default(),
        };

        let err = export_timeline(job, &noop).await.unwrap_err();
        assert!(matches!(err, RecastError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_invalid_timeline_is_rejected_before_rendering() {
        let mut timeline = Timeline::new();
        timeline.export.fps = 24;

        let job = ExportJob {
            input_path: PathBuf::from("/nonexistent/recast/screen.mkv"),
            output_path: std::env::temp_dir().join("recast_export_invalid.mp4"),
            timeline,
            transcoder_path: None,
            options: RenderPlanOptions::default(),
        };

        let err = export_timeline(job, &noop).await.unwrap_err();
        assert!(matches!(err, RecastError::Project { .. }));
    }
}

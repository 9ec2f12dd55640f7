//! Runs render plans against the transcoder, falling back across encoders.
//!
//! One transcoder process runs at a time. Progress callbacks fire on the
//! task driving the render. Dropping the returned future kills the
//! running process; there is no other cancellation.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;

use recast_common::error::{RecastError, RecastResult};

use crate::encoder::EncoderChoice;
use crate::plan::RenderPlan;
use crate::progress::{
    parse_progress_time, progress_ratio, DiagnosticTail, ExportProgress, ExportStage,
    LineSplitter,
};

/// Progress sink borrowed for the duration of one call.
pub type ProgressFn<'a> = &'a (dyn Fn(ExportProgress) + Send + Sync);

/// One encoder attempt that did not produce output.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FailedAttempt {
    pub encoder: EncoderChoice,
    pub error: String,
}

/// A render that produced its output.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSuccess {
    pub encoder: EncoderChoice,
    pub failed_attempts: Vec<FailedAttempt>,
}

/// Run one plan to completion.
///
/// Succeeds only when the transcoder exits 0 and the output file exists.
pub async fn run_render(plan: &RenderPlan, on_progress: ProgressFn<'_>) -> RecastResult<()> {
    tracing::debug!(command = %plan.command_line(), "Starting transcoder");

    let mut child = Command::new(&plan.transcoder_path)
        .args(&plan.args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| RecastError::ProcessSpawn {
            program: plan.transcoder_path.clone(),
            source,
        })?;

    tracing::info!(pid = ?child.id(), encoder = %plan.encoder, "Transcoder started");

    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| RecastError::render("Failed to capture transcoder stderr"))?;

    let mut splitter = LineSplitter::new();
    let mut tail = DiagnosticTail::default();
    let mut last_ratio = 0.0f64;
    let mut buf = [0u8; 4096];

    let mut handle_line = |line: String| {
        if let Some(secs) = parse_progress_time(&line) {
            last_ratio = last_ratio.max(progress_ratio(secs));
            on_progress(
                ExportProgress::new(
                    ExportStage::Rendering,
                    last_ratio,
                    format!("Rendering with {}", plan.encoder),
                )
                .with_encoder(plan.encoder),
            );
        }
        tail.push(line);
    };

    loop {
        let read = stderr.read(&mut buf).await?;
        if read == 0 {
            break;
        }
        for line in splitter.push(&buf[..read]) {
            handle_line(line);
        }
    }
    if let Some(line) = splitter.finish() {
        handle_line(line);
    }

    let status = child.wait().await?;

    if !status.success() {
        let diagnostics = tail.joined();
        return Err(RecastError::render(if diagnostics.is_empty() {
            format!("{} exited with {status}", plan.encoder)
        } else {
            format!("{} exited with {status}: {diagnostics}", plan.encoder)
        }));
    }

    if !plan.output_path.exists() {
        return Err(RecastError::render(format!(
            "{} exited successfully but wrote no output at {}",
            plan.encoder,
            plan.output_path.display()
        )));
    }

    Ok(())
}

/// Try each encoder in order until one renders.
///
/// A fresh plan is compiled per attempt. Stale output from an earlier
/// attempt is removed first, and a removal failure fails that attempt.
/// A transcoder that cannot be started at all ends the chain
/// immediately with [`RecastError::ProcessSpawn`].
pub async fn render_with_fallback<F>(
    attempts: &[EncoderChoice],
    make_plan: F,
    on_progress: ProgressFn<'_>,
) -> RecastResult<RenderSuccess>
where
    F: Fn(EncoderChoice) -> RenderPlan,
{
    let mut failed_attempts: Vec<FailedAttempt> = vec![];

    for (index, &encoder) in attempts.iter().enumerate() {
        let plan = make_plan(encoder);

        let result = match remove_stale_output(&plan.output_path) {
            Ok(()) => {
                on_progress(
                    ExportProgress::new(
                        ExportStage::Rendering,
                        0.0,
                        format!("Rendering with {encoder}"),
                    )
                    .with_encoder(encoder),
                );
                tracing::info!(
                    encoder = %encoder,
                    attempt = index + 1,
                    of = attempts.len(),
                    "Render attempt started"
                );
                run_render(&plan, on_progress).await
            }
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => {
                tracing::info!(encoder = %encoder, output = %plan.output_path.display(), "Render succeeded");
                on_progress(
                    ExportProgress::new(
                        ExportStage::Complete,
                        1.0,
                        format!("Export complete ({encoder})"),
                    )
                    .with_encoder(encoder),
                );
                return Ok(RenderSuccess {
                    encoder,
                    failed_attempts,
                });
            }
            Err(err @ RecastError::ProcessSpawn { .. }) => {
                tracing::error!(error = %err, "Transcoder could not be started");
                on_progress(
                    ExportProgress::new(ExportStage::Failed, 0.0, err.to_string())
                        .with_encoder(encoder),
                );
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(encoder = %encoder, error = %err, "Render attempt failed");
                failed_attempts.push(FailedAttempt {
                    encoder,
                    error: err.to_string(),
                });

                if let Some(next) = attempts.get(index + 1) {
                    on_progress(
                        ExportProgress::new(
                            ExportStage::Retrying,
                            0.0,
                            format!("Encoder {encoder} failed, trying next encoder ({next})"),
                        )
                        .with_encoder(encoder),
                    );
                }
            }
        }
    }

    let attempted: Vec<String> = attempts.iter().map(|e| e.ffmpeg_name().to_string()).collect();
    let last_error = failed_attempts
        .last()
        .map(|failure| failure.error.clone())
        .unwrap_or_else(|| "no encoders to try".to_string());

    let err = RecastError::EncodersExhausted {
        attempted,
        last_error,
    };
    tracing::error!(error = %err, "Every encoder failed");
    on_progress(ExportProgress::new(ExportStage::Failed, 0.0, err.to_string()));
    Err(err)
}

fn remove_stale_output(path: &Path) -> RecastResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RecastError::render(format!(
            "Cannot remove stale output {}: {e}",
            path.display()
        ))),
    }
}

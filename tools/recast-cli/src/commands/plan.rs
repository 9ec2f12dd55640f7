//! Print the compiled render plan for a project.

use std::path::PathBuf;

use recast_common::config::AppConfig;
use recast_project_model::timeline::EncoderHint;
use recast_project_model::LoadedProject;
use recast_render_engine::encoder::{pick_encoder, query_available_encoders, EncoderChoice};
use recast_render_engine::plan::{create_render_plan, RenderPlanOptions};

pub async fn run(
    config: &AppConfig,
    path: PathBuf,
    encoder: Option<String>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;
    project
        .timeline
        .validate()
        .map_err(|e| anyhow::anyhow!("Timeline is invalid: {e}"))?;

    let input = project
        .screen_path()
        .ok_or_else(|| anyhow::anyhow!("No screen source registered"))?;
    let output = output.unwrap_or_else(|| project.exports_dir().join("output.mp4"));
    let transcoder = config.render.resolve_transcoder();

    let encoder = match encoder {
        Some(name) => match EncoderChoice::from_ffmpeg_name(&name) {
            Some(choice) => choice,
            None => {
                let hint: EncoderHint = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
                let available = query_available_encoders(&transcoder).await;
                pick_encoder(&available, hint)
            }
        },
        None => {
            let available = query_available_encoders(&transcoder).await;
            pick_encoder(&available, project.timeline.export.encoder_hint)
        }
    };

    let options = RenderPlanOptions {
        system_audio: project.system_audio_path(),
        max_duration_ms: None,
    };
    let plan = create_render_plan(
        &project.timeline,
        &input,
        &output,
        &transcoder,
        encoder,
        &options,
    );

    for warning in &plan.warnings {
        eprintln!("warning: {warning}");
    }
    println!("{}", serde_json::to_string_pretty(&plan)?);

    Ok(())
}

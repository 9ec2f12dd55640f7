//! Export a project to video.

use std::io::Write;
use std::path::PathBuf;

use recast_common::config::AppConfig;
use recast_project_model::LoadedProject;
use recast_render_engine::export::{export_timeline, ExportJob};
use recast_render_engine::progress::{ExportProgress, ExportStage};

use super::parse_hint;

pub async fn run(
    config: &AppConfig,
    path: PathBuf,
    output: Option<PathBuf>,
    encoder: Option<String>,
) -> anyhow::Result<()> {
    println!("Exporting project at: {}", path.display());

    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let output_path = output.unwrap_or_else(|| project.exports_dir().join("output.mp4"));

    let mut job = ExportJob::for_project(&project, &output_path)?
        .with_transcoder(config.render.resolve_transcoder());
    if let Some(name) = encoder.as_deref() {
        job.timeline.export.encoder_hint = parse_hint(Some(name), &config.render.encoder_hint)?;
    }

    let export = &job.timeline.export;
    println!("  Output: {}", output_path.display());
    println!("  Resolution: {}x{} @ {} fps", export.width, export.height, export.fps);
    println!("  Encoder hint: {}", export.encoder_hint.as_str());

    let report = |p: ExportProgress| match p.stage {
        ExportStage::Rendering => {
            print!(
                "\r  Progress: {:.1}% ({})  ",
                p.progress * 100.0,
                p.encoder.map(|e| e.ffmpeg_name()).unwrap_or("-")
            );
            let _ = std::io::stdout().flush();
        }
        ExportStage::Complete => {}
        _ => println!("\n  {}", p.message),
    };

    let outcome = export_timeline(job, &report).await?;

    println!("\nExport complete: {}", outcome.output_path.display());
    println!("  Encoder: {}", outcome.encoder);
    for failure in &outcome.failed_attempts {
        println!("  Skipped {}: {}", failure.encoder, failure.error.lines().next().unwrap_or(""));
    }
    for warning in &outcome.warnings {
        println!("  Warning: {warning}");
    }

    Ok(())
}

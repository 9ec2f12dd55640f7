//! Validate a Recast project bundle.

use std::path::PathBuf;

use recast_project_model::LoadedProject;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    println!("  Name: {}", project.project.name);
    println!("  Version: {}", project.project.version);
    println!(
        "  Recording: {}x{} @ {} fps",
        project.project.recording.width,
        project.project.recording.height,
        project.project.recording.fps
    );
    println!(
        "  Export: {}x{} @ {} fps ({})",
        project.timeline.export.width,
        project.timeline.export.height,
        project.timeline.export.fps,
        project.timeline.export.encoder_hint.as_str()
    );
    println!(
        "  Zoom segments: {} ({} active)",
        project.timeline.zoom_segments.len(),
        project.timeline.active_zoom_segments().count()
    );

    let mut errors = project.validate_sources();
    if let Err(e) = project.timeline.validate() {
        errors.push(e.to_string());
    }

    if errors.is_empty() {
        println!("  Sources: All present");
        println!("\nProject is valid.");
    } else {
        println!("\nValidation issues:");
        for error in &errors {
            println!("  - {error}");
        }
        println!(
            "\n{} issue(s) found. Project may not be fully usable.",
            errors.len()
        );
    }

    Ok(())
}

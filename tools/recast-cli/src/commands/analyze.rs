//! Generate auto-zoom segments for a project.

use std::path::PathBuf;

use recast_common::config::AppConfig;
use recast_processing_core::auto_zoom::{
    build_auto_zooms, replace_auto_zooms, AutoZoomOptions, AutoZoomSignal,
};
use recast_project_model::LoadedProject;

pub fn run(
    config: &AppConfig,
    path: PathBuf,
    duration_ms: Option<u64>,
    zoom: Option<f64>,
    clicks: bool,
    typing: bool,
    focus: bool,
) -> anyhow::Result<()> {
    println!("Analyzing project at: {}", path.display());

    let mut project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let events = project
        .load_events()
        .map_err(|e| anyhow::anyhow!("Failed to load events: {e}"))?;
    println!("  Loaded {} events", events.len());

    if events.is_empty() {
        println!("  No events to analyze; clearing generated segments.");
    }

    // Metadata written before the recording finished has no duration.
    let duration_ms = duration_ms
        .filter(|d| *d > 0)
        .or(Some(project.project.recording.duration_ms).filter(|d| *d > 0))
        .or_else(|| events.iter().map(|e| e.at_ms).max())
        .unwrap_or(0);

    let mut options = AutoZoomOptions::from(&config.auto_zoom);
    options.set(AutoZoomSignal::Clicks, clicks && options.enabled(AutoZoomSignal::Clicks));
    options.set(AutoZoomSignal::Typing, typing && options.enabled(AutoZoomSignal::Typing));
    options.set(AutoZoomSignal::Focus, focus && options.enabled(AutoZoomSignal::Focus));
    if let Some(level) = zoom {
        options.default_zoom_level = level;
    }

    println!("  Running auto-zoom analysis (duration={duration_ms}ms)...");
    let generated = build_auto_zooms(&events, duration_ms, &options);
    println!("  Generated {} zoom segments", generated.len());
    for segment in &generated {
        let target = segment.target();
        println!(
            "    {} {:>6}-{:<6}ms x{:.2} at ({:.2}, {:.2})",
            segment.id, segment.start_ms, segment.end_ms, segment.level, target.x, target.y
        );
    }

    project.timeline = replace_auto_zooms(&project.timeline, generated)
        .map_err(|e| anyhow::anyhow!("Generated timeline is invalid: {e}"))?;

    project
        .save()
        .map_err(|e| anyhow::anyhow!("Failed to save timeline: {e}"))?;

    println!(
        "  Timeline saved to: {}",
        project
            .timeline_store()
            .path_for(&project.timeline.id)
            .display()
    );
    println!("\nAnalysis complete.");

    Ok(())
}

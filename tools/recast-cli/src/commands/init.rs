//! Initialize a new Recast project.

use std::path::PathBuf;

use recast_common::config::AppConfig;
use recast_project_model::LoadedProject;

pub fn run(
    config: &AppConfig,
    name: String,
    dir: Option<PathBuf>,
    screen: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
) -> anyhow::Result<()> {
    let parent = dir.unwrap_or_else(|| config.projects_dir.clone());
    let width = width.unwrap_or(config.render.width);
    let height = height.unwrap_or(config.render.height);
    let fps = fps.unwrap_or(config.render.fps);

    let project_dir = parent.join(&name);
    println!("Creating project '{}' at {}", name, project_dir.display());

    let mut project = LoadedProject::create(&project_dir, &name, width, height, fps)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    if let Some(screen) = screen {
        project.project.sources.screen = Some(screen);
        project
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;
    }

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  Export: {}x{} @ {} fps", width, height, project.timeline.export.fps);
    println!("  Timeline: {}", project.timeline.id);
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── sources/     (raw recordings)");
    println!("  ├── meta/        (project.json, timelines/, events.jsonl)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}

//! Render plans: the complete transcoder invocation for one encoder.

use std::path::{Path, PathBuf};

use serde::Serialize;

use recast_project_model::timeline::Timeline;

use crate::encoder::EncoderChoice;
use crate::expr::format_number;
use crate::filter_graph::{create_filter_graph, FilterGraph, VIDEO_OUT_LABEL};

/// Audio bitrate for the encoded track.
pub const AUDIO_BITRATE: &str = "192k";

/// Fully resolved transcoder invocation. Building one has no side effects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderPlan {
    pub transcoder_path: PathBuf,
    pub args: Vec<String>,
    pub output_path: PathBuf,
    pub encoder: EncoderChoice,

    /// Non-fatal degradations found while compiling.
    pub warnings: Vec<String>,
}

/// Inputs beyond the recording itself.
#[derive(Debug, Clone, Default)]
pub struct RenderPlanOptions {
    /// Separately captured system audio, replacing the recording's track.
    pub system_audio: Option<PathBuf>,

    /// Stop the output after this much time.
    pub max_duration_ms: Option<u64>,
}

impl RenderPlan {
    /// Shell-style rendering for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.transcoder_path.display().to_string())
            .chain(self.args.iter().map(|arg| {
                if arg.contains([' ', '\'', ';', '[']) {
                    format!("\"{arg}\"")
                } else {
                    arg.clone()
                }
            }))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Compile `timeline` into an invocation writing `output` with `encoder`.
pub fn create_render_plan(
    timeline: &Timeline,
    input: &Path,
    output: &Path,
    transcoder: &Path,
    encoder: EncoderChoice,
    options: &RenderPlanOptions,
) -> RenderPlan {
    let graph = create_filter_graph(timeline, &timeline.export);
    let FilterGraph {
        description,
        background_image,
        mut warnings,
    } = graph;

    let mut args = flags(["-y", "-i"]);
    args.push(path_arg(input));
    let mut next_input = 1;

    if let Some(image) = &background_image {
        args.extend(flags(["-loop", "1", "-i"]));
        args.push(path_arg(image));
        next_input += 1;
    }

    let muted = timeline.audio.muted;
    let system_audio_input = match &options.system_audio {
        Some(_) if muted => None,
        Some(path) if path.is_file() => {
            args.push("-i".to_string());
            args.push(path_arg(path));
            Some(next_input)
        }
        Some(path) => {
            tracing::warn!(path = %path.display(), "System audio missing, using recording audio");
            warnings.push(format!(
                "System audio not found: {}; using the recording's own audio",
                path.display()
            ));
            None
        }
        None => None,
    };

    if background_image.is_some() {
        args.push("-filter_complex".to_string());
        args.push(description);
        args.extend(flags(["-map", VIDEO_OUT_LABEL, "-shortest"]));
        if !muted {
            let audio_map = match system_audio_input {
                Some(index) => format!("{index}:a:0"),
                None => "0:a?".to_string(),
            };
            args.push("-map".to_string());
            args.push(audio_map);
        }
    } else {
        args.push("-vf".to_string());
        args.push(description);
        if let Some(index) = system_audio_input {
            args.extend(flags(["-map", "0:v:0", "-map"]));
            args.push(format!("{index}:a:0"));
        }
    }

    if muted {
        args.push("-an".to_string());
    } else {
        let volume = timeline.audio.volume.max(0.0);
        if (volume - 1.0).abs() > f64::EPSILON {
            args.push("-af".to_string());
            args.push(format!("volume={}", format_number(volume)));
        }
        args.extend(flags(["-c:a", "aac", "-b:a", AUDIO_BITRATE]));
    }

    args.push("-r".to_string());
    args.push(timeline.export.fps.to_string());
    args.extend(flags([
        "-c:v",
        encoder.ffmpeg_name(),
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ]));

    if let Some(max_ms) = options.max_duration_ms {
        args.push("-t".to_string());
        args.push(format_number(max_ms as f64 / 1000.0));
    }

    args.push(path_arg(output));

    tracing::debug!(
        encoder = %encoder,
        args = args.len(),
        warnings = warnings.len(),
        "Render plan compiled"
    );

    RenderPlan {
        transcoder_path: transcoder.to_path_buf(),
        args,
        output_path: output.to_path_buf(),
        encoder,
        warnings,
    }
}

fn flags<const N: usize>(items: [&str; N]) -> Vec<String> {
    items.into_iter().map(String::from).collect()
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

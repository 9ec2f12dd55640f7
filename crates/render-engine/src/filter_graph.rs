//! Timeline to transcoder filter graph.
//!
//! Foreground chain, per output frame:
//!
//! ```text
//! source ── normalize to export frame (letterbox)
//!        ── split: magnify a copy by the zoom level (per frame),
//!           overlay it onto the original at the negated clamped offset
//!        ── fit inside the padded box
//!        ── pad onto a solid canvas | overlay onto a cover-fit image
//!        ── yuv420p
//! ```

use std::path::{Path, PathBuf};

use recast_project_model::timeline::{
    BackgroundFill, BackgroundSettings, ExportSettings, Timeline, DEFAULT_CANVAS_COLOR,
};

use crate::expr::{magnified_offset, piecewise, Expr, Piece};

/// Output label of the composited stream in complex graphs.
pub const VIDEO_OUT_LABEL: &str = "[vout]";

/// Zoom level and normalized target over time.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomExprs {
    pub level: Expr,
    pub target_x: Expr,
    pub target_y: Expr,
}

/// Magnified frame size and the visible window's top-left inside it,
/// in export pixels. Every field is re-evaluated per output frame.
#[derive(Debug, Clone, PartialEq)]
pub struct MagnifyExprs {
    pub width: Expr,
    pub height: Expr,
    pub x: Expr,
    pub y: Expr,
}

/// A compiled graph plus what the invocation needs to feed it.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterGraph {
    pub description: String,

    /// Second input, looped. Present only for the image background path,
    /// which makes this a complex graph ending in [`VIDEO_OUT_LABEL`].
    pub background_image: Option<PathBuf>,

    pub warnings: Vec<String>,
}

impl FilterGraph {
    /// Whether this needs `-filter_complex` rather than `-vf`.
    pub fn is_complex(&self) -> bool {
        self.background_image.is_some()
    }
}

/// Level and target expressions from the active zoom segments.
pub fn zoom_expressions(timeline: &Timeline) -> ZoomExprs {
    let mut level = vec![];
    let mut target_x = vec![];
    let mut target_y = vec![];

    for zoom in timeline.active_zoom_segments() {
        let target = zoom.target().clamped();
        let piece = |value| Piece {
            start_ms: zoom.start_ms,
            end_ms: zoom.end_ms,
            value,
        };
        level.push(piece(zoom.clamped_level()));
        target_x.push(piece(target.x));
        target_y.push(piece(target.y));
    }

    ZoomExprs {
        level: piecewise(&level, 1.0),
        target_x: piecewise(&target_x, 0.5),
        target_y: piecewise(&target_y, 0.5),
    }
}

/// Magnification of a `width`x`height` frame. The window it leaves
/// visible is exactly the view transform's viewport, scaled by the level.
pub fn magnify_expressions(zoom: &ZoomExprs, width: f64, height: f64) -> MagnifyExprs {
    MagnifyExprs {
        width: Expr::Const(width) * zoom.level.clone(),
        height: Expr::Const(height) * zoom.level.clone(),
        x: magnified_offset(zoom.target_x.clone(), width, zoom.level.clone()),
        y: magnified_offset(zoom.target_y.clone(), height, zoom.level.clone()),
    }
}

/// `scale` and `overlay` both default to evaluating once at init with
/// `t` undefined, which would pin every window to its fallback.
fn zoom_stage(magnify: &MagnifyExprs) -> String {
    format!(
        "split=2[base][zoom];\
         [zoom]scale=w='{}':h='{}':eval=frame[magnified];\
         [base][magnified]overlay=x='-{}':y='-{}':eval=frame",
        magnify.width, magnify.height, magnify.x, magnify.y
    )
}

/// Margin between the recording and the frame edge, capped at half the
/// smaller output dimension.
pub fn frame_margin(background: &BackgroundSettings, export: &ExportSettings) -> u32 {
    let requested = (background.padding + background.inset).max(0.0).round();
    let cap = export.width.min(export.height) / 2;
    if requested >= f64::from(cap) {
        cap
    } else {
        requested as u32
    }
}

/// `#rrggbb` as `0xrrggbb`. Anything else is rejected.
pub fn ffmpeg_color(color: &str) -> Option<String> {
    let hex = color.strip_prefix('#')?;
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(format!("0x{hex}"))
    } else {
        None
    }
}

/// Canvas color for the solid path.
fn canvas_color(fill: &BackgroundFill, warnings: &mut Vec<String>) -> String {
    let requested = match fill {
        BackgroundFill::Color { color } => Some(color.as_str()),
        BackgroundFill::Gradient { gradient_from, .. } => Some(gradient_from.as_str()),
        _ => None,
    };

    if let Some(color) = requested {
        if let Some(parsed) = ffmpeg_color(color) {
            return parsed;
        }
        warnings.push(format!(
            "Background color {color:?} is not #rrggbb; using {DEFAULT_CANVAS_COLOR}"
        ));
    }

    let fallback = DEFAULT_CANVAS_COLOR.trim_start_matches('#');
    format!("0x{fallback}")
}

/// Compile the graph, checking the configured background image on disk.
///
/// A missing image degrades to the solid canvas and adds a warning.
pub fn create_filter_graph(timeline: &Timeline, export: &ExportSettings) -> FilterGraph {
    let mut warnings = vec![];

    let image = match &timeline.background.fill {
        BackgroundFill::Image { image_path } if image_path.is_file() => Some(image_path.as_path()),
        BackgroundFill::Image { image_path } => {
            tracing::warn!(path = %image_path.display(), "Background image missing, using solid canvas");
            warnings.push(format!(
                "Background image not found: {}; using a solid background",
                image_path.display()
            ));
            None
        }
        _ => None,
    };

    let mut graph = compile_filter_graph(timeline, export, image);
    warnings.append(&mut graph.warnings);
    graph.warnings = warnings;
    graph
}

/// Compile the graph without touching the filesystem.
///
/// `background_image` must already be resolved; `None` means the solid
/// canvas path regardless of the background type.
pub fn compile_filter_graph(
    timeline: &Timeline,
    export: &ExportSettings,
    background_image: Option<&Path>,
) -> FilterGraph {
    let (out_w, out_h) = (export.width, export.height);
    let mut warnings = vec![];

    let magnify = magnify_expressions(
        &zoom_expressions(timeline),
        f64::from(out_w),
        f64::from(out_h),
    );

    let margin = frame_margin(&timeline.background, export);
    let box_w = out_w.saturating_sub(margin * 2).max(2);
    let box_h = out_h.saturating_sub(margin * 2).max(2);

    let foreground = [
        format!(
            "scale={out_w}:{out_h}:force_original_aspect_ratio=decrease,pad={out_w}:{out_h}:(ow-iw)/2:(oh-ih)/2:color=black"
        ),
        zoom_stage(&magnify),
        format!(
            "scale={box_w}:{box_h}:force_original_aspect_ratio=decrease:force_divisible_by=2"
        ),
    ]
    .join(",");

    let description = match background_image {
        Some(image) => {
            tracing::debug!(image = %image.display(), "Compositing over background image");
            format!(
                "[1:v]scale={out_w}:{out_h}:force_original_aspect_ratio=increase,crop={out_w}:{out_h},setsar=1[bg];\
                 [0:v]{foreground},format=rgba[fg];\
                 [bg][fg]overlay=x=(main_w-overlay_w)/2:y=(main_h-overlay_h)/2:format=auto,format=yuv420p{VIDEO_OUT_LABEL}"
            )
        }
        None => {
            let color = canvas_color(&timeline.background.fill, &mut warnings);
            format!(
                "{foreground},pad={out_w}:{out_h}:(ow-iw)/2:(oh-ih)/2:color={color},setsar=1,format=yuv420p"
            )
        }
    };

    FilterGraph {
        description,
        background_image: background_image.map(Path::to_path_buf),
        warnings,
    }
}

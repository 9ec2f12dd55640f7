//! Recast CLI: command-line interface for analysis, planning and export.
//!
//! Usage:
//!   recast init <NAME>         Create a new project
//!   recast analyze <PATH>      Generate auto-zoom segments from events
//!   recast plan <PATH>         Print the compiled render plan
//!   recast export <PATH>       Export a project to video
//!   recast encoders            Show encoder negotiation
//!   recast validate <PATH>     Validate a project bundle

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use recast_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "recast",
    about = "Screen-recording edit timelines rendered through ffmpeg",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    Init {
        /// Project name
        name: String,

        /// Parent directory (defaults to the configured projects directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Screen recording to register, relative to the project root
        #[arg(long)]
        screen: Option<String>,

        /// Export width
        #[arg(long)]
        width: Option<u32>,

        /// Export height
        #[arg(long)]
        height: Option<u32>,

        /// Export frame rate (30 or 60)
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Generate auto-zoom segments from recorded events
    Analyze {
        /// Path to the project directory
        path: PathBuf,

        /// Recording length in milliseconds (defaults to project metadata)
        #[arg(long)]
        duration_ms: Option<u64>,

        /// Zoom level for generated segments
        #[arg(long)]
        zoom: Option<f64>,

        /// Skip click events
        #[arg(long)]
        no_clicks: bool,

        /// Skip typing events
        #[arg(long)]
        no_typing: bool,

        /// Skip focus events
        #[arg(long)]
        no_focus: bool,
    },

    /// Print the compiled render plan as JSON
    Plan {
        /// Path to the project directory
        path: PathBuf,

        /// Encoder to plan for (defaults to the negotiated pick)
        #[arg(short, long)]
        encoder: Option<String>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export a project to video
    Export {
        /// Path to the project directory
        path: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Encoder hint: auto|nvenc|qsv|amf|mpeg4
        #[arg(long)]
        encoder: Option<String>,
    },

    /// Show available encoders and the attempt chain
    Encoders {
        /// Encoder hint: auto|nvenc|qsv|amf|mpeg4
        #[arg(long)]
        hint: Option<String>,
    },

    /// Validate a project bundle
    Validate {
        /// Path to the project directory
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load();

    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    recast_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Init {
            name,
            dir,
            screen,
            width,
            height,
            fps,
        } => commands::init::run(&config, name, dir, screen, width, height, fps),
        Commands::Analyze {
            path,
            duration_ms,
            zoom,
            no_clicks,
            no_typing,
            no_focus,
        } => commands::analyze::run(
            &config,
            path,
            duration_ms,
            zoom,
            !no_clicks,
            !no_typing,
            !no_focus,
        ),
        Commands::Plan {
            path,
            encoder,
            output,
        } => commands::plan::run(&config, path, encoder, output).await,
        Commands::Export {
            path,
            output,
            encoder,
        } => commands::export::run(&config, path, output, encoder).await,
        Commands::Encoders { hint } => commands::encoders::run(&config, hint).await,
        Commands::Validate { path } => commands::validate::run(path),
    }
}

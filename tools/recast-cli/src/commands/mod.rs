pub mod analyze;
pub mod encoders;
pub mod export;
pub mod init;
pub mod plan;
pub mod validate;

use recast_project_model::timeline::EncoderHint;

/// Hint from the command line, else from the config file.
pub(crate) fn parse_hint(arg: Option<&str>, configured: &str) -> anyhow::Result<EncoderHint> {
    arg.unwrap_or(configured)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
}

//! Show what encoder negotiation would do on this machine.

use recast_common::config::AppConfig;
use recast_render_engine::encoder::{
    build_encoder_attempts, pick_encoder, query_available_encoders, EncoderChoice,
};

use super::parse_hint;

pub async fn run(config: &AppConfig, hint: Option<String>) -> anyhow::Result<()> {
    let hint = parse_hint(hint.as_deref(), &config.render.encoder_hint)?;
    let transcoder = config.render.resolve_transcoder();

    println!("Recast Encoder Check");
    println!("{}", "=".repeat(50));
    println!("Transcoder: {}", transcoder.display());

    let available = query_available_encoders(&transcoder).await;
    for encoder in EncoderChoice::PRIORITY {
        let mark = if available.contains(&encoder) { "OK" } else { "--" };
        let kind = if encoder.is_hardware() { "hardware" } else { "software" };
        println!("[{mark}] {:<12} ({kind})", encoder.ffmpeg_name());
    }

    let preferred = pick_encoder(&available, hint);
    let attempts = build_encoder_attempts(&available, preferred);

    println!();
    println!("Hint: {}", hint.as_str());
    println!("Pick: {preferred}");
    println!(
        "Attempt chain: {}",
        attempts
            .iter()
            .map(|e| e.ffmpeg_name())
            .collect::<Vec<_>>()
            .join(" -> ")
    );

    Ok(())
}

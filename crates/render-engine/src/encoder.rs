//! Encoder negotiation: what the transcoder offers, what to try, in
//! which order.

use std::fmt;
use std::path::Path;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use recast_project_model::timeline::EncoderHint;

/// Video encoders the exporter knows, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EncoderChoice {
    #[serde(rename = "h264_nvenc")]
    H264Nvenc,
    #[serde(rename = "h264_qsv")]
    H264Qsv,
    #[serde(rename = "h264_amf")]
    H264Amf,
    #[serde(rename = "libx264")]
    Libx264,
    #[serde(rename = "mpeg4")]
    Mpeg4,
}

impl EncoderChoice {
    /// Every encoder, most preferred first.
    pub const PRIORITY: [EncoderChoice; 5] = [
        EncoderChoice::H264Nvenc,
        EncoderChoice::H264Qsv,
        EncoderChoice::H264Amf,
        EncoderChoice::Libx264,
        EncoderChoice::Mpeg4,
    ];

    pub const HARDWARE: [EncoderChoice; 3] = [
        EncoderChoice::H264Nvenc,
        EncoderChoice::H264Qsv,
        EncoderChoice::H264Amf,
    ];

    /// Name passed to `-c:v`.
    pub fn ffmpeg_name(self) -> &'static str {
        match self {
            EncoderChoice::H264Nvenc => "h264_nvenc",
            EncoderChoice::H264Qsv => "h264_qsv",
            EncoderChoice::H264Amf => "h264_amf",
            EncoderChoice::Libx264 => "libx264",
            EncoderChoice::Mpeg4 => "mpeg4",
        }
    }

    pub fn from_ffmpeg_name(name: &str) -> Option<Self> {
        Self::PRIORITY
            .into_iter()
            .find(|encoder| encoder.ffmpeg_name() == name)
    }

    /// Encoder a hint asks for. `Auto` names none.
    pub fn for_hint(hint: EncoderHint) -> Option<Self> {
        match hint {
            EncoderHint::Auto => None,
            EncoderHint::Nvenc => Some(EncoderChoice::H264Nvenc),
            EncoderHint::Qsv => Some(EncoderChoice::H264Qsv),
            EncoderHint::Amf => Some(EncoderChoice::H264Amf),
            EncoderHint::Mpeg4 => Some(EncoderChoice::Mpeg4),
        }
    }

    pub fn is_hardware(self) -> bool {
        Self::HARDWARE.contains(&self)
    }
}

impl fmt::Display for EncoderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.ffmpeg_name())
    }
}

/// Assumed when probing fails or finds nothing.
pub const BASELINE_ENCODERS: [EncoderChoice; 2] = [EncoderChoice::Libx264, EncoderChoice::Mpeg4];

/// Choose the encoder for the first attempt.
///
/// A hint naming an available encoder wins. `Auto` walks the hardware
/// encoders in priority order. Otherwise software: `libx264` when
/// available, else `mpeg4`, which is assumed to always exist.
pub fn pick_encoder(available: &[EncoderChoice], hint: EncoderHint) -> EncoderChoice {
    match EncoderChoice::for_hint(hint) {
        Some(wanted) if available.contains(&wanted) => return wanted,
        Some(wanted) => {
            tracing::info!(encoder = %wanted, "Requested encoder unavailable, using software");
        }
        None => {
            if let Some(hardware) = EncoderChoice::HARDWARE
                .into_iter()
                .find(|encoder| available.contains(encoder))
            {
                return hardware;
            }
        }
    }

    if available.contains(&EncoderChoice::Libx264) {
        EncoderChoice::Libx264
    } else {
        EncoderChoice::Mpeg4
    }
}

/// Full retry chain: `preferred`, every available encoder by priority,
/// then `libx264` and `mpeg4` as safety nets. No duplicates.
pub fn build_encoder_attempts(
    available: &[EncoderChoice],
    preferred: EncoderChoice,
) -> Vec<EncoderChoice> {
    let candidates = std::iter::once(preferred)
        .chain(
            EncoderChoice::PRIORITY
                .into_iter()
                .filter(|encoder| available.contains(encoder)),
        )
        .chain(BASELINE_ENCODERS);

    let mut attempts = Vec::with_capacity(EncoderChoice::PRIORITY.len());
    for encoder in candidates {
        if !attempts.contains(&encoder) {
            attempts.push(encoder);
        }
    }
    attempts
}

/// Known encoders named in `-encoders` output.
pub fn parse_encoder_listing(listing: &str) -> Vec<EncoderChoice> {
    let found: Vec<EncoderChoice> = EncoderChoice::PRIORITY
        .into_iter()
        .filter(|encoder| {
            listing
                .split_whitespace()
                .any(|token| token == encoder.ffmpeg_name())
        })
        .collect();

    if found.is_empty() {
        BASELINE_ENCODERS.to_vec()
    } else {
        found
    }
}

/// Ask the transcoder which encoders it was built with.
///
/// Never fails: an unusable transcoder yields [`BASELINE_ENCODERS`].
pub async fn query_available_encoders(transcoder: &Path) -> Vec<EncoderChoice> {
    let output = Command::new(transcoder)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await;

    let available = match output {
        Ok(output) if output.status.success() => {
            parse_encoder_listing(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => {
            tracing::warn!(status = %output.status, "Encoder listing exited unsuccessfully");
            BASELINE_ENCODERS.to_vec()
        }
        Err(e) => {
            tracing::warn!(
                transcoder = %transcoder.display(),
                error = %e,
                "Encoder listing could not run"
            );
            BASELINE_ENCODERS.to_vec()
        }
    };

    tracing::info!(
        encoders = ?available.iter().map(|e| e.ffmpeg_name()).collect::<Vec<_>>(),
        "Encoders listed"
    );
    available
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::EncoderChoice::*;

    #[test]
    fn test_pick_honors_available_hint() {
        assert_eq!(pick_encoder(&[H264Nvenc, H264Qsv, Libx264], EncoderHint::Qsv), H264Qsv);
        assert_eq!(pick_encoder(&[Libx264, Mpeg4], EncoderHint::Mpeg4), Mpeg4);
    }

    #[test]
    fn test_pick_unavailable_hint_falls_back_to_software() {
        assert_eq!(pick_encoder(&[H264Nvenc, Libx264], EncoderHint::Qsv), Libx264);
        assert_eq!(pick_encoder(&[H264Amf], EncoderHint::Nvenc), Mpeg4);
    }

    #[test]
    fn test_pick_auto_walks_hardware_first() {
        assert_eq!(pick_encoder(&[Libx264, H264Amf, H264Qsv], EncoderHint::Auto), H264Qsv);
        assert_eq!(pick_encoder(&[Libx264], EncoderHint::Auto), Libx264);
        assert_eq!(pick_encoder(&[], EncoderHint::Auto), Mpeg4);
    }

    #[test]
    fn test_attempt_chain() {
        assert_eq!(
            build_encoder_attempts(&[H264Qsv], H264Nvenc),
            vec![H264Nvenc, H264Qsv, Libx264, Mpeg4]
        );
        assert_eq!(
            build_encoder_attempts(&[H264Qsv, Libx264], H264Qsv),
            vec![H264Qsv, Libx264, Mpeg4]
        );
        assert_eq!(build_encoder_attempts(&[], Mpeg4), vec![Mpeg4, Libx264]);
    }

    #[test]
    fn test_parse_encoder_listing() {
        let listing = "Encoders:\n \
            V....D h264_nvenc           NVIDIA NVENC H.264 encoder (codec h264)\n \
            V....D libx264              libx264 H.264 / AVC / MPEG-4 AVC (codec h264)\n \
            V....D libx264rgb           libx264 H.264 RGB (codec h264)\n \
            V.S... mpeg4                MPEG-4 part 2\n";
        assert_eq!(parse_encoder_listing(listing), vec![H264Nvenc, Libx264, Mpeg4]);
        assert_eq!(parse_encoder_listing(""), vec![Libx264, Mpeg4]);
    }

    #[test]
    fn test_names_round_trip() {
        for encoder in EncoderChoice::PRIORITY {
            assert_eq!(EncoderChoice::from_ffmpeg_name(encoder.ffmpeg_name()), Some(encoder));
        }
        assert_eq!(
            serde_json::to_string(&H264Qsv).unwrap(),
            "\"h264_qsv\""
        );
        assert!(H264Amf.is_hardware());
        assert!(!Libx264.is_hardware());
    }

    #[tokio::test]
    async fn test_missing_transcoder_uses_baseline() {
        let available =
            query_available_encoders(Path::new("/nonexistent/recast-transcoder")).await;
        assert_eq!(available, BASELINE_ENCODERS.to_vec());
    }
}

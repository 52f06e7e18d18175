//! Quality estimation for arbitration.
//!
//! Explicit bitrates reported by the extractors are unreliable, so quality is
//! derived from file size and duration, minus an audio allowance, scaled to an
//! approximate H.264-equivalent video bitrate.

use crate::config::QualityConfig;
use crate::models::VideoRecord;
use crate::normalize::{is_aac_audio_codec, is_efficient_video_codec};

/// Approximate H.264-equivalent video bitrate in kbps.
///
/// Files that are not on disk score 0. The result may be zero or negative for
/// garbage metadata; it is only ever compared, never trusted as a real bitrate.
pub fn estimate_bitrate(record: &VideoRecord, config: &QualityConfig) -> f64 {
    let Some(size) = record.size else {
        return 0.0;
    };
    let duration = record.duration.unwrap_or(0);
    if duration <= 0 {
        return 0.0;
    }

    // Integer kbits first so very large sizes stay exact before narrowing.
    let size_kbits = size.saturating_mul(8) / 1000;
    let total_kbps = size_kbits as f64 / duration as f64;

    let audio_kbps = record.audio_bitrate.unwrap_or_else(|| {
        if is_aac_audio_codec(&record.audio_codec) {
            config.aac_audio_kbps
        } else {
            config.default_audio_kbps
        }
    });

    let video_kbps = total_kbps - audio_kbps;
    if is_efficient_video_codec(&record.video_codec) {
        video_kbps * config.efficient_codec_multiplier
    } else {
        video_kbps
    }
}

/// True when `a` beats `b` by more than `ratio`.
///
/// Equivalent to `a / b > ratio` for positive `b`, without dividing, so zero and
/// negative estimates compare sensibly.
pub fn clearly_exceeds(a: f64, b: f64, ratio: f64) -> bool {
    a - b > (ratio - 1.0) * b.abs()
}

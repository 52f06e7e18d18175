//! Cell normalization shared by the categorizer and the summarizer.
//!
//! Numeric cells are parsed without consulting any process-wide locale: the
//! thousands separator comes from configuration and is stripped explicitly.
//! Blank means empty or whitespace-only, and always means "use the next
//! fallback" rather than "zero".

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// REGEX PATTERNS
// ============================================================================

/// Plain or fractional decimal after separators are stripped: "3600", "-12", "129.47".
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?(\d+)(?:\.\d*)?$").unwrap());

/// Upload dates are eight digits, YYYYMMDD.
static UPLOAD_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{8}$").unwrap());

/// AV1, VP9 and H.265 identifiers as reported by the extractors ("av01.0.08M.08", "vp9", "hvc1.1.6.L120.90").
static EFFICIENT_VIDEO_CODEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:av01|vp0?9|hvc1|hev1)(?:\.|$)").unwrap());

/// AAC identifiers ("mp4a.40.2", "aac").
static AAC_AUDIO_CODEC: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^(?:mp4a(?:\.|$)|aac)").unwrap());

/// A cell held something that is neither blank nor a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedCell;

// ============================================================================
// BLANK SENTINEL
// ============================================================================

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the value unless it is blank.
pub fn non_blank(value: &str) -> Option<&str> {
    if is_blank(value) {
        None
    } else {
        Some(value)
    }
}

// ============================================================================
// NUMERIC CELLS
// ============================================================================

fn strip_separators(raw: &str, separator: char) -> String {
    raw.trim().chars().filter(|&c| c != separator).collect()
}

/// File size in bytes. Blank means the file is not on disk.
pub fn parse_size(raw: &str, separator: char) -> Result<Option<u64>, MalformedCell> {
    if is_blank(raw) {
        return Ok(None);
    }
    let digits = strip_separators(raw, separator);
    let digits = digits.strip_prefix('+').unwrap_or(&digits);
    digits.parse::<u64>().map(Some).map_err(|_| MalformedCell)
}

/// Whole-number cell (duration, height, subtitle count). A fractional part is
/// truncated toward zero, so "3600.0" reads as 3600.
pub fn parse_whole(raw: &str, separator: char) -> Result<Option<i64>, MalformedCell> {
    if is_blank(raw) {
        return Ok(None);
    }
    let cleaned = strip_separators(raw, separator);
    if !DECIMAL.is_match(&cleaned) {
        return Err(MalformedCell);
    }
    let whole = cleaned.split('.').next().unwrap_or_default();
    whole.parse::<i64>().map(Some).map_err(|_| MalformedCell)
}

/// Decimal cell such as an audio bitrate in kbps.
pub fn parse_decimal(raw: &str) -> Result<Option<f64>, MalformedCell> {
    if is_blank(raw) {
        return Ok(None);
    }
    let cleaned = raw.trim();
    if !DECIMAL.is_match(cleaned) {
        return Err(MalformedCell);
    }
    cleaned.parse::<f64>().map(Some).map_err(|_| MalformedCell)
}

// ============================================================================
// DATES
// ============================================================================

/// Parses a YYYYMMDD upload date. Anything that is not a real calendar date is `None`.
pub fn parse_upload_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if !UPLOAD_DATE.is_match(trimmed) {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y%m%d").ok()
}

pub fn format_upload_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

// ============================================================================
// CODEC FAMILIES
// ============================================================================

/// True for codecs that need roughly a third less bitrate than H.264 for equal quality.
pub fn is_efficient_video_codec(codec: &str) -> bool {
    EFFICIENT_VIDEO_CODEC.is_match(codec.trim())
}

pub fn is_aac_audio_codec(codec: &str) -> bool {
    AAC_AUDIO_CODEC.is_match(codec.trim())
}

// ============================================================================
// TESTS
// ============================================================================

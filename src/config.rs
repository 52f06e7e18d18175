//! Tunable thresholds for grouping and arbitration.
//!
//! Every field has a default, so an empty TOML document (or no `--config` at
//! all) reproduces the stock heuristics. Dates are written as quoted
//! `"YYYY-MM-DD"` strings.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::Path;

use crate::errors::{CategorizeError, Result};
use crate::models::Platform;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategorizeConfig {
    pub platforms: PlatformNames,
    pub grouping: GroupingConfig,
    pub arbitration: ArbitrationConfig,
    pub quality: QualityConfig,
    pub parsing: ParsingConfig,
}

/// Values of the platform column that identify the two arbitrated platforms.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformNames {
    pub primary: String,
    pub secondary: String,
}

impl Default for PlatformNames {
    fn default() -> Self {
        Self {
            primary: "RoosterTeeth".to_string(),
            secondary: "youtube".to_string(),
        }
    }
}

impl PlatformNames {
    /// Platform cells are compared exactly, without trimming or case folding.
    pub fn classify(&self, value: &str) -> Platform {
        if value == self.primary {
            Platform::Primary
        } else if value == self.secondary {
            Platform::Secondary
        } else {
            Platform::Unknown
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroupingConfig {
    /// Records dated before this are never grouped.
    pub earliest_date: NaiveDate,
    /// Forward lookahead from the anchor's date.
    pub window_days: i64,
    /// Flat allowance on top of the shorter duration.
    pub duration_slack: f64,
    pub duration_floor_secs: f64,
    pub duration_fraction: f64,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            earliest_date: ymd(2004, 1, 1),
            window_days: 1,
            duration_slack: 0.05,
            duration_floor_secs: 45.0,
            duration_fraction: 0.10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArbitrationConfig {
    /// Groups whose earlier upload predates this prefer the secondary platform.
    pub secondary_preferred_before: NaiveDate,
    /// Estimated bitrates within this ratio of each other count as equal.
    pub quality_ratio: f64,
    pub censored_channels: Vec<String>,
    pub censored_since: NaiveDate,
    pub max_duration_divergence_secs: i64,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            secondary_preferred_before: ymd(2018, 1, 1),
            quality_ratio: 1.1,
            censored_channels: vec!["Achievement Hunter".to_string(), "LetsPlay".to_string()],
            censored_since: ymd(2019, 10, 1),
            max_duration_divergence_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub aac_audio_kbps: f64,
    pub default_audio_kbps: f64,
    /// H.264-equivalent scaling for AV1, VP9 and HEVC streams.
    pub efficient_codec_multiplier: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            aac_audio_kbps: 128.0,
            default_audio_kbps: 160.0,
            efficient_codec_multiplier: 1.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParsingConfig {
    /// Grouping separator stripped from integer cells such as `Size`.
    pub thousands_separator: char,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            thousands_separator: ',',
        }
    }
}

impl CategorizeConfig {
    pub fn parse(toml_src: &str) -> Result<Self> {
        let config: CategorizeConfig = toml::from_str(toml_src)
            .map_err(|err| CategorizeError::Configuration(format!("invalid config: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path)?;
        Self::parse(&src)
    }

    fn validate(&self) -> Result<()> {
        if self.platforms.primary == self.platforms.secondary {
            return Err(CategorizeError::Configuration(format!(
                "primary and secondary platform are both '{}'",
                self.platforms.primary
            )));
        }
        if self.grouping.window_days < 0 {
            return Err(CategorizeError::Configuration(
                "grouping.window_days must not be negative".to_string(),
            ));
        }
        if self.arbitration.quality_ratio < 1.0 {
            return Err(CategorizeError::Configuration(
                "arbitration.quality_ratio must be at least 1.0".to_string(),
            ));
        }
        if self.parsing.thousands_separator.is_ascii_digit() {
            return Err(CategorizeError::Configuration(
                "parsing.thousands_separator cannot be a digit".to_string(),
            ));
        }
        Ok(())
    }
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

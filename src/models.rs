//! Core data models for vidinfo categorization.
//!
//! This module contains the record, group and disposition types that flow
//! through the grouping and arbitration pipeline, plus run statistics.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::normalize::non_blank;

// ============================================================================
// Input Models
// ============================================================================

/// Which side of the arbitration a record's platform falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// The streaming site.
    Primary,
    /// The video-sharing site.
    Secondary,
    Unknown,
}

/// Manually curated naming fields. Blank cells are kept as empty strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CuratedFields {
    pub group: String,
    pub series: String,
    pub episode: String,
    pub output_title: String,
    pub part: String,
    pub flag: String,
}

impl CuratedFields {
    /// Field-wise first non-blank value across `sources`, in order.
    pub fn first_non_blank<'a>(sources: impl IntoIterator<Item = &'a CuratedFields>) -> Self {
        let sources: Vec<&CuratedFields> = sources.into_iter().collect();
        let pick = |get: fn(&CuratedFields) -> &str| -> String {
            sources
                .iter()
                .find_map(|s| non_blank(get(s)))
                .unwrap_or_default()
                .to_string()
        };
        Self {
            group: pick(|c| c.group.as_str()),
            series: pick(|c| c.series.as_str()),
            episode: pick(|c| c.episode.as_str()),
            output_title: pick(|c| c.output_title.as_str()),
            part: pick(|c| c.part.as_str()),
            flag: pick(|c| c.flag.as_str()),
        }
    }

    pub fn is_flagged(&self) -> bool {
        non_blank(&self.flag).is_some()
    }
}

/// One row of per-file video metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoRecord {
    /// Zero-based data-row index in the input table.
    pub row: usize,
    pub server: String,
    pub filename: String,
    /// Raw size cell, used verbatim in the canonicalization key.
    pub size_text: String,
    /// `None` means the file is not on disk.
    pub size: Option<u64>,
    pub platform: Platform,
    pub id: String,
    pub channel: String,
    pub title: String,
    /// `None` when the cell was blank or not a real YYYYMMDD date.
    pub date: Option<NaiveDate>,
    pub duration: Option<i64>,
    pub subtitles: Option<i64>,
    pub height: Option<i64>,
    pub curated: CuratedFields,
    pub audio_bitrate: Option<f64>,
    pub video_codec: String,
    pub audio_codec: String,
}

impl VideoRecord {
    pub fn has_size(&self) -> bool {
        self.size.is_some()
    }

    pub fn file_ref(&self) -> FileRef {
        FileRef {
            server: self.server.clone(),
            path: self.filename.clone(),
        }
    }
}

/// Location of a physical file on an origin server.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FileRef {
    pub server: String,
    pub path: String,
}

// ============================================================================
// Groups
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    /// Built by the windowed scan.
    Dated,
    /// Singleton whose date is missing, unparseable or too early; always inspected.
    Undated,
}

/// Records believed to be the same logical video.
/// Members keep scan order: the anchor first, then matches as they were found.
#[derive(Clone, Debug)]
pub struct VideoGroup {
    pub kind: GroupKind,
    pub members: Vec<VideoRecord>,
}

impl VideoGroup {
    pub fn singleton(kind: GroupKind, record: VideoRecord) -> Self {
        Self {
            kind,
            members: vec![record],
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

// ============================================================================
// Dispositions
// ============================================================================

/// Streams taken from a file when the pair is merged downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamSet {
    pub audio: bool,
    pub video: bool,
    pub subs: bool,
}

impl StreamSet {
    pub const AUDIO: StreamSet = StreamSet {
        audio: true,
        video: false,
        subs: false,
    };
    pub const VIDEO: StreamSet = StreamSet {
        audio: false,
        video: true,
        subs: false,
    };
    pub const SUBS: StreamSet = StreamSet {
        audio: false,
        video: false,
        subs: true,
    };

    pub fn with_subs(self, subs: bool) -> Self {
        Self { subs, ..self }
    }

    pub fn with_audio(self, audio: bool) -> Self {
        Self { audio, ..self }
    }
}

impl fmt::Display for StreamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [
            (self.audio, "audio"),
            (self.video, "video"),
            (self.subs, "subs"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
        write!(f, "{}", parts.join("+"))
    }
}

/// Prefix applied when a merge pair's durations disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Keep,
    Archive,
}

impl Retention {
    pub fn opposite(self) -> Self {
        match self {
            Retention::Keep => Retention::Archive,
            Retention::Archive => Retention::Keep,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Retention::Keep => "keep_",
            Retention::Archive => "archive_",
        }
    }
}

/// What downstream handling should do with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Inspect,
    Keep,
    Delete,
    Ignore,
    Streams {
        streams: StreamSet,
        retention: Option<Retention>,
    },
}

impl Disposition {
    pub fn streams(streams: StreamSet) -> Self {
        Disposition::Streams {
            streams,
            retention: None,
        }
    }

    /// Adds a retention prefix to a stream disposition; other dispositions are unchanged.
    pub fn retained(self, retention: Retention) -> Self {
        match self {
            Disposition::Streams { streams, .. } => Disposition::Streams {
                streams,
                retention: Some(retention),
            },
            other => other,
        }
    }

    pub fn class(self) -> DispositionClass {
        match self {
            Disposition::Inspect => DispositionClass::Inspect,
            Disposition::Keep => DispositionClass::Keep,
            Disposition::Delete => DispositionClass::Delete,
            Disposition::Ignore => DispositionClass::Ignore,
            Disposition::Streams {
                retention: Some(Retention::Keep),
                ..
            } => DispositionClass::Keep,
            Disposition::Streams {
                retention: Some(Retention::Archive),
                ..
            } => DispositionClass::Archive,
            Disposition::Streams {
                retention: None, ..
            } => DispositionClass::Merge,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Inspect => write!(f, "inspect"),
            Disposition::Keep => write!(f, "keep"),
            Disposition::Delete => write!(f, "delete"),
            Disposition::Ignore => write!(f, "ignore"),
            Disposition::Streams { streams, retention } => {
                if let Some(retention) = retention {
                    write!(f, "{}", retention.prefix())?;
                }
                write!(f, "{}", streams)
            }
        }
    }
}

impl FromStr for Disposition {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "inspect" => return Ok(Disposition::Inspect),
            "keep" => return Ok(Disposition::Keep),
            "delete" => return Ok(Disposition::Delete),
            "ignore" => return Ok(Disposition::Ignore),
            _ => {}
        }
        let (retention, rest) = if let Some(rest) = value.strip_prefix("keep_") {
            (Some(Retention::Keep), rest)
        } else if let Some(rest) = value.strip_prefix("archive_") {
            (Some(Retention::Archive), rest)
        } else {
            (None, value)
        };
        let mut streams = StreamSet::default();
        for part in rest.split('+') {
            let slot = match part {
                "audio" => &mut streams.audio,
                "video" => &mut streams.video,
                "subs" => &mut streams.subs,
                other => return Err(format!("unknown disposition: {other}")),
            };
            if *slot {
                return Err(format!("stream '{part}' repeated in disposition {value}"));
            }
            *slot = true;
        }
        Ok(Disposition::Streams { streams, retention })
    }
}

/// Coarse handling bucket: a disposition's text before the first `_`,
/// with unprefixed stream sets collected under `Merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispositionClass {
    Inspect,
    Keep,
    Archive,
    Merge,
    Delete,
    Ignore,
}

impl DispositionClass {
    pub const ALL: [DispositionClass; 6] = [
        DispositionClass::Inspect,
        DispositionClass::Keep,
        DispositionClass::Archive,
        DispositionClass::Merge,
        DispositionClass::Delete,
        DispositionClass::Ignore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DispositionClass::Inspect => "inspect",
            DispositionClass::Keep => "keep",
            DispositionClass::Archive => "archive",
            DispositionClass::Merge => "merge",
            DispositionClass::Delete => "delete",
            DispositionClass::Ignore => "ignore",
        }
    }
}

impl FromStr for DispositionClass {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DispositionClass::ALL
            .into_iter()
            .find(|class| class.name() == value)
            .ok_or_else(|| format!("unknown disposition class: {value}"))
    }
}

// ============================================================================
// Output Models
// ============================================================================

/// A record after arbitration and metadata merge. Built once per record from
/// named fields; nothing is inherited implicitly from the input row.
#[derive(Clone, Debug)]
pub struct AugmentedRecord {
    pub record: VideoRecord,
    pub disposition: Disposition,
    /// Whether the group's primary-platform ID is in the alive list.
    /// `None` when the group has no sized primary-platform member.
    pub alive: Option<bool>,
    pub primary_id: Option<String>,
    pub secondary_id: Option<String>,
    /// Curated values after the group merge.
    pub curated: CuratedFields,
    /// Earlier upload date of an arbitrated pair; replaces the record's date on output.
    pub group_date: Option<NaiveDate>,
    /// File holding the complementary streams of a split pair.
    pub paired_file: Option<FileRef>,
}

impl AugmentedRecord {
    /// An inspected record carries nothing beyond its own values.
    pub fn inspect(record: VideoRecord) -> Self {
        let curated = record.curated.clone();
        Self {
            record,
            disposition: Disposition::Inspect,
            alive: None,
            primary_id: None,
            secondary_id: None,
            curated,
            group_date: None,
            paired_file: None,
        }
    }

    pub fn original_row(&self) -> usize {
        self.record.row
    }
}

// ============================================================================
// Statistics
// ============================================================================

/// Counts collected over one categorization run.
#[derive(Default, Debug, Clone, Serialize)]
pub struct CategorizeStats {
    pub input_records: usize,
    pub undated_records: usize,
    pub groups: usize,
    pub multi_member_groups: usize,
    pub duplicate_rows_removed: usize,

    // Arbitration outcomes per group
    pub review_groups: usize,
    pub single_source_groups: usize,
    pub paired_groups: usize,
    pub merge_mode_groups: usize,
    pub diverged_pairs: usize,

    // Output rows per disposition class
    pub inspect: usize,
    pub keep: usize,
    pub archive: usize,
    pub merge: usize,
    pub delete: usize,
    pub ignore: usize,

    pub output_records: usize,
    pub elapsed_seconds: f64,
}

impl CategorizeStats {
    pub fn record_disposition(&mut self, disposition: Disposition) {
        self.output_records += 1;
        match disposition.class() {
            DispositionClass::Inspect => self.inspect += 1,
            DispositionClass::Keep => self.keep += 1,
            DispositionClass::Archive => self.archive += 1,
            DispositionClass::Merge => self.merge += 1,
            DispositionClass::Delete => self.delete += 1,
            DispositionClass::Ignore => self.ignore += 1,
        }
    }

    pub fn class_count(&self, class: DispositionClass) -> usize {
        match class {
            DispositionClass::Inspect => self.inspect,
            DispositionClass::Keep => self.keep,
            DispositionClass::Archive => self.archive,
            DispositionClass::Merge => self.merge,
            DispositionClass::Delete => self.delete,
            DispositionClass::Ignore => self.ignore,
        }
    }

    /// Share of output rows that need a human, as a percentage.
    pub fn inspect_rate(&self) -> f64 {
        if self.output_records == 0 {
            0.0
        } else {
            100.0 * self.inspect as f64 / self.output_records as f64
        }
    }

    /// Log stats to stderr in JSON format
    pub fn log_phase(&self, phase: &str) {
        if let Ok(json) = serde_json::to_string_pretty(self) {
            eprintln!("[STATS:{}]\n{}", phase, json);
        }
    }

    pub fn write_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_text() {
        assert_eq!(Disposition::Keep.to_string(), "keep");
        assert_eq!(Disposition::streams(StreamSet::VIDEO.with_subs(true)).to_string(), "video+subs");
        assert_eq!(Disposition::streams(StreamSet::VIDEO.with_audio(true)).to_string(), "audio+video");
        assert_eq!(
            Disposition::streams(StreamSet::AUDIO)
                .retained(Retention::Archive)
                .to_string(),
            "archive_audio"
        );
        assert_eq!(
            Disposition::streams(StreamSet::SUBS)
                .retained(Retention::Keep)
                .to_string(),
            "keep_subs"
        );
    }

    #[test]
    fn test_disposition_parse() {
        for text in [
            "inspect",
            "keep",
            "delete",
            "ignore",
            "subs",
            "audio+video",
            "audio+subs",
            "keep_video+subs",
            "archive_audio",
        ] {
            let parsed: Disposition = text.parse().expect("disposition parses");
            assert_eq!(parsed.to_string(), text);
        }
        assert!("video+video".parse::<Disposition>().is_err());
        assert!("keep_everything".parse::<Disposition>().is_err());
        assert!("".parse::<Disposition>().is_err());
    }

    #[test]
    fn test_retention_only_applies_to_streams() {
        assert_eq!(Disposition::Keep.retained(Retention::Archive), Disposition::Keep);
    }

    #[test]
    fn test_disposition_class() {
        let class = |s: &str| s.parse::<Disposition>().unwrap().class();
        assert_eq!(class("keep"), DispositionClass::Keep);
        assert_eq!(class("keep_audio+video"), DispositionClass::Keep);
        assert_eq!(class("archive_subs"), DispositionClass::Archive);
        assert_eq!(class("video+subs"), DispositionClass::Merge);
        assert_eq!(class("delete"), DispositionClass::Delete);
        assert_eq!("archive".parse::<DispositionClass>(), Ok(DispositionClass::Archive));
        assert!("everything".parse::<DispositionClass>().is_err());
    }

    #[test]
    fn test_first_non_blank_curated() {
        let preferred = CuratedFields {
            series: "RT Podcast".to_string(),
            ..Default::default()
        };
        let other = CuratedFields {
            series: "Ignored".to_string(),
            episode: "  ".to_string(),
            group: "Rooster Teeth".to_string(),
            ..Default::default()
        };
        let sizeless = CuratedFields {
            episode: "412".to_string(),
            ..Default::default()
        };
        let merged = CuratedFields::first_non_blank([&preferred, &other, &sizeless]);
        assert_eq!(merged.series, "RT Podcast");
        assert_eq!(merged.group, "Rooster Teeth");
        assert_eq!(merged.episode, "412");
        assert_eq!(merged.part, "");
        assert!(!merged.is_flagged());
    }

    #[test]
    fn test_inspect_rate() {
        let mut stats = CategorizeStats::default();
        assert_eq!(stats.inspect_rate(), 0.0);
        stats.record_disposition(Disposition::Inspect);
        stats.record_disposition(Disposition::Keep);
        assert_eq!(stats.inspect_rate(), 50.0);
        assert_eq!(stats.class_count(DispositionClass::Keep), 1);
        assert_eq!(stats.class_count(DispositionClass::Merge), 0);
    }
}

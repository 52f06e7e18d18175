//! Source arbitration: pick a preferred copy per group and assign dispositions.
//!
//! Preference is decided in this order:
//! 1. File exists (size is not blank)
//! 2. Video height
//! 3. Estimated quality, with a tolerance band
//! 4. Upload date: the secondary platform before the cutoff, the primary after
//!
//! Anything the rules cannot settle (flags, nothing on disk, two copies from
//! the same platform) is routed to `inspect`.

use chrono::NaiveDate;

use crate::config::CategorizeConfig;
use crate::errors::{CategorizeError, Result};
use crate::models::{
    Disposition, GroupKind, Platform, Retention, StreamSet, VideoGroup, VideoRecord,
};
use crate::quality::{clearly_exceeds, estimate_bitrate};

/// Why a group was handed to a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewReason {
    Undated,
    Flagged,
    NothingOnDisk,
    MultiplePrimary,
    MultipleSecondary,
    UnknownPlatform,
}

/// Outcome of arbitrating a group with one sized copy on each platform.
/// Indices point into `Verdict::members`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDecision {
    pub preferred: usize,
    pub other: usize,
    pub primary: usize,
    pub secondary: usize,
    pub earlier_date: NaiveDate,
    /// Both platforms' streams are kept: video from the preferred copy, audio from the other.
    pub merge_mode: bool,
    /// Durations disagree, so the pair carries keep_/archive_ prefixes.
    pub diverged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Review(ReviewReason),
    Single { kept: usize },
    Pair(PairDecision),
}

/// A canonicalized group with one disposition per member.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub members: Vec<VideoRecord>,
    pub dispositions: Vec<Disposition>,
    pub decision: Decision,
}

impl Verdict {
    fn review(members: Vec<VideoRecord>, reason: ReviewReason) -> Self {
        let dispositions = vec![Disposition::Inspect; members.len()];
        Self {
            members,
            dispositions,
            decision: Decision::Review(reason),
        }
    }

    /// Members that are not on disk, in group order.
    pub fn sizeless(&self) -> impl Iterator<Item = &VideoRecord> {
        self.members.iter().filter(|r| !r.has_size())
    }
}

fn require<T: Copy>(record: &VideoRecord, value: Option<T>, column: &'static str) -> Result<T> {
    value.ok_or(CategorizeError::MissingValue {
        row: record.row,
        column,
    })
}

fn review_reason(group: &VideoGroup) -> Option<ReviewReason> {
    if group.kind == GroupKind::Undated {
        return Some(ReviewReason::Undated);
    }
    if group.members.iter().any(|r| r.curated.is_flagged()) {
        return Some(ReviewReason::Flagged);
    }
    let sized: Vec<&VideoRecord> = group.members.iter().filter(|r| r.has_size()).collect();
    if sized.is_empty() {
        return Some(ReviewReason::NothingOnDisk);
    }
    let count = |platform: Platform| sized.iter().filter(|r| r.platform == platform).count();
    if count(Platform::Primary) > 1 {
        return Some(ReviewReason::MultiplePrimary);
    }
    if count(Platform::Secondary) > 1 {
        return Some(ReviewReason::MultipleSecondary);
    }
    if count(Platform::Unknown) > 0 {
        return Some(ReviewReason::UnknownPlatform);
    }
    None
}

/// Assigns a disposition to every member of a canonicalized group.
///
/// Fails only when a sized pair lacks a value arbitration cannot do without
/// (date, height, subtitle count or duration).
pub fn arbitrate(group: VideoGroup, config: &CategorizeConfig) -> Result<Verdict> {
    if let Some(reason) = review_reason(&group) {
        tracing::debug!(members = group.len(), ?reason, "group needs inspection");
        return Ok(Verdict::review(group.members, reason));
    }

    let members = group.members;
    let sized_index = |platform: Platform| {
        members
            .iter()
            .position(|r| r.has_size() && r.platform == platform)
    };
    let base: Vec<Disposition> = members
        .iter()
        .map(|r| {
            if r.has_size() {
                Disposition::Keep
            } else {
                Disposition::Ignore
            }
        })
        .collect();

    let (primary, secondary) = match (sized_index(Platform::Primary), sized_index(Platform::Secondary)) {
        (Some(p), Some(s)) => (p, s),
        (Some(kept), None) | (None, Some(kept)) => {
            return Ok(Verdict {
                members,
                dispositions: base,
                decision: Decision::Single { kept },
            });
        }
        // The review gate guarantees at least one sized primary or secondary member.
        (None, None) => return Ok(Verdict::review(members, ReviewReason::NothingOnDisk)),
    };

    let decision = decide_pair(&members, primary, secondary, config)?;
    let (disp_preferred, disp_other) = pair_dispositions(&members, &decision);

    let mut dispositions = base;
    dispositions[decision.preferred] = disp_preferred;
    dispositions[decision.other] = disp_other;

    tracing::debug!(
        preferred_row = members[decision.preferred].row,
        other_row = members[decision.other].row,
        preferred = %disp_preferred,
        other = %disp_other,
        merge_mode = decision.merge_mode,
        "arbitrated pair"
    );

    Ok(Verdict {
        members,
        dispositions,
        decision: Decision::Pair(decision),
    })
}

fn decide_pair(
    members: &[VideoRecord],
    primary: usize,
    secondary: usize,
    config: &CategorizeConfig,
) -> Result<PairDecision> {
    let arb = &config.arbitration;
    let p = &members[primary];
    let s = &members[secondary];

    let earlier_date = require(p, p.date, "Date")?.min(require(s, s.date, "Date")?);

    // Default preference by date
    let mut primary_preferred = earlier_date >= arb.secondary_preferred_before;

    let height_p = require(p, p.height, "Height")?;
    let height_s = require(s, s.height, "Height")?;
    if height_p != height_s {
        primary_preferred = height_p > height_s;
    } else {
        let quality_p = estimate_bitrate(p, &config.quality);
        let quality_s = estimate_bitrate(s, &config.quality);
        if clearly_exceeds(quality_p, quality_s, arb.quality_ratio) {
            primary_preferred = true;
        } else if clearly_exceeds(quality_s, quality_p, arb.quality_ratio) {
            primary_preferred = false;
        }
    }

    let censored_channel = members
        .iter()
        .any(|r| arb.censored_channels.iter().any(|c| *c == r.channel));
    let merge_mode = censored_channel && primary_preferred && earlier_date >= arb.censored_since;

    let (preferred, other) = if primary_preferred {
        (primary, secondary)
    } else {
        (secondary, primary)
    };

    let duration_a = require(&members[preferred], members[preferred].duration, "Duration")?;
    let duration_b = require(&members[other], members[other].duration, "Duration")?;
    let subs_a = require(&members[preferred], members[preferred].subtitles, "Subtitles")?;
    let subs_b = require(&members[other], members[other].subtitles, "Subtitles")?;

    let splits_streams = merge_mode || subs_b > subs_a;
    let diverged =
        splits_streams && (duration_a - duration_b).abs() > arb.max_duration_divergence_secs;

    Ok(PairDecision {
        preferred,
        other,
        primary,
        secondary,
        earlier_date,
        merge_mode,
        diverged,
    })
}

fn pair_dispositions(members: &[VideoRecord], decision: &PairDecision) -> (Disposition, Disposition) {
    // Both subtitle counts were checked while deciding.
    let subs_a = members[decision.preferred].subtitles.unwrap_or(0);
    let subs_b = members[decision.other].subtitles.unwrap_or(0);
    let subs_from_a = subs_a > subs_b;
    let subs_from_b = subs_b > subs_a;

    let (preferred, other) = if decision.merge_mode {
        (
            Disposition::streams(StreamSet::VIDEO.with_subs(subs_from_a)),
            Disposition::streams(StreamSet::AUDIO.with_subs(subs_from_b)),
        )
    } else if subs_from_b {
        (
            Disposition::streams(StreamSet::VIDEO.with_audio(true)),
            Disposition::streams(StreamSet::SUBS),
        )
    } else {
        (Disposition::Keep, Disposition::Delete)
    };

    if !decision.diverged {
        return (preferred, other);
    }
    // Merging keeps the other copy's audio in case the preferred one is censored;
    // otherwise the preferred copy is the one worth keeping.
    let retention = if decision.merge_mode {
        Retention::Archive
    } else {
        Retention::Keep
    };
    (preferred.retained(retention), other.retained(retention.opposite()))
}

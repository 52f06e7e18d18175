//! End-to-end categorization run over an in-memory record set.
//!
//! Grouping is a sequential scan. Groups are disjoint, so arbitration and
//! merge fan out over them with rayon; results are collected in group order,
//! which keeps the output deterministic.

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::time::Instant;

use crate::arbiter::{arbitrate, Decision, Verdict};
use crate::config::CategorizeConfig;
use crate::errors::Result;
use crate::grouping::{canonicalize, group_records};
use crate::merge::{merge_verdict, AliveIds};
use crate::models::{AugmentedRecord, CategorizeStats, GroupKind, VideoGroup, VideoRecord};
use crate::progress::{create_progress_bar, create_spinner, finish, tick};

const LOG_INTERVAL: u64 = 10_000;

/// Output of one run: augmented records in output order, plus counts.
#[derive(Debug)]
pub struct Categorized {
    pub records: Vec<AugmentedRecord>,
    pub stats: CategorizeStats,
}

/// Groups, canonicalizes, arbitrates and merges `records`.
///
/// Fails without producing any output if a group cannot be arbitrated.
pub fn categorize(records: Vec<VideoRecord>, alive: &AliveIds, config: &CategorizeConfig) -> Result<Categorized> {
    let start = Instant::now();
    let mut stats = CategorizeStats {
        input_records: records.len(),
        ..Default::default()
    };

    let spinner = create_spinner("Phase 2: Grouping records");
    let groups: Vec<VideoGroup> = group_records(records, &config.grouping)
        .into_iter()
        .map(|group| {
            let (group, removed) = canonicalize(group);
            stats.duplicate_rows_removed += removed;
            group
        })
        .collect();
    finish(&spinner, format!("Phase 2: Formed {} groups", groups.len()));

    stats.groups = groups.len();
    stats.undated_records = groups.iter().filter(|g| g.kind == GroupKind::Undated).count();
    stats.multi_member_groups = groups.iter().filter(|g| g.len() > 1).count();

    let pb = create_progress_bar(groups.len() as u64, "Phase 3: Arbitrating groups");
    let verdicts = arbitrate_groups(groups, config, &pb)?;
    finish(&pb, format!("Phase 3: Arbitrated {} groups", verdicts.len()));

    for verdict in &verdicts {
        match &verdict.decision {
            Decision::Review(_) => stats.review_groups += 1,
            Decision::Single { .. } => stats.single_source_groups += 1,
            Decision::Pair(pair) => {
                stats.paired_groups += 1;
                stats.merge_mode_groups += usize::from(pair.merge_mode);
                stats.diverged_pairs += usize::from(pair.diverged);
            }
        }
    }

    let records: Vec<AugmentedRecord> = verdicts
        .into_par_iter()
        .flat_map_iter(|verdict| merge_verdict(verdict, alive))
        .collect();

    for record in &records {
        stats.record_disposition(record.disposition);
    }
    stats.elapsed_seconds = start.elapsed().as_secs_f64();

    tracing::info!(
        groups = stats.groups,
        paired = stats.paired_groups,
        inspect = stats.inspect,
        "categorized {} records",
        stats.output_records
    );

    Ok(Categorized { records, stats })
}

/// Arbitrates every group in parallel; the first failure aborts the run.
pub fn arbitrate_groups(groups: Vec<VideoGroup>, config: &CategorizeConfig, pb: &ProgressBar) -> Result<Vec<Verdict>> {
    groups
        .into_par_iter()
        .map(|group| {
            let verdict = arbitrate(group, config);
            tick(pb, "Phase 3", LOG_INTERVAL);
            verdict
        })
        .collect()
}

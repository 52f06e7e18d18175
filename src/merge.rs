//! Metadata merge: spread curated fields and cross-references across a group.

use rustc_hash::FxHashSet;

use crate::arbiter::{Decision, Verdict};
use crate::models::{AugmentedRecord, CuratedFields, FileRef, Platform};

/// Native IDs still available on the primary platform.
pub type AliveIds = FxHashSet<String>;

/// Turns an arbitrated group into output records, in group order.
///
/// Curated fields take the first non-blank value from the preferred copy, then
/// the other copy, then the members that are not on disk. Inspected groups are
/// passed through with their own values.
pub fn merge_verdict(verdict: Verdict, alive: &AliveIds) -> Vec<AugmentedRecord> {
    let (sources, group_date, pair) = match &verdict.decision {
        Decision::Review(_) => {
            return verdict
                .members
                .into_iter()
                .map(AugmentedRecord::inspect)
                .collect();
        }
        Decision::Single { kept } => (vec![*kept], None, None),
        Decision::Pair(decision) => (
            vec![decision.preferred, decision.other],
            Some(decision.earlier_date),
            Some((decision.preferred, decision.other)),
        ),
    };

    let curated = CuratedFields::first_non_blank(
        sources
            .iter()
            .map(|&i| &verdict.members[i].curated)
            .chain(verdict.sizeless().map(|r| &r.curated)),
    );

    let sized_id = |platform: Platform| -> Option<String> {
        sources
            .iter()
            .map(|&i| &verdict.members[i])
            .find(|r| r.platform == platform)
            .map(|r| r.id.clone())
    };
    let primary_id = sized_id(Platform::Primary);
    let secondary_id = sized_id(Platform::Secondary);
    let is_alive = primary_id.as_ref().map(|id| alive.contains(id));

    let paired_file = |index: usize| -> Option<FileRef> {
        let (a, b) = pair?;
        if index == a {
            Some(verdict.members[b].file_ref())
        } else if index == b {
            Some(verdict.members[a].file_ref())
        } else {
            None
        }
    };
    let paired: Vec<_> = (0..verdict.members.len()).map(paired_file).collect();

    verdict
        .members
        .into_iter()
        .zip(verdict.dispositions)
        .zip(paired)
        .map(|((record, disposition), paired_file)| AugmentedRecord {
            record,
            disposition,
            alive: is_alive,
            primary_id: primary_id.clone(),
            secondary_id: secondary_id.clone(),
            curated: curated.clone(),
            group_date,
            paired_file,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::arbitrate;
    use crate::config::CategorizeConfig;
    use crate::models::{GroupKind, VideoGroup, VideoRecord};
    use crate::test_support::{on_disk, record};
    use chrono::NaiveDate;

    fn alive(ids: &[&str]) -> AliveIds {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn run(members: Vec<VideoRecord>, alive_ids: &AliveIds) -> Vec<AugmentedRecord> {
        let group = VideoGroup {
            kind: GroupKind::Dated,
            members,
        };
        let verdict = arbitrate(group, &CategorizeConfig::default()).unwrap();
        merge_verdict(verdict, alive_ids)
    }

    fn pair() -> (VideoRecord, VideoRecord) {
        let mut rt = on_disk(record(0, "RoosterTeeth", "20190102", 3600, "Title"), 1_000, 1080, 0);
        rt.id = "rt-episode".to_string();
        rt.server = "octopus".to_string();
        rt.filename = "rt/episode.mp4".to_string();
        let mut yt = on_disk(record(1, "youtube", "20190101", 3600, "Title"), 1_000, 1080, 0);
        yt.id = "dQw4w9WgXcQ".to_string();
        yt.server = "wasabi".to_string();
        yt.filename = "yt/episode.webm".to_string();
        (rt, yt)
    }

    #[test]
    fn test_pair_cross_references() {
        let (rt, yt) = pair();
        let out = run(vec![rt, yt], &alive(&["rt-episode"]));
        assert_eq!(out.len(), 2);
        for r in &out {
            assert_eq!(r.primary_id.as_deref(), Some("rt-episode"));
            assert_eq!(r.secondary_id.as_deref(), Some("dQw4w9WgXcQ"));
            assert_eq!(r.alive, Some(true));
            assert_eq!(r.group_date, NaiveDate::from_ymd_opt(2019, 1, 1));
        }
        let rt_pair = out[0].paired_file.as_ref().unwrap();
        assert_eq!((rt_pair.server.as_str(), rt_pair.path.as_str()), ("wasabi", "yt/episode.webm"));
        let yt_pair = out[1].paired_file.as_ref().unwrap();
        assert_eq!((yt_pair.server.as_str(), yt_pair.path.as_str()), ("octopus", "rt/episode.mp4"));
    }

    #[test]
    fn test_alive_is_false_when_not_listed() {
        let (rt, yt) = pair();
        let out = run(vec![rt, yt], &alive(&["dQw4w9WgXcQ"]));
        assert!(out.iter().all(|r| r.alive == Some(false)));
    }

    #[test]
    fn test_curated_fallback_order() {
        let (mut rt, mut yt) = pair();
        // rt is preferred (2019, equal quality)
        rt.curated.series = "Preferred Series".to_string();
        yt.curated.series = "Other Series".to_string();
        yt.curated.episode = "7".to_string();
        let mut sizeless = record(2, "youtube", "20190101", 3600, "Title");
        sizeless.curated.group = "Rooster Teeth".to_string();
        sizeless.curated.episode = "8".to_string();

        let out = run(vec![rt, yt, sizeless], &alive(&[]));
        assert_eq!(out[2].disposition.to_string(), "ignore");
        assert!(out[2].paired_file.is_none());
        for r in &out {
            assert_eq!(r.curated.series, "Preferred Series");
            assert_eq!(r.curated.episode, "7");
            assert_eq!(r.curated.group, "Rooster Teeth");
        }
    }

    #[test]
    fn test_single_source_merges_from_sizeless() {
        let mut kept = on_disk(record(0, "youtube", "20190101", 3600, "Title"), 1_000, 1080, 0);
        kept.id = "yt1".to_string();
        let mut sizeless = record(1, "RoosterTeeth", "20190101", 3600, "Title");
        sizeless.id = "rt-missing".to_string();
        sizeless.curated.output_title = "The Real Title".to_string();

        let out = run(vec![kept, sizeless], &alive(&["rt-missing"]));
        assert_eq!(out[0].disposition.to_string(), "keep");
        assert_eq!(out[1].disposition.to_string(), "ignore");
        for r in &out {
            assert_eq!(r.curated.output_title, "The Real Title");
            assert_eq!(r.secondary_id.as_deref(), Some("yt1"));
            // The primary copy is not on disk, so it is not a cross-reference.
            assert_eq!(r.primary_id, None);
            assert_eq!(r.alive, None);
            assert_eq!(r.group_date, None);
            assert!(r.paired_file.is_none());
        }
    }

    #[test]
    fn test_review_keeps_own_values() {
        let (mut rt, mut yt) = pair();
        rt.curated.flag = "bad audio".to_string();
        yt.curated.series = "Mine".to_string();
        let out = run(vec![rt, yt], &alive(&["rt-episode"]));
        assert_eq!(out[0].curated.flag, "bad audio");
        assert_eq!(out[1].curated.flag, "");
        assert_eq!(out[1].curated.series, "Mine");
        assert!(out.iter().all(|r| r.alive.is_none() && r.primary_id.is_none()));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let (mut rt, mut yt) = pair();
        rt.curated.series = "Series".to_string();
        yt.curated.episode = "3".to_string();
        let first = run(vec![rt, yt], &alive(&[]));

        // Feed the merged output back in as fresh records.
        let again: Vec<VideoRecord> = first
            .iter()
            .map(|r| {
                let mut record = r.record.clone();
                record.curated = r.curated.clone();
                record
            })
            .collect();
        let second = run(again, &alive(&[]));
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.curated, b.curated);
            assert_eq!(a.disposition, b.disposition);
        }
    }
}

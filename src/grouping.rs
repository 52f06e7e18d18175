//! Temporal-window grouping and exact-duplicate collapse.
//!
//! Grouping is a single greedy forward pass over date-sorted records. The
//! first unassigned record becomes an anchor and claims every later
//! unassigned record that falls inside its window and matches it. A member
//! only has to match its anchor, not the other members, so groups are not
//! equivalence classes; earlier groups are never revisited.

use chrono::Duration;
use rustc_hash::FxHashMap;

use crate::config::GroupingConfig;
use crate::matching::matches;
use crate::models::{GroupKind, VideoGroup, VideoRecord};

/// Partitions `records` into groups.
///
/// Records without a usable date, or dated before `earliest_date`, come first
/// as undated singletons in input order. Dated groups follow in anchor order.
pub fn group_records(records: Vec<VideoRecord>, config: &GroupingConfig) -> Vec<VideoGroup> {
    let (mut dated, undated): (Vec<VideoRecord>, Vec<VideoRecord>) = records
        .into_iter()
        .partition(|r| r.date.is_some_and(|d| d >= config.earliest_date));

    for record in &undated {
        tracing::warn!(
            row = record.row,
            server = %record.server,
            filename = %record.filename,
            "missing or out-of-range date, flagging for inspection"
        );
    }

    let mut groups: Vec<VideoGroup> = undated
        .into_iter()
        .map(|r| VideoGroup::singleton(GroupKind::Undated, r))
        .collect();

    // Stable: same-day records keep input order.
    dated.sort_by_key(|r| r.date);

    let window = Duration::days(config.window_days);
    let mut slots: Vec<Option<VideoRecord>> = dated.into_iter().map(Some).collect();

    for i in 0..slots.len() {
        let Some(anchor) = slots[i].take() else {
            continue;
        };
        let Some(limit) = anchor.date.and_then(|d| d.checked_add_signed(window)) else {
            groups.push(VideoGroup::singleton(GroupKind::Dated, anchor));
            continue;
        };

        let mut members = Vec::new();
        for slot in slots.iter_mut().skip(i + 1) {
            let Some(candidate) = slot.as_ref() else {
                continue;
            };
            if candidate.date.is_some_and(|d| d > limit) {
                break;
            }
            if matches(&anchor, candidate, config) {
                members.extend(slot.take());
            }
        }

        members.insert(0, anchor);
        groups.push(VideoGroup {
            kind: GroupKind::Dated,
            members,
        });
    }

    groups
}

/// Collapses copies of the same physical file (server, filename and raw size cell).
///
/// Each file keeps the position of its first listing and the values of its last.
/// Returns the collapsed group and how many rows were dropped.
pub fn canonicalize(group: VideoGroup) -> (VideoGroup, usize) {
    let before = group.members.len();
    let mut slots: FxHashMap<(String, String, String), usize> = FxHashMap::default();
    let mut members: Vec<VideoRecord> = Vec::with_capacity(before);
    for record in group.members {
        let key = (record.server.clone(), record.filename.clone(), record.size_text.clone());
        match slots.get(&key) {
            Some(&slot) => members[slot] = record,
            None => {
                slots.insert(key, members.len());
                members.push(record);
            }
        }
    }
    let removed = before - members.len();
    (
        VideoGroup {
            kind: group.kind,
            members,
        },
        removed,
    )
}

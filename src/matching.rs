//! Pairwise similarity: do two records plausibly describe the same video?
//!
//! Date proximity is the grouper's job. Here only content is compared:
//! durations must agree within a tolerance and the titles must share a long
//! contiguous run of characters.

use crate::config::GroupingConfig;
use crate::models::VideoRecord;

// ============================================================================
// Duration Tolerance
// ============================================================================

/// `hi <= lo * (1 + slack) + max(floor, lo * fraction)`, symmetric in its arguments.
pub fn durations_agree(a: i64, b: i64, config: &GroupingConfig) -> bool {
    let lo = a.min(b) as f64;
    let hi = a.max(b) as f64;
    let allowance = config.duration_floor_secs.max(lo * config.duration_fraction);
    hi <= lo * (1.0 + config.duration_slack) + allowance
}

// ============================================================================
// Title Overlap
// ============================================================================

/// Longest contiguous common substring, compared by Unicode scalar value and case-sensitive.
pub fn longest_common_substring(a: &str, b: &str) -> String {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    // Rolling rows of the run-length table: run[j] is the length of the common
    // run ending at a[i - 1] and b[j - 1].
    let mut prev = vec![0usize; b_chars.len() + 1];
    let mut run = vec![0usize; b_chars.len() + 1];
    let mut longest = 0;
    let mut longest_end = 0;

    for i in 1..=a_chars.len() {
        for j in 1..=b_chars.len() {
            if a_chars[i - 1] == b_chars[j - 1] {
                run[j] = prev[j - 1] + 1;
                if run[j] > longest {
                    longest = run[j];
                    longest_end = i;
                }
            } else {
                run[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut run);
    }

    a_chars[longest_end - longest..longest_end].iter().collect()
}

/// The common run must cover at least half (rounded down) of the longer title.
pub fn titles_overlap(a: &str, b: &str) -> bool {
    let longest = longest_common_substring(a, b).chars().count();
    let required = a.chars().count().max(b.chars().count()) / 2;
    longest >= required
}

// ============================================================================
// Matcher
// ============================================================================

/// Content similarity between two records. Records without a duration never match.
pub fn matches(a: &VideoRecord, b: &VideoRecord, config: &GroupingConfig) -> bool {
    let (Some(dur_a), Some(dur_b)) = (a.duration, b.duration) else {
        return false;
    };
    durations_agree(dur_a, dur_b, config) && titles_overlap(&a.title, &b.title)
}

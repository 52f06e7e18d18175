//! Archive naming and disposition filtering for downstream handling.
//!
//! Target paths are built from the merged curated columns and never include
//! a file extension.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CuratedFields, Disposition, DispositionClass};
use crate::normalize::non_blank;
use crate::table::CategorizedRow;

/// Season/episode codes that already identify the video ("S03E12 - Finale").
static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^S\d{2}E\d{2}").unwrap());

/// Inner extensions of a `.json` sidecar (".info", ".rechat") this long, dot included, are stripped too.
const SIDECAR_EXT_LEN: std::ops::RangeInclusive<usize> = 3..=8;

/// Target path stem for a video, or `None` when the curated fields cannot name it.
pub fn output_stem(curated: &CuratedFields, date: Option<NaiveDate>) -> Option<String> {
    let group = non_blank(&curated.group)?;
    let series = non_blank(&curated.series);
    let title = non_blank(&curated.output_title);
    let part = non_blank(&curated.part).map(|p| format!(" - Part {p}")).unwrap_or_default();

    if let (Some(series), Some(title)) = (series, title) {
        if SEASON_EPISODE.is_match(title) {
            return Some(format!("{group}/{series}/{title}{part}"));
        }
    }

    let mut stem = String::from(group);
    stem.push('/');
    if let Some(series) = series {
        stem.push_str(series);
        stem.push('/');
    }
    stem.push_str(&date?.format("%Y-%m-%d").to_string());
    if let Some(episode) = non_blank(&curated.episode) {
        stem.push_str(" - Episode ");
        stem.push_str(episode);
    }
    if let Some(title) = title {
        stem.push_str(" - ");
        stem.push_str(title);
    }
    stem.push_str(&part);
    Some(stem)
}

/// Splits `path` into stem and extension (dot included) at the last dot of
/// the final component. Leading dots do not start an extension.
fn split_ext(path: &str) -> (&str, &str) {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    let name = &path[name_start..];
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => path.split_at(name_start + dot),
        _ => (path, ""),
    }
}

/// Strips the extension from the last path component. For `.json` sidecars a
/// short inner extension goes as well ("video.info.json" becomes "video").
pub fn remove_ext(path: &str) -> &str {
    let (stem, ext) = split_ext(path);
    if ext != ".json" {
        return stem;
    }
    let (inner_stem, inner_ext) = split_ext(stem);
    if SIDECAR_EXT_LEN.contains(&inner_ext.len()) {
        inner_stem
    } else {
        stem
    }
}

/// Coarse class of a `result` cell, or `None` if it is not a disposition.
pub fn result_class(result: &str) -> Option<DispositionClass> {
    result.trim().parse::<Disposition>().ok().map(Disposition::class)
}

/// Rows whose disposition falls in any of `classes`, in table order.
pub fn filter_by_class<'a>(rows: &'a [CategorizedRow], classes: &[DispositionClass]) -> Vec<&'a CategorizedRow> {
    rows.iter()
        .filter(|row| result_class(&row.result).is_some_and(|class| classes.contains(&class)))
        .collect()
}

/// One rename: a source file stem on a server and where it should go.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Rename {
    pub server: String,
    pub from: String,
    pub to: String,
}

/// Renames for every row, including the complementary file of a split pair.
/// Rows whose curated fields cannot name them map to their own stem.
pub fn filename_map(rows: &[CategorizedRow]) -> Vec<Rename> {
    let mut renames = Vec::new();
    for row in rows {
        let from = remove_ext(&row.filename);
        let to = output_stem(&row.curated(), row.upload_date()).unwrap_or_else(|| from.to_string());
        if let Some(other) = non_blank(&row.other_path) {
            renames.push(Rename {
                server: row.other_server.clone(),
                from: remove_ext(other).to_string(),
                to: to.clone(),
            });
        }
        renames.push(Rename {
            server: row.server.clone(),
            from: from.to_string(),
            to,
        });
    }
    renames.sort_by(|a, b| (&a.server, &a.from).cmp(&(&b.server, &b.from)));
    renames.dedup();
    renames
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curated(group: &str, series: &str, episode: &str, title: &str, part: &str) -> CuratedFields {
        CuratedFields {
            group: group.to_string(),
            series: series.to_string(),
            episode: episode.to_string(),
            output_title: title.to_string(),
            part: part.to_string(),
            flag: String::new(),
        }
    }

    fn date() -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2019, 3, 4)
    }

    #[test]
    fn test_output_stem_layouts() {
        let cases = [
            (curated("RT", "Podcast", "", "", ""), "RT/Podcast/2019-03-04"),
            (curated("RT", "Podcast", "512", "", ""), "RT/Podcast/2019-03-04 - Episode 512"),
            (curated("RT", "Podcast", "512", "Live", "2"), "RT/Podcast/2019-03-04 - Episode 512 - Live - Part 2"),
            (curated("RT", "", "", "Special", ""), "RT/2019-03-04 - Special"),
            (curated("RT", "", "", "", "1"), "RT/2019-03-04 - Part 1"),
            (curated("RT", "RvB", "", "S17E01 - Finale", ""), "RT/RvB/S17E01 - Finale"),
            (curated("RT", "RvB", "", "S17E01", "2"), "RT/RvB/S17E01 - Part 2"),
            // without a series the code is just a title
            (curated("RT", "", "", "S17E01", ""), "RT/2019-03-04 - S17E01"),
        ];
        for (fields, expected) in cases {
            assert_eq!(output_stem(&fields, date()).as_deref(), Some(expected));
        }
    }

    #[test]
    fn test_output_stem_requires_group_and_date() {
        assert_eq!(output_stem(&curated("", "Podcast", "1", "", ""), date()), None);
        assert_eq!(output_stem(&curated("RT", "Podcast", "1", "", ""), None), None);
        assert!(output_stem(&curated("RT", "RvB", "", "S01E01", ""), None).is_some());
    }

    #[test]
    fn test_remove_ext() {
        assert_eq!(remove_ext("dl/video.mp4"), "dl/video");
        assert_eq!(remove_ext("dl/video.info.json"), "dl/video");
        assert_eq!(remove_ext("dl.v2/video"), "dl.v2/video");
        assert_eq!(remove_ext("dl/.hidden"), "dl/.hidden");
        assert_eq!(remove_ext("a.b.mkv"), "a.b");
    }

    #[test]
    fn test_remove_ext_json_sidecars() {
        assert_eq!(remove_ext("dl/video.rechat.json"), "dl/video");
        assert_eq!(remove_ext("dl/video.en.json"), "dl/video");
        // ".live_chat" is too long to be an inner extension
        assert_eq!(remove_ext("dl/video.live_chat.json"), "dl/video.live_chat");
        assert_eq!(remove_ext("dl/video.json"), "dl/video");
        assert_eq!(remove_ext("dl.v2/video.json"), "dl.v2/video");
        assert_eq!(remove_ext("dl/.info.json"), "dl/.info");
    }

    #[test]
    fn test_result_class() {
        assert_eq!(result_class("keep_audio+video"), Some(DispositionClass::Keep));
        assert_eq!(result_class("video+subs"), Some(DispositionClass::Merge));
        assert_eq!(result_class("archive_subs"), Some(DispositionClass::Archive));
        assert_eq!(result_class(""), None);
    }

    #[test]
    fn test_filename_map_includes_paired_file() {
        let row = CategorizedRow {
            server: "octopus".to_string(),
            filename: "rt/ep.mp4".to_string(),
            date: "20190304".to_string(),
            group: "RT".to_string(),
            series: "Podcast".to_string(),
            result: "video".to_string(),
            other_path: "yt/ep.webm".to_string(),
            other_server: "wasabi".to_string(),
            ..Default::default()
        };
        let unnamed = CategorizedRow {
            server: "octopus".to_string(),
            filename: "misc.mp4".to_string(),
            result: "keep".to_string(),
            ..Default::default()
        };
        let map = filename_map(&[row, unnamed]);
        assert_eq!(
            map,
            vec![
                Rename {
                    server: "octopus".to_string(),
                    from: "misc".to_string(),
                    to: "misc".to_string(),
                },
                Rename {
                    server: "octopus".to_string(),
                    from: "rt/ep".to_string(),
                    to: "RT/Podcast/2019-03-04".to_string(),
                },
                Rename {
                    server: "wasabi".to_string(),
                    from: "yt/ep".to_string(),
                    to: "RT/Podcast/2019-03-04".to_string(),
                },
            ]
        );
    }
}

//! Record builders shared by the unit tests.

use crate::config::PlatformNames;
use crate::models::{CuratedFields, VideoRecord};
use crate::normalize::parse_upload_date;

/// A 1080p H.264/AAC record that is not on disk.
pub fn record(row: usize, platform: &str, date: &str, duration: i64, title: &str) -> VideoRecord {
    VideoRecord {
        row,
        server: "octopus".to_string(),
        filename: format!("downloads/video_{row}.mp4"),
        size_text: String::new(),
        size: None,
        platform: PlatformNames::default().classify(platform),
        id: format!("id{row}"),
        channel: "Rooster Teeth".to_string(),
        title: title.to_string(),
        date: parse_upload_date(date),
        duration: Some(duration),
        subtitles: Some(0),
        height: Some(1080),
        curated: CuratedFields::default(),
        audio_bitrate: None,
        video_codec: "avc1.640028".to_string(),
        audio_codec: "mp4a.40.2".to_string(),
    }
}

/// Puts `record` on disk with the given size, height and subtitle count.
pub fn on_disk(mut record: VideoRecord, size: u64, height: i64, subtitles: i64) -> VideoRecord {
    record.size = Some(size);
    record.size_text = size.to_string();
    record.height = Some(height);
    record.subtitles = Some(subtitles);
    record
}

//! Delimited-text boundary: vidinfo tables in, categorized tables out.
//!
//! Input is comma-separated UTF-8, or tab-separated UTF-16 when the table was
//! saved from a spreadsheet. Output is always comma-separated UTF-8: every
//! input column in its original position, then the appended columns that were
//! not already present.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Deserialize;
use std::io::{self, Read};
use std::path::Path;

use crate::config::CategorizeConfig;
use crate::errors::{CategorizeError, Result};
use crate::merge::AliveIds;
use crate::models::{AugmentedRecord, CuratedFields, VideoRecord};
use crate::normalize::{format_upload_date, parse_decimal, parse_size, parse_upload_date, parse_whole, MalformedCell};

// ============================================================================
// Column Names
// ============================================================================

pub const REQUIRED_COLUMNS: [&str; 20] = [
    "Server",
    "Filename",
    "Size",
    "Website",
    "ID",
    "Channel",
    "Title",
    "Date",
    "Duration",
    "Subtitles",
    "Height",
    "Group",
    "Series",
    "Episode",
    "Output Title",
    "Part",
    "Flag",
    "Audio bitrate",
    "Video codec",
    "Audio codec",
];

/// Appended in this order when missing from the input.
pub const APPENDED_COLUMNS: [&str; 7] = [
    "primary_id",
    "secondary_id",
    "alive",
    "original_row",
    "result",
    "other_path",
    "other_server",
];

/// Positions of the required columns in one particular table.
#[derive(Debug, Clone)]
struct Columns {
    server: usize,
    filename: usize,
    size: usize,
    website: usize,
    id: usize,
    channel: usize,
    title: usize,
    date: usize,
    duration: usize,
    subtitles: usize,
    height: usize,
    group: usize,
    series: usize,
    episode: usize,
    output_title: usize,
    part: usize,
    flag: usize,
    audio_bitrate: usize,
    video_codec: usize,
    audio_codec: usize,
}

fn position(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

impl Columns {
    fn locate(headers: &[String]) -> Result<Self> {
        let find = |name: &str| {
            position(headers, name).ok_or_else(|| CategorizeError::Schema {
                column: name.to_string(),
            })
        };
        Ok(Self {
            server: find("Server")?,
            filename: find("Filename")?,
            size: find("Size")?,
            website: find("Website")?,
            id: find("ID")?,
            channel: find("Channel")?,
            title: find("Title")?,
            date: find("Date")?,
            duration: find("Duration")?,
            subtitles: find("Subtitles")?,
            height: find("Height")?,
            group: find("Group")?,
            series: find("Series")?,
            episode: find("Episode")?,
            output_title: find("Output Title")?,
            part: find("Part")?,
            flag: find("Flag")?,
            audio_bitrate: find("Audio bitrate")?,
            video_codec: find("Video codec")?,
            audio_codec: find("Audio codec")?,
        })
    }
}

// ============================================================================
// Reading
// ============================================================================

/// A loaded vidinfo table whose header has passed schema validation.
#[derive(Debug, Clone)]
pub struct VideoTable {
    headers: Vec<String>,
    rows: Vec<StringRecord>,
    columns: Columns,
}

impl VideoTable {
    /// Reads a table from `path`; `tab_separated` selects the UTF-16 TSV layout.
    pub fn read(path: &Path, tab_separated: bool) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        if tab_separated {
            let text = decode_utf16(&bytes)?;
            Self::from_reader(text.as_bytes(), b'\t')
        } else {
            Self::from_reader(bytes.as_slice(), b',')
        }
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new().delimiter(delimiter).from_reader(reader);
        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let columns = Columns::locate(&headers)?;
        let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { headers, rows, columns })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Converts every row. Blank cells become `None`; a non-blank numeric cell
    /// that does not parse aborts the load.
    pub fn records(&self, config: &CategorizeConfig) -> Result<Vec<VideoRecord>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row, cells)| self.record(row, cells, config))
            .collect()
    }

    fn record(&self, row: usize, cells: &StringRecord, config: &CategorizeConfig) -> Result<VideoRecord> {
        let c = &self.columns;
        let sep = config.parsing.thousands_separator;
        let text = |index: usize| cells.get(index).unwrap_or_default();
        let malformed = |column: &'static str, index: usize| {
            move |_: MalformedCell| CategorizeError::MalformedValue {
                row,
                column,
                value: text(index).to_string(),
            }
        };

        let date = parse_upload_date(text(c.date));
        if date.is_none() && !text(c.date).trim().is_empty() {
            tracing::debug!(row, value = text(c.date), "unparseable upload date");
        }

        Ok(VideoRecord {
            row,
            server: text(c.server).to_string(),
            filename: text(c.filename).to_string(),
            size_text: text(c.size).to_string(),
            size: parse_size(text(c.size), sep).map_err(malformed("Size", c.size))?,
            platform: config.platforms.classify(text(c.website)),
            id: text(c.id).to_string(),
            channel: text(c.channel).to_string(),
            title: text(c.title).to_string(),
            date,
            duration: parse_whole(text(c.duration), sep).map_err(malformed("Duration", c.duration))?,
            subtitles: parse_whole(text(c.subtitles), sep).map_err(malformed("Subtitles", c.subtitles))?,
            height: parse_whole(text(c.height), sep).map_err(malformed("Height", c.height))?,
            curated: CuratedFields {
                group: text(c.group).to_string(),
                series: text(c.series).to_string(),
                episode: text(c.episode).to_string(),
                output_title: text(c.output_title).to_string(),
                part: text(c.part).to_string(),
                flag: text(c.flag).to_string(),
            },
            audio_bitrate: parse_decimal(text(c.audio_bitrate)).map_err(malformed("Audio bitrate", c.audio_bitrate))?,
            video_codec: text(c.video_codec).to_string(),
            audio_codec: text(c.audio_codec).to_string(),
        })
    }

    /// Header of the categorized table: input columns, then missing appended ones.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers = self.headers.clone();
        for name in APPENDED_COLUMNS {
            if position(&headers, name).is_none() {
                headers.push(name.to_string());
            }
        }
        headers
    }

    /// Writes the categorized table. `records` index rows of this table.
    pub fn write_categorized<W: io::Write>(&self, records: &[AugmentedRecord], writer: W) -> Result<()> {
        let headers = self.output_headers();
        let mut writer = WriterBuilder::new().from_writer(writer);
        writer.write_record(&headers)?;

        let appended: Vec<usize> = APPENDED_COLUMNS
            .iter()
            .filter_map(|name| position(&headers, name))
            .collect();

        for record in records {
            let mut cells: Vec<String> = self
                .rows
                .get(record.original_row())
                .map(|row| row.iter().map(str::to_string).collect())
                .unwrap_or_default();
            cells.resize(headers.len(), String::new());
            self.fill_row(&mut cells, record, &appended);
            writer.write_record(&cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn fill_row(&self, cells: &mut [String], record: &AugmentedRecord, appended: &[usize]) {
        let c = &self.columns;
        let curated = &record.curated;
        cells[c.group] = curated.group.clone();
        cells[c.series] = curated.series.clone();
        cells[c.episode] = curated.episode.clone();
        cells[c.output_title] = curated.output_title.clone();
        cells[c.part] = curated.part.clone();
        cells[c.flag] = curated.flag.clone();
        if let Some(date) = record.group_date {
            cells[c.date] = format_upload_date(date);
        }

        let paired = record.paired_file.as_ref();
        let values = [
            record.primary_id.clone().unwrap_or_default(),
            record.secondary_id.clone().unwrap_or_default(),
            record.alive.map(|a| a.to_string()).unwrap_or_default(),
            record.original_row().to_string(),
            record.disposition.to_string(),
            paired.map(|f| f.path.clone()).unwrap_or_default(),
            paired.map(|f| f.server.clone()).unwrap_or_default(),
        ];
        for (&index, value) in appended.iter().zip(values) {
            cells[index] = value;
        }
    }
}

/// Decodes UTF-16 text, honouring a byte-order mark and defaulting to little-endian.
pub fn decode_utf16(bytes: &[u8]) -> Result<String> {
    let (big_endian, body) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (true, rest),
        [0xFF, 0xFE, rest @ ..] => (false, rest),
        _ => (false, bytes),
    };
    if body.len() % 2 != 0 {
        return Err(CategorizeError::Encoding(format!(
            "odd byte count {} after byte-order mark",
            body.len()
        )));
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if big_endian {
                u16::from_be_bytes(pair)
            } else {
                u16::from_le_bytes(pair)
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|err| CategorizeError::Encoding(err.to_string()))
}

/// One native ID per line; surrounding whitespace is trimmed and blank lines skipped.
pub fn read_alive_list(path: &Path) -> Result<AliveIds> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_alive_list(&text))
}

pub fn parse_alive_list(text: &str) -> AliveIds {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Categorized Tables
// ============================================================================

/// The columns of a categorized table that downstream tooling reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategorizedRow {
    #[serde(rename = "Server")]
    pub server: String,
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Date", default)]
    pub date: String,
    #[serde(rename = "Group", default)]
    pub group: String,
    #[serde(rename = "Series", default)]
    pub series: String,
    #[serde(rename = "Episode", default)]
    pub episode: String,
    #[serde(rename = "Output Title", default)]
    pub output_title: String,
    #[serde(rename = "Part", default)]
    pub part: String,
    pub result: String,
    #[serde(default)]
    pub other_path: String,
    #[serde(default)]
    pub other_server: String,
}

impl CategorizedRow {
    pub fn curated(&self) -> CuratedFields {
        CuratedFields {
            group: self.group.clone(),
            series: self.series.clone(),
            episode: self.episode.clone(),
            output_title: self.output_title.clone(),
            part: self.part.clone(),
            flag: String::new(),
        }
    }

    pub fn upload_date(&self) -> Option<chrono::NaiveDate> {
        parse_upload_date(&self.date)
    }
}

pub fn read_categorized<R: Read>(reader: R) -> Result<Vec<CategorizedRow>> {
    let mut reader = ReaderBuilder::new().from_reader(reader);
    let rows = reader.deserialize().collect::<std::result::Result<Vec<CategorizedRow>, _>>()?;
    Ok(rows)
}

use std::fs;
use std::io::Write;

use vidinfo_categorize::naming::filename_map;
use vidinfo_categorize::table::{read_alive_list, read_categorized};
use vidinfo_categorize::{categorize, CategorizeConfig, VideoTable};

const VIDINFO: &str = "\
Server,Filename,Size,Website,ID,Channel,Title,Date,Duration,Subtitles,Height,Group,Series,Episode,Output Title,Part,Flag,Audio bitrate,Video codec,Audio codec
octopus,rt/ah-500.mp4,\"900,000,000\",RoosterTeeth,ah-500,Achievement Hunter,Let's Play Minecraft Episode 500,20200102,3600,1,1080,Achievement Hunter,Let's Play,500,,,,,avc1.640028,mp4a.40.2
wasabi,yt/ah-500.webm,800000000,youtube,yt500,LetsPlay,Let's Play Minecraft - Episode 500,20200101,3601,0,1080,,,,Minecraft,,,,avc1.640028,mp4a.40.2
octopus,rt/podcast.mp4,500000000,RoosterTeeth,rtp-1,Rooster Teeth,RT Podcast #600,20190505,4000,0,720,,,,,,,,avc1.4d401f,mp4a.40.2
wasabi,yt/podcast.webm,700000000,youtube,ytp-1,Rooster Teeth,RT Podcast #600,20190505,4010,0,1080,,,,,,,,vp9,opus
octopus,rt/mystery.mp4,10,RoosterTeeth,mys,Rooster Teeth,Mystery,,60,0,480,,,,,,,,,
octopus,rt/flagged.mp4,10,RoosterTeeth,flg,Rooster Teeth,Flagged,20150101,60,0,480,,,,,,check me,,,
";

fn run(input: &str, alive: &str) -> Vec<vidinfo_categorize::table::CategorizedRow> {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("vidinfo.csv");
    let alive_path = dir.path().join("alive.txt");
    fs::write(&source, input).unwrap();
    fs::write(&alive_path, alive).unwrap();

    let config = CategorizeConfig::default();
    let table = VideoTable::read(&source, false).unwrap();
    let records = table.records(&config).unwrap();
    let alive = read_alive_list(&alive_path).unwrap();
    let categorized = categorize(records, &alive, &config).unwrap();

    let output = dir.path().join("categorized.csv");
    table
        .write_categorized(&categorized.records, fs::File::create(&output).unwrap())
        .unwrap();
    read_categorized(fs::File::open(&output).unwrap()).unwrap()
}

fn result_of<'a>(rows: &'a [vidinfo_categorize::table::CategorizedRow], filename: &str) -> &'a str {
    &rows.iter().find(|r| r.filename == filename).unwrap().result
}

#[test]
fn test_end_to_end_dispositions() {
    let rows = run(VIDINFO, "ah-500\n");
    assert_eq!(rows.len(), 6);

    // Undated and pre-window rows come first and are inspected.
    assert_eq!(rows[0].filename, "rt/mystery.mp4");
    assert_eq!(result_of(&rows, "rt/mystery.mp4"), "inspect");
    assert_eq!(result_of(&rows, "rt/flagged.mp4"), "inspect");

    // Censored channel after the cutoff with the primary preferred: streams are merged.
    assert_eq!(result_of(&rows, "rt/ah-500.mp4"), "video+subs");
    assert_eq!(result_of(&rows, "yt/ah-500.webm"), "audio");

    // Higher resolution wins regardless of date.
    assert_eq!(result_of(&rows, "yt/podcast.webm"), "keep");
    assert_eq!(result_of(&rows, "rt/podcast.mp4"), "delete");
}

#[test]
fn test_end_to_end_merged_metadata() {
    let rows = run(VIDINFO, "ah-500\n");
    let rt = rows.iter().find(|r| r.filename == "rt/ah-500.mp4").unwrap();
    let yt = rows.iter().find(|r| r.filename == "yt/ah-500.webm").unwrap();
    for row in [rt, yt] {
        assert_eq!(row.group, "Achievement Hunter");
        assert_eq!(row.episode, "500");
        assert_eq!(row.output_title, "Minecraft");
        assert_eq!(row.date, "20200101");
    }
    assert_eq!((rt.other_server.as_str(), rt.other_path.as_str()), ("wasabi", "yt/ah-500.webm"));
    assert_eq!((yt.other_server.as_str(), yt.other_path.as_str()), ("octopus", "rt/ah-500.mp4"));

    let renames = filename_map(&[rt.clone()]);
    assert_eq!(renames.len(), 2);
    assert!(renames
        .iter()
        .all(|r| r.to == "Achievement Hunter/Let's Play/2020-01-01 - Episode 500 - Minecraft"));
}

#[test]
fn test_tab_separated_utf16_input() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("vidinfo.tsv");
    let tsv = VIDINFO.replace(",\"900,000,000\",", ",900000000,").replace(',', "\t");
    let mut file = fs::File::create(&source).unwrap();
    file.write_all(&[0xFF, 0xFE]).unwrap();
    for unit in tsv.encode_utf16() {
        file.write_all(&unit.to_le_bytes()).unwrap();
    }
    drop(file);

    let table = VideoTable::read(&source, true).unwrap();
    assert_eq!(table.len(), 6);
    let records = table.records(&CategorizeConfig::default()).unwrap();
    assert_eq!(records[0].size, Some(900_000_000));
    assert_eq!(records[0].title, "Let's Play Minecraft Episode 500");
}

#[test]
fn test_missing_column_aborts_before_classification() {
    let broken = VIDINFO.replacen("Audio codec", "Audio", 1);
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("vidinfo.csv");
    fs::write(&source, broken).unwrap();
    let err = VideoTable::read(&source, false).unwrap_err();
    assert!(err.to_string().contains("Audio codec"));
}

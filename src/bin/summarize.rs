//! Summarize a categorized vidinfo table for downstream handling
//!
//! Usage: vidinfo-summarize <categorized.csv> [--class keep --class archive] [--rename-map map.csv]

use anyhow::{Context, Result};
use clap::Parser;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use vidinfo_categorize::models::DispositionClass;
use vidinfo_categorize::naming::{filename_map, filter_by_class, result_class};
use vidinfo_categorize::progress::init_tracing;
use vidinfo_categorize::safety::validate_output_path;
use vidinfo_categorize::table::{read_categorized, CategorizedRow};

#[derive(Parser)]
#[command(name = "vidinfo-summarize")]
#[command(about = "Report disposition counts and rename targets for a categorized vidinfo table")]
struct Args {
    /// Categorized table written by vidinfo-categorize
    source: PathBuf,

    /// List rows in these disposition classes (inspect, keep, archive, merge, delete, ignore)
    #[arg(long = "class")]
    classes: Vec<DispositionClass>,

    /// Write server,from,to renames for the listed classes (all rows if none)
    #[arg(long)]
    rename_map: Option<PathBuf>,
}

fn print_counts(rows: &[CategorizedRow]) {
    let mut counts: FxHashMap<Option<DispositionClass>, usize> = FxHashMap::default();
    for row in rows {
        *counts.entry(result_class(&row.result)).or_default() += 1;
    }

    println!("\n{:=<60}", "");
    println!("Rows: {}", rows.len());
    for class in DispositionClass::ALL {
        println!("  {:<8} {}", class.name(), counts.get(&Some(class)).copied().unwrap_or(0));
    }
    if let Some(unknown) = counts.get(&None) {
        println!("  {:<8} {}", "unknown", unknown);
    }
    println!("{:=<60}", "");
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("warn")?;

    let file = File::open(&args.source).with_context(|| format!("Failed to open {}", args.source.display()))?;
    let rows = read_categorized(BufReader::new(file))
        .with_context(|| format!("Failed to read categorized table {}", args.source.display()))?;

    print_counts(&rows);

    let selected: Vec<CategorizedRow> = if args.classes.is_empty() {
        rows.clone()
    } else {
        let selected: Vec<CategorizedRow> = filter_by_class(&rows, &args.classes).into_iter().cloned().collect();
        println!("\nRows in {:?}:", args.classes.iter().map(|c| c.name()).collect::<Vec<_>>());
        println!("{:-<80}", "");
        for row in &selected {
            println!("[{}] {}/{} ({})", row.result, row.server, row.filename, row.date);
        }
        selected
    };

    if let Some(path) = &args.rename_map {
        validate_output_path(path, &[args.source.as_path()])?;
        let renames = filename_map(&selected);
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create rename map {}", path.display()))?;
        for rename in &renames {
            writer.serialize(rename)?;
        }
        writer.flush()?;
        println!("\nWrote {} renames to {}", renames.len(), path.display());
    }

    Ok(())
}

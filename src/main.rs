use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use vidinfo_categorize::models::DispositionClass;
use vidinfo_categorize::progress::{create_spinner, finish, format_duration, init_tracing, set_log_only};
use vidinfo_categorize::safety::validate_output_path;
use vidinfo_categorize::table::read_alive_list;
use vidinfo_categorize::{categorize, CategorizeConfig, VideoTable};

#[derive(Parser)]
#[command(name = "vidinfo-categorize")]
#[command(about = "Identify preferable copies of videos in a vidinfo table")]
struct Args {
    /// vidinfo table to categorize
    source: PathBuf,

    /// File listing still-alive primary-platform video IDs, one per line
    #[arg(short, long)]
    alive_list: PathBuf,

    /// Output CSV (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Read a tab-separated UTF-16 table instead of UTF-8 CSV
    #[arg(short, long)]
    tab_separated: bool,

    /// TOML file overriding grouping and arbitration thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write run statistics as JSON
    #[arg(long)]
    stats: Option<PathBuf>,

    #[arg(long, default_value = "0")]
    workers: usize,

    /// Hide progress bars and log progress lines instead
    #[arg(long)]
    log_only: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    set_log_only(args.log_only);
    init_tracing("info")?;

    if args.workers > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(args.workers)
            .build_global()
            .context("Failed to set thread pool size")?;
    }

    if let Some(output) = &args.output {
        validate_output_path(output, &[args.source.as_path(), args.alive_list.as_path()])?;
    }

    let config = match &args.config {
        Some(path) => CategorizeConfig::from_path(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CategorizeConfig::default(),
    };

    let start = Instant::now();

    let spinner = create_spinner("Phase 1: Reading vidinfo table");
    let table = VideoTable::read(&args.source, args.tab_separated)
        .with_context(|| format!("Failed to read vidinfo table {}", args.source.display()))?;
    let records = table.records(&config).context("Failed to parse vidinfo table")?;
    let alive = read_alive_list(&args.alive_list)
        .with_context(|| format!("Failed to read alive list {}", args.alive_list.display()))?;
    finish(
        &spinner,
        format!("Phase 1: Read {} records, {} alive IDs", records.len(), alive.len()),
    );

    let categorized = categorize(records, &alive, &config).context("Categorization failed")?;

    let spinner = create_spinner("Phase 4: Writing categorized table");
    match &args.output {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("Failed to create output {}", path.display()))?;
            table.write_categorized(&categorized.records, BufWriter::new(file))?;
        }
        None => {
            let stdout = io::stdout();
            table.write_categorized(&categorized.records, stdout.lock())?;
        }
    }
    finish(&spinner, format!("Phase 4: Wrote {} rows", categorized.records.len()));

    let mut stats = categorized.stats;
    stats.elapsed_seconds = start.elapsed().as_secs_f64();
    stats.log_phase("categorize");
    if let Some(path) = &args.stats {
        stats
            .write_to_file(path)
            .with_context(|| format!("Failed to write stats {}", path.display()))?;
    }

    let mut err = io::stderr().lock();
    writeln!(err, "\n{:=<60}", "")?;
    writeln!(err, "Categorization complete!")?;
    writeln!(err, "  Records: {} in, {} out", stats.input_records, stats.output_records)?;
    writeln!(err, "  Groups: {} ({} paired, {} merged)", stats.groups, stats.paired_groups, stats.merge_mode_groups)?;
    for class in DispositionClass::ALL {
        writeln!(err, "  {:<8} {}", class.name(), stats.class_count(class))?;
    }
    writeln!(err, "  Inspect rate: {:.1}%", stats.inspect_rate())?;
    writeln!(err, "  Elapsed: {}", format_duration(start.elapsed()))?;
    writeln!(err, "{:=<60}", "")?;

    Ok(())
}

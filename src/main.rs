use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use shredscope::io_utils::{io_cli_error, shredscope_cli_error, simple_cli_error};
use shredscope::{
    build_index, write_csv, write_json, AnalysisConfig, BlockAnalysis, BucketWidth, LineWindow,
    MismatchPolicy, SlotLog,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "shredscope", about = "FEC set reconstruction timelines from shred receipt logs")]
struct Args {
    /// Receipt log to analyze
    path: PathBuf,
    /// First line to read (line 0 is the header)
    #[arg(long, default_value_t = 1)]
    start_line: usize,
    /// Stop before this line
    #[arg(long)]
    end_line: Option<usize>,
    /// Time bucket width in microseconds
    #[arg(long, default_value_t = 1)]
    bucket_us: u64,
    /// Block to analyze, defaults to the lowest indexed block
    #[arg(long, conflicts_with = "all")]
    block: Option<u64>,
    /// Analyze every indexed block
    #[arg(long)]
    all: bool,
    /// Only print the indexed block ids
    #[arg(long)]
    list: bool,
    /// What to do when a readiness point has no timeline entry (fail|drop)
    #[arg(long, default_value_t = MismatchPolicy::Fail)]
    on_mismatch: MismatchPolicy,
    /// Optional JSON output path for the analyses
    #[arg(long)]
    json: Option<PathBuf>,
    /// Optional CSV output path for timelines, duplicates and ready points
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    if let Err(e) = run(args) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "shredscope=debug" } else { "shredscope=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = AnalysisConfig {
        window: LineWindow::new(args.start_line, args.end_line),
        bucket: BucketWidth::from_micros(args.bucket_us)
            .map_err(|e| shredscope_cli_error("invalid --bucket-us", e))?,
        on_mismatch: args.on_mismatch,
    };
    config
        .validate()
        .map_err(|e| shredscope_cli_error("invalid line range", e))?;

    let log = open_with_progress(&args.path, config)?;
    let ids: Vec<u64> = log.index().block_ids().collect();

    if args.list {
        println!("SLOT IDs ({}):", ids.len());
        for id in &ids {
            println!("{id}");
        }
        return Ok(());
    }

    let targets = if args.all {
        ids
    } else {
        match args.block.or_else(|| ids.first().copied()) {
            Some(id) => vec![id],
            None => return Err(simple_cli_error("no blocks found in the selected lines").into()),
        }
    };

    let mut analyses = Vec::with_capacity(targets.len());
    for id in targets {
        let analysis = log
            .analyze(id)
            .map_err(|e| shredscope_cli_error(&format!("analyzing block {id}"), e))?;
        print_report(&analysis);
        analyses.push(analysis);
    }

    if let Some(path) = &args.json {
        let f = File::create(path).map_err(|e| io_cli_error("creating json", path, e))?;
        write_json(BufWriter::new(f), &analyses)
            .map_err(|e| shredscope_cli_error("writing json", e))?;
    }
    if let Some(path) = &args.csv {
        let f = File::create(path).map_err(|e| io_cli_error("creating csv", path, e))?;
        write_csv(BufWriter::new(f), &analyses)
            .map_err(|e| shredscope_cli_error("writing csv", e))?;
    }

    Ok(())
}

fn open_with_progress(
    path: &Path,
    config: AnalysisConfig,
) -> Result<SlotLog, Box<dyn std::error::Error>> {
    let file = File::open(path).map_err(|e| io_cli_error("opening receipt log", path, e))?;
    let len = file
        .metadata()
        .map_err(|e| io_cli_error("reading metadata of", path, e))?
        .len();

    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("indexing {bar:40} {bytes}/{total_bytes} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    let index = build_index(BufReader::new(bar.wrap_read(file)), config.window)
        .map_err(|e| shredscope_cli_error("indexing receipt log", e))?;
    bar.finish_and_clear();

    Ok(SlotLog::with_index(path, index, config))
}

fn print_report(analysis: &BlockAnalysis) {
    let banner = format!("==== block {} ====", analysis.block_id);
    println!("{banner}");
    for batch in &analysis.batches {
        let ready = match batch.ready_at {
            Some(ts) => format!("READY at {ts}"),
            None => "incomplete".to_string(),
        };
        println!(
            "FEC set {:<4}  size {:<4}  required {:<4}  unique {:<4}  total {:<5}  {}",
            batch.fec_set_id,
            batch.set_size,
            batch.required,
            batch.unique_received,
            batch.total_received,
            ready
        );
    }

    let stats = &analysis.stats;
    if !stats.has_data() {
        println!("no FEC set with a declared size ({} receipts)", analysis.events);
        return;
    }
    println!(
        "sets {}  receipts {}  unique {}  duplicates {}  repairs {}",
        stats.evaluable_sets,
        stats.total_events,
        stats.unique_fragments,
        stats.duplicates,
        stats.repair_events
    );
    if let Some(d) = &stats.batch_duration {
        println!(
            "batch duration us: mean {:.1}  min {}  max {}",
            d.mean_micros, d.min_micros, d.max_micros
        );
    }
    println!(
        "ready sets {}/{}  duplicate shreds {}",
        analysis.ready_points.len(),
        analysis.batches.len(),
        analysis.duplicates.len()
    );
}

//! Prints the block index of a receipt log: one `block_id start end bytes`
//! row per indexed block. Used for debugging log layout.

use clap::Parser;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use shredscope::io_utils::{io_cli_error, shredscope_cli_error};
use shredscope::{build_index, LineWindow};

#[derive(Parser)]
struct Args {
    /// Receipt log to index
    input: PathBuf,
    /// First line to index (line 0 is the header)
    #[arg(long, default_value_t = 1)]
    start_line: usize,
    /// Stop before this line
    #[arg(long)]
    end_line: Option<usize>,
    /// Optional CSV output path for the index
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let file = File::open(&args.input)
        .map_err(|e| io_cli_error("opening receipt log", &args.input, e))?;
    let window = LineWindow::new(args.start_line, args.end_line);
    let index = build_index(BufReader::new(file), window)
        .map_err(|e| shredscope_cli_error("indexing receipt log", e))?;

    let mut csv_writer = match &args.csv {
        Some(p) => {
            let f = File::create(p).map_err(|e| io_cli_error("creating csv", p, e))?;
            let mut wtr = csv::Writer::from_writer(f);
            wtr.write_record(["block_id", "start", "end"])?;
            Some(wtr)
        }
        None => None,
    };

    for (block_id, range) in index.iter() {
        println!("{block_id} {} {} {}", range.start, range.end, range.len());
        if let Some(wtr) = csv_writer.as_mut() {
            wtr.write_record([
                block_id.to_string(),
                range.start.to_string(),
                range.end.to_string(),
            ])?;
        }
    }
    if let Some(wtr) = csv_writer.as_mut() {
        wtr.flush()?;
    }

    println!(
        "#blocks: {}  #lines indexed: {}  #lines skipped: {}",
        index.len(),
        index.lines_indexed(),
        index.lines_skipped()
    );
    Ok(())
}

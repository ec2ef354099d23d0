//! wind-batch: decode capture files of timestamped Mode S frames into
//! merged wind CSVs, one output file per input file.

use std::path::PathBuf;
use std::thread;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod capture;
mod pipeline;

#[derive(Parser)]
#[command(name = "wind-batch", version, about = "Mode S wind retrieval from capture files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode capture files into merged wind CSVs
    Decode {
        /// Capture files ("timestamp hex" lines, one frame per line)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output directory for the per-file CSVs
        #[arg(long, default_value = "out")]
        out: PathBuf,

        /// Worker threads (default: one per CPU)
        #[arg(long)]
        workers: Option<usize>,

        /// Time bucket resolution in milliseconds
        #[arg(long, default_value_t = 500)]
        resolution_ms: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            files,
            out,
            workers,
            resolution_ms,
        } => cmd_decode(files, out, workers, resolution_ms),
    }
}

fn cmd_decode(files: Vec<PathBuf>, out: PathBuf, workers: Option<usize>, resolution_ms: u64) {
    if resolution_ms == 0 {
        eprintln!("Error: --resolution-ms must be positive");
        std::process::exit(1);
    }

    if let Err(e) = std::fs::create_dir_all(&out) {
        eprintln!("Error creating output directory {}: {e}", out.display());
        std::process::exit(1);
    }

    let workers = workers
        .unwrap_or_else(|| {
            thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
        .clamp(1, files.len().max(1));

    info!(files = files.len(), workers, resolution_ms, "decode start");

    let (tx, rx) = crossbeam_channel::unbounded::<PathBuf>();
    for file in files {
        // unbounded channel, send cannot block or fail before the drop
        let _ = tx.send(file);
    }
    drop(tx);

    let out = &out;
    thread::scope(|s| {
        for _ in 0..workers {
            let rx = rx.clone();
            s.spawn(move || {
                while let Ok(path) = rx.recv() {
                    match pipeline::decode_file(&path, out, resolution_ms) {
                        Ok(rows) => info!(file = %path.display(), rows, "decoded"),
                        Err(e) => error!(file = %path.display(), error = %e, "skipped"),
                    }
                }
            });
        }
    });

    info!("decode done");
}

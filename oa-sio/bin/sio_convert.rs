//! SIO recording tools
//!
//! Usage:
//!   sio-convert convert data/*.sio --remove 15 --destination converted
//!   sio-convert header data/23042001.sio
//!   sio-convert merge converted/npy/*.npy --base-time "21135 12:00" \
//!       --start "21135 12:05" --end "21135 12:35" --fs 1500 --output merged

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use oa_sio::{ConvertOptions, MergeWindow, convert_files, merge_npy_files, read_header};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sio-convert")]
#[command(about = "Inspect SIO array recordings, convert them to .npy and merge time windows", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert recordings to .npy with a JSON header sidecar
    Convert {
        /// SIO files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Channels to drop (0-based, comma separated)
        #[arg(long, value_delimiter = ',')]
        remove: Vec<usize>,
        /// Output root; the `npy` directory is created beneath it
        #[arg(short, long)]
        destination: Option<PathBuf>,
        /// Files converted concurrently
        #[arg(short = 'j', long, default_value_t = 8)]
        workers: usize,
    },
    /// Stack converted .npy files and keep one time window
    Merge {
        /// Converted .npy files, merged in path order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Time of the first sample of the first file, 'yj HH:MM'
        #[arg(long)]
        base_time: String,
        /// Start of the analysis window, 'yj HH:MM'
        #[arg(long)]
        start: String,
        /// End of the analysis window (exclusive), 'yj HH:MM'
        #[arg(long)]
        end: String,
        /// Sampling frequency [Hz]
        #[arg(long)]
        fs: f64,
        /// Channels to drop (0-based, comma separated)
        #[arg(long, value_delimiter = ',')]
        remove: Vec<usize>,
        /// Directory receiving X.npy and t.npy
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a file header as JSON
    Header {
        /// SIO file
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Convert {
            files,
            remove,
            destination,
            workers,
        } => {
            let options = ConvertOptions {
                channels_to_remove: remove,
                destination,
                max_workers: workers,
            };
            let outcomes = convert_files(&files, &options)?;
            let failed = outcomes.iter().filter(|c| c.result.is_err()).count();
            for outcome in &outcomes {
                match &outcome.result {
                    Ok(npy) => println!("{} -> {}", outcome.source.display(), npy.display()),
                    Err(e) => eprintln!("{}: {e}", outcome.source.display()),
                }
            }
            if failed > 0 {
                bail!("{failed} of {} files failed to convert", outcomes.len());
            }
        }
        Command::Merge {
            files,
            base_time,
            start,
            end,
            fs,
            remove,
            output,
        } => {
            let window = MergeWindow::parse(&base_time, &start, &end, fs)?;
            let stream = merge_npy_files(&files, &window, &remove)?;
            println!(
                "{} samples x {} channels from {} files",
                stream.x.nrows(),
                stream.x.ncols(),
                files.len()
            );
            if let Some(dir) = output {
                stream
                    .save(&dir)
                    .with_context(|| format!("failed to save merged data to {}", dir.display()))?;
                println!("saved to {}", dir.display());
            }
        }
        Command::Header { file } => {
            let header = read_header(&file)
                .with_context(|| format!("failed to read header of {}", file.display()))?;
            println!("{}", serde_json::to_string_pretty(&header)?);
        }
    }
    Ok(())
}

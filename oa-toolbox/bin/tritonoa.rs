//! Acoustics Toolbox command line
//!
//! Usage:
//!   tritonoa link --bin-dir ~/at/bin --target ~/.local/bin
//!   tritonoa kraken --config pekeris.json --output field.json --npy field.npy
//!   tritonoa bellhop --config munk.json --output rays.json
//!   tritonoa write-env --config pekeris.json kraken

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use oa_common::{
    AdiabaticParameters, BellhopParameters, FieldResult, KrakenParameters, ParameterFile,
    print_environment_summary, write_npy,
};
use oa_toolbox::{
    BellhopEnvironment, KrakenEnvironment, link_executables, run_bellhop, run_kraken,
    run_kraken_adiabatic, unlink_executables,
};
use serde_json::json;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "tritonoa")]
#[command(about = "Run the KRAKEN and BELLHOP acoustic models from JSON parameter files", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Link the toolbox executables into a directory on PATH
    Link {
        /// Toolbox `bin` directory
        #[arg(long)]
        bin_dir: PathBuf,
        /// Directory to place the links in (default: ~/.local/bin)
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Remove links created by `link`
    Unlink {
        /// Toolbox `bin` directory
        #[arg(long)]
        bin_dir: PathBuf,
        /// Directory holding the links (default: ~/.local/bin)
        #[arg(long)]
        target: Option<PathBuf>,
    },
    /// Compute a normal-mode pressure field
    Kraken {
        /// KRAKEN parameter file (`src`/`rec` pair with --adiabatic)
        #[arg(short, long)]
        config: PathBuf,
        /// Output JSON file
        #[arg(short, long, default_value = "field.json")]
        output: PathBuf,
        /// Also save the complex field as .npy
        #[arg(long)]
        npy: Option<PathBuf>,
        /// Two-environment adiabatic run
        #[arg(long)]
        adiabatic: bool,
    },
    /// Trace rays
    Bellhop {
        /// BELLHOP parameter file
        #[arg(short, long)]
        config: PathBuf,
        /// Output JSON file
        #[arg(short, long, default_value = "rays.json")]
        output: PathBuf,
    },
    /// Write the environment file without running a model
    WriteEnv {
        /// Parameter file
        #[arg(short, long)]
        config: PathBuf,
        /// Model the file is for
        model: Model,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Model {
    Kraken,
    Bellhop,
}

fn link_target(target: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match target {
        Some(target) => Ok(target),
        None => {
            let home = std::env::var_os("HOME").context("HOME is not set; pass --target")?;
            Ok(PathBuf::from(home).join(".local").join("bin"))
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Command::Link { bin_dir, target } => {
            let target = link_target(target)?;
            let created = link_executables(&bin_dir, &target)
                .with_context(|| format!("linking {}", bin_dir.display()))?;
            println!("Linked {} executables into {}", created.len(), target.display());
        }
        Command::Unlink { bin_dir, target } => {
            let target = link_target(target)?;
            let removed = unlink_executables(&bin_dir, &target)?;
            println!("Removed {} links from {}", removed.len(), target.display());
        }
        Command::Kraken {
            config,
            output,
            npy,
            adiabatic,
        } => {
            let (model, title, freq, receiver, field) = if adiabatic {
                let params = AdiabaticParameters::from_file(&config)
                    .with_context(|| format!("loading {}", config.display()))?;
                print_environment_summary(&params.rec.title, params.rec.freq, &params.rec.env);
                let field = run_kraken_adiabatic(&params)?;
                let rec = params.rec;
                ("KRAKEN adiabatic".to_string(), rec.title, rec.freq, rec.env.receiver()?, field)
            } else {
                let params = KrakenParameters::from_file(&config)
                    .with_context(|| format!("loading {}", config.display()))?;
                print_environment_summary(&params.title, params.freq, &params.env);
                let field = run_kraken(&params)?;
                (params.model.clone(), params.title.clone(), params.freq, params.env.receiver()?, field)
            };

            let result = FieldResult::new(&model, &title, freq, &receiver, &field);
            fs::write(&output, serde_json::to_string_pretty(&result.to_json())?)?;
            println!("Saved field ({} x {}) to {}", field.nrows(), field.ncols(), output.display());
            if let Some(path) = npy {
                write_npy(&path, &field)?;
                println!("Saved complex field to {}", path.display());
            }
        }
        Command::Bellhop { config, output } => {
            let params = BellhopParameters::from_file(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            print_environment_summary(&params.title, params.freq, &params.env);
            let rays = run_bellhop(&params)?;
            let sources: Vec<_> = rays
                .sources
                .iter()
                .map(|fan| {
                    fan.iter()
                        .map(|ray| {
                            json!({
                                "launch_angle": ray.launch_angle,
                                "num_top_bounce": ray.num_top_bounce,
                                "num_bot_bounce": ray.num_bot_bounce,
                                "r": ray.r,
                                "z": ray.z,
                            })
                        })
                        .collect::<Vec<_>>()
                })
                .collect();
            let doc = json!({
                "title": rays.title,
                "frequency": rays.freq,
                "depth_top": rays.depth_top,
                "depth_bot": rays.depth_bot,
                "sources": sources,
                "metadata": {
                    "date": chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                },
            });
            fs::write(&output, serde_json::to_string_pretty(&doc)?)?;
            println!("Saved {} rays to {}", rays.num_rays(), output.display());
        }
        Command::WriteEnv { config, model } => {
            let path = match model {
                Model::Kraken => {
                    let params = KrakenParameters::from_file(&config)?;
                    KrakenEnvironment::from_parameters(&params)?.write_envfil()?
                }
                Model::Bellhop => {
                    let params = BellhopParameters::from_file(&config)?;
                    BellhopEnvironment::from_parameters(&params)?.write_envfil()?
                }
            };
            if !path.exists() {
                bail!("environment file {} was not written", path.display());
            }
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod model;
use model::{label_pairs, load_rom, load_tables};

#[derive(Parser, Debug)]
#[command(author, version, about = "HAL action script dumper for Super Famicom ROMs", long_about = None)]
struct Cli {
    /// The input ROM file to extract data from
    #[arg(value_name = "ROM")]
    rom: PathBuf,
    /// The output file that will be created
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// JSON data file with the ROM info, opcodes, routines and labels
    #[arg(value_name = "DATA")]
    data: PathBuf,
    /// Export defined labels to JSON (Vec<{ addr, name }>)
    #[arg(long, value_name = "FILE")]
    labels_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let tables = load_tables(&cli.data)?;
    let rom = load_rom(&cli.rom)?;

    let started = Instant::now();
    let dump = actscr_rs::dump(rom, &tables)?;
    if !dump.unmatched.is_empty() {
        info!("{} label(s) could not be placed", dump.unmatched.len());
    }

    info!("Writing to output file...");
    std::fs::write(&cli.output, &dump.text).with_context(|| format!("writing {}", cli.output.display()))?;

    if let Some(path) = &cli.labels_out {
        let json = serde_json::to_string_pretty(&label_pairs(&dump.labels))?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    info!(
        "Finished extraction of {} instructions in {:.4} seconds!",
        dump.instructions,
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

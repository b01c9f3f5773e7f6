use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use tbc_encoder::{ProjectConfig, ProjectRunner};

#[derive(Parser)]
#[command(name = "tbc-encoder")]
#[command(about = "Encode still frames into PAL/NTSC composite TBC files", long_about = None)]
struct Cli {
    /// Project file (TOML).
    project: PathBuf,

    /// Output path without extension, replacing the project's.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write separate luma and chroma files.
    #[arg(long)]
    yc: bool,

    /// Name Y/C files `.tbc` and `_chroma.tbc`.
    #[arg(long)]
    legacy_names: bool,

    /// Skip the `.db` metadata file.
    #[arg(long)]
    no_metadata: bool,

    /// Stop after this many frames.
    #[arg(long)]
    frames: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging.
    env_logger::init();

    let cli = Cli::parse();

    let mut config = ProjectConfig::load(&cli.project)
        .with_context(|| format!("Failed to load project {}", cli.project.display()))?;
    if let Some(output) = cli.output {
        config.output.filename = output;
    }
    config.output.yc |= cli.yc;
    config.output.legacy_names |= cli.legacy_names;
    config.output.metadata &= !cli.no_metadata;

    let runner = ProjectRunner::new(config)
        .context("Invalid project")?
        .with_frame_limit(cli.frames);
    let summary = runner.run().context("Encoding failed")?;

    for path in &summary.outputs {
        info!("Output: {}", path.display());
    }
    if let Some(path) = &summary.metadata {
        info!("Metadata: {}", path.display());
    }
    println!("Encoded {} frames ({} fields)", summary.frames, summary.fields);

    Ok(())
}

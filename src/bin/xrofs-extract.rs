//! xrofs-extract
//!
//! Lists or extracts the contents of an xrofs image

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use xrofs::extract::list;
use xrofs::{human_size, ByteOrder, Extractor, MappedImage};

#[derive(Parser, Debug)]
#[command(name = "xrofs-extract")]
#[command(about = "Tool for extracting xrofs image contents")]
struct Args {
    /// Xrofs image file
    #[arg(short = 'i', long = "img")]
    image: PathBuf,

    /// List image contents and exit
    #[arg(short, long)]
    list: bool,

    /// Extract every file
    #[arg(short, long)]
    all: bool,

    /// Output directory; must not exist before extraction
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Don't produce progress output
    #[arg(short, long)]
    quiet: bool,

    /// Byte order the image was built with (little, big) [default: little]
    #[arg(long, default_value = "little")]
    endian: ByteOrder,

    /// Files to extract
    files: Vec<String>,
}

impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.list && !self.all && self.files.is_empty() {
            bail!("Either --list, --all or FILEs to extract must be provided");
        }
        if self.list && (!self.files.is_empty() || self.dir.is_some()) {
            bail!("To list image contents NO filenames or dirname should be given");
        }
        if self.all && !self.files.is_empty() {
            bail!("Ambiguous arguments: either --all OR separate filenames should be given");
        }
        if !self.list && self.dir.is_none() {
            bail!("No output directory provided for extraction");
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    args.validate()?;

    let level = if args.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let image = MappedImage::open(&args.image)
        .with_context(|| format!("Failed to open image {:?}", args.image))?;
    let reader = image
        .reader(args.endian)
        .with_context(|| format!("{:?} is not a valid xrofs image", args.image))?;

    if args.list {
        for (name, size) in list(&reader) {
            println!("{:<67} {:>11}", name, human_size(size as u64, true).trim_end());
        }
        return Ok(());
    }

    info!(
        "* Discovered {} files totalling {}",
        reader.len(),
        human_size(image.len() as u64, true).trim_end()
    );

    let Some(dir) = &args.dir else {
        bail!("No output directory provided for extraction");
    };
    info!("* Extracting {:?} to {:?}", args.image, dir);

    let extractor = Extractor::create(&reader, dir)?;
    let written = if args.all {
        extractor.extract_all()?
    } else {
        extractor.extract_files(args.files.as_slice())?
    };

    info!("* Extracted {} files", written.len());
    Ok(())
}

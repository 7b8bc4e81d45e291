//! xrofsgen
//!
//! Packs a directory tree into an xrofs image

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use xrofs::{BuildConfig, BuildOptions, ByteOrder, ImageBuilder, NameEncoding};

#[derive(Parser, Debug)]
#[command(name = "xrofsgen")]
#[command(about = "Generate an xrofs image from a directory tree")]
struct Args {
    /// Directory to pack
    #[arg(short = 'd', long = "dir")]
    source: PathBuf,

    /// Image file to write (truncated if it exists)
    #[arg(short = 'o', long = "out")]
    destination: PathBuf,

    /// Skip and report recoverable errors instead of aborting
    #[arg(short, long)]
    force: bool,

    /// Print every packed file and the final result
    #[arg(short, long)]
    verbose: bool,

    /// Byte order of header and entry fields (little, big) [default: little]
    #[arg(long)]
    endian: Option<ByteOrder>,

    /// Encoding of stored names (ascii, utf-8) [default: ascii]
    #[arg(long)]
    encoding: Option<NameEncoding>,

    /// Header magic, decimal or 0x-prefixed hex [default: 0x8000]
    #[arg(long, value_parser = parse_magic)]
    magic: Option<u16>,

    /// TOML file with default build options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep the partially written image after a fatal error
    #[arg(long)]
    keep_partial: bool,
}

fn parse_magic(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("Invalid magic '{}': {}", s, e))
}

impl Args {
    /// File options first, then explicit flags on top
    fn build_config(&self) -> anyhow::Result<BuildConfig> {
        let mut builder = BuildConfig::builder(&self.source, &self.destination);

        if let Some(path) = &self.config {
            let options = BuildOptions::load(path)
                .with_context(|| format!("Failed to load config file {:?}", path))?;
            builder = builder.options(&options);
        }

        let mut config = builder.build();
        config.force |= self.force;
        config.verbose |= self.verbose;
        config.keep_partial |= self.keep_partial;
        if let Some(order) = self.endian {
            config.byte_order = order;
        }
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(magic) = self.magic {
            config.magic = magic;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
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
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = args.build_config()?;
    init_tracing(config.verbose);

    info!(
        "Packing {:?} into {:?} ({:?}, {:?}, magic 0x{:04x})",
        config.source, config.destination, config.byte_order, config.encoding, config.magic
    );

    let mut builder = ImageBuilder::new(&config);
    match builder.build() {
        Ok(report) => {
            if config.verbose {
                println!("Result: {}", report.status());
            } else if !report.is_stable() {
                warn!("Result: {}", report.status());
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(errors = builder.errors(), "Build aborted");
            eprintln!("{}", err.pretty());
            Ok(ExitCode::from(libc::EPERM as u8))
        }
    }
}

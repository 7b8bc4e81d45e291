//! Build configuration
//!
//! A [`BuildConfig`] is constructed once per build and handed by reference
//! to every stage. Values can come from code, from the command line, or from
//! an optional TOML file ([`BuildOptions`]) whose fields are overridden by
//! explicit settings.

use crate::error::{Result, XrofsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default drive magic stored in the first header field
pub const DEFAULT_MAGIC: u16 = 0x8000;

/// Byte order of every multi-byte field in the image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl FromStr for ByteOrder {
    type Err = XrofsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "little" | "le" => Ok(ByteOrder::Little),
            "big" | "be" => Ok(ByteOrder::Big),
            _ => Err(XrofsError::InvalidOption(format!(
                "Invalid byte order '{}'. Valid options: little, big",
                s
            ))),
        }
    }
}

/// Text encoding used for the names stored after each file's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameEncoding {
    #[default]
    Ascii,
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
}

impl NameEncoding {
    /// Encode a relative path, `None` if it is not representable
    pub fn encode(&self, name: &str) -> Option<Vec<u8>> {
        match self {
            NameEncoding::Ascii if !name.is_ascii() => None,
            NameEncoding::Ascii | NameEncoding::Utf8 => Some(name.as_bytes().to_vec()),
        }
    }
}

impl FromStr for NameEncoding {
    type Err = XrofsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ascii" | "us-ascii" => Ok(NameEncoding::Ascii),
            "utf-8" | "utf8" => Ok(NameEncoding::Utf8),
            _ => Err(XrofsError::InvalidOption(format!(
                "Invalid name encoding '{}'. Valid options: ascii, utf-8",
                s
            ))),
        }
    }
}

/// Immutable settings for one image build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Directory whose files are packed
    pub source: PathBuf,
    /// Image file, truncated if it exists
    pub destination: PathBuf,
    /// Skip and log recoverable errors instead of aborting
    pub force: bool,
    /// Emit per-file progress lines at info level
    pub verbose: bool,
    pub encoding: NameEncoding,
    pub byte_order: ByteOrder,
    pub magic: u16,
    /// Leave a partially written destination in place after a fatal error
    pub keep_partial: bool,
}

impl BuildConfig {
    /// Strict, quiet, ASCII, little-endian build with the default magic
    pub fn new<S: Into<PathBuf>, D: Into<PathBuf>>(source: S, destination: D) -> Self {
        BuildConfig {
            source: source.into(),
            destination: destination.into(),
            force: false,
            verbose: false,
            encoding: NameEncoding::default(),
            byte_order: ByteOrder::default(),
            magic: DEFAULT_MAGIC,
            keep_partial: false,
        }
    }

    pub fn builder<S: Into<PathBuf>, D: Into<PathBuf>>(
        source: S,
        destination: D,
    ) -> BuildConfigBuilder {
        BuildConfigBuilder {
            config: BuildConfig::new(source, destination),
        }
    }
}

/// Builder for [`BuildConfig`]
///
/// # Examples
///
/// ```
/// use xrofs::{BuildConfig, ByteOrder};
///
/// let config = BuildConfig::builder("rootfs", "rootfs.img")
///     .force(true)
///     .byte_order(ByteOrder::Big)
///     .build();
///
/// assert!(config.force);
/// assert_eq!(config.magic, 0x8000);
/// ```
#[derive(Debug, Clone)]
pub struct BuildConfigBuilder {
    config: BuildConfig,
}

impl BuildConfigBuilder {
    pub fn force(mut self, force: bool) -> Self {
        self.config.force = force;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn encoding(mut self, encoding: NameEncoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.config.byte_order = byte_order;
        self
    }

    pub fn magic(mut self, magic: u16) -> Self {
        self.config.magic = magic;
        self
    }

    pub fn keep_partial(mut self, keep_partial: bool) -> Self {
        self.config.keep_partial = keep_partial;
        self
    }

    /// Apply every option set in a config file
    pub fn options(mut self, options: &BuildOptions) -> Self {
        if let Some(force) = options.force {
            self.config.force = force;
        }
        if let Some(verbose) = options.verbose {
            self.config.verbose = verbose;
        }
        if let Some(encoding) = options.encoding {
            self.config.encoding = encoding;
        }
        if let Some(byte_order) = options.byte_order {
            self.config.byte_order = byte_order;
        }
        if let Some(magic) = options.magic {
            self.config.magic = magic;
        }
        if let Some(keep_partial) = options.keep_partial {
            self.config.keep_partial = keep_partial;
        }
        self
    }

    pub fn build(self) -> BuildConfig {
        self.config
    }
}

/// Optional build settings read from a TOML file
///
/// ```toml
/// force = true
/// byte_order = "big"
/// encoding = "utf-8"
/// magic = 0x8001
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<NameEncoding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_order: Option<ByteOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magic: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_partial: Option<bool>,
}

impl BuildOptions {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}

//! # xrofs - Read-Only Single-File Filesystem Images
//!
//! `xrofs` packs a directory tree into one flat binary image that a minimal
//! runtime (bootloader, firmware, microcontroller) can read in place without
//! any allocation or parsing beyond a binary search.
//!
//! ## Image Format
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Header (4 bytes)                              │
//! │  - magic (u16, default 0x8000)                │
//! │  - entry count (u16)                          │
//! ├───────────────────────────────────────────────┤
//! │ Entry table (7 bytes per file, sorted by name)│
//! │  - content size (24 bits)                     │
//! │  - content offset (32 bits)                   │
//! ├───────────────────────────────────────────────┤
//! │ Data segment, per file in table order:        │
//! │  - content bytes                              │
//! │  - name bytes, NUL terminated                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Every multi-byte field uses the byte order chosen for the build
//! (little-endian by default).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xrofs::{build_image, BuildConfig, Result};
//!
//! # fn main() -> Result<()> {
//! let config = BuildConfig::builder("firmware/rootfs", "rootfs.xrofs")
//!     .force(true)
//!     .build();
//!
//! let report = build_image(&config)?;
//! println!("{} files, {:.2} % payload", report.files, report.efficiency());
//! if !report.is_stable() {
//!     println!("{} errors were skipped", report.errors);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Policy
//!
//! In strict mode (the default) the first problem aborts the build and the
//! partial destination is removed. In force mode, empty files, empty
//! directories, special files, unreadable directories and files that changed
//! size while being copied are logged and skipped; the report's error count
//! tells the caller whether the image can be trusted. Values that overflow
//! their fixed-width fields always abort.

pub mod config;
pub mod core;
pub mod error;
pub mod extract;
pub mod reader;
pub mod report;

pub use crate::config::{BuildConfig, BuildConfigBuilder, BuildOptions, ByteOrder, NameEncoding};
pub use crate::core::codec::{
    encode_entry, encode_header, ImageEntry, ImageHeader, ENTRY_LEN, HEADER_LEN, MAX_FILE_SIZE,
};
pub use crate::core::collect::{Collection, DirectoryCollector, FileRecord};
pub use crate::core::layout::{ImageLayout, Placement};
pub use crate::core::ledger::{ErrorLedger, Flow};
pub use crate::core::writer::ImageWriter;
pub use crate::core::ImageBuilder;
pub use crate::error::{InvalidReason, Result, XrofsError};
pub use crate::extract::{Extractor, MappedImage};
pub use crate::reader::{EntryView, ImageFile, ImageReader};
pub use crate::report::{human_size, BuildReport};

/// Build the image described by `config`
///
/// Shorthand for [`ImageBuilder::build`] when the error count of a failed
/// build is not needed.
pub fn build_image(config: &BuildConfig) -> Result<BuildReport> {
    ImageBuilder::new(config).build()
}

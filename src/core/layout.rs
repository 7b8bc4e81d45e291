//! Image layout computation
//!
//! Fixes the on-disk order of files and the absolute offset of every file's
//! content before a single byte is written. Data regions follow the entry
//! table back to back:
//!
//! ```text
//! | header | entry 0 .. entry n-1 | content 0 | name 0 | \0 | content 1 | ...
//!                                 ^ offset 0              ^ offset 1
//! ```

use crate::config::BuildConfig;
use crate::core::codec::{encode_entry, ImageHeader};
use crate::core::collect::FileRecord;
use crate::error::{InvalidReason, Result, XrofsError};
use crate::report::efficiency;

/// Where one file lands in the image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub relative_path: String,
    /// Encoded name without the NUL terminator
    pub name: Vec<u8>,
    pub size: u64,
    /// Absolute position of the first content byte
    pub offset: u64,
}

impl Placement {
    /// Bytes this file occupies in the data segment
    pub fn region_len(&self) -> u64 {
        self.size + self.name.len() as u64 + 1
    }
}

/// Header, entry table and data placements of one image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLayout {
    prefix: Vec<u8>,
    placements: Vec<Placement>,
    total_len: u64,
}

impl ImageLayout {
    pub fn build<I>(records: I, config: &BuildConfig) -> Result<Self>
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let order = config.byte_order;

        let mut named = Vec::new();
        for record in records {
            let name = config.encoding.encode(&record.relative_path).ok_or_else(|| {
                XrofsError::InvalidEntry {
                    path: record.relative_path.clone().into(),
                    reason: InvalidReason::UnencodableName,
                }
            })?;
            named.push((name, record));
        }
        // Byte-wise order of the encoded names is the canonical image order
        named.sort_by(|a, b| a.0.cmp(&b.0));

        let header = ImageHeader::new(config.magic, named.len())?;
        let mut prefix = header.to_bytes(order).to_vec();

        let entry_len = encode_entry(1, 1, order)?.len() as u64;
        let first_offset = prefix.len() as u64 + entry_len * named.len() as u64;

        let mut placements = Vec::with_capacity(named.len());
        let mut cursor = first_offset;
        for (name, record) in named {
            prefix.extend_from_slice(&encode_entry(record.size, cursor, order)?);

            let placement = Placement {
                relative_path: record.relative_path,
                name,
                size: record.size,
                offset: cursor,
            };
            cursor += placement.region_len();
            placements.push(placement);
        }

        debug_assert_eq!(prefix.len() as u64, first_offset);

        Ok(ImageLayout {
            prefix,
            placements,
            total_len: cursor,
        })
    }

    /// Header followed by the full entry table
    pub fn prefix(&self) -> &[u8] {
        &self.prefix
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Offset of the first data region, equal to the prefix length
    pub fn first_offset(&self) -> u64 {
        self.prefix.len() as u64
    }

    /// Image length once every file is written
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    pub fn payload_len(&self) -> u64 {
        self.placements.iter().map(|p| p.size).sum()
    }

    /// Payload share of the image, in percent
    pub fn efficiency(&self) -> f64 {
        efficiency(self.payload_len(), self.total_len)
    }
}

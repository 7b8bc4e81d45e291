//! Fixed-width encoding of the image header and entry table
//!
//! ```text
//! offset  size  field
//! 0       2     magic
//! 2       2     entry count
//! 4       7*n   entries: { size: 3 bytes, offset: 4 bytes }
//! ```
//!
//! All fields use the byte order chosen for the build.

use crate::config::ByteOrder;
use crate::error::{Result, XrofsError};

pub const SIZE_FIELD_LEN: usize = 3;
pub const OFFSET_FIELD_LEN: usize = 4;

pub const HEADER_LEN: usize = 4;
pub const ENTRY_LEN: usize = SIZE_FIELD_LEN + OFFSET_FIELD_LEN;

/// Largest file content that fits the 24-bit size field (16 MiB - 1)
pub const MAX_FILE_SIZE: u64 = (1 << (SIZE_FIELD_LEN * 8)) - 1;
/// Largest content offset that fits the 32-bit offset field
pub const MAX_OFFSET: u64 = u32::MAX as u64;
pub const MAX_ENTRIES: u64 = u16::MAX as u64;

/// Image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub magic: u16,
    pub entry_count: u16,
}

impl ImageHeader {
    /// Header for `count` entries, rejecting counts above 65535
    pub fn new(magic: u16, count: usize) -> Result<Self> {
        let entry_count = check_width("entry count", count as u64, MAX_ENTRIES)? as u16;
        Ok(ImageHeader { magic, entry_count })
    }

    pub fn to_bytes(&self, order: ByteOrder) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        put_uint(&mut bytes[0..2], self.magic as u64, order);
        put_uint(&mut bytes[2..4], self.entry_count as u64, order);
        bytes
    }

    pub fn from_bytes(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(XrofsError::InvalidImage(format!(
                "Insufficient bytes for header: {}",
                bytes.len()
            )));
        }

        Ok(ImageHeader {
            magic: get_uint(&bytes[0..2], order) as u16,
            entry_count: get_uint(&bytes[2..4], order) as u16,
        })
    }
}

/// One entry of the table: where a file's content starts and how long it is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageEntry {
    pub size: u32,
    pub offset: u32,
}

impl ImageEntry {
    pub fn new(size: u64, offset: u64) -> Result<Self> {
        let size = check_width("size", size, MAX_FILE_SIZE)? as u32;
        let offset = check_width("offset", offset, MAX_OFFSET)? as u32;
        Ok(ImageEntry { size, offset })
    }

    pub fn to_bytes(&self, order: ByteOrder) -> [u8; ENTRY_LEN] {
        let mut bytes = [0u8; ENTRY_LEN];
        put_uint(&mut bytes[..SIZE_FIELD_LEN], self.size as u64, order);
        put_uint(&mut bytes[SIZE_FIELD_LEN..], self.offset as u64, order);
        bytes
    }

    pub fn from_bytes(bytes: &[u8], order: ByteOrder) -> Result<Self> {
        if bytes.len() < ENTRY_LEN {
            return Err(XrofsError::InvalidImage(format!(
                "Insufficient bytes for entry: {}",
                bytes.len()
            )));
        }

        Ok(ImageEntry {
            size: get_uint(&bytes[..SIZE_FIELD_LEN], order) as u32,
            offset: get_uint(&bytes[SIZE_FIELD_LEN..ENTRY_LEN], order) as u32,
        })
    }
}

/// Encode the 4-byte image header
pub fn encode_header(magic: u16, entry_count: u16, order: ByteOrder) -> Vec<u8> {
    ImageHeader { magic, entry_count }.to_bytes(order).to_vec()
}

/// Encode one 7-byte entry, failing if a value overflows its field
pub fn encode_entry(size: u64, offset: u64, order: ByteOrder) -> Result<Vec<u8>> {
    Ok(ImageEntry::new(size, offset)?.to_bytes(order).to_vec())
}

fn check_width(field: &'static str, value: u64, max: u64) -> Result<u64> {
    if value > max {
        return Err(XrofsError::EncodingOverflow { field, value, max });
    }
    Ok(value)
}

/// Write the low `buf.len()` bytes of `value`
fn put_uint(buf: &mut [u8], value: u64, order: ByteOrder) {
    let width = buf.len();
    let le = value.to_le_bytes();
    match order {
        ByteOrder::Little => buf.copy_from_slice(&le[..width]),
        ByteOrder::Big => {
            for (dst, src) in buf.iter_mut().zip(le[..width].iter().rev()) {
                *dst = *src;
            }
        }
    }
}

fn get_uint(buf: &[u8], order: ByteOrder) -> u64 {
    let mut le = [0u8; 8];
    match order {
        ByteOrder::Little => le[..buf.len()].copy_from_slice(buf),
        ByteOrder::Big => {
            for (dst, src) in le.iter_mut().zip(buf.iter().rev()) {
                *dst = *src;
            }
        }
    }
    u64::from_le_bytes(le)
}

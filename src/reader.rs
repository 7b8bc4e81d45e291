//! Random-access reader over an in-memory image
//!
//! This is the runtime side of the format: give it the image bytes (a
//! memory-mapped file, a flash region, a `Vec`) and look files up by name.
//! Lookups binary-search the entry table, which the builder keeps sorted by
//! raw name bytes.
//!
//! ```
//! use xrofs::{ByteOrder, ImageReader};
//!
//! // header, one entry { size: 2, offset: 11 }, then "hi" "x" NUL
//! let image = [
//!     0x00, 0x80, 0x01, 0x00,
//!     0x02, 0x00, 0x00, 0x0b, 0x00, 0x00, 0x00,
//!     b'h', b'i', b'x', 0x00,
//! ];
//! let reader = ImageReader::new(&image, ByteOrder::Little).unwrap();
//! let file = reader.open("x").unwrap();
//! assert_eq!(file.map(), b"hi");
//! ```

use crate::config::ByteOrder;
use crate::core::codec::{ImageEntry, ImageHeader, ENTRY_LEN, HEADER_LEN};
use crate::error::{Result, XrofsError};
use std::io::{self, SeekFrom};

/// One validated entry of an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryView<'a> {
    pub index: usize,
    pub size: u32,
    pub offset: u32,
    /// Name bytes stored after the content, without the terminator
    pub name: &'a [u8],
}

impl<'a> EntryView<'a> {
    pub fn name_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name).ok()
    }
}

#[derive(Debug, Clone)]
pub struct ImageReader<'a> {
    image: &'a [u8],
    header: ImageHeader,
    entries: Vec<EntryView<'a>>,
}

impl<'a> ImageReader<'a> {
    /// Parse the header and entry table, checking every region is in bounds
    pub fn new(image: &'a [u8], order: ByteOrder) -> Result<Self> {
        let header = ImageHeader::from_bytes(image, order)?;
        let count = header.entry_count as usize;

        let table_end = HEADER_LEN + ENTRY_LEN * count;
        if image.len() < table_end {
            return Err(XrofsError::InvalidImage(format!(
                "entry table needs {} bytes, image has {}",
                table_end,
                image.len()
            )));
        }

        let mut entries = Vec::with_capacity(count);
        for index in 0..count {
            let start = HEADER_LEN + ENTRY_LEN * index;
            let entry = ImageEntry::from_bytes(&image[start..start + ENTRY_LEN], order)?;
            entries.push(Self::view(image, table_end, index, entry)?);
        }

        Ok(ImageReader {
            image,
            header,
            entries,
        })
    }

    fn view(
        image: &'a [u8],
        table_end: usize,
        index: usize,
        entry: ImageEntry,
    ) -> Result<EntryView<'a>> {
        let offset = entry.offset as usize;
        if offset < table_end {
            return Err(XrofsError::InvalidImage(format!(
                "entry {} content starts inside the entry table ({} < {})",
                index, offset, table_end
            )));
        }

        let name_start = offset.checked_add(entry.size as usize).ok_or_else(|| {
            XrofsError::InvalidImage(format!("entry {} content end overflows", index))
        })?;
        if name_start >= image.len() {
            return Err(XrofsError::InvalidImage(format!(
                "entry {} content ends past the image ({} > {})",
                index,
                name_start,
                image.len()
            )));
        }

        let tail = &image[name_start..];
        let name_len = tail.iter().position(|&b| b == 0).ok_or_else(|| {
            XrofsError::InvalidImage(format!("entry {} name is not terminated", index))
        })?;

        Ok(EntryView {
            index,
            size: entry.size,
            offset: entry.offset,
            name: &tail[..name_len],
        })
    }

    pub fn magic(&self) -> u16 {
        self.header.magic
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw image bytes
    pub fn bytes(&self) -> &'a [u8] {
        self.image
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntryView<'a>> + '_ {
        self.entries.iter()
    }

    pub fn entry(&self, index: usize) -> Option<&EntryView<'a>> {
        self.entries.get(index)
    }

    /// Index of the entry named `name`
    pub fn find<N: AsRef<[u8]>>(&self, name: N) -> Option<usize> {
        let name = name.as_ref();
        self.entries
            .binary_search_by(|entry| entry.name.cmp(name))
            .ok()
    }

    pub fn open<N: AsRef<[u8]>>(&self, name: N) -> Option<ImageFile<'a>> {
        self.find(name).map(|index| self.open_index(index))
    }

    fn open_index(&self, index: usize) -> ImageFile<'a> {
        let entry = self.entries[index];
        let start = entry.offset as usize;
        ImageFile {
            index,
            content: &self.image[start..start + entry.size as usize],
            pos: 0,
        }
    }

    /// Every entry opened in table order
    pub fn files(&self) -> impl Iterator<Item = ImageFile<'a>> + '_ {
        (0..self.entries.len()).map(move |index| self.open_index(index))
    }
}

/// Read cursor over one file's content
#[derive(Debug, Clone)]
pub struct ImageFile<'a> {
    index: usize,
    content: &'a [u8],
    pos: usize,
}

impl<'a> ImageFile<'a> {
    /// Position of this file in the entry table
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the content
    pub fn remaining(&self) -> usize {
        self.content.len() - self.pos
    }

    /// Copy up to `buf.len()` bytes, returning how many were read
    pub fn read_into(&mut self, buf: &mut [u8]) -> usize {
        let n = buf.len().min(self.remaining());
        buf[..n].copy_from_slice(&self.content[self.pos..self.pos + n]);
        self.pos += n;
        n
    }

    /// Move the cursor, staying on a content byte
    ///
    /// `Start` and `Current` are relative to the first byte and the cursor;
    /// `End` is relative to the last byte, so `End(0)` lands on it. A target
    /// outside the content leaves the cursor unchanged and returns `None`.
    pub fn seek(&mut self, pos: SeekFrom) -> Option<u64> {
        let last = self.content.len() as i64 - 1;
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).ok()?,
            SeekFrom::Current(offset) => (self.pos as i64).checked_add(offset)?,
            SeekFrom::End(offset) => last.checked_add(offset)?,
        };
        if target < 0 || target > last {
            return None;
        }
        self.pos = target as usize;
        Some(target as u64)
    }

    /// The content from the cursor to the end, without copying
    pub fn map(&self) -> &'a [u8] {
        &self.content[self.pos..]
    }
}

impl io::Read for ImageFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf))
    }
}

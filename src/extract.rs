//! Listing and extracting the contents of an image file

use crate::config::ByteOrder;
use crate::core::writer::copy_bounded;
use crate::error::{Result, XrofsError};
use crate::reader::{ImageFile, ImageReader};
use crate::report::human_size;
use memmap2::Mmap;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// An image file mapped read-only into memory
pub struct MappedImage {
    map: Mmap,
    path: PathBuf,
}

impl MappedImage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        // SAFETY: the mapping is read-only; the image must not be modified
        // by another process while it is mapped.
        let map = unsafe { Mmap::map(&file)? };
        debug!("Mapped {:?} ({} bytes)", path.as_ref(), map.len());
        Ok(MappedImage {
            map,
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn reader(&self, order: ByteOrder) -> Result<ImageReader<'_>> {
        ImageReader::new(&self.map, order)
    }
}

/// Name and size of every entry, in table order
pub fn list(reader: &ImageReader<'_>) -> Vec<(String, u32)> {
    reader
        .entries()
        .map(|entry| (String::from_utf8_lossy(entry.name).into_owned(), entry.size))
        .collect()
}

/// Writes image entries below an output directory
pub struct Extractor<'r, 'a> {
    reader: &'r ImageReader<'a>,
    out_dir: PathBuf,
}

impl<'r, 'a> Extractor<'r, 'a> {
    /// Create `out_dir`, which must not exist yet
    pub fn create<P: AsRef<Path>>(reader: &'r ImageReader<'a>, out_dir: P) -> Result<Self> {
        let out_dir = out_dir.as_ref().to_path_buf();
        match fs::create_dir(&out_dir) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Err(XrofsError::DestinationExists(out_dir));
            }
            Err(err) => return Err(err.into()),
        }
        Ok(Extractor { reader, out_dir })
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Extract every entry, returning the written paths
    pub fn extract_all(&self) -> Result<Vec<PathBuf>> {
        let total = self.reader.len();
        let mut written = Vec::with_capacity(total);
        for (i, file) in self.reader.files().enumerate() {
            let name = self.entry_name(&file)?;
            self.log_progress(i, total, file.size(), name);
            written.push(self.extract_one(name, file)?);
        }
        Ok(written)
    }

    /// Extract the named entries, stopping at the first unknown name
    pub fn extract_files<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PathBuf>> {
        let total = names.len();
        let mut written = Vec::with_capacity(total);
        for (i, name) in names.iter().enumerate() {
            let name = name.as_ref();
            let file = self
                .reader
                .open(name)
                .ok_or_else(|| XrofsError::FileNotFound(name.to_string()))?;
            self.log_progress(i, total, file.size(), name);
            written.push(self.extract_one(name, file)?);
        }
        Ok(written)
    }

    fn entry_name(&self, file: &ImageFile<'a>) -> Result<&'a str> {
        self.reader
            .entry(file.index())
            .and_then(|entry| entry.name_str())
            .ok_or_else(|| {
                XrofsError::InvalidImage(format!("entry {} name is not UTF-8", file.index()))
            })
    }

    fn log_progress(&self, i: usize, total: usize, size: usize, name: &str) {
        info!(
            "[{}/{} {:>9}] {}",
            i + 1,
            total,
            human_size(size as u64, true).trim_end(),
            name
        );
    }

    fn extract_one(&self, name: &str, mut file: ImageFile<'a>) -> Result<PathBuf> {
        let target = self.target_path(name)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(&target)?);
        let copied = copy_bounded(&mut file, &mut out)?;
        out.flush()?;

        if copied != file.size() as u64 {
            return Err(XrofsError::SizeMismatch {
                path: target,
                expected: file.size() as u64,
                actual: copied,
            });
        }
        Ok(target)
    }

    /// Output path for an entry name; only plain relative components allowed
    fn target_path(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if name.is_empty() || !plain {
            return Err(XrofsError::InvalidImage(format!(
                "refusing to extract entry named {:?}",
                name
            )));
        }
        Ok(self.out_dir.join(relative))
    }
}

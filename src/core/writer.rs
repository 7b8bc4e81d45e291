//! Streams an [`ImageLayout`] into the destination file
//!
//! The header and entry table are written in one go; file contents are
//! copied from the source tree in bounded chunks, so the image is never held
//! in memory as a whole.

use crate::config::BuildConfig;
use crate::core::layout::{ImageLayout, Placement};
use crate::core::ledger::ErrorLedger;
use crate::error::{Result, XrofsError};
use crate::report::human_size;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use tracing::{debug, info};

pub const COPY_BUFFER_LEN: usize = 16 * 1024;

pub struct ImageWriter<'a> {
    config: &'a BuildConfig,
}

impl<'a> ImageWriter<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        ImageWriter { config }
    }

    /// Create or truncate the destination and write the whole image
    ///
    /// Returns the number of bytes written.
    pub fn write(&self, layout: &ImageLayout, ledger: &mut ErrorLedger) -> Result<u64> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.config.destination);
        let mut out = BufWriter::new(destination(ledger, file)?);

        let written = self.write_to(layout, &mut out, ledger)?;
        destination(ledger, out.flush())?;
        Ok(written)
    }

    /// Write the image into any seekable sink positioned at its start
    pub fn write_to<W: Write + Seek>(
        &self,
        layout: &ImageLayout,
        out: &mut W,
        ledger: &mut ErrorLedger,
    ) -> Result<u64> {
        info!(
            "* Writing image \"{}\" totalling {}",
            self.config.destination.display(),
            human_size(layout.total_len(), false)
        );

        destination(ledger, out.write_all(layout.prefix()))?;
        let mut total = layout.prefix().len() as u64;
        if self.config.verbose {
            info!(
                "  > [ HEADER ({}) ]",
                human_size(layout.first_offset(), false).trim_end()
            );
        }

        for placement in layout.placements() {
            if self.config.verbose {
                info!(
                    "  > {:<64} {:>10}",
                    placement.relative_path,
                    format!("@ 0x{:06x}", placement.offset)
                );
            } else {
                debug!(
                    path = %placement.relative_path,
                    offset = placement.offset,
                    size = placement.size,
                    "writing"
                );
            }

            destination(ledger, out.seek(SeekFrom::Start(placement.offset)))?;
            let copied = match self.copy_content(placement, out) {
                Ok(copied) => copied,
                Err(err) => {
                    ledger.absorb(err)?;
                    continue;
                }
            };

            if copied != placement.size {
                ledger.absorb(XrofsError::SizeMismatch {
                    path: self.config.source.join(&placement.relative_path),
                    expected: placement.size,
                    actual: copied,
                })?;
                // Forced: content is there but the trailing name is not
                continue;
            }

            destination(ledger, out.write_all(&placement.name))?;
            destination(ledger, out.write_all(&[0]))?;
            total += copied + placement.name.len() as u64 + 1;
        }

        info!(
            "* Written {} files {} total [size efficiency: {:.2} %]",
            layout.placements().len(),
            human_size(total, true).trim_end(),
            layout.efficiency()
        );
        Ok(total)
    }

    /// Copy one source file to the current position of `out`
    fn copy_content<W: Write>(&self, placement: &Placement, out: &mut W) -> Result<u64> {
        let path = self.config.source.join(&placement.relative_path);
        let mut src = File::open(&path).map_err(|source| XrofsError::FileAccess {
            path: path.clone(),
            source,
        })?;
        copy_bounded(&mut src, out)
    }
}

/// Count a failed operation on the image itself; these are never skippable
fn destination<T>(ledger: &mut ErrorLedger, result: std::io::Result<T>) -> Result<T> {
    result.map_err(|err| ledger.fatal(err.into()))
}

/// Copy until `src` is exhausted through a fixed-size buffer
pub fn copy_bounded<R: Read, W: Write>(src: &mut R, dst: &mut W) -> Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_LEN];
    let mut copied = 0u64;
    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        dst.write_all(&buf[..n])?;
        copied += n as u64;
    }
    Ok(copied)
}

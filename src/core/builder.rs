//! Build orchestration

use crate::config::BuildConfig;
use crate::core::collect::{Collection, DirectoryCollector};
use crate::core::layout::ImageLayout;
use crate::core::ledger::ErrorLedger;
use crate::core::writer::ImageWriter;
use crate::error::Result;
use crate::report::BuildReport;
use std::fs;
use tracing::{info, warn};

/// Runs collection, layout and writing for one configuration
///
/// The error count stays available after a failed build through
/// [`errors`](Self::errors).
pub struct ImageBuilder<'a> {
    config: &'a BuildConfig,
    ledger: ErrorLedger,
}

impl<'a> ImageBuilder<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        ImageBuilder {
            config,
            ledger: ErrorLedger::new(config.force),
        }
    }

    pub fn errors(&self) -> u64 {
        self.ledger.count()
    }

    pub fn collect(&mut self) -> Result<Collection> {
        DirectoryCollector::new(self.config).collect(&mut self.ledger)
    }

    pub fn layout(&mut self, collection: &Collection) -> Result<ImageLayout> {
        ImageLayout::build(collection.records(), self.config).map_err(|err| self.ledger.fatal(err))
    }

    /// Write `layout`, removing the destination on failure unless told to keep it
    pub fn write(&mut self, layout: &ImageLayout) -> Result<u64> {
        let err = match ImageWriter::new(self.config).write(layout, &mut self.ledger) {
            Ok(written) => return Ok(written),
            Err(err) => err,
        };

        if !self.config.keep_partial {
            let destination = &self.config.destination;
            match fs::remove_file(destination) {
                Ok(()) => info!("Removed partial image {:?}", destination),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove partial image {:?}: {}", destination, e),
            }
        }
        Err(err)
    }

    pub fn build(&mut self) -> Result<BuildReport> {
        let collection = self.collect()?;
        let layout = self.layout(&collection)?;
        let bytes_written = self.write(&layout)?;

        Ok(BuildReport {
            files: layout.placements().len(),
            payload_bytes: layout.payload_len(),
            image_bytes: layout.total_len(),
            bytes_written,
            errors: self.ledger.count(),
        })
    }
}

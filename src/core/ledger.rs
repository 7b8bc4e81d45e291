//! Error accounting shared by every build stage
//!
//! Each stage reports failures here instead of deciding on its own whether
//! to abort. The ledger counts the failure first, then applies the
//! force/strict policy once for all stages.

use crate::error::{Result, XrofsError};
use tracing::warn;

/// What a stage should do after reporting a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Skip the offending unit of work and keep going
    Continue,
    /// Stop the build and return the error
    Abort,
}

#[derive(Debug, Default)]
pub struct ErrorLedger {
    force: bool,
    count: u64,
}

impl ErrorLedger {
    pub fn new(force: bool) -> Self {
        ErrorLedger { force, count: 0 }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_force(&self) -> bool {
        self.force
    }

    /// Count `err` and decide whether the build may continue
    ///
    /// Errors that force mode cannot skip always abort.
    pub fn decide(&mut self, err: &XrofsError) -> Flow {
        self.count += 1;
        if self.force && err.is_recoverable() {
            warn!(errors = self.count, "! {} => skipping", err.pretty());
            Flow::Continue
        } else {
            Flow::Abort
        }
    }

    /// Count an error that no policy can skip and hand it back
    pub fn fatal(&mut self, err: XrofsError) -> XrofsError {
        self.count += 1;
        err
    }

    /// [`decide`](Self::decide), returning the error on abort
    pub fn absorb(&mut self, err: XrofsError) -> Result<()> {
        match self.decide(&err) {
            Flow::Continue => Ok(()),
            Flow::Abort => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_strict_aborts_and_counts() {
        let mut ledger = ErrorLedger::new(false);
        let err = XrofsError::EmptyDirectory(PathBuf::from("empty"));
        assert!(matches!(
            ledger.absorb(err),
            Err(XrofsError::EmptyDirectory(_))
        ));
        assert_eq!(ledger.count(), 1);
    }

    #[test]
    fn test_force_continues_and_counts() {
        let mut ledger = ErrorLedger::new(true);
        ledger
            .absorb(XrofsError::EmptyDirectory(PathBuf::from("a")))
            .unwrap();
        ledger
            .absorb(XrofsError::EmptyDirectory(PathBuf::from("b")))
            .unwrap();
        assert_eq!(ledger.count(), 2);
    }

    #[test]
    fn test_force_cannot_skip_overflow() {
        let mut ledger = ErrorLedger::new(true);
        let err = XrofsError::EncodingOverflow {
            field: "size",
            value: 1 << 24,
            max: (1 << 24) - 1,
        };
        assert_eq!(ledger.decide(&err), Flow::Abort);
        assert_eq!(ledger.count(), 1);

        let err = ledger.fatal(err);
        assert!(matches!(err, XrofsError::EncodingOverflow { .. }));
        assert_eq!(ledger.count(), 2);
    }
}

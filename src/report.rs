//! Build summary and size formatting for log lines

/// Outcome of a completed build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildReport {
    /// Files listed in the entry table
    pub files: usize,
    /// Sum of file content sizes
    pub payload_bytes: u64,
    /// Planned image length: header, entries, contents, names, terminators
    pub image_bytes: u64,
    /// Bytes actually written to the destination
    pub bytes_written: u64,
    /// Errors counted during the build, skipped ones included
    pub errors: u64,
}

impl BuildReport {
    /// Payload as a percentage of the image length, in (0, 100]
    pub fn efficiency(&self) -> f64 {
        efficiency(self.payload_bytes, self.image_bytes)
    }

    /// True when no error was skipped along the way
    pub fn is_stable(&self) -> bool {
        self.errors == 0
    }

    /// `good`, or `unstable (N errors ignored)`
    pub fn status(&self) -> String {
        if self.is_stable() {
            "good".to_string()
        } else {
            format!("unstable ({} errors ignored)", self.errors)
        }
    }
}

pub(crate) fn efficiency(payload: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    payload as f64 * 100.0 / total as f64
}

/// Human readable byte count
///
/// Below 1 KiB the exact count is printed; above it, three decimals of the
/// largest fitting unit, followed by the exact count unless `short`.
///
/// ```
/// use xrofs::human_size;
///
/// assert_eq!(human_size(512, false), "512 B ");
/// assert_eq!(human_size(2048, true), "2.000 KB");
/// assert_eq!(human_size(2048, false), "2.000 KB (2048 bytes)");
/// ```
pub fn human_size(bytes: u64, short: bool) -> String {
    if bytes < 1024 {
        return format!("{} B ", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = "KB";
    for candidate in ["KB", "MB", "GB"] {
        size /= 1024.0;
        unit = candidate;
        if size < 1024.0 {
            break;
        }
    }

    let mut out = format!("{:4.3} {}", size, unit);
    if !short {
        out.push_str(&format!(" ({} bytes)", bytes));
    }
    out
}

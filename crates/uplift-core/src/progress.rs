//! Transfer progress samples.

/// A point-in-time sample of the storage PUT.
///
/// Samples are observational only: they drive the textual percentage
/// readout and never gate a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Bytes sent so far.
    pub bytes_sent: u64,
    /// Total bytes to send, `None` when the length is not computable.
    pub bytes_total: Option<u64>,
}

impl TransferProgress {
    /// Creates a sample with a known total.
    pub fn computable(bytes_sent: u64, bytes_total: u64) -> Self {
        Self {
            bytes_sent,
            bytes_total: Some(bytes_total),
        }
    }

    /// Creates a sample without a known total.
    pub fn not_computable(bytes_sent: u64) -> Self {
        Self {
            bytes_sent,
            bytes_total: None,
        }
    }

    /// Whole-number completion percentage, when computable.
    ///
    /// Returns `None` for unknown or zero totals; those samples produce no
    /// readout update.
    #[must_use]
    pub fn percent(&self) -> Option<u8> {
        let total = self.bytes_total.filter(|total| *total > 0)?;
        let percent = self.bytes_sent.saturating_mul(100) / total;
        Some(percent.min(100) as u8)
    }
}

/// Borrowed callback through which transfer implementations report
/// progress samples.
pub type ProgressSink<'a> = &'a (dyn Fn(TransferProgress) + Send + Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_whole_number() {
        assert_eq!(TransferProgress::computable(512, 2048).percent(), Some(25));
        assert_eq!(TransferProgress::computable(1, 3).percent(), Some(33));
        assert_eq!(TransferProgress::computable(2048, 2048).percent(), Some(100));
    }

    #[test]
    fn test_percent_not_computable() {
        assert_eq!(TransferProgress::not_computable(512).percent(), None);
        assert_eq!(TransferProgress::computable(512, 0).percent(), None);
    }

    #[test]
    fn test_percent_clamped() {
        // A sender that overshoots its announced total still reads 100%.
        assert_eq!(TransferProgress::computable(4096, 2048).percent(), Some(100));
    }
}

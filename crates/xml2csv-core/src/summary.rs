use serde::{Deserialize, Serialize};

/// Outcome of one successful conversion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertSummary {
    /// Data records written (header excluded).
    pub rows_written: u64,
    /// Row elements that captured no column and were dropped.
    pub rows_skipped: u64,
    /// Header inferred from the first non-empty row; empty when nothing was written.
    pub columns: Vec<String>,
    /// Bytes handed to the destination stream.
    pub bytes_written: u64,
}

impl ConvertSummary {
    pub fn is_empty(&self) -> bool {
        self.rows_written == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_until_a_row_is_written() {
        let mut summary = ConvertSummary {
            rows_skipped: 3,
            ..Default::default()
        };
        assert!(summary.is_empty());
        summary.rows_written = 1;
        assert!(!summary.is_empty());
    }
}

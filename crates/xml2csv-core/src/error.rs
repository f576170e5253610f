use thiserror::Error;

/// Canonical result for the converter crates.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("unexpected end of XML at byte {position} with {open_elements} element(s) still open")]
    UnexpectedEof { position: u64, open_elements: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // csv::Writer failures that are not plain I/O (the core never sees csv types).
    #[error("CSV output error: {0}")]
    Output(String),
}

impl Error {
    pub fn malformed(position: u64, message: impl Into<String>) -> Self {
        Error::Malformed {
            position,
            message: message.into(),
        }
    }

    /// True for errors caused by the input document rather than by either stream.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::Malformed { .. } | Error::UnexpectedEof { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_input_errors() {
        assert!(Error::malformed(3, "bad").is_malformed());
        assert!(Error::UnexpectedEof {
            position: 10,
            open_elements: 2
        }
        .is_malformed());
        let io = Error::from(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));
        assert!(!io.is_malformed());
        assert!(!Error::Output("x".into()).is_malformed());
    }

    #[test]
    fn messages_carry_position() {
        let e = Error::malformed(42, "mismatched end tag");
        assert_eq!(e.to_string(), "malformed XML at byte 42: mismatched end tag");
    }
}

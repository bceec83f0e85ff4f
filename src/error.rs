use thiserror::Error;

/// Failures surfaced by the push, list and manifest operations.
///
/// Every variant carries the operation that produced it. Nothing in the
/// crate retries; errors travel unmodified to the process boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// Local object missing or unreadable.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    /// Malformed hex, wrong-length hash, or undecodable object bytes.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The content store returned a CID other than the one derived locally.
    #[error("CIDs don't match: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// Durable tracker unreachable or corrupt.
    #[error("tracker error: {0}")]
    Tracker(String),

    /// Content-store transfer or fetch failure.
    #[error("store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn retrieval(context: impl Into<String>) -> Self {
        Error::Retrieval(context.into())
    }

    pub fn encoding(context: impl Into<String>) -> Self {
        Error::Encoding(context.into())
    }

    pub fn tracker(context: impl Into<String>) -> Self {
        Error::Tracker(context.into())
    }

    pub fn store(context: impl Into<String>) -> Self {
        Error::Store(context.into())
    }
}

impl Error {
    /// Prefix the message with the operation that failed
    pub fn context(self, operation: &str) -> Self {
        match self {
            Error::Retrieval(msg) => Error::Retrieval(format!("{}: {}", operation, msg)),
            Error::Encoding(msg) => Error::Encoding(format!("{}: {}", operation, msg)),
            Error::Tracker(msg) => Error::Tracker(format!("{}: {}", operation, msg)),
            Error::Store(msg) => Error::Store(format!("{}: {}", operation, msg)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefixes_message() {
        let err = Error::retrieval("object abc not found").context("push");
        assert_eq!(err.to_string(), "retrieval error: push: object abc not found");

        let err = Error::Integrity {
            expected: "a".into(),
            actual: "b".into(),
        }
        .context("push");
        assert_eq!(err.to_string(), "CIDs don't match: expected a, got b");
    }
}

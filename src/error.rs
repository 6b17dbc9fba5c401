//! Error types for the PromptPay payload library.

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PromptPayError>;

/// All errors that can occur while building, parsing, or configuring
/// payment payloads.
#[derive(Debug, thiserror::Error)]
pub enum PromptPayError {
    /// The payee identifier is empty or cannot be encoded for its kind.
    #[error("invalid identifier: {reason}")]
    InvalidIdentifier {
        /// Why the identifier was rejected.
        reason: String,
    },

    /// A field value does not fit in a two-digit length prefix.
    #[error("value for tag {tag} is {len} characters long, maximum is 99")]
    FieldTooLong {
        /// Tag of the offending field.
        tag: String,
        /// Actual character count of the value.
        len: usize,
    },

    /// The identifier kind is unknown or not configured for the scheme.
    #[error("unsupported identifier kind: {0}")]
    UnsupportedKind(String),

    /// A field tag is not exactly two ASCII digits.
    #[error("invalid tag {0:?}: expected two ASCII digits")]
    InvalidTag(String),

    /// The amount is negative or not a finite number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// The payload does not end with a `6304` checksum field.
    #[error("payload does not end with a checksum field (tag 63, length 04)")]
    MissingChecksum,

    /// The checksum carried by the payload does not match its contents.
    #[error("checksum mismatch: expected {expected}, found {actual}")]
    ChecksumMismatch {
        /// Checksum computed over the payload.
        expected: String,
        /// Checksum carried in the payload.
        actual: String,
    },

    /// The payload is not a well-formed sequence of TLV fields.
    #[error("malformed payload at offset {offset}: {reason}")]
    MalformedPayload {
        /// Character offset where decoding failed.
        offset: usize,
        /// What was wrong at that offset.
        reason: String,
    },

    /// The scheme configuration contains an unusable constant.
    #[error("invalid scheme configuration: {0}")]
    InvalidConfig(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No platform configuration directory could be determined.
    #[error("could not determine the configuration directory")]
    ConfigDirUnavailable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_serde_json() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = PromptPayError::from(serde_err);
        assert!(matches!(err, PromptPayError::Serialization(_)));
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn error_from_io() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = PromptPayError::from(inner);
        assert!(matches!(err, PromptPayError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn field_too_long_display() {
        let err = PromptPayError::FieldTooLong {
            tag: "29".to_owned(),
            len: 120,
        };
        let msg = err.to_string();
        assert!(msg.contains("29"));
        assert!(msg.contains("120"));
    }

    #[test]
    fn checksum_mismatch_display() {
        let err = PromptPayError::ChecksumMismatch {
            expected: "E469".to_owned(),
            actual: "0000".to_owned(),
        };
        assert_eq!(err.to_string(), "checksum mismatch: expected E469, found 0000");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PromptPayError>();
    }
}

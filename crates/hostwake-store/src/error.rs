//! Error types for the storage layer.

use thiserror::Error;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors raised by the directory and host settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `RocksDB` rejected a read, write or open.
    #[error("rocksdb: {0}")]
    Database(String),

    /// A column family the schema requires is missing from the open database.
    #[error("missing column family `{0}`")]
    MissingColumnFamily(String),

    /// A record could not be encoded to or decoded from CBOR.
    #[error("cbor: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Whether the error points at damaged on-disk data rather than a
    /// transient engine failure.
    #[must_use]
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corruption_is_serialization_only() {
        assert!(StoreError::Serialization("eof".into()).is_corruption());
        assert!(!StoreError::Database("io".into()).is_corruption());
        assert!(!StoreError::MissingColumnFamily("users".into()).is_corruption());
    }

    #[test]
    fn messages_name_the_column_family() {
        let err = StoreError::MissingColumnFamily("users".into());
        assert_eq!(err.to_string(), "missing column family `users`");
    }
}

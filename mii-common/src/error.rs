//! Error types for decoding, loading and transferring Mii records.

use std::path::PathBuf;

use mii_shared::MiiKind;
use thiserror::Error;

/// Why a byte block could not be decoded as a record at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("unsupported char data version {found:#04x} (expected {expected:#04x})")]
    UnsupportedVersion { expected: u8, found: u8 },

    #[error("data does not match any known Mii format")]
    UnknownFormat,
}

/// Per-record decode failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// No record is produced
    #[error("Malformed Mii record: {0}")]
    MalformedRecord(#[from] MalformedReason),

    /// The record decoded, but its stored checksum is wrong
    #[error("Checksum mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    ChecksumInvalid { stored: u16, computed: u16 },
}

/// Database load failure. The load is aborted entirely.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error(
        "Database size mismatch: {len} bytes is not a {header_size}-byte header plus \
         1..={max_records} records of {record_size} bytes"
    )]
    SizeMismatch {
        len: usize,
        header_size: usize,
        record_size: usize,
        max_records: usize,
    },

    #[error("Invalid database magic: expected {expected:?}, found {found:?}")]
    InvalidMagic { expected: [u8; 4], found: Vec<u8> },

    /// A record of another platform was given to an in-memory database
    #[error("Record {slot} is a {found} Mii, database holds {expected} Miis")]
    FormatMismatch {
        slot: usize,
        expected: MiiKind,
        found: MiiKind,
    },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Single-record import or export failure.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Record index {index} out of bounds (database has {len} records)")]
    IndexOutOfBounds { index: usize, len: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DecodeError::from(MalformedReason::Truncated { expected: 74, actual: 12 });
        assert_eq!(
            err.to_string(),
            "Malformed Mii record: expected at least 74 bytes, got 12"
        );

        let err = DecodeError::ChecksumInvalid { stored: 0x1234, computed: 0xABCD };
        assert_eq!(err.to_string(), "Checksum mismatch: stored 0x1234, computed 0xabcd");

        let err = DatabaseError::FileNotFound { path: PathBuf::from("RFL_DB.dat") };
        assert!(err.to_string().contains("RFL_DB.dat"));
    }
}

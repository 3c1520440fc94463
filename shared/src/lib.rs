//! Shared format tables for Mii record tooling.
//!
//! - [`format`] - Per-platform `MiiFormat` layout tables
//! - [`checksum`] - CRC-16 used by store data
//! - [`fs`] - Size-capped file reading

pub mod checksum;
pub mod format;
pub mod fs;

pub use checksum::crc16_xmodem;
pub use format::{
    ALL_FORMATS, BitField, ByteMatch, ByteOrder, ByteSpan, ChecksumAlgorithm, ChecksumSpec,
    MiiFormat, MiiKind, RecordLayout, THREE_DS_FORMAT, TextEncoding, TextField, TimestampRule,
    UnknownKindError, WII_PLAZA_FORMAT, WII_U_FORMAT,
};

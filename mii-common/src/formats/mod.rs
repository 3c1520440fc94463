//! Mii record codec
//!
//! Byte-level decoding and encoding of single records. Layout constants live in
//! `mii_shared::MiiFormat`; nothing in this module branches on the platform.

pub mod builder;
pub mod fields;
pub mod parser;
pub mod record;
mod text;

pub use builder::MiiBuilder;
pub use fields::{Birthday, FavoriteColor, Gender, MiiId};
pub use parser::MiiParser;
pub use record::{ChecksumStatus, MiiFields, MiiRecord, MiiSummary, SlotState, UNKNOWN_CREATOR, UNNAMED};

// Re-export format tables from shared for convenience
pub use mii_shared::{ALL_FORMATS, MiiFormat, MiiKind, THREE_DS_FORMAT, WII_PLAZA_FORMAT, WII_U_FORMAT};

//! Mii record toolkit
//!
//! Decodes and encodes Mii records from Wii, 3DS and Wii U databases, and moves
//! them between databases and standalone files.
//!
//! # Modules
//!
//! - [`formats`] - Record codec (`MiiParser`, `MiiRecord`, `MiiBuilder`)
//! - [`database`] - Database files (`RFL_DB.dat`, `CFL_DB.dat`, `FFL_ODB.dat`)
//! - [`transfer`] - Standalone record import and batch export
//! - [`config`] - TOML configuration for loading and exporting
//! - [`error`] - Typed errors for each layer
//!
//! ```no_run
//! use mii_common::{MiiDatabase, WII_PLAZA_FORMAT};
//!
//! let db = MiiDatabase::load("RFL_DB.dat", &WII_PLAZA_FORMAT)?;
//! for mii in db.get_favorites() {
//!     println!("{} by {}", mii.display_name(), mii.display_creator());
//! }
//! let summary = db.export_all("exported");
//! assert!(summary.is_complete());
//! # Ok::<(), mii_common::DatabaseError>(())
//! ```

pub mod config;
pub mod database;
pub mod error;
pub mod formats;
pub mod transfer;

pub use config::{Config, ExportConfig, LoadConfig};
pub use database::MiiDatabase;
pub use error::{DatabaseError, DecodeError, MalformedReason, TransferError};
pub use formats::{
    ALL_FORMATS, Birthday, ChecksumStatus, FavoriteColor, Gender, MiiBuilder, MiiFields,
    MiiFormat, MiiId, MiiKind, MiiParser, MiiRecord, MiiSummary, SlotState, THREE_DS_FORMAT,
    WII_PLAZA_FORMAT, WII_U_FORMAT,
};
pub use transfer::{ExportFailure, ExportSummary, read_record, read_record_as, write_record};

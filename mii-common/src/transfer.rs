//! Standalone record files
//!
//! Bridges the codec to single-record files and back.
//!
//! - **Read is tolerant**: any file of at least `data_size` bytes is accepted;
//!   trailing bytes are kept in `raw_data` but never decoded.
//! - **Write is canonical**: every export is exactly
//!   `record_size + standalone_padding` bytes with a regenerated checksum,
//!   whatever the original file held after the record.

use std::path::{Path, PathBuf};

use mii_shared::MiiFormat;
use mii_shared::fs::{MAX_RECORD_FILE_BYTES, read_file_with_limit};

use crate::config::ExportConfig;
use crate::error::TransferError;
use crate::formats::{MiiParser, MiiRecord};

/// Read a standalone record, detecting its format.
pub fn read_record(path: &Path) -> Result<MiiRecord, TransferError> {
    let bytes = read_bytes(path)?;
    Ok(MiiParser::parse(&bytes)?)
}

/// Read a standalone record of a known format.
pub fn read_record_as(path: &Path, format: &'static MiiFormat) -> Result<MiiRecord, TransferError> {
    let bytes = read_bytes(path)?;
    Ok(MiiParser::decode(&bytes, format)?)
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, TransferError> {
    read_file_with_limit(path, MAX_RECORD_FILE_BYTES).map_err(|source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write a record in canonical standalone form, creating the parent directory.
pub fn write_record(record: &MiiRecord, path: &Path) -> Result<(), TransferError> {
    let io_err = |source| TransferError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, record.to_bytes()).map_err(io_err)
}

/// Deterministic export file name: `{prefix}{slot:05}.{extension}` (e.g., `WII_PL00000.mii`)
pub fn export_file_name(format: &MiiFormat, slot: usize, extension: &str) -> String {
    format!("{}{:05}.{}", format.export_prefix, slot, extension)
}

/// One record that could not be written during a batch export.
#[derive(Debug)]
pub struct ExportFailure {
    /// Position of the record in the batch (its slot for database records)
    pub slot: usize,
    pub path: PathBuf,
    pub error: TransferError,
}

/// Outcome of a batch export.
#[derive(Debug, Default)]
pub struct ExportSummary {
    /// Files written, in record order
    pub written: Vec<PathBuf>,
    /// Records that could not be written
    pub failures: Vec<ExportFailure>,
}

impl ExportSummary {
    pub fn succeeded(&self) -> usize {
        self.written.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Every attempted record was written
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Paths written, in record order
    pub fn paths(&self) -> &[PathBuf] {
        &self.written
    }
}

/// Export records to `dir`, one file each.
///
/// The directory is created if absent. A failed write is recorded and the batch
/// continues; only a failure to create the directory stops it early, and that is
/// reported as a failure for every record.
pub fn export_records<'a, I>(records: I, dir: &Path, config: &ExportConfig) -> ExportSummary
where
    I: IntoIterator<Item = &'a MiiRecord>,
{
    let mut summary = ExportSummary::default();
    let dir_result = std::fs::create_dir_all(dir);

    for (position, record) in records.into_iter().enumerate() {
        if config.skip_empty && record.is_placeholder() {
            continue;
        }

        let slot = record.slot().unwrap_or(position);
        let path = dir.join(export_file_name(record.format(), slot, &config.extension));

        if let Err(e) = &dir_result {
            summary.failures.push(ExportFailure {
                slot,
                path,
                error: TransferError::Io {
                    path: dir.to_path_buf(),
                    source: std::io::Error::new(e.kind(), e.to_string()),
                },
            });
            continue;
        }

        match std::fs::write(&path, record.to_bytes()) {
            Ok(()) => summary.written.push(path),
            Err(source) => {
                tracing::warn!(slot, path = %path.display(), error = %source, "Failed to export Mii");
                summary.failures.push(ExportFailure {
                    slot,
                    path: path.clone(),
                    error: TransferError::Io { path, source },
                });
            }
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        written = summary.succeeded(),
        failed = summary.failed(),
        "Batch export finished"
    );
    summary
}

//! Mii database container
//!
//! A database file is a header (magic, then zeros) followed by fixed-size slots:
//!
//! ```text
//! +--------+-----------+-----------+-----+-----------+
//! | header | slot 0    | slot 1    | ... | slot N-1  |
//! +--------+-----------+-----------+-----+-----------+
//!            record_size bytes each, N <= record_count_max
//! ```
//!
//! Every slot is kept: empty and malformed slots become placeholder records, so
//! index `i` is always slot `i`.

use std::ops::Index;
use std::path::{Path, PathBuf};

use mii_shared::MiiFormat;
use mii_shared::fs::read_file_with_limit;

use crate::config::{ExportConfig, LoadConfig};
use crate::error::{DatabaseError, TransferError};
use crate::formats::{MiiParser, MiiRecord, SlotState};
use crate::transfer::{self, ExportSummary};

/// Decoded Mii database.
#[derive(Debug, Clone)]
pub struct MiiDatabase {
    file_path: Option<PathBuf>,
    format: &'static MiiFormat,
    header: Vec<u8>,
    records: Vec<MiiRecord>,
}

impl MiiDatabase {
    /// Load a database file with the default [`LoadConfig`].
    pub fn load(path: impl AsRef<Path>, format: &'static MiiFormat) -> Result<Self, DatabaseError> {
        Self::load_with(path, format, &LoadConfig::default())
    }

    /// Load a database file.
    ///
    /// Fails only on file-level problems (missing file, bad size, bad magic). A
    /// malformed slot becomes a placeholder and a bad checksum stays on its record.
    /// Stock console files with bare char data entries fail with `SizeMismatch`.
    pub fn load_with(
        path: impl AsRef<Path>,
        format: &'static MiiFormat,
        config: &LoadConfig,
    ) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let bytes = read_file_with_limit(path, config.max_file_bytes).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                DatabaseError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                DatabaseError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        let mut database = Self::from_bytes(&bytes, format)?;
        tracing::debug!(
            path = %path.display(),
            format = format.display_name,
            slots = database.len(),
            occupied = database.occupied().count(),
            "Loaded Mii database"
        );
        database.file_path = Some(path.to_path_buf());
        Ok(database)
    }

    /// Decode a database image held in memory.
    pub fn from_bytes(bytes: &[u8], format: &'static MiiFormat) -> Result<Self, DatabaseError> {
        let slots = slot_count(bytes.len(), format)?;

        let magic = &bytes[..format.magic.len()];
        if magic != format.magic {
            return Err(DatabaseError::InvalidMagic {
                expected: *format.magic,
                found: magic.to_vec(),
            });
        }

        let body = &bytes[format.header_size..format.database_size(slots)];
        let records = decode_slots(body, format);

        Ok(Self {
            file_path: None,
            format,
            header: bytes[..format.header_size].to_vec(),
            records,
        })
    }

    /// Build a database from records, renumbering their slots.
    ///
    /// The header is the format magic followed by zeros.
    pub fn from_records(
        format: &'static MiiFormat,
        records: impl IntoIterator<Item = MiiRecord>,
    ) -> Result<Self, DatabaseError> {
        let records: Vec<MiiRecord> = records
            .into_iter()
            .enumerate()
            .map(|(slot, record)| {
                if record.format.kind != format.kind {
                    return Err(DatabaseError::FormatMismatch {
                        slot,
                        expected: format.kind,
                        found: record.format.kind,
                    });
                }
                Ok(record.with_slot(slot))
            })
            .collect::<Result<_, _>>()?;

        if records.len() > format.record_count_max {
            return Err(DatabaseError::SizeMismatch {
                len: format.database_size(records.len()),
                header_size: format.header_size,
                record_size: format.record_size,
                max_records: format.record_count_max,
            });
        }

        let mut header = vec![0u8; format.header_size];
        header[..format.magic.len()].copy_from_slice(format.magic);

        Ok(Self {
            file_path: None,
            format,
            header,
            records,
        })
    }

    /// Format of every record in this database
    pub fn format(&self) -> &'static MiiFormat {
        self.format
    }

    /// File this database was loaded from, if any
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// Raw header bytes
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Number of slots, placeholders included
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MiiRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[MiiRecord] {
        &self.records
    }

    /// Every slot in order
    pub fn iter(&self) -> std::slice::Iter<'_, MiiRecord> {
        self.records.iter()
    }

    /// Slots holding a decoded Mii
    pub fn occupied(&self) -> impl Iterator<Item = &MiiRecord> {
        self.records.iter().filter(|record| !record.is_placeholder())
    }

    /// Records matching `predicate`, in slot order.
    pub fn filter<F>(&self, mut predicate: F) -> Vec<&MiiRecord>
    where
        F: FnMut(&MiiRecord) -> bool,
    {
        self.records.iter().filter(|record| predicate(record)).collect()
    }

    pub fn get_favorites(&self) -> Vec<&MiiRecord> {
        self.filter(MiiRecord::is_favorite)
    }

    /// Slot indices whose stored checksum does not match
    pub fn checksum_failures(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.verify().is_err())
            .map(|(slot, _)| slot)
            .collect()
    }

    /// Export every slot to `dir` with the default [`ExportConfig`].
    pub fn export_all(&self, dir: impl AsRef<Path>) -> ExportSummary {
        self.export_all_with(dir, &ExportConfig::default())
    }

    /// Export every slot to `dir`, one file per record.
    pub fn export_all_with(&self, dir: impl AsRef<Path>, config: &ExportConfig) -> ExportSummary {
        transfer::export_records(&self.records, dir.as_ref(), config)
    }

    /// Export a single slot to `path`.
    pub fn export(&self, index: usize, path: impl AsRef<Path>) -> Result<(), TransferError> {
        let record = self.get(index).ok_or(TransferError::IndexOutOfBounds {
            index,
            len: self.len(),
        })?;
        transfer::write_record(record, path.as_ref())
    }

    /// Serialize the header and every slot.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.format.database_size(self.len()));
        bytes.extend_from_slice(&self.header);
        for record in &self.records {
            bytes.extend_from_slice(&MiiParser::encode(record));
        }
        bytes
    }

    /// Write the database to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DatabaseError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_bytes()).map_err(|source| DatabaseError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Index<usize> for MiiDatabase {
    type Output = MiiRecord;

    fn index(&self, index: usize) -> &MiiRecord {
        &self.records[index]
    }
}

impl<'a> IntoIterator for &'a MiiDatabase {
    type Item = &'a MiiRecord;
    type IntoIter = std::slice::Iter<'a, MiiRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Number of slots in a file of `len` bytes.
///
/// The file must be a header plus 1..=max whole slots. Stock console databases
/// store bare char data (`data_size` bytes per entry, no per-slot checksum); a
/// full table of those is rejected rather than sliced at the wrong stride.
fn slot_count(len: usize, format: &MiiFormat) -> Result<usize, DatabaseError> {
    let mismatch = || DatabaseError::SizeMismatch {
        len,
        header_size: format.header_size,
        record_size: format.record_size,
        max_records: format.record_count_max,
    };

    let body = len.saturating_sub(format.header_size);
    if len <= format.header_size || body % format.record_size != 0 {
        return Err(mismatch());
    }

    let slots = body / format.record_size;
    if slots > format.record_count_max {
        return Err(mismatch());
    }

    // Wii U: 3000 bare entries of 92 bytes are also 2875 slots of 96
    if format.data_size != format.record_size
        && body == format.record_count_max * format.data_size
    {
        return Err(mismatch());
    }

    Ok(slots)
}

fn decode_slot(slot: usize, bytes: &[u8], format: &'static MiiFormat) -> MiiRecord {
    let record = match MiiParser::decode_slot(bytes, format) {
        Ok(record) => {
            if let Err(e) = record.verify() {
                tracing::warn!(slot, error = %e, "Mii checksum failed");
            }
            record
        }
        Err(reason) => {
            tracing::warn!(slot, error = %reason, "Malformed Mii slot");
            MiiRecord::placeholder(format, bytes.to_vec(), SlotState::Malformed(reason))
        }
    };
    record.with_slot(slot)
}

#[cfg(not(feature = "parallel"))]
fn decode_slots(body: &[u8], format: &'static MiiFormat) -> Vec<MiiRecord> {
    body.chunks_exact(format.record_size)
        .enumerate()
        .map(|(slot, bytes)| decode_slot(slot, bytes, format))
        .collect()
}

#[cfg(feature = "parallel")]
fn decode_slots(body: &[u8], format: &'static MiiFormat) -> Vec<MiiRecord> {
    use rayon::prelude::*;

    body.par_chunks_exact(format.record_size)
        .enumerate()
        .map(|(slot, bytes)| decode_slot(slot, bytes, format))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::{FavoriteColor, MiiBuilder, THREE_DS_FORMAT, WII_PLAZA_FORMAT, WII_U_FORMAT};
    use tempfile::TempDir;

    fn sample(names: &[&str]) -> MiiDatabase {
        let records = names
            .iter()
            .map(|name| MiiBuilder::new(&THREE_DS_FORMAT).name(*name).build());
        MiiDatabase::from_records(&THREE_DS_FORMAT, records).unwrap()
    }

    #[test]
    fn test_from_records_assigns_slots_and_header() {
        let db = sample(&["A", "B", "C"]);
        assert_eq!(db.len(), 3);
        assert_eq!(db[2].slot(), Some(2));
        assert_eq!(db.header(), b"CFOG\0\0\0\0");
        assert!(db.file_path().is_none());
    }

    #[test]
    fn test_from_records_rejects_other_platform() {
        let record = MiiBuilder::new(&WII_U_FORMAT).name("U").build();
        let err = MiiDatabase::from_records(&THREE_DS_FORMAT, [record]).unwrap_err();
        assert!(matches!(err, DatabaseError::FormatMismatch { slot: 0, .. }));
    }

    #[test]
    fn test_from_records_too_many() {
        let record = MiiBuilder::new(&WII_PLAZA_FORMAT).name("W").build();
        let records = std::iter::repeat_n(record, WII_PLAZA_FORMAT.record_count_max + 1);
        let err = MiiDatabase::from_records(&WII_PLAZA_FORMAT, records).unwrap_err();
        assert!(matches!(err, DatabaseError::SizeMismatch { max_records: 100, .. }));
    }

    #[test]
    fn test_bytes_round_trip() {
        let db = sample(&["A", "B"]);
        let bytes = db.to_bytes();
        assert_eq!(bytes.len(), THREE_DS_FORMAT.database_size(2));

        let reloaded = MiiDatabase::from_bytes(&bytes, &THREE_DS_FORMAT).unwrap();
        assert_eq!(reloaded.records(), db.records());
        assert_eq!(reloaded.to_bytes(), bytes);
    }

    #[test]
    fn test_slot_count_rules() {
        let f = &WII_PLAZA_FORMAT;
        assert_eq!(slot_count(f.database_size(1), f).unwrap(), 1);
        assert_eq!(slot_count(f.database_size(100), f).unwrap(), 100);
        assert!(slot_count(f.database_size(100) + 7, f).is_err());
        assert!(slot_count(f.database_size(101), f).is_err());
        assert!(slot_count(f.header_size, f).is_err());
        assert!(slot_count(f.database_size(3) + 1, f).is_err());
        assert!(slot_count(0, f).is_err());
    }

    #[test]
    fn test_slot_count_rejects_bare_char_data_tables() {
        // Stock RFL_DB.dat length: 74-byte entries plus later sections
        assert!(slot_count(0x1F1E0, &WII_PLAZA_FORMAT).is_err());
        assert!(slot_count(8 + 100 * 92, &THREE_DS_FORMAT).is_err());
        // Divides evenly into 96-byte slots, but is 3000 bare 92-byte entries
        let stock = WII_U_FORMAT.header_size + 3000 * 92;
        assert_eq!((stock - WII_U_FORMAT.header_size) % WII_U_FORMAT.record_size, 0);
        assert!(slot_count(stock, &WII_U_FORMAT).is_err());
        assert_eq!(slot_count(WII_U_FORMAT.database_size(2874), &WII_U_FORMAT).unwrap(), 2874);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_decode_keeps_slot_order() {
        let max = WII_U_FORMAT.record_count_max;
        let records = (0..max).map(|i| {
            MiiBuilder::new(&WII_U_FORMAT)
                .name(format!("Mii {i}"))
                .build()
        });
        let bytes = MiiDatabase::from_records(&WII_U_FORMAT, records)
            .unwrap()
            .to_bytes();
        assert_eq!(bytes.len(), WII_U_FORMAT.database_size(max));

        let db = MiiDatabase::from_bytes(&bytes, &WII_U_FORMAT).unwrap();
        assert_eq!(db.len(), max);
        for (i, record) in db.iter().enumerate() {
            assert_eq!(record.slot(), Some(i));
            assert_eq!(record.name(), format!("Mii {i}"));
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = sample(&["A"]).to_bytes();
        bytes[..4].copy_from_slice(b"RNOD");
        let err = MiiDatabase::from_bytes(&bytes, &THREE_DS_FORMAT).unwrap_err();
        match err {
            DatabaseError::InvalidMagic { expected, found } => {
                assert_eq!(&expected, b"CFOG");
                assert_eq!(found, b"RNOD");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filter_and_iter() {
        let db = sample(&["A", "B", "C"]);
        assert_eq!(db.filter(|_| true).len(), 3);
        assert!(db.filter(|_| false).is_empty());
        assert_eq!(db.filter(|m| m.favorite_color() == FavoriteColor::Red).len(), 3);

        let names: Vec<&str> = (&db).into_iter().map(MiiRecord::name).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(db.iter().count(), db.iter().count());
    }

    #[test]
    fn test_export_out_of_bounds() {
        let dir = TempDir::new().unwrap();
        let db = sample(&["A"]);
        let err = db.export(5, dir.path().join("x.mii")).unwrap_err();
        assert!(matches!(err, TransferError::IndexOutOfBounds { index: 5, len: 1 }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CFL_DB.dat");
        let db = sample(&["A", "B"]);
        db.save(&path).unwrap();

        let loaded = MiiDatabase::load(&path, &THREE_DS_FORMAT).unwrap();
        assert_eq!(loaded.file_path(), Some(path.as_path()));
        assert_eq!(loaded.records(), db.records());
    }

    #[test]
    fn test_load_respects_size_cap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("CFL_DB.dat");
        sample(&["A", "B"]).save(&path).unwrap();

        let config = LoadConfig { max_file_bytes: 16 };
        let err = MiiDatabase::load_with(&path, &THREE_DS_FORMAT, &config).unwrap_err();
        assert!(matches!(err, DatabaseError::Io { .. }));
    }
}

//! Construction of new records.
//!
//! Records are immutable, so new and modified Miis are assembled here: the builder
//! writes each field into a byte image and decodes the result, which keeps built
//! records identical to ones read from disk.

use chrono::NaiveDateTime;
use mii_shared::MiiFormat;

use super::fields::{Birthday, FavoriteColor, Gender, MiiId};
use super::parser::MiiParser;
use super::record::{ChecksumStatus, MiiFields, MiiRecord, SlotState};

/// Builder for [`MiiRecord`] values.
///
/// Only the fields the codec decodes can be set; every other byte of the record
/// (appearance data) is carried over from the base record, or zero.
#[derive(Debug, Clone)]
pub struct MiiBuilder {
    format: &'static MiiFormat,
    base: Vec<u8>,
    fields: MiiFields,
}

impl MiiBuilder {
    /// Start a blank record of `format`.
    pub fn new(format: &'static MiiFormat) -> Self {
        let mut base = vec![0u8; format.record_size];
        for rule in format.version.iter().chain(format.origin) {
            base[rule.offset] = (base[rule.offset] & !rule.mask) | rule.value;
        }
        let fields = MiiFields {
            gender: Gender::Male,
            favorite_color: FavoriteColor::Red,
            created_at: None,
            ..MiiFields::placeholder()
        };
        Self { format, base, fields }
    }

    /// Start from an existing record, keeping its appearance bytes.
    ///
    /// Placeholder records start from a blank image instead.
    pub fn from_record(record: &MiiRecord) -> Self {
        if record.is_placeholder() {
            return Self::new(record.format);
        }
        Self {
            format: record.format,
            base: MiiParser::encode(record),
            fields: record.fields.clone(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.fields.name = name.into();
        self
    }

    pub fn creator_name(mut self, creator_name: impl Into<String>) -> Self {
        self.fields.creator_name = creator_name.into();
        self
    }

    pub fn mii_id(mut self, id: MiiId) -> Self {
        self.fields.mii_id = id;
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.fields.gender = gender;
        self
    }

    pub fn birthday(mut self, birthday: Birthday) -> Self {
        self.fields.birthday = birthday;
        self
    }

    pub fn favorite_color(mut self, color: FavoriteColor) -> Self {
        self.fields.favorite_color = color;
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.fields.is_favorite = is_favorite;
        self
    }

    /// Set the creation time.
    ///
    /// The time is stored in the counter bits of the Mii ID, so it is truncated to
    /// the platform tick and clamped to the counter range.
    pub fn created_at(mut self, at: NaiveDateTime) -> Self {
        self.fields.created_at = Some(at);
        self
    }

    /// Encode the fields and decode the result.
    pub fn build(self) -> MiiRecord {
        let staged = MiiRecord {
            format: self.format,
            slot: None,
            raw_data: self.base,
            fields: self.fields,
            checksum: ChecksumStatus::Valid,
            state: SlotState::Occupied,
        };
        let bytes = MiiParser::encode(&staged);

        match MiiParser::decode_slot(&bytes, self.format) {
            Ok(record) => record,
            Err(reason) => {
                MiiRecord::placeholder(self.format, bytes, SlotState::Malformed(reason))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MalformedReason;
    use chrono::NaiveDate;
    use mii_shared::{THREE_DS_FORMAT, WII_PLAZA_FORMAT, WII_U_FORMAT};

    #[test]
    fn test_builder_sets_fields() {
        let record = MiiBuilder::new(&WII_U_FORMAT)
            .name("Riley")
            .creator_name("Jo")
            .mii_id(MiiId([0x91, 0x02, 0x03, 0x04]))
            .gender(Gender::Female)
            .birthday(Birthday::new(2, 29))
            .favorite_color(FavoriteColor::Purple)
            .favorite(true)
            .build();

        assert_eq!(record.name(), "Riley");
        assert_eq!(record.creator_name(), "Jo");
        assert_eq!(record.mii_id().to_hex(), "91020304");
        assert_eq!(record.birthday().to_string(), "2/29");
        assert_eq!(record.favorite_color(), FavoriteColor::Purple);
        assert!(record.is_favorite());
        assert_eq!(record.checksum_status(), ChecksumStatus::Valid);
        assert_eq!(record.raw_data()[3] & 0x70, 0x40);
    }

    #[test]
    fn test_builder_created_at_truncates_to_tick() {
        let at = NaiveDate::from_ymd_opt(2012, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 9)
            .unwrap();
        let record = MiiBuilder::new(&THREE_DS_FORMAT)
            .name("Tick")
            .mii_id(MiiId([0xC0, 0, 0, 0]))
            .created_at(at)
            .build();

        // 2-second ticks: odd seconds round down
        let expected = NaiveDate::from_ymd_opt(2012, 5, 6)
            .unwrap()
            .and_hms_opt(7, 8, 8)
            .unwrap();
        assert_eq!(record.creation_datetime(), Some(expected));
        // Flag bits above the counter survive
        assert_eq!(record.mii_id().as_bytes()[0] & 0xF0, 0xC0);
    }

    #[test]
    fn test_from_record_keeps_appearance_bytes() {
        let original = MiiBuilder::new(&WII_PLAZA_FORMAT).name("Base").build();
        let mut bytes = MiiParser::encode(&original);
        bytes[0x30] = 0x5A; // appearance byte the codec does not model
        WII_PLAZA_FORMAT.checksum.write(&mut bytes);
        let original = MiiParser::decode(&bytes, &WII_PLAZA_FORMAT).unwrap();

        let renamed = MiiBuilder::from_record(&original).name("Copy").build();
        assert_eq!(renamed.name(), "Copy");
        assert_eq!(renamed.raw_data()[0x30], 0x5A);
        assert_eq!(original.name(), "Base");
    }

    #[test]
    fn test_unsupported_version_builds_malformed() {
        let original = MiiBuilder::new(&THREE_DS_FORMAT).name("Base").build();
        let mut bytes = MiiParser::encode(&original);
        bytes[0] ^= 0x01;
        // Corrupt version with a failing checksum still decodes
        let corrupt = MiiParser::decode(&bytes, &THREE_DS_FORMAT).unwrap();
        assert!(!corrupt.checksum_status().is_valid());

        // Re-encoding repairs the checksum, so the version byte is now authoritative
        let rebuilt = MiiBuilder::from_record(&corrupt).name("Again").build();
        assert!(rebuilt.is_placeholder());
        assert!(matches!(
            rebuilt.state(),
            SlotState::Malformed(MalformedReason::UnsupportedVersion { found: 0x02, .. })
        ));
        assert_eq!(rebuilt.raw_data()[0], 0x02);
    }

    #[test]
    fn test_default_wii_record_is_empty() {
        let record = MiiBuilder::new(&WII_PLAZA_FORMAT).build();
        assert!(record.is_empty_slot());
    }
}

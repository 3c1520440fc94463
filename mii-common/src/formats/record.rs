//! Decoded Mii record.

use std::path::Path;

use chrono::NaiveDateTime;
use mii_shared::{MiiFormat, MiiKind};
use serde::{Deserialize, Serialize};

use super::fields::{Birthday, FavoriteColor, Gender, MiiId};
use super::parser::MiiParser;
use crate::error::{DecodeError, MalformedReason, TransferError};

/// Display name used when a record has no name.
pub const UNNAMED: &str = "Unnamed";
/// Display name used when a record has no creator name.
pub const UNKNOWN_CREATOR: &str = "Unknown";

/// Result of comparing the stored checksum with the recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumStatus {
    Valid,
    Invalid { stored: u16, computed: u16 },
    /// The input ended before the checksum (bare char data import)
    Missing,
}

impl ChecksumStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChecksumStatus::Valid)
    }
}

/// What a database slot held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Occupied,
    /// Data region is all zero
    Empty,
    /// Bytes could not be decoded; fields are placeholders
    Malformed(MalformedReason),
}

/// The decoded, platform-independent fields of a Mii.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiiFields {
    pub name: String,
    pub creator_name: String,
    pub mii_id: MiiId,
    pub gender: Gender,
    pub birthday: Birthday,
    pub favorite_color: FavoriteColor,
    pub is_favorite: bool,
    /// `None` for placeholder slots
    pub created_at: Option<NaiveDateTime>,
}

impl MiiFields {
    /// Field values reported for empty and malformed slots
    pub fn placeholder() -> Self {
        Self {
            name: String::new(),
            creator_name: String::new(),
            mii_id: MiiId::default(),
            gender: Gender::Unknown,
            birthday: Birthday::Unset,
            favorite_color: FavoriteColor::Unknown,
            is_favorite: false,
            created_at: None,
        }
    }
}

/// One Mii, decoded from a database slot or a standalone file.
///
/// Records are immutable; use [`crate::MiiBuilder`] to derive a modified copy.
#[derive(Debug, Clone, PartialEq)]
pub struct MiiRecord {
    pub(crate) format: &'static MiiFormat,
    pub(crate) slot: Option<usize>,
    pub(crate) raw_data: Vec<u8>,
    pub(crate) fields: MiiFields,
    pub(crate) checksum: ChecksumStatus,
    pub(crate) state: SlotState,
}

impl MiiRecord {
    /// Placeholder for a slot that holds no decodable Mii
    pub(crate) fn placeholder(
        format: &'static MiiFormat,
        raw_data: Vec<u8>,
        state: SlotState,
    ) -> Self {
        Self {
            format,
            slot: None,
            raw_data,
            fields: MiiFields::placeholder(),
            checksum: ChecksumStatus::Valid,
            state,
        }
    }

    pub(crate) fn with_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    /// Format that produced this record
    pub fn format(&self) -> &'static MiiFormat {
        self.format
    }

    pub fn kind(&self) -> MiiKind {
        self.format.kind
    }

    /// Whether the Wii layout and timestamp rules apply
    pub fn is_wii_mii(&self) -> bool {
        self.format.is_wii()
    }

    /// Database slot index, `None` for standalone records
    pub fn slot(&self) -> Option<usize> {
        self.slot
    }

    /// Bytes exactly as read
    pub fn raw_data(&self) -> &[u8] {
        &self.raw_data
    }

    pub fn fields(&self) -> &MiiFields {
        &self.fields
    }

    pub fn name(&self) -> &str {
        &self.fields.name
    }

    /// Name, or "Unnamed" when empty
    pub fn display_name(&self) -> &str {
        if self.fields.name.is_empty() {
            UNNAMED
        } else {
            &self.fields.name
        }
    }

    pub fn creator_name(&self) -> &str {
        &self.fields.creator_name
    }

    /// Creator name, or "Unknown" when empty
    pub fn display_creator(&self) -> &str {
        if self.fields.creator_name.is_empty() {
            UNKNOWN_CREATOR
        } else {
            &self.fields.creator_name
        }
    }

    pub fn mii_id(&self) -> MiiId {
        self.fields.mii_id
    }

    pub fn gender(&self) -> Gender {
        self.fields.gender
    }

    pub fn birthday(&self) -> Birthday {
        self.fields.birthday
    }

    pub fn favorite_color(&self) -> FavoriteColor {
        self.fields.favorite_color
    }

    pub fn is_favorite(&self) -> bool {
        self.fields.is_favorite
    }

    /// Creation time derived from the Mii ID counter
    pub fn creation_datetime(&self) -> Option<NaiveDateTime> {
        self.fields.created_at
    }

    pub fn checksum_status(&self) -> ChecksumStatus {
        self.checksum
    }

    pub fn state(&self) -> &SlotState {
        &self.state
    }

    /// Empty or malformed slot
    pub fn is_placeholder(&self) -> bool {
        self.state != SlotState::Occupied
    }

    pub fn is_empty_slot(&self) -> bool {
        self.state == SlotState::Empty
    }

    /// Surface a stored checksum mismatch as an error.
    pub fn verify(&self) -> Result<(), DecodeError> {
        match self.checksum {
            ChecksumStatus::Invalid { stored, computed } => {
                Err(DecodeError::ChecksumInvalid { stored, computed })
            }
            ChecksumStatus::Valid | ChecksumStatus::Missing => Ok(()),
        }
    }

    /// Canonical standalone file bytes (`record_size + standalone_padding`)
    pub fn to_bytes(&self) -> Vec<u8> {
        MiiParser::encode_standalone(self)
    }

    /// Write this record to a standalone file.
    pub fn export(&self, path: impl AsRef<Path>) -> Result<(), TransferError> {
        crate::transfer::write_record(self, path.as_ref())
    }

    /// Serializable view for reporting layers
    pub fn summary(&self) -> MiiSummary {
        MiiSummary {
            platform: self.format.kind,
            slot: self.slot,
            name: self.display_name().to_string(),
            creator_name: self.display_creator().to_string(),
            mii_id: self.fields.mii_id.to_hex(),
            gender: self.fields.gender.to_string(),
            birthday: self.fields.birthday.to_string(),
            favorite_color: self.fields.favorite_color.to_string(),
            is_favorite: self.fields.is_favorite,
            created_at: self.fields.created_at,
            checksum_valid: self.checksum.is_valid(),
            placeholder: self.is_placeholder(),
        }
    }
}

/// Flat, display-ready description of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiiSummary {
    pub platform: MiiKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<usize>,
    pub name: String,
    pub creator_name: String,
    pub mii_id: String,
    pub gender: String,
    pub birthday: String,
    pub favorite_color: String,
    pub is_favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    pub checksum_valid: bool,
    pub placeholder: bool,
}

//! Mii record codec.
//!
//! `MiiParser` turns a byte block into a [`MiiRecord`] and back. Every offset, bit
//! width, text encoding, checksum range and timestamp rule comes from the
//! [`MiiFormat`] passed in, so the decode and encode paths are the same for all
//! platforms.
//!
//! # Decode outcomes
//!
//! ```text
//! shorter than data_size        -> Err(MalformedRecord(Truncated))
//! data region all zero          -> Ok(placeholder, SlotState::Empty)
//! version mismatch, valid CRC   -> Err(MalformedRecord(UnsupportedVersion))
//! version mismatch, no CRC      -> Err(MalformedRecord(UnsupportedVersion))
//! checksum mismatch             -> Ok(record, ChecksumStatus::Invalid)
//! input ends before checksum    -> Ok(record, ChecksumStatus::Missing)
//! ```

use mii_shared::{ALL_FORMATS, MiiFormat};

use super::fields::{Birthday, FavoriteColor, Gender, MiiId};
use super::record::{ChecksumStatus, MiiFields, MiiRecord, SlotState};
use super::text::{decode_text, encode_text};
use crate::error::{DecodeError, MalformedReason};

/// Stateless record codec.
pub struct MiiParser;

impl MiiParser {
    /// Decode a record of a known format.
    ///
    /// Trailing bytes beyond the checksum are kept in `raw_data` but ignored.
    /// A checksum mismatch does not fail the decode; it is reported through
    /// [`MiiRecord::checksum_status`] and [`MiiRecord::verify`].
    pub fn decode(bytes: &[u8], format: &'static MiiFormat) -> Result<MiiRecord, DecodeError> {
        Ok(Self::decode_slot(bytes, format)?)
    }

    /// Decode for database slots, where the only failure is a malformed record.
    pub(crate) fn decode_slot(
        bytes: &[u8],
        format: &'static MiiFormat,
    ) -> Result<MiiRecord, MalformedReason> {
        if bytes.len() < format.data_size {
            return Err(MalformedReason::Truncated {
                expected: format.data_size,
                actual: bytes.len(),
            });
        }

        if is_blank(&bytes[..format.data_size]) {
            return Ok(MiiRecord::placeholder(format, bytes.to_vec(), SlotState::Empty));
        }

        // A wrong version byte under a failing checksum is corruption, not a newer
        // revision of the char data.
        let checksum = checksum_status(bytes, format);
        if let Some(version) = format.version
            && !version.matches(bytes)
            && !matches!(checksum, ChecksumStatus::Invalid { .. })
        {
            return Err(MalformedReason::UnsupportedVersion {
                expected: version.value,
                found: version.read(bytes).unwrap_or_default(),
            });
        }

        let layout = &format.layout;
        let flags = format.byte_order.read_u16(bytes, layout.flags_word);

        let mut id = [0u8; 4];
        id.copy_from_slice(&bytes[layout.mii_id.offset..layout.mii_id.end()]);

        let counter = format
            .timestamp
            .byte_order
            .read_u32(bytes, format.timestamp.offset);

        let fields = MiiFields {
            name: decode_text(bytes, &layout.name),
            creator_name: decode_text(bytes, &layout.creator_name),
            mii_id: MiiId(id),
            gender: Gender::from_raw(layout.gender.extract(flags)),
            birthday: Birthday::from_raw(
                layout.birth_month.extract(flags),
                layout.birth_day.extract(flags),
            ),
            favorite_color: FavoriteColor::from_raw(layout.favorite_color.extract(flags)),
            is_favorite: layout.favorite.extract(flags) != 0,
            created_at: Some(format.timestamp.decode(counter)),
        };

        Ok(MiiRecord {
            format,
            slot: None,
            raw_data: bytes.to_vec(),
            fields,
            checksum,
            state: SlotState::Occupied,
        })
    }

    /// Decode a record and reject it when its checksum does not match.
    pub fn decode_strict(
        bytes: &[u8],
        format: &'static MiiFormat,
    ) -> Result<MiiRecord, DecodeError> {
        let record = Self::decode(bytes, format)?;
        record.verify()?;
        Ok(record)
    }

    /// Decode a standalone record, detecting its format.
    ///
    /// Formats are tried most specific first. A candidate must be long enough and
    /// pass its version and origin checks; the first candidate whose checksum
    /// validates wins, otherwise the first candidate that decodes at all.
    pub fn parse(bytes: &[u8]) -> Result<MiiRecord, DecodeError> {
        let mut fallback = None;
        for format in ALL_FORMATS {
            if bytes.len() < format.data_size
                || !format.origin.iter().all(|rule| rule.matches(bytes))
            {
                continue;
            }
            let Ok(record) = Self::decode(bytes, format) else {
                continue;
            };
            if record.is_placeholder() {
                continue;
            }
            if record.checksum_status().is_valid() {
                return Ok(record);
            }
            if fallback.is_none() {
                fallback = Some(record);
            }
        }
        fallback.ok_or(DecodeError::MalformedRecord(MalformedReason::UnknownFormat))
    }

    /// Encode a record into its in-database form (exactly `record_size` bytes).
    ///
    /// Fields are written over a copy of `raw_data`, so bytes the codec does not
    /// model survive unchanged; fields holding an unknown value keep their raw
    /// bits. The checksum is regenerated. Placeholders are returned verbatim.
    pub fn encode(record: &MiiRecord) -> Vec<u8> {
        let format = record.format;
        let mut bytes = record.raw_data.clone();
        bytes.resize(format.record_size, 0);

        if record.is_placeholder() {
            return bytes;
        }

        let layout = &format.layout;
        let fields = &record.fields;

        let mut flags = format.byte_order.read_u16(&bytes, layout.flags_word);
        if let Some(raw) = fields.gender.to_raw() {
            flags = layout.gender.insert(flags, raw);
        }
        if let Some((month, day)) = fields.birthday.to_raw() {
            flags = layout.birth_month.insert(flags, month);
            flags = layout.birth_day.insert(flags, day);
        }
        if let Some(raw) = fields.favorite_color.to_raw() {
            flags = layout.favorite_color.insert(flags, raw);
        }
        flags = layout.favorite.insert(flags, u16::from(fields.is_favorite));
        format.byte_order.write_u16(&mut bytes, layout.flags_word, flags);

        encode_text(&mut bytes, &layout.name, &fields.name);
        encode_text(&mut bytes, &layout.creator_name, &fields.creator_name);
        bytes[layout.mii_id.offset..layout.mii_id.end()].copy_from_slice(fields.mii_id.as_bytes());

        // The counter shares bytes with the Mii ID on every built-in format, so the
        // time is applied on top of the ID just written.
        if let Some(created_at) = fields.created_at {
            let rule = format.timestamp;
            let previous = rule.byte_order.read_u32(&bytes, rule.offset);
            rule.byte_order
                .write_u32(&mut bytes, rule.offset, rule.encode(created_at, previous));
        }

        format.checksum.write(&mut bytes);
        bytes
    }

    /// Encode a record into its standalone file form
    /// (`record_size + standalone_padding` bytes, padding zeroed).
    pub fn encode_standalone(record: &MiiRecord) -> Vec<u8> {
        let mut bytes = Self::encode(record);
        bytes.resize(record.format.standalone_size(), 0);
        bytes
    }
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == 0)
}

fn checksum_status(bytes: &[u8], format: &MiiFormat) -> ChecksumStatus {
    let Some(stored) = format.checksum.read_stored(bytes) else {
        return ChecksumStatus::Missing;
    };
    let computed = format.checksum.compute(bytes);
    if stored == computed {
        ChecksumStatus::Valid
    } else {
        ChecksumStatus::Invalid { stored, computed }
    }
}

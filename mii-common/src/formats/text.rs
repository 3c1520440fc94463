//! Fixed-width UTF-16 text fields.

use mii_shared::{TextEncoding, TextField};

fn read_unit(encoding: TextEncoding, pair: [u8; 2]) -> u16 {
    match encoding {
        TextEncoding::Utf16Be => u16::from_be_bytes(pair),
        TextEncoding::Utf16Le => u16::from_le_bytes(pair),
    }
}

fn unit_bytes(encoding: TextEncoding, unit: u16) -> [u8; 2] {
    match encoding {
        TextEncoding::Utf16Be => unit.to_be_bytes(),
        TextEncoding::Utf16Le => unit.to_le_bytes(),
    }
}

/// Decode a text field up to the first NUL unit.
///
/// Unpaired surrogates become U+FFFD.
pub fn decode_text(record: &[u8], field: &TextField) -> String {
    let raw = &record[field.offset..field.offset + field.byte_len()];
    let units: Vec<u16> = raw
        .chunks_exact(2)
        .map(|pair| read_unit(field.encoding, [pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Encode `text` into a text field, NUL-padding the remainder.
///
/// Text longer than the field is cut at the last whole character that fits.
pub fn encode_text(record: &mut [u8], field: &TextField, text: &str) {
    let mut units = Vec::with_capacity(field.units);
    let mut buf = [0u16; 2];
    for ch in text.chars() {
        let encoded = ch.encode_utf16(&mut buf);
        if units.len() + encoded.len() > field.units {
            break;
        }
        units.extend_from_slice(encoded);
    }
    units.resize(field.units, 0);

    let target = &mut record[field.offset..field.offset + field.byte_len()];
    for (slot, unit) in target.chunks_exact_mut(2).zip(units) {
        slot.copy_from_slice(&unit_bytes(field.encoding, unit));
    }
}

//! Small value types decoded from a Mii record.
//!
//! Every enumeration has an explicit unknown variant: cosmetic fields never abort a decode.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Mii gender bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    /// Placeholder slots carry no gender
    Unknown,
}

impl Gender {
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            0 => Gender::Male,
            1 => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    /// Raw bit value, `None` for [`Gender::Unknown`]
    pub fn to_raw(self) -> Option<u16> {
        match self {
            Gender::Male => Some(0),
            Gender::Female => Some(1),
            Gender::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Favorite color palette, in raw value order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FavoriteColor {
    Red,
    Orange,
    Yellow,
    LightGreen,
    Green,
    Blue,
    LightBlue,
    Pink,
    Purple,
    Brown,
    White,
    Black,
    /// Raw value outside the palette, or a placeholder slot
    Unknown,
}

impl FavoriteColor {
    /// The twelve palette entries
    pub const PALETTE: [FavoriteColor; 12] = [
        FavoriteColor::Red,
        FavoriteColor::Orange,
        FavoriteColor::Yellow,
        FavoriteColor::LightGreen,
        FavoriteColor::Green,
        FavoriteColor::Blue,
        FavoriteColor::LightBlue,
        FavoriteColor::Pink,
        FavoriteColor::Purple,
        FavoriteColor::Brown,
        FavoriteColor::White,
        FavoriteColor::Black,
    ];

    pub fn from_raw(raw: u16) -> Self {
        Self::PALETTE
            .get(raw as usize)
            .copied()
            .unwrap_or(FavoriteColor::Unknown)
    }

    /// Palette index, `None` for [`FavoriteColor::Unknown`]
    pub fn to_raw(self) -> Option<u16> {
        Self::PALETTE.iter().position(|c| *c == self).map(|i| i as u16)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteColor::Red => "Red",
            FavoriteColor::Orange => "Orange",
            FavoriteColor::Yellow => "Yellow",
            FavoriteColor::LightGreen => "Light Green",
            FavoriteColor::Green => "Green",
            FavoriteColor::Blue => "Blue",
            FavoriteColor::LightBlue => "Light Blue",
            FavoriteColor::Pink => "Pink",
            FavoriteColor::Purple => "Purple",
            FavoriteColor::Brown => "Brown",
            FavoriteColor::White => "White",
            FavoriteColor::Black => "Black",
            FavoriteColor::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for FavoriteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Birthday month and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Birthday {
    /// Month or day is zero
    Unset,
    /// A real calendar day (February 29 allowed)
    Date { month: u8, day: u8 },
    /// Raw values that name no calendar day, e.g. month 14 or April 31
    Unknown { month: u8, day: u8 },
}

impl Birthday {
    /// Build a birthday, validating it against a leap-year calendar.
    pub fn new(month: u8, day: u8) -> Self {
        Self::from_raw(u16::from(month), u16::from(day))
    }

    pub fn from_raw(month: u16, day: u16) -> Self {
        if month == 0 || day == 0 {
            return Birthday::Unset;
        }
        // 2000 is a leap year, so February 29 validates
        match NaiveDate::from_ymd_opt(2000, u32::from(month), u32::from(day)) {
            Some(_) => Birthday::Date { month: month as u8, day: day as u8 },
            None => Birthday::Unknown { month: month as u8, day: day as u8 },
        }
    }

    /// Raw (month, day) to write back, `None` for [`Birthday::Unknown`]
    pub fn to_raw(self) -> Option<(u16, u16)> {
        match self {
            Birthday::Unset => Some((0, 0)),
            Birthday::Date { month, day } => Some((u16::from(month), u16::from(day))),
            Birthday::Unknown { .. } => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, Birthday::Date { .. })
    }
}

impl fmt::Display for Birthday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Birthday::Unset => f.write_str("Not set"),
            Birthday::Date { month, day } => write!(f, "{}/{}", month, day),
            Birthday::Unknown { .. } => f.write_str("Unknown"),
        }
    }
}

/// Console-unique Mii identifier.
///
/// The low 28 bits of the big-endian value also encode the creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MiiId(pub [u8; 4]);

impl MiiId {
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Uppercase hex rendering (e.g., "8A2B3C4D")
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl fmt::Display for MiiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorite_color_raw_values() {
        assert_eq!(FavoriteColor::from_raw(0), FavoriteColor::Red);
        assert_eq!(FavoriteColor::from_raw(11), FavoriteColor::Black);
        assert_eq!(FavoriteColor::from_raw(12), FavoriteColor::Unknown);
        assert_eq!(FavoriteColor::from_raw(15), FavoriteColor::Unknown);
        for (i, color) in FavoriteColor::PALETTE.iter().enumerate() {
            assert_eq!(color.to_raw(), Some(i as u16));
        }
        assert_eq!(FavoriteColor::Unknown.to_raw(), None);
        assert_eq!(FavoriteColor::LightBlue.to_string(), "Light Blue");
    }

    #[test]
    fn test_birthday_validation() {
        assert_eq!(Birthday::from_raw(0, 12), Birthday::Unset);
        assert_eq!(Birthday::from_raw(3, 0), Birthday::Unset);
        assert_eq!(Birthday::new(2, 29), Birthday::Date { month: 2, day: 29 });
        assert_eq!(Birthday::new(4, 31), Birthday::Unknown { month: 4, day: 31 });
        assert_eq!(Birthday::from_raw(14, 3), Birthday::Unknown { month: 14, day: 3 });
        assert_eq!(Birthday::Unknown { month: 14, day: 3 }.to_raw(), None);
        assert_eq!(Birthday::Unset.to_raw(), Some((0, 0)));
    }

    #[test]
    fn test_birthday_display() {
        assert_eq!(Birthday::new(12, 25).to_string(), "12/25");
        assert_eq!(Birthday::Unset.to_string(), "Not set");
        assert_eq!(Birthday::new(13, 1).to_string(), "Unknown");
    }

    #[test]
    fn test_gender() {
        assert_eq!(Gender::from_raw(0), Gender::Male);
        assert_eq!(Gender::from_raw(1), Gender::Female);
        assert_eq!(Gender::from_raw(2), Gender::Unknown);
        assert_eq!(Gender::Female.to_raw(), Some(1));
        assert_eq!(Gender::Female.to_string(), "Female");
    }

    #[test]
    fn test_mii_id_hex() {
        let id = MiiId([0x8A, 0x2B, 0x3C, 0x0D]);
        assert_eq!(id.to_hex(), "8A2B3C0D");
        assert!(!id.is_zero());
        assert!(MiiId::default().is_zero());
    }
}

//! CRC-16 used by Mii store data.
//!
//! All built-in formats protect their records with CRC-16/XMODEM
//! (polynomial 0x1021, initial value 0, no reflection, no final xor).

use crc::{CRC_16_XMODEM, Crc};

const XMODEM: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute CRC-16/XMODEM over `data`.
pub fn crc16_xmodem(data: &[u8]) -> u16 {
    XMODEM.checksum(data)
}

#![allow(dead_code)]

use xcomfort_engine::Transmission;

pub const SWITCH: u8 = 0x0a;
pub const REQUEST: u8 = 0x0b;
pub const DIM: u8 = 0x0d;
pub const JALO: u8 = 0x0e;

/// TX event code of an emitted telegram.
pub fn event_code(tx: &Transmission) -> u8 {
    tx.frame[3]
}

/// The 32-bit value field of an emitted telegram.
pub fn value(tx: &Transmission) -> i32 {
    i32::from_le_bytes([tx.frame[4], tx.frame[5], tx.frame[6], tx.frame[7]])
}

/// Sequence number from the upper nibble of the trailing byte.
pub fn sequence_number(tx: &Transmission) -> u8 {
    tx.frame[8] >> 4
}

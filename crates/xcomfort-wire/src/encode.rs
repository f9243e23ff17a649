//! Outbound telegram constructors.

use crate::{frame_type, ConfigType, ShutterCommand, TxEvent};

/// Length of an outbound `TX` telegram.
pub const TX_FRAME_LEN: usize = 9;

/// Length of an outbound `CONFIG` telegram.
pub const CONFIG_FRAME_LEN: usize = 4;

fn tx_frame(datapoint: u8, event: TxEvent, value: i32, message_id: u8) -> [u8; TX_FRAME_LEN] {
    let mut frame = [0u8; TX_FRAME_LEN];
    frame[0] = TX_FRAME_LEN as u8;
    frame[1] = frame_type::TX;
    frame[2] = datapoint;
    frame[3] = event.code();
    frame[4..8].copy_from_slice(&value.to_le_bytes());
    // Sequence number in the upper nibble, priority 0 in the lower.
    frame[8] = (message_id & 0x0f) << 4;
    frame
}

/// Switch a datapoint on or off.
pub fn switch(datapoint: u8, on: bool, message_id: u8) -> [u8; TX_FRAME_LEN] {
    tx_frame(datapoint, TxEvent::Switch, i32::from(on), message_id)
}

/// Set a dim level in percent. The low byte of the value field is the
/// 0x40 "set percent" tag; the level itself sits one byte up.
pub fn dim(datapoint: u8, percent: i32, message_id: u8) -> [u8; TX_FRAME_LEN] {
    tx_frame(datapoint, TxEvent::Dim, (percent << 8) | 0x40, message_id)
}

/// Drive a shutter datapoint.
pub fn jalo(datapoint: u8, command: ShutterCommand, message_id: u8) -> [u8; TX_FRAME_LEN] {
    tx_frame(datapoint, TxEvent::Jalo, i32::from(command.raw()), message_id)
}

/// Ask a datapoint to report its current value with an `MSG_STATUS`.
pub fn request(datapoint: u8, message_id: u8) -> [u8; TX_FRAME_LEN] {
    tx_frame(datapoint, TxEvent::Request, 0, message_id)
}

/// Control-plane command to the stick itself.
pub fn config(ctype: ConfigType, mode: u8) -> [u8; CONFIG_FRAME_LEN] {
    [
        CONFIG_FRAME_LEN as u8,
        frame_type::CONFIG,
        ctype.code(),
        mode,
    ]
}

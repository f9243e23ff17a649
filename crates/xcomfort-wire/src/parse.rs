//! Inbound frame parsing.

use crate::{frame_type, BatteryLevel, RxDataType, RxEvent, TxError};

/// Status sub-types seen in `STATUS` frames. The stick answers config
/// commands with the matching sub-type; OK/ERROR carry delivery acks.
mod status_type {
    pub const ERROR: u8 = 0x09;
    pub const TIMEACCOUNT: u8 = 0x0a;
    pub const COUNTER_RX: u8 = 0x0b;
    pub const COUNTER_TX: u8 = 0x0c;
    pub const SERIAL: u8 = 0x0e;
    pub const RELEASE: u8 = 0x1b;
    pub const OK: u8 = 0x1c;
    pub const SEND_RFSEQNO: u8 = 0x1e;
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Event from a datapoint.
    Rx {
        event: RxEvent,
        datapoint: u8,
        data_type: RxDataType,
        value: i32,
        rssi: u8,
        battery: BatteryLevel,
    },
    /// Delivery confirmation (or rejection) for a previously sent telegram.
    ///
    /// `message_id` is the sequence number from the upper nibble of the
    /// carrying byte; error acks do not all carry one.
    Ack {
        success: bool,
        message_id: Option<u8>,
        error: Option<TxError>,
    },
    /// Serial number of the stick.
    SerialNumber(u32),
    /// Hardware/firmware revision record.
    Release {
        status: u8,
        rf_major: u8,
        rf_minor: u8,
        usb_major: u8,
        usb_minor: u8,
    },
    CounterRx(u32),
    CounterTx(u32),
    /// Remaining duty-cycle budget in percent.
    TimeAccount(u8),
    /// Whether the stick appends RF sequence numbers to RX frames.
    RfSequenceFlag(u8),
    /// Firmware version record.
    Firmware { major: u8, minor: u8 },
    /// Status sub-type without decode rules; payload kept for logging.
    UnknownStatus { stype: u8, payload: Vec<u8> },
    /// Frame type without decode rules.
    UnknownFrame { frame_type: u8, size: u8 },
}

/// Decode one inbound frame.
///
/// Returns `None` for anything too short to carry its own declared length;
/// such frames are silently discarded by the caller.
pub fn parse(buf: &[u8]) -> Option<Frame> {
    if buf.len() < 2 || buf.len() < buf[0] as usize {
        return None;
    }

    match buf[1] {
        frame_type::RX => parse_rx(buf),
        frame_type::STATUS => parse_status(buf),
        frame_type::FW => parse_fw(buf),
        other => Some(Frame::UnknownFrame {
            frame_type: other,
            size: buf[0],
        }),
    }
}

fn read_i32_le(buf: &[u8]) -> i32 {
    i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}

fn parse_rx(buf: &[u8]) -> Option<Frame> {
    if buf.len() < 12 {
        return None;
    }

    Some(Frame::Rx {
        datapoint: buf[2],
        event: RxEvent::from_raw(buf[3]),
        data_type: RxDataType::from_raw(buf[4]),
        value: read_i32_le(&buf[5..9]),
        rssi: buf[10],
        battery: BatteryLevel::from_raw(buf[11]),
    })
}

fn parse_status(buf: &[u8]) -> Option<Frame> {
    if buf.len() < 8 {
        return None;
    }

    let stype = buf[2];
    let status = buf[3];

    let frame = match stype {
        // The serial number is the one big-endian field on the wire.
        status_type::SERIAL => {
            Frame::SerialNumber(u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]))
        }
        status_type::RELEASE => Frame::Release {
            status,
            rf_major: buf[4],
            rf_minor: buf[5],
            usb_major: buf[6],
            usb_minor: buf[7],
        },
        status_type::COUNTER_RX => Frame::CounterRx(read_i32_le(&buf[4..8]) as u32),
        status_type::COUNTER_TX => Frame::CounterTx(read_i32_le(&buf[4..8]) as u32),
        status_type::TIMEACCOUNT => Frame::TimeAccount(buf[4]),
        status_type::SEND_RFSEQNO => Frame::RfSequenceFlag(status),
        status_type::OK => Frame::Ack {
            success: true,
            message_id: Some(buf[4] >> 4),
            error: None,
        },
        status_type::ERROR => {
            let error = TxError::from_raw(status);
            // Which byte carries the originating sequence number depends on
            // the error; most negative acks carry none at all.
            let message_id = match error {
                Some(TxError::NoAck) => Some(buf[4] >> 4),
                Some(TxError::General) | Some(TxError::UnknownCommand) => Some(buf[5] >> 4),
                _ => None,
            };
            Frame::Ack {
                success: false,
                message_id,
                error,
            }
        }
        other => Frame::UnknownStatus {
            stype: other,
            payload: buf[2..(buf[0] as usize).max(2)].to_vec(),
        },
    };

    Some(frame)
}

fn parse_fw(buf: &[u8]) -> Option<Frame> {
    if buf.len() < 13 {
        return None;
    }

    Some(Frame::Firmware {
        major: buf[11],
        minor: buf[12],
    })
}

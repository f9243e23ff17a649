//! Wire format of the Eaton CKOZ-00/14 ("xComfort") USB communication stick.
//!
//! Frames are byte-packed and little-endian on both USB directions. The first
//! byte carries the total frame length, the second the frame type; the rest of
//! the layout depends on the type. This crate contains the pure codec only:
//! [`encode`] builds outbound telegrams into fixed-size buffers, [`parse`]
//! turns inbound byte slices into typed [`Frame`]s. Nothing here performs I/O
//! or keeps state.

mod encode;
mod parse;

pub use encode::{config, dim, jalo, request, switch, CONFIG_FRAME_LEN, TX_FRAME_LEN};
pub use parse::{parse, Frame};

/// Frame type discriminators (second byte of every frame).
pub mod frame_type {
    /// Outbound event to a datapoint.
    pub const TX: u8 = 0xb1;
    /// Outbound control-plane command to the stick itself.
    pub const CONFIG: u8 = 0xb2;
    /// Inbound event from a datapoint.
    pub const RX: u8 = 0xc1;
    /// Inbound control-plane response, including delivery acks.
    pub const STATUS: u8 = 0xc3;
    /// Inbound firmware version record.
    pub const FW: u8 = 0xd1;
}

/// Events that can be sent to a datapoint.
///
/// The MRF protocol defines many more transmit events; these four are the
/// only ones a gateway emits, so the others are unrepresentable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxEvent {
    /// Boolean on/off.
    Switch,
    /// Ask the datapoint to report its current value with an `MSG_STATUS`.
    Request,
    /// Set a dim level in percent.
    Dim,
    /// Shutter/jalousie movement, see [`ShutterCommand`].
    Jalo,
}

impl TxEvent {
    pub fn code(self) -> u8 {
        match self {
            TxEvent::Switch => 0x0a,
            TxEvent::Request => 0x0b,
            TxEvent::Dim => 0x0d,
            TxEvent::Jalo => 0x0e,
        }
    }
}

/// Events reported by datapoints in `RX` frames.
///
/// Only [`RxEvent::Status`] has gateway semantics; everything else is
/// surfaced for logging under its MRF protocol name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxEvent {
    Ack,
    StayOnline,
    Allive,
    GetOffline,
    GetEeprom,
    SetEeprom,
    GetCrc,
    Time,
    Date,
    Paket,
    Kill,
    Factory,
    On,
    Off,
    SwitchOn,
    SwitchOff,
    UpPressed,
    UpReleased,
    DownPressed,
    DownReleased,
    Pwm,
    Forced,
    SingleOn,
    Toggle,
    Value,
    TooCold,
    TooWarm,
    Status,
    StatusAppl,
    StatusReqAppl,
    BasicMode,
    Unknown(u8),
}

impl RxEvent {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => RxEvent::Ack,
            0x09 => RxEvent::StayOnline,
            0x11 => RxEvent::Allive,
            0x18 => RxEvent::GetOffline,
            0x30 => RxEvent::GetEeprom,
            0x31 => RxEvent::SetEeprom,
            0x32 => RxEvent::GetCrc,
            0x37 => RxEvent::Time,
            0x38 => RxEvent::Date,
            0x39 => RxEvent::Paket,
            0x43 => RxEvent::Kill,
            0x44 => RxEvent::Factory,
            0x50 => RxEvent::On,
            0x51 => RxEvent::Off,
            0x52 => RxEvent::SwitchOn,
            0x53 => RxEvent::SwitchOff,
            0x54 => RxEvent::UpPressed,
            0x55 => RxEvent::UpReleased,
            0x56 => RxEvent::DownPressed,
            0x57 => RxEvent::DownReleased,
            0x59 => RxEvent::Pwm,
            0x5a => RxEvent::Forced,
            0x5b => RxEvent::SingleOn,
            0x61 => RxEvent::Toggle,
            0x62 => RxEvent::Value,
            0x63 => RxEvent::TooCold,
            0x64 => RxEvent::TooWarm,
            0x70 => RxEvent::Status,
            0x71 => RxEvent::StatusAppl,
            0x72 => RxEvent::StatusReqAppl,
            0x80 => RxEvent::BasicMode,
            other => RxEvent::Unknown(other),
        }
    }

    /// Protocol name of the event, as the MRF documentation spells it.
    pub fn name(self) -> &'static str {
        match self {
            RxEvent::Ack => "MSG_ACK",
            RxEvent::StayOnline => "MSG_STAY_ONLINE",
            RxEvent::Allive => "MSG_ALLIVE",
            RxEvent::GetOffline => "MSG_GET_OFFLINE",
            RxEvent::GetEeprom => "MSG_GET_EEPROM",
            RxEvent::SetEeprom => "MSG_SET_EEPROM",
            RxEvent::GetCrc => "MSG_GET_CRC",
            RxEvent::Time => "MSG_TIME",
            RxEvent::Date => "MSG_DATE",
            RxEvent::Paket => "MSG_PAKET",
            RxEvent::Kill => "MSG_KILL",
            RxEvent::Factory => "MSG_FACTORY",
            RxEvent::On => "MSG_ON",
            RxEvent::Off => "MSG_OFF",
            RxEvent::SwitchOn => "MSG_SWITCH_ON",
            RxEvent::SwitchOff => "MSG_SWITCH_OFF",
            RxEvent::UpPressed => "MSG_UP_PRESSED",
            RxEvent::UpReleased => "MSG_UP_RELEASED",
            RxEvent::DownPressed => "MSG_DOWN_PRESSED",
            RxEvent::DownReleased => "MSG_DOWN_RELEASED",
            RxEvent::Pwm => "MSG_PWM",
            RxEvent::Forced => "MSG_FORCED",
            RxEvent::SingleOn => "MSG_SINGLE_ON",
            RxEvent::Toggle => "MSG_TOGGLE",
            RxEvent::Value => "MSG_VALUE",
            RxEvent::TooCold => "MSG_ZU_KALT",
            RxEvent::TooWarm => "MSG_ZU_WARM",
            RxEvent::Status => "MSG_STATUS",
            RxEvent::StatusAppl => "MSG_STATUS_APPL",
            RxEvent::StatusReqAppl => "MSG_STATUS_REQ_APPL",
            RxEvent::BasicMode => "MSG_BASIC_MODE",
            RxEvent::Unknown(_) => "unknown",
        }
    }
}

/// Data type tag carried in `RX` frames. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxDataType {
    NoData,
    Percent,
    Uint8,
    Int16OnePoint,
    Float,
    Uint16,
    Uint32,
    Uint32OnePoint,
    Uint32TwoPoint,
    Uint32ThreePoint,
    RcData,
    Time,
    Date,
    Uint16OnePoint,
    Uint16TwoPoint,
    Uint16ThreePoint,
    Rosetta,
    HrvOut,
    Unknown(u8),
}

impl RxDataType {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => RxDataType::NoData,
            0x01 => RxDataType::Percent,
            0x02 => RxDataType::Uint8,
            0x03 => RxDataType::Int16OnePoint,
            0x04 => RxDataType::Float,
            0x0d => RxDataType::Uint16,
            0x0e => RxDataType::Uint32,
            0x0f => RxDataType::Uint32OnePoint,
            0x10 => RxDataType::Uint32TwoPoint,
            0x11 => RxDataType::Uint32ThreePoint,
            0x17 => RxDataType::RcData,
            0x1e => RxDataType::Time,
            0x1f => RxDataType::Date,
            0x21 => RxDataType::Uint16OnePoint,
            0x22 => RxDataType::Uint16TwoPoint,
            0x23 => RxDataType::Uint16ThreePoint,
            0x35 => RxDataType::Rosetta,
            0x37 => RxDataType::HrvOut,
            other => RxDataType::Unknown(other),
        }
    }
}

/// Battery state reported by battery-powered datapoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    Na,
    Pct0,
    Pct25,
    Pct50,
    Pct75,
    Pct100,
    Powerline,
}

impl BatteryLevel {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0x01 => BatteryLevel::Pct0,
            0x02 => BatteryLevel::Pct25,
            0x03 => BatteryLevel::Pct50,
            0x04 => BatteryLevel::Pct75,
            0x05 => BatteryLevel::Pct100,
            0x10 => BatteryLevel::Powerline,
            _ => BatteryLevel::Na,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            BatteryLevel::Na => "not available",
            BatteryLevel::Pct0 => "empty",
            BatteryLevel::Pct25 => "very weak",
            BatteryLevel::Pct50 => "weak",
            BatteryLevel::Pct75 => "good",
            BatteryLevel::Pct100 => "new",
            BatteryLevel::Powerline => "powerline",
        }
    }
}

/// Classify an RSSI reading (0-120, lower is better).
pub fn rssi_quality(rssi: u8) -> &'static str {
    if rssi <= 67 {
        "good"
    } else if rssi <= 75 {
        "normal"
    } else if rssi <= 90 {
        "weak"
    } else if rssi <= 120 {
        "very weak"
    } else {
        "unknown"
    }
}

/// Movement commands for shutter datapoints, sent with [`TxEvent::Jalo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterCommand {
    Close,
    Open,
    Stop,
    StepClose,
    StepOpen,
}

impl ShutterCommand {
    pub fn raw(self) -> u8 {
        match self {
            ShutterCommand::Close => 0x00,
            ShutterCommand::Open => 0x01,
            ShutterCommand::Stop => 0x02,
            ShutterCommand::StepClose => 0x10,
            ShutterCommand::StepOpen => 0x11,
        }
    }

    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(ShutterCommand::Close),
            0x01 => Some(ShutterCommand::Open),
            0x02 => Some(ShutterCommand::Stop),
            0x10 => Some(ShutterCommand::StepClose),
            0x11 => Some(ShutterCommand::StepOpen),
            _ => None,
        }
    }
}

/// Shutter position reported in `MSG_STATUS` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterState {
    Stopped,
    Up,
    Down,
}

impl ShutterState {
    /// Anything out of range reads as stopped, like the status values
    /// non-shutter datapoints report.
    pub fn from_value(value: i32) -> Self {
        match value {
            0x01 => ShutterState::Up,
            0x02 => ShutterState::Down,
            _ => ShutterState::Stopped,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShutterState::Stopped => "stopped",
            ShutterState::Up => "up",
            ShutterState::Down => "down",
        }
    }
}

/// Control-plane commands understood by the stick itself, sent in `CONFIG`
/// frames and answered in `STATUS` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigType {
    Connex,
    Rs232Baud,
    SendOkMrf,
    Rs232Flow,
    Rs232Crc,
    TimeAccount,
    CounterRx,
    CounterTx,
    Serial,
    Led,
    LedDim,
    Release,
    SendClass,
    SendRfSeqNo,
    BackToFactory,
}

impl ConfigType {
    pub fn code(self) -> u8 {
        match self {
            ConfigType::Connex => 0x02,
            ConfigType::Rs232Baud => 0x03,
            ConfigType::SendOkMrf => 0x04,
            ConfigType::Rs232Flow => 0x05,
            ConfigType::Rs232Crc => 0x06,
            ConfigType::TimeAccount => 0x0a,
            ConfigType::CounterRx => 0x0b,
            ConfigType::CounterTx => 0x0c,
            ConfigType::Serial => 0x0e,
            ConfigType::Led => 0x0f,
            ConfigType::LedDim => 0x1a,
            ConfigType::Release => 0x1b,
            ConfigType::SendClass => 0x1d,
            ConfigType::SendRfSeqNo => 0x1e,
            ConfigType::BackToFactory => 0x1f,
        }
    }
}

/// Error sub-codes reported in negative acks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxError {
    General,
    UnknownCommand,
    DatapointOutOfRange,
    RfBusy,
    RfBusyRx,
    TxMessageLost,
    NoAck,
}

impl TxError {
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(TxError::General),
            0x01 => Some(TxError::UnknownCommand),
            0x02 => Some(TxError::DatapointOutOfRange),
            0x03 => Some(TxError::RfBusy),
            0x04 => Some(TxError::RfBusyRx),
            0x05 => Some(TxError::TxMessageLost),
            0x06 => Some(TxError::NoAck),
            _ => None,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            TxError::General => "general error",
            TxError::UnknownCommand => "unknown command",
            TxError::DatapointOutOfRange => "datapoint out of range",
            TxError::RfBusy => "rf busy (tx message lost)",
            TxError::RfBusyRx => "rf busy (rx in progress)",
            TxError::TxMessageLost => "tx message lost; repeat it",
            TxError::NoAck => "timeout; no ack received",
        }
    }
}

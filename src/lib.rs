//! xComfort to MQTT gateway.
//!
//! Bridges an Eaton xComfort RF network, reached through the CKOZ-00/14 USB
//! communication stick, to an MQTT broker. Operators publish intents on
//! `xcomfort/+/set/+`; the gateway drives the RF protocol (delivery acks,
//! retransmits, status confirmation) and republishes confirmed datapoint
//! state retained on `xcomfort/N/get/+`.
//!
//! The protocol layers live in their own crates: `xcomfort-wire` (codec),
//! `xcomfort-engine` (request/ack state machine) and `xcomfort-usb`
//! (transport). This crate wires them to the broker and the host system.

pub mod config;
pub mod daemon;
pub mod gateway;
pub mod logging;
pub mod mqtt;

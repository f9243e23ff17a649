//! Broker-facing surface: the command topic schema and the retained state
//! publishes.

use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use tracing::warn;
use xcomfort_engine::Command;
use xcomfort_wire::{ShutterCommand, ShutterState};

use crate::config::Config;

/// Subscription covering every operator intent.
pub const COMMAND_TOPIC_FILTER: &str = "xcomfort/+/set/+";

/// A decoded command topic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Forward an intent to the protocol engine.
    Datapoint { datapoint: u8, command: Command },
    /// Toggle verbose logging at runtime (datapoint 0 only).
    SetDebug(bool),
}

/// Decode a message received under [`COMMAND_TOPIC_FILTER`].
///
/// Anything malformed, from an unparsable datapoint id to an out-of-range
/// dim level, yields `None` and is dropped without a reply.
pub fn route_command(topic: &str, payload: &[u8]) -> Option<Request> {
    let mut parts = topic.split('/');
    let (Some("xcomfort"), Some(datapoint), Some("set"), Some(operation), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return None;
    };

    let datapoint: u8 = datapoint.parse().ok()?;
    let payload = std::str::from_utf8(payload).ok()?;

    let command = match operation {
        "switch" => Command::Switch(payload == "true"),
        "dimmer" => {
            let level: i32 = payload.parse().ok()?;
            if !(0..=100).contains(&level) {
                return None;
            }
            Command::Dim(level)
        }
        "shutter" => Command::Shutter(match payload {
            "up" => ShutterCommand::Open,
            "down" => ShutterCommand::Close,
            "stop" => ShutterCommand::Stop,
            _ => return None,
        }),
        "requeststatus" => Command::RequestStatus,
        "debug" => {
            if datapoint != 0 {
                return None;
            }
            return Some(Request::SetDebug(payload == "true"));
        }
        _ => return None,
    };

    Some(Request::Datapoint { datapoint, command })
}

pub struct MqttLink {
    pub client: AsyncClient,
    pub eventloop: EventLoop,
}

pub fn connect(config: &Config) -> MqttLink {
    let mut options = MqttOptions::new("xcomfort", config.host.as_str(), config.port);
    options.set_keep_alive(Duration::from_secs(30));
    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        options.set_credentials(username.as_str(), password.as_str());
    }

    let (client, eventloop) = AsyncClient::new(options, 16);
    MqttLink { client, eventloop }
}

/// Republish a confirmed datapoint value on all three state topics.
///
/// Every datapoint gets all three representations; subscribers pick the one
/// matching the device class they know they are talking to.
pub async fn publish_status(client: &AsyncClient, datapoint: u8, value: i32) {
    let as_switch = if value != 0 { "true" } else { "false" };
    let as_shutter = ShutterState::from_value(value).name();

    let publications = [
        (format!("xcomfort/{datapoint}/get/dimmer"), value.to_string()),
        (format!("xcomfort/{datapoint}/get/switch"), as_switch.to_string()),
        (format!("xcomfort/{datapoint}/get/shutter"), as_shutter.to_string()),
    ];

    for (topic, payload) in publications {
        if let Err(err) = client.publish(topic, QoS::AtLeastOnce, true, payload).await {
            warn!(%err, "failed to publish state");
        }
    }
}

//! The reactor: one task owning the engine, the USB transport and the MQTT
//! client, multiplexed with the timer wheel and the termination signals.

use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};
use rumqttc::{AsyncClient, Event, Packet, QoS};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{debug, info, warn};
use xcomfort_engine::{Engine, EngineConfig};
use xcomfort_usb::{UsbEvent, UsbTransport};
use xcomfort_wire::{self as wire, ConfigType, Frame, RxEvent};

use crate::config::Config;
use crate::logging::LogHandle;
use crate::mqtt::{self, MqttLink, Request};

/// The MQTT event loop needs servicing at least this often, which also caps
/// how long a scheduling tick can be deferred.
const MQTT_SERVICE_INTERVAL: Duration = Duration::from_millis(500);

/// Backoff after a lost broker connection.
const MQTT_RETRY_DELAY: Duration = Duration::from_secs(15);

pub async fn run(config: Config, log: LogHandle) -> Result<()> {
    let mut transport =
        UsbTransport::open().context("opening the xComfort communication stick")?;
    let mut engine = Engine::new(EngineConfig {
        parallel_window: config.parallel,
    });
    let MqttLink {
        client,
        mut eventloop,
    } = mqtt::connect(&config);

    // Ask the stick for its revision record; the answer is logged when it
    // comes back as a release frame.
    transport.send(&wire::config(ConfigType::Release, 0))?;

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    loop {
        pump(&mut engine, &mut transport)?;

        let now = Instant::now();
        let timeout = engine
            .next_wakeup(now)
            .map_or(MQTT_SERVICE_INTERVAL, |until| {
                until.min(MQTT_SERVICE_INTERVAL)
            });

        tokio::select! {
            _ = sigterm.recv() => {
                info!("SIGTERM received; shutting down");
                return Ok(());
            }
            _ = sigquit.recv() => {
                info!("SIGQUIT received; shutting down");
                return Ok(());
            }
            event = transport.next_event() => {
                handle_usb_event(event, &mut engine, &client).await?;
            }
            event = eventloop.poll() => match event {
                Ok(event) => handle_mqtt_event(event, &mut engine, &client, &log).await,
                Err(err) => {
                    warn!(%err, "lost broker connection; reconnecting");
                    tokio::time::sleep(MQTT_RETRY_DELAY).await;
                }
            },
            _ = tokio::time::sleep(timeout) => {}
        }
    }
}

/// Drain eligible telegrams into the transport. The transport accepts one
/// outstanding send, so at most one telegram leaves per completion.
fn pump(engine: &mut Engine, transport: &mut UsbTransport) -> Result<()> {
    let now = Instant::now();
    while transport.can_send() {
        let Some(tx) = engine.poll_transmit(now) else {
            break;
        };
        transport
            .send(&tx.frame)
            .context("submitting telegram to the stick")?;
    }
    Ok(())
}

async fn handle_usb_event(
    event: UsbEvent,
    engine: &mut Engine,
    client: &AsyncClient,
) -> Result<()> {
    match event {
        UsbEvent::Frame(bytes) => {
            if let Some(frame) = wire::parse(&bytes) {
                handle_frame(frame, engine, client).await;
            }
        }
        UsbEvent::SendComplete => {}
        UsbEvent::Fatal(err) => return Err(err).context("USB transport failed"),
    }
    Ok(())
}

async fn handle_frame(frame: Frame, engine: &mut Engine, client: &AsyncClient) {
    let now = Instant::now();

    match frame {
        Frame::Rx {
            event,
            datapoint,
            data_type,
            value,
            rssi,
            battery,
        } => {
            debug!(
                event = event.name(),
                datapoint,
                ?data_type,
                value,
                signal = wire::rssi_quality(rssi),
                battery = battery.describe(),
                "datapoint event"
            );
            if event == RxEvent::Status {
                mqtt::publish_status(client, datapoint, value).await;
                engine.confirm_status(datapoint);
            }
        }
        Frame::Ack {
            success,
            message_id,
            error,
        } => {
            if let Some(error) = error {
                debug!(reason = error.describe(), "negative ack");
            }
            engine.handle_ack(success, message_id, now);
        }
        Frame::SerialNumber(serial) => info!("serial number: {serial:08x}"),
        Frame::Release {
            status,
            rf_major,
            rf_minor,
            usb_major,
            usb_minor,
        } => {
            if status == 0x10 {
                info!(
                    "CKOZ-00/14 revision numbers: HW-Rev {rf_major}, RF-Rev {rf_minor}, FW-Rev {}",
                    (u16::from(usb_major) << 8) + u16::from(usb_minor)
                );
            } else {
                info!(
                    "CKOZ-00/14 version numbers: RFV{rf_major}.{rf_minor:02}, USBV{usb_major}.{usb_minor:02}"
                );
            }
        }
        Frame::CounterRx(count) => info!("counter rx: {count:08x}"),
        Frame::CounterTx(count) => info!("counter tx: {count:08x}"),
        Frame::TimeAccount(percent) => info!("time account: {percent}%"),
        Frame::RfSequenceFlag(flag) => info!("RF sequence number flag: {flag}"),
        Frame::Firmware { major, minor } => info!("firmware version: {major}.{minor:02}"),
        Frame::UnknownStatus { stype, payload } => {
            debug!(stype, ?payload, "unhandled status frame");
        }
        Frame::UnknownFrame { frame_type, size } => {
            debug!(frame_type, size, "unhandled frame");
        }
    }
}

async fn handle_mqtt_event(
    event: Event,
    engine: &mut Engine,
    client: &AsyncClient,
    log: &LogHandle,
) {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) => {
            info!(code = ?ack.code, "broker connected");
            if let Err(err) = client
                .subscribe(mqtt::COMMAND_TOPIC_FILTER, QoS::AtMostOnce)
                .await
            {
                warn!(%err, "failed to subscribe to command topics");
            }
        }
        Event::Incoming(Packet::Publish(publish)) => {
            match mqtt::route_command(&publish.topic, &publish.payload) {
                Some(Request::Datapoint { datapoint, command }) => {
                    debug!(datapoint, ?command, "operator intent");
                    engine.submit(datapoint, command);
                }
                Some(Request::SetDebug(on)) => log.set_debug(on),
                None => debug!(topic = %publish.topic, "dropping malformed command"),
            }
        }
        _ => {}
    }
}

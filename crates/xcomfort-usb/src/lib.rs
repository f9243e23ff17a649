//! USB transport for the CKOZ-00/14 communication stick.
//!
//! The stick is a plain interrupt-endpoint device: one IN endpoint streams
//! inbound frames, one OUT endpoint accepts a single outstanding telegram at
//! a time. libusb operations are blocking, so the transport owns two service
//! threads, one per endpoint, and feeds the reactor through a channel of
//! [`UsbEvent`]s. Any transfer failure is fatal for the whole gateway; there
//! is no per-packet recovery at this layer, retries are protocol business.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rusb::{Context, DeviceHandle, UsbContext};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

pub const VENDOR_ID: u16 = 0x188a;
pub const PRODUCT_ID: u16 = 0x1101;
/// Older firmware enumerates with a different product id and endpoint pair.
pub const PRODUCT_ID_LEGACY: u16 = 0x1102;

/// Size of the interrupt transfer buffers in both directions. Outbound
/// frames are zero-padded to this length.
pub const TRANSFER_LEN: usize = 32;

const INTERFACE: u8 = 0;
const CONFIGURATION: u8 = 1;

/// Poll granularity of the reader thread; also bounds shutdown latency.
const READ_TIMEOUT: Duration = Duration::from_millis(250);
const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum UsbError {
    #[error("no xComfort communication stick found")]
    DeviceNotFound,
    #[error("oversized frame ({0} bytes)")]
    FrameTooLong(usize),
    #[error("a telegram is already in transit")]
    Busy,
    #[error("interrupt transfer failed: {0}")]
    Transfer(rusb::Error),
    #[error("transport is shut down")]
    Shutdown,
    #[error(transparent)]
    Usb(#[from] rusb::Error),
}

#[derive(Debug)]
pub enum UsbEvent {
    /// Payload of one completed interrupt-IN transfer.
    Frame(Vec<u8>),
    /// The outstanding interrupt-OUT transfer completed. This frees the
    /// transport for the next send; it does not imply a protocol ack.
    SendComplete,
    /// Unrecoverable transport failure; emitted at most once per thread.
    Fatal(UsbError),
}

pub struct UsbTransport {
    events: mpsc::UnboundedReceiver<UsbEvent>,
    outgoing: Option<Sender<[u8; TRANSFER_LEN]>>,
    message_in_transit: bool,
    shutdown: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl UsbTransport {
    /// Find, claim and start servicing the stick.
    pub fn open() -> Result<Self, UsbError> {
        let context = Context::new()?;
        let (handle, product_id) = open_stick(&context)?;

        if handle.kernel_driver_active(INTERFACE).unwrap_or(false) {
            handle.detach_kernel_driver(INTERFACE)?;
        }
        handle.set_active_configuration(CONFIGURATION)?;
        handle.claim_interface(INTERFACE)?;

        let (ep_in, ep_out) = if product_id == PRODUCT_ID_LEGACY {
            (0x84, 0x05)
        } else {
            (0x81, 0x02)
        };
        debug!(product_id, ep_in, ep_out, "claimed communication stick");

        let handle = Arc::new(handle);
        let shutdown = Arc::new(AtomicBool::new(false));
        let (event_tx, events) = mpsc::unbounded_channel();
        let (outgoing, out_rx) = std::sync::mpsc::channel();

        let reader = {
            let handle = Arc::clone(&handle);
            let shutdown = Arc::clone(&shutdown);
            let events = event_tx.clone();
            std::thread::spawn(move || reader_loop(handle, ep_in, shutdown, events))
        };
        let writer = std::thread::spawn(move || writer_loop(handle, ep_out, out_rx, event_tx));

        Ok(Self {
            events,
            outgoing: Some(outgoing),
            message_in_transit: false,
            shutdown,
            reader: Some(reader),
            writer: Some(writer),
        })
    }

    /// Whether the OUT endpoint is free for another telegram.
    pub fn can_send(&self) -> bool {
        !self.message_in_transit
    }

    /// Submit one frame. Callers must check [`can_send`](Self::can_send)
    /// first; the next [`UsbEvent::SendComplete`] frees the slot again.
    pub fn send(&mut self, frame: &[u8]) -> Result<(), UsbError> {
        if frame.len() > TRANSFER_LEN {
            return Err(UsbError::FrameTooLong(frame.len()));
        }
        if self.message_in_transit {
            return Err(UsbError::Busy);
        }

        let mut buf = [0u8; TRANSFER_LEN];
        buf[..frame.len()].copy_from_slice(frame);

        self.outgoing
            .as_ref()
            .ok_or(UsbError::Shutdown)?
            .send(buf)
            .map_err(|_| UsbError::Shutdown)?;
        self.message_in_transit = true;
        Ok(())
    }

    /// Next transport event. Completion of a send clears the in-transit
    /// flag before the event is handed to the caller.
    pub async fn next_event(&mut self) -> UsbEvent {
        match self.events.recv().await {
            Some(event) => {
                if matches!(event, UsbEvent::SendComplete) {
                    self.message_in_transit = false;
                }
                event
            }
            None => UsbEvent::Fatal(UsbError::Shutdown),
        }
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Closing the outgoing channel ends the writer loop.
        self.outgoing.take();
        for thread in [self.reader.take(), self.writer.take()].into_iter().flatten() {
            let _ = thread.join();
        }
        // Dropping the last handle reference releases the claimed interface.
    }
}

fn open_stick(context: &Context) -> Result<(DeviceHandle<Context>, u16), UsbError> {
    let mut legacy = None;

    for device in context.devices()?.iter() {
        let Ok(descriptor) = device.device_descriptor() else {
            continue;
        };
        if descriptor.vendor_id() != VENDOR_ID {
            continue;
        }
        match descriptor.product_id() {
            PRODUCT_ID => return Ok((device.open()?, PRODUCT_ID)),
            PRODUCT_ID_LEGACY => legacy = Some(device),
            _ => {}
        }
    }

    match legacy {
        Some(device) => Ok((device.open()?, PRODUCT_ID_LEGACY)),
        None => Err(UsbError::DeviceNotFound),
    }
}

fn reader_loop(
    handle: Arc<DeviceHandle<Context>>,
    ep_in: u8,
    shutdown: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<UsbEvent>,
) {
    let mut buf = [0u8; TRANSFER_LEN];

    while !shutdown.load(Ordering::Relaxed) {
        match handle.read_interrupt(ep_in, &mut buf, READ_TIMEOUT) {
            Ok(len) => {
                if events.send(UsbEvent::Frame(buf[..len].to_vec())).is_err() {
                    break;
                }
            }
            Err(rusb::Error::Timeout) => {}
            Err(err) => {
                let _ = events.send(UsbEvent::Fatal(UsbError::Transfer(err)));
                break;
            }
        }
    }
}

fn writer_loop(
    handle: Arc<DeviceHandle<Context>>,
    ep_out: u8,
    outgoing: Receiver<[u8; TRANSFER_LEN]>,
    events: mpsc::UnboundedSender<UsbEvent>,
) {
    for frame in outgoing.iter() {
        match handle.write_interrupt(ep_out, &frame, WRITE_TIMEOUT) {
            Ok(len) => {
                if len != TRANSFER_LEN {
                    warn!(len, "short interrupt write");
                }
                if events.send(UsbEvent::SendComplete).is_err() {
                    break;
                }
            }
            Err(err) => {
                let _ = events.send(UsbEvent::Fatal(UsbError::Transfer(err)));
                break;
            }
        }
    }
}

//! Request/ack state machine for the xComfort communication stick.
//!
//! The stick accepts one telegram at a time per message id, answers each with
//! a delivery ack, and silently drops telegrams when the RF side is busy. The
//! [`Engine`] wraps that into a per-datapoint coalescing queue: intents for
//! the same datapoint collapse so only the latest value is ever on the air,
//! lost telegrams are retransmitted with a fresh id after a deadline, and
//! every confirmed write is followed up with a status request so the new
//! state can be republished.
//!
//! The engine is sans-io and single-owner: callers feed it intents, acks and
//! the current time, and drain outbound telegrams with [`Engine::poll_transmit`].
//! It never blocks, never panics on protocol input, and holds no interior
//! mutability, which is what makes the whole protocol layer testable with a
//! fabricated clock.

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use xcomfort_wire as wire;
use xcomfort_wire::{ShutterCommand, TxEvent, TX_FRAME_LEN};

/// Message ids rotate in a 4-bit space; the upper nibble of the sequence
/// byte on the wire.
pub const MESSAGE_ID_MODULUS: u8 = 16;

/// How long to wait for a delivery ack before a telegram counts as lost.
pub const MESSAGE_LOST_TIMEOUT: Duration = Duration::from_millis(5500);

/// Grace period after an acked write for the datapoint to report its new
/// state on its own before we start asking for it.
pub const STATUS_WAIT: Duration = Duration::from_millis(1000);

/// Status requests sent without an answer before an entry is abandoned.
pub const MAX_STATUS_REQUESTS: u8 = 3;

/// Hands out message ids round-robin over [`MESSAGE_ID_MODULUS`].
///
/// Collisions are prevented by the in-flight window being at most half the
/// id space, not by tracking the outstanding set.
#[derive(Debug, Default)]
pub struct MessageIdAllocator {
    next: u8,
}

impl MessageIdAllocator {
    pub fn allocate(&mut self) -> u8 {
        let id = self.next;
        self.next = (self.next + 1) % MESSAGE_ID_MODULUS;
        id
    }

    /// The id the next call to [`allocate`](Self::allocate) will return.
    pub fn peek(&self) -> u8 {
        self.next
    }
}

/// A single operator intent, as decoded from the control topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Switch(bool),
    Dim(i32),
    Shutter(ShutterCommand),
    RequestStatus,
}

impl Command {
    fn into_parts(self) -> (TxEvent, Option<i32>) {
        match self {
            Command::Switch(on) => (TxEvent::Switch, Some(i32::from(on))),
            Command::Dim(level) => (TxEvent::Dim, Some(level)),
            Command::Shutter(cmd) => (TxEvent::Jalo, Some(i32::from(cmd.raw()))),
            Command::RequestStatus => (TxEvent::Request, None),
        }
    }
}

/// One outbound telegram, ready for the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transmission {
    pub datapoint: u8,
    pub message_id: u8,
    pub frame: [u8; TX_FRAME_LEN],
}

/// Pending work for one datapoint.
///
/// `new_value` holds the latest unsent value; once launched it moves to
/// `sent_value` and stays there so a retry can repeat it. `due` is the
/// retransmit deadline while a message id is active, and the next-attempt
/// time otherwise; `None` means immediately eligible.
#[derive(Debug)]
struct DatapointChange {
    datapoint: u8,
    event: TxEvent,
    new_value: Option<i32>,
    sent_value: Option<i32>,
    active_message_id: Option<u8>,
    due: Option<Instant>,
    sent_status_requests: u8,
}

impl DatapointChange {
    fn is_due(&self, now: Instant) -> bool {
        self.due.map_or(true, |at| at <= now)
    }

    fn has_pending_work(&self) -> bool {
        self.active_message_id.is_some()
            || self.new_value.is_some()
            || (self.event == TxEvent::Request && self.sent_status_requests < MAX_STATUS_REQUESTS)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Telegrams allowed in flight at once. The stick silently drops
    /// overlapped requests on some firmware, so 1 is the safe default;
    /// anything above `MESSAGE_ID_MODULUS / 2` would make ack matching
    /// ambiguous and is clamped.
    pub parallel_window: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallel_window: 1 }
    }
}

/// The protocol engine. See the crate docs for the model.
#[derive(Debug)]
pub struct Engine {
    queue: Vec<DatapointChange>,
    ids: MessageIdAllocator,
    messages_in_transit: usize,
    window: usize,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let window = config.parallel_window.clamp(1, MESSAGE_ID_MODULUS / 2);
        Self {
            queue: Vec::new(),
            ids: MessageIdAllocator::default(),
            messages_in_transit: 0,
            window: usize::from(window),
        }
    }

    /// Record an operator intent for `datapoint`.
    ///
    /// Intents coalesce: while an entry exists for the datapoint, a new
    /// value simply replaces the pending one and the next transmission
    /// carries it. Status requests never overwrite a pending write, since a
    /// status report is implicit in completing one.
    pub fn submit(&mut self, datapoint: u8, command: Command) {
        let (event, value) = command.into_parts();

        match self.queue.iter_mut().find(|e| e.datapoint == datapoint) {
            Some(entry) => {
                if event != TxEvent::Request {
                    entry.new_value = value;
                    entry.event = event;
                }
                entry.sent_status_requests = 0;
            }
            None => {
                self.queue.push(DatapointChange {
                    datapoint,
                    event,
                    new_value: value,
                    sent_value: None,
                    active_message_id: None,
                    due: None,
                    sent_status_requests: 0,
                });
            }
        }
    }

    /// One scheduling tick: emit at most one telegram.
    ///
    /// Call repeatedly while the transport can accept a send. New
    /// transmissions are gated on the in-flight window; retransmissions of a
    /// lost telegram are not, as they reuse the slot their first attempt
    /// still occupies. Entries whose work is exhausted are removed here.
    pub fn poll_transmit(&mut self, now: Instant) -> Option<Transmission> {
        let mut idx = 0;

        while idx < self.queue.len() {
            if !self.queue[idx].is_due(now) {
                idx += 1;
                continue;
            }

            if !self.queue[idx].has_pending_work() {
                let entry = self.queue.remove(idx);
                debug!(
                    datapoint = entry.datapoint,
                    "datapoint change complete; dropping entry"
                );
                continue;
            }

            let retry = self.queue[idx].active_message_id.is_some();
            if !retry && self.messages_in_transit >= self.window {
                idx += 1;
                continue;
            }

            let entry = &mut self.queue[idx];
            let value = if retry {
                // The previous attempt is considered lost. If the operator
                // changed their mind in the meanwhile, carry the new value.
                entry.new_value.or(entry.sent_value)
            } else {
                entry.new_value
            };

            let message_id = self.ids.allocate();

            let frame = match entry.event {
                TxEvent::Switch => wire::switch(entry.datapoint, value.unwrap_or(0) != 0, message_id),
                TxEvent::Dim => wire::dim(entry.datapoint, value.unwrap_or(0), message_id),
                TxEvent::Jalo => {
                    match value.and_then(|v| u8::try_from(v).ok()).and_then(ShutterCommand::from_raw) {
                        Some(cmd) => wire::jalo(entry.datapoint, cmd, message_id),
                        None => {
                            warn!(
                                datapoint = entry.datapoint,
                                ?value,
                                "dropping unencodable shutter command"
                            );
                            self.queue.remove(idx);
                            continue;
                        }
                    }
                }
                TxEvent::Request => wire::request(entry.datapoint, message_id),
            };

            if retry {
                debug!(
                    lost_id = entry.active_message_id,
                    datapoint = entry.datapoint,
                    new_id = message_id,
                    "telegram lost; retrying"
                );
            } else if entry.event == TxEvent::Request {
                entry.sent_status_requests += 1;
                debug!(
                    datapoint = entry.datapoint,
                    message_id,
                    attempt = entry.sent_status_requests,
                    "requesting status"
                );
            } else {
                debug!(
                    datapoint = entry.datapoint,
                    ?value,
                    message_id,
                    "sending datapoint value"
                );
            }

            entry.active_message_id = Some(message_id);
            entry.new_value = None;
            entry.sent_value = value;
            entry.due = Some(now + MESSAGE_LOST_TIMEOUT);

            if !retry {
                self.messages_in_transit += 1;
            }

            return Some(Transmission {
                datapoint: entry.datapoint,
                message_id,
                frame,
            });
        }

        None
    }

    /// Feed a delivery ack from the stick.
    ///
    /// Acks can arrive after we have given up waiting for them, so an
    /// unmatched id only logs. The success flag is informational: a negative
    /// ack frees the window slot, but retransmission stays deadline-driven.
    pub fn handle_ack(&mut self, success: bool, message_id: Option<u8>, now: Instant) {
        self.messages_in_transit = self.messages_in_transit.saturating_sub(1);

        let Some(message_id) = message_id else {
            return;
        };

        let Some(entry) = self
            .queue
            .iter_mut()
            .find(|e| e.active_message_id == Some(message_id))
        else {
            debug!(
                message_id,
                "spurious ack; message timeout is possibly too low"
            );
            return;
        };

        debug!(message_id, success, datapoint = entry.datapoint, "acked");
        entry.active_message_id = None;

        if entry.new_value.is_some() {
            // A newer value is already queued; launch it right away.
            entry.due = None;
        } else {
            if entry.event != TxEvent::Request {
                entry.event = TxEvent::Request;
                entry.sent_status_requests = 0;
            }
            entry.due = Some(now + STATUS_WAIT);
        }
    }

    /// Note that `datapoint` reported its state with an `MSG_STATUS`.
    ///
    /// An entry that was waiting on confirmation is marked complete and
    /// falls out of the queue on its next scheduling visit.
    pub fn confirm_status(&mut self, datapoint: u8) {
        if let Some(entry) = self.queue.iter_mut().find(|e| e.datapoint == datapoint) {
            if entry.event == TxEvent::Request {
                entry.sent_status_requests = MAX_STATUS_REQUESTS;
            }
        }
    }

    /// Time until the next deadline among entries that still have work, or
    /// `None` when the queue is drained. `Duration::ZERO` means a scheduling
    /// tick is already overdue.
    pub fn next_wakeup(&self, now: Instant) -> Option<Duration> {
        self.queue
            .iter()
            .filter(|e| e.has_pending_work())
            .map(|e| match e.due {
                None => Duration::ZERO,
                Some(at) => at.saturating_duration_since(now),
            })
            .min()
    }

    /// Number of telegrams currently counted against the window.
    pub fn messages_in_transit(&self) -> usize {
        self.messages_in_transit
    }

    /// Datapoints with a live queue entry, in queue order.
    pub fn queued_datapoints(&self) -> impl Iterator<Item = u8> + '_ {
        self.queue.iter().map(|e| e.datapoint)
    }
}

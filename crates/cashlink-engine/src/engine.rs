//! The device-link engine: one task owning transport, codec, dispatcher,
//! and poll scheduler.
//!
//! # Concurrency model
//!
//! Exactly one logical actor processes transport events, timer ticks, and
//! caller submissions: the task spawned by [`DeviceLink::spawn`]. All
//! state transitions of the dispatch slot and the poll state happen on
//! that task, so no locking exists anywhere in the engine. Callers hold a
//! cloneable [`DeviceLink`] and communicate over channels; submitting
//! never blocks the caller beyond awaiting its own completion.
//!
//! # Data flow
//!
//! ```text
//! caller ─submit─> Dispatcher ─encode─> Transport ⇢ device
//!                                                    ⇣
//! caller <─oneshot── Dispatcher <─classify── codec <─┘
//!                        │
//!                        └─ unsolicited events ──> event sink
//! ```
//!
//! The polling scheduler injects status commands through the same slot
//! when the link is otherwise idle, so a poll can never collide with an
//! application command.

use crate::config::LinkConfig;
use crate::dispatcher::{Dispatcher, PendingRequest};
use crate::error::{LinkError, Result};
use crate::poller::Poller;
use bytes::{Bytes, BytesMut};
use cashlink_hardware::{Transport, TransportEvent};
use cashlink_protocol::table::DenominationTable;
use cashlink_protocol::{Command, DecodedFrame, EventKind, LinkProtocol};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

/// Depth of the caller-to-engine message channel.
const MESSAGE_CHANNEL_DEPTH: usize = 32;

/// Engine-side notification delivered to event subscribers.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// An unsolicited device event, stamped when it entered the process.
    Device {
        kind: EventKind,
        payload: Bytes,
        at: DateTime<Utc>,
    },

    /// The transport reported a recoverable error; outstanding requests
    /// were failed but the link stays open.
    TransportError { message: String },

    /// The device is gone; the engine has stopped.
    Disconnected,
}

/// Caller-to-engine messages.
enum EngineMsg {
    Submit(PendingRequest),
    Subscribe(mpsc::Sender<LinkEvent>),
    Cancel,
}

/// Handle to a running device link.
///
/// Cheap to clone; all clones feed the same engine task. Dropping every
/// clone stops the engine once it is quiescent.
#[derive(Debug, Clone)]
pub struct DeviceLink {
    msg_tx: mpsc::Sender<EngineMsg>,
    table_rx: watch::Receiver<Option<DenominationTable>>,
    config: LinkConfig,
}

impl DeviceLink {
    /// Spawn an engine task over `protocol` and `transport` and return the
    /// handle to it.
    pub fn spawn<P, T>(protocol: P, transport: T, config: LinkConfig) -> Self
    where
        P: LinkProtocol + 'static,
        T: Transport + 'static,
    {
        let (msg_tx, msg_rx) = mpsc::channel(MESSAGE_CHANNEL_DEPTH);
        let (table_tx, table_rx) = watch::channel(None);

        let engine = LinkEngine {
            protocol,
            transport,
            dispatcher: Dispatcher::new(),
            poller: Poller::new(config.debounce),
            msg_rx,
            event_sink: None,
            table_tx,
            rx_buf: BytesMut::with_capacity(1024),
            poll_interval: config.poll_interval,
            command_timeout: config.command_timeout,
        };
        tokio::spawn(engine.run());

        DeviceLink {
            msg_tx,
            table_rx,
            config,
        }
    }

    /// Issue a command with the configured default timeout and await its
    /// reply payload.
    pub async fn submit(&self, command: Command) -> Result<Bytes> {
        self.submit_with_timeout(command, self.config.command_timeout)
            .await
    }

    /// Issue a command with an explicit reply deadline (armed when the
    /// command is written, not when it is queued).
    pub async fn submit_with_timeout(&self, command: Command, timeout: Duration) -> Result<Bytes> {
        let (tx, rx) = oneshot::channel();
        let request = PendingRequest {
            command,
            timeout,
            complete: tx,
            is_poll: false,
        };
        self.msg_tx
            .send(EngineMsg::Submit(request))
            .await
            .map_err(|_| LinkError::LinkClosed)?;
        rx.await.map_err(|_| LinkError::LinkClosed)?
    }

    /// Subscribe to unsolicited events. Each call registers a fresh sink,
    /// replacing the previous one.
    pub async fn subscribe(&self) -> mpsc::Receiver<LinkEvent> {
        let (tx, rx) = mpsc::channel(self.config.event_buffer);
        let _ = self.msg_tx.send(EngineMsg::Subscribe(tx)).await;
        rx
    }

    /// Cancel cooperatively: clears the backlog and the event sink
    /// registration. A request already written to the transport is not
    /// aborted; its eventual reply is discarded.
    pub async fn cancel(&self) {
        let _ = self.msg_tx.send(EngineMsg::Cancel).await;
    }

    /// Whether the denomination table has been decoded at least once.
    pub fn is_ready(&self) -> bool {
        self.table_rx.borrow().is_some()
    }

    /// Snapshot of the decoded denomination table.
    pub fn table(&self) -> Option<DenominationTable> {
        self.table_rx.borrow().clone()
    }

    /// Bounded wait for the denomination table.
    ///
    /// # Errors
    ///
    /// [`LinkError::Timeout`] if the table does not arrive within
    /// `timeout`; [`LinkError::LinkClosed`] if the engine stopped first.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<DenominationTable> {
        let mut table_rx = self.table_rx.clone();
        match tokio::time::timeout(timeout, table_rx.wait_for(|t| t.is_some())).await {
            Ok(Ok(guard)) => guard.as_ref().cloned().ok_or(LinkError::LinkClosed),
            Ok(Err(_)) => Err(LinkError::LinkClosed),
            Err(_) => Err(LinkError::Timeout {
                duration_ms: timeout.as_millis() as u64,
            }),
        }
    }
}

/// The engine task state. Exclusively owned by its task; every field is
/// single-owner by construction.
struct LinkEngine<P, T> {
    protocol: P,
    transport: T,
    dispatcher: Dispatcher,
    poller: Poller,
    msg_rx: mpsc::Receiver<EngineMsg>,
    event_sink: Option<mpsc::Sender<LinkEvent>>,
    table_tx: watch::Sender<Option<DenominationTable>>,
    rx_buf: BytesMut,
    poll_interval: Duration,
    command_timeout: Duration,
}

impl<P, T> LinkEngine<P, T>
where
    P: LinkProtocol,
    T: Transport,
{
    async fn run(mut self) {
        // First poll one full interval in, not at startup: give callers a
        // chance to issue their own startup commands first.
        let mut poll_tick =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        poll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = self.dispatcher.deadline();
            tokio::select! {
                biased;

                msg = self.msg_rx.recv() => match msg {
                    Some(msg) => self.on_message(msg).await,
                    // Every handle is gone; nothing new can arrive.
                    None => break,
                },

                event = self.transport.next_event() => {
                    if !self.on_transport(event).await {
                        break;
                    }
                }

                _ = sleep_until_opt(deadline) => self.on_reply_timeout().await,

                _ = poll_tick.tick() => self.on_poll_tick().await,
            }
        }
        debug!("link engine stopped");
    }

    async fn on_message(&mut self, msg: EngineMsg) {
        match msg {
            EngineMsg::Submit(request) => {
                trace!(command = %request.command, backlog = self.dispatcher.backlog_len(),
                    "command submitted");
                self.dispatcher.submit(request);
                self.advance().await;
            }
            EngineMsg::Subscribe(sink) => {
                self.event_sink = Some(sink);
            }
            EngineMsg::Cancel => {
                debug!(backlog = self.dispatcher.backlog_len(), "link cancelled");
                self.dispatcher.cancel();
                self.event_sink = None;
            }
        }
    }

    /// Pump the backlog while the slot is idle. At most one request ends
    /// up in flight; encode failures complete immediately and let the next
    /// entry try.
    async fn advance(&mut self) {
        while self.dispatcher.is_idle() {
            let Some(request) = self.dispatcher.take_next() else {
                break;
            };
            self.send_request(request).await;
        }
    }

    async fn send_request(&mut self, request: PendingRequest) {
        let mut wire = BytesMut::new();
        if let Err(e) = self.protocol.encode(&request.command, &mut wire) {
            warn!(command = %request.command, error = %e, "command not encodable");
            request.finish(Err(LinkError::Codec(e)));
            return;
        }

        match self.transport.write(&wire).await {
            Ok(()) => {
                trace!(command = %request.command, bytes = wire.len(), poll = request.is_poll,
                    "command written");
                self.dispatcher.mark_sent(request, Instant::now());
                self.poller.on_sent();
            }
            Err(e) => {
                warn!(command = %request.command, error = %e, "transport write failed");
                let message = e.to_string();
                request.finish(Err(LinkError::from(e)));
                // Half-duplex: with the write path gone nothing queued can
                // make progress either.
                self.dispatcher
                    .fail_all(|| LinkError::transport(message.clone()));
                self.forward_event(LinkEvent::TransportError { message });
            }
        }
    }

    /// Handle one transport event. Returns `false` when the engine should
    /// stop.
    async fn on_transport(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::DataReceived(bytes) => {
                self.rx_buf.extend_from_slice(&bytes);
                while let Some(frame) = self.protocol.decode(&mut self.rx_buf) {
                    self.on_frame(frame).await;
                }
                true
            }
            TransportEvent::Error(message) => {
                warn!(error = %message, "transport error");
                self.dispatcher
                    .fail_all(|| LinkError::transport(message.clone()));
                self.poller.on_slot_idle(Instant::now());
                self.forward_event(LinkEvent::TransportError { message });
                true
            }
            TransportEvent::Disconnected => {
                debug!("transport disconnected");
                self.dispatcher.fail_all(|| LinkError::Disconnected);
                self.forward_event(LinkEvent::Disconnected);
                false
            }
        }
    }

    async fn on_frame(&mut self, frame: DecodedFrame) {
        match frame {
            DecodedFrame::Reply { code, payload } => {
                if self.dispatcher.complete_in_flight(Ok(payload)) {
                    trace!(%code, "reply matched in-flight request");
                    self.on_slot_freed().await;
                } else {
                    // Late reply to a timed-out or cancelled request.
                    debug!(%code, "unmatched reply discarded");
                }
            }
            DecodedFrame::Malformed { reason } => {
                if self.dispatcher.complete_in_flight(Err(LinkError::MalformedFrame {
                    reason: reason.clone(),
                })) {
                    warn!(reason = %reason, "malformed frame surfaced to in-flight request");
                    self.on_slot_freed().await;
                } else {
                    warn!(reason = %reason, "malformed frame discarded");
                }
            }
            DecodedFrame::Event { kind, payload } => {
                trace!(%kind, "device event");
                self.forward_event(LinkEvent::Device {
                    kind,
                    payload,
                    at: Utc::now(),
                });
            }
            DecodedFrame::Table(payload) => match DenominationTable::decode_payload(&payload) {
                Ok(table) => {
                    debug!(channels = table.len(), "denomination table decoded");
                    self.table_tx.send_replace(Some(table));
                }
                Err(e) => warn!(error = %e, "bill table response not decodable"),
            },
        }
    }

    async fn on_reply_timeout(&mut self) {
        if self.dispatcher.expire_in_flight() {
            debug!("in-flight request timed out");
            self.on_slot_freed().await;
        }
    }

    /// The slot just went idle: start the poll debounce window, then let
    /// the backlog advance (which may immediately re-occupy the slot).
    async fn on_slot_freed(&mut self) {
        self.poller.on_slot_idle(Instant::now());
        self.advance().await;
    }

    async fn on_poll_tick(&mut self) {
        if !self.poller.on_tick(Instant::now(), self.dispatcher.is_quiescent()) {
            return;
        }
        let (tx, _discarded) = oneshot::channel();
        let request = PendingRequest {
            command: self.protocol.poll_command(),
            timeout: self.command_timeout,
            complete: tx,
            is_poll: true,
        };
        trace!("injecting status poll");
        self.dispatcher.submit(request);
        self.advance().await;
    }

    /// Deliver an event without ever blocking the engine: a full or closed
    /// sink drops the event (and a closed sink is deregistered).
    fn forward_event(&mut self, event: LinkEvent) {
        let Some(sink) = &self.event_sink else {
            trace!("no event sink registered, event dropped");
            return;
        };
        match sink.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(?event, "event sink full, event dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("event sink closed, deregistering");
                self.event_sink = None;
            }
        }
    }
}

/// Sleep until `deadline`, or forever when there is none.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

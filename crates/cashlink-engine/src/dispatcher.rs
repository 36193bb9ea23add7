//! Single-flight request dispatching.
//!
//! The wire protocols are half-duplex with no correlation identifiers:
//! replies are matched to requests purely by position, so correctness
//! depends on never having more than one request outstanding. The
//! [`Dispatcher`] owns that discipline (one optional in-flight slot plus a
//! FIFO backlog) as a plain state machine driven from the engine task.
//!
//! ```text
//! Idle ──submit──> InFlight ──reply/malformed/timeout/disconnect──> Idle
//!                     ^                                              │
//!                     └───────────── next backlog entry ─────────────┘
//! ```
//!
//! The only quiescent state is an empty slot with a drained backlog; there
//! is no terminal state, the dispatcher lives as long as the connection.

use crate::error::LinkError;
use bytes::Bytes;
use cashlink_protocol::Command;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::trace;

/// A submitted command awaiting its turn and its reply.
///
/// Consumed exactly once (by a matching reply, a malformed frame, a
/// timeout, a transport failure, or cancellation) and never revived.
#[derive(Debug)]
pub(crate) struct PendingRequest {
    /// The command to encode and send.
    pub command: Command,
    /// Reply deadline, armed when the command is written to the transport.
    pub timeout: Duration,
    /// Completion channel back to the submitter.
    pub complete: oneshot::Sender<Result<Bytes, LinkError>>,
    /// Scheduler-injected poll, completed into a dropped receiver.
    pub is_poll: bool,
}

impl PendingRequest {
    /// Complete the request. A dropped receiver (cancelled caller or a
    /// scheduler poll) is not an error.
    pub(crate) fn finish(self, result: Result<Bytes, LinkError>) {
        if self.complete.send(result).is_err() && !self.is_poll {
            trace!(command = %self.command, "completion receiver dropped");
        }
    }
}

/// The in-flight request plus its armed deadline.
#[derive(Debug)]
struct InFlight {
    request: PendingRequest,
    deadline: Instant,
}

/// Owner of the single-outstanding-request slot and the FIFO backlog.
#[derive(Debug, Default)]
pub(crate) struct Dispatcher {
    in_flight: Option<InFlight>,
    backlog: VecDeque<PendingRequest>,
}

impl Dispatcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether the slot is free.
    pub(crate) fn is_idle(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Whether the slot is free and the backlog drained.
    pub(crate) fn is_quiescent(&self) -> bool {
        self.in_flight.is_none() && self.backlog.is_empty()
    }

    /// Deadline of the in-flight request, if any.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.in_flight.as_ref().map(|f| f.deadline)
    }

    /// Append a request to the backlog. The engine pumps the backlog into
    /// the slot with [`Self::take_next`].
    pub(crate) fn submit(&mut self, request: PendingRequest) {
        self.backlog.push_back(request);
    }

    /// Pop the next request to send. Only meaningful while idle; returns
    /// `None` if the slot is occupied or the backlog empty.
    pub(crate) fn take_next(&mut self) -> Option<PendingRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        self.backlog.pop_front()
    }

    /// Record that `request` was written to the transport, arming its
    /// reply deadline.
    pub(crate) fn mark_sent(&mut self, request: PendingRequest, now: Instant) {
        debug_assert!(self.in_flight.is_none(), "second request marked in flight");
        let deadline = now + request.timeout;
        self.in_flight = Some(InFlight { request, deadline });
    }

    /// Complete the in-flight request with `result`. Returns `false` if
    /// nothing was outstanding (late reply; the caller discards it).
    pub(crate) fn complete_in_flight(&mut self, result: Result<Bytes, LinkError>) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                flight.request.finish(result);
                true
            }
            None => false,
        }
    }

    /// Expire the in-flight request against its own armed timeout.
    /// Returns `false` if nothing was outstanding.
    pub(crate) fn expire_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(flight) => {
                let duration_ms = flight.request.timeout.as_millis() as u64;
                flight.request.finish(Err(LinkError::Timeout { duration_ms }));
                true
            }
            None => false,
        }
    }

    /// Fail the in-flight request and every backlog entry. Used on
    /// transport failure and disconnect; no retries happen at this layer.
    pub(crate) fn fail_all(&mut self, mut error: impl FnMut() -> LinkError) {
        if let Some(flight) = self.in_flight.take() {
            flight.request.finish(Err(error()));
        }
        for request in self.backlog.drain(..) {
            request.finish(Err(error()));
        }
    }

    /// Cancel everything: the backlog completes with `Cancelled`, and the
    /// in-flight context is dropped the same way, so a late reply will find
    /// no matching context and be discarded. The frame already written to
    /// the transport cannot be retracted.
    pub(crate) fn cancel(&mut self) {
        self.fail_all(|| LinkError::Cancelled);
    }

    /// Backlog depth, for logging.
    pub(crate) fn backlog_len(&self) -> usize {
        self.backlog.len()
    }
}

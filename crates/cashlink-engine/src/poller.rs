//! Poll-injection state machine.
//!
//! The scheduler keeps the link alive by injecting a lightweight status
//! command on a fixed tick, but only when nothing else is talking. Any
//! send (poll or application command) suppresses polling; when the slot
//! frees again, polling does not resume immediately but only after a
//! debounce delay, because the transport callback can fire asynchronously
//! close to a tick boundary and a poll could otherwise race a reply still
//! in transit.
//!
//! Polling only ever self-suppresses. It never delays or blocks an
//! application command.

use std::time::Duration;
use tokio::time::Instant;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollState {
    /// May inject a poll on the next tick (if the dispatch slot is idle).
    Idle,
    /// A command is outstanding; no polls.
    CommandInFlight,
    /// A command just completed; polls stay suppressed until the instant.
    Debouncing { until: Instant },
}

/// Decides, tick by tick, whether a status poll may be injected.
#[derive(Debug)]
pub(crate) struct Poller {
    state: PollState,
    debounce: Duration,
}

impl Poller {
    pub(crate) fn new(debounce: Duration) -> Self {
        Poller {
            state: PollState::Idle,
            debounce,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PollState {
        self.state
    }

    /// A tick fired. Returns `true` if a poll should be sent now.
    ///
    /// `slot_idle` is re-checked even in `Idle` state: the dispatcher's
    /// slot is authoritative and a poll must never collide with an
    /// outstanding command.
    pub(crate) fn on_tick(&mut self, now: Instant, slot_idle: bool) -> bool {
        match self.state {
            PollState::Idle => slot_idle,
            PollState::CommandInFlight => false,
            PollState::Debouncing { until } => {
                if now >= until {
                    self.state = PollState::Idle;
                    slot_idle
                } else {
                    false
                }
            }
        }
    }

    /// Any command (poll or application) was written to the transport.
    pub(crate) fn on_sent(&mut self) {
        self.state = PollState::CommandInFlight;
    }

    /// The dispatch slot returned to idle; start the debounce window.
    pub(crate) fn on_slot_idle(&mut self, now: Instant) {
        self.state = PollState::Debouncing {
            until: now + self.debounce,
        };
    }
}

//! A `Transport` backed by a pair of `crossbeam::channel`s, one per
//! direction — the same pattern `raya_engine`'s scheduler reactor uses
//! for its own cross-thread command queue.

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender};
use jpo_dbg_core::{Frame, Transport, TransportError};
use std::time::Duration;

/// One endpoint of a bidirectional channel pair. Construct both ends
/// together with [`ChannelTransport::pair`].
pub struct ChannelTransport {
    outbound: Sender<Frame>,
    inbound: Receiver<Frame>,
}

impl ChannelTransport {
    /// Build two linked endpoints: `(core_side, host_side)`. Frames sent
    /// on one side's `outbound` arrive on the other's `inbound`.
    pub fn pair() -> (Self, Self) {
        let (to_host, from_core) = crossbeam::channel::unbounded();
        let (to_core, from_host) = crossbeam::channel::unbounded();
        (
            ChannelTransport { outbound: to_host, inbound: from_host },
            ChannelTransport { outbound: to_core, inbound: from_core },
        )
    }
}

impl Transport for ChannelTransport {
    fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        self.outbound.send(frame.clone()).map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Frame>, TransportError> {
        match self.inbound.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Timeout),
        }
    }
}

/// The three-channel topology backing [`crate::router::route_forever`]:
/// one physical inbound stream, split by the router into "handled by the
/// dispatcher" and "forwarded to the interpreter's stopped-loop".
pub struct RoutedWiring {
    /// Transport the `Debugger` itself is built with.
    pub core_transport: ChannelTransport,
    /// The host sends every command here — the single physical link.
    pub host_cmd_tx: Sender<Frame>,
    /// The host receives every event/response here.
    pub host_event_rx: Receiver<Frame>,
    /// The router's input (same stream as `host_cmd_tx`'s other end).
    pub raw_inbound_rx: Receiver<Frame>,
    /// The router forwards undispatched frames here; feeds
    /// `core_transport`'s inbound side.
    pub to_interpreter_tx: Sender<Frame>,
}

impl RoutedWiring {
    pub fn new() -> Self {
        let (host_cmd_tx, raw_inbound_rx) = crossbeam::channel::unbounded();
        let (to_interpreter_tx, to_interpreter_rx) = crossbeam::channel::unbounded();
        let (to_host_tx, host_event_rx) = crossbeam::channel::unbounded();
        let core_transport = ChannelTransport { outbound: to_host_tx, inbound: to_interpreter_rx };
        Self { core_transport, host_cmd_tx, host_event_rx, raw_inbound_rx, to_interpreter_tx }
    }
}

impl Default for RoutedWiring {
    fn default() -> Self {
        Self::new()
    }
}

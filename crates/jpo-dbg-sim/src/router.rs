//! Splits one physical inbound stream into the two execution contexts
//! the core assumes: every inbound frame is offered to the
//! command dispatcher (C5) first; whatever it declines is forwarded to
//! the interpreter context's own queue, where the control state
//! machine's stopped-loop (C4) picks it up.

use crossbeam::channel::{Receiver, Sender};
use jpo_dbg_core::{DispatchOutcome, Dispatcher, Frame};

/// Runs until `raw_inbound` disconnects. Intended to run on its own
/// thread — the "inbound-handler execution context".
pub fn route_forever(raw_inbound: &Receiver<Frame>, dispatcher: &Dispatcher<'_>, to_interpreter: &Sender<Frame>) {
    while let Ok(frame) = raw_inbound.recv() {
        if dispatcher.handle(&frame) == DispatchOutcome::NotHandled && to_interpreter.send(frame).is_err() {
            return;
        }
    }
}

//! Command dispatcher (C5): the inbound-handler side of the debugger.
//!
//! Runs on whatever execution context receives frames off the transport —
//! the "second execution context" alongside the interpreter. Handles the
//! commands that change control state directly; everything else is left
//! for C4's own receive loop inside the stopped-loop, so this dispatcher
//! reports `NotHandled` rather than silently dropping it.

use crate::codec::{tags, Frame};
use crate::config::MUTEX_TIMEOUT;
use crate::control::InterpreterInterrupt;
use crate::state::{ControlStatus, DebuggerState};
use crate::symbols::FileSymbolResolver;
use parking_lot::Mutex;

/// Whether the dispatcher consumed the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    NotHandled,
}

/// Routes inbound frames against the shared control state.
///
/// `TERMINATE` is always handled, at any status including `NotEnabled`.
/// `START` is always handled too — it's the only way a stopped session
/// ever becomes active, so gating it behind "already active" would make
/// it unreachable. `PAUSE`, `SET_BREAKPOINTS`, and
/// `SET_EXCEPTION_BREAKPOINTS` require an active session.
pub struct Dispatcher<'a> {
    state: &'a Mutex<DebuggerState>,
    resolver: &'a dyn FileSymbolResolver,
    interrupt: &'a dyn InterpreterInterrupt,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        state: &'a Mutex<DebuggerState>,
        resolver: &'a dyn FileSymbolResolver,
        interrupt: &'a dyn InterpreterInterrupt,
    ) -> Self {
        Self { state, resolver, interrupt }
    }

    pub fn handle(&self, frame: &Frame) -> DispatchOutcome {
        if frame.tag == tags::TERMINATE {
            self.interrupt.raise_keyboard_interrupt();
            return DispatchOutcome::Handled;
        }

        let mut guard = match self.state.try_lock_for(MUTEX_TIMEOUT) {
            Some(g) => g,
            None => {
                eprintln!("jpo-dbg: dispatcher mutex timed out on {:?}", frame.tag);
                return DispatchOutcome::NotHandled;
            }
        };

        if frame.tag == tags::START {
            guard.reset_for_start();
            return DispatchOutcome::Handled;
        }

        if guard.status == ControlStatus::NotEnabled {
            return DispatchOutcome::NotHandled;
        }

        match frame.tag {
            tags::PAUSE => {
                guard.status = ControlStatus::PauseRequested;
                DispatchOutcome::Handled
            }
            tags::SET_BREAKPOINTS => {
                if let Err(e) = guard.breakpoints.replace_for_file(&frame.payload, self.resolver) {
                    eprintln!("jpo-dbg: set breakpoints failed: {e}");
                }
                DispatchOutcome::Handled
            }
            tags::SET_EXCEPTION_BREAKPOINTS => match frame.payload.first() {
                Some(&b) => {
                    guard.break_on_exceptions = b != 0;
                    DispatchOutcome::Handled
                }
                None => {
                    eprintln!("jpo-dbg: empty DBG_EBRK payload");
                    DispatchOutcome::NotHandled
                }
            },
            _ => DispatchOutcome::NotHandled,
        }
    }
}

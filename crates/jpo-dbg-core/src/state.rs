//! Shared, process-wide debugger state.
//!
//! `status`, `break_on_exceptions`, the breakpoint table, and the step
//! anchor are a single aggregate behind one mutex, mirroring
//! `SharedVmState`'s one-struct-many-fields design: everything a worker
//! context might touch lives behind a single lock rather than scattered
//! atomics, so a reader never observes a torn combination of fields.

use crate::breakpoints::BreakpointTable;

/// Control status. `NotEnabled` is both the initial state and
/// the terminal state on program completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    NotEnabled,
    Starting,
    Running,
    PauseRequested,
    StepInto,
    StepOver,
    StepOut,
    Stopped,
    StoppedTemp,
}

impl ControlStatus {
    pub fn is_step(self) -> bool {
        matches!(self, ControlStatus::StepInto | ControlStatus::StepOver | ControlStatus::StepOut)
    }
}

/// Why the core most recently stopped, rendered as the `DBG_STOP` reason
/// tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Starting,
    Paused,
    Breakpoint,
    StepInto,
    StepOver,
    StepOut,
    Exception,
}

impl StopReason {
    pub fn tag(self) -> crate::codec::Tag {
        use crate::codec::stop_reasons::*;
        match self {
            StopReason::Starting => STARTING,
            StopReason::Paused => PAUSED,
            StopReason::Breakpoint => BREAKPOINT,
            StopReason::StepInto => STEP_INTO,
            StopReason::StepOver => STEP_OVER,
            StopReason::StepOut => STEP_OUT,
            StopReason::Exception => EXCEPTION,
        }
    }
}

/// The process-wide aggregate shared by the interpreter context and the
/// inbound-handler context, guarded by a single mutex.
pub struct DebuggerState {
    pub status: ControlStatus,
    pub break_on_exceptions: bool,
    pub breakpoints: BreakpointTable,
    /// Call depth captured when a step command was issued. Only
    /// meaningful while `status.is_step()`.
    pub step_anchor: Option<u32>,
    /// Status to restore when a module-load pause's `CONTINUE` arrives.
    pub pre_pause_status: Option<ControlStatus>,
}

impl Default for DebuggerState {
    fn default() -> Self {
        Self::new()
    }
}

impl DebuggerState {
    pub fn new() -> Self {
        Self {
            status: ControlStatus::NotEnabled,
            break_on_exceptions: true,
            breakpoints: BreakpointTable::new(),
            step_anchor: None,
            pre_pause_status: None,
        }
    }

    /// `START`: reset the breakpoint table, clear the step anchor, move to
    /// `Starting`. Leaves `break_on_exceptions` alone — a fresh run still
    /// respects whatever exception-breakpoint toggle was set before it.
    pub fn reset_for_start(&mut self) {
        self.breakpoints.clear_all();
        self.step_anchor = None;
        self.pre_pause_status = None;
        self.status = ControlStatus::Starting;
    }

    /// Program termination: reset all state to
    /// `NotEnabled`, the terminal/initial state.
    pub fn reset_to_not_enabled(&mut self) {
        self.breakpoints.clear_all();
        self.step_anchor = None;
        self.pre_pause_status = None;
        self.break_on_exceptions = true;
        self.status = ControlStatus::NotEnabled;
    }

    /// Enter a `Step*` status, capturing the anchor depth (the step anchor
    /// is set exactly when transitioning into `Step*`).
    pub fn enter_step(&mut self, status: ControlStatus, anchor_depth: u32) {
        debug_assert!(status.is_step());
        self.step_anchor = Some(anchor_depth);
        self.status = status;
    }
}

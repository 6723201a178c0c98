//! On-device debugger core
//!
//! This crate provides the interpreter-agnostic half of a source-level
//! debugger embedded in a microcontroller-hosted dynamic-language
//! runtime:
//! - **Codec**: fixed 8-byte wire tags, length-tagged payloads, request/
//!   response correlation by frame id (`codec` module)
//! - **Breakpoints**: a fixed-capacity, always-compacted breakpoint table
//!   (`breakpoints` module)
//! - **Inspection**: paginated stack/variable/exception responses with
//!   a precise end-of-stream contract (`inspect` module)
//! - **Control**: the trace-hook-driven state machine that pauses and
//!   resumes interpreter execution (`control` module)
//! - **Dispatch**: the inbound command router running on the second
//!   execution context (`dispatch` module)
//!
//! The core never depends on a concrete interpreter. Everything it needs
//! — call frames, values, module registries, file symbols — comes in
//! through the trait boundary in the `traits` module; a host interpreter
//! implements those traits and owns the transport.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod breakpoints;
mod codec;
mod config;
mod control;
mod dispatch;
mod inspect;
mod state;
mod symbols;
mod traits;

pub use breakpoints::{Breakpoint, BreakpointError, BreakpointTable};
pub use codec::{
    build_module_loaded_frame, stop_reasons, tags, truncate_with_ellipsis, CodecError, Frame,
    FrameBuilder, IdAllocator, PayloadReader, Tag, Transport, TransportError,
};
pub use config::{
    BP_CAPACITY, END_TOKEN, MAX_NAME_LEN, MAX_PAYLOAD, MAX_VALUE_LEN, MUTEX_TIMEOUT,
    RECV_POLL_TIMEOUT,
};
pub use control::{Debugger, InterpreterInterrupt, TraceEvent};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use inspect::{
    decode_stack_request, decode_variables_request, exception_response, stack_response,
    variables_response, InspectError, InspectionSource, ScopeKind, VariablesRequest,
};
pub use state::{ControlStatus, DebuggerState, StopReason};
pub use symbols::{FileSymbol, FileSymbolResolver};
pub use traits::{
    kind_bits, CooperativeYield, FrameChain, FrameLocals, FrameView, LocalNamePrelude,
    ModuleRegistries, NamedChild, ObjectResolver, ObjectView, ValueKind, ValueView, VarKind,
};

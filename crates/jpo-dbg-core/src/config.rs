//! Compile-time configuration.
//!
//! Everything the debugger core needs is a constant: no environment
//! variables, no command-line flags, no on-disk state. Mirrors
//! `SharedVmState::max_preemptions` / `preempt_threshold_ms` — tunables
//! that live in code, not config files.

use std::time::Duration;

/// Fixed capacity of the breakpoint table.
pub const BP_CAPACITY: usize = 100;

/// Mutex acquire timeout shared by the two execution contexts.
pub const MUTEX_TIMEOUT: Duration = Duration::from_millis(100);

/// Maximum payload bytes in a single wire frame (`P_max`).
pub const MAX_PAYLOAD: usize = 256;

/// Maximum rendered length of a variable's displayed value.
pub const MAX_VALUE_LEN: usize = 200;

/// Maximum rendered length of a variable or file name.
pub const MAX_NAME_LEN: usize = 32;

/// Timeout used by the stopped-loop's blocking receive between polls of
/// the interpreter's cooperative event-poll hook.
pub const RECV_POLL_TIMEOUT: Duration = Duration::from_millis(50);

/// Literal end-of-stream marker appended to a fully-drained response.
pub const END_TOKEN: &[u8] = b"<end>\0";

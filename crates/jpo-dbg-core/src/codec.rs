//! Wire codec (C1): fixed 8-byte tags, length-tagged payloads, request/response
//! correlation by numeric id.
//!
//! Every frame is `<u32 id><8-byte ASCII tag><payload>`, payload bounded by
//! [`crate::config::MAX_PAYLOAD`]. Responses reuse their request's id;
//! unsolicited events (`DBG_STOP`, `DBG_DONE`, `DBG_MODL`) get a fresh one.

use crate::symbols::FileSymbol;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// An 8-byte ASCII wire tag, space- or underscore-padded.
pub type Tag = [u8; 8];

/// Inbound command and outbound event/response tags used by the core.
pub mod tags {
    use super::Tag;

    pub const TERMINATE: Tag = *b"DBG_TRMT";
    pub const START: Tag = *b"DBG_STRT";
    pub const PAUSE: Tag = *b"DBG_PAUS";
    pub const CONTINUE: Tag = *b"DBG_CONT";
    pub const STEP_INTO: Tag = *b"DBG_SINT";
    pub const STEP_OVER: Tag = *b"DBG_SOVR";
    pub const STEP_OUT: Tag = *b"DBG_SOUT";
    pub const SET_BREAKPOINTS: Tag = *b"DBG_BRKP";
    pub const SET_EXCEPTION_BREAKPOINTS: Tag = *b"DBG_EBRK";
    pub const STACK_REQUEST: Tag = *b"DBG_STAC";
    pub const VARIABLES_REQUEST: Tag = *b"DBG_VARS";
    pub const EXCEPTION_REQUEST: Tag = *b"DBG_EXCP";

    pub const DONE: Tag = *b"DBG_DONE";
    pub const STOPPED: Tag = *b"DBG_STOP";
    pub const MODULE_LOADED: Tag = *b"DBG_MODL";
}

/// `DBG_STOP` reason tags (8 ASCII bytes).
pub mod stop_reasons {
    use super::Tag;

    pub const STARTING: Tag = *b":STARTIN";
    pub const PAUSED: Tag = *b":PAUSED_";
    pub const BREAKPOINT: Tag = *b":BREAKPT";
    pub const STEP_INTO: Tag = *b":SINT___";
    pub const STEP_OVER: Tag = *b":SOVR___";
    pub const STEP_OUT: Tag = *b":SOUT___";
    pub const EXCEPTION: Tag = *b":EXCEPT_";
}

/// A decoded or to-be-sent wire frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: u32,
    pub tag: Tag,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Total size on the wire (id + tag + payload), for bookkeeping and
    /// overflow checks prior to appending a candidate record.
    pub fn wire_len(&self) -> usize {
        4 + 8 + self.payload.len()
    }
}

/// Errors surfaced while building or reading a frame's payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Appending would exceed `MAX_PAYLOAD`. Callers either stop streaming
    /// (inspection services) or truncate in place (see `inspect`).
    #[error("payload buffer full (capacity {capacity})")]
    BufferFull { capacity: usize },

    /// A read ran past the end of the payload.
    #[error("read past end of payload at offset {offset}")]
    Truncated { offset: usize },

    /// A zero-terminated string field had no terminator within the payload.
    #[error("unterminated string at offset {offset}")]
    Unterminated { offset: usize },
}

/// Errors surfaced by the framed-message transport. Never fatal to the
/// core — callers log and continue.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("receive timed out")]
    Timeout,
}

/// Incrementally assembles one outbound frame's payload.
///
/// Construction never panics on overflow: every `append_*` returns
/// `Result<(), CodecError>` so streaming callers can stop cleanly and send
/// what fit — never partially write a record.
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    id: u32,
    tag: Tag,
    payload: Vec<u8>,
}

impl FrameBuilder {
    /// Start building an unsolicited event frame with a fresh id.
    pub fn event(ids: &IdAllocator, tag: Tag) -> Self {
        Self { id: ids.next(), tag, payload: Vec::new() }
    }

    /// Start building a response frame, reusing the request's id.
    pub fn response(tag: Tag, request_id: u32) -> Self {
        Self { id: request_id, tag, payload: Vec::new() }
    }

    /// Bytes remaining before `MAX_PAYLOAD` is hit.
    pub fn remaining(&self) -> usize {
        crate::config::MAX_PAYLOAD.saturating_sub(self.payload.len())
    }

    /// Current payload length.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Roll the payload back to `len` bytes (used to discard a record that
    /// was partially appended before an overflow was detected).
    pub fn set_payload_length(&mut self, len: usize) {
        self.payload.truncate(len);
    }

    /// Patch a single already-written byte (used to backfill the
    /// `contains_kinds` prefix once enumeration has finished).
    pub fn set_u8_at(&mut self, offset: usize, value: u8) {
        self.payload[offset] = value;
    }

    pub fn append_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        if self.payload.len() + bytes.len() > crate::config::MAX_PAYLOAD {
            return Err(CodecError::BufferFull { capacity: crate::config::MAX_PAYLOAD });
        }
        self.payload.extend_from_slice(bytes);
        Ok(())
    }

    pub fn append_u8(&mut self, v: u8) -> Result<(), CodecError> {
        self.append_bytes(&[v])
    }

    pub fn append_u32_le(&mut self, v: u32) -> Result<(), CodecError> {
        self.append_bytes(&v.to_le_bytes())
    }

    /// Append `s` with no length cap, followed by a NUL terminator.
    pub fn append_zstr(&mut self, s: &str) -> Result<(), CodecError> {
        self.append_bytes(s.as_bytes())?;
        self.append_bytes(&[0])
    }

    /// Append raw string bytes with no terminator (used for `DBG_MODL`'s
    /// trailing source-file name).
    pub fn append_raw_str(&mut self, s: &str) -> Result<(), CodecError> {
        self.append_bytes(s.as_bytes())
    }

    /// Finish building, producing the wire frame.
    pub fn finish(self) -> Frame {
        Frame { id: self.id, tag: self.tag, payload: self.payload }
    }
}

/// Truncate `s` to at most `max_len` bytes, replacing the trailing three
/// bytes with `...` when truncation occurs.
pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".chars().take(max_len).collect();
    }
    let mut cut = max_len - 3;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    let mut out = String::with_capacity(max_len);
    out.push_str(&s[..cut]);
    out.push_str("...");
    out
}

/// Offset-based reader over a received payload.
pub struct PayloadReader<'a> {
    bytes: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, CodecError> {
        self.bytes.get(offset).copied().ok_or(CodecError::Truncated { offset })
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32, CodecError> {
        let slice = self
            .bytes
            .get(offset..offset + 4)
            .ok_or(CodecError::Truncated { offset })?;
        Ok(u32::from_le_bytes(slice.try_into().unwrap()))
    }

    /// Index of the first `byte` at or after `offset`, if any.
    pub fn find_byte_from(&self, offset: usize, byte: u8) -> Option<usize> {
        self.bytes[offset.min(self.bytes.len())..]
            .iter()
            .position(|&b| b == byte)
            .map(|i| i + offset)
    }

    /// Read a zero-terminated string starting at `offset`; returns the
    /// string and the offset just past the terminator.
    pub fn read_zstr(&self, offset: usize) -> Result<(&'a str, usize), CodecError> {
        let end = self
            .find_byte_from(offset, 0)
            .ok_or(CodecError::Unterminated { offset })?;
        let s = std::str::from_utf8(&self.bytes[offset..end])
            .map_err(|_| CodecError::Truncated { offset })?;
        Ok((s, end + 1))
    }

    /// Read a fixed-length raw (non-terminated) string to the end of the
    /// payload, starting at `offset`.
    pub fn read_str_to_end(&self, offset: usize) -> Result<&'a str, CodecError> {
        let slice = self.bytes.get(offset..).ok_or(CodecError::Truncated { offset })?;
        std::str::from_utf8(slice).map_err(|_| CodecError::Truncated { offset })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Monotonic id generator for unsolicited event frames.
#[derive(Debug, Default)]
pub struct IdAllocator(AtomicU32);

impl IdAllocator {
    pub fn new() -> Self {
        Self(AtomicU32::new(1))
    }

    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// The bidirectional framed-message link. Implemented by the transport
/// layer (out of scope for this crate): the core only assumes
/// at-most-once delivery of complete frames and a blocking receive with a
/// timeout.
pub trait Transport {
    /// Send a frame. Failure is logged by the caller, never fatal.
    fn send(&self, frame: &Frame) -> Result<(), TransportError>;

    /// Block for up to `timeout` waiting for the next inbound frame.
    /// `Ok(None)` means the timeout elapsed with nothing received.
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Frame>, TransportError>;
}

/// Renders a file symbol and its source name into a `DBG_MODL` payload:
/// `<u32 module-symbol-id><raw source-file name>`.
pub fn build_module_loaded_frame(
    ids: &IdAllocator,
    symbol: FileSymbol,
    source_file: &str,
) -> Result<Frame, CodecError> {
    let mut b = FrameBuilder::event(ids, tags::MODULE_LOADED);
    b.append_u32_le(symbol.get() as u32)?;
    b.append_raw_str(source_file)?;
    Ok(b.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_appends_and_finishes() {
        let ids = IdAllocator::new();
        let mut b = FrameBuilder::event(&ids, tags::DONE);
        b.append_u32_le(7).unwrap();
        let frame = b.finish();
        assert_eq!(frame.tag, tags::DONE);
        assert_eq!(frame.payload, 7u32.to_le_bytes());
    }

    #[test]
    fn response_reuses_request_id() {
        let frame = FrameBuilder::response(tags::STOPPED, 42).finish();
        assert_eq!(frame.id, 42);
    }

    #[test]
    fn append_bytes_rejects_overflow() {
        let ids = IdAllocator::new();
        let mut b = FrameBuilder::event(&ids, tags::STOPPED);
        let big = vec![0u8; crate::config::MAX_PAYLOAD + 1];
        assert!(matches!(b.append_bytes(&big), Err(CodecError::BufferFull { .. })));
    }

    #[test]
    fn zstr_round_trips_through_reader() {
        let ids = IdAllocator::new();
        let mut b = FrameBuilder::event(&ids, tags::STACK_REQUEST);
        b.append_zstr("main.py").unwrap();
        b.append_u32_le(10).unwrap();
        let frame = b.finish();
        let r = PayloadReader::new(&frame.payload);
        let (name, next) = r.read_zstr(0).unwrap();
        assert_eq!(name, "main.py");
        assert_eq!(r.read_u32_le(next).unwrap(), 10);
    }

    #[test]
    fn truncation_appends_ellipsis() {
        let s = "a".repeat(10);
        let t = truncate_with_ellipsis(&s, 5);
        assert_eq!(t, "aa...");
        assert_eq!(t.len(), 5);
    }

    #[test]
    fn truncation_is_noop_when_short_enough() {
        assert_eq!(truncate_with_ellipsis("hi", 5), "hi");
    }

    #[test]
    fn find_byte_from_locates_terminator() {
        let data = b"abc\0def\0";
        let r = PayloadReader::new(data);
        assert_eq!(r.find_byte_from(0, 0), Some(3));
        assert_eq!(r.find_byte_from(4, 0), Some(7));
    }
}

//! Cross-context integration tests: an "interpreter" thread drives trace
//! events through [`Debugger`], a second "host" thread sends commands
//! over a pair of `crossbeam::channel`s, mirroring the two
//! execution-context model the control state machine assumes.

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use jpo_dbg_core::{
    tags, CooperativeYield, Frame, FrameChain, FrameLocals, FrameView, FileSymbol,
    LocalNamePrelude, ModuleRegistries, NamedChild, ObjectResolver, ObjectView, TraceEvent,
    Transport, TransportError, ValueKind, ValueView, Debugger, ControlStatus, InspectionSource,
};
use std::thread;
use std::time::Duration;

/// A `Transport` backed by a pair of channels: `outbound` carries frames
/// the core sends (events/responses), `inbound` carries frames the host
/// sends (commands).
struct ChannelTransport {
    outbound: Sender<Frame>,
    inbound: Receiver<Frame>,
}

impl Transport for ChannelTransport {
    fn send(&self, frame: &Frame) -> Result<(), TransportError> {
        self.outbound
            .send(frame.clone())
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }

    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Frame>, TransportError> {
        match self.inbound.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(TransportError::Timeout),
        }
    }
}

struct NoopYield;
impl CooperativeYield for NoopYield {
    fn poll(&self) {}
}

struct EmptyObj;
impl ObjectView for EmptyObj {
    fn kind(&self) -> ValueKind {
        ValueKind::Dict
    }
    fn len(&self) -> usize {
        0
    }
    fn index_child(&self, _i: usize) -> Option<Box<dyn ValueView>> {
        None
    }
    fn iter_named(&self) -> Box<dyn Iterator<Item = NamedChild> + '_> {
        Box::new(std::iter::empty())
    }
}

struct NoLocals;
impl FrameLocals for NoLocals {
    fn slot_count(&self) -> usize {
        0
    }
    fn slot_value(&self, _i: usize) -> Box<dyn ValueView> {
        unreachable!()
    }
}
struct NoNames;
impl LocalNamePrelude for NoNames {
    fn name_for_local_index(&self, _i: usize) -> Option<&str> {
        None
    }
}

struct MainFrame;
impl FrameView for MainFrame {
    fn file_symbol(&self) -> FileSymbol {
        FileSymbol::new(1).unwrap()
    }
    fn file_name(&self) -> &str {
        "main.py"
    }
    fn block_name(&self) -> &str {
        "<module>"
    }
    fn line(&self) -> u32 {
        5
    }
    fn depth(&self) -> u32 {
        0
    }
    fn locals(&self) -> &dyn FrameLocals {
        &NoLocals
    }
    fn local_names(&self) -> &dyn LocalNamePrelude {
        &NoNames
    }
    fn globals(&self) -> &dyn ObjectView {
        &EmptyObj
    }
}

struct OneFrameChain;
impl FrameChain for OneFrameChain {
    fn len(&self) -> u32 {
        1
    }
    fn frame(&self, index: u32) -> Option<&dyn FrameView> {
        if index == 0 {
            Some(&MainFrame)
        } else {
            None
        }
    }
}
struct NoModules;
impl ModuleRegistries for NoModules {
    fn builtin(&self) -> &dyn ObjectView {
        &EmptyObj
    }
    fn extensible(&self) -> &dyn ObjectView {
        &EmptyObj
    }
    fn frozen(&self) -> &dyn ObjectView {
        &EmptyObj
    }
}
struct NoObjects;
impl ObjectResolver for NoObjects {
    fn resolve(&self, _addr: u32) -> Option<Box<dyn ObjectView>> {
        None
    }
}
struct Source;
impl InspectionSource for Source {
    fn frames(&self) -> &dyn FrameChain {
        &OneFrameChain
    }
    fn modules(&self) -> &dyn ModuleRegistries {
        &NoModules
    }
    fn objects(&self) -> &dyn ObjectResolver {
        &NoObjects
    }
}

/// A breakpoint hit blocks the "interpreter" thread inside
/// `on_trace_event` until the "host" thread, running concurrently, sends
/// `CONTINUE` — and a `DBG_STOP` event crosses first.
#[test]
fn breakpoint_hit_blocks_until_continue_arrives() {
    let (to_core_tx, to_core_rx) = bounded::<Frame>(8);
    let (from_core_tx, from_core_rx) = bounded::<Frame>(8);
    let transport = ChannelTransport { outbound: from_core_tx, inbound: to_core_rx };
    let dbg = Debugger::new(transport);
    dbg.state.lock().status = ControlStatus::Running;
    dbg.state.lock().breakpoints.set(FileSymbol::new(1).unwrap(), 5).unwrap();

    let host = thread::spawn(move || {
        // Wait for the stop event before resuming, so we know the
        // interpreter thread is actually blocked in the stopped-loop.
        let stopped = from_core_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(stopped.tag, tags::STOPPED);
        to_core_tx.send(Frame { id: 99, tag: tags::CONTINUE, payload: vec![] }).unwrap();
        from_core_rx
    });

    dbg.on_trace_event(TraceEvent::Line, &MainFrame, &Source, &NoopYield);

    host.join().unwrap();
    assert_eq!(dbg.state.lock().status, ControlStatus::Running);
}

/// A `DBG_STAC` request arriving while stopped gets a response before
/// the loop eventually resumes on `CONTINUE`.
#[test]
fn stack_request_is_serviced_while_stopped() {
    let (to_core_tx, to_core_rx) = bounded::<Frame>(8);
    let (from_core_tx, from_core_rx) = bounded::<Frame>(8);
    let transport = ChannelTransport { outbound: from_core_tx, inbound: to_core_rx };
    let dbg = Debugger::new(transport);
    dbg.state.lock().status = ControlStatus::PauseRequested;

    let host = thread::spawn(move || {
        let stopped = from_core_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(stopped.tag, tags::STOPPED);

        to_core_tx
            .send(Frame { id: 1, tag: tags::STACK_REQUEST, payload: 0u32.to_le_bytes().to_vec() })
            .unwrap();
        let stack = from_core_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(stack.tag, tags::STACK_REQUEST);
        assert_eq!(stack.id, 1);

        to_core_tx.send(Frame { id: 2, tag: tags::CONTINUE, payload: vec![] }).unwrap();
    });

    dbg.on_trace_event(TraceEvent::Line, &MainFrame, &Source, &NoopYield);
    host.join().unwrap();
    assert_eq!(dbg.state.lock().status, ControlStatus::Running);
}

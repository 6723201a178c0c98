//! Control state machine (C4): the trace-hook side of the debugger.
//!
//! Runs on the interpreter's own execution context. `on_trace_event` is
//! called from the bytecode dispatch loop's LINE/CALL/RETURN/EXCEPTION
//! hook points; when it decides to stop, it blocks that context inside
//! `loop_while_stopped`, servicing stack/variable/exception requests and
//! step/continue commands until the interpreter is told to resume.

use crate::codec::{tags, Frame, FrameBuilder, IdAllocator, Transport};
use crate::config::{MUTEX_TIMEOUT, RECV_POLL_TIMEOUT};
use crate::inspect::{
    decode_stack_request, decode_variables_request, exception_response, stack_response,
    variables_response, InspectionSource,
};
use crate::state::{ControlStatus, DebuggerState, StopReason};
use crate::symbols::{FileSymbol, FileSymbolResolver};
use crate::traits::{CooperativeYield, FrameView};
use parking_lot::Mutex;

/// One trace-hook callback. `Exception` carries the rendered
/// traceback text, cached for a later `DBG_EXCP` request.
pub enum TraceEvent {
    Line,
    Call,
    Return,
    Exception(String),
}

/// Raises the host's equivalent of a keyboard interrupt inside the
/// running interpreter, in response to `TERMINATE`. Implemented by the
/// interpreter (out of scope for this crate).
///
/// `Send + Sync` because `TERMINATE` is handled by the dispatcher on the
/// inbound-handler context, a different thread than the interpreter it
/// interrupts.
pub trait InterpreterInterrupt: Send + Sync {
    fn raise_keyboard_interrupt(&self);
}

/// The debugger core: shared state plus the outbound half of the wire
/// link. One instance per interpreter process.
pub struct Debugger<T: Transport> {
    pub state: Mutex<DebuggerState>,
    pub ids: IdAllocator,
    transport: T,
}

impl<T: Transport> Debugger<T> {
    pub fn new(transport: T) -> Self {
        Self { state: Mutex::new(DebuggerState::new()), ids: IdAllocator::new(), transport }
    }

    fn send(&self, frame: Frame) {
        if let Err(e) = self.transport.send(&frame) {
            eprintln!("jpo-dbg: send failed for {:?}: {e}", frame.tag);
        }
    }

    /// Entry point for the trace hook. Does nothing observable unless the
    /// event causes a stop.
    pub fn on_trace_event(
        &self,
        event: TraceEvent,
        frame: &dyn FrameView,
        source: &dyn InspectionSource,
        yielder: &dyn CooperativeYield,
    ) {
        let exception_text = match event {
            TraceEvent::Call | TraceEvent::Return => return,
            TraceEvent::Line => None,
            TraceEvent::Exception(text) => Some(text),
        };

        let mut guard = match self.state.try_lock_for(MUTEX_TIMEOUT) {
            Some(g) => g,
            None => {
                eprintln!("jpo-dbg: control mutex timed out in trace hook, skipping event");
                return;
            }
        };

        let hit = guard.breakpoints.is_set(frame.file_symbol(), frame.line() as u16);
        let mut reason = if hit { Some(StopReason::Breakpoint) } else { None };
        if hit {
            guard.status = ControlStatus::Stopped;
        }
        if exception_text.is_some() && guard.break_on_exceptions {
            reason = Some(StopReason::Exception);
            guard.status = ControlStatus::Stopped;
        }

        match guard.status {
            ControlStatus::Running => return,
            ControlStatus::Starting => {
                reason.get_or_insert(StopReason::Starting);
                guard.status = ControlStatus::Stopped;
            }
            ControlStatus::PauseRequested => {
                reason.get_or_insert(StopReason::Paused);
                guard.status = ControlStatus::Stopped;
            }
            ControlStatus::StepInto => {
                reason.get_or_insert(StopReason::StepInto);
                guard.status = ControlStatus::Stopped;
            }
            ControlStatus::StepOut => {
                let anchor = guard.step_anchor.unwrap_or(0);
                if frame.depth() < anchor {
                    reason.get_or_insert(StopReason::StepOut);
                    guard.status = ControlStatus::Stopped;
                } else {
                    return;
                }
            }
            ControlStatus::StepOver => {
                let anchor = guard.step_anchor.unwrap_or(0);
                if frame.depth() <= anchor {
                    reason.get_or_insert(StopReason::StepOver);
                    guard.status = ControlStatus::Stopped;
                } else {
                    return;
                }
            }
            ControlStatus::Stopped => {
                // Re-entrancy: already stopped (possibly just now, via the
                // breakpoint/exception check above). Fall through.
            }
            ControlStatus::NotEnabled | ControlStatus::StoppedTemp => {
                eprintln!("jpo-dbg: trace event while {:?}, ignoring", guard.status);
                return;
            }
        }
        drop(guard);

        if let Some(reason) = reason {
            self.emit_stopped(reason);
        }
        self.loop_while_stopped(frame, source, exception_text.as_deref(), yielder);
    }

    fn emit_stopped(&self, reason: StopReason) {
        let mut b = FrameBuilder::event(&self.ids, tags::STOPPED);
        let _ = b.append_bytes(&reason.tag());
        self.send(b.finish());
    }

    /// Blocks the interpreter context servicing commands until resumed by
    /// `CONTINUE` or a step command.
    fn loop_while_stopped(
        &self,
        frame: &dyn FrameView,
        source: &dyn InspectionSource,
        exception: Option<&str>,
        yielder: &dyn CooperativeYield,
    ) {
        loop {
            match self.transport.recv_timeout(RECV_POLL_TIMEOUT) {
                Ok(Some(cmd)) => {
                    if self.handle_stopped_command(&cmd, frame, source, exception) {
                        return;
                    }
                }
                Ok(None) => yielder.poll(),
                Err(e) => {
                    eprintln!("jpo-dbg: transport error in stopped-loop: {e}");
                    yielder.poll();
                }
            }
        }
    }

    /// Returns `true` if the command resumes execution (breaking the loop).
    fn handle_stopped_command(
        &self,
        cmd: &Frame,
        frame: &dyn FrameView,
        source: &dyn InspectionSource,
        exception: Option<&str>,
    ) -> bool {
        match cmd.tag {
            tags::CONTINUE => {
                self.with_state(|s| s.status = ControlStatus::Running);
                true
            }
            tags::STEP_INTO => {
                self.with_state(|s| s.enter_step(ControlStatus::StepInto, frame.depth()));
                true
            }
            tags::STEP_OVER => {
                self.with_state(|s| s.enter_step(ControlStatus::StepOver, frame.depth()));
                true
            }
            tags::STEP_OUT => {
                self.with_state(|s| s.enter_step(ControlStatus::StepOut, frame.depth()));
                true
            }
            tags::STACK_REQUEST => {
                self.respond_stack(cmd, source);
                false
            }
            tags::VARIABLES_REQUEST => {
                self.respond_variables(cmd, source);
                false
            }
            tags::EXCEPTION_REQUEST => {
                self.respond_exception(cmd, exception);
                false
            }
            _ => false,
        }
    }

    fn with_state(&self, f: impl FnOnce(&mut DebuggerState)) {
        match self.state.try_lock_for(MUTEX_TIMEOUT) {
            Some(mut g) => f(&mut g),
            None => eprintln!("jpo-dbg: control mutex timed out servicing stopped-loop command"),
        }
    }

    fn respond_stack(&self, cmd: &Frame, source: &dyn InspectionSource) {
        let start = match decode_stack_request(&cmd.payload) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("jpo-dbg: malformed DBG_STAC payload: {e}");
                return;
            }
        };
        let mut b = FrameBuilder::response(tags::STACK_REQUEST, cmd.id);
        if let Err(e) = stack_response(source.frames(), start, &mut b) {
            eprintln!("jpo-dbg: stack_response failed: {e}");
            return;
        }
        self.send(b.finish());
    }

    fn respond_variables(&self, cmd: &Frame, source: &dyn InspectionSource) {
        let req = match decode_variables_request(&cmd.payload) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("jpo-dbg: malformed DBG_VARS payload: {e}");
                return;
            }
        };
        let mut b = FrameBuilder::response(tags::VARIABLES_REQUEST, cmd.id);
        if let Err(e) = variables_response(&req, source, &mut b) {
            eprintln!("jpo-dbg: variables_response failed: {e}");
            return;
        }
        self.send(b.finish());
    }

    fn respond_exception(&self, cmd: &Frame, exception: Option<&str>) {
        let mut b = FrameBuilder::response(tags::EXCEPTION_REQUEST, cmd.id);
        if let Err(e) = exception_response(exception.unwrap_or(""), &mut b) {
            eprintln!("jpo-dbg: exception_response failed: {e}");
            return;
        }
        self.send(b.finish());
    }

    /// Called after each module's bytecode finishes compiling (the
    /// module-load pause). Blocks the interpreter context accepting only
    /// `SET_BREAKPOINTS` and `CONTINUE` until resumed, restoring whatever
    /// status was active before the pause.
    pub fn on_module_loaded(&self, symbol: FileSymbol, source_file: &str, resolver: &dyn FileSymbolResolver) {
        {
            let mut guard = match self.state.try_lock_for(MUTEX_TIMEOUT) {
                Some(g) => g,
                None => {
                    eprintln!("jpo-dbg: control mutex timed out entering module-load pause");
                    return;
                }
            };
            guard.pre_pause_status = Some(guard.status);
            guard.status = ControlStatus::StoppedTemp;
        }

        match crate::codec::build_module_loaded_frame(&self.ids, symbol, source_file) {
            Ok(frame) => self.send(frame),
            Err(e) => eprintln!("jpo-dbg: failed to build DBG_MODL frame: {e}"),
        }

        loop {
            match self.transport.recv_timeout(RECV_POLL_TIMEOUT) {
                Ok(Some(cmd)) => match cmd.tag {
                    tags::SET_BREAKPOINTS => self.apply_set_breakpoints(&cmd, resolver),
                    tags::CONTINUE => {
                        self.with_state(|s| {
                            s.status = s.pre_pause_status.take().unwrap_or(ControlStatus::Running);
                        });
                        return;
                    }
                    _ => {}
                },
                Ok(None) => {}
                Err(e) => eprintln!("jpo-dbg: transport error in module-load pause: {e}"),
            }
        }
    }

    fn apply_set_breakpoints(&self, cmd: &Frame, resolver: &dyn FileSymbolResolver) {
        match self.state.try_lock_for(MUTEX_TIMEOUT) {
            Some(mut g) => {
                if let Err(e) = g.breakpoints.replace_for_file(&cmd.payload, resolver) {
                    eprintln!("jpo-dbg: set breakpoints failed: {e}");
                }
            }
            None => eprintln!("jpo-dbg: control mutex timed out applying breakpoints"),
        }
    }

    /// Called once the interpreter's top-level drive function has actually
    /// returned (normal exit or after a `TERMINATE`-raised interrupt).
    /// Emits `DBG_DONE` and resets to `NotEnabled`.
    pub fn on_program_done(&self, exit_code: i32) {
        let mut b = FrameBuilder::event(&self.ids, tags::DONE);
        let _ = b.append_u32_le(exit_code as u32);
        self.send(b.finish());

        match self.state.try_lock_for(MUTEX_TIMEOUT) {
            Some(mut g) => g.reset_to_not_enabled(),
            None => eprintln!("jpo-dbg: control mutex timed out resetting state on program done"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::TransportError;
    use crate::traits::{
        FrameChain, FrameLocals, LocalNamePrelude, ModuleRegistries, NamedChild, ObjectResolver,
        ObjectView, ValueKind, ValueView,
    };
    use std::time::Duration;

    struct RecordingTransport {
        sent: Mutex<Vec<Frame>>,
        inbound: Mutex<Vec<Frame>>,
    }
    impl RecordingTransport {
        fn new(inbound: Vec<Frame>) -> Self {
            let mut inbound = inbound;
            inbound.reverse(); // pop() from the back == first-in-first-out
            Self { sent: Mutex::new(Vec::new()), inbound: Mutex::new(inbound) }
        }
    }
    impl Transport for RecordingTransport {
        fn send(&self, frame: &Frame) -> Result<(), TransportError> {
            self.sent.lock().push(frame.clone());
            Ok(())
        }
        fn recv_timeout(&self, _timeout: Duration) -> Result<Option<Frame>, TransportError> {
            Ok(self.inbound.lock().pop())
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

    struct FixedLocals;
    impl FrameLocals for FixedLocals {
        fn slot_count(&self) -> usize {
            0
        }
        fn slot_value(&self, _i: usize) -> Box<dyn ValueView> {
            unreachable!()
        }
    }
    struct FixedNames;
    impl LocalNamePrelude for FixedNames {
        fn name_for_local_index(&self, _i: usize) -> Option<&str> {
            None
        }
    }

    struct StubFrame;
    impl FrameView for StubFrame {
        fn file_symbol(&self) -> FileSymbol {
            FileSymbol::new(1).unwrap()
        }
        fn file_name(&self) -> &str {
            "prog.py"
        }
        fn block_name(&self) -> &str {
            "main"
        }
        fn line(&self) -> u32 {
            1
        }
        fn depth(&self) -> u32 {
            0
        }
        fn locals(&self) -> &dyn FrameLocals {
            &FixedLocals
        }
        fn local_names(&self) -> &dyn LocalNamePrelude {
            &FixedNames
        }
        fn globals(&self) -> &dyn ObjectView {
            &EmptyObj
        }
    }

    struct EmptyChain;
    impl FrameChain for EmptyChain {
        fn len(&self) -> u32 {
            0
        }
        fn frame(&self, _i: u32) -> Option<&dyn FrameView> {
            None
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
    struct StubSource;
    impl InspectionSource for StubSource {
        fn frames(&self) -> &dyn FrameChain {
            &EmptyChain
        }
        fn modules(&self) -> &dyn ModuleRegistries {
            &NoModules
        }
        fn objects(&self) -> &dyn ObjectResolver {
            &NoObjects
        }
    }

    #[test]
    fn running_status_ignores_line_event() {
        let dbg = Debugger::new(RecordingTransport::new(vec![]));
        dbg.state.lock().status = ControlStatus::Running;
        dbg.on_trace_event(TraceEvent::Line, &StubFrame, &StubSource, &NoopYield);
        assert!(dbg.transport.sent.lock().is_empty());
        assert_eq!(dbg.state.lock().status, ControlStatus::Running);
    }

    #[test]
    fn starting_stops_and_continue_resumes() {
        let continue_frame = Frame { id: 1, tag: tags::CONTINUE, payload: vec![] };
        let dbg = Debugger::new(RecordingTransport::new(vec![continue_frame]));
        dbg.state.lock().status = ControlStatus::Starting;
        dbg.on_trace_event(TraceEvent::Line, &StubFrame, &StubSource, &NoopYield);

        assert_eq!(dbg.state.lock().status, ControlStatus::Running);
        let sent = dbg.transport.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].tag, tags::STOPPED);
        assert_eq!(sent[0].payload, crate::codec::stop_reasons::STARTING);
    }

    #[test]
    fn breakpoint_hit_stops_even_when_running() {
        let continue_frame = Frame { id: 1, tag: tags::CONTINUE, payload: vec![] };
        let dbg = Debugger::new(RecordingTransport::new(vec![continue_frame]));
        {
            let mut guard = dbg.state.lock();
            guard.status = ControlStatus::Running;
            guard.breakpoints.set(FileSymbol::new(1).unwrap(), 1).unwrap();
        }
        dbg.on_trace_event(TraceEvent::Line, &StubFrame, &StubSource, &NoopYield);
        let sent = dbg.transport.sent.lock();
        assert_eq!(sent[0].payload, crate::codec::stop_reasons::BREAKPOINT);
    }

    #[test]
    fn step_over_does_not_stop_in_deeper_frame() {
        struct DeeperFrame;
        impl FrameView for DeeperFrame {
            fn file_symbol(&self) -> FileSymbol {
                FileSymbol::new(1).unwrap()
            }
            fn file_name(&self) -> &str {
                "prog.py"
            }
            fn block_name(&self) -> &str {
                "callee"
            }
            fn line(&self) -> u32 {
                2
            }
            fn depth(&self) -> u32 {
                1
            }
            fn locals(&self) -> &dyn FrameLocals {
                &FixedLocals
            }
            fn local_names(&self) -> &dyn LocalNamePrelude {
                &FixedNames
            }
            fn globals(&self) -> &dyn ObjectView {
                &EmptyObj
            }
        }
        let dbg = Debugger::new(RecordingTransport::new(vec![]));
        {
            let mut guard = dbg.state.lock();
            guard.status = ControlStatus::StepOver;
            guard.step_anchor = Some(0);
        }
        dbg.on_trace_event(TraceEvent::Line, &DeeperFrame, &StubSource, &NoopYield);
        assert!(dbg.transport.sent.lock().is_empty());
        assert_eq!(dbg.state.lock().status, ControlStatus::StepOver);
    }

    #[test]
    fn module_load_pause_restores_prior_status_on_continue() {
        let continue_frame = Frame { id: 9, tag: tags::CONTINUE, payload: vec![] };
        let dbg = Debugger::new(RecordingTransport::new(vec![continue_frame]));
        dbg.state.lock().status = ControlStatus::Running;

        struct FixedResolver;
        impl FileSymbolResolver for FixedResolver {
            fn resolve(&self, _n: &str) -> Option<FileSymbol> {
                None
            }
            fn name_of(&self, _s: FileSymbol) -> &str {
                "<unknown>"
            }
        }

        dbg.on_module_loaded(FileSymbol::new(2).unwrap(), "mod.py", &FixedResolver);
        assert_eq!(dbg.state.lock().status, ControlStatus::Running);
        let sent = dbg.transport.sent.lock();
        assert_eq!(sent[0].tag, tags::MODULE_LOADED);
    }

    #[test]
    fn program_done_resets_to_not_enabled() {
        let dbg = Debugger::new(RecordingTransport::new(vec![]));
        dbg.state.lock().status = ControlStatus::Running;
        dbg.on_program_done(0);
        assert_eq!(dbg.state.lock().status, ControlStatus::NotEnabled);
        let sent = dbg.transport.sent.lock();
        assert_eq!(sent[0].tag, tags::DONE);
    }
}

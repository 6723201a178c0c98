//! A toy call stack: each frame has a fixed local-slot array plus a
//! declaration-order name prelude, matching the reverse-walk resolution
//! rule the core's inspection service relies on.

use crate::heap::{Heap, SimValue};
use crate::values::{DictView, SimObjectView, SimValueView};
use jpo_dbg_core::{FileSymbol, FrameChain, FrameLocals, FrameView, LocalNamePrelude, ObjectView, ValueView};

/// The underlying local-slot array, newest-first — a deliberate reversal
/// of declaration order, same as the real bytecode's stack slots.
struct RevLocals {
    heap: Heap,
    /// Declaration order; read back-to-front by `slot_value`.
    declared: Vec<SimValue>,
}
impl FrameLocals for RevLocals {
    fn slot_count(&self) -> usize {
        self.declared.len()
    }
    fn slot_value(&self, i: usize) -> Box<dyn ValueView> {
        let decl_index = self.declared.len() - 1 - i;
        SimValueView::boxed(&self.heap, &self.declared[decl_index])
    }
}

/// Declaration-order local names, decoded once from the (simulated)
/// bytecode prelude.
struct DeclNames(Vec<String>);
impl LocalNamePrelude for DeclNames {
    fn name_for_local_index(&self, local_index: usize) -> Option<&str> {
        self.0.get(local_index).map(String::as_str)
    }
}

/// One stack frame. `locals` and `local_names` are in declaration order;
/// `FrameView` exposes them reversed, as real bytecode slots are laid out.
pub struct SimFrame {
    file: FileSymbol,
    file_name: String,
    block_name: String,
    line: u32,
    depth: u32,
    locals: RevLocals,
    names: DeclNames,
    globals: DictView,
}

impl SimFrame {
    pub fn new(
        heap: &Heap,
        file: FileSymbol,
        file_name: impl Into<String>,
        block_name: impl Into<String>,
        line: u32,
        depth: u32,
        declared_locals: Vec<(String, SimValue)>,
        globals: Vec<(String, SimValue)>,
    ) -> Self {
        let names = declared_locals.iter().map(|(n, _)| n.clone()).collect();
        let declared = declared_locals.into_iter().map(|(_, v)| v).collect();
        Self {
            file,
            file_name: file_name.into(),
            block_name: block_name.into(),
            line,
            depth,
            locals: RevLocals { heap: heap.clone(), declared },
            names: DeclNames(names),
            globals: DictView::new(heap.clone(), globals),
        }
    }
}

impl FrameView for SimFrame {
    fn file_symbol(&self) -> FileSymbol {
        self.file
    }
    fn file_name(&self) -> &str {
        &self.file_name
    }
    fn block_name(&self) -> &str {
        &self.block_name
    }
    fn line(&self) -> u32 {
        self.line
    }
    fn depth(&self) -> u32 {
        self.depth
    }
    fn locals(&self) -> &dyn FrameLocals {
        &self.locals
    }
    fn local_names(&self) -> &dyn LocalNamePrelude {
        &self.names
    }
    fn globals(&self) -> &dyn ObjectView {
        &self.globals
    }
}

/// A fixed call chain, newest frame first (index 0).
pub struct SimFrameChain(pub Vec<SimFrame>);

impl FrameChain for SimFrameChain {
    fn len(&self) -> u32 {
        self.0.len() as u32
    }
    fn frame(&self, index: u32) -> Option<&dyn FrameView> {
        self.0.get(index as usize).map(|f| f as &dyn FrameView)
    }
}

/// Resolves a `drill_handle` back to a re-enumerable heap object.
pub struct SimObjectResolver(pub Heap);

impl jpo_dbg_core::ObjectResolver for SimObjectResolver {
    fn resolve(&self, addr: u32) -> Option<Box<dyn ObjectView>> {
        if addr == 0 {
            return None;
        }
        Some(SimObjectView::boxed(self.0.clone(), addr - 1))
    }
}

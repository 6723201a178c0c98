//! `ValueView` / `ObjectView` implementations backed by [`crate::heap`].

use crate::heap::{Heap, HeapObj, SimValue};
use jpo_dbg_core::{NamedChild, ObjectView, ValueKind, ValueView};

/// A single value as seen through the debugger's introspection surface.
/// Display text and type name are rendered eagerly at construction so
/// `ValueView`'s borrowed-return methods need no lifetime gymnastics.
pub struct SimValueView {
    display: String,
    ty: String,
    kind: ValueKind,
    handle: u32,
}

impl SimValueView {
    pub fn new(heap: &Heap, value: &SimValue) -> Self {
        Self {
            display: heap.display(value),
            ty: heap.type_name(value),
            kind: heap.kind_of(value),
            handle: value.drill_handle(),
        }
    }

    pub fn boxed(heap: &Heap, value: &SimValue) -> Box<dyn ValueView> {
        Box::new(Self::new(heap, value))
    }
}

impl ValueView for SimValueView {
    fn display_value(&self) -> String {
        self.display.clone()
    }
    fn type_name(&self) -> &str {
        &self.ty
    }
    fn kind(&self) -> ValueKind {
        self.kind
    }
    fn drill_handle(&self) -> u32 {
        self.handle
    }
}

/// A re-enumerable container or attribute holder: wraps a heap index and
/// a cloned handle to the heap (cheap — `Rc` clone).
pub struct SimObjectView {
    heap: Heap,
    obj: HeapObj,
}

impl SimObjectView {
    pub fn new(heap: Heap, index: u32) -> Self {
        let obj = heap.get(index);
        Self { heap, obj }
    }

    pub fn boxed(heap: Heap, index: u32) -> Box<dyn ObjectView> {
        Box::new(Self::new(heap, index))
    }
}

impl ObjectView for SimObjectView {
    fn kind(&self) -> ValueKind {
        self.obj.kind()
    }

    fn len(&self) -> usize {
        match &self.obj {
            HeapObj::List(v) | HeapObj::Tuple(v) => v.len(),
            HeapObj::Str(s) => s.len(),
            HeapObj::Closure { captured } => captured.len(),
            _ => 0,
        }
    }

    fn index_child(&self, index: usize) -> Option<Box<dyn ValueView>> {
        match &self.obj {
            HeapObj::List(v) | HeapObj::Tuple(v) => v.get(index).map(|v| SimValueView::boxed(&self.heap, v)),
            HeapObj::Closure { captured } => captured.get(index).map(|v| SimValueView::boxed(&self.heap, v)),
            _ => None,
        }
    }

    fn iter_named(&self) -> Box<dyn Iterator<Item = NamedChild> + '_> {
        let entries: &[(String, SimValue)] = match &self.obj {
            HeapObj::Dict(entries) => entries,
            HeapObj::Class { fields, .. } | HeapObj::Instance { fields, .. } => fields,
            HeapObj::Module { dict, .. } => dict,
            _ => return Box::new(std::iter::empty()),
        };
        let heap = self.heap.clone();
        Box::new(
            entries
                .iter()
                .map(move |(k, v)| NamedChild { name: k.clone(), value: SimValueView::boxed(&heap, v) }),
        )
    }

    fn deref_cell(&self) -> Option<Box<dyn ValueView>> {
        match &self.obj {
            HeapObj::Cell(inner) => Some(SimValueView::boxed(&self.heap, inner)),
            _ => None,
        }
    }
}

/// A plain name/value dictionary view — module globals, a module
/// registry, or anything else that's just a flat `(name, value)` list
/// with no sequential indexing.
pub struct DictView {
    heap: Heap,
    entries: Vec<(String, SimValue)>,
}

impl DictView {
    pub fn new(heap: Heap, entries: Vec<(String, SimValue)>) -> Self {
        Self { heap, entries }
    }
}

impl ObjectView for DictView {
    fn kind(&self) -> ValueKind {
        ValueKind::Dict
    }
    fn len(&self) -> usize {
        self.entries.len()
    }
    fn index_child(&self, _index: usize) -> Option<Box<dyn ValueView>> {
        None
    }
    fn iter_named(&self) -> Box<dyn Iterator<Item = NamedChild> + '_> {
        Box::new(
            self.entries
                .iter()
                .map(move |(k, v)| NamedChild { name: k.clone(), value: SimValueView::boxed(&self.heap, v) }),
        )
    }
}

//! The trait boundary between the debugger core and the interpreter.
//!
//! Everything in this module is a read-only projection the interpreter
//! provides; the core never depends on a concrete interpreter crate,
//! mirroring `raya_sdk::context::NativeContext` — native code programs
//! against an abstract trait, the engine supplies the implementation.

use crate::symbols::FileSymbol;

/// Classification bits used by `include_kinds_mask` / `contains_kinds`.
pub mod kind_bits {
    pub const NORMAL: u8 = 0x1;
    pub const SPECIAL: u8 = 0x2;
    pub const FUNCTION: u8 = 0x4;
    pub const CLASS: u8 = 0x8;
    pub const MODULE: u8 = 0x10;
}

/// Classification of a single enumerated variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Normal,
    /// Name begins with `__`.
    Special,
    Function,
    Class,
    Module,
}

impl VarKind {
    pub fn bit(self) -> u8 {
        match self {
            VarKind::Normal => kind_bits::NORMAL,
            VarKind::Special => kind_bits::SPECIAL,
            VarKind::Function => kind_bits::FUNCTION,
            VarKind::Class => kind_bits::CLASS,
            VarKind::Module => kind_bits::MODULE,
        }
    }

    /// Classify by name and declared kind: a `__`-prefixed name is always
    /// `Special`, regardless of the underlying value's own kind.
    pub fn classify(name: &str, value_kind: ValueKind) -> Self {
        if name.starts_with("__") {
            return VarKind::Special;
        }
        match value_kind {
            ValueKind::Function => VarKind::Function,
            ValueKind::Class => VarKind::Class,
            ValueKind::Module => VarKind::Module,
            _ => VarKind::Normal,
        }
    }
}

/// The runtime type of an introspectable value, as far as the core needs
/// to know to classify and re-enumerate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Primitive,
    List,
    Tuple,
    Dict,
    Str,
    Class,
    Instance,
    Closure,
    Module,
    Function,
    Cell,
}

impl ValueKind {
    /// Whether this type can be re-enumerated by the core (i.e. is one of
    /// the container/attribute-holder kinds.
    pub fn is_reenumerable(self) -> bool {
        !matches!(self, ValueKind::Primitive)
    }
}

/// One value as seen through the debugger's introspection surface:
/// a name, a rendered display string, a type name, and (if re-enumerable)
/// a drill-down handle the host can echo back to see its children.
pub trait ValueView {
    /// Rendered value text, not yet length-truncated (the core truncates).
    fn display_value(&self) -> String;

    /// Rendered type name.
    fn type_name(&self) -> &str;

    /// Runtime kind, used for classification and re-enumerability.
    fn kind(&self) -> ValueKind;

    /// Stable memory identity of the underlying object — the raw pointer
    /// cast to an integer in the source implementation. Only meaningful
    /// (and only returned) when `kind()` is re-enumerable; `0` otherwise.
    fn drill_handle(&self) -> u32;
}

/// A (name, value) pair produced while enumerating an attribute holder or
/// a dict.
pub struct NamedChild {
    pub name: String,
    pub value: Box<dyn ValueView>,
}

/// An introspectable container or attribute-holder: list, tuple, dict,
/// string, class, instance, closure, module.
pub trait ObjectView {
    fn kind(&self) -> ValueKind;

    /// `len()` for sequences and strings; meaningless (not called)
    /// otherwise.
    fn len(&self) -> usize;

    /// Indexed child of a sequential container (list/tuple) or a
    /// closure's captured-value array, by position.
    fn index_child(&self, index: usize) -> Option<Box<dyn ValueView>>;

    /// Named children of an attribute holder (class/instance/module/
    /// plain-object/function/cell) or a dict's key/value pairs.
    fn iter_named(&self) -> Box<dyn Iterator<Item = NamedChild> + '_>;

    /// For a cell (closure indirection): the value it closes over, so the
    /// drill-down handle can point through to it.
    fn deref_cell(&self) -> Option<Box<dyn ValueView>> {
        None
    }
}

/// One stack frame's local-slot array, walked in reverse for name
/// resolution: slot 0 in the underlying array is the
/// most recently pushed local.
pub trait FrameLocals {
    fn slot_count(&self) -> usize;

    /// Value at raw array index `i` (0 = newest).
    fn slot_value(&self, i: usize) -> Box<dyn ValueView>;
}

/// Per-local-variable name metadata decoded from the bytecode's prelude.
/// `local_index` is assigned in declaration order (0 = first declared).
pub trait LocalNamePrelude {
    /// Name for the local declared at `local_index`, if the compiler
    /// recorded one (compiler-generated temporaries have none).
    fn name_for_local_index(&self, local_index: usize) -> Option<&str>;
}

/// One entry in the interpreter's call chain.
pub trait FrameView {
    fn file_symbol(&self) -> FileSymbol;
    fn file_name(&self) -> &str;
    fn block_name(&self) -> &str;
    fn line(&self) -> u32;

    /// 0 = outermost frame.
    fn depth(&self) -> u32;

    fn locals(&self) -> &dyn FrameLocals;
    fn local_names(&self) -> &dyn LocalNamePrelude;

    /// The module globals dictionary this frame executes under, exposed
    /// as a `Dict`-kind object view.
    fn globals(&self) -> &dyn ObjectView;
}

/// The interpreter's current call chain, newest frame first.
pub trait FrameChain {
    fn len(&self) -> u32;
    fn frame(&self, index: u32) -> Option<&dyn FrameView>;
}

/// The three module registries addressable via `scope_kind` 5/6/7.
pub trait ModuleRegistries {
    fn builtin(&self) -> &dyn ObjectView;
    fn extensible(&self) -> &dyn ObjectView;
    /// Frozen modules: a `FrozenNames`-kind view enumerated purely by
    /// name.
    fn frozen(&self) -> &dyn ObjectView;
}

/// Resolves a drill-down handle back to the object it identifies, so a
/// `VARIABLES_REQUEST` with `scope_kind = Object` can re-enumerate it.
/// Only ever called with handles the core itself previously handed out
/// via `ValueView::drill_handle`, so the target is always re-enumerable.
pub trait ObjectResolver {
    fn resolve(&self, addr: u32) -> Option<Box<dyn ObjectView>>;
}

/// The interpreter's non-blocking cooperative scheduler hook, polled
/// between receive timeouts in the stopped-loop.
pub trait CooperativeYield {
    /// Give the interpreter's scheduler a turn. Must not block.
    fn poll(&self);
}

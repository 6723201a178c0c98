//! Toy interpreter implementing the `jpo-dbg-core` trait boundary.
//!
//! Not a real language runtime — just enough of a heap, call stack, and
//! file-symbol table to drive the debugger core's wire protocol and
//! inspection services end to end, the way `raya-engine`'s own test
//! harnesses stand up a minimal VM rather than exercising the real one.

mod frames;
mod heap;
mod modules;
mod router;
mod symbols;
mod transport;
mod values;

pub use frames::{SimFrame, SimFrameChain, SimObjectResolver};
pub use heap::{Heap, HeapObj, SimValue};
pub use modules::SimModuleRegistries;
pub use router::route_forever;
pub use symbols::FileTable;
pub use transport::{ChannelTransport, RoutedWiring};
pub use values::{DictView, SimObjectView, SimValueView};

use jpo_dbg_core::InspectionSource;

/// Bundles the three things a `DBG_VARS`/`DBG_STAC` request might
/// address, for a fixed snapshot of the simulated program's state.
pub struct SimSource {
    pub chain: SimFrameChain,
    pub modules: SimModuleRegistries,
    pub objects: SimObjectResolver,
}

impl InspectionSource for SimSource {
    fn frames(&self) -> &dyn jpo_dbg_core::FrameChain {
        &self.chain
    }
    fn modules(&self) -> &dyn jpo_dbg_core::ModuleRegistries {
        &self.modules
    }
    fn objects(&self) -> &dyn jpo_dbg_core::ObjectResolver {
        &self.objects
    }
}

/// An interpreter scheduler with nothing to yield to — the simulator has
/// no other cooperative tasks running.
pub struct NoopYield;
impl jpo_dbg_core::CooperativeYield for NoopYield {
    fn poll(&self) {}
}

/// Raises a keyboard interrupt by recording that one was requested; the
/// simulator has no real bytecode loop to interrupt.
pub struct FlagInterrupt(std::sync::atomic::AtomicBool);
impl Default for FlagInterrupt {
    fn default() -> Self {
        Self(std::sync::atomic::AtomicBool::new(false))
    }
}
impl FlagInterrupt {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn was_raised(&self) -> bool {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}
impl jpo_dbg_core::InterpreterInterrupt for FlagInterrupt {
    fn raise_keyboard_interrupt(&self) {
        self.0.store(true, std::sync::atomic::Ordering::SeqCst);
    }
}

//! The three module registries addressable via `scope_kind` 5/6/7:
//! builtins, extensible (user-importable) modules, and frozen modules
//! enumerated purely by name.

use crate::heap::{Heap, SimValue};
use crate::values::DictView;
use jpo_dbg_core::ModuleRegistries;

pub struct SimModuleRegistries {
    builtin: DictView,
    extensible: DictView,
    frozen: DictView,
}

impl SimModuleRegistries {
    pub fn new(
        heap: &Heap,
        builtin: Vec<(String, SimValue)>,
        extensible: Vec<(String, SimValue)>,
        frozen_names: Vec<String>,
    ) -> Self {
        // Frozen modules are enumerated purely by name:
        // each entry's "value" is the module object itself so the display
        // side can still show a drill-down handle if it wants one.
        let frozen = frozen_names
            .into_iter()
            .map(|name| {
                let module = heap.alloc(crate::heap::HeapObj::Module { name: name.clone(), dict: vec![] });
                (name, module)
            })
            .collect();
        Self {
            builtin: DictView::new(heap.clone(), builtin),
            extensible: DictView::new(heap.clone(), extensible),
            frozen: DictView::new(heap.clone(), frozen),
        }
    }
}

impl ModuleRegistries for SimModuleRegistries {
    fn builtin(&self) -> &dyn jpo_dbg_core::ObjectView {
        &self.builtin
    }
    fn extensible(&self) -> &dyn jpo_dbg_core::ObjectView {
        &self.extensible
    }
    fn frozen(&self) -> &dyn jpo_dbg_core::ObjectView {
        &self.frozen
    }
}

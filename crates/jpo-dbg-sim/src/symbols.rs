//! A toy file-name intern table, standing in for the interpreter's own.

use jpo_dbg_core::{FileSymbol, FileSymbolResolver};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    by_name: FxHashMap<String, FileSymbol>,
    by_symbol: FxHashMap<u16, String>,
    next: u16,
}

/// Interns file names on first `intern` call; `resolve` only ever sees
/// names that have already been interned, matching the real interpreter's
/// "no line in this file has executed yet" no-op contract.
#[derive(Clone, Default)]
pub struct FileTable(Arc<RwLock<Inner>>);

impl FileTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning its symbol (allocating one if new). Called
    /// by the simulated compiler the moment a module starts executing.
    pub fn intern(&self, name: &str) -> FileSymbol {
        let mut inner = self.0.write();
        if let Some(sym) = inner.by_name.get(name) {
            return *sym;
        }
        inner.next += 1;
        let sym = FileSymbol::new(inner.next).expect("next starts at 1");
        inner.by_name.insert(name.to_string(), sym);
        inner.by_symbol.insert(sym.get(), name.to_string());
        sym
    }
}

impl FileSymbolResolver for FileTable {
    fn resolve(&self, file_name: &str) -> Option<FileSymbol> {
        self.0.read().by_name.get(file_name).copied()
    }

    fn name_of(&self, symbol: FileSymbol) -> &str {
        // Leaked to satisfy the trait's `&str` (tied to `&self`, not the
        // lock guard); fine for a toy single-process simulator that never
        // tears down its file table.
        let inner = self.0.read();
        let name = inner.by_symbol.get(&symbol.get()).map(String::as_str).unwrap_or("<unknown>");
        Box::leak(name.to_string().into_boxed_str())
    }
}

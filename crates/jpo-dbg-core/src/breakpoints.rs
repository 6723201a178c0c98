//! Breakpoint table (C2): a bounded, compacted set of (file, line) pairs.
//!
//! Membership (`is_set`) is called from the trace hook on every source-line
//! transition, so it has to be cheap: a flat array with an early exit on the
//! first empty slot beats a hashed structure at this cardinality and has
//! none of a tree's per-lookup overhead on an embedded target.

use crate::codec::PayloadReader;
use crate::symbols::{FileSymbol, FileSymbolResolver};
use crate::config::BP_CAPACITY;

/// One (file, line) breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breakpoint {
    pub file: FileSymbol,
    pub line: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    /// 0 means empty; otherwise the raw `FileSymbol` value.
    file: u16,
    line: u16,
}

const EMPTY: Slot = Slot { file: 0, line: 0 };

/// Errors from table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BreakpointError {
    /// `set` found no empty slot.
    #[error("breakpoint table is full (capacity {capacity})")]
    Full { capacity: usize },
}

/// Fixed-capacity, always-compacted breakpoint set.
///
/// Invariant: all occupied slots precede all empty slots. Position within
/// the occupied prefix is insignificant.
pub struct BreakpointTable {
    slots: [Slot; BP_CAPACITY],
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self { slots: [EMPTY; BP_CAPACITY] }
    }

    pub fn capacity(&self) -> usize {
        BP_CAPACITY
    }

    /// Zero every slot.
    pub fn clear_all(&mut self) {
        self.slots = [EMPTY; BP_CAPACITY];
    }

    /// Linear scan, stopping at the first empty slot (the compacted
    /// invariant guarantees nothing occupied follows it).
    pub fn is_set(&self, file: FileSymbol, line: u16) -> bool {
        for slot in &self.slots {
            if slot.file == 0 {
                return false;
            }
            if slot.file == file.get() && slot.line == line {
                return true;
            }
        }
        false
    }

    /// Place in the first empty slot. Fails (table unchanged) if none.
    pub fn set(&mut self, file: FileSymbol, line: u16) -> Result<(), BreakpointError> {
        for slot in &mut self.slots {
            if slot.file == 0 {
                *slot = Slot { file: file.get(), line };
                return Ok(());
            }
        }
        Err(BreakpointError::Full { capacity: BP_CAPACITY })
    }

    /// Zero every slot matching `file`, then re-compact.
    pub fn clear_file(&mut self, file: FileSymbol) {
        for slot in &mut self.slots {
            if slot.file == file.get() {
                *slot = EMPTY;
            }
        }
        self.compact();
    }

    /// Move occupied slots up so the occupied prefix is dense. Idempotent:
    /// calling it twice in a row has the same effect as once.
    pub fn compact(&mut self) {
        let mut write = 0;
        for read in 0..BP_CAPACITY {
            if self.slots[read].file != 0 {
                if write != read {
                    self.slots[write] = self.slots[read];
                    self.slots[read] = EMPTY;
                }
                write += 1;
            }
        }
    }

    /// All breakpoints currently set for `file`, in table order.
    pub fn lines_for_file(&self, file: FileSymbol) -> Vec<u16> {
        self.slots
            .iter()
            .take_while(|s| s.file != 0)
            .filter(|s| s.file == file.get())
            .map(|s| s.line)
            .collect()
    }

    /// Decode a `DBG_BRKP` payload (`<file-name>\0<u32 line>...`) and apply
    /// it: if `file-name` is unknown to the interpreter's intern table, this
    /// is a no-op — no line in it has executed yet.
    pub fn replace_for_file(
        &mut self,
        payload: &[u8],
        resolver: &dyn FileSymbolResolver,
    ) -> Result<(), BreakpointError> {
        let reader = PayloadReader::new(payload);
        let (file_name, mut offset) = match reader.read_zstr(0) {
            Ok(v) => v,
            Err(_) => return Ok(()), // malformed: logged by caller, treated as no-op
        };

        let Some(file) = resolver.resolve(file_name) else {
            return Ok(());
        };

        self.clear_file(file);

        while offset + 4 <= reader.len() {
            let line = reader.read_u32_le(offset).unwrap() as u16;
            self.set(file, line)?;
            offset += 4;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(v: u16) -> FileSymbol {
        FileSymbol::new(v).unwrap()
    }

    struct FixedResolver;
    impl FileSymbolResolver for FixedResolver {
        fn resolve(&self, file_name: &str) -> Option<FileSymbol> {
            match file_name {
                "prog" => FileSymbol::new(1),
                "util" => FileSymbol::new(2),
                _ => None,
            }
        }
        fn name_of(&self, symbol: FileSymbol) -> &str {
            match symbol.get() {
                1 => "prog",
                2 => "util",
                _ => "<unknown>",
            }
        }
    }

    #[test]
    fn set_and_is_set() {
        let mut t = BreakpointTable::new();
        t.set(sym(1), 10).unwrap();
        assert!(t.is_set(sym(1), 10));
        assert!(!t.is_set(sym(1), 11));
        assert!(!t.is_set(sym(2), 10));
    }

    #[test]
    fn set_fails_when_full_and_leaves_table_unchanged() {
        let mut t = BreakpointTable::new();
        for line in 0..BP_CAPACITY as u16 {
            t.set(sym(1), line).unwrap();
        }
        let before = t.lines_for_file(sym(1));
        assert!(matches!(t.set(sym(1), 9999), Err(BreakpointError::Full { .. })));
        assert_eq!(t.lines_for_file(sym(1)), before);
    }

    #[test]
    fn clear_file_compacts() {
        let mut t = BreakpointTable::new();
        t.set(sym(1), 1).unwrap();
        t.set(sym(2), 2).unwrap();
        t.set(sym(1), 3).unwrap();
        t.clear_file(sym(1));
        assert!(!t.is_set(sym(1), 1));
        assert!(!t.is_set(sym(1), 3));
        assert!(t.is_set(sym(2), 2));
        // compacted: occupied prefix has exactly one entry
        assert_eq!(t.lines_for_file(sym(2)), vec![2]);
    }

    #[test]
    fn compact_is_idempotent() {
        let mut t = BreakpointTable::new();
        t.set(sym(1), 1).unwrap();
        t.set(sym(2), 2).unwrap();
        t.clear_file(sym(1));
        let once: Vec<_> = t.slots.to_vec();
        t.compact();
        let twice: Vec<_> = t.slots.to_vec();
        assert_eq!(once, twice);
    }

    #[test]
    fn replace_for_file_round_trips() {
        let mut t = BreakpointTable::new();
        let mut payload = b"prog\0".to_vec();
        payload.extend_from_slice(&10u32.to_le_bytes());
        payload.extend_from_slice(&20u32.to_le_bytes());
        t.replace_for_file(&payload, &FixedResolver).unwrap();
        let mut lines = t.lines_for_file(sym(1));
        lines.sort_unstable();
        assert_eq!(lines, vec![10, 20]);
    }

    #[test]
    fn replace_for_file_unknown_symbol_is_noop() {
        let mut t = BreakpointTable::new();
        t.set(sym(1), 1).unwrap();
        let mut payload = b"missing\0".to_vec();
        payload.extend_from_slice(&99u32.to_le_bytes());
        t.replace_for_file(&payload, &FixedResolver).unwrap();
        // unchanged: still just the one breakpoint in "prog"
        assert_eq!(t.lines_for_file(sym(1)), vec![1]);
    }
}

//! Symbol interning for variable and function names.
//!
//! Names are stored once and referenced by [`SymbolId`]. Ids are handed out
//! in first-seen order, which gives every set of symbols a stable,
//! reproducible iteration order.

use rustc_hash::FxHashMap;

/// Interned symbol id. Ordering follows interning order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    names: Vec<String>,
    lookup: FxHashMap<String, SymbolId>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, returning the existing id when already present.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(&id) = self.lookup.get(name) {
            return id;
        }
        let id = SymbolId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.lookup.insert(name.to_string(), id);
        id
    }

    /// # Panics
    /// Panics if `id` came from another table.
    #[inline]
    pub fn resolve(&self, id: SymbolId) -> &str {
        &self.names[id.index()]
    }

    #[inline]
    pub fn get_id(&self, name: &str) -> Option<SymbolId> {
        self.lookup.get(name).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("q_in");
        let b = table.intern("q_in");
        assert_eq!(a, b);
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve(a), "q_in");
    }

    #[test]
    fn ids_follow_first_seen_order() {
        let mut table = SymbolTable::new();
        let h = table.intern("h");
        let a = table.intern("A");
        assert!(h < a);
        assert_eq!(table.get_id("A"), Some(a));
        assert_eq!(table.get_id("missing"), None);
    }

    #[test]
    fn unicode_names() {
        let mut table = SymbolTable::new();
        let rho = table.intern("ρ");
        assert_eq!(table.resolve(rho), "ρ");
    }
}

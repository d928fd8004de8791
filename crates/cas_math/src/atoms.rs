//! Opaque atoms: the variables of the polynomial ring.
//!
//! Anything that is not built from numbers and symbols with `+ - * /` and
//! integer powers is folded into an atom. Atoms are identified by a canonical
//! key computed from their normalised arguments, so `exp(x + y)` and
//! `exp(y + x)` are the same atom.

use cas_ast::traversal::collect_variables;
use cas_ast::{Constant, Context, ExprId, SymbolId};
use num_rational::BigRational;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

pub type AtomId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtomKind {
    Symbol(SymbolId),
    Constant(Constant),
    /// `name(args...)` with canonical arguments.
    Call { name: String, args: Vec<ExprId> },
    /// `base^exp` with a rational exponent strictly between 0 and 1.
    Root { base: ExprId, exp: BigRational },
    /// `base^exp` with a non-numeric exponent.
    Power { base: ExprId, exp: ExprId },
}

#[derive(Debug, Clone)]
pub struct Atom {
    pub kind: AtomKind,
    pub key: String,
    /// Canonical expression the atom stands for.
    pub expr: ExprId,
    pub free: BTreeSet<SymbolId>,
}

impl Atom {
    pub fn depends_on(&self, var: SymbolId) -> bool {
        self.free.contains(&var)
    }

    pub fn is_symbol(&self, var: SymbolId) -> bool {
        matches!(self.kind, AtomKind::Symbol(s) if s == var)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AtomTable {
    atoms: Vec<Atom>,
    by_key: FxHashMap<String, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern an atom under `key`; an existing atom with the same key wins.
    pub fn intern(&mut self, ctx: &Context, kind: AtomKind, key: String, expr: ExprId) -> AtomId {
        if let Some(&id) = self.by_key.get(&key) {
            return id;
        }
        let id = self.atoms.len();
        let free = collect_variables(ctx, expr);
        self.by_key.insert(key.clone(), id);
        self.atoms.push(Atom {
            kind,
            key,
            expr,
            free,
        });
        id
    }

    #[inline]
    pub fn get(&self, id: AtomId) -> &Atom {
        &self.atoms[id]
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn symbol_key(sym: SymbolId) -> String {
        format!("${}", sym.index())
    }

    pub fn find_symbol(&self, sym: SymbolId) -> Option<AtomId> {
        self.by_key.get(&Self::symbol_key(sym)).copied()
    }

    /// Atoms other than the bare symbol whose arguments mention `var`.
    pub fn nested_dependents(&self, var: SymbolId) -> Vec<AtomId> {
        self.atoms
            .iter()
            .enumerate()
            .filter(|(_, a)| a.depends_on(var) && !a.is_symbol(var))
            .map(|(id, _)| id)
            .collect()
    }
}

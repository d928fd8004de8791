//! Expression arena.
//!
//! Every expression node lives in a [`Context`] and is referenced by an
//! [`ExprId`]. Nodes are hash-consed: adding a node that already exists
//! returns the existing id, so two structurally identical expressions built
//! in the same context always share one id.

use crate::symbol::{SymbolId, SymbolTable};
use num_bigint::BigInt;
use num_rational::BigRational;
use rustc_hash::FxHashMap;

/// Handle to a node stored in a [`Context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(u32);

impl ExprId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Named mathematical constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Constant {
    Pi,
    E,
}

impl Constant {
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Number(BigRational),
    Constant(Constant),
    Variable(SymbolId),
    Add(ExprId, ExprId),
    Sub(ExprId, ExprId),
    Mul(ExprId, ExprId),
    Div(ExprId, ExprId),
    Pow(ExprId, ExprId),
    Neg(ExprId),
    /// Function application; the name is interned in the same symbol table
    /// as variables but is never reported as a free variable.
    Function(SymbolId, Vec<ExprId>),
}

/// Owner of all expression nodes and interned symbols used by a comparison.
///
/// A `Context` is the explicit replacement for a process-wide symbol
/// registry: two equation groups can only be compared when they were built
/// in the same context, and independent comparisons use independent contexts.
#[derive(Debug, Clone, Default)]
pub struct Context {
    nodes: Vec<Expr>,
    dedup: FxHashMap<Expr, ExprId>,
    symbols: SymbolTable,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, returning the id of the existing node when an
    /// identical one is already stored.
    pub fn add(&mut self, expr: Expr) -> ExprId {
        if let Some(&id) = self.dedup.get(&expr) {
            return id;
        }
        let id = ExprId(self.nodes.len() as u32);
        self.nodes.push(expr.clone());
        self.dedup.insert(expr, id);
        id
    }

    /// Look up a node.
    ///
    /// # Panics
    /// Panics if `id` was produced by a different context.
    #[inline]
    pub fn get(&self, id: ExprId) -> &Expr {
        &self.nodes[id.index()]
    }

    pub fn num(&mut self, n: i64) -> ExprId {
        self.add(Expr::Number(BigRational::from_integer(BigInt::from(n))))
    }

    pub fn rational(&mut self, r: BigRational) -> ExprId {
        self.add(Expr::Number(r))
    }

    pub fn constant(&mut self, c: Constant) -> ExprId {
        self.add(Expr::Constant(c))
    }

    /// Variable node for `name`, interning the name if needed.
    pub fn var(&mut self, name: &str) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Variable(sym))
    }

    /// Variable node for an already interned symbol.
    pub fn sym_var(&mut self, sym: SymbolId) -> ExprId {
        self.add(Expr::Variable(sym))
    }

    /// Function call node `name(args...)`.
    pub fn call(&mut self, name: &str, args: Vec<ExprId>) -> ExprId {
        let sym = self.symbols.intern(name);
        self.add(Expr::Function(sym, args))
    }

    #[inline]
    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.symbols.intern(name)
    }

    #[inline]
    pub fn lookup_symbol(&self, name: &str) -> Option<SymbolId> {
        self.symbols.get_id(name)
    }

    #[inline]
    pub fn sym_name(&self, sym: SymbolId) -> &str {
        self.symbols.resolve(sym)
    }

    /// Number of distinct nodes stored so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// `Some(n)` when `id` is a numeric literal.
    pub fn as_number(&self, id: ExprId) -> Option<&BigRational> {
        match self.get(id) {
            Expr::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_number(&self, id: ExprId, value: i64) -> bool {
        self.as_number(id)
            .is_some_and(|n| *n == BigRational::from_integer(BigInt::from(value)))
    }
}

//! Expression → rational normal form and back.
//!
//! A [`Normalizer`] owns the atom table for one batch of related
//! normalisations. Forms produced by the same normalizer are comparable with
//! each other; forms from different normalizers are not, because atom ids are
//! assigned in first-seen order.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use cas_ast::{Constant, Context, Expr, ExprId, SymbolId};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::atoms::{AtomId, AtomKind, AtomTable};
use crate::error::PolyError;
use crate::multipoly::{Exp, Monomial, MultiPoly, PolyBudget};
use crate::rational_form::RationalForm;

pub struct Normalizer<'a> {
    ctx: &'a mut Context,
    atoms: AtomTable,
    budget: PolyBudget,
}

impl<'a> Normalizer<'a> {
    pub fn new(ctx: &'a mut Context, budget: PolyBudget) -> Self {
        Self {
            ctx,
            atoms: AtomTable::new(),
            budget,
        }
    }

    pub fn context(&self) -> &Context {
        &*self.ctx
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn budget(&self) -> &PolyBudget {
        &self.budget
    }

    /// Atom of the bare symbol `sym`, interning it if needed.
    pub fn symbol_atom(&mut self, sym: SymbolId) -> AtomId {
        let expr = self.ctx.sym_var(sym);
        self.atoms.intern(
            self.ctx,
            AtomKind::Symbol(sym),
            AtomTable::symbol_key(sym),
            expr,
        )
    }

    /// Normalise `expr` into a reduced rational form.
    pub fn normalize(&mut self, expr: ExprId) -> Result<RationalForm, PolyError> {
        self.budget.check_deadline()?;
        let raw = self.convert(expr)?;
        Ok(raw.reduce(&self.budget))
    }

    fn convert(&mut self, expr: ExprId) -> Result<RationalForm, PolyError> {
        let node = self.ctx.get(expr).clone();
        match node {
            Expr::Number(n) => Ok(RationalForm::constant(n)),
            Expr::Constant(c) => Ok(RationalForm::atom(self.constant_atom(c))),
            Expr::Variable(sym) => Ok(RationalForm::atom(self.symbol_atom(sym))),
            Expr::Add(l, r) => {
                let (a, b) = (self.convert(l)?, self.convert(r)?);
                a.add(&b, &self.budget)
            }
            Expr::Sub(l, r) => {
                let (a, b) = (self.convert(l)?, self.convert(r)?);
                a.sub(&b, &self.budget)
            }
            Expr::Mul(l, r) => {
                let (a, b) = (self.convert(l)?, self.convert(r)?);
                let product = a.mul(&b, &self.budget)?;
                self.fold_roots(product)
            }
            Expr::Div(l, r) => {
                let (a, b) = (self.convert(l)?, self.convert(r)?);
                let quotient = a.div(&b, &self.budget)?;
                self.fold_roots(quotient)
            }
            Expr::Neg(e) => Ok(self.convert(e)?.neg()),
            Expr::Pow(b, e) => self.convert_pow(b, e),
            Expr::Function(name, args) => self.convert_call(name, &args),
        }
    }

    fn constant_atom(&mut self, c: Constant) -> AtomId {
        let expr = self.ctx.constant(c);
        let key = format!("#{}", c.name());
        self.atoms.intern(self.ctx, AtomKind::Constant(c), key, expr)
    }

    // -------------------------------------------------------------------------
    // Powers
    // -------------------------------------------------------------------------

    fn convert_pow(&mut self, base: ExprId, exp: ExprId) -> Result<RationalForm, PolyError> {
        let exp_form = self.normalize(exp)?;
        if let Some(r) = exp_form.as_constant() {
            let base_form = self.normalize(base)?;
            return self.power_of_form(base_form, &r);
        }
        if matches!(self.ctx.get(base), Expr::Constant(Constant::E)) {
            return self.exp_of(exp_form);
        }
        let base_form = self.normalize(base)?;
        if base_form.is_one() {
            return Ok(RationalForm::one());
        }

        let key = format!(
            "pow({},{})",
            self.form_key(&base_form),
            self.form_key(&exp_form)
        );
        let b = self.to_expr(&base_form);
        let e = self.to_expr(&exp_form);
        let repr = self.ctx.add(Expr::Pow(b, e));
        let atom = self
            .atoms
            .intern(self.ctx, AtomKind::Power { base: b, exp: e }, key, repr);
        Ok(RationalForm::atom(atom))
    }

    /// `form^r` for a rational exponent.
    ///
    /// Integer exponents stay inside the polynomial ring. Fractional
    /// exponents split into an integer power times a root atom whose exponent
    /// lies in (0, 1); roots of roots are folded into one root.
    pub fn power_of_form(
        &mut self,
        form: RationalForm,
        r: &BigRational,
    ) -> Result<RationalForm, PolyError> {
        if r.is_integer() {
            let n = r.to_integer().to_i64().ok_or(PolyError::BudgetExceeded)?;
            let raised = form.powi(n, &self.budget)?;
            return self.fold_roots(raised);
        }
        if form.is_zero() {
            return if r.is_positive() {
                Ok(RationalForm::zero())
            } else {
                Err(PolyError::DivisionByZero)
            };
        }
        if let Some(c) = form.as_constant() {
            if let Some(v) = exact_rational_power(&c, r) {
                return Ok(RationalForm::constant(v));
            }
        }
        if let Some((atom, k)) = form.as_atom_power() {
            if let AtomKind::Root { base, exp } = self.atoms.get(atom).kind.clone() {
                let total = exp * BigRational::from_integer(BigInt::from(k)) * r;
                let inner = self.normalize(base)?;
                return self.power_of_form(inner, &total);
            }
        }

        let whole = r.floor();
        let frac = r - &whole;
        let n = whole.to_integer().to_i64().ok_or(PolyError::BudgetExceeded)?;
        let whole_part = form.powi(n, &self.budget)?;
        let root = self.root_atom(&form, frac);
        whole_part.mul(&RationalForm::atom(root), &self.budget)
    }

    fn root_atom(&mut self, base: &RationalForm, exp: BigRational) -> AtomId {
        let key = format!("root({},{})", self.form_key(base), exp);
        let b = self.to_expr(base);
        let e = self.ctx.rational(exp.clone());
        let repr = self.ctx.add(Expr::Pow(b, e));
        self.atoms
            .intern(self.ctx, AtomKind::Root { base: b, exp }, key, repr)
    }

    fn root_overflows(&self, atom: AtomId, e: u32) -> bool {
        match &self.atoms.get(atom).kind {
            AtomKind::Root { exp, .. } => {
                exp * BigRational::from_integer(BigInt::from(e)) >= BigRational::one()
            }
            _ => false,
        }
    }

    /// Rewrite `root^k` with `k * exp >= 1` back into powers of the base,
    /// so that `sqrt(x) * sqrt(x)` becomes `x`.
    fn fold_roots(&mut self, form: RationalForm) -> Result<RationalForm, PolyError> {
        let num = self.fold_poly(&form.num)?;
        let den = self.fold_poly(&form.den)?;
        if num.is_none() && den.is_none() {
            return Ok(form);
        }
        let num = num.unwrap_or_else(|| RationalForm::from_poly(form.num.clone()));
        let den = den.unwrap_or_else(|| RationalForm::from_poly(form.den.clone()));
        num.div(&den, &self.budget)
    }

    fn fold_poly(&mut self, p: &MultiPoly) -> Result<Option<RationalForm>, PolyError> {
        let needs_fold = p
            .terms()
            .any(|(m, _)| m.iter().any(|&(a, e)| self.root_overflows(a, e)));
        if !needs_fold {
            return Ok(None);
        }

        let terms: Vec<(Monomial, BigRational)> =
            p.terms().map(|(m, c)| (m.clone(), c.clone())).collect();
        let mut acc = RationalForm::zero();
        for (mono, coeff) in terms {
            let mut term = RationalForm::constant(coeff);
            for (atom, e) in mono {
                let factor = match self.atoms.get(atom).kind.clone() {
                    AtomKind::Root { base, exp } if self.root_overflows(atom, e) => {
                        let total = exp * BigRational::from_integer(BigInt::from(e));
                        let inner = self.normalize(base)?;
                        self.power_of_form(inner, &total)?
                    }
                    _ => RationalForm::atom(atom).powi(i64::from(e), &self.budget)?,
                };
                term = term.mul(&factor, &self.budget)?;
            }
            acc = acc.add(&term, &self.budget)?;
        }
        Ok(Some(acc))
    }

    // -------------------------------------------------------------------------
    // Function calls
    // -------------------------------------------------------------------------

    fn convert_call(&mut self, name: SymbolId, args: &[ExprId]) -> Result<RationalForm, PolyError> {
        let name = self.ctx.sym_name(name).to_string();
        match (name.as_str(), args) {
            ("sqrt", [x]) => {
                let half = BigRational::new(BigInt::one(), BigInt::from(2));
                let base = self.normalize(*x)?;
                self.power_of_form(base, &half)
            }
            ("sqrt", [x, index]) => match self.normalize(*index)?.as_constant() {
                Some(n) if n.is_integer() && n.is_positive() => {
                    let base = self.normalize(*x)?;
                    self.power_of_form(base, &n.recip())
                }
                _ => self.call_atom(&name, args),
            },
            ("exp", [x]) => {
                let arg = self.normalize(*x)?;
                self.exp_of(arg)
            }
            ("ln", [x]) | ("log", [x]) => {
                let arg = self.normalize(*x)?;
                self.ln_of(arg)
            }
            // log(base, x)
            ("log", [base, x]) => {
                let arg = self.normalize(*x)?;
                let base = self.normalize(*base)?;
                let num = self.ln_of(arg)?;
                let den = self.ln_of(base)?;
                num.div(&den, &self.budget)
            }
            _ => self.call_atom(&name, args),
        }
    }

    /// `exp(arg)`: `exp(0) = 1`, `exp(ln u) = u`, constant arguments become
    /// powers of `e`.
    pub fn exp_of(&mut self, arg: RationalForm) -> Result<RationalForm, PolyError> {
        if arg.is_zero() {
            return Ok(RationalForm::one());
        }
        if let Some(c) = arg.as_constant() {
            let e = RationalForm::atom(self.constant_atom(Constant::E));
            return self.power_of_form(e, &c);
        }
        if let Some((atom, 1)) = arg.as_atom_power() {
            if let AtomKind::Call { name, args } = &self.atoms.get(atom).kind {
                if name == "ln" && args.len() == 1 {
                    let inner = args[0];
                    return self.normalize(inner);
                }
            }
        }
        self.call_atom_from_forms("exp", vec![arg])
    }

    /// `ln(arg)`: `ln(1) = 0`, `ln(e) = 1`.
    pub fn ln_of(&mut self, arg: RationalForm) -> Result<RationalForm, PolyError> {
        if arg.is_one() {
            return Ok(RationalForm::zero());
        }
        if arg.is_zero() {
            return Err(PolyError::NonPolynomial("ln(0)".to_string()));
        }
        if let Some((atom, k)) = arg.as_atom_power() {
            if matches!(self.atoms.get(atom).kind, AtomKind::Constant(Constant::E)) {
                return Ok(RationalForm::constant(BigRational::from_integer(
                    BigInt::from(k),
                )));
            }
        }
        self.call_atom_from_forms("ln", vec![arg])
    }

    fn call_atom(&mut self, name: &str, args: &[ExprId]) -> Result<RationalForm, PolyError> {
        let mut forms = Vec::with_capacity(args.len());
        for &arg in args {
            forms.push(self.normalize(arg)?);
        }
        self.call_atom_from_forms(name, forms)
    }

    fn call_atom_from_forms(
        &mut self,
        name: &str,
        forms: Vec<RationalForm>,
    ) -> Result<RationalForm, PolyError> {
        let keys: Vec<String> = forms.iter().map(|f| self.form_key(f)).collect();
        let canon: Vec<ExprId> = forms.iter().map(|f| self.to_expr(f)).collect();
        let key = format!("{}({})", name, keys.join(","));
        let repr = self.ctx.call(name, canon.clone());
        let atom = self.atoms.intern(
            self.ctx,
            AtomKind::Call {
                name: name.to_string(),
                args: canon,
            },
            key,
            repr,
        );
        Ok(RationalForm::atom(atom))
    }

    // -------------------------------------------------------------------------
    // Keys and reconstruction
    // -------------------------------------------------------------------------

    /// Rendering of a form that does not depend on atom ids.
    pub fn form_key(&self, form: &RationalForm) -> String {
        format!("[{}]/[{}]", self.poly_key(&form.num), self.poly_key(&form.den))
    }

    fn poly_key(&self, p: &MultiPoly) -> String {
        let mut terms: Vec<String> = p
            .terms()
            .map(|(mono, coeff)| {
                let mut factors: Vec<String> = mono
                    .iter()
                    .map(|&(a, e)| format!("{}^{}", self.atoms.get(a).key, e))
                    .collect();
                factors.sort();
                format!("{}*{}", coeff, factors.join("*"))
            })
            .collect();
        terms.sort();
        terms.join("+")
    }

    /// Rebuild an expression from a form; the result is hash-consed, so equal
    /// forms rebuild to the same `ExprId`.
    pub fn to_expr(&mut self, form: &RationalForm) -> ExprId {
        if form.den.is_one() {
            return self.poly_to_expr(&form.num);
        }
        // reduce() makes the denominator monic in atom-id order; redo it in
        // the rendering order
        let (num, den) = match self.leading_coefficient(&form.den) {
            Some(lc) if !lc.is_one() => {
                let inv = lc.recip();
                (form.num.mul_scalar(&inv), form.den.mul_scalar(&inv))
            }
            _ => (form.num.clone(), form.den.clone()),
        };
        let num = self.poly_to_expr(&num);
        let den = self.poly_to_expr(&den);
        self.ctx.add(Expr::Div(num, den))
    }

    fn leading_coefficient(&self, p: &MultiPoly) -> Option<BigRational> {
        p.terms()
            .map(|(mono, coeff)| (self.ordered_factors(mono), coeff))
            .max_by(|a, b| self.factors_cmp(&a.0, &b.0))
            .map(|(_, coeff)| coeff.clone())
    }

    pub fn poly_to_expr(&mut self, p: &MultiPoly) -> ExprId {
        let mut terms: Vec<(Vec<(AtomId, Exp)>, &BigRational)> = p
            .terms()
            .map(|(mono, coeff)| (self.ordered_factors(mono), coeff))
            .collect();
        if terms.is_empty() {
            return self.ctx.num(0);
        }
        terms.sort_by(|a, b| self.factors_cmp(&b.0, &a.0));

        let mut acc: Option<ExprId> = None;
        for (factors, coeff) in terms {
            let magnitude = self.term_to_expr(&factors, &coeff.abs());
            acc = Some(match (acc, coeff.is_negative()) {
                (None, false) => magnitude,
                (None, true) => self.ctx.add(Expr::Neg(magnitude)),
                (Some(prev), false) => self.ctx.add(Expr::Add(prev, magnitude)),
                (Some(prev), true) => self.ctx.add(Expr::Sub(prev, magnitude)),
            });
        }
        acc.unwrap_or_else(|| self.ctx.num(0))
    }

    /// Order of atoms in rebuilt expressions. Atom ids follow first-seen
    /// order inside one normalizer, so symbols are ranked by their symbol
    /// index and every other atom by its key.
    fn atom_cmp(&self, a: AtomId, b: AtomId) -> Ordering {
        let (x, y) = (self.atoms.get(a), self.atoms.get(b));
        match (&x.kind, &y.kind) {
            (AtomKind::Symbol(s), AtomKind::Symbol(t)) => s.index().cmp(&t.index()),
            (AtomKind::Symbol(_), _) => Ordering::Less,
            (_, AtomKind::Symbol(_)) => Ordering::Greater,
            _ => x.key.cmp(&y.key),
        }
    }

    fn ordered_factors(&self, mono: &Monomial) -> Vec<(AtomId, Exp)> {
        let mut factors: Vec<(AtomId, Exp)> = mono.iter().copied().collect();
        factors.sort_by(|&(a, _), &(b, _)| self.atom_cmp(a, b));
        factors
    }

    /// Lexicographic monomial order under [`Self::atom_cmp`].
    fn factors_cmp(&self, a: &[(AtomId, Exp)], b: &[(AtomId, Exp)]) -> Ordering {
        for (&(va, ea), &(vb, eb)) in a.iter().zip(b) {
            match self.atom_cmp(va, vb) {
                // `a` has a power of an earlier atom that `b` lacks
                Ordering::Less => return Ordering::Greater,
                Ordering::Greater => return Ordering::Less,
                Ordering::Equal => match ea.cmp(&eb) {
                    Ordering::Equal => {}
                    ord => return ord,
                },
            }
        }
        a.len().cmp(&b.len())
    }

    fn term_to_expr(&mut self, factors: &[(AtomId, Exp)], coeff: &BigRational) -> ExprId {
        let mut product: Option<ExprId> = None;
        for &(atom, e) in factors {
            let base = self.atoms.get(atom).expr;
            let factor = if e == 1 {
                base
            } else {
                let exp = self.ctx.num(i64::from(e));
                self.ctx.add(Expr::Pow(base, exp))
            };
            product = Some(match product {
                None => factor,
                Some(prev) => self.ctx.add(Expr::Mul(prev, factor)),
            });
        }
        match product {
            None => self.ctx.rational(coeff.clone()),
            Some(p) if coeff.is_one() => p,
            Some(p) => {
                let c = self.ctx.rational(coeff.clone());
                self.ctx.add(Expr::Mul(c, p))
            }
        }
    }
}

/// `c^r` when it is rational, e.g. `4^(1/2) = 2`, `8^(-2/3) = 1/4`.
fn exact_rational_power(c: &BigRational, r: &BigRational) -> Option<BigRational> {
    if c.is_negative() {
        return None;
    }
    let q = r.denom().to_u32()?;
    let p = r.numer().to_i64()?;
    let root = BigRational::new(exact_root(c.numer(), q)?, exact_root(c.denom(), q)?);
    let magnitude = usize::try_from(p.unsigned_abs()).ok()?;
    if p >= 0 {
        Some(num_traits::pow(root, magnitude))
    } else if root.is_zero() {
        None
    } else {
        Some(num_traits::pow(root.recip(), magnitude))
    }
}

fn exact_root(n: &BigInt, q: u32) -> Option<BigInt> {
    let r = n.nth_root(q);
    (num_traits::pow(r.clone(), q as usize) == *n).then_some(r)
}

// =============================================================================
// Convenience entry points
// =============================================================================

/// Simplify `expr` to its reduced rational normal form.
pub fn simplify(
    ctx: &mut Context,
    expr: ExprId,
    budget: &PolyBudget,
) -> Result<ExprId, PolyError> {
    let mut n = Normalizer::new(ctx, budget.clone());
    let form = n.normalize(expr)?;
    Ok(n.to_expr(&form))
}

/// Exact equality of two expressions as rational functions over atoms.
pub fn exprs_equal(
    ctx: &mut Context,
    a: ExprId,
    b: ExprId,
    budget: &PolyBudget,
) -> Result<bool, PolyError> {
    if a == b {
        return Ok(true);
    }
    let mut n = Normalizer::new(ctx, budget.clone());
    let fa = n.normalize(a)?;
    let fb = n.normalize(b)?;
    fa.same_value(&fb, budget)
}

/// Whether `expr` simplifies to exactly `1`.
pub fn is_identically_one(
    ctx: &mut Context,
    expr: ExprId,
    budget: &PolyBudget,
) -> Result<bool, PolyError> {
    let mut n = Normalizer::new(ctx, budget.clone());
    let form = n.normalize(expr)?;
    form.same_value(&RationalForm::one(), budget)
}

/// Whether `expr` simplifies to exactly `0`.
pub fn is_identically_zero(
    ctx: &mut Context,
    expr: ExprId,
    budget: &PolyBudget,
) -> Result<bool, PolyError> {
    let mut n = Normalizer::new(ctx, budget.clone());
    Ok(n.normalize(expr)?.is_zero())
}

/// Symbols `expr` still depends on once normalised.
///
/// Terms that cancel drop out, so `y + z - z` depends on `y` only. Symbols
/// hidden inside an atom (a call argument, a radicand) all count.
pub fn free_symbols(
    ctx: &mut Context,
    expr: ExprId,
    budget: &PolyBudget,
) -> Result<BTreeSet<SymbolId>, PolyError> {
    let mut n = Normalizer::new(ctx, budget.clone());
    let form = n.normalize(expr)?;
    let mut free = BTreeSet::new();
    for (mono, _) in form.num.terms().chain(form.den.terms()) {
        for &(atom, _) in mono.iter() {
            free.extend(n.atoms().get(atom).free.iter().copied());
        }
    }
    Ok(free)
}

//! Sparse multivariate polynomials over Q.
//!
//! Variables are opaque atoms ([`AtomId`]) owned by an
//! [`AtomTable`](crate::atoms::AtomTable): plain symbols, constants, function
//! calls and fractional powers all become polynomial variables.
//!
//! Representation: `BTreeMap<Monomial, BigRational>` with no zero
//! coefficients. A monomial is a list of `(atom, exponent)` pairs sorted by
//! atom id with strictly positive exponents, so every polynomial has exactly
//! one representation and `==` is polynomial identity.

use num_rational::BigRational;
use num_traits::{One, Zero};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use crate::atoms::AtomId;
use crate::error::PolyError;

pub type Exp = u32;

/// Sorted `(atom, exponent)` pairs, exponents > 0.
pub type Monomial = SmallVec<[(AtomId, Exp); 4]>;

/// Limits that keep normalisation from exploding on large systems.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolyBudget {
    pub max_terms: usize,
    pub max_total_degree: u32,
    /// Wall-clock limit shared by every operation of one comparison.
    pub deadline: Option<Instant>,
}

impl Default for PolyBudget {
    fn default() -> Self {
        Self {
            max_terms: 400,
            max_total_degree: 48,
            deadline: None,
        }
    }
}

impl PolyBudget {
    pub fn check_deadline(&self) -> Result<(), PolyError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(PolyError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    fn check(&self, p: &MultiPoly) -> Result<(), PolyError> {
        if p.num_terms() > self.max_terms || p.total_degree() > self.max_total_degree {
            return Err(PolyError::BudgetExceeded);
        }
        Ok(())
    }
}

/// Lexicographic monomial order, lower atom ids most significant.
pub fn lex_cmp(a: &Monomial, b: &Monomial) -> Ordering {
    let (mut i, mut j) = (0, 0);
    loop {
        match (a.get(i), b.get(j)) {
            (None, None) => return Ordering::Equal,
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (Some(&(va, ea)), Some(&(vb, eb))) => match va.cmp(&vb) {
                // `a` has a power of an earlier atom that `b` lacks
                Ordering::Less => return Ordering::Greater,
                Ordering::Greater => return Ordering::Less,
                Ordering::Equal => {
                    match ea.cmp(&eb) {
                        Ordering::Equal => {}
                        ord => return ord,
                    }
                    i += 1;
                    j += 1;
                }
            },
        }
    }
}

fn mono_mul(a: &Monomial, b: &Monomial) -> Monomial {
    let mut out = Monomial::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        match (a.get(i), b.get(j)) {
            (Some(&(va, ea)), Some(&(vb, eb))) => match va.cmp(&vb) {
                Ordering::Less => {
                    out.push((va, ea));
                    i += 1;
                }
                Ordering::Greater => {
                    out.push((vb, eb));
                    j += 1;
                }
                Ordering::Equal => {
                    out.push((va, ea + eb));
                    i += 1;
                    j += 1;
                }
            },
            (Some(&t), None) => {
                out.push(t);
                i += 1;
            }
            (None, Some(&t)) => {
                out.push(t);
                j += 1;
            }
            (None, None) => break,
        }
    }
    out
}

/// `a / b` when `b` divides `a`.
fn mono_div(a: &Monomial, b: &Monomial) -> Option<Monomial> {
    let mut out = Monomial::new();
    let mut j = 0;
    for &(va, ea) in a {
        match b.get(j) {
            Some(&(vb, eb)) if vb == va => {
                if eb > ea {
                    return None;
                }
                if ea > eb {
                    out.push((va, ea - eb));
                }
                j += 1;
            }
            Some(&(vb, _)) if vb < va => return None,
            _ => out.push((va, ea)),
        }
    }
    if j < b.len() {
        return None;
    }
    Some(out)
}

fn mono_degree(m: &Monomial) -> u32 {
    m.iter().map(|(_, e)| *e).sum()
}

fn mono_exp_of(m: &Monomial, atom: AtomId) -> Exp {
    m.iter()
        .find(|(a, _)| *a == atom)
        .map(|(_, e)| *e)
        .unwrap_or(0)
}

fn mono_without(m: &Monomial, atom: AtomId) -> Monomial {
    m.iter().copied().filter(|(a, _)| *a != atom).collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiPoly {
    terms: BTreeMap<Monomial, BigRational>,
}

impl MultiPoly {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(BigRational::one())
    }

    pub fn constant(c: BigRational) -> Self {
        let mut terms = BTreeMap::new();
        if !c.is_zero() {
            terms.insert(Monomial::new(), c);
        }
        Self { terms }
    }

    /// The polynomial `atom^1`.
    pub fn atom(atom: AtomId) -> Self {
        let mut mono = Monomial::new();
        mono.push((atom, 1));
        let mut terms = BTreeMap::new();
        terms.insert(mono, BigRational::one());
        Self { terms }
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn is_one(&self) -> bool {
        self.constant_value().is_some_and(|c| c.is_one())
    }

    pub fn is_constant(&self) -> bool {
        self.terms.keys().all(|m| m.is_empty())
    }

    pub fn constant_value(&self) -> Option<BigRational> {
        if self.is_zero() {
            Some(BigRational::zero())
        } else if self.is_constant() {
            self.terms.values().next().cloned()
        } else {
            None
        }
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    pub fn total_degree(&self) -> u32 {
        self.terms.keys().map(mono_degree).max().unwrap_or(0)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &BigRational)> {
        self.terms.iter()
    }

    /// Every atom that occurs with a positive exponent.
    pub fn atoms(&self) -> BTreeSet<AtomId> {
        self.terms
            .keys()
            .flat_map(|m| m.iter().map(|(a, _)| *a))
            .collect()
    }

    pub fn contains_atom(&self, atom: AtomId) -> bool {
        self.terms.keys().any(|m| m.iter().any(|(a, _)| *a == atom))
    }

    pub fn degree_in(&self, atom: AtomId) -> Exp {
        self.terms
            .keys()
            .map(|m| mono_exp_of(m, atom))
            .max()
            .unwrap_or(0)
    }

    /// Split into coefficients of `atom^0 .. atom^degree`.
    pub fn coefficients_in(&self, atom: AtomId) -> Vec<MultiPoly> {
        let degree = self.degree_in(atom) as usize;
        let mut coeffs = vec![MultiPoly::zero(); degree + 1];
        for (m, c) in &self.terms {
            let e = mono_exp_of(m, atom) as usize;
            coeffs[e].terms.insert(mono_without(m, atom), c.clone());
        }
        coeffs
    }

    /// Lex-leading term.
    pub fn leading_term(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.iter().max_by(|a, b| lex_cmp(a.0, b.0))
    }

    pub fn leading_coefficient(&self) -> Option<&BigRational> {
        self.leading_term().map(|(_, c)| c)
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

impl MultiPoly {
    pub fn neg(&self) -> Self {
        Self {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), -c.clone()))
                .collect(),
        }
    }

    pub fn add(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        let mut terms = self.terms.clone();
        for (m, c) in &other.terms {
            let entry = terms.entry(m.clone()).or_insert_with(BigRational::zero);
            *entry = entry.clone() + c;
            if entry.is_zero() {
                terms.remove(m);
            }
        }
        let result = Self { terms };
        budget.check(&result)?;
        Ok(result)
    }

    pub fn sub(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        self.add(&other.neg(), budget)
    }

    pub fn mul_scalar(&self, k: &BigRational) -> Self {
        if k.is_zero() {
            return Self::zero();
        }
        Self {
            terms: self.terms.iter().map(|(m, c)| (m.clone(), c * k)).collect(),
        }
    }

    pub fn mul(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        if self.is_zero() || other.is_zero() {
            return Ok(Self::zero());
        }
        budget.check_deadline()?;

        let mut terms: BTreeMap<Monomial, BigRational> = BTreeMap::new();
        for (m1, c1) in &self.terms {
            for (m2, c2) in &other.terms {
                let mono = mono_mul(m1, m2);
                if mono_degree(&mono) > budget.max_total_degree {
                    return Err(PolyError::BudgetExceeded);
                }
                let entry = terms.entry(mono).or_insert_with(BigRational::zero);
                *entry += c1 * c2;
            }
            if terms.len() > budget.max_terms * 4 {
                return Err(PolyError::BudgetExceeded);
            }
        }
        terms.retain(|_, c| !c.is_zero());

        let result = Self { terms };
        budget.check(&result)?;
        Ok(result)
    }

    pub fn pow(&self, exp: u32, budget: &PolyBudget) -> Result<Self, PolyError> {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = result.mul(&base, budget)?;
            }
            e >>= 1;
            if e > 0 {
                base = base.mul(&base, budget)?;
            }
        }
        Ok(result)
    }
}

// =============================================================================
// Content / monomial GCD / exact division
// =============================================================================

impl MultiPoly {
    /// Common monomial factor of all terms (min exponent per atom).
    pub fn monomial_gcd(&self) -> Monomial {
        let mut iter = self.terms.keys();
        let Some(first) = iter.next() else {
            return Monomial::new();
        };
        let mut gcd = first.clone();
        for m in iter {
            gcd = gcd
                .iter()
                .filter_map(|&(a, e)| {
                    let other = mono_exp_of(m, a);
                    (other > 0).then_some((a, e.min(other)))
                })
                .collect();
            if gcd.is_empty() {
                break;
            }
        }
        gcd
    }

    pub fn monomial_gcd_with(&self, other: &Self) -> Monomial {
        let a = self.monomial_gcd();
        let b = other.monomial_gcd();
        a.iter()
            .filter_map(|&(atom, e)| {
                let other = mono_exp_of(&b, atom);
                (other > 0).then_some((atom, e.min(other)))
            })
            .collect()
    }

    pub fn div_monomial(&self, mono: &Monomial) -> Option<Self> {
        let mut terms = BTreeMap::new();
        for (m, c) in &self.terms {
            terms.insert(mono_div(m, mono)?, c.clone());
        }
        Some(Self { terms })
    }

    /// Exact division `self / divisor`; `None` when it leaves a remainder.
    pub fn div_exact(&self, divisor: &Self, budget: &PolyBudget) -> Option<Self> {
        if divisor.is_zero() {
            return None;
        }
        if self.is_zero() {
            return Some(Self::zero());
        }
        if let Some(c) = divisor.constant_value() {
            return Some(self.mul_scalar(&(BigRational::one() / c)));
        }

        let (d_mono, d_coeff) = divisor.leading_term()?;
        let (d_mono, d_coeff) = (d_mono.clone(), d_coeff.clone());
        let mut remainder = self.clone();
        let mut quotient = Self::zero();

        // every step removes the current leading monomial, and lex order is
        // a well-order, so the loop ends; the cap is only a budget guard
        let mut steps = 0usize;
        while let Some((r_mono, r_coeff)) = remainder.leading_term() {
            steps += 1;
            if steps > budget.max_terms * 4 {
                return None;
            }
            let q_mono = mono_div(r_mono, &d_mono)?;
            let q_coeff = r_coeff / &d_coeff;
            let mut q_term = Self::zero();
            q_term.terms.insert(q_mono, q_coeff);

            let product = divisor.mul(&q_term, budget).ok()?;
            remainder = remainder.sub(&product, budget).ok()?;
            quotient = quotient.add(&q_term, budget).ok()?;
        }

        Some(quotient)
    }

    /// `(c, p)` with `self = c * p` and `p` having a positive leading
    /// coefficient of one.
    pub fn monic_split(&self) -> (BigRational, Self) {
        match self.leading_coefficient() {
            Some(lc) if !lc.is_one() => {
                let lc = lc.clone();
                let inv = BigRational::one() / &lc;
                (lc, self.mul_scalar(&inv))
            }
            _ => (BigRational::one(), self.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn x() -> MultiPoly {
        MultiPoly::atom(0)
    }

    fn y() -> MultiPoly {
        MultiPoly::atom(1)
    }

    fn c(n: i64) -> MultiPoly {
        MultiPoly::constant(BigRational::from_integer(n.into()))
    }

    #[test]
    fn addition_cancels_terms() {
        let b = PolyBudget::default();
        let p = x().add(&y(), &b).unwrap();
        let q = p.sub(&y(), &b).unwrap();
        assert_eq!(q, x());
        assert!(x().sub(&x(), &b).unwrap().is_zero());
    }

    #[test]
    fn multiplication_expands() {
        let b = PolyBudget::default();
        let xp1 = x().add(&c(1), &b).unwrap();
        let xm1 = x().sub(&c(1), &b).unwrap();
        let prod = xp1.mul(&xm1, &b).unwrap();
        let expected = x().mul(&x(), &b).unwrap().sub(&c(1), &b).unwrap();
        assert_eq!(prod, expected);
        assert_eq!(prod.degree_in(0), 2);
        assert_eq!(prod.num_terms(), 2);
    }

    #[test]
    fn coefficients_split_by_atom() {
        let b = PolyBudget::default();
        // y*x^2 + 3x + y
        let p = y()
            .mul(&x().pow(2, &b).unwrap(), &b)
            .unwrap()
            .add(&x().mul_scalar(&BigRational::from_integer(3.into())), &b)
            .unwrap()
            .add(&y(), &b)
            .unwrap();
        let coeffs = p.coefficients_in(0);
        assert_eq!(coeffs.len(), 3);
        assert_eq!(coeffs[0], y());
        assert_eq!(coeffs[1], c(3));
        assert_eq!(coeffs[2], y());
    }

    #[test]
    fn exact_division() {
        let b = PolyBudget::default();
        let x2m1 = x().pow(2, &b).unwrap().sub(&c(1), &b).unwrap();
        let xm1 = x().sub(&c(1), &b).unwrap();
        let q = x2m1.div_exact(&xm1, &b).expect("x - 1 divides x^2 - 1");
        assert_eq!(q, x().add(&c(1), &b).unwrap());

        let x2p1 = x().pow(2, &b).unwrap().add(&c(1), &b).unwrap();
        assert!(x2p1.div_exact(&xm1, &b).is_none());
    }

    #[test]
    fn monomial_gcd_takes_minimum_exponents() {
        let b = PolyBudget::default();
        let p = x()
            .pow(2, &b)
            .unwrap()
            .mul(&y(), &b)
            .unwrap()
            .add(&x().pow(3, &b).unwrap().mul(&y().pow(2, &b).unwrap(), &b).unwrap(), &b)
            .unwrap();
        let g = p.monomial_gcd();
        assert_eq!(g.as_slice(), &[(0, 2), (1, 1)]);
        let reduced = p.div_monomial(&g).unwrap();
        assert_eq!(reduced.num_terms(), 2);
    }

    #[test]
    fn budget_limits_degree() {
        let tight = PolyBudget {
            max_total_degree: 3,
            ..PolyBudget::default()
        };
        assert_eq!(x().pow(4, &tight), Err(PolyError::BudgetExceeded));
    }

    #[test]
    fn lex_order_prefers_earlier_atoms() {
        let mut xm = Monomial::new();
        xm.push((0, 1));
        let mut y3 = Monomial::new();
        y3.push((1, 3));
        assert_eq!(lex_cmp(&xm, &y3), Ordering::Greater);
        assert_eq!(lex_cmp(&Monomial::new(), &y3), Ordering::Less);
    }
}

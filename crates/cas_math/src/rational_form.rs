//! Rational functions `num / den` over the atom polynomial ring.

use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::atoms::AtomId;
use crate::error::PolyError;
use crate::multipoly::{MultiPoly, PolyBudget};

/// `num / den` with `den != 0`.
///
/// Equality of the represented functions is decided by
/// [`RationalForm::same_value`] (cross multiplication), never by comparing
/// the fields, because forms are not fully reduced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RationalForm {
    pub num: MultiPoly,
    pub den: MultiPoly,
}

impl RationalForm {
    pub fn zero() -> Self {
        Self::from_poly(MultiPoly::zero())
    }

    pub fn one() -> Self {
        Self::from_poly(MultiPoly::one())
    }

    pub fn constant(c: BigRational) -> Self {
        Self::from_poly(MultiPoly::constant(c))
    }

    pub fn atom(atom: AtomId) -> Self {
        Self::from_poly(MultiPoly::atom(atom))
    }

    pub fn from_poly(num: MultiPoly) -> Self {
        Self {
            num,
            den: MultiPoly::one(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// True only when the form is literally `1 / 1` after reduction.
    pub fn is_one(&self) -> bool {
        !self.num.is_zero() && self.num == self.den
    }

    pub fn as_constant(&self) -> Option<BigRational> {
        let n = self.num.constant_value()?;
        let d = self.den.constant_value()?;
        Some(n / d)
    }

    pub fn contains_atom(&self, atom: AtomId) -> bool {
        self.num.contains_atom(atom) || self.den.contains_atom(atom)
    }

    /// If the form is exactly `atom^k` (coefficient one, trivial
    /// denominator), return `(atom, k)`.
    pub fn as_atom_power(&self) -> Option<(AtomId, u32)> {
        if !self.den.is_one() || self.num.num_terms() != 1 {
            return None;
        }
        let (mono, coeff) = self.num.terms().next()?;
        if !coeff.is_one() || mono.len() != 1 {
            return None;
        }
        Some(mono[0])
    }

    pub fn neg(&self) -> Self {
        Self {
            num: self.num.neg(),
            den: self.den.clone(),
        }
    }

    pub fn add(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        if self.den == other.den {
            return Ok(Self {
                num: self.num.add(&other.num, budget)?,
                den: self.den.clone(),
            });
        }
        let left = self.num.mul(&other.den, budget)?;
        let right = other.num.mul(&self.den, budget)?;
        Ok(Self {
            num: left.add(&right, budget)?,
            den: self.den.mul(&other.den, budget)?,
        })
    }

    pub fn sub(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        self.add(&other.neg(), budget)
    }

    pub fn mul(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        Ok(Self {
            num: self.num.mul(&other.num, budget)?,
            den: self.den.mul(&other.den, budget)?,
        })
    }

    pub fn div(&self, other: &Self, budget: &PolyBudget) -> Result<Self, PolyError> {
        if other.is_zero() {
            return Err(PolyError::DivisionByZero);
        }
        Ok(Self {
            num: self.num.mul(&other.den, budget)?,
            den: self.den.mul(&other.num, budget)?,
        })
    }

    pub fn powi(&self, exp: i64, budget: &PolyBudget) -> Result<Self, PolyError> {
        let e = u32::try_from(exp.unsigned_abs()).map_err(|_| PolyError::BudgetExceeded)?;
        if exp >= 0 {
            Ok(Self {
                num: self.num.pow(e, budget)?,
                den: self.den.pow(e, budget)?,
            })
        } else {
            if self.is_zero() {
                return Err(PolyError::DivisionByZero);
            }
            Ok(Self {
                num: self.den.pow(e, budget)?,
                den: self.num.pow(e, budget)?,
            })
        }
    }

    /// Whether both forms denote the same rational function.
    pub fn same_value(&self, other: &Self, budget: &PolyBudget) -> Result<bool, PolyError> {
        let left = self.num.mul(&other.den, budget)?;
        let right = other.num.mul(&self.den, budget)?;
        Ok(left == right)
    }

    /// Cancel what can be cancelled without a full multivariate GCD:
    /// common monomials, exact division in either direction, and the
    /// leading coefficient of the denominator.
    pub fn reduce(&self, budget: &PolyBudget) -> Self {
        if self.num.is_zero() {
            return Self::zero();
        }
        let mut num = self.num.clone();
        let mut den = self.den.clone();

        let common = num.monomial_gcd_with(&den);
        if !common.is_empty() {
            if let (Some(n), Some(d)) = (num.div_monomial(&common), den.div_monomial(&common)) {
                num = n;
                den = d;
            }
        }

        if let Some(q) = num.div_exact(&den, budget) {
            return Self::from_poly(q);
        }
        if !num.is_constant() {
            if let Some(q) = den.div_exact(&num, budget) {
                num = MultiPoly::one();
                den = q;
            }
        }

        let (lc, monic) = den.monic_split();
        if !lc.is_one() {
            num = num.mul_scalar(&(BigRational::one() / lc));
            den = monic;
        }
        if let Some(c) = den.constant_value() {
            if !c.is_zero() && !c.is_one() {
                num = num.mul_scalar(&(BigRational::one() / c.abs()));
                den = MultiPoly::one();
            }
        }
        Self { num, den }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: i64) -> RationalForm {
        RationalForm::constant(BigRational::from_integer(n.into()))
    }

    #[test]
    fn cross_multiplication_decides_equality() {
        let b = PolyBudget::default();
        let x = RationalForm::atom(0);
        let y = RationalForm::atom(1);
        // (x*y)/y vs x
        let xy = x.mul(&y, &b).unwrap();
        let q = xy.div(&y, &b).unwrap();
        assert!(q.same_value(&x, &b).unwrap());
        assert!(!q.same_value(&y, &b).unwrap());
    }

    #[test]
    fn reduce_cancels_exact_factors() {
        let b = PolyBudget::default();
        let x = RationalForm::atom(0);
        let one = int(1);
        // (x^2 - 1) / (x - 1) reduces to x + 1
        let x2m1 = x.powi(2, &b).unwrap().sub(&one, &b).unwrap();
        let xm1 = x.sub(&one, &b).unwrap();
        let q = x2m1.div(&xm1, &b).unwrap().reduce(&b);
        assert!(q.den.is_one());
        assert_eq!(q, x.add(&one, &b).unwrap());
    }

    #[test]
    fn reduce_of_identical_parts_is_one() {
        let b = PolyBudget::default();
        let x = RationalForm::atom(0);
        let y = RationalForm::atom(1);
        let s = x.add(&y, &b).unwrap();
        let ratio = s.div(&s, &b).unwrap().reduce(&b);
        assert!(ratio.is_one());
    }

    #[test]
    fn negative_powers_invert() {
        let b = PolyBudget::default();
        let x = RationalForm::atom(0);
        let inv = x.powi(-2, &b).unwrap();
        assert!(inv.num.is_one());
        assert_eq!(inv.den.degree_in(0), 2);
        assert_eq!(RationalForm::zero().powi(-1, &b), Err(PolyError::DivisionByZero));
    }

    #[test]
    fn constant_denominators_fold_into_numerator() {
        let b = PolyBudget::default();
        let x = RationalForm::atom(0);
        let half = x.div(&int(2), &b).unwrap().reduce(&b);
        assert!(half.den.is_one());
        assert_eq!(
            half.num.leading_coefficient().cloned(),
            Some(BigRational::new(1.into(), 2.into()))
        );
    }
}

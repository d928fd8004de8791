use cas_math::{MultiPoly, Normalizer, PolyBudget, PolyError, RationalForm};
use num_bigint::BigInt;
use num_rational::BigRational;

/// Compute the quadratic discriminant `b^2 - 4ac`.
pub fn discriminant(
    a: &MultiPoly,
    b: &MultiPoly,
    c: &MultiPoly,
    budget: &PolyBudget,
) -> Result<MultiPoly, PolyError> {
    let b2 = b.mul(b, budget)?;
    let four = BigRational::from_integer(BigInt::from(4));
    let ac4 = a.mul(c, budget)?.mul_scalar(&four);
    b2.sub(&ac4, budget)
}

/// Roots of `a*x^2 + b*x + c`.
///
/// A discriminant that is identically zero yields the single double root
/// `-b / 2a`; otherwise both roots `(-b ∓ sqrt(delta)) / 2a` are returned.
pub fn quadratic_roots(
    norm: &mut Normalizer<'_>,
    a: &MultiPoly,
    b: &MultiPoly,
    c: &MultiPoly,
) -> Result<Vec<RationalForm>, PolyError> {
    let budget = norm.budget().clone();
    let delta = discriminant(a, b, c, &budget)?;
    let two = BigRational::from_integer(BigInt::from(2));
    let two_a = RationalForm::from_poly(a.mul_scalar(&two));
    let neg_b = RationalForm::from_poly(b.neg());

    if delta.is_zero() {
        return Ok(vec![neg_b.div(&two_a, &budget)?.reduce(&budget)]);
    }

    let half = BigRational::new(BigInt::from(1), BigInt::from(2));
    let sqrt_delta = norm.power_of_form(RationalForm::from_poly(delta), &half)?;
    let x1 = neg_b.sub(&sqrt_delta, &budget)?.div(&two_a, &budget)?;
    let x2 = neg_b.add(&sqrt_delta, &budget)?.div(&two_a, &budget)?;
    Ok(vec![x1.reduce(&budget), x2.reduce(&budget)])
}

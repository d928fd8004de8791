use thiserror::Error;

/// Failures of exact polynomial / rational-function algebra.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolyError {
    #[error("expression is not representable: {0}")]
    NonPolynomial(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("polynomial budget exceeded")]
    BudgetExceeded,
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

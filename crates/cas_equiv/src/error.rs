use cas_math::PolyError;
use cas_solver_core::SolveError;
use thiserror::Error;

/// A failed call into the algebra engine.
///
/// The equivalence procedure treats these as "this attempt failed" and
/// moves on; only an expired deadline aborts a comparison.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Solve(#[from] SolveError),
    #[error(transparent)]
    Poly(#[from] PolyError),
}

impl EngineError {
    pub fn is_deadline(&self) -> bool {
        matches!(
            self,
            EngineError::Solve(SolveError::DeadlineExceeded)
                | EngineError::Solve(SolveError::Poly(PolyError::DeadlineExceeded))
                | EngineError::Poly(PolyError::DeadlineExceeded)
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EquivError {
    #[error("an equation group needs at least one equation")]
    EmptyGroup,
    #[error("algebra engine: {0}")]
    Engine(#[from] EngineError),
}

impl EquivError {
    pub fn is_deadline(&self) -> bool {
        matches!(self, EquivError::Engine(err) if err.is_deadline())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_expired_deadlines_count_as_deadlines() {
        let late = EquivError::Engine(EngineError::Poly(PolyError::DeadlineExceeded));
        assert!(late.is_deadline());
        let nested = EngineError::Solve(SolveError::Poly(PolyError::DeadlineExceeded));
        assert!(EquivError::from(nested).is_deadline());

        let stuck = EngineError::Solve(SolveError::CannotIsolate("x".to_string()));
        assert!(!EquivError::from(stuck).is_deadline());
        assert!(!EquivError::EmptyGroup.is_deadline());
    }
}

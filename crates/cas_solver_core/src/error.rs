use cas_math::PolyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error("cannot isolate '{0}'")]
    CannotIsolate(String),
    #[error("polynomial of degree {degree} in '{var}' is not supported")]
    UnsupportedDegree { var: String, degree: u32 },
    #[error("deadline exceeded while solving")]
    DeadlineExceeded,
    #[error(transparent)]
    Poly(PolyError),
}

impl From<PolyError> for SolveError {
    fn from(err: PolyError) -> Self {
        match err {
            PolyError::DeadlineExceeded => SolveError::DeadlineExceeded,
            other => SolveError::Poly(other),
        }
    }
}

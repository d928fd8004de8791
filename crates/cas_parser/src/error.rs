use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Parse error: {0}")]
    NomError(String),
    #[error("Unconsumed input: {0}")]
    UnconsumedInput(String),
    #[error("LaTeX error: {0}")]
    Latex(String),
    #[error("Not an equation (no '='): {0}")]
    NotAnEquation(String),
    #[error("Empty input")]
    Empty,
}

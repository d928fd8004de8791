//! Plain-text and LaTeX readers producing [`cas_ast`] expressions and equations.

pub mod error;
pub mod latex_parser;
pub mod lines;
pub mod parser;

pub use error::ParseError;
pub use latex_parser::{parse_latex, parse_latex_equation, tokenize, Token};
pub use lines::equation_lines;
pub use parser::{parse, parse_equation, TIME_VARIABLE};

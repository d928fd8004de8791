//! LaTeX to Expression Parser
//!
//! Turns the LaTeX of a model equation into expressions of a caller-owned
//! [`Context`]. Uses a hybrid approach: nom-based tokenizer + recursive
//! descent parser.
//!
//! Conventions follow written math rather than programming identifiers:
//! adjacent letters multiply (`RT` is `R * T`), subscripts belong to the
//! symbol (`C_{A,in}` is the symbol `C_A,in`), and `e` followed by `^` is
//! Euler's number. Time derivatives are written `\frac{dV}{dt}`,
//! `\frac{d}{dt} V` or `\dot{V}` and become `diff(V, t)`;
//! `\frac{d^2 x}{dt^2}` nests to `diff(diff(x, t), t)`.
//!
//! # Example
//! ```ignore
//! let ctx = &mut Context::new();
//! let eq = parse_latex_equation(ctx, "\\frac{dV}{dt} = q_{in} - q_{out}")?;
//! ```

use cas_ast::{Constant, Context, Equation, Expr, ExprId};
use nom::{
    branch::alt,
    bytes::complete::{take_till, take_while1},
    character::complete::{anychar, char, digit0, digit1},
    combinator::{map, opt, recognize, value},
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::ParseError;
use crate::parser::{decimal_to_rational, TIME_VARIABLE};

// ============================================================================
// Token Definition
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(String), // "123", "0.5"
    Letter(String), // "x", or a command name such as "alpha"
    Word(String),   // "in" from \mathrm{in} or \text{in}

    // Operators
    Plus,       // +
    Minus,      // -
    Cdot,       // \cdot, \times, *
    Slash,      // /, \div
    Caret,      // ^
    Underscore, // _
    Equals,     // =
    Comma,      // ,

    // Grouping
    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]

    // LaTeX Commands
    Frac,         // \frac, \dfrac, \tfrac
    Sqrt,         // \sqrt
    Func(String), // \sin, \exp, \ln, ...
    Log,          // \log, optionally with a base subscript
    Pi,           // \pi
    Dot,          // \dot
}

// ============================================================================
// Tokenizer (using nom)
// ============================================================================

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic()
}

/// Commands that only affect layout.
fn is_layout_command(cmd: &str) -> bool {
    matches!(
        cmd,
        "left" | "right" | "big" | "Big" | "bigg" | "Bigg" | "displaystyle" | "quad" | "qquad"
    )
}

/// Braced text after \mathrm, \text, ... with blanks removed.
fn text_argument(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('{'), take_till(|c| c == '}'), char('}')),
        |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect(),
    )(input)
}

/// Parse a LaTeX command like \frac, \sqrt, \sin, etc.
fn latex_command(input: &str) -> IResult<&str, Option<Token>> {
    let (input, _) = char('\\')(input)?;

    // \, \; \! \\ and friends are spacing
    if let Ok((rest, _)) = anychar::<_, nom::error::Error<&str>>(input) {
        if !input.starts_with(is_alpha) {
            return Ok((rest, None));
        }
    }

    let (input, cmd) = take_while1(is_alpha)(input)?;

    let token = match cmd {
        "frac" | "dfrac" | "tfrac" => Token::Frac,
        "sqrt" => Token::Sqrt,
        "sin" | "cos" | "tan" | "cot" | "sec" | "csc" | "sinh" | "cosh" | "tanh" | "arcsin"
        | "arccos" | "arctan" | "exp" | "ln" => Token::Func(cmd.to_string()),
        "log" => Token::Log,
        "pi" => Token::Pi,
        "cdot" | "times" => Token::Cdot,
        "div" => Token::Slash,
        "dot" => Token::Dot,
        "mathrm" | "mathit" | "mathbf" | "text" | "textrm" | "textit" | "operatorname" => {
            let (input, text) =
                preceded(nom::character::complete::multispace0, text_argument)(input)?;
            return Ok((input, Some(Token::Word(text))));
        }
        _ if is_layout_command(cmd) => return Ok((input, None)),
        // Unknown commands (Greek letters, ...) become symbols
        _ => Token::Letter(cmd.to_string()),
    };

    Ok((input, Some(token)))
}

/// Parse a number (integer or decimal)
fn number(input: &str) -> IResult<&str, Option<Token>> {
    map(
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        |digits: &str| Some(Token::Number(digits.to_string())),
    )(input)
}

/// A single letter; adjacent letters are separate symbols
fn letter(input: &str) -> IResult<&str, Option<Token>> {
    map(nom::character::complete::satisfy(is_alpha), |c| {
        Some(Token::Letter(c.to_string()))
    })(input)
}

/// Parse a single-character operator or grouping symbol
fn operator_or_grouping(input: &str) -> IResult<&str, Option<Token>> {
    map(
        alt((
            value(Token::Plus, char('+')),
            value(Token::Minus, char('-')),
            value(Token::Cdot, char('*')),
            value(Token::Slash, char('/')),
            value(Token::Caret, char('^')),
            value(Token::Underscore, char('_')),
            value(Token::Equals, char('=')),
            value(Token::Comma, char(',')),
            value(Token::LBrace, char('{')),
            value(Token::RBrace, char('}')),
            value(Token::LParen, char('(')),
            value(Token::RParen, char(')')),
            value(Token::LBracket, char('[')),
            value(Token::RBracket, char(']')),
        )),
        Some,
    )(input)
}

/// Alignment markers carry no meaning for a single equation
fn ignorable(input: &str) -> IResult<&str, Option<Token>> {
    value(None, alt((char('&'), char('$'))))(input)
}

/// Parse a single token; `None` for input that produces no token
fn token(input: &str) -> IResult<&str, Option<Token>> {
    alt((latex_command, number, operator_or_grouping, letter, ignorable))(input)
}

/// Tokenize entire LaTeX string
pub fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut remaining = input;

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }
        match token(remaining) {
            Ok((rest, tok)) => {
                tokens.extend(tok);
                remaining = rest;
            }
            Err(_) => {
                let end = remaining
                    .char_indices()
                    .nth(20)
                    .map_or(remaining.len(), |(i, _)| i);
                return Err(ParseError::Latex(format!(
                    "failed to tokenize at: '{}'",
                    &remaining[..end]
                )));
            }
        }
    }

    Ok(tokens)
}

// ============================================================================
// Parser (Recursive Descent)
// ============================================================================

pub struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ctx: &'a mut Context,
}

type PResult<T> = Result<T, ParseError>;

fn err<T>(msg: impl Into<String>) -> PResult<T> {
    Err(ParseError::Latex(msg.into()))
}

fn is_d(tok: Option<&Token>) -> bool {
    matches!(tok, Some(Token::Letter(s)) | Some(Token::Word(s)) if s == "d")
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], ctx: &'a mut Context) -> Self {
        Self {
            tokens,
            pos: 0,
            ctx,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> PResult<()> {
        match self.advance() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => err(format!("expected {:?}, got {:?}", expected, tok)),
            None => err(format!("expected {:?}, got end of input", expected)),
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Parse `lhs = rhs`
    pub fn parse_equation(&mut self) -> PResult<Equation> {
        let lhs = self.parse_expr()?;
        self.expect(&Token::Equals)?;
        let rhs = self.parse_expr()?;
        Ok(Equation::new(lhs, rhs))
    }

    /// Parse expression (lowest precedence: addition/subtraction)
    pub fn parse_expr(&mut self) -> PResult<ExprId> {
        let mut left = match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                let inner = self.parse_term()?;
                self.ctx.add(Expr::Neg(inner))
            }
            Some(Token::Plus) => {
                self.advance();
                self.parse_term()?
            }
            _ => self.parse_term()?,
        };

        while let Some(tok) = self.peek() {
            match tok {
                Token::Plus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = self.ctx.add(Expr::Add(left, right));
                }
                Token::Minus => {
                    self.advance();
                    let right = self.parse_term()?;
                    left = self.ctx.add(Expr::Sub(left, right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    /// Parse term (multiplication - implicit or explicit with \cdot, and /)
    fn parse_term(&mut self) -> PResult<ExprId> {
        let mut left = self.parse_power()?;

        while let Some(tok) = self.peek() {
            match tok {
                Token::Cdot => {
                    self.advance();
                    let right = self.parse_power()?;
                    left = self.ctx.add(Expr::Mul(left, right));
                }
                Token::Slash => {
                    self.advance();
                    let right = self.parse_power()?;
                    left = self.ctx.add(Expr::Div(left, right));
                }
                // Implicit multiplication: two factors next to each other
                Token::Letter(_)
                | Token::Word(_)
                | Token::Number(_)
                | Token::Frac
                | Token::Sqrt
                | Token::LBrace
                | Token::LParen
                | Token::Func(_)
                | Token::Log
                | Token::Pi
                | Token::Dot => {
                    let right = self.parse_power()?;
                    left = self.ctx.add(Expr::Mul(left, right));
                }
                _ => break,
            }
        }

        Ok(left)
    }

    /// Parse power (exponentiation with ^)
    fn parse_power(&mut self) -> PResult<ExprId> {
        let base = self.parse_atom()?;

        if let Some(Token::Caret) = self.peek() {
            self.advance();
            let exp = self.parse_exponent()?;
            Ok(self.ctx.add(Expr::Pow(base, exp)))
        } else {
            Ok(base)
        }
    }

    /// Exponents are a braced group or a single (possibly negated) atom
    fn parse_exponent(&mut self) -> PResult<ExprId> {
        if let Some(Token::Minus) = self.peek() {
            self.advance();
            let inner = self.parse_atom()?;
            return Ok(self.ctx.add(Expr::Neg(inner)));
        }
        self.parse_atom()
    }

    /// Subscript text after `_`: `x_1`, `q_{in}`, `C_{A,0}`
    fn parse_subscript(&mut self) -> PResult<String> {
        match self.advance().cloned() {
            Some(Token::LBrace) => {
                let mut text = String::new();
                loop {
                    match self.advance().cloned() {
                        Some(Token::RBrace) => break,
                        Some(Token::Letter(s)) | Some(Token::Word(s)) | Some(Token::Number(s)) => {
                            text.push_str(&s)
                        }
                        Some(Token::Comma) => text.push(','),
                        Some(tok) => return err(format!("unexpected {:?} in subscript", tok)),
                        None => return err("unterminated subscript"),
                    }
                }
                Ok(text)
            }
            Some(Token::Letter(s)) | Some(Token::Word(s)) | Some(Token::Number(s)) => Ok(s),
            Some(tok) => err(format!("unexpected {:?} in subscript", tok)),
            None => err("missing subscript"),
        }
    }

    /// Symbol name with an optional subscript
    fn parse_symbol_name(&mut self, base: String) -> PResult<String> {
        if let Some(Token::Underscore) = self.peek() {
            self.advance();
            let sub = self.parse_subscript()?;
            Ok(format!("{}_{}", base, sub))
        } else {
            Ok(base)
        }
    }

    /// Argument of a function command: a group, or the next factor
    fn parse_function_arg(&mut self) -> PResult<ExprId> {
        match self.peek() {
            Some(Token::LParen) | Some(Token::LBrace) | Some(Token::LBracket) => self.parse_atom(),
            _ => self.parse_power(),
        }
    }

    fn time_derivative(&mut self, of: ExprId, wrt: &str) -> ExprId {
        let t = self.ctx.var(wrt);
        self.ctx.call("diff", vec![of, t])
    }

    /// Optional `^n` after a `d`; no exponent means first order.
    fn derivative_order(&mut self) -> PResult<u32> {
        if !matches!(self.peek(), Some(Token::Caret)) {
            return Ok(1);
        }
        self.advance();
        let digits = match self.advance().cloned() {
            Some(Token::Number(s)) => s,
            Some(Token::LBrace) => match self.advance().cloned() {
                Some(Token::Number(s)) => {
                    self.expect(&Token::RBrace)?;
                    s
                }
                _ => return err("derivative order must be a positive integer"),
            },
            _ => return err("derivative order must be a positive integer"),
        };
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => err(format!("invalid derivative order {}", digits)),
        }
    }

    /// `\frac{d^n X}{d t^n}` or `\frac{d^n}{d t^n} X`, after `\frac` was
    /// consumed. `Ok(None)` means the fraction is not a derivative at all.
    fn parse_derivative(&mut self) -> PResult<Option<ExprId>> {
        self.expect(&Token::LBrace)?;
        if !is_d(self.advance()) {
            return Ok(None);
        }
        let Ok(order) = self.derivative_order() else {
            return Ok(None);
        };
        let numerator = if let Some(Token::RBrace) = self.peek() {
            self.advance();
            None
        } else {
            let n = self.parse_expr()?;
            self.expect(&Token::RBrace)?;
            Some(n)
        };

        if !matches!(self.advance(), Some(Token::LBrace)) || !is_d(self.advance()) {
            return Ok(None);
        }
        let wrt = match self.advance().cloned() {
            Some(Token::Letter(s)) | Some(Token::Word(s)) => self.parse_symbol_name(s)?,
            _ => return Ok(None),
        };
        let wrt_order = self.derivative_order()?;
        if !matches!(self.advance(), Some(Token::RBrace)) {
            return Ok(None);
        }
        if wrt_order != order {
            return err(format!(
                "derivative of order {} taken {} times with respect to {}",
                order, wrt_order, wrt
            ));
        }

        let mut of = match numerator {
            Some(n) => n,
            None => self.parse_power()?,
        };
        for _ in 0..order {
            of = self.time_derivative(of, &wrt);
        }
        Ok(Some(of))
    }

    /// Parse atom (numbers, variables, braced groups, fractions, etc.)
    fn parse_atom(&mut self) -> PResult<ExprId> {
        match self.peek().cloned() {
            Some(Token::Number(s)) => {
                self.advance();
                let (int_part, frac_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
                Ok(self.ctx.rational(decimal_to_rational(int_part, frac_part)))
            }
            Some(Token::Letter(name)) => {
                self.advance();
                if name == "e" && matches!(self.peek(), Some(Token::Caret)) {
                    return Ok(self.ctx.constant(Constant::E));
                }
                let name = self.parse_symbol_name(name)?;
                Ok(self.ctx.var(&name))
            }
            Some(Token::Word(name)) => {
                self.advance();
                let name = self.parse_symbol_name(name)?;
                Ok(self.ctx.var(&name))
            }
            Some(Token::Pi) => {
                self.advance();
                Ok(self.ctx.constant(Constant::Pi))
            }
            Some(Token::LBrace) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RBrace)?;
                Ok(expr)
            }
            Some(Token::LParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RParen)?;
                Ok(expr)
            }
            Some(Token::LBracket) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(&Token::RBracket)?;
                Ok(expr)
            }
            Some(Token::Frac) => {
                self.advance();
                if matches!(self.peek(), Some(Token::LBrace)) && is_d(self.peek_at(1)) {
                    let checkpoint = self.pos;
                    match self.parse_derivative()? {
                        Some(derivative) => return Ok(derivative),
                        None => self.pos = checkpoint,
                    }
                }
                self.expect(&Token::LBrace)?;
                let numer = self.parse_expr()?;
                self.expect(&Token::RBrace)?;
                self.expect(&Token::LBrace)?;
                let denom = self.parse_expr()?;
                self.expect(&Token::RBrace)?;
                Ok(self.ctx.add(Expr::Div(numer, denom)))
            }
            Some(Token::Sqrt) => {
                self.advance();
                // Check for optional index: \sqrt[n]{...}
                if let Some(Token::LBracket) = self.peek() {
                    self.advance();
                    let index = self.parse_expr()?;
                    self.expect(&Token::RBracket)?;
                    self.expect(&Token::LBrace)?;
                    let radicand = self.parse_expr()?;
                    self.expect(&Token::RBrace)?;
                    Ok(self.ctx.call("sqrt", vec![radicand, index]))
                } else {
                    self.expect(&Token::LBrace)?;
                    let radicand = self.parse_expr()?;
                    self.expect(&Token::RBrace)?;
                    Ok(self.ctx.call("sqrt", vec![radicand]))
                }
            }
            Some(Token::Func(name)) => {
                self.advance();
                let arg = self.parse_function_arg()?;
                Ok(self.ctx.call(&name, vec![arg]))
            }
            Some(Token::Log) => {
                self.advance();
                // \log_{b} x is log(b, x)
                let base = if let Some(Token::Underscore) = self.peek() {
                    self.advance();
                    Some(self.parse_atom()?)
                } else {
                    None
                };
                let arg = self.parse_function_arg()?;
                let args = match base {
                    Some(b) => vec![b, arg],
                    None => vec![arg],
                };
                Ok(self.ctx.call("log", args))
            }
            Some(Token::Dot) => {
                self.advance();
                let of = self.parse_atom()?;
                Ok(self.time_derivative(of, TIME_VARIABLE))
            }
            Some(tok) => err(format!("unexpected token {:?}", tok)),
            None => err("unexpected end of input"),
        }
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a LaTeX string into an expression
pub fn parse_latex(ctx: &mut Context, latex: &str) -> Result<ExprId, ParseError> {
    let tokens = tokenize(latex)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut parser = Parser::new(&tokens, ctx);
    let result = parser.parse_expr()?;

    if !parser.at_end() {
        return Err(ParseError::UnconsumedInput(format!(
            "{:?}",
            &tokens[parser.pos..]
        )));
    }

    Ok(result)
}

/// Parse a LaTeX equation `lhs = rhs`
pub fn parse_latex_equation(ctx: &mut Context, latex: &str) -> Result<Equation, ParseError> {
    let tokens = tokenize(latex)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    if !tokens.contains(&Token::Equals) {
        return Err(ParseError::NotAnEquation(latex.trim().to_string()));
    }

    let mut parser = Parser::new(&tokens, ctx);
    let eq = parser.parse_equation()?;

    if !parser.at_end() {
        return Err(ParseError::UnconsumedInput(format!(
            "{:?}",
            &tokens[parser.pos..]
        )));
    }

    Ok(eq)
}

// ============================================================================
// Tests
// ============================================================================

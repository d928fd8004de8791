use cas_ast::{Constant, Context, Equation, Expr, ExprId};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::multispace0,
    combinator::{map, opt},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use num_bigint::BigInt;
use num_rational::BigRational;

use crate::error::ParseError;

/// Name of the independent variable that `der(x)` differentiates against.
pub const TIME_VARIABLE: &str = "t";

// Intermediate AST for parsing
#[derive(Debug, Clone)]
enum ParseNode {
    Number(BigRational),
    Constant(Constant),
    Variable(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
    Function(String, Vec<ParseNode>),
}

impl ParseNode {
    fn lower(self, ctx: &mut Context) -> ExprId {
        match self {
            ParseNode::Number(n) => ctx.add(Expr::Number(n)),
            ParseNode::Constant(c) => ctx.add(Expr::Constant(c)),
            ParseNode::Variable(s) => ctx.var(&s),
            ParseNode::Add(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Add(lid, rid))
            }
            ParseNode::Sub(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Sub(lid, rid))
            }
            ParseNode::Mul(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Mul(lid, rid))
            }
            ParseNode::Div(l, r) => {
                let lid = l.lower(ctx);
                let rid = r.lower(ctx);
                ctx.add(Expr::Div(lid, rid))
            }
            ParseNode::Pow(b, e) => {
                let bid = b.lower(ctx);
                let eid = e.lower(ctx);
                ctx.add(Expr::Pow(bid, eid))
            }
            ParseNode::Neg(e) => {
                let eid = e.lower(ctx);
                ctx.add(Expr::Neg(eid))
            }
            ParseNode::Function(name, args) => {
                let arg_ids = args.into_iter().map(|a| a.lower(ctx)).collect();
                ctx.call(&name, arg_ids)
            }
        }
    }
}

/// Convert a decimal string to BigRational.
/// Supports: "8.2" → 41/5, ".5" → 1/2, "8." → 8, "123" → 123
pub(crate) fn decimal_to_rational(integer_part: &str, fractional_part: &str) -> BigRational {
    let k = fractional_part.len();

    let int_val: BigInt = if integer_part.is_empty() {
        BigInt::from(0)
    } else {
        integer_part.parse().unwrap_or_else(|_| BigInt::from(0))
    };
    if k == 0 {
        return BigRational::from_integer(int_val);
    }

    let denominator = num_traits::pow(BigInt::from(10), k);
    let frac_val: BigInt = fractional_part.parse().unwrap_or_else(|_| BigInt::from(0));

    // BigRational::new reduces the fraction
    BigRational::new(int_val * &denominator + frac_val, denominator)
}

// Parser for numeric literals (integers and decimals)
// Supports: 123, 8.2, .5, 8.
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    fn is_digit(c: char) -> bool {
        c.is_ascii_digit()
    }

    let (remaining, (int_part, maybe_frac)) = pair(
        take_while(is_digit),
        opt(pair(tag("."), take_while(is_digit))),
    )(input)?;

    let frac_str = maybe_frac.map_or("", |(_, frac)| frac);

    // Must have at least some digits somewhere; a lone "." is not a number
    if int_part.is_empty() && frac_str.is_empty() {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }

    Ok((
        remaining,
        ParseNode::Number(decimal_to_rational(int_part, frac_str)),
    ))
}

// Parser for constants with word boundary check
// 'e' and 'pi' should not match prefixes of longer identifiers (e.g., 'exact', 'pivot')
fn parse_constant(input: &str) -> IResult<&str, ParseNode> {
    fn is_word_boundary(remaining: &str) -> bool {
        remaining
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_')
    }

    if input.starts_with("pi") && is_word_boundary(&input[2..]) {
        return Ok((&input[2..], ParseNode::Constant(Constant::Pi)));
    }

    if input.starts_with('e') && is_word_boundary(&input[1..]) {
        return Ok((&input[1..], ParseNode::Constant(Constant::E)));
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Tag,
    )))
}

// Parser for identifiers (variable/function names)
// Identifiers start with letter or underscore, then allow letters, digits, underscores
// Examples: x, x1, theta3, _tmp, q_in
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    let valid_start = input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Alpha,
        )));
    }

    let len: usize = input
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .map(char::len_utf8)
        .sum();

    Ok((&input[len..], &input[..len]))
}

fn parse_variable(input: &str) -> IResult<&str, ParseNode> {
    map(parse_identifier, |s: &str| ParseNode::Variable(s.to_string()))(input)
}

// Parser for parentheses
fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(
        preceded(multispace0, tag("(")),
        parse_expr,
        preceded(multispace0, tag(")")),
    )(input)
}

// Parser for function calls
fn parse_function(input: &str) -> IResult<&str, ParseNode> {
    let (input, name) = parse_identifier(input)?;
    let (input, _) = preceded(multispace0, tag("("))(input)?;
    let (input, args) = separated_list0(preceded(multispace0, tag(",")), parse_expr)(input)?;
    let (input, _) = preceded(multispace0, tag(")"))(input)?;

    // der(x) is the time derivative of x
    if name == "der" && args.len() == 1 {
        let mut args = args;
        args.push(ParseNode::Variable(TIME_VARIABLE.to_string()));
        return Ok((input, ParseNode::Function("diff".to_string(), args)));
    }

    Ok((input, ParseNode::Function(name.to_string(), args)))
}

// Atom
fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            parse_number,
            parse_function,
            parse_constant,
            parse_variable,
            parse_parens,
        )),
    )(input)
}

// Power - right associative: 2^3^4 = 2^(3^4), not (2^3)^4
// Also allows negative exponents: x^-2, x^-(a+b)
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_atom(input)?;

    let try_caret = preceded::<_, _, _, nom::error::Error<&str>, _, _>(
        multispace0::<_, nom::error::Error<&str>>,
        alt((tag("^"), tag("**"))),
    )(input);

    if let Ok((input, _)) = try_caret {
        let (input, exp) = parse_power_exponent(input)?;
        Ok((input, ParseNode::Pow(Box::new(base), Box::new(exp))))
    } else {
        Ok((input, base))
    }
}

// Parser for exponents: allows sign prefix (-2, +3) then recurses for chained powers
fn parse_power_exponent(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(pair(tag("-"), parse_power_exponent), |(_, expr)| {
                ParseNode::Neg(Box::new(expr))
            }),
            map(pair(tag("+"), parse_power_exponent), |(_, expr)| expr),
            parse_power,
        )),
    )(input)
}

// Unary
fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    alt((
        map(
            pair(preceded(multispace0, tag("-")), parse_unary),
            |(_, expr)| ParseNode::Neg(Box::new(expr)),
        ),
        map(
            pair(preceded(multispace0, tag("+")), parse_unary),
            |(_, expr)| expr,
        ),
        parse_power,
    ))(input)
}

// Term - handles explicit * and / operators
// Also handles implicit multiplication: 2x → 2*x, 3(x+y) → 3*(x+y)
fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_unary(input)?;

    let (input, result) = fold_many0(
        pair(
            preceded(multispace0, alt((tag("*"), tag("·"), tag("/")))),
            parse_unary,
        ),
        move || init.clone(),
        |acc, (op, val)| match op {
            "/" => ParseNode::Div(Box::new(acc), Box::new(val)),
            _ => ParseNode::Mul(Box::new(acc), Box::new(val)),
        },
    )(input)?;

    parse_implicit_mul_chain(input, result)
}

// Parse implicit multiplication chain: 2xy → 2*xy, 2(x+1) → 2*(x+1)
// Only applies when there is no whitespace between the factors
fn parse_implicit_mul_chain(input: &str, acc: ParseNode) -> IResult<&str, ParseNode> {
    let starts_factor = input
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '(');

    if starts_factor && can_implicit_mul(&acc) {
        if let Ok((remaining, next_factor)) = parse_power(input) {
            let new_acc = ParseNode::Mul(Box::new(acc), Box::new(next_factor));
            return parse_implicit_mul_chain(remaining, new_acc);
        }
    }
    Ok((input, acc))
}

// Check if a ParseNode can be followed by implicit multiplication
fn can_implicit_mul(node: &ParseNode) -> bool {
    match node {
        ParseNode::Number(_) => true,
        ParseNode::Pow(base, _) => matches!(**base, ParseNode::Number(_)),
        ParseNode::Mul(_, right) | ParseNode::Div(_, right) => can_implicit_mul(right),
        _ => false,
    }
}

// Expr
fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, alt((tag("+"), tag("-")))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            "-" => ParseNode::Sub(Box::new(acc), Box::new(val)),
            _ => ParseNode::Add(Box::new(acc), Box::new(val)),
        },
    )(input)
}

// Equation: expr "=" expr
fn parse_equation_nodes(input: &str) -> IResult<&str, (ParseNode, ParseNode)> {
    let (input, lhs) = parse_expr(input)?;
    let (input, _) = preceded(multispace0, alt((tag("=="), tag("="))))(input)?;
    let (input, rhs) = parse_expr(input)?;
    Ok((input, (lhs, rhs)))
}

/// Parse a plain-text expression, interning its symbols into `ctx`.
pub fn parse(input: &str, ctx: &mut Context) -> Result<ExprId, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let (remaining, expr_node) =
        parse_expr(input).map_err(|e| ParseError::NomError(format!("{}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(ParseError::UnconsumedInput(remaining.to_string()));
    }

    Ok(expr_node.lower(ctx))
}

/// Parse a plain-text equation `lhs = rhs`.
pub fn parse_equation(input: &str, ctx: &mut Context) -> Result<Equation, ParseError> {
    if input.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    if !input.contains('=') {
        return Err(ParseError::NotAnEquation(input.trim().to_string()));
    }
    let (remaining, (lhs, rhs)) =
        parse_equation_nodes(input).map_err(|e| ParseError::NomError(format!("{}", e)))?;

    let remaining = remaining.trim();
    if !remaining.is_empty() {
        return Err(ParseError::UnconsumedInput(remaining.to_string()));
    }

    let lhs = lhs.lower(ctx);
    let rhs = rhs.lower(ctx);
    Ok(Equation::new(lhs, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cas_ast::DisplayExpr;

    fn show(input: &str) -> String {
        let mut ctx = Context::new();
        let e = parse(input, &mut ctx).unwrap_or_else(|err| panic!("{input}: {err}"));
        format!(
            "{}",
            DisplayExpr {
                context: &ctx,
                id: e
            }
        )
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(show("123"), "123");
    }

    #[test]
    fn test_parse_decimal_literals() {
        let cases = [
            ("8.2", "41/5"),
            ("0.5", "1/2"),
            (".5", "1/2"),
            ("8.", "8"),
            ("0.125", "1/8"),
            ("100.001", "100001/1000"),
        ];

        for (input, expected) in cases {
            assert_eq!(show(input), expected, "input {}", input);
        }
    }

    #[test]
    fn test_parse_negative_decimal() {
        assert_eq!(show("-0.125"), "-(1/8)");
    }

    #[test]
    fn test_parse_arithmetic() {
        assert_eq!(show("1 + 2 * x"), "1 + 2 * x");
        assert_eq!(show("(1 + 2) * x"), "(1 + 2) * x");
        assert_eq!(show("a - (b - c)"), "a - (b - c)");
    }

    #[test]
    fn test_parse_power() {
        assert_eq!(show("x^2 * y"), "x^2 * y");
        assert_eq!(show("x**2"), "x^2");
        assert_eq!(show("x^-2"), "x^(-2)");
    }

    #[test]
    fn test_power_right_associativity() {
        let mut ctx = Context::new();
        let e = parse("2^3^4", &mut ctx).unwrap();
        let Expr::Pow(base, exp) = ctx.get(e) else {
            panic!("expected Pow");
        };
        assert!(ctx.is_number(*base, 2));
        assert!(matches!(ctx.get(*exp), Expr::Pow(_, _)));
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        assert_eq!(show("-x^2"), "-x^2");
        let mut ctx = Context::new();
        let e = parse("-x^2", &mut ctx).unwrap();
        assert!(matches!(ctx.get(e), Expr::Neg(_)));
    }

    #[test]
    fn test_parse_identifiers() {
        assert_eq!(show("q_in + x2"), "q_in + x2");
        assert_eq!(show("theta3 * phi123"), "theta3 * phi123");
    }

    #[test]
    fn test_implicit_multiplication() {
        assert_eq!(show("2x"), "2 * x");
        assert_eq!(show("3(a+b)"), "3 * (a + b)");
        assert_eq!(show("2pi"), "2 * pi");
    }

    #[test]
    fn test_constants_need_word_boundaries() {
        assert_eq!(show("e + exact"), "e + exact");
        let mut ctx = Context::new();
        let e = parse("pivot", &mut ctx).unwrap();
        assert!(matches!(ctx.get(e), Expr::Variable(_)));
    }

    #[test]
    fn test_der_becomes_time_derivative() {
        assert_eq!(show("der(V)"), "diff(V, t)");
        assert_eq!(show("diff(x, s)"), "diff(x, s)");
    }

    #[test]
    fn test_parse_equation() {
        let mut ctx = Context::new();
        let eq = parse_equation("h = q_out / A", &mut ctx).unwrap();
        assert_eq!(eq.display(&ctx).to_string(), "h = q_out / A");
    }

    #[test]
    fn test_equation_errors() {
        let mut ctx = Context::new();
        assert!(matches!(
            parse_equation("x + 1", &mut ctx),
            Err(ParseError::NotAnEquation(_))
        ));
        assert!(matches!(
            parse_equation("x = 1 = 2", &mut ctx),
            Err(ParseError::UnconsumedInput(_))
        ));
        assert!(matches!(parse_equation("  ", &mut ctx), Err(ParseError::Empty)));
        assert!(matches!(parse("x +", &mut ctx), Err(ParseError::UnconsumedInput(_))));
    }

    #[test]
    fn test_symbols_are_shared_through_the_context() {
        let mut ctx = Context::new();
        let a = parse("x + y", &mut ctx).unwrap();
        let b = parse("x + y", &mut ctx).unwrap();
        assert_eq!(a, b);
        assert!(ctx.lookup_symbol("y").is_some());
    }
}

//! Numeric recomputation for calculation nodes.
//!
//! Expressions are parsed into a small allow-listed AST (literals, unary
//! minus, binary `+ - * / // % **`, parentheses for grouping) and interpreted
//! directly. Anything outside that grammar is a syntax error; nothing is ever
//! handed to a general-purpose evaluator.
//!
//! Values are integers (128-bit, overflow is an error) or floats. `/` always
//! produces a float, `//` and `%` use floor semantics, and results render in
//! the conventional short form (`4`, `2.0`, `0.30000000000000004`, `1e+16`).
//! [`check`] compares that rendering to the expected string literally.
//!
//! Grammar (tightest binding last):
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/' | '//' | '%') factor)*
//! factor := '-' factor | power
//! power  := atom ('**' factor)?
//! atom   := number | '(' expr ')'
//! ```

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char as pchar, digit0, digit1, one_of, satisfy, space0},
    combinator::{all_consuming, map, not, opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use thiserror::Error;

use crate::config::NumericLimits;

// ============================================================================
// AST and values
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Int(i128),
    Float(f64),
}

impl Value {
    pub fn as_f64(self) -> f64 {
        match self {
            Value::Int(i) => i as f64,
            Value::Float(f) => f,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => f.write_str(&format_float(*x)),
        }
    }
}

/// Shortest round-trip rendering: positional for decimal exponents in
/// `[-4, 16)`, always with a fractional part; scientific (`1e+16`, `1.5e-05`)
/// outside that range.
fn format_float(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sign = if x < 0.0 { "-" } else { "" };
    // `{:e}` yields the shortest round-trip digits, e.g. "1.2345e3".
    let sci = format!("{:e}", x.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exp) {
        let point = exp + 1;
        let (int_part, frac_part) = if point <= 0 {
            (
                "0".to_string(),
                format!("{}{}", "0".repeat((-point) as usize), digits),
            )
        } else if digits.len() <= point as usize {
            (
                format!("{}{}", digits, "0".repeat(point as usize - digits.len())),
                "0".to_string(),
            )
        } else {
            let (i, f) = digits.split_at(point as usize);
            (i.to_string(), f.to_string())
        };
        format!("{sign}{int_part}.{frac_part}")
    } else {
        let mantissa = if digits.len() == 1 {
            digits
        } else {
            format!("{}.{}", &digits[..1], &digits[1..])
        };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{sign}{mantissa}e{exp_sign}{:02}", exp.abs())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    #[error("expression exceeds the {what} limit of {limit}")]
    LimitExceeded { what: &'static str, limit: usize },
    #[error("disallowed syntax at byte {offset}: `{snippet}`")]
    Syntax { offset: usize, snippet: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("numeric overflow")]
    Overflow,
    #[error("result is not a real number")]
    Domain,
}

// ============================================================================
// Parsing
// ============================================================================

type PResult<'a, T> = IResult<&'a str, T>;

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> PResult<'a, O>
where
    F: FnMut(&'a str) -> PResult<'a, O>,
{
    delimited(space0, inner, space0)
}

fn number_text(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(pchar('.'), digit0)))),
            recognize(pair(pchar('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(input)
}

fn literal(input: &str) -> PResult<'_, Expr> {
    // A literal glued to a name character is a suffix (`2j`) or an attribute
    // (`1.5.real`), never a number.
    let (rest, text) = terminated(
        number_text,
        not(satisfy(|c: char| c.is_alphanumeric() || c == '_' || c == '.')),
    )(input)?;

    let reject = || nom::Err::Failure(NomError::new(input, ErrorKind::Verify));
    let value = if text.contains(['.', 'e', 'E']) {
        Value::Float(text.parse::<f64>().map_err(|_| reject())?)
    } else {
        // Leading zeros are only valid for zero itself.
        if text.len() > 1 && text.starts_with('0') && text.bytes().any(|b| b != b'0') {
            return Err(reject());
        }
        Value::Int(text.parse::<i128>().map_err(|_| reject())?)
    };
    Ok((rest, Expr::Literal(value)))
}

fn atom(input: &str) -> PResult<'_, Expr> {
    ws(alt((literal, delimited(pchar('('), expr, pchar(')')))))(input)
}

fn power(input: &str) -> PResult<'_, Expr> {
    let (input, base) = atom(input)?;
    let (input, exponent) = opt(preceded(ws(tag("**")), factor))(input)?;
    let expr = match exponent {
        Some(rhs) => Expr::Binary {
            op: BinOp::Pow,
            lhs: Box::new(base),
            rhs: Box::new(rhs),
        },
        None => base,
    };
    Ok((input, expr))
}

fn factor(input: &str) -> PResult<'_, Expr> {
    alt((
        map(preceded(ws(pchar('-')), factor), |e| Expr::Neg(Box::new(e))),
        power,
    ))(input)
}

fn mul_op(input: &str) -> PResult<'_, BinOp> {
    alt((
        value(BinOp::FloorDiv, tag("//")),
        value(BinOp::Div, pchar('/')),
        value(BinOp::Mul, terminated(pchar('*'), not(pchar('*')))),
        value(BinOp::Mod, pchar('%')),
    ))(input)
}

fn add_op(input: &str) -> PResult<'_, BinOp> {
    alt((value(BinOp::Add, pchar('+')), value(BinOp::Sub, pchar('-'))))(input)
}

fn fold_left(first: Expr, rest: Vec<(BinOp, Expr)>) -> Expr {
    rest.into_iter().fold(first, |lhs, (op, rhs)| Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn term(input: &str) -> PResult<'_, Expr> {
    let (input, first) = factor(input)?;
    let (input, rest) = many0(pair(ws(mul_op), factor))(input)?;
    Ok((input, fold_left(first, rest)))
}

fn expr(input: &str) -> PResult<'_, Expr> {
    let (input, first) = term(input)?;
    let (input, rest) = many0(pair(ws(add_op), term))(input)?;
    Ok((input, fold_left(first, rest)))
}

fn check_limits(src: &str, limits: &NumericLimits) -> Result<(), NumericError> {
    if src.len() > limits.max_expression_len {
        return Err(NumericError::LimitExceeded {
            what: "length",
            limit: limits.max_expression_len,
        });
    }
    let operators = src.chars().filter(|c| "+-*/%".contains(*c)).count();
    if operators > limits.max_operators {
        return Err(NumericError::LimitExceeded {
            what: "operator count",
            limit: limits.max_operators,
        });
    }
    let mut depth = 0usize;
    for c in src.chars() {
        match c {
            '(' => {
                depth += 1;
                if depth > limits.max_nesting_depth {
                    return Err(NumericError::LimitExceeded {
                        what: "nesting depth",
                        limit: limits.max_nesting_depth,
                    });
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

/// Parse an expression into the restricted AST.
pub fn parse_expression(src: &str, limits: &NumericLimits) -> Result<Expr, NumericError> {
    check_limits(src, limits)?;
    let trimmed = src.trim();
    let lead = src.len() - src.trim_start().len();
    match all_consuming(expr)(trimmed) {
        Ok((_, e)) => Ok(e),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = lead + trimmed.len() - e.input.len();
            Err(NumericError::Syntax {
                offset,
                snippet: e.input.chars().take(16).collect(),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(NumericError::Syntax {
            offset: src.len(),
            snippet: String::new(),
        }),
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn int_floor_div(a: i128, b: i128) -> Result<i128, NumericError> {
    if b == 0 {
        return Err(NumericError::DivisionByZero);
    }
    let q = a.checked_div(b).ok_or(NumericError::Overflow)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        Ok(q - 1)
    } else {
        Ok(q)
    }
}

fn int_mod(a: i128, b: i128) -> Result<i128, NumericError> {
    if b == 0 {
        return Err(NumericError::DivisionByZero);
    }
    let r = a.checked_rem(b).ok_or(NumericError::Overflow)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Ok(r + b)
    } else {
        Ok(r)
    }
}

/// Floor division and modulo on floats, with the remainder taking the sign
/// of the divisor.
fn float_divmod(a: f64, b: f64) -> Result<(f64, f64), NumericError> {
    if b == 0.0 {
        return Err(NumericError::DivisionByZero);
    }
    let mut rem = a % b;
    let mut div = (a - rem) / b;
    if rem != 0.0 {
        if (b < 0.0) != (rem < 0.0) {
            rem += b;
            div -= 1.0;
        }
    } else {
        rem = 0.0_f64.copysign(b);
    }
    let floordiv = if div != 0.0 {
        let mut f = div.floor();
        if div - f > 0.5 {
            f += 1.0;
        }
        f
    } else {
        0.0_f64.copysign(a / b)
    };
    Ok((floordiv, rem))
}

fn float_pow(base: f64, exp: f64) -> Result<f64, NumericError> {
    if base == 0.0 && exp < 0.0 {
        return Err(NumericError::DivisionByZero);
    }
    if base < 0.0 && exp.fract() != 0.0 && exp.is_finite() {
        return Err(NumericError::Domain);
    }
    let out = base.powf(exp);
    if out.is_infinite() && base.is_finite() && exp.is_finite() {
        return Err(NumericError::Overflow);
    }
    Ok(out)
}

fn apply(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, NumericError> {
    use Value::{Float, Int};

    match (op, lhs, rhs) {
        (BinOp::Add, Int(a), Int(b)) => a.checked_add(b).map(Int).ok_or(NumericError::Overflow),
        (BinOp::Sub, Int(a), Int(b)) => a.checked_sub(b).map(Int).ok_or(NumericError::Overflow),
        (BinOp::Mul, Int(a), Int(b)) => a.checked_mul(b).map(Int).ok_or(NumericError::Overflow),
        (BinOp::FloorDiv, Int(a), Int(b)) => int_floor_div(a, b).map(Int),
        (BinOp::Mod, Int(a), Int(b)) => int_mod(a, b).map(Int),
        (BinOp::Pow, Int(a), Int(b)) if b >= 0 => match a {
            // Exponents past u32 only stay finite for these bases.
            0 | 1 => Ok(Int(if b == 0 { 1 } else { a })),
            -1 => Ok(Int(if b % 2 == 0 { 1 } else { -1 })),
            _ => {
                let exp = u32::try_from(b).map_err(|_| NumericError::Overflow)?;
                a.checked_pow(exp).map(Int).ok_or(NumericError::Overflow)
            }
        },
        (BinOp::Div, l, r) => {
            let (a, b) = (l.as_f64(), r.as_f64());
            if b == 0.0 {
                return Err(NumericError::DivisionByZero);
            }
            Ok(Float(a / b))
        }
        (BinOp::Add, l, r) => Ok(Float(l.as_f64() + r.as_f64())),
        (BinOp::Sub, l, r) => Ok(Float(l.as_f64() - r.as_f64())),
        (BinOp::Mul, l, r) => Ok(Float(l.as_f64() * r.as_f64())),
        (BinOp::FloorDiv, l, r) => float_divmod(l.as_f64(), r.as_f64()).map(|(q, _)| Float(q)),
        (BinOp::Mod, l, r) => float_divmod(l.as_f64(), r.as_f64()).map(|(_, m)| Float(m)),
        (BinOp::Pow, l, r) => float_pow(l.as_f64(), r.as_f64()).map(Float),
    }
}

impl Expr {
    pub fn eval(&self) -> Result<Value, NumericError> {
        match self {
            Expr::Literal(v) => Ok(*v),
            Expr::Neg(inner) => match inner.eval()? {
                Value::Int(i) => i.checked_neg().map(Value::Int).ok_or(NumericError::Overflow),
                Value::Float(f) => Ok(Value::Float(-f)),
            },
            Expr::Binary { op, lhs, rhs } => apply(*op, lhs.eval()?, rhs.eval()?),
        }
    }
}

/// Parse and evaluate with the default limits.
pub fn evaluate(expression: &str) -> Result<Value, NumericError> {
    evaluate_with(expression, &NumericLimits::default())
}

pub fn evaluate_with(expression: &str, limits: &NumericLimits) -> Result<Value, NumericError> {
    parse_expression(expression, limits)?.eval()
}

/// True iff `expression` evaluates and its rendering equals `expected`
/// exactly. Every failure is `false`.
pub fn check(expression: &str, expected: &str) -> bool {
    check_with(expression, expected, &NumericLimits::default())
}

pub fn check_with(expression: &str, expected: &str, limits: &NumericLimits) -> bool {
    match evaluate_with(expression, limits) {
        Ok(v) => v.to_string() == expected,
        Err(err) => {
            tracing::debug!(expression, error = %err, "numeric evaluation failed");
            false
        }
    }
}

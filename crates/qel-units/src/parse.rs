//! Unit expressions (`kg m/s^2`, `N·m`, `1/s`) and quantities (`9.81 m/s^2`).

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit0, digit1, one_of, space0, space1},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    sequence::{delimited, pair, preceded},
    IResult,
};
use tracing::trace;

use crate::error::UnitError;
use crate::quantity::Quantity;
use crate::system::UnitSystem;
use crate::unit::Unit;

#[derive(Debug, Clone, PartialEq)]
enum UnitExpr<'a> {
    Name(&'a str),
    Number(f64),
    Product(Box<UnitExpr<'a>>, Box<UnitExpr<'a>>),
    Quotient(Box<UnitExpr<'a>>, Box<UnitExpr<'a>>),
    Power(Box<UnitExpr<'a>>, i32),
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Mul,
    Div,
}

type ParseResult<'a, T> = IResult<&'a str, T>;

fn name(input: &str) -> ParseResult<'_, UnitExpr<'_>> {
    map(take_while1(char::is_alphabetic), UnitExpr::Name)(input)
}

fn number(input: &str) -> ParseResult<'_, UnitExpr<'_>> {
    map_res(
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        |text: &str| text.parse::<f64>().map(UnitExpr::Number),
    )(input)
}

fn group(input: &str) -> ParseResult<'_, UnitExpr<'_>> {
    delimited(pair(char('('), space0), product, pair(space0, char(')')))(input)
}

fn atom(input: &str) -> ParseResult<'_, UnitExpr<'_>> {
    alt((name, number, group))(input)
}

fn signed(input: &str) -> ParseResult<'_, i32> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), str::parse::<i32>)(input)
}

fn exponent(input: &str) -> ParseResult<'_, i32> {
    alt((
        signed,
        delimited(pair(char('('), space0), signed, pair(space0, char(')'))),
    ))(input)
}

fn power(input: &str) -> ParseResult<'_, UnitExpr<'_>> {
    let (input, base) = atom(input)?;
    let caret = delimited(space0, alt((tag("**"), tag("^"))), space0);
    let (input, exp) = opt(preceded(caret, exponent))(input)?;
    let expr = match exp {
        Some(exp) => UnitExpr::Power(Box::new(base), exp),
        None => base,
    };
    Ok((input, expr))
}

fn operator(input: &str) -> ParseResult<'_, Op> {
    delimited(
        space0,
        alt((
            value(Op::Mul, alt((tag("*"), tag("·"), tag("⋅")))),
            value(Op::Div, tag("/")),
        )),
        space0,
    )(input)
}

/// Products and quotients, left to right; whitespace between factors
/// multiplies.
fn product(input: &str) -> ParseResult<'_, UnitExpr<'_>> {
    let (mut input, mut acc) = power(input)?;
    loop {
        if let Ok((rest, (op, rhs))) = pair(operator, power)(input) {
            acc = match op {
                Op::Mul => UnitExpr::Product(Box::new(acc), Box::new(rhs)),
                Op::Div => UnitExpr::Quotient(Box::new(acc), Box::new(rhs)),
            };
            input = rest;
        } else if let Ok((rest, rhs)) = preceded(space1, power)(input) {
            acc = UnitExpr::Product(Box::new(acc), Box::new(rhs));
            input = rest;
        } else {
            return Ok((input, acc));
        }
    }
}

fn evaluate(expr: &UnitExpr<'_>, system: &UnitSystem) -> Result<Unit, UnitError> {
    match expr {
        UnitExpr::Name(name) => system.lookup(name).ok_or_else(|| UnitError::UndefinedUnit {
            name: (*name).to_string(),
        }),
        UnitExpr::Number(factor) if *factor > 0.0 && factor.is_finite() => {
            Ok(Unit::DIMENSIONLESS.scaled(*factor))
        }
        UnitExpr::Number(_) => Err(UnitError::InvalidExpression { offset: 0 }),
        UnitExpr::Product(lhs, rhs) => Ok(evaluate(lhs, system)? * evaluate(rhs, system)?),
        UnitExpr::Quotient(lhs, rhs) => Ok(evaluate(lhs, system)? / evaluate(rhs, system)?),
        UnitExpr::Power(base, exp) => Ok(evaluate(base, system)?.powi(*exp)),
    }
}

/// Parses a unit expression built from unit tokens, `*`, `·`, `/`, `^` or
/// `**` with integer exponents, parentheses and whitespace juxtaposition.
pub fn parse_unit(text: &str, system: &UnitSystem) -> Result<Unit, UnitError> {
    let text = text.trim();
    let expr = match all_consuming(product)(text) {
        Ok((_, expr)) => expr,
        Err(nom::Err::Error(err) | nom::Err::Failure(err)) => {
            return Err(UnitError::InvalidExpression {
                offset: text.len() - err.input.len(),
            })
        }
        Err(nom::Err::Incomplete(_)) => {
            return Err(UnitError::InvalidExpression { offset: text.len() })
        }
    };
    trace!(?expr, "unit expression");
    evaluate(&expr, system)
}

/// Splits the leading magnitude literal from the unit text.
pub fn split_magnitude<'a>(text: &'a str, system: &UnitSystem) -> (Option<&'a str>, &'a str) {
    match system.magnitude_len(text) {
        Some(end) => (Some(&text[..end]), text[end..].trim()),
        None => (None, text.trim()),
    }
}

/// Parses `magnitude unit`. A missing magnitude reads as 1 and a missing
/// unit as dimensionless; callers decide whether either is acceptable.
pub fn parse_quantity(text: &str, system: &UnitSystem) -> Result<Quantity, UnitError> {
    let normalized = text.trim().replace('\u{2212}', "-");
    let (magnitude, unit_text) = split_magnitude(&normalized, system);
    let magnitude = match magnitude {
        Some(literal) => literal
            .parse::<f64>()
            .map_err(|_| UnitError::InvalidExpression { offset: 0 })?,
        None => 1.0,
    };
    if !magnitude.is_finite() {
        return Err(UnitError::NonFiniteMagnitude);
    }
    let unit = if unit_text.is_empty() {
        Unit::DIMENSIONLESS
    } else {
        parse_unit(unit_text, system)?
    };
    Ok(Quantity::new(magnitude, unit, unit_text))
}

//! General expression parser.
//!
//! The grammar is deliberately wider than what a submission may contain:
//! attribute access, subscripts, comparisons, boolean operators, lambdas and
//! comprehensions are all read into [`Syntax`] nodes so the whitelist walker
//! can reject them with the column of the offending node instead of a bare
//! syntax error.

use std::cell::Cell;

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{char, digit1, hex_digit1, multispace0, one_of, satisfy},
    combinator::{cut, map, not, opt, recognize, value, verify},
    error::{context, ErrorKind, ParseError, VerboseError},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use nom_locate::LocatedSpan;

use crate::error::ExprError;

/// Input span carrying its byte offset.
pub type Span<'a> = LocatedSpan<&'a str>;

type ParseResult<'a, T> = IResult<Span<'a>, T, VerboseError<Span<'a>>>;

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "if", "else", "for", "in", "is", "lambda", "True", "False", "None",
];

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Minus,
    /// `not x`
    Not,
    /// `~x`
    Invert,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// Juxtaposition such as `2n` or `sin x`.
    ImplicitMul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `@`
    MatMul,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtE,
    /// `>`
    Gt,
    /// `>=`
    GtE,
    /// `in`
    In,
    /// `not in`
    NotIn,
    /// `is`
    Is,
    /// `is not`
    IsNot,
}

/// Boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolOp {
    /// `and`
    And,
    /// `or`
    Or,
}

/// Node kinds of the permissive syntax tree.
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum SyntaxKind {
    Name(String),
    Int(String),
    Float(String),
    Imaginary(String),
    Str(String),
    NameConstant(String),
    Unary(UnaryOp, Box<Syntax>),
    Binary(BinaryOp, Box<Syntax>, Box<Syntax>),
    Compare(Box<Syntax>, Vec<(CompareOp, Syntax)>),
    BoolOp(BoolOp, Vec<Syntax>),
    IfElse {
        body: Box<Syntax>,
        test: Box<Syntax>,
        orelse: Box<Syntax>,
    },
    Call {
        func: Box<Syntax>,
        args: Vec<Syntax>,
        keywords: Vec<(String, Syntax)>,
    },
    Attribute(Box<Syntax>, String),
    Subscript(Box<Syntax>, Box<Syntax>),
    Slice(Option<Box<Syntax>>, Option<Box<Syntax>>),
    Tuple(Vec<Syntax>),
    List(Vec<Syntax>),
    Set(Vec<Syntax>),
    Comprehension {
        element: Box<Syntax>,
        target: Box<Syntax>,
        iter: Box<Syntax>,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Syntax>,
    },
}

/// A syntax node and the column it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    /// What the node is.
    pub kind: SyntaxKind,
    /// Column of the first character of the node.
    pub offset: usize,
}

impl Syntax {
    fn new(kind: SyntaxKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    fn binary(op: BinaryOp, lhs: Syntax, rhs: Syntax) -> Self {
        let offset = lhs.offset;
        Self::new(SyntaxKind::Binary(op, Box::new(lhs), Box::new(rhs)), offset)
    }

    /// Direct children, in source order.
    pub fn children(&self) -> Vec<&Syntax> {
        match &self.kind {
            SyntaxKind::Name(_)
            | SyntaxKind::Int(_)
            | SyntaxKind::Float(_)
            | SyntaxKind::Imaginary(_)
            | SyntaxKind::Str(_)
            | SyntaxKind::NameConstant(_) => Vec::new(),
            SyntaxKind::Unary(_, inner) | SyntaxKind::Attribute(inner, _) => vec![inner],
            SyntaxKind::Binary(_, a, b) | SyntaxKind::Subscript(a, b) => vec![a, b],
            SyntaxKind::Compare(first, rest) => {
                let mut out = vec![first.as_ref()];
                out.extend(rest.iter().map(|(_, node)| node));
                out
            }
            SyntaxKind::BoolOp(_, items)
            | SyntaxKind::Tuple(items)
            | SyntaxKind::List(items)
            | SyntaxKind::Set(items) => items.iter().collect(),
            SyntaxKind::IfElse { body, test, orelse } => vec![body, test, orelse],
            SyntaxKind::Call {
                func,
                args,
                keywords,
            } => {
                let mut out = vec![func.as_ref()];
                out.extend(args.iter());
                out.extend(keywords.iter().map(|(_, node)| node));
                out
            }
            SyntaxKind::Slice(lower, upper) => lower
                .iter()
                .chain(upper.iter())
                .map(|node| node.as_ref())
                .collect(),
            SyntaxKind::Comprehension {
                element,
                target,
                iter,
            } => vec![element, target, iter],
            SyntaxKind::Lambda { body, .. } => vec![body],
        }
    }
}

/// Parses `text` as a single expression.
#[tracing::instrument(level = "trace", skip(text))]
pub fn parse_syntax(text: &str) -> Result<Syntax, ExprError> {
    check_nesting(text)?;
    DEPTH.with(|depth| depth.set(0));
    let span = Span::new(text);
    match expression(span) {
        Ok((rest, node)) => {
            let remaining = rest.fragment();
            let trimmed = remaining.trim_start();
            if trimmed.is_empty() {
                check_depth(&node)?;
                Ok(node)
            } else {
                let offset = rest.location_offset() + (remaining.len() - trimmed.len());
                Err(ExprError::HasParseError { offset })
            }
        }
        Err(nom::Err::Error(err)) | Err(nom::Err::Failure(err)) => {
            let offset = err
                .errors
                .first()
                .map(|(span, _)| span.location_offset())
                .unwrap_or(0);
            Err(ExprError::HasParseError { offset })
        }
        Err(nom::Err::Incomplete(_)) => Err(ExprError::HasParseError { offset: text.len() }),
    }
}

/// Deepest bracket nesting the parser accepts.
pub const MAX_NESTING: usize = 32;

/// Deepest chain of nested rules (brackets, unary signs, `not`, powers,
/// conditionals) the recursive parser enters.
pub const MAX_RECURSION: usize = 128;

/// Deepest syntax tree handed to the walker.
pub const MAX_TREE_DEPTH: usize = 512;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts one level of parser recursion until dropped.
struct DepthGuard;

impl DepthGuard {
    fn enter(input: Span) -> Result<Self, nom::Err<VerboseError<Span>>> {
        let depth = DEPTH.with(|depth| {
            let next = depth.get() + 1;
            depth.set(next);
            next
        });
        let guard = DepthGuard;
        if depth > MAX_RECURSION {
            return Err(nom::Err::Failure(VerboseError::from_error_kind(
                input,
                ErrorKind::TooLarge,
            )));
        }
        Ok(guard)
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Rejects trees deeper than [`MAX_TREE_DEPTH`] without recursing.
fn check_depth(root: &Syntax) -> Result<(), ExprError> {
    let mut stack = vec![(root, 1usize)];
    while let Some((node, depth)) = stack.pop() {
        if depth > MAX_TREE_DEPTH {
            return Err(ExprError::HasParseError {
                offset: node.offset,
            });
        }
        stack.extend(node.children().into_iter().map(|child| (child, depth + 1)));
    }
    Ok(())
}

fn check_nesting(text: &str) -> Result<(), ExprError> {
    let mut depth = 0usize;
    for (offset, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(ExprError::HasParseError { offset });
                }
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn position(input: Span) -> ParseResult<usize> {
    let (input, _) = multispace0(input)?;
    Ok((input, input.location_offset()))
}

fn symbol<'a>(text: &'static str) -> impl FnMut(Span<'a>) -> ParseResult<'a, Span<'a>> {
    preceded(multispace0, tag(text))
}

fn keyword<'a>(word: &'static str) -> impl FnMut(Span<'a>) -> ParseResult<'a, Span<'a>> {
    preceded(
        multispace0,
        terminated(tag(word), not(satisfy(is_ident_char))),
    )
}

fn identifier(input: Span) -> ParseResult<String> {
    let (input, _) = multispace0(input)?;
    context(
        "identifier",
        map(
            verify(
                recognize(pair(
                    satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
                    take_while(is_ident_char),
                )),
                |span: &Span| !KEYWORDS.contains(span.fragment()),
            ),
            |span: Span| span.fragment().to_string(),
        ),
    )(input)
}

fn expression(input: Span) -> ParseResult<Syntax> {
    let _guard = DepthGuard::enter(input)?;
    context("expression", alt((lambda, conditional)))(input)
}

fn lambda(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, _) = keyword("lambda")(input)?;
    let (input, params) = separated_list0(symbol(","), identifier)(input)?;
    let (input, _) = cut(symbol(":"))(input)?;
    let (input, body) = cut(expression)(input)?;
    Ok((
        input,
        Syntax::new(
            SyntaxKind::Lambda {
                params,
                body: Box::new(body),
            },
            start,
        ),
    ))
}

fn conditional(input: Span) -> ParseResult<Syntax> {
    let (input, body) = or_test(input)?;
    let (input, branch) = opt(tuple((
        keyword("if"),
        cut(or_test),
        cut(keyword("else")),
        cut(expression),
    )))(input)?;
    match branch {
        None => Ok((input, body)),
        Some((_, test, _, orelse)) => {
            let offset = body.offset;
            Ok((
                input,
                Syntax::new(
                    SyntaxKind::IfElse {
                        body: Box::new(body),
                        test: Box::new(test),
                        orelse: Box::new(orelse),
                    },
                    offset,
                ),
            ))
        }
    }
}

fn bool_chain<'a>(
    op: BoolOp,
    word: &'static str,
    mut operand: impl FnMut(Span<'a>) -> ParseResult<'a, Syntax>,
) -> impl FnMut(Span<'a>) -> ParseResult<'a, Syntax> {
    move |input: Span<'a>| {
        let (mut input, first) = operand(input)?;
        let mut items = vec![first];
        loop {
            match keyword(word)(input) {
                Ok((rest, _)) => {
                    let (rest, next) = cut(|i| operand(i))(rest)?;
                    items.push(next);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => break,
                Err(err) => return Err(err),
            }
        }
        if items.len() == 1 {
            Ok((input, items.remove(0)))
        } else {
            let offset = items[0].offset;
            Ok((input, Syntax::new(SyntaxKind::BoolOp(op, items), offset)))
        }
    }
}

fn or_test(input: Span) -> ParseResult<Syntax> {
    bool_chain(BoolOp::Or, "or", and_test)(input)
}

fn and_test(input: Span) -> ParseResult<Syntax> {
    bool_chain(BoolOp::And, "and", not_test)(input)
}

fn not_test(input: Span) -> ParseResult<Syntax> {
    let _guard = DepthGuard::enter(input)?;
    let (input, start) = position(input)?;
    match keyword("not")(input) {
        Ok((rest, _)) => {
            let (rest, operand) = cut(not_test)(rest)?;
            Ok((
                rest,
                Syntax::new(SyntaxKind::Unary(UnaryOp::Not, Box::new(operand)), start),
            ))
        }
        Err(nom::Err::Error(_)) => comparison(input),
        Err(err) => Err(err),
    }
}

fn compare_op(input: Span) -> ParseResult<CompareOp> {
    alt((
        value(CompareOp::Eq, symbol("==")),
        value(CompareOp::NotEq, symbol("!=")),
        value(CompareOp::LtE, symbol("<=")),
        value(CompareOp::GtE, symbol(">=")),
        value(CompareOp::Lt, symbol("<")),
        value(CompareOp::Gt, symbol(">")),
        value(CompareOp::NotIn, pair(keyword("not"), keyword("in"))),
        value(CompareOp::IsNot, pair(keyword("is"), keyword("not"))),
        value(CompareOp::In, keyword("in")),
        value(CompareOp::Is, keyword("is")),
    ))(input)
}

fn comparison(input: Span) -> ParseResult<Syntax> {
    let (input, first) = bit_or(input)?;
    let (input, rest) = many0(pair(compare_op, cut(bit_or)))(input)?;
    if rest.is_empty() {
        return Ok((input, first));
    }
    let offset = first.offset;
    Ok((
        input,
        Syntax::new(SyntaxKind::Compare(Box::new(first), rest), offset),
    ))
}

fn left_assoc<'a>(
    mut operator: impl FnMut(Span<'a>) -> ParseResult<'a, BinaryOp>,
    mut operand: impl FnMut(Span<'a>) -> ParseResult<'a, Syntax>,
) -> impl FnMut(Span<'a>) -> ParseResult<'a, Syntax> {
    move |input: Span<'a>| {
        let (mut input, mut lhs) = operand(input)?;
        loop {
            match operator(input) {
                Ok((rest, op)) => {
                    let (rest, rhs) = cut(|i| operand(i))(rest)?;
                    lhs = Syntax::binary(op, lhs, rhs);
                    input = rest;
                }
                Err(nom::Err::Error(_)) => return Ok((input, lhs)),
                Err(err) => return Err(err),
            }
        }
    }
}

fn bit_or(input: Span) -> ParseResult<Syntax> {
    left_assoc(value(BinaryOp::BitOr, symbol("|")), bit_and)(input)
}

fn bit_and(input: Span) -> ParseResult<Syntax> {
    left_assoc(value(BinaryOp::BitAnd, symbol("&")), arith)(input)
}

fn arith(input: Span) -> ParseResult<Syntax> {
    left_assoc(
        alt((
            value(BinaryOp::Add, symbol("+")),
            value(BinaryOp::Sub, symbol("-")),
        )),
        term,
    )(input)
}

fn mul_op(input: Span) -> ParseResult<BinaryOp> {
    alt((
        value(BinaryOp::FloorDiv, symbol("//")),
        value(BinaryOp::Div, symbol("/")),
        value(
            BinaryOp::Mul,
            preceded(multispace0, terminated(tag("*"), not(char('*')))),
        ),
        value(BinaryOp::Mod, symbol("%")),
        value(BinaryOp::MatMul, symbol("@")),
    ))(input)
}

fn term(input: Span) -> ParseResult<Syntax> {
    let (mut input, mut lhs) = factor(input)?;
    loop {
        match mul_op(input) {
            Ok((rest, op)) => {
                let (rest, rhs) = cut(factor)(rest)?;
                lhs = Syntax::binary(op, lhs, rhs);
                input = rest;
                continue;
            }
            Err(nom::Err::Error(_)) => {}
            Err(err) => return Err(err),
        }
        match power(input) {
            Ok((rest, rhs)) => {
                lhs = Syntax::binary(BinaryOp::ImplicitMul, lhs, rhs);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, lhs)),
            Err(err) => return Err(err),
        }
    }
}

fn factor(input: Span) -> ParseResult<Syntax> {
    let _guard = DepthGuard::enter(input)?;
    let (input, start) = position(input)?;
    let sign = alt((
        value(UnaryOp::Plus, char('+')),
        value(UnaryOp::Minus, char('-')),
        value(UnaryOp::Invert, char('~')),
    ))(input);
    match sign {
        Ok((rest, op)) => {
            let (rest, operand) = cut(factor)(rest)?;
            Ok((
                rest,
                Syntax::new(SyntaxKind::Unary(op, Box::new(operand)), start),
            ))
        }
        Err(nom::Err::Error(_)) => power(input),
        Err(err) => Err(err),
    }
}

fn power(input: Span) -> ParseResult<Syntax> {
    let (input, base) = primary(input)?;
    match symbol("**")(input) {
        Ok((rest, _)) => {
            let (rest, exponent) = cut(factor)(rest)?;
            Ok((rest, Syntax::binary(BinaryOp::Pow, base, exponent)))
        }
        Err(nom::Err::Error(_)) => Ok((input, base)),
        Err(err) => Err(err),
    }
}

enum Trailer {
    Call(Vec<Syntax>, Vec<(String, Syntax)>),
    Subscript(Syntax),
    Attribute(String),
}

enum Argument {
    Positional(Syntax),
    Keyword(String, Syntax),
}

fn primary(input: Span) -> ParseResult<Syntax> {
    let (mut input, (mut node, mut callable)) = atom(input)?;
    if matches!(
        node.kind,
        SyntaxKind::Int(_) | SyntaxKind::Float(_) | SyntaxKind::Imaginary(_)
    ) {
        return Ok((input, node));
    }
    loop {
        let next = if callable {
            alt((call_trailer, subscript_trailer, attribute_trailer))(input)
        } else {
            alt((subscript_trailer, attribute_trailer))(input)
        };
        match next {
            Ok((rest, trailer)) => {
                let offset = node.offset;
                node = match trailer {
                    Trailer::Call(args, keywords) => Syntax::new(
                        SyntaxKind::Call {
                            func: Box::new(node),
                            args,
                            keywords,
                        },
                        offset,
                    ),
                    Trailer::Subscript(index) => Syntax::new(
                        SyntaxKind::Subscript(Box::new(node), Box::new(index)),
                        offset,
                    ),
                    Trailer::Attribute(attr) => {
                        Syntax::new(SyntaxKind::Attribute(Box::new(node), attr), offset)
                    }
                };
                callable = true;
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok((input, node)),
            Err(err) => return Err(err),
        }
    }
}

fn call_trailer(input: Span) -> ParseResult<Trailer> {
    let (input, _) = symbol("(")(input)?;
    let (input, items) = separated_list0(symbol(","), argument)(input)?;
    let (input, _) = opt(symbol(","))(input)?;
    let (input, _) = cut(symbol(")"))(input)?;
    let mut args = Vec::new();
    let mut keywords = Vec::new();
    for item in items {
        match item {
            Argument::Positional(node) => args.push(node),
            Argument::Keyword(name, node) => keywords.push((name, node)),
        }
    }
    Ok((input, Trailer::Call(args, keywords)))
}

fn argument(input: Span) -> ParseResult<Argument> {
    alt((
        map(
            pair(
                terminated(
                    identifier,
                    preceded(multispace0, terminated(char('='), not(char('=')))),
                ),
                cut(expression),
            ),
            |(name, node)| Argument::Keyword(name, node),
        ),
        map(expression, Argument::Positional),
    ))(input)
}

fn subscript_trailer(input: Span) -> ParseResult<Trailer> {
    let (input, _) = symbol("[")(input)?;
    let (input, start) = position(input)?;
    let (input, lower) = opt(expression)(input)?;
    let (input, upper) = opt(preceded(symbol(":"), opt(expression)))(input)?;
    let (input, _) = cut(symbol("]"))(input)?;
    let index = match (lower, upper) {
        (Some(lower), None) => lower,
        (lower, Some(upper)) => Syntax::new(
            SyntaxKind::Slice(lower.map(Box::new), upper.map(Box::new)),
            start,
        ),
        (None, None) => {
            return Err(nom::Err::Failure(VerboseError::from_error_kind(
                input,
                ErrorKind::Verify,
            )))
        }
    };
    Ok((input, Trailer::Subscript(index)))
}

fn attribute_trailer(input: Span) -> ParseResult<Trailer> {
    let (input, _) = symbol(".")(input)?;
    let (input, name) = cut(identifier)(input)?;
    Ok((input, Trailer::Attribute(name)))
}

fn atom(input: Span) -> ParseResult<(Syntax, bool)> {
    context(
        "atom",
        alt((
            map(number, |node| (node, false)),
            map(string_literal, |node| (node, false)),
            map(name_constant, |node| (node, false)),
            map(name, |node| (node, true)),
            map(parenthesized, |node| (node, false)),
            map(list_display, |node| (node, false)),
            map(set_display, |node| (node, false)),
        )),
    )(input)
}

fn exponent(input: Span) -> ParseResult<Span> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

fn number(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, text) = alt((
        recognize(pair(tag_no_case("0x"), hex_digit1)),
        recognize(pair(
            tag_no_case("0o"),
            take_while1(|c: char| c.is_digit(8)),
        )),
        recognize(pair(
            tag_no_case("0b"),
            take_while1(|c: char| c == '0' || c == '1'),
        )),
        recognize(tuple((
            digit1,
            opt(pair(char('.'), opt(digit1))),
            opt(exponent),
        ))),
        recognize(tuple((char('.'), digit1, opt(exponent)))),
    ))(input)?;
    let (input, imaginary) = opt(one_of("jJ"))(input)?;
    let literal = text.fragment().to_string();
    let lower = literal.to_ascii_lowercase();
    let radix_prefixed = lower.starts_with("0x") || lower.starts_with("0o") || lower.starts_with("0b");
    let kind = if imaginary.is_some() {
        SyntaxKind::Imaginary(literal)
    } else if !radix_prefixed && (lower.contains('.') || lower.contains('e')) {
        SyntaxKind::Float(literal)
    } else {
        SyntaxKind::Int(literal)
    };
    Ok((input, Syntax::new(kind, start)))
}

fn string_literal(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, text) = alt((
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
        delimited(char('\''), take_while(|c| c != '\''), char('\'')),
    ))(input)?;
    Ok((
        input,
        Syntax::new(SyntaxKind::Str(text.fragment().to_string()), start),
    ))
}

fn name_constant(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, word) = alt((keyword("True"), keyword("False"), keyword("None")))(input)?;
    Ok((
        input,
        Syntax::new(SyntaxKind::NameConstant(word.fragment().to_string()), start),
    ))
}

fn name(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, ident) = identifier(input)?;
    Ok((input, Syntax::new(SyntaxKind::Name(ident), start)))
}

fn parenthesized(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, _) = char('(')(input)?;
    let (input, mut items) = separated_list0(symbol(","), expression)(input)?;
    let (input, trailing) = opt(symbol(","))(input)?;
    let (input, _) = cut(symbol(")"))(input)?;
    if items.len() == 1 && trailing.is_none() {
        return Ok((input, items.remove(0)));
    }
    Ok((input, Syntax::new(SyntaxKind::Tuple(items), start)))
}

fn list_display(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, _) = char('[')(input)?;
    let (input, first) = opt(expression)(input)?;
    let Some(first) = first else {
        let (input, _) = cut(symbol("]"))(input)?;
        return Ok((input, Syntax::new(SyntaxKind::List(Vec::new()), start)));
    };
    match keyword("for")(input) {
        Ok((rest, _)) => {
            let (rest, target) = cut(bit_or)(rest)?;
            let (rest, _) = cut(keyword("in"))(rest)?;
            let (rest, iter) = cut(or_test)(rest)?;
            let (rest, _) = cut(symbol("]"))(rest)?;
            Ok((
                rest,
                Syntax::new(
                    SyntaxKind::Comprehension {
                        element: Box::new(first),
                        target: Box::new(target),
                        iter: Box::new(iter),
                    },
                    start,
                ),
            ))
        }
        Err(nom::Err::Error(_)) => {
            let (input, rest) = many0(preceded(symbol(","), expression))(input)?;
            let (input, _) = opt(symbol(","))(input)?;
            let (input, _) = cut(symbol("]"))(input)?;
            let mut items = vec![first];
            items.extend(rest);
            Ok((input, Syntax::new(SyntaxKind::List(items), start)))
        }
        Err(err) => Err(err),
    }
}

fn set_display(input: Span) -> ParseResult<Syntax> {
    let (input, start) = position(input)?;
    let (input, _) = char('{')(input)?;
    let (input, entries) = separated_list0(
        symbol(","),
        pair(expression, opt(preceded(symbol(":"), cut(expression)))),
    )(input)?;
    let (input, _) = opt(symbol(","))(input)?;
    let (input, _) = cut(symbol("}"))(input)?;
    let mut items = Vec::new();
    for (key, val) in entries {
        items.push(key);
        if let Some(val) = val {
            items.push(val);
        }
    }
    Ok((input, Syntax::new(SyntaxKind::Set(items), start)))
}

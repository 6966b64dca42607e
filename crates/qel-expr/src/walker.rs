//! Whitelist walk from the permissive syntax tree to [`Expr`].
//!
//! Checks run as separate passes in a fixed order so the reported error does
//! not depend on where in the tree the problems sit: callees first, then
//! loaded names, then node kinds, then literals while building.

use tracing::trace;

use crate::error::ExprError;
use crate::expr::{Callee, Constant, Expr};
use crate::options::ParseOptions;
use crate::syntax::{BinaryOp, Syntax, SyntaxKind, UnaryOp};

/// Walks `node` into a whitelisted expression.
pub fn walk(node: &Syntax, options: &ParseOptions) -> Result<Expr, ExprError> {
    let walker = Walker { options };
    walker.check_callees(node)?;
    walker.check_names(node, false)?;
    if let Some((_, offset)) = deepest_invalid(node, 0) {
        trace!(offset, "node outside whitelist");
        return Err(ExprError::HasInvalidExpression { offset });
    }
    walker.build(node)
}

enum Resolved {
    Value(Expr),
    Callable(Callee),
}

struct Walker<'a> {
    options: &'a ParseOptions,
}

impl Walker<'_> {
    fn value(&self, name: &str) -> Option<Expr> {
        if self.options.is_variable(name) {
            return Some(Expr::Symbol(name.to_string()));
        }
        let constant = match name {
            "pi" => Some(Constant::Pi),
            "e" => Some(Constant::E),
            "infty" => Some(Constant::Infinity),
            "i" | "j" if self.options.allow_complex => Some(Constant::I),
            "_Pi" if self.options.allow_hidden => Some(Constant::Pi),
            "_Exp1" if self.options.allow_hidden => Some(Constant::E),
            "_ImaginaryUnit" if self.options.allow_hidden && self.options.allow_complex => {
                Some(Constant::I)
            }
            _ => None,
        };
        constant.map(Expr::Constant)
    }

    fn callable(&self, name: &str) -> Option<Callee> {
        if self.options.custom_functions.contains(name) {
            return Some(Callee::Custom(name.to_string()));
        }
        self.options.builtin(name).map(Callee::Builtin)
    }

    fn resolve(&self, name: &str) -> Option<Resolved> {
        if let Some(value) = self.value(name) {
            return Some(Resolved::Value(value));
        }
        self.callable(name).map(Resolved::Callable)
    }

    fn check_callees(&self, node: &Syntax) -> Result<(), ExprError> {
        if let SyntaxKind::Call { func, .. } = &node.kind {
            if let SyntaxKind::Name(name) = &func.kind {
                if self.resolve(name).is_none() {
                    return Err(ExprError::HasInvalidFunction {
                        offset: node.offset,
                        name: name.clone(),
                    });
                }
            }
        }
        node.children()
            .into_iter()
            .try_for_each(|child| self.check_callees(child))
    }

    fn check_names(&self, node: &Syntax, is_callee: bool) -> Result<(), ExprError> {
        match &node.kind {
            SyntaxKind::Name(name) => {
                if is_callee && self.callable(name).is_some() {
                    return Ok(());
                }
                match self.resolve(name) {
                    Some(Resolved::Value(_)) => Ok(()),
                    Some(Resolved::Callable(_)) if is_callee => Ok(()),
                    Some(Resolved::Callable(_)) => Err(ExprError::FunctionNameWithoutArguments {
                        offset: node.offset,
                        name: name.clone(),
                    }),
                    None => Err(ExprError::HasInvalidVariable {
                        offset: node.offset,
                        name: name.clone(),
                    }),
                }
            }
            SyntaxKind::Call {
                func,
                args,
                keywords,
            } => {
                self.check_names(func, true)?;
                args.iter()
                    .chain(keywords.iter().map(|(_, value)| value))
                    .try_for_each(|arg| self.check_names(arg, false))
            }
            SyntaxKind::Binary(BinaryOp::ImplicitMul, ..) => {
                let factors = implicit_factors(node);
                let mut idx = 0;
                while idx < factors.len() {
                    let applies = idx + 1 < factors.len() && self.applies_to_next(factors[idx]);
                    self.check_names(factors[idx], applies)?;
                    idx += 1;
                }
                Ok(())
            }
            SyntaxKind::Comprehension { element, iter, .. } => {
                self.check_names(element, false)?;
                self.check_names(iter, false)
            }
            SyntaxKind::Attribute(inner, _) => self.check_names(inner, false),
            _ => node
                .children()
                .into_iter()
                .try_for_each(|child| self.check_names(child, false)),
        }
    }

    /// Whether a factor of an implicit product is a function name applied
    /// to the factor after it, as in `sin x`.
    fn applies_to_next(&self, factor: &Syntax) -> bool {
        match &factor.kind {
            SyntaxKind::Name(name) => self.value(name).is_none() && self.callable(name).is_some(),
            _ => false,
        }
    }

    fn build(&self, node: &Syntax) -> Result<Expr, ExprError> {
        match &node.kind {
            SyntaxKind::Name(name) => self.value(name).ok_or_else(|| ExprError::HasInvalidVariable {
                offset: node.offset,
                name: name.clone(),
            }),
            SyntaxKind::Int(text) => parse_int(text, node.offset).map(Expr::Integer),
            SyntaxKind::Float(text) => {
                if !self.options.allow_complex {
                    return Err(ExprError::HasFloat {
                        offset: node.offset,
                        text: text.clone(),
                    });
                }
                text.parse::<f64>()
                    .map(Expr::Float)
                    .map_err(|_| ExprError::HasParseError {
                        offset: node.offset,
                    })
            }
            SyntaxKind::Imaginary(text) => {
                if !self.options.allow_complex {
                    return Err(ExprError::HasComplex {
                        offset: node.offset,
                        text: format!("{text}j"),
                    });
                }
                text.parse::<f64>()
                    .map(Expr::Imaginary)
                    .map_err(|_| ExprError::HasParseError {
                        offset: node.offset,
                    })
            }
            SyntaxKind::Unary(UnaryOp::Plus, inner) => self.build(inner),
            SyntaxKind::Unary(UnaryOp::Minus, inner) => Ok(Expr::Neg(Box::new(self.build(inner)?))),
            SyntaxKind::Binary(BinaryOp::ImplicitMul, ..) => self.build_implicit(node),
            SyntaxKind::Binary(op, lhs, rhs) => {
                let lhs = Box::new(self.build(lhs)?);
                let rhs = Box::new(self.build(rhs)?);
                match op {
                    BinaryOp::Add => Ok(Expr::Add(lhs, rhs)),
                    BinaryOp::Sub => Ok(Expr::Sub(lhs, rhs)),
                    BinaryOp::Mul => Ok(Expr::Mul(lhs, rhs)),
                    BinaryOp::Div => Ok(Expr::Div(lhs, rhs)),
                    BinaryOp::Mod => Ok(Expr::Mod(lhs, rhs)),
                    BinaryOp::Pow => Ok(Expr::Pow(lhs, rhs)),
                    _ => Err(ExprError::HasInvalidExpression {
                        offset: node.offset,
                    }),
                }
            }
            SyntaxKind::Call { func, args, .. } => {
                let SyntaxKind::Name(name) = &func.kind else {
                    return Err(ExprError::HasInvalidExpression {
                        offset: node.offset,
                    });
                };
                let args = args
                    .iter()
                    .map(|arg| self.build(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.apply(name, args, node.offset)
            }
            _ => Err(ExprError::HasInvalidExpression {
                offset: node.offset,
            }),
        }
    }

    fn apply(&self, name: &str, mut args: Vec<Expr>, offset: usize) -> Result<Expr, ExprError> {
        match self.resolve(name) {
            Some(Resolved::Callable(Callee::Builtin(function))) => {
                if !function.arity().accepts(args.len()) {
                    return Err(ExprError::WrongArgumentCount {
                        offset,
                        name: name.to_string(),
                        given: args.len(),
                    });
                }
                Ok(Expr::call(function, args))
            }
            Some(Resolved::Callable(callee)) => {
                if args.is_empty() {
                    return Err(ExprError::WrongArgumentCount {
                        offset,
                        name: name.to_string(),
                        given: 0,
                    });
                }
                Ok(Expr::Call(callee, args))
            }
            // `n(n+1)` reads as a product when `n` is a value.
            Some(Resolved::Value(value)) if args.len() == 1 => {
                let arg = args.remove(0);
                Ok(Expr::Mul(Box::new(value), Box::new(arg)))
            }
            _ => Err(ExprError::HasInvalidFunction {
                offset,
                name: name.to_string(),
            }),
        }
    }

    fn build_implicit(&self, node: &Syntax) -> Result<Expr, ExprError> {
        let factors = implicit_factors(node);
        let mut built: Vec<Expr> = Vec::with_capacity(factors.len());
        let mut idx = 0;
        while idx < factors.len() {
            let factor = factors[idx];
            if idx + 1 < factors.len() && self.applies_to_next(factor) {
                if let SyntaxKind::Name(name) = &factor.kind {
                    let arg = self.build(factors[idx + 1])?;
                    built.push(self.apply(name, vec![arg], factor.offset)?);
                    idx += 2;
                    continue;
                }
            }
            built.push(self.build(factor)?);
            idx += 1;
        }
        let mut iter = built.into_iter();
        let first = iter.next().ok_or(ExprError::HasInvalidExpression {
            offset: node.offset,
        })?;
        Ok(iter.fold(first, |acc, next| Expr::Mul(Box::new(acc), Box::new(next))))
    }
}

fn implicit_factors(node: &Syntax) -> Vec<&Syntax> {
    match &node.kind {
        SyntaxKind::Binary(BinaryOp::ImplicitMul, lhs, rhs) => {
            let mut out = implicit_factors(lhs);
            out.extend(implicit_factors(rhs));
            out
        }
        _ => vec![node],
    }
}

fn is_whitelisted(node: &Syntax) -> bool {
    match &node.kind {
        SyntaxKind::Name(_)
        | SyntaxKind::Int(_)
        | SyntaxKind::Float(_)
        | SyntaxKind::Imaginary(_)
        | SyntaxKind::Unary(UnaryOp::Plus | UnaryOp::Minus, _) => true,
        SyntaxKind::Binary(op, ..) => matches!(
            op,
            BinaryOp::Add
                | BinaryOp::Sub
                | BinaryOp::Mul
                | BinaryOp::ImplicitMul
                | BinaryOp::Div
                | BinaryOp::Mod
                | BinaryOp::Pow
        ),
        SyntaxKind::Call { func, keywords, .. } => {
            keywords.is_empty() && matches!(func.kind, SyntaxKind::Name(_))
        }
        _ => false,
    }
}

/// Depth and offset of the deepest node outside the whitelist.
fn deepest_invalid(node: &Syntax, depth: usize) -> Option<(usize, usize)> {
    let mut best = if is_whitelisted(node) {
        None
    } else {
        Some((depth, node.offset))
    };
    for child in node.children() {
        if let Some(found) = deepest_invalid(child, depth + 1) {
            if best.map_or(true, |(d, _)| found.0 > d) {
                best = Some(found);
            }
        }
    }
    best
}

fn parse_int(text: &str, offset: usize) -> Result<i128, ExprError> {
    let lower = text.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };
    i128::from_str_radix(digits, radix).map_err(|_| ExprError::IntegerTooLarge { offset })
}

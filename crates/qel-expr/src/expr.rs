//! Whitelisted expression tree produced by the walker.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter, EnumString, IntoEnumIterator};

/// Built-in constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Constant {
    /// Archimedes' constant.
    Pi,
    /// Euler's number.
    E,
    /// The imaginary unit.
    I,
    /// Positive infinity.
    Infinity,
}

impl Constant {
    /// Name the constant is printed under.
    pub fn name(self) -> &'static str {
        match self {
            Constant::Pi => "pi",
            Constant::E => "e",
            Constant::I => "i",
            Constant::Infinity => "infty",
        }
    }
}

/// Functions an expression may call.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    StrumDisplay,
    EnumString,
    EnumIter,
)]
pub enum Function {
    /// Natural exponential.
    #[strum(to_string = "exp")]
    Exp,
    /// Natural logarithm.
    #[strum(to_string = "log", serialize = "ln")]
    Log,
    /// Principal square root.
    #[strum(to_string = "sqrt")]
    Sqrt,
    /// Factorial (gamma shifted by one).
    #[strum(to_string = "factorial")]
    Factorial,
    /// Absolute value.
    #[strum(to_string = "abs", serialize = "Abs")]
    Abs,
    /// Sign function.
    #[strum(to_string = "sgn", serialize = "sign")]
    Sgn,
    /// Maximum of the arguments.
    #[strum(to_string = "max", serialize = "Max")]
    Max,
    /// Minimum of the arguments.
    #[strum(to_string = "min", serialize = "Min")]
    Min,
    /// Cosine.
    #[strum(to_string = "cos")]
    Cos,
    /// Sine.
    #[strum(to_string = "sin")]
    Sin,
    /// Tangent.
    #[strum(to_string = "tan")]
    Tan,
    /// Secant.
    #[strum(to_string = "sec")]
    Sec,
    /// Cotangent.
    #[strum(to_string = "cot")]
    Cot,
    /// Cosecant.
    #[strum(to_string = "csc")]
    Csc,
    /// Inverse cosine.
    #[strum(to_string = "acos", serialize = "arccos")]
    Acos,
    /// Inverse sine.
    #[strum(to_string = "asin", serialize = "arcsin")]
    Asin,
    /// Inverse tangent.
    #[strum(to_string = "atan", serialize = "arctan")]
    Atan,
    /// Two-argument inverse tangent.
    #[strum(to_string = "atan2", serialize = "arctan2")]
    Atan2,
    /// Hyperbolic cosine.
    #[strum(to_string = "cosh")]
    Cosh,
    /// Hyperbolic sine.
    #[strum(to_string = "sinh")]
    Sinh,
    /// Hyperbolic tangent.
    #[strum(to_string = "tanh")]
    Tanh,
    /// Inverse hyperbolic cosine.
    #[strum(to_string = "acosh")]
    Acosh,
    /// Inverse hyperbolic sine.
    #[strum(to_string = "asinh")]
    Asinh,
    /// Inverse hyperbolic tangent.
    #[strum(to_string = "atanh")]
    Atanh,
}

/// Accepted argument counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly this many arguments.
    Exact(usize),
    /// At least this many arguments.
    AtLeast(usize),
}

impl Arity {
    /// Whether `count` arguments are accepted.
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl Function {
    /// Trigonometric and hyperbolic functions, gated behind `allow_trig`.
    pub fn is_trig(self) -> bool {
        !matches!(
            self,
            Function::Exp
                | Function::Log
                | Function::Sqrt
                | Function::Factorial
                | Function::Abs
                | Function::Sgn
                | Function::Max
                | Function::Min
        )
    }

    /// Accepted argument counts.
    pub fn arity(self) -> Arity {
        match self {
            Function::Atan2 => Arity::Exact(2),
            Function::Max | Function::Min => Arity::AtLeast(1),
            _ => Arity::Exact(1),
        }
    }

    /// Every spelling that resolves to a built-in function.
    pub fn spellings() -> Vec<String> {
        let mut names: Vec<String> = Function::iter().map(|f| f.to_string()).collect();
        names.extend(
            [
                "ln", "Abs", "sign", "Max", "Min", "arccos", "arcsin", "arctan", "arctan2",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        names
    }
}

/// Callee of a call node.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Callee {
    /// Built-in function.
    Builtin(Function),
    /// Author-declared opaque function.
    Custom(String),
}

impl Display for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Builtin(function) => write!(f, "{function}"),
            Callee::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Parsed, whitelisted expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Exact integer literal.
    Integer(i128),
    /// Float literal, only when complex input is enabled.
    Float(f64),
    /// Imaginary literal such as `3j`, only when complex input is enabled.
    Imaginary(f64),
    /// Declared variable.
    Symbol(String),
    /// Built-in constant.
    Constant(Constant),
    /// Unary minus.
    Neg(Box<Expr>),
    /// Sum.
    Add(Box<Expr>, Box<Expr>),
    /// Difference.
    Sub(Box<Expr>, Box<Expr>),
    /// Product.
    Mul(Box<Expr>, Box<Expr>),
    /// Quotient.
    Div(Box<Expr>, Box<Expr>),
    /// Remainder.
    Mod(Box<Expr>, Box<Expr>),
    /// Power.
    Pow(Box<Expr>, Box<Expr>),
    /// Function application.
    Call(Callee, Vec<Expr>),
}

impl Expr {
    /// Integer literal.
    pub fn int(value: i128) -> Self {
        Expr::Integer(value)
    }

    /// Variable reference.
    pub fn sym(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    /// Call of a built-in function.
    pub fn call(function: Function, args: Vec<Expr>) -> Self {
        Expr::Call(Callee::Builtin(function), args)
    }

    /// Every variable referenced by the expression, sorted and deduplicated.
    pub fn symbols(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_symbols(&mut out);
        out.sort();
        out.dedup();
        out
    }

    fn collect_symbols(&self, out: &mut Vec<String>) {
        match self {
            Expr::Symbol(name) => out.push(name.clone()),
            Expr::Neg(inner) => inner.collect_symbols(out),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Mod(a, b)
            | Expr::Pow(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
            Expr::Call(_, args) => args.iter().for_each(|arg| arg.collect_symbols(out)),
            Expr::Integer(_) | Expr::Float(_) | Expr::Imaginary(_) | Expr::Constant(_) => {}
        }
    }

    /// Height of the tree, computed without recursion.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            match node {
                Expr::Neg(inner) => stack.push((inner, depth + 1)),
                Expr::Add(a, b)
                | Expr::Sub(a, b)
                | Expr::Mul(a, b)
                | Expr::Div(a, b)
                | Expr::Mod(a, b)
                | Expr::Pow(a, b) => {
                    stack.push((a, depth + 1));
                    stack.push((b, depth + 1));
                }
                Expr::Call(_, args) => stack.extend(args.iter().map(|arg| (arg, depth + 1))),
                _ => {}
            }
        }
        deepest
    }

    /// Number of nodes in the tree.
    pub fn size(&self) -> usize {
        match self {
            Expr::Neg(inner) => 1 + inner.size(),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Mod(a, b)
            | Expr::Pow(a, b) => 1 + a.size() + b.size(),
            Expr::Call(_, args) => 1 + args.iter().map(Expr::size).sum::<usize>(),
            _ => 1,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Add(..) | Expr::Sub(..) => 1,
            Expr::Mul(..) | Expr::Div(..) | Expr::Mod(..) => 2,
            Expr::Neg(..) => 3,
            Expr::Pow(..) => 4,
            Expr::Integer(v) if *v < 0 => 0,
            Expr::Float(v) | Expr::Imaginary(v) if v.is_sign_negative() => 0,
            _ => 5,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, min: u8) -> fmt::Result {
    if expr.precedence() < min {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

fn write_float(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    let text = format!("{value}");
    if text.contains(['.', 'e', 'n', 'N']) {
        write!(f, "{text}")
    } else {
        write!(f, "{text}.0")
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(value) => write!(f, "{value}"),
            Expr::Float(value) => write_float(f, *value),
            Expr::Imaginary(value) => {
                write_float(f, *value)?;
                write!(f, "j")
            }
            Expr::Symbol(name) => write!(f, "{name}"),
            Expr::Constant(constant) => write!(f, "{}", constant.name()),
            Expr::Neg(inner) => {
                write!(f, "-")?;
                write_operand(f, inner, 3)
            }
            Expr::Add(a, b) | Expr::Sub(a, b) => {
                write_operand(f, a, 1)?;
                write!(f, "{}", if matches!(self, Expr::Add(..)) { " + " } else { " - " })?;
                write_operand(f, b, 2)
            }
            Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Mod(a, b) => {
                let op = match self {
                    Expr::Mul(..) => "*",
                    Expr::Div(..) => "/",
                    _ => "%",
                };
                write_operand(f, a, 2)?;
                write!(f, "{op}")?;
                write_operand(f, b, 3)
            }
            Expr::Pow(base, exponent) => {
                write_operand(f, base, 5)?;
                write!(f, "**")?;
                write_operand(f, exponent, 3)
            }
            Expr::Call(callee, args) => {
                write!(f, "{callee}(")?;
                for (idx, arg) in args.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

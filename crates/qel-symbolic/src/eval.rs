//! Complex floating-point evaluation of expressions.

use std::collections::BTreeMap;
use std::f64::consts::PI;

use num_complex::Complex64;
use qel_core::label_substream;
use qel_expr::{Callee, Constant, Expr, Function};

use crate::error::SymbolicError;

/// Variable assignment used by [`evaluate`].
pub type Env = BTreeMap<String, Complex64>;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Complex gamma function (Lanczos, reflected on the left half-plane).
pub fn gamma(z: Complex64) -> Complex64 {
    if z.re < 0.5 {
        let sin = (z * PI).sin();
        return Complex64::new(PI, 0.0) / (sin * gamma(Complex64::new(1.0, 0.0) - z));
    }
    let z = z - 1.0;
    let mut x = Complex64::new(LANCZOS[0], 0.0);
    for (k, coeff) in LANCZOS.iter().enumerate().skip(1) {
        x += *coeff / (z + k as f64);
    }
    let t = z + LANCZOS_G + 0.5;
    (2.0 * PI).sqrt() * t.powc(z + 0.5) * (-t).exp() * x
}

/// Evaluates `expr` with every symbol bound in `env`.
///
/// Division by zero and domain errors produce non-finite values instead of
/// failing; callers skip such samples.
pub fn evaluate(expr: &Expr, env: &Env) -> Result<Complex64, SymbolicError> {
    Ok(match expr {
        Expr::Integer(value) => Complex64::new(*value as f64, 0.0),
        Expr::Float(value) => Complex64::new(*value, 0.0),
        Expr::Imaginary(value) => Complex64::new(0.0, *value),
        Expr::Symbol(name) => *env
            .get(name)
            .ok_or_else(|| SymbolicError::diverged(format!("unbound symbol {name}")))?,
        Expr::Constant(Constant::Pi) => Complex64::new(PI, 0.0),
        Expr::Constant(Constant::E) => Complex64::new(std::f64::consts::E, 0.0),
        Expr::Constant(Constant::I) => Complex64::i(),
        Expr::Constant(Constant::Infinity) => Complex64::new(f64::INFINITY, 0.0),
        Expr::Neg(inner) => -evaluate(inner, env)?,
        Expr::Add(a, b) => evaluate(a, env)? + evaluate(b, env)?,
        Expr::Sub(a, b) => evaluate(a, env)? - evaluate(b, env)?,
        Expr::Mul(a, b) => evaluate(a, env)? * evaluate(b, env)?,
        Expr::Div(a, b) => {
            let denominator = evaluate(b, env)?;
            if denominator.norm() == 0.0 {
                Complex64::new(f64::NAN, f64::NAN)
            } else {
                evaluate(a, env)? / denominator
            }
        }
        Expr::Mod(a, b) => {
            let (a, b) = (evaluate(a, env)?.re, evaluate(b, env)?.re);
            Complex64::new(a - b * (a / b).floor(), 0.0)
        }
        Expr::Pow(base, exponent) => {
            let base = evaluate(base, env)?;
            match exponent.as_ref() {
                Expr::Integer(k) if k.unsigned_abs() <= 1024 => base.powi(*k as i32),
                other => {
                    let exponent = evaluate(other, env)?;
                    if base.norm() == 0.0 {
                        if exponent.re > 0.0 {
                            Complex64::new(0.0, 0.0)
                        } else {
                            Complex64::new(f64::NAN, f64::NAN)
                        }
                    } else {
                        base.powc(exponent)
                    }
                }
            }
        }
        Expr::Call(Callee::Builtin(function), args) => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            apply(*function, &values)
        }
        Expr::Call(Callee::Custom(name), args) => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, env))
                .collect::<Result<Vec<_>, _>>()?;
            opaque(name, &values)
        }
    })
}

fn apply(function: Function, values: &[Complex64]) -> Complex64 {
    let nan = Complex64::new(f64::NAN, f64::NAN);
    let Some(&z) = values.first() else {
        return nan;
    };
    let one = Complex64::new(1.0, 0.0);
    match function {
        Function::Exp => z.exp(),
        Function::Log => z.ln(),
        Function::Sqrt => z.sqrt(),
        Function::Factorial => gamma(z + 1.0),
        Function::Abs => Complex64::new(z.norm(), 0.0),
        Function::Sgn => {
            if z.im == 0.0 {
                Complex64::new(
                    if z.re > 0.0 {
                        1.0
                    } else if z.re < 0.0 {
                        -1.0
                    } else {
                        0.0
                    },
                    0.0,
                )
            } else {
                z / z.norm()
            }
        }
        Function::Max => values
            .iter()
            .copied()
            .fold(z, |acc, v| if v.re > acc.re { v } else { acc }),
        Function::Min => values
            .iter()
            .copied()
            .fold(z, |acc, v| if v.re < acc.re { v } else { acc }),
        Function::Cos => z.cos(),
        Function::Sin => z.sin(),
        Function::Tan => z.tan(),
        Function::Sec => one / z.cos(),
        Function::Cot => one / z.tan(),
        Function::Csc => one / z.sin(),
        Function::Acos => z.acos(),
        Function::Asin => z.asin(),
        Function::Atan => z.atan(),
        Function::Atan2 => match values.get(1) {
            Some(x) => Complex64::new(z.re.atan2(x.re), 0.0),
            None => nan,
        },
        Function::Cosh => z.cosh(),
        Function::Sinh => z.sinh(),
        Function::Tanh => z.tanh(),
        Function::Acosh => z.acosh(),
        Function::Asinh => z.asinh(),
        Function::Atanh => z.atanh(),
    }
}

/// Stand-in value for an author-declared function: a fixed polynomial in
/// the arguments whose coefficients depend only on the name.
fn opaque(name: &str, values: &[Complex64]) -> Complex64 {
    let seed = label_substream(name);
    let mut acc = Complex64::new(((seed & 0xff) as f64) / 64.0 + 0.5, 0.0);
    for (idx, &value) in values.iter().enumerate() {
        let a = (((seed >> (8 + 8 * (idx % 6))) & 0xff) as f64) / 128.0 + 0.25;
        acc += a * value + value * value * (a / 3.0);
    }
    acc
}

/// Replaces every occurrence of `name` in `expr` with `value`.
pub fn substitute(expr: &Expr, name: &str, value: &Expr) -> Expr {
    let sub = |e: &Expr| Box::new(substitute(e, name, value));
    match expr {
        Expr::Symbol(symbol) if symbol == name => value.clone(),
        Expr::Neg(inner) => Expr::Neg(sub(inner)),
        Expr::Add(a, b) => Expr::Add(sub(a), sub(b)),
        Expr::Sub(a, b) => Expr::Sub(sub(a), sub(b)),
        Expr::Mul(a, b) => Expr::Mul(sub(a), sub(b)),
        Expr::Div(a, b) => Expr::Div(sub(a), sub(b)),
        Expr::Mod(a, b) => Expr::Mod(sub(a), sub(b)),
        Expr::Pow(a, b) => Expr::Pow(sub(a), sub(b)),
        Expr::Call(callee, args) => Expr::Call(
            callee.clone(),
            args.iter().map(|arg| substitute(arg, name, value)).collect(),
        ),
        other => other.clone(),
    }
}

/// Whether `expr` calls a function that is only meaningful on the reals.
pub fn needs_real_samples(expr: &Expr) -> bool {
    match expr {
        Expr::Call(Callee::Builtin(function), args) => {
            matches!(
                function,
                Function::Abs
                    | Function::Sgn
                    | Function::Max
                    | Function::Min
                    | Function::Atan2
                    | Function::Factorial
            ) || args.iter().any(needs_real_samples)
        }
        Expr::Call(_, args) => args.iter().any(needs_real_samples),
        Expr::Mod(..) => true,
        Expr::Neg(inner) => needs_real_samples(inner),
        Expr::Add(a, b) | Expr::Sub(a, b) | Expr::Mul(a, b) | Expr::Div(a, b) | Expr::Pow(a, b) => {
            needs_real_samples(a) || needs_real_samples(b)
        }
        _ => false,
    }
}

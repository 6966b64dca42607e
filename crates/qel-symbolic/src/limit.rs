//! Limits at infinity through truncated asymptotic series.
//!
//! Each subexpression becomes a [`Series`]: a short list of terms
//! `c * exp(a*n*log n + b*n) * n^p * (log n)^q * (log log n)^r`, sorted from
//! fastest to slowest growing, plus an optional error bound below which
//! nothing is known. Sums, products, quotients, powers, `log`, `exp` and
//! `factorial` (Stirling) are closed over this shape. Anything else reports
//! [`SymbolicError::DidNotConverge`].

use std::cmp::Ordering;
use std::f64::consts::{E, PI};

use qel_core::{Deadline, QelError};
use qel_expr::{Callee, Constant, Expr, Function};
use tracing::trace;

use crate::error::SymbolicError;
use crate::eval::gamma;

/// Terms kept per series before the tail is folded into the error bound.
pub const MAX_TERMS: usize = 8;

/// Order of the binomial, logarithm and exponential expansions.
const EXPANSION_ORDER: i32 = 4;

const KEY_EPSILON: f64 = 1e-12;
const CANCEL_EPSILON: f64 = 1e-10;

/// Growth class of a term, compared lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Growth {
    /// Coefficient of `n*log n` in the exponent.
    pub nlogn: f64,
    /// Coefficient of `n` in the exponent; `ln b` for `b^n`.
    pub rate: f64,
    /// Power of `n`.
    pub poly: f64,
    /// Power of `log n`.
    pub log: f64,
    /// Power of `log log n`.
    pub loglog: f64,
}

impl Growth {
    const CONSTANT: Growth = Growth {
        nlogn: 0.0,
        rate: 0.0,
        poly: 0.0,
        log: 0.0,
        loglog: 0.0,
    };

    fn parts(&self) -> [f64; 5] {
        [self.nlogn, self.rate, self.poly, self.log, self.loglog]
    }

    fn from_parts(parts: [f64; 5]) -> Self {
        Growth {
            nlogn: parts[0],
            rate: parts[1],
            poly: parts[2],
            log: parts[3],
            loglog: parts[4],
        }
    }

    fn plus(&self, other: &Growth) -> Growth {
        let (a, b) = (self.parts(), other.parts());
        Growth::from_parts(std::array::from_fn(|i| a[i] + b[i]))
    }

    fn scale(&self, factor: f64) -> Growth {
        Growth::from_parts(self.parts().map(|v| v * factor))
    }

    fn compare(&self, other: &Growth) -> Ordering {
        for (a, b) in self.parts().iter().zip(other.parts().iter()) {
            if (a - b).abs() > KEY_EPSILON {
                return if a < b { Ordering::Less } else { Ordering::Greater };
            }
        }
        Ordering::Equal
    }

    fn is_constant(&self) -> bool {
        self.compare(&Growth::CONSTANT) == Ordering::Equal
    }

    fn sign(&self) -> Ordering {
        self.compare(&Growth::CONSTANT)
    }
}

/// One term of a [`Series`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Term {
    /// Coefficient, never zero.
    pub coeff: f64,
    /// Growth class.
    pub growth: Growth,
}

/// Truncated asymptotic expansion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    terms: Vec<Term>,
    /// Every omitted contribution is `O(bound)`.
    bound: Option<Growth>,
}

/// Value of a limit at infinity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    /// Tends to zero.
    Zero,
    /// Tends to a non-zero constant.
    Finite(f64),
    /// Grows without bound.
    PosInfinity,
    /// Decreases without bound.
    NegInfinity,
}

impl Limit {
    /// Whether the limit is infinite in either direction.
    pub fn is_infinite(self) -> bool {
        matches!(self, Limit::PosInfinity | Limit::NegInfinity)
    }
}

impl Series {
    fn constant(value: f64) -> Self {
        Self::monomial(value, Growth::CONSTANT)
    }

    fn monomial(coeff: f64, growth: Growth) -> Self {
        let terms = if coeff == 0.0 {
            Vec::new()
        } else {
            vec![Term { coeff, growth }]
        };
        Self { terms, bound: None }
    }

    /// Leading term, when one is known.
    pub fn leading(&self) -> Option<&Term> {
        self.terms.first()
    }

    /// Terms from fastest to slowest growing.
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Whether the expansion has no omitted tail.
    pub fn is_exact(&self) -> bool {
        self.bound.is_none()
    }

    fn top(&self) -> Option<Growth> {
        self.terms.first().map(|t| t.growth).or(self.bound)
    }

    /// Limit of the series.
    pub fn limit(&self) -> Result<Limit, SymbolicError> {
        match self.terms.first() {
            None => match self.bound {
                None => Ok(Limit::Zero),
                Some(bound) if bound.sign() == Ordering::Less => Ok(Limit::Zero),
                Some(_) => Err(SymbolicError::diverged("leading terms cancelled")),
            },
            Some(term) => Ok(match term.growth.sign() {
                Ordering::Greater if term.coeff > 0.0 => Limit::PosInfinity,
                Ordering::Greater => Limit::NegInfinity,
                Ordering::Equal => Limit::Finite(term.coeff),
                Ordering::Less => Limit::Zero,
            }),
        }
    }

    /// Sorts, merges like terms and enforces the error bound and term cap.
    fn settle(mut terms: Vec<Term>, mut bound: Option<Growth>) -> Self {
        terms.sort_by(|a, b| b.growth.compare(&a.growth));
        let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
        let mut scale: Vec<f64> = Vec::with_capacity(terms.len());
        for term in terms {
            match merged.last_mut() {
                Some(last) if last.growth.compare(&term.growth) == Ordering::Equal => {
                    last.coeff += term.coeff;
                    if let Some(s) = scale.last_mut() {
                        *s = s.max(term.coeff.abs());
                    }
                }
                _ => {
                    scale.push(term.coeff.abs());
                    merged.push(term);
                }
            }
        }
        let mut kept: Vec<Term> = merged
            .into_iter()
            .zip(scale)
            .filter(|(term, scale)| term.coeff.abs() > CANCEL_EPSILON * scale)
            .map(|(term, _)| term)
            .collect();
        if let Some(b) = bound {
            kept.retain(|t| t.growth.compare(&b) == Ordering::Greater);
        }
        if kept.len() > MAX_TERMS {
            let dropped = kept[MAX_TERMS].growth;
            kept.truncate(MAX_TERMS);
            bound = Some(match bound {
                Some(b) if b.compare(&dropped) == Ordering::Greater => b,
                _ => dropped,
            });
        }
        Self {
            terms: kept,
            bound,
        }
    }
}

fn max_bound(a: Option<Growth>, b: Option<Growth>) -> Option<Growth> {
    match (a, b) {
        (Some(x), Some(y)) => Some(if x.compare(&y) == Ordering::Less { y } else { x }),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Asymptotic evaluator for one variable tending to infinity.
pub struct LimitEngine<'a> {
    variable: &'a str,
    deadline: &'a Deadline,
}

impl<'a> LimitEngine<'a> {
    /// Engine for `variable`, polling `deadline`.
    pub fn new(variable: &'a str, deadline: &'a Deadline) -> Self {
        Self { variable, deadline }
    }

    /// Series of `expr` as the variable tends to infinity.
    pub fn series(&self, expr: &Expr) -> Result<Series, SymbolicError> {
        self.deadline.check("limit")?;
        match expr {
            Expr::Integer(value) => Ok(Series::constant(*value as f64)),
            Expr::Float(value) => Ok(Series::constant(*value)),
            Expr::Symbol(name) if name == self.variable => Ok(Series::monomial(
                1.0,
                Growth {
                    poly: 1.0,
                    ..Growth::CONSTANT
                },
            )),
            Expr::Symbol(name) => Err(SymbolicError::diverged(format!("free symbol {name}"))),
            Expr::Constant(Constant::Pi) => Ok(Series::constant(PI)),
            Expr::Constant(Constant::E) => Ok(Series::constant(E)),
            Expr::Constant(_) | Expr::Imaginary(_) => {
                Err(SymbolicError::diverged("not a real growth term"))
            }
            Expr::Neg(inner) => Ok(self.scale(&self.series(inner)?, -1.0)),
            Expr::Add(a, b) => self.add(&self.series(a)?, &self.series(b)?),
            Expr::Sub(a, b) => {
                let b = self.scale(&self.series(b)?, -1.0);
                self.add(&self.series(a)?, &b)
            }
            Expr::Mul(a, b) => self.mul(&self.series(a)?, &self.series(b)?),
            Expr::Div(a, b) => {
                let inverse = self.reciprocal(&self.series(b)?)?;
                self.mul(&self.series(a)?, &inverse)
            }
            Expr::Mod(..) => Err(SymbolicError::diverged("remainder")),
            Expr::Pow(base, exponent) => {
                let base = self.series(base)?;
                let exponent = self.series(exponent)?;
                match constant_of(&exponent) {
                    Some(p) => self.pow(&base, p),
                    None => {
                        let log = self.log(&base)?;
                        self.exp(&self.mul(&log, &exponent)?)
                    }
                }
            }
            Expr::Call(Callee::Builtin(function), args) => {
                let args = args
                    .iter()
                    .map(|arg| self.series(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(*function, &args)
            }
            Expr::Call(Callee::Custom(name), _) => {
                Err(SymbolicError::diverged(format!("opaque function {name}")))
            }
        }
    }

    /// `lim expr` as the variable tends to infinity.
    pub fn limit(&self, expr: &Expr) -> Result<Limit, SymbolicError> {
        let series = self.series(expr)?;
        trace!(terms = series.terms.len(), exact = series.is_exact(), "series built");
        series.limit()
    }

    fn scale(&self, a: &Series, factor: f64) -> Series {
        let terms = a
            .terms
            .iter()
            .map(|t| Term {
                coeff: t.coeff * factor,
                growth: t.growth,
            })
            .collect();
        Series::settle(terms, a.bound)
    }

    fn shift(&self, a: &Series, growth: &Growth) -> Series {
        let terms = a
            .terms
            .iter()
            .map(|t| Term {
                coeff: t.coeff,
                growth: t.growth.plus(growth),
            })
            .collect();
        Series::settle(terms, a.bound.map(|b| b.plus(growth)))
    }

    fn add(&self, a: &Series, b: &Series) -> Result<Series, SymbolicError> {
        let mut terms = a.terms.clone();
        terms.extend(b.terms.iter().copied());
        let bound = max_bound(a.bound, b.bound);
        Ok(Series::settle(terms, bound))
    }

    fn mul(&self, a: &Series, b: &Series) -> Result<Series, SymbolicError> {
        self.deadline.check("limit")?;
        let mut terms = Vec::with_capacity(a.terms.len() * b.terms.len());
        for x in &a.terms {
            for y in &b.terms {
                terms.push(Term {
                    coeff: x.coeff * y.coeff,
                    growth: x.growth.plus(&y.growth),
                });
            }
        }
        let mut bound = None;
        if let (Some(fa), Some(tb)) = (a.bound, b.top()) {
            bound = max_bound(bound, Some(fa.plus(&tb)));
        }
        if let (Some(fb), Some(ta)) = (b.bound, a.top()) {
            bound = max_bound(bound, Some(fb.plus(&ta)));
        }
        Ok(Series::settle(terms, bound))
    }

    /// Splits `a` into its leading term and the relative remainder `a/lead - 1`.
    fn split(&self, a: &Series) -> Result<(Term, Series), SymbolicError> {
        let lead = *a
            .terms
            .first()
            .ok_or_else(|| SymbolicError::diverged("leading terms cancelled"))?;
        let inverse = lead.growth.scale(-1.0);
        let rest: Vec<Term> = a.terms[1..]
            .iter()
            .map(|t| Term {
                coeff: t.coeff / lead.coeff,
                growth: t.growth.plus(&inverse),
            })
            .collect();
        Ok((lead, Series::settle(rest, a.bound.map(|b| b.plus(&inverse)))))
    }

    /// `sum_k coeffs[k] * r^k` for a remainder `r` that tends to zero.
    fn expand(&self, rest: &Series, coeffs: &[f64]) -> Result<Series, SymbolicError> {
        let mut acc = Series::constant(coeffs.first().copied().unwrap_or(0.0));
        let mut power = Series::constant(1.0);
        for coeff in coeffs.iter().skip(1) {
            power = self.mul(&power, rest)?;
            acc = self.add(&acc, &self.scale(&power, *coeff))?;
        }
        if let Some(top) = rest.top() {
            let tail = top.scale(coeffs.len() as f64);
            acc = Series::settle(acc.terms, max_bound(acc.bound, Some(tail)));
        }
        Ok(acc)
    }

    fn reciprocal(&self, a: &Series) -> Result<Series, SymbolicError> {
        if a.terms.is_empty() && a.bound.is_none() {
            return Err(SymbolicError::DivisionByZero);
        }
        let (lead, rest) = self.split(a)?;
        let coeffs: Vec<f64> = (0..=EXPANSION_ORDER)
            .map(|k| if k % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let expanded = self.expand(&rest, &coeffs)?;
        let scaled = self.scale(&expanded, 1.0 / lead.coeff);
        Ok(self.shift(&scaled, &lead.growth.scale(-1.0)))
    }

    fn pow(&self, base: &Series, p: f64) -> Result<Series, SymbolicError> {
        if p == 0.0 {
            return Ok(Series::constant(1.0));
        }
        if p.fract() == 0.0 && (1.0..=16.0).contains(&p) {
            let mut acc = base.clone();
            for _ in 1..(p as i32) {
                acc = self.mul(&acc, base)?;
            }
            return Ok(acc);
        }
        if base.terms.is_empty() && base.bound.is_none() {
            return if p > 0.0 {
                Ok(Series::default())
            } else {
                Err(SymbolicError::DivisionByZero)
            };
        }
        let (lead, rest) = self.split(base)?;
        if lead.coeff < 0.0 && p.fract() != 0.0 {
            return Err(SymbolicError::diverged("fractional power of a negative value"));
        }
        let mut coeffs = Vec::with_capacity(EXPANSION_ORDER as usize + 1);
        let mut binomial = 1.0;
        for k in 0..=EXPANSION_ORDER {
            coeffs.push(binomial);
            binomial *= (p - k as f64) / (k as f64 + 1.0);
        }
        let expanded = self.expand(&rest, &coeffs)?;
        let scaled = self.scale(&expanded, lead.coeff.powf(p));
        Ok(self.shift(&scaled, &lead.growth.scale(p)))
    }

    fn log(&self, a: &Series) -> Result<Series, SymbolicError> {
        let (lead, rest) = self.split(a)?;
        if lead.coeff <= 0.0 {
            return Err(SymbolicError::diverged("logarithm of a non-positive value"));
        }
        let g = lead.growth;
        if g.loglog.abs() > KEY_EPSILON {
            return Err(SymbolicError::diverged("iterated logarithm"));
        }
        let mut terms = vec![Term {
            coeff: lead.coeff.ln(),
            growth: Growth::CONSTANT,
        }];
        let poly = Growth {
            poly: 1.0,
            ..Growth::CONSTANT
        };
        let log = Growth {
            log: 1.0,
            ..Growth::CONSTANT
        };
        let loglog = Growth {
            loglog: 1.0,
            ..Growth::CONSTANT
        };
        for (coeff, growth) in [
            (g.nlogn, poly.plus(&log)),
            (g.rate, poly),
            (g.poly, log),
            (g.log, loglog),
        ] {
            if coeff.abs() > KEY_EPSILON {
                terms.push(Term { coeff, growth });
            }
        }
        let head = Series::settle(terms, None);
        let coeffs: Vec<f64> = (0..=EXPANSION_ORDER)
            .map(|k| match k {
                0 => 0.0,
                k if k % 2 == 1 => 1.0 / k as f64,
                k => -1.0 / k as f64,
            })
            .collect();
        let tail = self.expand(&rest, &coeffs)?;
        self.add(&head, &tail)
    }

    fn exp(&self, a: &Series) -> Result<Series, SymbolicError> {
        if let Some(bound) = a.bound {
            if bound.sign() != Ordering::Less {
                return Err(SymbolicError::diverged("exponent known only up to a growing error"));
            }
        }
        let mut growth = Growth::CONSTANT;
        let mut constant = 0.0;
        let mut decaying = Vec::new();
        for term in &a.terms {
            let g = term.growth;
            match g.sign() {
                Ordering::Less => decaying.push(*term),
                Ordering::Equal => constant += term.coeff,
                Ordering::Greater => {
                    let [nlogn, rate, poly, log, loglog] = g.parts();
                    let is = |expected: [f64; 5]| {
                        [nlogn, rate, poly, log, loglog]
                            .iter()
                            .zip(expected.iter())
                            .all(|(a, b)| (a - b).abs() <= KEY_EPSILON)
                    };
                    if is([0.0, 0.0, 1.0, 1.0, 0.0]) {
                        growth.nlogn += term.coeff;
                    } else if is([0.0, 0.0, 1.0, 0.0, 0.0]) {
                        growth.rate += term.coeff;
                    } else if is([0.0, 0.0, 0.0, 1.0, 0.0]) {
                        growth.poly += term.coeff;
                    } else if is([0.0, 0.0, 0.0, 0.0, 1.0]) {
                        growth.log += term.coeff;
                    } else {
                        return Err(SymbolicError::diverged("exponent grows outside known classes"));
                    }
                }
            }
        }
        let rest = Series::settle(decaying, a.bound);
        let mut coeffs = Vec::with_capacity(EXPANSION_ORDER as usize + 1);
        let mut factorial = 1.0;
        for k in 0..=EXPANSION_ORDER {
            if k > 0 {
                factorial *= k as f64;
            }
            coeffs.push(1.0 / factorial);
        }
        let expanded = self.expand(&rest, &coeffs)?;
        let scaled = self.scale(&expanded, constant.exp());
        Ok(self.shift(&scaled, &growth))
    }

    /// Stirling: `log x! = x log x - x + log(x)/2 + log(2 pi)/2 + 1/(12 x) + ...`.
    fn factorial(&self, a: &Series) -> Result<Series, SymbolicError> {
        if let Some(value) = constant_of(a) {
            return Ok(Series::constant(gamma((value + 1.0).into()).re));
        }
        match a.limit()? {
            Limit::PosInfinity => {}
            _ => return Err(SymbolicError::diverged("factorial of a bounded argument")),
        }
        let log = self.log(a)?;
        let x_log_x = self.mul(a, &log)?;
        let mut exponent = self.add(&x_log_x, &self.scale(a, -1.0))?;
        exponent = self.add(&exponent, &self.scale(&log, 0.5))?;
        exponent = self.add(&exponent, &Series::constant(0.5 * (2.0 * PI).ln()))?;
        let correction = self.scale(&self.reciprocal(a)?, 1.0 / 12.0);
        exponent = self.add(&exponent, &correction)?;
        self.exp(&exponent)
    }

    fn call(&self, function: Function, args: &[Series]) -> Result<Series, SymbolicError> {
        let Some(first) = args.first() else {
            return Err(SymbolicError::diverged("call without arguments"));
        };
        match function {
            Function::Exp => self.exp(first),
            Function::Log => self.log(first),
            Function::Sqrt => self.pow(first, 0.5),
            Function::Factorial => self.factorial(first),
            Function::Abs => match first.leading() {
                Some(term) if term.coeff < 0.0 => Ok(self.scale(first, -1.0)),
                Some(_) => Ok(first.clone()),
                None if first.is_exact() => Ok(Series::default()),
                None => Err(SymbolicError::diverged("sign of a cancelled sum")),
            },
            Function::Max | Function::Min => {
                let mut best = first.clone();
                for candidate in &args[1..] {
                    let diff = self.add(candidate, &self.scale(&best, -1.0))?;
                    let larger = match diff.leading() {
                        Some(term) => term.coeff > 0.0,
                        None if diff.is_exact() => false,
                        None => return Err(SymbolicError::diverged("undecided comparison")),
                    };
                    if larger == (function == Function::Max) {
                        best = candidate.clone();
                    }
                }
                Ok(best)
            }
            Function::Sinh | Function::Cosh if growing(first) => {
                let negative = first.leading().map_or(false, |t| t.coeff < 0.0);
                let arg = if negative {
                    self.scale(first, -1.0)
                } else {
                    first.clone()
                };
                let half = if negative && function == Function::Sinh {
                    -0.5
                } else {
                    0.5
                };
                Ok(self.scale(&self.exp(&arg)?, half))
            }
            Function::Asinh | Function::Acosh if growing(first) => {
                self.log(&self.scale(first, 2.0))
            }
            Function::Atan | Function::Tanh if growing(first) => {
                let sign = first.leading().map_or(1.0, |t| t.coeff.signum());
                let value = if function == Function::Atan { PI / 2.0 } else { 1.0 };
                let bound = first.top().map(|g| g.scale(-1.0));
                Ok(Series::settle(
                    vec![Term {
                        coeff: sign * value,
                        growth: Growth::CONSTANT,
                    }],
                    bound,
                ))
            }
            _ => self.bounded_call(function, first),
        }
    }

    /// Smooth functions of an argument that settles to a constant.
    fn bounded_call(&self, function: Function, arg: &Series) -> Result<Series, SymbolicError> {
        if growing(arg) {
            return Err(SymbolicError::diverged(format!("{function} of a growing argument")));
        }
        let value = arg
            .terms
            .iter()
            .filter(|t| t.growth.is_constant())
            .map(|t| t.coeff)
            .sum::<f64>();
        let decay = arg
            .terms
            .iter()
            .find(|t| t.growth.sign() == Ordering::Less)
            .map(|t| t.growth);
        let applied = crate::eval::evaluate(
            &Expr::call(function, vec![Expr::Float(value)]),
            &Default::default(),
        )?;
        if !applied.re.is_finite() || applied.im.abs() > KEY_EPSILON {
            return Err(SymbolicError::diverged(format!("{function} leaves the reals")));
        }
        Ok(Series::settle(
            vec![Term {
                coeff: applied.re,
                growth: Growth::CONSTANT,
            }],
            max_bound(decay, arg.bound),
        ))
    }
}

fn growing(a: &Series) -> bool {
    a.top().map_or(false, |g| g.sign() == Ordering::Greater)
}

fn constant_of(a: &Series) -> Option<f64> {
    if !a.is_exact() {
        return None;
    }
    match a.terms.as_slice() {
        [] => Some(0.0),
        [term] if term.growth.is_constant() => Some(term.coeff),
        _ => None,
    }
}

/// `lim_{variable -> inf} expr`.
pub fn limit_at_infinity(expr: &Expr, variable: &str, deadline: &Deadline) -> Result<Limit, QelError> {
    LimitEngine::new(variable, deadline)
        .limit(expr)
        .map_err(QelError::from)
}

/// Sign of the leading coefficient of `expr` for large `variable`.
pub fn eventual_sign(expr: &Expr, variable: &str, deadline: &Deadline) -> Result<Ordering, QelError> {
    let series = LimitEngine::new(variable, deadline).series(expr)?;
    match series.leading() {
        Some(term) => Ok(term.coeff.partial_cmp(&0.0).unwrap_or(Ordering::Equal)),
        None if series.is_exact() => Ok(Ordering::Equal),
        None => Err(SymbolicError::diverged("leading terms cancelled").into()),
    }
}

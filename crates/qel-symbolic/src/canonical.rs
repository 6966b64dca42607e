//! Canonical rational-function form.
//!
//! An expression becomes a [`Fraction`] of two [`Poly`] values. A polynomial
//! is a map from [`Monomial`] to an exact [`Rational`] coefficient, and a
//! monomial maps each [`Atom`] to its exponent, itself a fraction. Ordered
//! maps make the form independent of the order terms and factors were
//! written in, so structural equality of two canonical forms is
//! commutativity and associativity tolerant.

use std::collections::BTreeMap;

use qel_core::Deadline;
use qel_expr::{Callee, Constant, Expr, Function};
use tracing::trace;

use crate::error::SymbolicError;
use crate::rational::Rational;

/// Largest integer power expanded for a multi-term polynomial.
pub const MAX_EXPANDED_POWER: i128 = 256;

/// Indivisible factor of a monomial.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Atom {
    /// Declared variable.
    Symbol(String),
    /// Archimedes' constant.
    Pi,
    /// Euler's number; `exp(x)` is `E` raised to `x`.
    E,
    /// Imaginary unit, kept at exponent one after folding.
    I,
    /// Positive infinity.
    Infinity,
    /// Radical base: a positive integer, or `-1`.
    Number(i128),
    /// Opaque function application over canonical arguments.
    Call(Callee, Vec<Fraction>),
    /// Remainder that could not be folded.
    Mod(Box<Fraction>, Box<Fraction>),
    /// Non-monomial base raised to a non-integer exponent.
    Group(Box<Fraction>),
}

/// Product of atoms raised to exponents.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Monomial(BTreeMap<Atom, Fraction>);

impl Monomial {
    /// The empty product.
    pub fn one() -> Self {
        Self::default()
    }

    /// Whether the monomial is the empty product.
    pub fn is_one(&self) -> bool {
        self.0.is_empty()
    }

    /// Factors and their exponents.
    pub fn factors(&self) -> impl Iterator<Item = (&Atom, &Fraction)> {
        self.0.iter()
    }
}

/// Sum of monomials with exact coefficients. Zero coefficients are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Poly(BTreeMap<Monomial, Rational>);

impl Poly {
    /// The zero polynomial.
    pub fn zero() -> Self {
        Self::default()
    }

    /// A constant polynomial.
    pub fn constant(value: Rational) -> Self {
        let mut terms = BTreeMap::new();
        if !value.is_zero() {
            terms.insert(Monomial::one(), value);
        }
        Self(terms)
    }

    /// Whether the polynomial is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no terms.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Terms in canonical order.
    pub fn terms(&self) -> impl Iterator<Item = (&Monomial, &Rational)> {
        self.0.iter()
    }

    /// The constant value, when the polynomial has no non-constant terms.
    pub fn as_rational(&self) -> Option<Rational> {
        match self.0.len() {
            0 => Some(Rational::ZERO),
            1 => self
                .0
                .iter()
                .next()
                .filter(|(monomial, _)| monomial.is_one())
                .map(|(_, coeff)| *coeff),
            _ => None,
        }
    }

    fn single_term(&self) -> Option<(&Monomial, Rational)> {
        if self.0.len() == 1 {
            self.0.iter().next().map(|(m, c)| (m, *c))
        } else {
            None
        }
    }
}

/// Quotient of two polynomials with a normalized denominator.
///
/// Denominators that are a single term are folded into the numerator as
/// negative exponents; remaining denominators have a leading coefficient of
/// one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fraction {
    num: Poly,
    den: Poly,
}

impl Fraction {
    /// Zero.
    pub fn zero() -> Self {
        Self::constant(Rational::ZERO)
    }

    /// One.
    pub fn one() -> Self {
        Self::constant(Rational::ONE)
    }

    /// Constant fraction.
    pub fn constant(value: Rational) -> Self {
        Self {
            num: Poly::constant(value),
            den: Poly::constant(Rational::ONE),
        }
    }

    /// Numerator.
    pub fn numerator(&self) -> &Poly {
        &self.num
    }

    /// Denominator; the constant one for polynomials.
    pub fn denominator(&self) -> &Poly {
        &self.den
    }

    /// Whether the fraction is identically zero.
    pub fn is_zero(&self) -> bool {
        self.num.is_zero()
    }

    /// The constant value, when there is one.
    pub fn as_rational(&self) -> Option<Rational> {
        if self.den.as_rational() != Some(Rational::ONE) {
            return None;
        }
        self.num.as_rational()
    }

    fn from_atom(atom: Atom) -> Self {
        let mut factors = BTreeMap::new();
        factors.insert(atom, Fraction::one());
        let mut terms = BTreeMap::new();
        terms.insert(Monomial(factors), Rational::ONE);
        Self {
            num: Poly(terms),
            den: Poly::constant(Rational::ONE),
        }
    }

    fn from_poly(num: Poly) -> Self {
        Self {
            num,
            den: Poly::constant(Rational::ONE),
        }
    }
}

/// Deepest expression tree [`Canonicalizer::canonical`] accepts.
pub const MAX_DEPTH: usize = 1_024;

/// Converts expressions to canonical form under a term budget and deadline.
pub struct Canonicalizer<'a> {
    max_terms: usize,
    deadline: &'a Deadline,
}

impl<'a> Canonicalizer<'a> {
    /// Canonicalizer bounded by `max_terms` and `deadline`.
    pub fn new(max_terms: usize, deadline: &'a Deadline) -> Self {
        Self {
            max_terms,
            deadline,
        }
    }

    /// Canonical form of `expr`.
    ///
    /// Trees deeper than [`MAX_DEPTH`] are refused before any recursion.
    pub fn canonical(&self, expr: &Expr) -> Result<Fraction, SymbolicError> {
        if expr.depth() > MAX_DEPTH {
            return Err(SymbolicError::Overflow("nesting"));
        }
        self.lower(expr)
    }

    fn lower(&self, expr: &Expr) -> Result<Fraction, SymbolicError> {
        self.deadline.check("canonical")?;
        match expr {
            Expr::Integer(value) => Ok(Fraction::constant(Rational::integer(*value))),
            Expr::Float(value) => Ok(Fraction::constant(Rational::approximate(*value)?)),
            Expr::Imaginary(value) => {
                let coeff = Fraction::constant(Rational::approximate(*value)?);
                self.mul(&coeff, &Fraction::from_atom(Atom::I))
            }
            Expr::Symbol(name) => Ok(Fraction::from_atom(Atom::Symbol(name.clone()))),
            Expr::Constant(constant) => Ok(Fraction::from_atom(match constant {
                Constant::Pi => Atom::Pi,
                Constant::E => Atom::E,
                Constant::I => Atom::I,
                Constant::Infinity => Atom::Infinity,
            })),
            Expr::Neg(inner) => self.neg(&self.lower(inner)?),
            Expr::Add(a, b) => self.add(&self.lower(a)?, &self.lower(b)?),
            Expr::Sub(a, b) => self.sub(&self.lower(a)?, &self.lower(b)?),
            Expr::Mul(a, b) => self.mul(&self.lower(a)?, &self.lower(b)?),
            Expr::Div(a, b) => self.div(&self.lower(a)?, &self.lower(b)?),
            Expr::Mod(a, b) => self.modulo(self.lower(a)?, self.lower(b)?),
            Expr::Pow(base, exponent) => {
                self.pow(&self.lower(base)?, &self.lower(exponent)?)
            }
            Expr::Call(callee, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.lower(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(callee, args)
            }
        }
    }

    /// `a + b`.
    pub fn add(&self, a: &Fraction, b: &Fraction) -> Result<Fraction, SymbolicError> {
        if a.den == b.den {
            let num = self.poly_add(&a.num, &b.num)?;
            return self.normalize(num, a.den.clone());
        }
        let lhs = self.poly_mul(&a.num, &b.den)?;
        let rhs = self.poly_mul(&b.num, &a.den)?;
        let num = self.poly_add(&lhs, &rhs)?;
        let den = self.poly_mul(&a.den, &b.den)?;
        self.normalize(num, den)
    }

    /// `-a`.
    pub fn neg(&self, a: &Fraction) -> Result<Fraction, SymbolicError> {
        Ok(Fraction {
            num: poly_scale(&a.num, Rational::integer(-1))?,
            den: a.den.clone(),
        })
    }

    /// `a - b`.
    pub fn sub(&self, a: &Fraction, b: &Fraction) -> Result<Fraction, SymbolicError> {
        self.add(a, &self.neg(b)?)
    }

    /// `a * b`.
    pub fn mul(&self, a: &Fraction, b: &Fraction) -> Result<Fraction, SymbolicError> {
        let num = self.poly_mul(&a.num, &b.num)?;
        let den = self.poly_mul(&a.den, &b.den)?;
        self.normalize(num, den)
    }

    /// `a / b`, failing when `b` is identically zero.
    pub fn div(&self, a: &Fraction, b: &Fraction) -> Result<Fraction, SymbolicError> {
        if b.is_zero() {
            return Err(SymbolicError::DivisionByZero);
        }
        let num = self.poly_mul(&a.num, &b.den)?;
        let den = self.poly_mul(&a.den, &b.num)?;
        self.normalize(num, den)
    }

    /// `base ** exponent`.
    pub fn pow(&self, base: &Fraction, exponent: &Fraction) -> Result<Fraction, SymbolicError> {
        match exponent.as_rational() {
            Some(r) if r.is_integer() => self.pow_int(base, r.numer()),
            Some(r) => self.pow_rational(base, r),
            None => self.pow_symbolic(base, exponent),
        }
    }

    fn pow_int(&self, base: &Fraction, k: i128) -> Result<Fraction, SymbolicError> {
        if k == 0 {
            return Ok(Fraction::one());
        }
        if k < 0 {
            let inverse = self.div(&Fraction::one(), base)?;
            let k = k.checked_neg().ok_or(SymbolicError::Overflow("power"))?;
            return self.pow_int(&inverse, k);
        }
        let num = self.poly_pow(&base.num, k)?;
        let den = self.poly_pow(&base.den, k)?;
        self.normalize(num, den)
    }

    fn pow_rational(&self, base: &Fraction, r: Rational) -> Result<Fraction, SymbolicError> {
        if base.is_zero() {
            return if r.is_negative() {
                Err(SymbolicError::DivisionByZero)
            } else {
                Ok(Fraction::zero())
            };
        }
        let exponent = Fraction::constant(r);
        if let Some((monomial, coeff)) = self.single_term_of(base) {
            let scalable = monomial.factors().all(|(_, e)| match e.as_rational() {
                Some(c) => c.cmp_value(&Rational::ONE).is_le()
                    && c.cmp_value(&Rational::integer(-1)).is_ge(),
                None => true,
            });
            if scalable {
                let mut factors = rational_power(coeff, r)?;
                for (atom, e) in monomial.factors() {
                    factors.push((atom.clone(), self.mul(e, &exponent)?));
                }
                return self.product(factors, Rational::ONE);
            }
        }
        self.product(vec![(Atom::Group(Box::new(base.clone())), exponent)], Rational::ONE)
    }

    fn pow_symbolic(&self, base: &Fraction, exponent: &Fraction) -> Result<Fraction, SymbolicError> {
        if base.is_zero() {
            return Ok(Fraction::zero());
        }
        if let Some((monomial, coeff)) = self.single_term_of(base) {
            let mut factors = Vec::new();
            if !coeff.is_one() {
                if coeff.is_negative() || !coeff.is_integer() {
                    let group = Atom::Group(Box::new(Fraction::constant(coeff)));
                    factors.push((group, exponent.clone()));
                } else {
                    factors.push((Atom::Number(coeff.numer()), exponent.clone()));
                }
            }
            for (atom, e) in monomial.factors() {
                factors.push((atom.clone(), self.mul(e, exponent)?));
            }
            return self.product(factors, Rational::ONE);
        }
        self.product(
            vec![(Atom::Group(Box::new(base.clone())), exponent.clone())],
            Rational::ONE,
        )
    }

    fn modulo(&self, a: Fraction, b: Fraction) -> Result<Fraction, SymbolicError> {
        match (a.as_rational(), b.as_rational()) {
            (_, Some(d)) if d.is_zero() => Err(SymbolicError::DivisionByZero),
            (Some(n), Some(d)) => {
                let quotient = n.div(d)?;
                let floor = quotient.numer().div_euclid(quotient.denom());
                Ok(Fraction::constant(n.sub(d.mul(Rational::integer(floor))?)?))
            }
            _ => Ok(Fraction::from_atom(Atom::Mod(Box::new(a), Box::new(b)))),
        }
    }

    fn call(&self, callee: &Callee, mut args: Vec<Fraction>) -> Result<Fraction, SymbolicError> {
        let Callee::Builtin(function) = callee else {
            return Ok(Fraction::from_atom(Atom::Call(callee.clone(), args)));
        };
        let constant = args.first().and_then(Fraction::as_rational);
        let folded = match (function, constant) {
            (Function::Exp, _) if args.len() == 1 => {
                let e = Fraction::from_atom(Atom::E);
                return self.pow(&e, &args[0]);
            }
            (Function::Sqrt, _) if args.len() == 1 => {
                return self.pow_rational(&args[0], Rational::new(1, 2)?)
            }
            (Function::Log, Some(r)) if r.is_one() => Some(Rational::ZERO),
            (Function::Log, _) if args.len() == 1 => {
                if let Some((monomial, coeff)) = self.single_term_of(&args[0]) {
                    let mut factors = monomial.factors();
                    if let (true, Some((Atom::E, exponent)), None) =
                        (coeff.is_one(), factors.next(), factors.next())
                    {
                        return Ok(exponent.clone());
                    }
                }
                None
            }
            (Function::Abs, Some(r)) => Some(if r.is_negative() { r.neg()? } else { r }),
            (Function::Sgn, Some(r)) => Some(Rational::integer(match r.cmp_value(&Rational::ZERO) {
                std::cmp::Ordering::Less => -1,
                std::cmp::Ordering::Equal => 0,
                std::cmp::Ordering::Greater => 1,
            })),
            (Function::Factorial, Some(r)) if r.is_integer() && (0..=33).contains(&r.numer()) => {
                let mut acc = Rational::ONE;
                for k in 2..=r.numer() {
                    acc = acc.mul(Rational::integer(k))?;
                }
                Some(acc)
            }
            (
                Function::Sin
                | Function::Tan
                | Function::Asin
                | Function::Atan
                | Function::Sinh
                | Function::Tanh
                | Function::Asinh
                | Function::Atanh,
                Some(r),
            ) if r.is_zero() => Some(Rational::ZERO),
            (Function::Cos | Function::Cosh | Function::Sec, Some(r)) if r.is_zero() => {
                Some(Rational::ONE)
            }
            (Function::Max | Function::Min, _) => {
                let values: Option<Vec<Rational>> = args.iter().map(Fraction::as_rational).collect();
                match values {
                    Some(values) => values
                        .into_iter()
                        .reduce(|a, b| {
                            let keep_a = match function {
                                Function::Max => a.cmp_value(&b).is_ge(),
                                _ => a.cmp_value(&b).is_le(),
                            };
                            if keep_a {
                                a
                            } else {
                                b
                            }
                        }),
                    None => {
                        args.sort();
                        args.dedup();
                        None
                    }
                }
            }
            _ => None,
        };
        match folded {
            Some(value) => Ok(Fraction::constant(value)),
            None => Ok(Fraction::from_atom(Atom::Call(callee.clone(), args))),
        }
    }

    /// Single term `coeff * monomial` of a fraction with a unit denominator.
    fn single_term_of<'f>(&self, value: &'f Fraction) -> Option<(&'f Monomial, Rational)> {
        if value.den.as_rational() != Some(Rational::ONE) {
            return None;
        }
        value.num.single_term()
    }

    /// Builds `coeff * Π atom^exponent`, folding what can be folded.
    fn product(
        &self,
        factors: Vec<(Atom, Fraction)>,
        coeff: Rational,
    ) -> Result<Fraction, SymbolicError> {
        let mut merged: BTreeMap<Atom, Fraction> = BTreeMap::new();
        for (atom, exponent) in factors {
            let next = match merged.remove(&atom) {
                Some(existing) => self.add(&existing, &exponent)?,
                None => exponent,
            };
            merged.insert(atom, next);
        }
        let (monomial, factor) = self.settle(merged)?;
        let coeff = coeff.mul(factor)?;
        let mut terms = BTreeMap::new();
        if !coeff.is_zero() {
            terms.insert(monomial, coeff);
        }
        Ok(Fraction::from_poly(Poly(terms)))
    }

    /// Folds integer powers of `I`, radicals and zero exponents.
    fn settle(
        &self,
        factors: BTreeMap<Atom, Fraction>,
    ) -> Result<(Monomial, Rational), SymbolicError> {
        let mut coeff = Rational::ONE;
        let mut out: BTreeMap<Atom, Fraction> = BTreeMap::new();
        let mut extra: Vec<(Atom, Fraction)> = Vec::new();
        for (atom, exponent) in factors {
            if exponent.is_zero() {
                continue;
            }
            let constant = exponent.as_rational();
            match (&atom, constant) {
                (Atom::I, Some(r)) if r.is_integer() => match r.numer().rem_euclid(4) {
                    1 => {
                        out.insert(Atom::I, Fraction::one());
                    }
                    2 => coeff = coeff.neg()?,
                    3 => {
                        coeff = coeff.neg()?;
                        out.insert(Atom::I, Fraction::one());
                    }
                    _ => {}
                },
                (Atom::Number(base), Some(r)) => {
                    let whole = r.numer().div_euclid(r.denom());
                    let frac = r.sub(Rational::integer(whole))?;
                    coeff = coeff.mul(Rational::integer(*base).pow(whole)?)?;
                    if frac.is_zero() {
                        continue;
                    }
                    if *base == -1 {
                        if frac.denom() == 2 {
                            let doubled = frac.mul(Rational::integer(2))?;
                            extra.push((Atom::I, Fraction::constant(doubled)));
                        } else {
                            out.insert(Atom::Number(-1), Fraction::constant(frac));
                        }
                        continue;
                    }
                    let (outside, inside) = extract_radical(*base, frac.denom());
                    coeff = coeff.mul(Rational::integer(outside).pow(frac.numer())?)?;
                    if inside != 1 {
                        out.insert(Atom::Number(inside), Fraction::constant(frac));
                    }
                }
                _ => {
                    out.insert(atom, exponent);
                }
            }
        }
        for (atom, exponent) in extra {
            let (monomial, factor) = self.settle(BTreeMap::from([(atom, exponent)]))?;
            coeff = coeff.mul(factor)?;
            for (atom, exponent) in monomial.0 {
                let next = match out.remove(&atom) {
                    Some(existing) => self.add(&existing, &exponent)?,
                    None => exponent,
                };
                if !next.is_zero() {
                    out.insert(atom, next);
                }
            }
        }
        if let Some(exponent) = out.get(&Atom::I).and_then(Fraction::as_rational) {
            if exponent.is_integer() && !exponent.is_one() {
                let i_exponent = out.remove(&Atom::I).unwrap_or_else(Fraction::one);
                let (monomial, factor) = self.settle(BTreeMap::from([(Atom::I, i_exponent)]))?;
                coeff = coeff.mul(factor)?;
                out.extend(monomial.0);
            }
        }
        Ok((Monomial(out), coeff))
    }

    fn monomial_mul(&self, a: &Monomial, b: &Monomial) -> Result<(Monomial, Rational), SymbolicError> {
        if a.is_one() {
            return Ok((b.clone(), Rational::ONE));
        }
        if b.is_one() {
            return Ok((a.clone(), Rational::ONE));
        }
        let mut merged = a.0.clone();
        for (atom, exponent) in &b.0 {
            let next = match merged.remove(atom) {
                Some(existing) => self.add(&existing, exponent)?,
                None => exponent.clone(),
            };
            merged.insert(atom.clone(), next);
        }
        self.settle(merged)
    }

    fn poly_add(&self, a: &Poly, b: &Poly) -> Result<Poly, SymbolicError> {
        let mut terms = a.0.clone();
        for (monomial, coeff) in &b.0 {
            accumulate(&mut terms, monomial.clone(), *coeff)?;
        }
        self.check_size(&terms)?;
        Ok(Poly(terms))
    }

    fn poly_mul(&self, a: &Poly, b: &Poly) -> Result<Poly, SymbolicError> {
        if let Some(r) = a.as_rational() {
            return poly_scale(b, r);
        }
        if let Some(r) = b.as_rational() {
            return poly_scale(a, r);
        }
        if a.len().saturating_mul(b.len()) > self.max_terms.saturating_mul(4) {
            return Err(SymbolicError::TooManyTerms {
                limit: self.max_terms,
            });
        }
        let mut terms = BTreeMap::new();
        for (ma, ca) in &a.0 {
            self.deadline.check("expand")?;
            for (mb, cb) in &b.0 {
                let (monomial, factor) = self.monomial_mul(ma, mb)?;
                let coeff = ca.mul(*cb)?.mul(factor)?;
                accumulate(&mut terms, monomial, coeff)?;
            }
            self.check_size(&terms)?;
        }
        Ok(Poly(terms))
    }

    fn poly_pow(&self, base: &Poly, k: i128) -> Result<Poly, SymbolicError> {
        if let Some((monomial, coeff)) = base.single_term() {
            let exponent = Fraction::constant(Rational::integer(k));
            let mut factors = Vec::new();
            for (atom, e) in monomial.factors() {
                factors.push((atom.clone(), self.mul(e, &exponent)?));
            }
            return Ok(self.product(factors, coeff.pow(k)?)?.num);
        }
        if base.is_zero() {
            return Ok(Poly::zero());
        }
        if k > MAX_EXPANDED_POWER {
            return Err(SymbolicError::TooManyTerms {
                limit: self.max_terms,
            });
        }
        trace!(terms = base.len(), power = k as u64, "expanding power");
        let mut acc = Poly::constant(Rational::ONE);
        let mut square = base.clone();
        let mut exp = k;
        while exp > 0 {
            if exp & 1 == 1 {
                acc = self.poly_mul(&acc, &square)?;
            }
            exp >>= 1;
            if exp > 0 {
                square = self.poly_mul(&square, &square)?;
            }
        }
        Ok(acc)
    }

    fn normalize(&self, num: Poly, den: Poly) -> Result<Fraction, SymbolicError> {
        if den.is_zero() {
            return Err(SymbolicError::DivisionByZero);
        }
        if num.is_zero() {
            return Ok(Fraction::zero());
        }
        if let Some((monomial, coeff)) = den.single_term() {
            let mut factors = Vec::new();
            let minus_one = Fraction::constant(Rational::integer(-1));
            for (atom, e) in monomial.factors() {
                factors.push((atom.clone(), self.mul(e, &minus_one)?));
            }
            let inverse = self.product(factors, coeff.recip()?)?;
            let num = self.poly_mul(&num, &inverse.num)?;
            return Ok(Fraction::from_poly(num));
        }
        let lead = den
            .0
            .values()
            .next()
            .copied()
            .unwrap_or(Rational::ONE)
            .recip()?;
        Ok(Fraction {
            num: poly_scale(&num, lead)?,
            den: poly_scale(&den, lead)?,
        })
    }

    fn check_size(&self, terms: &BTreeMap<Monomial, Rational>) -> Result<(), SymbolicError> {
        if terms.len() > self.max_terms {
            return Err(SymbolicError::TooManyTerms {
                limit: self.max_terms,
            });
        }
        Ok(())
    }
}

fn accumulate(
    terms: &mut BTreeMap<Monomial, Rational>,
    monomial: Monomial,
    coeff: Rational,
) -> Result<(), SymbolicError> {
    let next = match terms.remove(&monomial) {
        Some(existing) => existing.add(coeff)?,
        None => coeff,
    };
    if !next.is_zero() {
        terms.insert(monomial, next);
    }
    Ok(())
}

fn poly_scale(poly: &Poly, factor: Rational) -> Result<Poly, SymbolicError> {
    if factor.is_zero() {
        return Ok(Poly::zero());
    }
    let mut terms = BTreeMap::new();
    for (monomial, coeff) in &poly.0 {
        terms.insert(monomial.clone(), coeff.mul(factor)?);
    }
    Ok(Poly(terms))
}

/// Factors of `c ** r` for a non-integer `r`, before settling.
fn rational_power(c: Rational, r: Rational) -> Result<Vec<(Atom, Fraction)>, SymbolicError> {
    let mut factors = Vec::new();
    let mut magnitude = c;
    if c.is_negative() {
        factors.push((Atom::Number(-1), Fraction::constant(r)));
        magnitude = c.neg()?;
    }
    if let Some(root) = magnitude.root(r.denom()) {
        let value = root.pow(r.numer())?;
        if !value.is_one() {
            if value.is_integer() {
                factors.push((Atom::Number(value.numer()), Fraction::one()));
            } else {
                factors.push((Atom::Number(value.numer()), Fraction::one()));
                factors.push((
                    Atom::Number(value.denom()),
                    Fraction::constant(Rational::integer(-1)),
                ));
            }
        }
        return Ok(factors);
    }
    if magnitude.numer() != 1 {
        factors.push((Atom::Number(magnitude.numer()), Fraction::constant(r)));
    }
    if magnitude.denom() != 1 {
        factors.push((Atom::Number(magnitude.denom()), Fraction::constant(r.neg()?)));
    }
    Ok(factors)
}

/// Splits `base` into `outside^q * inside` with small perfect powers pulled out.
fn extract_radical(base: i128, q: i128) -> (i128, i128) {
    let mut outside: i128 = 1;
    let mut inside = base;
    if q > 16 {
        return (outside, inside);
    }
    let mut k: i128 = 2;
    while k <= 1000 {
        let Some(power) = k.checked_pow(q as u32) else {
            break;
        };
        if power > inside {
            break;
        }
        if inside % power == 0 {
            inside /= power;
            outside = match outside.checked_mul(k) {
                Some(v) => v,
                None => return (1, base),
            };
        } else {
            k += 1;
        }
    }
    (outside, inside)
}

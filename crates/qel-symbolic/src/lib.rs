#![deny(missing_docs)]
#![doc = "Exact canonical forms, equivalence checking and limits at infinity over QEL expressions."]

pub mod canonical;
pub mod equivalence;
pub mod error;
pub mod eval;
pub mod limit;
pub mod rational;

pub use canonical::{Atom, Canonicalizer, Fraction, Monomial, Poly, MAX_DEPTH};
pub use equivalence::{compare, equivalent, is_zero, Equivalence, EquivalenceOptions};
pub use error::{SymbolicError, DIVISION_BY_ZERO_MESSAGE};
pub use eval::{evaluate, gamma, substitute, Env};
pub use limit::{eventual_sign, limit_at_infinity, Limit, LimitEngine, Series};
pub use rational::Rational;

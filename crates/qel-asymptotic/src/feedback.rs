//! Learner feedback strings.

/// Textually or structurally identical to the reference.
pub const CORRECT_ANSWER: &str = "Correct!";
/// Equivalent to the reference, but written differently.
pub const CORRECT_COMPLEX: &str = "Correct! Note that your expression may be unnecessarily complex.";
/// Eventually negative submissions.
pub const NEGATIVE: &str = "Your expression is negative.";
/// Wrong order of growth.
pub const INCORRECT: &str = "Your answer is incorrect.";
/// A valid but weaker bound.
pub const TOO_LOOSE: &str = "Your answer is correct, but too loose.";
/// Right order, with extra lower order terms.
pub const LOWER_ORDER: &str = "Your answer is correct, but has unnecessary lower order terms.";
/// Right order, with a constant factor.
pub const CONSTANT_FACTORS: &str = "Your answer is correct, but has unnecessary constant factors.";
/// The limit engine gave up.
pub const DID_NOT_CONVERGE: &str = "Your answer did not converge, try a simpler expression.";

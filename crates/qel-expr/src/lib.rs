#![deny(missing_docs)]
#![doc = "Two-pass parsing of learner math: a permissive general parse followed by a whitelist walk into an exact expression tree."]

pub mod diagnostics;
pub mod error;
pub mod expr;
pub mod normalize;
pub mod options;
pub mod syntax;
pub mod walker;

pub use diagnostics::{describe, point_to_error};
pub use error::ExprError;
pub use expr::{Arity, Callee, Constant, Expr, Function};
pub use options::{ParseOptions, DEFAULT_MAX_LENGTH};
pub use syntax::{MAX_NESTING, MAX_RECURSION, MAX_TREE_DEPTH};

use tracing::debug;

/// Parses learner text into a whitelisted expression.
#[tracing::instrument(level = "debug", skip(text, options), fields(len = text.len()))]
pub fn parse(text: &str, options: &ParseOptions) -> Result<Expr, ExprError> {
    options.validate()?;
    if text.chars().count() > options.max_length {
        return Err(ExprError::TooLong {
            limit: options.max_length,
        });
    }
    let normalized = normalize::normalize(text);
    normalize::check_characters(&normalized)?;
    let tree = syntax::parse_syntax(&normalized)?;
    let expr = walker::walk(&tree, options)?;
    debug!(size = expr.size(), "expression accepted");
    Ok(expr)
}

/// Learner message for `text`, or `None` when it parses.
pub fn validate(text: &str, options: &ParseOptions) -> Option<String> {
    parse(text, options).err().map(|err| describe(&err, text))
}

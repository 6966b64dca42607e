//! What a submission is allowed to mention.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ExprError;
use crate::expr::Function;

/// Default maximum accepted text length, in characters.
pub const DEFAULT_MAX_LENGTH: usize = 1000;

/// Names the walker resolves and features it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Declared variable names.
    #[serde(default)]
    pub variables: BTreeSet<String>,
    /// Declared opaque function names.
    #[serde(default)]
    pub custom_functions: BTreeSet<String>,
    /// Accept floats, imaginary literals and `i`/`j` as the imaginary unit.
    #[serde(default)]
    pub allow_complex: bool,
    /// Accept trigonometric and hyperbolic functions.
    #[serde(default = "default_true")]
    pub allow_trig: bool,
    /// Accept the internal spellings of constants (`_Pi`, `_Exp1`, `_ImaginaryUnit`).
    #[serde(default)]
    pub allow_hidden: bool,
    /// Maximum text length.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            variables: BTreeSet::new(),
            custom_functions: BTreeSet::new(),
            allow_complex: false,
            allow_trig: true,
            allow_hidden: false,
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl ParseOptions {
    /// Options declaring `variables`.
    pub fn with_variables<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: variables.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Adds declared opaque functions.
    pub fn functions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.custom_functions
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Sets `allow_complex`.
    pub fn complex(mut self, allow: bool) -> Self {
        self.allow_complex = allow;
        self
    }

    /// Sets `allow_trig`.
    pub fn trig(mut self, allow: bool) -> Self {
        self.allow_trig = allow;
        self
    }

    /// Sets `allow_hidden`.
    pub fn hidden(mut self, allow: bool) -> Self {
        self.allow_hidden = allow;
        self
    }

    /// Sets `max_length`.
    pub fn max_length(mut self, limit: usize) -> Self {
        self.max_length = limit;
        self
    }

    /// Whether `name` is declared as a variable.
    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.contains(name)
    }

    /// Built-in function `name` resolves to under these options.
    pub fn builtin(&self, name: &str) -> Option<Function> {
        let function = Function::from_str(name).ok()?;
        if function.is_trig() && !self.allow_trig {
            return None;
        }
        Some(function)
    }

    /// Rejects declarations that shadow constants or functions.
    pub fn validate(&self) -> Result<(), ExprError> {
        let mut reserved: BTreeSet<String> = ["pi", "e", "infty"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if self.allow_complex {
            reserved.insert("i".into());
            reserved.insert("j".into());
        }
        reserved.extend(Function::spellings());
        for name in self.variables.iter().chain(self.custom_functions.iter()) {
            if reserved.contains(name) {
                return Err(ExprError::HasConflictingVariable { name: name.clone() });
            }
        }
        if let Some(name) = self
            .variables
            .iter()
            .find(|name| self.custom_functions.contains(*name))
        {
            return Err(ExprError::HasConflictingVariable { name: name.clone() });
        }
        Ok(())
    }
}

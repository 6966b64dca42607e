//! Element attribute surface with typed getters.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::QuestionData;
use crate::errors::QelError;

/// Attributes authored on one element instance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Attributes {
    /// Element tag, e.g. `pl-units-input`.
    pub tag: String,
    /// Attribute values as authored.
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl Attributes {
    /// Creates an empty attribute set for `tag`.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            values: BTreeMap::new(),
        }
    }

    /// Builder style insertion.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Rejects missing required attributes and unknown attributes.
    pub fn check(&self, required: &[&str], optional: &[&str]) -> Result<(), QelError> {
        for key in required {
            if !self.has(key) {
                return Err(attrib_error(
                    "missing-attribute",
                    format!("Required attribute \"{key}\" missing"),
                    &self.tag,
                    key,
                ));
            }
        }
        for key in self.values.keys() {
            if !required.contains(&key.as_str()) && !optional.contains(&key.as_str()) {
                return Err(attrib_error(
                    "unknown-attribute",
                    format!("Unknown attribute \"{key}\""),
                    &self.tag,
                    key,
                ));
            }
        }
        Ok(())
    }

    /// Required string attribute.
    pub fn string(&self, key: &str) -> Result<&str, QelError> {
        self.values.get(key).map(String::as_str).ok_or_else(|| {
            attrib_error(
                "missing-attribute",
                format!("Required attribute \"{key}\" missing"),
                &self.tag,
                key,
            )
        })
    }

    /// Optional string attribute.
    pub fn string_or(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Integer attribute with a default.
    pub fn integer(&self, key: &str, default: i64) -> Result<i64, QelError> {
        self.parsed(key, "integer").map(|value| value.unwrap_or(default))
    }

    /// Optional integer attribute.
    pub fn integer_opt(&self, key: &str) -> Result<Option<i64>, QelError> {
        self.parsed(key, "integer")
    }

    /// Float attribute with a default.
    pub fn float(&self, key: &str, default: f64) -> Result<f64, QelError> {
        self.parsed(key, "float").map(|value| value.unwrap_or(default))
    }

    /// Optional float attribute.
    pub fn float_opt(&self, key: &str) -> Result<Option<f64>, QelError> {
        self.parsed(key, "float")
    }

    /// Boolean attribute with a default.
    pub fn boolean(&self, key: &str, default: bool) -> Result<bool, QelError> {
        let Some(raw) = self.values.get(key) else {
            return Ok(default);
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" | "on" => Ok(true),
            "false" | "f" | "0" | "no" | "n" | "off" => Ok(false),
            _ => Err(attrib_error(
                "invalid-attribute",
                format!("Attribute \"{key}\" must be a boolean value: {raw}"),
                &self.tag,
                key,
            )),
        }
    }

    /// Enumerated attribute parsed through `FromStr` (strum derives).
    pub fn enumerated<T: FromStr>(&self, key: &str, default: T) -> Result<T, QelError> {
        let Some(raw) = self.values.get(key) else {
            return Ok(default);
        };
        raw.trim().parse::<T>().map_err(|_| {
            attrib_error(
                "invalid-attribute",
                format!("Attribute \"{key}\" has an unsupported value: {raw}"),
                &self.tag,
                key,
            )
        })
    }

    /// Weight attribute, which must be a non-negative integer.
    pub fn weight(&self) -> Result<u32, QelError> {
        let weight = self.integer("weight", 1)?;
        u32::try_from(weight).map_err(|_| {
            attrib_error(
                "invalid-attribute",
                format!("Attribute \"weight\" must be non-negative, not {weight}"),
                &self.tag,
                "weight",
            )
        })
    }

    fn parsed<T: FromStr>(&self, key: &str, kind: &str) -> Result<Option<T>, QelError> {
        match self.values.get(key) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
                attrib_error(
                    "invalid-attribute",
                    format!("Attribute \"{key}\" must be a {kind}: {raw}"),
                    &self.tag,
                    key,
                )
            }),
        }
    }
}

/// Rejects an answer name that another element already registered.
pub fn check_answers_names(data: &mut QuestionData, name: &str) -> Result<(), QelError> {
    let registry = data
        .params
        .entry("_required_answers_names".to_string())
        .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
    let serde_json::Value::Object(names) = registry else {
        return Err(QelError::internal(
            "answers-registry",
            "answer name registry is not an object",
        ));
    };
    if names.contains_key(name) {
        return Err(QelError::authoring(
            "duplicate-answers-name",
            format!("Duplicate answers-name attribute: \"{name}\""),
        )
        .with_context("answers-name", name));
    }
    names.insert(name.to_string(), serde_json::Value::Bool(true));
    Ok(())
}

fn attrib_error(code: &str, message: String, tag: &str, key: &str) -> QelError {
    QelError::authoring(code, message)
        .with_context("element", tag)
        .with_context("attribute", key)
}

//! Two-dimensional numeric literals in the semicolon and bracketed-rows
//! dialects.

use num_complex::Complex64;
use qel_core::QelError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use strum::{Display, EnumString};
use thiserror::Error;
use tracing::trace;

use crate::number::{format_number, squeeze_signs, string_to_number, Number};

/// Written form of a matrix.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Dialect {
    /// `[a b; c d]`.
    Matlab,
    /// `[[a, b], [c, d]]`.
    #[default]
    Python,
}

/// Rectangular, non-empty matrix of finite entries.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    rows: usize,
    cols: usize,
    entries: Vec<Number>,
}

impl NumericArray {
    /// Builds a matrix from rows of entries.
    pub fn from_rows(rows: Vec<Vec<Number>>) -> Result<Self, ArrayError> {
        let cols = rows.first().map(Vec::len).ok_or(ArrayError::NoRows)?;
        let height = rows.len();
        let mut entries = Vec::with_capacity(height * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.is_empty() {
                return Err(ArrayError::NoColumns { row: i + 1 });
            }
            if row.len() != cols {
                return Err(ArrayError::ColumnMismatch { row: i + 1 });
            }
            for (j, entry) in row.into_iter().enumerate() {
                if !entry.is_finite() {
                    return Err(ArrayError::NonFiniteEntry {
                        row: i + 1,
                        column: j + 1,
                    });
                }
                entries.push(entry);
            }
        }
        Ok(Self {
            rows: height,
            cols,
            entries,
        })
    }

    /// Single entry matrix.
    pub fn scalar(value: Number) -> Self {
        Self {
            rows: 1,
            cols: 1,
            entries: vec![value],
        }
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Entry at zero-based `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Option<Number> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.entries.get(row * self.cols + col).copied()
    }

    /// Entries in row-major order as complex values.
    pub fn iter(&self) -> impl Iterator<Item = Complex64> + '_ {
        self.entries.iter().map(|entry| entry.to_complex())
    }

    /// Whether any entry is complex.
    pub fn is_complex(&self) -> bool {
        self.entries
            .iter()
            .any(|entry| matches!(entry, Number::Complex(_)))
    }

    fn row(&self, row: usize) -> &[Number] {
        &self.entries[row * self.cols..(row + 1) * self.cols]
    }

    /// JSON form stored in submitted answers: nested lists, or a tagged
    /// object with separate real and imaginary parts.
    pub fn to_json(&self) -> Value {
        let part = |f: fn(Complex64) -> f64| -> Value {
            (0..self.rows)
                .map(|i| {
                    self.row(i)
                        .iter()
                        .map(|entry| json!(f(entry.to_complex())))
                        .collect::<Vec<_>>()
                })
                .collect::<Vec<_>>()
                .into()
        };
        if !self.is_complex() {
            return part(|z| z.re);
        }
        json!({
            "_type": "complex_ndarray",
            "_value": { "real": part(|z| z.re), "imag": part(|z| z.im) },
        })
    }

    /// Inverse of [`NumericArray::to_json`].
    pub fn from_json(value: &Value) -> Option<Self> {
        fn grid(value: &Value) -> Option<Vec<Vec<f64>>> {
            value
                .as_array()?
                .iter()
                .map(|row| row.as_array()?.iter().map(Value::as_f64).collect())
                .collect()
        }
        if let Some(real) = grid(value) {
            let rows = real
                .into_iter()
                .map(|row| row.into_iter().map(Number::Real).collect())
                .collect();
            return Self::from_rows(rows).ok();
        }
        if value.get("_type")?.as_str()? != "complex_ndarray" {
            return None;
        }
        let inner = value.get("_value")?;
        let real = grid(inner.get("real")?)?;
        let imag = grid(inner.get("imag")?)?;
        if real.len() != imag.len() {
            return None;
        }
        let rows = real
            .into_iter()
            .zip(imag)
            .map(|(re, im)| {
                (re.len() == im.len()).then(|| {
                    re.into_iter()
                        .zip(im)
                        .map(|(re, im)| Number::Complex(Complex64::new(re, im)))
                        .collect()
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Self::from_rows(rows).ok()
    }
}

/// Why a matrix submission was rejected. Rows and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArrayError {
    /// `[` and `]` counts differ.
    #[error("Unbalanced square brackets.")]
    UnbalancedBrackets,
    /// Text precedes the outer brackets.
    #[error("Non-empty text \"{text}\" before outer brackets.")]
    TextBeforeBrackets {
        /// Offending text.
        text: String,
    },
    /// Text follows the outer brackets.
    #[error("Non-empty text \"{text}\" after outer brackets.")]
    TextAfterBrackets {
        /// Offending text.
        text: String,
    },
    /// The brackets are empty.
    #[error("The matrix has no rows.")]
    NoRows,
    /// A row is empty.
    #[error("Row {row} of the matrix has no columns.")]
    NoColumns {
        /// Row index.
        row: usize,
    },
    /// A row differs in length from the first.
    #[error("Rows 1 and {row} of the matrix have a different number of columns.")]
    ColumnMismatch {
        /// Row index.
        row: usize,
    },
    /// An entry is not a number.
    #[error("Entry \"{text}\" at location (row={row}, column={column}) in the matrix has an invalid format.")]
    InvalidEntry {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
        /// Entry text.
        text: String,
    },
    /// An entry is infinite or NaN.
    #[error("Entry at location (row={row}, column={column}) in the matrix is not a finite number.")]
    NonFiniteEntry {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },
    /// Two delimiters with nothing between them.
    #[error("Entry at location (row={row}, column={column}) in the matrix is empty.")]
    EmptyEntry {
        /// Row index.
        row: usize,
        /// Column index.
        column: usize,
    },
    /// `;` used in the bracketed-rows dialect.
    #[error("Semicolons cannot be used as delimiters in an expression with nested brackets.")]
    SemicolonInNested,
    /// Brackets nested deeper than two levels, or unclosed.
    #[error("Improperly nested brackets in row {row} of the matrix.")]
    ImproperNesting {
        /// Row index.
        row: usize,
    },
    /// Two rows without a comma between them.
    #[error("No comma after row {row} of the matrix.")]
    MissingComma {
        /// Row index.
        row: usize,
    },
    /// Text before a row's left bracket.
    #[error("Non-empty text \"{text}\" before the left bracket in row {row} of the matrix.")]
    TextBeforeRow {
        /// Row index.
        row: usize,
        /// Offending text.
        text: String,
    },
    /// Text after a row's right bracket.
    #[error("Non-empty text \"{text}\" after the right bracket in row {row} of the matrix.")]
    TextAfterRow {
        /// Row index.
        row: usize,
        /// Offending text.
        text: String,
    },
    /// No brackets and not a number.
    #[error("Invalid format (missing square brackets and could not be interpreted as a double-precision floating-point number{}).", or_complex(*.complex))]
    InvalidScalar {
        /// Whether complex input was allowed.
        complex: bool,
    },
}

fn or_complex(complex: bool) -> &'static str {
    if complex {
        " or as a double-precision complex number"
    } else {
        ""
    }
}

impl From<ArrayError> for QelError {
    fn from(err: ArrayError) -> Self {
        QelError::format("invalid-array", err.to_string())
    }
}

/// Parses a matrix literal and reports which dialect it was written in.
///
/// Text without brackets is read as a 1×1 matrix. One bracket pair selects
/// the semicolon dialect; nested brackets select bracketed rows.
pub fn parse_array(text: &str, allow_complex: bool) -> Result<(NumericArray, Dialect), ArrayError> {
    let mut text = text.replace('\u{2212}', "-");
    if allow_complex {
        text = text.replace('i', "j");
    }
    let opens = text.matches('[').count();
    if opens != text.matches(']').count() {
        return Err(ArrayError::UnbalancedBrackets);
    }
    if opens == 0 {
        let value = string_to_number(&text, allow_complex)
            .filter(|value| value.is_finite())
            .ok_or(ArrayError::InvalidScalar {
                complex: allow_complex,
            })?;
        return Ok((NumericArray::scalar(value), Dialect::Python));
    }
    let (Some(first), Some(last)) = (text.find('['), text.rfind(']')) else {
        return Err(ArrayError::UnbalancedBrackets);
    };
    if last < first {
        return Err(ArrayError::UnbalancedBrackets);
    }
    let before = text[..first].trim();
    if !before.is_empty() {
        return Err(ArrayError::TextBeforeBrackets {
            text: before.to_string(),
        });
    }
    let after = text[last + 1..].trim();
    if !after.is_empty() {
        return Err(ArrayError::TextAfterBrackets {
            text: after.to_string(),
        });
    }
    let body = &text[first + 1..last];
    trace!(opens, "parsing matrix literal");
    if opens == 1 {
        Ok((matlab_rows(body, allow_complex)?, Dialect::Matlab))
    } else {
        Ok((python_rows(body, allow_complex)?, Dialect::Python))
    }
}

fn entry(token: &str, row: usize, column: usize, allow_complex: bool) -> Result<Number, ArrayError> {
    if token.trim().is_empty() {
        return Err(ArrayError::EmptyEntry { row, column });
    }
    let value = string_to_number(token, allow_complex).ok_or_else(|| ArrayError::InvalidEntry {
        row,
        column,
        text: token.trim().to_string(),
    })?;
    if !value.is_finite() {
        return Err(ArrayError::NonFiniteEntry { row, column });
    }
    Ok(value)
}

/// Splits on runs of whitespace holding at most one comma.
fn split_entries(row: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut chars = row.char_indices().peekable();
    let mut start = 0;
    while let Some((idx, ch)) = chars.next() {
        if !(ch.is_whitespace() || ch == ',') {
            continue;
        }
        tokens.push(&row[start..idx]);
        let mut end = idx + ch.len_utf8();
        let mut comma = ch == ',';
        while let Some(&(next_idx, next)) = chars.peek() {
            if next.is_whitespace() || (next == ',' && !comma) {
                comma |= next == ',';
                end = next_idx + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        start = end;
    }
    tokens.push(&row[start..]);
    if tokens.first().is_some_and(|t| t.is_empty()) {
        tokens.remove(0);
    }
    if tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

fn matlab_rows(body: &str, allow_complex: bool) -> Result<NumericArray, ArrayError> {
    if body.trim().is_empty() {
        return Err(ArrayError::NoRows);
    }
    let mut rows = Vec::new();
    let mut width = None;
    for (i, text) in body.split(';').enumerate() {
        let row = i + 1;
        let tokens = split_entries(text);
        if tokens.is_empty() {
            return Err(ArrayError::NoColumns { row });
        }
        if *width.get_or_insert(tokens.len()) != tokens.len() {
            return Err(ArrayError::ColumnMismatch { row });
        }
        rows.push(
            tokens
                .iter()
                .enumerate()
                .map(|(j, token)| entry(token, row, j + 1, allow_complex))
                .collect::<Result<Vec<_>, _>>()?,
        );
    }
    NumericArray::from_rows(rows)
}

fn python_rows(body: &str, allow_complex: bool) -> Result<NumericArray, ArrayError> {
    let body = squeeze_signs(body);
    if body.contains(';') {
        return Err(ArrayError::SemicolonInNested);
    }
    let mut rows = Vec::new();
    let mut width = None;
    let mut rest = body.as_str();
    loop {
        let row = rows.len() + 1;
        let Some(open) = rest.find('[') else {
            let text = rest.trim();
            return Err(if text.is_empty() {
                ArrayError::NoRows
            } else {
                ArrayError::TextBeforeRow {
                    row,
                    text: text.to_string(),
                }
            });
        };
        let before = rest[..open].trim();
        if !before.is_empty() {
            return Err(ArrayError::TextBeforeRow {
                row,
                text: before.to_string(),
            });
        }
        let inside = &rest[open + 1..];
        let close = inside.find(']').ok_or(ArrayError::ImproperNesting { row })?;
        let content = &inside[..close];
        if content.contains('[') {
            return Err(ArrayError::ImproperNesting { row });
        }
        if content.trim().is_empty() {
            return Err(ArrayError::NoColumns { row });
        }
        let tokens: Vec<&str> = content.split(',').collect();
        if *width.get_or_insert(tokens.len()) != tokens.len() {
            return Err(ArrayError::ColumnMismatch { row });
        }
        rows.push(
            tokens
                .iter()
                .enumerate()
                .map(|(j, token)| entry(token, row, j + 1, allow_complex))
                .collect::<Result<Vec<_>, _>>()?,
        );
        let tail = inside[close + 1..].trim_start();
        if tail.is_empty() {
            break;
        }
        match tail.strip_prefix(',') {
            Some(next) if next.trim().is_empty() => break,
            Some(next) => rest = next,
            None if tail.contains('[') => return Err(ArrayError::MissingComma { row }),
            None => {
                return Err(ArrayError::TextAfterRow {
                    row,
                    text: tail.trim().to_string(),
                })
            }
        }
    }
    NumericArray::from_rows(rows)
}

/// Formats a matrix in `dialect`. With `digits` unset every entry prints in
/// shortest round-trip form, so [`parse_array`] recovers the same matrix.
pub fn format_array(array: &NumericArray, dialect: Dialect, digits: Option<usize>) -> String {
    let rows = (0..array.rows).map(|i| {
        array
            .row(i)
            .iter()
            .map(|entry| format_number(*entry, digits))
            .collect::<Vec<_>>()
    });
    match dialect {
        Dialect::Matlab => {
            let rows: Vec<String> = rows.map(|row| row.join(" ")).collect();
            format!("[{}]", rows.join("; "))
        }
        Dialect::Python => {
            let rows: Vec<String> = rows.map(|row| format!("[{}]", row.join(", "))).collect();
            format!("[{}]", rows.join(", "))
        }
    }
}

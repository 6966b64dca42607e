#![deny(missing_docs)]
#![doc = "Scalar, fraction, integer-in-base and 2-D array parsing with tolerance comparisons."]

pub mod array;
pub mod integer;
pub mod number;
pub mod tolerance;

pub use array::{format_array, parse_array, ArrayError, Dialect, NumericArray};
pub use integer::{format_integer, parse_integer, IntegerError};
pub use number::{
    format_number, string_fraction_to_number, string_to_number, Number, NumberError,
};
pub use tolerance::{
    is_close_decdig, is_close_relabs, is_close_sigfig, Comparison, ComparisonKind, DEFAULT_ATOL,
    DEFAULT_DIGITS, DEFAULT_RTOL,
};

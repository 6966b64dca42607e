use qel_core::QelError;
use qel_numeric::{format_integer, parse_integer, IntegerError};

#[test]
fn hex_reference_accepts_prefixed_submission() {
    let reference = parse_integer("ff", 16).unwrap();
    assert_eq!(reference, 255);
    assert_eq!(parse_integer("0xFF", 16).unwrap(), reference);
    assert_ne!(parse_integer("256", 16).unwrap(), reference);
    let err = parse_integer("3.4", 16).unwrap_err();
    assert_eq!(
        err,
        IntegerError::InvalidDigit {
            offset: 1,
            ch: '.',
            base: 16
        }
    );
    let err: QelError = err.into();
    assert!(matches!(err, QelError::Format(_)));
}

#[test]
fn base_zero_detects_prefixes() {
    assert_eq!(parse_integer("0b101", 0).unwrap(), 5);
    assert_eq!(parse_integer("0O17", 0).unwrap(), 15);
    assert_eq!(parse_integer("-0x_ff", 0).unwrap(), -255);
    assert_eq!(parse_integer("42", 0).unwrap(), 42);
    assert_eq!(parse_integer("0", 0).unwrap(), 0);
    assert_eq!(parse_integer("00", 0).unwrap(), 0);
    assert!(matches!(
        parse_integer("012", 0),
        Err(IntegerError::InvalidDigit { offset: 0, .. })
    ));
}

#[test]
fn prefix_only_counts_for_its_own_base() {
    assert_eq!(parse_integer("0b1", 16).unwrap(), 0xb1);
    assert!(parse_integer("0x10", 10).is_err());
}

#[test]
fn normalizes_whitespace_minus_and_full_width_digits() {
    assert_eq!(parse_integer("  \u{2212}42 ", 10).unwrap(), -42);
    assert_eq!(parse_integer("\u{ff11}\u{ff12}\u{ff13}", 10).unwrap(), 123);
    assert_eq!(parse_integer("\u{ff26}\u{ff26}", 16).unwrap(), 255);
}

#[test]
fn underscores_only_between_digits() {
    assert_eq!(parse_integer("1_000", 10).unwrap(), 1000);
    assert!(parse_integer("_1", 10).is_err());
    assert!(parse_integer("1_", 10).is_err());
    assert!(parse_integer("1__0", 10).is_err());
}

#[test]
fn empty_overflow_and_bad_base() {
    assert_eq!(parse_integer("  ", 10).unwrap_err(), IntegerError::Empty);
    assert_eq!(parse_integer("-", 10).unwrap_err(), IntegerError::Empty);
    assert_eq!(parse_integer("0x", 0).unwrap_err(), IntegerError::Empty);
    assert_eq!(
        parse_integer(&"9".repeat(40), 10).unwrap_err(),
        IntegerError::Overflow
    );
    assert_eq!(
        parse_integer("-170141183460469231731687303715884105728", 10).unwrap(),
        i128::MIN
    );
    let err = parse_integer("10", 37).unwrap_err();
    assert_eq!(err, IntegerError::InvalidBase { base: 37 });
    let err: QelError = err.into();
    assert!(matches!(err, QelError::Authoring(ref info) if info.code == "invalid-base"));
}

#[test]
fn formats_lowercase() {
    assert_eq!(format_integer(255, 16).unwrap(), "ff");
    assert_eq!(format_integer(-10, 2).unwrap(), "-1010");
    assert_eq!(format_integer(0, 36).unwrap(), "0");
    assert_eq!(format_integer(35, 0).unwrap(), "35");
    assert!(format_integer(1, 1).is_err());
}

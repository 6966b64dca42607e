use std::time::Duration;

use qel_core::{Deadline, QelError};

#[test]
fn unbounded_deadline_never_expires() {
    let deadline = Deadline::unbounded();
    assert!(!deadline.expired());
    assert!(deadline.check("loop").is_ok());
    assert!(deadline.remaining().is_none());
}

#[test]
fn zero_budget_expires_immediately() {
    let deadline = Deadline::after(Duration::ZERO);
    assert!(deadline.expired());
    let err = deadline.check("limit").unwrap_err();
    assert!(matches!(err, QelError::Timeout(ref info) if info.context["stage"] == "limit"));
    assert_eq!(deadline.remaining(), Some(Duration::ZERO));
}

#[test]
fn generous_budget_is_open() {
    let deadline = Deadline::after(Duration::from_secs(60));
    assert!(deadline.check("parse").is_ok());
}

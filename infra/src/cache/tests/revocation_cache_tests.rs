use std::time::Duration;

use crate::cache::revocation_cache::expiry_seconds;

#[test]
fn test_expiry_rounds_up_to_whole_seconds() {
    assert_eq!(expiry_seconds(Duration::from_secs(900)), 900);
    assert_eq!(expiry_seconds(Duration::from_millis(899_001)), 900);
    assert_eq!(expiry_seconds(Duration::from_nanos(1)), 1);
}

#[test]
fn test_expiry_is_never_zero() {
    assert_eq!(expiry_seconds(Duration::ZERO), 1);
}

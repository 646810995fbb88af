// GitHub login rules: 1-39 chars, ASCII alphanumerics and hyphens,
// no hyphen at either end.

use crate::{Error, Result};
use tracing::warn;

pub const USERNAME_MIN_LENGTH: usize = 1;
pub const USERNAME_MAX_LENGTH: usize = 39;

pub fn is_valid_username(username: &str) -> bool {
    let len = username.len();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&len) {
        return false;
    }

    if username.starts_with('-') || username.ends_with('-') {
        return false;
    }

    username
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// Reject a malformed username before it reaches any URL
pub fn validate_username(username: &str) -> Result<()> {
    if is_valid_username(username) {
        Ok(())
    } else {
        warn!(event = "INVALID_USERNAME", "Invalid username attempted: {:?}", username);
        Err(Error::InvalidUsername(username.to_string()))
    }
}

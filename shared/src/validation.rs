//! Input validation functions
//!
//! Handles are used verbatim in URL paths and as unique keys, so they are
//! restricted to a conservative character set.

/// Maximum length of a user name
pub const MAX_USER_NAME_LEN: usize = 64;

/// Maximum length of a post URL handle
pub const MAX_URL_HANDLE_LEN: usize = 128;

fn is_handle_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')
}

fn validate_handle(value: &str, what: &str, max_len: usize) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} cannot be empty", what));
    }
    if value.len() > max_len {
        return Err(format!("{} must be at most {} characters", what, max_len));
    }
    if !value.chars().all(is_handle_char) {
        return Err(format!(
            "{} may only contain letters, digits, '-', '_' and '.'",
            what
        ));
    }
    Ok(())
}

/// Validate a user name
pub fn validate_user_name(user_name: &str) -> Result<(), String> {
    validate_handle(user_name, "User name", MAX_USER_NAME_LEN)
}

/// Validate a post URL handle
pub fn validate_url_handle(handle: &str) -> Result<(), String> {
    validate_handle(handle, "URL handle", MAX_URL_HANDLE_LEN)
}

/// Validate a password before hashing
///
/// Only emptiness is checked here. The upper bound belongs to the hashing
/// primitive, which rejects oversized input itself.
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password cannot be empty".to_string());
    }
    Ok(())
}

//! Shape checks applied before anything reaches the store.
//!
//! Each function returns the normalized value on success so callers persist
//! exactly what was validated.

use super::error::DomainError;

const MAX_NAME_LEN: usize = 120;
const MIN_PHONE_DIGITS: usize = 8;
const MAX_PHONE_DIGITS: usize = 9;

pub fn name(value: &str, field: &'static str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(DomainError::validation(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Brazilian area codes are two digits in the range 11..=99.
pub fn ddd(value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    let valid = bytes.len() == 2
        && bytes.iter().all(u8::is_ascii_digit)
        && bytes[0] != b'0';
    if !valid {
        return Err(DomainError::validation(
            "ddd must be a two-digit area code between 11 and 99",
        ));
    }
    Ok(trimmed.to_string())
}

pub fn email(value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    let valid = match trimmed.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation("email must be a valid address"));
    }
    Ok(trimmed.to_string())
}

/// Accepts local numbers such as `36364141` or `4141-3338`.
pub fn phone(value: &str) -> Result<String, DomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit() || c == '-') {
        return Err(DomainError::validation(
            "phone may only contain digits and hyphens",
        ));
    }
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits) {
        return Err(DomainError::validation(format!(
            "phone must contain between {MIN_PHONE_DIGITS} and {MAX_PHONE_DIGITS} digits"
        )));
    }
    Ok(trimmed.to_string())
}

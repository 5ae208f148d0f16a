//! Input checks run by handlers before anything reaches a service.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::AppError;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const MAX_PASSWORD_LEN: usize = 255;
pub const MAX_DESCRIPTION_LEN: usize = 1000;
pub const MAX_RECEIVER_LEN: usize = 255;

const RESERVED_CATEGORY_NAMES: &[&str] = &["system", "admin", "default", "temp", "temporary"];

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref CATEGORY_NAME_RE: Regex = Regex::new(r"^[\p{L}\p{N}\s_-]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(AppError::validation("Email cannot exceed 255 characters"));
    }
    if !is_valid_email(email) {
        return Err(AppError::validation("Invalid email format"));
    }
    Ok(())
}

pub fn validate_person_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("Name cannot exceed 100 characters"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&len) {
        return Err(AppError::validation(
            "Password must be between 6 and 255 characters",
        ));
    }
    Ok(())
}

pub fn validate_category_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("Category name is required"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(AppError::validation("Category name cannot exceed 100 characters"));
    }
    if !CATEGORY_NAME_RE.is_match(trimmed) {
        return Err(AppError::validation(
            "Category name can only contain letters, numbers, spaces, hyphens and underscores",
        ));
    }
    if RESERVED_CATEGORY_NAMES
        .iter()
        .any(|r| trimmed.eq_ignore_ascii_case(r))
    {
        return Err(AppError::validation(format!(
            "Category name '{trimmed}' is reserved"
        )));
    }
    Ok(())
}

pub fn validate_description(description: &str) -> Result<(), AppError> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(AppError::validation("Description cannot exceed 1000 characters"));
    }
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<(), AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::validation("Amount must be a non-negative number"));
    }
    Ok(())
}

pub fn validate_receiver(receiver: &str) -> Result<(), AppError> {
    if receiver.trim().is_empty() {
        return Err(AppError::validation("Receiver is required"));
    }
    if receiver.chars().count() > MAX_RECEIVER_LEN {
        return Err(AppError::validation("Receiver cannot exceed 255 characters"));
    }
    Ok(())
}

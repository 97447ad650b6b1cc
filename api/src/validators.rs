//! Field validators for form input
//!
//! Each returns `Err(message)` with a user-facing message; callers attach it
//! to a field through [`pipeline::ValidationBuilder::check`].

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Loose e-mail shape: something@domain.tld
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    static ref URL_REGEX: Regex = Regex::new(
        r"^https?://[^\s/$.?#].[^\s]*$"
    ).unwrap();

    /// HTML tag detection pattern
    static ref HTML_TAG_REGEX: Regex = Regex::new(r"<[^>]+>").unwrap();

    /// Script/event handler pattern for XSS detection
    static ref XSS_PATTERN_REGEX: Regex = Regex::new(
        r"(?i)(javascript:|on\w+\s*=|<script|<iframe|<object|<embed)"
    ).unwrap();
}

/// Validate that a string is not empty after trimming
pub fn validate_required(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field_name));
    }
    Ok(())
}

/// Validate string length within bounds
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), String> {
    let len = value.chars().count();
    if len < min {
        return Err(format!("must be at least {} characters", min));
    }
    if len > max {
        return Err(format!("must be at most {} characters", max));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), String> {
    if !EMAIL_REGEX.is_match(value.trim()) {
        return Err("must be a valid e-mail address".to_string());
    }
    Ok(())
}

/// Validate URL format; empty means "not given"
pub fn validate_url(url: &str) -> Result<(), String> {
    let trimmed = url.trim();

    if trimmed.is_empty() {
        return Ok(());
    }

    if !URL_REGEX.is_match(trimmed) {
        return Err("must be a valid URL (starting with http:// or https://)".to_string());
    }

    Ok(())
}

/// Validate that a string contains no HTML tags
pub fn validate_no_html(value: &str) -> Result<(), String> {
    if HTML_TAG_REGEX.is_match(value) {
        return Err("HTML tags are not allowed".to_string());
    }
    Ok(())
}

/// Validate that a string contains no potential XSS patterns
pub fn validate_no_xss(value: &str) -> Result<(), String> {
    if XSS_PATTERN_REGEX.is_match(value) {
        return Err("potentially unsafe content detected".to_string());
    }
    Ok(())
}

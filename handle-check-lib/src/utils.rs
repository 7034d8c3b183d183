//! Utility functions for username validation and display.
//!
//! These helpers are pure: validation returns its warnings to the caller
//! instead of printing them.

use crate::error::HandleCheckError;
use regex::Regex;

pub const MIN_USERNAME_LENGTH: usize = 2;
pub const MAX_USERNAME_LENGTH: usize = 30;

/// Upper bound on suggestions returned by [`suggest_username_variations`].
pub const MAX_SUGGESTIONS: usize = 8;

lazy_static::lazy_static! {
    static ref USERNAME_CHARS: Regex =
        Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid");
    static ref SEPARATOR_RUN: Regex = Regex::new(r"[._-]{2,}").expect("static regex is valid");
    static ref SEPARATORS: Regex = Regex::new(r"[._-]+").expect("static regex is valid");
}

/// Validate username syntax.
///
/// Hard rules produce an error: non-empty, 2-30 characters, letters,
/// digits, `.`, `_` and `-` only. Soft rules (leading or trailing `.`/`-`,
/// runs of separators) come back as warnings.
pub fn validate_username(username: &str) -> Result<Vec<String>, HandleCheckError> {
    if username.is_empty() {
        return Err(HandleCheckError::invalid_username(
            username,
            "Username cannot be empty",
        ));
    }

    let length = username.chars().count();
    if length < MIN_USERNAME_LENGTH {
        return Err(HandleCheckError::invalid_username(
            username,
            format!("Username must be at least {} characters long", MIN_USERNAME_LENGTH),
        ));
    }
    if length > MAX_USERNAME_LENGTH {
        return Err(HandleCheckError::invalid_username(
            username,
            format!("Username must be {} characters or less", MAX_USERNAME_LENGTH),
        ));
    }

    if !USERNAME_CHARS.is_match(username) {
        return Err(HandleCheckError::invalid_username(
            username,
            "Username can only contain letters, numbers, underscore, hyphen, and period",
        ));
    }

    let mut warnings = Vec::new();
    if username.starts_with('.') || username.ends_with('.') {
        warnings.push("Username should not start or end with a period".to_string());
    }
    if username.starts_with('-') || username.ends_with('-') {
        warnings.push("Username should not start or end with a hyphen".to_string());
    }
    if SEPARATOR_RUN.is_match(username) {
        warnings.push("Username contains consecutive special characters".to_string());
    }

    Ok(warnings)
}

/// Alternative usernames to try when the original is taken.
///
/// Deterministic, deduplicated, never contains `username` itself, and
/// returns at most [`MAX_SUGGESTIONS`] entries.
pub fn suggest_username_variations(username: &str) -> Vec<String> {
    let mut candidates = Vec::new();

    let cleaned = SEPARATORS.replace_all(username, "_").into_owned();
    if cleaned != username {
        candidates.push(cleaned);
    }

    candidates.extend([
        format!("{}123", username),
        format!("{}2024", username),
        format!("{}_official", username),
        format!("real_{}", username),
        format!("{}_pro", username),
        format!("{}99", username),
        format!("the_{}", username),
        format!("{}_", username),
        format!("_{}", username),
    ]);

    candidates.extend([
        capitalize(username),
        username.to_uppercase(),
        username.to_lowercase(),
    ]);

    let mut suggestions: Vec<String> = Vec::with_capacity(MAX_SUGGESTIONS);
    for candidate in candidates {
        if suggestions.len() == MAX_SUGGESTIONS {
            break;
        }
        if candidate != username && !suggestions.contains(&candidate) {
            suggestions.push(candidate);
        }
    }
    suggestions
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Format a response time for display: "123ms" below a second, "1.2s" above.
pub fn format_response_time(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms)
    } else {
        format!("{:.1}s", ms / 1000.0)
    }
}

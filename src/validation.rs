use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, AppResult};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w\-.]+@([\w-]+\.)+[\w-]{2,4}$").expect("email pattern is valid")
});

static NATIONAL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{11}$").expect("national id pattern is valid"));

pub const MIN_PROGRESS: f64 = 0.0;
pub const MAX_PROGRESS: f64 = 100.0;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Trims the name and rejects it when nothing is left.
pub fn require_name(name: &str, what: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::bad_request(format!("{what} name is required")));
    }
    Ok(trimmed.to_string())
}

pub fn require_email(email: &str) -> AppResult<String> {
    let email = email.trim();
    if !EMAIL_RE.is_match(email) {
        return Err(AppError::bad_request("Invalid email"));
    }
    Ok(email.to_string())
}

pub fn require_national_id(national_id: &str) -> AppResult<String> {
    let national_id = national_id.trim();
    if !NATIONAL_ID_RE.is_match(national_id) {
        return Err(AppError::bad_request(
            "Invalid national id. It must contain 11 digits",
        ));
    }
    Ok(national_id.to_string())
}

pub fn require_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn require_positive(value: i32, message: &str) -> AppResult<i32> {
    if value <= 0 {
        return Err(AppError::bad_request(message));
    }
    Ok(value)
}

/// Rejects values outside 0..=100, then clamps once more so the stored value
/// is always inside the range.
pub fn check_progress(value: f64) -> AppResult<f64> {
    if !value.is_finite() || !(MIN_PROGRESS..=MAX_PROGRESS).contains(&value) {
        return Err(AppError::bad_request("Progress must be between 0 and 100"));
    }
    Ok(value.clamp(MIN_PROGRESS, MAX_PROGRESS))
}

/// Seats left after changing a course's capacity from `total` to `new_total`
/// while `available` seats are free.
pub fn resize_seats(total: i32, available: i32, new_total: i32) -> AppResult<i32> {
    let occupied = total - available;
    if new_total < occupied {
        return Err(AppError::bad_request(format!(
            "Cannot reduce seats to {new_total}. {occupied} students are already enrolled"
        )));
    }
    let resized = available + (new_total - total);
    Ok(resized.clamp(0, new_total))
}

/// Mean progress across enrollments, 0 when there are none.
pub fn average_progress(progress: &[f64]) -> f64 {
    if progress.is_empty() {
        return 0.0;
    }
    progress.iter().sum::<f64>() / progress.len() as f64
}

pub fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(require_name("  Rust 101 ", "Course").unwrap(), "Rust 101");
        let err = require_name("   ", "Course").unwrap_err();
        assert_eq!(err.to_string(), "Course name is required");
    }

    #[test]
    fn email_pattern() {
        assert!(require_email("ana.costa@aluno.com").is_ok());
        assert!(require_email("first-last@mail.school.org").is_ok());
        assert!(require_email("no-at-sign.com").is_err());
        assert!(require_email("user@host").is_err());
        assert!(require_email("user@host.toolongtld").is_err());
    }

    #[test]
    fn national_id_needs_exactly_eleven_digits() {
        assert_eq!(require_national_id("10000000001").unwrap(), "10000000001");
        assert!(require_national_id("1000000000").is_err());
        assert!(require_national_id("100000000012").is_err());
        assert!(require_national_id("1000000000a").is_err());
        assert!(require_national_id("100.000.000-01").is_err());
    }

    #[test]
    fn progress_bounds() {
        assert_eq!(check_progress(0.0).unwrap(), 0.0);
        assert_eq!(check_progress(75.5).unwrap(), 75.5);
        assert_eq!(check_progress(100.0).unwrap(), 100.0);
        assert!(check_progress(-0.1).is_err());
        assert!(check_progress(100.1).is_err());
        assert!(check_progress(f64::NAN).is_err());
    }

    #[test]
    fn shrinking_below_occupied_seats_is_rejected() {
        // total=10, 8 occupied
        let err = resize_seats(10, 2, 5).unwrap_err();
        assert!(err.to_string().contains("8 students are already enrolled"));
    }

    #[test]
    fn shrinking_to_fit_keeps_the_delta() {
        assert_eq!(resize_seats(10, 2, 9).unwrap(), 1);
        assert_eq!(resize_seats(10, 2, 8).unwrap(), 0);
    }

    #[test]
    fn growing_adds_the_delta() {
        assert_eq!(resize_seats(10, 2, 15).unwrap(), 7);
        assert_eq!(resize_seats(1, 1, 1).unwrap(), 1);
    }

    #[test]
    fn average_of_no_enrollments_is_zero() {
        assert_eq!(average_progress(&[]), 0.0);
        assert_eq!(average_progress(&[50.0, 100.0, 0.0]), 50.0);
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(
            normalize_optional(Some(" (11) 90000-0000 ".into())),
            Some("(11) 90000-0000".into())
        );
        assert_eq!(normalize_optional(None), None);
    }
}

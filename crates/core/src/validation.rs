//! Form validation primitives.
//!
//! Forms are checked before any backend call so obviously broken input never
//! leaves the browser's round trip. Each helper records a message in
//! [`FieldErrors`] on failure and returns the parsed value on success, so a
//! handler can validate every field and then inspect the errors once.
//!
//! The backend still performs the authoritative validation.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use crate::types::{Email, EmailError};

/// Optional leading `+`, then digits with spaces or dashes between them.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 \-]*$").expect("phone pattern compiles"));

/// Digit count accepted for phone numbers.
pub const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 7..=15;

/// Field name → first error message, in the order fields were checked.
#[derive(thiserror::Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct FieldErrors {
    errors: Vec<(String, String)>,
}

impl FieldErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Record an error for `field`. Only the first message per field is kept.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        if !self.has(field) {
            self.errors.push((field.to_owned(), message.into()));
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, m)| m.as_str())
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|(f, _)| f == field)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(f, m)| (f.as_str(), m.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when any field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

/// Trimmed, non-empty string.
pub fn required(errors: &mut FieldErrors, field: &str, label: &str, raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() {
        errors.add(field, format!("{label} is required"));
        None
    } else {
        Some(value.to_owned())
    }
}

/// Trimmed value, `None` when blank. Never records an error.
#[must_use]
pub fn optional(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_owned())
}

/// Required string whose character count lies in `min..=max`.
pub fn length(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
    min: usize,
    max: usize,
) -> Option<String> {
    let value = required(errors, field, label, raw)?;
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Some(value)
    } else {
        errors.add(
            field,
            format!("{label} must be between {min} and {max} characters"),
        );
        None
    }
}

/// Required email address.
pub fn email(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<Email> {
    match Email::parse(raw) {
        Ok(email) => Some(email),
        Err(EmailError::Empty) => {
            errors.add(field, "Email is required");
            None
        }
        Err(EmailError::TooLong { max }) => {
            errors.add(field, format!("Email must be at most {max} characters"));
            None
        }
        Err(EmailError::Malformed) => {
            errors.add(field, "Enter a valid email address");
            None
        }
    }
}

/// Whether `value` is a plausible phone number.
#[must_use]
pub fn is_phone(value: &str) -> bool {
    let value = value.trim();
    PHONE_PATTERN.is_match(value)
        && PHONE_DIGITS.contains(&value.chars().filter(char::is_ascii_digit).count())
}

/// Optional phone number. Blank is fine; anything else must look like one.
pub fn phone(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<String> {
    let value = optional(raw)?;
    if is_phone(&value) {
        Some(value)
    } else {
        errors.add(field, "Enter a valid phone number");
        None
    }
}

/// Required phone number.
pub fn required_phone(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<String> {
    if raw.trim().is_empty() {
        errors.add(field, "Phone is required");
        return None;
    }
    phone(errors, field, raw)
}

fn parse_decimal(errors: &mut FieldErrors, field: &str, label: &str, raw: &str) -> Option<Decimal> {
    let value = required(errors, field, label, raw)?;
    value.parse::<Decimal>().map_or_else(
        |_| {
            errors.add(field, format!("{label} must be a number"));
            None
        },
        Some,
    )
}

/// Required decimal in `min..=max`.
pub fn decimal_in_range(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
    min: Decimal,
    max: Decimal,
) -> Option<Decimal> {
    let value = parse_decimal(errors, field, label, raw)?;
    if value < min || value > max {
        errors.add(
            field,
            format!("{label} must be between {} and {}", min.normalize(), max.normalize()),
        );
        return None;
    }
    Some(value)
}

/// Required decimal strictly greater than zero.
pub fn positive_decimal(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
) -> Option<Decimal> {
    let value = parse_decimal(errors, field, label, raw)?;
    if value <= Decimal::ZERO {
        errors.add(field, format!("{label} must be greater than 0"));
        return None;
    }
    Some(value)
}

/// Decimal that may be left blank. Non-numeric input is still an error.
pub fn optional_decimal(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
) -> Option<Decimal> {
    if raw.trim().is_empty() {
        return None;
    }
    parse_decimal(errors, field, label, raw)
}

/// Required integer in `min..=max`.
pub fn integer_in_range(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
    min: i64,
    max: i64,
) -> Option<i64> {
    let value = required(errors, field, label, raw)?;
    let Ok(n) = value.parse::<i64>() else {
        errors.add(field, format!("{label} must be a whole number"));
        return None;
    };
    if (min..=max).contains(&n) {
        Some(n)
    } else {
        errors.add(field, format!("{label} must be between {min} and {max}"));
        None
    }
}

/// Integer that may be left blank.
pub fn optional_integer(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &str,
    min: i64,
    max: i64,
) -> Option<i64> {
    if raw.trim().is_empty() {
        return None;
    }
    integer_in_range(errors, field, label, raw, min, max)
}

/// Required `YYYY-MM-DD` date.
pub fn date(errors: &mut FieldErrors, field: &str, label: &str, raw: &str) -> Option<NaiveDate> {
    let value = required(errors, field, label, raw)?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").map_or_else(
        |_| {
            errors.add(field, format!("{label} must be a date (YYYY-MM-DD)"));
            None
        },
        Some,
    )
}

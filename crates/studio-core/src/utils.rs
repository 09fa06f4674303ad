//! Validation, layout and formatting helpers shared by the admin crates

use crate::Result;
use base64::Engine as _;
use chrono::{Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Pattern used by every email field in the admin
#[allow(clippy::expect_used)]
pub static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Validate an email address
///
/// # Errors
///
/// Returns a validation error naming the `email` field.
pub fn validate_email(email: &str) -> Result<()> {
    if EMAIL_REGEX.is_match(email.trim()) {
        Ok(())
    } else {
        Err(crate::Error::validation(
            "email",
            "Please enter a valid email address",
        ))
    }
}

/// Validate a new password
///
/// # Errors
///
/// Returns a validation error when the password is too short or does not
/// match its confirmation.
pub fn validate_password(password: &str, confirmation: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(crate::Error::validation(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if password != confirmation {
        return Err(crate::Error::validation("password", "Passwords do not match"));
    }
    Ok(())
}

/// Run `validator` rules on a form and report the first failing field
///
/// Fields are checked in name order so the reported field is stable.
///
/// # Errors
///
/// Returns [`crate::Error::Validation`] carrying the rule's message.
pub fn validate_form<T: validator::Validate>(form: &T) -> Result<()> {
    let Err(errors) = form.validate() else {
        return Ok(());
    };

    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    let Some((field, field_errors)) = fields.into_iter().next() else {
        return Err(crate::Error::validation("form", errors.to_string()));
    };

    let message = field_errors.first().map_or_else(
        || "is invalid".to_string(),
        |error| {
            error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), ToString::to_string)
        },
    );

    Err(crate::Error::validation(field.to_string(), message))
}

/// Reject `candidate` if another entry in `existing` has the same name
///
/// Comparison is trimmed and case-insensitive. `skip` excludes one index,
/// used when an entry is being renamed in place.
///
/// # Errors
///
/// Returns a validation error naming the `name` field.
pub fn ensure_unique_name<'a, I>(candidate: &str, existing: I, skip: Option<usize>) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let wanted = candidate.trim().to_lowercase();
    if wanted.is_empty() {
        return Err(crate::Error::validation("name", "Name is required"));
    }

    let taken = existing
        .into_iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != skip)
        .any(|(_, name)| name.trim().to_lowercase() == wanted);

    if taken {
        Err(crate::Error::validation(
            "name",
            format!("'{}' already exists", candidate.trim()),
        ))
    } else {
        Ok(())
    }
}

/// Offsets of `count` items evenly spaced on a circle of `radius`
///
/// The first item sits at the top of the circle and the rest follow
/// clockwise in screen coordinates (y grows downwards).
#[must_use]
pub fn circular_positions(count: usize, radius: f64) -> Vec<(f64, f64)> {
    if count == 0 {
        return Vec::new();
    }

    #[allow(clippy::cast_precision_loss)]
    let step = std::f64::consts::TAU / count as f64;

    (0..count)
        .map(|index| {
            #[allow(clippy::cast_precision_loss)]
            let angle = (index as f64).mul_add(step, -std::f64::consts::FRAC_PI_2);
            (radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Encode file bytes as a `data:` URL for an immediate local preview
#[must_use]
pub fn image_data_url(bytes: &[u8], file_name: &str) -> String {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{mime};base64,{encoded}")
}

/// Resolve an image reference returned by the backend against the asset server
///
/// Absolute URLs and `data:` URLs are returned unchanged.
#[must_use]
pub fn resolve_asset_url(asset_base_url: &str, reference: &str) -> String {
    if reference.is_empty()
        || reference.starts_with("http://")
        || reference.starts_with("https://")
        || reference.starts_with("data:")
    {
        return reference.to_string();
    }

    format!(
        "{}/{}",
        asset_base_url.trim_end_matches('/'),
        reference.trim_start_matches('/')
    )
}

/// The `days` calendar days ending with `today`, oldest first
#[must_use]
pub fn trailing_days(today: NaiveDate, days: u64) -> Vec<NaiveDate> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .collect()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::float_cmp,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("owner@studio.test", true)]
    #[case("  first.last+tag@mail.example.org ", true)]
    #[case("owner@studio", false)]
    #[case("owner studio@test.com", false)]
    #[case("@studio.test", false)]
    #[case("", false)]
    fn test_validate_email(#[case] input: &str, #[case] valid: bool) {
        assert_eq!(validate_email(input).is_ok(), valid);
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret1", "secret1").is_ok());

        let short = validate_password("abc", "abc").unwrap_err();
        assert!(short.to_string().contains("at least 6"));

        let mismatch = validate_password("secret1", "secret2").unwrap_err();
        assert!(mismatch.to_string().contains("do not match"));
    }

    #[test]
    fn test_validate_form_reports_first_field() {
        let form = crate::types::Registration {
            username: "ab".to_string(),
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        };

        match validate_form(&form).unwrap_err() {
            crate::Error::Validation { field, message } => {
                assert_eq!(field, "email");
                assert_eq!(message, "Please enter a valid email address");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ensure_unique_name() {
        let names = ["Instagram", "Facebook", "YouTube"];

        assert!(ensure_unique_name("TikTok", names, None).is_ok());
        assert!(ensure_unique_name(" instagram ", names, None).is_err());
        // Renaming entry 0 to itself is allowed
        assert!(ensure_unique_name("Instagram", names, Some(0)).is_ok());
        assert!(ensure_unique_name("Facebook", names, Some(0)).is_err());
        assert!(ensure_unique_name("   ", names, None).is_err());
    }

    #[test]
    fn test_circular_positions_layout() {
        assert!(circular_positions(0, 100.0).is_empty());

        let positions = circular_positions(4, 100.0);
        assert_eq!(positions.len(), 4);

        let expected = [(0.0, -100.0), (100.0, 0.0), (0.0, 100.0), (-100.0, 0.0)];
        for ((x, y), (ex, ey)) in positions.iter().zip(expected) {
            assert!((x - ex).abs() < 1e-9, "x {x} != {ex}");
            assert!((y - ey).abs() < 1e-9, "y {y} != {ey}");
        }
    }

    #[test]
    fn test_image_data_url() {
        let url = image_data_url(b"hello", "avatar.png");
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");

        let unknown = image_data_url(b"", "blob");
        assert!(unknown.starts_with("data:application/octet-stream;base64,"));
    }

    #[rstest]
    #[case("http://cdn.test", "/uploads/a.jpg", "http://cdn.test/uploads/a.jpg")]
    #[case("http://cdn.test/", "uploads/a.jpg", "http://cdn.test/uploads/a.jpg")]
    #[case("http://cdn.test", "https://img.host/a.jpg", "https://img.host/a.jpg")]
    #[case("http://cdn.test", "data:image/png;base64,AA==", "data:image/png;base64,AA==")]
    #[case("http://cdn.test", "", "")]
    fn test_resolve_asset_url(#[case] base: &str, #[case] reference: &str, #[case] expected: &str) {
        assert_eq!(resolve_asset_url(base, reference), expected);
    }

    #[test]
    fn test_trailing_days() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let days = trailing_days(today, 7);

        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
        assert_eq!(days[6], today);
    }

    proptest! {
        #[test]
        fn prop_circular_positions_on_circle(count in 1usize..64, radius in 1.0f64..500.0) {
            for (x, y) in circular_positions(count, radius) {
                let distance = x.hypot(y);
                prop_assert!((distance - radius).abs() < 1e-6);
            }
        }
    }
}

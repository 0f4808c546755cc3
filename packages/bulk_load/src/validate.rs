//! Syntax checks for bulk-load notification fields.

use std::sync::LazyLock;

use blip_client_models::Notifications;
use regex::Regex;
use reqwest::Url;

use crate::BulkLoadError;

/// Local part of RFC 5322 "dot-atom" addresses, then a dotted domain whose
/// labels are at most 63 characters and never start or end with a hyphen.
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
    )
    .expect("valid regex")
});

/// Returns the trimmed value, or `None` for absent or blank fields.
#[must_use]
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Whether `address` is a syntactically valid email address.
#[must_use]
pub fn is_valid_email(address: &str) -> bool {
    address.len() <= 254 && EMAIL_RE.is_match(address)
}

/// Checks a comma-separated address list; every element must be valid.
///
/// # Errors
///
/// Returns [`BulkLoadError::InvalidEmail`] naming the first bad element.
pub fn validate_email_list(field: &'static str, list: &str) -> Result<(), BulkLoadError> {
    for address in list.split(',').map(str::trim) {
        if !is_valid_email(address) {
            return Err(BulkLoadError::InvalidEmail {
                field,
                value: address.to_string(),
            });
        }
    }
    Ok(())
}

/// Rejoins a comma-separated address list with each element trimmed.
#[must_use]
pub fn normalize_email_list(list: &str) -> String {
    list.split(',').map(str::trim).collect::<Vec<_>>().join(",")
}

/// Checks that `url` is an absolute `http` or `https` URL with a host.
///
/// # Errors
///
/// Returns [`BulkLoadError::InvalidCallbackUrl`] otherwise.
pub fn validate_callback_url(field: &'static str, url: &str) -> Result<(), BulkLoadError> {
    let lower = url.to_ascii_lowercase();
    let valid = (lower.starts_with("http://") || lower.starts_with("https://"))
        && Url::parse(url)
            .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some());

    if valid {
        Ok(())
    } else {
        Err(BulkLoadError::InvalidCallbackUrl {
            field,
            value: url.to_string(),
        })
    }
}

/// Validates every non-blank notification field.
///
/// # Errors
///
/// Returns the first [`BulkLoadError::InvalidEmail`] or
/// [`BulkLoadError::InvalidCallbackUrl`] found, checking emails first.
pub fn validate_notifications(notifications: &Notifications) -> Result<(), BulkLoadError> {
    if let Some(list) = present(notifications.success_email.as_deref()) {
        validate_email_list("successEmail", list)?;
    }
    if let Some(list) = present(notifications.fail_email.as_deref()) {
        validate_email_list("failEmail", list)?;
    }
    if let Some(url) = present(notifications.success_callback.as_deref()) {
        validate_callback_url("successCallback", url)?;
    }
    if let Some(url) = present(notifications.fail_callback.as_deref()) {
        validate_callback_url("failCallback", url)?;
    }
    Ok(())
}

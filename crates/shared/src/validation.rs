//! Common validation utilities.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length for free-text scan metadata (location, device info).
const MAX_SCAN_METADATA_LEN: usize = 200;

lazy_static! {
    /// Check-in tokens look like `EVT-` followed by 8 uppercase alphanumerics.
    static ref TICKET_TOKEN_RE: Regex = Regex::new(r"^EVT-[A-Z0-9]{8}$").unwrap();

    /// Coupon codes: 3-32 characters, letters/digits/hyphen, compared
    /// case-insensitively everywhere else.
    static ref COUPON_CODE_RE: Regex = Regex::new(r"^[A-Za-z0-9-]{3,32}$").unwrap();
}

/// Validates a check-in token's format.
pub fn validate_ticket_token(token: &str) -> Result<(), ValidationError> {
    if TICKET_TOKEN_RE.is_match(token) {
        Ok(())
    } else {
        let mut err = ValidationError::new("ticket_token_format");
        err.message = Some("Token must match EVT-XXXXXXXX (uppercase alphanumeric)".into());
        Err(err)
    }
}

/// Validates a coupon code's format.
pub fn validate_coupon_code(code: &str) -> Result<(), ValidationError> {
    if COUPON_CODE_RE.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("coupon_code_format");
        err.message =
            Some("Coupon code must be 3-32 letters, digits, or hyphens".into());
        Err(err)
    }
}

/// Validates optional scan metadata (location or device info) length.
pub fn validate_scan_metadata(value: &str) -> Result<(), ValidationError> {
    if value.len() <= MAX_SCAN_METADATA_LEN {
        Ok(())
    } else {
        let mut err = ValidationError::new("scan_metadata_length");
        err.message = Some("Scan metadata must be at most 200 characters".into());
        Err(err)
    }
}

/// Normalizes a coupon code for storage and comparison.
///
/// Codes are stored uppercase so the unique index doubles as the
/// case-insensitive uniqueness guarantee.
pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

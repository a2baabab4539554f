//! Validation helpers for DTOs.

use validator::ValidationError;

/// Rejects strings made only of whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_not_blank("Pickup basketball") // Ok
/// validate_not_blank("   ")               // Err
/// ```
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must contain at least one non-whitespace character".into());
        return Err(err);
    }
    Ok(())
}

/// Rejects sport names that are blank or padded with whitespace.
pub fn validate_sport_name(value: &str) -> Result<(), ValidationError> {
    validate_not_blank(value)?;
    if value.trim() != value {
        let mut err = ValidationError::new("sport_format");
        err.message = Some("sport name must not start or end with whitespace".into());
        return Err(err);
    }
    Ok(())
}

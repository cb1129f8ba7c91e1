//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest user id accepted from the platform.
pub const MAX_USER_ID_LEN: usize = 64;

/// Validates that a user id is 1 to 64 characters of `[A-Za-z0-9._-]`.
///
/// # Examples
///
/// ```ignore
/// validate_user_id("123456789012345678") // Ok
/// validate_user_id("")                   // Err - empty
/// validate_user_id("dj booth")           // Err - whitespace
/// ```
pub fn validate_user_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_USER_ID_LEN {
        let mut err = ValidationError::new("user_id_length");
        err.message = Some(
            format!(
                "User ID must be between 1 and {MAX_USER_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        let mut err = ValidationError::new("user_id_format");
        err.message = Some("User ID may only contain letters, digits, '.', '_' and '-'".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id_valid() {
        assert!(validate_user_id("123456789012345678").is_ok());
        assert!(validate_user_id("alice").is_ok());
        assert!(validate_user_id("dj_booth-2.0").is_ok());
    }

    #[test]
    fn test_validate_user_id_invalid_length() {
        assert!(validate_user_id("").is_err());
        assert!(validate_user_id(&"a".repeat(MAX_USER_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_user_id_invalid_format() {
        assert!(validate_user_id("dj booth").is_err());
        assert!(validate_user_id("vote:1").is_err());
    }
}

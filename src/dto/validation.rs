//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum accepted answer length in characters.
pub const MAX_ANSWER_LENGTH: usize = 512;

/// Validates that submitted answer text is non-blank and within size bounds.
///
/// # Examples
///
/// ```ignore
/// validate_answer_text("Paris")  // Ok
/// validate_answer_text("   ")    // Err - blank
/// validate_answer_text("")       // Err - blank
/// ```
pub fn validate_answer_text(answer: &str) -> Result<(), ValidationError> {
    if answer.chars().all(char::is_whitespace) {
        let mut err = ValidationError::new("answer_blank");
        err.message = Some("Answer must contain at least one non-whitespace character".into());
        return Err(err);
    }

    let length = answer.chars().count();
    if length > MAX_ANSWER_LENGTH {
        let mut err = ValidationError::new("answer_length");
        err.message =
            Some(format!("Answer must be at most {MAX_ANSWER_LENGTH} characters (got {length})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_answer_text_valid() {
        assert!(validate_answer_text("Paris").is_ok());
        assert!(validate_answer_text(" 12 ").is_ok());
        assert!(validate_answer_text("don't").is_ok());
        assert!(validate_answer_text(&"a".repeat(MAX_ANSWER_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_answer_text_blank() {
        assert!(validate_answer_text("").is_err()); // empty
        assert!(validate_answer_text("   ").is_err()); // spaces only
        assert!(validate_answer_text("\t\n").is_err()); // other whitespace
    }

    #[test]
    fn test_validate_answer_text_too_long() {
        assert!(validate_answer_text(&"a".repeat(MAX_ANSWER_LENGTH + 1)).is_err());
    }
}

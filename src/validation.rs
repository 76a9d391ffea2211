//! Request shape checks run before any host is contacted

use crate::config::LimitsConfig;
use crate::error::ValidationError;

/// Reject a batch field that is too long, or that holds an over-long text.
///
/// Text length is measured in UTF-16 code units, the unit the GPU service
/// counts in, so a character outside the Basic Multilingual Plane counts as 2.
/// The first violation found is reported.
pub fn validate_texts(texts: &[String], field: &str, limits: &LimitsConfig) -> Result<(), ValidationError> {
    if texts.len() > limits.max_batch_size {
        return Err(ValidationError::BatchTooLarge {
            field: field.to_string(),
            len: texts.len(),
            limit: limits.max_batch_size,
        });
    }

    for (index, text) in texts.iter().enumerate() {
        let len = text.encode_utf16().count();
        if len > limits.max_text_length {
            return Err(ValidationError::TextTooLong {
                field: field.to_string(),
                index,
                len,
                limit: limits.max_text_length,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_batch_size: usize, max_text_length: usize) -> LimitsConfig {
        LimitsConfig {
            max_batch_size,
            max_text_length,
        }
    }

    fn texts(n: usize, s: &str) -> Vec<String> {
        vec![s.to_string(); n]
    }

    #[test]
    fn test_batch_at_limit_passes() {
        assert!(validate_texts(&texts(100, "ok"), "texts", &LimitsConfig::default()).is_ok());
    }

    #[test]
    fn test_batch_over_limit() {
        let err = validate_texts(&texts(101, "ok"), "texts", &LimitsConfig::default()).unwrap_err();
        assert_eq!(
            err,
            ValidationError::BatchTooLarge {
                field: "texts".to_string(),
                len: 101,
                limit: 100
            }
        );
    }

    #[test]
    fn test_text_too_long_reports_index() {
        let batch = vec!["short".to_string(), "x".repeat(51), "y".repeat(80)];
        let err = validate_texts(&batch, "references", &limits(5, 50)).unwrap_err();
        assert_eq!(err.to_string(), "references[1] length 51 exceeds max text length of 50");
    }

    #[test]
    fn test_batch_size_checked_before_text_length() {
        let batch = texts(10, &"x".repeat(100));
        let err = validate_texts(&batch, "texts", &limits(5, 50)).unwrap_err();
        assert!(matches!(err, ValidationError::BatchTooLarge { len: 10, limit: 5, .. }));
    }

    #[test]
    fn test_length_counts_code_units_not_bytes() {
        // 50 two-byte characters, one UTF-16 unit each
        let batch = vec!["é".repeat(50)];
        assert!(validate_texts(&batch, "texts", &limits(5, 50)).is_ok());
    }

    #[test]
    fn test_astral_characters_count_as_two_units() {
        // 30 emoji are 60 UTF-16 code units
        let batch = vec!["\u{1F600}".repeat(30)];
        let err = validate_texts(&batch, "texts", &limits(5, 50)).unwrap_err();
        assert_eq!(err.to_string(), "texts[0] length 60 exceeds max text length of 50");
        assert!(validate_texts(&batch, "texts", &limits(5, 60)).is_ok());
    }

    #[test]
    fn test_empty_batch() {
        assert!(validate_texts(&[], "texts", &limits(0, 0)).is_ok());
    }
}

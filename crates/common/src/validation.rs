// Field Validators - Reusable validation components
use once_cell::sync::Lazy;
use regex::Regex;

/// Trait for field validators
pub trait FieldValidator<T: ?Sized> {
    /// Validate a field value
    fn validate(&self, value: &T) -> Result<(), String>;
}

/// Dot-separated domain labels ending in an alphabetic top-level label.
const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}$";

/// Static email regex compiled once at first use
static EMAIL_REGEX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(EMAIL_PATTERN));

/// Email validator
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailValidator;

impl EmailValidator {
    /// Create a new email validator
    pub const fn new() -> Self {
        Self
    }
}

impl FieldValidator<str> for EmailValidator {
    fn validate(&self, value: &str) -> Result<(), String> {
        let regex = EMAIL_REGEX.as_ref().map_err(|e| format!("Email pattern is unusable: {e}"))?;
        if !regex.is_match(value) {
            return Err("Invalid email format".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validator_accepts_common_addresses() {
        let validator = EmailValidator::new();
        for good in ["a@b.com", "first.last+tag@mail.example.co.uk", "x_y%z-1@sub-domain.se"] {
            assert!(validator.validate(good).is_ok(), "{good}");
        }
    }

    #[test]
    fn test_email_validator_rejects_malformed_addresses() {
        let validator = EmailValidator::new();
        for bad in ["", "ab.com", "@b.com", "a@b", "a@.com", "a@b..com", "a@b.", "a(b)@c.com", "a b@c.com", "a@b.c"] {
            assert_eq!(validator.validate(bad), Err("Invalid email format".to_string()), "{bad}");
        }
    }
}

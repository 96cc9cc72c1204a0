use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for validating account logins
    /// At least 8 characters, latin letters and digits only
    /// - Valid: "johndoe1", "ADMIN2024", "abcdefgh"
    /// - Invalid: "short1", "john_doe1", "jöhndoe12", "john doe1"
    pub static ref LOGIN_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9]{8,}$").unwrap();
}

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Password must mix lower-case, upper-case, digit and a non-alphanumeric character
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_lower = password.chars().any(|c| c.is_lowercase());
    let has_upper = password.chars().any(|c| c.is_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && has_lower && has_upper && has_digit && has_special {
        Ok(())
    } else {
        let mut error = ValidationError::new("password_strength");
        error.message = Some(
            "Password must be at least 8 characters and contain lower-case, upper-case, digit and special characters"
                .into(),
        );
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_regex_valid() {
        assert!(LOGIN_REGEX.is_match("johndoe1"));
        assert!(LOGIN_REGEX.is_match("ADMIN2024"));
        assert!(LOGIN_REGEX.is_match("abcdefgh"));
        assert!(LOGIN_REGEX.is_match("a1b2c3d4e5f6"));
    }

    #[test]
    fn test_login_regex_invalid() {
        assert!(!LOGIN_REGEX.is_match("short1")); // too short
        assert!(!LOGIN_REGEX.is_match("john_doe1")); // underscore
        assert!(!LOGIN_REGEX.is_match("john doe1")); // space
        assert!(!LOGIN_REGEX.is_match("jöhndoe12")); // non-latin
        assert!(!LOGIN_REGEX.is_match("")); // empty
    }

    #[test]
    fn test_password_strength_valid() {
        assert!(validate_password_strength("Passw0rd!").is_ok());
        assert!(validate_password_strength("xY9#xY9#").is_ok());
    }

    #[test]
    fn test_password_strength_invalid() {
        assert!(validate_password_strength("Pa0!").is_err()); // too short
        assert!(validate_password_strength("password0!").is_err()); // no upper-case
        assert!(validate_password_strength("PASSWORD0!").is_err()); // no lower-case
        assert!(validate_password_strength("Password!!").is_err()); // no digit
        assert!(validate_password_strength("Password00").is_err()); // no special
    }
}

//! Account registration and login input rules.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;

/// Default campus email domain accepted at registration.
pub const DEFAULT_EMAIL_DOMAIN: &str = "kampus.ac.id";

/// Default minimum password length.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 8;

/// Consecutive failed logins before an account is locked.
pub const MAX_FAILED_LOGINS: i32 = 5;

/// How long a locked account stays locked.
pub const LOCKOUT_DURATION_MINS: i64 = 15;

/// Avatar color assigned to new accounts.
pub const DEFAULT_AVATAR_COLOR: &str = "#2F80ED";

static NIM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6,20}$").expect("valid regex"));

/// Lowercase and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Remove all whitespace from a student ID number.
pub fn normalize_nim(nim: &str) -> String {
    nim.chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn is_valid_nim(nim: &str) -> bool {
    NIM_RE.is_match(nim)
}

/// Whether a normalized email belongs to `domain`.
pub fn is_allowed_email(email: &str, domain: &str) -> bool {
    match email.rsplit_once('@') {
        Some((local, host)) => !local.is_empty() && host == domain.to_lowercase(),
        None => false,
    }
}

/// How a login request identifies its account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(String),
    Nim(String),
}

/// Anything containing `@` is an email; everything else is a NIM.
pub fn parse_identifier(raw: &str) -> Result<LoginIdentifier, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("Email or NIM is required".into()));
    }
    if trimmed.contains('@') {
        Ok(LoginIdentifier::Email(normalize_email(trimmed)))
    } else {
        Ok(LoginIdentifier::Nim(normalize_nim(trimmed)))
    }
}

/// Registration form.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewAccount {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub nim: String,
    #[validate(length(min = 1, max = 120))]
    pub department: String,
    #[validate(email)]
    pub email: String,
    pub password: String,
}

impl NewAccount {
    /// Normalize and validate the form against the deployment's policy.
    ///
    /// The password is checked for length only; it is never trimmed.
    pub fn validate_for(self, email_domain: &str, min_password_len: usize) -> Result<Self, CoreError> {
        let account = NewAccount {
            name: self.name.trim().to_string(),
            nim: normalize_nim(&self.nim),
            department: self.department.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        };
        account.validate()?;

        if !is_valid_nim(&account.nim) {
            return Err(CoreError::Validation(
                "NIM must contain only digits and be at least 6 digits long".into(),
            ));
        }
        if !is_allowed_email(&account.email, email_domain) {
            return Err(CoreError::Validation(format!(
                "Email must use the @{email_domain} domain"
            )));
        }
        if account.password.chars().count() < min_password_len {
            return Err(CoreError::Validation(format!(
                "Password must be at least {min_password_len} characters"
            )));
        }
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn form() -> NewAccount {
        NewAccount {
            name: " Siti Rahma ".into(),
            nim: "2201 0045".into(),
            department: "Informatics".into(),
            email: " Siti.Rahma@KAMPUS.ac.id ".into(),
            password: "correct horse".into(),
        }
    }

    #[test]
    fn normalizes_fields() {
        let account = form().validate_for(DEFAULT_EMAIL_DOMAIN, 8).unwrap();
        assert_eq!(account.name, "Siti Rahma");
        assert_eq!(account.nim, "22010045");
        assert_eq!(account.email, "siti.rahma@kampus.ac.id");
    }

    #[test]
    fn rejects_foreign_domain() {
        let mut f = form();
        f.email = "siti@gmail.com".into();
        assert_matches!(f.validate_for(DEFAULT_EMAIL_DOMAIN, 8), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_lookalike_domain() {
        assert!(!is_allowed_email("a@evilkampus.ac.id", DEFAULT_EMAIL_DOMAIN));
        assert!(!is_allowed_email("@kampus.ac.id", DEFAULT_EMAIL_DOMAIN));
        assert!(is_allowed_email("a@kampus.ac.id", DEFAULT_EMAIL_DOMAIN));
    }

    #[test]
    fn rejects_non_numeric_nim() {
        let mut f = form();
        f.nim = "22A10045".into();
        assert_matches!(f.validate_for(DEFAULT_EMAIL_DOMAIN, 8), Err(CoreError::Validation(_)));

        let mut f = form();
        f.nim = "12345".into();
        assert_matches!(f.validate_for(DEFAULT_EMAIL_DOMAIN, 8), Err(CoreError::Validation(_)));
    }

    #[test]
    fn rejects_short_password() {
        let mut f = form();
        f.password = "short".into();
        assert_matches!(
            f.validate_for(DEFAULT_EMAIL_DOMAIN, 8),
            Err(CoreError::Validation(msg)) if msg.contains("at least 8")
        );
    }

    #[test]
    fn identifier_with_at_sign_is_email() {
        assert_eq!(
            parse_identifier(" Budi@Kampus.ac.id ").unwrap(),
            LoginIdentifier::Email("budi@kampus.ac.id".into())
        );
        assert_eq!(
            parse_identifier("1987 0101").unwrap(),
            LoginIdentifier::Nim("19870101".into())
        );
        assert_matches!(parse_identifier("  "), Err(CoreError::Validation(_)));
    }
}

//! Password policy and Argon2id hashing.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::PasswordError;
use crate::models::normalize_phone;

pub const MIN_PASSWORD_LENGTH: usize = 5;

/// Phones shorter than this are too short to meaningfully match against
const MIN_PHONE_DIGITS: usize = 4;

/// Local numbers are compared by their last ten digits
const LOCAL_PHONE_DIGITS: usize = 10;

/// Check a candidate password against the signup policy.
///
/// Rejects passwords under [`MIN_PASSWORD_LENGTH`] characters, passwords
/// made only of digits, and passwords containing the user's phone number.
pub fn validate_password(password: &str, phone: Option<&str>) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }

    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(PasswordError::AllNumeric);
    }

    if let Some(phone) = phone {
        let digits = normalize_phone(phone);
        if digits.len() >= MIN_PHONE_DIGITS {
            let local = &digits[digits.len().saturating_sub(LOCAL_PHONE_DIGITS)..];
            let password_digits = normalize_phone(password);
            if password.contains(&digits)
                || password.contains(local)
                || password_digits.contains(local)
            {
                return Err(PasswordError::ContainsPhone);
            }
        }
    }

    Ok(())
}

fn peppered(password: &str, pepper: Option<&str>) -> Vec<u8> {
    match pepper {
        Some(p) => format!("{p}{password}").into_bytes(),
        None => password.as_bytes().to_vec(),
    }
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(&peppered(password, pepper), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Verify a plaintext password against a stored hash.
///
/// `Ok(false)` on mismatch, `Err` when the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, PasswordError> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|e| PasswordError::Hash(format!("invalid hash format: {e}")))?;

    match Argon2::default().verify_password(&peppered(password, pepper), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(format!("verify error: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_passwords() {
        assert_eq!(
            validate_password("ab1c", None),
            Err(PasswordError::TooShort { min: 5 })
        );
        assert!(validate_password("ab1cd", None).is_ok());
    }

    #[test]
    fn rejects_all_numeric_passwords() {
        assert_eq!(validate_password("12345678", None), Err(PasswordError::AllNumeric));
    }

    #[test]
    fn rejects_passwords_containing_phone_digits() {
        let phone = Some("+91 98765 43210");
        assert_eq!(
            validate_password("home9876543210", phone),
            Err(PasswordError::ContainsPhone)
        );
        assert_eq!(
            validate_password("x98765-43210y", phone),
            Err(PasswordError::ContainsPhone)
        );
        assert!(validate_password("sunny-balcony", phone).is_ok());
    }

    #[test]
    fn tiny_phone_numbers_are_ignored() {
        assert!(validate_password("room123", Some("12")).is_ok());
    }

    #[test]
    fn hash_round_trip_with_pepper() {
        let hash = hash_password("hunter22", Some("pepper!")).unwrap();
        assert!(verify_password("hunter22", &hash, Some("pepper!")).unwrap());
        assert!(!verify_password("hunter22", &hash, None).unwrap());
        assert!(!verify_password("wrong", &hash, Some("pepper!")).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("pw", "not-a-hash", None).is_err());
    }
}

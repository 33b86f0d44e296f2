//! # Validation Module
//!
//! Input validation utilities for Stockroom.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP boundary                                                │
//! │  └── Type validation (deserialization, Money as string)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services                                                     │
//! │  └── THIS MODULE: format and length rules                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK (stock >= 0, non-empty name)                     │
//! │  ├── UNIQUE (users.email)                                              │
//! │  └── FOREIGN KEY (products.supplier_id)                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::validation::{validate_email, validate_password};
//!
//! validate_email("owner@acme.com").unwrap();
//! assert!(validate_password("short").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_EMAIL_LENGTH, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 2000;
const MAX_PHONE_LENGTH: usize = 32;

// =============================================================================
// Account Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Not empty, at most 254 characters, no whitespace
/// - Exactly one `@` with a non-empty local part
/// - Domain contains a dot that is neither first nor last
///
/// This is a shape check, not deliverability: the address is only used as
/// a login identifier and supplier contact.
///
/// ## Example
/// ```rust
/// use stockroom_core::validation::validate_email;
///
/// assert!(validate_email("a@acme.com").is_ok());
/// assert!(validate_email("acme.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    validate_email_field("email", email)
}

fn validate_email_field(field: &str, email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_EMAIL_LENGTH,
        });
    }

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain whitespace"));
    }

    let (local, domain) = match email.split_once('@') {
        Some(parts) => parts,
        None => return Err(invalid("must contain '@'")),
    };

    if local.is_empty() || domain.contains('@') {
        return Err(invalid("must look like name@example.com"));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(invalid("domain must look like example.com"));
    }

    Ok(())
}

/// Normalizes an email for storage and lookup (trimmed, lowercase).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validates a password before hashing.
///
/// ## Rules
/// - At least 8 characters
/// - At most 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }

    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: MAX_PASSWORD_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Inventory Validators
// =============================================================================

/// Validates a supplier or product name: non-empty, at most 200 characters.
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

/// Validates a product description. Empty is allowed.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
        });
    }

    Ok(())
}

/// Validates a supplier contact email.
pub fn validate_contact_email(email: &str) -> ValidationResult<()> {
    validate_email_field("contact_email", email)
}

/// Validates a phone number.
///
/// ## Rules
/// - Not empty, at most 32 characters
/// - Digits plus `+ - ( ) .` and spaces, with at least one digit
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if phone.len() > MAX_PHONE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: MAX_PHONE_LENGTH,
        });
    }

    let allowed = |c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' ');
    if !phone.chars().all(allowed) || !phone.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain digits and only + - ( ) . or spaces".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price: zero (free items) or positive.
///
/// ## Example
/// ```rust
/// use stockroom_core::money::Money;
/// use stockroom_core::validation::validate_price;
///
/// assert!(validate_price(&Money::parse("19.99").unwrap()).is_ok());
/// assert!(validate_price(&Money::zero()).is_ok());
/// assert!(validate_price(&Money::parse("-1").unwrap()).is_err());
/// ```
pub fn validate_price(price: &Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

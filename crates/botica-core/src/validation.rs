//! # Validation Module
//!
//! Input validation utilities for Botica.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                              │
//! │                                                                     │
//! │  Layer 1: Caller (order form, import script)                        │
//! │  └── Basic format checks, immediate feedback                        │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 2: THIS MODULE - business rule validation                    │
//! │           │                                                         │
//! │           ▼                                                         │
//! │  Layer 3: Database (SQLite)                                         │
//! │  ├── NOT NULL constraints                                           │
//! │  ├── UNIQUE constraints (phone, code, order_number)                 │
//! │  └── Foreign key constraints                                        │
//! │                                                                     │
//! │  Defense in depth: multiple layers catch different errors           │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use botica_core::validation::{validate_phone, validate_quantity};
//!
//! validate_phone("+51900000000").unwrap();
//! validate_quantity(3).unwrap();
//! ```

use crate::error::ValidationError;
use crate::types::{NewCustomer, NewMedicine};
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a phone number.
///
/// ## Rules
/// - Must not be empty
/// - Must be between 6 and 20 characters after trimming
/// - May start with `+`; every other character must be a digit
///
/// ## Example
/// ```rust
/// use botica_core::validation::validate_phone;
///
/// assert!(validate_phone("+51900000000").is_ok());
/// assert!(validate_phone("987654321").is_ok());
/// assert!(validate_phone("not-a-phone").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !(6..=20).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be 6-20 digits, optionally prefixed with +".to_string(),
        });
    }

    Ok(())
}

/// Validates a person or entity name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a shipping address.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 300 characters
pub fn validate_address(address: &str) -> ValidationResult<()> {
    let address = address.trim();

    if address.is_empty() {
        return Err(ValidationError::Required {
            field: "address".to_string(),
        });
    }

    if address.len() > 300 {
        return Err(ValidationError::TooLong {
            field: "address".to_string(),
            max: 300,
        });
    }

    Ok(())
}

/// Validates a medicine code.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use botica_core::validation::validate_medicine_code;
///
/// assert!(validate_medicine_code("PAR500").is_ok());
/// assert!(validate_medicine_code("AMX-500_B").is_ok());
/// assert!(validate_medicine_code("has space").is_err());
/// ```
pub fn validate_medicine_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 50,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in céntimos.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (promotional items)
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level.
///
/// ## Rules
/// - Must be non-negative (>= 0)
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a payment amount in céntimos.
///
/// ## Rules
/// - Must be positive (> 0)
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// Repositories take entity ids as strings; this rejects malformed ids
/// before they reach a query.
///
/// ## Example
/// ```rust
/// use botica_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

impl NewCustomer {
    /// Validates the full customer registration input.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name(&self.name)?;
        validate_phone(&self.phone)?;
        validate_address(&self.address)?;
        Ok(())
    }
}

impl NewMedicine {
    /// Validates the full catalog-entry input.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_medicine_code(&self.code)?;
        validate_name(&self.name)?;
        validate_price_cents(self.unit_price_cents)?;
        validate_stock(self.stock)?;
        validate_stock(self.min_stock)?;
        if self.category.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "category".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

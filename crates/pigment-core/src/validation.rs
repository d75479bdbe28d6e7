//! # Validation Module
//!
//! Input validation for ledger requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Routing layer                                                │
//! │  ├── Form parsing, authentication                                      │
//! │  └── Hands over well-formed requests                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Ledger entry points (Rust)                                   │
//! │  └── THIS MODULE: field rules, checked before any record is read       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Record rules (ledger.rs)                                     │
//! │  ├── InsufficientStock, RefundExceedsAvailable                         │
//! │  └── PaymentExceedsCommission                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  ├── PRIMARY KEY on stock_id / sale_id / id                            │
//! │  └── CHECK constraints on quantities                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pigment_core::validation::{validate_key, validate_quantity};
//!
//! validate_key("stock_id", "S1").unwrap();
//! validate_quantity("quantity_sold", 20).unwrap();
//! assert!(validate_quantity("quantity_sold", 0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CommissionRate, NewCommissionItem, NewSale, NewStock};
use crate::{MAX_AMOUNT_CENTS, MAX_KEY_LENGTH, MAX_NAME_LENGTH, MAX_QUANTITY, MAX_RATE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a record key (stock ID, sale ID, commission item ID).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most `MAX_KEY_LENGTH` characters
/// - No control characters
///
/// ## Example
/// ```rust
/// use pigment_core::validation::validate_key;
///
/// assert!(validate_key("stock_id", "WP-EM-001").is_ok());
/// assert!(validate_key("stock_id", "   ").is_err());
/// ```
pub fn validate_key(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_KEY_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_KEY_LENGTH,
        });
    }

    if value.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a required display name (brand, item, agent).
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    validate_label(field, value)
}

/// Validates an optional label: may be empty, bounded in length.
pub fn validate_label(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sold or refunded quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed `MAX_QUANTITY`
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock unit's total product (zero is allowed).
pub fn validate_total_product(total: i64) -> ValidationResult<()> {
    if !(0..=MAX_QUANTITY).contains(&total) {
        return Err(ValidationError::OutOfRange {
            field: "total_product".to_string(),
            min: 0,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a sell rate: positive and at most `MAX_RATE_CENTS`.
pub fn validate_sell_rate(rate: Money) -> ValidationResult<()> {
    if !rate.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "rate".to_string(),
        });
    }
    check_rate_ceiling(rate)
}

/// Validates a purchase rate: zero is allowed (free samples).
///
/// ## Example
/// ```rust
/// use pigment_core::validation::validate_purchase_rate;
/// use pigment_core::Money;
///
/// assert!(validate_purchase_rate(Money::from_cents(5000)).is_ok());
/// assert!(validate_purchase_rate(Money::zero()).is_ok());
/// assert!(validate_purchase_rate(Money::from_cents(-1)).is_err());
/// ```
pub fn validate_purchase_rate(rate: Money) -> ValidationResult<()> {
    if rate.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: MAX_RATE_CENTS,
        });
    }
    check_rate_ceiling(rate)
}

fn check_rate_ceiling(rate: Money) -> ValidationResult<()> {
    if rate.cents() > MAX_RATE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "rate".to_string(),
            min: 0,
            max: MAX_RATE_CENTS,
        });
    }
    Ok(())
}

/// Validates a commission rate: 0% to 100%.
pub fn validate_commission_rate(rate: CommissionRate) -> ValidationResult<()> {
    if rate.bps() > CommissionRate::MAX_BPS {
        return Err(ValidationError::OutOfRange {
            field: "percentage".to_string(),
            min: 0,
            max: 100,
        });
    }
    Ok(())
}

/// Validates an agent payment amount: positive and at most `MAX_AMOUNT_CENTS`.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    if amount.cents() > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "amount".to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Validates one stock intake line.
pub fn validate_new_stock(stock: &NewStock) -> ValidationResult<()> {
    validate_key("stock_id", &stock.stock_id)?;
    validate_name("brand_name", &stock.brand_name)?;
    validate_name("item_name", &stock.item_name)?;
    validate_label("colour_name", &stock.colour_name)?;
    validate_label("unit", &stock.unit)?;
    validate_total_product(stock.total_product)?;
    validate_purchase_rate(stock.rate)
}

/// Validates a sale request.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    validate_key("stock_id", &sale.stock_id)?;
    validate_key("sale_id", &sale.sale_id)?;
    validate_quantity("quantity_sold", sale.quantity_sold)?;
    validate_sell_rate(sale.rate)?;
    validate_label("brand_name", &sale.brand_name)?;
    validate_label("item_name", &sale.item_name)?;
    validate_label("colour_name", &sale.colour_name)?;
    validate_label("unit", &sale.unit)?;
    if let Some(agent_item_id) = sale.agent_item_id.as_deref() {
        if !agent_item_id.trim().is_empty() {
            validate_key("agent_item_id", agent_item_id)?;
        }
    }
    Ok(())
}

/// Validates an agent assignment.
pub fn validate_new_commission_item(item: &NewCommissionItem) -> ValidationResult<()> {
    if let Some(id) = item.id.as_deref() {
        validate_key("id", id)?;
    }
    validate_name("agent_name", &item.agent_name)?;
    validate_commission_rate(item.percentage)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("stock_id", "S1").is_ok());
        assert!(validate_key("stock_id", " S1 ").is_ok());
        assert!(matches!(
            validate_key("stock_id", ""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_key("stock_id", &"X".repeat(MAX_KEY_LENGTH + 1)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(matches!(
            validate_key("stock_id", "S\n1"),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity("quantity_sold", 1).is_ok());
        assert!(validate_quantity("quantity_sold", MAX_QUANTITY).is_ok());
        assert!(validate_quantity("quantity_sold", 0).is_err());
        assert!(validate_quantity("quantity_sold", -5).is_err());
        assert!(validate_quantity("quantity_sold", MAX_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_rates() {
        assert!(validate_sell_rate(Money::from_cents(1)).is_ok());
        assert!(validate_sell_rate(Money::zero()).is_err());
        assert!(validate_commission_rate(CommissionRate::from_bps(10_000)).is_ok());
        assert!(validate_commission_rate(CommissionRate::from_bps(10_001)).is_err());
        assert!(validate_payment_amount(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_rates_have_a_ceiling() {
        let ceiling = Money::from_cents(MAX_RATE_CENTS);
        let above = Money::from_cents(MAX_RATE_CENTS + 1);
        assert!(validate_sell_rate(ceiling).is_ok());
        assert!(validate_purchase_rate(ceiling).is_ok());
        assert!(matches!(
            validate_sell_rate(above),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(matches!(
            validate_purchase_rate(above),
            Err(ValidationError::OutOfRange { .. })
        ));

        let huge: Money = "99999999999999.99".parse().unwrap();
        assert!(validate_sell_rate(huge).is_err());
        assert!(validate_payment_amount(Money::from_cents(MAX_AMOUNT_CENTS + 1)).is_err());

        // The largest accepted line amount fits in i64
        assert_eq!(
            ceiling.multiply_quantity(MAX_QUANTITY).cents(),
            MAX_AMOUNT_CENTS
        );
    }

    #[test]
    fn test_validate_new_sale() {
        let mut sale = NewSale {
            stock_id: "S1".to_string(),
            sale_id: "SALE1".to_string(),
            quantity_sold: 20,
            rate: Money::from_cents(8000),
            brand_name: String::new(),
            item_name: String::new(),
            colour_name: String::new(),
            unit: String::new(),
            agent_item_id: Some(String::new()),
        };
        assert!(validate_new_sale(&sale).is_ok());

        sale.rate = Money::zero();
        assert!(matches!(
            validate_new_sale(&sale),
            Err(ValidationError::MustBePositive { .. })
        ));
    }

    #[test]
    fn test_validate_new_stock_requires_names() {
        let stock = NewStock {
            stock_id: "S1".to_string(),
            brand_name: String::new(),
            item_name: "Emulsion".to_string(),
            colour_name: String::new(),
            unit: "Gallon".to_string(),
            total_product: 100,
            rate: Money::from_cents(5000),
        };
        assert!(matches!(
            validate_new_stock(&stock),
            Err(ValidationError::Required { field }) if field == "brand_name"
        ));
    }
}

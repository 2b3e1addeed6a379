//! Input and stock checks shared by the cart and order services.

use rust_decimal::Decimal;

use super::{error::CommerceError, types::Product};

pub fn require_positive_quantity(quantity: i32) -> Result<i32, CommerceError> {
    if quantity <= 0 {
        return Err(CommerceError::Validation(
            "Quantity must be greater than 0".into(),
        ));
    }
    Ok(quantity)
}

/// Trimmed value of a required text field.
pub fn required_field(name: &str, value: &str) -> Result<String, CommerceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CommerceError::Validation(format!("{} is required", name)));
    }
    Ok(value.to_string())
}

/// Width of `orders.contact_phone`.
pub const CONTACT_PHONE_MAX_LEN: usize = 32;

pub fn max_length(name: &str, value: String, max: usize) -> Result<String, CommerceError> {
    if value.chars().count() > max {
        return Err(CommerceError::Validation(format!(
            "{} must be at most {} characters",
            name, max
        )));
    }
    Ok(value)
}

pub fn normalize_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty())
}

/// Checks that `requested` units of `product` could be ordered right now.
pub fn ensure_orderable(product: &Product, requested: i32) -> Result<(), CommerceError> {
    if !product.state.is_active() {
        return Err(CommerceError::ProductUnavailable {
            product_id: product.id,
            name: product.name.clone(),
        });
    }

    if product.stock < requested {
        return Err(CommerceError::InsufficientStock {
            product_id: product.id,
            name: product.name.clone(),
            available: product.stock,
            requested,
        });
    }

    Ok(())
}

pub fn line_subtotal(quantity: i32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity) * unit_price
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::commerce::types::ProductState;

    fn product(stock: i32, state: ProductState) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Notebook".into(),
            description: None,
            price: dec!(4.50),
            stock,
            state,
            category_id: None,
            seller_id: None,
            image_url: None,
        }
    }

    #[test]
    fn rejects_non_positive_quantities() {
        assert!(require_positive_quantity(0).is_err());
        assert!(require_positive_quantity(-2).is_err());
        assert_eq!(require_positive_quantity(3).unwrap(), 3);
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let err = required_field("contact_phone", "   ").unwrap_err();
        assert_eq!(err, CommerceError::Validation("contact_phone is required".into()));
        assert_eq!(required_field("delivery_address", " Block B ").unwrap(), "Block B");
    }

    #[test]
    fn overlong_values_are_rejected() {
        let phone = "9".repeat(CONTACT_PHONE_MAX_LEN);
        assert_eq!(max_length("contact_phone", phone.clone(), CONTACT_PHONE_MAX_LEN), Ok(phone));

        let err = max_length("contact_phone", "9".repeat(33), CONTACT_PHONE_MAX_LEN).unwrap_err();
        assert_eq!(
            err,
            CommerceError::Validation("contact_phone must be at most 32 characters".into())
        );
    }

    #[test]
    fn blank_notes_are_dropped() {
        assert_eq!(normalize_notes(Some("  ".into())), None);
        assert_eq!(normalize_notes(Some(" ring twice ".into())).as_deref(), Some("ring twice"));
    }

    #[test]
    fn deactivation_wins_over_stock() {
        let err = ensure_orderable(&product(0, ProductState::Deactivated), 1).unwrap_err();
        assert_eq!(err.code(), "product_unavailable");

        let err = ensure_orderable(&product(2, ProductState::Active), 3).unwrap_err();
        assert!(matches!(
            err,
            CommerceError::InsufficientStock { available: 2, requested: 3, .. }
        ));

        assert!(ensure_orderable(&product(3, ProductState::Active), 3).is_ok());
    }

    #[test]
    fn subtotal_multiplies_snapshot_price() {
        assert_eq!(line_subtotal(3, dec!(4.50)), dec!(13.50));
    }
}

//! Cart policy settings.

use jiff::SignedDuration;
use rust_decimal::Decimal;

/// Policy switches and defaults shared by the cart services.
#[derive(Debug, Clone)]
pub struct CartSettings {
    /// Delivery used when a request names none.
    pub default_delivery_code: String,

    /// Currency of newly created carts.
    pub default_currency: String,

    /// Tax rate in percent applied when pricing new lines.
    pub default_tax_rate: Decimal,

    /// Drop deliveries that lose their last line.
    pub delete_empty_delivery: bool,

    /// Clamp quantities above a product restriction instead of rejecting them.
    pub adjust_items_to_restricted_qty: bool,

    /// Default for the "use billing address" flag of new deliveries.
    pub default_use_billing_address: bool,

    /// Cache decorated carts per session.
    pub enable_cart_cache: bool,

    /// How long a cached decorated cart stays valid.
    pub cache_lifetime: SignedDuration,

    /// Create a guest cart when a customer has none.
    pub customer_cart_guest_fallback: bool,
}

impl Default for CartSettings {
    fn default() -> Self {
        Self {
            default_delivery_code: "delivery".to_string(),
            default_currency: "EUR".to_string(),
            default_tax_rate: Decimal::ZERO,
            delete_empty_delivery: false,
            adjust_items_to_restricted_qty: false,
            default_use_billing_address: false,
            enable_cart_cache: true,
            cache_lifetime: SignedDuration::from_secs(1200),
            customer_cart_guest_fallback: false,
        }
    }
}

impl CartSettings {
    /// The requested delivery code, or the default one when empty.
    pub fn delivery_code_or_default<'a>(&'a self, delivery_code: &'a str) -> &'a str {
        if delivery_code.is_empty() {
            &self.default_delivery_code
        } else {
            delivery_code
        }
    }
}

//! Cart Policy Config

use clap::Args;
use jiff::SignedDuration;
use rust_decimal::Decimal;

use trolley_app::settings::CartSettings;

/// Cart policy switches and defaults.
#[derive(Debug, Args)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "independent policy toggles from CLI/env."
)]
pub struct CartConfig {
    /// Delivery used when a request names none.
    #[arg(long, env = "CART_DEFAULT_DELIVERY_CODE", default_value = "delivery")]
    pub default_delivery_code: String,

    /// Currency of new carts.
    #[arg(long, env = "CART_DEFAULT_CURRENCY", default_value = "EUR")]
    pub default_currency: String,

    /// Tax rate in percent applied to new lines.
    #[arg(long, env = "CART_DEFAULT_TAX_RATE", default_value = "0")]
    pub default_tax_rate: Decimal,

    /// Remove deliveries that become empty.
    #[arg(long, env = "CART_DELETE_EMPTY_DELIVERY", default_value_t = false)]
    pub delete_empty_delivery: bool,

    /// Clamp quantities above a product restriction instead of rejecting.
    #[arg(long, env = "CART_ADJUST_ITEMS_TO_RESTRICTED_QTY", default_value_t = false)]
    pub adjust_items_to_restricted_qty: bool,

    /// Ship new deliveries to the billing address.
    #[arg(long, env = "CART_DEFAULT_USE_BILLING_ADDRESS", default_value_t = false)]
    pub default_use_billing_address: bool,

    /// Cache decorated carts per session.
    #[arg(
        long,
        env = "CART_ENABLE_CACHE",
        default_value_t = true,
        action = clap::ArgAction::Set
    )]
    pub enable_cache: bool,

    /// Lifetime of cached carts in seconds.
    #[arg(long, env = "CART_CACHE_LIFETIME_SECONDS", default_value_t = 1_200_i64)]
    pub cache_lifetime_seconds: i64,

    /// Create a guest cart when a customer has none.
    #[arg(long, env = "CART_CUSTOMER_GUEST_FALLBACK", default_value_t = false)]
    pub customer_guest_fallback: bool,
}

impl From<&CartConfig> for CartSettings {
    fn from(config: &CartConfig) -> Self {
        Self {
            default_delivery_code: config.default_delivery_code.clone(),
            default_currency: config.default_currency.clone(),
            default_tax_rate: config.default_tax_rate,
            delete_empty_delivery: config.delete_empty_delivery,
            adjust_items_to_restricted_qty: config.adjust_items_to_restricted_qty,
            default_use_billing_address: config.default_use_billing_address,
            enable_cart_cache: config.enable_cache,
            cache_lifetime: SignedDuration::from_secs(config.cache_lifetime_seconds.max(0)),
            customer_cart_guest_fallback: config.customer_guest_fallback,
        }
    }
}

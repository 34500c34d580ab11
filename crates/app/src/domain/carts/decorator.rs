//! Decorated cart factory.

use std::{fmt, sync::Arc};

use tracing::warn;
use trolley::{
    cart::{Cart, Item},
    decorated::{DecoratedCart, DecoratedDelivery, DecoratedItem, DecorationWarning},
    products::Product,
};

use crate::domain::products::ProductService;

/// Builds decorated carts by resolving every line against the catalog.
///
/// Catalog misses never fail decoration: the line gets a placeholder product
/// and the cart carries a [`DecorationWarning`].
#[derive(Clone)]
pub struct DecoratedCartFactory {
    products: Arc<dyn ProductService>,
}

impl fmt::Debug for DecoratedCartFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratedCartFactory").finish_non_exhaustive()
    }
}

impl DecoratedCartFactory {
    pub fn new(products: Arc<dyn ProductService>) -> Self {
        Self { products }
    }

    pub async fn create(&self, cart: Cart) -> DecoratedCart {
        let mut warnings = Vec::new();
        let mut deliveries = Vec::with_capacity(cart.deliveries.len());

        for delivery in &cart.deliveries {
            let mut items = Vec::with_capacity(delivery.items.len());

            for item in &delivery.items {
                let product = match self.resolve(item).await {
                    Ok(product) => product,
                    Err(reason) => {
                        warn!(
                            cart_id = %cart.id,
                            item_id = %item.id,
                            marketplace_code = %item.marketplace_code,
                            %reason,
                            "decorating line with placeholder product"
                        );

                        warnings.push(DecorationWarning {
                            item_id: item.id.clone(),
                            marketplace_code: item.marketplace_code.clone(),
                            reason,
                        });

                        Product::placeholder(item.marketplace_code.clone())
                    }
                };

                items.push(DecoratedItem {
                    item: item.clone(),
                    product,
                });
            }

            deliveries.push(DecoratedDelivery {
                delivery: delivery.clone(),
                items,
            });
        }

        DecoratedCart {
            cart,
            deliveries,
            warnings,
        }
    }

    async fn resolve(&self, item: &Item) -> Result<Product, String> {
        let product = self
            .products
            .get(&item.marketplace_code)
            .await
            .map_err(|error| error.to_string())?;

        match item.variant_marketplace_code.as_deref() {
            Some(variant) => product
                .with_active_variant(variant)
                .ok_or_else(|| format!("variant {variant} not found")),
            None => Ok(product),
        }
    }
}

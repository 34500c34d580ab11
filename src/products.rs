//! Catalog products as seen by the cart

use serde::{Deserialize, Serialize};

/// A variant of a configurable product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Variant marketplace code
    pub marketplace_code: String,

    /// Display title
    pub title: String,

    /// Net price in minor units
    pub price: u64,

    /// Maximum quantity a cart may hold, if restricted
    #[serde(default)]
    pub max_qty: Option<u32>,
}

/// Product shape.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductKind {
    /// Sold as is
    #[default]
    Simple,

    /// Sold through one of its variants
    Configurable {
        /// Available variants
        variants: Vec<Variant>,

        /// Variant selected for a cart line
        #[serde(default)]
        active_variant: Option<String>,
    },
}

/// Catalog data of a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Marketplace code
    pub marketplace_code: String,

    /// Display title
    pub title: String,

    /// Net price in minor units
    pub price: u64,

    /// Maximum quantity a cart may hold, if restricted
    #[serde(default)]
    pub max_qty: Option<u32>,

    /// Product shape
    #[serde(default)]
    pub kind: ProductKind,

    /// Stand-in for a product the catalog could not resolve
    #[serde(default)]
    pub is_placeholder: bool,
}

impl Product {
    /// A simple product.
    pub fn simple(marketplace_code: impl Into<String>, title: impl Into<String>, price: u64) -> Self {
        Self {
            marketplace_code: marketplace_code.into(),
            title: title.into(),
            price,
            max_qty: None,
            kind: ProductKind::Simple,
            is_placeholder: false,
        }
    }

    /// Minimal product used when decoration cannot resolve the real one.
    pub fn placeholder(marketplace_code: impl Into<String>) -> Self {
        let marketplace_code = marketplace_code.into();

        Self {
            title: marketplace_code.clone(),
            is_placeholder: true,
            ..Self::simple(marketplace_code, String::new(), 0)
        }
    }

    /// Returns this product with the given variant selected.
    ///
    /// Returns `None` for simple products and unknown variants.
    #[must_use]
    pub fn with_active_variant(mut self, variant_code: &str) -> Option<Self> {
        let ProductKind::Configurable {
            variants,
            active_variant,
        } = &mut self.kind
        else {
            return None;
        };

        if !variants
            .iter()
            .any(|variant| variant.marketplace_code == variant_code)
        {
            return None;
        }

        *active_variant = Some(variant_code.to_string());

        Some(self)
    }

    /// The selected variant, if any.
    pub fn active_variant(&self) -> Option<&Variant> {
        match &self.kind {
            ProductKind::Configurable {
                variants,
                active_variant: Some(code),
            } => variants
                .iter()
                .find(|variant| &variant.marketplace_code == code),
            _ => None,
        }
    }

    /// Price of the selected variant, or of the product itself.
    pub fn effective_price(&self) -> u64 {
        self.active_variant()
            .map_or(self.price, |variant| variant.price)
    }

    /// Title of the selected variant, or of the product itself.
    pub fn effective_title(&self) -> &str {
        self.active_variant()
            .map_or(self.title.as_str(), |variant| variant.title.as_str())
    }

    /// Quantity restriction of the selected variant, or of the product itself.
    pub fn effective_max_qty(&self) -> Option<u32> {
        match self.active_variant() {
            Some(variant) => variant.max_qty,
            None => self.max_qty,
        }
    }
}

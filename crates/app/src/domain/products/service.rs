//! Product catalog service.

use std::{fs, path::Path};

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use trolley::products::Product;

use crate::domain::products::ProductServiceError;

/// Catalog held in memory, keyed by marketplace code.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductService {
    products: FxHashMap<String, Product>,
}

impl InMemoryProductService {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products
                .into_iter()
                .map(|product| (product.marketplace_code.clone(), product))
                .collect(),
        }
    }

    /// Loads a catalog from a JSON array of products.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProductServiceError> {
        let contents = fs::read_to_string(path)?;
        let products: Vec<Product> = serde_json::from_str(&contents)?;

        Ok(Self::new(products))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl ProductService for InMemoryProductService {
    async fn get(&self, marketplace_code: &str) -> Result<Product, ProductServiceError> {
        self.products
            .get(marketplace_code)
            .cloned()
            .ok_or(ProductServiceError::NotFound)
    }
}

#[automock]
#[async_trait]
pub trait ProductService: Send + Sync {
    /// Looks a product up by marketplace code.
    async fn get(&self, marketplace_code: &str) -> Result<Product, ProductServiceError>;
}

//! JSON seed data for the catalog and customer carts.
//!
//! ```json
//! {
//!   "products": [{ "id": "…", "name": "Mug", "price": "10.00", "stock": 5 }],
//!   "carts": [{ "owner": "…", "items": [{ "product": "…", "quantity": 2 }] }]
//! }
//! ```

use crate::domain::cart::{CartSnapshot, Product};
use crate::domain::ports::{CartStore, Catalog};
use crate::error::Result;
use serde::Deserialize;
use std::io::Read;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub carts: Vec<CartSnapshot>,
}

impl SeedData {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        Ok(serde_json::from_reader(source)?)
    }

    /// Writes every product and cart into the given stores.
    pub async fn load_into(self, catalog: &dyn Catalog, carts: &dyn CartStore) -> Result<()> {
        let (products, snapshots) = (self.products.len(), self.carts.len());
        for product in self.products {
            catalog.put(product).await?;
        }
        for cart in self.carts {
            carts.put(cart).await?;
        }
        info!(products, carts = snapshots, "Seed data loaded");
        Ok(())
    }
}

//! # Catalog Service
//!
//! Fetches the raw options payload of a menu item and normalizes it.
//!
//! ```text
//! GET {base}/items/{id}/options ──► serde_json::Value ──► normalize ──► ItemOptions
//! ```

use async_trait::async_trait;
use bistro_core::catalog::normalize;
use bistro_core::{ItemId, ItemOptions};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// Source of item option catalogs.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Options for one menu item, already normalized.
    async fn fetch_item_options(&self, item_id: ItemId) -> ClientResult<ItemOptions>;
}

/// [`CatalogService`] over the storefront HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCatalogService {
    api: ApiClient,
}

impl HttpCatalogService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CatalogService for HttpCatalogService {
    async fn fetch_item_options(&self, item_id: ItemId) -> ClientResult<ItemOptions> {
        let payload: serde_json::Value = self
            .api
            .get(&format!("items/{item_id}/options"))
            .await
            .map_err(|e| {
                warn!(item_id, error = %e, "Item options fetch failed");
                e
            })?;

        let options = normalize(&payload).map_err(ClientError::from)?;
        debug!(
            item_id,
            groups = options.selection_groups.len(),
            ingredients = options.ingredients.len(),
            "Item options loaded"
        );
        Ok(options)
    }
}

//! # Basket Storage
//!
//! Persists the basket between visits, like the browser's local storage.
//!
//! ## File Layout
//! ```text
//! basket.json       current basket (camelCase lines + applied coupon)
//! basket.json.tmp   written first, then renamed over basket.json
//! ```
//!
//! A missing file yields an empty basket. So does a corrupt file, or one
//! whose basket fails [`Basket::validate`]: it must never block the customer
//! from ordering.

use async_trait::async_trait;
use bistro_core::Basket;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ClientResult;

/// Where the basket lives between sessions.
#[async_trait]
pub trait BasketStorage: Send + Sync {
    async fn load(&self) -> ClientResult<Basket>;
    async fn save(&self, basket: &Basket) -> ClientResult<()>;
    async fn clear(&self) -> ClientResult<()>;
}

/// [`BasketStorage`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileBasketStorage {
    path: PathBuf,
}

impl JsonFileBasketStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl BasketStorage for JsonFileBasketStorage {
    async fn load(&self) -> ClientResult<Basket> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No stored basket");
                return Ok(Basket::new());
            }
            Err(e) => return Err(e.into()),
        };

        let basket = match serde_json::from_slice::<Basket>(&bytes) {
            Ok(basket) => basket,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Stored basket is corrupt, starting empty");
                return Ok(Basket::new());
            }
        };

        match basket.validate() {
            Ok(()) => {
                debug!(path = ?self.path, lines = basket.len(), "Basket restored");
                Ok(basket)
            }
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Stored basket is invalid, starting empty");
                Ok(Basket::new())
            }
        }
    }

    async fn save(&self, basket: &Basket) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(basket)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, json).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        debug!(path = ?self.path, lines = basket.len(), "Basket saved");
        Ok(())
    }

    async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bistro_core::{ConfiguredLineItem, DiscountRate, MenuItem, Money, PriceQuote};

    fn basket() -> Basket {
        let item = MenuItem::new(1, "Burger", Money::from_cents(1000));
        let quote = PriceQuote {
            original_price: Money::from_cents(1000),
            discounted_price: Money::from_cents(1000),
            discount: DiscountRate::zero(),
            single_item_price: Money::from_cents(1000),
            quantity: 2,
        };
        let mut basket = Basket::new();
        basket
            .add(ConfiguredLineItem::new(&item, vec![], &quote, 2, "no onions"))
            .unwrap();
        basket
            .apply_coupon("SAVE10", DiscountRate::from_bps(1000))
            .unwrap();
        basket
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_basket() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileBasketStorage::new(dir.path().join("basket.json"));
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileBasketStorage::new(dir.path().join("state").join("basket.json"));

        let original = basket();
        storage.save(&original).await.unwrap();
        assert!(!storage.temp_path().exists());

        let restored = storage.load().await.unwrap();
        assert_eq!(restored, original);
        assert_eq!(restored.total().cents(), 1800);
        assert_eq!(restored.coupon().map(|c| c.code.as_str()), Some("SAVE10"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_empty_basket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let storage = JsonFileBasketStorage::new(&path);
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_basket_is_empty_basket() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("basket.json");

        let mut json = serde_json::to_value(basket()).unwrap();
        json["lines"][0]["quantity"] = serde_json::json!(u32::MAX);
        tokio::fs::write(&path, serde_json::to_vec(&json).unwrap()).await.unwrap();

        let storage = JsonFileBasketStorage::new(&path);
        assert!(storage.load().await.unwrap().is_empty());

        // coupon prices without the coupon that produced them
        let mut json = serde_json::to_value(basket()).unwrap();
        json.as_object_mut().unwrap().remove("coupon");
        tokio::fs::write(&path, serde_json::to_vec(&json).unwrap()).await.unwrap();
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileBasketStorage::new(dir.path().join("basket.json"));
        storage.save(&basket()).await.unwrap();
        storage.clear().await.unwrap();
        assert!(!storage.path().exists());
        // clearing twice is fine
        storage.clear().await.unwrap();
    }
}

//! Minimum delivery order value per postal code.

use async_trait::async_trait;
use bistro_core::Money;
use tracing::warn;

use crate::http::ApiClient;

/// Minimum order lookup for delivery checkouts.
///
/// A failed lookup is not fatal: the order proceeds without a minimum.
#[async_trait]
pub trait MinimumOrderService: Send + Sync {
    async fn minimum_for(&self, postal_code: &str) -> Option<Money>;
}

/// [`MinimumOrderService`] over
/// `GET {base}/api/PostcodeMinimumOrder/GetMinimumOrderValue/{postcode}`.
#[derive(Debug, Clone)]
pub struct HttpMinimumOrderService {
    api: ApiClient,
}

impl HttpMinimumOrderService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl MinimumOrderService for HttpMinimumOrderService {
    async fn minimum_for(&self, postal_code: &str) -> Option<Money> {
        let path = format!(
            "api/PostcodeMinimumOrder/GetMinimumOrderValue/{}",
            postal_code.trim()
        );
        match self.api.get::<serde_json::Value>(&path).await {
            Ok(value) => parse_minimum(&value),
            Err(e) => {
                warn!(postal_code, error = %e, "Minimum order lookup failed");
                None
            }
        }
    }
}

/// Accepts a bare number or a numeric string; zero means no minimum.
fn parse_minimum(value: &serde_json::Value) -> Option<Money> {
    let text = match value {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => return None,
    };
    Money::parse_decimal(&text).filter(|m| m.is_positive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_minimum() {
        assert_eq!(parse_minimum(&json!(15)), Some(Money::from_cents(1500)));
        assert_eq!(parse_minimum(&json!(12.5)), Some(Money::from_cents(1250)));
        assert_eq!(parse_minimum(&json!("20")), Some(Money::from_cents(2000)));
        assert_eq!(parse_minimum(&json!(0)), None);
        assert_eq!(parse_minimum(&json!(null)), None);
    }
}

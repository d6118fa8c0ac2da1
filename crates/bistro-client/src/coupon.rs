//! # Coupon Service
//!
//! Validates a coupon code against the customer and the basket contents.
//!
//! ## Wire Format
//! ```text
//! POST {base}/api/coupons/validate-schedule
//! { "code": "SAVE15", "email": "ada@example.com", "basket": [ ...lines ] }
//!
//! 200 { "DiscountRatio": 0.15, "schedule": { ... } }
//! 400 { "message": "Coupon expired" }
//! ```

use async_trait::async_trait;
use bistro_core::{ConfiguredLineItem, DiscountRate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;

/// A coupon accepted by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct CouponGrant {
    pub code: String,
    pub rate: DiscountRate,
    /// Validity window as sent by the server, kept for display.
    pub schedule: Option<serde_json::Value>,
}

/// Coupon validation backend.
#[async_trait]
pub trait CouponService: Send + Sync {
    async fn validate(
        &self,
        code: &str,
        email: &str,
        lines: &[ConfiguredLineItem],
    ) -> ClientResult<CouponGrant>;
}

#[derive(Debug, Serialize)]
struct CouponRequest<'a> {
    code: &'a str,
    email: &'a str,
    basket: &'a [ConfiguredLineItem],
}

#[derive(Debug, Deserialize)]
struct CouponResponse {
    #[serde(rename = "DiscountRatio")]
    discount_ratio: serde_json::Number,
    #[serde(default)]
    schedule: Option<serde_json::Value>,
}

impl CouponResponse {
    fn into_grant(self, code: &str) -> ClientResult<CouponGrant> {
        let ratio = self.discount_ratio.to_string();
        let rate = DiscountRate::from_ratio_str(&ratio)
            .ok_or_else(|| ClientError::InvalidResponse(format!("DiscountRatio {ratio}")))?;

        Ok(CouponGrant {
            code: code.to_string(),
            rate,
            schedule: self.schedule,
        })
    }
}

/// [`CouponService`] over the storefront HTTP API.
#[derive(Debug, Clone)]
pub struct HttpCouponService {
    api: ApiClient,
}

impl HttpCouponService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CouponService for HttpCouponService {
    async fn validate(
        &self,
        code: &str,
        email: &str,
        lines: &[ConfiguredLineItem],
    ) -> ClientResult<CouponGrant> {
        let request = CouponRequest {
            code,
            email,
            basket: lines,
        };
        let response: CouponResponse = self
            .api
            .post("api/coupons/validate-schedule", &request)
            .await?;

        let grant = response.into_grant(code)?;
        info!(code, rate = %grant.rate, "Coupon accepted by server");
        Ok(grant)
    }
}

//! # bistro-client: Services and Storefront Orchestration
//!
//! The I/O half of Bistro. Talks to the storefront API, keeps the basket on
//! disk and drives [`bistro_core`] through one customer visit.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          bistro-client                                  │
//! │                                                                         │
//! │   ┌──────────────────────────── Storefront ───────────────────────────┐ │
//! │   │  SessionTracker   StepperGuards   Mutex<Session>   Mutex<Basket>  │ │
//! │   └───────┬──────────────────┬──────────────────┬─────────────────────┘ │
//! │           │                  │                  │                       │
//! │   ┌───────▼───────┐  ┌───────▼───────┐  ┌───────▼────────┐              │
//! │   │CatalogService │  │ CouponService │  │ BasketStorage  │              │
//! │   │ (HTTP GET)    │  │ (HTTP POST)   │  │ (JSON file)    │              │
//! │   └───────┬───────┘  └───────┬───────┘  └────────────────┘              │
//! │           └────── ApiClient (reqwest) ──────┘                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//! ```rust,ignore
//! let config = ClientConfig::load_or_default(None);
//! let storefront = Storefront::connect(&config)?;
//! storefront.restore_basket().await?;
//!
//! storefront.open_item(item).await?;
//! storefront.with_session(|s| s.select(large))?;
//! storefront.add_to_basket().await?;
//! ```

pub mod catalog;
pub mod config;
pub mod coupon;
pub mod error;
pub mod http;
pub mod minimum_order;
pub mod session;
pub mod stepper;
pub mod storage;
pub mod storefront;
pub mod telemetry;

pub use catalog::{CatalogService, HttpCatalogService};
pub use config::ClientConfig;
pub use coupon::{CouponGrant, CouponService, HttpCouponService};
pub use error::{ClientError, ClientResult};
pub use http::ApiClient;
pub use minimum_order::{HttpMinimumOrderService, MinimumOrderService};
pub use session::SessionTracker;
pub use stepper::{StepperGuard, StepperGuards};
pub use storage::{BasketStorage, JsonFileBasketStorage};
pub use storefront::Storefront;
pub use telemetry::init_tracing;

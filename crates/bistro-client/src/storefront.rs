//! # Storefront
//!
//! Orchestrates one customer's visit: configure items, fill the basket,
//! apply a coupon and hand a checkout draft to the payment backend.
//!
//! ## Visit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Storefront                                     │
//! │                                                                         │
//! │  open_item ──► CatalogService ──► ConfigurationSession (token #n)       │
//! │                                        │ with_session(select, ...)      │
//! │                                        ▼                                │
//! │  add_to_basket ──► commit ──► Basket.add ──► BasketStorage.save         │
//! │                                                                         │
//! │  increase_line / decrease_line ──► StepperGuard ──► save                │
//! │                                                                         │
//! │  apply_coupon ──► CouponService ──► Basket.apply_coupon ──► save        │
//! │                                                                         │
//! │  prepare_checkout ──► MinimumOrderService ──► OrderDraft                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Locking
//! The session and the basket sit behind plain mutexes that are never held
//! across an `.await`. Network calls run on snapshots.
//!
//! Storage writes are serialized by an async `writer` lock. Each write
//! clones the basket only once it holds the lock, so the last write to land
//! is always the current basket.

use bistro_core::validation::validate_coupon_code;
use bistro_core::{
    Basket, BasketNotice, BasketTotals, CardinalityMode, ConfigurationSession, ConfiguredLineItem,
    CoreError, CustomerDetails, DiscountRate, MenuItem, OrderDraft, OrderMethod, PaymentMethod,
    PriceQuote, PricingPolicy, SessionToken,
};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogService, HttpCatalogService};
use crate::config::ClientConfig;
use crate::coupon::{CouponService, HttpCouponService};
use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::minimum_order::{HttpMinimumOrderService, MinimumOrderService};
use crate::session::SessionTracker;
use crate::stepper::StepperGuards;
use crate::storage::{BasketStorage, JsonFileBasketStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
}

/// One customer's storefront state.
pub struct Storefront {
    catalog: Arc<dyn CatalogService>,
    coupons: Arc<dyn CouponService>,
    storage: Arc<dyn BasketStorage>,
    minimum_orders: Option<Arc<dyn MinimumOrderService>>,
    policy: PricingPolicy,
    mode: CardinalityMode,
    tracker: SessionTracker,
    session: Mutex<Option<ConfigurationSession>>,
    basket: Mutex<Basket>,
    writer: tokio::sync::Mutex<()>,
    steppers: StepperGuards,
}

impl Storefront {
    /// Creates a storefront over explicit services.
    pub fn new(
        config: &ClientConfig,
        catalog: Arc<dyn CatalogService>,
        coupons: Arc<dyn CouponService>,
        storage: Arc<dyn BasketStorage>,
    ) -> Self {
        Storefront {
            catalog,
            coupons,
            storage,
            minimum_orders: None,
            policy: config.pricing_policy(),
            mode: config.cardinality_mode(),
            tracker: SessionTracker::new(),
            session: Mutex::new(None),
            basket: Mutex::new(Basket::new()),
            writer: tokio::sync::Mutex::new(()),
            steppers: StepperGuards::new(),
        }
    }

    /// Creates a storefront talking to the configured HTTP API and storing
    /// the basket in the configured file.
    pub fn connect(config: &ClientConfig) -> ClientResult<Self> {
        let api = ApiClient::new(&config.api)?;
        let path = config
            .basket_path()
            .ok_or_else(|| ClientError::Config("No basket path available".into()))?;

        info!(base_url = api.base_url(), ?path, "Storefront connected");

        Ok(Self::new(
            config,
            Arc::new(HttpCatalogService::new(api.clone())),
            Arc::new(HttpCouponService::new(api.clone())),
            Arc::new(JsonFileBasketStorage::new(path)),
        )
        .with_minimum_orders(Arc::new(HttpMinimumOrderService::new(api))))
    }

    /// Enables the minimum order check for delivery checkouts.
    pub fn with_minimum_orders(mut self, service: Arc<dyn MinimumOrderService>) -> Self {
        self.minimum_orders = Some(service);
        self
    }

    // =========================================================================
    // Item Configuration
    // =========================================================================

    /// Loads an item's options and opens a configuration session for it.
    ///
    /// ## Superseded Opens
    /// If another item is opened (or the popup closed) before the options
    /// arrive, the late response is discarded and
    /// [`ClientError::SessionSuperseded`] is returned.
    pub async fn open_item(&self, item: MenuItem) -> ClientResult<SessionToken> {
        let token = self.tracker.begin();
        debug!(%token, item_id = item.id, "Opening item");

        let options = self.catalog.fetch_item_options(item.id).await?;

        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.tracker.is_current(token) {
            warn!(%token, item_id = item.id, "Discarding superseded item options");
            return Err(ClientError::SessionSuperseded { token });
        }

        *slot = Some(ConfigurationSession::with_rules(
            token,
            item,
            options,
            self.policy,
            self.mode,
        ));
        info!(%token, "Item opened");
        Ok(token)
    }

    /// Closes the item popup; a pending open is discarded too.
    pub fn close_item(&self) {
        self.tracker.invalidate();
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = slot.take() {
            debug!(token = %session.token(), "Item closed");
        }
    }

    /// Runs `f` against the open configuration session.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// storefront.with_session(|s| s.select(key))?;
    /// let quote = storefront.with_session(|s| s.quote().clone())?;
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> ClientResult<R>
    where
        F: FnOnce(&mut ConfigurationSession) -> R,
    {
        let mut slot = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_mut().map(f).ok_or(ClientError::NoActiveSession)
    }

    /// Current price of the open item.
    pub fn current_quote(&self) -> ClientResult<PriceQuote> {
        self.with_session(|s| s.quote().clone())
    }

    /// Commits the open item into the basket and closes it.
    ///
    /// An incomplete selection leaves the session open and untouched.
    pub async fn add_to_basket(&self) -> ClientResult<usize> {
        let line = self.with_session(|s| s.commit())??;

        let index = self.with_basket_mut(|basket| Ok(basket.add(line)?))?;

        self.close_item();
        self.persist().await?;
        Ok(index)
    }

    // =========================================================================
    // Basket
    // =========================================================================

    /// Restores the persisted basket, replacing the in-memory one.
    ///
    /// A stored basket that breaks a basket invariant is dropped.
    pub async fn restore_basket(&self) -> ClientResult<BasketTotals> {
        let _writer = self.writer.lock().await;
        let mut restored = self.storage.load().await?;
        if let Err(e) = restored.validate() {
            warn!(error = %e, "Stored basket is invalid, starting empty");
            restored = Basket::new();
        }
        let totals = restored.totals();
        *self.basket.lock().unwrap_or_else(PoisonError::into_inner) = restored;
        info!(lines = totals.line_count, "Basket restored");
        Ok(totals)
    }

    /// Runs `f` with read access to the basket.
    pub fn with_basket<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Basket) -> R,
    {
        let basket = self.basket.lock().unwrap_or_else(PoisonError::into_inner);
        f(&basket)
    }

    pub fn basket(&self) -> Basket {
        self.with_basket(Basket::clone)
    }

    pub fn totals(&self) -> BasketTotals {
        self.with_basket(Basket::totals)
    }

    /// Returns the pending basket notice, if any.
    pub fn take_notice(&self) -> Option<BasketNotice> {
        self.basket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take_notice()
    }

    /// Stepper "+". Returns `false` when the click was dropped because the
    /// line is still busy.
    pub async fn increase_line(&self, index: usize) -> ClientResult<bool> {
        self.step_line(index, Step::Up).await
    }

    /// Stepper "−" (never below 1).
    pub async fn decrease_line(&self, index: usize) -> ClientResult<bool> {
        self.step_line(index, Step::Down).await
    }

    async fn step_line(&self, index: usize, step: Step) -> ClientResult<bool> {
        let Some(_guard) = self.steppers.try_acquire(index) else {
            return Ok(false);
        };

        self.with_basket_mut(|basket| {
            match step {
                Step::Up => basket.increase_quantity(index)?,
                Step::Down => basket.decrease_quantity(index)?,
            };
            Ok(())
        })?;

        self.persist().await?;
        Ok(true)
    }

    /// Sets a line's quantity; `0` removes it.
    pub async fn update_line_quantity(&self, index: usize, quantity: u32) -> ClientResult<()> {
        self.with_basket_mut(|basket| Ok(basket.update_quantity(index, quantity)?))?;
        self.persist().await
    }

    pub async fn remove_line(&self, index: usize) -> ClientResult<ConfiguredLineItem> {
        let line = self.with_basket_mut(|basket| Ok(basket.remove(index)?))?;
        self.persist().await?;
        Ok(line)
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Validates a coupon with the server and applies it to every line.
    ///
    /// Fails with [`ClientError::BasketChanged`] if the basket was modified
    /// while the server was deciding.
    pub async fn apply_coupon(&self, code: &str, email: &str) -> ClientResult<DiscountRate> {
        let code = validate_coupon_code(code)?;

        let lines = self.with_basket(|basket| {
            if basket.is_empty() {
                Err(CoreError::EmptyBasket)
            } else {
                Ok(basket.lines().to_vec())
            }
        })?;

        let grant = self.coupons.validate(&code, email.trim(), &lines).await?;

        self.with_basket_mut(|basket| {
            if basket.lines() != lines.as_slice() {
                return Err(ClientError::BasketChanged);
            }
            Ok(basket.apply_coupon(&grant.code, grant.rate)?)
        })?;

        self.persist().await?;
        Ok(grant.rate)
    }

    pub async fn remove_coupon(&self) -> ClientResult<()> {
        self.with_basket_mut(|basket| {
            basket.remove_coupon();
            Ok(())
        })?;
        self.persist().await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Validates the checkout form and builds the order draft.
    ///
    /// Delivery orders look up the minimum order value for the customer's
    /// postal code first.
    pub async fn prepare_checkout(
        &self,
        customer: CustomerDetails,
        order_method: OrderMethod,
        payment_method: PaymentMethod,
    ) -> ClientResult<OrderDraft> {
        let minimum = match (&self.minimum_orders, &customer.address) {
            (Some(service), Some(address)) if order_method.is_delivery() => {
                service.minimum_for(&address.postal_code).await
            }
            _ => None,
        };

        let draft = self.with_basket(|basket| {
            OrderDraft::from_basket(basket, customer, order_method, payment_method, minimum)
        })?;

        info!(
            order_id = %draft.id,
            lines = draft.lines.len(),
            total = %draft.total_amount,
            "Checkout draft prepared"
        );
        Ok(draft)
    }

    /// Empties the basket after the order was placed.
    pub async fn complete_order(&self) -> ClientResult<()> {
        let _writer = self.writer.lock().await;
        self.basket
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.storage.clear().await?;
        info!("Order completed, basket cleared");
        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn with_basket_mut<F, R>(&self, f: F) -> ClientResult<R>
    where
        F: FnOnce(&mut Basket) -> ClientResult<R>,
    {
        let mut basket = self.basket.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut basket)
    }

    /// Writes the current basket. On failure the in-memory basket keeps
    /// the change.
    async fn persist(&self) -> ClientResult<()> {
        let _writer = self.writer.lock().await;
        let snapshot = self.basket();
        self.storage.save(&snapshot).await.map_err(|e| {
            warn!(error = %e, "Failed to persist basket");
            e
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! Paper trading venue with simulated fills
//!
//! In-memory venue used by paper mode and the integration tests. Orders
//! fill immediately at the limit price; windows and token prices are
//! seeded by the harness.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::types::{Balance, MarketWindow, OrderReceipt, OrderSide};
use super::{select_windows, VenueClient, VenueError};
use crate::buffer::{Asset, Timeframe};

/// Simulated venue holding balance, windows, and prices in memory
pub struct PaperVenue {
    balance: RwLock<Balance>,
    windows: RwLock<Vec<MarketWindow>>,
    prices: RwLock<HashMap<String, Decimal>>,
    orders: RwLock<Vec<OrderReceipt>>,
    heartbeat_running: AtomicBool,
}

impl PaperVenue {
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            balance: RwLock::new(Balance {
                total: starting_balance,
                available: starting_balance,
            }),
            windows: RwLock::new(vec![]),
            prices: RwLock::new(HashMap::new()),
            orders: RwLock::new(vec![]),
            heartbeat_running: AtomicBool::new(false),
        }
    }

    /// Seed or replace the active window set
    pub async fn set_windows(&self, windows: Vec<MarketWindow>) {
        *self.windows.write().await = windows;
    }

    /// Seed a token price
    pub async fn set_price(&self, token_id: impl Into<String>, price: Decimal) {
        self.prices.write().await.insert(token_id.into(), price);
    }

    /// Orders placed so far
    pub async fn orders(&self) -> Vec<OrderReceipt> {
        self.orders.read().await.clone()
    }

    /// Apply a balance delta (used when simulating settlements)
    pub async fn adjust_balance(&self, delta: Decimal) {
        let mut balance = self.balance.write().await;
        balance.total += delta;
        balance.available += delta;
    }

    pub fn heartbeat_running(&self) -> bool {
        self.heartbeat_running.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VenueClient for PaperVenue {
    async fn get_balance(&self) -> Result<Balance, VenueError> {
        Ok(*self.balance.read().await)
    }

    async fn find_active_windows(
        &self,
        asset: Asset,
        timeframe: Timeframe,
    ) -> Result<Vec<MarketWindow>, VenueError> {
        let windows: Vec<MarketWindow> = self
            .windows
            .read()
            .await
            .iter()
            .filter(|w| w.asset == asset)
            .cloned()
            .collect();
        Ok(select_windows(windows, asset, timeframe))
    }

    async fn get_price(&self, token_id: &str) -> Result<Decimal, VenueError> {
        Ok(self
            .prices
            .read()
            .await
            .get(token_id)
            .copied()
            .unwrap_or(dec!(0.5)))
    }

    async fn place_limit_order(
        &self,
        token_id: &str,
        side: OrderSide,
        price: Decimal,
        size: Decimal,
    ) -> Result<OrderReceipt, VenueError> {
        let cost = size;
        {
            let mut balance = self.balance.write().await;
            if side == OrderSide::Buy {
                if balance.available < cost {
                    return Err(VenueError::OrderRejected(format!(
                        "insufficient balance: need {cost}, have {}",
                        balance.available
                    )));
                }
                balance.available -= cost;
            } else {
                balance.available += cost;
            }
        }

        let receipt = OrderReceipt {
            order_id: Uuid::new_v4().to_string(),
            token_id: token_id.to_string(),
            side,
            price,
            size,
            timestamp: Utc::now(),
        };
        self.orders.write().await.push(receipt.clone());
        tracing::info!(order_id = %receipt.order_id, %token_id, "paper order filled");
        Ok(receipt)
    }

    async fn start_heartbeat(&self) -> Result<(), VenueError> {
        self.heartbeat_running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_heartbeat(&self) -> Result<(), VenueError> {
        self.heartbeat_running.store(false, Ordering::SeqCst);
        Ok(())
    }
}

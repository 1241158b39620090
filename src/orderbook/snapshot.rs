//! Order book snapshot for market data

use super::level::PriceLevel;
use serde::{Deserialize, Serialize};

/// Best bid and ask with their aggregate level quantities. Either side may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopOfBook {
    /// Best bid price, if the bid side is non-empty
    pub bid_price: Option<i64>,
    /// Aggregate quantity at the best bid
    pub bid_quantity: Option<i64>,
    /// Best ask price, if the ask side is non-empty
    pub ask_price: Option<i64>,
    /// Aggregate quantity at the best ask
    pub ask_quantity: Option<i64>,
}

/// One price level as reported in depth views: price, aggregate quantity and order count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthLevel {
    /// Level price in ticks
    pub price: i64,
    /// Sum of remaining quantities at this level
    pub quantity: i64,
    /// Number of orders resting at this level
    pub order_count: usize,
}

impl DepthLevel {
    pub(crate) fn from_level(level: &PriceLevel) -> Self {
        Self {
            price: level.price(),
            quantity: level.total_quantity(),
            order_count: level.order_count(),
        }
    }
}

/// A snapshot of the order book state at a specific point in time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    /// The symbol or identifier for this order book
    pub symbol: String,

    /// Timestamp when the snapshot was created (microseconds since epoch)
    pub timestamp: u64,

    /// Bid levels from best outward
    pub bids: Vec<DepthLevel>,

    /// Ask levels from best outward
    pub asks: Vec<DepthLevel>,
}

impl OrderBookSnapshot {
    /// Get the best bid price and quantity
    pub fn best_bid(&self) -> Option<(i64, i64)> {
        self.bids.first().map(|level| (level.price, level.quantity))
    }

    /// Get the best ask price and quantity
    pub fn best_ask(&self) -> Option<(i64, i64)> {
        self.asks.first().map(|level| (level.price, level.quantity))
    }

    /// Get the mid price (average of best bid and best ask)
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid_price, _)), Some((ask_price, _))) => {
                Some((bid_price as f64 + ask_price as f64) / 2.0)
            }
            _ => None,
        }
    }

    /// Get the spread (best ask - best bid)
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some((bid_price, _)), Some((ask_price, _))) => Some(ask_price - bid_price),
            _ => None,
        }
    }

    /// Calculate the total volume on the bid side
    pub fn total_bid_volume(&self) -> i64 {
        self.bids.iter().map(|level| level.quantity).sum()
    }

    /// Calculate the total volume on the ask side
    pub fn total_ask_volume(&self) -> i64 {
        self.asks.iter().map(|level| level.quantity).sum()
    }
}

//! Trade execution record.

use crate::utils::current_time_micros;
use serde::{Deserialize, Serialize};

/// An executed match between a buy and a sell order.
///
/// The price is always the resting order's price, so any price improvement accrues to the
/// aggressor. Trade ids are assigned monotonically by the engine worker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Monotonically increasing id assigned by the engine
    pub trade_id: u64,
    /// Symbol the trade occurred on
    pub symbol: String,
    /// Id of the buy-side order, whether it was aggressor or resting
    pub buy_order_id: u64,
    /// Id of the sell-side order, whether it was aggressor or resting
    pub sell_order_id: u64,
    /// Execution price in ticks (the resting order's price)
    pub price: i64,
    /// Executed quantity
    pub quantity: i64,
    /// Execution timestamp, microseconds since epoch
    pub timestamp: u64,
}

impl Trade {
    /// Create a trade stamped with the current time.
    pub fn new(
        trade_id: u64,
        symbol: &str,
        buy_order_id: u64,
        sell_order_id: u64,
        price: i64,
        quantity: i64,
    ) -> Self {
        Self {
            trade_id,
            symbol: symbol.to_string(),
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            timestamp: current_time_micros(),
        }
    }
}

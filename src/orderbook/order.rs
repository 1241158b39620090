//! Order value type and its lifecycle states.

use crate::utils::current_time_micros;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an order: bid (buy) or ask (sell).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Buy side (bids)
    Buy,
    /// Sell side (asks)
    Sell,
}

impl Side {
    /// Returns the opposite side of the book, the one an order matches against.
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Execution style of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    /// Execute at the limit price or better; the remainder rests in the book
    Limit,
    /// Execute immediately against available liquidity; never rests
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

/// Lifecycle state of an order.
///
/// Transitions form a DAG: `New` may become `PartiallyFilled`, `Filled`, `Cancelled` or
/// `Rejected`; `PartiallyFilled` may become `Filled` or `Cancelled`. A market order whose
/// remainder cannot be matched ends as `Rejected` (see the engine's matching rules).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Accepted, nothing filled yet
    New,
    /// Some quantity filled, some remaining
    PartiallyFilled,
    /// Fully filled
    Filled,
    /// Cancelled by the client
    Cancelled,
    /// Rejected by the engine (e.g. unmatchable market order)
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::New => write!(f, "NEW"),
            OrderStatus::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            OrderStatus::Filled => write!(f, "FILLED"),
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// A single order. Prices are integer ticks, quantities are integer lots; scaling either to
/// a currency or a lot size is the client's concern.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Unique order id assigned by the client
    pub id: u64,
    /// Symbol this order trades
    pub symbol: String,
    /// Buy or sell
    pub side: Side,
    /// Limit or market
    pub order_type: OrderType,
    /// Limit price in ticks; ignored for market orders
    pub price: i64,
    /// Total quantity
    pub quantity: i64,
    /// Quantity filled so far
    pub filled_quantity: i64,
    /// Current lifecycle state
    pub status: OrderStatus,
    /// Arrival timestamp, microseconds since epoch
    pub timestamp: u64,
    /// Assigned by the book on insertion; strictly increasing, used for time priority
    pub sequence_number: u64,
}

impl Order {
    /// Create a new order in `New` state with the arrival timestamp taken now.
    pub fn new(
        id: u64,
        symbol: &str,
        side: Side,
        order_type: OrderType,
        price: i64,
        quantity: i64,
    ) -> Self {
        Self {
            id,
            symbol: symbol.to_string(),
            side,
            order_type,
            price,
            quantity,
            filled_quantity: 0,
            status: OrderStatus::New,
            timestamp: current_time_micros(),
            sequence_number: 0,
        }
    }

    /// Convenience constructor for a limit order.
    pub fn limit(id: u64, symbol: &str, side: Side, price: i64, quantity: i64) -> Self {
        Self::new(id, symbol, side, OrderType::Limit, price, quantity)
    }

    /// Convenience constructor for a market order. The price field is unused for matching.
    pub fn market(id: u64, symbol: &str, side: Side, quantity: i64) -> Self {
        Self::new(id, symbol, side, OrderType::Market, 0, quantity)
    }

    /// Quantity still open on this order.
    pub fn remaining_quantity(&self) -> i64 {
        self.quantity - self.filled_quantity
    }

    /// True once the full quantity has been filled.
    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }

    /// True while the order can still trade or rest in the book.
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::New || self.status == OrderStatus::PartiallyFilled
    }

    /// Apply a fill of `quantity` and derive the resulting status.
    pub(crate) fn fill(&mut self, quantity: i64) {
        debug_assert!(quantity > 0, "fill quantity must be positive");
        debug_assert!(
            quantity <= self.remaining_quantity(),
            "fill exceeds remaining quantity"
        );
        self.filled_quantity += quantity;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
    }
}

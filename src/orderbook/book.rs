//! Core OrderBook implementation for managing price levels and resting orders

use super::error::OrderBookError;
use super::level::PriceLevel;
use super::order::{Order, OrderStatus, Side};
use super::snapshot::{DepthLevel, OrderBookSnapshot, TopOfBook};
use crate::utils::current_time_micros;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

/// The OrderBook manages the two sides of a single symbol's market.
///
/// Each side is an ordered map from price to [`PriceLevel`]: the best bid is the highest
/// bid key, the best ask the lowest ask key, and forward iteration from best walks the
/// side in priority order. An auxiliary id index locates any resting order in O(log n)
/// for cancels and replaces.
///
/// The book is a single-writer structure. The matching engine owns it exclusively after
/// construction; collaborators read it through snapshots or a shared read handle.
pub struct OrderBook {
    /// The symbol or identifier for this order book
    symbol: String,

    /// Bid side price levels (buy orders), best = highest key
    bids: BTreeMap<i64, PriceLevel>,

    /// Ask side price levels (sell orders), best = lowest key
    asks: BTreeMap<i64, PriceLevel>,

    /// Map from order id to (side, price) so cancels avoid scanning both sides
    order_locations: HashMap<u64, (Side, i64)>,

    /// Source of per-book arrival sequence numbers
    sequence_counter: u64,
}

impl OrderBook {
    /// Create a new, empty order book for the given symbol
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            order_locations: HashMap::new(),
            sequence_counter: 0,
        }
    }

    /// Get the symbol of this order book
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Insert an order at its limit price, assigning its sequence number.
    ///
    /// Returns the assigned sequence number. The price level is created lazily when the
    /// first order at that price arrives.
    pub fn add_order(&mut self, mut order: Order) -> Result<u64, OrderBookError> {
        if order.symbol != self.symbol {
            return Err(OrderBookError::SymbolMismatch {
                expected: self.symbol.clone(),
                actual: order.symbol,
            });
        }
        if order.quantity <= 0 {
            return Err(OrderBookError::InvalidQuantity(order.quantity));
        }
        if self.order_locations.contains_key(&order.id) {
            return Err(OrderBookError::DuplicateOrderId(order.id));
        }

        self.sequence_counter += 1;
        order.sequence_number = self.sequence_counter;
        let sequence = order.sequence_number;

        trace!(
            "Order book {}: Adding order {} {} {}@{}",
            self.symbol, order.id, order.side, order.quantity, order.price
        );

        self.order_locations
            .insert(order.id, (order.side, order.price));
        let side = match order.side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        side.entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .add_order(order);

        Ok(sequence)
    }

    /// Detach an order by id without touching its status, erasing the level if it ends up
    /// empty. Used by the matcher for filled orders and by [`cancel_order`].
    ///
    /// [`cancel_order`]: OrderBook::cancel_order
    pub fn remove_order(&mut self, order_id: u64) -> Option<Order> {
        let (side, price) = self.order_locations.remove(&order_id)?;
        let levels = match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        };
        let level = levels.get_mut(&price)?;
        let order = level.remove_order(order_id);
        if level.is_empty() {
            levels.remove(&price);
        }
        order
    }

    /// Cancel a resting order by id.
    ///
    /// On success the order is detached, its level erased if now empty, and the order is
    /// returned with status `Cancelled`. An unknown or already-inactive id yields `None`.
    pub fn cancel_order(&mut self, order_id: u64) -> Option<Order> {
        let mut order = self.remove_order(order_id)?;
        debug_assert!(order.is_active(), "book held an inactive order");
        order.status = OrderStatus::Cancelled;
        trace!("Order book {}: Cancelled order {}", self.symbol, order_id);
        Some(order)
    }

    /// Look up a resting order by id
    pub fn get_order(&self, order_id: u64) -> Option<&Order> {
        let (side, price) = *self.order_locations.get(&order_id)?;
        let levels = match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        };
        levels.get(&price)?.find_order(order_id)
    }

    /// Get the best bid price, if any
    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    /// Get the best ask price, if any
    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    /// Get the spread (best ask - best bid)
    pub fn spread(&self) -> Option<i64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Get the mid price (average of best bid and best ask)
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    /// Best bid and ask along with their aggregate level quantities
    pub fn top_of_book(&self) -> TopOfBook {
        let bid = self.bids.values().next_back();
        let ask = self.asks.values().next();
        TopOfBook {
            bid_price: bid.map(|level| level.price()),
            bid_quantity: bid.map(|level| level.total_quantity()),
            ask_price: ask.map(|level| level.price()),
            ask_quantity: ask.map(|level| level.total_quantity()),
        }
    }

    /// Up to `max_levels` bid levels from best outward
    pub fn bid_depth(&self, max_levels: usize) -> Vec<DepthLevel> {
        self.bids
            .values()
            .rev()
            .take(max_levels)
            .map(DepthLevel::from_level)
            .collect()
    }

    /// Up to `max_levels` ask levels from best outward
    pub fn ask_depth(&self, max_levels: usize) -> Vec<DepthLevel> {
        self.asks
            .values()
            .take(max_levels)
            .map(DepthLevel::from_level)
            .collect()
    }

    /// Number of populated bid price levels
    pub fn bid_levels(&self) -> usize {
        self.bids.len()
    }

    /// Number of populated ask price levels
    pub fn ask_levels(&self) -> usize {
        self.asks.len()
    }

    /// Mutable access to the best bid level, used only by the matcher
    pub(crate) fn best_bid_level_mut(&mut self) -> Option<&mut PriceLevel> {
        self.bids.values_mut().next_back()
    }

    /// Mutable access to the best ask level, used only by the matcher
    pub(crate) fn best_ask_level_mut(&mut self) -> Option<&mut PriceLevel> {
        self.asks.values_mut().next()
    }

    /// Create a snapshot of up to `depth` levels per side for market data consumers
    pub fn create_snapshot(&self, depth: usize) -> OrderBookSnapshot {
        OrderBookSnapshot {
            symbol: self.symbol.clone(),
            timestamp: current_time_micros(),
            bids: self.bid_depth(depth),
            asks: self.ask_depth(depth),
        }
    }
}

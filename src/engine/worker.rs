//! The engine worker: event loop and matching algorithm.

use super::engine::{EngineCounters, OrderUpdateCallback, TradeCallback};
use super::event::OrderEvent;
use super::queue::EventQueue;
use super::trade::Trade;
use crate::orderbook::{Order, OrderBook, OrderStatus, OrderType, Side};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use tracing::{trace, warn};

/// Owns the matching loop. Exactly one worker exists per running engine and it is the
/// only writer of the book and the statistics counters.
pub(super) struct EngineWorker {
    symbol: String,
    book: Arc<RwLock<OrderBook>>,
    queue: Arc<EventQueue>,
    running: Arc<AtomicBool>,
    counters: Arc<EngineCounters>,
    trade_callback: Option<Arc<TradeCallback>>,
    order_update_callback: Option<Arc<OrderUpdateCallback>>,
}

impl EngineWorker {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        symbol: String,
        book: Arc<RwLock<OrderBook>>,
        queue: Arc<EventQueue>,
        running: Arc<AtomicBool>,
        counters: Arc<EngineCounters>,
        trade_callback: Option<Arc<TradeCallback>>,
        order_update_callback: Option<Arc<OrderUpdateCallback>>,
    ) -> Self {
        Self {
            symbol,
            book,
            queue,
            running,
            counters,
            trade_callback,
            order_update_callback,
        }
    }

    /// Event loop: drain the queue while running, then drain whatever remains after stop.
    pub(super) fn run(mut self) {
        while self.running.load(Ordering::Relaxed) || !self.queue.is_empty() {
            match self.queue.pop() {
                Some(event) => self.process_event(event),
                // Yield CPU when the queue is empty
                None => thread::yield_now(),
            }
        }
    }

    fn process_event(&mut self, event: OrderEvent) {
        match event {
            OrderEvent::NewOrder(order) => self.process_new_order(order),
            OrderEvent::CancelOrder { order_id } => self.process_cancel_order(order_id),
            OrderEvent::ReplaceOrder {
                order_id,
                new_order,
            } => self.process_replace_order(order_id, new_order),
            // The run() loop exit condition handles shutdown
            OrderEvent::Shutdown => {}
        }
    }

    fn process_new_order(&mut self, mut order: Order) {
        self.counters.orders_processed.fetch_add(1, Ordering::Relaxed);

        if order.quantity <= 0 {
            warn!(
                "Engine {}: rejecting order {} with non-positive quantity {}",
                self.symbol, order.id, order.quantity
            );
            order.status = OrderStatus::Rejected;
            self.notify_order_update(&order);
            return;
        }

        {
            let book = Arc::clone(&self.book);
            let mut book = book.write().unwrap_or_else(PoisonError::into_inner);
            match order.order_type {
                OrderType::Market => self.match_market_order(&mut book, &mut order),
                OrderType::Limit => self.match_limit_order(&mut book, &mut order),
            }
        }

        // Exactly one terminal notification per new-order event
        self.notify_order_update(&order);
    }

    /// Match an incoming limit order, then rest any remainder at its own limit price.
    fn match_limit_order(&mut self, book: &mut OrderBook, order: &mut Order) {
        while order.is_active() && Self::can_match(book, order) {
            if !self.try_match(book, order) {
                break;
            }
        }

        if order.is_active() && order.remaining_quantity() > 0 {
            match book.add_order(order.clone()) {
                Ok(sequence) => order.sequence_number = sequence,
                Err(error) => {
                    warn!(
                        "Engine {}: failed to rest order {}: {}",
                        self.symbol, order.id, error
                    );
                    order.status = OrderStatus::Rejected;
                }
            }
        }
    }

    /// Match an incoming market order against whatever liquidity exists. Market orders
    /// never rest; an unfilled remainder means rejection.
    fn match_market_order(&mut self, book: &mut OrderBook, order: &mut Order) {
        while order.is_active() && Self::can_match(book, order) {
            if !self.try_match(book, order) {
                // No more liquidity
                order.status = OrderStatus::Rejected;
                break;
            }
        }

        if order.remaining_quantity() > 0 {
            order.status = OrderStatus::Rejected;
        }
    }

    /// True when the opposing side has a best level the incoming order crosses. A market
    /// order crosses any non-empty opposing side.
    fn can_match(book: &OrderBook, order: &Order) -> bool {
        match order.side {
            Side::Buy => match book.best_ask() {
                Some(best_ask) => order.order_type == OrderType::Market || order.price >= best_ask,
                None => false,
            },
            Side::Sell => match book.best_bid() {
                Some(best_bid) => order.order_type == OrderType::Market || order.price <= best_bid,
                None => false,
            },
        }
    }

    /// Execute one match step against the front of the best opposing level.
    ///
    /// The trade prints at the resting order's price and for the smaller of the two
    /// remaining quantities. Returns `false` when no match was possible.
    fn try_match(&mut self, book: &mut OrderBook, incoming: &mut Order) -> bool {
        let level = match incoming.side {
            Side::Buy => book.best_ask_level_mut(),
            Side::Sell => book.best_bid_level_mut(),
        };
        let Some(level) = level else {
            return false;
        };

        // Re-check the cross against this specific level; the loop in the caller only
        // checked the side's best price before this step.
        if incoming.order_type == OrderType::Limit {
            let crosses = match incoming.side {
                Side::Buy => incoming.price >= level.price(),
                Side::Sell => incoming.price <= level.price(),
            };
            if !crosses {
                return false;
            }
        }

        let Some(resting) = level.front_order_mut() else {
            return false;
        };
        if !resting.is_active() {
            return false;
        }

        // Match at the resting order's price: improvement accrues to the aggressor
        let match_price = resting.price;
        let match_quantity = incoming
            .remaining_quantity()
            .min(resting.remaining_quantity());

        resting.fill(match_quantity);
        let resting_id = resting.id;
        let resting_filled = resting.is_filled();

        incoming.fill(match_quantity);
        level.adjust_total_quantity(-match_quantity);

        if resting_filled {
            // Also erases the level when this was its last order
            book.remove_order(resting_id);
        }

        let (buy_order_id, sell_order_id) = match incoming.side {
            Side::Buy => (incoming.id, resting_id),
            Side::Sell => (resting_id, incoming.id),
        };

        // The counter lives on the engine, so ids stay monotonic across restarts
        let trade_id = self
            .counters
            .trade_id_counter
            .fetch_add(1, Ordering::Relaxed)
            + 1;
        let trade = Trade::new(
            trade_id,
            &self.symbol,
            buy_order_id,
            sell_order_id,
            match_price,
            match_quantity,
        );

        trace!(
            "Engine {}: trade {} buy {} sell {} {}@{}",
            self.symbol, trade.trade_id, buy_order_id, sell_order_id, match_quantity, match_price
        );

        self.counters.trades_executed.fetch_add(1, Ordering::Relaxed);
        if let Some(callback) = &self.trade_callback {
            callback(&trade);
        }

        true
    }

    fn process_cancel_order(&mut self, order_id: u64) {
        let cancelled = self
            .book
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel_order(order_id);

        if let Some(order) = cancelled {
            self.counters.orders_cancelled.fetch_add(1, Ordering::Relaxed);
            self.notify_order_update(&order);
        }
    }

    fn process_replace_order(&mut self, order_id: u64, new_order: Order) {
        // Cancel old order, then process the replacement; no other event interleaves
        self.process_cancel_order(order_id);
        self.process_new_order(new_order);
    }

    fn notify_order_update(&self, order: &Order) {
        if let Some(callback) = &self.order_update_callback {
            callback(order);
        }
    }
}

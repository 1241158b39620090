//! MatchingEngine lifecycle and the client-facing submission API.

use super::event::OrderEvent;
use super::queue::{DEFAULT_QUEUE_CAPACITY, EventQueue};
use super::trade::Trade;
use super::worker::EngineWorker;
use crate::orderbook::{Order, OrderBook, OrderBookSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use tracing::{debug, warn};

/// Callback invoked synchronously on the engine worker for every executed trade.
pub type TradeCallback = dyn Fn(&Trade) + Send + Sync;

/// Callback invoked synchronously on the engine worker when an order reaches a terminal
/// state for the event that carried it.
pub type OrderUpdateCallback = dyn Fn(&Order) + Send + Sync;

/// Counters written by the engine worker, readable from any thread. They live on the
/// engine rather than the worker so stop/start cycles never reset them; trade ids in
/// particular stay monotonic across restarts.
#[derive(Default)]
pub(super) struct EngineCounters {
    pub(super) orders_processed: AtomicU64,
    pub(super) trades_executed: AtomicU64,
    pub(super) orders_cancelled: AtomicU64,
    pub(super) trade_id_counter: AtomicU64,
}

/// A point-in-time copy of the engine counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStatistics {
    /// New-order events processed (including rejected market orders)
    pub orders_processed: u64,
    /// Trades executed
    pub trades_executed: u64,
    /// Orders successfully cancelled
    pub orders_cancelled: u64,
}

/// MatchingEngine processes order events for one symbol under price-time priority.
///
/// Clients enqueue events through [`submit_order`], [`cancel_order`] and
/// [`replace_order`]; a dedicated worker thread dequeues them, mutates the book and fires
/// the registered callbacks. The submission methods are non-blocking and return `false`
/// when the event could not be enqueued. They follow the queue's single-producer
/// contract: concurrent submitters must serialize among themselves.
///
/// [`submit_order`]: MatchingEngine::submit_order
/// [`cancel_order`]: MatchingEngine::cancel_order
/// [`replace_order`]: MatchingEngine::replace_order
pub struct MatchingEngine {
    symbol: String,
    book: Arc<RwLock<OrderBook>>,
    queue: Arc<EventQueue>,
    running: Arc<AtomicBool>,
    counters: Arc<EngineCounters>,
    trade_callback: Option<Arc<TradeCallback>>,
    order_update_callback: Option<Arc<OrderUpdateCallback>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl MatchingEngine {
    /// Create an engine for the given symbol with the default queue capacity.
    pub fn new(symbol: &str) -> Self {
        Self::with_queue_capacity(symbol, DEFAULT_QUEUE_CAPACITY)
    }

    /// Create an engine with an explicit event queue capacity (power of two).
    pub fn with_queue_capacity(symbol: &str, capacity: usize) -> Self {
        Self {
            symbol: symbol.to_string(),
            book: Arc::new(RwLock::new(OrderBook::new(symbol))),
            queue: Arc::new(EventQueue::with_capacity(capacity)),
            running: Arc::new(AtomicBool::new(false)),
            counters: Arc::new(EngineCounters::default()),
            trade_callback: None,
            order_update_callback: None,
            worker: None,
        }
    }

    /// The symbol this engine matches.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Register the trade callback. Must be called before [`start`]; replacing a
    /// previously registered callback is permitted.
    ///
    /// [`start`]: MatchingEngine::start
    pub fn set_trade_callback(&mut self, callback: impl Fn(&Trade) + Send + Sync + 'static) {
        self.trade_callback = Some(Arc::new(callback));
    }

    /// Register the order-update callback. Must be called before [`start`].
    ///
    /// [`start`]: MatchingEngine::start
    pub fn set_order_update_callback(&mut self, callback: impl Fn(&Order) + Send + Sync + 'static) {
        self.order_update_callback = Some(Arc::new(callback));
    }

    /// Spawn the worker thread. Idempotent; a second call while running is a no-op.
    pub fn start(&mut self) {
        if self.running.load(Ordering::Relaxed) {
            return;
        }
        self.running.store(true, Ordering::Release);

        let worker = EngineWorker::new(
            self.symbol.clone(),
            Arc::clone(&self.book),
            Arc::clone(&self.queue),
            Arc::clone(&self.running),
            Arc::clone(&self.counters),
            self.trade_callback.clone(),
            self.order_update_callback.clone(),
        );
        debug!("Engine {}: starting worker", self.symbol);
        self.worker = Some(
            thread::Builder::new()
                .name(format!("matching-{}", self.symbol))
                .spawn(move || worker.run())
                .expect("failed to spawn engine worker"),
        );
    }

    /// Stop the worker. Clears the running flag, pushes a shutdown sentinel so the worker
    /// leaves its idle yield, and joins it. Remaining queued events are drained before the
    /// worker exits. Idempotent.
    pub fn stop(&mut self) {
        if !self.running.load(Ordering::Relaxed) {
            return;
        }
        self.running.store(false, Ordering::Release);

        if self.queue.push(OrderEvent::Shutdown).is_err() {
            // Full queue: the worker is awake draining it and will observe the flag.
            debug!("Engine {}: queue full on shutdown, worker will drain", self.symbol);
        }

        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Engine {}: worker panicked", self.symbol);
            }
        }
        debug!("Engine {}: stopped", self.symbol);
    }

    /// True while the worker is accepting and processing events.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Enqueue a new order. Returns `false` on symbol mismatch or a full queue; the order
    /// is not enqueued in either case.
    pub fn submit_order(&self, order: Order) -> bool {
        if order.symbol != self.symbol {
            return false;
        }
        self.queue.push(OrderEvent::NewOrder(order)).is_ok()
    }

    /// Enqueue a cancel for the given order id. Returns `false` on a full queue.
    pub fn cancel_order(&self, order_id: u64) -> bool {
        self.queue.push(OrderEvent::CancelOrder { order_id }).is_ok()
    }

    /// Enqueue a cancel-and-replace as a single event: the cancel and the new order are
    /// processed back to back with no other event between them. Returns `false` on symbol
    /// mismatch or a full queue.
    pub fn replace_order(&self, order_id: u64, new_order: Order) -> bool {
        if new_order.symbol != self.symbol {
            return false;
        }
        self.queue
            .push(OrderEvent::ReplaceOrder {
                order_id,
                new_order,
            })
            .is_ok()
    }

    /// Shared handle to the book for read-only collaborators such as a market-data
    /// publisher. The worker takes the write lock for the whole of each event, so readers
    /// never observe a book mid-mutation.
    pub fn book(&self) -> Arc<RwLock<OrderBook>> {
        Arc::clone(&self.book)
    }

    /// Snapshot up to `depth` levels per side. Convenience wrapper over [`book`].
    ///
    /// [`book`]: MatchingEngine::book
    pub fn snapshot(&self, depth: usize) -> OrderBookSnapshot {
        self.book
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .create_snapshot(depth)
    }

    /// Read the engine counters.
    pub fn statistics(&self) -> EngineStatistics {
        EngineStatistics {
            orders_processed: self.counters.orders_processed.load(Ordering::Relaxed),
            trades_executed: self.counters.trades_executed.load(Ordering::Relaxed),
            orders_cancelled: self.counters.orders_cancelled.load(Ordering::Relaxed),
        }
    }
}

impl Drop for MatchingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

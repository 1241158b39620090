//! # Single-Symbol Matching Engine
//!
//! A limit order book matching engine written in Rust. The crate provides the core of an
//! exchange for one trading symbol: clients hand order intents to a lock-free event queue,
//! a dedicated worker thread drains it, walks the book under strict price-time priority and
//! reports trades and order updates through callbacks.
//!
//! ## Key Features
//!
//! - **Lock-Free Hand-Off**: A single-producer/single-consumer ring buffer decouples client
//!   threads from the matching thread, so submission never blocks on matching.
//!
//! - **Price-Time Priority**: Two ordered book sides with FIFO queues per price level. The
//!   best price always matches first, and among equal prices the earliest arrival wins.
//!
//! - **Single-Writer Book**: Exactly one thread mutates the book, which keeps the matching
//!   path free of fine-grained locking and makes trade emission deterministic.
//!
//! - **Market Data Surface**: Top of book, per-side depth and serializable snapshots for an
//!   external publisher to consume.
//!
//! - **Engine Statistics**: Counters for processed, traded and cancelled orders, readable
//!   from any thread while the engine runs.
//!
//! ## Architecture
//!
//! ```text
//! [Client Threads] --> [EventQueue (SPSC ring)] --> [Engine Worker]
//!                                                        |
//!                                             [OrderBook + Callbacks]
//! ```
//!
//! Matching runs synchronously on the worker: every trade and the terminal order update for
//! an event are delivered before the next event is dequeued.
//!
//! ## Status
//!
//! This crate implements the matching core for a single symbol; a multi-symbol deployment
//! runs one independent engine per symbol.

pub mod engine;
pub mod orderbook;

mod utils;

pub use engine::{
    DEFAULT_QUEUE_CAPACITY, EngineStatistics, EventQueue, MatchingEngine, OrderEvent, SpscQueue,
    Trade,
};
pub use orderbook::{
    DepthLevel, Order, OrderBook, OrderBookError, OrderBookSnapshot, OrderStatus, OrderType,
    PriceLevel, Side, TopOfBook,
};
pub use utils::current_time_micros;

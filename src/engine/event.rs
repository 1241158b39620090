//! Events carried from client threads to the engine worker.

use crate::orderbook::Order;

/// An order intent handed to the engine through the event queue.
///
/// Events dequeue in FIFO order of their successful push. `Shutdown` is a sentinel pushed
/// by [`MatchingEngine::stop`] so the worker leaves its idle yield; the worker treats it as
/// a no-op and drains whatever else is queued before exiting.
///
/// [`MatchingEngine::stop`]: super::MatchingEngine::stop
#[derive(Clone, Debug)]
pub enum OrderEvent {
    /// A new order to match and, for an unfilled limit remainder, rest in the book
    NewOrder(Order),
    /// Cancel the resting order with this id
    CancelOrder {
        /// Id of the order to cancel
        order_id: u64,
    },
    /// Cancel `order_id` and process `new_order`, back to back within one event
    ReplaceOrder {
        /// Id of the order to cancel
        order_id: u64,
        /// Replacement order processed immediately after the cancel
        new_order: Order,
    },
    /// Wake the worker so it can observe the stopped flag
    Shutdown,
}

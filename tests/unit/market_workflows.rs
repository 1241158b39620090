//! End-to-end market workflows: crossing flows, book invariants and market data views.

use matchbook_rs::{MatchingEngine, Order, OrderStatus, Side, Trade};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

type Captured<T> = Arc<Mutex<Vec<T>>>;

fn engine_with_capture(symbol: &str) -> (MatchingEngine, Captured<Trade>, Captured<Order>) {
    let trades: Captured<Trade> = Arc::new(Mutex::new(Vec::new()));
    let updates: Captured<Order> = Arc::new(Mutex::new(Vec::new()));

    let mut engine = MatchingEngine::new(symbol);
    let captured_trades = Arc::clone(&trades);
    engine.set_trade_callback(move |trade| captured_trades.lock().unwrap().push(trade.clone()));
    let captured_updates = Arc::clone(&updates);
    engine.set_order_update_callback(move |order| captured_updates.lock().unwrap().push(order.clone()));

    (engine, trades, updates)
}

fn wait_for(condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return;
        }
        thread::sleep(Duration::from_millis(1));
    }
    panic!("timed out waiting for engine to process events");
}

#[test]
fn book_never_stays_crossed() {
    let (mut engine, _trades, updates) = engine_with_capture("AAPL");
    engine.start();

    // A storm of orders that repeatedly cross the touch
    let intents = [
        (1u64, Side::Sell, 15010, 100),
        (2, Side::Buy, 14990, 100),
        (3, Side::Buy, 15020, 60),
        (4, Side::Sell, 14980, 80),
        (5, Side::Buy, 15015, 40),
        (6, Side::Sell, 15005, 90),
    ];
    for (id, side, price, quantity) in intents {
        engine.submit_order(Order::limit(id, "AAPL", side, price, quantity));
    }

    wait_for(|| updates.lock().unwrap().len() == intents.len());
    engine.stop();

    let book = engine.book();
    let book = book.read().unwrap();
    if let (Some(bid), Some(ask)) = (book.best_bid(), book.best_ask()) {
        assert!(bid < ask, "book must not be crossed: bid {bid} >= ask {ask}");
    }
}

#[test]
fn market_sell_walks_bid_levels_in_order() {
    let (mut engine, trades, updates) = engine_with_capture("AAPL");
    engine.start();

    engine.submit_order(Order::limit(1, "AAPL", Side::Buy, 15000, 100));
    engine.submit_order(Order::limit(2, "AAPL", Side::Buy, 14990, 100));
    engine.submit_order(Order::market(3, "AAPL", Side::Sell, 150));

    wait_for(|| updates.lock().unwrap().len() == 3);
    engine.stop();

    let trades = trades.lock().unwrap();
    assert_eq!(trades.len(), 2);
    // Best bid trades first, then the next level down, each at the resting price
    assert_eq!((trades[0].price, trades[0].quantity), (15000, 100));
    assert_eq!((trades[1].price, trades[1].quantity), (14990, 50));
    assert_eq!(trades[0].buy_order_id, 1);
    assert_eq!(trades[1].buy_order_id, 2);
    assert_eq!(trades[0].sell_order_id, 3);

    let updates = updates.lock().unwrap();
    let market = updates.iter().rev().find(|order| order.id == 3).unwrap();
    assert_eq!(market.status, OrderStatus::Filled);

    let book = engine.book();
    let book = book.read().unwrap();
    assert_eq!(book.best_bid(), Some(14990));
    assert_eq!(book.top_of_book().bid_quantity, Some(50));
}

#[test]
fn sequence_numbers_increase_in_arrival_order() {
    let (mut engine, _trades, updates) = engine_with_capture("AAPL");
    engine.start();

    for (id, price) in [(1u64, 14990), (2, 14980), (3, 15010), (4, 15020)] {
        let side = if price < 15000 { Side::Buy } else { Side::Sell };
        engine.submit_order(Order::limit(id, "AAPL", side, price, 10));
    }

    wait_for(|| updates.lock().unwrap().len() == 4);
    engine.stop();

    let book = engine.book();
    let book = book.read().unwrap();
    let sequences: Vec<u64> = (1..=4u64)
        .map(|id| book.get_order(id).expect("order should rest").sequence_number)
        .collect();
    for pair in sequences.windows(2) {
        assert!(pair[0] < pair[1], "sequence numbers must increase with arrival");
    }
}

#[test]
fn trade_quantities_balance_order_fills() {
    let (mut engine, trades, updates) = engine_with_capture("AAPL");
    engine.start();

    let intents = [
        (1u64, Side::Sell, 15010, 80),
        (2, Side::Sell, 15020, 60),
        (3, Side::Buy, 15020, 100),
        (4, Side::Buy, 15015, 50),
        (5, Side::Sell, 15000, 70),
    ];
    for (id, side, price, quantity) in intents {
        engine.submit_order(Order::limit(id, "AAPL", side, price, quantity));
    }

    wait_for(|| updates.lock().unwrap().len() == intents.len());
    engine.stop();

    // Each fill appears on both the buy and the sell side of a trade
    let traded: i64 = trades.lock().unwrap().iter().map(|trade| trade.quantity).sum();

    let book = engine.book();
    let book = book.read().unwrap();
    let resting_fills: i64 = (1..=5u64)
        .filter_map(|id| book.get_order(id))
        .map(|order| order.filled_quantity)
        .sum();
    let updates = updates.lock().unwrap();
    let terminal_fills: i64 = (1..=5u64)
        .filter(|id| book.get_order(*id).is_none())
        .filter_map(|id| updates.iter().rev().find(|order| order.id == id))
        .map(|order| order.filled_quantity)
        .sum();

    assert_eq!(resting_fills + terminal_fills, traded * 2);
}

#[test]
fn replace_with_crossing_order_trades_immediately() {
    let (mut engine, trades, updates) = engine_with_capture("AAPL");
    engine.start();

    engine.submit_order(Order::limit(1, "AAPL", Side::Sell, 15010, 100));
    engine.submit_order(Order::limit(2, "AAPL", Side::Buy, 14990, 50));
    wait_for(|| updates.lock().unwrap().len() == 2);

    // Replace the passive buy with one that crosses the ask
    engine.replace_order(2, Order::limit(3, "AAPL", Side::Buy, 15010, 50));
    wait_for(|| updates.lock().unwrap().len() == 4);
    engine.stop();

    let trades = trades.lock().unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].price, 15010);
    assert_eq!(trades[0].buy_order_id, 3);

    let book = engine.book();
    let book = book.read().unwrap();
    assert_eq!(book.best_bid(), None, "replaced order must not linger");
    assert_eq!(book.top_of_book().ask_quantity, Some(50));
}

#[test]
fn resubmitting_a_resting_order_id_is_rejected() {
    let (mut engine, trades, updates) = engine_with_capture("AAPL");
    engine.start();

    engine.submit_order(Order::limit(1, "AAPL", Side::Buy, 14990, 100));
    // Partial fill: order 1 stays in the book, so its id remains taken
    engine.submit_order(Order::limit(2, "AAPL", Side::Sell, 14990, 30));
    wait_for(|| updates.lock().unwrap().len() == 2);

    engine.submit_order(Order::limit(1, "AAPL", Side::Buy, 15000, 50));
    wait_for(|| updates.lock().unwrap().len() == 3);
    engine.stop();

    let updates = updates.lock().unwrap();
    let resubmission = updates.last().unwrap();
    assert_eq!(resubmission.id, 1);
    assert_eq!(resubmission.status, OrderStatus::Rejected);
    assert_eq!(resubmission.filled_quantity, 0);

    // Only the partial fill traded; the rejected resubmission never rested
    assert_eq!(trades.lock().unwrap().len(), 1);

    let book = engine.book();
    let book = book.read().unwrap();
    let original = book.get_order(1).expect("original order must still rest");
    assert_eq!(original.status, OrderStatus::PartiallyFilled);
    assert_eq!(original.filled_quantity, 30);
    assert_eq!(original.price, 14990);
    assert_eq!(book.best_bid(), Some(14990));
}

#[test]
fn snapshot_reflects_book_state() {
    let (mut engine, _trades, updates) = engine_with_capture("AAPL");
    engine.start();

    engine.submit_order(Order::limit(1, "AAPL", Side::Buy, 14990, 100));
    engine.submit_order(Order::limit(2, "AAPL", Side::Buy, 14980, 50));
    engine.submit_order(Order::limit(3, "AAPL", Side::Sell, 15010, 75));

    wait_for(|| updates.lock().unwrap().len() == 3);
    engine.stop();

    let snapshot = engine.snapshot(10);
    assert_eq!(snapshot.symbol, "AAPL");
    assert_eq!(snapshot.best_bid(), Some((14990, 100)));
    assert_eq!(snapshot.best_ask(), Some((15010, 75)));
    assert_eq!(snapshot.spread(), Some(20));
    assert_eq!(snapshot.total_bid_volume(), 150);
    assert_eq!(snapshot.total_ask_volume(), 75);
}

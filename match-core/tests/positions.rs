mod common;

use common::*;
use match_core::prelude::*;

fn position_of(engine: &Engine, user_id: UserId, instrument_id: InstrumentId) -> Position {
    engine
        .get_positions(user_id)
        .into_iter()
        .find(|p| p.instrument_id == instrument_id)
        .expect("expected a non-zero position")
}

#[test]
fn opening_a_position_sets_vwap_to_the_fill_price() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    engine.submit_order(gfd(1, 1, Side::Sell, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 10));

    let pos = position_of(&engine, 2, 1);
    assert_eq!(pos.net_qty, 10);
    assert_eq!(pos.vwap, 100);
    assert_eq!(pos.realized_pnl, 0.0);
}

#[test]
fn adding_to_a_position_produces_a_quantity_weighted_average_price() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    engine.submit_order(gfd(1, 1, Side::Sell, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 10));

    engine.submit_order(gfd(1, 1, Side::Sell, 200, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 200, 10));

    let pos = position_of(&engine, 2, 1);
    assert_eq!(pos.net_qty, 20);
    assert_eq!(pos.vwap, 150);
}

#[test]
fn round_trip_submit_then_exit_realizes_pnl_and_returns_to_flat() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    // User 2 buys 10 at 100, then sells 10 at 110: closes flat with a gain.
    engine.submit_order(gfd(1, 1, Side::Sell, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 10));

    engine.submit_order(gfd(2, 1, Side::Sell, 110, 10));
    engine.submit_order(gfd(3, 1, Side::Buy, 110, 10));

    assert_eq!(engine.get_positions(2).len(), 0, "a flat position is not enumerated");
    assert_eq!(engine.get_total_pnl(2), 1.0);
}

#[test]
fn reducing_a_position_realizes_pnl_on_the_closed_portion_only() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    engine.submit_order(gfd(1, 1, Side::Sell, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 10));

    engine.submit_order(gfd(2, 1, Side::Sell, 120, 4));
    engine.submit_order(gfd(3, 1, Side::Buy, 120, 4));

    let pos = position_of(&engine, 2, 1);
    assert_eq!(pos.net_qty, 6);
    assert_eq!(pos.vwap, 100, "the remaining open lot keeps the original entry price");
    assert_eq!(pos.realized_pnl, 0.8); // 4 * (120 - 100) / PRICE_SCALE
}

#[test]
fn flipping_through_zero_reprices_the_new_side_at_the_flipping_trade() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    // User 2 is long 5 at 100, then sells 10 at 110 (closes 5, opens -5 short at 110).
    engine.submit_order(gfd(1, 1, Side::Sell, 100, 5));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 5));

    engine.submit_order(gfd(3, 1, Side::Buy, 110, 10));
    engine.submit_order(gfd(2, 1, Side::Sell, 110, 10));

    let pos = position_of(&engine, 2, 1);
    assert_eq!(pos.net_qty, -5);
    assert_eq!(pos.vwap, 110, "VWAP of a flipped position takes the flipping trade's price");
}

#[test]
fn unrealized_pnl_marks_against_the_books_last_trade_price() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    engine.submit_order(gfd(1, 1, Side::Sell, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 10));

    // A later trade between other users moves the mark to 110.
    engine.submit_order(gfd(3, 1, Side::Sell, 110, 1));
    engine.submit_order(gfd(4, 1, Side::Buy, 110, 1));

    let pos = position_of(&engine, 2, 1);
    assert_eq!(pos.unrealized_pnl, 1.0);
}

#[test]
fn zero_sum_realized_pnl_across_counterparties() {
    let mut engine = Engine::default();
    scalar(&mut engine, 1, "XYZ");

    engine.submit_order(gfd(1, 1, Side::Sell, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Buy, 100, 10));
    engine.submit_order(gfd(2, 1, Side::Sell, 120, 10));
    engine.submit_order(gfd(3, 1, Side::Buy, 120, 10));

    let buyer_total = engine.get_total_pnl(3);
    let seller_total = engine.get_total_pnl(2);
    let opener_total = engine.get_total_pnl(1);

    assert!((buyer_total + seller_total + opener_total).abs() < 1e-9);
}

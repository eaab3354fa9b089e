use match_core::prelude::*;

/// Registers a SCALAR instrument with tick size 1, lot size 1, tick value 1.0.
pub fn scalar(engine: &mut Engine, id: InstrumentId, symbol: &str) {
    engine
        .add_instrument(InstrumentSpec {
            id,
            symbol: symbol.to_string(),
            kind: InstrumentKind::Scalar,
            reference_id: 0,
            strike: 0,
            tick_size: 1,
            lot_size: 1,
            tick_value: 1.0,
        })
        .expect("scalar instrument registration should succeed in tests");
}

/// Registers a CALL option on `reference_id` with the given strike.
pub fn call(engine: &mut Engine, id: InstrumentId, reference_id: InstrumentId, strike: Price) {
    engine
        .add_instrument(InstrumentSpec {
            id,
            symbol: format!("CALL-{id}"),
            kind: InstrumentKind::Call,
            reference_id,
            strike,
            tick_size: 1,
            lot_size: 1,
            tick_value: 1.0,
        })
        .expect("call instrument registration should succeed in tests");
}

/// Registers a PUT option on `reference_id` with the given strike.
pub fn put(engine: &mut Engine, id: InstrumentId, reference_id: InstrumentId, strike: Price) {
    engine
        .add_instrument(InstrumentSpec {
            id,
            symbol: format!("PUT-{id}"),
            kind: InstrumentKind::Put,
            reference_id,
            strike,
            tick_size: 1,
            lot_size: 1,
            tick_value: 1.0,
        })
        .expect("put instrument registration should succeed in tests");
}

/// A good-for-day limit order request.
pub fn gfd(user_id: UserId, instrument_id: InstrumentId, side: Side, price: Price, qty: Quantity) -> OrderRequest {
    OrderRequest {
        user_id,
        instrument_id,
        side,
        price,
        quantity: qty,
        tif: TimeInForce::Gfd,
        post_only: false,
    }
}

/// An immediate-or-cancel limit order request.
pub fn ioc(user_id: UserId, instrument_id: InstrumentId, side: Side, price: Price, qty: Quantity) -> OrderRequest {
    OrderRequest {
        tif: TimeInForce::Ioc,
        ..gfd(user_id, instrument_id, side, price, qty)
    }
}

/// A post-only good-for-day limit order request.
pub fn post_only(user_id: UserId, instrument_id: InstrumentId, side: Side, price: Price, qty: Quantity) -> OrderRequest {
    OrderRequest {
        post_only: true,
        ..gfd(user_id, instrument_id, side, price, qty)
    }
}

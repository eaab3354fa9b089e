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
        .expect("scalar instrument registration should succeed in benches");
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

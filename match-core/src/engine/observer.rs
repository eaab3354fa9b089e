use crate::prelude::*;

/// EngineObserver is the seam an external gateway hooks into to watch engine
/// activity without the core depending on sockets, rooms, or users. It is
/// notified after the fact; it cannot veto or alter anything the façade does.
pub trait EngineObserver {
    /// Called after an order is accepted into the book (live or already fully filled).
    fn on_order_accepted(&mut self, _order: &Order) {}
    /// Called once per matched counterparty pair, in aggressor-then-passive order.
    fn on_trade(&mut self, _trade: &TradeRecord) {}
    /// Called after an order is cancelled, for any reason.
    fn on_order_cancelled(&mut self, _order: &Order) {}
    /// Called after an instrument is settled.
    fn on_settlement(&mut self, _instrument_id: InstrumentId, _settlement_value: Price) {}
}

/// NoopObserver discards every notification; it's the façade's default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl EngineObserver for NoopObserver {}

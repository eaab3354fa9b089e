use crate::prelude::*;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// Engine is the façade every external caller talks to: the instrument
/// registry, id/sequence allocators, the per-instrument books, the position
/// ledger, the risk gate, histories, and statistics all live behind it.
///
/// Every mutating method takes `&mut self`; the borrow checker is the
/// concurrency model (see SPEC_FULL.md §5) — callers needing to serialize
/// concurrent external access wrap `Engine` in a `Mutex` themselves.
pub struct Engine<O: EngineObserver = NoopObserver> {
    instruments: HashMap<InstrumentId, Instrument>,
    books: HashMap<InstrumentId, Book>,
    ledger: PositionLedger,
    risk: RiskGate,
    fill_history: Vec<Fill>,
    trade_history: Vec<TradeRecord>,
    stats: Stats,
    next_order_id: OrderId,
    next_sequence: Sequence,
    /// order_id -> user_id, for every currently-live order, across all instruments.
    active_orders: HashMap<OrderId, UserId>,
    /// user_id -> set of that user's currently-live order ids.
    orders_by_user: HashMap<UserId, HashSet<OrderId>>,
    observer: O,
}

impl Default for Engine<NoopObserver> {
    fn default() -> Self {
        Self::new(NoopObserver)
    }
}

impl Engine<NoopObserver> {
    /// Builds an engine with no observer attached.
    pub fn new_default() -> Self {
        Self::new(NoopObserver)
    }
}

impl<O: EngineObserver> Engine<O> {
    pub fn new(observer: O) -> Self {
        Engine {
            instruments: HashMap::new(),
            books: HashMap::new(),
            ledger: PositionLedger::new(),
            risk: RiskGate::new(),
            fill_history: Vec::new(),
            trade_history: Vec::new(),
            stats: Stats::default(),
            next_order_id: 1,
            next_sequence: 0,
            active_orders: HashMap::new(),
            orders_by_user: HashMap::new(),
            observer,
        }
    }

    fn alloc_order_id(&mut self) -> OrderId {
        let id = self.next_order_id;
        self.next_order_id += 1;
        id
    }

    fn alloc_sequence(&mut self) -> Sequence {
        let seq = self.next_sequence;
        self.next_sequence += 1;
        seq
    }

    /// Registers a new instrument. Refuses (without mutation) if `id` is
    /// already taken, or if a CALL/PUT's `reference_id` doesn't name an
    /// existing SCALAR.
    pub fn add_instrument(&mut self, spec: InstrumentSpec) -> Result<(), EngineError> {
        if self.instruments.contains_key(&spec.id) {
            return Err(EngineError::DuplicateInstrument);
        }
        if !matches!(spec.kind, InstrumentKind::Scalar) {
            match self.instruments.get(&spec.reference_id) {
                Some(underlying) if matches!(underlying.kind, InstrumentKind::Scalar) => {}
                _ => return Err(EngineError::ReferenceInstrumentUnknown),
            }
        }
        let id = spec.id;
        self.books.insert(id, Book::new(id));
        self.instruments.insert(id, spec.into());
        info!(instrument_id = id, "instrument added");
        Ok(())
    }

    /// Toggles an instrument's halt flag.
    pub fn halt_instrument(&mut self, instrument_id: InstrumentId, on: bool) -> Result<(), EngineError> {
        let instrument = self
            .instruments
            .get_mut(&instrument_id)
            .ok_or(EngineError::InstrumentUnknown)?;
        instrument.is_halted = on;
        info!(instrument_id, halted = on, "instrument halt toggled");
        Ok(())
    }

    /// Sets a user's risk limits, replacing any previous ones.
    pub fn set_risk_limits(&mut self, user_id: UserId, limits: RiskLimits) {
        self.risk.set_limits(user_id, limits);
    }

    fn validate_request(&self, req: &OrderRequest) -> Result<&Instrument, EngineError> {
        let instrument = self
            .instruments
            .get(&req.instrument_id)
            .ok_or(EngineError::InstrumentUnknown)?;
        if instrument.is_halted {
            return Err(EngineError::InstrumentHalted);
        }
        if req.quantity <= 0
            || req.quantity % instrument.lot_size != 0
            || req.price % instrument.tick_size != 0
        {
            return Err(EngineError::InvalidQuantity);
        }
        Ok(instrument)
    }

    /// Runs the full submission pipeline described in SPEC_FULL.md §4.3.
    pub fn submit_order(&mut self, req: OrderRequest) -> OrderResult {
        if let Err(e) = self.validate_request(&req) {
            self.stats.total_rejects += 1;
            warn!(user_id = req.user_id, instrument_id = req.instrument_id, error = %e, "order rejected");
            return OrderResult::rejected(0, e.to_string());
        }

        let current_net = self.ledger.net_qty(req.user_id, req.instrument_id);
        if let Err(e) = self.risk.check(req.user_id, req.side, req.quantity, current_net) {
            self.stats.total_rejects += 1;
            warn!(user_id = req.user_id, instrument_id = req.instrument_id, error = %e, "order rejected");
            return OrderResult::rejected(0, e.to_string());
        }

        let order_id = self.alloc_order_id();
        let timestamp = self.alloc_sequence();
        let order = Order {
            id: order_id,
            user_id: req.user_id,
            instrument_id: req.instrument_id,
            side: req.side,
            limit_price: req.price,
            quantity: req.quantity,
            filled_quantity: 0,
            tif: req.tif,
            post_only: req.post_only,
            status: OrderStatus::Pending,
            timestamp,
        };

        let book = self
            .books
            .get_mut(&req.instrument_id)
            .expect("instrument validated above implies its book exists");
        let (final_order, fills) = add_order(book, order);

        if final_order.status == OrderStatus::Rejected {
            self.stats.total_rejects += 1;
            warn!(order_id, "post-only order rejected");
            return OrderResult::rejected(order_id, "post-only order would cross the book");
        }

        for pair in fills.chunks(2) {
            let [aggressor, passive] = pair else {
                unreachable!("matching::add_order always emits fills in pairs")
            };
            self.ledger.apply_fill(aggressor);
            self.ledger.apply_fill(passive);
            self.fill_history.push(*aggressor);
            self.fill_history.push(*passive);
            self.stats.total_fills_emitted += 2;

            let (buy, sell) = if aggressor.side == Side::Buy {
                (aggressor, passive)
            } else {
                (passive, aggressor)
            };
            let trade = TradeRecord {
                instrument_id: aggressor.instrument_id,
                price: aggressor.price,
                quantity: aggressor.quantity,
                timestamp: aggressor.timestamp,
                buy_order_id: buy.order_id,
                sell_order_id: sell.order_id,
                buyer_id: buy.user_id,
                seller_id: sell.user_id,
            };
            self.observer.on_trade(&trade);
            self.trade_history.push(trade);
        }

        if final_order.status.is_live() {
            self.active_orders.insert(order_id, req.user_id);
            self.orders_by_user.entry(req.user_id).or_default().insert(order_id);
        }

        self.stats.total_orders_accepted += 1;
        self.observer.on_order_accepted(&final_order);
        info!(order_id, status = ?final_order.status, fills = fills.len(), "order accepted");

        OrderResult::accepted(order_id, fills)
    }

    /// Cancels a resting order. `false` if it doesn't exist, isn't live, or
    /// isn't owned by `user_id`.
    pub fn cancel_order(&mut self, order_id: OrderId, user_id: UserId) -> bool {
        let Some(&owner) = self.active_orders.get(&order_id) else {
            return false;
        };
        if owner != user_id {
            return false;
        }
        let Some(&instrument_id) = self.find_instrument_of(order_id) else {
            return false;
        };
        let Some(book) = self.books.get_mut(&instrument_id) else {
            return false;
        };
        let Some(cancelled) = cancel_order(book, order_id) else {
            return false;
        };
        self.active_orders.remove(&order_id);
        if let Some(set) = self.orders_by_user.get_mut(&user_id) {
            set.remove(&order_id);
        }
        self.stats.total_cancels += 1;
        self.observer.on_order_cancelled(&cancelled);
        info!(order_id, user_id, "order cancelled");
        true
    }

    fn find_instrument_of(&self, order_id: OrderId) -> Option<&InstrumentId> {
        self.books
            .iter()
            .find(|(_, book)| book.get(order_id).is_some())
            .map(|(id, _)| id)
    }

    /// Cancels every currently-active order belonging to `user_id`.
    pub fn cancel_all(&mut self, user_id: UserId) {
        let ids: Vec<OrderId> = self
            .orders_by_user
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        for order_id in ids {
            self.cancel_order(order_id, user_id);
        }
    }

    /// Cancels `order_id`, then submits a replacement at `new_price` /
    /// `new_qty` (defaulting to the old price, and to the old remaining
    /// quantity respectively). The replacement gets a new id and loses time
    /// priority, per SPEC_FULL.md §4.3.
    pub fn replace_order(
        &mut self,
        order_id: OrderId,
        user_id: UserId,
        new_price: Option<Price>,
        new_qty: Option<Quantity>,
    ) -> Result<OrderResult, EngineError> {
        let instrument_id = *self.find_instrument_of(order_id).ok_or(EngineError::OrderNotFound)?;
        let owner = *self.active_orders.get(&order_id).ok_or(EngineError::OrderNotFound)?;
        if owner != user_id {
            return Err(EngineError::NotOrderOwner);
        }
        let book = self.books.get(&instrument_id).expect("instrument must exist for a live order");
        let existing = book.get(order_id).ok_or(EngineError::OrderNotFound)?.clone();

        if !self.cancel_order(order_id, user_id) {
            return Err(EngineError::OrderNotModifiable);
        }

        let req = OrderRequest {
            user_id,
            instrument_id,
            side: existing.side,
            price: new_price.unwrap_or(existing.limit_price),
            quantity: new_qty.unwrap_or_else(|| existing.remaining()),
            tif: existing.tif,
            post_only: existing.post_only,
        };
        Ok(self.submit_order(req))
    }

    /// Settles an instrument at `settlement_value`: pays every holder their
    /// payoff, zeroes their position, halts the instrument, and cancels its
    /// resting orders.
    pub fn settle_instrument(&mut self, instrument_id: InstrumentId, settlement_value: Price) -> Result<(), EngineError> {
        let instrument = self
            .instruments
            .get(&instrument_id)
            .ok_or(EngineError::InstrumentUnknown)?
            .clone();

        let payoff_per_unit = instrument.payoff_per_unit(settlement_value);
        let holders = self.ledger.holders(instrument_id);
        for user_id in holders {
            let pos = self.ledger.position(user_id, instrument_id, None);
            let vwap_value_per_unit = (pos.vwap as f64 / PRICE_SCALE as f64) * instrument.tick_value;
            self.ledger.settle(user_id, instrument_id, payoff_per_unit, vwap_value_per_unit);
        }

        if let Some(book) = self.books.get_mut(&instrument_id) {
            let resting: Vec<OrderId> = book.live_orders().map(|o| o.id).collect();
            for order_id in resting {
                if let Some(cancelled) = cancel_order(book, order_id) {
                    self.active_orders.remove(&order_id);
                    if let Some(set) = self.orders_by_user.get_mut(&cancelled.user_id) {
                        set.remove(&order_id);
                    }
                    self.stats.total_cancels += 1;
                    self.observer.on_order_cancelled(&cancelled);
                }
            }
        }

        self.instruments.get_mut(&instrument_id).unwrap().is_halted = true;
        self.observer.on_settlement(instrument_id, settlement_value);
        info!(instrument_id, settlement_value, "instrument settled");
        Ok(())
    }

    fn mark_price(&self, instrument_id: InstrumentId) -> Option<Price> {
        let book = self.books.get(&instrument_id)?;
        if let Some(p) = book.last_price().filter(|p| *p > 0) {
            return Some(p);
        }
        match (book.best_bid(), book.best_ask()) {
            (Some(b), Some(a)) => Some((b + a) / 2),
            _ => None,
        }
    }

    /// Top-of-book snapshot for an instrument, at the default depth.
    pub fn get_snapshot(&self, instrument_id: InstrumentId) -> Result<MarketSnapshot, EngineError> {
        self.get_snapshot_depth(instrument_id, DEFAULT_SNAPSHOT_DEPTH)
    }

    pub fn get_snapshot_depth(&self, instrument_id: InstrumentId, depth: usize) -> Result<MarketSnapshot, EngineError> {
        let book = self.books.get(&instrument_id).ok_or(EngineError::InstrumentUnknown)?;
        let (bids, asks) = book.top_levels(depth);
        Ok(MarketSnapshot {
            instrument_id,
            bids,
            asks,
            last_price: book.last_price(),
            timestamp: self.next_sequence,
        })
    }

    /// Live orders resting in an instrument's book.
    pub fn get_orders(&self, instrument_id: InstrumentId) -> Result<Vec<Order>, EngineError> {
        let book = self.books.get(&instrument_id).ok_or(EngineError::InstrumentUnknown)?;
        Ok(book.live_orders().cloned().collect())
    }

    /// Non-zero positions for a user, with unrealized P&L filled in.
    pub fn get_positions(&self, user_id: UserId) -> Vec<Position> {
        self.ledger.positions_for_user(user_id, |iid| self.mark_price(iid))
    }

    /// Sum of realized + unrealized P&L across every instrument for a user.
    pub fn get_total_pnl(&self, user_id: UserId) -> f64 {
        self.ledger.total_pnl(user_id, |iid| self.mark_price(iid))
    }

    pub fn get_stats(&self) -> Stats {
        self.stats
    }

    pub fn get_trade_history(&self) -> &[TradeRecord] {
        &self.trade_history
    }

    pub fn get_fill_history(&self) -> &[Fill] {
        &self.fill_history
    }

    pub fn get_instrument(&self, instrument_id: InstrumentId) -> Option<&Instrument> {
        self.instruments.get(&instrument_id)
    }
}

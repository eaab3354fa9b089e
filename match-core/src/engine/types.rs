use mimalloc::MiMalloc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Global allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Scaling constant used to convert fixed-point price units into a
/// human "dollar" value for payoff and P&L arithmetic.
pub const PRICE_SCALE: i64 = 100;

/// UserId is the type used for user IDs.
pub type UserId = u64;

/// InstrumentId is the type used for instrument IDs.
pub type InstrumentId = u64;

/// OrderId is the type used for order IDs.
pub type OrderId = u64;

/// Price is a signed integer fixed-point value in an instrument's smallest unit.
pub type Price = i64;

/// Quantity is a signed integer; sign only carries meaning inside position math.
/// Submitted order quantities must be strictly positive.
pub type Quantity = i64;

/// Sequence is the monotonic counter that establishes FIFO order within a price level.
pub type Sequence = u64;

/// Side indicates the direction of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Sign applied to a fill's quantity when updating a position (+1 buy, -1 sell).
    pub fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }

    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// TimeInForce specifies how long the order remains active on the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    /// Good-for-day: rests on the book until cancelled, matched, or settled.
    Gfd,
    /// Immediate-or-cancel: any unfilled remainder is cancelled, never rested.
    Ioc,
}

/// InstrumentKind determines how settlement payoff is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentKind {
    Scalar,
    Call,
    Put,
}

/// OrderStatus represents the current lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Partial,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// An order in a terminal state is no longer live in any book.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    pub fn is_live(self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Partial)
    }
}

/// Instrument is a tradable symbol: an underlying scalar, or a call/put option on one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub symbol: String,
    pub kind: InstrumentKind,
    /// For CALL/PUT: the id of the underlying SCALAR instrument. Zero for SCALAR.
    pub reference_id: InstrumentId,
    /// Options only; price units.
    pub strike: Price,
    pub tick_size: Price,
    pub lot_size: Quantity,
    pub tick_value: f64,
    pub is_halted: bool,
}

impl Instrument {
    /// Payoff per unit in real dollars for a declared settlement value, per §4.3.
    pub fn payoff_per_unit(&self, settlement_value: Price) -> f64 {
        let scaled = |x: Price| x as f64 / PRICE_SCALE as f64;
        match self.kind {
            InstrumentKind::Scalar => scaled(settlement_value) * self.tick_value,
            InstrumentKind::Call => {
                scaled((settlement_value - self.strike).max(0)) * self.tick_value
            }
            InstrumentKind::Put => {
                scaled((self.strike - settlement_value).max(0)) * self.tick_value
            }
        }
    }
}

/// Specification used to register a new instrument with the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub id: InstrumentId,
    pub symbol: String,
    pub kind: InstrumentKind,
    pub reference_id: InstrumentId,
    pub strike: Price,
    pub tick_size: Price,
    pub lot_size: Quantity,
    pub tick_value: f64,
}

impl From<InstrumentSpec> for Instrument {
    fn from(spec: InstrumentSpec) -> Self {
        Instrument {
            id: spec.id,
            symbol: spec.symbol,
            kind: spec.kind,
            reference_id: spec.reference_id,
            strike: spec.strike,
            tick_size: spec.tick_size,
            lot_size: spec.lot_size,
            tick_value: spec.tick_value,
            is_halted: false,
        }
    }
}

/// Order is a single resting or transient order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub limit_price: Price,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub tif: TimeInForce,
    pub post_only: bool,
    pub status: OrderStatus,
    /// Monotonic sequence number assigned at acceptance; determines FIFO order.
    pub timestamp: Sequence,
}

impl Order {
    /// Unfilled quantity remaining on this order.
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity >= self.quantity
    }
}

/// A single side of a matched trade: one Fill is emitted per counterparty.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fill {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Sequence,
}

/// One matched counterparty pair, derived from a fill pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub instrument_id: InstrumentId,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: Sequence,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
}

/// Request to submit a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub instrument_id: InstrumentId,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
    pub tif: TimeInForce,
    pub post_only: bool,
}

/// Result of a `submit_order` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResult {
    pub order_id: OrderId,
    pub success: bool,
    pub error_message: Option<String>,
    pub fills: Vec<Fill>,
}

impl OrderResult {
    pub fn rejected(order_id: OrderId, message: impl Into<String>) -> Self {
        OrderResult {
            order_id,
            success: false,
            error_message: Some(message.into()),
            fills: Vec::new(),
        }
    }

    pub fn accepted(order_id: OrderId, fills: Vec<Fill>) -> Self {
        OrderResult {
            order_id,
            success: true,
            error_message: None,
            fills,
        }
    }
}

/// Aggregate size resting at a single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub quantity: Quantity,
}

/// Snapshot of the top of book for one instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub instrument_id: InstrumentId,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
    pub last_price: Option<Price>,
    pub timestamp: Sequence,
}

/// Default depth reported by `get_snapshot` when the caller doesn't ask for a specific depth.
pub const DEFAULT_SNAPSHOT_DEPTH: usize = 10;

/// Per-(user, instrument) net position and P&L.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Position {
    pub instrument_id: InstrumentId,
    pub net_qty: Quantity,
    pub vwap: Price,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
}

/// Per-user risk limits. `max_notional` and `max_orders_per_sec` are reserved:
/// stored and returned, but not enforced (see `RiskGate`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RiskLimits {
    pub max_position: Option<Quantity>,
    pub max_notional: Option<f64>,
    pub max_orders_per_sec: Option<u32>,
}

/// Monotonic engine-wide counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Stats {
    pub total_orders_accepted: u64,
    pub total_fills_emitted: u64,
    pub total_cancels: u64,
    pub total_rejects: u64,
}

/// Order ids resting at one price level, keyed by their FIFO sequence number
/// so the head (oldest) is always the first entry and an arbitrary order can
/// be located and removed by sequence in O(log k) instead of a linear scan.
pub type LevelQueue = BTreeMap<Sequence, OrderId>;

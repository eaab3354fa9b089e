use crate::prelude::*;
use std::collections::{BTreeMap, HashMap};

/// Book is the per-instrument pair of price-indexed FIFO queues plus the
/// order arena that backs them.
///
/// Orders are stored once, in `orders`, keyed by id (the "arena/slab"
/// strategy from the design notes). Each side's `BTreeMap<Price, LevelQueue>`
/// holds only order ids at each price, keyed within the level by FIFO
/// sequence number so the head (oldest) is always the level's first entry
/// and any order can be located and removed from its level in O(log k) — no
/// linear scan of the level's contents is needed on cancel. A price level
/// with no ids left is dropped from the map. Both maps are kept in ascending
/// price order; bids read their best level from the back (`next_back`),
/// asks from the front.
#[derive(Debug)]
pub struct Book {
    pub(crate) instrument_id: InstrumentId,
    pub(crate) orders: HashMap<OrderId, Order>,
    pub(crate) bids: BTreeMap<Price, LevelQueue>,
    pub(crate) asks: BTreeMap<Price, LevelQueue>,
    pub(crate) last_trade_price: Option<Price>,
}

impl Book {
    pub fn new(instrument_id: InstrumentId) -> Self {
        Book {
            instrument_id,
            orders: HashMap::new(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            last_trade_price: None,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<Price, LevelQueue> {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Best (highest) resting bid price, if any.
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.keys().next_back().copied()
    }

    /// Best (lowest) resting ask price, if any.
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.keys().next().copied()
    }

    /// Best resting price on the given side, honoring that side's direction.
    pub fn best_price(&self, side: Side) -> Option<Price> {
        match side {
            Side::Buy => self.best_bid(),
            Side::Sell => self.best_ask(),
        }
    }

    /// Price of the most recent trade on this instrument, if any has occurred.
    pub fn last_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Look up a live order by id.
    pub fn get(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    pub(crate) fn get_mut(&mut self, order_id: OrderId) -> Option<&mut Order> {
        self.orders.get_mut(&order_id)
    }

    /// Order id resting at the head (lowest sequence number, i.e. oldest) of
    /// the given side's best price level.
    pub(crate) fn best_level_head(&self, side: Side) -> Option<OrderId> {
        let queue = match side {
            Side::Buy => self.bids.iter().next_back()?.1,
            Side::Sell => self.asks.iter().next()?.1,
        };
        queue.values().next().copied()
    }

    /// Pop the head of the given level if it is now fully filled, removing
    /// the level entirely if it is left empty. No-op if the head is still live.
    pub(crate) fn remove_filled_head(&mut self, side: Side, price: Price) {
        let levels = self.levels_mut(side);
        if let Some(queue) = levels.get_mut(&price) {
            queue.pop_first();
            if queue.is_empty() {
                levels.remove(&price);
            }
        }
    }

    /// Rest an order at the tail of its side's level (by FIFO sequence),
    /// creating the level if needed.
    pub(crate) fn insert_resting(&mut self, order: Order) {
        let side = order.side;
        let price = order.limit_price;
        let id = order.id;
        let sequence = order.timestamp;
        self.orders.insert(id, order);
        self.levels_mut(side).entry(price).or_default().insert(sequence, id);
    }

    /// Remove a live order from the book entirely (cancel path). Returns the
    /// removed order (not yet marked cancelled — the caller decides the
    /// terminal status) or `None` if it wasn't resting.
    ///
    /// Locating the order's level is O(log L); removing it from that level
    /// is O(log k) via the level's own sequence-keyed map, since the order's
    /// own `timestamp` is its key there — no scan of the level's other
    /// resting orders is needed.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let order = self.orders.remove(&order_id)?;
        let levels = self.levels_mut(order.side);
        if let Some(queue) = levels.get_mut(&order.limit_price) {
            queue.remove(&order.timestamp);
            if queue.is_empty() {
                levels.remove(&order.limit_price);
            }
        }
        Some(order)
    }

    /// Up to `depth` best levels per side with aggregate live size, plus the
    /// last trade price. Assembling the `MarketSnapshot` (instrument id and
    /// timestamp) is the façade's job since only it tracks the sequence clock.
    pub fn top_levels(&self, depth: usize) -> (Vec<PriceLevel>, Vec<PriceLevel>) {
        let aggregate = |queue: &LevelQueue| -> Quantity {
            queue
                .values()
                .filter_map(|id| self.orders.get(id))
                .map(|o| o.remaining())
                .sum()
        };

        let bids = self
            .bids
            .iter()
            .rev()
            .take(depth)
            .map(|(price, queue)| PriceLevel {
                price: *price,
                quantity: aggregate(queue),
            })
            .collect();

        let asks = self
            .asks
            .iter()
            .take(depth)
            .map(|(price, queue)| PriceLevel {
                price: *price,
                quantity: aggregate(queue),
            })
            .collect();

        (bids, asks)
    }

    /// All currently live orders resting in this book, in no particular order.
    pub fn live_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    pub fn instrument_id(&self) -> InstrumentId {
        self.instrument_id
    }
}

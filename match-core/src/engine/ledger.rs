use crate::prelude::*;
use std::collections::HashMap;

/// PositionLedger maintains every user's net position and realized P&L per
/// instrument, and derives unrealized P&L on demand from a supplied mark price.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<(UserId, InstrumentId), PositionState>,
}

/// Internal per-(user, instrument) state. `net_qty = 0 && realized_pnl = 0`
/// is equivalent to no record existing, for enumeration purposes (§3), but we
/// don't proactively evict entries — `positions_for_user` filters them out.
#[derive(Debug, Clone, Copy, Default)]
struct PositionState {
    net_qty: Quantity,
    vwap: Price,
    realized_pnl: f64,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a single fill to the user's position in that instrument, per
    /// the three cases in §4.2: flat, adding, or reducing/flipping.
    pub fn apply_fill(&mut self, fill: &Fill) {
        let key = (fill.user_id, fill.instrument_id);
        let state = self.positions.entry(key).or_default();

        let s = fill.side.sign();
        let q = fill.quantity;
        let delta = s * q;
        let p = fill.price;
        let n0 = state.net_qty;
        let v0 = state.vwap;

        if n0 == 0 {
            state.net_qty = delta;
            state.vwap = p;
            return;
        }

        let pre_sign = n0.signum();
        if pre_sign == s {
            // Adding to an existing position: quantity-weighted average price.
            let n0_abs = n0.unsigned_abs() as f64;
            let q_f = q as f64;
            state.vwap = ((n0_abs * v0 as f64 + q_f * p as f64) / (n0_abs + q_f)).round() as Price;
            state.net_qty = n0 + delta;
        } else {
            // Reducing or flipping through zero.
            let closing = n0.abs().min(q);
            let realized = closing as f64 * ((p - v0) as f64 / PRICE_SCALE as f64) * pre_sign as f64;
            state.realized_pnl += realized;
            state.net_qty = n0 + delta;
            if state.net_qty.signum() != 0 && state.net_qty.signum() != pre_sign {
                // Flipped through zero: the open remainder was built at this fill's price.
                state.vwap = p;
            } else if state.net_qty == 0 {
                state.vwap = 0;
            }
        }
    }

    /// Derived unrealized P&L for an open position given a mark price, per §4.2.
    fn unrealized_pnl(state: &PositionState, mark: Option<Price>) -> f64 {
        if state.net_qty == 0 {
            return 0.0;
        }
        let Some(m) = mark.filter(|m| *m > 0) else {
            return 0.0;
        };
        ((m - state.vwap) as f64 / PRICE_SCALE as f64) * state.net_qty as f64
    }

    /// Returns the position for one (user, instrument) pair, with unrealized
    /// P&L computed against `mark` (the book's mark price, per §4.2 precedence).
    pub fn position(&self, user_id: UserId, instrument_id: InstrumentId, mark: Option<Price>) -> Position {
        let state = self
            .positions
            .get(&(user_id, instrument_id))
            .copied()
            .unwrap_or_default();
        Position {
            instrument_id,
            net_qty: state.net_qty,
            vwap: state.vwap,
            realized_pnl: state.realized_pnl,
            unrealized_pnl: Self::unrealized_pnl(&state, mark),
        }
    }

    /// Non-zero positions for a user, each annotated with unrealized P&L.
    /// `mark_of` supplies the mark price for an instrument (None if unmarkable).
    pub fn positions_for_user(
        &self,
        user_id: UserId,
        mut mark_of: impl FnMut(InstrumentId) -> Option<Price>,
    ) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|((uid, _), state)| *uid == user_id && state.net_qty != 0)
            .map(|((_, iid), state)| Position {
                instrument_id: *iid,
                net_qty: state.net_qty,
                vwap: state.vwap,
                realized_pnl: state.realized_pnl,
                unrealized_pnl: Self::unrealized_pnl(state, mark_of(*iid)),
            })
            .collect()
    }

    /// Sum of realized + unrealized P&L across every instrument for a user.
    /// Positions with `net_qty = 0` still contribute their realized P&L.
    pub fn total_pnl(&self, user_id: UserId, mut mark_of: impl FnMut(InstrumentId) -> Option<Price>) -> f64 {
        self.positions
            .iter()
            .filter(|((uid, _), _)| *uid == user_id)
            .map(|((_, iid), state)| state.realized_pnl + Self::unrealized_pnl(state, mark_of(*iid)))
            .sum()
    }

    /// Closes a user's position in `instrument_id` against a settlement
    /// payoff, per §4.3. Returns `None` if the user had no position.
    pub fn settle(&mut self, user_id: UserId, instrument_id: InstrumentId, payoff_per_unit: f64, vwap_value_per_unit: f64) -> Option<f64> {
        let state = self.positions.get_mut(&(user_id, instrument_id))?;
        if state.net_qty == 0 {
            return None;
        }
        let cash_flow = (payoff_per_unit - vwap_value_per_unit) * state.net_qty as f64;
        state.realized_pnl += cash_flow;
        state.net_qty = 0;
        state.vwap = 0;
        Some(cash_flow)
    }

    /// User ids with any non-zero position in the given instrument, snapshotted.
    pub fn holders(&self, instrument_id: InstrumentId) -> Vec<UserId> {
        self.positions
            .iter()
            .filter(|((_, iid), state)| *iid == instrument_id && state.net_qty != 0)
            .map(|((uid, _), _)| *uid)
            .collect()
    }

    /// Current net position for risk-gate checks.
    pub fn net_qty(&self, user_id: UserId, instrument_id: InstrumentId) -> Quantity {
        self.positions
            .get(&(user_id, instrument_id))
            .map(|s| s.net_qty)
            .unwrap_or(0)
    }
}

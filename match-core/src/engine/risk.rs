use crate::prelude::*;
use std::collections::HashMap;

/// RiskGate enforces per-user trading limits before an order reaches the book.
///
/// Only `max_position` is enforced today. `max_notional` and
/// `max_orders_per_sec` are carried on `RiskLimits` and returned from
/// `limits_for`, but no check consults them yet — see SPEC_FULL.md §9.
#[derive(Debug, Default)]
pub struct RiskGate {
    limits: HashMap<UserId, RiskLimits>,
}

impl RiskGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (replacing) the risk limits for a user.
    pub fn set_limits(&mut self, user_id: UserId, limits: RiskLimits) {
        self.limits.insert(user_id, limits);
    }

    /// Current limits for a user, or the permissive default if none were set.
    pub fn limits_for(&self, user_id: UserId) -> RiskLimits {
        self.limits.get(&user_id).copied().unwrap_or_default()
    }

    /// Checks whether accepting an order of `side`/`quantity` would breach the
    /// user's `max_position` cap, given their current net position in the
    /// instrument. A user with no limits set always passes.
    pub fn check(
        &self,
        user_id: UserId,
        side: Side,
        quantity: Quantity,
        current_net_qty: Quantity,
    ) -> Result<(), EngineError> {
        let Some(cap) = self.limits_for(user_id).max_position else {
            return Ok(());
        };
        let resulting = current_net_qty + side.sign() * quantity;
        if resulting.abs() > cap {
            return Err(EngineError::RiskExceeded);
        }
        Ok(())
    }
}

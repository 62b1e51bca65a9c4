//! Progress toward the free-shipping threshold.

use rust_decimal::Decimal;
use serde::Serialize;

/// How far a cart is from free shipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FreeShippingProgress {
    pub threshold: Decimal,
    pub cart_total: Decimal,
}

impl FreeShippingProgress {
    /// $100.00
    pub const DEFAULT_THRESHOLD: Decimal = Decimal::ONE_HUNDRED;

    #[must_use]
    pub const fn new(threshold: Decimal, cart_total: Decimal) -> Self {
        Self {
            threshold,
            cart_total,
        }
    }

    /// Amount still needed; zero once the threshold is reached.
    #[must_use]
    pub fn remaining(&self) -> Decimal {
        let total = self.cart_total.max(Decimal::ZERO);
        self.threshold
            .checked_sub(total)
            .map_or(Decimal::ZERO, |r| r.max(Decimal::ZERO))
    }

    #[must_use]
    pub fn qualifies(&self) -> bool {
        self.cart_total >= self.threshold
    }

    /// Share of the threshold reached, 0-100.
    #[must_use]
    pub fn percent(&self) -> Decimal {
        if self.threshold <= Decimal::ZERO || self.qualifies() {
            return Decimal::ONE_HUNDRED;
        }
        // Below the threshold the ratio is under 1, so scaling it cannot overflow.
        self.cart_total
            .max(Decimal::ZERO)
            .checked_div(self.threshold)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ONE_HUNDRED, |p| p.min(Decimal::ONE_HUNDRED).round_dp(0))
    }
}

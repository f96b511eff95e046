//! Fee Schedule
//!
//! Pure fee arithmetic for simulated order execution. Rates follow the
//! A-share retail convention: commission with a minimum floor, a transfer
//! fee on both sides, and stamp duty on sells only.

use crate::types::{FeeBreakdown, TradeSide};

/// Fee rates applied to every simulated order.
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    /// Commission rate on trade value.
    pub commission_rate: f64,
    /// Minimum commission charged per order.
    pub min_commission: f64,
    /// Transfer fee rate, charged on both sides.
    pub transfer_fee_rate: f64,
    /// Stamp duty rate, sell side only.
    pub stamp_duty_rate: f64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            commission_rate: 0.00025, // 0.025%
            min_commission: 5.0,
            transfer_fee_rate: 0.00002, // 0.002%
            stamp_duty_rate: 0.001,     // 0.1%, sells only
        }
    }
}

impl FeeSchedule {
    /// Compute the fee breakdown for an order of the given gross value.
    ///
    /// Callers guarantee `trade_value` is positive; there are no error
    /// conditions here.
    pub fn calculate(&self, side: TradeSide, trade_value: f64) -> FeeBreakdown {
        let commission = (trade_value * self.commission_rate).max(self.min_commission);
        let transfer_fee = trade_value * self.transfer_fee_rate;
        let stamp_duty = match side {
            TradeSide::Buy => 0.0,
            TradeSide::Sell => trade_value * self.stamp_duty_rate,
        };

        FeeBreakdown {
            commission,
            transfer_fee,
            stamp_duty,
        }
    }
}

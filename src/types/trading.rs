//! Trading Types
//!
//! Types for the simulated brokerage ledger: the account, per-symbol
//! positions, executed trades, fee breakdowns, and the API request/response
//! shapes built on top of them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Enums
// =============================================================================

/// Order side (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeSide::Buy => write!(f, "buy"),
            TradeSide::Sell => write!(f, "sell"),
        }
    }
}

// =============================================================================
// Fees
// =============================================================================

/// Per-order fee breakdown. Transient: only the total is persisted on the
/// resulting [`Trade`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeBreakdown {
    /// Brokerage commission (rate with a minimum floor).
    pub commission: f64,
    /// Transfer fee, charged on both sides.
    pub transfer_fee: f64,
    /// Stamp duty, sell side only.
    pub stamp_duty: f64,
}

impl FeeBreakdown {
    /// Total fee charged for the order.
    pub fn total(&self) -> f64 {
        self.commission + self.transfer_fee + self.stamp_duty
    }
}

// =============================================================================
// Positions
// =============================================================================

/// A held position in a single symbol.
///
/// Positions never exist with zero quantity: the ledger removes the entry
/// the moment a sell brings the quantity to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    /// Symbol held (e.g. "600519").
    pub symbol: String,
    /// Shares held. Always a whole number of shares.
    pub quantity: u64,
    /// Volume-weighted average cost per share, buy fees capitalized in.
    pub average_cost: f64,
    /// Last observed market price.
    pub last_price: f64,
}

impl Position {
    /// An empty position to buy into. Not valid ledger state on its own.
    pub fn opened(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            quantity: 0,
            average_cost: 0.0,
            last_price: 0.0,
        }
    }

    /// Apply a buy fill: blend the new shares into the weighted average
    /// cost, capitalizing the fee into the basis.
    pub fn buy(&mut self, price: f64, quantity: u64, fee: f64) {
        let old_qty = self.quantity as f64;
        let add_qty = quantity as f64;
        self.average_cost =
            (old_qty * self.average_cost + price * add_qty + fee) / (old_qty + add_qty);
        self.quantity += quantity;
        self.last_price = price;
    }

    /// Apply a sell fill. The average cost is left untouched; the caller
    /// must have verified `quantity <= self.quantity` and must drop the
    /// position when the remaining quantity is zero.
    pub fn sell(&mut self, price: f64, quantity: u64) {
        debug_assert!(quantity <= self.quantity);
        self.quantity -= quantity;
        self.last_price = price;
    }

    /// Revalue at the latest observed price. Cost basis is untouched.
    pub fn mark_to_market(&mut self, price: f64) {
        self.last_price = price;
    }

    /// Market value at the last observed price.
    pub fn market_value(&self) -> f64 {
        self.quantity as f64 * self.last_price
    }

    /// Unrealized P&L against the average cost basis.
    pub fn unrealized_pnl(&self) -> f64 {
        (self.last_price - self.average_cost) * self.quantity as f64
    }
}

// =============================================================================
// Trades
// =============================================================================

/// An executed trade. Immutable once appended to the account history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Unique trade ID.
    pub id: String,
    /// When the trade executed (ms since epoch).
    pub timestamp: i64,
    /// Symbol traded.
    pub symbol: String,
    /// Buy or sell.
    pub side: TradeSide,
    /// Execution price per share.
    pub price: f64,
    /// Shares traded.
    pub quantity: u64,
    /// Total fee charged.
    pub fee: f64,
    /// Realized P&L net of the sell-side fee. `None` on buys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realized_pnl: Option<f64>,
}

impl Trade {
    /// Create a new trade record stamped with the current time.
    pub fn new(
        symbol: &str,
        side: TradeSide,
        price: f64,
        quantity: u64,
        fee: f64,
        realized_pnl: Option<f64>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            symbol: symbol.to_string(),
            side,
            price,
            quantity,
            fee,
            realized_pnl,
        }
    }

    /// Gross trade value (price x quantity), fees excluded.
    pub fn amount(&self) -> f64 {
        self.price * self.quantity as f64
    }
}

// =============================================================================
// Account
// =============================================================================

/// The simulated brokerage account: cash, holdings, and trade history.
///
/// Exactly one account exists per persistence key. All mutation goes through
/// the ledger service; this type only holds state and the total-asset
/// recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Free cash balance.
    pub cash: f64,
    /// Cash plus the market value of every position.
    pub total_asset: f64,
    /// Capital the account started (or was last reset) with.
    pub initial_capital: f64,
    /// Open positions keyed by symbol. Never contains zero-quantity entries.
    pub positions: HashMap<String, Position>,
    /// Executed trades, most recent first.
    pub history: Vec<Trade>,
    /// When the account was last mutated (ms since epoch).
    pub last_updated: i64,
    /// Display currency (e.g. "CNY").
    pub currency: String,
}

impl Account {
    /// Create a fresh account with no positions and no history.
    pub fn new(initial_capital: f64, currency: &str) -> Self {
        Self {
            cash: initial_capital,
            total_asset: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            history: Vec::new(),
            last_updated: chrono::Utc::now().timestamp_millis(),
            currency: currency.to_string(),
        }
    }

    /// Recompute the total asset from scratch: cash plus the market value
    /// of every position. Always a full pass, never incremental.
    pub fn recompute_total_asset(&mut self) {
        self.total_asset =
            self.cash + self.positions.values().map(Position::market_value).sum::<f64>();
    }

    /// Total profit and loss since the account started.
    pub fn profit_and_loss(&self) -> f64 {
        self.total_asset - self.initial_capital
    }

    /// P&L as a fraction of initial capital.
    pub fn profit_and_loss_ratio(&self) -> f64 {
        if self.initial_capital > 0.0 {
            self.profit_and_loss() / self.initial_capital
        } else {
            0.0
        }
    }
}

// =============================================================================
// Request/Response Types for API
// =============================================================================

/// Request to execute an order against the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub symbol: String,
    pub side: TradeSide,
    pub price: f64,
    pub quantity: u64,
}

/// One observed market price for a symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceTick {
    pub symbol: String,
    pub price: f64,
}

/// Request to reset the account to a fresh state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_capital: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

/// A position as projected onto the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionView {
    pub symbol: String,
    pub quantity: u64,
    pub average_cost: f64,
    pub last_price: f64,
    pub market_value: f64,
    pub unrealized_pnl: f64,
}

impl From<&Position> for PositionView {
    fn from(p: &Position) -> Self {
        Self {
            symbol: p.symbol.clone(),
            quantity: p.quantity,
            average_cost: p.average_cost,
            last_price: p.last_price,
            market_value: p.market_value(),
            unrealized_pnl: p.unrealized_pnl(),
        }
    }
}

/// Read-only dashboard snapshot of the account. Derived, never authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub cash: f64,
    pub total_asset: f64,
    pub profit_and_loss: f64,
    pub profit_and_loss_ratio: f64,
    pub currency: String,
    pub positions: HashMap<String, PositionView>,
    /// Most recent first.
    pub history: Vec<Trade>,
}

//! Account Ledger
//!
//! The one component of the dashboard with real correctness requirements:
//! a single-account bookkeeping engine tracking cash, positions, and fills
//! under repeated buy/sell/mark-to-market operations, persisted on every
//! mutation with no server-side authority to fall back on.
//!
//! Every public operation runs to completion synchronously and is
//! all-or-nothing: on a rejected order the account is byte-for-byte
//! unchanged. After every successful mutation the account is persisted and
//! a change event is broadcast; subscribers re-fetch the snapshot.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::services::{AccountStore, FeeSchedule};
use crate::types::{Account, DashboardData, Position, PriceTick, Trade, TradeSide};

/// Ledger business errors. None of these are fatal; the account is left
/// untouched in every case.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("Insufficient position in {symbol}: {available} shares available")]
    InsufficientPosition { symbol: String, available: u64 },

    #[error("Invalid order: {0}")]
    InvalidOrder(String),
}

/// Event broadcast after ledger activity. Carries no account payload so
/// consumers stay decoupled from ledger internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEvent {
    /// The account changed; re-fetch the snapshot.
    Changed,
    /// A persistence write failed; in-memory state is live but unsaved.
    SaveFailed,
}

/// The simulated brokerage ledger service.
///
/// An explicit value, constructed once and injected wherever it is needed.
/// Tests build their own against an in-memory store without interference.
pub struct LedgerService {
    account: RwLock<Account>,
    store: Arc<AccountStore>,
    fees: FeeSchedule,
    events: broadcast::Sender<LedgerEvent>,
}

impl LedgerService {
    /// Create the service, restoring the persisted account if the store has
    /// a usable one, otherwise starting fresh with the given capital.
    pub fn new(
        store: Arc<AccountStore>,
        fees: FeeSchedule,
        initial_capital: f64,
        currency: &str,
    ) -> Self {
        let account = match store.load() {
            Some(account) => {
                info!(
                    "Restored account: cash {:.2}, {} positions, {} trades",
                    account.cash,
                    account.positions.len(),
                    account.history.len()
                );
                account
            }
            None => {
                info!(
                    "Starting fresh account with {:.2} {}",
                    initial_capital, currency
                );
                Account::new(initial_capital, currency)
            }
        };

        let (events, _) = broadcast::channel(64);
        Self {
            account: RwLock::new(account),
            store,
            fees,
            events,
        }
    }

    /// Subscribe to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    /// Persist the account and notify subscribers. Write failures keep the
    /// in-memory state authoritative: they are logged, signalled as
    /// [`LedgerEvent::SaveFailed`], and otherwise absorbed.
    fn persist_and_notify(&self, account: &mut Account) {
        account.last_updated = chrono::Utc::now().timestamp_millis();
        match self.store.save(account) {
            Ok(()) => {
                let _ = self.events.send(LedgerEvent::Changed);
            }
            Err(e) => {
                warn!("Account save failed, state is live but unsaved: {}", e);
                let _ = self.events.send(LedgerEvent::SaveFailed);
            }
        }
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Execute a buy or sell order against the account.
    ///
    /// Validation happens before any mutation, so a rejected order leaves
    /// the account exactly as it was: no cash movement, no position change,
    /// no history entry.
    pub fn execute_order(
        &self,
        symbol: &str,
        side: TradeSide,
        price: f64,
        quantity: u64,
    ) -> Result<Trade, LedgerError> {
        if symbol.is_empty() {
            return Err(LedgerError::InvalidOrder("symbol must not be empty".into()));
        }
        if quantity == 0 {
            return Err(LedgerError::InvalidOrder("quantity must be positive".into()));
        }
        if !price.is_finite() || price <= 0.0 {
            return Err(LedgerError::InvalidOrder(format!(
                "price must be a positive number, got {}",
                price
            )));
        }

        let mut account = self.account.write().unwrap();

        let amount = price * quantity as f64;
        let fee = self.fees.calculate(side, amount).total();

        let trade = match side {
            TradeSide::Buy => {
                let required = amount + fee;
                if account.cash < required {
                    return Err(LedgerError::InsufficientFunds {
                        required,
                        available: account.cash,
                    });
                }

                account.cash -= required;
                account
                    .positions
                    .entry(symbol.to_string())
                    .or_insert_with(|| Position::opened(symbol))
                    .buy(price, quantity, fee);

                Trade::new(symbol, side, price, quantity, fee, None)
            }
            TradeSide::Sell => {
                let held = account.positions.get(symbol).map_or(0, |p| p.quantity);
                if held < quantity {
                    return Err(LedgerError::InsufficientPosition {
                        symbol: symbol.to_string(),
                        available: held,
                    });
                }

                // Derive realized P&L before the cost basis can disappear
                // with a fully closed position.
                let average_cost = account.positions[symbol].average_cost;
                let realized = (price - average_cost) * quantity as f64 - fee;

                let remaining = {
                    let position = account.positions.get_mut(symbol).unwrap();
                    position.sell(price, quantity);
                    position.quantity
                };
                if remaining == 0 {
                    account.positions.remove(symbol);
                }

                account.cash += amount - fee;
                Trade::new(symbol, side, price, quantity, fee, Some(realized))
            }
        };

        account.history.insert(0, trade.clone());
        account.recompute_total_asset();
        self.persist_and_notify(&mut account);

        info!(
            "Executed {} {} x{} @ {:.2}, fee {:.2}",
            trade.side, trade.symbol, trade.quantity, trade.price, trade.fee
        );

        Ok(trade)
    }

    // =========================================================================
    // Market data
    // =========================================================================

    /// Mark a held position to the latest observed price. A tick for a
    /// symbol the account does not hold is a complete no-op.
    pub fn update_market_price(&self, symbol: &str, price: f64) -> bool {
        if !price.is_finite() || price <= 0.0 {
            return false;
        }

        let mut account = self.account.write().unwrap();
        let Some(position) = account.positions.get_mut(symbol) else {
            return false;
        };
        position.mark_to_market(price);
        account.recompute_total_asset();
        self.persist_and_notify(&mut account);
        true
    }

    /// Apply one tick cycle: mark every held symbol in the batch, then
    /// recompute, persist, and notify once. Returns how many positions
    /// were marked.
    pub fn update_market_prices(&self, ticks: &[PriceTick]) -> usize {
        let mut account = self.account.write().unwrap();

        let mut updated = 0;
        for tick in ticks {
            if !tick.price.is_finite() || tick.price <= 0.0 {
                continue;
            }
            if let Some(position) = account.positions.get_mut(&tick.symbol) {
                position.mark_to_market(tick.price);
                updated += 1;
            }
        }

        if updated > 0 {
            account.recompute_total_asset();
            self.persist_and_notify(&mut account);
        }
        updated
    }

    // =========================================================================
    // Control operations
    // =========================================================================

    /// Destructive full replacement with a fresh zero-history account.
    pub fn reset(&self, initial_capital: f64, currency: &str) {
        let mut account = self.account.write().unwrap();
        *account = Account::new(initial_capital, currency);
        self.persist_and_notify(&mut account);
        info!("Account reset to {:.2} {}", initial_capital, currency);
    }

    /// Drop a position outright, returning whether it existed. Defensive
    /// cleanup; the freed shares are simply forgotten.
    pub fn delete_position(&self, symbol: &str) -> bool {
        let mut account = self.account.write().unwrap();
        if account.positions.remove(symbol).is_none() {
            return false;
        }
        account.recompute_total_asset();
        self.persist_and_notify(&mut account);
        true
    }

    /// Remove any zero-quantity entries. The sell path never leaves them
    /// behind, so this exists for persisted state written by older or
    /// foreign writers. Returns how many entries were purged.
    pub fn purge_zero_positions(&self) -> usize {
        let mut account = self.account.write().unwrap();
        let before = account.positions.len();
        account.positions.retain(|_, p| p.quantity > 0);
        let purged = before - account.positions.len();
        if purged > 0 {
            account.recompute_total_asset();
            self.persist_and_notify(&mut account);
        }
        purged
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Read-only dashboard snapshot. No side effects, no mutation.
    pub fn dashboard_data(&self) -> DashboardData {
        let account = self.account.read().unwrap();
        DashboardData {
            cash: account.cash,
            total_asset: account.total_asset,
            profit_and_loss: account.profit_and_loss(),
            profit_and_loss_ratio: account.profit_and_loss_ratio(),
            currency: account.currency.clone(),
            positions: account
                .positions
                .iter()
                .map(|(symbol, position)| (symbol.clone(), position.into()))
                .collect(),
            history: account.history.clone(),
        }
    }
}

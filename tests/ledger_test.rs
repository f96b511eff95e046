//! Tests for the simulated brokerage ledger
//!
//! Tests cover:
//! - Fee arithmetic on full buy/sell round trips
//! - Cost basis blending and mark-to-market
//! - Rejection paths (insufficient funds/position) leaving state untouched
//! - Ledger invariants after every operation
//! - Tick idempotence and batch tick cycles
//! - History ordering and realized P&L records
//! - Reset and defensive cleanup operations

use std::sync::Arc;

use paperdesk::services::{AccountStore, FeeSchedule, LedgerService};
use paperdesk::types::TradeSide;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn create_service(initial_capital: f64) -> LedgerService {
    let store = Arc::new(AccountStore::new_in_memory().unwrap());
    LedgerService::new(store, FeeSchedule::default(), initial_capital, "CNY")
}

/// total asset must equal cash plus the marked value of every position.
fn assert_ledger_invariants(service: &LedgerService) {
    let data = service.dashboard_data();
    let position_value: f64 = data.positions.values().map(|p| p.market_value).sum();
    assert_close(data.total_asset, data.cash + position_value);
    assert!(data.cash >= 0.0, "cash went negative: {}", data.cash);
    assert!(
        data.positions.values().all(|p| p.quantity > 0),
        "zero-quantity position survived"
    );
}

// =============================================================================
// Order Execution
// =============================================================================

mod order_tests {
    use super::*;

    #[test]
    fn test_buy_full_fee_arithmetic() {
        // Capital 1,000,000; buy 100 shares of 600519 at 1800.00.
        let service = create_service(1_000_000.0);
        let trade = service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        // commission = max(5, 180000 * 0.00025) = 45, transfer = 3.6
        assert_close(trade.fee, 48.6);
        assert!(trade.realized_pnl.is_none());

        let data = service.dashboard_data();
        assert_close(data.cash, 819_951.40);

        let position = &data.positions["600519"];
        assert_eq!(position.quantity, 100);
        // (180000 + 48.6) / 100
        assert_close(position.average_cost, 1800.486);
        assert_close(position.last_price, 1800.0);

        assert_ledger_invariants(&service);
    }

    #[test]
    fn test_sell_full_fee_arithmetic() {
        // From the buy scenario, sell 50 shares at 1900.00.
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        let trade = service
            .execute_order("600519", TradeSide::Sell, 1900.0, 50)
            .unwrap();

        // commission 23.75 + transfer 1.9 + stamp duty 95
        assert_close(trade.fee, 120.65);

        let data = service.dashboard_data();
        // 819,951.40 + (95,000 - 120.65)
        assert_close(data.cash, 914_830.75);

        let position = &data.positions["600519"];
        assert_eq!(position.quantity, 50);
        // Sells never move the cost basis.
        assert_close(position.average_cost, 1800.486);
        assert_close(position.last_price, 1900.0);

        assert_ledger_invariants(&service);
    }

    #[test]
    fn test_sell_records_realized_pnl() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        let trade = service
            .execute_order("600519", TradeSide::Sell, 1900.0, 50)
            .unwrap();

        // (1900 - 1800.486) * 50 - 120.65
        assert_close(trade.realized_pnl.unwrap(), 4855.05);
    }

    #[test]
    fn test_full_close_removes_position_but_keeps_pnl() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        let trade = service
            .execute_order("600519", TradeSide::Sell, 1900.0, 100)
            .unwrap();

        let data = service.dashboard_data();
        assert!(data.positions.is_empty());
        // The cost basis is gone with the position; the realized P&L on the
        // trade record is the only place it survives.
        assert!(trade.realized_pnl.is_some());
        assert_ledger_invariants(&service);
    }

    #[test]
    fn test_buying_twice_blends_cost_basis() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("000858", TradeSide::Buy, 100.0, 100)
            .unwrap();
        service
            .execute_order("000858", TradeSide::Buy, 200.0, 100)
            .unwrap();

        let data = service.dashboard_data();
        let position = &data.positions["000858"];
        assert_eq!(position.quantity, 200);

        // Both fills hit the commission floor: (10000+5.2) and (20000+5.4).
        let expected = (10_005.2 + 20_005.4) / 200.0;
        assert_close(position.average_cost, expected);
        assert_ledger_invariants(&service);
    }

    #[test]
    fn test_sell_never_held_symbol_is_rejected_unchanged() {
        let service = create_service(1_000_000.0);
        let before = service.dashboard_data();

        let err = service
            .execute_order("999999", TradeSide::Sell, 10.0, 1_000_000)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("0 shares available"), "message: {message}");

        let after = service.dashboard_data();
        assert_eq!(after, before);
    }

    #[test]
    fn test_oversell_is_rejected_with_available_quantity() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        let before = service.dashboard_data();
        let err = service
            .execute_order("600519", TradeSide::Sell, 1900.0, 101)
            .unwrap_err();
        assert!(err.to_string().contains("100 shares available"));
        assert_eq!(service.dashboard_data(), before);
    }

    #[test]
    fn test_insufficient_funds_is_rejected_unchanged() {
        let service = create_service(10_000.0);
        let before = service.dashboard_data();

        let err = service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("need"), "message: {message}");
        assert!(message.contains("have"), "message: {message}");

        let after = service.dashboard_data();
        assert_eq!(after, before);
        assert!(after.history.is_empty());
    }

    #[test]
    fn test_buy_rejected_when_fees_push_over_cash() {
        // Exactly enough for the shares but not the fees.
        let service = create_service(180_000.0);
        let err = service.execute_order("600519", TradeSide::Buy, 1800.0, 100);
        assert!(err.is_err());

        let data = service.dashboard_data();
        assert_close(data.cash, 180_000.0);
        assert!(data.positions.is_empty());
    }

    #[test]
    fn test_cash_stays_nonnegative_under_exhausting_buys() {
        let service = create_service(50_000.0);
        for _ in 0..100 {
            // Keep buying until rejection; cash must never dip below zero.
            if service
                .execute_order("000001", TradeSide::Buy, 11.0, 1000)
                .is_err()
            {
                break;
            }
            assert_ledger_invariants(&service);
        }
        assert_ledger_invariants(&service);
    }
}

// =============================================================================
// Market Data
// =============================================================================

mod tick_tests {
    use super::*;
    use paperdesk::types::PriceTick;

    #[test]
    fn test_tick_marks_position_and_recomputes() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        assert!(service.update_market_price("600519", 1900.0));

        let data = service.dashboard_data();
        let position = &data.positions["600519"];
        assert_close(position.last_price, 1900.0);
        // Cost basis untouched by mark-to-market.
        assert_close(position.average_cost, 1800.486);
        assert_close(data.total_asset, data.cash + 190_000.0);
        assert_ledger_invariants(&service);
    }

    #[test]
    fn test_tick_is_idempotent() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        service.update_market_price("600519", 1850.0);
        let once = service.dashboard_data();
        service.update_market_price("600519", 1850.0);
        let twice = service.dashboard_data();

        assert_eq!(once, twice);
    }

    #[test]
    fn test_tick_for_unheld_symbol_changes_nothing() {
        let service = create_service(1_000_000.0);
        let before = service.dashboard_data();
        assert!(!service.update_market_price("600519", 1800.0));
        assert_eq!(service.dashboard_data(), before);
    }

    #[test]
    fn test_batch_cycle_marks_held_symbols_only() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        service
            .execute_order("000858", TradeSide::Buy, 150.0, 200)
            .unwrap();

        let updated = service.update_market_prices(&[
            PriceTick {
                symbol: "600519".into(),
                price: 1820.0,
            },
            PriceTick {
                symbol: "000858".into(),
                price: 148.0,
            },
            PriceTick {
                symbol: "601318".into(),
                price: 55.0,
            },
        ]);

        assert_eq!(updated, 2);
        let data = service.dashboard_data();
        assert_close(data.positions["600519"].last_price, 1820.0);
        assert_close(data.positions["000858"].last_price, 148.0);
        assert_ledger_invariants(&service);
    }
}

// =============================================================================
// History
// =============================================================================

mod history_tests {
    use super::*;

    #[test]
    fn test_history_is_most_recent_first() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        service
            .execute_order("000858", TradeSide::Buy, 150.0, 200)
            .unwrap();
        service
            .execute_order("600519", TradeSide::Sell, 1900.0, 50)
            .unwrap();

        let history = service.dashboard_data().history;
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].side, TradeSide::Sell);
        assert_eq!(history[1].symbol, "000858");
        assert_eq!(history[2].symbol, "600519");
        assert!(history[0].timestamp >= history[2].timestamp);
    }

    #[test]
    fn test_rejected_orders_append_nothing() {
        let service = create_service(1_000.0);
        let _ = service.execute_order("600519", TradeSide::Buy, 1800.0, 100);
        let _ = service.execute_order("600519", TradeSide::Sell, 1800.0, 100);
        assert!(service.dashboard_data().history.is_empty());
    }
}

// =============================================================================
// Control Operations
// =============================================================================

mod control_tests {
    use super::*;

    #[test]
    fn test_reset_replaces_everything() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        service.reset(500_000.0, "USD");

        let data = service.dashboard_data();
        assert_eq!(data.cash, 500_000.0);
        assert_eq!(data.total_asset, 500_000.0);
        assert_eq!(data.profit_and_loss, 0.0);
        assert_eq!(data.currency, "USD");
        assert!(data.positions.is_empty());
        assert!(data.history.is_empty());
    }

    #[test]
    fn test_delete_position_forgets_shares() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        assert!(service.delete_position("600519"));
        assert!(!service.delete_position("600519"));

        let data = service.dashboard_data();
        assert!(data.positions.is_empty());
        // Cash is not refunded; total asset drops to cash alone.
        assert_close(data.total_asset, data.cash);
        assert_ledger_invariants(&service);
    }

    #[test]
    fn test_purge_on_clean_ledger_is_noop() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        // The sell path already drops emptied positions, so there is
        // nothing for the defensive purge to find.
        assert_eq!(service.purge_zero_positions(), 0);
        assert_eq!(service.dashboard_data().positions.len(), 1);
    }
}

// =============================================================================
// Projection
// =============================================================================

mod dashboard_tests {
    use super::*;

    #[test]
    fn test_snapshot_reports_pnl_against_initial_capital() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        service.update_market_price("600519", 2000.0);

        let data = service.dashboard_data();
        assert_close(data.profit_and_loss, data.total_asset - 1_000_000.0);
        assert_close(
            data.profit_and_loss_ratio,
            data.profit_and_loss / 1_000_000.0,
        );
        // Gained 200/share on 100 shares, paid 48.6 in fees.
        assert_close(data.profit_and_loss, 20_000.0 - 48.6);
    }

    #[test]
    fn test_snapshot_has_no_side_effects() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();

        let first = service.dashboard_data();
        let second = service.dashboard_data();
        assert_eq!(first, second);
    }

    #[test]
    fn test_position_view_carries_unrealized_pnl() {
        let service = create_service(1_000_000.0);
        service
            .execute_order("600519", TradeSide::Buy, 1800.0, 100)
            .unwrap();
        service.update_market_price("600519", 1900.0);

        let data = service.dashboard_data();
        let position = &data.positions["600519"];
        assert_close(position.market_value, 190_000.0);
        // (1900 - 1800.486) * 100
        assert_close(position.unrealized_pnl, 9_951.4);
    }
}

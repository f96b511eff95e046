//! Dashboard display formatting.
//!
//! Purely presentational: turns monetary magnitudes into compact
//! human-readable strings scaled to the account currency. Never mutates
//! the data it reads.

use crate::types::DashboardData;
use serde::Serialize;

/// Dashboard headline figures rendered as display strings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDisplay {
    pub cash: String,
    pub total_asset: String,
    pub profit_and_loss: String,
    pub profit_and_loss_ratio: String,
}

/// Build the display strings for a dashboard snapshot.
pub fn dashboard_display(data: &DashboardData) -> DashboardDisplay {
    DashboardDisplay {
        cash: format_money(data.cash, &data.currency),
        total_asset: format_money(data.total_asset, &data.currency),
        profit_and_loss: format_money(data.profit_and_loss, &data.currency),
        profit_and_loss_ratio: format_pct(data.profit_and_loss_ratio),
    }
}

/// Format a monetary value into locale-scaled units: 万/亿 for CNY,
/// K/M/B otherwise. Small magnitudes render plain with two decimals.
pub fn format_money(value: f64, currency: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();

    if currency == "CNY" {
        if abs >= 1e8 {
            format!("{}{:.2}亿", sign, abs / 1e8)
        } else if abs >= 1e4 {
            format!("{}{:.2}万", sign, abs / 1e4)
        } else {
            format!("{}{:.2}", sign, abs)
        }
    } else if abs >= 1e9 {
        format!("{}{:.2}B", sign, abs / 1e9)
    } else if abs >= 1e6 {
        format!("{}{:.2}M", sign, abs / 1e6)
    } else if abs >= 1e3 {
        format!("{}{:.2}K", sign, abs / 1e3)
    } else {
        format!("{}{:.2}", sign, abs)
    }
}

/// Format a ratio as a signed percentage with two decimals.
pub fn format_pct(ratio: f64) -> String {
    format!("{:+.2}%", ratio * 100.0)
}

use std::env;

/// Fee schedule overrides.
#[derive(Debug, Clone)]
pub struct FeeConfig {
    /// Commission rate on trade value.
    pub commission_rate: f64,
    /// Minimum commission per order.
    pub min_commission: f64,
    /// Transfer fee rate, charged on both sides.
    pub transfer_fee_rate: f64,
    /// Stamp duty rate, sell side only.
    pub stamp_duty_rate: f64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            commission_rate: 0.00025,
            min_commission: 5.0,
            transfer_fee_rate: 0.00002,
            stamp_duty_rate: 0.001,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite database path for the persisted account.
    pub database_path: String,
    /// Persistence key the account is stored under.
    pub account_key: String,
    /// Days before persisted account state is considered stale.
    pub stale_after_days: i64,
    /// Capital a fresh account starts with.
    pub initial_capital: f64,
    /// Display currency for a fresh account.
    pub currency: String,
    /// Fee schedule.
    pub fees: FeeConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path: env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "paperdesk.db".to_string()),
            account_key: env::var("ACCOUNT_KEY").unwrap_or_else(|_| "default".to_string()),
            stale_after_days: env::var("STALE_AFTER_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(7),
            initial_capital: env::var("INITIAL_CAPITAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000_000.0),
            currency: env::var("CURRENCY").unwrap_or_else(|_| "CNY".to_string()),
            fees: FeeConfig {
                commission_rate: env::var("COMMISSION_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.00025),
                min_commission: env::var("MIN_COMMISSION")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(5.0),
                transfer_fee_rate: env::var("TRANSFER_FEE_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.00002),
                stamp_duty_rate: env::var("STAMP_DUTY_RATE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0.001),
            },
        }
    }

    /// Staleness window in milliseconds.
    pub fn stale_after_ms(&self) -> i64 {
        self.stale_after_days * 24 * 60 * 60 * 1000
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_path: "paperdesk.db".to_string(),
            account_key: "default".to_string(),
            stale_after_days: 7,
            initial_capital: 1_000_000.0,
            currency: "CNY".to_string(),
            fees: FeeConfig::default(),
        }
    }

    #[test]
    fn test_config_default_values() {
        let config = base_config();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3001);
        assert_eq!(config.stale_after_days, 7);
        assert_eq!(config.initial_capital, 1_000_000.0);
        assert_eq!(config.currency, "CNY");
    }

    #[test]
    fn test_stale_window_in_ms() {
        let config = base_config();
        assert_eq!(config.stale_after_ms(), 7 * 24 * 60 * 60 * 1000);
    }

    #[test]
    fn test_default_fee_rates() {
        let fees = FeeConfig::default();
        assert_eq!(fees.commission_rate, 0.00025);
        assert_eq!(fees.min_commission, 5.0);
        assert_eq!(fees.transfer_fee_rate, 0.00002);
        assert_eq!(fees.stamp_duty_rate, 0.001);
    }

    #[test]
    fn test_config_clone() {
        let config = base_config();
        let cloned = config.clone();
        assert_eq!(cloned.host, config.host);
        assert_eq!(cloned.account_key, config.account_key);
    }
}

pub mod account_store;
pub mod fees;
pub mod formatter;
pub mod ledger;

pub use account_store::{AccountStore, StoreError, DEFAULT_STALE_AFTER_MS, SCHEMA_VERSION};
pub use fees::FeeSchedule;
pub use formatter::{dashboard_display, DashboardDisplay};
pub use ledger::{LedgerError, LedgerEvent, LedgerService};

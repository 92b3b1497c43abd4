pub mod dashboard;
pub mod format;
pub mod history;
pub mod metrics;
pub mod orderbook;
pub mod ticker;

pub use dashboard::{AccountSnapshot, DashboardSession, LoadTicket};
pub use format::{format_compact_number, format_currency, format_number, format_percentage};
pub use history::{export_csv, sort_trades, unique_assets, TradeFilter, TradeSort};
pub use metrics::{
    compute_performance, compute_portfolio_metrics, compute_trading_stats, daily_summaries,
};
pub use orderbook::summarize;
pub use ticker::{ticker, MAJOR_COINS};

use std::env;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.hyperliquid.xyz/info";
pub const DEFAULT_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

/// Order book polling configuration.
#[derive(Debug, Clone)]
pub struct OrderBookConfig {
    /// Coin whose book is polled.
    pub coin: String,
    /// Seconds between refreshes.
    pub refresh_secs: u64,
    /// Levels per side kept in the summary.
    pub depth: usize,
}

impl Default for OrderBookConfig {
    fn default() -> Self {
        Self {
            coin: "ETH".to_string(),
            refresh_secs: 5,
            depth: 10,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Info endpoint base URL; the operation name is appended as a path suffix.
    pub api_url: String,
    /// WebSocket endpoint.
    pub ws_url: String,
    /// Wallet address to watch.
    pub wallet_address: Option<String>,
    /// Fixed delay between reconnect attempts (ms).
    pub reconnect_delay_ms: u64,
    /// Per-request HTTP timeout (seconds).
    pub request_timeout_secs: u64,
    /// Order book polling.
    pub order_book: OrderBookConfig,
    /// Seconds between price ticker refreshes.
    pub ticker_refresh_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            wallet_address: None,
            reconnect_delay_ms: 3000,
            request_timeout_secs: 10,
            order_book: OrderBookConfig::default(),
            ticker_refresh_secs: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from any key lookup, falling back to defaults
    /// for missing or unparseable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let book_defaults = OrderBookConfig::default();

        Self {
            api_url: lookup("HYPERLIQUID_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            ws_url: lookup("HYPERLIQUID_WS_URL").unwrap_or(defaults.ws_url),
            wallet_address: lookup("WALLET_ADDRESS")
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
            reconnect_delay_ms: lookup("RECONNECT_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reconnect_delay_ms),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            order_book: OrderBookConfig {
                coin: lookup("ORDER_BOOK_COIN")
                    .map(|c| c.trim().to_uppercase())
                    .filter(|c| !c.is_empty())
                    .unwrap_or(book_defaults.coin),
                refresh_secs: lookup("ORDER_BOOK_REFRESH_SECS")
                    .and_then(|v| v.parse().ok())
                    .filter(|v| *v > 0)
                    .unwrap_or(book_defaults.refresh_secs),
                depth: lookup("ORDER_BOOK_DEPTH")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(book_defaults.depth),
            },
            ticker_refresh_secs: lookup("TICKER_REFRESH_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.ticker_refresh_secs),
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{parse_decimal, parse_optional_decimal};

/// Current mid price per coin, as decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllMids(pub HashMap<String, String>);

impl AllMids {
    /// Mid price for a coin, `None` when the coin is missing or unparseable.
    pub fn mid(&self, coin: &str) -> Option<f64> {
        parse_optional_decimal(self.0.get(coin).map(String::as_str))
    }

    pub fn get(&self, coin: &str) -> Option<&str> {
        self.0.get(coin).map(String::as_str)
    }

    pub fn insert(&mut self, coin: impl Into<String>, mid: impl Into<String>) {
        self.0.insert(coin.into(), mid.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AllMids {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(coin, mid)| (coin.into(), mid.into()))
                .collect(),
        )
    }
}

/// Exchange metadata: the tradeable universe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    pub universe: Vec<AssetMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetMeta {
    pub name: String,
    pub sz_decimals: u32,
    pub max_leverage: u32,
    #[serde(default)]
    pub only_isolated: bool,
}

/// A resting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrder {
    pub coin: String,
    pub limit_px: String,
    pub oid: u64,
    pub side: String,
    pub sz: String,
    /// Placement time (unix ms)
    pub timestamp: i64,
}

impl OpenOrder {
    pub fn limit_price(&self) -> f64 {
        parse_decimal(&self.limit_px)
    }

    pub fn size(&self) -> f64 {
        parse_decimal(&self.sz)
    }
}

/// Price movement since the previous ticker refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Up,
    Down,
    Unchanged,
}

/// One coin in the price ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub coin: String,
    pub price: f64,
    /// Price at the previous refresh, or `price` on the first one
    pub prev_price: f64,
    pub direction: PriceDirection,
}

impl TickerEntry {
    /// Percentage change since the previous refresh, zero when there was none.
    pub fn change_pct(&self) -> f64 {
        if self.prev_price == 0.0 {
            return 0.0;
        }
        (self.price - self.prev_price) / self.prev_price * 100.0
    }
}

/// One funding payment applied to a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingEntry {
    pub time: i64,
    #[serde(default)]
    pub hash: String,
    pub delta: FundingDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingDelta {
    #[serde(rename = "type", default)]
    pub delta_type: String,
    pub coin: String,
    /// USDC paid (negative) or received (positive)
    pub usdc: String,
    pub szi: String,
    pub funding_rate: String,
}

impl FundingEntry {
    pub fn amount(&self) -> f64 {
        parse_decimal(&self.delta.usdc)
    }
}

/// One non-funding balance change (deposit, withdrawal, transfer, liquidation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerUpdate {
    pub time: i64,
    #[serde(default)]
    pub hash: String,
    pub delta: LedgerDelta,
}

/// Ledger delta; fields beyond `type` and `usdc` depend on the kind of update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerDelta {
    #[serde(rename = "type")]
    pub delta_type: String,
    #[serde(default)]
    pub usdc: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl LedgerUpdate {
    /// USDC moved by this update, zero when the kind carries no amount.
    pub fn amount(&self) -> f64 {
        parse_optional_decimal(self.delta.usdc.as_deref()).unwrap_or(0.0)
    }
}

/// OHLCV candle from `candleSnapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time (unix ms)
    #[serde(rename = "t")]
    pub open_time: i64,
    /// Close time (unix ms)
    #[serde(rename = "T")]
    pub close_time: i64,
    #[serde(rename = "s")]
    pub coin: String,
    #[serde(rename = "i")]
    pub interval: String,
    #[serde(rename = "o")]
    pub open: String,
    #[serde(rename = "h")]
    pub high: String,
    #[serde(rename = "l")]
    pub low: String,
    #[serde(rename = "c")]
    pub close: String,
    #[serde(rename = "v")]
    pub volume: String,
    /// Number of trades
    #[serde(rename = "n", default)]
    pub trades: u64,
}

impl Candle {
    pub fn close_price(&self) -> f64 {
        parse_decimal(&self.close)
    }

    /// Percentage change from open to close, zero when the open is zero.
    pub fn change_pct(&self) -> f64 {
        let open = parse_decimal(&self.open);
        if open == 0.0 {
            return 0.0;
        }
        (self.close_price() - open) / open * 100.0
    }
}

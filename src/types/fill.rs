use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::parse_decimal;

/// One executed trade as returned by `userFills`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFill {
    pub coin: String,
    pub px: String,
    pub sz: String,
    /// "B" (bid/buy) or "A" (ask/sell)
    pub side: String,
    /// Execution time (unix ms)
    pub time: i64,
    #[serde(default)]
    pub start_position: String,
    /// e.g. "Open Long", "Close Short"
    #[serde(default)]
    pub dir: String,
    pub closed_pnl: String,
    pub hash: String,
    #[serde(default)]
    pub oid: u64,
    #[serde(default)]
    pub crossed: bool,
    pub fee: String,
    pub tid: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_token: Option<String>,
}

impl UserFill {
    pub fn is_buy(&self) -> bool {
        matches!(self.side.as_str(), "B" | "b" | "buy" | "Buy")
    }

    /// Human-readable side label.
    pub fn side_label(&self) -> &str {
        match self.side.as_str() {
            "B" => "Buy",
            "A" => "Sell",
            other => other,
        }
    }

    /// Unique identifier built from the transaction hash and trade id.
    pub fn trade_id(&self) -> String {
        format!("{}-{}", self.hash, self.tid)
    }
}

/// A fill normalized into numbers, the unit every trade aggregation works on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub asset: String,
    pub side: String,
    pub size: f64,
    pub price: f64,
    pub pnl: f64,
    pub fees: f64,
    pub hash: String,
}

impl TradeRecord {
    /// Notional traded (size x price).
    pub fn volume(&self) -> f64 {
        self.size * self.price
    }
}

impl From<&UserFill> for TradeRecord {
    fn from(fill: &UserFill) -> Self {
        Self {
            id: fill.trade_id(),
            timestamp: DateTime::from_timestamp_millis(fill.time).unwrap_or_default(),
            asset: fill.coin.clone(),
            side: fill.side_label().to_string(),
            size: parse_decimal(&fill.sz),
            price: parse_decimal(&fill.px),
            pnl: parse_decimal(&fill.closed_pnl),
            fees: parse_decimal(&fill.fee),
            hash: fill.hash.clone(),
        }
    }
}

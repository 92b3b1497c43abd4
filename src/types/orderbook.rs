//! Order Book types for L2 depth data.

use serde::{Deserialize, Serialize};

use super::parse_decimal;

/// A single price level as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price at this level
    pub px: String,
    /// Total size resting at this price
    pub sz: String,
    /// Number of orders at this price
    #[serde(default)]
    pub n: u32,
}

impl BookLevel {
    pub fn price(&self) -> f64 {
        parse_decimal(&self.px)
    }

    pub fn size(&self) -> f64 {
        parse_decimal(&self.sz)
    }
}

/// Raw `l2Book` response: `levels[0]` are bids, `levels[1]` are asks.
#[derive(Debug, Clone, Deserialize)]
pub struct L2BookResponse {
    pub coin: String,
    #[serde(default)]
    pub levels: Vec<Vec<BookLevel>>,
    #[serde(default)]
    pub time: i64,
}

/// Order book for one coin with both sides price-ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSnapshot {
    pub coin: String,
    /// Bid levels, sorted by price descending
    pub bids: Vec<BookLevel>,
    /// Ask levels, sorted by price ascending
    pub asks: Vec<BookLevel>,
    /// Venue timestamp (unix ms)
    pub time: i64,
}

impl From<L2BookResponse> for OrderBookSnapshot {
    fn from(response: L2BookResponse) -> Self {
        let mut sides = response.levels.into_iter();
        let mut bids = sides.next().unwrap_or_default();
        let mut asks = sides.next().unwrap_or_default();

        bids.sort_by(|a, b| b.price().total_cmp(&a.price()));
        asks.sort_by(|a, b| a.price().total_cmp(&b.price()));

        Self {
            coin: response.coin,
            bids,
            asks,
            time: response.time,
        }
    }
}

/// A depth row with the running size from the top of the book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepthRow {
    pub price: f64,
    pub size: f64,
    pub orders: u32,
    /// Sum of sizes from the best level down to and including this one
    pub cumulative_size: f64,
}

/// Derived view of an order book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBookSummary {
    pub coin: String,
    pub bids: Vec<DepthRow>,
    pub asks: Vec<DepthRow>,
    /// Best bid price, zero when the side is empty
    pub best_bid: f64,
    /// Best ask price, zero when the side is empty
    pub best_ask: f64,
    /// best_ask - best_bid
    pub spread: f64,
    /// Spread as percentage of the best bid
    pub spread_pct: f64,
    pub mid_price: f64,
    pub bid_total: f64,
    pub ask_total: f64,
    /// (bid_total - ask_total) / (bid_total + ask_total), in -1.0..=1.0
    pub imbalance: f64,
    pub time: i64,
}

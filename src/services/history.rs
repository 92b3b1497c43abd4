//! Trade history filtering, ordering and CSV export.

use crate::types::TradeRecord;
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const CSV_HEADER: [&str; 7] = ["Timestamp", "Asset", "Side", "Size", "Price", "P&L", "Fees"];

/// Filter applied to the trade table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeFilter {
    /// Case-insensitive substring matched against asset or side
    #[serde(default)]
    pub search: String,
    /// Exact asset, or every asset when `None`
    #[serde(default)]
    pub asset: Option<String>,
}

impl TradeFilter {
    pub fn matches(&self, trade: &TradeRecord) -> bool {
        let needle = self.search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || trade.asset.to_lowercase().contains(&needle)
            || trade.side.to_lowercase().contains(&needle);

        let matches_asset = self
            .asset
            .as_deref()
            .map_or(true, |asset| trade.asset == asset);

        matches_search && matches_asset
    }

    /// Trades that pass the filter, in input order.
    pub fn apply<'a>(&self, trades: &'a [TradeRecord]) -> Vec<&'a TradeRecord> {
        trades.iter().filter(|t| self.matches(t)).collect()
    }
}

/// Distinct assets, alphabetically.
pub fn unique_assets(trades: &[TradeRecord]) -> Vec<String> {
    trades
        .iter()
        .map(|t| t.asset.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Sort order for the trade table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSort {
    /// Newest first
    #[default]
    Timestamp,
    /// Highest P&L first
    Pnl,
    /// Largest notional first
    Volume,
    /// Alphabetical by asset, newest first within an asset
    Asset,
}

/// Stable in-place sort.
pub fn sort_trades(trades: &mut [TradeRecord], order: TradeSort) {
    match order {
        TradeSort::Timestamp => trades.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
        TradeSort::Pnl => trades.sort_by(|a, b| b.pnl.total_cmp(&a.pnl)),
        TradeSort::Volume => trades.sort_by(|a, b| b.volume().total_cmp(&a.volume())),
        TradeSort::Asset => trades.sort_by(|a, b| {
            a.asset
                .cmp(&b.asset)
                .then_with(|| b.timestamp.cmp(&a.timestamp))
        }),
    }
}

// ============================================================================
// CSV
// ============================================================================

/// Render trades as CSV, one row per trade after the header. Rows end with
/// CRLF and fields holding a comma, quote or line break are quoted.
pub fn export_csv<'a, I>(trades: I) -> String
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));

    for trade in trades {
        push_row(
            &mut out,
            [
                trade.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                trade.asset.clone(),
                trade.side.clone(),
                trade.size.to_string(),
                trade.price.to_string(),
                trade.pnl.to_string(),
                trade.fees.to_string(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
    out.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

//! Order book depth summary.

use crate::types::{BookLevel, DepthRow, OrderBookSnapshot, OrderBookSummary};

/// Default number of levels shown per side.
pub const DEFAULT_DEPTH: usize = 10;

// ============================================================================
// Summary
// ============================================================================

/// Summarize the top `depth` levels of each side.
///
/// Spread, mid and percentages come from the best levels; totals and
/// imbalance only count the rows that were kept. An empty side reads as zero.
pub fn summarize(book: &OrderBookSnapshot, depth: usize) -> OrderBookSummary {
    let bids = depth_rows(&book.bids, depth);
    let asks = depth_rows(&book.asks, depth);

    let best_bid = bids.first().map(|r| r.price).unwrap_or(0.0);
    let best_ask = asks.first().map(|r| r.price).unwrap_or(0.0);

    let (spread, spread_pct, mid_price) = if best_bid > 0.0 && best_ask > 0.0 {
        let spread = best_ask - best_bid;
        (spread, spread / best_bid * 100.0, (best_bid + best_ask) / 2.0)
    } else {
        (0.0, 0.0, 0.0)
    };

    let bid_total = bids.last().map(|r| r.cumulative_size).unwrap_or(0.0);
    let ask_total = asks.last().map(|r| r.cumulative_size).unwrap_or(0.0);
    let total = bid_total + ask_total;
    let imbalance = if total > 0.0 {
        (bid_total - ask_total) / total
    } else {
        0.0
    };

    OrderBookSummary {
        coin: book.coin.clone(),
        bids,
        asks,
        best_bid,
        best_ask,
        spread,
        spread_pct,
        mid_price,
        bid_total,
        ask_total,
        imbalance,
        time: book.time,
    }
}

fn depth_rows(levels: &[BookLevel], depth: usize) -> Vec<DepthRow> {
    let mut cumulative = 0.0;
    levels
        .iter()
        .take(depth)
        .map(|level| {
            let size = level.size();
            cumulative += size;
            DepthRow {
                price: level.price(),
                size,
                orders: level.n,
                cumulative_size: cumulative,
            }
        })
        .collect()
}

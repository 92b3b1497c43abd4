//! Price ticker over a fixed set of major coins.

use crate::types::{AllMids, PriceDirection, TickerEntry};

/// Coins shown in the ticker, in display order.
pub const MAJOR_COINS: [&str; 8] = ["ETH", "BTC", "SOL", "ARB", "MATIC", "AVAX", "OP", "LINK"];

// ============================================================================
// Ticker
// ============================================================================

/// Build ticker entries from the latest mids.
///
/// Coins without a usable mid are skipped. Each entry's previous price is the
/// price of the matching entry in `previous`, or its own price when the coin
/// was not shown before.
pub fn ticker(mids: &AllMids, previous: &[TickerEntry]) -> Vec<TickerEntry> {
    MAJOR_COINS
        .iter()
        .filter_map(|&coin| {
            let price = mids.mid(coin)?;
            let prev_price = previous
                .iter()
                .find(|e| e.coin == coin)
                .map(|e| e.price)
                .unwrap_or(price);

            Some(TickerEntry {
                coin: coin.to_string(),
                price,
                prev_price,
                direction: direction(price, prev_price),
            })
        })
        .collect()
}

fn direction(price: f64, prev_price: f64) -> PriceDirection {
    if price > prev_price {
        PriceDirection::Up
    } else if price < prev_price {
        PriceDirection::Down
    } else {
        PriceDirection::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mids(pairs: &[(&str, &str)]) -> AllMids {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_first_refresh_has_no_movement() {
        let entries = ticker(&mids(&[("BTC", "64000"), ("ETH", "3100")]), &[]);

        assert_eq!(entries.len(), 2);
        // Display order follows the coin list, not the mids
        assert_eq!(entries[0].coin, "ETH");
        assert_eq!(entries[1].coin, "BTC");
        assert!(entries
            .iter()
            .all(|e| e.prev_price == e.price && e.direction == PriceDirection::Unchanged));
        assert_eq!(entries[0].change_pct(), 0.0);
    }

    #[test]
    fn test_previous_price_is_carried() {
        let first = ticker(&mids(&[("ETH", "3000"), ("BTC", "64000")]), &[]);
        let second = ticker(&mids(&[("ETH", "3030"), ("BTC", "63000"), ("SOL", "150")]), &first);

        let eth = &second[0];
        assert_eq!(eth.prev_price, 3000.0);
        assert_eq!(eth.direction, PriceDirection::Up);
        assert!((eth.change_pct() - 1.0).abs() < 1e-9);

        let btc = &second[1];
        assert_eq!(btc.prev_price, 64000.0);
        assert_eq!(btc.direction, PriceDirection::Down);

        // New coin starts from its own price
        let sol = &second[2];
        assert_eq!(sol.coin, "SOL");
        assert_eq!(sol.prev_price, 150.0);
        assert_eq!(sol.direction, PriceDirection::Unchanged);

        // Carry takes the last shown price, not the one before it
        let third = ticker(&mids(&[("ETH", "3030")]), &second);
        assert_eq!(third[0].prev_price, 3030.0);
        assert_eq!(third[0].direction, PriceDirection::Unchanged);
    }

    #[test]
    fn test_missing_coins_are_skipped() {
        let entries = ticker(
            &mids(&[("LINK", "14.2"), ("DOGE", "0.1"), ("OP", "bad"), ("ARB", "1.1")]),
            &[],
        );

        let coins: Vec<&str> = entries.iter().map(|e| e.coin.as_str()).collect();
        assert_eq!(coins, vec!["ARB", "LINK"]);
    }

    #[test]
    fn test_empty_mids_give_empty_ticker() {
        assert!(ticker(&AllMids::default(), &[]).is_empty());
    }
}

pub mod account;
pub mod fill;
pub mod market;
pub mod metrics;
pub mod orderbook;
pub mod ws;

pub use account::*;
pub use fill::*;
pub use market::*;
pub use metrics::*;
pub use orderbook::*;
pub use ws::*;

/// Parse a wire decimal string. Anything that is not a finite number reads as zero.
pub fn parse_decimal(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse an optional wire decimal. Absent or unparseable values stay unknown.
pub fn parse_optional_decimal(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

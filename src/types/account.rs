//! Account state types as returned by the `clearinghouseState` request and
//! the realtime `user` channel.

use serde::{Deserialize, Serialize};

use super::{parse_decimal, parse_optional_decimal};

/// Snapshot of one wallet's positions and margin at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default)]
    pub asset_positions: Vec<AssetPositionEntry>,
    #[serde(default)]
    pub cross_maintenance_margin_used: String,
    pub margin_summary: MarginSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cross_margin_summary: Option<MarginSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawable: Option<String>,
    /// Snapshot time (unix ms)
    #[serde(default)]
    pub time: i64,
}

impl UserState {
    /// Iterate the positions without their wire wrapper.
    pub fn positions(&self) -> impl Iterator<Item = &AssetPosition> {
        self.asset_positions.iter().map(|entry| &entry.position)
    }

    pub fn account_value(&self) -> f64 {
        self.margin_summary.account_value()
    }
}

/// Wire wrapper around a position (`{"position": {...}, "type": "oneWay"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetPositionEntry {
    pub position: AssetPosition,
    #[serde(rename = "type", default)]
    pub position_type: String,
}

/// One open position for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPosition {
    pub coin: String,
    /// Signed size: positive long, negative short
    pub szi: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_px: Option<String>,
    pub leverage: Leverage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquidation_px: Option<String>,
    pub margin_used: String,
    #[serde(default)]
    pub max_leverage: u32,
    pub position_value: String,
    pub return_on_equity: String,
    pub unrealized_pnl: String,
}

impl AssetPosition {
    pub fn size(&self) -> f64 {
        parse_decimal(&self.szi)
    }

    pub fn entry_price(&self) -> Option<f64> {
        parse_optional_decimal(self.entry_px.as_deref())
    }

    pub fn liquidation_price(&self) -> Option<f64> {
        parse_optional_decimal(self.liquidation_px.as_deref())
    }

    pub fn margin_used(&self) -> f64 {
        parse_decimal(&self.margin_used)
    }

    pub fn position_value(&self) -> f64 {
        parse_decimal(&self.position_value)
    }

    pub fn unrealized_pnl(&self) -> f64 {
        parse_decimal(&self.unrealized_pnl)
    }

    /// Return on equity as a fraction (0.05 = 5%).
    pub fn return_on_equity(&self) -> f64 {
        parse_decimal(&self.return_on_equity)
    }
}

/// Leverage setting of a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leverage {
    /// "cross" or "isolated"
    #[serde(rename = "type")]
    pub leverage_type: String,
    pub value: u32,
    /// Isolated margin only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_usd: Option<String>,
}

/// Account-level margin aggregates. All values are decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarginSummary {
    pub account_value: String,
    pub total_margin_used: String,
    pub total_ntl_pos: String,
    pub total_raw_usd: String,
}

impl MarginSummary {
    pub fn account_value(&self) -> f64 {
        parse_decimal(&self.account_value)
    }

    pub fn total_margin_used(&self) -> f64 {
        parse_decimal(&self.total_margin_used)
    }

    pub fn total_notional(&self) -> f64 {
        parse_decimal(&self.total_ntl_pos)
    }

    pub fn total_raw_usd(&self) -> f64 {
        parse_decimal(&self.total_raw_usd)
    }
}

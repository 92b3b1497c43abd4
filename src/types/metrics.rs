//! Derived metrics. None of these are persisted; they are recomputed from the
//! current account snapshot whenever it changes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::TradeRecord;

/// Direction of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    pub fn from_size(size: f64) -> Self {
        if size > 0.0 {
            PositionSide::Long
        } else if size < 0.0 {
            PositionSide::Short
        } else {
            PositionSide::Flat
        }
    }
}

/// How close the mark price is to the liquidation price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiquidationRisk {
    /// Mark within 5% of liquidation
    High,
    /// Mark within 15% of liquidation
    Medium,
    Low,
}

impl LiquidationRisk {
    /// Classify by distance between mark and liquidation price, relative to mark.
    pub fn classify(mark_price: f64, liquidation_price: f64) -> Option<Self> {
        if mark_price == 0.0 {
            return None;
        }
        let distance_pct = ((mark_price - liquidation_price) / mark_price).abs() * 100.0;
        Some(match distance_pct {
            d if d < 5.0 => LiquidationRisk::High,
            d if d < 15.0 => LiquidationRisk::Medium,
            _ => LiquidationRisk::Low,
        })
    }
}

/// A position enriched with its mark price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionDetail {
    pub coin: String,
    /// Signed size
    pub size: f64,
    pub side: PositionSide,
    pub entry_price: Option<f64>,
    /// Unknown when the coin has no mid price
    pub mark_price: Option<f64>,
    pub unrealized_pnl: f64,
    pub position_value: f64,
    pub margin_used: f64,
    pub leverage: u32,
    pub leverage_type: String,
    pub liquidation_price: Option<f64>,
    /// Return on equity, percent
    pub roe: f64,
    pub liquidation_risk: Option<LiquidationRisk>,
}

/// Account-level view derived from user state and mid prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioMetrics {
    pub account_value: f64,
    /// Sum of per-position margin used
    pub total_margin_used: f64,
    pub total_unrealized_pnl: f64,
    /// Sum of absolute position values
    pub total_position_value: f64,
    /// account_value - total_margin_used
    pub available_balance: f64,
    /// Percent of account value committed as margin; 0 when account value is 0
    pub margin_utilization: f64,
    pub position_details: Vec<PositionDetail>,
}

/// Headline statistics over a fill history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingStats {
    pub trades: Vec<TradeRecord>,
    pub total_pnl: f64,
    /// Sum of size x price
    pub total_volume: f64,
    pub total_fees: f64,
    /// Percent of trades with positive P&L
    pub win_rate: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub total_trades: usize,
}

/// Detailed performance analytics over a trade list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub total_pnl: f64,
    pub total_volume: f64,
    pub total_fees: f64,
    /// total_pnl - total_fees
    pub net_profit: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    /// Absolute average of losing trades
    pub avg_loss: f64,
    pub profit_factor: f64,
    /// Largest peak-to-trough drop of cumulative P&L, percent
    pub max_drawdown: f64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Longest run of consecutive winning trades
    pub consecutive_wins: usize,
    /// Longest run of consecutive losing trades
    pub consecutive_losses: usize,
    pub best_day: f64,
    pub worst_day: f64,
}

/// Per-day roll-up of trading activity (UTC days).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub pnl: f64,
    pub volume: f64,
    pub trades: usize,
    /// Running P&L up to and including this day
    pub cumulative_pnl: f64,
}

//! Portfolio and trading metrics.
//!
//! Pure reductions over the account snapshot. Trade-order sensitive metrics
//! (streaks, drawdown) walk the input in the order given; nothing is
//! re-sorted.

use crate::types::{
    AllMids, DailySummary, LiquidationRisk, PerformanceMetrics, PortfolioMetrics, PositionDetail,
    PositionSide, TradeRecord, TradingStats, UserFill, UserState,
};
use std::collections::BTreeMap;

/// Reported when there are winning trades but no losing ones.
pub const MAX_PROFIT_FACTOR: f64 = 999.0;

// ============================================================================
// Portfolio
// ============================================================================

/// Join positions with mid prices and aggregate account-level figures.
pub fn compute_portfolio_metrics(user_state: &UserState, mids: &AllMids) -> PortfolioMetrics {
    let mut total_unrealized_pnl = 0.0;
    let mut total_position_value = 0.0;
    let mut total_margin_used = 0.0;

    let position_details: Vec<PositionDetail> = user_state
        .positions()
        .map(|position| {
            let size = position.size();
            let unrealized_pnl = position.unrealized_pnl();
            let position_value = position.position_value();
            let margin_used = position.margin_used();

            total_unrealized_pnl += unrealized_pnl;
            total_position_value += position_value.abs();
            total_margin_used += margin_used;

            let mark_price = mids.mid(&position.coin);
            let liquidation_price = position.liquidation_price();
            let liquidation_risk = match (mark_price, liquidation_price) {
                (Some(mark), Some(liq)) => LiquidationRisk::classify(mark, liq),
                _ => None,
            };

            PositionDetail {
                coin: position.coin.clone(),
                size,
                side: PositionSide::from_size(size),
                entry_price: position.entry_price(),
                mark_price,
                unrealized_pnl,
                position_value,
                margin_used,
                leverage: position.leverage.value,
                leverage_type: position.leverage.leverage_type.clone(),
                liquidation_price,
                roe: position.return_on_equity() * 100.0,
                liquidation_risk,
            }
        })
        .collect();

    let account_value = user_state.account_value();
    let margin_utilization = if account_value != 0.0 {
        total_margin_used / account_value * 100.0
    } else {
        0.0
    };

    PortfolioMetrics {
        account_value,
        total_margin_used,
        total_unrealized_pnl,
        total_position_value,
        available_balance: account_value - total_margin_used,
        margin_utilization,
        position_details,
    }
}

// ============================================================================
// Trades
// ============================================================================

/// Normalize fills and compute headline statistics.
pub fn compute_trading_stats(fills: &[UserFill]) -> TradingStats {
    let trades: Vec<TradeRecord> = fills.iter().map(TradeRecord::from).collect();

    let mut stats = TradingStats {
        total_trades: trades.len(),
        ..TradingStats::default()
    };
    let mut winners = 0usize;

    for trade in &trades {
        stats.total_pnl += trade.pnl;
        stats.total_volume += trade.volume();
        stats.total_fees += trade.fees;
        if trade.pnl > 0.0 {
            winners += 1;
        }
        stats.best_trade = stats.best_trade.max(trade.pnl);
        stats.worst_trade = stats.worst_trade.min(trade.pnl);
    }

    stats.win_rate = percent(winners, trades.len());
    stats.trades = trades;
    stats
}

/// Detailed analytics over normalized trades.
pub fn compute_performance(trades: &[TradeRecord]) -> PerformanceMetrics {
    if trades.is_empty() {
        return PerformanceMetrics::default();
    }

    let mut metrics = PerformanceMetrics {
        total_trades: trades.len(),
        ..PerformanceMetrics::default()
    };
    let mut gross_profit = 0.0;
    let mut gross_loss = 0.0;

    let mut win_streak = 0;
    let mut loss_streak = 0;

    let mut running = 0.0_f64;
    let mut peak = 0.0_f64;

    for trade in trades {
        metrics.total_pnl += trade.pnl;
        metrics.total_volume += trade.volume();
        metrics.total_fees += trade.fees;

        // Break-even trades leave both streaks untouched
        if trade.pnl > 0.0 {
            metrics.winning_trades += 1;
            gross_profit += trade.pnl;
            win_streak += 1;
            loss_streak = 0;
            metrics.consecutive_wins = metrics.consecutive_wins.max(win_streak);
        } else if trade.pnl < 0.0 {
            metrics.losing_trades += 1;
            gross_loss += trade.pnl.abs();
            loss_streak += 1;
            win_streak = 0;
            metrics.consecutive_losses = metrics.consecutive_losses.max(loss_streak);
        }

        running += trade.pnl;
        peak = peak.max(running);
        let base = if peak != 0.0 { peak } else { 1.0 };
        let drawdown = (peak - running) / base * 100.0;
        metrics.max_drawdown = metrics.max_drawdown.max(drawdown);
    }

    metrics.net_profit = metrics.total_pnl - metrics.total_fees;
    metrics.win_rate = percent(metrics.winning_trades, metrics.total_trades);
    if metrics.winning_trades > 0 {
        metrics.avg_win = gross_profit / metrics.winning_trades as f64;
    }
    if metrics.losing_trades > 0 {
        metrics.avg_loss = gross_loss / metrics.losing_trades as f64;
    }
    metrics.profit_factor = if gross_loss > 0.0 {
        gross_profit / gross_loss
    } else if gross_profit > 0.0 {
        MAX_PROFIT_FACTOR
    } else {
        0.0
    };

    let days = daily_pnl(trades);
    metrics.best_day = days.values().copied().fold(f64::NEG_INFINITY, f64::max);
    metrics.worst_day = days.values().copied().fold(f64::INFINITY, f64::min);

    metrics
}

/// Per-day totals in date order with running cumulative P&L.
pub fn daily_summaries(trades: &[TradeRecord]) -> Vec<DailySummary> {
    let mut days: BTreeMap<_, DailySummary> = BTreeMap::new();

    for trade in trades {
        let date = trade.timestamp.date_naive();
        let day = days.entry(date).or_insert_with(|| DailySummary {
            date,
            pnl: 0.0,
            volume: 0.0,
            trades: 0,
            cumulative_pnl: 0.0,
        });
        day.pnl += trade.pnl;
        day.volume += trade.volume();
        day.trades += 1;
    }

    let mut cumulative = 0.0;
    days.into_values()
        .map(|mut day| {
            cumulative += day.pnl;
            day.cumulative_pnl = cumulative;
            day
        })
        .collect()
}

fn daily_pnl(trades: &[TradeRecord]) -> BTreeMap<chrono::NaiveDate, f64> {
    let mut days = BTreeMap::new();
    for trade in trades {
        *days.entry(trade.timestamp.date_naive()).or_insert(0.0) += trade.pnl;
    }
    days
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

use hyperdash::config::Config;
use hyperdash::error::Result;
use hyperdash::services::{
    compute_performance, daily_summaries, format_compact_number, format_currency, format_number,
    format_percentage, summarize, ticker, AccountSnapshot, DashboardSession, LoadTicket,
};
use hyperdash::sources::{validate_address, InfoClient};
use hyperdash::types::{
    AllMids, ConnectionState, OrderBookSnapshot, TickerEntry, ALL_MIDS_CHANNEL, USER_CHANNEL,
};
use hyperdash::websocket::{ChannelManager, TungsteniteTransport};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Result of a request spawned off the main loop.
enum Refresh {
    Snapshot(LoadTicket, Result<AccountSnapshot>),
    OrderBook(Result<OrderBookSnapshot>),
    Mids(Result<AllMids>),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hyperdash=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!("Using info API {} and feed {}", config.api_url, config.ws_url);

    let Some(address) = config.wallet_address.clone() else {
        warn!("WALLET_ADDRESS is not set, nothing to track");
        return Ok(());
    };
    validate_address(&address)?;

    let client = InfoClient::from_config(&config);
    let (refresh_tx, mut refresh_rx) = mpsc::unbounded_channel();

    let mut session = DashboardSession::new();
    let mut loading = spawn_snapshot_load(&client, &mut session, &address, &refresh_tx);

    let mut manager = ChannelManager::new(
        TungsteniteTransport,
        config.ws_url.clone(),
        config.reconnect_delay(),
    );
    manager.subscribe([USER_CHANNEL, ALL_MIDS_CHANNEL]);
    manager.set_address(Some(address.clone()));

    let mut messages = manager.messages();
    let mut states = manager.state_changes();
    let mut book_refresh =
        tokio::time::interval(Duration::from_secs(config.order_book.refresh_secs));
    let mut ticker_refresh = tokio::time::interval(Duration::from_secs(config.ticker_refresh_secs));
    let mut ticker_entries: Vec<TickerEntry> = Vec::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
            changed = messages.changed() => {
                if changed.is_err() {
                    break;
                }
                let message = messages.borrow_and_update().clone();
                let Some(message) = message else { continue };
                if session.apply(&message) {
                    if message.is_channel(USER_CHANNEL) {
                        if let Some(snapshot) = session.snapshot() {
                            log_portfolio(snapshot);
                        }
                    } else {
                        debug!("Applied {} update", message.channel);
                    }
                }
            }
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *states.borrow_and_update();
                info!("Realtime feed {}", state);

                // Retry a failed initial load once the venue is reachable again
                if state == ConnectionState::Connected && session.snapshot().is_none() && !loading {
                    loading = spawn_snapshot_load(&client, &mut session, &address, &refresh_tx);
                }
            }
            _ = book_refresh.tick() => {
                let client = client.clone();
                let coin = config.order_book.coin.clone();
                let tx = refresh_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(Refresh::OrderBook(client.fetch_order_book(&coin).await));
                });
            }
            _ = ticker_refresh.tick() => {
                let client = client.clone();
                let tx = refresh_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(Refresh::Mids(client.fetch_all_mids().await));
                });
            }
            Some(refresh) = refresh_rx.recv() => match refresh {
                Refresh::Snapshot(ticket, result) => {
                    loading = false;
                    if session.complete(ticket, result) {
                        if let Some(snapshot) = session.snapshot() {
                            log_portfolio(snapshot);
                            log_trading(snapshot);
                        }
                    }
                }
                Refresh::OrderBook(Ok(book)) => log_order_book(&book, config.order_book.depth),
                Refresh::OrderBook(Err(e)) => warn!("Order book refresh failed: {}", e),
                Refresh::Mids(Ok(mids)) => {
                    ticker_entries = ticker(&mids, &ticker_entries);
                    log_ticker(&ticker_entries);
                }
                Refresh::Mids(Err(e)) => warn!("Ticker refresh failed: {}", e),
            },
        }
    }

    manager.shutdown();
    Ok(())
}

/// Start loading the snapshot for `address` in the background. Returns
/// whether a load was started.
fn spawn_snapshot_load(
    client: &InfoClient,
    session: &mut DashboardSession,
    address: &str,
    tx: &mpsc::UnboundedSender<Refresh>,
) -> bool {
    let Some(ticket) = session.select(Some(address.to_string())) else {
        return false;
    };

    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = AccountSnapshot::load(&client, ticket.address()).await;
        let _ = tx.send(Refresh::Snapshot(ticket, result));
    });
    true
}

fn log_order_book(book: &OrderBookSnapshot, depth: usize) {
    let summary = summarize(book, depth);
    info!(
        "{} book: bid {} ask {} spread {} ({}) imbalance {}",
        summary.coin,
        format_number(summary.best_bid, 2),
        format_number(summary.best_ask, 2),
        format_number(summary.spread, 4),
        format_percentage(summary.spread_pct),
        format_number(summary.imbalance, 3),
    );
}

fn log_ticker(entries: &[TickerEntry]) {
    let line = entries
        .iter()
        .map(|e| {
            format!(
                "{} {} ({:?} {})",
                e.coin,
                format_currency(e.price),
                e.direction,
                format_percentage(e.change_pct()),
            )
        })
        .collect::<Vec<_>>()
        .join(" | ");
    info!("Ticker: {}", line);
}

fn log_portfolio(snapshot: &AccountSnapshot) {
    let portfolio = &snapshot.portfolio;
    info!(
        "Account {}: value {} available {} margin {} unrealized {}",
        snapshot.address,
        format_currency(portfolio.account_value),
        format_currency(portfolio.available_balance),
        format_percentage(portfolio.margin_utilization),
        format_currency(portfolio.total_unrealized_pnl),
    );

    for position in &portfolio.position_details {
        info!(
            "  {} {:?} {} @ {} mark {} pnl {} roe {} {}x {} risk {:?}",
            position.coin,
            position.side,
            format_number(position.size.abs(), 4),
            position
                .entry_price
                .map(format_currency)
                .unwrap_or_else(|| "-".to_string()),
            position
                .mark_price
                .map(format_currency)
                .unwrap_or_else(|| "-".to_string()),
            format_currency(position.unrealized_pnl),
            format_percentage(position.roe),
            position.leverage,
            position.leverage_type,
            position.liquidation_risk,
        );
    }
}

fn log_trading(snapshot: &AccountSnapshot) {
    let stats = &snapshot.stats;
    info!(
        "Trades: {} total, pnl {} volume {} fees {} win rate {}",
        stats.total_trades,
        format_currency(stats.total_pnl),
        format_compact_number(stats.total_volume),
        format_currency(stats.total_fees),
        format_percentage(stats.win_rate),
    );

    let performance = compute_performance(&stats.trades);
    info!(
        "Performance: net {} profit factor {} max drawdown {} streaks +{}/-{}",
        format_currency(performance.net_profit),
        format_number(performance.profit_factor, 2),
        format_percentage(performance.max_drawdown),
        performance.consecutive_wins,
        performance.consecutive_losses,
    );

    if let Some(day) = daily_summaries(&stats.trades).last() {
        info!(
            "Latest day {}: pnl {} over {} trades, cumulative {}",
            day.date,
            format_currency(day.pnl),
            day.trades,
            format_currency(day.cumulative_pnl),
        );
    }
}

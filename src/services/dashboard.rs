//! Account snapshot and the session that keeps it current.
//!
//! A snapshot is loaded once over HTTP and then patched by realtime
//! messages. The session tags each load with an epoch so a response that
//! arrives after the address changed is dropped instead of overwriting the
//! newer account.

use crate::error::Result;
use crate::services::metrics::{compute_portfolio_metrics, compute_trading_stats};
use crate::sources::InfoClient;
use crate::types::{
    AllMids, InboundMessage, PortfolioMetrics, TradingStats, UserFill, UserState,
    ALL_MIDS_CHANNEL, USER_CHANNEL,
};
use tracing::{debug, error, info, warn};

/// Everything the dashboard shows for one wallet.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub address: String,
    pub user_state: UserState,
    pub mids: AllMids,
    pub fills: Vec<UserFill>,
    pub portfolio: PortfolioMetrics,
    pub stats: TradingStats,
}

impl AccountSnapshot {
    pub fn new(
        address: impl Into<String>,
        user_state: UserState,
        mids: AllMids,
        fills: Vec<UserFill>,
    ) -> Self {
        let portfolio = compute_portfolio_metrics(&user_state, &mids);
        let stats = compute_trading_stats(&fills);
        Self {
            address: address.into(),
            user_state,
            mids,
            fills,
            portfolio,
            stats,
        }
    }

    /// Fetch user state, mids and fills concurrently. Fails if any request
    /// fails.
    pub async fn load(client: &InfoClient, address: &str) -> Result<Self> {
        let (user_state, mids, fills) = tokio::try_join!(
            client.fetch_user_state(address),
            client.fetch_all_mids(),
            client.fetch_user_fills(address),
        )?;

        info!(
            "Loaded snapshot for {}: {} positions, {} fills",
            address,
            user_state.asset_positions.len(),
            fills.len()
        );
        Ok(Self::new(address, user_state, mids, fills))
    }

    /// Apply a realtime message. `user` replaces the account state and
    /// `allMids` replaces the mid prices; portfolio metrics are recomputed
    /// either way. Returns whether anything changed.
    pub fn apply(&mut self, message: &InboundMessage) -> bool {
        if message.is_channel(USER_CHANNEL) {
            match serde_json::from_value::<UserState>(message.data.clone()) {
                Ok(state) => {
                    self.user_state = state;
                }
                Err(e) => {
                    warn!("Ignoring malformed user update: {}", e);
                    return false;
                }
            }
        } else if message.is_channel(ALL_MIDS_CHANNEL) {
            // Frames either wrap the map in `mids` or carry it directly
            let payload = message.data.get("mids").unwrap_or(&message.data);
            match serde_json::from_value::<AllMids>(payload.clone()) {
                Ok(mids) => {
                    self.mids = mids;
                }
                Err(e) => {
                    warn!("Ignoring malformed mids update: {}", e);
                    return false;
                }
            }
        } else {
            debug!("No handler for channel {}", message.channel);
            return false;
        }

        self.portfolio = compute_portfolio_metrics(&self.user_state, &self.mids);
        true
    }
}

/// Identifies one snapshot load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    epoch: u64,
    address: String,
}

impl LoadTicket {
    pub fn address(&self) -> &str {
        &self.address
    }
}

/// Current address and its snapshot.
#[derive(Debug, Default)]
pub struct DashboardSession {
    epoch: u64,
    address: Option<String>,
    snapshot: Option<AccountSnapshot>,
    last_error: Option<String>,
}

impl DashboardSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to a new address. Drops the current snapshot and returns the
    /// ticket to load the new one with, or `None` when no address is set.
    pub fn select(&mut self, address: Option<String>) -> Option<LoadTicket> {
        self.epoch += 1;
        self.snapshot = None;
        self.last_error = None;
        self.address = address.clone();

        address.map(|address| LoadTicket {
            epoch: self.epoch,
            address,
        })
    }

    /// Store the outcome of a load. Results for a superseded ticket are
    /// discarded. Returns whether a snapshot was stored.
    pub fn complete(&mut self, ticket: LoadTicket, result: Result<AccountSnapshot>) -> bool {
        if ticket.epoch != self.epoch {
            debug!("Discarding stale snapshot for {}", ticket.address);
            return false;
        }

        match result {
            Ok(snapshot) => {
                self.snapshot = Some(snapshot);
                self.last_error = None;
                true
            }
            Err(e) => {
                error!("Failed to load snapshot for {}: {}", ticket.address, e);
                self.last_error = Some(e.to_string());
                false
            }
        }
    }

    /// Forward a realtime message to the snapshot, if one is loaded.
    pub fn apply(&mut self, message: &InboundMessage) -> bool {
        match self.snapshot.as_mut() {
            Some(snapshot) => snapshot.apply(message),
            None => false,
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn snapshot(&self) -> Option<&AccountSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::{json, Value};

    const ADDRESS: &str = "0x742e4c4b9f6abd59f4c37b7f5c9c8b9aef123456";

    fn user_state_json(account_value: &str, margin_used: &str) -> Value {
        json!({
            "assetPositions": [{
                "position": {
                    "coin": "BTC",
                    "szi": "0.1",
                    "entryPx": "40000",
                    "leverage": {"type": "cross", "value": 10},
                    "liquidationPx": "36000",
                    "marginUsed": margin_used,
                    "positionValue": "4300",
                    "returnOnEquity": "0.75",
                    "unrealizedPnl": "300"
                },
                "type": "oneWay"
            }],
            "crossMaintenanceMarginUsed": "10",
            "marginSummary": {
                "accountValue": account_value,
                "totalMarginUsed": margin_used,
                "totalNtlPos": "4300",
                "totalRawUsd": "1000"
            },
            "time": 1700000000000_i64
        })
    }

    fn snapshot() -> AccountSnapshot {
        let state: UserState = serde_json::from_value(user_state_json("1000", "430")).unwrap();
        let mids: AllMids = [("BTC", "43000")].into_iter().collect();
        AccountSnapshot::new(ADDRESS, state, mids, Vec::new())
    }

    fn message(channel: &str, data: Value) -> InboundMessage {
        InboundMessage {
            channel: channel.to_string(),
            data,
        }
    }

    #[test]
    fn test_new_computes_metrics() {
        let snap = snapshot();
        assert_eq!(snap.portfolio.margin_utilization, 43.0);
        assert_eq!(snap.portfolio.position_details[0].mark_price, Some(43000.0));
        assert_eq!(snap.stats.total_trades, 0);
    }

    #[test]
    fn test_apply_user_replaces_state() {
        let mut snap = snapshot();
        let changed = snap.apply(&message(USER_CHANNEL, user_state_json("2000", "500")));

        assert!(changed);
        assert_eq!(snap.portfolio.account_value, 2000.0);
        assert_eq!(snap.portfolio.margin_utilization, 25.0);
    }

    #[test]
    fn test_apply_mids_wrapped_and_bare() {
        let mut snap = snapshot();

        assert!(snap.apply(&message(ALL_MIDS_CHANNEL, json!({"mids": {"BTC": "44000"}}))));
        assert_eq!(snap.portfolio.position_details[0].mark_price, Some(44000.0));

        assert!(snap.apply(&message(ALL_MIDS_CHANNEL, json!({"BTC": "45000"}))));
        assert_eq!(snap.portfolio.position_details[0].mark_price, Some(45000.0));
    }

    #[test]
    fn test_apply_ignores_malformed_and_unknown() {
        let mut snap = snapshot();
        let before = snap.clone();

        assert!(!snap.apply(&message(USER_CHANNEL, json!({"nope": 1}))));
        assert!(!snap.apply(&message(ALL_MIDS_CHANNEL, json!([1, 2]))));
        assert!(!snap.apply(&message("trades", json!({}))));
        assert_eq!(snap, before);
    }

    #[test]
    fn test_session_discards_stale_load() {
        let mut session = DashboardSession::new();
        let first = session.select(Some(ADDRESS.to_string())).unwrap();
        let second = session
            .select(Some("0x0000000000000000000000000000000000000001".to_string()))
            .unwrap();

        assert!(!session.complete(first, Ok(snapshot())));
        assert!(session.snapshot().is_none());

        let mut fresh = snapshot();
        fresh.address = second.address().to_string();
        assert!(session.complete(second, Ok(fresh)));
        assert_eq!(
            session.snapshot().unwrap().address,
            "0x0000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_session_records_load_error() {
        let mut session = DashboardSession::new();
        let ticket = session.select(Some(ADDRESS.to_string())).unwrap();

        assert!(!session.complete(
            ticket,
            Err(AppError::HttpStatus {
                endpoint: "clearinghouseState".to_string(),
                status: 500,
            })
        ));
        assert!(session.last_error().unwrap().contains("500"));
        assert!(!session.apply(&message(USER_CHANNEL, user_state_json("1", "0"))));
    }

    #[test]
    fn test_session_clear_address() {
        let mut session = DashboardSession::new();
        let ticket = session.select(Some(ADDRESS.to_string())).unwrap();
        assert!(session.complete(ticket, Ok(snapshot())));

        assert!(session.select(None).is_none());
        assert!(session.snapshot().is_none());
        assert!(session.address().is_none());
    }
}

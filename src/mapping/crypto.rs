//! Custodial wallet schema. One balance per held asset; locked funds are
//! part of the ledger but not available.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{display_name, lookup_status, raw_status, take_timestamp, Amount, StatusTable};
use crate::domain::{AccountStatus, AccountSummary, AccountType, Balance, Owner};

pub const STATUS_TABLE: StatusTable = &[
    ("active", AccountStatus::Active),
    ("enabled", AccountStatus::Active),
    ("frozen", AccountStatus::Suspended),
    ("restricted", AccountStatus::Suspended),
    ("archived", AccountStatus::Closed),
    ("closed", AccountStatus::Closed),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoPayload {
    pub wallet_id: String,
    pub label: Option<String>,
    pub owner_handle: Option<String>,
    pub owner_id: Option<String>,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    pub status: Option<String>,
    pub updated_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Holding {
    pub asset: String,
    pub free: Amount,
    #[serde(default)]
    pub locked: Amount,
}

pub fn map(payload: CryptoPayload, source: &str) -> AccountSummary {
    let mut metadata = payload.extra;
    raw_status(&mut metadata, payload.status.as_deref());
    let last_updated = take_timestamp(payload.updated_at, &mut metadata);

    AccountSummary {
        display_name: display_name(payload.label, AccountType::Crypto, &payload.wallet_id),
        account_id: payload.wallet_id,
        account_type: AccountType::Crypto,
        owner: Owner {
            name: payload.owner_handle,
            customer_id: payload.owner_id,
        },
        balances: payload
            .holdings
            .into_iter()
            .map(|h| {
                Balance::new(
                    h.asset.to_ascii_uppercase(),
                    h.free.0,
                    Some(h.free.0 + h.locked.0),
                )
            })
            .collect(),
        status: lookup_status(STATUS_TABLE, payload.status.as_deref()),
        backend_source: source.to_string(),
        last_updated,
        stale: false,
        metadata,
        trace_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::map_payload;
    use serde_json::json;

    #[test]
    fn one_balance_per_asset() {
        let summary = map_payload(
            AccountType::Crypto,
            json!({
                "walletId": "CRY-55",
                "label": "Cold storage",
                "ownerHandle": "satoshi",
                "holdings": [
                    {"asset": "btc", "free": 0.5, "locked": 0.25},
                    {"asset": "ETH", "free": "3"}
                ],
                "status": "archived",
                "updatedAt": 1709294400000_i64
            }),
            "crypto-adapter/v1",
        )
        .unwrap();

        assert_eq!(summary.balances.len(), 2);
        assert_eq!(summary.balances[0].currency, "BTC");
        assert_eq!(summary.balances[0].available, 0.5);
        assert_eq!(summary.balances[0].ledger, Some(0.75));
        assert_eq!(summary.balances[1].ledger, Some(3.0));
        assert_eq!(summary.status, AccountStatus::Closed);
        assert_eq!(summary.owner.name.as_deref(), Some("satoshi"));
    }
}

//! Retail bank core schema.
//!
//! ```json
//! {"account_id": "BNK-1001", "account_name": "Everyday Checking",
//!  "account_status": "open", "customer": {"name": "Ada", "id": "C-1"},
//!  "balances": [{"currency": "USD", "available": 1200.5, "ledger": 1250.0}],
//!  "updated_at": "2024-03-01T12:00:00Z"}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{display_name, lookup_status, raw_status, take_timestamp, Amount, StatusTable};
use crate::domain::{AccountStatus, AccountSummary, AccountType, Balance, Owner};

pub const STATUS_TABLE: StatusTable = &[
    ("open", AccountStatus::Active),
    ("active", AccountStatus::Active),
    ("frozen", AccountStatus::Suspended),
    ("blocked", AccountStatus::Suspended),
    ("dormant", AccountStatus::Suspended),
    ("suspended", AccountStatus::Suspended),
    ("closed", AccountStatus::Closed),
];

#[derive(Debug, Deserialize)]
pub struct BankPayload {
    pub account_id: String,
    pub account_name: Option<String>,
    pub account_status: Option<String>,
    pub customer: Option<BankCustomer>,
    #[serde(default)]
    pub balances: Vec<BankBalance>,
    pub updated_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct BankCustomer {
    pub name: Option<String>,
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BankBalance {
    pub currency: String,
    pub available: Amount,
    pub ledger: Option<Amount>,
}

pub fn map(payload: BankPayload, source: &str) -> AccountSummary {
    let mut metadata = payload.extra;
    raw_status(&mut metadata, payload.account_status.as_deref());
    let last_updated = take_timestamp(payload.updated_at, &mut metadata);
    let owner = payload
        .customer
        .map(|c| Owner {
            name: c.name,
            customer_id: c.id,
        })
        .unwrap_or_default();

    AccountSummary {
        display_name: display_name(payload.account_name, AccountType::Bank, &payload.account_id),
        account_id: payload.account_id,
        account_type: AccountType::Bank,
        owner,
        balances: payload
            .balances
            .into_iter()
            .map(|b| Balance::new(b.currency, b.available.0, b.ledger.map(|l| l.0)))
            .collect(),
        status: lookup_status(STATUS_TABLE, payload.account_status.as_deref()),
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
    fn maps_full_payload() {
        let summary = map_payload(
            AccountType::Bank,
            json!({
                "account_id": "BNK-1001",
                "account_name": "Everyday Checking",
                "account_status": "frozen",
                "customer": {"name": "Ada Lovelace", "id": "C-77"},
                "balances": [{"currency": "USD", "available": 1200.5, "ledger": 1250.0}],
                "updated_at": "2024-03-01T12:00:00Z",
                "branch_code": "0042"
            }),
            "bank-adapter/v1",
        )
        .unwrap();

        assert_eq!(summary.account_id, "BNK-1001");
        assert_eq!(summary.display_name, "Everyday Checking");
        assert_eq!(summary.status, AccountStatus::Suspended);
        assert_eq!(summary.owner.customer_id.as_deref(), Some("C-77"));
        assert_eq!(summary.balances[0].available, 1200.5);
        assert_eq!(summary.balances[0].ledger, Some(1250.0));
        assert_eq!(summary.metadata["branch_code"], "0042");
        assert_eq!(summary.metadata["rawStatus"], "frozen");
        assert!(summary.last_updated.is_some());
        assert!(!summary.stale);
    }

    #[test]
    fn overdrawn_accounts_report_zero_available() {
        let summary = map_payload(
            AccountType::Bank,
            json!({
                "account_id": "BNK-2",
                "account_status": "open",
                "balances": [{"currency": "EUR", "available": -40, "ledger": -40}]
            }),
            "bank-adapter/v1",
        )
        .unwrap();
        assert_eq!(summary.balances[0].available, 0.0);
        assert_eq!(summary.balances[0].ledger, Some(-40.0));
    }

    #[test]
    fn mapping_is_deterministic() {
        let payload = json!({"account_id": "BNK-3", "account_status": "mystery", "updated_at": "bad"});
        let a = map_payload(AccountType::Bank, payload.clone(), "bank-adapter/v1").unwrap();
        let b = map_payload(AccountType::Bank, payload, "bank-adapter/v1").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.status, AccountStatus::Unknown);
        assert_eq!(a.metadata["rawLastUpdated"], "bad");
    }
}

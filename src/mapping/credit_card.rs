//! Card issuer schema (camelCase, upper-case states).
//!
//! ```json
//! {"cardId": "CC-4411", "nickname": "Travel Rewards", "state": "ACTIVE",
//!  "holder": {"fullName": "Ada", "customerNumber": "C-1"},
//!  "currency": "USD", "creditLimit": 5000, "currentBalance": 1200,
//!  "lastStatementAt": 1709294400}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{display_name, lookup_status, raw_status, take_timestamp, Amount, StatusTable};
use crate::domain::{AccountStatus, AccountSummary, AccountType, Balance, Owner};

pub const STATUS_TABLE: StatusTable = &[
    ("active", AccountStatus::Active),
    ("open", AccountStatus::Active),
    ("locked", AccountStatus::Suspended),
    ("suspended", AccountStatus::Suspended),
    ("past_due", AccountStatus::Suspended),
    ("cancelled", AccountStatus::Closed),
    ("canceled", AccountStatus::Closed),
    ("closed", AccountStatus::Closed),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardPayload {
    pub card_id: String,
    pub nickname: Option<String>,
    pub state: Option<String>,
    pub holder: Option<CardHolder>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub credit_limit: Amount,
    #[serde(default)]
    pub current_balance: Amount,
    pub last_statement_at: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardHolder {
    pub full_name: Option<String>,
    pub customer_number: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

pub fn map(payload: CreditCardPayload, source: &str) -> AccountSummary {
    let mut metadata = payload.extra;
    raw_status(&mut metadata, payload.state.as_deref());
    metadata.insert("creditLimit".to_string(), payload.credit_limit.0.into());
    let last_updated = take_timestamp(payload.last_statement_at, &mut metadata);

    let owed = payload.current_balance.0;
    let headroom = payload.credit_limit.0 - owed;

    AccountSummary {
        display_name: display_name(payload.nickname, AccountType::CreditCard, &payload.card_id),
        account_id: payload.card_id,
        account_type: AccountType::CreditCard,
        owner: payload
            .holder
            .map(|h| Owner {
                name: h.full_name,
                customer_id: h.customer_number,
            })
            .unwrap_or_default(),
        balances: vec![Balance::new(payload.currency, headroom, Some(-owed))],
        status: lookup_status(STATUS_TABLE, payload.state.as_deref()),
        backend_source: source.to_string(),
        last_updated,
        stale: false,
        metadata,
        trace_id: None,
    }
}

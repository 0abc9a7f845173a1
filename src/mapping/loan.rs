//! Lending platform schema. Loans are debt: `available` is always zero and
//! `ledger` carries the outstanding principal as a negative number.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{display_name, lookup_status, raw_status, take_timestamp, Amount, StatusTable};
use crate::domain::{AccountStatus, AccountSummary, AccountType, Balance, Owner};

pub const STATUS_TABLE: StatusTable = &[
    ("current", AccountStatus::Active),
    ("active", AccountStatus::Active),
    ("delinquent", AccountStatus::Suspended),
    ("suspended", AccountStatus::Suspended),
    ("paid_off", AccountStatus::Closed),
    ("closed", AccountStatus::Closed),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanPayload {
    pub loan_id: String,
    pub borrower_name: Option<String>,
    pub borrower_id: Option<String>,
    pub product_name: Option<String>,
    pub outstanding_balance: Amount,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub status: Option<String>,
    pub as_of: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

pub fn map(payload: LoanPayload, source: &str) -> AccountSummary {
    let mut metadata = payload.extra;
    raw_status(&mut metadata, payload.status.as_deref());
    let last_updated = take_timestamp(payload.as_of, &mut metadata);
    let outstanding = payload.outstanding_balance.0.abs();
    let ledger = if outstanding == 0.0 { 0.0 } else { -outstanding };

    AccountSummary {
        display_name: display_name(payload.product_name, AccountType::Loan, &payload.loan_id),
        account_id: payload.loan_id,
        account_type: AccountType::Loan,
        owner: Owner {
            name: payload.borrower_name,
            customer_id: payload.borrower_id,
        },
        balances: vec![Balance::new(payload.currency, 0.0, Some(ledger))],
        status: lookup_status(STATUS_TABLE, payload.status.as_deref()),
        backend_source: source.to_string(),
        last_updated,
        stale: false,
        metadata,
        trace_id: None,
    }
}

//! Mainframe export schema: upper-case column names, string amounts and
//! single-letter status codes.
//!
//! ```json
//! {"ACCT_NO": "LEG-0007", "ACCT_DESC": "PASSBOOK SAVINGS", "CUST_NM": "HOPPER G",
//!  "CUST_NO": "000123", "BAL_AMT": "1520.10", "CCY": "USD", "STAT_CD": "A",
//!  "LAST_UPD": "1709294400"}
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{display_name, lookup_status, raw_status, take_timestamp, StatusTable};
use crate::domain::{AccountStatus, AccountSummary, AccountType, Balance, MappingError, Owner};

pub const STATUS_TABLE: StatusTable = &[
    ("a", AccountStatus::Active),
    ("s", AccountStatus::Suspended),
    ("h", AccountStatus::Suspended),
    ("c", AccountStatus::Closed),
    ("x", AccountStatus::Closed),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct LegacyPayload {
    pub acct_no: String,
    pub acct_desc: Option<String>,
    pub cust_nm: Option<String>,
    pub cust_no: Option<String>,
    pub bal_amt: String,
    #[serde(default = "default_currency")]
    pub ccy: String,
    pub stat_cd: Option<String>,
    pub last_upd: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Parses the fixed-point `BAL_AMT` column. A trailing `-` marks a debit.
fn parse_amount(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    match trimmed.strip_suffix('-') {
        Some(debit) => debit.trim().parse::<f64>().ok().map(|v| -v),
        None => trimmed.parse::<f64>().ok(),
    }
}

pub fn map(payload: LegacyPayload, source: &str) -> Result<AccountSummary, MappingError> {
    let balance = parse_amount(&payload.bal_amt).ok_or_else(|| {
        MappingError::new(source, format!("BAL_AMT {:?} is not numeric", payload.bal_amt))
    })?;

    let mut metadata = payload.extra;
    raw_status(&mut metadata, payload.stat_cd.as_deref());
    let last_updated = take_timestamp(payload.last_upd, &mut metadata);
    let name = payload.acct_desc.map(|d| d.trim().to_string());
    let ccy = payload.ccy.trim().to_ascii_uppercase();

    Ok(AccountSummary {
        display_name: display_name(name, AccountType::Legacy, payload.acct_no.trim()),
        account_id: payload.acct_no.trim().to_string(),
        account_type: AccountType::Legacy,
        owner: Owner {
            name: payload.cust_nm.map(|n| n.trim().to_string()),
            customer_id: payload.cust_no,
        },
        balances: vec![Balance::new(ccy, balance, Some(balance))],
        status: lookup_status(STATUS_TABLE, payload.stat_cd.as_deref()),
        backend_source: source.to_string(),
        last_updated,
        stale: false,
        metadata,
        trace_id: None,
    })
}

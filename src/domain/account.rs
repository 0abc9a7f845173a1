//! Canonical account model.
//!
//! Every backend schema is normalized into [`AccountSummary`]. Field names
//! serialize in camelCase because this is the public wire shape of the
//! gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The family of backend that owns an account.
///
/// Also used as the dispatch key for mappers and as part of cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Bank,
    #[serde(alias = "credit_card")]
    CreditCard,
    Loan,
    Investment,
    Legacy,
    Crypto,
}

impl AccountType {
    pub const ALL: [AccountType; 6] = [
        AccountType::Bank,
        AccountType::CreditCard,
        AccountType::Loan,
        AccountType::Investment,
        AccountType::Legacy,
        AccountType::Crypto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Bank => "bank",
            AccountType::CreditCard => "creditcard",
            AccountType::Loan => "loan",
            AccountType::Investment => "investment",
            AccountType::Legacy => "legacy",
            AccountType::Crypto => "crypto",
        }
    }

    /// Human label used when a backend supplies no display name.
    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Bank => "Bank account",
            AccountType::CreditCard => "Credit card",
            AccountType::Loan => "Loan",
            AccountType::Investment => "Investment portfolio",
            AccountType::Legacy => "Legacy account",
            AccountType::Crypto => "Crypto wallet",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status after normalization. Unrecognized backend values land on `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Suspended,
    Closed,
    Unknown,
}

/// Account holder as reported by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
}

/// A single currency position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub currency: String,
    /// Spend or draw capacity. Never negative.
    pub available: f64,
    /// Book balance. Negative for debt instruments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<f64>,
}

impl Balance {
    /// Builds a balance, clamping `available` at zero.
    pub fn new(currency: impl Into<String>, available: f64, ledger: Option<f64>) -> Self {
        let available = if available.is_finite() { available.max(0.0) } else { 0.0 };
        Self {
            currency: currency.into(),
            available,
            ledger,
        }
    }
}

/// The canonical account representation returned by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: String,
    pub account_type: AccountType,
    pub owner: Owner,
    pub display_name: String,
    pub balances: Vec<Balance>,
    pub status: AccountStatus,
    /// Adapter and schema version that produced the record, e.g. `bank-adapter/v1`.
    pub backend_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Set when the record was served from an expired cache entry.
    #[serde(default)]
    pub stale: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

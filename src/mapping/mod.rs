//! Canonical mapping subsystem.
//!
//! # Data Flow
//! ```text
//! raw JSON body (serde_json::Value)
//!     → map_payload(account_type, ..) selects the schema
//!     → typed payload struct (serde)     ── shape mismatch → MappingError
//!     → <backend>::map(payload, source)  ── pure, total
//!     → AccountSummary
//! ```
//!
//! # Design Decisions
//! - One module per backend schema, dispatched on `AccountType`
//! - Status strings go through a fixed lookup table; anything else is `Unknown`
//! - Unrecognized payload fields are kept in `metadata`
//! - No clocks or randomness: the same payload always maps to the same summary

pub mod bank;
pub mod credit_card;
pub mod crypto;
pub mod investment;
pub mod legacy;
pub mod loan;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::{AccountStatus, AccountSummary, AccountType, MappingError};

/// Status lookup table: lowercase backend value → canonical status.
pub type StatusTable = &'static [(&'static str, AccountStatus)];

/// Convert a raw backend body into the canonical model.
pub fn map_payload(
    account_type: AccountType,
    payload: Value,
    source: &str,
) -> Result<AccountSummary, MappingError> {
    match account_type {
        AccountType::Bank => decode(source, payload).map(|p| bank::map(p, source)),
        AccountType::CreditCard => decode(source, payload).map(|p| credit_card::map(p, source)),
        AccountType::Loan => decode(source, payload).map(|p| loan::map(p, source)),
        AccountType::Investment => decode(source, payload).map(|p| investment::map(p, source)),
        AccountType::Legacy => decode(source, payload).and_then(|p| legacy::map(p, source)),
        AccountType::Crypto => decode(source, payload).map(|p| crypto::map(p, source)),
    }
}

/// Map a backend status through its table. Never fails.
pub fn map_status(account_type: AccountType, raw: &str) -> AccountStatus {
    let table = match account_type {
        AccountType::Bank => bank::STATUS_TABLE,
        AccountType::CreditCard => credit_card::STATUS_TABLE,
        AccountType::Loan => loan::STATUS_TABLE,
        AccountType::Investment => investment::STATUS_TABLE,
        AccountType::Legacy => legacy::STATUS_TABLE,
        AccountType::Crypto => crypto::STATUS_TABLE,
    };
    lookup_status(table, Some(raw))
}

fn decode<T: for<'de> Deserialize<'de>>(source: &str, payload: Value) -> Result<T, MappingError> {
    serde_json::from_value(payload).map_err(|e| MappingError::new(source, e.to_string()))
}

pub(crate) fn lookup_status(table: StatusTable, raw: Option<&str>) -> AccountStatus {
    let Some(raw) = raw else {
        return AccountStatus::Unknown;
    };
    let needle = raw.trim().to_ascii_lowercase();
    table
        .iter()
        .find(|(key, _)| *key == needle)
        .map(|(_, status)| *status)
        .unwrap_or(AccountStatus::Unknown)
}

/// Accepts RFC 3339 strings, or epoch numbers in seconds or milliseconds.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| s.parse::<i64>().ok().and_then(from_epoch)),
        Value::Number(n) => n.as_i64().and_then(from_epoch),
        _ => None,
    }
}

fn from_epoch(raw: i64) -> Option<DateTime<Utc>> {
    // Anything past 1e11 cannot be seconds this side of year 5000.
    if raw.abs() >= 100_000_000_000 {
        Utc.timestamp_millis_opt(raw).single()
    } else {
        Utc.timestamp_opt(raw, 0).single()
    }
}

/// Parse an optional timestamp, preserving unparseable input under `rawLastUpdated`.
pub(crate) fn take_timestamp(
    value: Option<Value>,
    metadata: &mut Map<String, Value>,
) -> Option<DateTime<Utc>> {
    let value = value?;
    let parsed = parse_timestamp(&value);
    if parsed.is_none() && !value.is_null() {
        metadata.insert("rawLastUpdated".to_string(), value);
    }
    parsed
}

pub(crate) fn display_name(name: Option<String>, account_type: AccountType, id: &str) -> String {
    match name.map(|n| n.trim().to_string()) {
        Some(n) if !n.is_empty() => n,
        _ => {
            let tail: String = id
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            format!("{} ...{}", account_type.label(), tail)
        }
    }
}

pub(crate) fn raw_status(metadata: &mut Map<String, Value>, raw: Option<&str>) {
    if let Some(raw) = raw {
        metadata.insert("rawStatus".to_string(), Value::String(raw.to_string()));
    }
}

/// Monetary amount that may arrive as a JSON number or a numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Amount(pub f64);

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .map(Amount)
                .ok_or_else(|| de::Error::custom("amount out of range")),
            Value::String(s) => s
                .trim()
                .replace(',', "")
                .parse::<f64>()
                .map(Amount)
                .map_err(|_| de::Error::custom(format!("invalid amount {s:?}"))),
            other => Err(de::Error::custom(format!("expected amount, got {other}"))),
        }
    }
}

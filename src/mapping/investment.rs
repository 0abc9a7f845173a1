//! Brokerage schema. Cash is spendable; positions only contribute to the ledger value.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{display_name, lookup_status, raw_status, take_timestamp, Amount, StatusTable};
use crate::domain::{AccountStatus, AccountSummary, AccountType, Balance, Owner};

pub const STATUS_TABLE: StatusTable = &[
    ("open", AccountStatus::Active),
    ("active", AccountStatus::Active),
    ("restricted", AccountStatus::Suspended),
    ("margin_call", AccountStatus::Suspended),
    ("suspended", AccountStatus::Suspended),
    ("liquidated", AccountStatus::Closed),
    ("closed", AccountStatus::Closed),
];

#[derive(Debug, Deserialize)]
pub struct InvestmentPayload {
    pub portfolio_id: String,
    pub portfolio_name: Option<String>,
    pub investor: Option<Investor>,
    pub base_currency: String,
    #[serde(default)]
    pub cash_balance: Amount,
    #[serde(default)]
    pub positions: Vec<Position>,
    pub state: Option<String>,
    pub valuation_date: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Investor {
    pub name: Option<String>,
    pub client_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub market_value: Amount,
}

pub fn map(payload: InvestmentPayload, source: &str) -> AccountSummary {
    let mut metadata = payload.extra;
    raw_status(&mut metadata, payload.state.as_deref());
    let last_updated = take_timestamp(payload.valuation_date, &mut metadata);

    let cash = payload.cash_balance.0;
    let invested: f64 = payload.positions.iter().map(|p| p.market_value.0).sum();
    let holdings: Map<String, Value> = payload
        .positions
        .iter()
        .map(|p| (p.symbol.clone(), Value::from(p.market_value.0)))
        .collect();
    metadata.insert("positions".to_string(), Value::Object(holdings));

    AccountSummary {
        display_name: display_name(
            payload.portfolio_name,
            AccountType::Investment,
            &payload.portfolio_id,
        ),
        account_id: payload.portfolio_id,
        account_type: AccountType::Investment,
        owner: payload
            .investor
            .map(|i| Owner {
                name: i.name,
                customer_id: i.client_id,
            })
            .unwrap_or_default(),
        balances: vec![Balance::new(payload.base_currency, cash, Some(cash + invested))],
        status: lookup_status(STATUS_TABLE, payload.state.as_deref()),
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
    fn ledger_includes_positions() {
        let summary = map_payload(
            AccountType::Investment,
            json!({
                "portfolio_id": "INV-301",
                "portfolio_name": "Retirement",
                "investor": {"name": "Alan Turing", "client_id": "K-9"},
                "base_currency": "GBP",
                "cash_balance": 250.0,
                "positions": [
                    {"symbol": "VWRL", "market_value": 1000.0},
                    {"symbol": "IGLT", "market_value": "500.5"}
                ],
                "state": "restricted",
                "valuation_date": "2024-02-29T00:00:00+00:00"
            }),
            "investment-adapter/v1",
        )
        .unwrap();

        assert_eq!(summary.status, AccountStatus::Suspended);
        assert_eq!(summary.balances[0].currency, "GBP");
        assert_eq!(summary.balances[0].available, 250.0);
        assert_eq!(summary.balances[0].ledger, Some(1750.5));
        assert_eq!(summary.metadata["positions"]["VWRL"], 1000.0);
        assert_eq!(summary.owner.customer_id.as_deref(), Some("K-9"));
    }
}

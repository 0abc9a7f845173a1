//! Seed accounts, one set per proprietary schema.

use serde_json::{json, Value};

use crate::domain::AccountType;

/// `(account id, raw backend payload)` pairs served by a mock backend.
pub fn accounts(kind: AccountType) -> Vec<(&'static str, Value)> {
    match kind {
        AccountType::Bank => vec![
            (
                "BNK-1001",
                json!({
                    "account_id": "BNK-1001",
                    "account_name": "Everyday Checking",
                    "account_status": "open",
                    "customer": {"name": "Ada Lovelace", "id": "C-1001"},
                    "balances": [{"currency": "USD", "available": 2450.75, "ledger": 2500.00}],
                    "updated_at": "2024-03-01T12:00:00Z"
                }),
            ),
            (
                "BNK-1002",
                json!({
                    "account_id": "BNK-1002",
                    "account_name": "Rainy Day Savings",
                    "account_status": "frozen",
                    "customer": {"name": "Ada Lovelace", "id": "C-1001"},
                    "balances": [
                        {"currency": "USD", "available": "10,000.00"},
                        {"currency": "EUR", "available": 320.5, "ledger": 320.5}
                    ],
                    "updated_at": 1709294400
                }),
            ),
        ],
        AccountType::CreditCard => vec![
            (
                "CC-2001",
                json!({
                    "cardId": "CC-2001",
                    "nickname": "Travel Rewards",
                    "state": "active",
                    "holder": {"fullName": "Grace Hopper", "customerNumber": "C-2001"},
                    "currency": "USD",
                    "creditLimit": 5000,
                    "currentBalance": 1234.56,
                    "lastStatementAt": "2024-02-28T00:00:00Z"
                }),
            ),
            (
                "CC-2002",
                json!({
                    "cardId": "CC-2002",
                    "state": "past_due",
                    "holder": {"fullName": "Alan Turing"},
                    "creditLimit": 1000,
                    "currentBalance": 1100
                }),
            ),
        ],
        AccountType::Loan => vec![(
            "LN-3001",
            json!({
                "loanId": "LN-3001",
                "borrowerName": "Grace Hopper",
                "borrowerId": "C-2001",
                "productName": "Home Mortgage",
                "outstandingBalance": 182500.00,
                "currency": "USD",
                "status": "current",
                "asOf": "2024-03-01"
            }),
        )],
        AccountType::Investment => vec![(
            "INV-4001",
            json!({
                "portfolio_id": "INV-4001",
                "portfolio_name": "Retirement",
                "investor": {"name": "Katherine Johnson", "client_id": "K-4001"},
                "base_currency": "USD",
                "cash_balance": 1500.0,
                "positions": [
                    {"symbol": "VTI", "market_value": 24000.0},
                    {"symbol": "BND", "market_value": 8000.0}
                ],
                "state": "open",
                "valuation_date": "2024-02-29T00:00:00+00:00"
            }),
        )],
        AccountType::Legacy => vec![
            (
                "LEG-5001",
                json!({
                    "ACCT_NO": "LEG-5001  ",
                    "ACCT_DESC": "PASSBOOK SAVINGS    ",
                    "CUST_NM": "HOPPER G",
                    "CUST_NO": "0002001",
                    "BAL_AMT": "000451.20",
                    "CCY": "USD",
                    "STAT_CD": "A",
                    "LAST_UPD": "1709294400"
                }),
            ),
            (
                // Corrupt record: balance field is not numeric.
                "LEG-5999",
                json!({
                    "ACCT_NO": "LEG-5999",
                    "CUST_NM": "UNKNOWN",
                    "BAL_AMT": "N/A",
                    "CCY": "USD",
                    "STAT_CD": "A"
                }),
            ),
        ],
        AccountType::Crypto => vec![(
            "CRY-6001",
            json!({
                "walletId": "CRY-6001",
                "label": "Cold Storage",
                "ownerHandle": "satoshi",
                "ownerId": "U-6001",
                "holdings": [
                    {"asset": "btc", "free": 0.75, "locked": 0.25},
                    {"asset": "eth", "free": "3.5", "locked": 0}
                ],
                "status": "enabled",
                "updatedAt": 1709294400000u64
            }),
        )],
    }
}

/// Canonical port for a family when all mock backends run together.
pub fn default_port(kind: AccountType) -> u16 {
    let index = AccountType::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default();
    9101 + index as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::map_payload;

    #[test]
    fn seeds_map_cleanly_except_the_corrupt_record() {
        for kind in AccountType::ALL {
            for (id, payload) in accounts(kind) {
                let result = map_payload(kind, payload, "seed");
                if id == "LEG-5999" {
                    assert!(result.is_err());
                } else {
                    let summary = result.unwrap_or_else(|e| panic!("{id}: {e}"));
                    assert_eq!(summary.account_id, id);
                    assert_eq!(summary.account_type, kind);
                }
            }
        }
    }

    #[test]
    fn ports_match_default_config() {
        assert_eq!(default_port(AccountType::Bank), 9101);
        assert_eq!(default_port(AccountType::Crypto), 9106);
    }
}

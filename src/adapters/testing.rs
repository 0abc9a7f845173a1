//! Scripted fetchers for unit tests.

use async_trait::async_trait;
use serde_json::Map;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::adapters::AccountFetcher;
use crate::domain::{AccountStatus, AccountSummary, AccountType, AdapterError, Balance, Owner};

pub fn summary(account_id: &str) -> AccountSummary {
    AccountSummary {
        account_id: account_id.to_string(),
        account_type: AccountType::Bank,
        owner: Owner {
            name: Some("Test Holder".into()),
            customer_id: Some("C-1".into()),
        },
        display_name: format!("Account {account_id}"),
        balances: vec![Balance::new("USD", 100.0, Some(100.0))],
        status: AccountStatus::Active,
        backend_source: "bank-adapter/v1".into(),
        last_updated: None,
        stale: false,
        metadata: Map::new(),
        trace_id: None,
    }
}

/// Replays queued outcomes, then repeats the fallback forever.
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<AccountSummary, AdapterError>>>,
    fallback: Result<AccountSummary, AdapterError>,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedFetcher {
    pub fn always(err: AdapterError) -> Self {
        Self::with_fallback(Err(err))
    }

    pub fn ok() -> Self {
        Self::with_fallback(Ok(summary("BNK-1")))
    }

    pub fn with_fallback(fallback: Result<AccountSummary, AdapterError>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    pub fn then(self, outcome: Result<AccountSummary, AdapterError>) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountFetcher for ScriptedFetcher {
    async fn fetch(&self, account_id: &str) -> Result<AccountSummary, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next.unwrap_or_else(|| self.fallback.clone()) {
            Ok(mut s) => {
                s.account_id = account_id.to_string();
                Ok(s)
            }
            Err(e) => Err(e),
        }
    }
}

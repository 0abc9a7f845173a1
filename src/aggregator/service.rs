//! Single and multi-account orchestration.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::adapters::AdapterRegistry;
use crate::aggregator::ids::validate_account_id;
use crate::cache::{CacheMode, ReadThroughCache};
use crate::config::AggregatorConfig;
use crate::domain::response::UNAVAILABLE;
use crate::domain::{
    AccountResult, ErrorDetail, GatewayError, MultiAccountResponse, OverallStatus, ResultStatus,
};
use crate::observability::metrics;

/// Resolves ids to backends and assembles results. Holds all process-scoped state.
pub struct Aggregator {
    registry: Arc<AdapterRegistry>,
    cache: Arc<ReadThroughCache>,
    max_ids: usize,
    per_account_deadline: Duration,
}

impl Aggregator {
    pub fn new(
        registry: Arc<AdapterRegistry>,
        cache: Arc<ReadThroughCache>,
        config: &AggregatorConfig,
    ) -> Self {
        Self {
            registry,
            cache,
            max_ids: config.max_ids,
            per_account_deadline: Duration::from_millis(config.per_account_deadline_ms),
        }
    }

    pub fn registry(&self) -> &Arc<AdapterRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<ReadThroughCache> {
        &self.cache
    }

    /// Look up one account. Only a malformed id is an `Err`; every backend
    /// outcome is folded into the returned row.
    pub async fn get_account(
        &self,
        account_id: &str,
        mode: CacheMode,
        trace_id: Option<&str>,
    ) -> Result<AccountResult, GatewayError> {
        validate_account_id(account_id)?;
        Ok(self.lookup(account_id, mode, trace_id).await)
    }

    /// Look up many accounts concurrently. Results keep the requested order.
    pub async fn get_accounts(
        &self,
        account_ids: &[String],
        mode: CacheMode,
        request_id: String,
        trace_id: Option<&str>,
    ) -> Result<MultiAccountResponse, GatewayError> {
        if account_ids.is_empty() {
            return Err(GatewayError::Validation("ids must list at least one account".into()));
        }
        if account_ids.len() > self.max_ids {
            return Err(GatewayError::Validation(format!(
                "at most {} ids per request, got {}",
                self.max_ids,
                account_ids.len()
            )));
        }
        for id in account_ids {
            validate_account_id(id)?;
        }

        let lookups = account_ids
            .iter()
            .map(|id| self.lookup_with_deadline(id, mode, trace_id));
        let results = join_all(lookups).await;

        let overall_status = OverallStatus::derive(&results);
        if overall_status == OverallStatus::Partial {
            metrics::record_partial_response();
        }
        tracing::info!(
            request_id = %request_id,
            requested = results.len(),
            ok = results.iter().filter(|r| r.status == ResultStatus::Ok).count(),
            overall = ?overall_status,
            "Multi-account lookup complete"
        );

        Ok(MultiAccountResponse {
            request_id,
            overall_status,
            results,
            trace_id: trace_id.map(str::to_string),
        })
    }

    async fn lookup_with_deadline(
        &self,
        account_id: &str,
        mode: CacheMode,
        trace_id: Option<&str>,
    ) -> AccountResult {
        let start = Instant::now();
        match tokio::time::timeout(self.per_account_deadline, self.lookup(account_id, mode, trace_id)).await {
            Ok(result) => result,
            Err(_) => {
                let backend = self
                    .registry
                    .resolve(account_id)
                    .map_or("unknown", |b| b.name.as_str());
                tracing::warn!(
                    backend = %backend,
                    account_id = %account_id,
                    deadline_ms = self.per_account_deadline.as_millis() as u64,
                    "Account lookup exceeded deadline"
                );
                metrics::record_lookup_failure(backend, "deadline_exceeded");
                AccountResult::rejected(
                    account_id,
                    ResultStatus::Unavailable,
                    ErrorDetail::new(UNAVAILABLE, "backend is temporarily unavailable"),
                    elapsed_ms(start),
                )
            }
        }
    }

    async fn lookup(&self, account_id: &str, mode: CacheMode, trace_id: Option<&str>) -> AccountResult {
        let start = Instant::now();

        let Some(backend) = self.registry.resolve(account_id) else {
            tracing::debug!(account_id = %account_id, "No backend owns account id");
            return AccountResult::rejected(
                account_id,
                ResultStatus::NotFound,
                ErrorDetail::new("unknown_backend", format!("no backend owns account {account_id}")),
                elapsed_ms(start),
            );
        };

        let outcome = self
            .cache
            .lookup(backend.kind, account_id, backend.pipeline.as_ref(), mode)
            .await;

        match outcome {
            Ok(mut summary) => {
                if summary.account_id != account_id {
                    tracing::warn!(
                        backend = %backend.name,
                        account_id = %account_id,
                        reported_id = %summary.account_id,
                        "Backend answered with a different account id"
                    );
                }
                summary.trace_id = trace_id.map(str::to_string);
                AccountResult::found(account_id, summary, elapsed_ms(start))
            }
            Err(err) => {
                tracing::debug!(
                    backend = %backend.name,
                    account_id = %account_id,
                    code = err.code(),
                    error = %err,
                    "Account lookup failed"
                );
                metrics::record_lookup_failure(&backend.name, err.code());
                AccountResult::failed(account_id, &err, elapsed_ms(start))
            }
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

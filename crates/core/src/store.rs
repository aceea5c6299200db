use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::alert::AlertStatus;
use crate::domain::client::{ClientId, ClientRecord};
use crate::metrics::round_half_up;
use crate::portfolio::is_high_risk;

pub use crate::normalize::RawRecord;

/// Failures raised by store adapters. Adapters map their transport errors
/// into these variants so the core never sees driver types.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store returned an undecodable payload: {0}")]
    Decode(String),
    #[error("store rejected the request: {0}")]
    Rejected(String),
}

/// Portfolio-wide counters returned by `ClientStore::get_stats`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioStats {
    pub total_clients: usize,
    pub active_clients: usize,
    pub inactive_clients: usize,
    pub total_monthly_revenue: Decimal,
    pub average_health_score: Decimal,
    pub high_risk_clients: usize,
}

impl PortfolioStats {
    /// Revenue, health and risk are measured over active clients only.
    pub fn from_records(records: &[ClientRecord]) -> Self {
        let active: Vec<&ClientRecord> = records.iter().filter(|record| record.is_active()).collect();
        let total_monthly_revenue = active.iter().map(|record| record.monthly_revenue).sum();
        let average_health_score = if active.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal =
                active.iter().map(|record| Decimal::from(record.health_score)).sum();
            round_half_up(total / Decimal::from(active.len()), 1)
        };

        Self {
            total_clients: records.len(),
            active_clients: active.len(),
            inactive_clients: records.iter().filter(|record| record.is_inactive()).count(),
            total_monthly_revenue,
            average_health_score,
            high_risk_clients: active.iter().filter(|record| is_high_risk(record)).count(),
        }
    }
}

/// Source of raw client and alert payloads.
///
/// Implementations return records in whatever shape their backend speaks;
/// callers run them through the normalizer before use.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get_all(&self) -> Result<Vec<RawRecord>, StoreError>;
    async fn get_by_id(&self, id: &ClientId) -> Result<Option<RawRecord>, StoreError>;
    async fn create(&self, raw: RawRecord) -> Result<RawRecord, StoreError>;
    async fn update(&self, id: &ClientId, patch: RawRecord)
        -> Result<Option<RawRecord>, StoreError>;
    async fn get_stats(&self) -> Result<PortfolioStats, StoreError>;
    async fn get_alerts(&self, status: AlertStatus) -> Result<Vec<RawRecord>, StoreError>;
}

use serde_json::Value;
use tokio::sync::RwLock;

use pulseops_core::domain::alert::AlertStatus;
use pulseops_core::domain::client::ClientId;
use pulseops_core::normalize::{client_decimal, normalize_clients, ClientField, RawRecord};
use pulseops_core::scoring::{recalculate, RecalcTrigger};
use pulseops_core::store::{ClientStore, PortfolioStats, StoreError};
use rust_decimal::prelude::ToPrimitive;

use super::{merge_update, same_client};
use crate::fixtures::{demo_alerts, demo_clients};

#[derive(Default)]
struct State {
    clients: Vec<RawRecord>,
    alerts: Vec<RawRecord>,
    next_id: u64,
}

/// Process-local store; records keep whatever shape they were inserted with.
#[derive(Default)]
pub struct InMemoryClientStore {
    state: RwLock<State>,
}

impl InMemoryClientStore {
    pub fn new(clients: Vec<RawRecord>, alerts: Vec<RawRecord>) -> Self {
        let next_id = clients
            .iter()
            .filter_map(|raw| client_decimal(raw, ClientField::Id))
            .filter_map(|id| id.to_u64())
            .max()
            .unwrap_or(0)
            + 1;
        Self { state: RwLock::new(State { clients, alerts, next_id }) }
    }

    pub fn seeded() -> Self {
        Self::new(demo_clients(), demo_alerts())
    }
}

fn alert_status(raw: &RawRecord) -> AlertStatus {
    raw.get("status")
        .and_then(Value::as_str)
        .and_then(|status| status.parse().ok())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ClientStore for InMemoryClientStore {
    async fn get_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        Ok(self.state.read().await.clients.clone())
    }

    async fn get_by_id(&self, id: &ClientId) -> Result<Option<RawRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.clients.iter().find(|raw| same_client(raw, &id.0)).cloned())
    }

    async fn create(&self, mut raw: RawRecord) -> Result<RawRecord, StoreError> {
        let mut state = self.state.write().await;
        let id = state.next_id;
        state.next_id += 1;

        raw.insert("id".into(), Value::from(id));
        raw.entry("status").or_insert_with(|| Value::from("Active"));
        recalculate(&mut raw, RecalcTrigger::Create);

        state.clients.push(raw.clone());
        Ok(raw)
    }

    async fn update(
        &self,
        id: &ClientId,
        patch: RawRecord,
    ) -> Result<Option<RawRecord>, StoreError> {
        let mut state = self.state.write().await;
        let Some(existing) = state.clients.iter_mut().find(|raw| same_client(raw, &id.0)) else {
            return Ok(None);
        };
        merge_update(existing, patch);
        Ok(Some(existing.clone()))
    }

    async fn get_stats(&self) -> Result<PortfolioStats, StoreError> {
        let clients = self.get_all().await?;
        Ok(PortfolioStats::from_records(&normalize_clients(&clients)))
    }

    async fn get_alerts(&self, status: AlertStatus) -> Result<Vec<RawRecord>, StoreError> {
        let state = self.state.read().await;
        Ok(state.alerts.iter().filter(|raw| alert_status(raw) == status).cloned().collect())
    }
}

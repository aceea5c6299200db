use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use pulseops_core::store::ClientStore;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    store: Arc<dyn ClientStore>,
    backend: &'static str,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub store: HealthCheck,
    pub checked_at: String,
}

pub fn router(store: Arc<dyn ClientStore>, backend: &'static str) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store, backend })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = store_check(&state).await;
    let ready = store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "pulseops-server runtime initialized".to_string(),
        },
        store,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn store_check(state: &HealthState) -> HealthCheck {
    match state.store.get_stats().await {
        Ok(stats) => HealthCheck {
            status: "ready",
            detail: format!("{} store holds {} clients", state.backend, stats.total_clients),
        },
        Err(error) => HealthCheck {
            status: "degraded",
            detail: format!("{} store check failed: {error}", state.backend),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use pulseops_db::{ApiClientStore, InMemoryClientStore};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_when_store_answers() {
        let state =
            HealthState { store: Arc::new(InMemoryClientStore::seeded()), backend: "memory" };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.store.detail, "memory store holds 8 clients");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_store_is_unreachable() {
        let store = ApiClientStore::new("http://127.0.0.1:1/api", 1)
            .expect("client should build");
        let state = HealthState { store: Arc::new(store), backend: "api" };

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.store.status, "degraded");
        assert_eq!(payload.service.status, "ready");
    }
}

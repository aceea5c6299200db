//! Behaviour every bundled `ClientStore` must share, run against the memory
//! and SQLite adapters.

use std::sync::Arc;

use serde_json::{json, Value};

use pulseops_core::domain::alert::AlertStatus;
use pulseops_core::domain::client::{ChurnRiskLevel, ClientId};
use pulseops_core::normalize::{normalize_client, normalize_clients, RawRecord};
use pulseops_core::store::ClientStore;
use pulseops_db::migrations::run_pending;
use pulseops_db::{connect_with_settings, fixtures, InMemoryClientStore, SqlClientStore};

type ContractResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

fn raw(value: Value) -> ContractResult<RawRecord> {
    value.as_object().cloned().ok_or_else(|| "payload should be a json object".to_string())
}

async fn stores() -> ContractResult<Vec<(&'static str, Arc<dyn ClientStore>)>> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect: {error}"))?;
    run_pending(&pool).await.map_err(|error| format!("migrate: {error}"))?;
    fixtures::load(&pool).await.map_err(|error| format!("seed: {error}"))?;

    Ok(vec![
        ("memory", Arc::new(InMemoryClientStore::seeded()) as Arc<dyn ClientStore>),
        ("sql", Arc::new(SqlClientStore::new(pool)) as Arc<dyn ClientStore>),
    ])
}

#[tokio::test]
async fn seeded_portfolios_normalize_identically() -> ContractResult {
    let mut portfolios = Vec::new();
    for (name, store) in stores().await? {
        let raw = store.get_all().await.map_err(|error| format!("{name}: {error}"))?;
        portfolios.push(normalize_clients(&raw));
    }

    require_eq!(portfolios.len(), 2);
    let (memory, sql) = (&portfolios[0], &portfolios[1]);
    require_eq!(memory.len(), sql.len());
    for (left, right) in memory.iter().zip(sql) {
        require_eq!(left.client_code, right.client_code);
        require_eq!(left.license_count, right.license_count);
        require_eq!(left.monthly_revenue, right.monthly_revenue);
        require_eq!(left.health_score, right.health_score);
        require_eq!(left.churn_risk_percent, right.churn_risk_percent);
        require_eq!(left.churn_risk_level, right.churn_risk_level);
        require_eq!(left.status, right.status);
    }
    Ok(())
}

#[tokio::test]
async fn create_recalculates_health_and_churn() -> ContractResult {
    for (name, store) in stores().await? {
        let created = store
            .create(raw(json!({
                "client_id": "CL0010", "name": "Lumen Health", "industry": "Healthcare",
                "total_licenses": 40, "total_users": 30, "monthly_spend": "2400",
                "contract_value": "28800"
            }))?)
            .await
            .map_err(|error| format!("{name}: {error}"))?;

        let record = normalize_client(&created);
        require!(!record.id.0.is_empty(), "{name}: created client should get an id");
        require_eq!(record.utilization_rate, 75);
        require_eq!(record.health_score, 95);
        require_eq!(record.churn_risk_level, ChurnRiskLevel::Low);

        let fetched = store
            .get_by_id(&record.id)
            .await
            .map_err(|error| format!("{name}: {error}"))?
            .ok_or_else(|| format!("{name}: created client should be readable"))?;
        require_eq!(normalize_client(&fetched).name, "Lumen Health");
    }
    Ok(())
}

#[tokio::test]
async fn update_of_unknown_client_returns_none() -> ContractResult {
    for (name, store) in stores().await? {
        let updated = store
            .update(&ClientId("999".to_string()), raw(json!({ "name": "Ghost" }))?)
            .await
            .map_err(|error| format!("{name}: {error}"))?;
        require!(updated.is_none(), "{name}: unknown id should not be updated");
    }
    Ok(())
}

#[tokio::test]
async fn active_alerts_exclude_resolved_ones() -> ContractResult {
    for (name, store) in stores().await? {
        let active = store
            .get_alerts(AlertStatus::Active)
            .await
            .map_err(|error| format!("{name}: {error}"))?;
        require_eq!(active.len(), 2);

        let stats = store.get_stats().await.map_err(|error| format!("{name}: {error}"))?;
        require_eq!(stats.total_clients, 8);
        require_eq!(stats.high_risk_clients, 3);
    }
    Ok(())
}

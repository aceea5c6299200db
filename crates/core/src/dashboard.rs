//! Async orchestration over a `ClientStore`: fetch, normalize, aggregate.
//!
//! Records are rebuilt from the store on every call. Edits go through the
//! store and the edited record is re-fetched rather than patched locally.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::alerts::AlertFeed;
use crate::domain::alert::AlertStatus;
use crate::domain::client::{ClientId, ClientRecord};
use crate::errors::ApplicationError;
use crate::metrics::{health_color, risk_color, StatusColor};
use crate::normalize::{client_text, normalize_client, normalize_clients, ClientField};
use crate::portfolio::{LicenseSummary, PortfolioSummary, RiskCohorts};
use crate::recommendations::{synthesize, Recommendation};
use crate::scoring::{estimate_churn, RiskFactor, ScoringInputs};
use crate::store::{ClientStore, PortfolioStats};
use crate::validation::{next_client_code, ClientDraft, ClientUpdate};

pub const CLIENT_NOT_FOUND_BANNER: &str = "Client not found";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientDetail {
    pub client: ClientRecord,
    pub health_color: StatusColor,
    pub risk_color: StatusColor,
    pub recommendations: Vec<Recommendation>,
    pub risk_factors: Vec<RiskFactor>,
}

impl ClientDetail {
    pub fn from_record(client: ClientRecord) -> Self {
        let estimate = estimate_churn(
            &ScoringInputs::from_record(&client),
            Decimal::from(client.health_score),
        );
        Self {
            health_color: health_color(client.health_score),
            risk_color: risk_color(client.churn_risk_percent),
            recommendations: synthesize(&client),
            risk_factors: estimate.factors,
            client,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ClientLookup {
    Found(Box<ClientDetail>),
    NotFound { id: ClientId },
}

impl ClientLookup {
    pub fn warning_banner(&self) -> Option<&'static str> {
        match self {
            Self::Found(_) => None,
            Self::NotFound { .. } => Some(CLIENT_NOT_FOUND_BANNER),
        }
    }

    pub fn into_detail(self) -> Option<ClientDetail> {
        match self {
            Self::Found(detail) => Some(*detail),
            Self::NotFound { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AtRiskView {
    pub clients: Vec<ClientRecord>,
    pub revenue_at_risk: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LicenseView {
    pub summary: LicenseSummary,
    pub clients: Vec<ClientRecord>,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn ClientStore>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    pub async fn clients(&self) -> Result<Vec<ClientRecord>, ApplicationError> {
        let raw = self.store.get_all().await?;
        Ok(normalize_clients(&raw))
    }

    pub async fn client_detail(&self, id: &ClientId) -> Result<ClientLookup, ApplicationError> {
        let lookup = match self.store.get_by_id(id).await? {
            Some(raw) => ClientLookup::Found(Box::new(ClientDetail::from_record(
                normalize_client(&raw),
            ))),
            None => ClientLookup::NotFound { id: id.clone() },
        };
        Ok(lookup)
    }

    pub async fn msp_overview(&self) -> Result<PortfolioSummary, ApplicationError> {
        let clients = self.clients().await?;
        Ok(PortfolioSummary::from_records(&clients))
    }

    pub async fn at_risk(&self) -> Result<AtRiskView, ApplicationError> {
        let cohorts = RiskCohorts::from_records(&self.clients().await?);
        let revenue_at_risk = cohorts.revenue_at_risk();
        Ok(AtRiskView { clients: cohorts.high_risk, revenue_at_risk })
    }

    pub async fn inactive(&self) -> Result<Vec<ClientRecord>, ApplicationError> {
        Ok(RiskCohorts::from_records(&self.clients().await?).inactive)
    }

    pub async fn licenses(&self) -> Result<LicenseView, ApplicationError> {
        let cohorts = RiskCohorts::from_records(&self.clients().await?);
        Ok(LicenseView { summary: cohorts.license_summary(), clients: cohorts.active })
    }

    pub async fn stats(&self) -> Result<PortfolioStats, ApplicationError> {
        Ok(self.store.get_stats().await?)
    }

    /// Never fails: an unreachable or empty alert source yields the demo set.
    pub async fn alerts(&self, status: AlertStatus) -> AlertFeed {
        let result = self.store.get_alerts(status).await;
        if let Err(error) = &result {
            warn!(
                event_name = "dashboard.alerts.fallback",
                alert_status = status.as_str(),
                error = %error,
                "alert source unavailable, serving demo alerts"
            );
        }
        AlertFeed::resolve(result)
    }

    pub async fn create_client(&self, draft: ClientDraft) -> Result<ClientRecord, ApplicationError> {
        draft.validate()?;

        let client_code = match draft.client_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => code.to_string(),
            _ => {
                let existing = self.store.get_all().await?;
                let codes: Vec<String> = existing
                    .iter()
                    .filter_map(|raw| client_text(raw, ClientField::ClientCode))
                    .collect();
                next_client_code(codes.iter().map(String::as_str))
            }
        };

        let created = normalize_client(&self.store.create(draft.to_raw(&client_code)).await?);
        info!(
            event_name = "dashboard.client.created",
            client_id = %created.id,
            client_code = %created.client_code,
            "client created"
        );
        Ok(created)
    }

    /// Validates, writes, then re-reads the record so derived fields reflect
    /// whatever the store recalculated.
    pub async fn update_client(
        &self,
        id: &ClientId,
        update: ClientUpdate,
    ) -> Result<ClientLookup, ApplicationError> {
        update.validate()?;

        if self.store.update(id, update.to_raw()).await?.is_none() {
            return Ok(ClientLookup::NotFound { id: id.clone() });
        }
        info!(event_name = "dashboard.client.updated", client_id = %id, "client updated");

        self.client_detail(id).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};
    use tokio::sync::RwLock;

    use super::{ClientLookup, DashboardService, CLIENT_NOT_FOUND_BANNER};
    use crate::alerts::AlertSource;
    use crate::domain::alert::AlertStatus;
    use crate::domain::client::ClientId;
    use crate::errors::{ApplicationError, DomainError};
    use crate::normalize::{client_text, normalize_clients, ClientField, RawRecord};
    use crate::store::{ClientStore, PortfolioStats, StoreError};
    use crate::validation::{ClientDraft, ClientUpdate, ValidationError};

    #[derive(Default)]
    struct FakeStore {
        records: RwLock<Vec<RawRecord>>,
        alerts: Vec<RawRecord>,
        offline: bool,
    }

    impl FakeStore {
        fn with(values: Vec<Value>) -> Self {
            let records = values.into_iter().filter_map(|value| value.as_object().cloned());
            Self { records: RwLock::new(records.collect()), ..Self::default() }
        }

        fn offline() -> Self {
            Self { offline: true, ..Self::default() }
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.offline {
                Err(StoreError::Unavailable("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn matches_id(raw: &RawRecord, id: &ClientId) -> bool {
        client_text(raw, ClientField::Id).as_deref() == Some(id.0.as_str())
    }

    #[async_trait]
    impl ClientStore for FakeStore {
        async fn get_all(&self) -> Result<Vec<RawRecord>, StoreError> {
            self.check()?;
            Ok(self.records.read().await.clone())
        }

        async fn get_by_id(&self, id: &ClientId) -> Result<Option<RawRecord>, StoreError> {
            self.check()?;
            Ok(self.records.read().await.iter().find(|raw| matches_id(raw, id)).cloned())
        }

        async fn create(&self, mut raw: RawRecord) -> Result<RawRecord, StoreError> {
            self.check()?;
            let mut records = self.records.write().await;
            raw.insert("id".into(), Value::from(records.len() + 1));
            records.push(raw.clone());
            Ok(raw)
        }

        async fn update(
            &self,
            id: &ClientId,
            patch: RawRecord,
        ) -> Result<Option<RawRecord>, StoreError> {
            self.check()?;
            let mut records = self.records.write().await;
            let Some(existing) = records.iter_mut().find(|raw| matches_id(raw, id)) else {
                return Ok(None);
            };
            existing.extend(patch);
            Ok(Some(existing.clone()))
        }

        async fn get_stats(&self) -> Result<PortfolioStats, StoreError> {
            let raw = self.get_all().await?;
            Ok(PortfolioStats::from_records(&normalize_clients(&raw)))
        }

        async fn get_alerts(&self, _status: AlertStatus) -> Result<Vec<RawRecord>, StoreError> {
            self.check()?;
            Ok(self.alerts.clone())
        }
    }

    fn service(store: FakeStore) -> DashboardService {
        DashboardService::new(Arc::new(store))
    }

    fn portfolio() -> FakeStore {
        FakeStore::with(vec![
            json!({"id": 1, "client_id": "CL0001", "name": "TechCorp Inc", "total_licenses": 100,
                   "total_users": 80, "monthly_spend": 1000, "health_score": 62,
                   "churn_probability": 0.8}),
            json!({"id": 2, "client_id": "CL0002", "name": "Acme Solutions", "licenses": 50,
                   "employees": 45, "revenue": 500, "healthScore": 90, "churnRisk": 20}),
            json!({"id": 3, "client_id": "CL0007", "name": "Dormant LLC", "status": "Inactive"}),
        ])
    }

    #[tokio::test]
    async fn overview_aggregates_normalized_clients() {
        let summary = service(portfolio()).msp_overview().await.expect("overview");

        assert_eq!(summary.total_clients, 3);
        assert_eq!(summary.active_clients, 2);
        assert_eq!(summary.inactive_clients, 1);
        assert_eq!(summary.high_risk_clients, 1);
        assert_eq!(summary.revenue_at_risk, Decimal::from(800));
        assert_eq!(summary.monthly_recurring_revenue, Decimal::from(1500));
        assert_eq!(summary.average_health_score, Decimal::from(76));
        assert_eq!(
            summary.licenses.top_client.map(|top| top.name),
            Some("TechCorp Inc".to_string())
        );
    }

    #[tokio::test]
    async fn fetch_failure_surfaces_as_store_error() {
        let error = service(FakeStore::offline()).clients().await.expect_err("store is offline");
        assert!(matches!(error, ApplicationError::Store(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn detail_carries_colors_and_recommendations() {
        let lookup = service(portfolio())
            .client_detail(&ClientId("1".to_string()))
            .await
            .expect("lookup");

        assert_eq!(lookup.warning_banner(), None);
        let detail = lookup.into_detail().expect("client exists");
        assert_eq!(detail.client.name, "TechCorp Inc");
        assert_eq!(detail.health_color, crate::metrics::StatusColor::Warning);
        assert_eq!(detail.risk_color, crate::metrics::StatusColor::Error);
        assert_eq!(detail.recommendations[0].title, "Immediate Intervention Required");
    }

    #[tokio::test]
    async fn missing_client_renders_warning_banner() {
        let lookup = service(portfolio())
            .client_detail(&ClientId("404".to_string()))
            .await
            .expect("lookup");

        assert!(matches!(lookup, ClientLookup::NotFound { .. }));
        assert_eq!(lookup.warning_banner(), Some(CLIENT_NOT_FOUND_BANNER));
    }

    #[tokio::test]
    async fn alerts_fall_back_when_store_is_offline_or_empty() {
        let offline = service(FakeStore::offline()).alerts(AlertStatus::Active).await;
        assert_eq!(offline.source, AlertSource::Fallback);
        assert_eq!(offline.alerts.len(), 7);

        let empty = service(portfolio()).alerts(AlertStatus::Active).await;
        assert_eq!(empty.source, AlertSource::Fallback);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_store() {
        let dashboard = service(portfolio());
        let draft = ClientDraft { name: "New Co".to_string(), ..ClientDraft::default() };

        let error = dashboard.create_client(draft).await.expect_err("industry is missing");

        assert_eq!(
            error,
            ApplicationError::Domain(DomainError::Validation(ValidationError::MissingIndustry))
        );
        assert_eq!(dashboard.clients().await.expect("clients").len(), 3);
    }

    #[tokio::test]
    async fn created_client_gets_next_sequential_code() {
        let dashboard = service(portfolio());
        let draft = ClientDraft {
            name: "Northwind".to_string(),
            industry: "Retail".to_string(),
            total_licenses: 10,
            total_users: 9,
            ..ClientDraft::default()
        };

        let created = dashboard.create_client(draft).await.expect("create");

        assert_eq!(created.client_code, "CL0008");
        assert_eq!(created.id.0, "4");
        assert_eq!(created.utilization_rate, 90);
    }

    #[tokio::test]
    async fn update_refetches_and_renormalizes() {
        let dashboard = service(portfolio());
        let update = ClientUpdate { total_users: Some(50), ..ClientUpdate::default() };

        let lookup = dashboard
            .update_client(&ClientId("2".to_string()), update)
            .await
            .expect("update");

        let detail = lookup.into_detail().expect("client exists");
        assert_eq!(detail.client.user_count, 50);
        assert_eq!(detail.client.utilization_rate, 100);
    }

    #[tokio::test]
    async fn update_of_unknown_client_is_not_found() {
        let lookup = service(portfolio())
            .update_client(&ClientId("99".to_string()), ClientUpdate::default())
            .await
            .expect("update");

        assert_eq!(lookup.warning_banner(), Some(CLIENT_NOT_FOUND_BANNER));
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_before_store_call() {
        let update =
            ClientUpdate { health_score: Some(Decimal::from(140)), ..ClientUpdate::default() };

        let error = service(FakeStore::offline())
            .update_client(&ClientId("1".to_string()), update)
            .await
            .expect_err("score out of range");

        assert!(matches!(
            error,
            ApplicationError::Domain(DomainError::Validation(
                ValidationError::HealthScoreOutOfRange
            ))
        ));
    }
}

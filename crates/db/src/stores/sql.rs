use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Row, Sqlite};

use pulseops_core::domain::alert::AlertStatus;
use pulseops_core::domain::client::{ChurnRiskLevel, ClientId, ClientStatus};
use pulseops_core::metrics::{normalize_churn_risk, round_half_up};
use pulseops_core::normalize::{
    client_decimal, client_text, normalize_alert, normalize_clients, ClientField, RawRecord,
    DEFAULT_NAME,
};
use pulseops_core::scoring::{recalculate, RecalcTrigger};
use pulseops_core::store::{ClientStore, PortfolioStats, StoreError};

use super::{map_sqlx, merge_update};
use crate::DbPool;

const CLIENT_COLUMNS: &str = "id, client_id, name, industry, status, total_licenses, total_users,
    active_users, monthly_spend, contract_value, health_score, churn_probability, churn_risk,
    contact, email, phone, created_at, updated_at";

const ALERT_COLUMNS: &str = "id, alert_type, title, description, client_id, client_name, impact,
    priority, action_label, action_route, details, due_date, status, created_at";

pub struct SqlClientStore {
    pool: DbPool,
}

impl SqlClientStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn find(&self, id: i64) -> Result<Option<RawRecord>, StoreError> {
        let row = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;

        row.map(client_from_row).transpose()
    }
}

/// Column values for one `clients` row, read through the alias table so any
/// accepted payload shape can be stored.
struct ClientColumns {
    client_code: Option<String>,
    name: String,
    industry: Option<String>,
    status: &'static str,
    total_licenses: i64,
    total_users: i64,
    active_users: Option<i64>,
    monthly_spend: String,
    contract_value: String,
    health_score: Option<String>,
    churn_probability: Option<String>,
    churn_risk: Option<&'static str>,
    contact: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl ClientColumns {
    fn from_raw(raw: &RawRecord) -> Self {
        let count = |field| {
            client_decimal(raw, field).and_then(|value| round_half_up(value, 0).to_i64())
        };
        let money =
            |field| client_decimal(raw, field).unwrap_or(Decimal::ZERO).normalize().to_string();

        Self {
            client_code: client_text(raw, ClientField::ClientCode),
            name: client_text(raw, ClientField::Name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            industry: client_text(raw, ClientField::Industry),
            status: client_text(raw, ClientField::Status)
                .map(|status| ClientStatus::parse_lenient(&status))
                .unwrap_or_default()
                .as_str(),
            total_licenses: count(ClientField::LicenseCount).unwrap_or(0).max(0),
            total_users: count(ClientField::UserCount).unwrap_or(0).max(0),
            active_users: count(ClientField::ActiveUserCount),
            monthly_spend: money(ClientField::MonthlyRevenue),
            contract_value: money(ClientField::ContractValue),
            health_score: client_decimal(raw, ClientField::HealthScore)
                .map(|score| score.normalize().to_string()),
            churn_probability: churn_fraction(raw).map(|fraction| fraction.normalize().to_string()),
            churn_risk: client_text(raw, ClientField::ChurnRiskLevel)
                .and_then(|level| ChurnRiskLevel::parse(&level))
                .map(|level| level.as_str()),
            contact: client_text(raw, ClientField::Contact),
            email: client_text(raw, ClientField::Email),
            phone: client_text(raw, ClientField::Phone),
        }
    }
}

/// Churn is persisted as a 0-1 fraction whatever scale the payload used.
fn churn_fraction(raw: &RawRecord) -> Option<Decimal> {
    if let Some(percent) = client_decimal(raw, ClientField::ChurnRiskPercent) {
        return Some(percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED);
    }
    client_decimal(raw, ClientField::ChurnProbability)
        .map(|value| normalize_churn_risk(value) / Decimal::ONE_HUNDRED)
}

pub(crate) async fn insert_client_row<'e, E>(executor: E, raw: &RawRecord) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let columns = ClientColumns::from_raw(raw);
    let id = client_decimal(raw, ClientField::Id).and_then(|id| id.to_i64());

    let result = sqlx::query(
        "INSERT INTO clients (
            id, client_id, name, industry, status, total_licenses, total_users, active_users,
            monthly_spend, contract_value, health_score, churn_probability, churn_risk,
            contact, email, phone
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(columns.client_code)
    .bind(columns.name)
    .bind(columns.industry)
    .bind(columns.status)
    .bind(columns.total_licenses)
    .bind(columns.total_users)
    .bind(columns.active_users)
    .bind(columns.monthly_spend)
    .bind(columns.contract_value)
    .bind(columns.health_score)
    .bind(columns.churn_probability)
    .bind(columns.churn_risk)
    .bind(columns.contact)
    .bind(columns.email)
    .bind(columns.phone)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

async fn update_client_row(pool: &DbPool, id: i64, raw: &RawRecord) -> Result<(), sqlx::Error> {
    let columns = ClientColumns::from_raw(raw);

    sqlx::query(
        "UPDATE clients SET
            client_id = ?, name = ?, industry = ?, status = ?, total_licenses = ?,
            total_users = ?, active_users = ?, monthly_spend = ?, contract_value = ?,
            health_score = ?, churn_probability = ?, churn_risk = ?, contact = ?, email = ?,
            phone = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
         WHERE id = ?",
    )
    .bind(columns.client_code)
    .bind(columns.name)
    .bind(columns.industry)
    .bind(columns.status)
    .bind(columns.total_licenses)
    .bind(columns.total_users)
    .bind(columns.active_users)
    .bind(columns.monthly_spend)
    .bind(columns.contract_value)
    .bind(columns.health_score)
    .bind(columns.churn_probability)
    .bind(columns.churn_risk)
    .bind(columns.contact)
    .bind(columns.email)
    .bind(columns.phone)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

pub(crate) async fn insert_alert_row<'e, E>(executor: E, raw: &RawRecord) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let alert = normalize_alert(raw);
    let id = alert.id.parse::<i64>().ok();
    let status = raw
        .get("status")
        .and_then(Value::as_str)
        .and_then(|status| status.parse::<AlertStatus>().ok())
        .unwrap_or_default();
    let optional = |text: String| if text.is_empty() { None } else { Some(text) };

    let result = sqlx::query(
        "INSERT INTO alerts (
            id, alert_type, title, description, client_id, client_name, impact, priority,
            action_label, action_route, details, due_date, status
         ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(alert.alert_type.as_str())
    .bind(alert.title)
    .bind(optional(alert.description))
    .bind(optional(alert.client_id))
    .bind(optional(alert.client_name))
    .bind(optional(alert.impact_label))
    .bind(alert.priority.as_str())
    .bind(optional(alert.action_label))
    .bind(optional(alert.action_route))
    .bind(optional(alert.detail_text))
    .bind(optional(alert.due_label))
    .bind(status.as_str())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

fn decode(error: sqlx::Error) -> StoreError {
    StoreError::Decode(error.to_string())
}

fn text_columns(row: &SqliteRow, raw: &mut RawRecord, names: &[&str]) -> Result<(), StoreError> {
    for name in names {
        if let Some(value) = row.try_get::<Option<String>, _>(*name).map_err(decode)? {
            raw.insert((*name).to_string(), Value::from(value));
        }
    }
    Ok(())
}

fn client_from_row(row: SqliteRow) -> Result<RawRecord, StoreError> {
    let mut raw = Map::new();
    raw.insert("id".into(), Value::from(row.try_get::<i64, _>("id").map_err(decode)?));
    for name in ["total_licenses", "total_users"] {
        raw.insert(name.into(), Value::from(row.try_get::<i64, _>(name).map_err(decode)?));
    }
    if let Some(active) = row.try_get::<Option<i64>, _>("active_users").map_err(decode)? {
        raw.insert("active_users".into(), Value::from(active));
    }
    text_columns(
        &row,
        &mut raw,
        &[
            "client_id",
            "name",
            "industry",
            "status",
            "monthly_spend",
            "contract_value",
            "health_score",
            "churn_probability",
            "churn_risk",
            "contact",
            "email",
            "phone",
            "created_at",
            "updated_at",
        ],
    )?;
    Ok(raw)
}

fn alert_from_row(row: SqliteRow) -> Result<RawRecord, StoreError> {
    let mut raw = Map::new();
    raw.insert("id".into(), Value::from(row.try_get::<i64, _>("id").map_err(decode)?));
    text_columns(
        &row,
        &mut raw,
        &[
            "alert_type",
            "title",
            "description",
            "client_id",
            "client_name",
            "impact",
            "priority",
            "action_label",
            "action_route",
            "details",
            "due_date",
            "status",
            "created_at",
        ],
    )?;
    Ok(raw)
}

fn row_id(id: &ClientId) -> Option<i64> {
    id.0.trim().parse().ok()
}

#[async_trait::async_trait]
impl ClientStore for SqlClientStore {
    async fn get_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        let rows = sqlx::query(&format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY id ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        rows.into_iter().map(client_from_row).collect()
    }

    async fn get_by_id(&self, id: &ClientId) -> Result<Option<RawRecord>, StoreError> {
        match row_id(id) {
            Some(id) => self.find(id).await,
            None => Ok(None),
        }
    }

    async fn create(&self, mut raw: RawRecord) -> Result<RawRecord, StoreError> {
        raw.remove("id");
        recalculate(&mut raw, RecalcTrigger::Create);

        let id = insert_client_row(&self.pool, &raw).await.map_err(map_sqlx)?;
        self.find(id)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("inserted client {id} could not be read back")))
    }

    async fn update(
        &self,
        id: &ClientId,
        patch: RawRecord,
    ) -> Result<Option<RawRecord>, StoreError> {
        let Some(id) = row_id(id) else {
            return Ok(None);
        };
        let Some(mut existing) = self.find(id).await? else {
            return Ok(None);
        };

        merge_update(&mut existing, patch);
        update_client_row(&self.pool, id, &existing).await.map_err(map_sqlx)?;
        self.find(id).await
    }

    async fn get_stats(&self) -> Result<PortfolioStats, StoreError> {
        let clients = self.get_all().await?;
        Ok(PortfolioStats::from_records(&normalize_clients(&clients)))
    }

    async fn get_alerts(&self, status: AlertStatus) -> Result<Vec<RawRecord>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE lower(status) = ? ORDER BY id ASC"
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx)?;

        rows.into_iter().map(alert_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use pulseops_core::domain::alert::{AlertStatus, AlertType};
    use pulseops_core::domain::client::{ChurnRiskLevel, ClientId, ClientStatus};
    use pulseops_core::normalize::{normalize_alert, normalize_client, RawRecord};
    use pulseops_core::store::{ClientStore, StoreError};

    use super::SqlClientStore;
    use crate::{connect_with_settings, fixtures, migrations::run_pending};

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().expect("object payload")
    }

    async fn seeded_store() -> SqlClientStore {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        fixtures::load(&pool).await.expect("seed");
        SqlClientStore::new(pool)
    }

    #[tokio::test]
    async fn seeded_rows_read_back_in_canonical_shape() {
        let store = seeded_store().await;

        let cloudpeak = store
            .get_by_id(&ClientId("3".into()))
            .await
            .expect("lookup")
            .expect("client 3 exists");

        assert_eq!(cloudpeak.get("client_id"), Some(&Value::from("CL0003")));
        assert_eq!(cloudpeak.get("churn_probability"), Some(&Value::from("0.72")));

        let record = normalize_client(&cloudpeak);
        assert_eq!(record.license_count, 80);
        assert_eq!(record.health_score, 48);
        assert_eq!(record.churn_risk_percent, Decimal::from(72));
        assert_eq!(record.churn_risk_level, ChurnRiskLevel::High);
    }

    #[tokio::test]
    async fn create_then_update_recalculates_derived_fields() {
        let store = seeded_store().await;

        let created = store
            .create(raw(json!({
                "client_id": "CL0009", "name": "Harbor Labs", "industry": "Research",
                "total_licenses": 100, "total_users": 20, "monthly_spend": "600"
            })))
            .await
            .expect("create");
        let created_record = normalize_client(&created);
        assert_eq!(created_record.id.0, "9");
        assert_eq!(created_record.status, ClientStatus::Active);
        assert_eq!(created_record.churn_risk_level, ChurnRiskLevel::High);

        let updated = store
            .update(&created_record.id, raw(json!({ "total_users": 85, "monthly_spend": "6000" })))
            .await
            .expect("update")
            .expect("client exists");
        let updated_record = normalize_client(&updated);
        assert_eq!(updated_record.utilization_rate, 85);
        assert_eq!(updated_record.churn_risk_level, ChurnRiskLevel::Low);
        assert!(updated_record.health_score > created_record.health_score);
    }

    #[tokio::test]
    async fn duplicate_client_code_is_rejected() {
        let store = seeded_store().await;

        let error = store
            .create(raw(json!({ "client_id": "CL0001", "name": "Copycat" })))
            .await
            .expect_err("code already taken");

        assert!(matches!(error, StoreError::Rejected(_)));
    }

    #[tokio::test]
    async fn non_numeric_or_missing_ids_are_not_found() {
        let store = seeded_store().await;

        assert!(store.get_by_id(&ClientId("abc".into())).await.expect("lookup").is_none());
        assert!(store
            .update(&ClientId("99".into()), RawRecord::new())
            .await
            .expect("update")
            .is_none());
    }

    #[tokio::test]
    async fn alerts_are_filtered_by_status() {
        let store = seeded_store().await;

        let active = store.get_alerts(AlertStatus::Active).await.expect("active");
        assert_eq!(active.len(), 2);
        assert_eq!(normalize_alert(&active[0]).alert_type, AlertType::Critical);

        let resolved = store.get_alerts(AlertStatus::Resolved).await.expect("resolved");
        assert_eq!(normalize_alert(&resolved[0]).client_name, "WaveDriver Inc");
    }
}

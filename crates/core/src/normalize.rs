//! Ingestion boundary for raw client and alert payloads.
//!
//! Every external shape (snake_case API rows, camelCase cached rows) is mapped
//! onto the canonical records through the alias tables below. Each field takes
//! the first alias carrying a usable value; an empty string or a zero number
//! counts as absent and falls through to the next alias, then to the default.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::domain::alert::{AlertRecord, AlertType, Priority};
use crate::domain::client::{ChurnRiskLevel, ClientId, ClientRecord, ClientStatus};
use crate::metrics::{
    clamp_health_score, classify_risk, normalize_churn_risk, round_half_up, utilization,
};

pub type RawRecord = Map<String, Value>;

pub const DEFAULT_NAME: &str = "Unknown";
pub const DEFAULT_INDUSTRY: &str = "N/A";
pub const DEFAULT_CONTACT: &str = "Not Available";
pub const DEFAULT_EMAIL: &str = "not.available@example.com";
pub const DEFAULT_PHONE: &str = "N/A";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientField {
    Id,
    ClientCode,
    Name,
    Industry,
    Status,
    LicenseCount,
    UserCount,
    ActiveUserCount,
    MonthlyRevenue,
    ContractValue,
    HealthScore,
    /// Already on the 0-100 scale; written by this crate when re-serializing.
    ChurnRiskPercent,
    /// Fraction or percent, disambiguated by `normalize_churn_risk`.
    ChurnProbability,
    ChurnRiskLevel,
    Contact,
    Email,
    Phone,
}

/// External field names per canonical client field, in resolution order.
pub const CLIENT_FIELD_MAP: &[(ClientField, &[&str])] = &[
    (ClientField::Id, &["id"]),
    (ClientField::ClientCode, &["client_id", "clientId", "client_code"]),
    (ClientField::Name, &["name"]),
    (ClientField::Industry, &["industry"]),
    (ClientField::Status, &["status"]),
    (ClientField::LicenseCount, &["total_licenses", "licenses"]),
    (ClientField::UserCount, &["total_users", "employees"]),
    (ClientField::ActiveUserCount, &["active_users", "activeUsers"]),
    (ClientField::MonthlyRevenue, &["monthly_spend", "revenue"]),
    (ClientField::ContractValue, &["contract_value", "contractValue"]),
    (ClientField::HealthScore, &["health_score", "healthScore"]),
    (ClientField::ChurnRiskPercent, &["churn_risk_percent"]),
    (ClientField::ChurnProbability, &["churn_probability", "churnProbability", "churnRisk"]),
    (ClientField::ChurnRiskLevel, &["churn_risk", "churnRiskLevel", "churnRisk"]),
    (ClientField::Contact, &["contact"]),
    (ClientField::Email, &["email"]),
    (ClientField::Phone, &["phone"]),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlertField {
    Id,
    AlertType,
    Title,
    ClientId,
    ClientName,
    Description,
    Impact,
    Priority,
    Due,
    ActionLabel,
    ActionRoute,
    Details,
}

pub const ALERT_FIELD_MAP: &[(AlertField, &[&str])] = &[
    (AlertField::Id, &["id"]),
    (AlertField::AlertType, &["alert_type", "alertType", "type"]),
    (AlertField::Title, &["title"]),
    (AlertField::ClientId, &["client_id", "clientId"]),
    (AlertField::ClientName, &["client_name", "clientName"]),
    (AlertField::Description, &["description"]),
    (AlertField::Impact, &["impact", "impactLabel"]),
    (AlertField::Priority, &["priority"]),
    (AlertField::Due, &["due_date", "dueDate"]),
    (AlertField::ActionLabel, &["action_label", "actionLabel"]),
    (AlertField::ActionRoute, &["action_route", "actionRoute"]),
    (AlertField::Details, &["details", "detailText"]),
];

pub fn client_aliases(field: ClientField) -> &'static [&'static str] {
    CLIENT_FIELD_MAP
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

pub fn alert_aliases(field: AlertField) -> &'static [&'static str] {
    ALERT_FIELD_MAP
        .iter()
        .find(|(candidate, _)| *candidate == field)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

/// Builds a fully populated client record. Never fails.
pub fn normalize_client(raw: &RawRecord) -> ClientRecord {
    let license_count = client_count(raw, ClientField::LicenseCount);
    let user_count = client_count(raw, ClientField::UserCount);
    let active_user_count = client_decimal(raw, ClientField::ActiveUserCount)
        .map(to_count)
        .unwrap_or(user_count);

    let churn_risk_percent = match client_decimal(raw, ClientField::ChurnRiskPercent) {
        Some(percent) => percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED),
        None => normalize_churn_risk(
            client_decimal(raw, ClientField::ChurnProbability).unwrap_or(Decimal::ZERO),
        ),
    };
    let churn_risk_level =
        client_level(raw).unwrap_or_else(|| classify_risk(churn_risk_percent));

    ClientRecord {
        id: ClientId(client_text(raw, ClientField::Id).unwrap_or_default()),
        client_code: client_text(raw, ClientField::ClientCode).unwrap_or_default(),
        name: client_text(raw, ClientField::Name).unwrap_or_else(|| DEFAULT_NAME.to_string()),
        industry: client_text(raw, ClientField::Industry)
            .unwrap_or_else(|| DEFAULT_INDUSTRY.to_string()),
        status: client_text(raw, ClientField::Status)
            .map(|status| ClientStatus::parse_lenient(&status))
            .unwrap_or_default(),
        license_count,
        user_count,
        active_user_count,
        monthly_revenue: client_money(raw, ClientField::MonthlyRevenue),
        contract_value: client_money(raw, ClientField::ContractValue),
        health_score: client_decimal(raw, ClientField::HealthScore)
            .map(clamp_health_score)
            .unwrap_or(0),
        churn_risk_percent,
        churn_risk_level,
        utilization_rate: utilization(user_count, license_count),
        contact: client_text(raw, ClientField::Contact)
            .unwrap_or_else(|| DEFAULT_CONTACT.to_string()),
        email: client_text(raw, ClientField::Email).unwrap_or_else(|| DEFAULT_EMAIL.to_string()),
        phone: client_text(raw, ClientField::Phone).unwrap_or_else(|| DEFAULT_PHONE.to_string()),
    }
}

pub fn normalize_clients(raw: &[RawRecord]) -> Vec<ClientRecord> {
    raw.iter().map(normalize_client).collect()
}

pub fn normalize_alert(raw: &RawRecord) -> AlertRecord {
    let text = |field: AlertField| first_text(raw, alert_aliases(field)).unwrap_or_default();

    AlertRecord {
        id: text(AlertField::Id),
        alert_type: first_text(raw, alert_aliases(AlertField::AlertType))
            .and_then(|value| AlertType::parse(&value))
            .unwrap_or(AlertType::Warning),
        title: text(AlertField::Title),
        client_id: text(AlertField::ClientId),
        client_name: text(AlertField::ClientName),
        description: text(AlertField::Description),
        impact_label: text(AlertField::Impact),
        priority: first_text(raw, alert_aliases(AlertField::Priority))
            .and_then(|value| Priority::parse(&value))
            .unwrap_or(Priority::Medium),
        due_label: text(AlertField::Due),
        action_label: text(AlertField::ActionLabel),
        action_route: text(AlertField::ActionRoute),
        detail_text: text(AlertField::Details),
    }
}

impl ClientRecord {
    /// Canonical raw form; normalizing it again yields an identical record.
    pub fn to_raw(&self) -> RawRecord {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => RawRecord::new(),
        }
    }
}

pub fn client_text(raw: &RawRecord, field: ClientField) -> Option<String> {
    first_text(raw, client_aliases(field))
}

pub fn client_decimal(raw: &RawRecord, field: ClientField) -> Option<Decimal> {
    first_nonzero_decimal(raw, client_aliases(field))
}

fn client_count(raw: &RawRecord, field: ClientField) -> u32 {
    client_decimal(raw, field).map(to_count).unwrap_or(0)
}

fn client_money(raw: &RawRecord, field: ClientField) -> Decimal {
    client_decimal(raw, field).map(|value| value.max(Decimal::ZERO)).unwrap_or(Decimal::ZERO)
}

fn client_level(raw: &RawRecord) -> Option<ChurnRiskLevel> {
    client_aliases(ClientField::ChurnRiskLevel)
        .iter()
        .filter_map(|alias| raw.get(*alias).and_then(Value::as_str))
        .find_map(ChurnRiskLevel::parse)
}

fn to_count(value: Decimal) -> u32 {
    if value <= Decimal::ZERO {
        return 0;
    }
    round_half_up(value, 0).to_u32().unwrap_or(u32::MAX)
}

fn first_text(raw: &RawRecord, aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| match raw.get(*alias)? {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    })
}

fn first_nonzero_decimal(raw: &RawRecord, aliases: &[&str]) -> Option<Decimal> {
    aliases
        .iter()
        .filter_map(|alias| raw.get(*alias).and_then(parse_decimal))
        .find(|value| !value.is_zero())
}

/// Parses JSON numbers and numeric strings; anything else is unusable.
pub fn parse_decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    if text.is_empty() {
        return None;
    }
    Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)).ok()
}

//! Demo portfolio used to seed the in-memory and SQL stores.
//!
//! Rows deliberately mix the snake_case API shape with the camelCase cached
//! shape so that every seeded store exercises the normalizer.

use serde_json::{json, Value};

use pulseops_core::normalize::RawRecord;

use crate::connection::DbPool;
use crate::stores::sql::{insert_alert_row, insert_client_row};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub clients: usize,
    pub alerts: usize,
}

fn object(value: Value) -> Option<RawRecord> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

pub fn demo_clients() -> Vec<RawRecord> {
    [
        json!({
            "id": 1, "client_id": "CL0001", "name": "TechCorp Inc", "industry": "Technology",
            "total_licenses": 100, "total_users": 125, "monthly_spend": "12500.00",
            "contract_value": "150000.00", "health_score": "62", "churn_probability": "0.78",
            "churn_risk": "high", "contact": "Dana Whitfield", "email": "it@techcorp.example",
            "phone": "555-0101", "status": "Active"
        }),
        json!({
            "id": 2, "client_id": "CL0002", "name": "Acme Solutions", "industry": "Manufacturing",
            "total_licenses": 50, "total_users": 45, "monthly_spend": "5400.00",
            "contract_value": "64800.00", "health_score": "91", "churn_probability": "0.12",
            "churn_risk": "low", "contact": "Priya Raman", "email": "ops@acme.example",
            "phone": "555-0102", "status": "Active"
        }),
        json!({
            "id": 3, "clientId": "CL0003", "name": "CloudPeak Inc", "industry": "Software",
            "licenses": 80, "employees": 38, "revenue": 7200, "contractValue": 86400,
            "healthScore": 48, "churnRisk": 72, "churnRiskLevel": "high",
            "contact": "Marcus Ode", "email": "admin@cloudpeak.example", "status": "Active"
        }),
        json!({
            "id": 4, "client_id": "CL0004", "name": "Velocity Partners", "industry": "Finance",
            "total_licenses": 40, "total_users": 33, "monthly_spend": "3900.00",
            "contract_value": "46800.00", "health_score": "74", "churn_probability": "0.45",
            "churn_risk": "medium", "contact": "Elena Fischer", "email": "it@velocity.example",
            "phone": "555-0104", "status": "Active"
        }),
        json!({
            "id": 5, "clientId": "CL0005", "name": "RetailMax Corp", "industry": "Retail",
            "licenses": 150, "employees": 82, "revenue": 9100, "contractValue": 109200,
            "healthScore": 55, "churnProbability": 0.81,
            "contact": "Sam Oyelaran", "email": "support@retailmax.example", "status": "Active"
        }),
        json!({
            "id": 6, "client_id": "CL0006", "name": "Pinnacle Industries", "industry": "Healthcare",
            "total_licenses": 60, "total_users": 58, "monthly_spend": "6800.00",
            "contract_value": "81600.00", "health_score": "86", "churn_probability": "0.18",
            "churn_risk": "low", "contact": "Grace Lindqvist", "email": "it@pinnacle.example",
            "phone": "555-0106", "status": "Active"
        }),
        json!({
            "id": 7, "client_id": "CL0007", "name": "WaveDriver Inc", "industry": "Logistics",
            "total_licenses": 45, "total_users": 12, "monthly_spend": "2100.00",
            "contract_value": "25200.00", "health_score": "41", "churn_probability": "0.66",
            "churn_risk": "medium", "contact": "Tomasz Bielski", "email": "ops@wavedriver.example",
            "status": "Inactive"
        }),
        json!({
            "id": 8, "clientId": "CL0008", "name": "Northwind Traders", "industry": "Retail",
            "licenses": 25, "employees": 24, "revenue": "1850", "healthScore": 83,
            "churnRisk": 0.09, "status": "active"
        }),
    ]
    .into_iter()
    .filter_map(object)
    .collect()
}

pub fn demo_alerts() -> Vec<RawRecord> {
    [
        json!({
            "id": 1, "alert_type": "critical", "title": "License Over-Deployment",
            "client_id": "CL0001", "client_name": "TechCorp Inc",
            "description": "125 active users on 100 purchased licenses",
            "impact": "Compliance exposure", "priority": "Critical", "due_date": "Today",
            "action_label": "Review Licenses", "action_route": "/msp/licenses",
            "details": "True-up required before the next billing cycle.", "status": "active"
        }),
        json!({
            "id": 2, "alert_type": "warning", "title": "Churn Risk Rising",
            "client_id": "CL0005", "client_name": "RetailMax Corp",
            "description": "Utilization fell below 55% for two consecutive months",
            "impact": "$109K annual contract", "priority": "High", "due_date": "3 days",
            "action_label": "Schedule Call", "action_route": "/msp/clients/5",
            "details": "Book a business review with the IT lead.", "status": "active"
        }),
        json!({
            "id": 3, "alertType": "usage", "title": "Declining Usage Pattern",
            "clientId": "CL0007", "clientName": "WaveDriver Inc",
            "description": "Only 12 of 45 seats active", "priority": "medium",
            "dueDate": "14 days", "status": "resolved"
        }),
    ]
    .into_iter()
    .filter_map(object)
    .collect()
}

/// Inserts the demo portfolio as-is, keeping the stored health and churn
/// values rather than recalculating them.
pub async fn load(pool: &DbPool) -> Result<SeedSummary, sqlx::Error> {
    let mut transaction = pool.begin().await?;
    sqlx::query("DELETE FROM alerts").execute(&mut *transaction).await?;
    sqlx::query("DELETE FROM clients").execute(&mut *transaction).await?;

    let clients = demo_clients();
    for client in &clients {
        insert_client_row(&mut *transaction, client).await?;
    }
    let alerts = demo_alerts();
    for alert in &alerts {
        insert_alert_row(&mut *transaction, alert).await?;
    }
    transaction.commit().await?;

    Ok(SeedSummary { clients: clients.len(), alerts: alerts.len() })
}

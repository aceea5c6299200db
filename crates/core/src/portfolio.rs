//! Risk cohorts and portfolio aggregates over normalized clients.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::client::{ChurnRiskLevel, ClientId, ClientRecord};
use crate::metrics::{round_half_up, HIGH_RISK_THRESHOLD};

pub const TOP_RISK_LIMIT: usize = 5;

/// High risk means either the level says so or the percent crosses the band.
pub fn is_high_risk(record: &ClientRecord) -> bool {
    record.churn_risk_level == ChurnRiskLevel::High
        || record.churn_risk_percent > Decimal::from(HIGH_RISK_THRESHOLD)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskCohorts {
    pub active: Vec<ClientRecord>,
    /// Active clients at high risk, highest churn first.
    pub high_risk: Vec<ClientRecord>,
    pub inactive: Vec<ClientRecord>,
}

impl RiskCohorts {
    pub fn from_records(records: &[ClientRecord]) -> Self {
        let active: Vec<ClientRecord> =
            records.iter().filter(|record| record.is_active()).cloned().collect();
        let inactive = records.iter().filter(|record| record.is_inactive()).cloned().collect();

        let mut high_risk: Vec<ClientRecord> =
            active.iter().filter(|record| is_high_risk(record)).cloned().collect();
        // sort_by is stable, so equal churn keeps input order
        high_risk.sort_by(|left, right| right.churn_risk_percent.cmp(&left.churn_risk_percent));

        Self { active, high_risk, inactive }
    }

    /// Expected monthly revenue loss across the high-risk cohort.
    pub fn revenue_at_risk(&self) -> Decimal {
        self.high_risk
            .iter()
            .map(|record| {
                record.monthly_revenue * record.churn_risk_percent / Decimal::ONE_HUNDRED
            })
            .sum()
    }

    pub fn license_summary(&self) -> LicenseSummary {
        LicenseSummary::from_active(&self.active)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopClient {
    pub id: ClientId,
    pub name: String,
    pub license_count: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseSummary {
    pub total_licenses: u64,
    pub average_licenses: u64,
    pub top_client: Option<TopClient>,
}

impl LicenseSummary {
    pub fn from_active(active: &[ClientRecord]) -> Self {
        let total_licenses: u64 = active.iter().map(|record| u64::from(record.license_count)).sum();
        let average_licenses = if active.is_empty() {
            0
        } else {
            let average = Decimal::from(total_licenses) / Decimal::from(active.len());
            round_half_up(average, 0).to_u64().unwrap_or(0)
        };

        // strict greater-than from a zero seed: first maximum wins, all-zero has none
        let top_client = active
            .iter()
            .fold(None::<&ClientRecord>, |best, record| {
                let best_count = best.map(|client| client.license_count).unwrap_or(0);
                if record.license_count > best_count {
                    Some(record)
                } else {
                    best
                }
            })
            .map(|record| TopClient {
                id: record.id.clone(),
                name: record.name.clone(),
                license_count: record.license_count,
            });

        Self { total_licenses, average_licenses, top_client }
    }
}

/// Numbers behind the MSP overview panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_clients: usize,
    pub active_clients: usize,
    pub inactive_clients: usize,
    pub high_risk_clients: usize,
    pub monthly_recurring_revenue: Decimal,
    pub average_health_score: Decimal,
    pub revenue_at_risk: Decimal,
    pub licenses: LicenseSummary,
    pub top_risks: Vec<ClientRecord>,
}

impl PortfolioSummary {
    pub fn from_records(records: &[ClientRecord]) -> Self {
        let cohorts = RiskCohorts::from_records(records);
        let monthly_recurring_revenue =
            cohorts.active.iter().map(|record| record.monthly_revenue).sum();
        let average_health_score = if cohorts.active.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal =
                cohorts.active.iter().map(|record| Decimal::from(record.health_score)).sum();
            round_half_up(total / Decimal::from(cohorts.active.len()), 1)
        };

        Self {
            total_clients: records.len(),
            active_clients: cohorts.active.len(),
            inactive_clients: cohorts.inactive.len(),
            high_risk_clients: cohorts.high_risk.len(),
            monthly_recurring_revenue,
            average_health_score,
            revenue_at_risk: cohorts.revenue_at_risk(),
            licenses: cohorts.license_summary(),
            top_risks: cohorts.high_risk.iter().take(TOP_RISK_LIMIT).cloned().collect(),
        }
    }
}

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
}

impl ClientStatus {
    /// Anything other than a case-insensitive `inactive` counts as active.
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("inactive") {
            Self::Inactive
        } else {
            Self::Active
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChurnRiskLevel {
    Low,
    Medium,
    High,
}

impl ChurnRiskLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Canonical client shape produced by the normalizer.
///
/// Serialized field names are the primary aliases of the normalizer's mapping
/// table, so a serialized record can be fed back through normalization and
/// comes out unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: ClientId,
    #[serde(rename = "client_id")]
    pub client_code: String,
    pub name: String,
    pub industry: String,
    pub status: ClientStatus,
    #[serde(rename = "total_licenses")]
    pub license_count: u32,
    #[serde(rename = "total_users")]
    pub user_count: u32,
    #[serde(rename = "active_users")]
    pub active_user_count: u32,
    #[serde(rename = "monthly_spend")]
    pub monthly_revenue: Decimal,
    pub contract_value: Decimal,
    pub health_score: u8,
    pub churn_risk_percent: Decimal,
    #[serde(rename = "churn_risk")]
    pub churn_risk_level: ChurnRiskLevel,
    pub utilization_rate: u32,
    pub contact: String,
    pub email: String,
    pub phone: String,
}

impl ClientRecord {
    pub fn is_active(&self) -> bool {
        self.status == ClientStatus::Active
    }

    pub fn is_inactive(&self) -> bool {
        self.status == ClientStatus::Inactive
    }

    pub fn annual_revenue(&self) -> Decimal {
        self.monthly_revenue * Decimal::from(12)
    }
}

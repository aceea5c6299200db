//! Rule-based health and churn estimators.
//!
//! The bundled stores run these on create and update so that records carry
//! the same recalculated fields a live backend would return.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::client::{ChurnRiskLevel, ClientRecord};
use crate::metrics::{classify_risk, normalize_churn_risk, round_half_up};
use crate::normalize::{client_decimal, ClientField, RawRecord};

pub const DEFAULT_CHURN_HEALTH: i64 = 50;
const MAX_CHURN_RECOMMENDATIONS: usize = 5;

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

/// `pct(15)` is 0.15.
fn pct(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoringInputs {
    pub license_count: Decimal,
    pub user_count: Decimal,
    pub monthly_spend: Decimal,
    pub contract_value: Decimal,
}

impl ScoringInputs {
    pub fn from_raw(raw: &RawRecord) -> Self {
        let read = |field| client_decimal(raw, field).unwrap_or(Decimal::ZERO);
        Self {
            license_count: read(ClientField::LicenseCount),
            user_count: read(ClientField::UserCount),
            monthly_spend: read(ClientField::MonthlyRevenue),
            contract_value: read(ClientField::ContractValue),
        }
    }

    pub fn from_record(record: &ClientRecord) -> Self {
        Self {
            license_count: Decimal::from(record.license_count),
            user_count: Decimal::from(record.user_count),
            monthly_spend: record.monthly_revenue,
            contract_value: record.contract_value,
        }
    }

    fn utilization_percent(&self) -> Decimal {
        if self.license_count > Decimal::ZERO {
            self.user_count / self.license_count * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    fn spend_per_license(&self) -> Decimal {
        if self.license_count > Decimal::ZERO {
            self.monthly_spend / self.license_count
        } else {
            Decimal::ZERO
        }
    }
}

/// 0-100 score from utilization (40), spend level (30) and contract alignment
/// (30). `None` unless both licenses and spend are positive.
pub fn basic_health_score(inputs: &ScoringInputs) -> Option<Decimal> {
    if inputs.license_count <= Decimal::ZERO || inputs.monthly_spend <= Decimal::ZERO {
        return None;
    }

    let utilization = inputs.utilization_percent();
    let utilization_points = if utilization >= dec(70) && utilization <= dec(90) {
        dec(40)
    } else if (utilization >= dec(60) && utilization < dec(70))
        || (utilization > dec(90) && utilization <= dec(95))
    {
        dec(35)
    } else if utilization > dec(95) {
        dec(30)
    } else {
        (utilization * Decimal::new(4, 1)).max(Decimal::ZERO)
    };

    let spend = inputs.monthly_spend;
    let spend_points = if spend >= dec(5000) {
        dec(30)
    } else if spend >= dec(2000) {
        dec(25)
    } else if spend >= dec(1000) {
        dec(20)
    } else {
        (spend / dec(1000) * dec(20)).max(Decimal::ZERO)
    };

    let contract_points = if inputs.contract_value > Decimal::ZERO {
        let ratio = spend * dec(12) / inputs.contract_value;
        if ratio >= pct(80) && ratio <= pct(120) {
            dec(30)
        } else if (ratio >= pct(60) && ratio < pct(80)) || (ratio > pct(120) && ratio <= pct(150))
        {
            dec(20)
        } else {
            dec(10)
        }
    } else {
        dec(15)
    };

    let total = utilization_points + spend_points + contract_points;
    Some(round_half_up(total.min(Decimal::ONE_HUNDRED), 1))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorSeverity {
    Medium,
    High,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub factor: String,
    pub severity: FactorSeverity,
    pub description: String,
}

impl RiskFactor {
    fn new(factor: &str, severity: FactorSeverity, description: String) -> Self {
        Self { factor: factor.to_string(), severity, description }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnEstimate {
    /// Fraction in `[0.05, 0.95]`.
    pub probability: Decimal,
    pub level: ChurnRiskLevel,
    pub factors: Vec<RiskFactor>,
    pub recommendations: Vec<String>,
}

/// Starts at 0.5 and moves with utilization, spend per license, health and
/// total spend.
pub fn estimate_churn(inputs: &ScoringInputs, health_score: Decimal) -> ChurnEstimate {
    let utilization = inputs.utilization_percent();
    let spend_per_license = inputs.spend_per_license();
    let spend = inputs.monthly_spend;
    let mut probability = pct(50);
    let mut factors = Vec::new();

    if utilization < dec(40) {
        probability += pct(25);
        factors.push(RiskFactor::new(
            "Low utilization",
            FactorSeverity::High,
            format!("Only {utilization:.1}% license utilization (very low)"),
        ));
    } else if utilization < dec(60) {
        probability += pct(15);
        factors.push(RiskFactor::new(
            "Below average utilization",
            FactorSeverity::Medium,
            format!("{utilization:.1}% license utilization"),
        ));
    } else if utilization > dec(95) {
        probability += pct(10);
        factors.push(RiskFactor::new(
            "Over-utilization",
            FactorSeverity::Medium,
            format!("{utilization:.1}% license utilization (may need more licenses)"),
        ));
    } else if utilization >= dec(70) && utilization <= dec(90) {
        probability -= pct(15);
    }

    if spend_per_license < dec(10) {
        probability += pct(20);
        factors.push(RiskFactor::new(
            "Very low spend per license",
            FactorSeverity::High,
            format!("Only ${spend_per_license:.2} per license per month"),
        ));
    } else if spend_per_license < dec(20) {
        probability += pct(10);
        factors.push(RiskFactor::new(
            "Low spend per license",
            FactorSeverity::Medium,
            format!("${spend_per_license:.2} per license per month"),
        ));
    } else if spend_per_license >= dec(30) {
        probability -= pct(10);
    }

    if health_score < dec(50) {
        probability += pct(20);
        factors.push(RiskFactor::new(
            "Poor health score",
            FactorSeverity::High,
            format!("Health score of {health_score:.1} indicates serious issues"),
        ));
    } else if health_score < dec(70) {
        probability += pct(10);
        factors.push(RiskFactor::new(
            "Fair health score",
            FactorSeverity::Medium,
            format!("Health score of {health_score:.1} needs improvement"),
        ));
    } else if health_score >= dec(85) {
        probability -= pct(15);
    }

    if spend < dec(500) {
        probability += pct(10);
        factors.push(RiskFactor::new(
            "Low total revenue",
            FactorSeverity::Medium,
            format!("Only ${spend:.2} monthly revenue"),
        ));
    } else if spend >= dec(5000) {
        probability -= pct(10);
    }

    let probability = probability.clamp(pct(5), pct(95));
    let level = classify_risk(normalize_churn_risk(probability));

    let recommendations = churn_recommendations(level, utilization, health_score, spend);
    ChurnEstimate { probability, level, factors, recommendations }
}

fn churn_recommendations(
    level: ChurnRiskLevel,
    utilization: Decimal,
    health_score: Decimal,
    spend: Decimal,
) -> Vec<String> {
    let mut recommendations: Vec<&str> = Vec::new();

    match level {
        ChurnRiskLevel::High => recommendations.extend([
            "URGENT: Schedule immediate retention call",
            "Review and address all pain points",
            "Consider offering special incentives or discounts",
        ]),
        ChurnRiskLevel::Medium => recommendations.extend([
            "Proactive check-in within 2 weeks",
            "Assess satisfaction and identify improvement areas",
        ]),
        ChurnRiskLevel::Low => {}
    }

    if utilization < dec(50) {
        recommendations.extend([
            "Investigate why licenses are underutilized",
            "Offer training to increase user adoption",
        ]);
    } else if utilization > dec(95) {
        recommendations.push("Discuss license expansion opportunities");
    }

    if health_score < dec(70) {
        recommendations.extend([
            "Focus on improving health metrics",
            "Increase support and engagement touchpoints",
        ]);
    }

    if spend < dec(1000) {
        recommendations
            .extend(["Explore upsell opportunities", "Demonstrate additional value features"]);
    }

    recommendations.into_iter().take(MAX_CHURN_RECOMMENDATIONS).map(str::to_string).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecalcTrigger {
    Create,
    /// Carries the health score the edit supplied, if any.
    Update { manual_health: Option<Decimal> },
}

/// Rewrites the derived fields of a merged store record in place.
///
/// A positive manual health score on update suppresses recalculation. On
/// create the churn estimate always runs, using 50 when no health score is
/// known.
pub fn recalculate(merged: &mut RawRecord, trigger: RecalcTrigger) {
    let inputs = ScoringInputs::from_raw(merged);
    let existing_health = client_decimal(merged, ClientField::HealthScore);

    let health_for_churn = match trigger {
        RecalcTrigger::Create => {
            let health = match existing_health.filter(|score| *score > Decimal::ZERO) {
                Some(manual) => Some(manual),
                None => basic_health_score(&inputs),
            };
            set_health(merged, health);
            health.unwrap_or(dec(DEFAULT_CHURN_HEALTH))
        }
        RecalcTrigger::Update { manual_health } => {
            if manual_health.is_some_and(|score| score > Decimal::ZERO) {
                return;
            }
            match basic_health_score(&inputs) {
                Some(computed) => {
                    set_health(merged, Some(computed));
                    computed
                }
                None => existing_health.unwrap_or(dec(DEFAULT_CHURN_HEALTH)),
            }
        }
    };

    let estimate = estimate_churn(&inputs, health_for_churn);
    for alias in ["churn_risk_percent", "churnProbability", "churnRisk", "churnRiskLevel"] {
        merged.remove(alias);
    }
    merged.insert("churn_probability".into(), Value::from(estimate.probability.to_string()));
    merged.insert("churn_risk".into(), Value::from(estimate.level.as_str()));
}

fn set_health(merged: &mut RawRecord, health: Option<Decimal>) {
    merged.remove("healthScore");
    match health {
        Some(score) => merged.insert("health_score".into(), Value::from(score.to_string())),
        None => merged.insert("health_score".into(), Value::Null),
    };
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use super::{
        basic_health_score, estimate_churn, recalculate, RecalcTrigger, ScoringInputs,
    };
    use crate::domain::client::ChurnRiskLevel;
    use crate::metrics::{classify_risk, risk_color, StatusColor};
    use crate::normalize::{normalize_client, RawRecord};

    fn inputs(licenses: i64, users: i64, spend: i64, contract: i64) -> ScoringInputs {
        ScoringInputs {
            license_count: Decimal::from(licenses),
            user_count: Decimal::from(users),
            monthly_spend: Decimal::from(spend),
            contract_value: Decimal::from(contract),
        }
    }

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn health_score_needs_licenses_and_spend() {
        assert_eq!(basic_health_score(&inputs(0, 10, 1000, 0)), None);
        assert_eq!(basic_health_score(&inputs(10, 10, 0, 0)), None);
    }

    #[test]
    fn well_aligned_enterprise_client_scores_full_marks() {
        assert_eq!(basic_health_score(&inputs(100, 80, 5000, 60_000)), Some(Decimal::from(100)));
    }

    #[test]
    fn missing_contract_earns_partial_credit() {
        assert_eq!(basic_health_score(&inputs(100, 80, 5000, 0)), Some(Decimal::from(85)));
    }

    #[test]
    fn weak_client_scores_proportionally() {
        assert_eq!(basic_health_score(&inputs(100, 20, 500, 0)), Some(Decimal::from(33)));
        assert_eq!(basic_health_score(&inputs(100, 65, 2000, 10_000)), Some(Decimal::from(70)));
    }

    #[test]
    fn healthy_enterprise_client_clamps_to_floor() {
        let estimate = estimate_churn(&inputs(100, 80, 5000, 0), Decimal::from(90));

        assert_eq!(estimate.probability, Decimal::new(5, 2));
        assert_eq!(estimate.level, ChurnRiskLevel::Low);
        assert!(estimate.factors.is_empty());
        assert!(estimate.recommendations.is_empty());
    }

    #[test]
    fn struggling_client_clamps_to_ceiling_with_factors() {
        let estimate = estimate_churn(&inputs(100, 30, 800, 0), Decimal::from(40));

        assert_eq!(estimate.probability, Decimal::new(95, 2));
        assert_eq!(estimate.level, ChurnRiskLevel::High);
        assert_eq!(estimate.factors.len(), 3);
        assert_eq!(estimate.factors[0].description, "Only 30.0% license utilization (very low)");
        assert_eq!(estimate.factors[1].description, "Only $8.00 per license per month");
        assert_eq!(estimate.recommendations.len(), 5);
        assert_eq!(estimate.recommendations[0], "URGENT: Schedule immediate retention call");
    }

    #[test]
    fn utilization_band_moves_probability() {
        let estimate = estimate_churn(&inputs(100, 50, 2500, 0), Decimal::from(75));

        assert_eq!(estimate.probability, Decimal::new(65, 2));
        assert_eq!(estimate.level, ChurnRiskLevel::Medium);

        let estimate = estimate_churn(&inputs(100, 65, 2500, 0), Decimal::from(75));
        assert_eq!(estimate.probability, Decimal::new(50, 2));
        assert_eq!(estimate.level, ChurnRiskLevel::Medium);
    }

    #[test]
    fn create_computes_health_and_churn() {
        let mut record = raw(json!({
            "name": "Fresh Co", "total_licenses": 100, "total_users": 80, "monthly_spend": 5000
        }));

        recalculate(&mut record, RecalcTrigger::Create);
        let client = normalize_client(&record);

        assert_eq!(client.health_score, 85);
        assert_eq!(client.churn_risk_percent, Decimal::from(5));
        assert_eq!(client.churn_risk_level, ChurnRiskLevel::Low);
    }

    #[test]
    fn stored_level_agrees_with_portfolio_thresholds() {
        let mut record = raw(json!({
            "total_licenses": 100, "total_users": 50, "monthly_spend": 2500, "health_score": 75
        }));

        recalculate(&mut record, RecalcTrigger::Create);
        let client = normalize_client(&record);

        assert_eq!(client.churn_risk_percent, Decimal::from(65));
        assert_eq!(record.get("churn_risk"), Some(&Value::from("medium")));
        assert_eq!(client.churn_risk_level, classify_risk(client.churn_risk_percent));
        assert_eq!(risk_color(client.churn_risk_percent), StatusColor::Warning);
    }

    #[test]
    fn create_keeps_manual_health_score() {
        let mut record = raw(json!({
            "total_licenses": 100, "total_users": 80, "monthly_spend": 5000, "health_score": 42
        }));

        recalculate(&mut record, RecalcTrigger::Create);

        assert_eq!(normalize_client(&record).health_score, 42);
    }

    #[test]
    fn create_without_usage_data_uses_neutral_health_for_churn() {
        let mut record = raw(json!({ "name": "Empty Co" }));

        recalculate(&mut record, RecalcTrigger::Create);
        let client = normalize_client(&record);

        assert_eq!(record.get("health_score"), Some(&Value::Null));
        assert_eq!(client.health_score, 0);
        assert_eq!(client.churn_risk_percent, Decimal::from(95));
    }

    #[test]
    fn update_with_manual_health_leaves_record_alone() {
        let mut record = raw(json!({
            "total_licenses": 100, "total_users": 10, "monthly_spend": 100,
            "health_score": 90, "churn_probability": 0.1
        }));
        let before = record.clone();

        recalculate(
            &mut record,
            RecalcTrigger::Update { manual_health: Some(Decimal::from(90)) },
        );

        assert_eq!(record, before);
    }

    #[test]
    fn update_without_manual_health_recomputes() {
        let mut record = raw(json!({
            "total_licenses": 100, "total_users": 80, "monthly_spend": 5000,
            "health_score": 20, "churnProbability": 0.9
        }));

        recalculate(&mut record, RecalcTrigger::Update { manual_health: None });
        let client = normalize_client(&record);

        assert_eq!(client.health_score, 85);
        assert_eq!(client.churn_risk_level, ChurnRiskLevel::Low);
        assert!(!record.contains_key("churnProbability"));
    }
}

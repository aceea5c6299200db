//! Derived client metrics: utilization, churn normalization, risk bands and
//! health coloring.
//!
//! One canonical threshold table is used for every caller:
//! churn risk is `high` above 70 and `medium` above 40; health is `success`
//! from 80 and `warning` from 60.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::client::ChurnRiskLevel;

pub const HIGH_RISK_THRESHOLD: u32 = 70;
pub const MEDIUM_RISK_THRESHOLD: u32 = 40;
pub const HEALTHY_SCORE_THRESHOLD: u8 = 80;
pub const WATCH_SCORE_THRESHOLD: u8 = 60;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Success,
    Warning,
    Error,
}

/// Rounds half away from zero, matching how the dashboards display whole
/// percentages.
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole-number utilization percent; zero licenses yields zero.
pub fn utilization(user_count: u32, license_count: u32) -> u32 {
    if license_count == 0 {
        return 0;
    }

    let ratio = Decimal::from(user_count) * Decimal::ONE_HUNDRED / Decimal::from(license_count);
    round_half_up(ratio, 0).to_u32().unwrap_or(u32::MAX)
}

/// Converts a raw churn value to a 0-100 percent.
///
/// Values strictly between 0 and 1 are fractions. Exactly `1` is already a
/// percent (1%). Negative input clamps to 0 and the result never exceeds 100.
pub fn normalize_churn_risk(raw: Decimal) -> Decimal {
    if raw <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let percent = if raw < Decimal::ONE { raw * Decimal::ONE_HUNDRED } else { raw };
    percent.min(Decimal::ONE_HUNDRED)
}

pub fn classify_risk(percent: Decimal) -> ChurnRiskLevel {
    if percent > Decimal::from(HIGH_RISK_THRESHOLD) {
        ChurnRiskLevel::High
    } else if percent > Decimal::from(MEDIUM_RISK_THRESHOLD) {
        ChurnRiskLevel::Medium
    } else {
        ChurnRiskLevel::Low
    }
}

pub fn health_color(score: u8) -> StatusColor {
    if score >= HEALTHY_SCORE_THRESHOLD {
        StatusColor::Success
    } else if score >= WATCH_SCORE_THRESHOLD {
        StatusColor::Warning
    } else {
        StatusColor::Error
    }
}

pub fn risk_color(percent: Decimal) -> StatusColor {
    match classify_risk(percent) {
        ChurnRiskLevel::High => StatusColor::Error,
        ChurnRiskLevel::Medium => StatusColor::Warning,
        ChurnRiskLevel::Low => StatusColor::Success,
    }
}

/// Clamps a raw health value into the 0-100 integer scale.
pub fn clamp_health_score(raw: Decimal) -> u8 {
    let clamped = round_half_up(raw, 0).clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    clamped.to_u8().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        classify_risk, clamp_health_score, health_color, normalize_churn_risk, risk_color,
        utilization, StatusColor,
    };
    use crate::domain::client::ChurnRiskLevel;

    #[test]
    fn utilization_is_zero_without_licenses() {
        assert_eq!(utilization(0, 0), 0);
        assert_eq!(utilization(125, 0), 0);
    }

    #[test]
    fn utilization_rounds_half_up() {
        assert_eq!(utilization(80, 100), 80);
        assert_eq!(utilization(1, 8), 13);
        assert_eq!(utilization(2, 3), 67);
        assert_eq!(utilization(125, 100), 125);
    }

    #[test]
    fn fractional_churn_values_become_percentages() {
        assert_eq!(normalize_churn_risk(Decimal::new(805, 3)), Decimal::new(805, 1));
        assert_eq!(normalize_churn_risk(Decimal::new(5, 1)), Decimal::from(50));
        assert_eq!(normalize_churn_risk(Decimal::new(1, 2)), Decimal::ONE);
    }

    #[test]
    fn percent_churn_values_pass_through() {
        assert_eq!(normalize_churn_risk(Decimal::ZERO), Decimal::ZERO);
        assert_eq!(normalize_churn_risk(Decimal::ONE), Decimal::ONE);
        assert_eq!(normalize_churn_risk(Decimal::from(80)), Decimal::from(80));
        assert_eq!(normalize_churn_risk(Decimal::from(100)), Decimal::from(100));
    }

    #[test]
    fn out_of_range_churn_values_are_clamped() {
        assert_eq!(normalize_churn_risk(Decimal::from(-15)), Decimal::ZERO);
        assert_eq!(normalize_churn_risk(Decimal::new(-5, 1)), Decimal::ZERO);
        assert_eq!(normalize_churn_risk(Decimal::from(250)), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn risk_bands_are_exclusive_on_the_upper_side() {
        assert_eq!(classify_risk(Decimal::from(71)), ChurnRiskLevel::High);
        assert_eq!(classify_risk(Decimal::from(70)), ChurnRiskLevel::Medium);
        assert_eq!(classify_risk(Decimal::from(41)), ChurnRiskLevel::Medium);
        assert_eq!(classify_risk(Decimal::from(40)), ChurnRiskLevel::Low);
        assert_eq!(classify_risk(Decimal::new(701, 1)), ChurnRiskLevel::High);
    }

    #[test]
    fn health_color_uses_single_threshold_table() {
        assert_eq!(health_color(100), StatusColor::Success);
        assert_eq!(health_color(80), StatusColor::Success);
        assert_eq!(health_color(79), StatusColor::Warning);
        assert_eq!(health_color(60), StatusColor::Warning);
        assert_eq!(health_color(59), StatusColor::Error);
        assert_eq!(health_color(0), StatusColor::Error);
    }

    #[test]
    fn risk_color_tracks_risk_bands() {
        assert_eq!(risk_color(Decimal::from(85)), StatusColor::Error);
        assert_eq!(risk_color(Decimal::from(55)), StatusColor::Warning);
        assert_eq!(risk_color(Decimal::from(12)), StatusColor::Success);
    }

    #[test]
    fn health_scores_clamp_into_scale() {
        assert_eq!(clamp_health_score(Decimal::new(875, 1)), 88);
        assert_eq!(clamp_health_score(Decimal::from(-3)), 0);
        assert_eq!(clamp_health_score(Decimal::from(140)), 100);
    }
}

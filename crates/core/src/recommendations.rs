//! Threshold rules that turn one client into a short action list.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::alert::Priority;
use crate::domain::client::ClientRecord;
use crate::format::format_number;
use crate::metrics::{round_half_up, HIGH_RISK_THRESHOLD, MEDIUM_RISK_THRESHOLD};

pub const MAX_RECOMMENDATIONS: usize = 4;

const HEALTH_ATTENTION_BELOW: u8 = 70;
const UTILIZATION_TARGET: u32 = 80;
const EXPANSION_HEALTH_ABOVE: u8 = 85;
const EXPANSION_CHURN_BELOW: u32 = 30;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Rule slot, 1 through 9.
    pub id: u8,
    pub priority: Priority,
    pub title: String,
    pub impact: String,
    pub description: String,
}

impl Recommendation {
    fn new(
        id: u8,
        priority: Priority,
        title: &str,
        impact: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            priority,
            title: title.to_string(),
            impact: impact.into(),
            description: description.into(),
        }
    }
}

/// Rules are evaluated in order and every match appends; the list is then cut
/// to `MAX_RECOMMENDATIONS`.
pub fn synthesize(client: &ClientRecord) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    let churn = client.churn_risk_percent;
    let annual_revenue = format_number(client.annual_revenue());

    if churn > Decimal::from(HIGH_RISK_THRESHOLD) {
        recommendations.push(Recommendation::new(
            1,
            Priority::Critical,
            "Immediate Intervention Required",
            format!("Prevent ${annual_revenue} annual revenue loss"),
            format!(
                "This client has a {}% churn probability. Schedule executive review within 24 hours.",
                churn.normalize()
            ),
        ));
        recommendations.push(Recommendation::new(
            2,
            Priority::High,
            "Schedule Success Call",
            "Reduce churn risk by 25%",
            "Book a quarterly business review to understand pain points and demonstrate value.",
        ));
    } else if churn > Decimal::from(MEDIUM_RISK_THRESHOLD) {
        recommendations.push(Recommendation::new(
            1,
            Priority::High,
            "Proactive Engagement",
            format!("Protect ${annual_revenue} annual revenue"),
            format!(
                "Monitor closely - {}% churn risk detected. Schedule check-in call.",
                churn.normalize()
            ),
        ));
    }

    if client.health_score < HEALTH_ATTENTION_BELOW {
        recommendations.push(Recommendation::new(
            3,
            Priority::High,
            "Improve Client Health Score",
            "Increase retention by 40%",
            format!(
                "Current health score is {}%. Focus on usage adoption and support response times.",
                client.health_score
            ),
        ));
    }

    if client.utilization_rate < UTILIZATION_TARGET {
        recommendations.push(Recommendation::new(
            4,
            Priority::Medium,
            "License Optimization Opportunity",
            format!("Save ${}/month", whole_amount(client.monthly_revenue, Decimal::new(15, 2))),
            format!(
                "Only {}% license utilization. Consider rightsizing or training programs.",
                client.utilization_rate
            ),
        ));
    }

    if Decimal::from(client.active_user_count) < Decimal::from(client.user_count) * Decimal::new(8, 1)
    {
        recommendations.push(Recommendation::new(
            5,
            Priority::Medium,
            "User Adoption Training",
            "Increase active users by 30%",
            format!(
                "{} employees not actively using services. Offer training sessions.",
                client.user_count.saturating_sub(client.active_user_count)
            ),
        ));
    }

    if client.health_score > EXPANSION_HEALTH_ABOVE
        && churn < Decimal::from(EXPANSION_CHURN_BELOW)
    {
        recommendations.push(Recommendation::new(
            6,
            Priority::Low,
            "Expansion Opportunity",
            format!(
                "Potential ${}/month increase",
                whole_amount(client.monthly_revenue, Decimal::new(3, 1))
            ),
            "High satisfaction client - ideal for upselling additional services or licenses.",
        ));
    }

    if recommendations.is_empty() {
        recommendations = fallback_recommendations(client);
    }

    recommendations.truncate(MAX_RECOMMENDATIONS);
    recommendations
}

/// Generic guidance for a client on which no threshold rule fired.
pub fn fallback_recommendations(client: &ClientRecord) -> Vec<Recommendation> {
    vec![
        Recommendation::new(
            7,
            Priority::Medium,
            "Regular Health Check",
            "Maintain 95%+ retention rate",
            "Schedule quarterly review to ensure continued satisfaction and identify growth opportunities.",
        ),
        Recommendation::new(
            8,
            Priority::Low,
            "Optimize License Allocation",
            format!(
                "Potential ${}/month savings",
                whole_amount(client.monthly_revenue, Decimal::new(1, 1))
            ),
            format!(
                "Review current {} licenses for optimization opportunities and ensure efficient usage.",
                client.license_count
            ),
        ),
        Recommendation::new(
            9,
            Priority::Low,
            "Enhanced Support Services",
            "Improve satisfaction by 20%",
            "Offer premium support tier to enhance service experience and strengthen relationship.",
        ),
    ]
}

fn whole_amount(revenue: Decimal, share: Decimal) -> String {
    format_number(round_half_up(revenue * share, 0))
}

//! Alert feed assembly with the built-in demo alert set.

use serde::{Deserialize, Serialize};

use crate::domain::alert::{AlertRecord, AlertType, Priority};
use crate::normalize::{normalize_alert, RawRecord};
use crate::store::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSource {
    Live,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertFeed {
    pub source: AlertSource,
    pub alerts: Vec<AlertRecord>,
}

impl AlertFeed {
    /// Live alerts when the collaborator answered with at least one record,
    /// otherwise the demo set.
    pub fn resolve(result: Result<Vec<RawRecord>, StoreError>) -> Self {
        match result {
            Ok(raw) if !raw.is_empty() => Self {
                source: AlertSource::Live,
                alerts: raw.iter().map(normalize_alert).collect(),
            },
            _ => Self::fallback(),
        }
    }

    pub fn fallback() -> Self {
        Self { source: AlertSource::Fallback, alerts: fallback_alerts() }
    }
}

struct AlertSeed {
    alert_type: AlertType,
    title: &'static str,
    client_name: &'static str,
    client_id: u32,
    description: &'static str,
    impact: &'static str,
    action_label: &'static str,
    action_route: &'static str,
    due: &'static str,
    priority: Priority,
    details: &'static str,
}

const FALLBACK_ALERTS: [AlertSeed; 7] = [
    AlertSeed {
        alert_type: AlertType::Critical,
        title: "License Compliance Issue",
        client_name: "TechCorp Inc",
        client_id: 1,
        description: "Over-deployed licenses detected: 125 active users with only 100 licenses",
        impact: "Compliance Risk",
        action_label: "Review License Usage",
        action_route: "/msp/licenses?client=TC001",
        due: "2 days",
        priority: Priority::Critical,
        details: "Navigate to Active Licenses page to review license allocation and usage patterns",
    },
    AlertSeed {
        alert_type: AlertType::Warning,
        title: "Security Update Required",
        client_name: "Acme Solutions",
        client_id: 21,
        description: "Critical security patches pending for 15+ workstations",
        impact: "Security Vulnerability",
        action_label: "Schedule Maintenance",
        action_route: "/msp/clients/21",
        due: "5 days",
        priority: Priority::High,
        details: "View client details to schedule maintenance window and apply security patches",
    },
    AlertSeed {
        alert_type: AlertType::Action,
        title: "Contract Renewal Due",
        client_name: "CloudPeak Inc",
        client_id: 4,
        description: "Annual contract expires in 30 days - $182,400 ARR at risk",
        impact: "$182K Revenue Risk",
        action_label: "Contact for Renewal",
        action_route: "/msp/clients/4",
        due: "30 days",
        priority: Priority::High,
        details: "Open client profile to review contract details and initiate renewal process",
    },
    AlertSeed {
        alert_type: AlertType::Support,
        title: "High Support Ticket Volume",
        client_name: "Velocity Partners",
        client_id: 5,
        description: "12 open tickets (40% increase) - possible training gap or product issue",
        impact: "Client Satisfaction Risk",
        action_label: "Schedule Review Call",
        action_route: "/msp/clients/5",
        due: "7 days",
        priority: Priority::Medium,
        details: "Access client dashboard to analyze ticket trends and schedule follow-up call",
    },
    AlertSeed {
        alert_type: AlertType::Usage,
        title: "Declining Usage Pattern",
        client_name: "RetailMax Corp",
        client_id: 23,
        description: "User activity down 45% over last 60 days - potential churn indicator",
        impact: "Churn Risk",
        action_label: "Engagement Check-in",
        action_route: "/msp/clients/23",
        due: "14 days",
        priority: Priority::Medium,
        details: "Review client health metrics and usage analytics to identify engagement issues",
    },
    AlertSeed {
        alert_type: AlertType::Critical,
        title: "Payment Overdue",
        client_name: "Pinnacle Industries",
        client_id: 17,
        description: "Invoice #3421 overdue by 15 days - $8,500 outstanding",
        impact: "Cash Flow Risk",
        action_label: "Follow Up Payment",
        action_route: "/msp/clients/17",
        due: "Overdue",
        priority: Priority::Critical,
        details: "Contact client for payment collection and review account status",
    },
    AlertSeed {
        alert_type: AlertType::Warning,
        title: "License Expiration Pending",
        client_name: "WaveDriver Inc",
        client_id: 10,
        description: "Microsoft 365 licenses expiring in 10 days for 45 users",
        impact: "Service Disruption Risk",
        action_label: "Renew Licenses",
        action_route: "/msp/licenses",
        due: "10 days",
        priority: Priority::High,
        details: "Process license renewal to avoid service interruption",
    },
];

/// The seven demo alerts shown when no live alerts are available.
pub fn fallback_alerts() -> Vec<AlertRecord> {
    FALLBACK_ALERTS
        .iter()
        .zip(1..)
        .map(|(seed, id): (&AlertSeed, u32)| AlertRecord {
            id: id.to_string(),
            alert_type: seed.alert_type,
            title: seed.title.to_string(),
            client_id: seed.client_id.to_string(),
            client_name: seed.client_name.to_string(),
            description: seed.description.to_string(),
            impact_label: seed.impact.to_string(),
            priority: seed.priority,
            due_label: seed.due.to_string(),
            action_label: seed.action_label.to_string(),
            action_route: seed.action_route.to_string(),
            detail_text: seed.details.to_string(),
        })
        .collect()
}

//! Keyword FAQ assistant for the dashboards.
//!
//! Matching runs in three passes: a direct keyword hit in table order, then
//! the first fuzzy group whose trigger words appear, then the role fallback.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::domain::session::DashboardRole;

pub const MAX_SUGGESTIONS: usize = 3;

type Faq = (&'static str, &'static str);

const MSP_FAQS: &[Faq] = &[
    ("client health", "Client health scores are calculated based on multiple factors: license utilization (40%), support ticket volume (25%), payment history (20%), and usage trends (15%). A score above 80 is considered healthy."),
    ("churn risk", "Churn risk is determined by analyzing declining usage patterns, low engagement scores, overdue payments, and high support ticket volumes. Critical clients with scores above 70% need immediate attention."),
    ("license compliance", "License compliance issues occur when active users exceed purchased licenses. Review the Active Licenses page to identify over-deployed clients and take corrective action."),
    ("revenue tracking", "Track revenue through the Revenue & License Trend chart. Filter by year and month to analyze growth patterns. Monthly recurring revenue (MRR) is calculated from all active client subscriptions."),
    ("priority alerts", "Priority Alerts highlight critical issues requiring immediate MSP admin attention: license compliance, security updates, contract renewals, payment issues, and declining usage patterns."),
    ("contract renewal", "Contract renewals should be initiated 30-45 days before expiration. Review client satisfaction scores and usage patterns before renewal discussions to ensure value delivery."),
    ("support tickets", "High support ticket volumes may indicate training gaps or product issues. Schedule review calls with clients showing 40%+ increases in ticket volume."),
    ("client onboarding", "New client onboarding includes: account setup, license provisioning, initial training, support channel setup, and baseline metric establishment. Average onboarding takes 7-14 days."),
    ("dashboard metrics", "The MSP dashboard shows: total active licenses, monthly recurring revenue, average health score, and priority alerts. All metrics update in real-time from the database."),
    ("license expiration", "License expiration alerts appear 10-15 days before renewal dates. Process renewals promptly to avoid service disruptions for your clients."),
];

const IT_FAQS: &[Faq] = &[
    ("software usage", "Software usage analytics track application access frequency, active users, and feature utilization. Data helps optimize license allocation and identify underutilized applications."),
    ("license optimization", "License optimization involves identifying unused licenses, right-sizing subscriptions, and reallocating licenses to active users. Can reduce costs by 15-30%."),
    ("user activity", "User activity monitoring tracks login frequency, session duration, and feature usage. Helps identify training needs and potential security concerns."),
    ("cost analysis", "Software cost analysis breaks down expenses by category, department, and user. Use insights to negotiate better contracts and eliminate redundant tools."),
    ("compliance check", "Compliance checks ensure software usage aligns with license agreements. Regular audits prevent over-deployment penalties and legal issues."),
    ("renewal schedule", "Renewal schedules track all software license expiration dates. Set alerts 30+ days before renewals to review necessity and negotiate pricing."),
    ("vendor management", "Vendor management centralizes all software provider relationships, contracts, and support contacts. Streamlines communication and improves service delivery."),
    ("security updates", "Security updates should be applied within 48 hours for critical patches. Schedule maintenance windows during low-usage periods to minimize disruption."),
    ("training resources", "Access training resources through the Help section. Includes video tutorials, documentation, and best practices for software management."),
    ("reporting", "Generate custom reports for software usage, costs, compliance, and user activity. Export data in CSV, PDF, or Excel formats for stakeholder presentations."),
];

const MSP_QUESTIONS: &[&str] = &[
    "How is client health calculated?",
    "What causes high churn risk?",
    "How do I track revenue trends?",
    "What are priority alerts?",
    "How to handle license compliance issues?",
    "When should I renew contracts?",
    "How to reduce support tickets?",
    "What indicates a healthy client?",
];

const IT_QUESTIONS: &[&str] = &[
    "How to optimize software licenses?",
    "What is usage tracking?",
    "How to check compliance status?",
    "How can I reduce software costs?",
    "What are renewal schedules?",
    "How to analyze user activity?",
    "What security updates are needed?",
    "How to generate reports?",
];

struct FuzzyGroup {
    triggers: &'static [&'static str],
    keys: &'static [&'static str],
    fallback: Option<&'static str>,
}

const FUZZY_GROUPS: &[FuzzyGroup] = &[
    FuzzyGroup { triggers: &["health", "score"], keys: &["client health", "software usage"], fallback: None },
    FuzzyGroup {
        triggers: &["risk", "churn"],
        keys: &["churn risk"],
        fallback: Some("Churn risk is calculated based on usage trends, engagement metrics, and payment history."),
    },
    FuzzyGroup { triggers: &["license", "compliance"], keys: &["license compliance", "license optimization"], fallback: None },
    FuzzyGroup { triggers: &["revenue", "cost", "money"], keys: &["revenue tracking", "cost analysis"], fallback: None },
    FuzzyGroup { triggers: &["alert", "notification"], keys: &["priority alerts", "notifications"], fallback: None },
    FuzzyGroup { triggers: &["support", "help", "ticket"], keys: &["support tickets", "support"], fallback: None },
    FuzzyGroup { triggers: &["renewal", "contract", "expir"], keys: &["contract renewal", "renewal schedule"], fallback: None },
    FuzzyGroup { triggers: &["user", "activity", "usage"], keys: &["user activity", "software usage"], fallback: None },
    FuzzyGroup { triggers: &["dashboard", "metric"], keys: &["dashboard metrics", "reporting"], fallback: None },
    FuzzyGroup { triggers: &["start", "begin", "first"], keys: &["get started"], fallback: None },
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Direct,
    Fuzzy,
    Fallback,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqAnswer {
    pub kind: MatchKind,
    pub text: String,
}

#[derive(Clone, Copy, Debug)]
pub struct FaqAssistant {
    role: DashboardRole,
    faqs: &'static [Faq],
    questions: &'static [&'static str],
}

impl FaqAssistant {
    pub fn for_role(role: DashboardRole) -> Self {
        match role {
            DashboardRole::Msp => Self { role, faqs: MSP_FAQS, questions: MSP_QUESTIONS },
            DashboardRole::ItAdmin => Self { role, faqs: IT_FAQS, questions: IT_QUESTIONS },
        }
    }

    pub fn role(&self) -> DashboardRole {
        self.role
    }

    pub fn welcome(&self) -> &'static str {
        match self.role {
            DashboardRole::Msp => {
                "Ask me anything about managing clients, licenses, and revenue."
            }
            DashboardRole::ItAdmin => {
                "Ask me anything about software usage, license optimization, and compliance."
            }
        }
    }

    pub fn answer(&self, question: &str) -> FaqAnswer {
        let question = question.to_lowercase();

        if let Some((_, answer)) = self.faqs.iter().find(|(key, _)| question.contains(key)) {
            return FaqAnswer { kind: MatchKind::Direct, text: (*answer).to_string() };
        }

        let group = FUZZY_GROUPS
            .iter()
            .find(|group| group.triggers.iter().any(|trigger| question.contains(trigger)));
        if let Some(group) = group {
            let text = group.keys.iter().find_map(|key| self.lookup(key)).or(group.fallback);
            if let Some(text) = text {
                return FaqAnswer { kind: MatchKind::Fuzzy, text: text.to_string() };
            }
        }

        FaqAnswer { kind: MatchKind::Fallback, text: self.fallback_message() }
    }

    pub fn fallback_message(&self) -> String {
        let topics = match self.role {
            DashboardRole::Msp => "MSP management topics like client health, churn risk, license compliance, revenue tracking, priority alerts, contract renewals, support tickets, and client onboarding",
            DashboardRole::ItAdmin => "IT management topics like software usage, license optimization, user activity, cost analysis, compliance checks, renewal schedules, vendor management, security updates, and reporting",
        };
        format!(
            "I can only answer questions about {topics}. Please ask a question related to your {} dashboard.",
            self.role.label()
        )
    }

    pub fn suggested_questions(&self) -> &'static [&'static str] {
        self.questions
    }

    /// Up to three suggested questions containing the typed text.
    pub fn suggest(&self, input: &str) -> Vec<&'static str> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.questions
            .iter()
            .copied()
            .filter(|question| question.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .collect()
    }

    /// Three distinct suggested questions in random order.
    pub fn rotated_questions<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&'static str> {
        self.questions.choose_multiple(rng, MAX_SUGGESTIONS).copied().collect()
    }

    /// `rotated_questions` drawn from the thread-local generator.
    pub fn featured_questions(&self) -> Vec<&'static str> {
        self.rotated_questions(&mut rand::thread_rng())
    }

    fn lookup(&self, key: &str) -> Option<&'static str> {
        self.faqs.iter().find(|(candidate, _)| *candidate == key).map(|(_, answer)| *answer)
    }
}

use pulseops_core::alerts::{AlertFeed, AlertSource};
use pulseops_core::config::LoadOptions;
use pulseops_core::dashboard::DashboardService;
use pulseops_core::domain::alert::AlertStatus;
use pulseops_core::format::{format_currency, format_number};
use pulseops_core::portfolio::PortfolioSummary;
use pulseops_db::open_store;
use serde_json::json;

use crate::commands::{load_config, runtime, CommandResult};

/// Prints the MSP overview for the configured store.
pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let config = match load_config("report", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("report") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let store = open_store(&config)
            .await
            .map_err(|error| ("store_open", error.to_string(), 4u8))?;
        let service = DashboardService::new(store);
        let summary = service
            .msp_overview()
            .await
            .map_err(|error| ("store_unavailable", error.to_string(), 7u8))?;
        let feed = service.alerts(AlertStatus::Active).await;
        Ok::<(PortfolioSummary, AlertFeed), (&'static str, String, u8)>((summary, feed))
    });

    let (summary, feed) = match result {
        Ok(report) => report,
        Err((error_class, message, exit_code)) => {
            return CommandResult::failure("report", error_class, message, exit_code)
        }
    };

    if json_output {
        let data = json!({
            "backend": config.store.backend.as_str(),
            "summary": summary,
            "alerts": feed,
        });
        return CommandResult::success_with_data(
            "report",
            format!("{} clients in portfolio", summary.total_clients),
            Some(data),
        );
    }

    CommandResult::text(0, render_human(&summary, &feed))
}

fn render_human(summary: &PortfolioSummary, feed: &AlertFeed) -> String {
    let mut lines = vec![
        format!(
            "clients: {} total, {} active, {} inactive",
            summary.total_clients, summary.active_clients, summary.inactive_clients
        ),
        format!("monthly recurring revenue: {}", format_currency(summary.monthly_recurring_revenue)),
        format!("average health score: {}", format_number(summary.average_health_score)),
        format!(
            "high risk: {} clients, {} revenue at risk",
            summary.high_risk_clients,
            format_currency(summary.revenue_at_risk)
        ),
        format!(
            "licenses: {} total, {} average per active client",
            summary.licenses.total_licenses, summary.licenses.average_licenses
        ),
    ];

    if let Some(top) = &summary.licenses.top_client {
        lines.push(format!("top client: {} ({} licenses)", top.name, top.license_count));
    }

    if !summary.top_risks.is_empty() {
        lines.push("top risks:".to_string());
        for client in &summary.top_risks {
            lines.push(format!(
                "- {} {}% churn, health {}",
                client.name,
                format_number(client.churn_risk_percent),
                client.health_score
            ));
        }
    }

    let source = match feed.source {
        AlertSource::Live => "live",
        AlertSource::Fallback => "demo",
    };
    lines.push(format!("alerts ({source}): {}", feed.alerts.len()));
    for alert in &feed.alerts {
        lines.push(format!("- [{}] {}", alert.priority.as_str(), alert.title));
    }

    lines.join("\n")
}

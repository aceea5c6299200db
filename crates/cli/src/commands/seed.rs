use crate::commands::{load_config, runtime, CommandResult};
use pulseops_core::config::LoadOptions;
use pulseops_db::{connect_from_config, fixtures, migrations, SeedSummary};
use serde_json::json;

/// Replaces the database contents with the demo portfolio.
pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("seed", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let result = runtime.block_on(async {
        let pool = connect_from_config(&config.database)
            .await
            .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        let summary = fixtures::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<SeedSummary, (&'static str, String, u8)>(summary)
    });

    match result {
        Ok(summary) => CommandResult::success_with_data(
            "seed",
            seed_message(summary),
            Some(json!({ "clients": summary.clients, "alerts": summary.alerts })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

fn seed_message(summary: SeedSummary) -> String {
    format!(
        "demo portfolio loaded: {} clients, {} alerts",
        summary.clients, summary.alerts
    )
}

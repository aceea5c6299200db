use std::env;
use std::sync::{Mutex, OnceLock};

use pulseops_cli::commands::{ask, doctor, migrate, report, seed};
use pulseops_core::config::LoadOptions;
use serde_json::Value;

#[test]
fn migrate_returns_success_with_in_memory_database() {
    with_env(&[("PULSEOPS_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
        assert!(payload.get("data").is_none());
    });
}

#[test]
fn migrate_returns_config_failure_for_unknown_backend() {
    with_env(&[("PULSEOPS_STORE_BACKEND", "spreadsheet")], || {
        let result = migrate::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn seed_reports_loaded_portfolio_counts() {
    with_env(&[("PULSEOPS_DATABASE_URL", "sqlite::memory:")], || {
        let result = seed::run(&LoadOptions::default());
        assert_eq!(result.exit_code, 0, "expected seed success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "seed");
        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["data"]["clients"], 8);
        assert_eq!(payload["data"]["alerts"], 3);
    });
}

#[test]
fn report_json_summarizes_memory_portfolio() {
    with_env(&[("PULSEOPS_STORE_BACKEND", "memory")], || {
        let result = report::run(&LoadOptions::default(), true);
        assert_eq!(result.exit_code, 0, "expected report success");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "report");
        assert_eq!(payload["data"]["backend"], "memory");
        assert_eq!(payload["data"]["summary"]["total_clients"], 8);
        assert_eq!(payload["data"]["summary"]["inactive_clients"], 1);
        assert_eq!(payload["data"]["alerts"]["source"], "live");
        assert_eq!(payload["data"]["alerts"]["alerts"].as_array().map(Vec::len), Some(2));
    });
}

#[test]
fn report_human_output_lists_portfolio_counts() {
    with_env(&[], || {
        let result = report::run(&LoadOptions::default(), false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("clients: 8 total, 7 active, 1 inactive"));
        assert!(result.output.contains("alerts (live): 2"));
    });
}

#[test]
fn doctor_passes_with_database_backend() {
    with_env(
        &[("PULSEOPS_STORE_BACKEND", "database"), ("PULSEOPS_DATABASE_URL", "sqlite::memory:")],
        || {
            let result = doctor::run(&LoadOptions::default(), true);
            assert_eq!(result.exit_code, 0, "doctor output: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["overall_status"], "pass");
            let checks = payload["checks"].as_array().expect("checks array");
            assert_eq!(checks.len(), 3);
            assert_eq!(checks[1]["name"], "database_connectivity");
            assert_eq!(checks[1]["status"], "pass");
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[("PULSEOPS_LOGGING_LEVEL", "chatty")], || {
        let result = doctor::run(&LoadOptions::default(), true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][1]["status"], "skipped");
        assert_eq!(payload["checks"][2]["status"], "skipped");
    });
}

#[test]
fn ask_answers_with_direct_match() {
    let result = ask::run("msp", "Tell me about CHURN RISK and client health");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["role"], "msp");
    assert_eq!(payload["data"]["kind"], "direct");
    assert!(payload["message"]
        .as_str()
        .is_some_and(|message| message.starts_with("Client health scores are calculated")));
}

#[test]
fn ask_without_question_returns_welcome_and_suggestions() {
    let result = ask::run("it", "   ");
    assert_eq!(result.exit_code, 0);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["data"]["role"], "it_admin");
    assert_eq!(payload["data"]["suggestions"].as_array().map(Vec::len), Some(8));
    assert_eq!(payload["data"]["featured"].as_array().map(Vec::len), Some(3));
}

#[test]
fn ask_rejects_unknown_role() {
    let result = ask::run("finance", "what is churn?");
    assert_eq!(result.exit_code, 2);

    let payload = parse_payload(&result.output);
    assert_eq!(payload["error_class"], "invalid_role");
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "PULSEOPS_STORE_BACKEND",
        "PULSEOPS_DATABASE_URL",
        "PULSEOPS_DATABASE_MAX_CONNECTIONS",
        "PULSEOPS_DATABASE_TIMEOUT_SECS",
        "PULSEOPS_API_BASE_URL",
        "PULSEOPS_API_TOKEN",
        "PULSEOPS_API_TIMEOUT_SECS",
        "PULSEOPS_SERVER_BIND_ADDRESS",
        "PULSEOPS_SERVER_PORT",
        "PULSEOPS_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "PULSEOPS_SESSION_IDLE_TIMEOUT_SECS",
        "PULSEOPS_LOGGING_LEVEL",
        "PULSEOPS_LOGGING_FORMAT",
        "PULSEOPS_LOG_LEVEL",
        "PULSEOPS_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}

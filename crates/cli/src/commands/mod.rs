pub mod availability;
pub mod config;
pub mod doctor;
pub mod seed;
pub mod slots;

use anyhow::Context;
use chrono::NaiveDate;
use clinicdesk_core::config::{AppConfig, LoadOptions};
use clinicdesk_core::fixtures::load_demo;
use clinicdesk_core::{ApplicationError, ClinicSession};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    correlation_id: Option<String>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            correlation_id: None,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            correlation_id: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    /// Renders a core failure through its interface mapping. Domain errors exit
    /// with 4 and keep their class. Configuration errors exit with 2.
    pub fn application_failure(
        command: &str,
        error: impl Into<ApplicationError>,
        correlation_id: &str,
    ) -> Self {
        let error = error.into();
        let (error_class, exit_code) = match &error {
            ApplicationError::Domain(domain) => (domain.class(), 4),
            ApplicationError::Configuration(_) => ("config_validation", 2),
        };
        let interface = error.into_interface(correlation_id);
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: interface.to_string(),
            correlation_id: Some(interface.correlation_id().to_string()),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// Correlation id for failures raised outside a session.
fn standalone_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default())
        .map_err(|error| {
            CommandResult::application_failure(command, error, &standalone_correlation_id())
        })
}

fn parse_date(command: &str, raw: &str) -> Result<NaiveDate, CommandResult> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|error| {
        CommandResult::failure(
            command,
            "invalid_input",
            format!("`{raw}` is not a YYYY-MM-DD date: {error}"),
            3,
        )
    })
}

/// Fresh session over the configured schedule with the dashboard's sample appointments loaded.
fn demo_session(config: &AppConfig) -> anyhow::Result<ClinicSession> {
    let mut session = ClinicSession::new(config.schedule.clone());
    load_demo(session.store_mut()).context("failed to load demo appointments")?;
    Ok(session)
}

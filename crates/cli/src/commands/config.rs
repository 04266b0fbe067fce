use std::env;
use std::fs;
use std::path::Path;

use clinicdesk_core::config::{discover_config_path, weekday_key};
use clinicdesk_core::domain::schedule::DayHours;
use toml::Value;

use crate::commands::{load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("config") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let config_file_path = discover_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let schedule = &config.schedule;
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "schedule.appointment_duration_mins",
        &schedule.appointment_duration_mins.to_string(),
        source("schedule.appointment_duration_mins", &["CLINICDESK_APPOINTMENT_DURATION_MINS"]),
    ));
    lines.push(render_line(
        "schedule.buffer_time_mins",
        &schedule.buffer_time_mins.to_string(),
        source("schedule.buffer_time_mins", &["CLINICDESK_BUFFER_TIME_MINS"]),
    ));
    lines.push(render_line(
        "schedule.max_advance_booking_days",
        &schedule.max_advance_booking_days.to_string(),
        source("schedule.max_advance_booking_days", &["CLINICDESK_MAX_ADVANCE_BOOKING_DAYS"]),
    ));

    for (weekday, hours) in schedule.working_hours.iter() {
        let key = format!("schedule.working_hours.{}", weekday_key(weekday));
        lines.push(render_line(&key, &render_hours(hours), source(&key, &[])));
    }

    let breaks = if schedule.breaks.is_empty() {
        "<none>".to_string()
    } else {
        schedule
            .breaks
            .iter()
            .map(|window| format!("{} {} - {}", window.label, window.start, window.end))
            .collect::<Vec<_>>()
            .join(", ")
    };
    lines.push(render_line("schedule.breaks", &breaks, source("schedule.breaks", &[])));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", &["CLINICDESK_LOGGING_LEVEL", "CLINICDESK_LOG_LEVEL"]),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["CLINICDESK_LOGGING_FORMAT", "CLINICDESK_LOG_FORMAT"]),
    ));

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn render_hours(hours: &DayHours) -> String {
    if hours.enabled {
        format!("{} - {}", hours.start, hours.end)
    } else {
        "closed".to_string()
    }
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};
    use toml::Value;

    #[test]
    fn nested_weekday_keys_resolve_to_file_source() {
        let doc: Value = "[schedule.working_hours.sunday]\nenabled = true\n"
            .parse()
            .expect("valid toml");

        assert!(contains_path(&doc, "schedule.working_hours.sunday"));
        assert!(!contains_path(&doc, "schedule.working_hours.monday"));
        assert_eq!(
            field_source("schedule.working_hours.sunday", &[], Some(&doc), None),
            "file (config file)"
        );
        assert_eq!(field_source("schedule.breaks", &[], Some(&doc), None), "default");
    }
}

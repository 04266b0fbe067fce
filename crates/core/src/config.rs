use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::schedule::{BreakWindow, ClinicSchedule, DayHours, SlotTime};

pub const APPOINTMENT_DURATION_OPTIONS: [u32; 4] = [15, 30, 45, 60];
pub const BUFFER_TIME_OPTIONS: [u32; 4] = [0, 5, 10, 15];
pub const MAX_ADVANCE_BOOKING_OPTIONS: [u32; 4] = [7, 14, 30, 60];

#[derive(Clone, Debug, Default)]
pub struct AppConfig {
    pub schedule: ClinicSchedule,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub appointment_duration_mins: Option<u32>,
    pub buffer_time_mins: Option<u32>,
    pub max_advance_booking_days: Option<u32>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("clinicdesk.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(schedule) = patch.schedule {
            if let Some(duration) = schedule.appointment_duration_mins {
                self.schedule.appointment_duration_mins = duration;
            }
            if let Some(buffer) = schedule.buffer_time_mins {
                self.schedule.buffer_time_mins = buffer;
            }
            if let Some(days) = schedule.max_advance_booking_days {
                self.schedule.max_advance_booking_days = days;
            }

            for (day_key, day_patch) in schedule.working_hours.unwrap_or_default() {
                let weekday = day_key.parse::<Weekday>().map_err(|_| {
                    ConfigError::Validation(format!(
                        "schedule.working_hours.{day_key} is not a weekday name"
                    ))
                })?;
                let current = self.schedule.hours_for(weekday).clone();
                let key = format!("schedule.working_hours.{day_key}");
                let hours = DayHours {
                    enabled: day_patch.enabled.unwrap_or(current.enabled),
                    start: parse_time_field(&format!("{key}.start"), day_patch.start)?
                        .unwrap_or(current.start),
                    end: parse_time_field(&format!("{key}.end"), day_patch.end)?
                        .unwrap_or(current.end),
                };
                self.schedule.working_hours.set(weekday, hours);
            }

            if let Some(breaks) = schedule.breaks {
                self.schedule.breaks = breaks
                    .into_iter()
                    .enumerate()
                    .map(|(index, window)| {
                        let key = format!("schedule.breaks[{index}]");
                        Ok(BreakWindow {
                            label: window.label.unwrap_or_else(|| "Break".to_string()),
                            start: parse_time(&format!("{key}.start"), &window.start)?,
                            end: parse_time(&format!("{key}.end"), &window.end)?,
                        })
                    })
                    .collect::<Result<Vec<_>, ConfigError>>()?;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CLINICDESK_APPOINTMENT_DURATION_MINS") {
            self.schedule.appointment_duration_mins =
                parse_u32("CLINICDESK_APPOINTMENT_DURATION_MINS", &value)?;
        }
        if let Some(value) = read_env("CLINICDESK_BUFFER_TIME_MINS") {
            self.schedule.buffer_time_mins = parse_u32("CLINICDESK_BUFFER_TIME_MINS", &value)?;
        }
        if let Some(value) = read_env("CLINICDESK_MAX_ADVANCE_BOOKING_DAYS") {
            self.schedule.max_advance_booking_days =
                parse_u32("CLINICDESK_MAX_ADVANCE_BOOKING_DAYS", &value)?;
        }

        let log_level =
            read_env("CLINICDESK_LOGGING_LEVEL").or_else(|| read_env("CLINICDESK_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CLINICDESK_LOGGING_FORMAT").or_else(|| read_env("CLINICDESK_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(duration) = overrides.appointment_duration_mins {
            self.schedule.appointment_duration_mins = duration;
        }
        if let Some(buffer) = overrides.buffer_time_mins {
            self.schedule.buffer_time_mins = buffer;
        }
        if let Some(days) = overrides.max_advance_booking_days {
            self.schedule.max_advance_booking_days = days;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_schedule(&self.schedule)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// The config file `AppConfig::load` would pick up when no explicit path is given.
pub fn discover_config_path() -> Option<PathBuf> {
    resolve_config_path(None)
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("clinicdesk.toml"), PathBuf::from("config/clinicdesk.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

/// Checks a schedule against the settings options and basic time ordering.
pub fn validate_schedule(schedule: &ClinicSchedule) -> Result<(), ConfigError> {
    if !APPOINTMENT_DURATION_OPTIONS.contains(&schedule.appointment_duration_mins) {
        return Err(ConfigError::Validation(format!(
            "schedule.appointment_duration_mins must be one of {APPOINTMENT_DURATION_OPTIONS:?}, got {}",
            schedule.appointment_duration_mins
        )));
    }

    if !BUFFER_TIME_OPTIONS.contains(&schedule.buffer_time_mins) {
        return Err(ConfigError::Validation(format!(
            "schedule.buffer_time_mins must be one of {BUFFER_TIME_OPTIONS:?}, got {}",
            schedule.buffer_time_mins
        )));
    }

    if !MAX_ADVANCE_BOOKING_OPTIONS.contains(&schedule.max_advance_booking_days) {
        return Err(ConfigError::Validation(format!(
            "schedule.max_advance_booking_days must be one of {MAX_ADVANCE_BOOKING_OPTIONS:?}, got {}",
            schedule.max_advance_booking_days
        )));
    }

    for (weekday, hours) in schedule.working_hours.iter() {
        if hours.enabled && hours.start >= hours.end {
            return Err(ConfigError::Validation(format!(
                "schedule.working_hours.{} start {} must be before end {}",
                weekday_key(weekday),
                hours.start,
                hours.end
            )));
        }
    }

    for (index, window) in schedule.breaks.iter().enumerate() {
        if window.start >= window.end {
            return Err(ConfigError::Validation(format!(
                "schedule.breaks[{index}] (`{}`) start {} must be before end {}",
                window.label, window.start, window.end
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

fn parse_time(key: &str, value: &str) -> Result<SlotTime, ConfigError> {
    value.parse::<SlotTime>().map_err(|reason| ConfigError::Validation(format!("{key}: {reason}")))
}

fn parse_time_field(key: &str, value: Option<String>) -> Result<Option<SlotTime>, ConfigError> {
    value.map(|value| parse_time(key, &value)).transpose()
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.trim().parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    schedule: Option<SchedulePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulePatch {
    appointment_duration_mins: Option<u32>,
    buffer_time_mins: Option<u32>,
    max_advance_booking_days: Option<u32>,
    working_hours: Option<BTreeMap<String, DayHoursPatch>>,
    breaks: Option<Vec<BreakPatch>>,
}

#[derive(Debug, Default, Deserialize)]
struct DayHoursPatch {
    enabled: Option<bool>,
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BreakPatch {
    label: Option<String>,
    start: String,
    end: String,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

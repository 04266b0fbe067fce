use clinicdesk_core::config::{weekday_key, AppConfig, LoadOptions};
use clinicdesk_core::domain::schedule::{ClinicSchedule, WEEKDAYS};
use clinicdesk_core::generate_slots;
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = match report.checks.first() {
        Some(check) if check.status == CheckStatus::Fail => 2,
        _ if report.overall_status == CheckStatus::Fail => 4,
        _ => 0,
    };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_slot_generation(&config.schedule));
            checks.push(check_break_windows(&config.schedule));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["slot_generation", "break_windows"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all schedule checks passed".to_string()
    } else {
        "doctor: one or more schedule checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

/// Every enabled day must generate at least one slot.
fn check_slot_generation(schedule: &ClinicSchedule) -> DoctorCheck {
    let mut per_day = Vec::new();
    let mut problems = Vec::new();

    for weekday in WEEKDAYS {
        let hours = schedule.hours_for(weekday);
        let day = weekday_key(weekday);
        match generate_slots(hours, schedule.appointment_duration_mins, schedule.buffer_time_mins) {
            Ok(_) if !hours.enabled => per_day.push(format!("{day}: closed")),
            Ok(slots) => per_day.push(format!("{day}: {}", slots.len())),
            Err(error) => problems.push(format!("{day}: {error}")),
        }
    }

    if problems.is_empty() {
        DoctorCheck { name: "slot_generation", status: CheckStatus::Pass, details: per_day.join(", ") }
    } else {
        DoctorCheck { name: "slot_generation", status: CheckStatus::Fail, details: problems.join("; ") }
    }
}

/// A break that sits outside every enabled day's hours never masks a slot.
fn check_break_windows(schedule: &ClinicSchedule) -> DoctorCheck {
    if schedule.breaks.is_empty() {
        return DoctorCheck {
            name: "break_windows",
            status: CheckStatus::Skipped,
            details: "no break windows configured".to_string(),
        };
    }

    let stray: Vec<String> = schedule
        .breaks
        .iter()
        .filter(|window| {
            !schedule.working_hours.iter().any(|(_, hours)| {
                hours.enabled && window.overlaps(hours.start.minutes(), hours.end.minutes())
            })
        })
        .map(|window| format!("`{}` {} - {}", window.label, window.start, window.end))
        .collect();

    if stray.is_empty() {
        DoctorCheck {
            name: "break_windows",
            status: CheckStatus::Pass,
            details: format!("{} break window(s) fall within working hours", schedule.breaks.len()),
        }
    } else {
        DoctorCheck {
            name: "break_windows",
            status: CheckStatus::Fail,
            details: format!("outside every enabled day's hours: {}", stray.join(", ")),
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

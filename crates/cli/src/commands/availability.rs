use clinicdesk_core::{AvailabilityReport, SlotStatus};

use crate::commands::{demo_session, load_config, parse_date, CommandResult};

pub fn run(raw_date: &str) -> CommandResult {
    let config = match load_config("availability") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let date = match parse_date("availability", raw_date) {
        Ok(date) => date,
        Err(result) => return result,
    };

    let session = match demo_session(&config) {
        Ok(session) => session,
        Err(error) => {
            return CommandResult::failure("availability", "seed_execution", format!("{error:#}"), 4)
        }
    };

    match session.compute_availability(date) {
        Ok(report) => CommandResult::success("availability", render(&report)),
        Err(error) => {
            CommandResult::application_failure("availability", error, session.correlation_id())
        }
    }
}

fn render(report: &AvailabilityReport) -> String {
    let mut lines = vec![format!(
        "availability for {} ({}): {} free, {} booked, {} break",
        report.date,
        report.weekday,
        report.count(SlotStatus::Free),
        report.count(SlotStatus::Booked),
        report.count(SlotStatus::Break),
    )];

    for slot in &report.slots {
        let detail = match slot.status {
            SlotStatus::Free => "free".to_string(),
            SlotStatus::Booked => match &slot.appointment_id {
                Some(id) => format!("booked ({id})"),
                None => "booked".to_string(),
            },
            SlotStatus::Break => match &slot.break_label {
                Some(label) => format!("break ({label})"),
                None => "break".to_string(),
            },
        };
        lines.push(format!("  - {} {detail}", slot.time));
    }

    for appointment in &report.unscheduled {
        lines.push(format!(
            "  - unscheduled: {} {} at {} ({})",
            appointment.id, appointment.patient_name, appointment.time, appointment.status
        ));
    }

    for appointment in &report.conflicts {
        lines.push(format!(
            "  - double-booked: {} {} at {} ({})",
            appointment.id, appointment.patient_name, appointment.time, appointment.status
        ));
    }

    lines.join("\n")
}

use chrono::Datelike;
use clinicdesk_core::SlotGenerator;

use crate::commands::{load_config, parse_date, standalone_correlation_id, CommandResult};

pub fn run(raw_date: &str) -> CommandResult {
    let config = match load_config("slots") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let date = match parse_date("slots", raw_date) {
        Ok(date) => date,
        Err(result) => return result,
    };

    let templates = match SlotGenerator::new(&config.schedule).templates_for(date) {
        Ok(templates) => templates,
        Err(error) => {
            return CommandResult::application_failure("slots", error, &standalone_correlation_id())
        }
    };

    let mut lines = vec![format!("{} slots for {date} ({})", templates.len(), date.weekday())];
    lines.extend(templates.iter().map(|template| {
        let marker = if template.available { "" } else { " (break)" };
        format!("  - {}{marker}", template.time)
    }));

    CommandResult::success("slots", lines.join("\n"))
}

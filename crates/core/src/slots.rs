use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::schedule::{ClinicSchedule, DayHours, SlotTime};
use crate::errors::DomainError;

/// Derived bookable slot for a specific day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTemplate {
    pub id: String,
    pub time: SlotTime,
    pub available: bool,
}

/// Produces slot start times covering `[start, end)` at a stride of
/// `duration + buffer` minutes. A slot is emitted only while its own end
/// (`start + duration`) stays at or before the day's end. An enabled day too
/// short to hold one appointment is a configuration error.
pub fn generate_slots(
    hours: &DayHours,
    appointment_duration_mins: u32,
    buffer_time_mins: u32,
) -> Result<Vec<SlotTime>, DomainError> {
    let stride = match appointment_duration_mins.checked_add(buffer_time_mins) {
        Some(stride) if stride > 0 => stride,
        _ => {
            return Err(DomainError::Configuration(format!(
                "appointment duration plus buffer time must be a positive number of minutes, got {appointment_duration_mins} + {buffer_time_mins}"
            )))
        }
    };

    if !hours.enabled {
        return Ok(Vec::new());
    }

    let start = hours.start.minutes();
    let end = hours.end.minutes();
    if start >= end {
        return Err(DomainError::Configuration(format!(
            "working hours start {} must be before end {}",
            hours.start, hours.end
        )));
    }
    if appointment_duration_mins > end - start {
        return Err(DomainError::Configuration(format!(
            "a {appointment_duration_mins}-minute appointment does not fit between {} and {}",
            hours.start, hours.end
        )));
    }

    let mut slots = Vec::new();
    let mut cursor = start;
    loop {
        match cursor.checked_add(appointment_duration_mins) {
            Some(slot_end) if slot_end <= end => {}
            _ => break,
        }
        match SlotTime::from_minutes(cursor) {
            Some(time) => slots.push(time),
            None => break,
        }
        match cursor.checked_add(stride) {
            Some(next) => cursor = next,
            None => break,
        }
    }

    Ok(slots)
}

pub struct SlotGenerator<'a> {
    schedule: &'a ClinicSchedule,
}

impl<'a> SlotGenerator<'a> {
    pub fn new(schedule: &'a ClinicSchedule) -> Self {
        Self { schedule }
    }

    pub fn slots_for(&self, date: NaiveDate) -> Result<Vec<SlotTime>, DomainError> {
        let weekday = date.weekday();
        let slots = generate_slots(
            self.schedule.hours_for(weekday),
            self.schedule.appointment_duration_mins,
            self.schedule.buffer_time_mins,
        )?;
        debug!(
            event_name = "slots.generated",
            date = %date,
            weekday = %weekday,
            slot_count = slots.len(),
            "generated slots for date"
        );
        Ok(slots)
    }

    /// Slot templates for `date`, with `available` cleared for slots that overlap
    /// a break window. Bookings are not consulted here.
    pub fn templates_for(&self, date: NaiveDate) -> Result<Vec<SlotTemplate>, DomainError> {
        let duration = self.schedule.appointment_duration_mins;
        let templates = self
            .slots_for(date)?
            .into_iter()
            .enumerate()
            .map(|(index, time)| {
                let start = time.minutes();
                let in_break = self
                    .schedule
                    .breaks
                    .iter()
                    .any(|window| window.overlaps(start, start.saturating_add(duration)));
                SlotTemplate {
                    id: format!("slot-{}-{}", date.format("%Y%m%d"), index + 1),
                    time,
                    available: !in_break,
                }
            })
            .collect();
        Ok(templates)
    }
}

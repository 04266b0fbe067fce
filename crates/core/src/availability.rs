use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::appointment::{Appointment, AppointmentId};
use crate::domain::schedule::{ClinicSchedule, SlotTime};
use crate::errors::DomainError;
use crate::slots::SlotGenerator;
use crate::store::AppointmentStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Free,
    Booked,
    Break,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    pub time: SlotTime,
    pub status: SlotStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<AppointmentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub break_label: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub slots: Vec<SlotAvailability>,
    /// Active appointments whose time no longer lines up with a generated slot.
    pub unscheduled: Vec<Appointment>,
    /// Active appointments sharing a booked slot with an earlier appointment.
    /// The slot itself carries the earliest id.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Appointment>,
}

impl AvailabilityReport {
    pub fn status_at(&self, time: SlotTime) -> Option<SlotStatus> {
        self.slots.iter().find(|slot| slot.time == time).map(|slot| slot.status)
    }

    pub fn count(&self, status: SlotStatus) -> usize {
        self.slots.iter().filter(|slot| slot.status == status).count()
    }

    pub fn free_times(&self) -> Vec<SlotTime> {
        self.slots
            .iter()
            .filter(|slot| slot.status == SlotStatus::Free)
            .map(|slot| slot.time)
            .collect()
    }
}

pub struct AvailabilityCalculator<'a> {
    schedule: &'a ClinicSchedule,
}

impl<'a> AvailabilityCalculator<'a> {
    pub fn new(schedule: &'a ClinicSchedule) -> Self {
        Self { schedule }
    }

    /// Marks each generated slot for `date` as break, booked, or free, in that
    /// order of precedence. A break window wins over any appointment placed in it.
    pub fn compute(
        &self,
        store: &AppointmentStore,
        date: NaiveDate,
    ) -> Result<AvailabilityReport, DomainError> {
        let times = SlotGenerator::new(self.schedule).slots_for(date)?;
        let active: Vec<&Appointment> = store
            .find_by_date(date)
            .into_iter()
            .filter(|appointment| appointment.status.occupies_slot())
            .collect();
        let duration = self.schedule.appointment_duration_mins;

        let slots: Vec<SlotAvailability> = times
            .iter()
            .map(|time| {
                let (start, end) = (time.minutes(), time.minutes().saturating_add(duration));
                if let Some(window) =
                    self.schedule.breaks.iter().find(|window| window.overlaps(start, end))
                {
                    return SlotAvailability {
                        time: *time,
                        status: SlotStatus::Break,
                        appointment_id: None,
                        break_label: Some(window.label.clone()),
                    };
                }

                match active.iter().find(|appointment| appointment.time == *time) {
                    Some(appointment) => SlotAvailability {
                        time: *time,
                        status: SlotStatus::Booked,
                        appointment_id: Some(appointment.id.clone()),
                        break_label: None,
                    },
                    None => SlotAvailability {
                        time: *time,
                        status: SlotStatus::Free,
                        appointment_id: None,
                        break_label: None,
                    },
                }
            })
            .collect();

        let unscheduled: Vec<Appointment> = active
            .iter()
            .filter(|appointment| !times.contains(&appointment.time))
            .map(|appointment| (*appointment).clone())
            .collect();
        for appointment in &unscheduled {
            warn!(
                event_name = "availability.orphaned_appointment",
                appointment_id = %appointment.id,
                date = %date,
                time = %appointment.time,
                "appointment time does not match any generated slot"
            );
        }

        let conflicts: Vec<Appointment> = active
            .iter()
            .filter(|appointment| {
                slots.iter().any(|slot| {
                    slot.status == SlotStatus::Booked
                        && slot.time == appointment.time
                        && slot.appointment_id.as_ref() != Some(&appointment.id)
                })
            })
            .map(|appointment| (*appointment).clone())
            .collect();
        for appointment in &conflicts {
            warn!(
                event_name = "availability.double_booked",
                appointment_id = %appointment.id,
                date = %date,
                time = %appointment.time,
                "appointment shares its slot with an earlier booking"
            );
        }

        let report =
            AvailabilityReport { date, weekday: date.weekday(), slots, unscheduled, conflicts };
        info!(
            event_name = "availability.computed",
            date = %date,
            free = report.count(SlotStatus::Free),
            booked = report.count(SlotStatus::Booked),
            breaks = report.count(SlotStatus::Break),
            unscheduled = report.unscheduled.len(),
            conflicts = report.conflicts.len(),
            "availability computed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::{AvailabilityCalculator, SlotStatus};
    use crate::domain::appointment::{AppointmentDraft, AppointmentId, AppointmentStatus};
    use crate::domain::schedule::{ClinicSchedule, DayHours, SlotTime};
    use crate::errors::DomainError;
    use crate::store::{AppointmentStore, FixedClock};

    // Monday.
    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
    }

    fn time(label: &str) -> SlotTime {
        SlotTime::parse(label).expect("valid label")
    }

    fn store() -> AppointmentStore {
        let today = NaiveDate::from_ymd_opt(2026, 10, 16).expect("date");
        AppointmentStore::with_clock(30, FixedClock(today))
    }

    fn book(store: &mut AppointmentStore, name: &str, at: &str) -> AppointmentId {
        store
            .add(AppointmentDraft {
                patient_name: name.to_string(),
                patient_email: "patient@example.com".to_string(),
                patient_phone: "(555) 000-0000".to_string(),
                date: Some(day()),
                time: at.to_string(),
                notes: None,
            })
            .expect("valid draft")
            .id
    }

    #[test]
    fn break_wins_over_booking_in_same_slot() {
        let schedule = ClinicSchedule::default();
        let mut store = store();
        book(&mut store, "Misplaced", "12:00 PM");

        let report = AvailabilityCalculator::new(&schedule).compute(&store, day()).expect("report");
        assert_eq!(report.status_at(time("12:00")), Some(SlotStatus::Break));
        assert!(report.unscheduled.is_empty(), "12:00 is still a generated slot");
    }

    #[test]
    fn pending_and_approved_occupy_slots_but_rejected_does_not() {
        let schedule = ClinicSchedule::default();
        let mut store = store();
        book(&mut store, "Pending", "9:00 AM");
        let approved = book(&mut store, "Approved", "9:45 AM");
        let rejected = book(&mut store, "Rejected", "10:30 AM");
        store.set_status(&approved, AppointmentStatus::Approved).expect("approve");
        store.set_status(&rejected, AppointmentStatus::Rejected).expect("reject");

        let report = AvailabilityCalculator::new(&schedule).compute(&store, day()).expect("report");
        assert_eq!(report.status_at(time("9:00 AM")), Some(SlotStatus::Booked));
        assert_eq!(report.status_at(time("9:45 AM")), Some(SlotStatus::Booked));
        assert_eq!(report.status_at(time("10:30 AM")), Some(SlotStatus::Free));
        let nine = report.slots.first().expect("first slot");
        assert!(nine.appointment_id.is_some());
    }

    #[test]
    fn output_follows_generated_slot_order() {
        let schedule = ClinicSchedule::default();
        let report = AvailabilityCalculator::new(&schedule).compute(&store(), day()).expect("report");

        assert_eq!(report.weekday, Weekday::Mon);
        assert_eq!(report.slots.len(), 11);
        assert!(report.slots.windows(2).all(|pair| pair[0].time < pair[1].time));
        // 12:00 and 12:45 both overlap the lunch break.
        assert_eq!(report.count(SlotStatus::Break), 2);
        assert_eq!(report.count(SlotStatus::Free), 9);
    }

    #[test]
    fn off_grid_appointments_are_reported_as_unscheduled() {
        let schedule = ClinicSchedule::default();
        let mut store = store();
        let on_grid = book(&mut store, "Robert Johnson", "11:15 AM");
        let off_grid = book(&mut store, "Off Grid", "11:20 AM");

        let report = AvailabilityCalculator::new(&schedule).compute(&store, day()).expect("report");
        let ids: Vec<_> = report.unscheduled.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![off_grid]);
        assert_eq!(report.status_at(time("11:15 AM")), Some(SlotStatus::Booked));
        assert!(report.slots.iter().any(|slot| slot.appointment_id.as_ref() == Some(&on_grid)));
    }

    #[test]
    fn second_booking_in_a_taken_slot_is_reported_as_a_conflict() {
        let schedule = ClinicSchedule::default();
        let mut store = store();
        let first = book(&mut store, "First Patient", "9:00 AM");
        let second = book(&mut store, "Second Patient", "9:00 AM");

        let report = AvailabilityCalculator::new(&schedule).compute(&store, day()).expect("report");
        let nine = report.slots.first().expect("first slot");
        assert_eq!(nine.status, SlotStatus::Booked);
        assert_eq!(nine.appointment_id.as_ref(), Some(&first));
        let ids: Vec<_> = report.conflicts.iter().map(|a| a.id.clone()).collect();
        assert_eq!(ids, vec![second.clone()]);
        assert!(report.unscheduled.is_empty());

        store.set_status(&second, AppointmentStatus::Rejected).expect("reject");
        let report = AvailabilityCalculator::new(&schedule).compute(&store, day()).expect("report");
        assert!(report.conflicts.is_empty());
    }

    #[test]
    fn zero_length_slots_inside_lunch_are_breaks() {
        let mut schedule = ClinicSchedule::default();
        schedule.appointment_duration_mins = 0;

        let report = AvailabilityCalculator::new(&schedule).compute(&store(), day()).expect("report");
        assert_eq!(report.status_at(time("12:00 PM")), Some(SlotStatus::Break));
        assert_eq!(report.status_at(time("12:45 PM")), Some(SlotStatus::Break));
        assert_eq!(report.status_at(time("1:00 PM")), Some(SlotStatus::Free));
        assert_eq!(report.status_at(time("11:45 AM")), Some(SlotStatus::Free));
    }

    #[test]
    fn disabled_day_surfaces_all_bookings_as_unscheduled() {
        let mut schedule = ClinicSchedule::default();
        let mut store = store();
        book(&mut store, "Monday Patient", "9:00 AM");
        schedule.working_hours.set(Weekday::Mon, DayHours::closed(time("09:00"), time("17:00")));

        let report = AvailabilityCalculator::new(&schedule).compute(&store, day()).expect("report");
        assert!(report.slots.is_empty());
        assert_eq!(report.unscheduled.len(), 1);
    }

    #[test]
    fn configuration_errors_propagate() {
        let mut schedule = ClinicSchedule::default();
        schedule.working_hours.set(Weekday::Mon, DayHours::open(time("17:00"), time("09:00")));

        let error = AvailabilityCalculator::new(&schedule)
            .compute(&store(), day())
            .expect_err("inverted hours");
        assert!(matches!(error, DomainError::Configuration(_)));
    }
}

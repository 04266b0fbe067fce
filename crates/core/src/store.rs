use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::approvals::ensure_transition;
use crate::domain::appointment::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentStatus, StatusFilter,
};
use crate::domain::schedule::SlotTime;
use crate::errors::DomainError;

pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSummary {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

/// Session-owned collection of appointments. Records are kept in insertion
/// order and are never removed; only their status changes.
pub struct AppointmentStore {
    appointments: Vec<Appointment>,
    next_sequence: u64,
    max_advance_booking_days: u32,
    clock: Box<dyn Clock>,
}

impl AppointmentStore {
    pub fn new(max_advance_booking_days: u32) -> Self {
        Self::with_clock(max_advance_booking_days, SystemClock)
    }

    pub fn with_clock(max_advance_booking_days: u32, clock: impl Clock + 'static) -> Self {
        Self {
            appointments: Vec::new(),
            next_sequence: 1,
            max_advance_booking_days,
            clock: Box::new(clock),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn max_advance_booking_days(&self) -> u32 {
        self.max_advance_booking_days
    }

    pub fn set_max_advance_booking_days(&mut self, days: u32) {
        self.max_advance_booking_days = days;
    }

    pub fn add(&mut self, draft: AppointmentDraft) -> Result<Appointment, DomainError> {
        let (date, time) = self.validate(&draft)?;

        let id = AppointmentId(format!("APT-{:04}", self.next_sequence));
        self.next_sequence += 1;

        let appointment = Appointment {
            id,
            patient_name: draft.patient_name.trim().to_string(),
            patient_email: draft.patient_email.trim().to_string(),
            patient_phone: draft.patient_phone.trim().to_string(),
            date,
            time,
            status: AppointmentStatus::Pending,
            notes: draft
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
        };

        info!(
            event_name = "appointment.created",
            appointment_id = %appointment.id,
            date = %appointment.date,
            time = %appointment.time,
            "appointment request recorded"
        );
        self.appointments.push(appointment.clone());
        Ok(appointment)
    }

    pub fn get(&self, id: &AppointmentId) -> Option<&Appointment> {
        self.appointments.iter().find(|appointment| &appointment.id == id)
    }

    pub fn all(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn len(&self) -> usize {
        self.appointments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.appointments.is_empty()
    }

    pub fn find_by_date(&self, date: NaiveDate) -> Vec<&Appointment> {
        self.find_by_date_and_status(date, StatusFilter::All)
    }

    pub fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        filter: StatusFilter,
    ) -> Vec<&Appointment> {
        self.appointments
            .iter()
            .filter(|appointment| appointment.date == date && filter.matches(appointment.status))
            .collect()
    }

    /// Applies a status change after the transition is checked for legality.
    /// On failure the record is left untouched.
    pub fn set_status(
        &mut self,
        id: &AppointmentId,
        next: AppointmentStatus,
    ) -> Result<&Appointment, DomainError> {
        let appointment = self
            .appointments
            .iter_mut()
            .find(|appointment| &appointment.id == id)
            .ok_or_else(|| DomainError::AppointmentNotFound(id.clone()))?;

        ensure_transition(appointment, next)?;
        let previous = appointment.status;
        appointment.status = next;

        info!(
            event_name = "appointment.status_changed",
            appointment_id = %appointment.id,
            from = %previous,
            to = %next,
            "appointment status changed"
        );
        Ok(appointment)
    }

    pub fn summary(&self) -> AppointmentSummary {
        self.appointments.iter().fold(AppointmentSummary::default(), |mut summary, appointment| {
            summary.total += 1;
            match appointment.status {
                AppointmentStatus::Pending => summary.pending += 1,
                AppointmentStatus::Approved => summary.approved += 1,
                AppointmentStatus::Rejected => summary.rejected += 1,
            }
            summary
        })
    }

    /// Checks required fields, the time label, and the booking window without
    /// touching the store.
    pub fn validate(
        &self,
        draft: &AppointmentDraft,
    ) -> Result<(NaiveDate, SlotTime), DomainError> {
        let mut missing = Vec::new();
        if draft.patient_name.trim().is_empty() {
            missing.push("patient_name");
        }
        if draft.patient_email.trim().is_empty() {
            missing.push("patient_email");
        }
        if draft.patient_phone.trim().is_empty() {
            missing.push("patient_phone");
        }
        if draft.date.is_none() {
            missing.push("date");
        }
        if draft.time.trim().is_empty() {
            missing.push("time");
        }

        let Some(date) = draft.date.filter(|_| missing.is_empty()) else {
            return Err(DomainError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        };

        let time = SlotTime::parse(&draft.time).ok_or_else(|| {
            DomainError::Validation(format!("`{}` is not a valid slot time", draft.time.trim()))
        })?;

        let today = self.today();
        if date < today {
            return Err(DomainError::Validation(format!(
                "booking date {date} is in the past (today is {today})"
            )));
        }

        let horizon = today
            .checked_add_days(Days::new(u64::from(self.max_advance_booking_days)))
            .unwrap_or(NaiveDate::MAX);
        if date > horizon {
            return Err(DomainError::Validation(format!(
                "booking date {date} is more than {} days ahead (latest is {horizon})",
                self.max_advance_booking_days
            )));
        }

        Ok((date, time))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate};

    use super::{AppointmentStore, FixedClock};
    use crate::domain::appointment::{
        AppointmentDraft, AppointmentId, AppointmentStatus, StatusFilter,
    };
    use crate::errors::DomainError;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("date")
    }

    fn store() -> AppointmentStore {
        AppointmentStore::with_clock(30, FixedClock(today()))
    }

    fn draft(name: &str, date: NaiveDate, time: &str) -> AppointmentDraft {
        AppointmentDraft {
            patient_name: name.to_string(),
            patient_email: format!("{}@example.com", name.to_ascii_lowercase()),
            patient_phone: "(555) 123-4567".to_string(),
            date: Some(date),
            time: time.to_string(),
            notes: None,
        }
    }

    fn days_out(days: u64) -> NaiveDate {
        today().checked_add_days(Days::new(days)).expect("date")
    }

    #[test]
    fn add_assigns_sequential_ids_and_pending_status() {
        let mut store = store();
        let first = store.add(draft("John", days_out(1), "10:00 AM")).expect("first");
        let second = store.add(draft("Jane", days_out(1), "2:30 PM")).expect("second");

        assert_eq!(first.id, AppointmentId("APT-0001".to_string()));
        assert_eq!(second.id, AppointmentId("APT-0002".to_string()));
        assert_eq!(first.status, AppointmentStatus::Pending);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn add_reports_every_missing_field() {
        let mut store = store();
        let error = store
            .add(AppointmentDraft { patient_name: "  ".to_string(), ..AppointmentDraft::default() })
            .expect_err("empty draft");

        let message = match error {
            DomainError::Validation(message) => message,
            other => panic!("expected validation error, got {other:?}"),
        };
        for field in ["patient_name", "patient_email", "patient_phone", "date", "time"] {
            assert!(message.contains(field), "missing `{field}` in `{message}`");
        }
        assert!(store.is_empty());
    }

    #[test]
    fn add_rejects_unparseable_time() {
        let mut store = store();
        let error = store.add(draft("John", days_out(1), "sometime")).expect_err("bad time");
        assert!(matches!(error, DomainError::Validation(_)));
    }

    #[test]
    fn add_rejects_past_dates() {
        let mut store = store();
        let yesterday = today().pred_opt().expect("date");
        let error = store.add(draft("John", yesterday, "10:00 AM")).expect_err("past date");
        assert!(matches!(error, DomainError::Validation(ref message) if message.contains("past")));
        store.add(draft("John", today(), "10:00 AM")).expect("today is bookable");
    }

    #[test]
    fn advance_booking_window_is_inclusive() {
        let mut store = store();
        store.add(draft("Edge", days_out(30), "9:00 AM")).expect("30 days out is allowed");

        let error = store.add(draft("Late", days_out(31), "9:00 AM")).expect_err("31 days out");
        assert!(matches!(error, DomainError::Validation(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn blank_notes_are_dropped() {
        let mut store = store();
        let mut request = draft("John", days_out(1), "10:00 AM");
        request.notes = Some("   ".to_string());
        assert_eq!(store.add(request).expect("added").notes, None);
    }

    #[test]
    fn find_by_date_returns_only_that_day_in_insertion_order() {
        let mut store = store();
        let (d1, d2, d3) = (days_out(1), days_out(2), days_out(3));
        store.add(draft("A", d1, "9:00 AM")).expect("a");
        store.add(draft("B", d2, "9:00 AM")).expect("b");
        store.add(draft("C", d1, "9:45 AM")).expect("c");
        store.add(draft("D", d2, "10:30 AM")).expect("d");
        store.add(draft("E", d3, "9:00 AM")).expect("e");

        let names: Vec<&str> =
            store.find_by_date(d2).iter().map(|a| a.patient_name.as_str()).collect();
        assert_eq!(names, vec!["B", "D"]);
    }

    #[test]
    fn status_filter_all_matches_find_by_date() {
        let mut store = store();
        let date = days_out(2);
        let first = store.add(draft("A", date, "9:00 AM")).expect("a");
        store.add(draft("B", date, "9:45 AM")).expect("b");
        store.set_status(&first.id, AppointmentStatus::Approved).expect("approve");

        assert_eq!(store.find_by_date_and_status(date, StatusFilter::All), store.find_by_date(date));
        let approved = store.find_by_date_and_status(date, AppointmentStatus::Approved.into());
        assert_eq!(approved.len(), 1);
        assert_eq!(approved[0].id, first.id);
        assert_eq!(
            store.find_by_date_and_status(date, AppointmentStatus::Rejected.into()).len(),
            0
        );
    }

    #[test]
    fn illegal_set_status_leaves_record_unchanged() {
        let mut store = store();
        let created = store.add(draft("A", days_out(1), "9:00 AM")).expect("a");
        store.set_status(&created.id, AppointmentStatus::Rejected).expect("reject");

        let error =
            store.set_status(&created.id, AppointmentStatus::Approved).expect_err("terminal");
        assert!(matches!(
            error,
            DomainError::InvalidTransition {
                from: AppointmentStatus::Rejected,
                to: AppointmentStatus::Approved,
                ..
            }
        ));
        assert_eq!(store.get(&created.id).map(|a| a.status), Some(AppointmentStatus::Rejected));
    }

    #[test]
    fn set_status_on_unknown_id_is_not_found() {
        let mut store = store();
        let error = store
            .set_status(&AppointmentId("APT-9999".to_string()), AppointmentStatus::Approved)
            .expect_err("unknown id");
        assert!(matches!(error, DomainError::AppointmentNotFound(_)));
    }

    #[test]
    fn summary_counts_by_status() {
        let mut store = store();
        let a = store.add(draft("A", days_out(1), "9:00 AM")).expect("a");
        let b = store.add(draft("B", days_out(1), "9:45 AM")).expect("b");
        store.add(draft("C", days_out(1), "10:30 AM")).expect("c");
        store.set_status(&a.id, AppointmentStatus::Approved).expect("approve");
        store.set_status(&b.id, AppointmentStatus::Rejected).expect("reject");

        let summary = store.summary();
        assert_eq!((summary.total, summary.pending, summary.approved, summary.rejected), (3, 1, 1, 1));
    }
}

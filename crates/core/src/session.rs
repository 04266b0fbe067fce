use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::approvals::{ApprovalDecision, ApprovalNotice, ApprovalWorkflow};
use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
use crate::availability::{AvailabilityCalculator, AvailabilityReport, SlotStatus};
use crate::config::validate_schedule;
use crate::domain::appointment::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentStatus, StatusFilter,
};
use crate::domain::schedule::{ClinicSchedule, SlotTime, WEEKDAYS};
use crate::errors::DomainError;
use crate::slots::{generate_slots, SlotGenerator};
use crate::store::{AppointmentStore, AppointmentSummary, Clock, SystemClock};

/// One dashboard session: the schedule in force, the store it exclusively owns,
/// and the audit trail for decisions made through it. Callers serialize access.
pub struct ClinicSession<S = InMemoryAuditSink> {
    schedule: ClinicSchedule,
    store: AppointmentStore,
    workflow: ApprovalWorkflow,
    sink: S,
    audit: AuditContext,
}

impl ClinicSession<InMemoryAuditSink> {
    pub fn new(schedule: ClinicSchedule) -> Self {
        Self::with_clock(schedule, SystemClock)
    }

    pub fn with_clock(schedule: ClinicSchedule, clock: impl Clock + 'static) -> Self {
        Self::with_sink(schedule, clock, InMemoryAuditSink::default(), "front-desk")
    }
}

impl<S: AuditSink> ClinicSession<S> {
    pub fn with_sink(
        schedule: ClinicSchedule,
        clock: impl Clock + 'static,
        sink: S,
        actor: impl Into<String>,
    ) -> Self {
        let store = AppointmentStore::with_clock(schedule.max_advance_booking_days, clock);
        let audit = AuditContext::new(Uuid::new_v4().to_string(), actor);
        Self { schedule, store, workflow: ApprovalWorkflow::new(), sink, audit }
    }

    pub fn schedule(&self) -> &ClinicSchedule {
        &self.schedule
    }

    pub fn store(&self) -> &AppointmentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AppointmentStore {
        &mut self.store
    }

    pub fn audit_sink(&self) -> &S {
        &self.sink
    }

    pub fn correlation_id(&self) -> &str {
        &self.audit.correlation_id
    }

    /// Books into a generated slot that is currently free. Drafts that fail
    /// any check leave the store untouched.
    pub fn book(&mut self, draft: AppointmentDraft) -> Result<Appointment, DomainError> {
        let result = self.check_bookable(&draft).and_then(|_| self.store.add(draft));
        match &result {
            Ok(appointment) => self.sink.emit(
                AuditEvent::new(
                    Some(appointment.id.clone()),
                    &self.audit,
                    "booking.appointment_created",
                    AuditCategory::Booking,
                    AuditOutcome::Success,
                )
                .with_metadata("date", appointment.date.to_string())
                .with_metadata("time", appointment.time.label()),
            ),
            Err(error) => self.sink.emit(
                AuditEvent::new(
                    None,
                    &self.audit,
                    "booking.appointment_rejected",
                    AuditCategory::Booking,
                    AuditOutcome::Rejected,
                )
                .with_metadata("error", error.to_string()),
            ),
        }
        result
    }

    fn check_bookable(&self, draft: &AppointmentDraft) -> Result<(), DomainError> {
        let (date, time) = self.store.validate(draft)?;
        let report = self.compute_availability(date)?;
        match report.status_at(time) {
            Some(SlotStatus::Free) => Ok(()),
            Some(SlotStatus::Booked) => Err(DomainError::Validation(format!(
                "the {} slot on {date} is already booked",
                time.label()
            ))),
            Some(SlotStatus::Break) => Err(DomainError::Validation(format!(
                "the {} slot on {date} falls inside a break",
                time.label()
            ))),
            None => Err(DomainError::Validation(format!(
                "{} is not an available slot on {date}",
                time.label()
            ))),
        }
    }

    pub fn approve(&mut self, id: &AppointmentId) -> Result<ApprovalNotice, DomainError> {
        self.decide(id, ApprovalDecision::Approve)
    }

    pub fn reject(&mut self, id: &AppointmentId) -> Result<ApprovalNotice, DomainError> {
        self.decide(id, ApprovalDecision::Reject)
    }

    pub fn decide(
        &mut self,
        id: &AppointmentId,
        decision: ApprovalDecision,
    ) -> Result<ApprovalNotice, DomainError> {
        self.workflow.apply_with_audit(&mut self.store, id, decision, &self.sink, &self.audit)
    }

    pub fn set_status(
        &mut self,
        id: &AppointmentId,
        next: AppointmentStatus,
    ) -> Result<&Appointment, DomainError> {
        self.store.set_status(id, next)
    }

    pub fn find_by_date(&self, date: NaiveDate) -> Vec<&Appointment> {
        self.store.find_by_date(date)
    }

    pub fn find_by_date_and_status(
        &self,
        date: NaiveDate,
        filter: StatusFilter,
    ) -> Vec<&Appointment> {
        self.store.find_by_date_and_status(date, filter)
    }

    pub fn slots_for(&self, date: NaiveDate) -> Result<Vec<SlotTime>, DomainError> {
        SlotGenerator::new(&self.schedule).slots_for(date)
    }

    pub fn compute_availability(&self, date: NaiveDate) -> Result<AvailabilityReport, DomainError> {
        AvailabilityCalculator::new(&self.schedule).compute(&self.store, date)
    }

    pub fn summary(&self) -> AppointmentSummary {
        self.store.summary()
    }

    /// Replaces the schedule after checking the settings options and that every
    /// weekday still generates. Existing appointments are kept even when they
    /// fall off the new grid.
    pub fn update_schedule(&mut self, schedule: ClinicSchedule) -> Result<(), DomainError> {
        validate_schedule(&schedule)
            .map_err(|error| DomainError::Configuration(error.to_string()))?;
        for weekday in WEEKDAYS {
            generate_slots(
                schedule.hours_for(weekday),
                schedule.appointment_duration_mins,
                schedule.buffer_time_mins,
            )?;
        }

        self.store.set_max_advance_booking_days(schedule.max_advance_booking_days);
        self.schedule = schedule;
        info!(
            event_name = "schedule.updated",
            appointment_duration_mins = self.schedule.appointment_duration_mins,
            buffer_time_mins = self.schedule.buffer_time_mins,
            max_advance_booking_days = self.schedule.max_advance_booking_days,
            "clinic schedule updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::ClinicSession;
    use crate::audit::AuditOutcome;
    use crate::availability::SlotStatus;
    use crate::domain::appointment::{AppointmentDraft, AppointmentStatus, StatusFilter};
    use crate::domain::schedule::{ClinicSchedule, DayHours, SlotTime};
    use crate::errors::DomainError;
    use crate::store::FixedClock;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("date")
    }

    // Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).expect("date")
    }

    fn session() -> ClinicSession {
        ClinicSession::with_clock(ClinicSchedule::default(), FixedClock(today()))
    }

    fn draft(name: &str, date: NaiveDate, time: &str) -> AppointmentDraft {
        AppointmentDraft {
            patient_name: name.to_string(),
            patient_email: "patient@example.com".to_string(),
            patient_phone: "(555) 123-4567".to_string(),
            date: Some(date),
            time: time.to_string(),
            notes: None,
        }
    }

    #[test]
    fn book_accepts_a_free_generated_slot() {
        let mut session = session();
        let booked = session.book(draft("Emily Wilson", monday(), "9:00 AM")).expect("free slot");

        assert_eq!(booked.status, AppointmentStatus::Pending);
        let report = session.compute_availability(monday()).expect("report");
        assert_eq!(report.status_at(booked.time), Some(SlotStatus::Booked));
        let events = session.audit_sink().events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "booking.appointment_created");
    }

    #[test]
    fn book_refuses_taken_break_and_off_grid_slots() {
        let mut session = session();
        session.book(draft("First", monday(), "9:45 AM")).expect("free slot");

        for time in ["9:45 AM", "12:00 PM", "10:00 AM"] {
            let error = session.book(draft("Second", monday(), time)).expect_err(time);
            assert!(matches!(error, DomainError::Validation(_)), "{time}: {error:?}");
        }
        assert_eq!(session.store().len(), 1);
        let rejected = session
            .audit_sink()
            .events()
            .into_iter()
            .filter(|event| event.outcome == AuditOutcome::Rejected)
            .count();
        assert_eq!(rejected, 3);
    }

    #[test]
    fn book_refuses_closed_days() {
        let mut session = session();
        // 2026-10-18 is a Sunday.
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).expect("date");
        let error = session.book(draft("Weekend", sunday, "9:00 AM")).expect_err("closed");
        assert!(matches!(error, DomainError::Validation(_)));
    }

    #[test]
    fn rejected_booking_frees_the_slot_for_another_patient() {
        let mut session = session();
        let first = session.book(draft("First", monday(), "10:30 AM")).expect("free");
        session.reject(&first.id).expect("reject");

        session.book(draft("Second", monday(), "10:30 AM")).expect("slot is free again");
        let pending = session.find_by_date_and_status(monday(), AppointmentStatus::Pending.into());
        assert_eq!(pending.len(), 1);
        assert_eq!(session.find_by_date_and_status(monday(), StatusFilter::All).len(), 2);
    }

    #[test]
    fn decisions_are_audited_under_the_session_correlation_id() {
        let mut session = session();
        let booked = session.book(draft("John Doe", monday(), "9:00 AM")).expect("free");
        let notice = session.approve(&booked.id).expect("approve");
        assert_eq!(notice.title, "Appointment Approved");
        session.reject(&booked.id).expect_err("approved is terminal");

        let events = session.audit_sink().events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|event| event.correlation_id == session.correlation_id()));
        assert_eq!(events[2].event_type, "approval.transition_rejected");
        assert_eq!(session.summary().approved, 1);
    }

    #[test]
    fn update_schedule_keeps_appointments_and_surfaces_orphans() {
        let mut session = session();
        let booked = session.book(draft("Robert Johnson", monday(), "9:45 AM")).expect("free");

        let mut schedule = ClinicSchedule::default();
        schedule.appointment_duration_mins = 60;
        schedule.buffer_time_mins = 0;
        session.update_schedule(schedule).expect("valid schedule");

        let report = session.compute_availability(monday()).expect("report");
        assert_eq!(report.unscheduled.len(), 1);
        assert_eq!(report.unscheduled[0].id, booked.id);
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn update_schedule_rejects_inverted_hours_and_keeps_the_old_one() {
        let mut session = session();
        let mut schedule = ClinicSchedule::default();
        let (nine, five) = (SlotTime::new(9, 0).expect("time"), SlotTime::new(17, 0).expect("time"));
        schedule.working_hours.set(Weekday::Wed, DayHours::open(five, nine));

        let error = session.update_schedule(schedule).expect_err("inverted");
        assert!(matches!(error, DomainError::Configuration(_)));
        assert_eq!(session.schedule(), &ClinicSchedule::default());
    }

    #[test]
    fn update_schedule_moves_the_advance_booking_window() {
        let mut session = session();
        let mut schedule = ClinicSchedule::default();
        schedule.max_advance_booking_days = 7;
        session.update_schedule(schedule).expect("valid schedule");

        // 2026-10-26 is a Monday ten days out.
        let later = NaiveDate::from_ymd_opt(2026, 10, 26).expect("date");
        let error = session.book(draft("Later", later, "9:00 AM")).expect_err("outside window");
        assert!(matches!(error, DomainError::Validation(_)));
    }

    #[test]
    fn update_schedule_rejects_durations_outside_the_options() {
        let mut session = session();

        for (duration, buffer) in [(0, 15), (u32::MAX, 15), (30, 20)] {
            let mut schedule = ClinicSchedule::default();
            schedule.appointment_duration_mins = duration;
            schedule.buffer_time_mins = buffer;

            let error = session.update_schedule(schedule).expect_err("not a settings option");
            assert!(matches!(error, DomainError::Configuration(_)), "{duration}/{buffer}: {error:?}");
        }
        assert_eq!(session.schedule(), &ClinicSchedule::default());

        let report = session.compute_availability(monday()).expect("report");
        assert_eq!(report.status_at(SlotTime::new(12, 0).expect("time")), Some(SlotStatus::Break));
    }
}

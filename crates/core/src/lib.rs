pub mod approvals;
pub mod audit;
pub mod availability;
pub mod config;
pub mod domain;
pub mod errors;
pub mod fixtures;
pub mod session;
pub mod slots;
pub mod store;

pub use approvals::{ApprovalDecision, ApprovalNotice, ApprovalWorkflow, NoticeSeverity};
pub use availability::{AvailabilityCalculator, AvailabilityReport, SlotAvailability, SlotStatus};
pub use domain::appointment::{
    Appointment, AppointmentDraft, AppointmentId, AppointmentStatus, StatusFilter,
};
pub use domain::schedule::{BreakWindow, ClinicSchedule, DayHours, SlotTime, WorkingHours};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use session::ClinicSession;
pub use slots::{generate_slots, SlotGenerator, SlotTemplate};
pub use store::{AppointmentStore, AppointmentSummary, Clock, FixedClock, SystemClock};

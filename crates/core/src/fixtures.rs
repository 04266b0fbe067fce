use chrono::{Days, NaiveDate};

use crate::domain::appointment::{Appointment, AppointmentDraft, AppointmentStatus};
use crate::errors::DomainError;
use crate::store::AppointmentStore;

/// Sample appointments shown on the doctor dashboard before any real bookings exist.
const DEMO_APPOINTMENTS: &[DemoAppointment] = &[
    DemoAppointment {
        patient_name: "John Doe",
        patient_email: "john.doe@example.com",
        patient_phone: "(555) 123-4567",
        days_from_today: 0,
        time: "10:30 AM",
        status: AppointmentStatus::Pending,
        notes: "Regular checkup and cleaning",
    },
    DemoAppointment {
        patient_name: "Jane Smith",
        patient_email: "jane.smith@example.com",
        patient_phone: "(555) 987-6543",
        days_from_today: 1,
        time: "2:15 PM",
        status: AppointmentStatus::Approved,
        notes: "Tooth extraction",
    },
    DemoAppointment {
        patient_name: "Robert Johnson",
        patient_email: "robert.j@example.com",
        patient_phone: "(555) 456-7890",
        days_from_today: 2,
        time: "11:15 AM",
        status: AppointmentStatus::Rejected,
        notes: "Root canal treatment",
    },
    DemoAppointment {
        patient_name: "Emily Wilson",
        patient_email: "emily.w@example.com",
        patient_phone: "(555) 234-5678",
        days_from_today: 3,
        time: "9:00 AM",
        status: AppointmentStatus::Pending,
        notes: "Dental implant consultation",
    },
    DemoAppointment {
        patient_name: "Michael Brown",
        patient_email: "michael.b@example.com",
        patient_phone: "(555) 876-5432",
        days_from_today: 4,
        time: "3:45 PM",
        status: AppointmentStatus::Approved,
        notes: "Teeth whitening",
    },
];

struct DemoAppointment {
    patient_name: &'static str,
    patient_email: &'static str,
    patient_phone: &'static str,
    days_from_today: u64,
    time: &'static str,
    status: AppointmentStatus,
    notes: &'static str,
}

/// Drafts paired with the status each sample should end up in, dated relative to `today`.
pub fn demo_appointments(today: NaiveDate) -> Vec<(AppointmentDraft, AppointmentStatus)> {
    DEMO_APPOINTMENTS
        .iter()
        .map(|demo| {
            let draft = AppointmentDraft {
                patient_name: demo.patient_name.to_string(),
                patient_email: demo.patient_email.to_string(),
                patient_phone: demo.patient_phone.to_string(),
                date: today.checked_add_days(Days::new(demo.days_from_today)),
                time: demo.time.to_string(),
                notes: Some(demo.notes.to_string()),
            };
            (draft, demo.status)
        })
        .collect()
}

/// Inserts the samples straight into `store` and moves each to its target
/// status. Booking checks are skipped since today may be a closed day.
pub fn load_demo(store: &mut AppointmentStore) -> Result<Vec<Appointment>, DomainError> {
    let mut loaded = Vec::with_capacity(DEMO_APPOINTMENTS.len());
    for (draft, status) in demo_appointments(store.today()) {
        let created = store.add(draft)?;
        let appointment = if status == AppointmentStatus::Pending {
            created
        } else {
            store.set_status(&created.id, status)?.clone()
        };
        loaded.push(appointment);
    }
    Ok(loaded)
}

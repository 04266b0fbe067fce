use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::domain::appointment::{Appointment, AppointmentId, AppointmentStatus};
use crate::errors::DomainError;
use crate::store::AppointmentStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

impl ApprovalDecision {
    pub fn target_status(&self) -> AppointmentStatus {
        match self {
            Self::Approve => AppointmentStatus::Approved,
            Self::Reject => AppointmentStatus::Rejected,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Default,
    Destructive,
}

/// What the UI should surface after a decision. The workflow never renders it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalNotice {
    pub appointment_id: AppointmentId,
    pub status: AppointmentStatus,
    pub title: String,
    pub message: String,
    pub severity: NoticeSeverity,
}

impl ApprovalNotice {
    fn for_decision(appointment: &Appointment, decision: ApprovalDecision) -> Self {
        let (title, verb, severity) = match decision {
            ApprovalDecision::Approve => {
                ("Appointment Approved", "approved", NoticeSeverity::Default)
            }
            ApprovalDecision::Reject => {
                ("Appointment Rejected", "rejected", NoticeSeverity::Destructive)
            }
        };

        Self {
            appointment_id: appointment.id.clone(),
            status: appointment.status,
            title: title.to_string(),
            message: format!("{}'s appointment has been {verb}.", appointment.patient_name),
            severity,
        }
    }
}

/// Legality check shared by every status writer.
pub fn ensure_transition(
    appointment: &Appointment,
    next: AppointmentStatus,
) -> Result<(), DomainError> {
    if appointment.status.can_transition_to(next) {
        return Ok(());
    }

    warn!(
        event_name = "approval.transition_rejected",
        appointment_id = %appointment.id,
        from = %appointment.status,
        to = %next,
        "illegal appointment status transition"
    );
    Err(DomainError::InvalidTransition {
        id: appointment.id.clone(),
        from: appointment.status,
        to: next,
    })
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ApprovalWorkflow;

impl ApprovalWorkflow {
    pub fn new() -> Self {
        Self
    }

    pub fn approve(
        &self,
        store: &mut AppointmentStore,
        id: &AppointmentId,
    ) -> Result<ApprovalNotice, DomainError> {
        self.apply(store, id, ApprovalDecision::Approve)
    }

    pub fn reject(
        &self,
        store: &mut AppointmentStore,
        id: &AppointmentId,
    ) -> Result<ApprovalNotice, DomainError> {
        self.apply(store, id, ApprovalDecision::Reject)
    }

    /// Only `pending` appointments accept a decision; a repeated decision on
    /// the same appointment fails instead of being treated as a no-op.
    pub fn apply(
        &self,
        store: &mut AppointmentStore,
        id: &AppointmentId,
        decision: ApprovalDecision,
    ) -> Result<ApprovalNotice, DomainError> {
        let appointment = store.set_status(id, decision.target_status())?;
        Ok(ApprovalNotice::for_decision(appointment, decision))
    }

    pub fn approve_with_audit<S>(
        &self,
        store: &mut AppointmentStore,
        id: &AppointmentId,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ApprovalNotice, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        self.apply_with_audit(store, id, ApprovalDecision::Approve, sink, audit)
    }

    pub fn reject_with_audit<S>(
        &self,
        store: &mut AppointmentStore,
        id: &AppointmentId,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ApprovalNotice, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        self.apply_with_audit(store, id, ApprovalDecision::Reject, sink, audit)
    }

    pub fn apply_with_audit<S>(
        &self,
        store: &mut AppointmentStore,
        id: &AppointmentId,
        decision: ApprovalDecision,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<ApprovalNotice, DomainError>
    where
        S: AuditSink + ?Sized,
    {
        let previous = store.get(id).map(|appointment| appointment.status);
        let result = self.apply(store, id, decision);
        match &result {
            Ok(notice) => {
                let mut event = AuditEvent::new(
                    Some(id.clone()),
                    audit,
                    "approval.transition_applied",
                    AuditCategory::Approval,
                    AuditOutcome::Success,
                )
                .with_metadata("to", notice.status.as_str());
                if let Some(previous) = previous {
                    event = event.with_metadata("from", previous.as_str());
                }
                sink.emit(event);
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        Some(id.clone()),
                        audit,
                        "approval.transition_rejected",
                        AuditCategory::Approval,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("decision", format!("{decision:?}"))
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

use clinicdesk_core::{
    ApprovalDecision, ApprovalNotice, AppointmentStatus, ClinicSession, DomainError,
};

use crate::commands::{demo_session, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let mut session = match demo_session(&config) {
        Ok(session) => session,
        Err(error) => {
            return CommandResult::failure("seed", "seed_execution", format!("{error:#}"), 4)
        }
    };

    let notices = match decide_pending(&mut session) {
        Ok(notices) => notices,
        Err(error) => {
            return CommandResult::application_failure("seed", error, session.correlation_id())
        }
    };

    let summary = session.summary();
    let mut lines = vec![format!(
        "demo appointments loaded: total={} pending={} approved={} rejected={}",
        summary.total, summary.pending, summary.approved, summary.rejected
    )];
    lines.extend(notices.iter().map(|notice| {
        format!("  - {} [{}]: {}", notice.appointment_id, notice.title, notice.message)
    }));
    lines.push(format!("audit events recorded: {}", session.audit_sink().events().len()));

    CommandResult::success("seed", lines.join("\n"))
}

/// Approves and rejects the pending samples in turn, starting with approval.
fn decide_pending(session: &mut ClinicSession) -> Result<Vec<ApprovalNotice>, DomainError> {
    let pending: Vec<_> = session
        .store()
        .all()
        .iter()
        .filter(|appointment| appointment.status == AppointmentStatus::Pending)
        .map(|appointment| appointment.id.clone())
        .collect();

    pending
        .iter()
        .enumerate()
        .map(|(index, id)| {
            let decision =
                if index % 2 == 0 { ApprovalDecision::Approve } else { ApprovalDecision::Reject };
            session.decide(id, decision)
        })
        .collect()
}

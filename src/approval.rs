use anyhow::bail;

use crate::models::{ApprovalState, ReviewerRole};

/// A reviewer's decision on a pending honor result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Approve,
    Return { reason: String },
}

/// Applies a reviewer decision to an honor result's approval state.
///
/// Pending results move to approved or returned exactly once; approved and
/// returned are terminal. Returning requires a non-empty reason. The caller
/// supplies the acting role, which must be one of the reviewer roles (the
/// type already restricts this; the function exists so the transition rules
/// live in one place and the database update can mirror them).
pub fn apply_decision(
    current: ApprovalState,
    action: &ReviewAction,
    role: ReviewerRole,
) -> anyhow::Result<ApprovalState> {
    if current != ApprovalState::Pending {
        bail!(
            "honor result is already {}; decisions apply to pending results only",
            current.as_str()
        );
    }

    match action {
        ReviewAction::Approve => Ok(ApprovalState::Approved),
        ReviewAction::Return { reason } => {
            if reason.trim().is_empty() {
                bail!(
                    "{} must provide a reason when returning a result",
                    role.as_str()
                );
            }
            Ok(ApprovalState::Returned)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_can_be_approved() {
        let next = apply_decision(
            ApprovalState::Pending,
            &ReviewAction::Approve,
            ReviewerRole::Chairperson,
        )
        .unwrap();
        assert_eq!(next, ApprovalState::Approved);
    }

    #[test]
    fn pending_can_be_returned_with_reason() {
        let next = apply_decision(
            ApprovalState::Pending,
            &ReviewAction::Return {
                reason: "grade for Science 2 under dispute".to_string(),
            },
            ReviewerRole::Principal,
        )
        .unwrap();
        assert_eq!(next, ApprovalState::Returned);
    }

    #[test]
    fn returning_without_reason_is_rejected() {
        let err = apply_decision(
            ApprovalState::Pending,
            &ReviewAction::Return {
                reason: "   ".to_string(),
            },
            ReviewerRole::Chairperson,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reason"));
    }

    #[test]
    fn terminal_states_reject_further_decisions() {
        for state in [ApprovalState::Approved, ApprovalState::Returned] {
            let err = apply_decision(state, &ReviewAction::Approve, ReviewerRole::Principal)
                .unwrap_err();
            assert!(err.to_string().contains("pending"));
        }
    }
}

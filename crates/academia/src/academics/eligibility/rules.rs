use chrono::NaiveDate;

use super::super::domain::{CorrelativityRule, Requirement};
use super::super::standing::{AcademicStanding, StudentHistory};
use super::{BlockingReason, PlanSnapshot};

/// Returns the blocking reason for `rule`, or `None` when the student satisfies it.
pub(crate) fn check_rule(
    standing: &AcademicStanding,
    plan: &PlanSnapshot,
    history: &StudentHistory,
    rule: &CorrelativityRule,
    as_of: NaiveDate,
) -> Option<BlockingReason> {
    let approved = standing.has_approved_as_of(history, rule.prerequisite, as_of);

    let satisfied = match rule.requirement {
        Requirement::Approved => approved,
        Requirement::Regularized => {
            approved || standing.is_regular_as_of(history, rule.prerequisite, as_of)
        }
    };

    if satisfied {
        return None;
    }

    let prerequisite_name = plan
        .space(rule.prerequisite)
        .map(|space| space.name.clone())
        .unwrap_or_else(|| format!("space {}", rule.prerequisite));

    let reason = match rule.requirement {
        Requirement::Approved => format!("'{prerequisite_name}' must be approved"),
        Requirement::Regularized => {
            match standing.regular_until(history, rule.prerequisite, as_of) {
                Some(expired_on) if expired_on <= as_of => format!(
                    "'{prerequisite_name}' must be regularized (regularity expired on {expired_on})"
                ),
                _ => format!("'{prerequisite_name}' must be regularized"),
            }
        }
    };

    Some(BlockingReason {
        prerequisite: rule.prerequisite,
        prerequisite_name,
        requirement: rule.requirement,
        reason,
    })
}

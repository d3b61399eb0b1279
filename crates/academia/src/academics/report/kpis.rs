use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};

use super::super::domain::{Action, ConditionCode, MovementKind};
use super::super::eligibility::{EligibilityEvaluator, PlanSnapshot};
use super::super::standing::StudentHistory;
use super::views::{ExpiringRegularity, KpiTotals, MissingCorrelativity, StudentKpis};

/// Dashboard indicators of one enrollment as of `today`.
pub fn build_kpis(
    evaluator: &EligibilityEvaluator,
    plan: &PlanSnapshot,
    history: &StudentHistory,
    today: NaiveDate,
    expiry_window_days: u32,
) -> StudentKpis {
    let standing = evaluator.standing();

    StudentKpis {
        enrollment: history.enrollment.id,
        as_of: today,
        average: standing.average(history),
        totals: totals(evaluator, plan, history),
        expiring_regularities: expiring(evaluator, plan, history, today, expiry_window_days),
        missing_correlativities: missing(evaluator, plan, history, today),
    }
}

fn totals(
    evaluator: &EligibilityEvaluator,
    plan: &PlanSnapshot,
    history: &StudentHistory,
) -> KpiTotals {
    let standing = evaluator.standing();
    let spaces = plan.spaces.len();
    let approved = plan
        .spaces
        .keys()
        .filter(|space| standing.has_approved(history, **space))
        .count();

    let course_outcomes = history
        .movements
        .iter()
        .filter(|movement| movement.kind == MovementKind::Course);
    let mut promoted = BTreeSet::new();
    let mut free = BTreeSet::new();
    for movement in course_outcomes {
        if movement.condition == ConditionCode::Promotion {
            promoted.insert(movement.space_id);
        }
        if movement.condition.is_free() {
            free.insert(movement.space_id);
        }
    }

    KpiTotals {
        spaces,
        approved,
        promoted: promoted.len(),
        free: free.len(),
        pending: spaces.saturating_sub(approved),
    }
}

fn expiring(
    evaluator: &EligibilityEvaluator,
    plan: &PlanSnapshot,
    history: &StudentHistory,
    today: NaiveDate,
    window_days: u32,
) -> Vec<ExpiringRegularity> {
    let standing = evaluator.standing();
    let Some(cutoff) = today.checked_add_signed(Duration::days(i64::from(window_days))) else {
        return Vec::new();
    };

    plan.ordered_spaces()
        .into_iter()
        .filter(|space| {
            standing.is_regular_as_of(history, space.id, today)
                && !standing.is_regular_as_of(history, space.id, cutoff)
        })
        .filter_map(|space| {
            let since = standing.latest_regularity(history, space.id, today)?.date;
            let expires_on = standing.regular_until(history, space.id, today)?;
            Some(ExpiringRegularity {
                space: space.id,
                space_name: space.name.clone(),
                regular_since: since,
                expires_on,
                days_left: (expires_on - today).num_days(),
            })
        })
        .collect()
}

fn missing(
    evaluator: &EligibilityEvaluator,
    plan: &PlanSnapshot,
    history: &StudentHistory,
    today: NaiveDate,
) -> Vec<MissingCorrelativity> {
    let standing = evaluator.standing();
    plan.ordered_spaces()
        .into_iter()
        .filter(|space| !standing.has_approved(history, space.id))
        .filter_map(|space| {
            let report = evaluator.evaluate(plan, history, space.id, Action::TakeCourse, today);
            (!report.ok).then(|| MissingCorrelativity {
                space: space.id,
                space_name: space.name.clone(),
                blocking_reasons: report.blocking_reasons,
            })
        })
        .collect()
}

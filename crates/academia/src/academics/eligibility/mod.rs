mod rules;

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::correlativity::CorrelativityGraph;
use super::domain::{
    Action, CurricularSpace, Requirement, SpaceId, StudyPlan, Term, YearLevel,
};
use super::standing::{AcademicStanding, StudentHistory};

/// Everything the evaluator needs to know about a plan: its spaces and rules.
#[derive(Debug, Clone)]
pub struct PlanSnapshot {
    pub plan: StudyPlan,
    pub spaces: BTreeMap<SpaceId, CurricularSpace>,
    pub graph: CorrelativityGraph,
}

impl PlanSnapshot {
    pub fn space(&self, id: SpaceId) -> Option<&CurricularSpace> {
        self.spaces.get(&id)
    }

    /// Spaces ordered the way the record card lists them.
    pub fn ordered_spaces(&self) -> Vec<&CurricularSpace> {
        let mut spaces: Vec<_> = self.spaces.values().collect();
        spaces.sort_by(|a, b| {
            (a.year, a.term, a.name.as_str()).cmp(&(b.year, b.term, b.name.as_str()))
        });
        spaces
    }
}

/// One unmet prerequisite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingReason {
    pub prerequisite: SpaceId,
    pub prerequisite_name: String,
    pub requirement: Requirement,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub space: SpaceId,
    pub action: Action,
    pub as_of: NaiveDate,
    pub ok: bool,
    pub blocking_reasons: Vec<BlockingReason>,
}

impl EligibilityReport {
    pub fn summary(&self) -> String {
        if self.ok {
            return format!("eligible to {}", action_phrase(self.action));
        }
        let reasons: Vec<&str> = self
            .blocking_reasons
            .iter()
            .map(|reason| reason.reason.as_str())
            .collect();
        format!(
            "not eligible to {}: {}",
            action_phrase(self.action),
            reasons.join("; ")
        )
    }
}

fn action_phrase(action: Action) -> &'static str {
    match action {
        Action::TakeCourse => "take the course",
        Action::SitFinal => "sit the final exam",
    }
}

/// Stateless evaluator of correlativity rules against a student's history.
#[derive(Debug, Clone, Default)]
pub struct EligibilityEvaluator {
    standing: AcademicStanding,
}

impl EligibilityEvaluator {
    pub fn new(standing: AcademicStanding) -> Self {
        Self { standing }
    }

    pub fn standing(&self) -> &AcademicStanding {
        &self.standing
    }

    /// Same snapshot and date always produce the same report.
    pub fn evaluate(
        &self,
        plan: &PlanSnapshot,
        history: &StudentHistory,
        space: SpaceId,
        action: Action,
        as_of: NaiveDate,
    ) -> EligibilityReport {
        let blocking_reasons = plan
            .graph
            .get_rules(space, action)
            .into_iter()
            .filter_map(|rule| rules::check_rule(&self.standing, plan, history, rule, as_of))
            .collect::<Vec<_>>();

        EligibilityReport {
            space,
            action,
            as_of,
            ok: blocking_reasons.is_empty(),
            blocking_reasons,
        }
    }

    /// One report per space of the plan, ordered by year and then name.
    pub fn evaluate_plan(
        &self,
        plan: &PlanSnapshot,
        history: &StudentHistory,
        action: Action,
        as_of: NaiveDate,
    ) -> Vec<SpaceEligibility> {
        let mut spaces: Vec<&CurricularSpace> = plan.spaces.values().collect();
        spaces.sort_by(|a, b| (a.year, a.name.as_str()).cmp(&(b.year, b.name.as_str())));
        spaces
            .into_iter()
            .map(|space| SpaceEligibility {
                space: space.id,
                name: space.name.clone(),
                year: space.year,
                term: space.term,
                report: self.evaluate(plan, history, space.id, action, as_of),
            })
            .collect()
    }
}

/// Row of the per-plan eligibility listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpaceEligibility {
    pub space: SpaceId,
    pub name: String,
    pub year: YearLevel,
    pub term: Term,
    pub report: EligibilityReport,
}

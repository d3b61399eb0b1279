//! Derived academic state: regularity validity, approvals, admission paperwork and
//! the grade average shown on dashboards.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{
    AdmissionCompleteness, AdmissionCondition, CareerKind, ConditionCode, DocumentChecklist,
    Enrollment, Movement, MovementKind, SpaceId,
};

pub const DEFAULT_REGULARITY_DAYS: u32 = 730;
pub const DEFAULT_MINIMUM_PASSING_GRADE: f32 = 6.0;
pub const REQUIRED_PHOTOS: u8 = 2;
pub const REQUIRED_FOLIOS: u8 = 2;

/// Institutional knobs that the state computations depend on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingPolicy {
    pub regularity_validity_days: u32,
    pub minimum_passing_grade: f32,
}

impl Default for StandingPolicy {
    fn default() -> Self {
        Self {
            regularity_validity_days: DEFAULT_REGULARITY_DAYS,
            minimum_passing_grade: DEFAULT_MINIMUM_PASSING_GRADE,
        }
    }
}

/// Snapshot of one enrollment and every movement recorded against it.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentHistory {
    pub enrollment: Enrollment,
    pub movements: Vec<Movement>,
}

impl StudentHistory {
    pub fn new(enrollment: Enrollment, movements: Vec<Movement>) -> Self {
        let movements = movements
            .into_iter()
            .filter(|movement| movement.enrollment_id == enrollment.id)
            .collect();
        Self {
            enrollment,
            movements,
        }
    }

    pub fn for_space(&self, space: SpaceId) -> impl Iterator<Item = &Movement> {
        self.movements
            .iter()
            .filter(move |movement| movement.space_id == space)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AcademicStanding {
    policy: StandingPolicy,
}

impl AcademicStanding {
    pub fn new(policy: StandingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &StandingPolicy {
        &self.policy
    }

    fn window(&self) -> Duration {
        Duration::days(i64::from(self.policy.regularity_validity_days))
    }

    /// Most recent REG "Regular" outcome on `space` dated on or before `as_of`.
    pub fn latest_regularity<'a>(
        &self,
        history: &'a StudentHistory,
        space: SpaceId,
        as_of: NaiveDate,
    ) -> Option<&'a Movement> {
        history
            .for_space(space)
            .filter(|movement| {
                movement.kind == MovementKind::Course
                    && movement.condition == ConditionCode::Regular
                    && movement.date <= as_of
            })
            .max_by_key(|movement| movement.date)
    }

    /// First day on which the regularity held as of `as_of` no longer counts.
    pub fn regular_until(
        &self,
        history: &StudentHistory,
        space: SpaceId,
        as_of: NaiveDate,
    ) -> Option<NaiveDate> {
        self.latest_regularity(history, space, as_of)
            .and_then(|movement| movement.date.checked_add_signed(self.window()))
    }

    pub fn is_regular_as_of(
        &self,
        history: &StudentHistory,
        space: SpaceId,
        as_of: NaiveDate,
    ) -> bool {
        self.regular_until(history, space, as_of)
            .map(|window_end| as_of < window_end)
            .unwrap_or(false)
    }

    /// Whether a single movement approves its space.
    pub fn approves(&self, movement: &Movement) -> bool {
        match (movement.kind, movement.condition) {
            (MovementKind::Course, condition) => condition.approves_course(),
            (MovementKind::Final, ConditionCode::Equivalence) => true,
            (MovementKind::Final, ConditionCode::Regular | ConditionCode::Free) => {
                !movement.absent
                    && movement
                        .effective_grade()
                        .map(|grade| grade >= self.policy.minimum_passing_grade)
                        .unwrap_or(false)
            }
            (MovementKind::Final, _) => false,
        }
    }

    pub fn has_approved(&self, history: &StudentHistory, space: SpaceId) -> bool {
        history.for_space(space).any(|movement| self.approves(movement))
    }

    pub fn has_approved_as_of(
        &self,
        history: &StudentHistory,
        space: SpaceId,
        as_of: NaiveDate,
    ) -> bool {
        history
            .for_space(space)
            .any(|movement| movement.date <= as_of && self.approves(movement))
    }

    /// Documents still missing for the career's admission checklist.
    pub fn missing_documents(
        &self,
        documents: &DocumentChecklist,
        career: CareerKind,
    ) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !documents.national_id_legalized {
            missing.push("legalized national id");
        }
        if !documents.medical_certificate {
            missing.push("medical certificate");
        }
        if documents.id_photos < REQUIRED_PHOTOS {
            missing.push("id photos");
        }
        if documents.foolscap_folios < REQUIRED_FOLIOS {
            missing.push("foolscap folios");
        }
        match career {
            CareerKind::Standard => {
                if !documents.secondary_title_legalized {
                    missing.push("legalized secondary title");
                }
            }
            CareerKind::TeachingCertification => {
                if !documents.higher_title_legalized {
                    missing.push("legalized higher-education title");
                }
                if !documents.title_competencies {
                    missing.push("title competencies");
                }
            }
        }
        missing
    }

    pub fn completeness(
        &self,
        documents: &DocumentChecklist,
        career: CareerKind,
    ) -> AdmissionCompleteness {
        if self.missing_documents(documents, career).is_empty()
            && !documents.secondary_title_in_progress
        {
            AdmissionCompleteness::Complete
        } else {
            AdmissionCompleteness::Incomplete
        }
    }

    pub fn admission_condition(
        &self,
        completeness: AdmissionCompleteness,
        owes_prior_coursework: bool,
        career: CareerKind,
    ) -> AdmissionCondition {
        let owes = owes_prior_coursework && career == CareerKind::Standard;
        if completeness == AdmissionCompleteness::Incomplete || owes {
            AdmissionCondition::Conditional
        } else {
            AdmissionCondition::Regular
        }
    }

    /// Recomputes the cached admission fields of an enrollment.
    pub fn refresh_admission(&self, enrollment: &mut Enrollment, career: CareerKind) {
        let completeness = self.completeness(&enrollment.documents, career);
        enrollment.completeness = completeness;
        enrollment.condition =
            self.admission_condition(completeness, enrollment.owes_prior_coursework, career);
    }

    /// Mean of the grades of approving outcomes, rounded to two decimals.
    pub fn average(&self, history: &StudentHistory) -> Option<f32> {
        let grades: Vec<f32> = history
            .movements
            .iter()
            .filter(|movement| self.approves(movement))
            .filter_map(Movement::effective_grade)
            .filter(|grade| *grade >= self.policy.minimum_passing_grade)
            .collect();

        if grades.is_empty() {
            return None;
        }

        let mean = grades.iter().sum::<f32>() / grades.len() as f32;
        Some((mean * 100.0).round() / 100.0)
    }
}

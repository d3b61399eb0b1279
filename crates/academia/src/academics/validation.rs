use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::conditions;
use super::domain::{
    Action, AdmissionCompleteness, AdmissionCondition, ConditionCode, CurricularSpace,
    Enrollment, MovementDraft, MovementKind, PlanId, ProgramId, SpaceFormat, SpaceId,
};
use super::eligibility::{BlockingReason, EligibilityEvaluator, PlanSnapshot};
use super::standing::{StudentHistory, DEFAULT_MINIMUM_PASSING_GRADE};

pub const MAX_GRADE: f32 = 10.0;
pub const DEFAULT_MAX_FINAL_ATTEMPTS: u8 = 3;
pub const EQUIVALENCE_LEGEND: &str = "Equivalencia";

/// Rejections raised while recording a movement.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MovementViolation {
    #[error("space {space} belongs to program {space_program}, not to the enrollment's program {enrollment_program}")]
    ProgramMismatch {
        space: SpaceId,
        space_program: ProgramId,
        enrollment_program: ProgramId,
    },
    #[error("grade must be between 0 and 10 (got {0})")]
    GradeOutOfRange(f32),
    #[error("condition {} is not valid for a {} outcome on a {} space", .condition.code(), .kind.code(), .format.label())]
    ConditionNotAllowed {
        condition: ConditionCode,
        kind: MovementKind,
        format: SpaceFormat,
    },
    #[error("conditional admission: the course cannot be approved or promoted")]
    ConditionalAdmission,
    #[error("the student already holds a Regular outcome on this space; a free outcome does not apply")]
    FreeAfterRegular,
    #[error("final exams require complete admission documentation")]
    IncompleteDocumentation,
    #[error("a grade is required unless the student is marked absent")]
    MissingGrade,
    #[error("final grade by regularity must be at least {minimum} (got {found})")]
    BelowMinimumGrade { minimum: f32, found: f32 },
    #[error("regularity is not valid on {date}")]
    RegularityNotValid { date: NaiveDate },
    #[error("this space does not allow sitting the final exam as Libre")]
    FreeExamNotAllowed,
    #[error("the space is already approved")]
    AlreadyApproved,
    #[error("the student is regular in this space; the final cannot be sat as Libre")]
    AlreadyRegular,
    #[error("an equivalence needs an internal disposition and the grade text 'Equivalencia'")]
    IncompleteEquivalence,
    #[error("correlativities to {} not met: {}", .action.code(), join_reasons(.reasons))]
    CorrelativitiesNotMet {
        action: Action,
        reasons: Vec<BlockingReason>,
    },
    #[error("the {attempts} final exam attempts are used up; the course must be retaken")]
    AttemptsExhausted { attempts: usize },
}

fn join_reasons(reasons: &[BlockingReason]) -> String {
    reasons
        .iter()
        .map(|reason| reason.reason.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnrollmentViolation {
    #[error("a conditional admission requires a commitment note")]
    MissingCommitmentNote,
    #[error("owed prior coursework must be detailed")]
    MissingOwedDetail,
    #[error("student {field} must not be blank")]
    BlankStudentField { field: &'static str },
    #[error("plan {plan} does not belong to program {program}")]
    PlanOutsideProgram {
        plan: PlanId,
        program: ProgramId,
    },
}

/// Grading limits applied at data entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingPolicy {
    pub minimum_passing_grade: f32,
    pub max_final_attempts: u8,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            minimum_passing_grade: DEFAULT_MINIMUM_PASSING_GRADE,
            max_final_attempts: DEFAULT_MAX_FINAL_ATTEMPTS,
        }
    }
}

/// Snapshot a movement is validated against.
#[derive(Debug, Clone, Copy)]
pub struct MovementContext<'a> {
    pub plan: &'a PlanSnapshot,
    pub history: &'a StudentHistory,
    pub space: &'a CurricularSpace,
}

/// Guard run before any movement reaches the record store.
#[derive(Debug, Clone, Default)]
pub struct MovementGuard {
    policy: GradingPolicy,
    evaluator: EligibilityEvaluator,
}

impl MovementGuard {
    pub fn new(policy: GradingPolicy, evaluator: EligibilityEvaluator) -> Self {
        Self { policy, evaluator }
    }

    pub fn policy(&self) -> &GradingPolicy {
        &self.policy
    }

    pub fn validate(
        &self,
        draft: &MovementDraft,
        context: MovementContext<'_>,
    ) -> Result<(), MovementViolation> {
        check_program(&context.history.enrollment, context.space)?;

        match draft.kind {
            MovementKind::Course => self.validate_course(draft, context),
            MovementKind::Final => self.validate_final(draft, context),
        }
    }

    fn validate_course(
        &self,
        draft: &MovementDraft,
        context: MovementContext<'_>,
    ) -> Result<(), MovementViolation> {
        let format = context.space.format;
        if !conditions::allows(format, draft.condition) {
            return Err(MovementViolation::ConditionNotAllowed {
                condition: draft.condition,
                kind: draft.kind,
                format,
            });
        }

        check_grade_range(draft.grade)?;

        let standing = self.evaluator.standing();
        if draft.condition.is_free()
            && standing
                .latest_regularity(context.history, context.space.id, NaiveDate::MAX)
                .is_some()
        {
            return Err(MovementViolation::FreeAfterRegular);
        }

        if draft.condition.approves_course()
            && context.history.enrollment.condition == AdmissionCondition::Conditional
        {
            return Err(MovementViolation::ConditionalAdmission);
        }

        self.check_correlativities(Action::TakeCourse, draft.date, context)
    }

    fn validate_final(
        &self,
        draft: &MovementDraft,
        context: MovementContext<'_>,
    ) -> Result<(), MovementViolation> {
        if !conditions::final_conditions()
            .iter()
            .any(|entry| entry.code == draft.condition)
        {
            return Err(MovementViolation::ConditionNotAllowed {
                condition: draft.condition,
                kind: draft.kind,
                format: context.space.format,
            });
        }

        if context.history.enrollment.completeness != AdmissionCompleteness::Complete {
            return Err(MovementViolation::IncompleteDocumentation);
        }

        let standing = self.evaluator.standing();
        let space = context.space.id;

        match draft.condition {
            ConditionCode::Regular if !draft.absent => {
                let grade = draft.grade.ok_or(MovementViolation::MissingGrade)?;
                check_grade_range(Some(grade))?;
                if grade < self.policy.minimum_passing_grade {
                    return Err(MovementViolation::BelowMinimumGrade {
                        minimum: self.policy.minimum_passing_grade,
                        found: grade,
                    });
                }
                if !standing.is_regular_as_of(context.history, space, draft.date) {
                    return Err(MovementViolation::RegularityNotValid { date: draft.date });
                }
            }
            ConditionCode::Free => {
                if !context.space.free_exam_allowed {
                    return Err(MovementViolation::FreeExamNotAllowed);
                }
                if standing.has_approved(context.history, space) {
                    return Err(MovementViolation::AlreadyApproved);
                }
                if standing.is_regular_as_of(context.history, space, draft.date) {
                    return Err(MovementViolation::AlreadyRegular);
                }
                if !draft.absent {
                    let grade = draft.grade.ok_or(MovementViolation::MissingGrade)?;
                    check_grade_range(Some(grade))?;
                }
            }
            ConditionCode::Equivalence => {
                let has_disposition = draft
                    .internal_disposition
                    .as_deref()
                    .map(|value| !value.trim().is_empty())
                    .unwrap_or(false);
                let has_legend = draft
                    .grade_text
                    .as_deref()
                    .map(|value| value.trim().eq_ignore_ascii_case(EQUIVALENCE_LEGEND))
                    .unwrap_or(false);
                if !has_disposition || !has_legend {
                    return Err(MovementViolation::IncompleteEquivalence);
                }
            }
            _ => {}
        }

        if draft.condition != ConditionCode::Equivalence {
            self.check_correlativities(Action::SitFinal, draft.date, context)?;
        }

        let previous: Vec<_> = context
            .history
            .for_space(space)
            .filter(|movement| movement.kind == MovementKind::Final)
            .filter(|movement| !(movement.absent && movement.justified_absence))
            .collect();

        if previous.iter().any(|movement| standing.approves(movement)) {
            return Err(MovementViolation::AlreadyApproved);
        }

        if previous.len() >= usize::from(self.policy.max_final_attempts) {
            return Err(MovementViolation::AttemptsExhausted {
                attempts: previous.len(),
            });
        }

        if !draft.absent {
            check_grade_range(draft.grade)?;
        }

        Ok(())
    }

    fn check_correlativities(
        &self,
        action: Action,
        date: NaiveDate,
        context: MovementContext<'_>,
    ) -> Result<(), MovementViolation> {
        let report = self.evaluator.evaluate(
            context.plan,
            context.history,
            context.space.id,
            action,
            date,
        );
        if report.ok {
            Ok(())
        } else {
            Err(MovementViolation::CorrelativitiesNotMet {
                action,
                reasons: report.blocking_reasons,
            })
        }
    }

    /// Data-entry rules for an enrollment's admission fields.
    pub fn validate_enrollment(&self, enrollment: &Enrollment) -> Result<(), EnrollmentViolation> {
        if enrollment.owes_prior_coursework && !has_text(enrollment.owed_detail.as_deref()) {
            return Err(EnrollmentViolation::MissingOwedDetail);
        }
        if enrollment.condition == AdmissionCondition::Conditional
            && !has_text(enrollment.commitment_note.as_deref())
        {
            return Err(EnrollmentViolation::MissingCommitmentNote);
        }
        Ok(())
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.map(|text| !text.trim().is_empty()).unwrap_or(false)
}

pub(crate) fn check_program(
    enrollment: &Enrollment,
    space: &CurricularSpace,
) -> Result<(), MovementViolation> {
    if enrollment.program_id != space.program_id {
        return Err(MovementViolation::ProgramMismatch {
            space: space.id,
            space_program: space.program_id,
            enrollment_program: enrollment.program_id,
        });
    }
    Ok(())
}

fn check_grade_range(grade: Option<f32>) -> Result<(), MovementViolation> {
    match grade {
        Some(value) if !(0.0..=MAX_GRADE).contains(&value) => {
            Err(MovementViolation::GradeOutOfRange(value))
        }
        _ => Ok(()),
    }
}

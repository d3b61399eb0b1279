use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::correlativity::{CorrelativityGraph, RuleChangeSet, RuleViolation};
use super::domain::{
    Action, AdmissionCompleteness, AdmissionCondition, CorrelativityRule, CourseRegistration,
    CurricularSpace, DocumentChecklist, Enrollment, EnrollmentId, Movement, MovementDraft,
    PlanId, Program, ProgramId, RegistrationStatus, RuleSpec, SpaceId, Student, StudentId,
};
use super::eligibility::{EligibilityEvaluator, EligibilityReport, PlanSnapshot, SpaceEligibility};
use super::events::{DomainEvent, EventBus};
use super::policy::AcademicPolicy;
use super::report::{self, RecordCard, StudentKpis};
use super::repository::{
    AcademicRecordStore, CorrelativityStore, RepositoryError, RECORD_SCHEMA_VERSION,
};
use super::standing::{AcademicStanding, StudentHistory};
use super::validation::{
    check_program, EnrollmentViolation, MovementContext, MovementGuard, MovementViolation,
};

/// Admission data submitted when a student joins a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollment {
    pub student_id: StudentId,
    pub program_id: ProgramId,
    pub plan_id: PlanId,
    pub cohort: u16,
    #[serde(default)]
    pub record_book: Option<String>,
    #[serde(default)]
    pub documents: DocumentChecklist,
    #[serde(default)]
    pub owes_prior_coursework: bool,
    #[serde(default)]
    pub owed_detail: Option<String>,
    #[serde(default)]
    pub commitment_note: Option<String>,
}

/// Personal data of a student joining the institute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudent {
    pub national_id: String,
    pub surname: String,
    pub given_name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Admission facts that may change after enrollment. `None` keeps the stored value,
/// except `documents`, which is always replaced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionUpdate {
    #[serde(default)]
    pub documents: DocumentChecklist,
    #[serde(default)]
    pub owes_prior_coursework: Option<bool>,
    #[serde(default)]
    pub owed_detail: Option<String>,
    #[serde(default)]
    pub commitment_note: Option<String>,
}

impl AdmissionUpdate {
    pub fn documents(documents: DocumentChecklist) -> Self {
        Self {
            documents,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub inserted: usize,
    pub deleted: usize,
}

/// Entry point for every academic operation; composes the stores, the movement guard
/// and the eligibility evaluator.
pub struct AcademicService<S, C> {
    records: Arc<S>,
    rules: Arc<C>,
    events: EventBus,
    guard: MovementGuard,
    evaluator: EligibilityEvaluator,
    policy: AcademicPolicy,
}

impl<S, C> AcademicService<S, C>
where
    S: AcademicRecordStore + 'static,
    C: CorrelativityStore + 'static,
{
    pub fn new(records: Arc<S>, rules: Arc<C>, policy: AcademicPolicy) -> Self {
        let evaluator = EligibilityEvaluator::new(AcademicStanding::new(policy.standing()));
        let guard = MovementGuard::new(policy.grading(), evaluator.clone());
        Self {
            records,
            rules,
            events: EventBus::new(),
            guard,
            evaluator,
            policy,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn policy(&self) -> &AcademicPolicy {
        &self.policy
    }

    pub fn records(&self) -> &Arc<S> {
        &self.records
    }

    fn standing(&self) -> &AcademicStanding {
        self.evaluator.standing()
    }

    /// Refuses to run against a store that speaks another schema version.
    pub fn check_schema(&self) -> Result<(), AcademicServiceError> {
        let found = self.records.schema_version();
        let expected = RECORD_SCHEMA_VERSION;
        if found != expected {
            return Err(RepositoryError::SchemaMismatch { expected, found }.into());
        }
        Ok(())
    }

    /// Registers a student; the national id must not be taken.
    pub fn register_student(&self, request: NewStudent) -> Result<Student, AcademicServiceError> {
        let national_id = required_text(&request.national_id, "national id")?;
        let surname = required_text(&request.surname, "surname")?;
        let given_name = required_text(&request.given_name, "given name")?;
        let email = request
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        let student = self.records.insert_student(Student {
            id: StudentId::default(),
            national_id,
            surname,
            given_name,
            email,
            active: true,
        })?;
        info!(student = %student.id, "student registered");
        self.events.publish(DomainEvent::StudentRegistered {
            student: student.id,
        });
        Ok(student)
    }

    /// Creates an enrollment with its admission state derived from the documents.
    pub fn enroll(&self, request: NewEnrollment) -> Result<Enrollment, AcademicServiceError> {
        self.records
            .student(request.student_id)?
            .ok_or_else(|| AcademicServiceError::NotFound(format!("student {}", request.student_id)))?;
        let program = self.program(request.program_id)?;
        let plan = self
            .records
            .plan(request.plan_id)?
            .ok_or_else(|| AcademicServiceError::NotFound(format!("plan {}", request.plan_id)))?;
        if plan.program_id != program.id {
            return Err(EnrollmentViolation::PlanOutsideProgram {
                plan: plan.id,
                program: program.id,
            }
            .into());
        }

        let mut enrollment = Enrollment {
            id: EnrollmentId::default(),
            student_id: request.student_id,
            program_id: program.id,
            plan_id: plan.id,
            cohort: request.cohort,
            record_book: request.record_book,
            documents: request.documents,
            owes_prior_coursework: request.owes_prior_coursework,
            owed_detail: request.owed_detail,
            commitment_note: request.commitment_note,
            completeness: AdmissionCompleteness::Incomplete,
            condition: AdmissionCondition::Conditional,
        };
        self.standing().refresh_admission(&mut enrollment, program.kind);
        self.guard.validate_enrollment(&enrollment)?;

        let stored = self.records.insert_enrollment(enrollment)?;
        info!(
            enrollment = %stored.id,
            student = %stored.student_id,
            plan = %stored.plan_id,
            condition = stored.condition.label(),
            "enrollment created"
        );
        self.events.publish(DomainEvent::EnrollmentCreated {
            enrollment: stored.id,
            student: stored.student_id,
            plan: stored.plan_id,
            condition: stored.condition,
        });
        Ok(stored)
    }

    /// Replaces the admission paperwork and owed-coursework facts, then recomputes
    /// completeness and condition.
    pub fn update_documents(
        &self,
        enrollment_id: EnrollmentId,
        update: AdmissionUpdate,
    ) -> Result<Enrollment, AcademicServiceError> {
        let mut enrollment = self.enrollment(enrollment_id)?;
        let program = self.program(enrollment.program_id)?;

        enrollment.documents = update.documents;
        if let Some(owes) = update.owes_prior_coursework {
            enrollment.owes_prior_coursework = owes;
        }
        if update.owed_detail.is_some() {
            enrollment.owed_detail = update.owed_detail;
        }
        if !enrollment.owes_prior_coursework {
            enrollment.owed_detail = None;
        }
        if update.commitment_note.is_some() {
            enrollment.commitment_note = update.commitment_note;
        }
        self.standing().refresh_admission(&mut enrollment, program.kind);
        self.guard.validate_enrollment(&enrollment)?;

        self.records.update_enrollment(enrollment.clone())?;
        self.events.publish(DomainEvent::AdmissionRecomputed {
            enrollment: enrollment.id,
            completeness: enrollment.completeness,
            condition: enrollment.condition,
        });
        Ok(enrollment)
    }

    /// Eligibility of an enrollment to take or sit a space; `as_of` defaults to today.
    pub fn evaluate(
        &self,
        enrollment_id: EnrollmentId,
        space_id: SpaceId,
        action: Action,
        as_of: Option<NaiveDate>,
    ) -> Result<EligibilityReport, AcademicServiceError> {
        let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
        let history = self.history(enrollment_id)?;
        let space = self.space(space_id)?;
        check_program(&history.enrollment, &space)?;
        let plan = self.plan_snapshot(space.plan_id)?;

        let report = self
            .evaluator
            .evaluate(&plan, &history, space.id, action, as_of);
        debug!(
            enrollment = %enrollment_id,
            space = %space_id,
            action = action.code(),
            %as_of,
            ok = report.ok,
            blocking = report.blocking_reasons.len(),
            "eligibility evaluated"
        );
        Ok(report)
    }

    /// Eligibility of an enrollment for every space of its plan, ordered by year and
    /// name; `as_of` defaults to today.
    pub fn eligible_spaces(
        &self,
        enrollment_id: EnrollmentId,
        action: Action,
        as_of: Option<NaiveDate>,
    ) -> Result<Vec<SpaceEligibility>, AcademicServiceError> {
        let as_of = as_of.unwrap_or_else(|| Local::now().date_naive());
        let history = self.history(enrollment_id)?;
        let plan = self.plan_snapshot(history.enrollment.plan_id)?;

        let listing = self.evaluator.evaluate_plan(&plan, &history, action, as_of);
        debug!(
            enrollment = %enrollment_id,
            action = action.code(),
            %as_of,
            spaces = listing.len(),
            eligible = listing.iter().filter(|row| row.report.ok).count(),
            "plan eligibility evaluated"
        );
        Ok(listing)
    }

    pub fn get_rules(
        &self,
        plan: PlanId,
        space: SpaceId,
        action: Option<Action>,
    ) -> Result<Vec<CorrelativityRule>, AcademicServiceError> {
        let mut rules = self.rules.space_rules(plan, space)?;
        rules.sort_by_key(|rule| rule.id);
        if let Some(action) = action {
            rules.retain(|rule| rule.action == action);
        }
        Ok(rules)
    }

    /// Makes the stored rules of `space` equal to `desired`, all or nothing.
    pub fn synchronize(
        &self,
        plan_id: PlanId,
        space_id: SpaceId,
        desired: Vec<RuleSpec>,
    ) -> Result<SyncSummary, AcademicServiceError> {
        let plan = self.plan_snapshot(plan_id)?;
        plan.graph.check_desired(space_id, &desired, &plan.spaces)?;

        let existing: Vec<CorrelativityRule> =
            plan.graph.rules_of(space_id).into_iter().cloned().collect();
        let changes = RuleChangeSet::diff(&existing, &desired);
        let summary = SyncSummary {
            inserted: changes.inserts.len(),
            deleted: changes.deletes.len(),
        };
        if changes.is_empty() {
            debug!(plan = %plan_id, space = %space_id, "correlativities already in sync");
            return Ok(summary);
        }

        self.rules
            .apply_changes(plan_id, space_id, &plan.graph.rule_ids(), &changes)?;
        info!(
            plan = %plan_id,
            space = %space_id,
            inserted = summary.inserted,
            deleted = summary.deleted,
            "correlativities synchronized"
        );
        self.events.publish(DomainEvent::RulesSynchronized {
            plan: plan_id,
            space: space_id,
            inserted: summary.inserted,
            deleted: summary.deleted,
        });
        Ok(summary)
    }

    /// Validates and stores a course or final-exam outcome.
    pub fn record_movement(&self, draft: MovementDraft) -> Result<Movement, AcademicServiceError> {
        let history = self.history(draft.enrollment_id)?;
        let space = self.space(draft.space_id)?;
        check_program(&history.enrollment, &space)?;
        let plan = self.plan_snapshot(space.plan_id)?;

        self.guard.validate(
            &draft,
            MovementContext {
                plan: &plan,
                history: &history,
                space: &space,
            },
        )?;

        let movement = self.records.insert_movement(draft)?;
        info!(
            enrollment = %movement.enrollment_id,
            space = %movement.space_id,
            kind = movement.kind.code(),
            condition = movement.condition.code(),
            "movement recorded"
        );
        self.events.publish(DomainEvent::MovementRecorded {
            enrollment: movement.enrollment_id,
            space: movement.space_id,
            movement: movement.id,
            kind: movement.kind,
            condition: movement.condition,
        });
        Ok(movement)
    }

    /// Signs an enrollment up for a space after checking course correlativities.
    pub fn register_course(
        &self,
        enrollment_id: EnrollmentId,
        space_id: SpaceId,
        academic_year: u16,
        date: NaiveDate,
    ) -> Result<CourseRegistration, AcademicServiceError> {
        let report = self.evaluate(enrollment_id, space_id, Action::TakeCourse, Some(date))?;
        if !report.ok {
            return Err(AcademicServiceError::Ineligible(report));
        }

        let registration = self.records.insert_registration(CourseRegistration {
            enrollment_id,
            space_id,
            academic_year,
            date,
            status: RegistrationStatus::Active,
        })?;
        info!(
            enrollment = %enrollment_id,
            space = %space_id,
            academic_year,
            "course registration accepted"
        );
        self.events.publish(DomainEvent::CourseRegistered {
            enrollment: enrollment_id,
            space: space_id,
            academic_year,
        });
        Ok(registration)
    }

    pub fn kpis(
        &self,
        enrollment_id: EnrollmentId,
        today: Option<NaiveDate>,
    ) -> Result<StudentKpis, AcademicServiceError> {
        let today = today.unwrap_or_else(|| Local::now().date_naive());
        let history = self.history(enrollment_id)?;
        let plan = self.plan_snapshot(history.enrollment.plan_id)?;
        Ok(report::build_kpis(
            &self.evaluator,
            &plan,
            &history,
            today,
            self.policy.expiry_window_days,
        ))
    }

    pub fn record_card(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<RecordCard, AcademicServiceError> {
        let history = self.history(enrollment_id)?;
        let student = self
            .records
            .student(history.enrollment.student_id)?
            .ok_or_else(|| {
                AcademicServiceError::NotFound(format!("student {}", history.enrollment.student_id))
            })?;
        let program = self.program(history.enrollment.program_id)?;
        let plan = self.plan_snapshot(history.enrollment.plan_id)?;
        Ok(report::build_record_card(
            self.standing(),
            &student,
            &program,
            &plan,
            &history,
        ))
    }

    /// Loads a plan with its spaces and correlativity graph.
    pub fn plan_snapshot(&self, plan_id: PlanId) -> Result<PlanSnapshot, AcademicServiceError> {
        let plan = self
            .records
            .plan(plan_id)?
            .ok_or_else(|| AcademicServiceError::NotFound(format!("plan {plan_id}")))?;
        let spaces = self
            .records
            .spaces_in_plan(plan_id)?
            .into_iter()
            .map(|space| (space.id, space))
            .collect();
        let graph = CorrelativityGraph::from_rules(plan_id, self.rules.plan_rules(plan_id)?);
        Ok(PlanSnapshot {
            plan,
            spaces,
            graph,
        })
    }

    pub fn history(
        &self,
        enrollment_id: EnrollmentId,
    ) -> Result<StudentHistory, AcademicServiceError> {
        let enrollment = self.enrollment(enrollment_id)?;
        let movements = self.records.movements_of(enrollment_id)?;
        Ok(StudentHistory::new(enrollment, movements))
    }

    fn enrollment(&self, id: EnrollmentId) -> Result<Enrollment, AcademicServiceError> {
        self.records
            .enrollment(id)?
            .ok_or_else(|| AcademicServiceError::NotFound(format!("enrollment {id}")))
    }

    fn program(&self, id: ProgramId) -> Result<Program, AcademicServiceError> {
        self.records
            .program(id)?
            .ok_or_else(|| AcademicServiceError::NotFound(format!("program {id}")))
    }

    fn space(&self, id: SpaceId) -> Result<CurricularSpace, AcademicServiceError> {
        self.records
            .space(id)?
            .ok_or_else(|| AcademicServiceError::NotFound(format!("space {id}")))
    }
}

fn required_text(value: &str, field: &'static str) -> Result<String, EnrollmentViolation> {
    let value = value.trim();
    if value.is_empty() {
        return Err(EnrollmentViolation::BlankStudentField { field });
    }
    Ok(value.to_string())
}

/// Error raised by the academic service.
#[derive(Debug, thiserror::Error)]
pub enum AcademicServiceError {
    #[error(transparent)]
    Movement(#[from] MovementViolation),
    #[error(transparent)]
    Enrollment(#[from] EnrollmentViolation),
    #[error(transparent)]
    Rule(#[from] RuleViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{}", .0.summary())]
    Ineligible(EligibilityReport),
}

impl AcademicServiceError {
    /// Whether the caller sent data the rules reject, as opposed to a missing record or
    /// a storage failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Movement(_) | Self::Enrollment(_) | Self::Rule(_) | Self::Ineligible(_)
        )
    }
}

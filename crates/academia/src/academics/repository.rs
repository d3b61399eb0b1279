//! Storage contract for the academic record store and the correlativity rules.
//!
//! Callers depend on these traits only; the schema they describe is versioned through
//! [`RECORD_SCHEMA_VERSION`] so adapters can refuse to serve an incompatible layout.

use super::correlativity::RuleChangeSet;
use super::domain::{
    CorrelativityRule, CourseRegistration, CurricularSpace, Enrollment, EnrollmentId, Movement,
    MovementDraft, PlanId, Program, ProgramId, RuleId, SpaceId, Student, StudentId, StudyPlan,
};

pub const RECORD_SCHEMA_VERSION: u32 = 1;

/// Entities owned by the external record store. `insert_*` methods assign identifiers.
pub trait AcademicRecordStore: Send + Sync {
    fn schema_version(&self) -> u32 {
        RECORD_SCHEMA_VERSION
    }

    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError>;
    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError>;

    fn insert_program(&self, program: Program) -> Result<Program, RepositoryError>;
    fn program(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError>;
    fn programs(&self) -> Result<Vec<Program>, RepositoryError>;

    fn insert_plan(&self, plan: StudyPlan) -> Result<StudyPlan, RepositoryError>;
    fn plan(&self, id: PlanId) -> Result<Option<StudyPlan>, RepositoryError>;
    fn plans_of(&self, program: ProgramId) -> Result<Vec<StudyPlan>, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the plan already has a space with
    /// the same name.
    fn insert_space(&self, space: CurricularSpace) -> Result<CurricularSpace, RepositoryError>;
    fn space(&self, id: SpaceId) -> Result<Option<CurricularSpace>, RepositoryError>;
    fn spaces_in_plan(&self, plan: PlanId) -> Result<Vec<CurricularSpace>, RepositoryError>;

    /// Fails with [`RepositoryError::Conflict`] when the student is already enrolled
    /// under the same plan.
    fn insert_enrollment(&self, enrollment: Enrollment) -> Result<Enrollment, RepositoryError>;
    fn update_enrollment(&self, enrollment: Enrollment) -> Result<(), RepositoryError>;
    fn enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, RepositoryError>;

    fn insert_movement(&self, draft: MovementDraft) -> Result<Movement, RepositoryError>;
    fn movements_of(&self, enrollment: EnrollmentId) -> Result<Vec<Movement>, RepositoryError>;

    fn insert_registration(
        &self,
        registration: CourseRegistration,
    ) -> Result<CourseRegistration, RepositoryError>;
    fn registrations_of(
        &self,
        enrollment: EnrollmentId,
    ) -> Result<Vec<CourseRegistration>, RepositoryError>;
}

/// Persistence of correlativity rules.
pub trait CorrelativityStore: Send + Sync {
    fn plan_rules(&self, plan: PlanId) -> Result<Vec<CorrelativityRule>, RepositoryError>;

    fn space_rules(
        &self,
        plan: PlanId,
        space: SpaceId,
    ) -> Result<Vec<CorrelativityRule>, RepositoryError>;

    /// Applies every insert and delete of `changes` or none of them, returning the
    /// resulting rules of the space in definition order. `expected` holds the rule ids
    /// of the whole plan the change set was computed against; a store whose plan rules
    /// differ from it rejects the write with [`RepositoryError::Conflict`].
    fn apply_changes(
        &self,
        plan: PlanId,
        space: SpaceId,
        expected: &[RuleId],
        changes: &RuleChangeSet,
    ) -> Result<Vec<CorrelativityRule>, RepositoryError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error("record store speaks schema v{found}, expected v{expected}")]
    SchemaMismatch { expected: u32, found: u32 },
}

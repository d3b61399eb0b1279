//! Correlativity rules, eligibility evaluation and academic state of enrollments in
//! teacher-training programs.

pub mod conditions;
pub mod correlativity;
pub mod domain;
pub mod eligibility;
pub mod events;
pub mod import;
pub mod memory;
pub mod policy;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod standing;
pub mod validation;

#[cfg(test)]
mod tests;

pub use conditions::{CatalogEntry, ConditionCategory};
pub use correlativity::{CorrelativityGraph, RuleChangeSet, RuleViolation};
pub use domain::{
    Action, AdmissionCompleteness, AdmissionCondition, CareerKind, ConditionCode,
    CorrelativityRule, CourseRegistration, CurricularSpace, DocumentChecklist, Enrollment,
    EnrollmentId, Movement, MovementDraft, MovementId, MovementKind, PlanId, Program, ProgramId,
    RegistrationStatus, Requirement, RuleId, RuleSpec, SpaceFormat, SpaceId, Student, StudentId,
    StudyPlan, Term, YearLevel,
};
pub use eligibility::{
    BlockingReason, EligibilityEvaluator, EligibilityReport, PlanSnapshot, SpaceEligibility,
};
pub use events::{DomainEvent, EventBus, EventError, EventSubscriber};
pub use import::{CatalogImportError, CatalogImporter, ImportSummary};
pub use memory::{ActivityEntry, ActivityLog, InMemoryAcademicStore};
pub use policy::AcademicPolicy;
pub use report::{RecordCard, StudentKpis};
pub use repository::{AcademicRecordStore, CorrelativityStore, RepositoryError};
pub use router::academic_router;
pub use service::{
    AcademicService, AcademicServiceError, AdmissionUpdate, NewEnrollment, NewStudent, SyncSummary,
};
pub use standing::{AcademicStanding, StandingPolicy, StudentHistory};
pub use validation::{EnrollmentViolation, GradingPolicy, MovementGuard, MovementViolation};

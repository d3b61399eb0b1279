use std::sync::Arc;

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::academics::domain::{
    Action, AdmissionCompleteness, AdmissionCondition, ConditionCode, CurricularSpace,
    DocumentChecklist, Enrollment, EnrollmentId, Movement, MovementDraft, MovementId,
    MovementKind, PlanId, Program, ProgramId, Requirement, RuleSpec, SpaceFormat, SpaceId,
    Student, StudentId, StudyPlan, Term, YearLevel,
};
use crate::academics::events::{DomainEvent, EventBus, EventError, EventSubscriber};
use crate::academics::memory::{ActivityLog, InMemoryAcademicStore};
use crate::academics::policy::AcademicPolicy;
use crate::academics::repository::AcademicRecordStore;
use crate::academics::service::{AcademicService, NewEnrollment};
use crate::academics::{academic_router, CorrelativityStore};

pub(super) type MemoryService = AcademicService<InMemoryAcademicStore, InMemoryAcademicStore>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn complete_documents() -> DocumentChecklist {
    DocumentChecklist {
        national_id_legalized: true,
        secondary_title_legalized: true,
        medical_certificate: true,
        id_photos: 2,
        foolscap_folios: 2,
        ..DocumentChecklist::default()
    }
}

pub(super) fn incomplete_documents() -> DocumentChecklist {
    DocumentChecklist {
        national_id_legalized: true,
        id_photos: 1,
        ..DocumentChecklist::default()
    }
}

/// A program with one plan of four spaces, one student, and a service over a shared
/// in-memory store.
pub(super) struct Campus {
    pub(super) service: Arc<MemoryService>,
    pub(super) store: Arc<InMemoryAcademicStore>,
    pub(super) activity: Arc<ActivityLog>,
    pub(super) program: Program,
    pub(super) plan: StudyPlan,
    /// 1° year, first term workshop. No free exam.
    pub(super) workshop: CurricularSpace,
    /// 1° year annual subject. Free exam allowed.
    pub(super) history: CurricularSpace,
    /// 2° year, first term module.
    pub(super) didactics: CurricularSpace,
    /// 2° year annual practicum.
    pub(super) practicum: CurricularSpace,
    pub(super) student: Student,
}

pub(super) fn campus() -> Campus {
    campus_with_bus(EventBus::new())
}

pub(super) fn campus_with_bus(bus: EventBus) -> Campus {
    let store = Arc::new(InMemoryAcademicStore::new());
    let activity = Arc::new(ActivityLog::default());
    let bus = bus.with_subscriber(activity.clone());
    let service = AcademicService::new(store.clone(), store.clone(), AcademicPolicy::default())
        .with_events(bus);

    let program = store
        .insert_program(Program::new("Profesorado de Educación Secundaria en Historia"))
        .expect("program stored");
    let plan = store
        .insert_plan(StudyPlan {
            id: PlanId::default(),
            program_id: program.id,
            resolution: "1935/14".to_string(),
            name: "Plan 2014".to_string(),
            in_force: true,
            superseded_by: None,
        })
        .expect("plan stored");

    let workshop = add_space(
        &store,
        &plan,
        "Taller de Lectura y Escritura",
        YearLevel::First,
        Term::First,
        SpaceFormat::Workshop,
        false,
    );
    let history = add_space(
        &store,
        &plan,
        "Historia Argentina",
        YearLevel::First,
        Term::Annual,
        SpaceFormat::Subject,
        true,
    );
    let didactics = add_space(
        &store,
        &plan,
        "Didáctica General",
        YearLevel::Second,
        Term::First,
        SpaceFormat::Module,
        false,
    );
    let practicum = add_space(
        &store,
        &plan,
        "Práctica Docente I",
        YearLevel::Second,
        Term::Annual,
        SpaceFormat::Practicum,
        false,
    );

    let student = store
        .insert_student(Student {
            id: StudentId::default(),
            national_id: "40123456".to_string(),
            surname: "Gómez".to_string(),
            given_name: "Lucía".to_string(),
            email: Some("lucia.gomez@example.org".to_string()),
            active: true,
        })
        .expect("student stored");

    Campus {
        service: Arc::new(service),
        store,
        activity,
        program,
        plan,
        workshop,
        history,
        didactics,
        practicum,
        student,
    }
}

pub(super) fn add_space(
    store: &InMemoryAcademicStore,
    plan: &StudyPlan,
    name: &str,
    year: YearLevel,
    term: Term,
    format: SpaceFormat,
    free_exam_allowed: bool,
) -> CurricularSpace {
    store
        .insert_space(CurricularSpace {
            id: SpaceId::default(),
            program_id: plan.program_id,
            plan_id: plan.id,
            name: name.to_string(),
            year,
            term,
            hours: 64,
            format,
            free_exam_allowed,
        })
        .expect("space stored")
}

impl Campus {
    pub(super) fn enrollment_request(
        &self,
        documents: DocumentChecklist,
        commitment_note: Option<&str>,
    ) -> NewEnrollment {
        NewEnrollment {
            student_id: self.student.id,
            program_id: self.program.id,
            plan_id: self.plan.id,
            cohort: 2024,
            record_book: Some("L-102".to_string()),
            documents,
            owes_prior_coursework: false,
            owed_detail: None,
            commitment_note: commitment_note.map(str::to_string),
        }
    }

    /// Enrollment with complete paperwork and REGULAR admission.
    pub(super) fn regular_enrollment(&self) -> Enrollment {
        self.service
            .enroll(self.enrollment_request(complete_documents(), None))
            .expect("enrollment accepted")
    }

    pub(super) fn conditional_enrollment(&self) -> Enrollment {
        self.service
            .enroll(self.enrollment_request(
                incomplete_documents(),
                Some("Entregará el título secundario antes de abril"),
            ))
            .expect("conditional enrollment accepted")
    }

    pub(super) fn record(&self, draft: MovementDraft) -> Movement {
        self.service
            .record_movement(draft)
            .expect("movement accepted")
    }

    /// Adds one rule to `space`, keeping the ones it already has.
    pub(super) fn require(
        &self,
        space: &CurricularSpace,
        action: Action,
        requirement: Requirement,
        prerequisite: &CurricularSpace,
    ) {
        let mut desired: Vec<RuleSpec> = self
            .store
            .space_rules(self.plan.id, space.id)
            .expect("rules readable")
            .iter()
            .map(|rule| rule.spec())
            .collect();
        desired.push(RuleSpec {
            action,
            requirement,
            prerequisite: prerequisite.id,
        });
        self.service
            .synchronize(self.plan.id, space.id, desired)
            .expect("rules synchronized");
    }

    /// A space of another program, for mismatch checks.
    pub(super) fn foreign_space(&self) -> CurricularSpace {
        let program = self
            .store
            .insert_program(Program::new("Profesorado de Matemática"))
            .expect("program stored");
        let plan = self
            .store
            .insert_plan(StudyPlan {
                id: PlanId::default(),
                program_id: program.id,
                resolution: "2110/15".to_string(),
                name: "Plan 2015".to_string(),
                in_force: true,
                superseded_by: None,
            })
            .expect("plan stored");
        add_space(
            &self.store,
            &plan,
            "Álgebra I",
            YearLevel::First,
            Term::First,
            SpaceFormat::Subject,
            true,
        )
    }

    pub(super) fn router(&self) -> axum::Router {
        academic_router(self.service.clone())
    }
}

pub(super) fn course(
    enrollment: &Enrollment,
    space: &CurricularSpace,
    on: NaiveDate,
    condition: ConditionCode,
) -> MovementDraft {
    MovementDraft::new(enrollment.id, space.id, MovementKind::Course, on, condition)
}

pub(super) fn final_exam(
    enrollment: &Enrollment,
    space: &CurricularSpace,
    on: NaiveDate,
    condition: ConditionCode,
) -> MovementDraft {
    MovementDraft::new(enrollment.id, space.id, MovementKind::Final, on, condition)
}

/// Enrollment value for state computations that never touch a store.
pub(super) fn enrollment_record() -> Enrollment {
    Enrollment {
        id: EnrollmentId(1),
        student_id: StudentId(1),
        program_id: ProgramId(1),
        plan_id: PlanId(1),
        cohort: 2023,
        record_book: None,
        documents: complete_documents(),
        owes_prior_coursework: false,
        owed_detail: None,
        commitment_note: None,
        completeness: AdmissionCompleteness::Complete,
        condition: AdmissionCondition::Regular,
    }
}

pub(super) fn movement(
    id: u64,
    space: u64,
    kind: MovementKind,
    on: NaiveDate,
    condition: ConditionCode,
    grade: Option<f32>,
) -> Movement {
    Movement {
        id: MovementId(id),
        enrollment_id: EnrollmentId(1),
        space_id: SpaceId(space),
        kind,
        date: on,
        condition,
        grade,
        grade_text: None,
        absent: false,
        justified_absence: false,
        book: None,
        folio: None,
        internal_disposition: None,
    }
}

pub(super) struct FailingSubscriber;

impl EventSubscriber for FailingSubscriber {
    fn notify(&self, _event: &DomainEvent) -> Result<(), EventError> {
        Err(EventError::Unavailable("mail relay offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

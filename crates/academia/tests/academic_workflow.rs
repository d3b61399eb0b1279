//! End-to-end scenarios through the public service facade and HTTP router: a curriculum is
//! loaded from CSV, a student enrolls, rules are edited and outcomes recorded.

mod common {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use academia::academics::{
        AcademicPolicy, AcademicRecordStore, AcademicService, CatalogImporter, CurricularSpace,
        DocumentChecklist, Enrollment, InMemoryAcademicStore, NewEnrollment, Student, StudentId,
    };

    pub(super) type Service = AcademicService<InMemoryAcademicStore, InMemoryAcademicStore>;

    pub(super) const CURRICULUM: &str = "\
program,plan,plan_name,year,term,space,hours,format,free_exam
Profesorado de Educación Primaria,528/09,Plan 2009,1°,1,Pedagogía,64,Asignatura,si
Profesorado de Educación Primaria,528/09,Plan 2009,1°,A,Taller de Oralidad,48,Taller,
Profesorado de Educación Primaria,528/09,Plan 2009,2°,A,Didáctica de la Matemática I,96,Módulo,
";

    pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    pub(super) struct World {
        pub(super) service: Arc<Service>,
        pub(super) spaces: Vec<CurricularSpace>,
        pub(super) enrollment: Enrollment,
    }

    impl World {
        pub(super) fn space(&self, name: &str) -> &CurricularSpace {
            self.spaces
                .iter()
                .find(|space| space.name == name)
                .expect("space imported")
        }
    }

    pub(super) fn world() -> World {
        let store = Arc::new(InMemoryAcademicStore::new());
        let summary =
            CatalogImporter::from_reader(CURRICULUM.as_bytes(), store.as_ref()).expect("import");
        assert_eq!(summary.spaces_created, 3);

        let program = store.programs().expect("programs")[0].clone();
        let plan = store.plans_of(program.id).expect("plans")[0].clone();
        let spaces = store.spaces_in_plan(plan.id).expect("spaces");

        let student = store
            .insert_student(Student {
                id: StudentId::default(),
                national_id: "38999111".to_string(),
                surname: "Ferreyra".to_string(),
                given_name: "Tomás".to_string(),
                email: None,
                active: true,
            })
            .expect("student stored");

        let service = Arc::new(AcademicService::new(
            store.clone(),
            store,
            AcademicPolicy::default(),
        ));
        let enrollment = service
            .enroll(NewEnrollment {
                student_id: student.id,
                program_id: program.id,
                plan_id: plan.id,
                cohort: 2024,
                record_book: None,
                documents: DocumentChecklist {
                    national_id_legalized: true,
                    secondary_title_legalized: true,
                    medical_certificate: true,
                    id_photos: 2,
                    foolscap_folios: 2,
                    ..DocumentChecklist::default()
                },
                owes_prior_coursework: false,
                owed_detail: None,
                commitment_note: None,
            })
            .expect("enrollment accepted");

        World {
            service,
            spaces,
            enrollment,
        }
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use academia::academics::{
    academic_router, Action, ConditionCode, MovementDraft, MovementKind, Requirement, RuleSpec,
};
use common::*;

#[test]
fn imported_curriculum_drives_eligibility() {
    let world = world();
    let pedagogy = world.space("Pedagogía").clone();
    let didactics = world.space("Didáctica de la Matemática I").clone();

    world
        .service
        .synchronize(
            didactics.plan_id,
            didactics.id,
            vec![
                RuleSpec {
                    action: Action::TakeCourse,
                    requirement: Requirement::Regularized,
                    prerequisite: pedagogy.id,
                },
                RuleSpec {
                    action: Action::SitFinal,
                    requirement: Requirement::Approved,
                    prerequisite: pedagogy.id,
                },
            ],
        )
        .expect("rules stored");

    let blocked = world
        .service
        .evaluate(
            world.enrollment.id,
            didactics.id,
            Action::TakeCourse,
            Some(date(2025, 3, 1)),
        )
        .expect("evaluated");
    assert!(!blocked.ok);

    world
        .service
        .record_movement(MovementDraft::new(
            world.enrollment.id,
            pedagogy.id,
            MovementKind::Course,
            date(2024, 11, 28),
            ConditionCode::Regular,
        ))
        .expect("regularity recorded");

    let take = world
        .service
        .evaluate(
            world.enrollment.id,
            didactics.id,
            Action::TakeCourse,
            Some(date(2025, 3, 1)),
        )
        .expect("evaluated");
    assert!(take.ok);

    let sit = world
        .service
        .evaluate(
            world.enrollment.id,
            didactics.id,
            Action::SitFinal,
            Some(date(2025, 3, 1)),
        )
        .expect("evaluated");
    assert!(!sit.ok);
    assert_eq!(sit.blocking_reasons[0].prerequisite, pedagogy.id);

    let kpis = world
        .service
        .kpis(world.enrollment.id, Some(date(2025, 3, 1)))
        .expect("kpis");
    assert_eq!(kpis.totals.spaces, 3);
    assert_eq!(kpis.totals.approved, 0);
    assert!(kpis.missing_correlativities.is_empty());
}

#[tokio::test]
async fn router_serves_the_record_card() {
    let world = world();
    let workshop = world.space("Taller de Oralidad").clone();
    world
        .service
        .record_movement(
            MovementDraft::new(
                world.enrollment.id,
                workshop.id,
                MovementKind::Course,
                date(2024, 11, 20),
                ConditionCode::Approved,
            )
            .with_grade(9.0),
        )
        .expect("workshop approved");

    let router = academic_router(world.service.clone());
    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/academics/enrollments/{}/record-card",
                world.enrollment.id
            ))
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let card: Value = serde_json::from_slice(&bytes).expect("json payload");
    assert_eq!(card["student"], json!("Ferreyra, Tomás (38999111)"));
    let approved: Vec<&str> = card["rows"]
        .as_array()
        .expect("rows")
        .iter()
        .filter(|row| row["approved"] == json!(true))
        .filter_map(|row| row["name"].as_str())
        .collect();
    assert_eq!(approved, vec!["Taller de Oralidad"]);
}

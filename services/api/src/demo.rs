use crate::infra::{build_service, MemoryService};
use academia::academics::conditions::{catalog, final_conditions, normalize_format};
use academia::academics::{
    AcademicPolicy, AcademicRecordStore, AcademicServiceError, Action, ActivityLog,
    CatalogImporter, ConditionCode, CurricularSpace, DocumentChecklist, EnrollmentId, EventBus,
    InMemoryAcademicStore, MovementDraft, MovementKind, NewEnrollment, NewStudent, Requirement,
    RuleSpec,
};
use academia::error::AppError;
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_CURRICULUM: &str = "\
program,plan,plan_name,year,term,space,hours,format,free_exam
Profesorado de Educación Secundaria en Historia,1935/14,Plan 2014,1°,1,Taller de Lectura y Escritura,64,Taller,
Profesorado de Educación Secundaria en Historia,1935/14,Plan 2014,1°,A,Historia Argentina I,96,Asignatura,si
Profesorado de Educación Secundaria en Historia,1935/14,Plan 2014,2°,1,Didáctica General,64,Módulo,
Profesorado de Educación Secundaria en Historia,1935/14,Plan 2014,2°,A,Historia Argentina II,96,Asignatura,si
";

#[derive(Args, Debug)]
pub(crate) struct ConditionsArgs {
    /// Space format as written in the plan (Asignatura, Módulo, Taller, Práctica)
    #[arg(long, default_value = "Asignatura")]
    pub(crate) format: String,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Curriculum CSV with program,plan,plan_name,year,term,space,hours,format,free_exam
    pub(crate) path: PathBuf,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_conditions(args: ConditionsArgs) {
    let format = normalize_format(&args.format);
    println!("Outcomes for {}", format.label());
    for entry in catalog(format) {
        println!("  - {:<16} {}", entry.code.code(), entry.label);
    }
    println!("Final exam outcomes");
    for entry in final_conditions() {
        println!("  - {:<16} {}", entry.code.code(), entry.label);
    }
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let store = InMemoryAcademicStore::new();
    let summary = CatalogImporter::from_path(&args.path, &store)?;
    println!("Curriculum file {}", args.path.display());
    println!(
        "- {} programs | {} plans | {} spaces | {} duplicate rows skipped",
        summary.programs_created,
        summary.plans_created,
        summary.spaces_created,
        summary.spaces_skipped
    );
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let store = Arc::new(InMemoryAcademicStore::new());
    CatalogImporter::from_reader(DEMO_CURRICULUM.as_bytes(), store.as_ref())?;

    let activity = Arc::new(ActivityLog::default());
    let service = build_service(
        store.clone(),
        AcademicPolicy::default(),
        EventBus::new().with_subscriber(activity.clone()),
    );
    let campus = DemoCampus::load(&store)?;

    println!("Academic records demo (as of {today})");
    let student = service.register_student(NewStudent {
        national_id: "40123456".to_string(),
        surname: "Gómez".to_string(),
        given_name: "Lucía".to_string(),
        email: None,
    })?;
    let enrollment = service.enroll(NewEnrollment {
        student_id: student.id,
        program_id: campus.history_one.program_id,
        plan_id: campus.history_one.plan_id,
        cohort: 2024,
        record_book: Some("L-7".to_string()),
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
    })?;
    println!(
        "- Enrolled {} with {} admission",
        student.display_name(),
        enrollment.condition.label()
    );

    let target = &campus.history_two;
    service.synchronize(
        target.plan_id,
        target.id,
        vec![
            RuleSpec {
                action: Action::TakeCourse,
                requirement: Requirement::Regularized,
                prerequisite: campus.history_one.id,
            },
            RuleSpec {
                action: Action::SitFinal,
                requirement: Requirement::Approved,
                prerequisite: campus.history_one.id,
            },
        ],
    )?;

    print_eligibility(&service, enrollment.id, target, today)?;

    let regular_on = today - chrono::Duration::days(120);
    service.record_movement(MovementDraft::new(
        enrollment.id,
        campus.history_one.id,
        MovementKind::Course,
        regular_on,
        ConditionCode::Regular,
    ))?;
    service.record_movement(
        MovementDraft::new(
            enrollment.id,
            campus.workshop.id,
            MovementKind::Course,
            regular_on,
            ConditionCode::Approved,
        )
        .with_grade(8.0),
    )?;
    println!("\nAfter regularizing {}:", campus.history_one.name);
    print_eligibility(&service, enrollment.id, target, today)?;

    let kpis = service.kpis(enrollment.id, Some(today))?;
    println!("\nProgress");
    println!(
        "- {} of {} spaces approved | {} pending | average {}",
        kpis.totals.approved,
        kpis.totals.spaces,
        kpis.totals.pending,
        kpis.average
            .map(|average| format!("{average:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    for expiring in &kpis.expiring_regularities {
        println!(
            "- Regularity in {} expires on {} ({} days left)",
            expiring.space_name, expiring.expires_on, expiring.days_left
        );
    }
    for missing in &kpis.missing_correlativities {
        println!(
            "- {} blocked: {} unmet prerequisite(s)",
            missing.space_name,
            missing.blocking_reasons.len()
        );
    }

    println!("\nSpaces open to course");
    for row in service.eligible_spaces(enrollment.id, Action::TakeCourse, Some(today))? {
        let mark = if row.report.ok { "open" } else { "blocked" };
        println!("  {} {:<32} {}", row.year.label(), row.name, mark);
    }

    let card = service.record_card(enrollment.id)?;
    println!("\nRecord card: {} | {}", card.student, card.program);
    for row in &card.rows {
        let outcome = row
            .course_outcomes
            .last()
            .map(|outcome| outcome.condition_label)
            .unwrap_or("-");
        let mark = if row.approved { "approved" } else { outcome };
        println!(
            "  {} {} {:<32} {}",
            row.year_label, row.term_label, row.name, mark
        );
    }

    println!("\n{} events recorded", activity.entries().len());
    Ok(())
}

struct DemoCampus {
    workshop: CurricularSpace,
    history_one: CurricularSpace,
    history_two: CurricularSpace,
}

impl DemoCampus {
    fn load(store: &InMemoryAcademicStore) -> Result<Self, AppError> {
        let spaces = store
            .programs()
            .and_then(|programs| {
                let mut spaces = Vec::new();
                for program in programs {
                    for plan in store.plans_of(program.id)? {
                        spaces.extend(store.spaces_in_plan(plan.id)?);
                    }
                }
                Ok(spaces)
            })
            .map_err(AcademicServiceError::from)?;
        let find = |name: &str| {
            spaces
                .iter()
                .find(|space| space.name == name)
                .cloned()
                .ok_or_else(|| {
                    AcademicServiceError::NotFound(format!("space {name}"))
                })
        };
        Ok(Self {
            workshop: find("Taller de Lectura y Escritura")?,
            history_one: find("Historia Argentina I")?,
            history_two: find("Historia Argentina II")?,
        })
    }
}

fn print_eligibility(
    service: &MemoryService,
    enrollment: EnrollmentId,
    space: &CurricularSpace,
    today: NaiveDate,
) -> Result<(), AppError> {
    for action in [Action::TakeCourse, Action::SitFinal] {
        let report = service.evaluate(enrollment, space.id, action, Some(today))?;
        println!("- {} {}: {}", action.code(), space.heading(), report.summary());
        for reason in &report.blocking_reasons {
            println!("    * {}", reason.reason);
        }
    }
    Ok(())
}

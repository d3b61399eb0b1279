use super::super::domain::{Movement, MovementKind, Program, Student};
use super::super::eligibility::PlanSnapshot;
use super::super::standing::{AcademicStanding, StudentHistory};
use super::views::{CourseOutcomeView, FinalExamView, RecordCard, RecordCardRow};

pub fn build_record_card(
    standing: &AcademicStanding,
    student: &Student,
    program: &Program,
    plan: &PlanSnapshot,
    history: &StudentHistory,
) -> RecordCard {
    let rows = plan
        .ordered_spaces()
        .into_iter()
        .map(|space| {
            let mut movements: Vec<&Movement> = history.for_space(space.id).collect();
            movements.sort_by_key(|movement| (movement.date, movement.id));

            let course_outcomes = movements
                .iter()
                .filter(|movement| movement.kind == MovementKind::Course)
                .map(|movement| CourseOutcomeView {
                    date: movement.date,
                    condition: movement.condition,
                    condition_label: movement.condition.label(),
                    grade: movement.effective_grade(),
                })
                .collect();

            let final_exams = movements
                .iter()
                .filter(|movement| movement.kind == MovementKind::Final)
                .map(|movement| FinalExamView {
                    date: movement.date,
                    condition: movement.condition,
                    condition_label: movement.condition.label(),
                    grade: movement.grade,
                    grade_text: movement.grade_text.clone(),
                    absent: movement.absent,
                    book: movement.book.clone(),
                    folio: movement.folio.clone(),
                })
                .collect();

            RecordCardRow {
                space: space.id,
                name: space.name.clone(),
                year: space.year,
                year_label: space.year.label(),
                term: space.term,
                term_label: space.term.label(),
                format: space.format,
                course_outcomes,
                final_exams,
                approved: standing.has_approved(history, space.id),
            }
        })
        .collect();

    RecordCard {
        enrollment: history.enrollment.id,
        student: student.display_name(),
        program: program.name.clone(),
        plan_resolution: plan.plan.resolution.clone(),
        admission_condition: history.enrollment.condition,
        admission_label: history.enrollment.condition.label(),
        rows,
    }
}

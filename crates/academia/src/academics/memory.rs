//! In-process record store used by the service binary, demos and tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::correlativity::RuleChangeSet;
use super::domain::{
    CorrelativityRule, CourseRegistration, CurricularSpace, Enrollment, EnrollmentId, Movement,
    MovementDraft, MovementId, PlanId, Program, ProgramId, RuleId, SpaceId, Student, StudentId,
    StudyPlan,
};
use super::events::{DomainEvent, EventError, EventSubscriber};
use super::repository::{AcademicRecordStore, CorrelativityStore, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    next_id: u64,
    students: BTreeMap<StudentId, Student>,
    programs: BTreeMap<ProgramId, Program>,
    plans: BTreeMap<PlanId, StudyPlan>,
    spaces: BTreeMap<SpaceId, CurricularSpace>,
    enrollments: BTreeMap<EnrollmentId, Enrollment>,
    movements: BTreeMap<MovementId, Movement>,
    registrations: Vec<CourseRegistration>,
    rules: BTreeMap<RuleId, CorrelativityRule>,
}

impl StoreState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Both store traits behind one lock, so rule changes apply as a single unit.
#[derive(Debug, Default)]
pub struct InMemoryAcademicStore {
    state: Mutex<StoreState>,
}

impl InMemoryAcademicStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, StoreState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("record store lock poisoned".to_string()))
    }
}

impl AcademicRecordStore for InMemoryAcademicStore {
    fn insert_student(&self, mut student: Student) -> Result<Student, RepositoryError> {
        let mut state = self.state()?;
        if state
            .students
            .values()
            .any(|existing| existing.national_id == student.national_id)
        {
            return Err(RepositoryError::Conflict(format!(
                "student with national id {}",
                student.national_id
            )));
        }
        student.id = StudentId(state.allocate());
        state.students.insert(student.id, student.clone());
        Ok(student)
    }

    fn student(&self, id: StudentId) -> Result<Option<Student>, RepositoryError> {
        Ok(self.state()?.students.get(&id).cloned())
    }

    fn insert_program(&self, mut program: Program) -> Result<Program, RepositoryError> {
        let mut state = self.state()?;
        if state
            .programs
            .values()
            .any(|existing| existing.name == program.name)
        {
            return Err(RepositoryError::Conflict(format!("program '{}'", program.name)));
        }
        program.id = ProgramId(state.allocate());
        state.programs.insert(program.id, program.clone());
        Ok(program)
    }

    fn program(&self, id: ProgramId) -> Result<Option<Program>, RepositoryError> {
        Ok(self.state()?.programs.get(&id).cloned())
    }

    fn programs(&self) -> Result<Vec<Program>, RepositoryError> {
        Ok(self.state()?.programs.values().cloned().collect())
    }

    fn insert_plan(&self, mut plan: StudyPlan) -> Result<StudyPlan, RepositoryError> {
        let mut state = self.state()?;
        if !state.programs.contains_key(&plan.program_id) {
            return Err(RepositoryError::NotFound);
        }
        if state.plans.values().any(|existing| {
            existing.program_id == plan.program_id && existing.resolution == plan.resolution
        }) {
            return Err(RepositoryError::Conflict(format!(
                "plan {} for program {}",
                plan.resolution, plan.program_id
            )));
        }
        plan.id = PlanId(state.allocate());
        state.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    fn plan(&self, id: PlanId) -> Result<Option<StudyPlan>, RepositoryError> {
        Ok(self.state()?.plans.get(&id).cloned())
    }

    fn plans_of(&self, program: ProgramId) -> Result<Vec<StudyPlan>, RepositoryError> {
        Ok(self
            .state()?
            .plans
            .values()
            .filter(|plan| plan.program_id == program)
            .cloned()
            .collect())
    }

    fn insert_space(&self, mut space: CurricularSpace) -> Result<CurricularSpace, RepositoryError> {
        let mut state = self.state()?;
        if !state.plans.contains_key(&space.plan_id) {
            return Err(RepositoryError::NotFound);
        }
        if state
            .spaces
            .values()
            .any(|existing| existing.plan_id == space.plan_id && existing.name == space.name)
        {
            return Err(RepositoryError::Conflict(format!(
                "space '{}' in plan {}",
                space.name, space.plan_id
            )));
        }
        space.id = SpaceId(state.allocate());
        state.spaces.insert(space.id, space.clone());
        Ok(space)
    }

    fn space(&self, id: SpaceId) -> Result<Option<CurricularSpace>, RepositoryError> {
        Ok(self.state()?.spaces.get(&id).cloned())
    }

    fn spaces_in_plan(&self, plan: PlanId) -> Result<Vec<CurricularSpace>, RepositoryError> {
        Ok(self
            .state()?
            .spaces
            .values()
            .filter(|space| space.plan_id == plan)
            .cloned()
            .collect())
    }

    fn insert_enrollment(&self, mut enrollment: Enrollment) -> Result<Enrollment, RepositoryError> {
        let mut state = self.state()?;
        if state.enrollments.values().any(|existing| {
            existing.student_id == enrollment.student_id && existing.plan_id == enrollment.plan_id
        }) {
            return Err(RepositoryError::Conflict(format!(
                "student {} already enrolled in plan {}",
                enrollment.student_id, enrollment.plan_id
            )));
        }
        enrollment.id = EnrollmentId(state.allocate());
        state.enrollments.insert(enrollment.id, enrollment.clone());
        Ok(enrollment)
    }

    fn update_enrollment(&self, enrollment: Enrollment) -> Result<(), RepositoryError> {
        let mut state = self.state()?;
        match state.enrollments.get_mut(&enrollment.id) {
            Some(slot) => {
                *slot = enrollment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn enrollment(&self, id: EnrollmentId) -> Result<Option<Enrollment>, RepositoryError> {
        Ok(self.state()?.enrollments.get(&id).cloned())
    }

    fn insert_movement(&self, draft: MovementDraft) -> Result<Movement, RepositoryError> {
        let mut state = self.state()?;
        if !state.enrollments.contains_key(&draft.enrollment_id) {
            return Err(RepositoryError::NotFound);
        }
        let movement = draft.into_movement(MovementId(state.allocate()));
        state.movements.insert(movement.id, movement.clone());
        Ok(movement)
    }

    fn movements_of(&self, enrollment: EnrollmentId) -> Result<Vec<Movement>, RepositoryError> {
        Ok(self
            .state()?
            .movements
            .values()
            .filter(|movement| movement.enrollment_id == enrollment)
            .cloned()
            .collect())
    }

    fn insert_registration(
        &self,
        registration: CourseRegistration,
    ) -> Result<CourseRegistration, RepositoryError> {
        let mut state = self.state()?;
        if state.registrations.iter().any(|existing| {
            existing.enrollment_id == registration.enrollment_id
                && existing.space_id == registration.space_id
                && existing.academic_year == registration.academic_year
        }) {
            return Err(RepositoryError::Conflict(format!(
                "registration to space {} in {}",
                registration.space_id, registration.academic_year
            )));
        }
        state.registrations.push(registration.clone());
        Ok(registration)
    }

    fn registrations_of(
        &self,
        enrollment: EnrollmentId,
    ) -> Result<Vec<CourseRegistration>, RepositoryError> {
        Ok(self
            .state()?
            .registrations
            .iter()
            .filter(|registration| registration.enrollment_id == enrollment)
            .cloned()
            .collect())
    }
}

impl CorrelativityStore for InMemoryAcademicStore {
    fn plan_rules(&self, plan: PlanId) -> Result<Vec<CorrelativityRule>, RepositoryError> {
        Ok(self
            .state()?
            .rules
            .values()
            .filter(|rule| rule.plan_id == plan)
            .cloned()
            .collect())
    }

    fn space_rules(
        &self,
        plan: PlanId,
        space: SpaceId,
    ) -> Result<Vec<CorrelativityRule>, RepositoryError> {
        Ok(self
            .state()?
            .rules
            .values()
            .filter(|rule| rule.plan_id == plan && rule.space_id == space)
            .cloned()
            .collect())
    }

    fn apply_changes(
        &self,
        plan: PlanId,
        space: SpaceId,
        expected: &[RuleId],
        changes: &RuleChangeSet,
    ) -> Result<Vec<CorrelativityRule>, RepositoryError> {
        let mut state = self.state()?;

        // Everything is checked before the first mutation.
        let stored: Vec<RuleId> = state
            .rules
            .values()
            .filter(|rule| rule.plan_id == plan)
            .map(|rule| rule.id)
            .collect();
        let mut baseline = expected.to_vec();
        baseline.sort();
        if stored != baseline {
            return Err(RepositoryError::Conflict(format!(
                "rules of plan {plan} changed concurrently"
            )));
        }
        for id in &changes.deletes {
            match state.rules.get(id) {
                Some(rule) if rule.plan_id == plan && rule.space_id == space => {}
                _ => {
                    return Err(RepositoryError::Conflict(format!(
                        "rule {id} changed concurrently"
                    )))
                }
            }
        }
        for spec in &changes.inserts {
            if state.rules.values().any(|rule| {
                rule.plan_id == plan && rule.space_id == space && rule.spec() == *spec
            }) {
                return Err(RepositoryError::Conflict(format!(
                    "rule {} {} on space {} already present",
                    spec.action.code(),
                    spec.requirement.code(),
                    spec.prerequisite
                )));
            }
        }

        for id in &changes.deletes {
            state.rules.remove(id);
        }
        for spec in &changes.inserts {
            let id = RuleId(state.allocate());
            state.rules.insert(
                id,
                CorrelativityRule {
                    id,
                    plan_id: plan,
                    space_id: space,
                    action: spec.action,
                    requirement: spec.requirement,
                    prerequisite: spec.prerequisite,
                },
            );
        }

        Ok(state
            .rules
            .values()
            .filter(|rule| rule.plan_id == plan && rule.space_id == space)
            .cloned()
            .collect())
    }
}

/// One line of the activity feed shown to staff.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub recorded_at: DateTime<Utc>,
    pub event: DomainEvent,
}

/// Subscriber that keeps every published event in memory.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
}

impl ActivityLog {
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn events(&self) -> Vec<DomainEvent> {
        self.entries()
            .into_iter()
            .map(|entry| entry.event)
            .collect()
    }
}

impl EventSubscriber for ActivityLog {
    fn notify(&self, event: &DomainEvent) -> Result<(), EventError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| EventError::Unavailable("activity log lock poisoned".to_string()))?;
        entries.push(ActivityEntry {
            recorded_at: Utc::now(),
            event: event.clone(),
        });
        Ok(())
    }
}

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Identifier of a registered student.
    StudentId
);
record_id!(
    /// Identifier of a teacher-training program ("profesorado").
    ProgramId
);
record_id!(
    /// Identifier of a study plan.
    PlanId
);
record_id!(
    /// Identifier of a curricular space.
    SpaceId
);
record_id!(
    /// Identifier of a student-in-program enrollment.
    EnrollmentId
);
record_id!(MovementId);
record_id!(
    /// Correlativity rule identifier; also the rule's definition order.
    RuleId
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub national_id: String,
    pub surname: String,
    pub given_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl Student {
    pub fn display_name(&self) -> String {
        format!("{}, {} ({})", self.surname, self.given_name, self.national_id)
    }
}

fn default_true() -> bool {
    true
}

/// Distinguishes regular careers from the teaching-certification track, which has a
/// different admission checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CareerKind {
    Standard,
    TeachingCertification,
}

impl CareerKind {
    pub fn from_program_name(name: &str) -> Self {
        let lowered = name.to_lowercase();
        if lowered.contains("certificación") || lowered.contains("certificacion") {
            Self::TeachingCertification
        } else {
            Self::Standard
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub kind: CareerKind,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let kind = CareerKind::from_program_name(&name);
        Self {
            id: ProgramId::default(),
            name,
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub id: PlanId,
    pub program_id: ProgramId,
    /// Approving resolution, e.g. `1935/14`.
    pub resolution: String,
    pub name: String,
    pub in_force: bool,
    #[serde(default)]
    pub superseded_by: Option<PlanId>,
}

/// Year of the career a space belongs to. Only 1° to 4° exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum YearLevel {
    #[serde(rename = "1°")]
    First,
    #[serde(rename = "2°")]
    Second,
    #[serde(rename = "3°")]
    Third,
    #[serde(rename = "4°")]
    Fourth,
}

impl YearLevel {
    pub const fn ordered() -> [Self; 4] {
        [Self::First, Self::Second, Self::Third, Self::Fourth]
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "1°",
            Self::Second => "2°",
            Self::Third => "3°",
            Self::Fourth => "4°",
        }
    }

    pub fn from_number(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            4 => Some(Self::Fourth),
            _ => None,
        }
    }

    /// Accepts `1°`, `1º`, `1` and similar spellings.
    pub fn parse(raw: &str) -> Option<Self> {
        let digits: String = raw.trim().chars().filter(char::is_ascii_digit).collect();
        digits.parse::<u8>().ok().and_then(Self::from_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "1")]
    First,
    #[serde(rename = "2")]
    Second,
    #[serde(rename = "A")]
    Annual,
}

impl Term {
    pub const fn label(self) -> &'static str {
        match self {
            Self::First => "1º Cuatr.",
            Self::Second => "2º Cuatr.",
            Self::Annual => "Anual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "1" => Some(Self::First),
            "2" => Some(Self::Second),
            "a" | "anual" | "annual" => Some(Self::Annual),
            _ => None,
        }
    }
}

/// Pedagogical format of a curricular space; decides which outcomes it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceFormat {
    Subject,
    Module,
    Workshop,
    Practicum,
}

impl SpaceFormat {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Subject => "Asignatura",
            Self::Module => "Módulo",
            Self::Workshop => "Taller",
            Self::Practicum => "Prácticas",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurricularSpace {
    pub id: SpaceId,
    pub program_id: ProgramId,
    pub plan_id: PlanId,
    pub name: String,
    pub year: YearLevel,
    pub term: Term,
    #[serde(default)]
    pub hours: u16,
    pub format: SpaceFormat,
    /// Whether the final exam may be sat as "Libre" (without regularity).
    #[serde(default)]
    pub free_exam_allowed: bool,
}

impl CurricularSpace {
    pub fn heading(&self) -> String {
        format!("{} {} - {}", self.year.label(), self.term.label(), self.name)
    }
}

/// Paper trail handed in at admission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentChecklist {
    pub national_id_legalized: bool,
    pub secondary_title_legalized: bool,
    pub medical_certificate: bool,
    pub id_photos: u8,
    pub foolscap_folios: u8,
    pub higher_title_legalized: bool,
    pub title_competencies: bool,
    pub secondary_title_in_progress: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionCompleteness {
    Complete,
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdmissionCondition {
    Regular,
    Conditional,
}

impl AdmissionCondition {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Conditional => "conditional",
        }
    }
}

/// A student's enrollment in one program under one plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: EnrollmentId,
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
    pub completeness: AdmissionCompleteness,
    pub condition: AdmissionCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementKind {
    /// Course-taking outcome.
    #[serde(rename = "REG")]
    Course,
    /// Final exam outcome.
    #[serde(rename = "FIN")]
    Final,
}

impl MovementKind {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Course => "REG",
            Self::Final => "FIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionCode {
    #[serde(rename = "PROMOCION")]
    Promotion,
    #[serde(rename = "APROBADO")]
    Approved,
    #[serde(rename = "REGULAR")]
    Regular,
    #[serde(rename = "DESAPROBADO_TP")]
    FailedPracticalWork,
    #[serde(rename = "DESAPROBADO_PA")]
    FailedMidterm,
    #[serde(rename = "LIBRE_I")]
    FreeByAbsence,
    #[serde(rename = "LIBRE_AT")]
    FreeByEarlyDropout,
    #[serde(rename = "LIBRE")]
    Free,
    #[serde(rename = "EQUIVALENCIA")]
    Equivalence,
}

impl ConditionCode {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Promotion => "PROMOCION",
            Self::Approved => "APROBADO",
            Self::Regular => "REGULAR",
            Self::FailedPracticalWork => "DESAPROBADO_TP",
            Self::FailedMidterm => "DESAPROBADO_PA",
            Self::FreeByAbsence => "LIBRE_I",
            Self::FreeByEarlyDropout => "LIBRE_AT",
            Self::Free => "LIBRE",
            Self::Equivalence => "EQUIVALENCIA",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Promotion => "Promoción",
            Self::Approved => "Aprobado",
            Self::Regular => "Regular",
            Self::FailedPracticalWork => "Desaprobado TP",
            Self::FailedMidterm => "Desaprobado Parcial",
            Self::FreeByAbsence => "Libre por inasistencias",
            Self::FreeByEarlyDropout => "Libre por abandono temprano",
            Self::Free => "Libre",
            Self::Equivalence => "Equivalencia",
        }
    }

    /// Course outcomes that approve the space without a final exam.
    pub const fn approves_course(self) -> bool {
        matches!(self, Self::Promotion | Self::Approved)
    }

    pub const fn is_free(self) -> bool {
        matches!(
            self,
            Self::Free | Self::FreeByAbsence | Self::FreeByEarlyDropout
        )
    }
}

/// Movement as submitted for validation, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub enrollment_id: EnrollmentId,
    pub space_id: SpaceId,
    pub kind: MovementKind,
    pub date: NaiveDate,
    pub condition: ConditionCode,
    #[serde(default)]
    pub grade: Option<f32>,
    #[serde(default)]
    pub grade_text: Option<String>,
    #[serde(default)]
    pub absent: bool,
    #[serde(default)]
    pub justified_absence: bool,
    #[serde(default)]
    pub book: Option<String>,
    #[serde(default)]
    pub folio: Option<String>,
    #[serde(default)]
    pub internal_disposition: Option<String>,
}

impl MovementDraft {
    pub fn new(
        enrollment_id: EnrollmentId,
        space_id: SpaceId,
        kind: MovementKind,
        date: NaiveDate,
        condition: ConditionCode,
    ) -> Self {
        Self {
            enrollment_id,
            space_id,
            kind,
            date,
            condition,
            grade: None,
            grade_text: None,
            absent: false,
            justified_absence: false,
            book: None,
            folio: None,
            internal_disposition: None,
        }
    }

    pub fn with_grade(mut self, grade: f32) -> Self {
        self.grade = Some(grade);
        self
    }

    pub fn into_movement(self, id: MovementId) -> Movement {
        Movement {
            id,
            enrollment_id: self.enrollment_id,
            space_id: self.space_id,
            kind: self.kind,
            date: self.date,
            condition: self.condition,
            grade: self.grade,
            grade_text: self.grade_text,
            absent: self.absent,
            justified_absence: self.justified_absence,
            book: self.book,
            folio: self.folio,
            internal_disposition: self.internal_disposition,
        }
    }
}

/// Recorded academic event of an enrollment against a space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    pub enrollment_id: EnrollmentId,
    pub space_id: SpaceId,
    pub kind: MovementKind,
    pub date: NaiveDate,
    pub condition: ConditionCode,
    pub grade: Option<f32>,
    pub grade_text: Option<String>,
    pub absent: bool,
    pub justified_absence: bool,
    pub book: Option<String>,
    pub folio: Option<String>,
    pub internal_disposition: Option<String>,
}

impl Movement {
    /// Numeric grade, falling back to the first run of digits in the grade text.
    pub fn effective_grade(&self) -> Option<f32> {
        if let Some(grade) = self.grade {
            return Some(grade);
        }
        let text = self.grade_text.as_deref()?;
        let digits: String = text
            .chars()
            .skip_while(|ch| !ch.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        digits
            .parse::<u8>()
            .ok()
            .filter(|value| *value <= 10)
            .map(f32::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    Active,
    Dropped,
}

/// Sign-up of an enrollment to take a space during an academic year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRegistration {
    pub enrollment_id: EnrollmentId,
    pub space_id: SpaceId,
    pub academic_year: u16,
    pub date: NaiveDate,
    pub status: RegistrationStatus,
}

/// What a correlativity rule gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Enroll in and take the course.
    #[serde(rename = "CURSAR")]
    TakeCourse,
    /// Sit the final exam.
    #[serde(rename = "RENDIR")]
    SitFinal,
}

impl Action {
    pub const fn code(self) -> &'static str {
        match self {
            Self::TakeCourse => "CURSAR",
            Self::SitFinal => "RENDIR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Requirement {
    #[serde(rename = "REGULARIZADA")]
    Regularized,
    #[serde(rename = "APROBADA")]
    Approved,
}

impl Requirement {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Regularized => "REGULARIZADA",
            Self::Approved => "APROBADA",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Regularized => "regularized",
            Self::Approved => "approved",
        }
    }
}

/// The identity of a rule within a (plan, space) pair; synchronization diffs on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RuleSpec {
    pub action: Action,
    pub requirement: Requirement,
    pub prerequisite: SpaceId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelativityRule {
    pub id: RuleId,
    pub plan_id: PlanId,
    pub space_id: SpaceId,
    pub action: Action,
    pub requirement: Requirement,
    pub prerequisite: SpaceId,
}

impl CorrelativityRule {
    pub fn spec(&self) -> RuleSpec {
        RuleSpec {
            action: self.action,
            requirement: self.requirement,
            prerequisite: self.prerequisite,
        }
    }
}

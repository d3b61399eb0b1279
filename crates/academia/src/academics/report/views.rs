use chrono::NaiveDate;
use serde::Serialize;

use super::super::domain::{
    AdmissionCondition, ConditionCode, EnrollmentId, SpaceFormat, SpaceId, Term, YearLevel,
};
use super::super::eligibility::BlockingReason;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KpiTotals {
    pub spaces: usize,
    pub approved: usize,
    pub promoted: usize,
    pub free: usize,
    pub pending: usize,
}

/// Regularity valid today that lapses before the end of the alert window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpiringRegularity {
    pub space: SpaceId,
    pub space_name: String,
    pub regular_since: NaiveDate,
    pub expires_on: NaiveDate,
    pub days_left: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCorrelativity {
    pub space: SpaceId,
    pub space_name: String,
    pub blocking_reasons: Vec<BlockingReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentKpis {
    pub enrollment: EnrollmentId,
    pub as_of: NaiveDate,
    pub average: Option<f32>,
    pub totals: KpiTotals,
    pub expiring_regularities: Vec<ExpiringRegularity>,
    pub missing_correlativities: Vec<MissingCorrelativity>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseOutcomeView {
    pub date: NaiveDate,
    pub condition: ConditionCode,
    pub condition_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalExamView {
    pub date: NaiveDate,
    pub condition: ConditionCode,
    pub condition_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_text: Option<String>,
    pub absent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordCardRow {
    pub space: SpaceId,
    pub name: String,
    pub year: YearLevel,
    pub year_label: &'static str,
    pub term: Term,
    pub term_label: &'static str,
    pub format: SpaceFormat,
    pub course_outcomes: Vec<CourseOutcomeView>,
    pub final_exams: Vec<FinalExamView>,
    pub approved: bool,
}

/// Printable academic record ("cartón") of one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordCard {
    pub enrollment: EnrollmentId,
    pub student: String,
    pub program: String,
    pub plan_resolution: String,
    pub admission_condition: AdmissionCondition,
    pub admission_label: &'static str,
    pub rows: Vec<RecordCardRow>,
}

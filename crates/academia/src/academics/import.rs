//! Curriculum loader: reads plan and space rows from CSV into the record store.
//!
//! Expected headers: `program,plan,plan_name,year,term,space,hours,format,free_exam`.
//! Missing programs and plans are created on the fly; a space already present in its
//! plan is skipped, so a file can be loaded more than once.

use std::fmt;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use super::conditions::normalize_format;
use super::domain::{
    CurricularSpace, PlanId, Program, ProgramId, SpaceId, StudyPlan, Term, YearLevel,
};
use super::repository::{AcademicRecordStore, RepositoryError};

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Row { line: u64, message: String },
    Repository(RepositoryError),
}

impl fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read curriculum file: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid curriculum CSV data: {}", err),
            CatalogImportError::Row { line, message } => {
                write!(f, "row {}: {}", line, message)
            }
            CatalogImportError::Repository(err) => {
                write!(f, "could not store curriculum data: {}", err)
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Row { .. } => None,
            CatalogImportError::Repository(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<RepositoryError> for CatalogImportError {
    fn from(err: RepositoryError) -> Self {
        Self::Repository(err)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub programs_created: usize,
    pub plans_created: usize,
    pub spaces_created: usize,
    pub spaces_skipped: usize,
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    program: String,
    plan: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    plan_name: Option<String>,
    year: String,
    term: String,
    space: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    hours: Option<String>,
    #[serde(default)]
    format: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    free_exam: Option<String>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|value| value.trim().to_lowercase()).as_deref(),
        Some("1" | "x" | "true" | "yes" | "si" | "sí" | "s")
    )
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P, S>(path: P, store: &S) -> Result<ImportSummary, CatalogImportError>
    where
        P: AsRef<Path>,
        S: AcademicRecordStore + ?Sized,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, store)
    }

    pub fn from_reader<R, S>(reader: R, store: &S) -> Result<ImportSummary, CatalogImportError>
    where
        R: Read,
        S: AcademicRecordStore + ?Sized,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut summary = ImportSummary::default();

        for (index, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            // Header is line 1.
            let line = index as u64 + 2;
            let row = record?;

            let year = YearLevel::parse(&row.year).ok_or_else(|| CatalogImportError::Row {
                line,
                message: format!("year '{}' must be one of 1° to 4°", row.year),
            })?;
            let term = Term::parse(&row.term).ok_or_else(|| CatalogImportError::Row {
                line,
                message: format!("term '{}' must be 1, 2 or A", row.term),
            })?;
            let hours = match row.hours.as_deref() {
                Some(raw) => raw.parse::<u16>().map_err(|_| CatalogImportError::Row {
                    line,
                    message: format!("hours '{raw}' is not a whole number"),
                })?,
                None => 0,
            };
            if row.program.is_empty() || row.plan.is_empty() || row.space.is_empty() {
                return Err(CatalogImportError::Row {
                    line,
                    message: "program, plan and space are required".to_string(),
                });
            }

            let program_id = ensure_program(store, &row.program, &mut summary)?;
            let plan_id = ensure_plan(
                store,
                program_id,
                &row.plan,
                row.plan_name.as_deref(),
                &mut summary,
            )?;

            let space = CurricularSpace {
                id: SpaceId::default(),
                program_id,
                plan_id,
                name: row.space.clone(),
                year,
                term,
                hours,
                format: normalize_format(&row.format),
                free_exam_allowed: parse_flag(row.free_exam.as_deref()),
            };
            match store.insert_space(space) {
                Ok(stored) => {
                    debug!(space = %stored.id, name = %stored.name, "space imported");
                    summary.spaces_created += 1;
                }
                Err(RepositoryError::Conflict(_)) => summary.spaces_skipped += 1,
                Err(err) => return Err(err.into()),
            }
        }

        info!(
            programs = summary.programs_created,
            plans = summary.plans_created,
            spaces = summary.spaces_created,
            skipped = summary.spaces_skipped,
            "curriculum import finished"
        );
        Ok(summary)
    }
}

fn ensure_program<S>(
    store: &S,
    name: &str,
    summary: &mut ImportSummary,
) -> Result<ProgramId, RepositoryError>
where
    S: AcademicRecordStore + ?Sized,
{
    if let Some(existing) = store.programs()?.into_iter().find(|p| p.name == name) {
        return Ok(existing.id);
    }
    let created = store.insert_program(Program::new(name))?;
    summary.programs_created += 1;
    Ok(created.id)
}

fn ensure_plan<S>(
    store: &S,
    program: ProgramId,
    resolution: &str,
    name: Option<&str>,
    summary: &mut ImportSummary,
) -> Result<PlanId, RepositoryError>
where
    S: AcademicRecordStore + ?Sized,
{
    if let Some(existing) = store
        .plans_of(program)?
        .into_iter()
        .find(|plan| plan.resolution == resolution)
    {
        return Ok(existing.id);
    }
    let created = store.insert_plan(StudyPlan {
        id: PlanId::default(),
        program_id: program,
        resolution: resolution.to_string(),
        name: name.unwrap_or(resolution).to_string(),
        in_force: true,
        superseded_by: None,
    })?;
    summary.plans_created += 1;
    Ok(created.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::academics::domain::SpaceFormat;
    use crate::academics::memory::InMemoryAcademicStore;

    const CURRICULUM: &str = "\
program,plan,plan_name,year,term,space,hours,format,free_exam
Profesorado de Historia,1935/14,Plan 2014,1°,1,Historia Antigua,96,Asignatura,si
Profesorado de Historia,1935/14,Plan 2014,1°,A,Taller de Lectura,64,Taller,
Profesorado de Historia,1935/14,Plan 2014,2°,2,Historia Medieval,96,Módulo,no
";

    #[test]
    fn import_creates_program_plan_and_spaces_once() {
        let store = InMemoryAcademicStore::new();

        let summary = CatalogImporter::from_reader(CURRICULUM.as_bytes(), &store)
            .expect("curriculum imports");
        assert_eq!(summary.programs_created, 1);
        assert_eq!(summary.plans_created, 1);
        assert_eq!(summary.spaces_created, 3);

        let again = CatalogImporter::from_reader(CURRICULUM.as_bytes(), &store)
            .expect("second import succeeds");
        assert_eq!(again.spaces_created, 0);
        assert_eq!(again.spaces_skipped, 3);

        let program = store.programs().expect("programs")[0].clone();
        let plan = store.plans_of(program.id).expect("plans")[0].clone();
        let spaces = store.spaces_in_plan(plan.id).expect("spaces");
        let workshop = spaces
            .iter()
            .find(|space| space.name == "Taller de Lectura")
            .expect("workshop imported");
        assert_eq!(workshop.format, SpaceFormat::Workshop);
        assert_eq!(workshop.term, Term::Annual);
        assert!(!workshop.free_exam_allowed);
        assert!(spaces
            .iter()
            .any(|space| space.name == "Historia Antigua" && space.free_exam_allowed));
    }

    #[test]
    fn invalid_year_reports_the_row() {
        let store = InMemoryAcademicStore::new();
        let csv = "\
program,plan,plan_name,year,term,space,hours,format,free_exam
Profesorado de Historia,1935/14,,1°,1,Historia Antigua,96,Asignatura,
Profesorado de Historia,1935/14,,5°,1,Historia Moderna,96,Asignatura,
";

        let err = CatalogImporter::from_reader(csv.as_bytes(), &store)
            .expect_err("fifth year is rejected");
        match err {
            CatalogImportError::Row { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}

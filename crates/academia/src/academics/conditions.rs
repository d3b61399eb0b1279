//! Static catalog of the outcome ("condición") codes each space format accepts.

use serde::Serialize;

use super::domain::{ConditionCode, SpaceFormat};

/// Broad grouping used when labelling outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Approval,
    Regularity,
    Failure,
    Free,
    Equivalence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub code: ConditionCode,
    pub label: &'static str,
    pub category: ConditionCategory,
}

const fn entry(code: ConditionCode, category: ConditionCategory) -> CatalogEntry {
    CatalogEntry {
        code,
        label: code.label(),
        category,
    }
}

const SUBJECT: [CatalogEntry; 5] = [
    entry(ConditionCode::Regular, ConditionCategory::Regularity),
    entry(ConditionCode::FailedPracticalWork, ConditionCategory::Failure),
    entry(ConditionCode::FailedMidterm, ConditionCategory::Failure),
    entry(ConditionCode::FreeByAbsence, ConditionCategory::Free),
    entry(ConditionCode::FreeByEarlyDropout, ConditionCategory::Free),
];

const MODULE: [CatalogEntry; 6] = [
    entry(ConditionCode::Promotion, ConditionCategory::Approval),
    entry(ConditionCode::Regular, ConditionCategory::Regularity),
    entry(ConditionCode::FailedPracticalWork, ConditionCategory::Failure),
    entry(ConditionCode::FailedMidterm, ConditionCategory::Failure),
    entry(ConditionCode::FreeByAbsence, ConditionCategory::Free),
    entry(ConditionCode::FreeByEarlyDropout, ConditionCategory::Free),
];

const WORKSHOP: [CatalogEntry; 4] = [
    entry(ConditionCode::Approved, ConditionCategory::Approval),
    entry(ConditionCode::FailedPracticalWork, ConditionCategory::Failure),
    entry(ConditionCode::FreeByAbsence, ConditionCategory::Free),
    entry(ConditionCode::FreeByEarlyDropout, ConditionCategory::Free),
];

const PRACTICUM: [CatalogEntry; 5] = [
    entry(ConditionCode::Approved, ConditionCategory::Approval),
    entry(ConditionCode::FailedPracticalWork, ConditionCategory::Failure),
    entry(ConditionCode::FailedMidterm, ConditionCategory::Failure),
    entry(ConditionCode::FreeByAbsence, ConditionCategory::Free),
    entry(ConditionCode::FreeByEarlyDropout, ConditionCategory::Free),
];

const FINAL_EXAM: [CatalogEntry; 3] = [
    entry(ConditionCode::Regular, ConditionCategory::Regularity),
    entry(ConditionCode::Free, ConditionCategory::Free),
    entry(ConditionCode::Equivalence, ConditionCategory::Equivalence),
];

/// Course outcomes accepted by a space of the given format, in display order.
pub fn catalog(format: SpaceFormat) -> &'static [CatalogEntry] {
    match format {
        SpaceFormat::Subject => &SUBJECT,
        SpaceFormat::Module => &MODULE,
        SpaceFormat::Workshop => &WORKSHOP,
        SpaceFormat::Practicum => &PRACTICUM,
    }
}

/// Same as [`catalog`] but starting from the free-text format stored on a space.
pub fn conditions_for(raw_format: &str) -> &'static [CatalogEntry] {
    catalog(normalize_format(raw_format))
}

/// Outcomes a final exam may be recorded with.
pub fn final_conditions() -> &'static [CatalogEntry] {
    &FINAL_EXAM
}

pub fn allows(format: SpaceFormat, code: ConditionCode) -> bool {
    catalog(format).iter().any(|entry| entry.code == code)
}

/// Maps free text such as "Taller de Lectura" or "MÓDULO" onto a format. Unknown text
/// falls back to [`SpaceFormat::Subject`].
pub fn normalize_format(raw: &str) -> SpaceFormat {
    let folded = fold(raw);
    if folded.contains("asig") {
        SpaceFormat::Subject
    } else if folded.contains("mod") {
        SpaceFormat::Module
    } else if ["taller", "semin", "lab"]
        .iter()
        .any(|needle| folded.contains(needle))
    {
        SpaceFormat::Workshop
    } else if folded.contains("pract") {
        SpaceFormat::Practicum
    } else {
        SpaceFormat::Subject
    }
}

fn fold(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|ch| match ch {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

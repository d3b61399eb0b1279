use serde::{Deserialize, Serialize};

use super::standing::{StandingPolicy, DEFAULT_MINIMUM_PASSING_GRADE, DEFAULT_REGULARITY_DAYS};
use super::validation::{GradingPolicy, DEFAULT_MAX_FINAL_ATTEMPTS};

pub const DEFAULT_EXPIRY_WINDOW_DAYS: u32 = 90;

/// Institutional settings shared by every academic computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicPolicy {
    pub regularity_validity_days: u32,
    pub minimum_passing_grade: f32,
    pub max_final_attempts: u8,
    /// How far ahead the dashboard looks for regularities about to lapse.
    pub expiry_window_days: u32,
}

impl Default for AcademicPolicy {
    fn default() -> Self {
        Self {
            regularity_validity_days: DEFAULT_REGULARITY_DAYS,
            minimum_passing_grade: DEFAULT_MINIMUM_PASSING_GRADE,
            max_final_attempts: DEFAULT_MAX_FINAL_ATTEMPTS,
            expiry_window_days: DEFAULT_EXPIRY_WINDOW_DAYS,
        }
    }
}

impl AcademicPolicy {
    pub fn standing(&self) -> StandingPolicy {
        StandingPolicy {
            regularity_validity_days: self.regularity_validity_days,
            minimum_passing_grade: self.minimum_passing_grade,
        }
    }

    pub fn grading(&self) -> GradingPolicy {
        GradingPolicy {
            minimum_passing_grade: self.minimum_passing_grade,
            max_final_attempts: self.max_final_attempts,
        }
    }
}

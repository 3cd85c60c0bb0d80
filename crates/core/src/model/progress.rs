use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{ModuleId, TrainingId};

/// Per-user status of a training.
///
/// Ordered so that `NotStarted < InProgress < Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnrollmentStatus {
    #[serde(rename = "nao_iniciado")]
    NotStarted,
    #[serde(rename = "em_andamento")]
    InProgress,
    #[serde(rename = "concluido")]
    Completed,
}

impl EnrollmentStatus {
    /// Status string used on the wire.
    #[must_use]
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::NotStarted => "nao_iniciado",
            Self::InProgress => "em_andamento",
            Self::Completed => "concluido",
        }
    }

    /// Label shown next to a training.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::NotStarted => "Nao iniciado",
            Self::InProgress => "Em andamento",
            Self::Completed => "Concluido",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError(String);

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown enrollment status: {}", self.0)
    }
}

impl std::error::Error for ParseStatusError {}

impl FromStr for EnrollmentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nao_iniciado" => Ok(Self::NotStarted),
            "em_andamento" => Ok(Self::InProgress),
            "concluido" => Ok(Self::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// A user's status record for one training.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrollment {
    pub training_id: TrainingId,
    pub status: EnrollmentStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Percentage as last computed by the server; informational only.
    pub percent_complete: u8,
}

impl Enrollment {
    #[must_use]
    pub fn not_started(training_id: TrainingId) -> Self {
        Self {
            training_id,
            status: EnrollmentStatus::NotStarted,
            started_at: None,
            completed_at: None,
            percent_complete: 0,
        }
    }
}

/// One `{moduleId, completed}` record from the progress endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleProgressRecord {
    pub module_id: ModuleId,
    pub completed: bool,
}

impl ModuleProgressRecord {
    #[must_use]
    pub fn new(module_id: ModuleId, completed: bool) -> Self {
        Self {
            module_id,
            completed,
        }
    }
}

/// Raw progress payload for the current user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub enrollments: Vec<Enrollment>,
    pub modules: Vec<ModuleProgressRecord>,
}

/// Module id → "user has completed this module". Absent means not completed.
pub type CompletionMap = HashMap<ModuleId, bool>;

/// Training id → enrollment record for the current user.
pub type EnrollmentMap = HashMap<TrainingId, Enrollment>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_wire_names() {
        assert_eq!(
            "em_andamento".parse::<EnrollmentStatus>().unwrap(),
            EnrollmentStatus::InProgress
        );
        assert!("started".parse::<EnrollmentStatus>().is_err());
    }

    #[test]
    fn status_serde_uses_wire_names() {
        let json = serde_json::to_string(&EnrollmentStatus::Completed).unwrap();
        assert_eq!(json, "\"concluido\"");
    }

    #[test]
    fn statuses_are_ordered_by_progress() {
        assert!(EnrollmentStatus::NotStarted < EnrollmentStatus::InProgress);
        assert!(EnrollmentStatus::InProgress < EnrollmentStatus::Completed);
    }
}

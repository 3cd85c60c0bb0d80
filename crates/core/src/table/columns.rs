use std::borrow::Cow;

use super::{TableColumn, TableRow};
use crate::model::{Department, Training, UserAccount, UserTrainingReport};

//
// ─── TRAININGS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingColumn {
    Code,
    Name,
    Owner,
    LastUpdated,
    Department,
}

impl TableColumn for TrainingColumn {
    fn case_insensitive(self) -> bool {
        !matches!(self, Self::LastUpdated)
    }
}

/// A training joined with its department's name for the admin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRow {
    pub training: Training,
    pub department_name: String,
}

impl TrainingRow {
    /// Attach department names; unknown departments render as empty.
    #[must_use]
    pub fn join(trainings: Vec<Training>, departments: &[Department]) -> Vec<Self> {
        trainings
            .into_iter()
            .map(|training| {
                let department_name = departments
                    .iter()
                    .find(|dep| dep.id() == training.department_id())
                    .map(|dep| dep.name().to_string())
                    .unwrap_or_default();
                Self {
                    training,
                    department_name,
                }
            })
            .collect()
    }
}

impl TableRow for TrainingRow {
    type Column = TrainingColumn;

    fn cell(&self, column: TrainingColumn) -> Cow<'_, str> {
        match column {
            TrainingColumn::Code => Cow::Borrowed(self.training.code()),
            TrainingColumn::Name => Cow::Borrowed(self.training.name()),
            TrainingColumn::Owner => Cow::Borrowed(self.training.owner()),
            TrainingColumn::LastUpdated => self
                .training
                .last_updated()
                .map_or(Cow::Borrowed(""), |date| Cow::Owned(date.to_string())),
            TrainingColumn::Department => Cow::Borrowed(&self.department_name),
        }
    }
}

//
// ─── USERS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserColumn {
    Username,
    Email,
    FirstName,
    LastName,
    Role,
}

impl TableColumn for UserColumn {}

impl TableRow for UserAccount {
    type Column = UserColumn;

    fn cell(&self, column: UserColumn) -> Cow<'_, str> {
        match column {
            UserColumn::Username => Cow::Borrowed(&self.username),
            UserColumn::Email => Cow::Borrowed(&self.email),
            UserColumn::FirstName => Cow::Borrowed(&self.first_name),
            UserColumn::LastName => Cow::Borrowed(&self.last_name),
            UserColumn::Role => Cow::Borrowed(self.role_label()),
        }
    }
}

//
// ─── PER-USER TRAINING REPORT ──────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportColumn {
    Name,
    StartedAt,
    Status,
    CompletedAt,
}

impl TableColumn for ReportColumn {
    fn case_insensitive(self) -> bool {
        matches!(self, Self::Name | Self::Status)
    }
}

impl TableRow for UserTrainingReport {
    type Column = ReportColumn;

    fn cell(&self, column: ReportColumn) -> Cow<'_, str> {
        match column {
            ReportColumn::Name => Cow::Borrowed(&self.name),
            ReportColumn::StartedAt => self
                .started_at
                .map_or(Cow::Borrowed(""), |at| Cow::Owned(at.to_rfc3339())),
            ReportColumn::Status => Cow::Borrowed(self.status.as_wire()),
            ReportColumn::CompletedAt => self
                .completed_at
                .map_or(Cow::Borrowed(""), |at| Cow::Owned(at.to_rfc3339())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DepartmentId, EnrollmentStatus, TrainingId, UserId};
    use crate::table::{FieldMatcher, SortDirection, filter_rows, sort_rows};
    use chrono::{DateTime, NaiveDate};

    fn training(id: u64, code: &str, name: &str, dep: u64, date: Option<(i32, u32, u32)>) -> Training {
        Training::from_server(
            TrainingId::new(id),
            code,
            name,
            "Owner",
            date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            DepartmentId::new(dep),
            Vec::new(),
        )
    }

    #[test]
    fn training_rows_filter_by_department_name() {
        let departments = vec![
            Department::new(DepartmentId::new(1), "Fiscal", Vec::new()),
            Department::new(DepartmentId::new(2), "TI", Vec::new()),
        ];
        let rows = TrainingRow::join(
            vec![
                training(1, "F01", "ICMS", 1, Some((2024, 5, 2))),
                training(2, "T01", "Redes", 2, None),
                training(3, "X01", "Orfao", 99, None),
            ],
            &departments,
        );
        assert_eq!(rows[2].department_name, "");

        let fiscal = filter_rows(&rows, &[FieldMatcher::new(TrainingColumn::Department, "fis")]);
        assert_eq!(fiscal.len(), 1);
        assert_eq!(fiscal[0].training.code(), "F01");

        let dated = filter_rows(&rows, &[FieldMatcher::new(TrainingColumn::LastUpdated, "2024-05")]);
        assert_eq!(dated.len(), 1);
    }

    #[test]
    fn users_filter_by_role_label() {
        let users = vec![
            UserAccount {
                id: UserId::new(1),
                username: "b@x.com".into(),
                email: "b@x.com".into(),
                first_name: "Bia".into(),
                last_name: "Souza".into(),
                is_staff: true,
                is_active: true,
            },
            UserAccount {
                id: UserId::new(2),
                username: "a@x.com".into(),
                email: "a@x.com".into(),
                first_name: "Ana".into(),
                last_name: "Lima".into(),
                is_staff: false,
                is_active: true,
            },
        ];
        let admins = filter_rows(&users, &[FieldMatcher::new(UserColumn::Role, "adm")]);
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].id, UserId::new(1));

        let by_email = sort_rows(&users, UserColumn::Email, SortDirection::Ascending);
        assert_eq!(by_email[0].id, UserId::new(2));
    }

    #[test]
    fn report_filters_status_on_wire_text() {
        let rows = vec![
            UserTrainingReport {
                training_id: TrainingId::new(1),
                name: "ICMS".into(),
                started_at: None,
                completed_at: None,
                status: EnrollmentStatus::InProgress,
            },
            UserTrainingReport {
                training_id: TrainingId::new(2),
                name: "Redes".into(),
                started_at: None,
                completed_at: None,
                status: EnrollmentStatus::Completed,
            },
        ];
        let result = filter_rows(&rows, &[FieldMatcher::new(ReportColumn::Status, "ANDAMENTO")]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].training_id, TrainingId::new(1));
    }

    #[test]
    fn report_dates_filter_on_server_local_time() {
        let started = DateTime::parse_from_rfc3339("2024-05-02T13:15:00-03:00").unwrap();
        let rows = vec![UserTrainingReport {
            training_id: TrainingId::new(1),
            name: "ICMS".into(),
            started_at: Some(started),
            completed_at: None,
            status: EnrollmentStatus::InProgress,
        }];
        assert_eq!(rows[0].cell(ReportColumn::StartedAt), "2024-05-02T13:15:00-03:00");

        let local = FieldMatcher::new(ReportColumn::StartedAt, "2024-05-02T13");
        assert_eq!(filter_rows(&rows, &[local]).len(), 1);
        let utc = FieldMatcher::new(ReportColumn::StartedAt, "2024-05-02T16");
        let utc = filter_rows(&rows, &[utc]);
        assert!(utc.is_empty());
    }
}

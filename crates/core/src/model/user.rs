use chrono::{DateTime, FixedOffset};

use crate::model::catalog::ValidationError;
use crate::model::ids::{TrainingId, UserId};
use crate::model::progress::EnrollmentStatus;

/// A portal login account as listed by the admin user screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
}

impl UserAccount {
    /// Role label shown in the user table.
    #[must_use]
    pub fn role_label(&self) -> &'static str {
        if self.is_staff { "Admin" } else { "Colaborador" }
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Unvalidated user form. The login name always mirrors the email.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_staff: bool,
    pub is_active: bool,
}

impl Default for UserDraft {
    fn default() -> Self {
        Self {
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            is_staff: false,
            is_active: true,
        }
    }
}

impl UserDraft {
    #[must_use]
    pub fn from_account(account: &UserAccount) -> Self {
        Self {
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            is_staff: account.is_staff,
            is_active: account.is_active,
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError::EmptyEmail` when the email is blank.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            return Err(ValidationError::EmptyEmail);
        }
        Ok(Self {
            email,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            ..self
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.email
    }
}

/// One row of the per-user enrollment report.
///
/// Timestamps keep the offset the server sent them with, so filters match
/// the server's local wall-clock text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTrainingReport {
    pub training_id: TrainingId,
    pub name: String,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub status: EnrollmentStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(is_staff: bool) -> UserAccount {
        UserAccount {
            id: UserId::new(1),
            username: "ana@example.com".into(),
            email: "ana@example.com".into(),
            first_name: "Ana".into(),
            last_name: String::new(),
            is_staff,
            is_active: true,
        }
    }

    #[test]
    fn role_label_follows_staff_flag() {
        assert_eq!(account(true).role_label(), "Admin");
        assert_eq!(account(false).role_label(), "Colaborador");
    }

    #[test]
    fn full_name_drops_missing_parts() {
        assert_eq!(account(false).full_name(), "Ana");
    }

    #[test]
    fn user_draft_requires_email() {
        let err = UserDraft::default().validate().unwrap_err();
        assert_eq!(err, ValidationError::EmptyEmail);

        let draft = UserDraft {
            email: " bob@example.com ".into(),
            ..UserDraft::default()
        }
        .validate()
        .unwrap();
        assert_eq!(draft.username(), "bob@example.com");
        assert!(draft.is_active);
    }
}

use crate::model::catalog::ValidationError;

/// Who the client believes is signed in.
///
/// Derived once per session refresh from which tokens are present. This is a
/// presentation hint only; the server authorizes every call on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Admin,
    Collaborator,
    #[default]
    Anonymous,
}

impl Role {
    /// An admin token wins over a collaborator token.
    #[must_use]
    pub fn derive(has_admin_token: bool, has_user_token: bool) -> Self {
        match (has_admin_token, has_user_token) {
            (true, _) => Self::Admin,
            (false, true) => Self::Collaborator,
            (false, false) => Self::Anonymous,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Collaborator => "Colaborador",
            Self::Anonymous => "Anonimo",
        }
    }

    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Credentials typed into a login form.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyUsername` or `ValidationError::EmptyPassword`.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        if password.is_empty() {
            return Err(ValidationError::EmptyPassword);
        }
        Ok(Self { username, password })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

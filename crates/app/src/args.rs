use std::fmt;

use chrono::NaiveDate;
use portal_core::model::{DepartmentId, ModuleDraft, ModuleId, TrainingDraft, TrainingId, UserDraft, UserId};
use portal_core::screen::Editing;
use portal_core::table::{ReportColumn, TableColumn, TableView, TrainingColumn, UserColumn};

pub const DB_URL_ENV: &str = "PORTAL_DB_URL";
const DEFAULT_DB_URL: &str = "sqlite://portal.sqlite3";

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    InvalidId { raw: String },
    InvalidDate { raw: String },
    InvalidColumn { raw: String },
    InvalidFilter { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing subcommand"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { raw } => write!(f, "invalid id: {raw}"),
            ArgsError::InvalidDate { raw } => write!(f, "invalid date (want YYYY-MM-DD): {raw}"),
            ArgsError::InvalidColumn { raw } => write!(f, "unknown column: {raw}"),
            ArgsError::InvalidFilter { raw } => {
                write!(f, "invalid --filter value (want column=text): {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  portal [--api <url>] [--db <sqlite_url>] <command> [args]");
    eprintln!();
    eprintln!("Session:");
    eprintln!("  login <email> <password>          collaborator sign-in");
    eprintln!("  admin-login <username> <password>");
    eprintln!("  logout [--admin]");
    eprintln!("  whoami");
    eprintln!();
    eprintln!("Collaborator:");
    eprintln!("  catalog");
    eprintln!("  my-trainings");
    eprintln!("  training <training_id>");
    eprintln!("  start <training_id>");
    eprintln!("  toggle <training_id> <module_id>");
    eprintln!();
    eprintln!("Admin:");
    eprintln!("  trainings [--filter col=text]... [--sort col] [--desc]");
    eprintln!("  save-training [--id N] --name <n> --department <name|id> [--code c] [--owner o] [--updated YYYY-MM-DD]");
    eprintln!("  delete-training <training_id>");
    eprintln!("  departments");
    eprintln!("  save-department [--id N] --name <n>");
    eprintln!("  delete-department <department_id>");
    eprintln!("  modules <training_id>");
    eprintln!("  save-module <training_id> [--id N] --title <t> [--description d] [--video url]");
    eprintln!("  delete-module <module_id>");
    eprintln!("  users [--filter col=text]... [--sort col] [--desc]");
    eprintln!("  save-user [--id N] --email <e> [--first-name f] [--last-name l] [--staff|--no-staff] [--active|--inactive] [--password p]");
    eprintln!("  delete-user <user_id>");
    eprintln!("  reset-password <user_id>");
    eprintln!("  user-report <user_id> [--filter col=text]... [--sort col] [--desc]");
    eprintln!();
    eprintln!("Columns:");
    eprintln!("  trainings: code, name, owner, updated, department");
    eprintln!("  users: username, email, first-name, last-name, role");
    eprintln!("  user-report: name, started, status, completed");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, PORTAL_API_URL, PORTAL_TIMEOUT_SECS, PORTAL_RETRY_ATTEMPTS, RUST_LOG");
}

/// Column names accepted on the command line.
pub trait ColumnName: TableColumn {
    fn from_name(raw: &str) -> Option<Self>;
}

impl ColumnName for TrainingColumn {
    fn from_name(raw: &str) -> Option<Self> {
        match raw {
            "code" => Some(Self::Code),
            "name" => Some(Self::Name),
            "owner" => Some(Self::Owner),
            "updated" => Some(Self::LastUpdated),
            "department" => Some(Self::Department),
            _ => None,
        }
    }
}

impl ColumnName for UserColumn {
    fn from_name(raw: &str) -> Option<Self> {
        match raw {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            "first-name" => Some(Self::FirstName),
            "last-name" => Some(Self::LastName),
            "role" => Some(Self::Role),
            _ => None,
        }
    }
}

impl ColumnName for ReportColumn {
    fn from_name(raw: &str) -> Option<Self> {
        match raw {
            "name" => Some(Self::Name),
            "started" => Some(Self::StartedAt),
            "status" => Some(Self::Status),
            "completed" => Some(Self::CompletedAt),
            _ => None,
        }
    }
}

/// Filter and sort flags of a table command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableArgs<C> {
    pub filters: Vec<(C, String)>,
    pub sort: Option<C>,
    pub descending: bool,
}

impl<C> Default for TableArgs<C> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort: None,
            descending: false,
        }
    }
}

impl<C: ColumnName> TableArgs<C> {
    /// The table state these flags describe.
    pub fn into_view(self, default_sort: C) -> TableView<C> {
        let mut view = TableView::new(self.sort.unwrap_or(default_sort));
        if self.descending {
            view.click_header(view.sort().key());
        }
        for (column, needle) in self.filters {
            view.set_filter(column, needle);
        }
        view
    }

    fn accept(
        &mut self,
        arg: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match arg {
            "--filter" => {
                let raw = require_value(args, "--filter")?;
                let (name, needle) = raw
                    .split_once('=')
                    .ok_or_else(|| ArgsError::InvalidFilter { raw: raw.clone() })?;
                let column = parse_column(name)?;
                self.filters.push((column, needle.to_string()));
            }
            "--sort" => {
                let raw = require_value(args, "--sort")?;
                self.sort = Some(parse_column(&raw)?);
            }
            "--desc" => self.descending = true,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn parse_column<C: ColumnName>(raw: &str) -> Result<C, ArgsError> {
    C::from_name(raw.trim()).ok_or_else(|| ArgsError::InvalidColumn {
        raw: raw.to_string(),
    })
}

/// Training form fields given on the command line; unset fields keep their
/// current value when editing.
#[derive(Debug, Default)]
pub struct TrainingFields {
    pub code: Option<String>,
    pub name: Option<String>,
    pub owner: Option<String>,
    pub last_updated: Option<NaiveDate>,
    pub department: Option<String>,
}

impl TrainingFields {
    pub fn apply(self, draft: &mut TrainingDraft) {
        if let Some(code) = self.code {
            draft.code = code;
        }
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(owner) = self.owner {
            draft.owner = owner;
        }
        if self.last_updated.is_some() {
            draft.last_updated = self.last_updated;
        }
        if let Some(department) = self.department {
            draft.department = department;
        }
    }
}

#[derive(Debug, Default)]
pub struct UserFields {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_staff: Option<bool>,
    pub is_active: Option<bool>,
}

impl UserFields {
    pub fn apply(self, draft: &mut UserDraft) {
        if let Some(email) = self.email {
            draft.email = email;
        }
        if let Some(first_name) = self.first_name {
            draft.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            draft.last_name = last_name;
        }
        if let Some(is_staff) = self.is_staff {
            draft.is_staff = is_staff;
        }
        if let Some(is_active) = self.is_active {
            draft.is_active = is_active;
        }
    }
}

#[derive(Debug)]
pub enum Command {
    Login { email: String, password: String },
    AdminLogin { username: String, password: String },
    Logout { admin: bool },
    Whoami,
    Catalog,
    MyTrainings,
    Training { id: TrainingId },
    Start { id: TrainingId },
    Toggle { training: TrainingId, module: ModuleId },
    Trainings(TableArgs<TrainingColumn>),
    SaveTraining { editing: Editing<TrainingId>, fields: TrainingFields },
    DeleteTraining { id: TrainingId },
    Departments,
    SaveDepartment { editing: Editing<DepartmentId>, name: String },
    DeleteDepartment { id: DepartmentId },
    Modules { training: TrainingId },
    SaveModule { training: TrainingId, editing: Editing<ModuleId>, draft: ModuleDraft },
    DeleteModule { id: ModuleId },
    Users(TableArgs<UserColumn>),
    SaveUser { editing: Editing<UserId>, fields: UserFields, password: Option<String> },
    DeleteUser { id: UserId },
    ResetPassword { id: UserId },
    UserReport { id: UserId, table: TableArgs<ReportColumn> },
}

impl Command {
    /// Whether the command calls admin-only endpoints.
    pub fn needs_admin(&self) -> bool {
        matches!(
            self,
            Command::Trainings(_)
                | Command::SaveTraining { .. }
                | Command::DeleteTraining { .. }
                | Command::Departments
                | Command::SaveDepartment { .. }
                | Command::DeleteDepartment { .. }
                | Command::Modules { .. }
                | Command::SaveModule { .. }
                | Command::DeleteModule { .. }
                | Command::Users(_)
                | Command::SaveUser { .. }
                | Command::DeleteUser { .. }
                | Command::ResetPassword { .. }
                | Command::UserReport { .. }
        )
    }
}

pub struct Args {
    pub db_url: String,
    pub api_url: Option<String>,
    pub command: Command,
}

pub fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn positional(
    args: &mut impl Iterator<Item = String>,
    name: &'static str,
) -> Result<String, ArgsError> {
    match args.next() {
        Some(value) if !value.starts_with("--") => Ok(value),
        Some(flag) => Err(ArgsError::UnknownArg(flag)),
        None => Err(ArgsError::MissingArgument { name }),
    }
}

fn parse_id<T: std::str::FromStr>(raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { raw })
}

fn parse_date(raw: String) -> Result<NaiveDate, ArgsError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ArgsError::InvalidDate { raw })
}

fn editing<T: std::str::FromStr>(id: Option<String>) -> Result<Editing<T>, ArgsError> {
    Ok(match id {
        Some(raw) => Editing::Existing(parse_id(raw)?),
        None => Editing::New,
    })
}

impl Args {
    /// Parse everything after the program name.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var(DB_URL_ENV)
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut api_url = None;

        let mut args = args.into_iter();
        let name = loop {
            let arg = args.next().ok_or(ArgsError::MissingCommand)?;
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => api_url = Some(require_value(&mut args, "--api")?),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => break arg,
            }
        };

        let command = Self::parse_command(&name, &mut args)?;
        Ok(Self {
            db_url,
            api_url,
            command,
        })
    }

    fn parse_command(
        name: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Command, ArgsError> {
        let command = match name {
            "login" => Command::Login {
                email: positional(args, "email")?,
                password: positional(args, "password")?,
            },
            "admin-login" => Command::AdminLogin {
                username: positional(args, "username")?,
                password: positional(args, "password")?,
            },
            "logout" => {
                let mut admin = false;
                for arg in args.by_ref() {
                    match arg.as_str() {
                        "--admin" => admin = true,
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::Logout { admin }
            }
            "whoami" => Command::Whoami,
            "catalog" => Command::Catalog,
            "my-trainings" => Command::MyTrainings,
            "training" => Command::Training {
                id: parse_id(positional(args, "training_id")?)?,
            },
            "start" => Command::Start {
                id: parse_id(positional(args, "training_id")?)?,
            },
            "toggle" => Command::Toggle {
                training: parse_id(positional(args, "training_id")?)?,
                module: parse_id(positional(args, "module_id")?)?,
            },
            "trainings" => Command::Trainings(parse_table(args)?),
            "save-training" => Self::parse_save_training(args)?,
            "delete-training" => Command::DeleteTraining {
                id: parse_id(positional(args, "training_id")?)?,
            },
            "departments" => Command::Departments,
            "save-department" => {
                let mut id = None;
                let mut name = String::new();
                while let Some(arg) = args.next() {
                    match arg.as_str() {
                        "--id" => id = Some(require_value(args, "--id")?),
                        "--name" => name = require_value(args, "--name")?,
                        _ => return Err(ArgsError::UnknownArg(arg)),
                    }
                }
                Command::SaveDepartment {
                    editing: editing(id)?,
                    name,
                }
            }
            "delete-department" => Command::DeleteDepartment {
                id: parse_id(positional(args, "department_id")?)?,
            },
            "modules" => Command::Modules {
                training: parse_id(positional(args, "training_id")?)?,
            },
            "save-module" => Self::parse_save_module(args)?,
            "delete-module" => Command::DeleteModule {
                id: parse_id(positional(args, "module_id")?)?,
            },
            "users" => Command::Users(parse_table(args)?),
            "save-user" => Self::parse_save_user(args)?,
            "delete-user" => Command::DeleteUser {
                id: parse_id(positional(args, "user_id")?)?,
            },
            "reset-password" => Command::ResetPassword {
                id: parse_id(positional(args, "user_id")?)?,
            },
            "user-report" => Command::UserReport {
                id: parse_id(positional(args, "user_id")?)?,
                table: parse_table(args)?,
            },
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        if let Some(extra) = args.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        Ok(command)
    }

    fn parse_save_training(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
        let mut id = None;
        let mut fields = TrainingFields::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--id" => id = Some(require_value(args, "--id")?),
                "--name" => fields.name = Some(require_value(args, "--name")?),
                "--department" => fields.department = Some(require_value(args, "--department")?),
                "--code" => fields.code = Some(require_value(args, "--code")?),
                "--owner" => fields.owner = Some(require_value(args, "--owner")?),
                "--updated" => {
                    fields.last_updated = Some(parse_date(require_value(args, "--updated")?)?);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Command::SaveTraining {
            editing: editing(id)?,
            fields,
        })
    }

    fn parse_save_module(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
        let training = parse_id(positional(args, "training_id")?)?;
        let mut id = None;
        let mut draft = ModuleDraft::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--id" => id = Some(require_value(args, "--id")?),
                "--title" => draft.title = require_value(args, "--title")?,
                "--description" => draft.description = require_value(args, "--description")?,
                "--video" => draft.video_embed_url = require_value(args, "--video")?,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Command::SaveModule {
            training,
            editing: editing(id)?,
            draft,
        })
    }

    fn parse_save_user(args: &mut impl Iterator<Item = String>) -> Result<Command, ArgsError> {
        let mut id = None;
        let mut fields = UserFields::default();
        let mut password = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--id" => id = Some(require_value(args, "--id")?),
                "--email" => fields.email = Some(require_value(args, "--email")?),
                "--first-name" => fields.first_name = Some(require_value(args, "--first-name")?),
                "--last-name" => fields.last_name = Some(require_value(args, "--last-name")?),
                "--staff" => fields.is_staff = Some(true),
                "--no-staff" => fields.is_staff = Some(false),
                "--active" => fields.is_active = Some(true),
                "--inactive" => fields.is_active = Some(false),
                "--password" => password = Some(require_value(args, "--password")?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(Command::SaveUser {
            editing: editing(id)?,
            fields,
            password,
        })
    }
}

fn parse_table<C: ColumnName>(
    args: &mut impl Iterator<Item = String>,
) -> Result<TableArgs<C>, ArgsError> {
    let mut table = TableArgs::default();
    while let Some(arg) = args.next() {
        if !table.accept(&arg, args)? {
            return Err(ArgsError::UnknownArg(arg));
        }
    }
    Ok(table)
}

pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::table::SortDirection;

    fn parse(line: &str) -> Result<Args, ArgsError> {
        Args::parse(line.split_whitespace().map(str::to_string))
    }

    #[test]
    fn global_flags_precede_the_command() {
        let args = parse("--api http://portal:8200 --db sqlite://x.db toggle 10 100").unwrap();
        assert_eq!(args.api_url.as_deref(), Some("http://portal:8200"));
        assert_eq!(args.db_url, "sqlite://x.db");
        assert!(matches!(
            args.command,
            Command::Toggle { training, module }
                if training == TrainingId::new(10) && module == ModuleId::new(100)
        ));
    }

    #[test]
    fn table_flags_become_a_view() {
        let args = parse("trainings --filter department=fis --sort name --desc").unwrap();
        let Command::Trainings(table) = args.command else {
            panic!("expected trainings command");
        };
        assert_eq!(table.filters, vec![(TrainingColumn::Department, "fis".to_string())]);

        let view = table.into_view(TrainingColumn::Code);
        assert_eq!(view.sort().key(), TrainingColumn::Name);
        assert_eq!(view.sort().direction(), SortDirection::Descending);
    }

    #[test]
    fn default_sort_column_stays_ascending() {
        let view = TableArgs::<UserColumn>::default().into_view(UserColumn::Username);
        assert_eq!(view.sort().key(), UserColumn::Username);
        assert_eq!(view.sort().direction(), SortDirection::Ascending);
    }

    #[test]
    fn save_training_collects_form_fields() {
        let args = parse("save-training --id 4 --name ICMS --department Fiscal --updated 2024-05-02")
            .unwrap();
        let Command::SaveTraining { editing, fields } = args.command else {
            panic!("expected save-training");
        };
        assert_eq!(editing, Editing::Existing(TrainingId::new(4)));

        let mut draft = TrainingDraft {
            code: "F01".into(),
            owner: "Carla".into(),
            ..TrainingDraft::default()
        };
        fields.apply(&mut draft);
        assert_eq!(draft.code, "F01");
        assert_eq!(draft.owner, "Carla");
        assert_eq!(draft.name, "ICMS");
        assert_eq!(draft.department, "Fiscal");
        assert_eq!(draft.last_updated, NaiveDate::from_ymd_opt(2024, 5, 2));
    }

    #[test]
    fn user_flags_only_touch_what_was_given() {
        let args = parse("save-user --id 3 --inactive").unwrap();
        let Command::SaveUser { fields, password, .. } = args.command else {
            panic!("expected save-user");
        };
        assert_eq!(password, None);

        let mut draft = UserDraft {
            email: "ana@x.com".into(),
            is_staff: true,
            ..UserDraft::default()
        };
        fields.apply(&mut draft);
        assert_eq!(draft.email, "ana@x.com");
        assert!(draft.is_staff);
        assert!(!draft.is_active);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(parse("").err(), Some(ArgsError::MissingCommand));
        assert_eq!(
            parse("toggle 10").err(),
            Some(ArgsError::MissingArgument { name: "module_id" })
        );
        assert_eq!(
            parse("start abc").err(),
            Some(ArgsError::InvalidId { raw: "abc".into() })
        );
        assert_eq!(
            parse("users --sort shoe").err(),
            Some(ArgsError::InvalidColumn { raw: "shoe".into() })
        );
        assert_eq!(
            parse("catalog extra").err(),
            Some(ArgsError::UnknownArg("extra".into()))
        );
        assert!(parse("trainings").unwrap().command.needs_admin());
        assert!(!parse("my-trainings").unwrap().command.needs_admin());
    }
}

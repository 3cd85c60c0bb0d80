mod args;

use std::fmt;

use portal_core::Clock;
use portal_core::load::LoadState;
use portal_core::model::{
    DEFAULT_DEPARTMENTS, Department, TrainingDraft, TrainingId, UserDraft, UserId, UserTrainingReport,
};
use portal_core::progress::MyTrainingItem;
use portal_core::screen::Editing;
use portal_core::table::{ReportColumn, TrainingColumn, UserColumn};
use secrecy::SecretString;
use services::admin::DEFAULT_PASSWORD;
use services::{ApiConfig, PortalClient, ResourceLoader, SessionContext};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Args, ArgsError, Command, print_usage};

/// Failures detected by the CLI itself.
#[derive(Debug)]
enum CommandError {
    LoginRequired,
    AdminRequired,
    UnknownTraining(TrainingId),
    UnknownUser(UserId),
    Load(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::LoginRequired => {
                write!(f, "not signed in; run `portal login <email> <password>`")
            }
            CommandError::AdminRequired => {
                write!(f, "admin session required; run `portal admin-login <username> <password>`")
            }
            CommandError::UnknownTraining(id) => write!(f, "unknown training {id}"),
            CommandError::UnknownUser(id) => write!(f, "unknown user {id}"),
            CommandError::Load(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CommandError {}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(err @ (ArgsError::MissingCommand | ArgsError::UnknownCommand(_))) => {
            print_usage();
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    init_tracing();

    prepare_sqlite_file(&args.db_url)?;
    let config = ApiConfig::from_env_with_url(args.api_url)?;
    debug!(db = %args.db_url, api = %config.settings().api_base_url(), "starting portal client");
    let client =
        PortalClient::new_sqlite(&args.db_url, config.settings().clone(), Clock::default()).await?;

    let session = client.session().current();
    if args.command.needs_admin() && !session.has_admin_token() {
        return Err(CommandError::AdminRequired.into());
    }

    execute(&client, session, args.command).await
}

async fn execute(
    client: &PortalClient,
    session: SessionContext,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    let admin = client.admin();
    match command {
        Command::Login { email, password } => {
            let session = client.session().login_collaborator(&email, &password).await?;
            print_session(&session);
        }
        Command::AdminLogin { username, password } => {
            let session = client.session().login_admin(&username, &password).await?;
            print_session(&session);
        }
        Command::Logout { admin } => {
            let session = if admin {
                client.session().logout_admin().await?
            } else {
                client.session().logout_collaborator().await?
            };
            print_session(&session);
        }
        Command::Whoami => print_session(&session),
        Command::Catalog => {
            refresh(client, &session).await?;
            print_catalog(&client.progress().catalog());
        }
        Command::MyTrainings => {
            refresh(client, &session).await?;
            print_items("My trainings", &client.progress().my_trainings());
            let dashboard = client.progress().dashboard();
            print_items("In progress", &dashboard.in_progress);
            print_items("Completed", &dashboard.completed);
        }
        Command::Training { id } => {
            refresh(client, &session).await?;
            let detail = client.progress().training_detail(id)?;
            println!(
                "{} {} [{}] {}% ({}/{})",
                detail.training.code(),
                detail.training.name(),
                detail.status.label(),
                detail.progress.percent,
                detail.progress.completed_count,
                detail.progress.total_count,
            );
            for view in &detail.modules {
                let mark = if view.completed { "x" } else { " " };
                println!("  [{mark}] {:>5}  {}", view.module.id(), view.module.title());
            }
        }
        Command::Start { id } => {
            refresh(client, &session).await?;
            client.progress().start_training(id).await?;
            println!("training {id} started");
        }
        Command::Toggle { training, module } => {
            refresh(client, &session).await?;
            let completed = client.progress().toggle_module(training, module).await?;
            let state = if completed { "completed" } else { "not completed" };
            println!("module {module} marked {state}");
        }
        Command::Trainings(table) => {
            let catalog = admin.load_catalog().await?;
            let view = table.into_view(TrainingColumn::Code);
            for row in view.apply(&catalog.training_rows()) {
                println!(
                    "{:>5}  {:<8}  {:<30}  {:<16}  {:<10}  {}",
                    row.training.id(),
                    row.training.code(),
                    row.training.name(),
                    row.training.owner(),
                    row.training.last_updated_display(),
                    row.department_name,
                );
            }
        }
        Command::SaveTraining { editing, fields } => {
            let mut draft = match editing {
                Editing::New => TrainingDraft::default(),
                Editing::Existing(id) => {
                    let catalog = admin.load_catalog().await?;
                    let row = catalog
                        .training_rows()
                        .into_iter()
                        .find(|row| row.training.id() == id)
                        .ok_or(CommandError::UnknownTraining(id))?;
                    let department = (!row.department_name.is_empty()).then_some(row.department_name.as_str());
                    TrainingDraft::from_training(&row.training, department)
                }
            };
            fields.apply(&mut draft);
            let saved = admin.save_training(editing, draft).await?;
            println!("saved training {} {}", saved.id(), saved.name());
        }
        Command::DeleteTraining { id } => {
            admin.delete_training(id).await?;
            println!("deleted training {id}");
        }
        Command::Departments => {
            let departments = admin.list_departments().await?;
            for department in &departments {
                println!("{:>5}  {}", department.id(), department.name());
            }
            let missing: Vec<&str> = DEFAULT_DEPARTMENTS
                .into_iter()
                .filter(|name| {
                    !departments
                        .iter()
                        .any(|dep| dep.name().eq_ignore_ascii_case(name))
                })
                .collect();
            if !missing.is_empty() {
                println!("suggested: {}", missing.join(", "));
            }
        }
        Command::SaveDepartment { editing, name } => {
            let saved = admin.save_department(editing, &name).await?;
            println!("saved department {} {}", saved.id(), saved.name());
        }
        Command::DeleteDepartment { id } => {
            admin.delete_department(id).await?;
            println!("deleted department {id}");
        }
        Command::Modules { training } => {
            for module in admin.modules_of_training(training).await? {
                println!("{:>5}  {:<40}  {}", module.id(), module.title(), module.video_embed_url());
            }
        }
        Command::SaveModule { training, editing, draft } => {
            let saved = admin.save_module(Some(training), editing, draft).await?;
            println!("saved module {} {}", saved.id(), saved.title());
        }
        Command::DeleteModule { id } => {
            admin.delete_module(id).await?;
            println!("deleted module {id}");
        }
        Command::Users(table) => {
            let users = admin.list_users().await?;
            let view = table.into_view(UserColumn::Username);
            for user in view.apply(&users) {
                let active = if user.is_active { "" } else { "  (inactive)" };
                println!(
                    "{:>5}  {:<30}  {:<24}  {}{active}",
                    user.id,
                    user.email,
                    user.full_name(),
                    user.role_label(),
                );
            }
        }
        Command::SaveUser { editing, fields, password } => {
            let mut draft = match editing {
                Editing::New => UserDraft::default(),
                Editing::Existing(id) => {
                    let users = admin.list_users().await?;
                    let account = users
                        .iter()
                        .find(|user| user.id == id)
                        .ok_or(CommandError::UnknownUser(id))?;
                    UserDraft::from_account(account)
                }
            };
            fields.apply(&mut draft);
            let default_password = editing == Editing::New && password.is_none();
            let saved = admin
                .save_user(editing, draft, password.map(SecretString::new))
                .await?;
            println!("saved user {} {}", saved.id, saved.email);
            if default_password {
                println!("default password: {DEFAULT_PASSWORD}");
            }
        }
        Command::DeleteUser { id } => {
            admin.delete_user(id).await?;
            println!("deleted user {id}");
        }
        Command::ResetPassword { id } => {
            admin.reset_password(id).await?;
            println!("password of user {id} reset to {DEFAULT_PASSWORD}");
        }
        Command::UserReport { id, table } => {
            let loader: ResourceLoader<_, Vec<UserTrainingReport>> = ResourceLoader::new();
            let service = admin.clone();
            loader.load(id, async move {
                service.user_report(id).await.map_err(|err| err.to_string())
            });
            loader.settled().await;
            let rows = match loader.state() {
                LoadState::Ready(rows) => rows,
                LoadState::Error(message) => return Err(CommandError::Load(message).into()),
                LoadState::Idle | LoadState::Loading => Vec::new(),
            };
            let view = table.into_view(ReportColumn::Name);
            for row in view.apply(&rows) {
                println!(
                    "{:>5}  {:<30}  {:<12}  {:<25}  {}",
                    row.training_id,
                    row.name,
                    row.status.label(),
                    row.started_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
                    row.completed_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
                );
            }
        }
    }
    Ok(())
}

async fn refresh(
    client: &PortalClient,
    session: &SessionContext,
) -> Result<(), Box<dyn std::error::Error>> {
    if !session.has_user_token() {
        return Err(CommandError::LoginRequired.into());
    }
    client.progress().refresh(session).await?;
    Ok(())
}

fn print_session(session: &SessionContext) {
    println!("role: {}", session.role().label());
    if let Some(email) = session.last_email() {
        println!("last email: {email}");
    }
}

fn print_catalog(departments: &[Department]) {
    for department in departments {
        println!("{}", department.name());
        for training in department.trainings() {
            println!(
                "  {:>5}  {:<8}  {}  ({} modules)",
                training.id(),
                training.code(),
                training.name(),
                training.modules().len(),
            );
        }
    }
}

fn print_items(title: &str, items: &[MyTrainingItem]) {
    println!("{title}:");
    if items.is_empty() {
        println!("  (none)");
    }
    for item in items {
        println!(
            "  {:>5}  {:<30}  {:<12}  {:>3}%",
            item.id,
            item.name,
            item.status.label(),
            item.percent
        );
    }
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

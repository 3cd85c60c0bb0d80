#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use secrecy::{ExposeSecret, SecretString};

use portal_core::model::{
    Credentials, Department, DepartmentId, Module, ModuleDraft, ModuleId, ProgressSnapshot,
    Training, TrainingId, UserAccount, UserDraft, UserId, UserTrainingReport,
};
use portal_core::time::fixed_now;
use services::{
    ApiError, BearerToken, Clock, PortalApi, PortalClient, RetryPolicy, TrainingWrite,
};
use storage::repository::Storage;

#[derive(Default)]
struct FakeState {
    catalog: Vec<Department>,
    catalog_failure: Option<ApiError>,
    progress: ProgressSnapshot,
    progress_failure: Option<ApiError>,
    mutation_failures: VecDeque<ApiError>,
    mutations_in_flight: usize,
    max_mutations_in_flight: usize,
    accounts: HashMap<String, (String, String)>,
    departments: Vec<Department>,
    trainings: Vec<Training>,
    modules: Vec<Module>,
    users: Vec<UserAccount>,
    users_failure: Option<ApiError>,
    reports: HashMap<UserId, Vec<UserTrainingReport>>,
    last_password: Option<Option<String>>,
    next_id: u64,
    calls: Vec<String>,
}

impl FakeState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        1000 + self.next_id
    }
}

/// In-memory stand-in for the portal backend.
#[derive(Clone, Default)]
pub struct FakePortalApi {
    state: Arc<Mutex<FakeState>>,
}

impl FakePortalApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(self, catalog: Vec<Department>) -> Self {
        self.state.lock().unwrap().catalog = catalog;
        self
    }

    pub fn with_progress(self, progress: ProgressSnapshot) -> Self {
        self.state.lock().unwrap().progress = progress;
        self
    }

    pub fn with_account(self, username: &str, password: &str, token: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .accounts
            .insert(username.to_string(), (password.to_string(), token.to_string()));
        self
    }

    pub fn with_departments(self, departments: Vec<Department>) -> Self {
        self.state.lock().unwrap().departments = departments;
        self
    }

    pub fn with_users(self, users: Vec<UserAccount>) -> Self {
        self.state.lock().unwrap().users = users;
        self
    }

    pub fn fail_catalog(&self, err: ApiError) {
        self.state.lock().unwrap().catalog_failure = Some(err);
    }

    pub fn fail_progress(&self, err: ApiError) {
        self.state.lock().unwrap().progress_failure = Some(err);
    }

    pub fn fail_users(&self, err: ApiError) {
        self.state.lock().unwrap().users_failure = Some(err);
    }

    /// The next mutation calls fail with these errors, in order.
    pub fn fail_next_mutations(&self, errors: impl IntoIterator<Item = ApiError>) {
        self.state.lock().unwrap().mutation_failures.extend(errors);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn departments(&self) -> Vec<Department> {
        self.state.lock().unwrap().departments.clone()
    }

    pub fn trainings(&self) -> Vec<Training> {
        self.state.lock().unwrap().trainings.clone()
    }

    /// Password sent with the last user write: `Some(None)` means omitted.
    pub fn last_password(&self) -> Option<Option<String>> {
        self.state.lock().unwrap().last_password.clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.state.lock().unwrap().calls.push(call.into());
    }

    /// Most mutation calls that were ever running at the same time.
    pub fn max_mutations_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_mutations_in_flight
    }

    /// Runs like a real request: stays in flight across a yield point before
    /// answering with the next scripted failure, or success.
    async fn mutation_result(&self) -> Result<(), ApiError> {
        {
            let mut state = self.state.lock().unwrap();
            state.mutations_in_flight += 1;
            state.max_mutations_in_flight =
                state.max_mutations_in_flight.max(state.mutations_in_flight);
        }
        tokio::task::yield_now().await;
        let mut state = self.state.lock().unwrap();
        state.mutations_in_flight -= 1;
        match state.mutation_failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PortalApi for FakePortalApi {
    async fn fetch_catalog(&self) -> Result<Vec<Department>, ApiError> {
        self.record("catalog");
        let state = self.state.lock().unwrap();
        match &state.catalog_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.catalog.clone()),
        }
    }

    async fn fetch_my_progress(&self) -> Result<ProgressSnapshot, ApiError> {
        self.record("progress");
        let state = self.state.lock().unwrap();
        match &state.progress_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.progress.clone()),
        }
    }

    async fn start_training(&self, training_id: TrainingId) -> Result<(), ApiError> {
        self.record(format!("start:{training_id}"));
        self.mutation_result().await
    }

    async fn complete_module(&self, module_id: ModuleId, completed: bool) -> Result<(), ApiError> {
        self.record(format!("complete:{module_id}:{completed}"));
        self.mutation_result().await
    }

    async fn login_email(&self, email: &str, _name: Option<&str>) -> Result<(), ApiError> {
        self.record(format!("login-email:{email}"));
        Ok(())
    }

    async fn obtain_token(&self, credentials: &Credentials) -> Result<SecretString, ApiError> {
        self.record(format!("token:{}", credentials.username()));
        let state = self.state.lock().unwrap();
        match state.accounts.get(credentials.username()) {
            Some((password, token)) if password == credentials.password() => {
                Ok(SecretString::new(token.clone()))
            }
            _ => Err(ApiError::Unauthorized),
        }
    }

    async fn list_departments(&self) -> Result<Vec<Department>, ApiError> {
        self.record("departments");
        Ok(self.departments())
    }

    async fn create_department(&self, name: &str) -> Result<Department, ApiError> {
        self.record(format!("create-department:{name}"));
        let mut state = self.state.lock().unwrap();
        let id = DepartmentId::new(state.next_id());
        let department = Department::new(id, name, Vec::new());
        state.departments.push(department.clone());
        Ok(department)
    }

    async fn update_department(
        &self,
        id: DepartmentId,
        name: &str,
    ) -> Result<Department, ApiError> {
        self.record(format!("update-department:{id}:{name}"));
        let mut state = self.state.lock().unwrap();
        let department = Department::new(id, name, Vec::new());
        for existing in &mut state.departments {
            if existing.id() == id {
                *existing = department.clone();
            }
        }
        Ok(department)
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<(), ApiError> {
        self.record(format!("delete-department:{id}"));
        self.state.lock().unwrap().departments.retain(|d| d.id() != id);
        Ok(())
    }

    async fn list_trainings(&self) -> Result<Vec<Training>, ApiError> {
        self.record("trainings");
        Ok(self.trainings())
    }

    async fn create_training(&self, training: &TrainingWrite) -> Result<Training, ApiError> {
        self.record(format!("create-training:{}", training.name));
        let mut state = self.state.lock().unwrap();
        let id = TrainingId::new(state.next_id());
        let saved = to_training(id, training);
        state.trainings.push(saved.clone());
        Ok(saved)
    }

    async fn update_training(
        &self,
        id: TrainingId,
        training: &TrainingWrite,
    ) -> Result<Training, ApiError> {
        self.record(format!("update-training:{id}"));
        let mut state = self.state.lock().unwrap();
        let saved = to_training(id, training);
        for existing in &mut state.trainings {
            if existing.id() == id {
                *existing = saved.clone();
            }
        }
        Ok(saved)
    }

    async fn delete_training(&self, id: TrainingId) -> Result<(), ApiError> {
        self.record(format!("delete-training:{id}"));
        self.state.lock().unwrap().trainings.retain(|t| t.id() != id);
        Ok(())
    }

    async fn list_modules(&self) -> Result<Vec<Module>, ApiError> {
        self.record("modules");
        Ok(self.state.lock().unwrap().modules.clone())
    }

    async fn create_module(
        &self,
        training_id: TrainingId,
        module: &ModuleDraft,
    ) -> Result<Module, ApiError> {
        self.record(format!("create-module:{training_id}:{}", module.title));
        let mut state = self.state.lock().unwrap();
        let id = ModuleId::new(state.next_id());
        let saved = Module::new(
            id,
            training_id,
            module.title.clone(),
            module.description.clone(),
            module.video_embed_url.clone(),
        );
        state.modules.push(saved.clone());
        Ok(saved)
    }

    async fn update_module(
        &self,
        id: ModuleId,
        training_id: TrainingId,
        module: &ModuleDraft,
    ) -> Result<Module, ApiError> {
        self.record(format!("update-module:{id}"));
        Ok(Module::new(
            id,
            training_id,
            module.title.clone(),
            module.description.clone(),
            module.video_embed_url.clone(),
        ))
    }

    async fn delete_module(&self, id: ModuleId) -> Result<(), ApiError> {
        self.record(format!("delete-module:{id}"));
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, ApiError> {
        self.record("users");
        let state = self.state.lock().unwrap();
        match &state.users_failure {
            Some(err) => Err(err.clone()),
            None => Ok(state.users.clone()),
        }
    }

    async fn create_user(
        &self,
        user: &UserDraft,
        password: Option<&SecretString>,
    ) -> Result<UserAccount, ApiError> {
        self.record(format!("create-user:{}", user.username()));
        let mut state = self.state.lock().unwrap();
        state.last_password = Some(password.map(|p| p.expose_secret().clone()));
        let id = UserId::new(state.next_id());
        let account = to_account(id, user);
        state.users.push(account.clone());
        Ok(account)
    }

    async fn update_user(
        &self,
        id: UserId,
        user: &UserDraft,
        password: Option<&SecretString>,
    ) -> Result<UserAccount, ApiError> {
        self.record(format!("update-user:{id}"));
        let mut state = self.state.lock().unwrap();
        state.last_password = Some(password.map(|p| p.expose_secret().clone()));
        Ok(to_account(id, user))
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.record(format!("delete-user:{id}"));
        Ok(())
    }

    async fn reset_password(&self, id: UserId) -> Result<(), ApiError> {
        self.record(format!("reset-password:{id}"));
        Ok(())
    }

    async fn user_trainings(&self, id: UserId) -> Result<Vec<UserTrainingReport>, ApiError> {
        self.record(format!("user-trainings:{id}"));
        Ok(self
            .state
            .lock()
            .unwrap()
            .reports
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

fn to_training(id: TrainingId, training: &TrainingWrite) -> Training {
    Training::from_server(
        id,
        training.code.clone(),
        training.name.clone(),
        training.owner.clone(),
        training.last_updated,
        training.department_id,
        Vec::new(),
    )
}

fn to_account(id: UserId, user: &UserDraft) -> UserAccount {
    UserAccount {
        id,
        username: user.username().to_string(),
        email: user.email.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_staff: user.is_staff,
        is_active: user.is_active,
    }
}

/// Fiscal department with "ICMS" (two modules) and "Ecd" (no modules),
/// plus TI with "Redes" (one module).
pub fn sample_catalog() -> Vec<Department> {
    let icms = TrainingId::new(10);
    let redes = TrainingId::new(20);
    vec![
        Department::new(
            DepartmentId::new(1),
            "Fiscal",
            vec![
                Training::from_server(
                    icms,
                    "F01",
                    "ICMS",
                    "Carla",
                    NaiveDate::from_ymd_opt(2024, 5, 2),
                    DepartmentId::new(1),
                    vec![
                        Module::new(ModuleId::new(100), icms, "Intro", "", "https://v/100"),
                        Module::new(ModuleId::new(101), icms, "ST", "", "https://v/101"),
                    ],
                ),
                Training::from_server(
                    TrainingId::new(11),
                    "F02",
                    "Ecd",
                    "Carla",
                    None,
                    DepartmentId::new(1),
                    Vec::new(),
                ),
            ],
        ),
        Department::new(
            DepartmentId::new(2),
            "TI",
            vec![Training::from_server(
                redes,
                "T01",
                "Redes",
                "Bruno",
                None,
                DepartmentId::new(2),
                vec![Module::new(ModuleId::new(200), redes, "Cabos", "", "")],
            )],
        ),
    ]
}

pub fn fast_retries(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::ZERO, Duration::ZERO)
}

/// A client wired to `api` with an in-memory session store and a fixed clock.
pub fn client_with(api: &FakePortalApi, policy: RetryPolicy) -> (PortalClient, Storage) {
    let storage = Storage::in_memory();
    let client = PortalClient::from_parts(
        Arc::new(api.clone()),
        BearerToken::new(),
        &storage,
        policy,
        Clock::fixed(fixed_now()),
    );
    (client, storage)
}

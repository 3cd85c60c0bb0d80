use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use portal_core::model::{
    ClientSettings, Credentials, Department, DepartmentId, Module, ModuleDraft, ModuleId,
    ProgressSnapshot, Training, TrainingId, UserAccount, UserDraft, UserId, UserTrainingReport,
};

use super::dto::{
    CompleteModuleRequest, DepartmentDto, DepartmentWriteDto, EmailLoginRequest, ListEnvelope,
    ModuleDto, ModuleWriteDto, ProgressDto, StartTrainingRequest, TokenRequest, TokenResponse,
    TrainingDto, TrainingWriteDto, UserDto, UserTrainingDto, UserWriteDto,
};
use super::{BearerToken, PortalApi, TrainingWrite};
use crate::error::ApiError;

/// `PortalApi` over HTTP with a per-request timeout.
#[derive(Clone)]
pub struct HttpPortalApi {
    client: Client,
    settings: ClientSettings,
    bearer: BearerToken,
}

impl HttpPortalApi {
    /// # Errors
    ///
    /// Returns `ApiError::Network` if the HTTP client cannot be built.
    pub fn new(settings: ClientSettings, bearer: BearerToken) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            settings,
            bearer,
        })
    }

    #[must_use]
    pub fn bearer(&self) -> &BearerToken {
        &self.bearer
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.settings.endpoint(path);
        debug!(%method, %url, "portal request");
        let builder = self.client.request(method, url);
        match self.bearer.current() {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::from_status(status));
        }
        Ok(response)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = Self::send(self.request(Method::GET, path)).await?;
        Ok(response.json().await?)
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let envelope: ListEnvelope<T> = self.get(path).await?;
        Ok(envelope.into_vec())
    }

    async fn write<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let response = Self::send(self.request(method, path).json(body)).await?;
        Ok(response.json().await?)
    }

    /// Send and ignore whatever body comes back.
    async fn fire<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized + Sync,
    {
        let mut builder = self.request(method, path);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        Self::send(builder).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.fire::<()>(Method::DELETE, path, None).await
    }
}

#[async_trait]
impl PortalApi for HttpPortalApi {
    async fn fetch_catalog(&self) -> Result<Vec<Department>, ApiError> {
        let departments: Vec<DepartmentDto> = self.get_list("/api/public/catalogo/").await?;
        Ok(departments.into_iter().map(Department::from).collect())
    }

    async fn fetch_my_progress(&self) -> Result<ProgressSnapshot, ApiError> {
        let progress: ProgressDto = self.get("/api/public/me/progresso/").await?;
        Ok(progress.into())
    }

    async fn start_training(&self, training_id: TrainingId) -> Result<(), ApiError> {
        let body = StartTrainingRequest {
            treinamento_id: training_id,
        };
        self.fire(Method::POST, "/api/public/iniciar-treinamento/", Some(&body))
            .await
    }

    async fn complete_module(&self, module_id: ModuleId, completed: bool) -> Result<(), ApiError> {
        let body = CompleteModuleRequest {
            modulo_id: module_id,
            concluido: completed,
        };
        self.fire(Method::POST, "/api/public/concluir-modulo/", Some(&body))
            .await
    }

    async fn login_email(&self, email: &str, name: Option<&str>) -> Result<(), ApiError> {
        let body = EmailLoginRequest { email, nome: name };
        self.fire(Method::POST, "/api/public/login-email/", Some(&body))
            .await
    }

    async fn obtain_token(&self, credentials: &Credentials) -> Result<SecretString, ApiError> {
        let body = TokenRequest {
            username: credentials.username(),
            password: credentials.password(),
        };
        let response: TokenResponse = self.write(Method::POST, "/api/token/", &body).await?;
        Ok(SecretString::new(response.access))
    }

    async fn list_departments(&self) -> Result<Vec<Department>, ApiError> {
        let departments: Vec<DepartmentDto> = self.get_list("/api/departamentos/").await?;
        Ok(departments.into_iter().map(Department::from).collect())
    }

    async fn create_department(&self, name: &str) -> Result<Department, ApiError> {
        let dto: DepartmentDto = self
            .write(Method::POST, "/api/departamentos/", &DepartmentWriteDto { nome: name })
            .await?;
        Ok(dto.into())
    }

    async fn update_department(
        &self,
        id: DepartmentId,
        name: &str,
    ) -> Result<Department, ApiError> {
        let path = format!("/api/departamentos/{id}/");
        let dto: DepartmentDto = self
            .write(Method::PUT, &path, &DepartmentWriteDto { nome: name })
            .await?;
        Ok(dto.into())
    }

    async fn delete_department(&self, id: DepartmentId) -> Result<(), ApiError> {
        self.delete(&format!("/api/departamentos/{id}/")).await
    }

    async fn list_trainings(&self) -> Result<Vec<Training>, ApiError> {
        let trainings: Vec<TrainingDto> = self.get_list("/api/treinamentos/").await?;
        Ok(trainings.into_iter().map(Training::from).collect())
    }

    async fn create_training(&self, training: &TrainingWrite) -> Result<Training, ApiError> {
        let dto: TrainingDto = self
            .write(
                Method::POST,
                "/api/treinamentos/",
                &TrainingWriteDto::from(training),
            )
            .await?;
        Ok(dto.into())
    }

    async fn update_training(
        &self,
        id: TrainingId,
        training: &TrainingWrite,
    ) -> Result<Training, ApiError> {
        let path = format!("/api/treinamentos/{id}/");
        let dto: TrainingDto = self
            .write(Method::PUT, &path, &TrainingWriteDto::from(training))
            .await?;
        Ok(dto.into())
    }

    async fn delete_training(&self, id: TrainingId) -> Result<(), ApiError> {
        self.delete(&format!("/api/treinamentos/{id}/")).await
    }

    async fn list_modules(&self) -> Result<Vec<Module>, ApiError> {
        let modules: Vec<ModuleDto> = self.get_list("/api/modulos/").await?;
        Ok(modules.into_iter().map(Module::from).collect())
    }

    async fn create_module(
        &self,
        training_id: TrainingId,
        module: &ModuleDraft,
    ) -> Result<Module, ApiError> {
        let dto: ModuleDto = self
            .write(
                Method::POST,
                "/api/modulos/",
                &ModuleWriteDto::new(training_id, module),
            )
            .await?;
        Ok(dto.into())
    }

    async fn update_module(
        &self,
        id: ModuleId,
        training_id: TrainingId,
        module: &ModuleDraft,
    ) -> Result<Module, ApiError> {
        let path = format!("/api/modulos/{id}/");
        let dto: ModuleDto = self
            .write(Method::PUT, &path, &ModuleWriteDto::new(training_id, module))
            .await?;
        Ok(dto.into())
    }

    async fn delete_module(&self, id: ModuleId) -> Result<(), ApiError> {
        self.delete(&format!("/api/modulos/{id}/")).await
    }

    async fn list_users(&self) -> Result<Vec<UserAccount>, ApiError> {
        let users: Vec<UserDto> = self.get_list("/api/usuarios/").await?;
        Ok(users.into_iter().map(UserAccount::from).collect())
    }

    async fn create_user(
        &self,
        user: &UserDraft,
        password: Option<&SecretString>,
    ) -> Result<UserAccount, ApiError> {
        let body = UserWriteDto::new(user, password.map(|p| p.expose_secret().as_str()));
        let dto: UserDto = self.write(Method::POST, "/api/usuarios/", &body).await?;
        Ok(dto.into())
    }

    async fn update_user(
        &self,
        id: UserId,
        user: &UserDraft,
        password: Option<&SecretString>,
    ) -> Result<UserAccount, ApiError> {
        let path = format!("/api/usuarios/{id}/");
        let body = UserWriteDto::new(user, password.map(|p| p.expose_secret().as_str()));
        let dto: UserDto = self.write(Method::PUT, &path, &body).await?;
        Ok(dto.into())
    }

    async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        self.delete(&format!("/api/usuarios/{id}/")).await
    }

    async fn reset_password(&self, id: UserId) -> Result<(), ApiError> {
        let path = format!("/api/usuarios/{id}/reset_password/");
        self.fire::<()>(Method::POST, &path, None).await
    }

    async fn user_trainings(&self, id: UserId) -> Result<Vec<UserTrainingReport>, ApiError> {
        let path = format!("/api/usuarios/{id}/treinamentos/");
        let rows: Vec<UserTrainingDto> = self.get_list(&path).await?;
        Ok(rows.into_iter().map(UserTrainingReport::from).collect())
    }
}

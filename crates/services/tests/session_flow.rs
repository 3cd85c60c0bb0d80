mod support;

use portal_core::model::{Role, ValidationError};
use services::{ApiError, SessionServiceError};
use storage::repository::SessionKey;
use support::{FakePortalApi, client_with, fast_retries};

fn fake() -> FakePortalApi {
    FakePortalApi::new()
        .with_account("ana@empresa.com", "segredo", "user-jwt")
        .with_account("admin", "admin-pass", "admin-jwt")
}

#[tokio::test]
async fn blank_credentials_never_reach_the_server() {
    let api = fake();
    let (client, _storage) = client_with(&api, fast_retries(1));

    let err = client
        .session()
        .login_collaborator("ana@empresa.com", "")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Validation(ValidationError::EmptyPassword)
    ));

    let err = client.session().login_admin("   ", "x").await.unwrap_err();
    assert!(matches!(
        err,
        SessionServiceError::Validation(ValidationError::EmptyUsername)
    ));
    assert!(api.calls().is_empty());
}

#[tokio::test]
async fn collaborator_login_persists_token_and_email() {
    let api = fake();
    let (client, storage) = client_with(&api, fast_retries(1));

    let context = client
        .session()
        .login_collaborator(" ana@empresa.com ", "segredo")
        .await
        .unwrap();

    assert_eq!(context.role(), Role::Collaborator);
    assert_eq!(context.last_email(), Some("ana@empresa.com"));
    assert_eq!(
        storage.sessions.get(SessionKey::UserToken).await.unwrap().as_deref(),
        Some("user-jwt")
    );
    assert_eq!(api.calls(), vec!["token:ana@empresa.com".to_string()]);
}

#[tokio::test]
async fn admin_login_wins_and_logout_falls_back_to_collaborator() {
    let api = fake();
    let (client, _storage) = client_with(&api, fast_retries(1));
    client
        .session()
        .login_collaborator("ana@empresa.com", "segredo")
        .await
        .unwrap();

    let context = client.session().login_admin("admin", "admin-pass").await.unwrap();
    assert_eq!(context.role(), Role::Admin);
    assert!(context.has_user_token());

    let context = client.session().logout_admin().await.unwrap();
    assert_eq!(context.role(), Role::Collaborator);
    assert_eq!(client.session().current().role(), Role::Collaborator);
}

#[tokio::test]
async fn collaborator_logout_forgets_email() {
    let api = fake();
    let (client, storage) = client_with(&api, fast_retries(1));
    client
        .session()
        .login_collaborator("ana@empresa.com", "segredo")
        .await
        .unwrap();

    let context = client.session().logout_collaborator().await.unwrap();

    assert_eq!(context.role(), Role::Anonymous);
    assert_eq!(context.last_email(), None);
    assert_eq!(storage.sessions.get(SessionKey::LastEmail).await.unwrap(), None);
}

#[tokio::test]
async fn rejected_credentials_leave_session_untouched() {
    let api = fake();
    let (client, storage) = client_with(&api, fast_retries(1));

    let err = client
        .session()
        .login_collaborator("ana@empresa.com", "errada")
        .await
        .unwrap_err();

    assert!(matches!(err, SessionServiceError::Api(ApiError::Unauthorized)));
    let record = storage.sessions.load_record().await.unwrap();
    assert_eq!(record.role(), Role::Anonymous);
    assert_eq!(record.last_email, None);
}

#[tokio::test]
async fn load_restores_a_persisted_session() {
    let api = fake();
    let (client, storage) = client_with(&api, fast_retries(1));
    storage
        .sessions
        .set(SessionKey::AdminToken, "stored-admin")
        .await
        .unwrap();

    let context = client.session().load().await.unwrap();

    assert_eq!(context.role(), Role::Admin);
    assert!(api.calls().is_empty());
}

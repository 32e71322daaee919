mod common;

use std::sync::Arc;
use std::time::Duration;

use garrison_api::auth::{AuthConfig, AuthService, LoginCredentials, Role};

use common::{seed_base, seed_user, spawn_app};

fn auth_service(db: Arc<garrison_api::db::DbPool>) -> AuthService {
    let config = AuthConfig::new(
        "integration-test-secret-key-that-is-long-enough-for-hs256-signing".to_string(),
        Duration::from_secs(3600),
        Duration::from_secs(86400),
    );
    AuthService::new(config, db)
}

#[tokio::test]
async fn login_issues_tokens_for_valid_credentials_only() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    seed_user(&app, "cmdr_reyes", "hunter2hunter2", Role::Commander, Some(base.id)).await;

    let auth = auth_service(app.db.clone());

    let pair = auth
        .login(&LoginCredentials {
            username: "cmdr_reyes".to_string(),
            password: "hunter2hunter2".to_string(),
        })
        .await
        .expect("login");

    let claims = auth.validate_token(&pair.access_token).expect("claims");
    assert_eq!(claims.username, "cmdr_reyes");
    assert_eq!(claims.role, "commander");
    assert_eq!(claims.base_id, Some(base.id));
    assert!(!claims.refresh);

    // Wrong password and unknown user both fail closed
    assert!(auth
        .login(&LoginCredentials {
            username: "cmdr_reyes".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .is_err());
    assert!(auth
        .login(&LoginCredentials {
            username: "nobody".to_string(),
            password: "hunter2hunter2".to_string(),
        })
        .await
        .is_err());
}

#[tokio::test]
async fn refresh_reissues_tokens_with_current_user_state() {
    let app = spawn_app().await;
    seed_user(&app, "quartermaster", "supply-chain-99", Role::Admin, None).await;

    let auth = auth_service(app.db.clone());
    let pair = auth
        .login(&LoginCredentials {
            username: "quartermaster".to_string(),
            password: "supply-chain-99".to_string(),
        })
        .await
        .unwrap();

    let refreshed = auth.refresh_token(&pair.refresh_token).await.expect("refresh");
    let claims = auth
        .validate_token(&refreshed.access_token)
        .expect("refreshed claims");
    assert_eq!(claims.role, "admin");

    // An access token is not accepted where a refresh token is required
    assert!(auth.refresh_token(&pair.access_token).await.is_err());
}

#[tokio::test]
async fn registration_enforces_unique_usernames_and_password_length() {
    let app = spawn_app().await;
    let base = seed_base(&app, "Fort Ridge").await;
    let auth = auth_service(app.db.clone());

    let request = garrison_api::auth::RegisterRequest {
        username: "logistics_day".to_string(),
        password: "supply-chain-99".to_string(),
        role: Role::Logistics,
        base_id: Some(base.id),
    };
    let created = auth.register(&request).await.expect("register");
    assert_eq!(created.role, "logistics");
    assert_eq!(created.base_id, Some(base.id));

    // The new account can log in
    assert!(auth
        .login(&LoginCredentials {
            username: "logistics_day".to_string(),
            password: "supply-chain-99".to_string(),
        })
        .await
        .is_ok());

    // Duplicate username is rejected
    assert!(auth.register(&request).await.is_err());

    // Short passwords are rejected before any write
    let weak = garrison_api::auth::RegisterRequest {
        username: "short_pw".to_string(),
        password: "abc".to_string(),
        role: Role::Commander,
        base_id: Some(base.id),
    };
    assert!(auth.register(&weak).await.is_err());
}

#[tokio::test]
async fn refresh_fails_for_deleted_users() {
    let app = spawn_app().await;
    let user = seed_user(&app, "ghost", "soon-to-be-gone", Role::Admin, None).await;

    let auth = auth_service(app.db.clone());
    let pair = auth
        .login(&LoginCredentials {
            username: "ghost".to_string(),
            password: "soon-to-be-gone".to_string(),
        })
        .await
        .unwrap();

    use garrison_api::entities::user::Entity as Users;
    use sea_orm::EntityTrait;
    Users::delete_by_id(user.id)
        .exec(app.db.as_ref())
        .await
        .unwrap();

    assert!(auth.refresh_token(&pair.refresh_token).await.is_err());

    // Unrelated garbage is rejected outright
    assert!(auth.refresh_token("not-a-token").await.is_err());
}

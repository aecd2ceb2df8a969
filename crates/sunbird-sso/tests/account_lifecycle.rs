mod common;

use std::sync::Arc;

use common::{REALM, settings};
use sunbird_sso::provider::{InMemoryUserAdmin, ProviderError, RequiredAction, UserRepresentation};
use sunbird_sso::{AccountStateManager, FederatedUserId};

fn setup() -> (AccountStateManager, Arc<InMemoryUserAdmin>, FederatedUserId) {
    let admin = Arc::new(InMemoryUserAdmin::new());
    let manager = AccountStateManager::new(settings(), admin.clone());
    let id = manager.federated_user_id("user-1").expect("federated id");
    admin.insert_user(
        REALM,
        &id,
        UserRepresentation {
            username: Some("jdoe".to_string()),
            enabled: Some(true),
            ..UserRepresentation::default()
        },
    );
    (manager, admin, id)
}

#[tokio::test]
async fn account_lifecycle_end_to_end() {
    let (manager, admin, id) = setup();

    manager.set_enabled("user-1", false).await.expect("disable");
    assert!(!admin.user(REALM, &id).expect("user").is_enabled());

    manager.set_enabled("user-1", true).await.expect("enable");
    assert!(admin.user(REALM, &id).expect("user").is_enabled());

    manager
        .set_required_action("user-1", &RequiredAction::UpdatePassword)
        .await
        .expect("required action");
    let user = admin.user(REALM, &id).expect("user");
    assert_eq!(
        user.required_actions,
        Some(vec!["UPDATE_PASSWORD".to_string()])
    );
    assert_eq!(user.username.as_deref(), Some("jdoe"));

    assert!(manager.reset_password("user-1", "Str0ng!").await.expect("reset"));
    assert_eq!(admin.password(REALM, &id).as_deref(), Some("Str0ng!"));

    manager.remove_user("user-1").await.expect("remove");
    assert!(admin.user(REALM, &id).is_none());
    manager.remove_user("user-1").await.expect("remove again");
}

#[tokio::test]
async fn blank_ids_are_rejected_before_any_provider_call() {
    let admin = Arc::new(InMemoryUserAdmin::new());
    let manager = AccountStateManager::new(settings(), admin.clone());

    let err = manager.set_enabled(" ", true).await.expect_err("blank id");
    assert!(err.is_invalid_user_data());
    let err = manager.reset_password("", "pw").await.expect_err("blank id");
    assert!(err.is_invalid_user_data());

    assert_eq!(admin.calls(), 0);
}

#[tokio::test]
async fn provider_faults_are_translated_per_operation() {
    let (manager, admin, _) = setup();
    admin.fail_with(ProviderError::http(
        400,
        r#"{"error":"invalid_request","error_description":"bad"}"#,
    ));

    let err = manager.deactivate_user("user-1").await.expect_err("fault");
    assert!(err.is_invalid_user_data());

    let err = manager.remove_user("user-1").await.expect_err("fault");
    assert!(err.is_invalid_user_data());

    assert!(!manager.reset_password("user-1", "pw").await.expect("reports false"));

    let err = manager
        .set_required_action("user-1", &RequiredAction::VerifyEmail)
        .await
        .expect_err("fault");
    assert_eq!(
        err.to_string(),
        "Identity provider returned HTTP 400 Bad Request"
    );
}

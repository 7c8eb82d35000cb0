use kanban_core::model::user::GUEST_USER_ID;
use kanban_core::service::auth_service::{AuthError, SignupForm};
use kanban_core::{Board, ContactRepository, UserRepository};

fn signup(email: &str) -> SignupForm {
    SignupForm {
        name: "Laura Schmidt".to_string(),
        email: email.to_string(),
        password: "secret1".to_string(),
        confirm_password: "secret1".to_string(),
        accept_privacy_policy: true,
    }
}

#[tokio::test]
async fn register_stores_lowercase_email_and_linked_contact() {
    let board = Board::in_memory().unwrap();
    let auth = board.auth_service();

    let user = auth.register(&signup("Laura@Gmail.com")).await.unwrap();

    assert_eq!(user.email, "laura@gmail.com");
    assert_eq!(user.initials, "LS");
    assert!(!user.is_guest);
    let contact = board.contacts().get_contact(&user.id).await.unwrap().unwrap();
    assert_eq!(contact.user_id.as_deref(), Some(user.id.as_str()));
    assert_eq!(contact.email, "laura@gmail.com");
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn register_rejects_taken_email() {
    let board = Board::in_memory().unwrap();
    let auth = board.auth_service();
    auth.register(&signup("laura@gmail.com")).await.unwrap();

    let err = auth.register(&signup("LAURA@gmail.com")).await.unwrap_err();

    assert!(matches!(err, AuthError::EmailTaken(_)));
    assert_eq!(board.users().list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn login_records_last_login_and_session() {
    let board = Board::in_memory().unwrap();
    let auth = board.auth_service();
    let registered = auth.register(&signup("laura@gmail.com")).await.unwrap();
    assert!(registered.last_login.is_none());

    let user = auth.login("LAURA@gmail.com", "secret1").await.unwrap();

    assert_eq!(user.id, registered.id);
    assert!(user.last_login.is_some());
    let stored = board.users().get_user(&user.id).await.unwrap().unwrap();
    assert_eq!(stored.last_login, user.last_login);
    assert_eq!(auth.current_user(), Some(user.clone()));
    assert_eq!(board.session().actor_id(), user.id);
}

#[tokio::test]
async fn login_with_wrong_password_keeps_session_empty() {
    let board = Board::in_memory().unwrap();
    let auth = board.auth_service();
    auth.register(&signup("laura@gmail.com")).await.unwrap();

    assert!(matches!(
        auth.login("laura@gmail.com", "wrong-password").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login("nobody@gmail.com", "secret1").await,
        Err(AuthError::InvalidCredentials)
    ));
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn guest_login_and_logout() {
    let board = Board::in_memory().unwrap();
    let auth = board.auth_service();

    let guest = auth.guest_login().unwrap();
    assert!(guest.is_guest);
    assert_eq!(board.session().actor_id(), GUEST_USER_ID);
    assert!(board.users().list_users().await.unwrap().is_empty());

    assert!(auth.logout().unwrap());
    assert!(!auth.logout().unwrap());
    assert!(auth.current_user().is_none());
}

#[tokio::test]
async fn demo_user_can_sign_in() {
    let board = Board::in_memory().unwrap();
    board.seeder().ensure_demo_users().await.unwrap();
    let auth = board.auth_service();

    let user = auth.login("anton@gmail.com", "demo123").await.unwrap();

    assert_eq!(user.name, "Anton Mayer");
    assert_eq!(board.session().current_user().map(|u| u.id), Some(user.id));
}

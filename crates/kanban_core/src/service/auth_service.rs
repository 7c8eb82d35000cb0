//! Sign-up, login and session use cases.
//!
//! # Invariants
//! - E-mail addresses are stored and compared lowercased.
//! - Every registered user also gets a linked contact with the same id.
//! - Only a successful login or guest login writes the session.

use super::validation::{is_valid_email, is_valid_name, is_valid_password};
use crate::cache::CacheError;
use crate::model::user::{NewUser, User, UserPatch};
use crate::repo::contact_repo::ContactRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use crate::session::Session;
use chrono::Utc;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug)]
pub enum AuthError {
    InvalidName,
    InvalidEmail,
    PasswordTooShort,
    PasswordMismatch,
    PrivacyPolicyNotAccepted,
    EmailTaken(String),
    InvalidCredentials,
    Repo(RepoError),
    Session(CacheError),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "name must be at least 2 characters"),
            Self::InvalidEmail => write!(f, "please enter a valid email address"),
            Self::PasswordTooShort => write!(f, "password must be at least 6 characters"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::PrivacyPolicyNotAccepted => write!(f, "the privacy policy must be accepted"),
            Self::EmailTaken(email) => write!(f, "an account with email `{email}` already exists"),
            Self::InvalidCredentials => write!(f, "invalid email or password"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Session(err) => write!(f, "session storage failed: {err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Session(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AuthError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CacheError> for AuthError {
    fn from(value: CacheError) -> Self {
        Self::Session(value)
    }
}

/// Sign-up form as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accept_privacy_policy: bool,
}

impl SignupForm {
    /// Checks field rules in form order; does not touch storage.
    pub fn validate(&self) -> AuthResult<()> {
        if !is_valid_name(&self.name) {
            return Err(AuthError::InvalidName);
        }
        if !is_valid_email(&self.email) {
            return Err(AuthError::InvalidEmail);
        }
        if !is_valid_password(&self.password) {
            return Err(AuthError::PasswordTooShort);
        }
        if self.password != self.confirm_password {
            return Err(AuthError::PasswordMismatch);
        }
        if !self.accept_privacy_policy {
            return Err(AuthError::PrivacyPolicyNotAccepted);
        }
        Ok(())
    }
}

pub struct AuthService<U: UserRepository, C: ContactRepository> {
    users: U,
    contacts: C,
    session: Session,
}

impl<U: UserRepository, C: ContactRepository> AuthService<U, C> {
    pub fn new(users: U, contacts: C, session: Session) -> Self {
        Self {
            users,
            contacts,
            session,
        }
    }

    /// Creates an account plus its linked contact. Does not sign in.
    pub async fn register(&self, form: &SignupForm) -> AuthResult<User> {
        form.validate()?;
        let email = form.email.trim().to_lowercase();
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let user = self
            .users
            .create_user(NewUser {
                name: form.name.clone(),
                email,
                password: form.password.clone(),
            })
            .await?;
        if let Err(err) = self.contacts.create_linked_contact(&user).await {
            warn!(
                "event=auth_register module=service status=partial user_id={} error={err}",
                user.id
            );
        }
        info!("event=auth_register module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Signs in with e-mail and password and records `lastLogin`.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !user.password_matches(password) {
            info!("event=auth_login module=service status=rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let patch = UserPatch {
            last_login: Some(Utc::now()),
            ..UserPatch::default()
        };
        let user = self.users.update_user(&user.id, patch).await?.unwrap_or(user);
        self.session.set_current_user(&user)?;
        info!("event=auth_login module=service status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Signs in as the shared guest account without touching the store.
    pub fn guest_login(&self) -> AuthResult<User> {
        let guest = User::guest(Utc::now());
        self.session.set_current_user(&guest)?;
        info!("event=auth_guest_login module=service status=ok");
        Ok(guest)
    }

    /// Clears the session; returns whether someone was signed in.
    pub fn logout(&self) -> AuthResult<bool> {
        Ok(self.session.clear()?)
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }
}

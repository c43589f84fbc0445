use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::{Store, StoreError},
    error::ErrorMessage,
    models::usermodel::{NewUser, User, UserRole},
    service::error::{ServiceError, StoreResultExt},
    utils::{password, rate_limit::LoginAttemptLimiter},
};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Conditions an identity provider can report. Callers must tolerate every
/// one of them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Email or password is wrong")]
    WrongCredentials,

    #[error("An account with this email already exists")]
    EmailInUse,

    #[error("Password must be at least 6 characters")]
    WeakPassword,

    #[error("Password must not be more than {0} characters")]
    PasswordTooLong(usize),

    #[error("Authentication service unavailable: {0}")]
    NetworkFailure(String),

    #[error("Too many login attempts, please try again later")]
    TooManyAttempts,

    #[error("This account has been disabled")]
    AccountDisabled,
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidEmail | AuthError::WeakPassword | AuthError::PasswordTooLong(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::WrongCredentials => StatusCode::UNAUTHORIZED,
            AuthError::EmailInUse => StatusCode::CONFLICT,
            AuthError::NetworkFailure(_) => StatusCode::BAD_GATEWAY,
            AuthError::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
            AuthError::AccountDisabled => StatusCode::FORBIDDEN,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(_) => AuthError::EmailInUse,
            other => AuthError::NetworkFailure(other.to_string()),
        }
    }
}

/// Stable identifier issued for a set of credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthIdentity {
    pub user_id: Uuid,
    pub email: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<AuthIdentity, AuthError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthIdentity, AuthError>;

    async fn logout(&self, session: &Session) -> Result<(), AuthError>;
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Credentials held in the `identities` collection as argon2 hashes.
pub struct LocalIdentityProvider {
    db_client: Arc<dyn Store>,
    limiter: LoginAttemptLimiter,
}

impl LocalIdentityProvider {
    pub fn new(db_client: Arc<dyn Store>, limiter: LoginAttemptLimiter) -> Self {
        Self { db_client, limiter }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn register(&self, email: &str, password: &str) -> Result<AuthIdentity, AuthError> {
        let email = normalize_email(email);
        if !validator::validate_email(email.as_str()) {
            return Err(AuthError::InvalidEmail);
        }

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        if password.len() > password::MAX_PASSWORD_LENGTH {
            return Err(AuthError::PasswordTooLong(password::MAX_PASSWORD_LENGTH));
        }

        if self.db_client.get_identity(&email).await?.is_some() {
            return Err(AuthError::EmailInUse);
        }

        let hashed_password = password::hash(password).map_err(|e| match e {
            ErrorMessage::ExceededMaxPasswordLength(max) => AuthError::PasswordTooLong(max),
            ErrorMessage::EmptyPassword => AuthError::WeakPassword,
            other => AuthError::NetworkFailure(other.to_string()),
        })?;

        let identity = self.db_client.save_identity(&email, &hashed_password).await?;

        tracing::info!("Registered identity {}", identity.id);

        Ok(AuthIdentity {
            user_id: identity.id,
            email: identity.email,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthIdentity, AuthError> {
        let email = normalize_email(email);
        if !validator::validate_email(email.as_str()) {
            return Err(AuthError::InvalidEmail);
        }

        if !self.limiter.is_allowed(&email).await {
            tracing::warn!("Login attempts exhausted for {}", email);
            return Err(AuthError::TooManyAttempts);
        }

        let identity = match self.db_client.get_identity(&email).await? {
            Some(identity) => identity,
            None => {
                self.limiter.record_failure(&email).await;
                return Err(AuthError::WrongCredentials);
            }
        };

        let matched = password::compare(password, &identity.password_hash).unwrap_or(false);
        if !matched {
            self.limiter.record_failure(&email).await;
            return Err(AuthError::WrongCredentials);
        }

        let user = self.db_client.get_user(Some(identity.id), None).await?;
        if user.map(|u| u.is_disabled).unwrap_or(false) {
            return Err(AuthError::AccountDisabled);
        }

        self.limiter.reset(&email).await;

        Ok(AuthIdentity {
            user_id: identity.id,
            email: identity.email,
        })
    }

    async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        tracing::debug!("Identity {} signed out", session.user_id);
        Ok(())
    }
}

/// Sign-in context. Created at sign-in, destroyed at sign-out or expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub role: UserRole,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, user_id: Uuid, role: UserRole, ttl_minutes: i64) -> Session {
        let issued_at = Utc::now();
        let session = Session {
            id: Uuid::new_v4(),
            user_id,
            role,
            issued_at,
            expires_at: issued_at + Duration::minutes(ttl_minutes),
        };

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_expired());
        sessions.insert(session.id, session.clone());

        session
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Live session by id. Expired sessions are dropped on lookup.
    pub async fn get(&self, session_id: Uuid) -> Option<Session> {
        let session = self.sessions.read().await.get(&session_id).cloned()?;

        if session.is_expired() {
            self.sessions.write().await.remove(&session_id);
            return None;
        }

        Some(session)
    }

    pub async fn remove(&self, session_id: Uuid) -> Option<Session> {
        self.sessions.write().await.remove(&session_id)
    }

    pub async fn remove_for_user(&self, user_id: Uuid) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.user_id != user_id);
        before - sessions.len()
    }
}

/// Account-level operations: identity plus the `users` record plus the
/// session lifecycle.
#[derive(Clone)]
pub struct AuthService {
    db_client: Arc<dyn Store>,
    identity: Arc<dyn IdentityProvider>,
    sessions: SessionRegistry,
    session_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(
        db_client: Arc<dyn Store>,
        identity: Arc<dyn IdentityProvider>,
        sessions: SessionRegistry,
        session_ttl_minutes: i64,
    ) -> Self {
        Self {
            db_client,
            identity,
            sessions,
            session_ttl_minutes,
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub async fn register_account(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
        phone: Option<String>,
    ) -> Result<User, ServiceError> {
        let identity = self.identity.register(email, password).await?;

        let user = self
            .db_client
            .save_user(NewUser {
                id: identity.user_id,
                email: identity.email,
                full_name: full_name.trim().to_string(),
                role: UserRole::Customer,
                phone,
            })
            .await
            .context("Failed to create user")?;

        tracing::info!("Customer account {} created", user.id);

        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(User, Session), ServiceError> {
        let identity = self.identity.login(email, password).await?;

        let user = self
            .db_client
            .get_user(Some(identity.user_id), None)
            .await
            .context("Failed to load user")?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?;

        let session = self
            .sessions
            .create(user.id, user.role, self.session_ttl_minutes)
            .await;

        tracing::info!("User {} signed in (session {})", user.id, session.id);

        Ok((user, session))
    }

    /// Destroying an unknown session is not an error.
    pub async fn sign_out(&self, session_id: Uuid) -> Result<(), ServiceError> {
        if let Some(session) = self.sessions.remove(session_id).await {
            self.identity.logout(&session).await?;
            tracing::info!("User {} signed out (session {})", session.user_id, session.id);
        }

        Ok(())
    }

    /// The user behind a token, provided its session is still registered.
    pub async fn resolve_session(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<User, ServiceError> {
        let session = self
            .sessions
            .get(session_id)
            .await
            .filter(|s| s.user_id == user_id)
            .ok_or_else(|| ServiceError::Unauthorized(ErrorMessage::SessionExpired.to_string()))?;

        let user = self
            .db_client
            .get_user(Some(session.user_id), None)
            .await
            .context("Failed to load user")?
            .ok_or_else(|| {
                ServiceError::Unauthorized(ErrorMessage::UserNoLongerExist.to_string())
            })?;

        if user.is_disabled {
            self.sessions.remove(session.id).await;
            return Err(AuthError::AccountDisabled.into());
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::db::{MemoryStore, UserExt};

    fn service_with(store: MemoryStore, max_attempts: usize) -> AuthService {
        let store: Arc<dyn Store> = Arc::new(store);
        let identity = Arc::new(LocalIdentityProvider::new(
            store.clone(),
            LoginAttemptLimiter::new(max_attempts, StdDuration::from_secs(300)),
        ));

        AuthService::new(store, identity, SessionRegistry::new(), 60)
    }

    #[tokio::test]
    async fn register_then_sign_in() {
        let service = service_with(MemoryStore::new(), 5);

        let user = service
            .register_account("  Amal@Example.com ", "secret1", "Amal Q", None)
            .await
            .unwrap();
        assert_eq!(user.email, "amal@example.com");
        assert_eq!(user.role, UserRole::Customer);

        let (signed_in, session) = service.sign_in("amal@example.com", "secret1").await.unwrap();
        assert_eq!(signed_in.id, user.id);
        assert_eq!(session.user_id, user.id);

        let resolved = service.resolve_session(session.id, user.id).await.unwrap();
        assert_eq!(resolved.id, user.id);
    }

    #[tokio::test]
    async fn registration_conditions() {
        let service = service_with(MemoryStore::new(), 5);

        let err = service
            .register_account("not-an-email", "secret1", "X", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::InvalidEmail)));

        let err = service
            .register_account("a@b.io", "123", "X", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::WeakPassword)));

        let err = service
            .register_account("a@b.io", &"x".repeat(65), "X", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::PasswordTooLong(64))));
        assert_eq!(err.to_string(), "Password must not be more than 64 characters");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        service
            .register_account("a@b.io", "secret1", "X", None)
            .await
            .unwrap();
        let err = service
            .register_account("A@B.io", "secret1", "X", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::EmailInUse)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn wrong_password_then_lockout() {
        let service = service_with(MemoryStore::new(), 2);
        service
            .register_account("a@b.io", "secret1", "X", None)
            .await
            .unwrap();

        for _ in 0..2 {
            let err = service.sign_in("a@b.io", "wrong-pass").await.unwrap_err();
            assert!(matches!(err, ServiceError::Auth(AuthError::WrongCredentials)));
        }

        let err = service.sign_in("a@b.io", "secret1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::TooManyAttempts)));
    }

    #[tokio::test]
    async fn disabled_account_cannot_sign_in() {
        let store = MemoryStore::new();
        let service = service_with(store.clone(), 5);
        let user = service
            .register_account("a@b.io", "secret1", "X", None)
            .await
            .unwrap();
        let (_, session) = service.sign_in("a@b.io", "secret1").await.unwrap();

        store.disable_user(user.id).await.unwrap();

        let err = service.sign_in("a@b.io", "secret1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Auth(AuthError::AccountDisabled)));

        let err = service.resolve_session(session.id, user.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn sign_out_destroys_the_session() {
        let service = service_with(MemoryStore::new(), 5);
        let user = service
            .register_account("a@b.io", "secret1", "X", None)
            .await
            .unwrap();
        let (_, session) = service.sign_in("a@b.io", "secret1").await.unwrap();

        service.sign_out(session.id).await.unwrap();
        // Second sign-out is a no-op.
        service.sign_out(session.id).await.unwrap();

        let err = service.resolve_session(session.id, user.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn expired_sessions_are_not_resolved() {
        let registry = SessionRegistry::new();
        let session = registry.create(Uuid::new_v4(), UserRole::Customer, -1).await;

        assert!(registry.get(session.id).await.is_none());
        assert!(registry.remove(session.id).await.is_none());
    }

    #[tokio::test]
    async fn abandoned_sessions_are_swept_on_create() {
        let registry = SessionRegistry::new();
        for _ in 0..1000 {
            registry.create(Uuid::new_v4(), UserRole::Customer, 0).await;
        }
        // The last one expired at issue time but is only swept by the next create.
        assert!(registry.session_count().await <= 1);

        let live = registry.create(Uuid::new_v4(), UserRole::Customer, 60).await;
        assert_eq!(registry.session_count().await, 1);
        assert!(registry.get(live.id).await.is_some());
    }

    #[tokio::test]
    async fn outage_surfaces_as_network_failure() {
        let err: AuthError = StoreError::Unavailable("down".to_string()).into();
        assert!(matches!(err, AuthError::NetworkFailure(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}

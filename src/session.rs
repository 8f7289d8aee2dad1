//! Auth session manager: registration, login and token refresh.
//!
//! This layer knows nothing about HTTP. Handlers turn its results into
//! cookies and JSON; the credential store and token issuer are injected.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::auth::CallerIdentity;
use crate::jwt::{IssuedToken, JwtError, TokenIssuer, TokenPair};
use crate::password::hash_password;
use crate::validation::{CharField, FieldErrors, MSG_INVALID_EMAIL};

const USERNAME_MAX_LENGTH: usize = 150;
const EMAIL_MAX_LENGTH: usize = 254;
const MSG_INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
pub const MSG_USERNAME_TAKEN: &str = "A user with that username already exists.";

/// Public view of a stored credential. Never carries the secret or its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credential {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("email address is already registered")]
    DuplicateContact,
    #[error("username is already taken")]
    UsernameTaken,
    #[error("credential store failure: {0}")]
    Store(String),
}

/// Persistence for user accounts.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fail if the email or username is already registered, email first.
    async fn ensure_available(&self, username: &str, email: &str) -> Result<(), CredentialError>;

    /// Persist a new account. `password_hash` is already hashed.
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, CredentialError>;

    /// Check a username/password pair. `Ok(None)` means the pair is wrong.
    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<CallerIdentity>, CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid input")]
    Validation(FieldErrors),
    #[error("email address is already registered")]
    DuplicateContact,
    #[error("no active account found with the given credentials")]
    InvalidCredentials,
    #[error("refresh token not found")]
    MissingRefreshToken,
    #[error("token is invalid or expired")]
    InvalidOrExpiredToken,
    #[error("internal failure: {0}")]
    Internal(String),
}

/// Validated registration payload.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = CharField::required()
            .max_length(USERNAME_MAX_LENGTH)
            .extract(payload, "username", &mut errors);
        if let Some(ref name) = username {
            if !name
                .chars()
                .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
            {
                errors.add("username", MSG_INVALID_USERNAME);
            }
        }

        let email = CharField::required()
            .max_length(EMAIL_MAX_LENGTH)
            .extract(payload, "email", &mut errors);
        if let Some(ref email) = email {
            if !crate::validation::is_valid_email(email) {
                errors.add("email", MSG_INVALID_EMAIL);
            }
        }

        let password = CharField::required()
            .untrimmed()
            .extract(payload, "password", &mut errors);

        match (username, email, password) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(Self {
                username,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Validated login payload.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let username = CharField::required().extract(payload, "username", &mut errors);
        let password = CharField::required()
            .untrimmed()
            .extract(payload, "password", &mut errors);

        match (username, password) {
            (Some(username), Some(password)) => Ok(Self { username, password }),
            _ => Err(errors),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    issuer: Arc<dyn TokenIssuer>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, issuer: Arc<dyn TokenIssuer>) -> Self {
        Self { store, issuer }
    }

    /// Create an account and return its public fields.
    pub async fn register(&self, registration: Registration) -> Result<Credential, SessionError> {
        self.store
            .ensure_available(&registration.username, &registration.email)
            .await
            .map_err(registration_error)?;

        let password_hash = hash_password(&registration.password).await.map_err(|e| {
            error!(error = %e, "Failed to hash password");
            SessionError::Internal(e.to_string())
        })?;

        // The insert can still lose a race against a concurrent registration
        let credential = self
            .store
            .create(&registration.username, &registration.email, &password_hash)
            .await
            .map_err(registration_error)?;

        info!(username = %credential.username, "User created");
        Ok(credential)
    }

    /// Verify credentials and mint a token pair.
    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(CallerIdentity, TokenPair), SessionError> {
        let identity = self
            .store
            .verify_login(&request.username, &request.password)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to verify credentials");
                SessionError::Internal(e.to_string())
            })?
            .ok_or_else(|| {
                warn!(username = %request.username, "Login rejected");
                SessionError::InvalidCredentials
            })?;

        let pair = self.issuer.issue(&identity).map_err(|e| {
            error!(error = %e, "Failed to generate tokens");
            SessionError::Internal(e.to_string())
        })?;

        Ok((identity, pair))
    }

    /// Exchange the refresh token from the request for a new access token.
    pub fn refresh(&self, refresh_token: Option<&str>) -> Result<IssuedToken, SessionError> {
        let refresh_token = refresh_token.ok_or_else(|| {
            warn!("Refresh token not found in cookies");
            SessionError::MissingRefreshToken
        })?;

        self.issuer
            .refresh_exchange(refresh_token)
            .map_err(|e: JwtError| {
                if e.is_expired() {
                    info!("Refresh token expired");
                    SessionError::InvalidOrExpiredToken
                } else if e.is_rejection() {
                    warn!(error = %e, "Refresh token rejected");
                    SessionError::InvalidOrExpiredToken
                } else {
                    error!(error = %e, "Failed to refresh access token");
                    SessionError::Internal(e.to_string())
                }
            })
    }
}

fn registration_error(e: CredentialError) -> SessionError {
    match e {
        CredentialError::DuplicateContact => SessionError::DuplicateContact,
        CredentialError::UsernameTaken => {
            SessionError::Validation(FieldErrors::single("username", MSG_USERNAME_TAKEN))
        }
        CredentialError::Store(msg) => {
            error!(error = %msg, "Failed to save user");
            SessionError::Internal(msg)
        }
    }
}

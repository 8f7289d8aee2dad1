//! JWT token generation and validation.
//!
//! Both token kinds are stateless HS256 JWTs signed with the server secret.
//! A refresh token is only ever exchanged for a new access token; it is never
//! rotated.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::CallerIdentity;

/// Token type for distinguishing access vs refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    pub username: String,
    #[serde(rename = "typ")]
    pub token_type: TokenType,
    /// JWT ID, unique per issued token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Default access token lifetime: 5 minutes
pub const DEFAULT_ACCESS_TOKEN_SECS: u64 = 5 * 60;

/// Default refresh token lifetime: 1 day
pub const DEFAULT_REFRESH_TOKEN_SECS: u64 = 24 * 60 * 60;

/// Lifetimes applied to newly issued tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetimes {
    pub access_secs: u64,
    pub refresh_secs: u64,
}

impl Default for TokenLifetimes {
    fn default() -> Self {
        Self {
            access_secs: DEFAULT_ACCESS_TOKEN_SECS,
            refresh_secs: DEFAULT_REFRESH_TOKEN_SECS,
        }
    }
}

/// A freshly signed token together with its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    /// Token duration in seconds
    pub duration: u64,
}

/// Access/refresh pair minted on login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Issues and validates signed tokens for a caller identity.
pub trait TokenIssuer: Send + Sync {
    /// Mint a new access/refresh pair.
    fn issue(&self, identity: &CallerIdentity) -> Result<TokenPair, JwtError>;

    /// Verify an access token and return the identity it was issued to.
    fn verify_access(&self, token: &str) -> Result<CallerIdentity, JwtError>;

    /// Exchange a valid refresh token for a new access token.
    fn refresh_exchange(&self, refresh_token: &str) -> Result<IssuedToken, JwtError>;
}

/// Configuration for JWT operations.
#[derive(Clone)]
pub struct JwtConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetimes: TokenLifetimes,
}

impl JwtConfig {
    /// Create a new JWT configuration with the given secret and default lifetimes.
    pub fn new(secret: &[u8]) -> Self {
        Self::with_lifetimes(secret, TokenLifetimes::default())
    }

    pub fn with_lifetimes(secret: &[u8], lifetimes: TokenLifetimes) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            lifetimes,
        }
    }

    fn generate(
        &self,
        user_id: i64,
        username: &str,
        token_type: TokenType,
    ) -> Result<IssuedToken, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let duration = match token_type {
            TokenType::Access => self.lifetimes.access_secs,
            TokenType::Refresh => self.lifetimes.refresh_secs,
        };

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            token_type,
            jti: uuid::Uuid::new_v4().to_string(),
            iat: now,
            exp: now + duration,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(JwtError::Encoding)?;

        Ok(IssuedToken { token, duration })
    }

    /// Generate a short-lived access token.
    pub fn generate_access_token(
        &self,
        user_id: i64,
        username: &str,
    ) -> Result<IssuedToken, JwtError> {
        self.generate(user_id, username, TokenType::Access)
    }

    /// Generate a long-lived refresh token.
    pub fn generate_refresh_token(
        &self,
        user_id: i64,
        username: &str,
    ) -> Result<IssuedToken, JwtError> {
        self.generate(user_id, username, TokenType::Refresh)
    }

    /// Validate a token's signature and expiry and check its type.
    pub fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let token_data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(JwtError::Decoding)?;

        if token_data.claims.token_type != expected {
            return Err(JwtError::WrongTokenType);
        }

        Ok(token_data.claims)
    }
}

impl TokenIssuer for JwtConfig {
    fn issue(&self, identity: &CallerIdentity) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access: self.generate_access_token(identity.user_id, &identity.username)?,
            refresh: self.generate_refresh_token(identity.user_id, &identity.username)?,
        })
    }

    fn verify_access(&self, token: &str) -> Result<CallerIdentity, JwtError> {
        let claims = self.validate(token, TokenType::Access)?;
        claims_identity(&claims)
    }

    fn refresh_exchange(&self, refresh_token: &str) -> Result<IssuedToken, JwtError> {
        let claims = self.validate(refresh_token, TokenType::Refresh)?;
        let identity = claims_identity(&claims)?;
        self.generate_access_token(identity.user_id, &identity.username)
    }
}

fn claims_identity(claims: &Claims) -> Result<CallerIdentity, JwtError> {
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| JwtError::InvalidSubject)?;
    Ok(CallerIdentity {
        user_id,
        username: claims.username.clone(),
    })
}

/// Errors that can occur during JWT operations.
#[derive(Debug)]
pub enum JwtError {
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// Error decoding the token (bad signature, malformed, expired)
    Decoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
    /// Wrong token type (e.g., using refresh token as access token)
    WrongTokenType,
    /// Subject claim is not a user id
    InvalidSubject,
}

impl JwtError {
    /// True for failures caused by the presented token rather than by the server.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            JwtError::Decoding(_) | JwtError::WrongTokenType | JwtError::InvalidSubject
        )
    }

    pub fn is_expired(&self) -> bool {
        matches!(
            self,
            JwtError::Decoding(e)
                if matches!(e.kind(), jsonwebtoken::errors::ErrorKind::ExpiredSignature)
        )
    }
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::Decoding(e) => write!(f, "Failed to decode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
            JwtError::WrongTokenType => write!(f, "Wrong token type"),
            JwtError::InvalidSubject => write!(f, "Invalid subject claim"),
        }
    }
}

impl std::error::Error for JwtError {}

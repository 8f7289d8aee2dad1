//! Authentication user types.

/// The authenticated principal attached to a request once the gate has
/// verified its access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    /// Credential store user ID
    pub user_id: i64,
    pub username: String,
}

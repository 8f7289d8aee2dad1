use sqlx::sqlite::SqlitePool;

use crate::auth::CallerIdentity;
use crate::password::verify_password;
use crate::session::{Credential, CredentialError, CredentialStore};

#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. Returns the user ID.
    pub async fn insert(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
                .bind(username)
                .bind(email)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.last_insert_rowid())
    }

    /// Get a user by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT id, username, email, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
    }

    /// Check whether an email address is already registered.
    pub async fn is_email_taken(&self, email: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }

    /// Check whether a username is already registered.
    pub async fn is_username_taken(&self, username: &str) -> Result<bool, sqlx::Error> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.0 > 0)
    }
}

fn store_err(e: sqlx::Error) -> CredentialError {
    CredentialError::Store(e.to_string())
}

/// Map a unique-constraint violation from a racing insert to the field it hit.
fn classify_insert_error(e: sqlx::Error) -> CredentialError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            if message.contains("users.email") {
                return CredentialError::DuplicateContact;
            }
            if message.contains("users.username") {
                return CredentialError::UsernameTaken;
            }
        }
    }
    store_err(e)
}

#[async_trait::async_trait]
impl CredentialStore for UserStore {
    async fn ensure_available(&self, username: &str, email: &str) -> Result<(), CredentialError> {
        if self.is_email_taken(email).await.map_err(store_err)? {
            return Err(CredentialError::DuplicateContact);
        }
        if self.is_username_taken(username).await.map_err(store_err)? {
            return Err(CredentialError::UsernameTaken);
        }
        Ok(())
    }

    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, CredentialError> {
        let id = self
            .insert(username, email, password_hash)
            .await
            .map_err(classify_insert_error)?;

        Ok(Credential {
            id,
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<CallerIdentity>, CredentialError> {
        let Some(user) = self.get_by_username(username).await.map_err(store_err)? else {
            return Ok(None);
        };

        let matches = verify_password(password, &user.password_hash)
            .await
            .map_err(|e| CredentialError::Store(e.to_string()))?;

        Ok(matches.then(|| CallerIdentity {
            user_id: user.id,
            username: user.username,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::password::hash_password;

    #[tokio::test]
    async fn test_credential_store_duplicate_email() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.users();

        store.create("alice", "same@example.com", "h").await.unwrap();
        let err = store
            .create("bob", "same@example.com", "h")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::DuplicateContact));
    }

    #[tokio::test]
    async fn test_credential_store_duplicate_username() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.users();

        store.create("alice", "a@example.com", "h").await.unwrap();
        let err = store
            .create("alice", "b@example.com", "h")
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::UsernameTaken));
    }

    #[tokio::test]
    async fn test_ensure_available_checks_email_first() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.users();

        store.ensure_available("alice", "a@example.com").await.unwrap();
        store.insert("alice", "a@example.com", "h").await.unwrap();

        assert!(matches!(
            store.ensure_available("alice", "a@example.com").await,
            Err(CredentialError::DuplicateContact)
        ));
        assert!(matches!(
            store.ensure_available("alice", "b@example.com").await,
            Err(CredentialError::UsernameTaken)
        ));
        store.ensure_available("Alice", "b@example.com").await.unwrap();
    }

    #[tokio::test]
    async fn test_racing_insert_is_classified() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.users();

        store.insert("alice", "a@example.com", "h").await.unwrap();
        let err = store
            .insert("bob", "a@example.com", "h")
            .await
            .unwrap_err();
        assert!(matches!(
            classify_insert_error(err),
            CredentialError::DuplicateContact
        ));

        let err = store
            .insert("alice", "c@example.com", "h")
            .await
            .unwrap_err();
        assert!(matches!(
            classify_insert_error(err),
            CredentialError::UsernameTaken
        ));
    }

    #[tokio::test]
    async fn test_verify_login() {
        let db = Database::open(":memory:").await.unwrap();
        let store = db.users();
        let hash = hash_password("s3cret").await.unwrap();
        let id = store.insert("alice", "a@example.com", &hash).await.unwrap();

        let identity = store.verify_login("alice", "s3cret").await.unwrap().unwrap();
        assert_eq!(identity.user_id, id);
        assert_eq!(identity.username, "alice");

        assert!(store.verify_login("alice", "nope").await.unwrap().is_none());
        assert!(store.verify_login("nobody", "s3cret").await.unwrap().is_none());
    }
}

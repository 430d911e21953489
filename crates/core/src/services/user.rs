//! User service.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use devtodo_common::{AppError, AppResult, IdGenerator};
use devtodo_db::{entities::user, repositories::UserRepository};
use rand::Rng;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(email)]
    pub email: String,

    /// Generated from the email local part when absent.
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,

    #[validate(length(min = 6, max = 128))]
    pub password: String,

    #[validate(length(max = 50))]
    pub name: Option<String>,
}

/// Input for logging in. `identifier` is an email when it contains `@`,
/// otherwise a username.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 1))]
    pub identifier: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// Input for profile updates.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    /// An empty or whitespace-only name clears the display name.
    #[validate(length(max = 50))]
    pub name: Option<String>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new account, returning the user and a fresh API token.
    pub async fn register(&self, mut input: RegisterInput) -> AppResult<(user::Model, String)> {
        // Trim before validation so surrounding whitespace cannot pad the
        // username past the length check.
        input.username = input
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(ToString::to_string);
        input.validate()?;

        let username = match input.username.take() {
            Some(username) => {
                if !username.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(AppError::Validation(
                        "Username must be alphanumeric".to_string(),
                    ));
                }
                username
            }
            None => generate_username(&input.email),
        };

        if self
            .user_repo
            .find_by_email_or_username(&input.email, &username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let token = self.id_gen.generate_token();

        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string);

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            email: Set(input.email),
            username: Set(username.clone()),
            username_lower: Set(username.to_lowercase()),
            name: Set(name),
            avatar_url: Set(None),
            password_hash: Set(password_hash),
            token: Set(Some(token.clone())),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.user_repo.create(model).await?;
        Ok((created, token))
    }

    /// Authenticate with email-or-username plus password.
    ///
    /// Rotates the API token on every successful login. Failures never
    /// disclose whether the account or the password was wrong.
    pub async fn login(&self, input: LoginInput) -> AppResult<(user::Model, String)> {
        input.validate()?;

        let found = if input.identifier.contains('@') {
            self.user_repo.find_by_email(&input.identifier).await?
        } else {
            self.user_repo.find_by_username(&input.identifier).await?
        };

        let existing = found.ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &existing.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        let token = self.id_gen.generate_token();
        let mut active: user::ActiveModel = existing.into();
        active.token = Set(Some(token.clone()));
        active.updated_at = Set(Some(Utc::now().into()));

        let updated = self.user_repo.update(active).await?;
        Ok((updated, token))
    }

    /// Resolve an API token to its user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Set or clear the display name.
    pub async fn set_name(&self, user_id: &str, input: UpdateProfileInput) -> AppResult<user::Model> {
        input.validate()?;

        let existing = self.user_repo.get_by_id(user_id).await?;

        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(ToString::to_string);

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(name);
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Set or clear the avatar URL. File handling happens at the API layer.
    pub async fn set_avatar_url(
        &self,
        user_id: &str,
        avatar_url: Option<String>,
    ) -> AppResult<user::Model> {
        let existing = self.user_repo.get_by_id(user_id).await?;

        let mut active: user::ActiveModel = existing.into();
        active.avatar_url = Set(avatar_url);
        active.updated_at = Set(Some(Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete the account. Todos and notifications cascade at the datastore
    /// level. Returns the deleted user so callers can clean up its avatar.
    pub async fn delete_account(&self, user_id: &str) -> AppResult<user::Model> {
        let existing = self.user_repo.get_by_id(user_id).await?;
        self.user_repo.delete(user_id).await?;
        Ok(existing)
    }
}

/// Derive a username from the email local part plus a random 4-char suffix.
fn generate_username(email: &str) -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

    let base: String = email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();

    let mut rng = rand::thread_rng();
    let suffix: String = (0..4)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!("{}{suffix}", base.to_lowercase())
}

/// Hash a password with argon2.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against an argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

//! Core business logic for the authentication system.
//!
//! [`AuthService`] drives the session lifecycle:
//!
//! ```text
//! Unauthenticated --login--> AccessGranted --password grant--> Session(access + refresh)
//!     ^                                                          |        |
//!     |                                                          |   refresh grant
//!     +------------------------------logout----------------------+        |
//!                                                                 Session(renewed access)
//! ```
//!
//! The service keeps no per-session state of its own. Users live in the
//! [`UserDirectory`], refresh tokens in the [`RefreshStore`]; both are
//! injected, and every call to them is bounded by the configured operation
//! timeout.

use crate::auth::models::{AuthenticatedUser, Grant, TOKEN_TYPE, TokenResponse};
use crate::config::AuthConfig;
use crate::database::models::{NewUser, User};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::refresh_store::RefreshStore;
use crate::repositories::user_repository::UserDirectory;
use crate::utils::jwt::JwtUtils;
use crate::utils::password::PasswordHasher;
use crate::utils::refresh_token::generate_refresh_token;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Authentication service for signup, login and token grants.
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
    refresh_tokens: Arc<dyn RefreshStore>,
    passwords: PasswordHasher,
    jwt_utils: JwtUtils,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        refresh_tokens: Arc<dyn RefreshStore>,
        passwords: PasswordHasher,
        config: AuthConfig,
    ) -> Self {
        let jwt_utils = JwtUtils::new(&config.signing_secret, config.access_token_ttl);

        AuthService {
            users,
            refresh_tokens,
            passwords,
            jwt_utils,
            config,
        }
    }

    /// Registers a new user and returns its id.
    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ServiceResult<i64> {
        require_fields(&[("name", name), ("email", email), ("password", password)])?;

        let existing = self
            .bounded("user directory lookup", self.users.find_by_email(email))
            .await?;
        if existing.is_some() {
            return Err(ServiceError::email_already_used(email));
        }

        let password_hash = self
            .passwords
            .hash(password)
            .await
            .inspect_err(|e| error!(error = %e, "password hashing failed"))?;
        let user = NewUser::new(name, email, password_hash);

        // A concurrent signup can still win between the lookup and this
        // insert; the directory's unique index turns that into EmailAlreadyUsed.
        let id = self
            .bounded("user directory create", self.users.create(user))
            .await?;

        info!(user_id = id, "user signed up");
        Ok(id)
    }

    /// Checks credentials and returns the user. Mints no tokens.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<User> {
        require_fields(&[("email", email), ("password", password)])?;

        let user = self
            .bounded("user directory lookup", self.users.find_by_email(email))
            .await?;

        let Some(user) = user else {
            self.passwords.verify_decoy(password).await?;
            debug!("login rejected: unknown email");
            return Err(ServiceError::InvalidCredentials);
        };

        let matches = self
            .passwords
            .verify(&user.password_hash, password)
            .await
            .inspect_err(|e| error!(user_id = user.id, error = %e, "stored password hash unusable"))?;
        if !matches {
            debug!(user_id = user.id, "login rejected: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Dispatches a parsed token-endpoint grant.
    pub async fn grant(&self, grant: Grant) -> ServiceResult<TokenResponse> {
        match grant {
            Grant::Password { username, password } => {
                self.password_grant(&username, &password).await
            }
            Grant::RefreshToken { refresh_token } => self.refresh_grant(&refresh_token).await,
        }
    }

    /// Logs in and opens a session: access token plus a stored refresh token.
    pub async fn password_grant(&self, username: &str, password: &str) -> ServiceResult<TokenResponse> {
        let user = self.login(username, password).await?;

        let access_token = self
            .jwt_utils
            .generate_access_token(user.id, Some(&user.email))?;
        let refresh_token = generate_refresh_token()
            .inspect_err(|e| error!(error = %e, "cannot mint refresh token"))?;

        self.bounded(
            "refresh store put",
            self.refresh_tokens
                .put(&refresh_token, user.id, self.config.refresh_token_ttl),
        )
        .await?;

        info!(user_id = user.id, "password grant issued");
        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.jwt_utils.expires_in(),
            refresh_token: Some(refresh_token),
        })
    }

    /// Exchanges a live refresh token for a new access token.
    ///
    /// The presented refresh token is neither rotated nor consumed; it stays
    /// valid until its TTL lapses or it is logged out.
    pub async fn refresh_grant(&self, refresh_token: &str) -> ServiceResult<TokenResponse> {
        require_fields(&[("refresh_token", refresh_token)])?;

        let user_id = self
            .bounded("refresh store get", self.refresh_tokens.get(refresh_token))
            .await?;

        let access_token = self.jwt_utils.generate_access_token(user_id, None)?;

        debug!(user_id, "refresh grant issued");
        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            expires_in: self.jwt_utils.expires_in(),
            refresh_token: None,
        })
    }

    /// Revokes a refresh token. Unknown or already revoked tokens succeed
    /// the same way.
    pub async fn logout(&self, refresh_token: &str) -> ServiceResult<()> {
        require_fields(&[("refresh_token", refresh_token)])?;

        self.bounded("refresh store delete", self.refresh_tokens.delete(refresh_token))
            .await
    }

    /// Verifies an access token's signature, algorithm and expiry, and
    /// resolves the numeric user id it was issued for.
    pub fn verify_access_token(&self, token: &str) -> ServiceResult<AuthenticatedUser> {
        let claims = self.jwt_utils.validate_token(token)?;
        let user_id = claims.user_id()?;
        Ok(AuthenticatedUser { user_id, claims })
    }

    /// Runs a directory or store call under the operation timeout, logging
    /// infrastructure failures before handing them back.
    async fn bounded<T, E>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, E>>,
    ) -> ServiceResult<T>
    where
        ServiceError: From<E>,
    {
        let result = match tokio::time::timeout(self.config.operation_timeout, call).await {
            Ok(result) => result.map_err(ServiceError::from),
            Err(_) => Err(ServiceError::timeout(operation)),
        };

        if let Err(e) = &result {
            if e.is_infrastructure() {
                error!(operation, error = %e, "backing service call failed");
            } else {
                debug!(operation, error = %e, "backing service call rejected");
            }
        }
        result
    }
}

/// Fails with a single validation error naming every empty field.
fn require_fields(fields: &[(&str, &str)]) -> ServiceResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        warn!(fields = ?missing, "request missing required fields");
        Err(ServiceError::validation(format!(
            "{} required",
            missing.join(", ")
        )))
    }
}

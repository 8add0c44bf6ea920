use anyhow::{Context, Result};
use prok_types::User;

use crate::api::{ApiClient, ApiError};
use crate::compose::{LoginForm, SignupForm};
use crate::session::SessionStore;

/// Ties the in-memory [`Session`](crate::session::Session) of an
/// [`ApiClient`] to the token persisted on disk.
///
/// This struct handles:
/// - Restoring and validating a stored token at startup
/// - Logging in or signing up and storing the new token
/// - Logging out, which always clears local state
pub struct AuthFlow {
    api_client: ApiClient,
    session_store: SessionStore,
}

impl AuthFlow {
    /// Creates a new AuthFlow backed by `~/.prok/session`.
    pub fn new(api_client: ApiClient) -> Result<Self> {
        let session_store = SessionStore::new().context("Failed to initialize session store")?;
        Ok(Self::with_store(api_client, session_store))
    }

    pub fn with_store(api_client: ApiClient, session_store: SessionStore) -> Self {
        Self {
            api_client,
            session_store,
        }
    }

    /// Loads a stored token and validates it with the server.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(user))` if a valid session exists
    /// - `Ok(None)` if no token is stored or the server rejected it
    /// - `Err(_)` if the server could not be reached; the token is kept
    pub async fn check_existing_session(&self) -> Result<Option<User>> {
        if !self.session_store.restore_into(self.api_client.session())? {
            log_debug!("No existing session found");
            return Ok(None);
        }

        log::info!("Found existing session token, validating with server");

        match self.api_client.me().await {
            Ok(user) => {
                log::info!("Session is valid for user: {}", user.username);
                Ok(Some(user))
            }
            Err(e) if e.is_unauthorized() => {
                log::warn!("Stored session was rejected: {}", e);
                self.session_store.delete()?;
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to validate session"),
        }
    }

    /// Validate the form, log in and persist the token.
    pub async fn login(&self, form: &LoginForm) -> Result<User> {
        form.validate()?;

        let response = self
            .api_client
            .login(form.username_or_email.trim(), &form.password)
            .await
            .context("Login failed")?;

        self.save_session(&response.access_token)?;
        log::info!("Logged in as {}", response.user.username);
        Ok(response.user)
    }

    /// Validate the form, create the account and persist the token.
    pub async fn signup(&self, form: &SignupForm) -> Result<User> {
        let request = form.to_request()?;

        let response = self
            .api_client
            .signup(&request)
            .await
            .context("Signup failed")?;

        self.save_session(&response.access_token)?;
        log::info!("Signed up as {}", response.user.username);
        Ok(response.user)
    }

    /// Tell the server, then forget the token locally no matter what it said.
    pub async fn logout(&self) -> Result<()> {
        match self.api_client.logout().await {
            Ok(()) => log::info!("Logged out"),
            Err(ApiError::MissingToken) => log_debug!("Logout without a session"),
            Err(e) => log::warn!("Server logout failed, clearing local session anyway: {}", e),
        }
        self.delete_session()
    }

    /// Drop the stored token if the server has rejected it since startup.
    pub fn forget_if_invalidated(&self) -> Result<bool> {
        if self.api_client.session().was_invalidated() {
            self.delete_session()?;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn save_session(&self, token: &str) -> Result<()> {
        self.session_store
            .save(token)
            .context("Failed to save session token")
    }

    pub fn delete_session(&self) -> Result<()> {
        self.session_store
            .delete()
            .context("Failed to delete session")
    }

    pub fn api_client(&self) -> &ApiClient {
        &self.api_client
    }
}

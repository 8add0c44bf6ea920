use anyhow::{Context, Result};
use prok_types::User;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct SessionState {
    token: Option<String>,
    user: Option<User>,
    invalidated: bool,
}

/// The signed-in state shared by everything that talks to the backend.
///
/// Cloning is cheap and every clone sees the same token. The lifecycle is
/// explicit: [`Session::establish`] after login or when a stored token is
/// loaded at startup, [`Session::clear`] on logout, and
/// [`Session::invalidate`] when the server answers 401.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<RwLock<SessionState>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.establish(token.into(), None);
        session
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().token.is_some()
    }

    /// True once the server has rejected the token and nobody has logged in since.
    pub fn was_invalidated(&self) -> bool {
        self.read().invalidated
    }

    pub fn establish(&self, token: String, user: Option<User>) {
        let mut state = self.write();
        state.token = Some(token);
        state.user = user;
        state.invalidated = false;
    }

    pub fn set_user(&self, user: User) {
        self.write().user = Some(user);
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.token = None;
        state.user = None;
        state.invalidated = false;
    }

    pub fn invalidate(&self) {
        let mut state = self.write();
        state.token = None;
        state.user = None;
        state.invalidated = true;
    }
}

/// Manages session token storage in the user's home directory.
///
/// The session token is stored in `~/.prok/session` with 0600 permissions
/// to ensure only the owner can read/write the file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    file_path: PathBuf,
}

impl SessionStore {
    /// Creates a new SessionStore with the default path `~/.prok/session`.
    ///
    /// # Returns
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let home_dir = dirs::home_dir().context("Failed to determine home directory")?;
        Ok(Self::at(home_dir.join(".prok").join("session")))
    }

    /// Store the token at an explicit path.
    pub fn at(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    /// Loads the session token from the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(token))` if the file exists and contains a valid token
    /// - `Ok(None)` if the file doesn't exist or looks corrupted
    /// - `Err(_)` if the file cannot be read
    pub fn load(&self) -> Result<Option<String>> {
        if !self.file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.file_path).context("Failed to read session file")?;
        let token = content.trim();

        if token.is_empty() {
            log::warn!("Session file is empty, treating as no session");
            return Ok(None);
        }

        // JWTs are a few hundred characters; anything outside this range is junk
        if token.len() < 8 || token.len() > 4096 {
            log::warn!(
                "Session token has invalid length: {}, treating as corrupted",
                token.len()
            );
            return Ok(None);
        }

        if token.chars().any(|c| c.is_control()) {
            log::warn!("Session file contains control characters, treating as corrupted");
            return Ok(None);
        }

        log_debug!("Loaded session token from {}", self.file_path.display());
        Ok(Some(token.to_string()))
    }

    /// Load the stored token into `session`. Returns whether one was found.
    pub fn restore_into(&self, session: &Session) -> Result<bool> {
        match self.load()? {
            Some(token) => {
                session.establish(token, None);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Saves the session token with 0600 permissions using an atomic rename.
    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).context("Failed to create session directory")?;
        }

        let temp_path = self.file_path.with_extension("tmp");

        let mut file =
            fs::File::create(&temp_path).context("Failed to create temporary session file")?;
        file.write_all(token.as_bytes())
            .context("Failed to write session token")?;
        file.sync_all()
            .context("Failed to sync session file to disk")?;
        drop(file);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&temp_path, permissions)
                .context("Failed to set session file permissions")?;
        }

        fs::rename(&temp_path, &self.file_path)
            .context("Failed to rename temporary session file")?;

        log::info!("Saved session token to {}", self.file_path.display());
        Ok(())
    }

    /// Deletes the session file. Succeeds if the file doesn't exist.
    pub fn delete(&self) -> Result<()> {
        if self.file_path.exists() {
            fs::remove_file(&self.file_path).context("Failed to delete session file")?;
            log::info!("Deleted session file at {}", self.file_path.display());
        } else {
            log_debug!("Session file does not exist, nothing to delete");
        }
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.file_path
    }
}

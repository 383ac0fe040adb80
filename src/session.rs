use std::fmt;
use std::fs;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::KcatError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Process-wide login state, optionally mirrored to a JSON file.
///
/// Clones share the same state. Callers read the token right before each
/// request so a logout between calls is observed.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<Option<Session>>>,
    path: Option<Utf8PathBuf>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn load(path: Utf8PathBuf) -> Self {
        let session = read_session_file(&path);
        Self {
            state: Arc::new(RwLock::new(session)),
            path: Some(path),
        }
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    pub fn token(&self) -> Option<String> {
        self.read(|session| session.map(|session| session.token.clone()))
    }

    pub fn user(&self) -> Option<User> {
        self.read(|session| session.map(|session| session.user.clone()))
    }

    pub fn is_logged_in(&self) -> bool {
        self.read(|session| session.is_some())
    }

    pub fn set_session(&self, token: impl Into<String>, user: User) -> Result<(), KcatError> {
        let session = Session {
            token: token.into(),
            user,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        if let Some(path) = &self.path {
            write_session_file(path, &session)?;
        }
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    pub fn clear(&self) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(path) = &self.path {
            if path.as_std_path().exists() {
                if let Err(err) = fs::remove_file(path.as_std_path()) {
                    tracing::warn!(%path, %err, "failed to remove session file");
                }
            }
        }
    }

    fn read<T>(&self, f: impl FnOnce(Option<&Session>) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_ref())
    }
}

/// `Authorization` header value; empty when logged out.
pub fn authorization_value(token: Option<&str>) -> String {
    match token {
        Some(token) if !token.is_empty() => format!("Bearer {token}"),
        _ => String::new(),
    }
}

fn read_session_file(path: &Utf8Path) -> Option<Session> {
    let content = fs::read_to_string(path.as_std_path()).ok()?;
    match serde_json::from_str(&content) {
        Ok(session) => Some(session),
        Err(err) => {
            tracing::warn!(%path, %err, "ignoring unreadable session file");
            None
        }
    }
}

fn write_session_file(path: &Utf8Path, session: &Session) -> Result<(), KcatError> {
    let parent = path
        .parent()
        .ok_or_else(|| KcatError::Filesystem("invalid session path".to_string()))?;
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KcatError::Filesystem(err.to_string()))?;
    let content =
        serde_json::to_vec_pretty(session).map_err(|err| KcatError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("kcat-hub-session")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KcatError::Filesystem(err.to_string()))?;
    temp.write_all(&content)
        .map_err(|err| KcatError::Filesystem(err.to_string()))?;
    temp.persist(path.as_std_path())
        .map_err(|err| KcatError::Filesystem(err.to_string()))?;
    Ok(())
}

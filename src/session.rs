//! Authenticated session: created on login, handed to the API client, torn down on logout

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::api::LoginResponse;
use crate::config::project_dirs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Hr,
    Employee,
}

impl Role {
    fn from_wire(role: Option<&str>) -> Self {
        match role.map(|r| r.trim().to_ascii_lowercase()) {
            Some(r) if r == "employee" => Role::Employee,
            _ => Role::Hr,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    token: String,
    pub role: Role,
    pub email: String,
    /// Persist across restarts
    pub remember: bool,
}

impl Session {
    pub fn from_login(response: LoginResponse, email: &str, remember: bool) -> Self {
        Self {
            role: Role::from_wire(response.role.as_deref()),
            token: response.token.trim().to_string(),
            email: email.to_string(),
            remember,
        }
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn is_hr(&self) -> bool {
        self.role == Role::Hr
    }
}

// Keep the token out of logs
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("email", &self.email)
            .field("remember", &self.remember)
            .finish_non_exhaustive()
    }
}

/// On-disk home of a remembered session
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Result<Self> {
        let proj_dirs = project_dirs()?;
        Ok(Self::new(proj_dirs.data_local_dir().join("session.json")))
    }

    pub fn load(&self) -> Result<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)
            .context("Failed to read session file")?;
        let session: Session = serde_json::from_str(&contents)
            .context("Failed to parse session file")?;
        debug!(?session, "Restored session");
        Ok(Some(session))
    }

    /// Write the session if it asked to be remembered; otherwise make sure nothing lingers
    pub fn save(&self, session: &Session) -> Result<()> {
        if !session.remember {
            return self.clear();
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(session)?;
        fs::write(&self.path, contents)
            .context("Failed to write session file")?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .context("Failed to remove session file")?;
            info!("Cleared stored session");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(role: Option<&str>) -> LoginResponse {
        LoginResponse {
            token: "  abc.def.ghi ".to_string(),
            role: role.map(str::to_string),
        }
    }

    #[test]
    fn dashboard_login_defaults_to_hr() {
        let session = Session::from_login(login(None), "hr@example.com", false);
        assert!(session.is_hr());
        assert_eq!(session.bearer(), "Bearer abc.def.ghi");

        let session = Session::from_login(login(Some("Employee")), "e@example.com", false);
        assert_eq!(session.role, Role::Employee);
    }

    #[test]
    fn debug_output_hides_token() {
        let session = Session::from_login(login(None), "hr@example.com", true);
        let printed = format!("{:?}", session);
        assert!(!printed.contains("abc.def.ghi"));
        assert!(printed.contains("hr@example.com"));
    }

    #[test]
    fn remembered_sessions_persist() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());

        let session = Session::from_login(login(None), "hr@example.com", true);
        store.save(&session).unwrap();
        let restored = store.load().unwrap().unwrap();
        assert_eq!(restored.bearer(), session.bearer());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn unremembered_sessions_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(path.clone());

        store.save(&Session::from_login(login(None), "a@example.com", true)).unwrap();
        assert!(path.exists());
        store.save(&Session::from_login(login(None), "a@example.com", false)).unwrap();
        assert!(!path.exists());
    }
}

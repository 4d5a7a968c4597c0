//! Signed-in user session.
//!
//! A [`SessionStore`] is created once at start-up and handed to whatever
//! needs credentials. Its lifecycle is explicit: [`SessionStore::load`] on
//! start, [`SessionStore::login`] after authentication and
//! [`SessionStore::logout`] to sign out. The session is kept in a small
//! cookie-style file (`token=...; user_id=...`).

use crate::error::SessionError;
use arc_swap::ArcSwapOption;
use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TOKEN_KEY: &str = "token";
const USER_ID_KEY: &str = "user_id";

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
}

impl Session {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn to_cookie_line(&self) -> String {
        format!(
            "{}={}; {}={}",
            TOKEN_KEY,
            utf8_percent_encode(&self.token, NON_ALPHANUMERIC),
            USER_ID_KEY,
            utf8_percent_encode(&self.user_id, NON_ALPHANUMERIC)
        )
    }

    fn parse_cookie_line(line: &str) -> Result<Self, SessionError> {
        let mut token = None;
        let mut user_id = None;

        for pair in line.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| SessionError::malformed(format!("'{}' is not key=value", pair)))?;
            let value = percent_decode_str(value.trim())
                .decode_utf8()
                .map_err(|e| SessionError::malformed(format!("{} is not UTF-8: {}", key, e)))?
                .into_owned();
            match key.trim() {
                TOKEN_KEY => token = Some(value),
                USER_ID_KEY => user_id = Some(value),
                _ => {}
            }
        }

        match (token, user_id) {
            (Some(token), Some(user_id)) if !token.is_empty() && !user_id.is_empty() => {
                Ok(Self { token, user_id })
            }
            _ => Err(SessionError::malformed("token and user_id are required")),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

pub struct SessionStore {
    path: Option<PathBuf>,
    current: ArcSwapOption<Session>,
}

impl SessionStore {
    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            current: ArcSwapOption::empty(),
        }
    }

    /// Default session file location (`<data dir>/wilayah/session`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|p| p.join("wilayah").join("session"))
    }

    /// Load the session stored at `path`.
    ///
    /// A missing, unreadable or malformed file leaves the store signed out.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let session = match read_session(&path) {
            Ok(session) => session,
            Err(err) => {
                log::warn!(
                    target: "wilayah::session",
                    "Ignoring session file {}: {}",
                    path.display(),
                    err
                );
                None
            }
        };

        Self {
            path: Some(path),
            current: ArcSwapOption::new(session.map(Arc::new)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn current(&self) -> Option<Arc<Session>> {
        self.current.load_full()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.load().is_some()
    }

    /// Replace the session and persist it.
    pub fn login(&self, session: Session) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            write_session(path, &session)?;
        }
        log::info!(
            target: "wilayah::session",
            "Signed in as user {}",
            session.user_id
        );
        self.current.store(Some(Arc::new(session)));
        Ok(())
    }

    /// Forget the session and remove the stored file.
    pub fn logout(&self) -> Result<(), SessionError> {
        self.current.store(None);
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
        }
        log::info!(target: "wilayah::session", "Signed out");
        Ok(())
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("path", &self.path)
            .field("current", &self.current())
            .finish()
    }
}

fn read_session(path: &Path) -> Result<Option<Session>, SessionError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let line = contents.lines().next().unwrap_or("").trim();
    if line.is_empty() {
        return Ok(None);
    }
    Session::parse_cookie_line(line).map(Some)
}

fn write_session(path: &Path, session: &Session) -> Result<(), SessionError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // `mode` only applies to new files; tighten an existing one before writing.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(format!("{}\n", session.to_cookie_line()).as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_is_signed_out() {
        let dir = tempdir().unwrap();
        let store = SessionStore::load(dir.path().join("session"));
        assert!(!store.is_signed_in());
        assert!(store.current().is_none());
    }

    #[test]
    fn login_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session");

        let store = SessionStore::load(&path);
        store
            .login(Session::new("abc; def=ghi", "user 42"))
            .unwrap();
        assert_eq!(store.current().unwrap().user_id, "user 42");

        let reloaded = SessionStore::load(&path);
        let session = reloaded.current().unwrap();
        assert_eq!(session.token, "abc; def=ghi");
        assert_eq!(session.user_id, "user 42");
    }

    #[test]
    fn logout_clears_memory_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session");
        let store = SessionStore::load(&path);
        store.login(Session::new("t", "u")).unwrap();

        store.logout().unwrap();
        assert!(!store.is_signed_in());
        assert!(!path.exists());
        // A second logout is harmless.
        store.logout().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private_to_the_owner() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let fresh = dir.path().join("session");
        SessionStore::load(&fresh)
            .login(Session::new("t", "u"))
            .unwrap();
        assert_eq!(fs::metadata(&fresh).unwrap().permissions().mode() & 0o777, 0o600);

        let existing = dir.path().join("shared");
        fs::write(&existing, "").unwrap();
        fs::set_permissions(&existing, fs::Permissions::from_mode(0o644)).unwrap();
        SessionStore::load(&existing)
            .login(Session::new("t", "u"))
            .unwrap();
        assert_eq!(fs::metadata(&existing).unwrap().permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn malformed_file_is_signed_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session");
        fs::write(&path, "token=only-a-token\n").unwrap();
        assert!(!SessionStore::load(&path).is_signed_in());
    }

    #[test]
    fn parse_ignores_unknown_keys() {
        let session = Session::parse_cookie_line("theme=dark; token=t%20k; user_id=7").unwrap();
        assert_eq!(session, Session::new("t k", "7"));
    }

    #[test]
    fn in_memory_store_round_trip() {
        let store = SessionStore::in_memory();
        store.login(Session::new("tok", "9")).unwrap();
        assert_eq!(store.current().unwrap().bearer(), "Bearer tok");
        store.logout().unwrap();
        assert!(store.current().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let rendered = format!("{:?}", Session::new("secret", "1"));
        assert!(!rendered.contains("secret"));
    }
}

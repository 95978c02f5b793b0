use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session storage error: {0}")]
    Storage(#[from] io::Error),
}

/// File-backed token storage. Holds at most one token; saving overwrites
/// whatever was there.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn save_token(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            None
        } else {
            Some(token.to_string())
        }
    }

    pub fn is_present(&self) -> bool {
        self.token().is_some()
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Catalog,
    Login,
    Register,
}

/// Gate for the catalog view. Handed a session handle at startup; the
/// only question it asks is whether a token is present, never what the
/// token contains.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    session: SessionStore,
}

impl RouteGuard {
    pub fn new(session: SessionStore) -> Self {
        Self { session }
    }

    pub fn resolve(&self, requested: Route) -> Route {
        match requested {
            Route::Catalog if !self.session.is_present() => Route::Login,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (SessionStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        (SessionStore::new(dir.path().join("session/token")), dir)
    }

    #[test]
    fn token_roundtrip_and_clear() {
        let (store, _dir) = store();
        assert!(!store.is_present());
        store.save_token("jwt-value").expect("save");
        assert_eq!(store.token().as_deref(), Some("jwt-value"));
        store.clear().expect("clear");
        assert!(!store.is_present());
        store.clear().expect("clearing twice is fine");
    }

    #[test]
    fn blank_token_does_not_count_as_a_session() {
        let (store, _dir) = store();
        store.save_token("   ").expect("save");
        assert!(!store.is_present());
    }

    #[test]
    fn catalog_redirects_to_login_without_a_session() {
        let (store, _dir) = store();
        let guard = RouteGuard::new(store.clone());
        assert_eq!(guard.resolve(Route::Catalog), Route::Login);
        assert_eq!(guard.resolve(Route::Login), Route::Login);
        assert_eq!(guard.resolve(Route::Register), Route::Register);

        store.save_token("jwt-value").expect("save");
        assert_eq!(guard.resolve(Route::Catalog), Route::Catalog);
    }
}

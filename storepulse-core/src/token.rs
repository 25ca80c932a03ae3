//! Bearer-token storage with two durability tiers
//!
//! The console keeps exactly one access token, in either a durable tier
//! (survives restarts; written by a remember-me login) or an ephemeral
//! tier (scoped to the current session). The store is the only persisted
//! client state.

use std::path::PathBuf;

use crate::error::Result;

/// Two-tier storage for the bearer token.
///
/// `set` writes only the chosen tier and deliberately leaves the other
/// tier alone, so a durable token from an earlier remember-me login can
/// shadow a later ephemeral-only login. That quirk matches the deployed
/// behavior and is pinned by tests; `clear` is the only way to drop both
/// tiers.
pub trait TokenStore {
    /// Write the token into the durable tier if `durable`, else the
    /// ephemeral tier. The unused tier is not touched.
    fn set(&mut self, token: &str, durable: bool) -> Result<()>;

    /// Returns the stored token, preferring the durable tier when both
    /// tiers are populated. Absent or unreadable tiers yield None.
    fn get(&self) -> Option<String>;

    /// Remove the token from both tiers unconditionally.
    fn clear(&mut self) -> Result<()>;
}

/// File-backed token store.
///
/// The durable tier lives in the XDG data dir, the ephemeral tier in the
/// XDG state dir (see [`crate::config::Config::durable_token_path`] and
/// [`crate::config::Config::session_token_path`]).
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    durable_path: PathBuf,
    session_path: PathBuf,
}

impl FileTokenStore {
    pub fn new(durable_path: PathBuf, session_path: PathBuf) -> Self {
        Self {
            durable_path,
            session_path,
        }
    }

    /// Build a store at the default XDG paths.
    pub fn at_default_paths() -> Self {
        Self::new(
            crate::config::Config::durable_token_path(),
            crate::config::Config::session_token_path(),
        )
    }

    fn read_tier(path: &PathBuf) -> Option<String> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let token = content.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Failed to read token tier");
                None
            }
        }
    }

    fn remove_tier(path: &PathBuf) -> Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn set(&mut self, token: &str, durable: bool) -> Result<()> {
        let path = if durable {
            &self.durable_path
        } else {
            &self.session_path
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, token)?;

        tracing::debug!(durable, "Stored access token");
        Ok(())
    }

    fn get(&self) -> Option<String> {
        Self::read_tier(&self.durable_path).or_else(|| Self::read_tier(&self.session_path))
    }

    fn clear(&mut self) -> Result<()> {
        Self::remove_tier(&self.durable_path)?;
        Self::remove_tier(&self.session_path)?;
        tracing::debug!("Cleared access token tiers");
        Ok(())
    }
}

/// In-memory token store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    durable: Option<String>,
    session: Option<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn set(&mut self, token: &str, durable: bool) -> Result<()> {
        if durable {
            self.durable = Some(token.to_string());
        } else {
            self.session = Some(token.to_string());
        }
        Ok(())
    }

    fn get(&self) -> Option<String> {
        self.durable.clone().or_else(|| self.session.clone())
    }

    fn clear(&mut self) -> Result<()> {
        self.durable = None;
        self.session = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_store(dir: &TempDir) -> FileTokenStore {
        FileTokenStore::new(
            dir.path().join("data/access_token"),
            dir.path().join("state/session_token"),
        )
    }

    #[test]
    fn test_durable_token_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir);

        store.set("tok-durable", true).unwrap();
        assert_eq!(store.get().as_deref(), Some("tok-durable"));
    }

    #[test]
    fn test_durable_token_shadows_ephemeral() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir);

        store.set("tok-durable", true).unwrap();
        store.set("tok-session", false).unwrap();
        // Durable tier wins even though the ephemeral write came later.
        assert_eq!(store.get().as_deref(), Some("tok-durable"));
    }

    #[test]
    fn test_set_does_not_clear_other_tier() {
        let mut store = MemoryTokenStore::new();

        store.set("old-durable", true).unwrap();
        store.set("new-session", false).unwrap();
        assert_eq!(store.get().as_deref(), Some("old-durable"));

        // Only clear drops the stale durable token.
        store.clear().unwrap();
        store.set("new-session", false).unwrap();
        assert_eq!(store.get().as_deref(), Some("new-session"));
    }

    #[test]
    fn test_clear_always_yields_absent() {
        let dir = TempDir::new().unwrap();
        let mut store = file_store(&dir);

        store.set("tok-durable", true).unwrap();
        store.set("tok-session", false).unwrap();
        store.clear().unwrap();
        assert_eq!(store.get(), None);

        // Clearing an already-empty store is fine.
        store.clear().unwrap();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_empty_file_reads_as_absent() {
        let dir = TempDir::new().unwrap();
        let store = file_store(&dir);
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/access_token"), "  \n").unwrap();
        assert_eq!(store.get(), None);
    }
}

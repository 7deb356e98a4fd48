//! On-disk cache for the raw bearer token.
//!
//! Presence of the file means a previous run already completed the
//! device-code flow; callers then skip it entirely.  The store owns no
//! network logic and never validates the token it hands back — a stale
//! token surfaces later as a `TokenInvalid` error from the client.

use crate::graph::error::{GraphError, GraphResult};
use log::{debug, warn};
use std::path::{Path, PathBuf};

/// Reads / writes the cached bearer token.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The cached token, or `None` when the file is absent, empty, or
    /// unreadable (an unreadable cache just means re-authenticating).
    pub fn load(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                if token.is_empty() {
                    None
                } else {
                    debug!("Loaded cached token from {}", self.path.display());
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(
                    "Failed to read token cache {}: {}",
                    self.path.display(),
                    e
                );
                None
            }
        }
    }

    /// Persist a freshly acquired token.
    pub fn save(&self, token: &str) -> GraphResult<()> {
        std::fs::write(&self.path, token).map_err(|e| {
            GraphError::internal(format!(
                "Failed to write token cache {}: {}",
                self.path.display(),
                e
            ))
        })?;
        debug!("Cached token to {}", self.path.display());
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = std::env::temp_dir().join("photosort-token-missing");
        let store = TokenStore::new(dir.join("token.txt"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = std::env::temp_dir().join("photosort-token-roundtrip.txt");
        let store = TokenStore::new(&path);
        store.save("abc123").unwrap();
        assert_eq!(store.load().as_deref(), Some("abc123"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_whitespace_only_file_is_none() {
        let path = std::env::temp_dir().join("photosort-token-blank.txt");
        std::fs::write(&path, "  \n").unwrap();
        let store = TokenStore::new(&path);
        assert!(store.load().is_none());
        let _ = std::fs::remove_file(&path);
    }
}

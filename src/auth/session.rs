//! Session persistence.
//!
//! The active session is persisted as an opaque serialized `{user, profile}`
//! blob under a fixed key, so a restarted process resumes signed in. The
//! storage backend is pluggable: in-memory for tests, a JSON file for
//! anything that should survive the process.

use crate::documents::UserProfile;
use crate::error::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed key the session blob is stored under.
pub const SESSION_KEY: &str = "auth_user";

/// The signed-in identity, without the profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
}

/// The persisted `{user, profile}` blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedSession {
    pub user: AuthUser,
    pub profile: UserProfile,
}

/// Durable storage for the current session.
///
/// A corrupt stored blob is treated as no session (`load` returns
/// `Ok(None)`), never an error; there is no versioning or migration.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<PersistedSession>>;
    fn store(&self, session: &PersistedSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// In-memory storage. Holds the serialized blob so load exercises the
/// same parse path as the file backend.
pub struct MemorySessionStorage {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl Default for MemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let slot = self.slot.lock();
        match slot.as_deref() {
            Some(blob) => Ok(serde_json::from_str(blob).ok()),
            None => Ok(None),
        }
    }

    fn store(&self, session: &PersistedSession) -> Result<()> {
        *self.slot.lock() = Some(serde_json::to_string(session)?);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

/// File-backed storage: one JSON file named after [`SESSION_KEY`] in the
/// given directory.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", SESSION_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<PersistedSession>> {
        let blob = match fs::read_to_string(&self.path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&blob) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring corrupt session blob");
                Ok(None)
            }
        }
    }

    fn store(&self, session: &PersistedSession) -> Result<()> {
        fs::write(&self.path, serde_json::to_vec(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserRole;
    use serde_json::json;
    use tempfile::TempDir;

    fn session() -> PersistedSession {
        PersistedSession {
            user: AuthUser {
                uid: "user-1".to_string(),
                email: "a@x.com".to_string(),
            },
            profile: serde_json::from_value(json!({
                "id": "user-1",
                "email": "a@x.com",
                "name": "a",
                "role": "student",
                "createdAt": "2025-01-01T00:00:00.000Z",
                "updatedAt": "2025-01-01T00:00:00.000Z",
            }))
            .unwrap(),
        }
    }

    #[test]
    fn test_memory_roundtrip() {
        let storage = MemorySessionStorage::new();
        assert!(storage.load().unwrap().is_none());

        storage.store(&session()).unwrap();
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.user.uid, "user-1");
        assert_eq!(loaded.profile.role, UserRole::Student);

        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        assert!(storage.load().unwrap().is_none());

        storage.store(&session()).unwrap();
        let loaded = storage.load().unwrap().unwrap();
        assert_eq!(loaded.user.email, "a@x.com");

        storage.clear().unwrap();
        assert!(storage.load().unwrap().is_none());
        // Clearing twice is fine.
        storage.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        let storage = FileSessionStorage::new(dir.path());
        std::fs::write(storage.path(), b"{not json").unwrap();

        assert!(storage.load().unwrap().is_none());
    }
}

//! Credential and profile registry with a single current session.

use crate::documents::UserProfile;
use crate::error::{Result, StoreError};
use crate::store::DocumentStore;
use crate::subscriptions::Subscription;
use crate::types::{generate_id, generate_user_id, CollectionName, Timestamp, UserRole};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::session::{AuthUser, MemorySessionStorage, PersistedSession, SessionStorage};

/// One registered credential: salted password digest plus profile.
/// Plaintext passwords are never stored.
struct CredentialRecord {
    salt: String,
    password_hash: String,
    profile: UserProfile,
}

type SessionListener = Arc<dyn Fn(Option<&PersistedSession>) + Send + Sync>;

/// Auth store configuration.
pub struct AuthConfig {
    /// Where the current session is persisted.
    pub storage: Box<dyn SessionStorage>,

    /// Optional document store to mirror profiles into the `users`
    /// collection. Mirror failures are logged, never surfaced.
    pub directory: Option<Arc<DocumentStore>>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            storage: Box::new(MemorySessionStorage::new()),
            directory: None,
        }
    }
}

/// Credential + profile registry.
///
/// State machine per process: Anonymous ⇄ Authenticated(profile).
/// Sign-up and sign-in move to Authenticated, sign-out back to Anonymous.
/// Profile updates (including role reassignment) are not transitions.
pub struct AuthStore {
    /// Credential records keyed by email.
    users: RwLock<HashMap<String, CredentialRecord>>,
    session: RwLock<Option<PersistedSession>>,
    /// Shared with unsubscribe closures, hence the Arc.
    listeners: Arc<RwLock<Vec<(u64, SessionListener)>>>,
    next_listener_id: AtomicU64,
    storage: Box<dyn SessionStorage>,
    directory: Option<Arc<DocumentStore>>,
}

impl AuthStore {
    /// Create an auth store, resuming any persisted session.
    pub fn new(config: AuthConfig) -> Self {
        let session = match config.storage.load() {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "failed to load persisted session");
                None
            }
        };

        Self {
            users: RwLock::new(HashMap::new()),
            session: RwLock::new(session),
            listeners: Arc::new(RwLock::new(Vec::new())),
            next_listener_id: AtomicU64::new(1),
            storage: config.storage,
            directory: config.directory,
        }
    }

    // --- Session transitions ---

    /// Register a new user and sign them in.
    ///
    /// The profile name defaults to the email local-part.
    pub fn sign_up(&self, email: &str, password: &str, role: UserRole) -> Result<UserProfile> {
        if self.users.read().contains_key(email) {
            return Err(StoreError::AlreadyExists(email.to_string()));
        }

        let now = Timestamp::now();
        let profile = UserProfile {
            id: generate_user_id(),
            email: email.to_string(),
            name: email.split('@').next().unwrap_or(email).to_string(),
            role,
            bio: None,
            avatar: None,
            institution_id: None,
            created_at: now.as_str().to_string(),
            updated_at: now.as_str().to_string(),
            extra: serde_json::Map::new(),
        };

        let salt = generate_id();
        let record = CredentialRecord {
            password_hash: hash_password(&salt, password),
            salt,
            profile: profile.clone(),
        };
        self.users.write().insert(email.to_string(), record);

        tracing::debug!(email, role = %role, "user signed up");
        self.mirror_profile(&profile);
        self.set_session(Some(session_for(&profile)));
        Ok(profile)
    }

    /// Sign in with email and password.
    pub fn sign_in(&self, email: &str, password: &str) -> Result<UserProfile> {
        let profile = {
            let users = self.users.read();
            let record = users
                .get(email)
                .ok_or_else(|| StoreError::UserNotFound(email.to_string()))?;
            if hash_password(&record.salt, password) != record.password_hash {
                return Err(StoreError::InvalidCredentials);
            }
            record.profile.clone()
        };

        tracing::debug!(email, "user signed in");
        self.set_session(Some(session_for(&profile)));
        Ok(profile)
    }

    /// Clear the current session.
    pub fn sign_out(&self) {
        tracing::debug!("user signed out");
        self.set_session(None);
    }

    // --- Profiles ---

    /// Merge fields into the profile with the given id (linear scan over
    /// registered users) and refresh `updatedAt`. Updates the cached
    /// session profile when it is the active user. `id`, `email`, and
    /// `createdAt` cannot be changed through this path.
    pub fn update_profile(
        &self,
        user_id: &str,
        fields: serde_json::Map<String, serde_json::Value>,
    ) -> Result<UserProfile> {
        let updated = {
            let mut users = self.users.write();
            let record = users
                .values_mut()
                .find(|r| r.profile.id == user_id)
                .ok_or_else(|| StoreError::UserNotFound(user_id.to_string()))?;

            let mut map = record.profile.to_document()?;
            for (field, value) in fields {
                map.insert(field, value);
            }
            map.insert("id".to_string(), record.profile.id.clone().into());
            map.insert("email".to_string(), record.profile.email.clone().into());
            map.insert(
                "createdAt".to_string(),
                record.profile.created_at.clone().into(),
            );
            map.insert(
                "updatedAt".to_string(),
                Timestamp::now().as_str().into(),
            );

            let updated: UserProfile =
                serde_json::from_value(serde_json::Value::Object(map)).map_err(|e| {
                    StoreError::InvalidDocument {
                        collection: CollectionName::Users,
                        reason: e.to_string(),
                    }
                })?;
            record.profile = updated.clone();
            updated
        };

        self.mirror_profile(&updated);

        let is_active = self
            .session
            .read()
            .as_ref()
            .map_or(false, |s| s.user.uid == user_id);
        if is_active {
            self.set_session(Some(session_for(&updated)));
        }
        Ok(updated)
    }

    /// Look up a profile by user id.
    pub fn user_profile(&self, user_id: &str) -> Option<UserProfile> {
        self.users
            .read()
            .values()
            .find(|r| r.profile.id == user_id)
            .map(|r| r.profile.clone())
    }

    /// All profiles with the given role.
    pub fn users_by_role(&self, role: UserRole) -> Vec<UserProfile> {
        self.users
            .read()
            .values()
            .filter(|r| r.profile.role == role)
            .map(|r| r.profile.clone())
            .collect()
    }

    /// The signed-in identity, if any.
    pub fn current_user(&self) -> Option<AuthUser> {
        self.session.read().as_ref().map(|s| s.user.clone())
    }

    /// The signed-in profile, if any.
    pub fn current_profile(&self) -> Option<UserProfile> {
        self.session.read().as_ref().map(|s| s.profile.clone())
    }

    // --- Listeners ---

    /// Register a session listener. Invoked once immediately with the
    /// current session, then on every sign-in/sign-out.
    ///
    /// The listener list is snapshotted before each delivery, so callbacks
    /// may subscribe or unsubscribe re-entrantly.
    pub fn on_session_change<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<&PersistedSession>) + Send + Sync + 'static,
    {
        let listener: SessionListener = Arc::new(callback);
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.write().push((id, listener.clone()));

        {
            let session = self.session.read();
            listener(session.as_ref());
        }

        let registry = Arc::clone(&self.listeners);
        Subscription::new(move || {
            registry.write().retain(|(lid, _)| *lid != id);
        })
    }

    fn set_session(&self, session: Option<PersistedSession>) {
        *self.session.write() = session.clone();

        let result = match &session {
            Some(s) => self.storage.store(s),
            None => self.storage.clear(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "failed to persist session");
        }

        let snapshot: Vec<SessionListener> = self
            .listeners
            .read()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in snapshot {
            listener(session.as_ref());
        }
    }

    fn mirror_profile(&self, profile: &UserProfile) {
        let Some(store) = &self.directory else {
            return;
        };
        let result = profile
            .to_document()
            .and_then(|doc| store.upsert(CollectionName::Users, &profile.id, doc));
        if let Err(e) = result {
            tracing::warn!(user = %profile.id, error = %e, "failed to mirror profile to users collection");
        }
    }
}

fn session_for(profile: &UserProfile) -> PersistedSession {
    PersistedSession {
        user: AuthUser {
            uid: profile.id.clone(),
            email: profile.email.clone(),
        },
        profile: profile.clone(),
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthStore {
        AuthStore::new(AuthConfig::default())
    }

    #[test]
    fn test_sign_up_defaults_name_from_email() {
        let store = auth();
        let profile = store.sign_up("nakato@mak.ac.ug", "pw", UserRole::Instructor).unwrap();

        assert_eq!(profile.name, "nakato");
        assert_eq!(profile.role, UserRole::Instructor);
        assert!(profile.id.starts_with("user-"));
        assert_eq!(store.current_user().unwrap().uid, profile.id);
    }

    #[test]
    fn test_passwords_are_not_stored_in_plaintext() {
        let store = auth();
        store.sign_up("a@x.com", "secret-pw", UserRole::Student).unwrap();

        let users = store.users.read();
        let record = users.get("a@x.com").unwrap();
        assert_ne!(record.password_hash, "secret-pw");
        assert!(!record.password_hash.contains("secret"));
        assert_eq!(record.password_hash.len(), 64); // hex sha-256
    }

    #[test]
    fn test_same_password_different_salt_different_hash() {
        let store = auth();
        store.sign_up("a@x.com", "pw", UserRole::Student).unwrap();
        store.sign_up("b@x.com", "pw", UserRole::Student).unwrap();

        let users = store.users.read();
        let a = users.get("a@x.com").unwrap();
        let b = users.get("b@x.com").unwrap();
        assert_ne!(a.password_hash, b.password_hash);
    }

    #[test]
    fn test_update_profile_preserves_identity() {
        let store = auth();
        let profile = store.sign_up("a@x.com", "pw", UserRole::Student).unwrap();

        let mut fields = serde_json::Map::new();
        fields.insert("bio".to_string(), "Farmer".into());
        fields.insert("email".to_string(), "hijack@x.com".into());
        let updated = store.update_profile(&profile.id, fields).unwrap();

        assert_eq!(updated.bio.as_deref(), Some("Farmer"));
        assert_eq!(updated.email, "a@x.com");
        // Active session picked up the new profile.
        assert_eq!(store.current_profile().unwrap().bio.as_deref(), Some("Farmer"));
    }

    #[test]
    fn test_update_unknown_profile_fails() {
        let store = auth();
        let result = store.update_profile("user-missing", serde_json::Map::new());
        assert!(matches!(result, Err(StoreError::UserNotFound(_))));
    }

    #[test]
    fn test_users_by_role() {
        let store = auth();
        store.sign_up("s1@x.com", "pw", UserRole::Student).unwrap();
        store.sign_up("s2@x.com", "pw", UserRole::Student).unwrap();
        store.sign_up("i1@x.com", "pw", UserRole::Instructor).unwrap();

        assert_eq!(store.users_by_role(UserRole::Student).len(), 2);
        assert_eq!(store.users_by_role(UserRole::Instructor).len(), 1);
        assert!(store.users_by_role(UserRole::Institution).is_empty());
    }
}

//! Authentication: credential registry, profiles, and the current session.
//!
//! Independent of the document store, but can be linked to one so profiles
//! mirror into the `users` collection. Passwords are stored as salted
//! SHA-256 digests only.

mod session;
mod store;

pub use session::{
    AuthUser, FileSessionStorage, MemorySessionStorage, PersistedSession, SessionStorage,
    SESSION_KEY,
};
pub use store::{AuthConfig, AuthStore};

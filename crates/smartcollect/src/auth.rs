//! Credential verification and login outcomes.
//!
//! Passwords are stored as salted SHA-256 digests, never as text. The
//! [`CredentialVerifier`] trait is the seam for swapping in a different
//! scheme or an external identity provider; login classification in
//! [`CollectionState::login`](crate::state::CollectionState::login) does not
//! change with it.

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Username of the built-in admin account.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin.com";
/// Password of the built-in admin account.
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin@123";

/// A salted password digest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PasswordHash {
    salt: String,
    digest: String,
}

impl PasswordHash {
    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Hashes new passwords and checks presented ones.
pub trait CredentialVerifier: Send + Sync {
    fn hash(&self, password: &str) -> PasswordHash;
    fn verify(&self, password: &str, stored: &PasswordHash) -> bool;
}

/// Salted SHA-256 with a random 16-byte salt per credential.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Verifier;

impl Sha256Verifier {
    fn digest(salt: &str, password: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(salt.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl CredentialVerifier for Sha256Verifier {
    fn hash(&self, password: &str) -> PasswordHash {
        let salt = hex::encode(rand::random::<[u8; 16]>());
        let digest = Self::digest(&salt, password);
        PasswordHash { salt, digest }
    }

    fn verify(&self, password: &str, stored: &PasswordHash) -> bool {
        !stored.digest.is_empty() && Self::digest(&stored.salt, password) == stored.digest
    }
}

/// The admin account.
#[derive(Clone, Debug)]
pub struct AdminAccount {
    pub username: String,
    pub(crate) credential: PasswordHash,
}

impl AdminAccount {
    pub fn new(
        username: impl Into<String>,
        password: &str,
        verifier: &dyn CredentialVerifier,
    ) -> Self {
        Self {
            username: username.into(),
            credential: verifier.hash(password),
        }
    }
}

/// Result of a login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    Admin,
    /// Logged in as the agent with this id.
    Agent(String),
    /// The username exists but the password does not match.
    InvalidPassword,
    /// No account has this username.
    NotFound,
}

/// Who is currently logged in.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "role")]
pub enum SessionUser {
    Admin { id: String, name: String },
    #[serde(rename = "DCA")]
    Agent {
        id: String,
        name: String,
        username: String,
    },
}

impl SessionUser {
    /// The agent id, if an agent is logged in.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            SessionUser::Agent { id, .. } => Some(id),
            SessionUser::Admin { .. } => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, SessionUser::Admin { .. })
    }
}

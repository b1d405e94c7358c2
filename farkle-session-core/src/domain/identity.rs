use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable per-device identifier
///
/// Generated once and persisted for the lifetime of the installation.
/// Independent of transport-assigned peer handles, which may change per
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Generate a fresh device identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing token (for deserialization from a store)
    pub fn from_token(token: String) -> Result<Self, IdentityError> {
        if token.is_empty() {
            return Err(IdentityError::EmptyToken);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors that can occur when working with device identities
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IdentityError {
    #[error("Identity token cannot be empty")]
    EmptyToken,
}

/// Persistence boundary for the device identity
///
/// The embedder supplies the real store (user defaults, a file, a keychain).
/// The protocol layer only cares that the same token comes back on every
/// process lifetime.
pub trait IdentityStore {
    fn load(&self) -> Option<DeviceId>;
    fn store(&mut self, identity: &DeviceId);
}

impl<S: IdentityStore + ?Sized> IdentityStore for &mut S {
    fn load(&self) -> Option<DeviceId> {
        (**self).load()
    }

    fn store(&mut self, identity: &DeviceId) {
        (**self).store(identity)
    }
}

/// In-memory store for tests and single-process demos
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    slot: Option<DeviceId>,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn load(&self) -> Option<DeviceId> {
        self.slot.clone()
    }

    fn store(&mut self, identity: &DeviceId) {
        self.slot = Some(identity.clone());
    }
}

/// Creates the device identity once and reads it thereafter
///
/// The first call persists the identity through the store; later calls (and
/// later manager instances over the same store) return the same token.
pub struct IdentityManager<S: IdentityStore> {
    store: S,
    cached: Option<DeviceId>,
}

impl<S: IdentityStore> IdentityManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cached: None,
        }
    }

    /// Get the stable identity for this device, creating it on first use
    pub fn get_or_create(&mut self) -> DeviceId {
        if let Some(cached) = &self.cached {
            return cached.clone();
        }

        let identity = match self.store.load() {
            Some(existing) => existing,
            None => {
                let fresh = DeviceId::generate();
                self.store.store(&fresh);
                tracing::info!("🆔 Generated device identity {}", fresh);
                fresh
            }
        };

        self.cached = Some(identity.clone());
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_stable_across_calls() {
        let mut manager = IdentityManager::new(InMemoryIdentityStore::new());

        let first = manager.get_or_create();
        let second = manager.get_or_create();

        assert_eq!(first, second);
    }

    #[test]
    fn test_identity_survives_manager_restart() {
        let mut store = InMemoryIdentityStore::new();
        let first = IdentityManager::new(&mut store).get_or_create();
        let second = IdentityManager::new(&mut store).get_or_create();

        assert_eq!(first, second);
    }

    #[test]
    fn test_distinct_stores_get_distinct_identities() {
        let a = IdentityManager::new(InMemoryIdentityStore::new()).get_or_create();
        let b = IdentityManager::new(InMemoryIdentityStore::new()).get_or_create();

        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_token_rejected() {
        assert_eq!(
            DeviceId::from_token(String::new()),
            Err(IdentityError::EmptyToken)
        );
    }

    #[test]
    fn test_device_id_serialization() {
        let id = DeviceId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let back: DeviceId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

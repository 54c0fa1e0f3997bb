//! The key store abstraction the security layer plugs into.
//!
//! The packet model never signs anything; it only brackets the byte range
//! to be signed. A back-end maps key names to opaque handles that a signer
//! uses.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::name::{Name, NameComponent};

/// Parameters for creating a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParams {
    Rsa { key_size: u32 },
    Ecdsa { key_size: u32 },
}

impl Default for KeyParams {
    fn default() -> Self {
        KeyParams::Rsa { key_size: 2048 }
    }
}

/// Errors from a key store back-end.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TpmError {
    #[error("a key named {0} already exists")]
    KeyExists(Name),
    #[error("no key named {0}")]
    KeyNotFound(Name),
}

/// An opaque handle on a key held by a back-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TpmKeyHandle {
    key_name: Name,
    params: KeyParams,
}

impl TpmKeyHandle {
    pub fn new(key_name: Name, params: KeyParams) -> Self {
        Self { key_name, params }
    }

    pub fn key_name(&self) -> &Name {
        &self.key_name
    }

    pub fn params(&self) -> KeyParams {
        self.params
    }
}

impl fmt::Display for TpmKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key_name)
    }
}

/// A key store: the TPM-facing surface of the security layer.
pub trait TpmBackEnd {
    fn has_key(&self, key_name: &Name) -> bool;

    fn key_handle(&self, key_name: &Name) -> Option<Arc<TpmKeyHandle>>;

    /// Create a key for `identity`, returning its handle. The key name is
    /// `<identity>/KEY/<key-id>` with a random key id.
    fn create_key(&mut self, identity: &Name, params: KeyParams)
        -> Result<Arc<TpmKeyHandle>, TpmError>;

    fn delete_key(&mut self, key_name: &Name);
}

/// Derive a fresh key name under `identity`.
pub fn make_key_name(identity: &Name) -> Name {
    let key_id: [u8; 8] = rand::random();
    let mut key_name = identity.clone();
    key_name.append("KEY");
    key_name.append(NameComponent::new(&key_id[..]));
    key_name
}

/// An in-memory key store: a map from key Name to handle.
#[derive(Debug, Default)]
pub struct TpmBackEndMemory {
    keys: HashMap<Name, Arc<TpmKeyHandle>>,
}

impl TpmBackEndMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TpmBackEnd for TpmBackEndMemory {
    fn has_key(&self, key_name: &Name) -> bool {
        self.keys.contains_key(key_name)
    }

    fn key_handle(&self, key_name: &Name) -> Option<Arc<TpmKeyHandle>> {
        self.keys.get(key_name).cloned()
    }

    fn create_key(
        &mut self,
        identity: &Name,
        params: KeyParams,
    ) -> Result<Arc<TpmKeyHandle>, TpmError> {
        let key_name = make_key_name(identity);
        if self.has_key(&key_name) {
            return Err(TpmError::KeyExists(key_name));
        }
        let handle = Arc::new(TpmKeyHandle::new(key_name.clone(), params));
        log::trace!("created in-memory key {}", key_name);
        self.keys.insert(key_name, handle.clone());
        Ok(handle)
    }

    fn delete_key(&mut self, key_name: &Name) {
        self.keys.remove(key_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_look_up() {
        let mut tpm = TpmBackEndMemory::new();
        let identity = Name::from_uri("/org/example/alice");
        let handle = tpm.create_key(&identity, KeyParams::default()).unwrap();

        assert!(identity.is_prefix_of(handle.key_name()));
        assert!(tpm.has_key(handle.key_name()));
        assert_eq!(
            tpm.key_handle(handle.key_name()).unwrap().key_name(),
            handle.key_name()
        );
    }

    #[test]
    fn test_delete() {
        let mut tpm = TpmBackEndMemory::new();
        let handle = tpm
            .create_key(&Name::from_uri("/id"), KeyParams::Ecdsa { key_size: 256 })
            .unwrap();
        tpm.delete_key(handle.key_name());
        assert!(!tpm.has_key(handle.key_name()));
        assert!(tpm.key_handle(handle.key_name()).is_none());
    }

    #[test]
    fn test_key_name_shape() {
        let identity = Name::from_uri("/id");
        let key_name = make_key_name(&identity);
        assert_eq!(key_name.size(), 3);
        assert_eq!(key_name.get(1).unwrap().value().bytes(), b"KEY");
        assert_eq!(key_name.get(2).unwrap().len(), 8);
    }
}

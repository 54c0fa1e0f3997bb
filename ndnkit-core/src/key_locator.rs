use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::change_counter::{ChangeCounter, Changed, Counter};
use crate::name::Name;

/// How a KeyLocator identifies the signing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyLocatorType {
    None,
    /// The key is identified by a Name (plus an optional legacy digest tag).
    KeyName,
    /// The key is identified by the SHA-256 digest of its public key bits.
    KeyLocatorDigest,
    /// Legacy Binary XML: the key bits themselves.
    Key,
    /// Legacy Binary XML: the certificate bytes.
    Certificate,
}

impl Default for KeyLocatorType {
    fn default() -> Self {
        KeyLocatorType::None
    }
}

/// Deprecated qualifier for a KeyName, from the Binary XML encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyNameType {
    None,
    PublisherPublicKeyDigest,
    PublisherCertificateDigest,
    PublisherIssuerKeyDigest,
    PublisherIssuerCertificateDigest,
}

impl Default for KeyNameType {
    fn default() -> Self {
        KeyNameType::None
    }
}

/// Identifies the key that signed a packet, by name, digest, or (legacy)
/// embedded key or certificate bytes.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct KeyLocator {
    locator_type: KeyLocatorType,
    key_name: ChangeCounter<Name>,
    key_name_type: KeyNameType,
    key_name_digest: Blob,
    key_data: Blob,
    #[serde(skip)]
    change_count: Counter,
}

impl KeyLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the "none" state.
    pub fn clear(&mut self) {
        self.locator_type = KeyLocatorType::None;
        self.key_name.set(Name::new());
        self.key_name_type = KeyNameType::None;
        self.key_name_digest = Blob::null();
        self.key_data = Blob::null();
        self.change_count.increment();
    }

    pub fn locator_type(&self) -> KeyLocatorType {
        self.locator_type
    }

    pub fn set_type(&mut self, locator_type: KeyLocatorType) {
        self.locator_type = locator_type;
        self.change_count.increment();
    }

    /// The key name; meaningful when the type is KeyName.
    pub fn key_name(&self) -> &Name {
        self.key_name.get()
    }

    pub fn key_name_mut(&mut self) -> &mut Name {
        self.key_name.get_mut()
    }

    pub fn set_key_name(&mut self, name: Name) {
        self.key_name.set(name);
        self.change_count.increment();
    }

    /// The digest/key/certificate bytes; meaningful for the non-KeyName
    /// types.
    pub fn key_data(&self) -> &Blob {
        &self.key_data
    }

    pub fn set_key_data(&mut self, data: impl Into<Blob>) {
        self.key_data = data.into();
        self.change_count.increment();
    }

    pub fn key_name_type(&self) -> KeyNameType {
        self.key_name_type
    }

    /// Deprecated: qualify the KeyName with a digest kind (Binary XML only).
    pub fn set_key_name_type(&mut self, key_name_type: KeyNameType) {
        self.key_name_type = key_name_type;
        self.change_count.increment();
    }

    /// The digest attached to a qualified KeyName (Binary XML only).
    pub fn key_name_digest(&self) -> &Blob {
        &self.key_name_digest
    }

    pub fn set_key_name_digest(&mut self, digest: impl Into<Blob>) {
        self.key_name_digest = digest.into();
        self.change_count.increment();
    }
}

impl Changed for KeyLocator {
    fn change_count(&self) -> u64 {
        if self.key_name.checked_changed() {
            self.change_count.increment();
        }
        self.change_count.get()
    }
}

impl Clone for KeyLocator {
    fn clone(&self) -> Self {
        Self {
            locator_type: self.locator_type,
            key_name: self.key_name.clone(),
            key_name_type: self.key_name_type,
            key_name_digest: self.key_name_digest.clone(),
            key_data: self.key_data.clone(),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for KeyLocator {
    fn eq(&self, other: &Self) -> bool {
        self.locator_type == other.locator_type
            && self.key_name == other.key_name
            && self.key_name_type == other.key_name_type
            && self.key_name_digest == other.key_name_digest
            && self.key_data == other.key_data
    }
}

impl Eq for KeyLocator {}

/// The deprecated publisher-public-key-digest selector and SignedInfo
/// field from the Binary XML encoding.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PublisherPublicKeyDigest {
    digest: Blob,
    #[serde(skip)]
    change_count: Counter,
}

impl PublisherPublicKeyDigest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn digest(&self) -> &Blob {
        &self.digest
    }

    pub fn set_digest(&mut self, digest: impl Into<Blob>) {
        self.digest = digest.into();
        self.change_count.increment();
    }

    pub fn clear(&mut self) {
        self.digest = Blob::null();
        self.change_count.increment();
    }
}

impl Changed for PublisherPublicKeyDigest {
    fn change_count(&self) -> u64 {
        self.change_count.get()
    }
}

impl Clone for PublisherPublicKeyDigest {
    fn clone(&self) -> Self {
        Self {
            digest: self.digest.clone(),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for PublisherPublicKeyDigest {
    fn eq(&self, other: &Self) -> bool {
        self.digest == other.digest
    }
}

impl Eq for PublisherPublicKeyDigest {}

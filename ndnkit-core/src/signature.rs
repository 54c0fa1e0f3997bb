use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::change_counter::{ChangeCounter, Changed, Counter};
use crate::key_locator::{KeyLocator, PublisherPublicKeyDigest};

/// The sha-256 digest algorithm OID, 2.16.840.1.101.3.4.2.1, DER-encoded.
/// This is the default when a signature carries no explicit algorithm.
pub const SHA256_OID: [u8; 9] = [0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01];

/// Signature algorithm tags, with the integer values used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignatureType {
    /// No signature has been set.
    None,
    DigestSha256,
    Sha256WithRsa,
    Sha256WithEcdsa,
}

impl SignatureType {
    /// The wire integer, or -1 for none.
    pub fn code(&self) -> i32 {
        match self {
            SignatureType::None => -1,
            SignatureType::DigestSha256 => 0,
            SignatureType::Sha256WithRsa => 1,
            SignatureType::Sha256WithEcdsa => 3,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(SignatureType::DigestSha256),
            1 => Some(SignatureType::Sha256WithRsa),
            3 => Some(SignatureType::Sha256WithEcdsa),
            _ => None,
        }
    }
}

impl Default for SignatureType {
    fn default() -> Self {
        SignatureType::None
    }
}

/// The signature of a Data packet: an algorithm tag plus the union of the
/// fields the known algorithms use. The tag decides which fields are
/// significant; the signature bits themselves are always in `signature`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Signature {
    signature_type: SignatureType,
    digest_algorithm: Blob,
    witness: Blob,
    signature: Blob,
    publisher_public_key_digest: ChangeCounter<PublisherPublicKeyDigest>,
    key_locator: ChangeCounter<KeyLocator>,
    #[serde(skip)]
    change_count: Counter,
}

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset every field to its "none" default.
    pub fn clear(&mut self) {
        self.signature_type = SignatureType::None;
        self.digest_algorithm = Blob::null();
        self.witness = Blob::null();
        self.signature = Blob::null();
        self.publisher_public_key_digest
            .set(PublisherPublicKeyDigest::new());
        self.key_locator.set(KeyLocator::new());
        self.change_count.increment();
    }

    pub fn signature_type(&self) -> SignatureType {
        self.signature_type
    }

    pub fn set_type(&mut self, signature_type: SignatureType) {
        self.signature_type = signature_type;
        self.change_count.increment();
    }

    /// The digest algorithm OID; null means the sha-256 default.
    pub fn digest_algorithm(&self) -> &Blob {
        &self.digest_algorithm
    }

    pub fn set_digest_algorithm(&mut self, algorithm: impl Into<Blob>) {
        self.digest_algorithm = algorithm.into();
        self.change_count.increment();
    }

    /// Legacy Binary XML witness (Merkle hash path) bytes.
    pub fn witness(&self) -> &Blob {
        &self.witness
    }

    pub fn set_witness(&mut self, witness: impl Into<Blob>) {
        self.witness = witness.into();
        self.change_count.increment();
    }

    /// The raw signature bits.
    pub fn signature(&self) -> &Blob {
        &self.signature
    }

    pub fn set_signature(&mut self, signature: impl Into<Blob>) {
        self.signature = signature.into();
        self.change_count.increment();
    }

    /// Deprecated: set the key locator type to KeyLocatorDigest instead.
    pub fn publisher_public_key_digest(&self) -> &PublisherPublicKeyDigest {
        self.publisher_public_key_digest.get()
    }

    pub fn publisher_public_key_digest_mut(&mut self) -> &mut PublisherPublicKeyDigest {
        self.publisher_public_key_digest.get_mut()
    }

    pub fn key_locator(&self) -> &KeyLocator {
        self.key_locator.get()
    }

    pub fn key_locator_mut(&mut self) -> &mut KeyLocator {
        self.key_locator.get_mut()
    }

    pub fn set_key_locator(&mut self, key_locator: KeyLocator) {
        self.key_locator.set(key_locator);
        self.change_count.increment();
    }
}

impl Changed for Signature {
    fn change_count(&self) -> u64 {
        let mut changed = self.publisher_public_key_digest.checked_changed();
        changed |= self.key_locator.checked_changed();
        if changed {
            self.change_count.increment();
        }
        self.change_count.get()
    }
}

impl Clone for Signature {
    fn clone(&self) -> Self {
        Self {
            signature_type: self.signature_type,
            digest_algorithm: self.digest_algorithm.clone(),
            witness: self.witness.clone(),
            signature: self.signature.clone(),
            publisher_public_key_digest: self.publisher_public_key_digest.clone(),
            key_locator: self.key_locator.clone(),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.signature_type == other.signature_type
            && self.digest_algorithm == other.digest_algorithm
            && self.witness == other.witness
            && self.signature == other.signature
            && self.publisher_public_key_digest == other.publisher_public_key_digest
            && self.key_locator == other.key_locator
    }
}

impl Eq for Signature {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_locator::KeyLocatorType;

    #[test]
    fn test_type_codes() {
        assert_eq!(SignatureType::DigestSha256.code(), 0);
        assert_eq!(SignatureType::Sha256WithRsa.code(), 1);
        assert_eq!(SignatureType::Sha256WithEcdsa.code(), 3);
        assert_eq!(SignatureType::from_code(3), Some(SignatureType::Sha256WithEcdsa));
        assert_eq!(SignatureType::from_code(2), None);
    }

    #[test]
    fn test_nested_key_locator_change_propagates() {
        let mut signature = Signature::new();
        let before = signature.change_count();
        signature
            .key_locator_mut()
            .set_type(KeyLocatorType::KeyName);
        signature.key_locator_mut().key_name_mut().append("k");
        assert!(signature.change_count() > before);
    }

    #[test]
    fn test_clear() {
        let mut signature = Signature::new();
        signature.set_type(SignatureType::Sha256WithRsa);
        signature.set_signature(&[1u8, 2, 3][..]);
        signature.clear();
        assert_eq!(signature.signature_type(), SignatureType::None);
        assert!(signature.signature().is_null());
    }
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::blob::Blob;
use crate::change_counter::{ChangeCounter, Changed, Counter};
use crate::error::CodecError;
use crate::meta_info::MetaInfo;
use crate::name::{Name, NameComponent};
use crate::signature::Signature;
use crate::wire_format::WireFormat;

/// A Data packet: a named, signed payload.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Data {
    signature: ChangeCounter<Signature>,
    name: ChangeCounter<Name>,
    meta_info: ChangeCounter<MetaInfo>,
    content: Blob,
    #[serde(skip)]
    change_count: Counter,
}

impl Data {
    pub fn new(name: Name) -> Self {
        Self {
            name: ChangeCounter::new(name),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &Name {
        self.name.get()
    }

    pub fn name_mut(&mut self) -> &mut Name {
        self.name.get_mut()
    }

    pub fn set_name(&mut self, name: Name) {
        self.name.set(name);
        self.change_count.increment();
    }

    pub fn signature(&self) -> &Signature {
        self.signature.get()
    }

    pub fn signature_mut(&mut self) -> &mut Signature {
        self.signature.get_mut()
    }

    pub fn set_signature(&mut self, signature: Signature) {
        self.signature.set(signature);
        self.change_count.increment();
    }

    pub fn meta_info(&self) -> &MetaInfo {
        self.meta_info.get()
    }

    pub fn meta_info_mut(&mut self) -> &mut MetaInfo {
        self.meta_info.get_mut()
    }

    pub fn set_meta_info(&mut self, meta_info: MetaInfo) {
        self.meta_info.set(meta_info);
        self.change_count.increment();
    }

    /// The content; an absent content encodes as an empty Content element.
    pub fn content(&self) -> &Blob {
        &self.content
    }

    pub fn set_content(&mut self, content: impl Into<Blob>) {
        self.content = content.into();
        self.change_count.increment();
    }

    /// The name with the implicit SHA-256 digest component appended: the
    /// digest is computed over this packet's entire encoding under `format`.
    pub fn full_name(&self, format: &dyn WireFormat) -> Result<Name, CodecError> {
        let encoding = format.encode_data(self)?;
        let digest = Sha256::digest(encoding.blob().bytes());
        let mut full_name = self.name().clone();
        full_name.append(NameComponent::from_implicit_sha256_digest(&digest[..])?);
        Ok(full_name)
    }
}

impl Changed for Data {
    fn change_count(&self) -> u64 {
        let mut changed = self.signature.checked_changed();
        changed |= self.name.checked_changed();
        changed |= self.meta_info.checked_changed();
        if changed {
            self.change_count.increment();
        }
        self.change_count.get()
    }
}

impl Clone for Data {
    fn clone(&self) -> Self {
        Self {
            signature: self.signature.clone(),
            name: self.name.clone(),
            meta_info: self.meta_info.clone(),
            content: self.content.clone(),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
            && self.name == other.name
            && self.meta_info == other.meta_info
            && self.content == other.content
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta_info::ContentType;

    #[test]
    fn test_change_count_propagates() {
        let mut data = Data::new(Name::from_uri("/a"));
        let before = data.change_count();
        data.meta_info_mut().set_content_type(ContentType::Key);
        assert!(data.change_count() > before);

        let before = data.change_count();
        data.signature_mut().set_signature(&[1u8][..]);
        assert!(data.change_count() > before);
    }

    #[test]
    fn test_equality_is_structural() {
        let mut a = Data::new(Name::from_uri("/a"));
        a.set_content(&b"hello"[..]);
        let b = a.clone();
        let _ = a.change_count();
        assert_eq!(a, b);
    }
}

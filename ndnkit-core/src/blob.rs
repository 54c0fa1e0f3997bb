use std::fmt;
use std::ops::Deref;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An immutable, reference-counted byte buffer.
///
/// A Blob can also be "null" (absent), which is distinct from holding an
/// empty buffer. Cloning a Blob shares the underlying buffer; slices taken
/// from a decoder input share that input's buffer without copying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Blob {
    bytes: Option<Bytes>,
}

impl Blob {
    /// Create a null Blob.
    pub fn null() -> Self {
        Self { bytes: None }
    }

    /// Create an empty (non-null) Blob.
    pub fn empty() -> Self {
        Self {
            bytes: Some(Bytes::new()),
        }
    }

    pub fn is_null(&self) -> bool {
        self.bytes.is_none()
    }

    /// Number of bytes, or 0 when null.
    pub fn size(&self) -> usize {
        self.bytes.as_ref().map_or(0, |b| b.len())
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The bytes, or an empty slice when null.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_deref().unwrap_or(&[])
    }

    /// The shared buffer handle, if any.
    pub fn shared(&self) -> Option<&Bytes> {
        self.bytes.as_ref()
    }

    /// A sub-Blob sharing this Blob's buffer. A null Blob yields null.
    pub fn slice(&self, begin: usize, end: usize) -> Blob {
        match &self.bytes {
            Some(b) => Blob {
                bytes: Some(b.slice(begin..end)),
            },
            None => Blob::null(),
        }
    }

    /// Hex string of the value, e.g. for URIs and debugging.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(self.size() * 2);
        for byte in self.bytes() {
            out.push_str(&format!("{:02x}", byte));
        }
        out
    }
}

impl Deref for Blob {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes()
    }
}

impl From<Bytes> for Blob {
    fn from(bytes: Bytes) -> Self {
        Self { bytes: Some(bytes) }
    }
}

impl From<Vec<u8>> for Blob {
    fn from(value: Vec<u8>) -> Self {
        Self {
            bytes: Some(Bytes::from(value)),
        }
    }
}

impl From<&[u8]> for Blob {
    fn from(value: &[u8]) -> Self {
        Self {
            bytes: Some(Bytes::copy_from_slice(value)),
        }
    }
}

impl<const N: usize> From<&[u8; N]> for Blob {
    fn from(value: &[u8; N]) -> Self {
        Self::from(&value[..])
    }
}

impl From<&str> for Blob {
    fn from(value: &str) -> Self {
        Self::from(value.as_bytes())
    }
}

impl fmt::Display for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "(null)")
        } else {
            write!(f, "{}", self.to_hex())
        }
    }
}

/// A Blob of a full packet encoding together with the byte range covered by
/// the packet's signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlob {
    blob: Blob,
    signed_begin: usize,
    signed_end: usize,
}

impl SignedBlob {
    pub fn new(blob: Blob, signed_begin: usize, signed_end: usize) -> Self {
        Self {
            blob,
            signed_begin,
            signed_end,
        }
    }

    /// The whole encoding.
    pub fn blob(&self) -> &Blob {
        &self.blob
    }

    /// Offset of the first signed byte.
    pub fn signed_begin(&self) -> usize {
        self.signed_begin
    }

    /// Offset just past the last signed byte.
    pub fn signed_end(&self) -> usize {
        self.signed_end
    }

    /// The signed byte range, sharing the encoding's buffer.
    pub fn signed_portion(&self) -> Blob {
        self.blob.slice(self.signed_begin, self.signed_end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_vs_empty() {
        let null = Blob::null();
        let empty = Blob::empty();
        assert!(null.is_null());
        assert!(!empty.is_null());
        assert!(null.is_empty() && empty.is_empty());
        assert_ne!(null, empty);
    }

    #[test]
    fn test_slice_shares_bytes() {
        let blob = Blob::from(&[1u8, 2, 3, 4, 5]);
        let middle = blob.slice(1, 4);
        assert_eq!(middle.bytes(), &[2, 3, 4]);
        assert!(!middle.is_null());
    }

    #[test]
    fn test_hex() {
        assert_eq!(Blob::from(&[0x01u8, 0xab]).to_hex(), "01ab");
        assert_eq!(Blob::null().to_hex(), "");
    }

    #[test]
    fn test_signed_portion() {
        let signed = SignedBlob::new(Blob::from(&[9u8, 1, 2, 3, 9]), 1, 4);
        assert_eq!(signed.signed_portion().bytes(), &[1, 2, 3]);
    }
}

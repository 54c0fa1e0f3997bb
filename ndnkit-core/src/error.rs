/// Errors that can occur while encoding or decoding packets
///
/// One enumeration covers both wire formats. Codec functions return the
/// error immediately; a partially decoded packet object is left in a safe
/// but unspecified state. Packet-object setters never fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The bytes at the cursor do not form a valid TLV or Binary XML token.
    #[error("malformed wire token at offset {0}")]
    Malformed(usize),
    /// The cursor reached the end of the buffer in the middle of an element.
    #[error("input truncated at offset {0}")]
    Truncated(usize),
    /// A required type code was not the next element.
    #[error("unexpected type {got}, expected {expected}")]
    UnexpectedType { expected: u64, got: u64 },
    /// The nested elements did not consume exactly the declared length.
    #[error("element body does not match its declared length")]
    LengthMismatch,
    /// A declared integer exceeds 2^64-1 or a bounded field's limit.
    #[error("integer overflows its field")]
    Overflow,
    /// Encode saw a content type outside {BLOB, LINK, KEY}.
    #[error("unrecognized content type {0}")]
    UnrecognizedContentType(i32),
    /// The signature type is not in the recognized set.
    #[error("unsupported signature type {0}")]
    UnsupportedSignatureType(i32),
    /// A Binary XML dictionary tag is not in the dictionary.
    #[error("unknown Binary XML dictionary tag {0}")]
    DictionaryUnknown(u64),
    /// The selected wire format does not implement this operation.
    #[error("operation not supported by this wire format")]
    UnsupportedOperation,
}

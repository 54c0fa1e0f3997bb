use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use crate::binary_xml;
use crate::blob::{Blob, SignedBlob};
use crate::data::Data;
use crate::error::CodecError;
use crate::forwarding_entry::ForwardingEntry;
use crate::interest::Interest;
use crate::tlv;

/// One wire encoding: per-packet encode and decode operations.
///
/// Encode returns a fresh owned encoding with the signed-portion offsets
/// where the packet has one. Decode fills a caller-provided packet object
/// and returns offsets into the caller's input. A format that does not
/// implement an operation reports `UnsupportedOperation`.
pub trait WireFormat: Send + Sync {
    fn encode_interest(&self, _interest: &Interest) -> Result<SignedBlob, CodecError> {
        Err(CodecError::UnsupportedOperation)
    }

    fn decode_interest(
        &self,
        _interest: &mut Interest,
        _input: &Blob,
    ) -> Result<(usize, usize), CodecError> {
        Err(CodecError::UnsupportedOperation)
    }

    fn encode_data(&self, _data: &Data) -> Result<SignedBlob, CodecError> {
        Err(CodecError::UnsupportedOperation)
    }

    fn decode_data(&self, _data: &mut Data, _input: &Blob) -> Result<(usize, usize), CodecError> {
        Err(CodecError::UnsupportedOperation)
    }

    fn encode_forwarding_entry(&self, _entry: &ForwardingEntry) -> Result<Blob, CodecError> {
        Err(CodecError::UnsupportedOperation)
    }

    fn decode_forwarding_entry(
        &self,
        _entry: &mut ForwardingEntry,
        _input: &Blob,
    ) -> Result<(), CodecError> {
        Err(CodecError::UnsupportedOperation)
    }
}

/// The NDN-TLV wire format.
#[derive(Debug, Default)]
pub struct TlvWireFormat;

impl TlvWireFormat {
    pub fn instance() -> Arc<TlvWireFormat> {
        static INSTANCE: Lazy<Arc<TlvWireFormat>> = Lazy::new(|| Arc::new(TlvWireFormat));
        INSTANCE.clone()
    }
}

impl WireFormat for TlvWireFormat {
    fn encode_interest(&self, interest: &Interest) -> Result<SignedBlob, CodecError> {
        let mut encoder = tlv::TlvEncoder::new();
        let (signed_begin, signed_end) = tlv::codec::encode_interest(interest, &mut encoder)?;
        Ok(SignedBlob::new(encoder.into_output(), signed_begin, signed_end))
    }

    fn decode_interest(
        &self,
        interest: &mut Interest,
        input: &Blob,
    ) -> Result<(usize, usize), CodecError> {
        let mut decoder = tlv::TlvDecoder::new(input.shared().cloned().unwrap_or_default());
        tlv::codec::decode_interest(interest, &mut decoder)
    }

    fn encode_data(&self, data: &Data) -> Result<SignedBlob, CodecError> {
        let mut encoder = tlv::TlvEncoder::new();
        let (signed_begin, signed_end) = tlv::codec::encode_data(data, &mut encoder)?;
        Ok(SignedBlob::new(encoder.into_output(), signed_begin, signed_end))
    }

    fn decode_data(&self, data: &mut Data, input: &Blob) -> Result<(usize, usize), CodecError> {
        let mut decoder = tlv::TlvDecoder::new(input.shared().cloned().unwrap_or_default());
        tlv::codec::decode_data(data, &mut decoder)
    }
}

/// The legacy Binary XML wire format.
#[derive(Debug, Default)]
pub struct BinaryXmlWireFormat;

impl BinaryXmlWireFormat {
    pub fn instance() -> Arc<BinaryXmlWireFormat> {
        static INSTANCE: Lazy<Arc<BinaryXmlWireFormat>> =
            Lazy::new(|| Arc::new(BinaryXmlWireFormat));
        INSTANCE.clone()
    }
}

impl WireFormat for BinaryXmlWireFormat {
    fn encode_interest(&self, interest: &Interest) -> Result<SignedBlob, CodecError> {
        let mut encoder = binary_xml::BinaryXmlEncoder::new();
        let (signed_begin, signed_end) =
            binary_xml::codec::encode_interest(interest, &mut encoder)?;
        Ok(SignedBlob::new(encoder.into_output(), signed_begin, signed_end))
    }

    fn decode_interest(
        &self,
        interest: &mut Interest,
        input: &Blob,
    ) -> Result<(usize, usize), CodecError> {
        let mut decoder =
            binary_xml::BinaryXmlDecoder::new(input.shared().cloned().unwrap_or_default());
        binary_xml::codec::decode_interest(interest, &mut decoder)
    }

    fn encode_data(&self, data: &Data) -> Result<SignedBlob, CodecError> {
        let mut encoder = binary_xml::BinaryXmlEncoder::new();
        let (signed_begin, signed_end) = binary_xml::codec::encode_data(data, &mut encoder)?;
        Ok(SignedBlob::new(encoder.into_output(), signed_begin, signed_end))
    }

    fn decode_data(&self, data: &mut Data, input: &Blob) -> Result<(usize, usize), CodecError> {
        let mut decoder =
            binary_xml::BinaryXmlDecoder::new(input.shared().cloned().unwrap_or_default());
        binary_xml::codec::decode_data(data, &mut decoder)
    }

    fn encode_forwarding_entry(&self, entry: &ForwardingEntry) -> Result<Blob, CodecError> {
        let mut encoder = binary_xml::BinaryXmlEncoder::new();
        binary_xml::codec::encode_forwarding_entry(entry, &mut encoder)?;
        Ok(encoder.into_output())
    }

    fn decode_forwarding_entry(
        &self,
        entry: &mut ForwardingEntry,
        input: &Blob,
    ) -> Result<(), CodecError> {
        let mut decoder =
            binary_xml::BinaryXmlDecoder::new(input.shared().cloned().unwrap_or_default());
        binary_xml::codec::decode_forwarding_entry(entry, &mut decoder)
    }
}

static DEFAULT_WIRE_FORMAT: Lazy<RwLock<Arc<dyn WireFormat>>> =
    Lazy::new(|| RwLock::new(TlvWireFormat::instance()));

/// The process-wide default wire format. NDN-TLV until replaced.
pub fn default_wire_format() -> Arc<dyn WireFormat> {
    DEFAULT_WIRE_FORMAT
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

/// Replace the process-wide default. Concurrent callers pick up the new
/// format at their next encode or decode.
pub fn set_default_wire_format(format: Arc<dyn WireFormat>) {
    log::debug!("replacing the default wire format");
    *DEFAULT_WIRE_FORMAT
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = format;
}

impl Interest {
    /// Encode with the default wire format.
    pub fn wire_encode(&self) -> Result<SignedBlob, CodecError> {
        self.wire_encode_with(default_wire_format().as_ref())
    }

    pub fn wire_encode_with(&self, format: &dyn WireFormat) -> Result<SignedBlob, CodecError> {
        format.encode_interest(self)
    }

    /// Decode from `input`, reusing this object. Decoded blobs share the
    /// input's buffer. Returns the signed-portion offsets of the name.
    pub fn wire_decode(&mut self, input: &Blob) -> Result<(usize, usize), CodecError> {
        self.wire_decode_with(input, default_wire_format().as_ref())
    }

    pub fn wire_decode_with(
        &mut self,
        input: &Blob,
        format: &dyn WireFormat,
    ) -> Result<(usize, usize), CodecError> {
        format.decode_interest(self, input)
    }

    /// Decode from a plain slice; the bytes are copied once, then shared.
    pub fn wire_decode_slice(&mut self, input: &[u8]) -> Result<(usize, usize), CodecError> {
        self.wire_decode(&Blob::from(input))
    }
}

impl Data {
    /// Encode with the default wire format. The result carries the
    /// signed-portion offsets callers hash to produce the signature.
    pub fn wire_encode(&self) -> Result<SignedBlob, CodecError> {
        self.wire_encode_with(default_wire_format().as_ref())
    }

    pub fn wire_encode_with(&self, format: &dyn WireFormat) -> Result<SignedBlob, CodecError> {
        format.encode_data(self)
    }

    /// Decode from `input`, reusing this object. Decoded blobs share the
    /// input's buffer. Returns the signed-portion offsets into `input`.
    pub fn wire_decode(&mut self, input: &Blob) -> Result<(usize, usize), CodecError> {
        self.wire_decode_with(input, default_wire_format().as_ref())
    }

    pub fn wire_decode_with(
        &mut self,
        input: &Blob,
        format: &dyn WireFormat,
    ) -> Result<(usize, usize), CodecError> {
        format.decode_data(self, input)
    }

    /// Decode from a plain slice; the bytes are copied once, then shared.
    pub fn wire_decode_slice(&mut self, input: &[u8]) -> Result<(usize, usize), CodecError> {
        self.wire_decode(&Blob::from(input))
    }
}

impl ForwardingEntry {
    /// Encode with the default wire format; only Binary XML supports this.
    pub fn wire_encode(&self) -> Result<Blob, CodecError> {
        self.wire_encode_with(default_wire_format().as_ref())
    }

    pub fn wire_encode_with(&self, format: &dyn WireFormat) -> Result<Blob, CodecError> {
        format.encode_forwarding_entry(self)
    }

    pub fn wire_decode(&mut self, input: &Blob) -> Result<(), CodecError> {
        self.wire_decode_with(input, default_wire_format().as_ref())
    }

    pub fn wire_decode_with(
        &mut self,
        input: &Blob,
        format: &dyn WireFormat,
    ) -> Result<(), CodecError> {
        format.decode_forwarding_entry(self, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::Name;

    #[test]
    fn test_default_format_swap() {
        let mut interest = Interest::new(Name::from_uri("/a"));
        interest.set_nonce(&[1u8, 2, 3, 4][..]);

        // An NDN-TLV Interest starts with type 5.
        let encoding = interest.wire_encode().unwrap();
        assert_eq!(encoding.blob().bytes()[0], 5);

        set_default_wire_format(BinaryXmlWireFormat::instance());
        let encoding = interest.wire_encode().unwrap();
        set_default_wire_format(TlvWireFormat::instance());

        // A Binary XML Interest starts with the two-byte DTAG 26 header:
        // continuation byte 0x01, then 0x80 | (0xa << 3) | DTAG.
        assert_eq!(encoding.blob().bytes()[..2], [0x01, 0xd2]);
    }

    #[test]
    fn test_tlv_has_no_forwarding_entry() {
        let entry = ForwardingEntry::new();
        assert_eq!(
            entry.wire_encode_with(TlvWireFormat::instance().as_ref()),
            Err(CodecError::UnsupportedOperation)
        );
    }
}

use bytes::Bytes;

use crate::binary_xml::{token_types, TICKS_PER_SECOND};
use crate::blob::Blob;

/// A forward-writing Binary XML (ccnb) encoder.
///
/// Every element is self-delimited by the 0x00 close sentinel, so unlike
/// TLV no length needs to be known in advance.
#[derive(Debug, Default)]
pub struct BinaryXmlEncoder {
    output: Vec<u8>,
}

impl BinaryXmlEncoder {
    pub fn new() -> Self {
        Self { output: Vec::new() }
    }

    /// The current write position, an index into the finished buffer.
    pub fn offset(&self) -> usize {
        self.output.len()
    }

    /// The finished encoding.
    pub fn into_output(self) -> Blob {
        Blob::from(Bytes::from(self.output))
    }

    /// A header: 7-bit continuation bytes (high bit clear), then a final
    /// byte with the high bit set carrying the token type and the low 4
    /// value bits.
    fn write_header(&mut self, token_type: u8, mut value: u64) {
        let mut reversed = [0u8; 10];
        reversed[0] = token_types::HIGH_BIT
            | ((value & token_types::FINAL_VALUE_MASK as u64) as u8) << token_types::TYPE_BITS
            | token_type;
        value >>= token_types::FINAL_VALUE_BITS;
        let mut count = 1;
        while value != 0 {
            reversed[count] = (value & token_types::REGULAR_VALUE_MASK as u64) as u8;
            value >>= token_types::REGULAR_VALUE_BITS;
            count += 1;
        }
        for i in (0..count).rev() {
            self.output.push(reversed[i]);
        }
    }

    pub fn write_element_start(&mut self, dtag: u64) {
        self.write_header(token_types::DTAG, dtag);
    }

    pub fn write_element_close(&mut self) {
        self.output.push(token_types::CLOSE);
    }

    fn write_blob(&mut self, value: &[u8]) {
        self.write_header(token_types::BLOB, value.len() as u64);
        self.output.extend_from_slice(value);
    }

    fn write_udata(&mut self, text: &str) {
        self.write_header(token_types::UDATA, text.len() as u64);
        self.output.extend_from_slice(text.as_bytes());
    }

    /// `<dtag>BLOB</dtag>`; an empty blob writes an empty element.
    pub fn write_blob_element(&mut self, dtag: u64, value: &Blob) {
        self.write_element_start(dtag);
        if !value.is_empty() {
            self.write_blob(value.bytes());
        }
        self.write_element_close();
    }

    /// Omitted entirely when the blob is null or empty.
    pub fn write_optional_blob_element(&mut self, dtag: u64, value: &Blob) {
        if value.size() > 0 {
            self.write_blob_element(dtag, value);
        }
    }

    /// `<dtag>UDATA</dtag>`.
    pub fn write_udata_element(&mut self, dtag: u64, text: &str) {
        self.write_element_start(dtag);
        if !text.is_empty() {
            self.write_udata(text);
        }
        self.write_element_close();
    }

    /// An integer as decimal UDATA text.
    pub fn write_unsigned_decimal_int_element(&mut self, dtag: u64, value: u64) {
        self.write_udata_element(dtag, &value.to_string());
    }

    /// Omitted when `value` is negative.
    pub fn write_optional_unsigned_decimal_int_element(&mut self, dtag: u64, value: i64) {
        if value >= 0 {
            self.write_unsigned_decimal_int_element(dtag, value as u64);
        }
    }

    /// A time value in milliseconds as a big-endian blob counting 1/4096ths
    /// of a second, with no leading zero bytes.
    pub fn write_time_milliseconds_element(&mut self, dtag: u64, milliseconds: f64) {
        let ticks = (milliseconds / 1000.0 * TICKS_PER_SECOND).round() as u64;
        let bytes = ticks.to_be_bytes();
        let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
        self.write_element_start(dtag);
        self.write_blob(&bytes[first..]);
        self.write_element_close();
    }

    /// Omitted when `milliseconds` is negative.
    pub fn write_optional_time_milliseconds_element(&mut self, dtag: u64, milliseconds: f64) {
        if milliseconds >= 0.0 {
            self.write_time_milliseconds_element(dtag, milliseconds);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_xml::dtags;

    fn output(encoder: BinaryXmlEncoder) -> Vec<u8> {
        encoder.into_output().bytes().to_vec()
    }

    #[test]
    fn test_small_header_is_one_byte() {
        let mut encoder = BinaryXmlEncoder::new();
        encoder.write_element_start(dtags::NAME);
        // 14 = 0b1110: high bit | value << 3 | DTAG = 0xf2.
        assert_eq!(output(encoder), vec![0xf2]);
    }

    #[test]
    fn test_large_header_uses_continuation() {
        let mut encoder = BinaryXmlEncoder::new();
        encoder.write_element_start(dtags::FORWARDING_ENTRY);
        // 129 = 0b1000_0001: the final byte keeps the low 4 bits (1), the
        // continuation byte carries the upper bits (8).
        assert_eq!(output(encoder), vec![0x08, 0x80 | (1 << 3) | 0x02]);
    }

    #[test]
    fn test_blob_element() {
        let mut encoder = BinaryXmlEncoder::new();
        encoder.write_blob_element(dtags::NONCE, &Blob::from(&[0xaau8, 0xbb]));
        let bytes = output(encoder);
        // DTAG(41) needs two header bytes; BLOB header; value; close.
        assert_eq!(bytes[bytes.len() - 1], 0x00);
        assert!(bytes.windows(2).any(|w| w == [0xaa, 0xbb]));
    }

    #[test]
    fn test_udata_decimal() {
        let mut encoder = BinaryXmlEncoder::new();
        encoder.write_unsigned_decimal_int_element(dtags::SCOPE, 2);
        let bytes = output(encoder);
        assert!(bytes.contains(&b'2'));
        assert_eq!(bytes[bytes.len() - 1], 0x00);
    }

    #[test]
    fn test_optional_skips_negative() {
        let mut encoder = BinaryXmlEncoder::new();
        encoder.write_optional_unsigned_decimal_int_element(dtags::SCOPE, -1);
        encoder.write_optional_time_milliseconds_element(dtags::INTEREST_LIFETIME, -1.0);
        assert_eq!(encoder.offset(), 0);
    }
}

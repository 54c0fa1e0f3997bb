use bytes::Bytes;

use crate::blob::Blob;
use crate::error::CodecError;

/// A forward-writing NDN-TLV encoder.
///
/// A TLV header carries the length of the value it precedes, which is only
/// known after the value is produced. `write_nested_tlv` therefore runs the
/// value closure twice: once with output disabled to measure it, then again
/// to emit the bytes after the correctly-sized header.
#[derive(Debug)]
pub struct TlvEncoder {
    output: Vec<u8>,
    offset: usize,
    enable_output: bool,
}

impl Default for TlvEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TlvEncoder {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            offset: 0,
            enable_output: true,
        }
    }

    /// The current write position. With output enabled this is an index
    /// into the finished buffer, which is how the per-packet encoders
    /// record signed-portion offsets.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The finished encoding.
    pub fn into_output(self) -> Blob {
        Blob::from(Bytes::from(self.output))
    }

    fn write_u8(&mut self, byte: u8) {
        if self.enable_output {
            self.output.push(byte);
        }
        self.offset += 1;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.enable_output {
            self.output.extend_from_slice(bytes);
        }
        self.offset += bytes.len();
    }

    /// A TLV variable-width number: one byte below 253, otherwise a marker
    /// byte followed by 2, 4 or 8 big-endian bytes.
    pub fn write_var_number(&mut self, value: u64) {
        if value < 253 {
            self.write_u8(value as u8);
        } else if value <= 0xffff {
            self.write_u8(253);
            self.write_bytes(&(value as u16).to_be_bytes());
        } else if value <= 0xffff_ffff {
            self.write_u8(254);
            self.write_bytes(&(value as u32).to_be_bytes());
        } else {
            self.write_u8(255);
            self.write_bytes(&value.to_be_bytes());
        }
    }

    pub fn write_type_and_length(&mut self, type_: u64, length: usize) {
        self.write_var_number(type_);
        self.write_var_number(length as u64);
    }

    /// A non-negative integer in the minimal width among 1, 2, 4, 8 bytes.
    pub fn write_non_negative_integer(&mut self, value: u64) {
        if value < 0x100 {
            self.write_u8(value as u8);
        } else if value < 0x10000 {
            self.write_bytes(&(value as u16).to_be_bytes());
        } else if value < 0x1_0000_0000 {
            self.write_bytes(&(value as u32).to_be_bytes());
        } else {
            self.write_bytes(&value.to_be_bytes());
        }
    }

    fn non_negative_integer_size(value: u64) -> usize {
        if value < 0x100 {
            1
        } else if value < 0x10000 {
            2
        } else if value < 0x1_0000_0000 {
            4
        } else {
            8
        }
    }

    pub fn write_non_negative_integer_tlv(&mut self, type_: u64, value: u64) {
        self.write_type_and_length(type_, Self::non_negative_integer_size(value));
        self.write_non_negative_integer(value);
    }

    /// Omitted when `value` is negative.
    pub fn write_optional_non_negative_integer_tlv(&mut self, type_: u64, value: i64) {
        if value >= 0 {
            self.write_non_negative_integer_tlv(type_, value as u64);
        }
    }

    /// Omitted when `value` is negative; otherwise rounded to an integer.
    pub fn write_optional_non_negative_integer_tlv_from_f64(&mut self, type_: u64, value: f64) {
        if value >= 0.0 {
            self.write_non_negative_integer_tlv(type_, value.round() as u64);
        }
    }

    /// The blob's bytes behind a header; a null blob writes a zero-length
    /// value.
    pub fn write_blob_tlv(&mut self, type_: u64, blob: &Blob) {
        self.write_type_and_length(type_, blob.size());
        self.write_bytes(blob.bytes());
    }

    /// Omitted entirely when the blob is null or empty.
    pub fn write_optional_blob_tlv(&mut self, type_: u64, blob: &Blob) {
        if blob.size() > 0 {
            self.write_blob_tlv(type_, blob);
        }
    }

    /// Run `write_value` to produce the nested TLVs of a block, prefixed by
    /// `type_` and the measured length. With `omit_empty`, a block whose
    /// value measures zero bytes is not emitted at all.
    pub fn write_nested_tlv<F>(
        &mut self,
        type_: u64,
        omit_empty: bool,
        mut write_value: F,
    ) -> Result<(), CodecError>
    where
        F: FnMut(&mut TlvEncoder) -> Result<(), CodecError>,
    {
        let outer_enabled = self.enable_output;
        let saved_offset = self.offset;

        // Measuring pass.
        self.enable_output = false;
        write_value(self)?;
        let length = self.offset - saved_offset;
        self.offset = saved_offset;
        self.enable_output = outer_enabled;

        if omit_empty && length == 0 {
            return Ok(());
        }
        self.write_type_and_length(type_, length);
        write_value(self)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(encoder: TlvEncoder) -> Vec<u8> {
        encoder.into_output().bytes().to_vec()
    }

    #[test]
    fn test_var_number_widths() {
        let mut encoder = TlvEncoder::new();
        encoder.write_var_number(252);
        encoder.write_var_number(253);
        encoder.write_var_number(0x10000);
        assert_eq!(
            output(encoder),
            vec![252, 253, 0, 253, 254, 0, 1, 0, 0]
        );
    }

    #[test]
    fn test_non_negative_integer_minimal_width() {
        let mut encoder = TlvEncoder::new();
        encoder.write_non_negative_integer_tlv(25, 0xff);
        encoder.write_non_negative_integer_tlv(25, 0x100);
        assert_eq!(output(encoder), vec![25, 1, 0xff, 25, 2, 0x01, 0x00]);
    }

    #[test]
    fn test_blob_tlv() {
        let mut encoder = TlvEncoder::new();
        encoder.write_blob_tlv(21, &Blob::from(&[0xaau8, 0xbb]));
        assert_eq!(output(encoder), vec![21, 2, 0xaa, 0xbb]);
    }

    #[test]
    fn test_optional_skips_negative_and_null() {
        let mut encoder = TlvEncoder::new();
        encoder.write_optional_non_negative_integer_tlv(13, -1);
        encoder.write_optional_blob_tlv(21, &Blob::null());
        assert_eq!(encoder.offset(), 0);
    }

    #[test]
    fn test_nested_tlv() {
        let mut encoder = TlvEncoder::new();
        encoder
            .write_nested_tlv(20, false, |encoder| {
                encoder.write_non_negative_integer_tlv(24, 2);
                Ok(())
            })
            .unwrap();
        assert_eq!(output(encoder), vec![20, 3, 24, 1, 2]);
    }

    #[test]
    fn test_nested_tlv_omit_empty() {
        let mut encoder = TlvEncoder::new();
        encoder.write_nested_tlv(9, true, |_| Ok(())).unwrap();
        assert_eq!(encoder.offset(), 0);

        let mut encoder = TlvEncoder::new();
        encoder.write_nested_tlv(20, false, |_| Ok(())).unwrap();
        assert_eq!(output(encoder), vec![20, 0]);
    }

    #[test]
    fn test_deeply_nested_offsets() {
        let mut encoder = TlvEncoder::new();
        encoder
            .write_nested_tlv(6, false, |encoder| {
                encoder.write_nested_tlv(7, false, |encoder| {
                    encoder.write_blob_tlv(8, &Blob::from(&b"a"[..]));
                    Ok(())
                })
            })
            .unwrap();
        assert_eq!(output(encoder), vec![6, 5, 7, 3, 8, 1, b'a']);
    }
}

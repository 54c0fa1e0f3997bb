use bytes::Bytes;

use crate::binary_xml::{token_types, TICKS_PER_SECOND};
use crate::error::CodecError;

/// A cursor over a Binary XML (ccnb) encoding.
///
/// Like the TLV decoder it holds a shared handle on the input, so blob
/// reads are zero-copy slices.
#[derive(Debug)]
pub struct BinaryXmlDecoder {
    input: Bytes,
    offset: usize,
}

impl BinaryXmlDecoder {
    pub fn new(input: Bytes) -> Self {
        Self { input, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn finished(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn peek_byte(&self) -> Result<u8, CodecError> {
        self.input
            .get(self.offset)
            .copied()
            .ok_or(CodecError::Truncated(self.offset))
    }

    fn read_byte(&mut self) -> Result<u8, CodecError> {
        let byte = self.peek_byte()?;
        self.offset += 1;
        Ok(byte)
    }

    /// A header: continuation bytes with the high bit clear, then the final
    /// byte carrying the token type. Returns (token type, value).
    fn read_header(&mut self) -> Result<(u8, u64), CodecError> {
        let start = self.offset;
        if self.peek_byte()? == token_types::CLOSE {
            // A close sentinel where a header must start.
            return Err(CodecError::Malformed(start));
        }
        let mut value: u64 = 0;
        loop {
            let byte = self.read_byte()?;
            if byte & token_types::HIGH_BIT != 0 {
                value = (value << token_types::FINAL_VALUE_BITS)
                    | ((byte >> token_types::TYPE_BITS) & token_types::FINAL_VALUE_MASK) as u64;
                return Ok((byte & token_types::TYPE_MASK, value));
            }
            if value > (u64::MAX >> token_types::REGULAR_VALUE_BITS) {
                return Err(CodecError::Overflow);
            }
            value = (value << token_types::REGULAR_VALUE_BITS) | byte as u64;
        }
    }

    /// Require a DTAG header with the expected dictionary value. A DTAG
    /// outside the dictionary is a `DictionaryUnknown`; a known DTAG in
    /// the wrong place is an `UnexpectedType`.
    pub fn read_element_start(&mut self, expected_dtag: u64) -> Result<(), CodecError> {
        let start = self.offset;
        let (token_type, dtag) = self.read_header()?;
        if token_type != token_types::DTAG {
            return Err(CodecError::Malformed(start));
        }
        if dtag != expected_dtag {
            if !crate::binary_xml::dtags::is_known(dtag) {
                return Err(CodecError::DictionaryUnknown(dtag));
            }
            return Err(CodecError::UnexpectedType {
                expected: expected_dtag,
                got: dtag,
            });
        }
        Ok(())
    }

    /// Require the element-close sentinel.
    pub fn read_element_close(&mut self) -> Result<(), CodecError> {
        let start = self.offset;
        if self.read_byte()? != token_types::CLOSE {
            return Err(CodecError::Malformed(start));
        }
        Ok(())
    }

    /// True when the close sentinel is next.
    pub fn peek_element_close(&self) -> Result<bool, CodecError> {
        Ok(self.peek_byte()? == token_types::CLOSE)
    }

    /// Without moving the cursor: is the next token a DTAG with this value?
    pub fn peek_dtag(&mut self, expected_dtag: u64) -> Result<bool, CodecError> {
        if self.finished() || self.peek_byte()? == token_types::CLOSE {
            return Ok(false);
        }
        let saved = self.offset;
        let header = self.read_header();
        self.offset = saved;
        let (token_type, dtag) = header?;
        Ok(token_type == token_types::DTAG && dtag == expected_dtag)
    }

    /// The DTAG value of the next token, if it is a DTAG.
    pub fn peek_any_dtag(&mut self) -> Result<Option<u64>, CodecError> {
        if self.finished() || self.peek_byte()? == token_types::CLOSE {
            return Ok(None);
        }
        let saved = self.offset;
        let header = self.read_header();
        self.offset = saved;
        let (token_type, dtag) = header?;
        Ok((token_type == token_types::DTAG).then_some(dtag))
    }

    fn read_raw(&mut self, length: usize) -> Result<Bytes, CodecError> {
        if self.offset + length > self.input.len() {
            return Err(CodecError::Truncated(self.offset));
        }
        let value = self.input.slice(self.offset..self.offset + length);
        self.offset += length;
        Ok(value)
    }

    fn read_blob(&mut self) -> Result<Bytes, CodecError> {
        let start = self.offset;
        let (token_type, length) = self.read_header()?;
        if token_type != token_types::BLOB {
            return Err(CodecError::Malformed(start));
        }
        self.read_raw(length as usize)
    }

    fn read_udata(&mut self) -> Result<String, CodecError> {
        let start = self.offset;
        let (token_type, length) = self.read_header()?;
        if token_type != token_types::UDATA {
            return Err(CodecError::Malformed(start));
        }
        let bytes = self.read_raw(length as usize)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::Malformed(start))
    }

    /// `<dtag>BLOB</dtag>`; an empty element reads as empty bytes.
    pub fn read_blob_element(&mut self, dtag: u64) -> Result<Bytes, CodecError> {
        self.read_element_start(dtag)?;
        let value = if self.peek_element_close()? {
            Bytes::new()
        } else {
            self.read_blob()?
        };
        self.read_element_close()?;
        Ok(value)
    }

    pub fn read_optional_blob_element(&mut self, dtag: u64) -> Result<Option<Bytes>, CodecError> {
        if !self.peek_dtag(dtag)? {
            return Ok(None);
        }
        Ok(Some(self.read_blob_element(dtag)?))
    }

    /// `<dtag>UDATA</dtag>`.
    pub fn read_udata_element(&mut self, dtag: u64) -> Result<String, CodecError> {
        self.read_element_start(dtag)?;
        let text = if self.peek_element_close()? {
            String::new()
        } else {
            self.read_udata()?
        };
        self.read_element_close()?;
        Ok(text)
    }

    /// A decimal UDATA integer element.
    pub fn read_unsigned_decimal_int_element(&mut self, dtag: u64) -> Result<u64, CodecError> {
        let start = self.offset;
        let text = self.read_udata_element(dtag)?;
        text.parse::<u64>().map_err(|_| CodecError::Malformed(start))
    }

    /// -1 when the element is absent.
    pub fn read_optional_unsigned_decimal_int_element(
        &mut self,
        dtag: u64,
    ) -> Result<i64, CodecError> {
        if !self.peek_dtag(dtag)? {
            return Ok(-1);
        }
        let value = self.read_unsigned_decimal_int_element(dtag)?;
        i64::try_from(value).map_err(|_| CodecError::Overflow)
    }

    /// A big-endian blob of 1/4096ths of a second, as milliseconds.
    pub fn read_time_milliseconds_element(&mut self, dtag: u64) -> Result<f64, CodecError> {
        let bytes = self.read_blob_element(dtag)?;
        if bytes.len() > 8 {
            return Err(CodecError::Overflow);
        }
        let mut ticks: u64 = 0;
        for &byte in bytes.iter() {
            ticks = (ticks << 8) | byte as u64;
        }
        Ok(ticks as f64 * 1000.0 / TICKS_PER_SECOND)
    }

    /// -1.0 when the element is absent.
    pub fn read_optional_time_milliseconds_element(
        &mut self,
        dtag: u64,
    ) -> Result<f64, CodecError> {
        if !self.peek_dtag(dtag)? {
            return Ok(-1.0);
        }
        self.read_time_milliseconds_element(dtag)
    }

    /// Skip one whole element (or lone token) of any kind, through its
    /// matching close sentinel.
    pub fn skip_element(&mut self) -> Result<(), CodecError> {
        let start = self.offset;
        let (token_type, value) = self.read_header()?;
        let mut depth = match token_type {
            token_types::DTAG => 1usize,
            token_types::TAG => {
                // A TAG header is followed by value+1 bytes of tag name.
                self.read_raw(value as usize + 1)?;
                1
            }
            token_types::BLOB | token_types::UDATA => {
                self.read_raw(value as usize)?;
                return Ok(());
            }
            token_types::ATTR => {
                self.read_raw(value as usize + 1)?;
                return Ok(());
            }
            token_types::DATTR | token_types::EXT => return Ok(()),
            _ => return Err(CodecError::Malformed(start)),
        };
        while depth > 0 {
            if self.peek_byte()? == token_types::CLOSE {
                self.offset += 1;
                depth -= 1;
                continue;
            }
            let start = self.offset;
            let (token_type, value) = self.read_header()?;
            match token_type {
                token_types::DTAG => depth += 1,
                token_types::TAG => {
                    self.read_raw(value as usize + 1)?;
                    depth += 1;
                }
                token_types::BLOB | token_types::UDATA => {
                    self.read_raw(value as usize)?;
                }
                token_types::ATTR => {
                    self.read_raw(value as usize + 1)?;
                }
                token_types::DATTR | token_types::EXT => {}
                _ => return Err(CodecError::Malformed(start)),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_xml::dtags;
    use crate::binary_xml::encoder::BinaryXmlEncoder;
    use crate::blob::Blob;

    fn decoder_for(build: impl FnOnce(&mut BinaryXmlEncoder)) -> BinaryXmlDecoder {
        let mut encoder = BinaryXmlEncoder::new();
        build(&mut encoder);
        BinaryXmlDecoder::new(Bytes::copy_from_slice(encoder.into_output().bytes()))
    }

    #[test]
    fn test_blob_element_round_trip() {
        let mut decoder = decoder_for(|e| {
            e.write_blob_element(dtags::NONCE, &Blob::from(&[1u8, 2, 3, 4]));
        });
        let value = decoder.read_blob_element(dtags::NONCE).unwrap();
        assert_eq!(&value[..], &[1, 2, 3, 4]);
        assert!(decoder.finished());
    }

    #[test]
    fn test_decimal_element_round_trip() {
        let mut decoder = decoder_for(|e| {
            e.write_unsigned_decimal_int_element(dtags::SCOPE, 12345);
        });
        assert_eq!(
            decoder.read_unsigned_decimal_int_element(dtags::SCOPE).unwrap(),
            12345
        );
    }

    #[test]
    fn test_time_element_round_trip() {
        let mut decoder = decoder_for(|e| {
            e.write_time_milliseconds_element(dtags::INTEREST_LIFETIME, 4000.0);
        });
        let milliseconds = decoder
            .read_time_milliseconds_element(dtags::INTEREST_LIFETIME)
            .unwrap();
        assert!((milliseconds - 4000.0).abs() < 1.0);
    }

    #[test]
    fn test_peek_dtag() {
        let mut decoder = decoder_for(|e| {
            e.write_unsigned_decimal_int_element(dtags::SCOPE, 1);
        });
        assert!(decoder.peek_dtag(dtags::SCOPE).unwrap());
        assert!(!decoder.peek_dtag(dtags::NONCE).unwrap());
        assert_eq!(decoder.offset(), 0);
    }

    #[test]
    fn test_unexpected_dtag() {
        let mut decoder = decoder_for(|e| {
            e.write_blob_element(dtags::NONCE, &Blob::from(&[1u8]));
        });
        assert_eq!(
            decoder.read_element_start(dtags::NAME),
            Err(CodecError::UnexpectedType {
                expected: dtags::NAME,
                got: dtags::NONCE
            })
        );
    }

    #[test]
    fn test_skip_element_with_nesting() {
        let mut decoder = decoder_for(|e| {
            e.write_element_start(dtags::SIGNED_INFO);
            e.write_blob_element(dtags::TIMESTAMP, &Blob::from(&[9u8]));
            e.write_element_close();
            e.write_unsigned_decimal_int_element(dtags::SCOPE, 3);
        });
        decoder.skip_element().unwrap();
        assert_eq!(
            decoder.read_unsigned_decimal_int_element(dtags::SCOPE).unwrap(),
            3
        );
    }

    #[test]
    fn test_truncated_input() {
        let mut decoder = BinaryXmlDecoder::new(Bytes::from_static(&[0x01]));
        assert!(matches!(
            decoder.read_header(),
            Err(CodecError::Truncated(_))
        ));
    }

    #[test]
    fn test_close_where_header_expected() {
        let mut decoder = BinaryXmlDecoder::new(Bytes::from_static(&[0x00]));
        assert!(matches!(
            decoder.read_element_start(dtags::NAME),
            Err(CodecError::Malformed(0))
        ));
    }
}

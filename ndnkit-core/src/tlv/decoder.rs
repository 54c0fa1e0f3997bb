use bytes::Bytes;

use crate::error::CodecError;

/// Unknown TLV types from this value up are non-critical: a decoder may
/// skip them when they trail a nested block.
const NON_CRITICAL_TYPE_MIN: u64 = 0x7f;

/// A cursor over an NDN-TLV encoding.
///
/// The decoder holds a shared handle on the input buffer, so blob reads are
/// zero-copy slices that keep the buffer alive.
#[derive(Debug)]
pub struct TlvDecoder {
    input: Bytes,
    offset: usize,
}

impl TlvDecoder {
    pub fn new(input: Bytes) -> Self {
        Self { input, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// True when the cursor consumed the whole input.
    pub fn finished(&self) -> bool {
        self.offset >= self.input.len()
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let byte = *self
            .input
            .get(self.offset)
            .ok_or(CodecError::Truncated(self.offset))?;
        self.offset += 1;
        Ok(byte)
    }

    fn read_big_endian(&mut self, width: usize) -> Result<u64, CodecError> {
        if self.offset + width > self.input.len() {
            return Err(CodecError::Truncated(self.offset));
        }
        let mut value = 0u64;
        for _ in 0..width {
            value = (value << 8) | self.read_u8()? as u64;
        }
        Ok(value)
    }

    /// A TLV variable-width number (type or length field).
    pub fn read_var_number(&mut self) -> Result<u64, CodecError> {
        match self.read_u8()? {
            byte @ 0..=252 => Ok(byte as u64),
            253 => self.read_big_endian(2),
            254 => self.read_big_endian(4),
            255 => self.read_big_endian(8),
        }
    }

    /// Read a header, requiring `expected` as the type. Returns the value
    /// length after checking it fits the remaining input.
    pub fn read_type_and_length(&mut self, expected: u64) -> Result<usize, CodecError> {
        let got = self.read_var_number()?;
        if got != expected {
            return Err(CodecError::UnexpectedType { expected, got });
        }
        let length = self.read_var_number()?;
        let length = usize::try_from(length).map_err(|_| CodecError::Overflow)?;
        if self.offset + length > self.input.len() {
            return Err(CodecError::Truncated(self.offset));
        }
        Ok(length)
    }

    /// Enter a nested block of `expected` type; returns the absolute offset
    /// where the block's value ends.
    pub fn read_nested_tlvs_start(&mut self, expected: u64) -> Result<usize, CodecError> {
        let length = self.read_type_and_length(expected)?;
        Ok(self.offset + length)
    }

    /// Leave a nested block. Unknown non-critical TLVs (type >= 0x7f)
    /// before `end_offset` are skipped; anything else that keeps the cursor
    /// from landing exactly on `end_offset` is a length mismatch.
    pub fn finish_nested_tlvs(&mut self, end_offset: usize) -> Result<(), CodecError> {
        while self.offset < end_offset {
            let type_ = self.read_var_number()?;
            if type_ < NON_CRITICAL_TYPE_MIN {
                return Err(CodecError::LengthMismatch);
            }
            let length = self.read_var_number()? as usize;
            if self.offset + length > end_offset {
                return Err(CodecError::LengthMismatch);
            }
            self.offset += length;
        }
        if self.offset != end_offset {
            return Err(CodecError::LengthMismatch);
        }
        Ok(())
    }

    /// Without moving the cursor: does the next TLV before `bound` have the
    /// expected type?
    pub fn peek_type(&mut self, expected: u64, bound: usize) -> Result<bool, CodecError> {
        if self.offset >= bound || self.finished() {
            return Ok(false);
        }
        let saved = self.offset;
        let got = self.read_var_number();
        self.offset = saved;
        Ok(got? == expected)
    }

    /// The type of the next TLV before `bound`, without moving the cursor;
    /// None at the bound.
    pub fn peek_any_type(&mut self, bound: usize) -> Result<Option<u64>, CodecError> {
        if self.offset >= bound || self.finished() {
            return Ok(None);
        }
        let saved = self.offset;
        let got = self.read_var_number();
        self.offset = saved;
        got.map(Some)
    }

    /// Skip one whole TLV, returning its type.
    pub fn skip_tlv(&mut self) -> Result<u64, CodecError> {
        let type_ = self.read_var_number()?;
        let length = self.read_var_number()?;
        let length = usize::try_from(length).map_err(|_| CodecError::Overflow)?;
        if self.offset + length > self.input.len() {
            return Err(CodecError::Truncated(self.offset));
        }
        self.offset += length;
        Ok(type_)
    }

    /// A non-negative integer of 1, 2, 4 or 8 big-endian bytes.
    pub fn read_non_negative_integer(&mut self, length: usize) -> Result<u64, CodecError> {
        match length {
            1 | 2 | 4 | 8 => self.read_big_endian(length),
            _ => Err(CodecError::Malformed(self.offset)),
        }
    }

    pub fn read_non_negative_integer_tlv(&mut self, expected: u64) -> Result<u64, CodecError> {
        let length = self.read_type_and_length(expected)?;
        self.read_non_negative_integer(length)
    }

    /// -1 when the element is absent before `bound`.
    pub fn read_optional_non_negative_integer_tlv(
        &mut self,
        expected: u64,
        bound: usize,
    ) -> Result<i64, CodecError> {
        if !self.peek_type(expected, bound)? {
            return Ok(-1);
        }
        let value = self.read_non_negative_integer_tlv(expected)?;
        i64::try_from(value).map_err(|_| CodecError::Overflow)
    }

    /// -1.0 when the element is absent before `bound`.
    pub fn read_optional_non_negative_integer_tlv_as_f64(
        &mut self,
        expected: u64,
        bound: usize,
    ) -> Result<f64, CodecError> {
        if !self.peek_type(expected, bound)? {
            return Ok(-1.0);
        }
        Ok(self.read_non_negative_integer_tlv(expected)? as f64)
    }

    /// The value bytes of a blob element, as a zero-copy slice of the
    /// input.
    pub fn read_blob_tlv(&mut self, expected: u64) -> Result<Bytes, CodecError> {
        let length = self.read_type_and_length(expected)?;
        let value = self.input.slice(self.offset..self.offset + length);
        self.offset += length;
        Ok(value)
    }

    pub fn read_optional_blob_tlv(
        &mut self,
        expected: u64,
        bound: usize,
    ) -> Result<Option<Bytes>, CodecError> {
        if !self.peek_type(expected, bound)? {
            return Ok(None);
        }
        Ok(Some(self.read_blob_tlv(expected)?))
    }

    /// True when the element is present before `bound`; its value bytes,
    /// if any, are skipped.
    pub fn read_boolean_tlv(&mut self, expected: u64, bound: usize) -> Result<bool, CodecError> {
        if !self.peek_type(expected, bound)? {
            return Ok(false);
        }
        let length = self.read_type_and_length(expected)?;
        self.offset += length;
        Ok(true)
    }

    /// `length` raw bytes at the cursor, as a zero-copy slice.
    pub fn read_raw(&mut self, length: usize) -> Result<Bytes, CodecError> {
        if self.offset + length > self.input.len() {
            return Err(CodecError::Truncated(self.offset));
        }
        let value = self.input.slice(self.offset..self.offset + length);
        self.offset += length;
        Ok(value)
    }

    /// A zero-copy window of the raw input.
    pub fn slice(&self, begin: usize, end: usize) -> Bytes {
        self.input.slice(begin..end)
    }
}

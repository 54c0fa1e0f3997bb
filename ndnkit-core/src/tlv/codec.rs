//! The per-packet NDN-TLV encode and decode procedures.
//!
//! Decode fills a caller-provided packet object through its setters, so the
//! object's change counter keeps moving forward across reuse. Every field
//! the wire does not carry is reset to its absent default.

use crate::blob::Blob;
use crate::data::Data;
use crate::error::CodecError;
use crate::exclude::{Exclude, ExcludeEntry};
use crate::interest::Interest;
use crate::key_locator::{KeyLocator, KeyLocatorType};
use crate::meta_info::{ContentType, MetaInfo};
use crate::name::{ComponentType, Name, NameComponent};
use crate::signature::{Signature, SignatureType};
use crate::tlv::tlv_types;
use crate::tlv::{TlvDecoder, TlvEncoder};

pub fn encode_name_component(component: &NameComponent, encoder: &mut TlvEncoder) {
    let type_ = match component.component_type() {
        ComponentType::Generic => tlv_types::NAME_COMPONENT,
        ComponentType::ImplicitSha256Digest => tlv_types::IMPLICIT_SHA256_DIGEST_COMPONENT,
        ComponentType::Other(code) => code,
    };
    encoder.write_blob_tlv(type_, component.value());
}

pub fn decode_name_component(decoder: &mut TlvDecoder) -> Result<NameComponent, CodecError> {
    let type_ = decoder.read_var_number()?;
    let length = decoder.read_var_number()? as usize;
    let value = Blob::from(decoder.read_raw(length)?);
    match type_ {
        tlv_types::NAME_COMPONENT => Ok(NameComponent::new(value)),
        tlv_types::IMPLICIT_SHA256_DIGEST_COMPONENT => {
            NameComponent::from_implicit_sha256_digest(value)
        }
        other => Ok(NameComponent::with_type(value, ComponentType::Other(other))),
    }
}

/// Encode a Name block. The returned offsets bracket the name's signed
/// portion: its components up to but not including the final one, as used
/// by signed interests.
pub fn encode_name(name: &Name, encoder: &mut TlvEncoder) -> Result<(usize, usize), CodecError> {
    let mut signed_begin = 0;
    let mut signed_end = 0;
    encoder.write_nested_tlv(tlv_types::NAME, false, |encoder| {
        signed_begin = encoder.offset();
        signed_end = encoder.offset();
        for (i, component) in name.components().iter().enumerate() {
            if i + 1 == name.size() {
                signed_end = encoder.offset();
            }
            encode_name_component(component, encoder);
        }
        Ok(())
    })?;
    Ok((signed_begin, signed_end))
}

pub fn decode_name(decoder: &mut TlvDecoder) -> Result<(Name, usize, usize), CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::NAME)?;
    let signed_begin = decoder.offset();
    let mut signed_end = decoder.offset();
    let mut name = Name::new();
    while decoder.offset() < end {
        signed_end = decoder.offset();
        name.append(decode_name_component(decoder)?);
    }
    decoder.finish_nested_tlvs(end)?;
    Ok((name, signed_begin, signed_end))
}

/// Encode a KeyLocator block behind `outer_type` (KeyLocator inside a
/// SignatureInfo, PublisherPublicKeyLocator inside Selectors).
pub fn encode_key_locator(
    outer_type: u64,
    key_locator: &KeyLocator,
    encoder: &mut TlvEncoder,
) -> Result<(), CodecError> {
    encoder.write_nested_tlv(outer_type, false, |encoder| {
        match key_locator.locator_type() {
            KeyLocatorType::None => Ok(()),
            KeyLocatorType::KeyName => encode_name(key_locator.key_name(), encoder).map(|_| ()),
            KeyLocatorType::KeyLocatorDigest => {
                encoder.write_blob_tlv(tlv_types::KEY_LOCATOR_DIGEST, key_locator.key_data());
                Ok(())
            }
            // The legacy key and certificate kinds have no NDN-TLV form.
            KeyLocatorType::Key | KeyLocatorType::Certificate => {
                Err(CodecError::UnsupportedOperation)
            }
        }
    })
}

pub fn decode_key_locator(
    outer_type: u64,
    decoder: &mut TlvDecoder,
) -> Result<KeyLocator, CodecError> {
    let end = decoder.read_nested_tlvs_start(outer_type)?;
    let mut key_locator = KeyLocator::new();
    if decoder.peek_type(tlv_types::NAME, end)? {
        let (name, _, _) = decode_name(decoder)?;
        key_locator.set_type(KeyLocatorType::KeyName);
        key_locator.set_key_name(name);
    } else if decoder.peek_type(tlv_types::KEY_LOCATOR_DIGEST, end)? {
        key_locator.set_type(KeyLocatorType::KeyLocatorDigest);
        key_locator.set_key_data(Blob::from(
            decoder.read_blob_tlv(tlv_types::KEY_LOCATOR_DIGEST)?,
        ));
    }
    decoder.finish_nested_tlvs(end)?;
    Ok(key_locator)
}

fn encode_exclude(exclude: &Exclude, encoder: &mut TlvEncoder) -> Result<(), CodecError> {
    encoder.write_nested_tlv(tlv_types::EXCLUDE, false, |encoder| {
        for entry in exclude.entries() {
            match entry {
                ExcludeEntry::Any => encoder.write_type_and_length(tlv_types::ANY, 0),
                ExcludeEntry::Component(component) => {
                    encode_name_component(component, encoder)
                }
            }
        }
        Ok(())
    })
}

fn decode_exclude(decoder: &mut TlvDecoder) -> Result<Exclude, CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::EXCLUDE)?;
    let mut exclude = Exclude::new();
    while decoder.offset() < end {
        if decoder.peek_type(tlv_types::ANY, end)? {
            decoder.read_boolean_tlv(tlv_types::ANY, end)?;
            exclude.append_any();
        } else {
            exclude.append_component(decode_name_component(decoder)?);
        }
    }
    decoder.finish_nested_tlvs(end)?;
    Ok(exclude)
}

pub fn encode_signature_info(
    signature: &Signature,
    encoder: &mut TlvEncoder,
) -> Result<(), CodecError> {
    encoder.write_nested_tlv(tlv_types::SIGNATURE_INFO, false, |encoder| {
        match signature.signature_type() {
            SignatureType::DigestSha256 => {
                encoder.write_non_negative_integer_tlv(tlv_types::SIGNATURE_TYPE, 0);
                Ok(())
            }
            SignatureType::Sha256WithRsa | SignatureType::Sha256WithEcdsa => {
                encoder.write_non_negative_integer_tlv(
                    tlv_types::SIGNATURE_TYPE,
                    signature.signature_type().code() as u64,
                );
                encode_key_locator(tlv_types::KEY_LOCATOR, signature.key_locator(), encoder)
            }
            SignatureType::None => Err(CodecError::UnsupportedSignatureType(-1)),
        }
    })
}

pub fn decode_signature_info(
    signature: &mut Signature,
    decoder: &mut TlvDecoder,
) -> Result<(), CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::SIGNATURE_INFO)?;
    let code = decoder.read_non_negative_integer_tlv(tlv_types::SIGNATURE_TYPE)?;
    let code = i32::try_from(code).map_err(|_| CodecError::Overflow)?;
    let signature_type =
        SignatureType::from_code(code).ok_or(CodecError::UnsupportedSignatureType(code))?;

    signature.clear();
    signature.set_type(signature_type);
    if decoder.peek_type(tlv_types::KEY_LOCATOR, end)? {
        signature.set_key_locator(decode_key_locator(tlv_types::KEY_LOCATOR, decoder)?);
    }
    decoder.finish_nested_tlvs(end)?;
    Ok(())
}

fn encode_meta_info(meta_info: &MetaInfo, encoder: &mut TlvEncoder) -> Result<(), CodecError> {
    encoder.write_nested_tlv(tlv_types::META_INFO, false, |encoder| {
        match meta_info.content_type() {
            // The default is omitted from the wire; the deprecated Data
            // type is folded into it.
            ContentType::Blob | ContentType::Data => {}
            ContentType::Link | ContentType::Key => {
                encoder.write_non_negative_integer_tlv(
                    tlv_types::CONTENT_TYPE,
                    meta_info.content_type().code() as u64,
                );
            }
            ContentType::Other(code) => {
                return Err(CodecError::UnrecognizedContentType(code));
            }
        }
        encoder.write_optional_non_negative_integer_tlv_from_f64(
            tlv_types::FRESHNESS_PERIOD,
            meta_info.freshness_period_ms(),
        );
        if let Some(final_block_id) = meta_info.final_block_id() {
            encoder.write_nested_tlv(tlv_types::FINAL_BLOCK_ID, false, |encoder| {
                encode_name_component(final_block_id, encoder);
                Ok(())
            })?;
        }
        Ok(())
    })
}

fn decode_meta_info(decoder: &mut TlvDecoder) -> Result<MetaInfo, CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::META_INFO)?;
    let mut meta_info = MetaInfo::new();

    let code = decoder.read_optional_non_negative_integer_tlv(tlv_types::CONTENT_TYPE, end)?;
    if code >= 0 {
        let code = i32::try_from(code).map_err(|_| CodecError::Overflow)?;
        meta_info.set_content_type(ContentType::from_code(code));
    }
    meta_info.set_freshness_period_ms(
        decoder.read_optional_non_negative_integer_tlv_as_f64(tlv_types::FRESHNESS_PERIOD, end)?,
    );
    if decoder.peek_type(tlv_types::FINAL_BLOCK_ID, end)? {
        let inner_end = decoder.read_nested_tlvs_start(tlv_types::FINAL_BLOCK_ID)?;
        meta_info.set_final_block_id(Some(decode_name_component(decoder)?));
        decoder.finish_nested_tlvs(inner_end)?;
    }
    // The timestamp has no NDN-TLV form.
    meta_info.set_timestamp_ms(-1.0);

    decoder.finish_nested_tlvs(end)?;
    Ok(meta_info)
}

fn encode_selectors(interest: &Interest, encoder: &mut TlvEncoder) -> Result<(), CodecError> {
    encoder.write_nested_tlv(tlv_types::SELECTORS, true, |encoder| {
        encoder.write_optional_non_negative_integer_tlv(
            tlv_types::MIN_SUFFIX_COMPONENTS,
            interest.min_suffix_components() as i64,
        );
        encoder.write_optional_non_negative_integer_tlv(
            tlv_types::MAX_SUFFIX_COMPONENTS,
            interest.max_suffix_components() as i64,
        );
        if interest.key_locator().locator_type() != KeyLocatorType::None {
            encode_key_locator(
                tlv_types::PUBLISHER_PUBLIC_KEY_LOCATOR,
                interest.key_locator(),
                encoder,
            )?;
        }
        if !interest.exclude().is_empty() {
            encode_exclude(interest.exclude(), encoder)?;
        }
        encoder.write_optional_non_negative_integer_tlv(
            tlv_types::CHILD_SELECTOR,
            interest.child_selector() as i64,
        );
        if interest.must_be_fresh() {
            encoder.write_type_and_length(tlv_types::MUST_BE_FRESH, 0);
        }
        Ok(())
    })
}

/// The Selectors block accepts its children in any order.
fn decode_selectors(interest: &mut Interest, decoder: &mut TlvDecoder) -> Result<(), CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::SELECTORS)?;
    while let Some(type_) = decoder.peek_any_type(end)? {
        match type_ {
            tlv_types::MIN_SUFFIX_COMPONENTS => {
                let value =
                    decoder.read_non_negative_integer_tlv(tlv_types::MIN_SUFFIX_COMPONENTS)?;
                interest.set_min_suffix_components(
                    i32::try_from(value).map_err(|_| CodecError::Overflow)?,
                );
            }
            tlv_types::MAX_SUFFIX_COMPONENTS => {
                let value =
                    decoder.read_non_negative_integer_tlv(tlv_types::MAX_SUFFIX_COMPONENTS)?;
                interest.set_max_suffix_components(
                    i32::try_from(value).map_err(|_| CodecError::Overflow)?,
                );
            }
            tlv_types::PUBLISHER_PUBLIC_KEY_LOCATOR => {
                interest.set_key_locator(decode_key_locator(
                    tlv_types::PUBLISHER_PUBLIC_KEY_LOCATOR,
                    decoder,
                )?);
            }
            tlv_types::EXCLUDE => {
                interest.set_exclude(decode_exclude(decoder)?);
            }
            tlv_types::CHILD_SELECTOR => {
                let value = decoder.read_non_negative_integer_tlv(tlv_types::CHILD_SELECTOR)?;
                interest
                    .set_child_selector(i32::try_from(value).map_err(|_| CodecError::Overflow)?);
            }
            tlv_types::MUST_BE_FRESH => {
                decoder.read_boolean_tlv(tlv_types::MUST_BE_FRESH, end)?;
                interest.set_must_be_fresh(true);
            }
            unknown => {
                if unknown < 0x7f {
                    return Err(CodecError::LengthMismatch);
                }
                decoder.skip_tlv()?;
            }
        }
    }
    decoder.finish_nested_tlvs(end)?;
    Ok(())
}

/// Encode an Interest block. The returned offsets bracket the signed
/// portion of the interest's name, for signed-interest verification.
pub fn encode_interest(
    interest: &Interest,
    encoder: &mut TlvEncoder,
) -> Result<(usize, usize), CodecError> {
    let mut signed_begin = 0;
    let mut signed_end = 0;
    // A nonce is always emitted; take a fresh one when the interest's is
    // absent or not 4 bytes. The interest object is not mutated.
    let nonce = interest.nonce();
    let nonce: [u8; 4] = match nonce.bytes().try_into() {
        Ok(bytes) => bytes,
        Err(_) => rand::random(),
    };

    encoder.write_nested_tlv(tlv_types::INTEREST, false, |encoder| {
        let offsets = encode_name(interest.name(), encoder)?;
        signed_begin = offsets.0;
        signed_end = offsets.1;
        encode_selectors(interest, encoder)?;
        encoder.write_blob_tlv(tlv_types::NONCE, &Blob::from(&nonce[..]));
        encoder.write_optional_non_negative_integer_tlv_from_f64(
            tlv_types::INTEREST_LIFETIME,
            interest.interest_lifetime_ms(),
        );
        Ok(())
    })?;
    Ok((signed_begin, signed_end))
}

pub fn decode_interest(
    interest: &mut Interest,
    decoder: &mut TlvDecoder,
) -> Result<(usize, usize), CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::INTEREST)?;

    let (name, signed_begin, signed_end) = decode_name(decoder)?;
    interest.set_name(name);

    // Reset the selector fields, then let the Selectors block overwrite.
    interest.set_min_suffix_components(-1);
    interest.set_max_suffix_components(-1);
    interest.key_locator_mut().clear();
    interest.exclude_mut().clear();
    interest.set_child_selector(-1);
    interest.set_must_be_fresh(false);
    if decoder.peek_type(tlv_types::SELECTORS, end)? {
        decode_selectors(interest, decoder)?;
    }

    let nonce = Blob::from(decoder.read_blob_tlv(tlv_types::NONCE)?);
    interest.set_interest_lifetime_ms(
        decoder
            .read_optional_non_negative_integer_tlv_as_f64(tlv_types::INTEREST_LIFETIME, end)?,
    );
    // A forwarding hint is not modeled; step over it.
    if decoder.peek_type(tlv_types::FORWARDING_HINT, end)? {
        decoder.skip_tlv()?;
    }

    // The legacy selectors have no NDN-TLV form.
    interest.set_answer_origin_kind(-1);
    interest.set_scope(-1);
    interest.publisher_public_key_digest_mut().clear();

    decoder.finish_nested_tlvs(end)?;

    // Last, so the nonce is not invalidated by the setters above.
    interest.set_nonce(nonce);
    Ok((signed_begin, signed_end))
}

/// Encode a Data block. The returned offsets bracket the signed portion:
/// everything from the Name through the SignatureInfo.
pub fn encode_data(data: &Data, encoder: &mut TlvEncoder) -> Result<(usize, usize), CodecError> {
    let mut signed_begin = 0;
    let mut signed_end = 0;
    encoder.write_nested_tlv(tlv_types::DATA, false, |encoder| {
        signed_begin = encoder.offset();
        encode_name(data.name(), encoder)?;
        encode_meta_info(data.meta_info(), encoder)?;
        encoder.write_blob_tlv(tlv_types::CONTENT, data.content());
        encode_signature_info(data.signature(), encoder)?;
        signed_end = encoder.offset();
        encoder.write_blob_tlv(tlv_types::SIGNATURE_VALUE, data.signature().signature());
        Ok(())
    })?;
    Ok((signed_begin, signed_end))
}

pub fn decode_data(data: &mut Data, decoder: &mut TlvDecoder) -> Result<(usize, usize), CodecError> {
    let end = decoder.read_nested_tlvs_start(tlv_types::DATA)?;
    let signed_begin = decoder.offset();

    let (name, _, _) = decode_name(decoder)?;
    data.set_name(name);
    data.set_meta_info(decode_meta_info(decoder)?);
    data.set_content(Blob::from(decoder.read_blob_tlv(tlv_types::CONTENT)?));

    let mut signature = Signature::new();
    decode_signature_info(&mut signature, decoder)?;
    let signed_end = decoder.offset();
    signature.set_signature(Blob::from(
        decoder.read_blob_tlv(tlv_types::SIGNATURE_VALUE)?,
    ));
    data.set_signature(signature);

    decoder.finish_nested_tlvs(end)?;
    Ok((signed_begin, signed_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn encode<F>(encode_fn: F) -> Vec<u8>
    where
        F: FnOnce(&mut TlvEncoder),
    {
        let mut encoder = TlvEncoder::new();
        encode_fn(&mut encoder);
        encoder.into_output().bytes().to_vec()
    }

    #[test]
    fn test_name_round_trip() {
        let name = Name::from_uri("/a/b/c");
        let bytes = encode(|e| {
            encode_name(&name, e).unwrap();
        });
        assert_eq!(bytes, vec![7, 9, 8, 1, b'a', 8, 1, b'b', 8, 1, b'c']);

        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let (decoded, signed_begin, signed_end) = decode_name(&mut decoder).unwrap();
        assert_eq!(decoded, name);
        // The signed portion excludes the final component.
        assert_eq!(signed_begin, 2);
        assert_eq!(signed_end, 8);
    }

    #[test]
    fn test_empty_name_signed_portion() {
        let bytes = encode(|e| {
            encode_name(&Name::new(), e).unwrap();
        });
        assert_eq!(bytes, vec![7, 0]);
        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let (decoded, signed_begin, signed_end) = decode_name(&mut decoder).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(signed_begin, signed_end);
    }

    #[test]
    fn test_implicit_digest_component_round_trip() {
        let mut name = Name::new();
        name.append(NameComponent::from_implicit_sha256_digest(&[7u8; 32][..]).unwrap());
        let bytes = encode(|e| {
            encode_name(&name, e).unwrap();
        });
        assert_eq!(bytes[2], 1); // ImplicitSha256DigestComponent type
        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let (decoded, _, _) = decode_name(&mut decoder).unwrap();
        assert_eq!(decoded, name);
    }

    #[test]
    fn test_key_locator_round_trip() {
        let mut key_locator = KeyLocator::new();
        key_locator.set_type(KeyLocatorType::KeyName);
        key_locator.set_key_name(Name::from_uri("/key/name"));

        let bytes = encode(|e| {
            encode_key_locator(tlv_types::KEY_LOCATOR, &key_locator, e).unwrap();
        });
        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let decoded = decode_key_locator(tlv_types::KEY_LOCATOR, &mut decoder).unwrap();
        assert_eq!(decoded, key_locator);
    }

    #[test]
    fn test_legacy_key_locator_is_unsupported() {
        let mut key_locator = KeyLocator::new();
        key_locator.set_type(KeyLocatorType::Key);
        key_locator.set_key_data(&[1u8, 2][..]);
        let mut encoder = TlvEncoder::new();
        assert_eq!(
            encode_key_locator(tlv_types::KEY_LOCATOR, &key_locator, &mut encoder),
            Err(CodecError::UnsupportedOperation)
        );
    }

    #[test]
    fn test_meta_info_final_block_id_vector() {
        // Matches the published encoding of a MetaInfo whose only field is
        // the final block id 0x25 0xFE.
        let mut meta_info = MetaInfo::new();
        meta_info.set_final_block_id(Some(NameComponent::new(&[0x25u8, 0xfe][..])));
        let bytes = encode(|e| {
            encode_meta_info(&meta_info, e).unwrap();
        });
        assert_eq!(bytes, vec![0x14, 0x06, 0x1a, 0x04, 0x08, 0x02, 0x25, 0xfe]);

        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let decoded = decode_meta_info(&mut decoder).unwrap();
        assert_eq!(decoded, meta_info);
    }

    #[test]
    fn test_unrecognized_content_type_fails_encode() {
        let mut meta_info = MetaInfo::new();
        meta_info.set_content_type(ContentType::Other(5));
        let mut encoder = TlvEncoder::new();
        assert_eq!(
            encode_meta_info(&meta_info, &mut encoder),
            Err(CodecError::UnrecognizedContentType(5))
        );
    }

    #[test]
    fn test_signature_info_digest_sha256() {
        let mut signature = Signature::new();
        signature.set_type(SignatureType::DigestSha256);
        let bytes = encode(|e| {
            encode_signature_info(&signature, e).unwrap();
        });
        assert_eq!(bytes, vec![0x16, 0x03, 0x1b, 0x01, 0x00]);
    }

    #[test]
    fn test_signature_info_unknown_type_fails_decode() {
        let bytes = vec![0x16, 0x03, 0x1b, 0x01, 0x05];
        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let mut signature = Signature::new();
        assert_eq!(
            decode_signature_info(&mut signature, &mut decoder),
            Err(CodecError::UnsupportedSignatureType(5))
        );
    }

    #[test]
    fn test_exclude_round_trip_preserves_order() {
        let mut exclude = Exclude::new();
        exclude.append_any().append_component("b").append_any();
        let bytes = encode(|e| {
            encode_exclude(&exclude, e).unwrap();
        });
        let mut decoder = TlvDecoder::new(Bytes::from(bytes));
        let decoded = decode_exclude(&mut decoder).unwrap();
        assert_eq!(decoded, exclude);
    }
}

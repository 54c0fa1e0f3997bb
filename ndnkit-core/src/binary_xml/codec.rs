//! The per-packet Binary XML encode and decode procedures.
//!
//! The ccnb element orders are fixed per packet type; optional children
//! are omitted, and unknown trailing elements are skipped to their close
//! sentinel. Typed name components have no Binary XML form: component
//! values survive, the type markers do not.

use bytes::Bytes;

use crate::binary_xml::dtags;
use crate::binary_xml::{BinaryXmlDecoder, BinaryXmlEncoder};
use crate::blob::Blob;
use crate::data::Data;
use crate::error::CodecError;
use crate::exclude::{Exclude, ExcludeEntry};
use crate::forwarding_entry::{ForwardingEntry, ForwardingFlags};
use crate::interest::Interest;
use crate::key_locator::{KeyLocator, KeyLocatorType, KeyNameType};
use crate::meta_info::{ContentType, MetaInfo};
use crate::name::{Name, NameComponent};
use crate::signature::{Signature, SignatureType};

/// The ccnb 3-byte content type values.
const CONTENT_TYPE_DATA: [u8; 3] = [0x0c, 0x04, 0xc0];
const CONTENT_TYPE_LINK: [u8; 3] = [0x2c, 0x83, 0x4a];
const CONTENT_TYPE_KEY: [u8; 3] = [0x28, 0x46, 0x3f];

/// Encode a Name element. The returned offsets bracket the components up
/// to but not including the final one, as used by signed interests.
pub fn encode_name(name: &Name, encoder: &mut BinaryXmlEncoder) -> (usize, usize) {
    encoder.write_element_start(dtags::NAME);
    let signed_begin = encoder.offset();
    let mut signed_end = encoder.offset();
    for (i, component) in name.components().iter().enumerate() {
        if i + 1 == name.size() {
            signed_end = encoder.offset();
        }
        encoder.write_blob_element(dtags::COMPONENT, component.value());
    }
    encoder.write_element_close();
    (signed_begin, signed_end)
}

pub fn decode_name(decoder: &mut BinaryXmlDecoder) -> Result<(Name, usize, usize), CodecError> {
    decoder.read_element_start(dtags::NAME)?;
    let signed_begin = decoder.offset();
    let mut signed_end = decoder.offset();
    let mut name = Name::new();
    while decoder.peek_dtag(dtags::COMPONENT)? {
        signed_end = decoder.offset();
        let value = decoder.read_blob_element(dtags::COMPONENT)?;
        name.append(NameComponent::new(Blob::from(value)));
    }
    decoder.read_element_close()?;
    Ok((name, signed_begin, signed_end))
}

fn encode_key_locator(
    key_locator: &KeyLocator,
    encoder: &mut BinaryXmlEncoder,
) -> Result<(), CodecError> {
    encoder.write_element_start(dtags::KEY_LOCATOR);
    match key_locator.locator_type() {
        KeyLocatorType::Key => {
            encoder.write_blob_element(dtags::KEY, key_locator.key_data());
        }
        KeyLocatorType::Certificate => {
            encoder.write_blob_element(dtags::CERTIFICATE, key_locator.key_data());
        }
        KeyLocatorType::KeyName => {
            encoder.write_element_start(dtags::KEY_NAME);
            encode_name(key_locator.key_name(), encoder);
            let digest_dtag = match key_locator.key_name_type() {
                KeyNameType::PublisherPublicKeyDigest => Some(dtags::PUBLISHER_PUBLIC_KEY_DIGEST),
                KeyNameType::PublisherCertificateDigest => {
                    Some(dtags::PUBLISHER_CERTIFICATE_DIGEST)
                }
                KeyNameType::PublisherIssuerKeyDigest => Some(dtags::PUBLISHER_ISSUER_KEY_DIGEST),
                KeyNameType::PublisherIssuerCertificateDigest => {
                    Some(dtags::PUBLISHER_ISSUER_CERTIFICATE_DIGEST)
                }
                KeyNameType::None => None,
            };
            if let Some(dtag) = digest_dtag {
                encoder.write_optional_blob_element(dtag, key_locator.key_name_digest());
            }
            encoder.write_element_close();
        }
        // KeyLocatorDigest is NDN-TLV-only; "none" has nothing to encode.
        KeyLocatorType::KeyLocatorDigest | KeyLocatorType::None => {
            return Err(CodecError::UnsupportedOperation);
        }
    }
    encoder.write_element_close();
    Ok(())
}

fn decode_key_locator(decoder: &mut BinaryXmlDecoder) -> Result<KeyLocator, CodecError> {
    decoder.read_element_start(dtags::KEY_LOCATOR)?;
    let mut key_locator = KeyLocator::new();
    if decoder.peek_dtag(dtags::KEY)? {
        key_locator.set_type(KeyLocatorType::Key);
        key_locator.set_key_data(Blob::from(decoder.read_blob_element(dtags::KEY)?));
    } else if decoder.peek_dtag(dtags::CERTIFICATE)? {
        key_locator.set_type(KeyLocatorType::Certificate);
        key_locator.set_key_data(Blob::from(decoder.read_blob_element(dtags::CERTIFICATE)?));
    } else if decoder.peek_dtag(dtags::KEY_NAME)? {
        decoder.read_element_start(dtags::KEY_NAME)?;
        key_locator.set_type(KeyLocatorType::KeyName);
        let (name, _, _) = decode_name(decoder)?;
        key_locator.set_key_name(name);
        let digest_kinds = [
            (dtags::PUBLISHER_PUBLIC_KEY_DIGEST, KeyNameType::PublisherPublicKeyDigest),
            (dtags::PUBLISHER_CERTIFICATE_DIGEST, KeyNameType::PublisherCertificateDigest),
            (dtags::PUBLISHER_ISSUER_KEY_DIGEST, KeyNameType::PublisherIssuerKeyDigest),
            (
                dtags::PUBLISHER_ISSUER_CERTIFICATE_DIGEST,
                KeyNameType::PublisherIssuerCertificateDigest,
            ),
        ];
        for (dtag, kind) in digest_kinds {
            if decoder.peek_dtag(dtag)? {
                key_locator.set_key_name_type(kind);
                key_locator.set_key_name_digest(Blob::from(decoder.read_blob_element(dtag)?));
                break;
            }
        }
        decoder.read_element_close()?;
    }
    decoder.read_element_close()?;
    Ok(key_locator)
}

fn encode_exclude(exclude: &Exclude, encoder: &mut BinaryXmlEncoder) {
    encoder.write_element_start(dtags::EXCLUDE);
    for entry in exclude.entries() {
        match entry {
            ExcludeEntry::Any => {
                encoder.write_element_start(dtags::ANY);
                encoder.write_element_close();
            }
            ExcludeEntry::Component(component) => {
                encoder.write_blob_element(dtags::COMPONENT, component.value());
            }
        }
    }
    encoder.write_element_close();
}

fn decode_exclude(decoder: &mut BinaryXmlDecoder) -> Result<Exclude, CodecError> {
    decoder.read_element_start(dtags::EXCLUDE)?;
    let mut exclude = Exclude::new();
    loop {
        if decoder.peek_dtag(dtags::ANY)? {
            decoder.read_element_start(dtags::ANY)?;
            decoder.read_element_close()?;
            exclude.append_any();
        } else if decoder.peek_dtag(dtags::COMPONENT)? {
            let value = decoder.read_blob_element(dtags::COMPONENT)?;
            exclude.append_component(NameComponent::new(Blob::from(value)));
        } else if decoder.peek_element_close()? {
            break;
        } else {
            // An unrecognized entry such as a Bloom filter.
            decoder.skip_element()?;
        }
    }
    decoder.read_element_close()?;
    Ok(exclude)
}

fn encode_signature(signature: &Signature, encoder: &mut BinaryXmlEncoder) {
    encoder.write_element_start(dtags::SIGNATURE);
    if !signature.digest_algorithm().is_null() {
        encoder.write_udata_element(
            dtags::DIGEST_ALGORITHM,
            &String::from_utf8_lossy(signature.digest_algorithm().bytes()),
        );
    }
    encoder.write_optional_blob_element(dtags::WITNESS, signature.witness());
    encoder.write_blob_element(dtags::SIGNATURE_BITS, signature.signature());
    encoder.write_element_close();
}

fn decode_signature(decoder: &mut BinaryXmlDecoder) -> Result<Signature, CodecError> {
    decoder.read_element_start(dtags::SIGNATURE)?;
    let mut signature = Signature::new();
    // ccnb carries no algorithm tag; its signatures are SHA-256 with RSA.
    signature.set_type(SignatureType::Sha256WithRsa);
    if decoder.peek_dtag(dtags::DIGEST_ALGORITHM)? {
        let text = decoder.read_udata_element(dtags::DIGEST_ALGORITHM)?;
        signature.set_digest_algorithm(text.as_bytes());
    }
    if decoder.peek_dtag(dtags::WITNESS)? {
        signature.set_witness(Blob::from(decoder.read_blob_element(dtags::WITNESS)?));
    }
    signature.set_signature(Blob::from(decoder.read_blob_element(dtags::SIGNATURE_BITS)?));
    decoder.read_element_close()?;
    Ok(signature)
}

fn encode_signed_info(data: &Data, encoder: &mut BinaryXmlEncoder) -> Result<(), CodecError> {
    let meta_info = data.meta_info();
    encoder.write_element_start(dtags::SIGNED_INFO);
    encoder.write_optional_blob_element(
        dtags::PUBLISHER_PUBLIC_KEY_DIGEST,
        data.signature().publisher_public_key_digest().digest(),
    );
    encoder.write_optional_time_milliseconds_element(dtags::TIMESTAMP, meta_info.timestamp_ms());
    match meta_info.content_type() {
        ContentType::Blob => {}
        ContentType::Data => {
            encoder.write_blob_element(dtags::TYPE, &Blob::from(&CONTENT_TYPE_DATA[..]))
        }
        ContentType::Link => {
            encoder.write_blob_element(dtags::TYPE, &Blob::from(&CONTENT_TYPE_LINK[..]))
        }
        ContentType::Key => {
            encoder.write_blob_element(dtags::TYPE, &Blob::from(&CONTENT_TYPE_KEY[..]))
        }
        ContentType::Other(code) => return Err(CodecError::UnrecognizedContentType(code)),
    }
    if meta_info.freshness_period_ms() >= 0.0 {
        encoder.write_unsigned_decimal_int_element(
            dtags::FRESHNESS_SECONDS,
            (meta_info.freshness_period_ms() / 1000.0).round() as u64,
        );
    }
    if let Some(final_block_id) = meta_info.final_block_id() {
        encoder.write_blob_element(dtags::FINAL_BLOCK_ID, final_block_id.value());
    }
    if data.signature().key_locator().locator_type() != KeyLocatorType::None {
        encode_key_locator(data.signature().key_locator(), encoder)?;
    }
    encoder.write_element_close();
    Ok(())
}

fn decode_signed_info(
    decoder: &mut BinaryXmlDecoder,
    meta_info: &mut MetaInfo,
    signature: &mut Signature,
) -> Result<(), CodecError> {
    decoder.read_element_start(dtags::SIGNED_INFO)?;
    if let Some(digest) = decoder.read_optional_blob_element(dtags::PUBLISHER_PUBLIC_KEY_DIGEST)? {
        signature
            .publisher_public_key_digest_mut()
            .set_digest(Blob::from(digest));
    }
    meta_info
        .set_timestamp_ms(decoder.read_optional_time_milliseconds_element(dtags::TIMESTAMP)?);
    if decoder.peek_dtag(dtags::TYPE)? {
        let bytes = decoder.read_blob_element(dtags::TYPE)?;
        meta_info.set_content_type(content_type_from_bytes(&bytes));
    } else {
        meta_info.set_content_type(ContentType::Blob);
    }
    let freshness_seconds =
        decoder.read_optional_unsigned_decimal_int_element(dtags::FRESHNESS_SECONDS)?;
    meta_info.set_freshness_period_ms(if freshness_seconds < 0 {
        -1.0
    } else {
        freshness_seconds as f64 * 1000.0
    });
    if decoder.peek_dtag(dtags::FINAL_BLOCK_ID)? {
        let value = decoder.read_blob_element(dtags::FINAL_BLOCK_ID)?;
        meta_info.set_final_block_id(Some(NameComponent::new(Blob::from(value))));
    } else {
        meta_info.set_final_block_id(None);
    }
    if decoder.peek_dtag(dtags::KEY_LOCATOR)? {
        signature.set_key_locator(decode_key_locator(decoder)?);
    }
    while !decoder.peek_element_close()? {
        decoder.skip_element()?;
    }
    decoder.read_element_close()?;
    Ok(())
}

fn content_type_from_bytes(bytes: &Bytes) -> ContentType {
    if bytes[..] == CONTENT_TYPE_DATA {
        ContentType::Data
    } else if bytes[..] == CONTENT_TYPE_LINK {
        ContentType::Link
    } else if bytes[..] == CONTENT_TYPE_KEY {
        ContentType::Key
    } else {
        let mut code: i32 = 0;
        for &byte in bytes.iter().take(4) {
            code = (code << 8) | byte as i32;
        }
        ContentType::Other(code)
    }
}

/// Encode an Interest element. The returned offsets bracket the signed
/// portion of the interest's name.
pub fn encode_interest(
    interest: &Interest,
    encoder: &mut BinaryXmlEncoder,
) -> Result<(usize, usize), CodecError> {
    encoder.write_element_start(dtags::INTEREST);
    let (signed_begin, signed_end) = encode_name(interest.name(), encoder);
    encoder.write_optional_unsigned_decimal_int_element(
        dtags::MIN_SUFFIX_COMPONENTS,
        interest.min_suffix_components() as i64,
    );
    encoder.write_optional_unsigned_decimal_int_element(
        dtags::MAX_SUFFIX_COMPONENTS,
        interest.max_suffix_components() as i64,
    );
    encoder.write_optional_blob_element(
        dtags::PUBLISHER_PUBLIC_KEY_DIGEST,
        interest.publisher_public_key_digest().digest(),
    );
    if !interest.exclude().is_empty() {
        encode_exclude(interest.exclude(), encoder);
    }
    encoder.write_optional_unsigned_decimal_int_element(
        dtags::CHILD_SELECTOR,
        interest.child_selector() as i64,
    );
    encoder.write_optional_unsigned_decimal_int_element(
        dtags::ANSWER_ORIGIN_KIND,
        interest.answer_origin_kind() as i64,
    );
    encoder
        .write_optional_unsigned_decimal_int_element(dtags::SCOPE, interest.scope() as i64);
    encoder.write_optional_time_milliseconds_element(
        dtags::INTEREST_LIFETIME,
        interest.interest_lifetime_ms(),
    );
    let nonce = interest.nonce();
    if nonce.is_null() {
        encoder.write_blob_element(dtags::NONCE, &Blob::from(&rand::random::<[u8; 4]>()[..]));
    } else {
        encoder.write_blob_element(dtags::NONCE, &nonce);
    }
    encoder.write_element_close();
    Ok((signed_begin, signed_end))
}

pub fn decode_interest(
    interest: &mut Interest,
    decoder: &mut BinaryXmlDecoder,
) -> Result<(usize, usize), CodecError> {
    decoder.read_element_start(dtags::INTEREST)?;
    let (name, signed_begin, signed_end) = decode_name(decoder)?;
    interest.set_name(name);

    interest.set_min_suffix_components(int_field(
        decoder.read_optional_unsigned_decimal_int_element(dtags::MIN_SUFFIX_COMPONENTS)?,
    )?);
    interest.set_max_suffix_components(int_field(
        decoder.read_optional_unsigned_decimal_int_element(dtags::MAX_SUFFIX_COMPONENTS)?,
    )?);
    interest.publisher_public_key_digest_mut().clear();
    if let Some(digest) = decoder.read_optional_blob_element(dtags::PUBLISHER_PUBLIC_KEY_DIGEST)? {
        interest
            .publisher_public_key_digest_mut()
            .set_digest(Blob::from(digest));
    }
    if decoder.peek_dtag(dtags::EXCLUDE)? {
        interest.set_exclude(decode_exclude(decoder)?);
    } else {
        interest.exclude_mut().clear();
    }
    interest.set_child_selector(int_field(
        decoder.read_optional_unsigned_decimal_int_element(dtags::CHILD_SELECTOR)?,
    )?);
    interest.set_answer_origin_kind(int_field(
        decoder.read_optional_unsigned_decimal_int_element(dtags::ANSWER_ORIGIN_KIND)?,
    )?);
    interest.set_scope(int_field(
        decoder.read_optional_unsigned_decimal_int_element(dtags::SCOPE)?,
    )?);
    interest.set_interest_lifetime_ms(
        decoder.read_optional_time_milliseconds_element(dtags::INTEREST_LIFETIME)?,
    );
    let nonce = decoder
        .read_optional_blob_element(dtags::NONCE)?
        .map(Blob::from)
        .unwrap_or_else(Blob::null);

    // These have no Binary XML form.
    interest.set_must_be_fresh(false);
    interest.key_locator_mut().clear();

    while !decoder.peek_element_close()? {
        decoder.skip_element()?;
    }
    decoder.read_element_close()?;

    // Last, so the nonce is not invalidated by the setters above.
    interest.set_nonce(nonce);
    Ok((signed_begin, signed_end))
}

fn int_field(value: i64) -> Result<i32, CodecError> {
    if value < 0 {
        return Ok(-1);
    }
    i32::try_from(value).map_err(|_| CodecError::Overflow)
}

/// Encode a ContentObject element. The returned offsets bracket the signed
/// portion: the Name through the Content.
pub fn encode_data(
    data: &Data,
    encoder: &mut BinaryXmlEncoder,
) -> Result<(usize, usize), CodecError> {
    encoder.write_element_start(dtags::CONTENT_OBJECT);
    encode_signature(data.signature(), encoder);
    let signed_begin = encoder.offset();
    encode_name(data.name(), encoder);
    encode_signed_info(data, encoder)?;
    encoder.write_blob_element(dtags::CONTENT, data.content());
    let signed_end = encoder.offset();
    encoder.write_element_close();
    Ok((signed_begin, signed_end))
}

pub fn decode_data(
    data: &mut Data,
    decoder: &mut BinaryXmlDecoder,
) -> Result<(usize, usize), CodecError> {
    decoder.read_element_start(dtags::CONTENT_OBJECT)?;
    let mut signature = decode_signature(decoder)?;

    let signed_begin = decoder.offset();
    let (name, _, _) = decode_name(decoder)?;
    data.set_name(name);

    let mut meta_info = MetaInfo::new();
    decode_signed_info(decoder, &mut meta_info, &mut signature)?;
    data.set_meta_info(meta_info);
    data.set_signature(signature);

    data.set_content(Blob::from(decoder.read_blob_element(dtags::CONTENT)?));
    let signed_end = decoder.offset();

    while !decoder.peek_element_close()? {
        decoder.skip_element()?;
    }
    decoder.read_element_close()?;
    Ok((signed_begin, signed_end))
}

pub fn encode_forwarding_entry(
    entry: &ForwardingEntry,
    encoder: &mut BinaryXmlEncoder,
) -> Result<(), CodecError> {
    encoder.write_element_start(dtags::FORWARDING_ENTRY);
    if let Some(action) = entry.action() {
        encoder.write_udata_element(dtags::ACTION, action);
    }
    encode_name(entry.prefix(), encoder);
    encoder.write_optional_blob_element(
        dtags::PUBLISHER_PUBLIC_KEY_DIGEST,
        entry.publisher_public_key_digest().digest(),
    );
    encoder
        .write_optional_unsigned_decimal_int_element(dtags::FACE_ID, entry.face_id() as i64);
    encoder.write_unsigned_decimal_int_element(
        dtags::FORWARDING_FLAGS,
        entry.forwarding_flags().bits() as u64,
    );
    if entry.freshness_period_ms() >= 0.0 {
        encoder.write_unsigned_decimal_int_element(
            dtags::FRESHNESS_SECONDS,
            (entry.freshness_period_ms() / 1000.0).round() as u64,
        );
    }
    encoder.write_element_close();
    Ok(())
}

pub fn decode_forwarding_entry(
    entry: &mut ForwardingEntry,
    decoder: &mut BinaryXmlDecoder,
) -> Result<(), CodecError> {
    decoder.read_element_start(dtags::FORWARDING_ENTRY)?;
    if decoder.peek_dtag(dtags::ACTION)? {
        entry.set_action(Some(decoder.read_udata_element(dtags::ACTION)?));
    } else {
        entry.set_action(None);
    }
    let (prefix, _, _) = decode_name(decoder)?;
    entry.set_prefix(prefix);
    entry.publisher_public_key_digest_mut().clear();
    if let Some(digest) = decoder.read_optional_blob_element(dtags::PUBLISHER_PUBLIC_KEY_DIGEST)? {
        entry
            .publisher_public_key_digest_mut()
            .set_digest(Blob::from(digest));
    }
    entry.set_face_id(int_field(
        decoder.read_optional_unsigned_decimal_int_element(dtags::FACE_ID)?,
    )?);
    let flags = decoder.read_optional_unsigned_decimal_int_element(dtags::FORWARDING_FLAGS)?;
    if flags >= 0 {
        entry.set_forwarding_flags(ForwardingFlags::from_bits(
            u32::try_from(flags).map_err(|_| CodecError::Overflow)?,
        ));
    } else {
        entry.set_forwarding_flags(ForwardingFlags::new());
    }
    let freshness_seconds =
        decoder.read_optional_unsigned_decimal_int_element(dtags::FRESHNESS_SECONDS)?;
    entry.set_freshness_period_ms(if freshness_seconds < 0 {
        -1.0
    } else {
        freshness_seconds as f64 * 1000.0
    });
    while !decoder.peek_element_close()? {
        decoder.skip_element()?;
    }
    decoder.read_element_close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_round_trip() {
        let name = Name::from_uri("/hello/world");
        let mut encoder = BinaryXmlEncoder::new();
        encode_name(&name, &mut encoder);
        let bytes = encoder.into_output();

        let mut decoder = BinaryXmlDecoder::new(Bytes::copy_from_slice(bytes.bytes()));
        let (decoded, _, _) = decode_name(&mut decoder).unwrap();
        assert_eq!(decoded, name);
        assert!(decoder.finished());
    }

    #[test]
    fn test_exclude_round_trip() {
        let mut exclude = Exclude::new();
        exclude.append_component("a").append_any().append_component("z");
        let mut encoder = BinaryXmlEncoder::new();
        encode_exclude(&exclude, &mut encoder);
        let bytes = encoder.into_output();

        let mut decoder = BinaryXmlDecoder::new(Bytes::copy_from_slice(bytes.bytes()));
        let decoded = decode_exclude(&mut decoder).unwrap();
        assert_eq!(decoded, exclude);
    }

    #[test]
    fn test_key_locator_key_name_round_trip() {
        let mut key_locator = KeyLocator::new();
        key_locator.set_type(KeyLocatorType::KeyName);
        key_locator.set_key_name(Name::from_uri("/key"));
        key_locator.set_key_name_type(KeyNameType::PublisherPublicKeyDigest);
        key_locator.set_key_name_digest(&[0x11u8; 32][..]);

        let mut encoder = BinaryXmlEncoder::new();
        encode_key_locator(&key_locator, &mut encoder).unwrap();
        let bytes = encoder.into_output();

        let mut decoder = BinaryXmlDecoder::new(Bytes::copy_from_slice(bytes.bytes()));
        let decoded = decode_key_locator(&mut decoder).unwrap();
        assert_eq!(decoded, key_locator);
    }

    #[test]
    fn test_key_locator_digest_is_unsupported() {
        let mut key_locator = KeyLocator::new();
        key_locator.set_type(KeyLocatorType::KeyLocatorDigest);
        key_locator.set_key_data(&[1u8; 32][..]);
        let mut encoder = BinaryXmlEncoder::new();
        assert_eq!(
            encode_key_locator(&key_locator, &mut encoder),
            Err(CodecError::UnsupportedOperation)
        );
    }

    #[test]
    fn test_forwarding_entry_round_trip() {
        let mut entry = ForwardingEntry::new();
        entry.set_action(Some("selfreg".to_string()));
        entry.set_prefix(Name::from_uri("/app/prefix"));
        entry.set_face_id(42);
        entry.set_freshness_period_ms(60000.0);

        let mut encoder = BinaryXmlEncoder::new();
        encode_forwarding_entry(&entry, &mut encoder).unwrap();
        let bytes = encoder.into_output();

        let mut decoder = BinaryXmlDecoder::new(Bytes::copy_from_slice(bytes.bytes()));
        let mut decoded = ForwardingEntry::new();
        decode_forwarding_entry(&mut decoded, &mut decoder).unwrap();
        assert_eq!(decoded, entry);
    }
}

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::change_counter::{Changed, Counter};
use crate::error::CodecError;

/// Marker for how a name component's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Generic,
    /// SHA-256 digest of the full Data packet; the value is always 32 bytes.
    ImplicitSha256Digest,
    /// Any other typed component, tagged with its TLV type code.
    Other(u64),
}

impl ComponentType {
    /// The TLV type code used on the wire and for canonical ordering.
    pub fn code(&self) -> u64 {
        match self {
            ComponentType::ImplicitSha256Digest => 1,
            ComponentType::Generic => 8,
            ComponentType::Other(code) => *code,
        }
    }
}

/// One component of a Name: an immutable byte value plus a type marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameComponent {
    value: Blob,
    component_type: ComponentType,
}

impl NameComponent {
    pub fn new(value: impl Into<Blob>) -> Self {
        Self {
            value: value.into(),
            component_type: ComponentType::Generic,
        }
    }

    pub fn with_type(value: impl Into<Blob>, component_type: ComponentType) -> Self {
        Self {
            value: value.into(),
            component_type,
        }
    }

    /// An ImplicitSha256Digest component. The digest must be 32 bytes.
    pub fn from_implicit_sha256_digest(digest: impl Into<Blob>) -> Result<Self, CodecError> {
        let value = digest.into();
        if value.size() != 32 {
            return Err(CodecError::Overflow);
        }
        Ok(Self {
            value,
            component_type: ComponentType::ImplicitSha256Digest,
        })
    }

    pub fn value(&self) -> &Blob {
        &self.value
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn len(&self) -> usize {
        self.value.size()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// NDN canonical order: type code, then length, then bytes.
    pub fn compare(&self, other: &NameComponent) -> Ordering {
        self.component_type
            .code()
            .cmp(&other.component_type.code())
            .then(self.len().cmp(&other.len()))
            .then_with(|| self.value.bytes().cmp(other.value.bytes()))
    }

    /// Append the URI form of this component to `out`.
    pub fn to_escaped_string(&self, out: &mut String) {
        match self.component_type {
            ComponentType::Generic => escape_component(self.value.bytes(), out),
            ComponentType::ImplicitSha256Digest => {
                out.push_str("sha256digest=");
                out.push_str(&self.value.to_hex());
            }
            ComponentType::Other(code) => {
                out.push_str(&code.to_string());
                out.push('=');
                escape_component(self.value.bytes(), out);
            }
        }
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.to_escaped_string(&mut out);
        write!(f, "{}", out)
    }
}

impl From<&str> for NameComponent {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<&[u8]> for NameComponent {
    fn from(value: &[u8]) -> Self {
        Self::new(value)
    }
}

const URI_UNRESERVED: &str = "-_.~";

fn escape_component(value: &[u8], out: &mut String) {
    if !value.is_empty() && value.iter().all(|&b| b == b'.') {
        // A value of all periods gains three more so it survives the URI.
        out.push_str("...");
    }
    for &byte in value {
        let c = byte as char;
        if c.is_ascii_alphanumeric() || URI_UNRESERVED.contains(c) {
            out.push(c);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
}

/// Unescape one URI path segment. Returns None for the "." and ".."
/// segments, which are path artifacts rather than components.
fn unescape_component(segment: &str) -> Option<NameComponent> {
    if let Some(hex) = segment.strip_prefix("sha256digest=") {
        if let Some(digest) = decode_hex(hex) {
            if let Ok(component) = NameComponent::from_implicit_sha256_digest(digest) {
                return Some(component);
            }
        }
        // Fall through and keep the malformed text as a generic component.
    } else if let Some(eq) = segment.find('=') {
        if !segment[..eq].is_empty() && segment[..eq].bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(code) = segment[..eq].parse::<u64>() {
                let value = percent_decode(&segment[eq + 1..]);
                return Some(NameComponent::with_type(value, ComponentType::Other(code)));
            }
        }
    }

    let value = percent_decode(segment);
    if !value.is_empty() && value.iter().all(|&b| b == b'.') {
        if value.len() < 3 {
            return None;
        }
        return Some(NameComponent::new(&value[3..]));
    }
    Some(NameComponent::new(value.as_slice()))
}

fn percent_decode(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(text.len() / 2);
    let bytes = text.as_bytes();
    for pair in bytes.chunks(2) {
        let hi = (pair[0] as char).to_digit(16)?;
        let lo = (pair[1] as char).to_digit(16)?;
        out.push((hi * 16 + lo) as u8);
    }
    Some(out)
}

/// A hierarchical NDN name: an ordered sequence of components.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
    #[serde(skip)]
    change_count: Counter,
}

impl Name {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URI such as `ndn:/a/%00%01/c`. Parsing is lenient: malformed
    /// percent escapes are kept literally and "."/".." segments are dropped.
    pub fn from_uri(uri: &str) -> Self {
        let mut rest = uri.trim();

        // Strip a scheme such as "ndn:" if it appears before the first '/'.
        if let Some(colon) = rest.find(':') {
            if !rest[..colon].contains('/') {
                rest = &rest[colon + 1..];
            }
        }
        // Strip an "//authority" part.
        if let Some(after) = rest.strip_prefix("//") {
            rest = match after.find('/') {
                Some(slash) => &after[slash..],
                None => "",
            };
        }
        let rest = rest.strip_prefix('/').unwrap_or(rest);

        let mut name = Name::new();
        if rest.is_empty() {
            return name;
        }
        for segment in rest.split('/') {
            if let Some(component) = unescape_component(segment) {
                name.append(component);
            }
        }
        name
    }

    pub fn size(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn append(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.components.push(component.into());
        self.change_count.increment();
        self
    }

    /// Append every component of `other`.
    pub fn append_name(&mut self, other: &Name) -> &mut Self {
        self.components.extend_from_slice(&other.components);
        self.change_count.increment();
        self
    }

    pub fn clear(&mut self) {
        self.components.clear();
        self.change_count.increment();
    }

    pub fn pop(&mut self) -> Option<NameComponent> {
        let component = self.components.pop();
        self.change_count.increment();
        component
    }

    /// The first `count` components as a new Name.
    pub fn prefix(&self, count: usize) -> Name {
        self.sub_name(0, count)
    }

    /// `count` components starting at `offset`, clamped to this name.
    pub fn sub_name(&self, offset: usize, count: usize) -> Name {
        let begin = offset.min(self.components.len());
        let end = (begin + count).min(self.components.len());
        let mut name = Name::new();
        for component in &self.components[begin..end] {
            name.append(component.clone());
        }
        name
    }

    /// True if this name is a prefix of `other` (component-wise equality).
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.size() <= other.size()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    /// NDN canonical order: a shorter name orders before its extensions.
    pub fn compare(&self, other: &Name) -> Ordering {
        for (a, b) in self.components.iter().zip(other.components.iter()) {
            let ordering = a.compare(b);
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        self.size().cmp(&other.size())
    }

    pub fn to_uri(&self) -> String {
        let mut uri = String::from("ndn:");
        if self.components.is_empty() {
            uri.push('/');
            return uri;
        }
        for component in &self.components {
            uri.push('/');
            component.to_escaped_string(&mut uri);
        }
        uri
    }
}

impl Changed for Name {
    fn change_count(&self) -> u64 {
        self.change_count.get()
    }
}

impl Clone for Name {
    fn clone(&self) -> Self {
        Self {
            components: self.components.clone(),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.components == other.components
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.hash(state);
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

impl From<&str> for Name {
    fn from(uri: &str) -> Self {
        Self::from_uri(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_uri() {
        let name = Name::from_uri("ndn:/hello/world");
        assert_eq!(name.size(), 2);
        assert_eq!(name.get(0).unwrap().value().bytes(), b"hello");
        assert_eq!(name.get(1).unwrap().value().bytes(), b"world");

        assert_eq!(Name::from_uri("/hello/world"), name);
        assert_eq!(Name::from_uri("ndn://authority/hello/world"), name);
    }

    #[test]
    fn test_empty_uri_forms() {
        assert!(Name::from_uri("/").is_empty());
        assert!(Name::from_uri("ndn:/").is_empty());
        assert!(Name::from_uri("").is_empty());
    }

    #[test]
    fn test_escaping_round_trip() {
        let mut name = Name::new();
        name.append(NameComponent::new(&[0x00u8, 0x01, 0xff][..]));
        name.append("plain");
        name.append(NameComponent::new(&b"a b"[..]));
        let reparsed = Name::from_uri(&name.to_uri());
        assert_eq!(reparsed, name);
        assert!(name.to_uri().contains("%00%01%FF"));
    }

    #[test]
    fn test_period_components() {
        let mut name = Name::new();
        name.append(NameComponent::new(&b"."[..]));
        assert_eq!(name.to_uri(), "ndn:/....");
        assert_eq!(Name::from_uri("ndn:/...."), name);

        // "..." is an escaped empty component; "." and ".." are dropped.
        let empty = Name::from_uri("/...");
        assert_eq!(empty.size(), 1);
        assert!(empty.get(0).unwrap().is_empty());
        assert!(Name::from_uri("/./..").is_empty());
    }

    #[test]
    fn test_empty_component_between_slashes() {
        let mut name = Name::new();
        name.append("ndn").append("").append("a.b");
        assert_eq!(name.to_uri(), "ndn:/ndn//a.b");

        let reparsed = Name::from_uri(&name.to_uri());
        assert_eq!(reparsed.size(), 3);
        assert!(reparsed.get(1).unwrap().is_empty());
        assert_eq!(reparsed, name);
    }

    #[test]
    fn test_typed_component_uri() {
        let digest = [0xabu8; 32];
        let mut name = Name::new();
        name.append(NameComponent::from_implicit_sha256_digest(&digest[..]).unwrap());
        name.append(NameComponent::with_type(&b"v1"[..], ComponentType::Other(33)));
        let reparsed = Name::from_uri(&name.to_uri());
        assert_eq!(reparsed, name);
    }

    #[test]
    fn test_implicit_digest_requires_32_bytes() {
        assert!(NameComponent::from_implicit_sha256_digest(&[0u8; 31][..]).is_err());
        assert!(NameComponent::from_implicit_sha256_digest(&[0u8; 32][..]).is_ok());
    }

    #[test]
    fn test_canonical_order() {
        let mut short = Name::from_uri("/a");
        let long = Name::from_uri("/a/b");
        assert_eq!(short.compare(&long), Ordering::Less);

        short.clear();
        short.append(NameComponent::new(&b"aa"[..]));
        let mut other = Name::new();
        other.append(NameComponent::new(&b"b"[..]));
        // Shorter component orders first regardless of bytes.
        assert_eq!(other.compare(&short), Ordering::Less);
    }

    #[test]
    fn test_prefix_and_sub_name() {
        let name = Name::from_uri("/a/b/c/d");
        assert_eq!(name.prefix(2), Name::from_uri("/a/b"));
        assert_eq!(name.sub_name(1, 2), Name::from_uri("/b/c"));
        assert!(Name::from_uri("/a/b").is_prefix_of(&name));
        assert!(!Name::from_uri("/a/x").is_prefix_of(&name));
    }

    #[test]
    fn test_change_count_bumps() {
        let mut name = Name::new();
        let before = name.change_count();
        name.append("a");
        assert!(name.change_count() > before);
    }
}

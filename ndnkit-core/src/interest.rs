use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::blob::Blob;
use crate::change_counter::{ChangeCounter, Changed, Counter};
use crate::exclude::Exclude;
use crate::key_locator::{KeyLocator, PublisherPublicKeyDigest};
use crate::name::Name;

/// An Interest packet: a request for Data matching a name and selectors.
///
/// `answer_origin_kind` and `scope` are legacy selectors: they are carried
/// in memory but only the Binary XML encoding puts them on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct Interest {
    name: ChangeCounter<Name>,
    min_suffix_components: i32,
    max_suffix_components: i32,
    publisher_public_key_digest: ChangeCounter<PublisherPublicKeyDigest>,
    key_locator: ChangeCounter<KeyLocator>,
    exclude: ChangeCounter<Exclude>,
    child_selector: i32,
    must_be_fresh: bool,
    answer_origin_kind: i32,
    scope: i32,
    interest_lifetime_ms: f64,
    nonce: Blob,
    /// Change count at the time the nonce was set; a mismatch means the
    /// nonce is stale and reads as null.
    #[serde(skip)]
    nonce_change_count: AtomicU64,
    #[serde(skip)]
    change_count: Counter,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name: ChangeCounter::new(name),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &Name {
        self.name.get()
    }

    pub fn name_mut(&mut self) -> &mut Name {
        self.name.get_mut()
    }

    pub fn set_name(&mut self, name: Name) {
        self.name.set(name);
        self.change_count.increment();
    }

    pub fn min_suffix_components(&self) -> i32 {
        self.min_suffix_components
    }

    /// Pass a negative value for "absent".
    pub fn set_min_suffix_components(&mut self, count: i32) {
        self.min_suffix_components = count;
        self.change_count.increment();
    }

    pub fn max_suffix_components(&self) -> i32 {
        self.max_suffix_components
    }

    pub fn set_max_suffix_components(&mut self, count: i32) {
        self.max_suffix_components = count;
        self.change_count.increment();
    }

    /// Deprecated: use the key locator with type KeyLocatorDigest.
    pub fn publisher_public_key_digest(&self) -> &PublisherPublicKeyDigest {
        self.publisher_public_key_digest.get()
    }

    pub fn publisher_public_key_digest_mut(&mut self) -> &mut PublisherPublicKeyDigest {
        self.publisher_public_key_digest.get_mut()
    }

    pub fn key_locator(&self) -> &KeyLocator {
        self.key_locator.get()
    }

    pub fn key_locator_mut(&mut self) -> &mut KeyLocator {
        self.key_locator.get_mut()
    }

    pub fn set_key_locator(&mut self, key_locator: KeyLocator) {
        self.key_locator.set(key_locator);
        self.change_count.increment();
    }

    pub fn exclude(&self) -> &Exclude {
        self.exclude.get()
    }

    pub fn exclude_mut(&mut self) -> &mut Exclude {
        self.exclude.get_mut()
    }

    pub fn set_exclude(&mut self, exclude: Exclude) {
        self.exclude.set(exclude);
        self.change_count.increment();
    }

    pub fn child_selector(&self) -> i32 {
        self.child_selector
    }

    pub fn set_child_selector(&mut self, selector: i32) {
        self.child_selector = selector;
        self.change_count.increment();
    }

    pub fn must_be_fresh(&self) -> bool {
        self.must_be_fresh
    }

    pub fn set_must_be_fresh(&mut self, must_be_fresh: bool) {
        self.must_be_fresh = must_be_fresh;
        self.change_count.increment();
    }

    pub fn answer_origin_kind(&self) -> i32 {
        self.answer_origin_kind
    }

    pub fn set_answer_origin_kind(&mut self, kind: i32) {
        self.answer_origin_kind = kind;
        self.change_count.increment();
    }

    pub fn scope(&self) -> i32 {
        self.scope
    }

    pub fn set_scope(&mut self, scope: i32) {
        self.scope = scope;
        self.change_count.increment();
    }

    pub fn interest_lifetime_ms(&self) -> f64 {
        self.interest_lifetime_ms
    }

    /// Pass a negative value for "absent".
    pub fn set_interest_lifetime_ms(&mut self, milliseconds: f64) {
        self.interest_lifetime_ms = milliseconds;
        self.change_count.increment();
    }

    /// The nonce, or null if the Interest changed since the nonce was set.
    /// Encoders emit a fresh random 4-byte nonce when this is null or not
    /// exactly 4 bytes; the object itself is not mutated.
    pub fn nonce(&self) -> Blob {
        if self.nonce_change_count.load(Ordering::Relaxed) == self.change_count() {
            self.nonce.clone()
        } else {
            Blob::null()
        }
    }

    pub fn set_nonce(&mut self, nonce: impl Into<Blob>) {
        self.nonce = nonce.into();
        self.change_count.increment();
        self.nonce_change_count
            .store(self.change_count(), Ordering::Relaxed);
    }

    /// True if `name` would be satisfied by this Interest's name and
    /// selectors.
    pub fn matches_name(&self, name: &Name) -> bool {
        if !self.name().is_prefix_of(name) {
            return false;
        }
        // Suffix counts include one for the implicit digest component.
        let suffix_count = (name.size() + 1 - self.name().size()) as i32;
        if self.min_suffix_components >= 0 && suffix_count < self.min_suffix_components {
            return false;
        }
        if self.max_suffix_components >= 0 && suffix_count > self.max_suffix_components {
            return false;
        }
        if !self.exclude().is_empty() && name.size() > self.name().size() {
            if let Some(component) = name.get(self.name().size()) {
                if self.exclude().matches(component) {
                    return false;
                }
            }
        }
        true
    }

    /// The name URI with `?ndn.Sel=value&...` appended for every selector
    /// whose value is not the default.
    pub fn to_uri(&self) -> String {
        let mut selectors = String::new();
        if self.min_suffix_components >= 0 {
            selectors.push_str(&format!("&ndn.MinSuffixComponents={}", self.min_suffix_components));
        }
        if self.max_suffix_components >= 0 {
            selectors.push_str(&format!("&ndn.MaxSuffixComponents={}", self.max_suffix_components));
        }
        if self.child_selector >= 0 {
            selectors.push_str(&format!("&ndn.ChildSelector={}", self.child_selector));
        }
        if self.answer_origin_kind >= 0 {
            selectors.push_str(&format!("&ndn.AnswerOriginKind={}", self.answer_origin_kind));
        }
        if self.scope >= 0 {
            selectors.push_str(&format!("&ndn.Scope={}", self.scope));
        }
        if self.interest_lifetime_ms >= 0.0 {
            selectors.push_str(&format!("&ndn.InterestLifetime={}", self.interest_lifetime_ms));
        }
        if self.publisher_public_key_digest().digest().size() > 0 {
            selectors.push_str("&ndn.PublisherPublicKeyDigest=");
            selectors.push_str(&percent_escape(self.publisher_public_key_digest().digest()));
        }
        let nonce = self.nonce();
        if nonce.size() > 0 {
            selectors.push_str("&ndn.Nonce=");
            selectors.push_str(&percent_escape(&nonce));
        }
        if !self.exclude().is_empty() {
            selectors.push_str(&format!("&ndn.Exclude={}", self.exclude().to_uri()));
        }

        let mut result = self.name().to_uri();
        if !selectors.is_empty() {
            result.push('?');
            result.push_str(&selectors[1..]);
        }
        result
    }
}

fn percent_escape(value: &Blob) -> String {
    let mut out = String::with_capacity(value.size() * 3);
    for &byte in value.bytes() {
        let c = byte as char;
        if c.is_ascii_alphanumeric() || "-_.~".contains(c) {
            out.push(c);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

impl Default for Interest {
    fn default() -> Self {
        Self {
            name: ChangeCounter::new(Name::new()),
            min_suffix_components: -1,
            max_suffix_components: -1,
            publisher_public_key_digest: ChangeCounter::new(PublisherPublicKeyDigest::new()),
            key_locator: ChangeCounter::new(KeyLocator::new()),
            exclude: ChangeCounter::new(Exclude::new()),
            child_selector: -1,
            must_be_fresh: false,
            answer_origin_kind: -1,
            scope: -1,
            interest_lifetime_ms: -1.0,
            nonce: Blob::null(),
            nonce_change_count: AtomicU64::new(0),
            change_count: Counter::new(),
        }
    }
}

impl Changed for Interest {
    fn change_count(&self) -> u64 {
        let mut changed = self.name.checked_changed();
        changed |= self.publisher_public_key_digest.checked_changed();
        changed |= self.key_locator.checked_changed();
        changed |= self.exclude.checked_changed();
        if changed {
            self.change_count.increment();
        }
        self.change_count.get()
    }
}

impl Clone for Interest {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            min_suffix_components: self.min_suffix_components,
            max_suffix_components: self.max_suffix_components,
            publisher_public_key_digest: self.publisher_public_key_digest.clone(),
            key_locator: self.key_locator.clone(),
            exclude: self.exclude.clone(),
            child_selector: self.child_selector,
            must_be_fresh: self.must_be_fresh,
            answer_origin_kind: self.answer_origin_kind,
            scope: self.scope,
            interest_lifetime_ms: self.interest_lifetime_ms,
            nonce: self.nonce.clone(),
            nonce_change_count: AtomicU64::new(self.nonce_change_count.load(Ordering::Relaxed)),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for Interest {
    fn eq(&self, other: &Self) -> bool {
        fn lifetime_eq(a: f64, b: f64) -> bool {
            (a < 0.0 && b < 0.0) || a == b
        }
        self.name == other.name
            && self.min_suffix_components == other.min_suffix_components
            && self.max_suffix_components == other.max_suffix_components
            && self.publisher_public_key_digest == other.publisher_public_key_digest
            && self.key_locator == other.key_locator
            && self.exclude == other.exclude
            && self.child_selector == other.child_selector
            && self.must_be_fresh == other.must_be_fresh
            && self.answer_origin_kind == other.answer_origin_kind
            && self.scope == other.scope
            && lifetime_eq(self.interest_lifetime_ms, other.interest_lifetime_ms)
            && self.nonce() == other.nonce()
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_goes_stale_on_change() {
        let mut interest = Interest::new(Name::from_uri("/a"));
        interest.set_nonce(&[1u8, 2, 3, 4][..]);
        assert_eq!(interest.nonce().bytes(), &[1, 2, 3, 4]);

        interest.set_child_selector(1);
        assert!(interest.nonce().is_null());
    }

    #[test]
    fn test_nonce_survives_reads() {
        let mut interest = Interest::new(Name::from_uri("/a"));
        interest.set_nonce(&[1u8, 2, 3, 4][..]);
        let _ = interest.to_uri();
        let _ = interest.change_count();
        assert!(!interest.nonce().is_null());
    }

    #[test]
    fn test_to_uri_selectors() {
        let mut interest = Interest::new(Name::from_uri("/a/b"));
        interest.set_min_suffix_components(2);
        interest.set_scope(1);
        interest.set_interest_lifetime_ms(4000.0);
        let uri = interest.to_uri();
        assert!(uri.starts_with("ndn:/a/b?"));
        assert!(uri.contains("ndn.MinSuffixComponents=2"));
        assert!(uri.contains("ndn.Scope=1"));
        assert!(uri.contains("ndn.InterestLifetime=4000"));
        assert!(!uri.contains("ndn.MaxSuffixComponents"));
    }

    #[test]
    fn test_matches_name() {
        let mut interest = Interest::new(Name::from_uri("/a"));
        assert!(interest.matches_name(&Name::from_uri("/a/b")));
        assert!(!interest.matches_name(&Name::from_uri("/x")));

        interest.set_min_suffix_components(2);
        assert!(interest.matches_name(&Name::from_uri("/a/b")));
        assert!(!interest.matches_name(&Name::from_uri("/a")));

        interest.set_min_suffix_components(-1);
        interest.set_max_suffix_components(1);
        assert!(interest.matches_name(&Name::from_uri("/a")));
        assert!(!interest.matches_name(&Name::from_uri("/a/b")));
    }

    #[test]
    fn test_exclude_filters_matches() {
        let mut interest = Interest::new(Name::from_uri("/a"));
        interest.exclude_mut().append_component("b");
        assert!(!interest.matches_name(&Name::from_uri("/a/b")));
        assert!(interest.matches_name(&Name::from_uri("/a/c")));
    }

    #[test]
    fn test_change_count_propagates_from_children() {
        let mut interest = Interest::new(Name::from_uri("/a"));
        let before = interest.change_count();
        interest.name_mut().append("b");
        assert!(interest.change_count() > before);

        let before = interest.change_count();
        interest.exclude_mut().append_any();
        assert!(interest.change_count() > before);
    }
}

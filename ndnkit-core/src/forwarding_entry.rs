use serde::{Deserialize, Serialize};

use crate::change_counter::{ChangeCounter, Changed, Counter};
use crate::key_locator::PublisherPublicKeyDigest;
use crate::name::Name;

/// The flags of a prefix registration, as carried by the Binary XML
/// ForwardingEntry. Defaults to active + child-inherit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardingFlags(u32);

impl ForwardingFlags {
    const ACTIVE: u32 = 1;
    const CHILD_INHERIT: u32 = 2;
    const ADVERTISE: u32 = 4;
    const LAST: u32 = 8;
    const CAPTURE: u32 = 16;
    const LOCAL: u32 = 32;
    const TAP: u32 = 64;
    const CAPTURE_OK: u32 = 128;

    pub fn new() -> Self {
        Self(Self::ACTIVE | Self::CHILD_INHERIT)
    }

    /// The raw bitfield as encoded on the wire.
    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn active(&self) -> bool {
        self.0 & Self::ACTIVE != 0
    }

    pub fn set_active(&mut self, on: bool) {
        self.set(Self::ACTIVE, on)
    }

    pub fn child_inherit(&self) -> bool {
        self.0 & Self::CHILD_INHERIT != 0
    }

    pub fn set_child_inherit(&mut self, on: bool) {
        self.set(Self::CHILD_INHERIT, on)
    }

    pub fn advertise(&self) -> bool {
        self.0 & Self::ADVERTISE != 0
    }

    pub fn set_advertise(&mut self, on: bool) {
        self.set(Self::ADVERTISE, on)
    }

    pub fn last(&self) -> bool {
        self.0 & Self::LAST != 0
    }

    pub fn set_last(&mut self, on: bool) {
        self.set(Self::LAST, on)
    }

    pub fn capture(&self) -> bool {
        self.0 & Self::CAPTURE != 0
    }

    pub fn set_capture(&mut self, on: bool) {
        self.set(Self::CAPTURE, on)
    }

    pub fn local(&self) -> bool {
        self.0 & Self::LOCAL != 0
    }

    pub fn set_local(&mut self, on: bool) {
        self.set(Self::LOCAL, on)
    }

    pub fn tap(&self) -> bool {
        self.0 & Self::TAP != 0
    }

    pub fn set_tap(&mut self, on: bool) {
        self.set(Self::TAP, on)
    }

    pub fn capture_ok(&self) -> bool {
        self.0 & Self::CAPTURE_OK != 0
    }

    pub fn set_capture_ok(&mut self, on: bool) {
        self.set(Self::CAPTURE_OK, on)
    }

    fn set(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

impl Default for ForwardingFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// A prefix registration request for a forwarder, from the Binary XML face
/// management protocol. Only the Binary XML wire format encodes it.
#[derive(Debug, Serialize, Deserialize)]
pub struct ForwardingEntry {
    action: Option<String>,
    prefix: ChangeCounter<Name>,
    publisher_public_key_digest: ChangeCounter<PublisherPublicKeyDigest>,
    face_id: i32,
    forwarding_flags: ForwardingFlags,
    freshness_period_ms: f64,
    #[serde(skip)]
    change_count: Counter,
}

impl ForwardingEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn set_action(&mut self, action: Option<String>) {
        self.action = action;
        self.change_count.increment();
    }

    pub fn prefix(&self) -> &Name {
        self.prefix.get()
    }

    pub fn prefix_mut(&mut self) -> &mut Name {
        self.prefix.get_mut()
    }

    pub fn set_prefix(&mut self, prefix: Name) {
        self.prefix.set(prefix);
        self.change_count.increment();
    }

    pub fn publisher_public_key_digest(&self) -> &PublisherPublicKeyDigest {
        self.publisher_public_key_digest.get()
    }

    pub fn publisher_public_key_digest_mut(&mut self) -> &mut PublisherPublicKeyDigest {
        self.publisher_public_key_digest.get_mut()
    }

    pub fn face_id(&self) -> i32 {
        self.face_id
    }

    /// Pass a negative value for "absent".
    pub fn set_face_id(&mut self, face_id: i32) {
        self.face_id = face_id;
        self.change_count.increment();
    }

    pub fn forwarding_flags(&self) -> ForwardingFlags {
        self.forwarding_flags
    }

    pub fn set_forwarding_flags(&mut self, flags: ForwardingFlags) {
        self.forwarding_flags = flags;
        self.change_count.increment();
    }

    pub fn freshness_period_ms(&self) -> f64 {
        self.freshness_period_ms
    }

    pub fn set_freshness_period_ms(&mut self, milliseconds: f64) {
        self.freshness_period_ms = milliseconds;
        self.change_count.increment();
    }
}

impl Default for ForwardingEntry {
    fn default() -> Self {
        Self {
            action: None,
            prefix: ChangeCounter::new(Name::new()),
            publisher_public_key_digest: ChangeCounter::new(PublisherPublicKeyDigest::new()),
            face_id: -1,
            forwarding_flags: ForwardingFlags::new(),
            freshness_period_ms: -1.0,
            change_count: Counter::new(),
        }
    }
}

impl Changed for ForwardingEntry {
    fn change_count(&self) -> u64 {
        let mut changed = self.prefix.checked_changed();
        changed |= self.publisher_public_key_digest.checked_changed();
        if changed {
            self.change_count.increment();
        }
        self.change_count.get()
    }
}

impl Clone for ForwardingEntry {
    fn clone(&self) -> Self {
        Self {
            action: self.action.clone(),
            prefix: self.prefix.clone(),
            publisher_public_key_digest: self.publisher_public_key_digest.clone(),
            face_id: self.face_id,
            forwarding_flags: self.forwarding_flags,
            freshness_period_ms: self.freshness_period_ms,
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for ForwardingEntry {
    fn eq(&self, other: &Self) -> bool {
        self.action == other.action
            && self.prefix == other.prefix
            && self.publisher_public_key_digest == other.publisher_public_key_digest
            && self.face_id == other.face_id
            && self.forwarding_flags == other.forwarding_flags
            && ((self.freshness_period_ms < 0.0 && other.freshness_period_ms < 0.0)
                || self.freshness_period_ms == other.freshness_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = ForwardingFlags::new();
        assert!(flags.active());
        assert!(flags.child_inherit());
        assert!(!flags.capture());
        assert_eq!(flags.bits(), 3);
    }

    #[test]
    fn test_flag_round_trip() {
        let mut flags = ForwardingFlags::new();
        flags.set_capture(true);
        flags.set_active(false);
        let restored = ForwardingFlags::from_bits(flags.bits());
        assert_eq!(restored, flags);
        assert!(restored.capture());
        assert!(!restored.active());
    }

    #[test]
    fn test_entry_defaults() {
        let entry = ForwardingEntry::new();
        assert!(entry.action().is_none());
        assert_eq!(entry.face_id(), -1);
        assert!(entry.freshness_period_ms() < 0.0);
    }
}

use serde::{Deserialize, Serialize};

use crate::change_counter::{Changed, Counter};
use crate::name::NameComponent;

/// The kind of payload a Data packet carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Blob,
    Link,
    Key,
    /// Deprecated Binary XML content type; treated as the Blob default by
    /// the TLV encoding.
    Data,
    /// A type code outside the recognized set, kept so a decoded packet can
    /// be inspected. Re-encoding it fails.
    Other(i32),
}

impl ContentType {
    /// The NDN-TLV integer for this type.
    pub fn code(&self) -> i32 {
        match self {
            ContentType::Blob | ContentType::Data => 0,
            ContentType::Link => 1,
            ContentType::Key => 2,
            ContentType::Other(code) => *code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => ContentType::Blob,
            1 => ContentType::Link,
            2 => ContentType::Key,
            other => ContentType::Other(other),
        }
    }
}

impl Default for ContentType {
    fn default() -> Self {
        ContentType::Blob
    }
}

/// The meta info of a Data packet, signed along with the name and content.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaInfo {
    content_type: ContentType,
    /// Milliseconds; negative means absent.
    freshness_period_ms: f64,
    final_block_id: Option<NameComponent>,
    /// Deprecated Binary XML timestamp, milliseconds since 1970; negative
    /// means absent.
    timestamp_ms: f64,
    #[serde(skip)]
    change_count: Counter,
}

impl MetaInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    pub fn set_content_type(&mut self, content_type: ContentType) {
        self.content_type = content_type;
        self.change_count.increment();
    }

    pub fn freshness_period_ms(&self) -> f64 {
        self.freshness_period_ms
    }

    /// Pass a negative value for "absent".
    pub fn set_freshness_period_ms(&mut self, milliseconds: f64) {
        self.freshness_period_ms = milliseconds;
        self.change_count.increment();
    }

    pub fn final_block_id(&self) -> Option<&NameComponent> {
        self.final_block_id.as_ref()
    }

    pub fn set_final_block_id(&mut self, component: Option<NameComponent>) {
        self.final_block_id = component;
        self.change_count.increment();
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ms
    }

    /// Deprecated: only the Binary XML encoding carries a timestamp.
    pub fn set_timestamp_ms(&mut self, milliseconds: f64) {
        self.timestamp_ms = milliseconds;
        self.change_count.increment();
    }
}

impl Default for MetaInfo {
    fn default() -> Self {
        Self {
            content_type: ContentType::Blob,
            freshness_period_ms: -1.0,
            final_block_id: None,
            timestamp_ms: -1.0,
            change_count: Counter::new(),
        }
    }
}

impl Changed for MetaInfo {
    fn change_count(&self) -> u64 {
        self.change_count.get()
    }
}

impl Clone for MetaInfo {
    fn clone(&self) -> Self {
        Self {
            content_type: self.content_type,
            freshness_period_ms: self.freshness_period_ms,
            final_block_id: self.final_block_id.clone(),
            timestamp_ms: self.timestamp_ms,
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for MetaInfo {
    fn eq(&self, other: &Self) -> bool {
        fn period_eq(a: f64, b: f64) -> bool {
            (a < 0.0 && b < 0.0) || a == b
        }
        self.content_type == other.content_type
            && period_eq(self.freshness_period_ms, other.freshness_period_ms)
            && self.final_block_id == other.final_block_id
            && period_eq(self.timestamp_ms, other.timestamp_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let meta_info = MetaInfo::new();
        assert_eq!(meta_info.content_type(), ContentType::Blob);
        assert!(meta_info.freshness_period_ms() < 0.0);
        assert!(meta_info.final_block_id().is_none());
        assert!(meta_info.timestamp_ms() < 0.0);
    }

    #[test]
    fn test_absent_periods_compare_equal() {
        let mut a = MetaInfo::new();
        let mut b = MetaInfo::new();
        a.set_freshness_period_ms(-1.0);
        b.set_freshness_period_ms(-5.0);
        assert_eq!(a, b);
    }

    #[test]
    fn test_content_type_codes() {
        assert_eq!(ContentType::Blob.code(), 0);
        assert_eq!(ContentType::Data.code(), 0);
        assert_eq!(ContentType::Link.code(), 1);
        assert_eq!(ContentType::Key.code(), 2);
    }
}

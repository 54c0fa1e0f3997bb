use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::change_counter::{Changed, Counter};
use crate::name::NameComponent;

/// One entry of an Exclude filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExcludeEntry {
    /// Matches any component in the range it bounds.
    Any,
    Component(NameComponent),
}

/// An Interest exclude filter: an ordered list of components and ANY
/// markers. The list never holds two consecutive ANY markers; appending a
/// redundant ANY is a no-op.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Exclude {
    entries: Vec<ExcludeEntry>,
    #[serde(skip)]
    change_count: Counter,
}

impl Exclude {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ExcludeEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ExcludeEntry] {
        &self.entries
    }

    pub fn append_any(&mut self) -> &mut Self {
        if !matches!(self.entries.last(), Some(ExcludeEntry::Any)) {
            self.entries.push(ExcludeEntry::Any);
            self.change_count.increment();
        }
        self
    }

    pub fn append_component(&mut self, component: impl Into<NameComponent>) -> &mut Self {
        self.entries.push(ExcludeEntry::Component(component.into()));
        self.change_count.increment();
        self
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.change_count.increment();
    }

    /// True if `component` is excluded by this filter.
    ///
    /// An ANY entry excludes everything up to the neighboring concrete
    /// components in NDN canonical order; a concrete entry excludes exact
    /// matches.
    pub fn matches(&self, component: &NameComponent) -> bool {
        let mut i = 0;
        while i < self.entries.len() {
            match &self.entries[i] {
                ExcludeEntry::Any => {
                    // Range from the previous component (or open) to the
                    // next component (or open).
                    let lower = if i > 0 {
                        match &self.entries[i - 1] {
                            ExcludeEntry::Component(c) => Some(c),
                            ExcludeEntry::Any => None,
                        }
                    } else {
                        None
                    };
                    let upper = match self.entries.get(i + 1) {
                        Some(ExcludeEntry::Component(c)) => Some(c),
                        _ => None,
                    };
                    let above_lower =
                        lower.map_or(true, |c| c.compare(component) != Ordering::Greater);
                    let below_upper =
                        upper.map_or(true, |c| component.compare(c) != Ordering::Greater);
                    if above_lower && below_upper {
                        return true;
                    }
                }
                ExcludeEntry::Component(c) => {
                    if c == component {
                        return true;
                    }
                }
            }
            i += 1;
        }
        false
    }

    /// The URI selector form: entries separated by commas, `*` for ANY.
    pub fn to_uri(&self) -> String {
        let mut out = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            match entry {
                ExcludeEntry::Any => out.push('*'),
                ExcludeEntry::Component(c) => c.to_escaped_string(&mut out),
            }
        }
        out
    }
}

impl Changed for Exclude {
    fn change_count(&self) -> u64 {
        self.change_count.get()
    }
}

impl Clone for Exclude {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            change_count: self.change_count.clone(),
        }
    }
}

impl PartialEq for Exclude {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Exclude {}

impl fmt::Display for Exclude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uri())
    }
}

//! Read-only access to a resource's attributes.
//!
//! Mapping logic never touches attribute storage directly; it sees resources
//! through [`AttributeView`], which only offers lookup and a read-only scan.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;

/// Iterator over `(key, string-rendered value)` pairs of an [`AttributeView`].
pub type AttributeIter<'a> = Box<dyn Iterator<Item = (&'a str, Cow<'a, str>)> + 'a>;

/// Read-only view over a resource's attribute set.
///
/// Keys are unique within a view. Non-string values are rendered to their
/// canonical string form. Values are `str`, so any byte-level decoding (and
/// U+FFFD replacement) happened before they reached the view.
pub trait AttributeView {
    /// Look up an attribute, returning its string-rendered value if present.
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Scan every attribute in the view's native order.
    fn iter_strings(&self) -> AttributeIter<'_>;

    /// Number of attributes in the view.
    fn len(&self) -> usize {
        self.iter_strings().count()
    }

    /// Whether the view has no attributes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: AttributeView + ?Sized> AttributeView for &V {
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>> {
        (**self).get_string(key)
    }

    fn iter_strings(&self) -> AttributeIter<'_> {
        (**self).iter_strings()
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

impl AttributeView for HashMap<String, String> {
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }

    fn iter_strings(&self) -> AttributeIter<'_> {
        Box::new(
            self.iter()
                .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str()))),
        )
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }
}

impl AttributeView for BTreeMap<String, String> {
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).map(|v| Cow::Borrowed(v.as_str()))
    }

    fn iter_strings(&self) -> AttributeIter<'_> {
        Box::new(
            self.iter()
                .map(|(k, v)| (k.as_str(), Cow::Borrowed(v.as_str()))),
        )
    }

    fn len(&self) -> usize {
        BTreeMap::len(self)
    }
}

impl AttributeView for [KeyValue] {
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|kv| kv.key.as_str() == key)
            .map(|kv| kv.value.as_str())
    }

    fn iter_strings(&self) -> AttributeIter<'_> {
        Box::new(self.iter().map(|kv| (kv.key.as_str(), kv.value.as_str())))
    }

    fn len(&self) -> usize {
        <[KeyValue]>::len(self)
    }
}

impl AttributeView for Vec<KeyValue> {
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>> {
        self.as_slice().get_string(key)
    }

    fn iter_strings(&self) -> AttributeIter<'_> {
        self.as_slice().iter_strings()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl AttributeView for Resource {
    fn get_string(&self, key: &str) -> Option<Cow<'_, str>> {
        self.iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v.as_str())
    }

    fn iter_strings(&self) -> AttributeIter<'_> {
        Box::new(self.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    fn len(&self) -> usize {
        Resource::len(self)
    }
}

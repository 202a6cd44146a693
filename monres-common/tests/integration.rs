//! Integration tests for monres-common.
//!
//! Exercise the public data model the way the mapper crate consumes it.

use std::collections::{BTreeMap, HashMap};

use monres_common::{AttributeView, MonitoredResource, sanitize_utf8, semconv};
use opentelemetry::KeyValue;

/// Collect a view into a sorted map for comparisons.
fn collect(view: &dyn AttributeView) -> BTreeMap<String, String> {
    view.iter_strings()
        .map(|(k, v)| (k.to_string(), v.into_owned()))
        .collect()
}

#[test]
fn test_views_agree_across_storage() {
    let pairs = [
        (semconv::SERVICE_NAME, "checkout"),
        (semconv::CLOUD_REGION, "us-central1"),
        (semconv::HOST_ID, "1234"),
    ];

    let hash: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let tree: BTreeMap<String, String> = hash.clone().into_iter().collect();
    let kvs: Vec<KeyValue> = pairs.iter().map(|(k, v)| KeyValue::new(*k, *v)).collect();

    assert_eq!(collect(&hash), collect(&tree));
    assert_eq!(collect(&tree), collect(&kvs));
}

#[test]
fn test_sanitized_labels_roundtrip_through_json() {
    let value = sanitize_utf8(b"zone-\xfe-a").into_owned();
    let mr = MonitoredResource::new("gce_instance").with_label("zone", value.clone());

    let json = serde_json::to_string(&mr).unwrap();
    let back: MonitoredResource = serde_json::from_str(&json).unwrap();

    assert_eq!(back.labels.get("zone"), Some(&value));
    assert_eq!(sanitize_utf8(value.as_bytes()), value);
}

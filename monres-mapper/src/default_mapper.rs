//! The built-in mapping path.

use std::sync::Arc;

use monres_common::{AttributeView, Labels, MonitoredResource, sanitize_utf8};
use tracing::trace;

use crate::classify::{GcmClassifier, ResourceClassifier};
use crate::error::{ClassificationError, MappingError};
use crate::mapper::MapResource;

/// Maps resources through a [`ResourceClassifier`] and sanitizes the result.
#[derive(Clone)]
pub struct DefaultMapper {
    classifier: Arc<dyn ResourceClassifier>,
}

impl std::fmt::Debug for DefaultMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMapper").finish_non_exhaustive()
    }
}

impl Default for DefaultMapper {
    fn default() -> Self {
        Self::new(GcmClassifier::new())
    }
}

impl DefaultMapper {
    /// Create a mapper backed by the given classifier.
    pub fn new(classifier: impl ResourceClassifier + 'static) -> Self {
        Self {
            classifier: Arc::new(classifier),
        }
    }

    /// Create a mapper sharing an existing classifier.
    pub fn with_shared(classifier: Arc<dyn ResourceClassifier>) -> Self {
        Self { classifier }
    }
}

impl MapResource for DefaultMapper {
    fn map(&self, attrs: &dyn AttributeView) -> Result<MonitoredResource, MappingError> {
        let classified = self.classifier.classify(attrs)?;

        if let Err(reason) = classified.validate() {
            return Err(ClassificationError::new(reason).into());
        }

        // Labels are already `String`, so this is the identity unless a
        // classifier starts handing over raw bytes.
        let labels: Labels = classified
            .labels
            .iter()
            .map(|(k, v)| (k.clone(), sanitize_utf8(v.as_bytes()).into_owned()))
            .collect();

        trace!(
            resource_type = %classified.resource_type,
            labels = labels.len(),
            "Classified resource"
        );

        Ok(MonitoredResource {
            resource_type: classified.resource_type,
            labels,
        })
    }
}

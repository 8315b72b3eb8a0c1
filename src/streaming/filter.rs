//! Declarative event filtering.

use uuid::Uuid;

use crate::error::ChainError;
use crate::event::StreamEvent;

/// Include/exclude sets over event name, tags and run id.
///
/// An event passes when no exclude set matches it and, if any include set is
/// non-empty, at least one include set matches it. Filtering is a pure
/// subset operation: relative order of the surviving events is untouched.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    include_names: Vec<String>,
    exclude_names: Vec<String>,
    include_tags: Vec<String>,
    exclude_tags: Vec<String>,
    include_run_ids: Vec<Uuid>,
    exclude_run_ids: Vec<Uuid>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn include_name(mut self, name: impl Into<String>) -> Self {
        self.include_names.push(name.into());
        self
    }

    #[must_use]
    pub fn exclude_name(mut self, name: impl Into<String>) -> Self {
        self.exclude_names.push(name.into());
        self
    }

    #[must_use]
    pub fn include_tag(mut self, tag: impl Into<String>) -> Self {
        self.include_tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn exclude_tag(mut self, tag: impl Into<String>) -> Self {
        self.exclude_tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn include_run_id(mut self, run_id: Uuid) -> Self {
        self.include_run_ids.push(run_id);
        self
    }

    #[must_use]
    pub fn exclude_run_id(mut self, run_id: Uuid) -> Self {
        self.exclude_run_ids.push(run_id);
        self
    }

    /// Reject contradictory specifications before any execution begins.
    pub(crate) fn validate(&self) -> Result<(), ChainError> {
        for name in &self.include_names {
            if self.exclude_names.contains(name) {
                return Err(ChainError::FilterConfig { what: name.clone() });
            }
        }
        for tag in &self.include_tags {
            if self.exclude_tags.contains(tag) {
                return Err(ChainError::FilterConfig { what: tag.clone() });
            }
        }
        for run_id in &self.include_run_ids {
            if self.exclude_run_ids.contains(run_id) {
                return Err(ChainError::FilterConfig {
                    what: run_id.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Whether an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &StreamEvent) -> bool {
        if self.exclude_names.contains(&event.name)
            || self.exclude_run_ids.contains(&event.run_id)
            || event.tags.iter().any(|tag| self.exclude_tags.contains(tag))
        {
            return false;
        }

        let has_includes = !(self.include_names.is_empty()
            && self.include_tags.is_empty()
            && self.include_run_ids.is_empty());
        if !has_includes {
            return true;
        }

        self.include_names.contains(&event.name)
            || self.include_run_ids.contains(&event.run_id)
            || event.tags.iter().any(|tag| self.include_tags.contains(tag))
    }
}

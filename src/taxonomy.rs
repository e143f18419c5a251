//! Topic to category resolution.
//!
//! fedmsg topics look like `org.fedoraproject.prod.bodhi.update.comment`:
//! the segment after the environment names the service that published the
//! message, and that service is the category events are counted under.

use crate::config::TaxonomyConfig;
use std::collections::BTreeSet;

/// Resolves inbound topics to one of the fixed categories.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    topic_prefix: String,
    category_segment: usize,
    categories: BTreeSet<String>,
}

impl Taxonomy {
    pub fn new(config: &TaxonomyConfig) -> Self {
        Self {
            topic_prefix: config.topic_prefix.clone(),
            category_segment: config.category_segment,
            categories: config.normalized_categories(),
        }
    }

    /// The fixed category set, sorted.
    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    /// Category for `topic`, or `None` when the topic is outside the
    /// subscription, too short, or names an unknown category.
    pub fn category_of<'a>(&self, topic: &'a str) -> Option<&'a str> {
        if !topic.starts_with(&self.topic_prefix) {
            return None;
        }

        let segment = topic.split('.').nth(self.category_segment)?;
        if self.categories.contains(segment) {
            Some(segment)
        } else {
            None
        }
    }
}

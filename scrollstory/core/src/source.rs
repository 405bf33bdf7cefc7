//! Narration Sources
//!
//! Narration is loaded at render time, section by section. How it is fetched
//! (files, network, embedded) is up to the [`NarrationSource`] implementation.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::model::{Narration, SectionId};

/// Loads the narration blocks of a section
#[async_trait]
pub trait NarrationSource: Send + Sync {
    /// Narration for `section`, in display order
    async fn load_narration(&self, section: &SectionId) -> anyhow::Result<Vec<Narration>>;
}

/// In-memory narration, keyed by section
#[derive(Clone, Debug, Default)]
pub struct StaticNarration {
    sections: HashMap<SectionId, Vec<Narration>>,
}

impl StaticNarration {
    /// Create an empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add narration for a section
    #[must_use]
    pub fn with_section(mut self, section: impl Into<SectionId>, narration: Vec<Narration>) -> Self {
        self.sections.insert(section.into(), narration);
        self
    }
}

#[async_trait]
impl NarrationSource for StaticNarration {
    async fn load_narration(&self, section: &SectionId) -> anyhow::Result<Vec<Narration>> {
        self.sections
            .get(section)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no narration for section {section}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_narration_lookup() {
        let source = StaticNarration::new().with_section("intro", vec![Narration::new("hello")]);

        let loaded = source.load_narration(&SectionId::from("intro")).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].text, "hello");

        assert!(source.load_narration(&SectionId::from("other")).await.is_err());
    }
}

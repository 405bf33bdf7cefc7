//! Element Naming
//!
//! The engine never builds markup itself; it only needs stable names for the
//! elements a surface renders. A [`NamingStrategy`] supplies them. Callers may
//! pass their own strategy to the builder; otherwise [`DefaultNaming`] is used.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::SectionId;

/// Opaque reference to a rendered element
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl ElementId {
    /// Create an element ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names for every element the engine addresses
pub trait NamingStrategy: Send + Sync {
    /// Container holding the whole story
    fn story_container(&self) -> ElementId;

    /// The section's graphic
    fn graphic(&self, section: &SectionId) -> ElementId;

    /// Container wrapping the section's graphic, title and caption
    fn graphic_container(&self, section: &SectionId) -> ElementId;

    /// Title text above the section's graphic
    fn graphic_title(&self, section: &SectionId) -> ElementId;

    /// Caption text below the section's graphic
    fn graphic_caption(&self, section: &SectionId) -> ElementId;

    /// Step element observed for one narration block
    fn step(&self, section: &SectionId, index: usize) -> ElementId;

    /// Content element inside a step (the scroll target)
    fn step_content(&self, section: &SectionId, index: usize) -> ElementId;
}

/// Prefix-based naming: `{prefix}-{section}-graphic`, `{prefix}-{section}-narration-{i}`, ...
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DefaultNaming {
    prefix: String,
}

impl DefaultNaming {
    /// Create naming with the given prefix
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The prefix in use
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for DefaultNaming {
    fn default() -> Self {
        Self::new("scrollstory")
    }
}

impl NamingStrategy for DefaultNaming {
    fn story_container(&self) -> ElementId {
        ElementId(format!("{}-story", self.prefix))
    }

    fn graphic(&self, section: &SectionId) -> ElementId {
        ElementId(format!("{}-{section}-graphic", self.prefix))
    }

    fn graphic_container(&self, section: &SectionId) -> ElementId {
        ElementId(format!("{}-{section}-graphic-container", self.prefix))
    }

    fn graphic_title(&self, section: &SectionId) -> ElementId {
        ElementId(format!("{}-{section}-graphic-title", self.prefix))
    }

    fn graphic_caption(&self, section: &SectionId) -> ElementId {
        ElementId(format!("{}-{section}-graphic-caption", self.prefix))
    }

    fn step(&self, section: &SectionId, index: usize) -> ElementId {
        ElementId(format!("{}-{section}-narration-{index}", self.prefix))
    }

    fn step_content(&self, section: &SectionId, index: usize) -> ElementId {
        ElementId(format!("{}-{section}-narration-{index}-content", self.prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_naming_layout() {
        let naming = DefaultNaming::default();
        let intro = SectionId::from("intro");

        assert_eq!(naming.story_container().as_str(), "scrollstory-story");
        assert_eq!(naming.graphic(&intro).as_str(), "scrollstory-intro-graphic");
        assert_eq!(
            naming.graphic_container(&intro).as_str(),
            "scrollstory-intro-graphic-container"
        );
        assert_eq!(naming.step(&intro, 2).as_str(), "scrollstory-intro-narration-2");
        assert_eq!(
            naming.step_content(&intro, 2).as_str(),
            "scrollstory-intro-narration-2-content"
        );
    }

    #[test]
    fn test_names_are_distinct_per_section() {
        let naming = DefaultNaming::new("s");
        let a = SectionId::from("a");
        let b = SectionId::from("b");
        assert_ne!(naming.graphic(&a), naming.graphic(&b));
        assert_ne!(naming.step(&a, 0), naming.step(&b, 0));
    }
}

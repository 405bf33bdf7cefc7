//! Story Data Model
//!
//! Sections, narration blocks and the identifiers that tie them together.
//!
//! # Design Philosophy
//!
//! Author-supplied configuration ([`SectionConfig`]) is immutable once it has
//! been handed to the builder. Narration is attached after it has been loaded,
//! producing a [`Section`]. Anything the engine creates at runtime (observer
//! bindings, graphic ids) lives in the orchestrator, never on the config.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::behavior::SectionBehavior;
use crate::error::StoryError;

/// Section identifier, unique across a story
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub String);

impl SectionId {
    /// Create a section ID from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier is usable as an element-name fragment
    ///
    /// Identifiers must be non-empty and made of ASCII alphanumerics,
    /// `-` or `_`.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One scrollable narration block
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Narration {
    /// Position within the owning section (assigned on load)
    #[serde(skip)]
    pub index: usize,
    /// Optional identifier, unique within the section
    #[serde(default)]
    pub narration_id: Option<String>,
    /// Narration body text
    #[serde(default)]
    pub text: String,
    /// Raw trigger value consumed by graphic-update logic
    #[serde(default)]
    pub trigger: Option<String>,
    /// Blank space above the block, in percent of the viewport height
    #[serde(default)]
    pub space_above_in_vh: f64,
    /// Graphic title shown while this block is active
    #[serde(default)]
    pub graph_title: Option<String>,
    /// Graphic caption shown while this block is active
    #[serde(default)]
    pub graph_caption: Option<String>,
}

impl Narration {
    /// Create a narration block with text only
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the narration identifier
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.narration_id = Some(id.into());
        self
    }

    /// Set the raw trigger
    #[must_use]
    pub fn with_trigger(mut self, trigger: impl Into<String>) -> Self {
        self.trigger = Some(trigger.into());
        self
    }

    /// Set the space above, in viewport-height percent
    #[must_use]
    pub fn with_space_above(mut self, vh: f64) -> Self {
        self.space_above_in_vh = vh.max(0.0);
        self
    }

    /// Set the graphic title and caption
    #[must_use]
    pub fn with_graph_text(
        mut self,
        title: impl Into<String>,
        caption: impl Into<String>,
    ) -> Self {
        self.graph_title = Some(title.into());
        self.graph_caption = Some(caption.into());
        self
    }
}

/// Author-supplied configuration for a section
#[derive(Clone)]
pub struct SectionConfig {
    /// Section identifier
    pub id: SectionId,
    /// Route triggers through the behavior's conversion functions
    pub convert_trigger_to_object: bool,
    /// Graph building and callbacks
    pub behavior: Arc<dyn SectionBehavior>,
}

impl SectionConfig {
    /// Create a section config with raw triggers
    pub fn new(id: impl Into<SectionId>, behavior: Arc<dyn SectionBehavior>) -> Self {
        Self {
            id: id.into(),
            convert_trigger_to_object: false,
            behavior,
        }
    }

    /// Enable or disable trigger conversion
    #[must_use]
    pub fn with_trigger_objects(mut self, convert: bool) -> Self {
        self.convert_trigger_to_object = convert;
        self
    }
}

impl fmt::Debug for SectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectionConfig")
            .field("id", &self.id)
            .field("convert_trigger_to_object", &self.convert_trigger_to_object)
            .finish_non_exhaustive()
    }
}

/// A section with its narration loaded
#[derive(Clone, Debug)]
pub struct Section {
    /// Immutable author configuration
    pub config: SectionConfig,
    /// Ordered narration blocks
    pub narration: Vec<Narration>,
}

impl Section {
    /// Attach narration to a config, assigning contiguous indices
    pub fn new(config: SectionConfig, mut narration: Vec<Narration>) -> Self {
        for (index, block) in narration.iter_mut().enumerate() {
            block.index = index;
        }
        Self { config, narration }
    }

    /// Section identifier
    #[must_use]
    pub fn id(&self) -> &SectionId {
        &self.config.id
    }

    /// Number of narration blocks
    #[must_use]
    pub fn len(&self) -> usize {
        self.narration.len()
    }

    /// Whether the section has no narration
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.narration.is_empty()
    }

    /// Narration block at `index`
    #[must_use]
    pub fn narration(&self, index: usize) -> Option<&Narration> {
        self.narration.get(index)
    }

    /// Index of the last narration block
    #[must_use]
    pub fn last_index(&self) -> Option<usize> {
        self.narration.len().checked_sub(1)
    }

    /// Index of the first narration block whose identifier matches `id`
    #[must_use]
    pub fn find_narration(&self, id: &str) -> Option<usize> {
        self.narration
            .iter()
            .position(|n| n.narration_id.as_deref() == Some(id))
    }

    fn check_narration_ids(&self) -> Result<(), StoryError> {
        let mut seen = HashSet::new();
        for id in self.narration.iter().filter_map(|n| n.narration_id.as_deref()) {
            if !seen.insert(id) {
                return Err(StoryError::DuplicateNarrationId {
                    section: self.id().clone(),
                    id: id.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Check a list of section configs before anything is loaded or rendered
///
/// # Errors
///
/// Returns the first configuration problem found: an empty list, a
/// malformed identifier or a duplicate identifier.
pub fn validate_configs(configs: &[SectionConfig]) -> Result<(), StoryError> {
    if configs.is_empty() {
        return Err(StoryError::NoSections);
    }
    let mut seen = HashSet::new();
    for config in configs {
        if !config.id.is_well_formed() {
            return Err(StoryError::MalformedSectionId(config.id.clone()));
        }
        if !seen.insert(&config.id) {
            return Err(StoryError::DuplicateSection(config.id.clone()));
        }
    }
    Ok(())
}

/// Ordered sections of a story, addressable by identifier
#[derive(Clone, Debug)]
pub struct SectionList {
    sections: Vec<Section>,
    by_id: HashMap<SectionId, usize>,
}

impl SectionList {
    /// Build a validated section list
    ///
    /// # Errors
    ///
    /// Fails on any section-level problem (see [`validate_configs`]) or on a
    /// narration identifier repeated within one section.
    pub fn new(sections: Vec<Section>) -> Result<Self, StoryError> {
        let configs: Vec<SectionConfig> = sections.iter().map(|s| s.config.clone()).collect();
        validate_configs(&configs)?;
        for section in &sections {
            section.check_narration_ids()?;
        }

        let by_id = sections
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.id().clone(), pos))
            .collect();
        Ok(Self { sections, by_id })
    }

    /// Section by identifier
    #[must_use]
    pub fn get(&self, id: &SectionId) -> Option<&Section> {
        self.by_id.get(id).map(|&pos| &self.sections[pos])
    }

    /// Story position of a section
    #[must_use]
    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    /// Section at a story position
    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Section> {
        self.sections.get(position)
    }

    /// Iterate sections in story order
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Number of sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the list is empty (never true for a validated list)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Total narration blocks across all sections
    #[must_use]
    pub fn step_count(&self) -> usize {
        self.sections.iter().map(Section::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::NoopBehavior;

    fn config(id: &str) -> SectionConfig {
        SectionConfig::new(id, Arc::new(NoopBehavior))
    }

    #[test]
    fn test_section_assigns_contiguous_indices() {
        let mut blocks = vec![Narration::new("a"), Narration::new("b"), Narration::new("c")];
        blocks[2].index = 99;
        let section = Section::new(config("intro"), blocks);

        let indices: Vec<usize> = section.narration.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(section.last_index(), Some(2));
    }

    #[test]
    fn test_find_narration_first_match() {
        let section = Section::new(
            config("intro"),
            vec![
                Narration::new("a"),
                Narration::new("b").with_id("peak"),
                Narration::new("c"),
            ],
        );
        assert_eq!(section.find_narration("peak"), Some(1));
        assert_eq!(section.find_narration("missing"), None);
    }

    #[test]
    fn test_validate_rejects_empty_list() {
        assert!(matches!(validate_configs(&[]), Err(StoryError::NoSections)));
    }

    #[test]
    fn test_validate_rejects_duplicates_and_malformed() {
        let dup = validate_configs(&[config("intro"), config("intro")]);
        assert!(matches!(dup, Err(StoryError::DuplicateSection(id)) if id.as_str() == "intro"));

        let malformed = validate_configs(&[config("has space")]);
        assert!(matches!(malformed, Err(StoryError::MalformedSectionId(_))));

        let empty = validate_configs(&[config("")]);
        assert!(matches!(empty, Err(StoryError::MalformedSectionId(_))));
    }

    #[test]
    fn test_section_list_rejects_duplicate_narration_ids() {
        let section = Section::new(
            config("intro"),
            vec![Narration::new("a").with_id("x"), Narration::new("b").with_id("x")],
        );
        let result = SectionList::new(vec![section]);
        assert!(matches!(
            result,
            Err(StoryError::DuplicateNarrationId { ref id, .. }) if id == "x"
        ));
    }

    #[test]
    fn test_section_list_lookup() {
        let list = SectionList::new(vec![
            Section::new(config("intro"), vec![Narration::new("a"), Narration::new("b")]),
            Section::new(config("body"), vec![Narration::new("c")]),
        ])
        .unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.position(&SectionId::from("body")), Some(1));
        assert_eq!(list.at(0).map(|s| s.id().as_str()), Some("intro"));
        assert_eq!(list.step_count(), 3);
    }

    #[test]
    fn test_narration_deserializes_camel_case() {
        let json = r#"{"narrationId":"n1","text":"hi","trigger":"t","spaceAboveInVh":40}"#;
        let narration: Narration = serde_json::from_str(json).unwrap();
        assert_eq!(narration.narration_id.as_deref(), Some("n1"));
        assert_eq!(narration.trigger.as_deref(), Some("t"));
        assert!((narration.space_above_in_vh - 40.0).abs() < f64::EPSILON);
    }
}

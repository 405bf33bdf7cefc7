//! Story Documents
//!
//! A story on disk is a single JSON file:
//!
//! ```json
//! {
//!   "title": "Rivers",
//!   "sections": [
//!     {
//!       "id": "flow",
//!       "convertTriggerToObject": true,
//!       "chart": { "unit": "km³", "bars": [{ "label": "Amazon", "value": 6600 }] },
//!       "narration": [
//!         { "narrationId": "intro", "text": "...", "trigger": "highlight:Amazon",
//!           "spaceAboveInVh": 20, "graphTitle": "Discharge", "graphCaption": "..." }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use scrollstory_core::{
    Collaborators, Narration, RenderedStory, SectionConfig, SectionId, StaticNarration, Story,
    StoryError, StorySettings,
};

use crate::chart::{ChartBehavior, ChartData};
use crate::page::Page;

/// Errors loading a story document
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The file could not be read
    #[error("Failed to read story at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// The file is not a valid story document
    #[error("Failed to parse story at {path}: {source}")]
    Parse {
        /// The path that was parsed
        path: PathBuf,
        /// The underlying JSON error
        source: serde_json::Error,
    },
}

/// A whole story
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDocument {
    /// Story title, shown in the status line
    #[serde(default)]
    pub title: String,
    /// Sections, in reading order
    #[serde(default)]
    pub sections: Vec<SectionDocument>,
}

/// One section of a story document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDocument {
    /// Section identifier
    pub id: SectionId,
    /// Route triggers through the chart's conversion
    #[serde(default)]
    pub convert_trigger_to_object: bool,
    /// Data for the section's graphic
    #[serde(default)]
    pub chart: Option<ChartData>,
    /// Narration blocks, in reading order
    #[serde(default)]
    pub narration: Vec<Narration>,
}

impl StoryDocument {
    /// Read and parse a story file
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Self =
            serde_json::from_str(&content).map_err(|source| DocumentError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        tracing::info!(
            path = %path.display(),
            sections = document.sections.len(),
            "Loaded story document"
        );
        Ok(document)
    }

    /// Narration for every section, keyed by section id
    #[must_use]
    pub fn narration_source(&self) -> StaticNarration {
        self.sections
            .iter()
            .fold(StaticNarration::new(), |source, section| {
                source.with_section(section.id.clone(), section.narration.clone())
            })
    }

    /// Section configs whose graphics draw onto `page`
    #[must_use]
    pub fn section_configs(&self, page: &Arc<Page>) -> Vec<SectionConfig> {
        self.sections
            .iter()
            .map(|section| {
                let behavior = ChartBehavior::new(Arc::clone(page), section.chart.clone());
                SectionConfig::new(section.id.clone(), Arc::new(behavior))
                    .with_trigger_objects(section.convert_trigger_to_object)
            })
            .collect()
    }

    /// Render this document onto a terminal page
    ///
    /// # Errors
    ///
    /// Propagates validation and render failures from the story engine.
    pub async fn render(
        &self,
        page: &Arc<Page>,
        settings: StorySettings,
    ) -> Result<RenderedStory, StoryError> {
        let collaborators = Collaborators {
            surface: page.clone(),
            driver: page.clone(),
            observer: page.clone(),
            source: Arc::new(self.narration_source()),
            input: Some(page.clone()),
        };
        Story::builder(collaborators)
            .sections(self.section_configs(page))
            .settings(settings)
            .build()?
            .render()
            .await
    }
}

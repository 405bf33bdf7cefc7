//! Error Types
//!
//! Construction/render failures and navigation failures. Collaborator faults
//! are reported as [`SurfaceError`] and wrapped by both.

use thiserror::Error;

use crate::model::SectionId;
use crate::surface::SurfaceError;

/// Errors raised while building or rendering a story
#[derive(Debug, Error)]
pub enum StoryError {
    /// The story has no sections
    #[error("Story has no sections")]
    NoSections,

    /// A section identifier is empty or contains unusable characters
    #[error("Malformed section identifier: {0:?}")]
    MalformedSectionId(SectionId),

    /// Two sections share an identifier
    #[error("Duplicate section identifier: {0}")]
    DuplicateSection(SectionId),

    /// Two narration blocks in one section share an identifier
    #[error("Duplicate narration identifier {id:?} in section {section}")]
    DuplicateNarrationId {
        /// Section containing the duplicate
        section: SectionId,
        /// The repeated narration identifier
        id: String,
    },

    /// Narration for a section could not be loaded
    #[error("Failed to load narration for section {section}: {source}")]
    NarrationLoad {
        /// Section being loaded
        section: SectionId,
        /// Underlying loader error
        source: anyhow::Error,
    },

    /// The section's graphic could not be built
    #[error("Failed to build graphic for section {section}: {source}")]
    GraphBuild {
        /// Section whose graphic failed
        section: SectionId,
        /// Underlying builder error
        source: anyhow::Error,
    },

    /// A rendering collaborator failed
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// Errors raised by imperative navigation
#[derive(Debug, Error)]
pub enum NavigationError {
    /// No section with this identifier exists
    #[error("Unknown section: {0}")]
    UnknownSection(SectionId),

    /// Another programmatic scroll has not settled yet
    #[error("A programmatic scroll is already in flight")]
    ScrollInFlight,

    /// The scroll driver or surface failed
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

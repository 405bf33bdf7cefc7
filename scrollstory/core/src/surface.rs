//! Collaborator Traits
//!
//! The engine renders nothing and observes nothing by itself. Everything it
//! needs from the outside world comes through the traits in this module:
//!
//! - [`StorySurface`]: builds section elements and applies visual state
//! - [`ScrollDriver`]: moves the page and reports its offset
//! - [`StepObserver`]: reports step enter/exit/progress for a section
//! - [`InputSource`]: forwards keyboard and resize input
//!
//! A terminal, a browser bridge or a test harness implements these; the
//! engine's logic is the same for all of them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::events::StepEvent;
use crate::input::SurfaceInput;
use crate::model::{Section, SectionId};
use crate::naming::{ElementId, NamingStrategy};
use crate::trigger::{StateMap, Trigger};

/// Faults reported by collaborators
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// The named element is not rendered
    #[error("Element not found: {0}")]
    MissingElement(ElementId),

    /// Scrolling failed before settling
    #[error("Scroll failed: {0}")]
    ScrollFailed(String),

    /// The step observer could not be set up
    #[error("Observer setup failed: {0}")]
    ObserverSetup(String),
}

/// Element geometry relative to the viewport, in surface units
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementRect {
    /// Distance from the viewport top to the element top (negative once scrolled past)
    pub top: f64,
    /// Rendered height
    pub height: f64,
}

/// Vertical alignment for scroll-into-view
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollAlign {
    /// Viewport fraction (0 = top, 1 = bottom) where the target's top settles
    pub top: f64,
}

/// Options forwarded verbatim to [`ScrollDriver::scroll_into_view`]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollOptions {
    /// Where the target should settle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<ScrollAlign>,
    /// Scroll animation length
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Easing name understood by the driver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub easing: Option<String>,
    /// Driver-specific settings
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ScrollOptions {
    /// Copy of these options with an alignment hint
    #[must_use]
    pub fn with_align(mut self, align: Option<ScrollAlign>) -> Self {
        self.align = align;
        self
    }
}

/// Visual layer of the story
///
/// Calls are synchronous: they describe the state the surface should show,
/// and are expected to be visible to anything reading the surface afterwards.
pub trait StorySurface: Send + Sync {
    /// Create the elements for a section (steps, contents, graphic container)
    fn build_section(
        &self,
        section: &Section,
        naming: &dyn NamingStrategy,
    ) -> Result<(), SurfaceError>;

    /// Re-lay out a section's narration blocks after a resize
    fn relayout_section(&self, section: &Section, naming: &dyn NamingStrategy);

    /// Mark or unmark an element as active
    fn set_active(&self, element: &ElementId, active: bool);

    /// Unmark every active element inside `container`
    fn clear_active(&self, container: &ElementId);

    /// Replace the text of an element
    fn set_text(&self, element: &ElementId, text: &str);

    /// Update a graphic's visual styles from a trigger and state
    fn apply_graphic_style(
        &self,
        graphic: &ElementId,
        trigger: &Trigger,
        state: &StateMap,
        progress: f64,
    );

    /// Current geometry of an element, if it is rendered
    fn element_rect(&self, element: &ElementId) -> Option<ElementRect>;

    /// Viewport height in the same units as [`ElementRect`]
    fn viewport_height(&self) -> f64;
}

/// Page scrolling capability
#[async_trait]
pub trait ScrollDriver: Send + Sync {
    /// Scroll `target` into view, resolving once the position has settled
    async fn scroll_into_view(
        &self,
        target: &ElementId,
        options: &ScrollOptions,
    ) -> Result<(), SurfaceError>;

    /// Current page scroll offset
    fn page_offset(&self) -> f64;
}

/// Observer configuration for one section
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverSetup {
    /// Section being observed
    pub section: SectionId,
    /// Step elements, in narration order
    pub steps: Vec<ElementId>,
    /// The story container
    pub container: ElementId,
    /// The section's graphic
    pub graphic: ElementId,
    /// Trigger offset as a viewport fraction
    pub offset: f64,
    /// Whether progress events are wanted
    pub progress: bool,
}

/// Control handle for a running observer
pub trait ObserverHandle: Send + Sync {
    /// Re-measure step geometry after layout changed
    fn resize(&self);

    /// Stop observing; no further events are sent
    fn teardown(&self) {}
}

/// A running observer: its event stream and its control handle
pub struct ObserverBinding {
    /// Step events, in the order the observer saw them
    pub events: mpsc::UnboundedReceiver<StepEvent>,
    /// Control handle
    pub handle: Box<dyn ObserverHandle>,
}

impl std::fmt::Debug for ObserverBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverBinding").finish_non_exhaustive()
    }
}

/// Step observation capability
pub trait StepObserver: Send + Sync {
    /// Start observing the steps of one section
    fn setup(&self, setup: ObserverSetup) -> Result<ObserverBinding, SurfaceError>;
}

/// Keyboard and resize input
pub trait InputSource: Send + Sync {
    /// Subscribe to input; the stream ends when the surface goes away
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SurfaceInput>;
}

//! Navigation Controller
//!
//! Imperative navigation over the flattened step sequence (every narration
//! block of every section, section order first, narration order second).
//!
//! # State Machine
//!
//! ```text
//!            scroll_to() entry: suppress triggers
//!   ┌──────┐ ─────────────────────────────────────▶ ┌───────────────────────────┐
//!   │ Idle │                                        │ ProgrammaticScrollInFlight│
//!   └──────┘ ◀───────────────────────────────────── └───────────────────────────┘
//!            scroll settled or failed: re-enable triggers,
//!            replay enter + progress for the target
//! ```
//!
//! Observer events are only handled in `Idle`. While a scroll is in flight,
//! further navigation requests are rejected with
//! [`NavigationError::ScrollInFlight`] rather than queued.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::NavigationError;
use crate::events::{Direction, StepProgress, StepTransition};
use crate::handlers::StepEventHandlers;
use crate::model::{Section, SectionId, SectionList};
use crate::state::Position;
use crate::surface::{ScrollAlign, ScrollDriver, ScrollOptions, SurfaceError};
use crate::trigger::TRIGGER_OFFSET;

/// Relative navigation command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavigationCommand {
    /// Move to the next step
    Next,
    /// Move to the previous step
    Previous,
}

/// Which narration block of a section to scroll to
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NarrationTarget {
    /// No preference: the first block
    #[default]
    First,
    /// The first block with this narration identifier
    Id(String),
    /// A block by index
    Index(i64),
}

impl From<&str> for NarrationTarget {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for NarrationTarget {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<usize> for NarrationTarget {
    fn from(index: usize) -> Self {
        Self::Index(i64::try_from(index).unwrap_or(i64::MAX))
    }
}

impl From<i64> for NarrationTarget {
    fn from(index: i64) -> Self {
        Self::Index(index)
    }
}

impl From<i32> for NarrationTarget {
    fn from(index: i32) -> Self {
        Self::Index(i64::from(index))
    }
}

impl<T: Into<NarrationTarget>> From<Option<T>> for NarrationTarget {
    fn from(target: Option<T>) -> Self {
        target.map_or(Self::First, Into::into)
    }
}

/// How a [`NarrationTarget`] was resolved
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetResolution {
    /// The target named an existing block
    Exact,
    /// Nothing was named, or the name missed; fell back to index 0
    Defaulted,
}

/// Result of a completed programmatic scroll
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationOutcome {
    /// Section scrolled to
    pub section: SectionId,
    /// Narration index scrolled to
    pub index: usize,
    /// Direction inferred from the page offset
    pub direction: Direction,
    /// How the target was resolved
    pub resolution: TargetResolution,
}

/// A step in the flattened sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepCoordinate {
    /// Story position of the section
    pub section: usize,
    /// Narration index within the section
    pub narration: usize,
}

/// Resolve a target to a narration index
///
/// Misses are lenient: an unknown identifier or an out-of-range index lands
/// on 0, reported as [`TargetResolution::Defaulted`].
#[must_use]
pub fn resolve_target(section: &Section, target: &NarrationTarget) -> (usize, TargetResolution) {
    let found = match target {
        NarrationTarget::First => None,
        NarrationTarget::Id(id) => section.find_narration(id),
        NarrationTarget::Index(index) => usize::try_from(*index)
            .ok()
            .filter(|&i| i < section.len()),
    };
    match found {
        Some(index) => (index, TargetResolution::Exact),
        None if *target == NarrationTarget::First => (0, TargetResolution::Exact),
        None => (0, TargetResolution::Defaulted),
    }
}

fn current_section(sections: &SectionList, position: &Position) -> usize {
    position
        .section
        .as_ref()
        .and_then(|id| sections.position(id))
        .unwrap_or(0)
}

/// Step after the current position, or `None` at the end of the story
///
/// An unset section counts as the first section; an unset index counts as one
/// before the first block, so the first call lands on index 0.
#[must_use]
pub fn next_coordinate(sections: &SectionList, position: &Position) -> Option<StepCoordinate> {
    let mut section = current_section(sections, position);
    let mut candidate = position.narration_index.map_or(0, |i| i + 1);
    loop {
        if candidate < sections.at(section)?.len() {
            return Some(StepCoordinate {
                section,
                narration: candidate,
            });
        }
        section += 1;
        candidate = 0;
    }
}

/// Step before the current position, or `None` at the start of the story
///
/// An unset section counts as the first section; an unset index counts as one
/// after the first block, so the first call lands on index 0.
#[must_use]
pub fn previous_coordinate(sections: &SectionList, position: &Position) -> Option<StepCoordinate> {
    let mut section = current_section(sections, position);
    let mut candidate = position.narration_index.unwrap_or(1).checked_sub(1);
    loop {
        let len = sections.at(section)?.len();
        if let Some(index) = candidate.filter(|&i| i < len) {
            return Some(StepCoordinate {
                section,
                narration: index,
            });
        }
        section = section.checked_sub(1)?;
        candidate = sections.at(section)?.last_index();
    }
}

/// Alignment that centers a block on the trigger line
///
/// The content is centered on [`TRIGGER_OFFSET`]. Its configured space above
/// pushes it down by half that space, at most a quarter of its own height, so
/// the trigger line always falls inside the content. Content taller than the
/// viewport settles at the top.
#[must_use]
pub fn alignment_hint(
    space_above_in_vh: f64,
    rendered_height: f64,
    viewport_height: f64,
) -> Option<ScrollAlign> {
    if viewport_height <= 0.0 {
        return None;
    }
    let height = rendered_height.max(0.0);
    let line = viewport_height * TRIGGER_OFFSET;
    let space_above = space_above_in_vh.max(0.0) / 100.0 * viewport_height;
    let shift = space_above.min(height / 2.0) / 2.0;
    let top = (line - height / 2.0 + shift).max(0.0);
    Some(ScrollAlign {
        top: top / viewport_height,
    })
}

/// Owns imperative navigation and arbitrates it against organic scrolling
pub struct NavigationController {
    handlers: Arc<StepEventHandlers>,
    driver: Arc<dyn ScrollDriver>,
    scroll_defaults: ScrollOptions,
    in_flight: Mutex<()>,
}

impl NavigationController {
    /// Create a controller
    ///
    /// `scroll_defaults` are used when `scroll_to` is given no options, and
    /// as the base for next/previous navigation.
    pub fn new(
        handlers: Arc<StepEventHandlers>,
        driver: Arc<dyn ScrollDriver>,
        scroll_defaults: ScrollOptions,
    ) -> Self {
        Self {
            handlers,
            driver,
            scroll_defaults,
            in_flight: Mutex::new(()),
        }
    }

    /// Current position
    #[must_use]
    pub fn position(&self) -> Position {
        self.handlers.state().position()
    }

    /// Whether observer-driven step handling is currently suppressed
    #[must_use]
    pub fn triggers_disabled(&self) -> bool {
        self.handlers.state().triggers_disabled()
    }

    /// Whether a programmatic scroll is in flight
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// The story's sections
    #[must_use]
    pub fn sections(&self) -> &Arc<SectionList> {
        self.handlers.sections()
    }

    /// Run a relative navigation command
    ///
    /// # Errors
    ///
    /// See [`NavigationController::scroll_to`].
    pub async fn execute(
        &self,
        command: NavigationCommand,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        match command {
            NavigationCommand::Next => self.scroll_to_next_narration().await,
            NavigationCommand::Previous => self.scroll_to_previous_narration().await,
        }
    }

    /// Scroll to the next step; `Ok(None)` at the end of the story
    ///
    /// # Errors
    ///
    /// See [`NavigationController::scroll_to`].
    pub async fn scroll_to_next_narration(
        &self,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        let target = next_coordinate(self.sections(), &self.position());
        self.scroll_to_coordinate(target).await
    }

    /// Scroll to the previous step; `Ok(None)` at the start of the story
    ///
    /// # Errors
    ///
    /// See [`NavigationController::scroll_to`].
    pub async fn scroll_to_previous_narration(
        &self,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        let target = previous_coordinate(self.sections(), &self.position());
        self.scroll_to_coordinate(target).await
    }

    async fn scroll_to_coordinate(
        &self,
        target: Option<StepCoordinate>,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        let Some(coordinate) = target else {
            debug!("No step in that direction, staying put");
            return Ok(None);
        };
        let Some(section) = self.sections().at(coordinate.section) else {
            return Ok(None);
        };
        let section_id = section.id().clone();
        let options = self
            .scroll_defaults
            .clone()
            .with_align(self.alignment_for(section, coordinate.narration));

        self.scroll_to(&section_id, coordinate.narration, Some(options))
            .await
            .map(Some)
    }

    fn alignment_for(&self, section: &Section, index: usize) -> Option<ScrollAlign> {
        let narration = section.narration(index)?;
        let surface = self.handlers.surface();
        let content = self.handlers.naming().step_content(section.id(), index);
        let rect = surface.element_rect(&content)?;
        alignment_hint(
            narration.space_above_in_vh,
            rect.height,
            surface.viewport_height(),
        )
    }

    /// Scroll a narration block into view and activate it
    ///
    /// Triggers are suppressed for the duration of the scroll. Once it
    /// settles, direction is inferred from the page offset and the enter and
    /// progress handlers run for the target, exactly as organic scrolling
    /// would have run them.
    ///
    /// # Errors
    ///
    /// - [`NavigationError::UnknownSection`] if `section` does not exist
    /// - [`NavigationError::ScrollInFlight`] if another scroll has not settled
    /// - [`NavigationError::Surface`] if the target is not rendered or the
    ///   scroll fails; triggers are re-enabled either way
    pub async fn scroll_to(
        &self,
        section_id: &SectionId,
        target: impl Into<NarrationTarget>,
        options: Option<ScrollOptions>,
    ) -> Result<NavigationOutcome, NavigationError> {
        let Ok(_in_flight) = self.in_flight.try_lock() else {
            warn!(section = %section_id, "Navigation rejected: scroll already in flight");
            return Err(NavigationError::ScrollInFlight);
        };

        let section = self
            .sections()
            .get(section_id)
            .ok_or_else(|| NavigationError::UnknownSection(section_id.clone()))?;
        let target = target.into();
        let (index, resolution) = resolve_target(section, &target);
        if resolution == TargetResolution::Defaulted {
            debug!(section = %section_id, ?target, "Narration target not found, using index 0");
        }

        let naming = self.handlers.naming();
        let surface = self.handlers.surface();
        let content = naming.step_content(section_id, index);
        if surface.element_rect(&content).is_none() {
            return Err(SurfaceError::MissingElement(content).into());
        }

        let before = self.driver.page_offset();
        surface.clear_active(&naming.story_container());
        let options = options.unwrap_or_else(|| self.scroll_defaults.clone());

        {
            let _suppressed = self.handlers.state().suppress();
            self.driver.scroll_into_view(&content, &options).await?;
        }

        let after = self.driver.page_offset();
        let direction = Direction::from_offsets(before, after);
        let element = naming.step(section_id, index);

        self.handlers.on_step_enter(
            section_id,
            &StepTransition {
                element: element.clone(),
                index,
                direction,
            },
        );
        self.handlers.on_step_progress(
            section_id,
            &StepProgress {
                element,
                scroll_progress_element: Some(content),
                index,
                reported_progress: 0.0,
            },
        );

        info!(section = %section_id, index, %direction, "Scrolled to narration");
        Ok(NavigationOutcome {
            section: section_id.clone(),
            index,
            direction,
            resolution,
        })
    }
}

impl std::fmt::Debug for NavigationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationController")
            .field("handlers", &self.handlers)
            .field("scroll_defaults", &self.scroll_defaults)
            .finish_non_exhaustive()
    }
}

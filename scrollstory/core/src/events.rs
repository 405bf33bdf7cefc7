//! Step Events
//!
//! Events a step observer reports for the narration blocks of one section,
//! and the payload handed to section callbacks.

use serde::{Deserialize, Serialize};

use crate::model::Section;
use crate::naming::ElementId;
use crate::trigger::{StateMap, Trigger};

/// Scroll direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the start of the story
    Up,
    /// Toward the end of the story
    Down,
}

impl Direction {
    /// Infer direction from page offsets before and after a move
    ///
    /// `Up` only when the offset decreased; an unchanged offset is `Down`.
    #[must_use]
    pub fn from_offsets(before: f64, after: f64) -> Self {
        if after < before {
            Self::Up
        } else {
            Self::Down
        }
    }

    /// Human-readable label
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A step entered or exited the trigger line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepTransition {
    /// The step element
    pub element: ElementId,
    /// Narration index within the section
    pub index: usize,
    /// Scroll direction at the time of the transition
    pub direction: Direction,
}

/// Progress through a step changed
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    /// The step element
    pub element: ElementId,
    /// Element whose geometry measures progress (defaults to `element`)
    pub scroll_progress_element: Option<ElementId>,
    /// Narration index within the section
    pub index: usize,
    /// Progress as reported by the observer (not trusted, recomputed)
    pub reported_progress: f64,
}

/// Event reported by a step observer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StepEvent {
    /// Step crossed the trigger line and became current
    Enter(StepTransition),
    /// Step left the trigger line
    Exit(StepTransition),
    /// Step moved while crossing the trigger line
    Progress(StepProgress),
}

impl StepEvent {
    /// Narration index the event refers to
    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Enter(step) | Self::Exit(step) => step.index,
            Self::Progress(progress) => progress.index,
        }
    }

    /// Short event name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Enter(_) => "enter",
            Self::Exit(_) => "exit",
            Self::Progress(_) => "progress",
        }
    }
}

/// Payload handed to `on_activate_narration` and `on_scroll`
#[derive(Clone, Debug)]
pub struct NarrationPayload<'a> {
    /// Narration index
    pub index: usize,
    /// Progress through the block (0 on activation)
    pub progress: f64,
    /// The step element
    pub element: &'a ElementId,
    /// Resolved trigger
    pub trigger: &'a Trigger,
    /// Resolved narration state
    pub state: &'a StateMap,
    /// Direction of travel (`None` for scroll callbacks)
    pub direction: Option<Direction>,
    /// The section's graphic
    pub graphic_id: &'a ElementId,
    /// The section's graphic container
    pub graphic_container_id: &'a ElementId,
    /// The section, configuration and narration
    pub section: &'a Section,
}

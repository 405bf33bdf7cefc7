//! Navigation State
//!
//! The single position record of a story (current section, current narration
//! index) plus the trigger-suppression flag.
//!
//! Position is written by the step handlers only, after the index has been
//! checked against the section, so a recorded index is always valid for the
//! recorded section. The suppression flag is set for the lifetime of a
//! [`SuppressionGuard`]; dropping the guard clears it on every exit path.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::model::SectionId;

/// Current position in the story
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Active section (`None` before the first activation)
    pub section: Option<SectionId>,
    /// Active narration index (`None` before the first activation)
    pub narration_index: Option<usize>,
}

impl Position {
    /// Position at a given step
    pub fn at(section: impl Into<SectionId>, index: usize) -> Self {
        Self {
            section: Some(section.into()),
            narration_index: Some(index),
        }
    }

    /// Whether nothing has been activated yet
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.section.is_none() && self.narration_index.is_none()
    }
}

/// Shared navigation state
#[derive(Debug, Default)]
pub struct NavigationState {
    position: Mutex<Position>,
    triggers_disabled: AtomicBool,
}

impl NavigationState {
    /// Create an unset state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current position
    #[must_use]
    pub fn position(&self) -> Position {
        self.position.lock().clone()
    }

    /// Record a new position
    pub(crate) fn set_position(&self, section: &SectionId, index: usize) {
        let mut position = self.position.lock();
        if position.section.as_ref() != Some(section) {
            position.section = Some(section.clone());
        }
        position.narration_index = Some(index);
    }

    /// Whether observer-driven step handling is suppressed
    #[must_use]
    pub fn triggers_disabled(&self) -> bool {
        self.triggers_disabled.load(Ordering::SeqCst)
    }

    /// Suppress observer-driven step handling until the guard drops
    pub(crate) fn suppress(&self) -> SuppressionGuard<'_> {
        self.triggers_disabled.store(true, Ordering::SeqCst);
        SuppressionGuard { state: self }
    }
}

/// Keeps triggers disabled while alive
#[derive(Debug)]
#[must_use = "triggers are re-enabled as soon as the guard is dropped"]
pub struct SuppressionGuard<'a> {
    state: &'a NavigationState,
}

impl Drop for SuppressionGuard<'_> {
    fn drop(&mut self) {
        self.state.triggers_disabled.store(false, Ordering::SeqCst);
    }
}

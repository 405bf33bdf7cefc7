//! Section Behavior
//!
//! The per-section capability an author supplies: building the graphic,
//! converting triggers, deriving narration state, and reacting to activation,
//! scrolling and resizing. Everything except [`SectionBehavior::build_graph`]
//! has a default, so a section only implements what it uses.

use crate::events::NarrationPayload;
use crate::model::Section;
use crate::naming::ElementId;
use crate::trigger::{StateMap, Trigger, TriggerContext};

/// Author-supplied behavior for a section
pub trait SectionBehavior: Send + Sync {
    /// Build the section's graphic into the element named `graphic`
    ///
    /// Called once per section during render, after the section's elements
    /// exist and before its observer starts.
    fn build_graph(&self, graphic: &ElementId, section: &Section) -> anyhow::Result<()>;

    /// Convert a raw trigger (only used when the section converts triggers)
    fn convert_trigger(&self, raw: &str, _ctx: TriggerContext) -> Trigger {
        Trigger::Raw(raw.to_string())
    }

    /// Derive narration state (only used when the section converts triggers)
    fn narration_state(&self, _index: usize, _progress: f64) -> StateMap {
        StateMap::new()
    }

    /// A narration block became active
    fn on_activate_narration(&self, _payload: &NarrationPayload<'_>) {}

    /// Progress through the active narration block changed
    fn on_scroll(&self, _payload: &NarrationPayload<'_>) {}

    /// The viewport was resized and the section re-laid out
    fn on_resize(&self, _section: &Section) {}
}

/// Behavior with no graphic and no callbacks
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopBehavior;

impl SectionBehavior for NoopBehavior {
    fn build_graph(&self, _graphic: &ElementId, _section: &Section) -> anyhow::Result<()> {
        Ok(())
    }
}

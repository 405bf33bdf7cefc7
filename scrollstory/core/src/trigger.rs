//! Trigger Resolution
//!
//! Maps `(section, narration index, progress)` to the `{trigger, state}` pair
//! that parameterizes graphic updates and callbacks.
//!
//! With `convert_trigger_to_object` off, the raw trigger string is passed
//! through and the state is empty. With it on, both come from the section's
//! [`SectionBehavior`](crate::behavior::SectionBehavior), so an author can
//! encode rich per-step state without the engine knowing its shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::Section;

/// Vertical viewport fraction at which a step counts as triggered
pub const TRIGGER_OFFSET: f64 = 0.5;

/// Author-defined narration state
pub type StateMap = serde_json::Map<String, Value>;

/// A trigger value, raw or derived
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    /// The narration's trigger string, verbatim
    Raw(String),
    /// A value produced by the section's conversion function
    Object(Value),
}

impl Trigger {
    /// The raw string, if this trigger was not converted
    #[must_use]
    pub fn as_raw(&self) -> Option<&str> {
        match self {
            Self::Raw(raw) => Some(raw),
            Self::Object(_) => None,
        }
    }

    /// Whether this is an empty raw trigger
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Raw(raw) if raw.is_empty())
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self::Raw(String::new())
    }
}

/// Context handed to trigger conversion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerContext {
    /// Narration index
    pub index: usize,
    /// Progress through the narration block (0..=1)
    pub progress: f64,
}

/// Resolved trigger and state for one step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedTrigger {
    /// Trigger value
    pub trigger: Trigger,
    /// Narration state (empty unless converted)
    pub state: StateMap,
}

/// Resolve the trigger and state for `section.narration[index]` at `progress`
///
/// `index` must be valid for the section; a missing block resolves to an
/// empty raw trigger.
#[must_use]
pub fn resolve(section: &Section, index: usize, progress: f64) -> ResolvedTrigger {
    debug_assert!(index < section.len(), "narration index out of range");
    let raw = section
        .narration(index)
        .and_then(|n| n.trigger.as_deref())
        .unwrap_or("");

    if !section.config.convert_trigger_to_object {
        return ResolvedTrigger {
            trigger: Trigger::Raw(raw.to_string()),
            state: StateMap::new(),
        };
    }

    let behavior = &section.config.behavior;
    ResolvedTrigger {
        trigger: behavior.convert_trigger(raw, TriggerContext { index, progress }),
        state: behavior.narration_state(index, progress),
    }
}

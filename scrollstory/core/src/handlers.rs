//! Step Event Handlers
//!
//! Reacts to step enter/exit/progress for a section: records the position,
//! updates visual state on the surface, then invokes the section's callbacks.
//!
//! Every entry point is a no-op while triggers are suppressed. Organic events
//! arriving during a programmatic scroll are dropped, not deferred; the
//! navigation controller replays enter + progress for the target once the
//! scroll settles.
//!
//! Within one transition, surface updates always happen before the callback,
//! so callbacks observe the already-updated state.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::events::{Direction, NarrationPayload, StepEvent, StepProgress, StepTransition};
use crate::model::{Section, SectionId, SectionList};
use crate::naming::NamingStrategy;
use crate::state::NavigationState;
use crate::surface::{ElementRect, StorySurface};
use crate::trigger::{resolve, TRIGGER_OFFSET};

/// Progress of an element through the trigger line
///
/// `0` while the element top is below the line, `1` once its bottom has
/// passed it. A zero-height element jumps straight from 0 to 1.
#[must_use]
pub fn progress_through_trigger(rect: ElementRect, viewport_height: f64) -> f64 {
    let line = viewport_height * TRIGGER_OFFSET;
    if rect.height <= 0.0 {
        return if rect.top <= line { 1.0 } else { 0.0 };
    }
    ((line - rect.top) / rect.height).clamp(0.0, 1.0)
}

/// Handlers shared by every section's observer and by the navigation controller
pub struct StepEventHandlers {
    sections: Arc<SectionList>,
    state: Arc<NavigationState>,
    surface: Arc<dyn StorySurface>,
    naming: Arc<dyn NamingStrategy>,
}

impl StepEventHandlers {
    /// Create handlers over a rendered story
    pub fn new(
        sections: Arc<SectionList>,
        state: Arc<NavigationState>,
        surface: Arc<dyn StorySurface>,
        naming: Arc<dyn NamingStrategy>,
    ) -> Self {
        Self {
            sections,
            state,
            surface,
            naming,
        }
    }

    /// The story's sections
    #[must_use]
    pub fn sections(&self) -> &Arc<SectionList> {
        &self.sections
    }

    /// Shared navigation state
    #[must_use]
    pub fn state(&self) -> &Arc<NavigationState> {
        &self.state
    }

    /// The visual surface
    #[must_use]
    pub fn surface(&self) -> &Arc<dyn StorySurface> {
        &self.surface
    }

    /// Element naming
    #[must_use]
    pub fn naming(&self) -> &Arc<dyn NamingStrategy> {
        &self.naming
    }

    /// Route an observer event to its handler
    pub fn dispatch(&self, section: &SectionId, event: &StepEvent) {
        match event {
            StepEvent::Enter(step) => self.on_step_enter(section, step),
            StepEvent::Exit(step) => self.on_step_exit(section, step),
            StepEvent::Progress(progress) => self.on_step_progress(section, progress),
        }
    }

    /// A step became current
    pub fn on_step_enter(&self, section_id: &SectionId, step: &StepTransition) {
        if self.suppressed(section_id, "enter", step.index) {
            return;
        }
        let Some(section) = self.step_section(section_id, step.index) else {
            return;
        };

        self.state.set_position(section_id, step.index);
        let resolved = resolve(section, step.index, 0.0);

        let graphic = self.naming.graphic(section_id);
        let container = self.naming.graphic_container(section_id);
        self.surface.set_active(&step.element, true);
        self.surface.set_active(&container, true);
        self.update_graphic_text(section, step.index);
        self.surface
            .apply_graphic_style(&graphic, &resolved.trigger, &resolved.state, 0.0);

        debug!(
            section = %section_id,
            index = step.index,
            direction = %step.direction,
            "Narration activated"
        );

        section
            .config
            .behavior
            .on_activate_narration(&NarrationPayload {
                index: step.index,
                progress: 0.0,
                element: &step.element,
                trigger: &resolved.trigger,
                state: &resolved.state,
                direction: Some(step.direction),
                graphic_id: &graphic,
                graphic_container_id: &container,
                section,
            });
    }

    /// A step stopped being current
    ///
    /// The graphic container is only deactivated when leaving the section in
    /// the direction of travel: past the last block going down, or past the
    /// first block going up.
    pub fn on_step_exit(&self, section_id: &SectionId, step: &StepTransition) {
        if self.suppressed(section_id, "exit", step.index) {
            return;
        }
        let Some(section) = self.step_section(section_id, step.index) else {
            return;
        };

        self.surface.set_active(&step.element, false);

        let leaving_section = match step.direction {
            Direction::Down => section.last_index() == Some(step.index),
            Direction::Up => step.index == 0,
        };
        if leaving_section {
            self.surface
                .set_active(&self.naming.graphic_container(section_id), false);
        }

        debug!(
            section = %section_id,
            index = step.index,
            direction = %step.direction,
            leaving_section,
            "Narration exited"
        );
    }

    /// Progress through a step changed
    ///
    /// The observer's reported progress is ignored; progress is recomputed
    /// from the element geometry against the trigger offset.
    pub fn on_step_progress(&self, section_id: &SectionId, step: &StepProgress) {
        if self.suppressed(section_id, "progress", step.index) {
            return;
        }
        let Some(section) = self.step_section(section_id, step.index) else {
            return;
        };

        let rect = step
            .scroll_progress_element
            .as_ref()
            .and_then(|el| self.surface.element_rect(el))
            .or_else(|| self.surface.element_rect(&step.element));
        let Some(rect) = rect else {
            warn!(
                section = %section_id,
                element = %step.element,
                "No geometry for progress element, skipping"
            );
            return;
        };

        let progress = progress_through_trigger(rect, self.surface.viewport_height());
        let resolved = resolve(section, step.index, progress);

        let graphic = self.naming.graphic(section_id);
        let container = self.naming.graphic_container(section_id);
        self.surface
            .apply_graphic_style(&graphic, &resolved.trigger, &resolved.state, progress);

        trace!(section = %section_id, index = step.index, progress, "Narration progress");

        section.config.behavior.on_scroll(&NarrationPayload {
            index: step.index,
            progress,
            element: &step.element,
            trigger: &resolved.trigger,
            state: &resolved.state,
            direction: None,
            graphic_id: &graphic,
            graphic_container_id: &container,
            section,
        });
    }

    fn suppressed(&self, section: &SectionId, kind: &str, index: usize) -> bool {
        let disabled = self.state.triggers_disabled();
        if disabled {
            trace!(section = %section, kind, index, "Step event dropped during programmatic scroll");
        }
        disabled
    }

    fn step_section(&self, section_id: &SectionId, index: usize) -> Option<&Section> {
        let Some(section) = self.sections.get(section_id) else {
            warn!(section = %section_id, "Step event for unknown section");
            return None;
        };
        if index >= section.len() {
            warn!(
                section = %section_id,
                index,
                len = section.len(),
                "Step event index out of range"
            );
            return None;
        }
        Some(section)
    }

    fn update_graphic_text(&self, section: &Section, index: usize) {
        let Some(narration) = section.narration(index) else {
            return;
        };
        let id = section.id();
        self.surface.set_text(
            &self.naming.graphic_title(id),
            narration.graph_title.as_deref().unwrap_or(""),
        );
        self.surface.set_text(
            &self.naming.graphic_caption(id),
            narration.graph_caption.as_deref().unwrap_or(""),
        );
    }
}

impl std::fmt::Debug for StepEventHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEventHandlers")
            .field("sections", &self.sections.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

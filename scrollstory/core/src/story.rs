//! Story Orchestration
//!
//! [`StoryBuilder`] validates section configuration up front; [`Story::render`]
//! loads narration, builds every section on the surface, wires one observer
//! per section to the shared [`StepEventHandlers`], and hands back a
//! [`RenderedStory`] that owns every subscription it created.
//!
//! # Task Layout
//!
//! ```text
//!   StepObserver (per section) ──events──▶ pump task ──▶ StepEventHandlers
//!   InputSource ──────────────────input──▶ input pump ─┬▶ NavigationController (one task per command)
//!                                                      └▶ relayout + observer resize + on_resize
//! ```
//!
//! Dropping the [`RenderedStory`] aborts the pumps and tears the observers down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::config::StorySettings;
use crate::error::{NavigationError, StoryError};
use crate::events::StepEvent;
use crate::handlers::StepEventHandlers;
use crate::input::{command_for_key, SurfaceInput};
use crate::model::{validate_configs, Section, SectionConfig, SectionId, SectionList};
use crate::naming::{ElementId, NamingStrategy};
use crate::navigation::{NarrationTarget, NavigationController, NavigationOutcome};
use crate::source::NarrationSource;
use crate::state::{NavigationState, Position};
use crate::surface::{
    InputSource, ObserverHandle, ObserverSetup, ScrollDriver, ScrollOptions, StepObserver,
    StorySurface,
};
use crate::trigger::TRIGGER_OFFSET;

/// Everything outside the engine that a story talks to
#[derive(Clone)]
pub struct Collaborators {
    /// Visual layer
    pub surface: Arc<dyn StorySurface>,
    /// Page scrolling
    pub driver: Arc<dyn ScrollDriver>,
    /// Step observation
    pub observer: Arc<dyn StepObserver>,
    /// Narration loading
    pub source: Arc<dyn NarrationSource>,
    /// Keyboard and resize input, if the surface has any
    pub input: Option<Arc<dyn InputSource>>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("input", &self.input.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`Story`]
pub struct StoryBuilder {
    collaborators: Collaborators,
    sections: Vec<SectionConfig>,
    naming: Option<Arc<dyn NamingStrategy>>,
    settings: StorySettings,
}

impl StoryBuilder {
    /// Start a builder over the given collaborators
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            collaborators,
            sections: Vec::new(),
            naming: None,
            settings: StorySettings::default(),
        }
    }

    /// Append a section
    #[must_use]
    pub fn section(mut self, config: SectionConfig) -> Self {
        self.sections.push(config);
        self
    }

    /// Append several sections, in order
    #[must_use]
    pub fn sections(mut self, configs: impl IntoIterator<Item = SectionConfig>) -> Self {
        self.sections.extend(configs);
        self
    }

    /// Use a custom naming strategy instead of the configured prefix
    #[must_use]
    pub fn naming(mut self, naming: Arc<dyn NamingStrategy>) -> Self {
        self.naming = Some(naming);
        self
    }

    /// Use these settings instead of the defaults
    #[must_use]
    pub fn settings(mut self, settings: StorySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate section configuration
    ///
    /// # Errors
    ///
    /// Returns [`StoryError::NoSections`], [`StoryError::MalformedSectionId`]
    /// or [`StoryError::DuplicateSection`].
    pub fn build(self) -> Result<Story, StoryError> {
        validate_configs(&self.sections)?;
        let naming: Arc<dyn NamingStrategy> = match self.naming {
            Some(naming) => naming,
            None => Arc::new(self.settings.naming()),
        };
        Ok(Story {
            collaborators: self.collaborators,
            configs: self.sections,
            naming,
            settings: self.settings,
        })
    }
}

/// A validated story, ready to render
pub struct Story {
    collaborators: Collaborators,
    configs: Vec<SectionConfig>,
    naming: Arc<dyn NamingStrategy>,
    settings: StorySettings,
}

impl std::fmt::Debug for StoryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoryBuilder")
            .field("sections", &self.sections)
            .field("custom_naming", &self.naming.is_some())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for Story {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Story")
            .field("sections", &self.configs)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Story {
    /// Start building a story
    pub fn builder(collaborators: Collaborators) -> StoryBuilder {
        StoryBuilder::new(collaborators)
    }

    /// Section identifiers, in story order
    pub fn section_ids(&self) -> impl Iterator<Item = &SectionId> {
        self.configs.iter().map(|c| &c.id)
    }

    /// Load narration, build every section and start observing
    ///
    /// # Errors
    ///
    /// Fails if narration cannot be loaded or is invalid, if a graphic cannot
    /// be built, or if the surface or observer reject a section. Anything
    /// already started is torn down before the error is returned.
    pub async fn render(self) -> Result<RenderedStory, StoryError> {
        let Story {
            collaborators,
            configs,
            naming,
            settings,
        } = self;

        let sections = load_sections(collaborators.source.as_ref(), configs).await?;
        let sections = Arc::new(SectionList::new(sections)?);
        let state = Arc::new(NavigationState::new());
        let handlers = Arc::new(StepEventHandlers::new(
            Arc::clone(&sections),
            state,
            Arc::clone(&collaborators.surface),
            Arc::clone(&naming),
        ));
        let controller = Arc::new(NavigationController::new(
            Arc::clone(&handlers),
            Arc::clone(&collaborators.driver),
            settings.scroll_options(),
        ));

        let mut runtime = HashMap::new();
        let mut tasks = Vec::new();
        if let Err(e) = bind_sections(
            &handlers,
            collaborators.observer.as_ref(),
            &mut runtime,
            &mut tasks,
        ) {
            teardown_parts(&runtime, &tasks);
            return Err(e);
        }
        let runtime = Arc::new(runtime);

        if let Some(input) = &collaborators.input {
            if !settings.keyboard {
                debug!("Keyboard navigation disabled");
            }
            tasks.push(tokio::spawn(input_pump(
                input.subscribe(),
                settings.keyboard,
                Arc::clone(&controller),
                Arc::clone(&handlers),
                Arc::clone(&runtime),
            )));
        } else {
            debug!("No input source, keyboard navigation and resize handling unavailable");
        }

        info!(
            sections = sections.len(),
            steps = sections.step_count(),
            "Story rendered"
        );

        Ok(RenderedStory {
            controller,
            handlers,
            runtime,
            tasks,
            torn_down: AtomicBool::new(false),
        })
    }
}

async fn load_sections(
    source: &dyn NarrationSource,
    configs: Vec<SectionConfig>,
) -> Result<Vec<Section>, StoryError> {
    try_join_all(configs.into_iter().map(|config| async move {
        let narration = source
            .load_narration(&config.id)
            .await
            .map_err(|source| StoryError::NarrationLoad {
                section: config.id.clone(),
                source,
            })?;
        debug!(section = %config.id, blocks = narration.len(), "Narration loaded");
        Ok::<_, StoryError>(Section::new(config, narration))
    }))
    .await
}

fn bind_sections(
    handlers: &Arc<StepEventHandlers>,
    observer: &dyn StepObserver,
    runtime: &mut HashMap<SectionId, SectionRuntime>,
    tasks: &mut Vec<JoinHandle<()>>,
) -> Result<(), StoryError> {
    let naming = handlers.naming();
    let surface = handlers.surface();

    for section in handlers.sections().iter() {
        let id = section.id();
        surface.build_section(section, naming.as_ref())?;

        let graphic = naming.graphic(id);
        section
            .config
            .behavior
            .build_graph(&graphic, section)
            .map_err(|source| StoryError::GraphBuild {
                section: id.clone(),
                source,
            })?;

        let steps: Vec<ElementId> = (0..section.len()).map(|i| naming.step(id, i)).collect();
        let binding = observer.setup(ObserverSetup {
            section: id.clone(),
            steps: steps.clone(),
            container: naming.story_container(),
            graphic: graphic.clone(),
            offset: TRIGGER_OFFSET,
            progress: true,
        })?;

        tasks.push(tokio::spawn(section_pump(
            id.clone(),
            binding.events,
            Arc::clone(handlers),
        )));
        runtime.insert(
            id.clone(),
            SectionRuntime {
                graphic,
                graphic_container: naming.graphic_container(id),
                steps,
                observer: binding.handle,
            },
        );
        debug!(section = %id, steps = section.len(), "Section bound");
    }
    Ok(())
}

async fn section_pump(
    section: SectionId,
    mut events: mpsc::UnboundedReceiver<StepEvent>,
    handlers: Arc<StepEventHandlers>,
) {
    while let Some(event) = events.recv().await {
        handlers.dispatch(&section, &event);
    }
    debug!(section = %section, "Observer stream closed");
}

async fn input_pump(
    mut input: mpsc::UnboundedReceiver<SurfaceInput>,
    keyboard: bool,
    controller: Arc<NavigationController>,
    handlers: Arc<StepEventHandlers>,
    runtime: Arc<HashMap<SectionId, SectionRuntime>>,
) {
    // Navigation runs on its own tasks so a press during a scroll reaches
    // the controller and is rejected there.
    let mut navigation = JoinSet::new();

    loop {
        tokio::select! {
            received = input.recv() => {
                let Some(received) = received else { break };
                match received {
                    SurfaceInput::Key { key, focus } => {
                        if !keyboard {
                            continue;
                        }
                        let Some(command) = command_for_key(key, focus) else {
                            continue;
                        };
                        let controller = Arc::clone(&controller);
                        navigation.spawn(async move {
                            match controller.execute(command).await {
                                Ok(_) => {}
                                Err(NavigationError::ScrollInFlight) => {
                                    warn!(?command, "Key ignored: scroll already in flight");
                                }
                                Err(e) => warn!(?command, error = %e, "Keyboard navigation failed"),
                            }
                        });
                    }
                    SurfaceInput::Resized { width, height } => {
                        debug!(width, height, "Viewport resized");
                        relayout(&handlers, &runtime);
                    }
                }
            }
            Some(_) = navigation.join_next(), if !navigation.is_empty() => {}
        }
    }
    debug!("Input stream closed");
}

fn relayout(handlers: &StepEventHandlers, runtime: &HashMap<SectionId, SectionRuntime>) {
    let naming = handlers.naming();
    for section in handlers.sections().iter() {
        handlers.surface().relayout_section(section, naming.as_ref());
        if let Some(bound) = runtime.get(section.id()) {
            bound.observer.resize();
        }
        section.config.behavior.on_resize(section);
    }
}

fn teardown_parts(runtime: &HashMap<SectionId, SectionRuntime>, tasks: &[JoinHandle<()>]) {
    for task in tasks {
        task.abort();
    }
    for bound in runtime.values() {
        bound.observer.teardown();
    }
}

/// Runtime state the engine created for one section
pub struct SectionRuntime {
    graphic: ElementId,
    graphic_container: ElementId,
    steps: Vec<ElementId>,
    observer: Box<dyn ObserverHandle>,
}

impl SectionRuntime {
    /// The graphic element handed to `build_graph`
    #[must_use]
    pub fn graphic(&self) -> &ElementId {
        &self.graphic
    }

    /// The graphic's container
    #[must_use]
    pub fn graphic_container(&self) -> &ElementId {
        &self.graphic_container
    }

    /// Observed step elements, in narration order
    #[must_use]
    pub fn steps(&self) -> &[ElementId] {
        &self.steps
    }
}

impl std::fmt::Debug for SectionRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionRuntime")
            .field("graphic", &self.graphic)
            .field("graphic_container", &self.graphic_container)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

/// A story on screen
///
/// Owns the observer subscriptions and pump tasks; they end on
/// [`RenderedStory::teardown`] or when this value is dropped.
pub struct RenderedStory {
    controller: Arc<NavigationController>,
    handlers: Arc<StepEventHandlers>,
    runtime: Arc<HashMap<SectionId, SectionRuntime>>,
    tasks: Vec<JoinHandle<()>>,
    torn_down: AtomicBool,
}

impl RenderedStory {
    /// Shared navigation controller
    #[must_use]
    pub fn controller(&self) -> Arc<NavigationController> {
        Arc::clone(&self.controller)
    }

    /// The story's sections, with narration
    #[must_use]
    pub fn sections(&self) -> &Arc<SectionList> {
        self.handlers.sections()
    }

    /// Current position
    #[must_use]
    pub fn position(&self) -> Position {
        self.controller.position()
    }

    /// Runtime state for a section
    #[must_use]
    pub fn runtime(&self, section: &SectionId) -> Option<&SectionRuntime> {
        self.runtime.get(section)
    }

    /// See [`NavigationController::scroll_to`]
    ///
    /// # Errors
    ///
    /// Propagates the controller's errors.
    pub async fn scroll_to(
        &self,
        section: &SectionId,
        target: impl Into<NarrationTarget>,
        options: Option<ScrollOptions>,
    ) -> Result<NavigationOutcome, NavigationError> {
        self.controller.scroll_to(section, target, options).await
    }

    /// See [`NavigationController::scroll_to_next_narration`]
    ///
    /// # Errors
    ///
    /// Propagates the controller's errors.
    pub async fn scroll_to_next_narration(
        &self,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        self.controller.scroll_to_next_narration().await
    }

    /// See [`NavigationController::scroll_to_previous_narration`]
    ///
    /// # Errors
    ///
    /// Propagates the controller's errors.
    pub async fn scroll_to_previous_narration(
        &self,
    ) -> Result<Option<NavigationOutcome>, NavigationError> {
        self.controller.scroll_to_previous_narration().await
    }

    /// Re-lay out every section after the viewport changed
    pub fn resize(&self) {
        relayout(&self.handlers, &self.runtime);
    }

    /// Stop observing and stop handling input; idempotent
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        teardown_parts(&self.runtime, &self.tasks);
        info!("Story torn down");
    }

    /// Whether [`RenderedStory::teardown`] has run
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }
}

impl Drop for RenderedStory {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for RenderedStory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedStory")
            .field("controller", &self.controller)
            .field("runtime", &self.runtime)
            .field("torn_down", &self.is_torn_down())
            .finish_non_exhaustive()
    }
}

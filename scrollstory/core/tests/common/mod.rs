//! Shared test surface: an in-memory page that implements every collaborator
//! trait, plus a behavior that records its callbacks.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

use scrollstory_core::{
    Collaborators, DefaultNaming, Direction, ElementId, ElementRect, InputSource, NamingStrategy,
    Narration, NarrationPayload, ObserverBinding, ObserverHandle, ObserverSetup, ScrollDriver,
    ScrollOptions, Section, SectionBehavior, SectionConfig, SectionId, StaticNarration,
    StepEvent, StepObserver, StorySurface, SurfaceError, SurfaceInput, Trigger,
};

/// Spacing between narration blocks on the mock page
pub const BLOCK_SPACING: f64 = 100.0;
/// Height of every narration block
pub const BLOCK_HEIGHT: f64 = 40.0;
/// Mock viewport height
pub const VIEWPORT: f64 = 200.0;

#[derive(Default)]
struct Layout {
    cursor: f64,
    rects: HashMap<ElementId, (f64, f64)>,
    active: HashSet<ElementId>,
    text: HashMap<ElementId, String>,
    styles: Vec<(ElementId, Trigger, f64)>,
    relayouts: usize,
}

/// In-memory page
#[derive(Default)]
pub struct MockPage {
    layout: Mutex<Layout>,
    offset: Mutex<f64>,
    scrolls: Mutex<Vec<(ElementId, ScrollOptions)>>,
    scrolls_started: AtomicUsize,
    hold_scrolls: AtomicBool,
    release: Notify,
    fail_next_scroll: AtomicBool,
    fail_observer_for: Mutex<Option<SectionId>>,
    observers: Mutex<HashMap<SectionId, mpsc::UnboundedSender<StepEvent>>>,
    input: Mutex<Option<mpsc::UnboundedSender<SurfaceInput>>>,
    pub observer_resizes: Arc<AtomicUsize>,
    pub observer_teardowns: Arc<AtomicUsize>,
}

impl MockPage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn collaborators(self: &Arc<Self>, source: StaticNarration) -> Collaborators {
        Collaborators {
            surface: self.clone(),
            driver: self.clone(),
            observer: self.clone(),
            source: Arc::new(source),
            input: Some(self.clone()),
        }
    }

    pub fn offset(&self) -> f64 {
        *self.offset.lock()
    }

    pub fn set_offset(&self, offset: f64) {
        *self.offset.lock() = offset;
    }

    pub fn is_active(&self, element: &ElementId) -> bool {
        self.layout.lock().active.contains(element)
    }

    pub fn text(&self, element: &ElementId) -> Option<String> {
        self.layout.lock().text.get(element).cloned()
    }

    pub fn styles(&self) -> Vec<(ElementId, Trigger, f64)> {
        self.layout.lock().styles.clone()
    }

    pub fn relayouts(&self) -> usize {
        self.layout.lock().relayouts
    }

    pub fn page_top(&self, element: &ElementId) -> Option<f64> {
        self.layout.lock().rects.get(element).map(|(top, _)| *top)
    }

    pub fn scrolls(&self) -> Vec<(ElementId, ScrollOptions)> {
        self.scrolls.lock().clone()
    }

    pub fn scrolls_started(&self) -> usize {
        self.scrolls_started.load(Ordering::SeqCst)
    }

    /// Make scrolls wait until [`MockPage::release`] is called
    pub fn hold_scrolls(&self) {
        self.hold_scrolls.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.hold_scrolls.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub fn fail_next_scroll(&self) {
        self.fail_next_scroll.store(true, Ordering::SeqCst);
    }

    pub fn fail_observer_for(&self, section: &str) {
        *self.fail_observer_for.lock() = Some(SectionId::from(section));
    }

    /// Deliver an observer event as if the page had scrolled organically
    pub fn emit(&self, section: &str, event: StepEvent) {
        if let Some(tx) = self.observers.lock().get(&SectionId::from(section)) {
            let _ = tx.send(event);
        }
    }

    pub fn send_input(&self, input: SurfaceInput) {
        if let Some(tx) = self.input.lock().as_ref() {
            let _ = tx.send(input);
        }
    }
}

impl StorySurface for MockPage {
    fn build_section(
        &self,
        section: &Section,
        naming: &dyn NamingStrategy,
    ) -> Result<(), SurfaceError> {
        let mut layout = self.layout.lock();
        for block in &section.narration {
            layout.cursor += BLOCK_SPACING;
            let top = layout.cursor;
            layout
                .rects
                .insert(naming.step(section.id(), block.index), (top, BLOCK_HEIGHT));
            layout.rects.insert(
                naming.step_content(section.id(), block.index),
                (top, BLOCK_HEIGHT),
            );
        }
        Ok(())
    }

    fn relayout_section(&self, _section: &Section, _naming: &dyn NamingStrategy) {
        self.layout.lock().relayouts += 1;
    }

    fn set_active(&self, element: &ElementId, active: bool) {
        let mut layout = self.layout.lock();
        if active {
            layout.active.insert(element.clone());
        } else {
            layout.active.remove(element);
        }
    }

    fn clear_active(&self, _container: &ElementId) {
        self.layout.lock().active.clear();
    }

    fn set_text(&self, element: &ElementId, text: &str) {
        self.layout
            .lock()
            .text
            .insert(element.clone(), text.to_string());
    }

    fn apply_graphic_style(
        &self,
        graphic: &ElementId,
        trigger: &Trigger,
        _state: &scrollstory_core::StateMap,
        progress: f64,
    ) {
        self.layout
            .lock()
            .styles
            .push((graphic.clone(), trigger.clone(), progress));
    }

    fn element_rect(&self, element: &ElementId) -> Option<ElementRect> {
        let offset = self.offset();
        self.layout
            .lock()
            .rects
            .get(element)
            .map(|(top, height)| ElementRect {
                top: top - offset,
                height: *height,
            })
    }

    fn viewport_height(&self) -> f64 {
        VIEWPORT
    }
}

#[async_trait]
impl ScrollDriver for MockPage {
    async fn scroll_into_view(
        &self,
        target: &ElementId,
        options: &ScrollOptions,
    ) -> Result<(), SurfaceError> {
        self.scrolls_started.fetch_add(1, Ordering::SeqCst);
        self.scrolls.lock().push((target.clone(), options.clone()));

        if self.hold_scrolls.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_next_scroll.swap(false, Ordering::SeqCst) {
            return Err(SurfaceError::ScrollFailed("interrupted".to_string()));
        }

        let top = self
            .page_top(target)
            .ok_or_else(|| SurfaceError::MissingElement(target.clone()))?;
        let align = options.align.map_or(0.0, |a| a.top);
        self.set_offset((top - align * VIEWPORT).max(0.0));
        Ok(())
    }

    fn page_offset(&self) -> f64 {
        self.offset()
    }
}

struct MockObserverHandle {
    resizes: Arc<AtomicUsize>,
    teardowns: Arc<AtomicUsize>,
}

impl ObserverHandle for MockObserverHandle {
    fn resize(&self) {
        self.resizes.fetch_add(1, Ordering::SeqCst);
    }

    fn teardown(&self) {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
    }
}

impl StepObserver for MockPage {
    fn setup(&self, setup: ObserverSetup) -> Result<ObserverBinding, SurfaceError> {
        if self.fail_observer_for.lock().as_ref() == Some(&setup.section) {
            return Err(SurfaceError::ObserverSetup(format!(
                "cannot observe {}",
                setup.section
            )));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.lock().insert(setup.section, tx);
        Ok(ObserverBinding {
            events: rx,
            handle: Box::new(MockObserverHandle {
                resizes: Arc::clone(&self.observer_resizes),
                teardowns: Arc::clone(&self.observer_teardowns),
            }),
        })
    }
}

impl InputSource for MockPage {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SurfaceInput> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.input.lock() = Some(tx);
        rx
    }
}

/// One recorded callback
#[derive(Clone, Debug, PartialEq)]
pub struct Activation {
    pub section: SectionId,
    pub index: usize,
    pub direction: Option<Direction>,
    pub trigger: Trigger,
}

/// Behavior that records every callback
#[derive(Default)]
pub struct RecordingBehavior {
    pub activations: Mutex<Vec<Activation>>,
    pub scrolls: Mutex<Vec<(usize, f64)>>,
    pub resizes: AtomicUsize,
    pub graphs_built: AtomicUsize,
    pub fail_graph: bool,
}

impl RecordingBehavior {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail_graph: true,
            ..Self::default()
        })
    }

    pub fn activations(&self) -> Vec<Activation> {
        self.activations.lock().clone()
    }
}

impl SectionBehavior for RecordingBehavior {
    fn build_graph(&self, _graphic: &ElementId, section: &Section) -> anyhow::Result<()> {
        if self.fail_graph {
            anyhow::bail!("no chart data for {}", section.id());
        }
        self.graphs_built.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_activate_narration(&self, payload: &NarrationPayload<'_>) {
        self.activations.lock().push(Activation {
            section: payload.section.id().clone(),
            index: payload.index,
            direction: payload.direction,
            trigger: payload.trigger.clone(),
        });
    }

    fn on_scroll(&self, payload: &NarrationPayload<'_>) {
        self.scrolls.lock().push((payload.index, payload.progress));
    }

    fn on_resize(&self, _section: &Section) {
        self.resizes.fetch_add(1, Ordering::SeqCst);
    }
}

/// `intro` with two blocks, `body` with one (`x`), sharing one behavior
pub fn intro_body(behavior: &Arc<RecordingBehavior>) -> (Vec<SectionConfig>, StaticNarration) {
    let configs = vec![
        SectionConfig::new("intro", behavior.clone()),
        SectionConfig::new("body", behavior.clone()),
    ];
    let source = StaticNarration::new()
        .with_section(
            "intro",
            vec![
                Narration::new("Once upon a time")
                    .with_trigger("zoom-in")
                    .with_graph_text("Population", "1900-1950"),
                Narration::new("Then").with_id("then"),
            ],
        )
        .with_section("body", vec![Narration::new("The end").with_id("x")]);
    (configs, source)
}

/// Element names used by the default settings
pub fn naming() -> DefaultNaming {
    DefaultNaming::default()
}

/// Let spawned tasks run until `done` holds
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    assert!(done(), "condition not reached");
}

/// Let spawned tasks drain their queues
pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}

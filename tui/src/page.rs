//! Terminal Page
//!
//! The story as one long column of lines that scrolls past a fixed viewport.
//! The page is every collaborator the engine needs:
//!
//! - [`StorySurface`]: lays out narration, tracks active elements and
//!   graphic styles
//! - [`ScrollDriver`]: animates the viewport offset
//! - [`StepObserver`]: detects steps crossing the trigger line
//! - [`InputSource`]: forwards keys and resizes from the event loop
//!
//! Geometry is measured in terminal rows. Offsets are fractional while an
//! animation runs and rounded when drawn.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, trace};

use scrollstory_core::{
    alignment_hint, Direction, ElementId, ElementRect, InputSource, NamingStrategy, ObserverBinding,
    ObserverHandle, ObserverSetup, ScrollDriver, ScrollOptions, Section, SectionId, StateMap,
    StepEvent, StepObserver, StepProgress, StepTransition, StorySurface, SurfaceError,
    SurfaceInput, Trigger,
};

use crate::chart::ChartData;
use crate::scroll::{frame_offsets, Easing, FRAME_MS};

/// Rows reserved below the story for the status line
pub const STATUS_HEIGHT: u16 = 1;

/// Share of the terminal width given to narration
pub const NARRATION_PERCENT: u16 = 45;

const MIN_NARRATION_WIDTH: u16 = 24;
const TEXT_PADDING: u16 = 2;
const MIN_WRAP_WIDTH: usize = 8;

/// Width of the narration column for a terminal width
#[must_use]
pub fn narration_width(terminal_width: u16) -> u16 {
    let share = u32::from(terminal_width) * u32::from(NARRATION_PERCENT) / 100;
    u16::try_from(share)
        .unwrap_or(u16::MAX)
        .max(MIN_NARRATION_WIDTH)
        .min(terminal_width)
}

/// What a page line shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// Spacing
    Blank,
    /// Section heading
    Heading,
    /// Narration text
    Text,
}

/// One laid-out line of the page
#[derive(Clone, Debug, PartialEq)]
pub struct PageLine {
    /// Line content
    pub text: String,
    /// Line role
    pub kind: LineKind,
    /// Step element the line belongs to
    pub step: Option<ElementId>,
}

impl PageLine {
    fn blank(step: Option<&ElementId>) -> Self {
        Self {
            text: String::new(),
            kind: LineKind::Blank,
            step: step.cloned(),
        }
    }
}

/// Graphic state as last applied by the story
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphicView {
    /// Chart data installed by the section behavior
    pub chart: ChartData,
    /// Last applied trigger
    pub trigger: Trigger,
    /// Last applied narration state
    pub state: StateMap,
    /// Progress through the active step
    pub progress: f64,
}

/// The graphic panel to draw
#[derive(Clone, Debug, PartialEq)]
pub struct GraphicPanel {
    /// Section the graphic belongs to
    pub section: SectionId,
    /// Graphic title text
    pub title: String,
    /// Graphic caption text
    pub caption: String,
    /// Chart and style
    pub view: GraphicView,
}

/// A visible line with its highlight state
#[derive(Clone, Debug, PartialEq)]
pub struct ViewLine {
    /// The laid-out line
    pub line: PageLine,
    /// Whether its step is active
    pub active: bool,
}

/// Everything the renderer needs for one frame
#[derive(Clone, Debug, PartialEq)]
pub struct PageView {
    /// Lines inside the viewport
    pub lines: Vec<ViewLine>,
    /// Graphic of the active section
    pub graphic: Option<GraphicPanel>,
    /// Rounded viewport offset
    pub offset: usize,
    /// Largest possible offset
    pub max_offset: usize,
}

struct StepBlock {
    step: ElementId,
    content: ElementId,
    text: String,
    space_above_in_vh: f64,
}

struct PageSection {
    id: SectionId,
    blocks: Vec<StepBlock>,
    graphic: ElementId,
    container: ElementId,
    title: ElementId,
    caption: ElementId,
}

struct ObservedSection {
    id: u64,
    setup: ObserverSetup,
    events: mpsc::UnboundedSender<StepEvent>,
    inside: Vec<bool>,
}

struct PageInner {
    width: u16,
    height: u16,
    offset: f64,
    sections: Vec<PageSection>,
    lines: Vec<PageLine>,
    rects: HashMap<ElementId, (f64, f64)>,
    active: HashSet<ElementId>,
    text: HashMap<ElementId, String>,
    graphics: HashMap<ElementId, GraphicView>,
    observers: Vec<ObservedSection>,
    /// Terminal size the current lines were laid out for
    laid_out_for: Option<(u16, u16)>,
    layouts: u64,
}

impl PageInner {
    fn viewport_rows(&self) -> usize {
        usize::from(self.height.saturating_sub(STATUS_HEIGHT).max(1))
    }

    #[allow(clippy::cast_precision_loss)]
    fn viewport_height(&self) -> f64 {
        self.viewport_rows() as f64
    }

    #[allow(clippy::cast_precision_loss)]
    fn max_offset(&self) -> f64 {
        self.lines.len().saturating_sub(self.viewport_rows()) as f64
    }

    fn layout(&mut self) {
        let vh = self.viewport_rows();
        let wrap_width = usize::from(narration_width(self.width).saturating_sub(TEXT_PADDING * 2))
            .max(MIN_WRAP_WIDTH);

        let mut lines = Vec::new();
        let mut rects = HashMap::new();
        let blanks = |lines: &mut Vec<PageLine>, n: usize, step: Option<&ElementId>| {
            lines.extend(std::iter::repeat_with(|| PageLine::blank(step)).take(n));
        };

        blanks(&mut lines, vh / 2, None);
        for section in &self.sections {
            lines.push(PageLine {
                text: section.id.to_string(),
                kind: LineKind::Heading,
                step: None,
            });
            blanks(&mut lines, 1, None);

            for block in &section.blocks {
                let step_top = lines.len();
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let space = (block.space_above_in_vh / 100.0 * vh as f64).round().max(0.0) as usize;
                blanks(&mut lines, space, Some(&block.step));

                let content_top = lines.len();
                let wrapped = textwrap::wrap(&block.text, wrap_width);
                if wrapped.is_empty() {
                    blanks(&mut lines, 1, Some(&block.step));
                }
                lines.extend(wrapped.into_iter().map(|text| PageLine {
                    text: text.into_owned(),
                    kind: LineKind::Text,
                    step: Some(block.step.clone()),
                }));
                let content_height = lines.len() - content_top;
                blanks(&mut lines, 1, Some(&block.step));

                #[allow(clippy::cast_precision_loss)]
                {
                    rects.insert(
                        block.step.clone(),
                        (step_top as f64, (lines.len() - step_top) as f64),
                    );
                    rects.insert(
                        block.content.clone(),
                        (content_top as f64, content_height as f64),
                    );
                }
            }
            blanks(&mut lines, 2, None);
        }
        blanks(&mut lines, vh, None);

        self.lines = lines;
        self.rects = rects;
        self.offset = self.offset.clamp(0.0, self.max_offset());
        self.laid_out_for = Some((self.width, self.height));
        self.layouts += 1;
    }

    /// Lay out again unless the lines already fit the current size
    fn ensure_layout(&mut self) -> bool {
        if self.laid_out_for == Some((self.width, self.height)) {
            return false;
        }
        self.layout();
        true
    }

    fn rect(&self, element: &ElementId) -> Option<ElementRect> {
        self.rects.get(element).map(|&(top, height)| ElementRect {
            top: top - self.offset,
            height,
        })
    }

    /// Move the viewport; `report` is false for programmatic scroll frames
    fn set_offset(&mut self, offset: f64, report: bool) {
        let previous = self.offset;
        self.offset = offset.clamp(0.0, self.max_offset());
        if (self.offset - previous).abs() > f64::EPSILON {
            self.observe(previous, None, report);
        }
    }

    /// Compare every observed step against the trigger line and report changes
    ///
    /// Unreported passes still track which steps are inside, so the next
    /// reported pass sees the right transitions.
    fn observe(&mut self, previous: f64, only: Option<u64>, report: bool) {
        let direction = Direction::from_offsets(previous, self.offset);
        let vh = self.viewport_height();
        let Self {
            observers,
            rects,
            offset,
            ..
        } = self;

        for observed in observers.iter_mut() {
            if only.is_some_and(|id| id != observed.id) {
                continue;
            }
            let line = vh * observed.setup.offset;
            let mut exits = Vec::new();
            let mut enters = Vec::new();
            let mut progress = Vec::new();

            for (index, step) in observed.setup.steps.iter().enumerate() {
                let Some(&(top, height)) = rects.get(step) else {
                    continue;
                };
                let top = top - *offset;
                let inside = top <= line && line < top + height;
                let was_inside = observed.inside.get(index).copied().unwrap_or(false);

                let transition = StepTransition {
                    element: step.clone(),
                    index,
                    direction,
                };
                if was_inside && !inside {
                    exits.push(StepEvent::Exit(transition));
                } else if inside && !was_inside {
                    enters.push(StepEvent::Enter(transition));
                }
                if inside && observed.setup.progress {
                    progress.push(StepEvent::Progress(StepProgress {
                        element: step.clone(),
                        scroll_progress_element: None,
                        index,
                        reported_progress: ((line - top) / height.max(1.0)).clamp(0.0, 1.0),
                    }));
                }
                if let Some(slot) = observed.inside.get_mut(index) {
                    *slot = inside;
                }
            }

            if !report {
                continue;
            }
            for event in exits.into_iter().chain(enters).chain(progress) {
                trace!(section = %observed.setup.section, kind = event.kind(), index = event.index(), "Step event");
                let _ = observed.events.send(event);
            }
        }
    }
}

/// The terminal page
pub struct Page {
    title: String,
    inner: Arc<Mutex<PageInner>>,
    input: Mutex<Option<mpsc::UnboundedSender<SurfaceInput>>>,
    next_observer: AtomicU64,
    manual_scrolls: AtomicU64,
}

impl Page {
    /// Create an empty page for a terminal of `width` x `height`
    pub fn new(title: impl Into<String>, width: u16, height: u16) -> Self {
        Self {
            title: title.into(),
            inner: Arc::new(Mutex::new(PageInner {
                width,
                height,
                offset: 0.0,
                sections: Vec::new(),
                lines: Vec::new(),
                rects: HashMap::new(),
                active: HashSet::new(),
                text: HashMap::new(),
                graphics: HashMap::new(),
                observers: Vec::new(),
                laid_out_for: None,
                layouts: 0,
            })),
            input: Mutex::new(None),
            next_observer: AtomicU64::new(0),
            manual_scrolls: AtomicU64::new(0),
        }
    }

    /// Story title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Record a new terminal size
    ///
    /// Lines are re-wrapped when the story re-lays out its sections.
    pub fn set_size(&self, width: u16, height: u16) {
        let mut inner = self.inner.lock();
        inner.width = width;
        inner.height = height;
    }

    /// Scroll by `rows` (positive = down), as the reader would by hand
    ///
    /// Cancels any programmatic scroll still animating.
    pub fn scroll_by(&self, rows: f64) {
        self.manual_scrolls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock();
        let target = inner.offset + rows;
        inner.set_offset(target, true);
    }

    /// Scroll to the top or bottom of the page by hand
    pub fn scroll_to_edge(&self, bottom: bool) {
        self.manual_scrolls.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock();
        let target = if bottom { inner.max_offset() } else { 0.0 };
        inner.set_offset(target, true);
    }

    /// Current viewport offset in rows
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.inner.lock().offset
    }

    /// Number of rows the story occupies
    #[must_use]
    pub fn viewport_rows(&self) -> usize {
        self.inner.lock().viewport_rows()
    }

    /// Whether an element is marked active
    #[must_use]
    pub fn is_active(&self, element: &ElementId) -> bool {
        self.inner.lock().active.contains(element)
    }

    /// Install chart data for a graphic
    pub fn install_chart(&self, graphic: &ElementId, chart: ChartData) {
        self.inner
            .lock()
            .graphics
            .entry(graphic.clone())
            .or_default()
            .chart = chart;
    }

    /// Current style of a graphic
    #[must_use]
    pub fn graphic(&self, graphic: &ElementId) -> Option<GraphicView> {
        self.inner.lock().graphics.get(graphic).cloned()
    }

    /// Send input to the story; `false` if nothing is subscribed
    pub fn forward(&self, input: SurfaceInput) -> bool {
        self.input
            .lock()
            .as_ref()
            .is_some_and(|tx| tx.send(input).is_ok())
    }

    /// Snapshot for drawing
    #[must_use]
    pub fn view(&self) -> PageView {
        let inner = self.inner.lock();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let offset = inner.offset.round().max(0.0) as usize;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_offset = inner.max_offset() as usize;

        let lines = inner
            .lines
            .iter()
            .skip(offset)
            .take(inner.viewport_rows())
            .map(|line| ViewLine {
                active: line
                    .step
                    .as_ref()
                    .is_some_and(|step| inner.active.contains(step)),
                line: line.clone(),
            })
            .collect();

        let graphic = inner
            .sections
            .iter()
            .find(|section| inner.active.contains(&section.container))
            .map(|section| GraphicPanel {
                section: section.id.clone(),
                title: inner.text.get(&section.title).cloned().unwrap_or_default(),
                caption: inner.text.get(&section.caption).cloned().unwrap_or_default(),
                view: inner.graphics.get(&section.graphic).cloned().unwrap_or_default(),
            });

        PageView {
            lines,
            graphic,
            offset,
            max_offset,
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Page")
            .field("title", &self.title)
            .field("size", &(inner.width, inner.height))
            .field("offset", &inner.offset)
            .field("lines", &inner.lines.len())
            .finish_non_exhaustive()
    }
}

impl StorySurface for Page {
    fn build_section(
        &self,
        section: &Section,
        naming: &dyn NamingStrategy,
    ) -> Result<(), SurfaceError> {
        let id = section.id();
        let blocks = section
            .narration
            .iter()
            .map(|narration| StepBlock {
                step: naming.step(id, narration.index),
                content: naming.step_content(id, narration.index),
                text: narration.text.clone(),
                space_above_in_vh: narration.space_above_in_vh,
            })
            .collect();

        let mut inner = self.inner.lock();
        inner.sections.push(PageSection {
            id: id.clone(),
            blocks,
            graphic: naming.graphic(id),
            container: naming.graphic_container(id),
            title: naming.graphic_title(id),
            caption: naming.graphic_caption(id),
        });
        inner.layout();
        debug!(section = %id, lines = inner.lines.len(), "Section laid out");
        Ok(())
    }

    /// The page is one column, so the first section to re-lay out after a
    /// resize re-wraps all of them and the rest find it up to date.
    fn relayout_section(&self, section: &Section, _naming: &dyn NamingStrategy) {
        let mut inner = self.inner.lock();
        if inner.ensure_layout() {
            trace!(
                section = %section.id(),
                lines = inner.lines.len(),
                layouts = inner.layouts,
                "Page re-laid out"
            );
        }
    }

    fn set_active(&self, element: &ElementId, active: bool) {
        let mut inner = self.inner.lock();
        if active {
            inner.active.insert(element.clone());
        } else {
            inner.active.remove(element);
        }
    }

    fn clear_active(&self, _container: &ElementId) {
        // The story container holds every element on the page
        self.inner.lock().active.clear();
    }

    fn set_text(&self, element: &ElementId, text: &str) {
        self.inner
            .lock()
            .text
            .insert(element.clone(), text.to_string());
    }

    fn apply_graphic_style(
        &self,
        graphic: &ElementId,
        trigger: &Trigger,
        state: &StateMap,
        progress: f64,
    ) {
        let mut inner = self.inner.lock();
        let view = inner.graphics.entry(graphic.clone()).or_default();
        view.trigger = trigger.clone();
        view.state = state.clone();
        view.progress = progress;
    }

    fn element_rect(&self, element: &ElementId) -> Option<ElementRect> {
        self.inner.lock().rect(element)
    }

    fn viewport_height(&self) -> f64 {
        self.inner.lock().viewport_height()
    }
}

#[async_trait]
impl ScrollDriver for Page {
    async fn scroll_into_view(
        &self,
        target: &ElementId,
        options: &ScrollOptions,
    ) -> Result<(), SurfaceError> {
        let (start, end) = {
            let inner = self.inner.lock();
            let &(top, height) = inner
                .rects
                .get(target)
                .ok_or_else(|| SurfaceError::MissingElement(target.clone()))?;
            let vh = inner.viewport_height();
            // Unaligned targets are centered on the trigger line
            let align = options
                .align
                .or_else(|| alignment_hint(0.0, height, vh))
                .map_or(0.0, |a| a.top);
            let end = (top - align * vh).clamp(0.0, inner.max_offset());
            (inner.offset, end)
        };

        let easing = Easing::from_name(options.easing.as_deref());
        let offsets = frame_offsets(start, end, options.duration_ms.unwrap_or(0), easing);
        debug!(%target, start, end, frames = offsets.len(), "Scrolling into view");

        let manual_scrolls = self.manual_scrolls.load(Ordering::SeqCst);
        let mut ticker = tokio::time::interval(Duration::from_millis(FRAME_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        for offset in offsets {
            ticker.tick().await;
            if self.manual_scrolls.load(Ordering::SeqCst) != manual_scrolls {
                return Err(SurfaceError::ScrollFailed(
                    "interrupted by manual scrolling".to_string(),
                ));
            }
            self.inner.lock().set_offset(offset, false);
        }
        Ok(())
    }

    fn page_offset(&self) -> f64 {
        self.offset()
    }
}

struct PageObserverHandle {
    inner: Arc<Mutex<PageInner>>,
    id: u64,
}

impl ObserverHandle for PageObserverHandle {
    fn resize(&self) {
        let mut inner = self.inner.lock();
        let offset = inner.offset;
        inner.observe(offset, Some(self.id), true);
    }

    fn teardown(&self) {
        self.inner.lock().observers.retain(|o| o.id != self.id);
    }
}

impl StepObserver for Page {
    fn setup(&self, setup: ObserverSetup) -> Result<ObserverBinding, SurfaceError> {
        if !(0.0..=1.0).contains(&setup.offset) {
            return Err(SurfaceError::ObserverSetup(format!(
                "trigger offset {} outside the viewport",
                setup.offset
            )));
        }
        let id = self.next_observer.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut inner = self.inner.lock();
        let offset = inner.offset;
        inner.observers.push(ObservedSection {
            id,
            inside: vec![false; setup.steps.len()],
            setup,
            events: tx,
        });
        inner.observe(offset, Some(id), true);

        Ok(ObserverBinding {
            events: rx,
            handle: Box::new(PageObserverHandle {
                inner: Arc::clone(&self.inner),
                id,
            }),
        })
    }
}

impl InputSource for Page {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<SurfaceInput> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.input.lock() = Some(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use scrollstory_core::{
        DefaultNaming, Narration, NoopBehavior, ScrollAlign, SectionConfig, TRIGGER_OFFSET,
    };

    use super::*;

    // 80x21 terminal: 20 story rows, trigger line at row 10
    fn page_with(blocks: &[&str]) -> (Page, Section, DefaultNaming) {
        let page = Page::new("test", 80, 21);
        let naming = DefaultNaming::default();
        let section = Section::new(
            SectionConfig::new("intro", Arc::new(NoopBehavior)),
            blocks.iter().map(|text| Narration::new(*text)).collect(),
        );
        page.build_section(&section, &naming).unwrap();
        (page, section, naming)
    }

    fn observe(page: &Page, section: &Section, naming: &DefaultNaming) -> mpsc::UnboundedReceiver<StepEvent> {
        let id = section.id();
        page.setup(ObserverSetup {
            section: id.clone(),
            steps: (0..section.len()).map(|i| naming.step(id, i)).collect(),
            container: naming.story_container(),
            graphic: naming.graphic(id),
            offset: TRIGGER_OFFSET,
            progress: false,
        })
        .unwrap()
        .events
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<StepEvent>) -> Vec<(&'static str, usize)> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| (e.kind(), e.index()))
            .collect()
    }

    #[test]
    fn test_narration_width() {
        assert_eq!(narration_width(100), 45);
        assert_eq!(narration_width(30), 24);
        assert_eq!(narration_width(10), 10);
    }

    #[test]
    fn test_layout_places_blocks_below_padding() {
        let (page, section, naming) = page_with(&["one", "two"]);
        let id = section.id();

        // 10 rows of top padding, heading, blank
        let first = page.element_rect(&naming.step(id, 0)).unwrap();
        assert_eq!(first.top, 12.0);
        assert_eq!(first.height, 2.0);

        let content = page.element_rect(&naming.step_content(id, 1)).unwrap();
        assert_eq!(content.top, 14.0);
        assert_eq!(content.height, 1.0);
    }

    #[test]
    fn test_space_above_pushes_block_down() {
        let page = Page::new("test", 80, 21);
        let naming = DefaultNaming::default();
        let section = Section::new(
            SectionConfig::new("intro", Arc::new(NoopBehavior)),
            vec![Narration::new("spaced").with_space_above(50.0)],
        );
        page.build_section(&section, &naming).unwrap();

        let step = page.element_rect(&naming.step(section.id(), 0)).unwrap();
        let content = page
            .element_rect(&naming.step_content(section.id(), 0))
            .unwrap();
        assert_eq!(step.top, 12.0);
        assert_eq!(content.top, 22.0);
    }

    #[test]
    fn test_long_text_wraps_to_column() {
        let text = "word ".repeat(40);
        let (page, section, naming) = page_with(&[text.as_str()]);

        let content = page
            .element_rect(&naming.step_content(section.id(), 0))
            .unwrap();
        assert!(content.height > 1.0);
    }

    #[test]
    fn test_rects_follow_offset() {
        let (page, section, naming) = page_with(&["one", "two"]);
        page.scroll_by(5.0);

        let first = page.element_rect(&naming.step(section.id(), 0)).unwrap();
        assert_eq!(first.top, 7.0);
        assert_eq!(page.page_offset(), 5.0);
    }

    #[test]
    fn test_observer_reports_crossings_in_order() {
        let (page, section, naming) = page_with(&["one", "two"]);
        let mut rx = observe(&page, &section, &naming);
        assert!(drain(&mut rx).is_empty());

        // Step 0 spans rows 12..14; the trigger line is row 10
        page.scroll_by(2.0);
        assert_eq!(drain(&mut rx), vec![("enter", 0)]);

        page.scroll_by(2.0);
        assert_eq!(drain(&mut rx), vec![("exit", 0), ("enter", 1)]);

        page.scroll_by(-2.0);
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[0], StepEvent::Exit(t) if t.index == 1 && t.direction == Direction::Up));
        assert!(matches!(&events[1], StepEvent::Enter(t) if t.index == 0 && t.direction == Direction::Up));
    }

    #[test]
    fn test_teardown_stops_events() {
        let (page, section, naming) = page_with(&["one"]);
        let id = section.id();
        let binding = page
            .setup(ObserverSetup {
                section: id.clone(),
                steps: vec![naming.step(id, 0)],
                container: naming.story_container(),
                graphic: naming.graphic(id),
                offset: TRIGGER_OFFSET,
                progress: true,
            })
            .unwrap();
        let mut events = binding.events;

        binding.handle.teardown();
        page.scroll_by(3.0);

        assert!(matches!(
            events.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }

    #[test]
    fn test_observer_rejects_offset_outside_viewport() {
        let (page, section, naming) = page_with(&["one"]);
        let result = page.setup(ObserverSetup {
            section: section.id().clone(),
            steps: vec![],
            container: naming.story_container(),
            graphic: naming.graphic(section.id()),
            offset: 1.5,
            progress: false,
        });
        assert!(matches!(result, Err(SurfaceError::ObserverSetup(_))));
    }

    #[tokio::test]
    async fn test_instant_scroll_into_view_with_alignment() {
        let (page, section, naming) = page_with(&["one", "two"]);
        let target = naming.step_content(section.id(), 1);

        page.scroll_into_view(
            &target,
            &ScrollOptions::default().with_align(Some(ScrollAlign { top: 0.25 })),
        )
        .await
        .unwrap();

        // content top at row 14, settled a quarter of 20 rows from the top
        assert_eq!(page.offset(), 9.0);
        assert_eq!(page.element_rect(&target).unwrap().top, 5.0);
    }

    #[tokio::test]
    async fn test_scroll_into_view_unknown_element() {
        let (page, _, _) = page_with(&["one"]);
        let err = page
            .scroll_into_view(&ElementId::new("nope"), &ScrollOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SurfaceError::MissingElement(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_animated_scroll_settles_on_target() {
        let (page, section, naming) = page_with(&["one", "two"]);
        let options = ScrollOptions {
            duration_ms: Some(160),
            easing: Some("linear".into()),
            ..ScrollOptions::default()
        };

        let target = naming.step_content(section.id(), 1);
        page.scroll_into_view(&target, &options).await.unwrap();

        // One-row block at row 14, centered on the trigger line at row 10
        assert!((page.offset() - 4.5).abs() < 1e-9);
        let rect = page.element_rect(&target).unwrap();
        assert!(rect.top < 10.0 && 10.0 < rect.top + rect.height);
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_scroll_interrupts_animation() {
        let (page, section, naming) = page_with(&["one", "two"]);
        let page = Arc::new(page);
        let target = naming.step_content(section.id(), 1);
        let options = ScrollOptions {
            duration_ms: Some(600),
            ..ScrollOptions::default()
        };

        let animation = tokio::spawn({
            let page = Arc::clone(&page);
            async move { page.scroll_into_view(&target, &options).await }
        });
        while page.offset() == 0.0 {
            tokio::task::yield_now().await;
        }
        page.scroll_by(-1.0);

        let result = animation.await.unwrap();
        assert!(matches!(result, Err(SurfaceError::ScrollFailed(_))));
    }

    #[test]
    fn test_view_shows_active_section_graphic() {
        let (page, section, naming) = page_with(&["one"]);
        let id = section.id();
        assert!(page.view().graphic.is_none());

        page.install_chart(&naming.graphic(id), ChartData::default());
        page.set_text(&naming.graphic_title(id), "Discharge");
        page.set_active(&naming.graphic_container(id), true);
        page.set_active(&naming.step(id, 0), true);
        page.scroll_by(10.0);

        let view = page.view();
        let graphic = view.graphic.unwrap();
        assert_eq!(graphic.section, *id);
        assert_eq!(graphic.title, "Discharge");
        assert!(view
            .lines
            .iter()
            .any(|l| l.active && l.line.text == "one"));

        page.clear_active(&naming.story_container());
        assert!(page.view().graphic.is_none());
    }

    #[test]
    fn test_relayout_runs_once_per_size() {
        let (page, intro, naming) = page_with(&["one", "two"]);
        let outro = Section::new(
            SectionConfig::new("outro", Arc::new(NoopBehavior)),
            vec![Narration::new("three")],
        );
        page.build_section(&outro, &naming).unwrap();
        let built = page.inner.lock().layouts;

        // Same size: nothing to re-wrap
        page.relayout_section(&intro, &naming);
        assert_eq!(page.inner.lock().layouts, built);

        page.set_size(40, 21);
        page.relayout_section(&intro, &naming);
        page.relayout_section(&outro, &naming);
        assert_eq!(page.inner.lock().layouts, built + 1);

        let content = page.element_rect(&naming.step_content(outro.id(), 0));
        assert!(content.is_some());
    }

    #[test]
    fn test_forward_without_subscriber() {
        let page = Page::new("test", 80, 24);
        assert!(!page.forward(SurfaceInput::Resized {
            width: 1,
            height: 1
        }));

        let mut rx = page.subscribe();
        assert!(page.forward(SurfaceInput::Resized {
            width: 1,
            height: 1
        }));
        assert!(rx.try_recv().is_ok());
    }
}

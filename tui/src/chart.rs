//! Section Charts
//!
//! Every section's graphic is a bar chart. Triggers pick the highlighted bar:
//! a raw trigger of the form `highlight:<label>`, or, for sections that convert
//! triggers, an object with a `highlight` field. Converted sections also carry
//! a `reveal` state that grows the bars with scroll progress.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use scrollstory_core::{
    ElementId, NarrationPayload, Section, SectionBehavior, StateMap, Trigger, TriggerContext,
};

use crate::page::Page;

const HIGHLIGHT_PREFIX: &str = "highlight:";

/// Bar chart data for one section
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Unit shown next to values
    #[serde(default)]
    pub unit: String,
    /// Bars, left to right
    #[serde(default)]
    pub bars: Vec<ChartBar>,
}

/// One bar
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    /// Bar label
    pub label: String,
    /// Bar value
    pub value: u64,
}

/// Label of the bar a trigger highlights, if any
#[must_use]
pub fn highlighted_label(trigger: &Trigger) -> Option<&str> {
    match trigger {
        Trigger::Raw(raw) => raw.strip_prefix(HIGHLIGHT_PREFIX).map(str::trim),
        Trigger::Object(value) => value.get("highlight").and_then(Value::as_str),
    }
}

/// Fraction of each bar to draw; 1 unless the state says otherwise
#[must_use]
pub fn reveal_fraction(state: &StateMap) -> f64 {
    state
        .get("reveal")
        .and_then(Value::as_f64)
        .map_or(1.0, |r| r.clamp(0.0, 1.0))
}

/// Section behavior that draws a bar chart onto the terminal page
pub struct ChartBehavior {
    page: Arc<Page>,
    chart: Option<ChartData>,
}

impl ChartBehavior {
    /// Behavior drawing `chart` (or an empty panel) onto `page`
    pub fn new(page: Arc<Page>, chart: Option<ChartData>) -> Self {
        Self { page, chart }
    }
}

impl SectionBehavior for ChartBehavior {
    fn build_graph(&self, graphic: &ElementId, section: &Section) -> anyhow::Result<()> {
        let chart = self.chart.clone().unwrap_or_default();
        if let Some(bar) = chart.bars.iter().find(|b| b.label.trim().is_empty()) {
            anyhow::bail!("bar with value {} in section {} has no label", bar.value, section.id());
        }
        tracing::debug!(section = %section.id(), bars = chart.bars.len(), "Chart built");
        self.page.install_chart(graphic, chart);
        Ok(())
    }

    fn convert_trigger(&self, raw: &str, ctx: TriggerContext) -> Trigger {
        let highlight = raw.strip_prefix(HIGHLIGHT_PREFIX).map(str::trim);
        Trigger::Object(json!({
            "highlight": highlight,
            "step": ctx.index,
        }))
    }

    fn narration_state(&self, index: usize, progress: f64) -> StateMap {
        let mut state = StateMap::new();
        state.insert("reveal".into(), json!(progress));
        state.insert("step".into(), json!(index));
        state
    }

    fn on_activate_narration(&self, payload: &NarrationPayload<'_>) {
        tracing::debug!(
            section = %payload.section.id(),
            index = payload.index,
            highlight = highlighted_label(payload.trigger),
            "Chart step activated"
        );
    }

    fn on_resize(&self, section: &Section) {
        tracing::trace!(section = %section.id(), "Chart re-laid out");
    }
}

//! Frame Rendering
//!
//! ```text
//! ┌──────────────────────────┬───────────────────────────────┐
//! │ narration column         │ ┌ graph title ──────────────┐ │
//! │                          │ │ bar chart                 │ │
//! │ ▌ active step            │ │ step progress gauge       │ │
//! │                          │ │ caption                   │ │
//! │                          │ └───────────────────────────┘ │
//! ├──────────────────────────┴───────────────────────────────┤
//! │ title · section #step · prompt or message               │
//! └──────────────────────────────────────────────────────────┘
//! ```

use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Gauge, Paragraph, Wrap};
use ratatui::Frame;

use scrollstory_core::Position;

use crate::chart::{highlighted_label, reveal_fraction};
use crate::page::{narration_width, GraphicPanel, PageView, STATUS_HEIGHT};
use crate::theme;
use crate::widgets::NarrationColumn;

/// What the status line shows besides the title and position
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusNote {
    /// Nothing
    #[default]
    None,
    /// The jump prompt is open with this input
    Prompt(String),
    /// A transient message
    Message(String),
    /// A transient error
    Error(String),
}

/// Draw one frame
pub fn draw(frame: &mut Frame, title: &str, view: &PageView, position: &Position, note: &StatusNote) {
    let [story, status] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(STATUS_HEIGHT)]).areas(frame.area());
    let [narration, graphic] = Layout::horizontal([
        Constraint::Length(narration_width(story.width)),
        Constraint::Min(0),
    ])
    .areas(story);

    frame.render_widget(NarrationColumn::new(&view.lines), narration);
    match &view.graphic {
        Some(panel) => draw_graphic(frame, graphic, panel),
        None => frame.render_widget(
            Paragraph::new("scroll or press space to begin")
                .alignment(Alignment::Center)
                .style(Style::default().fg(theme::DIM_GRAY)),
            Rect {
                y: graphic.y + graphic.height / 2,
                height: 1.min(graphic.height),
                ..graphic
            },
        ),
    }
    draw_status(frame, status, title, view, position, note);
}

fn draw_graphic(frame: &mut Frame, area: Rect, panel: &GraphicPanel) {
    let title = if panel.title.is_empty() {
        panel.section.to_string()
    } else {
        panel.title.clone()
    };
    let block = Block::bordered()
        .title(format!(" {title} "))
        .border_style(Style::default().fg(theme::BORDER));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [chart_area, gauge_area, caption_area] = Layout::vertical([
        Constraint::Min(3),
        Constraint::Length(1),
        Constraint::Length(2),
    ])
    .areas(inner);

    let view = &panel.view;
    let highlight = highlighted_label(&view.trigger);
    let reveal = reveal_fraction(&view.state);
    let max = view.chart.bars.iter().map(|b| b.value).max().unwrap_or(0);

    let bars: Vec<Bar> = view
        .chart
        .bars
        .iter()
        .map(|bar| {
            let color = if highlight == Some(bar.label.as_str()) {
                theme::BAR_HIGHLIGHT
            } else {
                theme::BAR
            };
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                clippy::cast_precision_loss
            )]
            let shown = (bar.value as f64 * reveal).round() as u64;
            Bar::default()
                .value(shown)
                .text_value(format!("{}{}", bar.value, view.chart.unit))
                .label(Line::from(bar.label.clone()))
                .style(Style::default().fg(color))
        })
        .collect();

    let count = u16::try_from(bars.len().max(1)).unwrap_or(u16::MAX);
    let bar_width = (chart_area.width / count).saturating_sub(1).clamp(1, 12);
    frame.render_widget(
        BarChart::default()
            .data(BarGroup::default().bars(&bars))
            .bar_width(bar_width)
            .bar_gap(1)
            .max(max.max(1)),
        chart_area,
    );

    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::default().fg(theme::GAUGE))
            .ratio(view.progress.clamp(0.0, 1.0))
            .label(format!("{:.0}%", view.progress.clamp(0.0, 1.0) * 100.0)),
        gauge_area,
    );

    frame.render_widget(
        Paragraph::new(panel.caption.as_str())
            .wrap(Wrap { trim: true })
            .style(Style::default().fg(theme::DIM_GRAY)),
        caption_area,
    );
}

fn draw_status(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    view: &PageView,
    position: &Position,
    note: &StatusNote,
) {
    let here = match (&position.section, position.narration_index) {
        (Some(section), Some(index)) => format!("{section} #{index}"),
        _ => "start".to_string(),
    };
    #[allow(clippy::cast_precision_loss)]
    let percent = if view.max_offset == 0 {
        100.0
    } else {
        view.offset as f64 / view.max_offset as f64 * 100.0
    };

    let mut spans = vec![
        Span::styled(format!(" {title} "), Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("· "),
        Span::raw(format!("{here} ")),
        Span::styled(
            format!("{percent:.0}% "),
            Style::default().fg(theme::DIM_GRAY),
        ),
    ];
    match note {
        StatusNote::None => spans.push(Span::styled(
            "· space/↑↓ step  g jump  q quit",
            Style::default().fg(theme::DIM_GRAY),
        )),
        StatusNote::Prompt(input) => spans.push(Span::raw(format!("· jump to: {input}▏"))),
        StatusNote::Message(message) => spans.push(Span::raw(format!("· {message}"))),
        StatusNote::Error(message) => spans.push(Span::styled(
            format!("· {message}"),
            Style::default().fg(theme::ERROR_RED),
        )),
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme::STATUS_BG).fg(theme::STATUS_FG)),
        area,
    );
}

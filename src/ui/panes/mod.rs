//! Pane painting
//!
//! Each pane paints one region of the [`Container`] and registers the
//! elements it drew in the container's diagram.
//!
//! # Pane Modules
//!
//! - [`source`]: Program code with the executing line marked
//! - [`stack`]: Frame boxes and their slots ([`stack::FrameRenderer`])
//! - [`heap`]: Heap boxes, flat or nested ([`heap::HeapRenderer`])
//! - [`terminal`]: Program output for the current step
//! - [`status`]: Step counter, notices and keybindings
//!
//! # Layout
//!
//! ```text
//! ┌ Code ──────┐ Frames      Objects
//! │ → 3 x = 1; │ ┌ main ──┐  ┌ list ┐
//! │            │ │ xs │ ● │──►│ 0 │ 1│
//! ├ Output ────┤ └────────┘  └──────┘
//! └────────────┘
//!  Step 2/9 | ...                      keys
//! ```
//!
//! Without code the diagram takes the full width and output sits below it.
//! `verticalStack` puts the heap below the frames instead of beside them.

pub mod heap;
pub mod source;
pub mod stack;
pub mod status;
pub mod terminal;

pub use heap::HeapRenderer;
pub use stack::FrameRenderer;

use super::container::Container;
use super::layout::ElementKey;
use super::theme::DEFAULT_THEME;
use crate::config::Options;
use crate::graph::{RenderGraph, RenderValue};
use crate::snapshot::Trace;
use std::borrow::Cow;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
};

/// Glyph marking a reference that a connector starts from
pub const ANCHOR: &str = "●";

/// Rows given to the output pane when it sits below the diagram
const OUTPUT_ROWS: u16 = 6;

/// Everything the panes need to paint one step
pub struct Scene<'a> {
    pub trace: &'a Trace,
    pub graph: &'a RenderGraph,
    pub options: &'a Options,
    pub step: usize,
    /// Steps the user can navigate to
    pub navigable: usize,
    pub failure: Option<&'a str>,
    pub notice: Option<&'a str>,
    pub playing: bool,
}

impl Scene<'_> {
    fn shows_code(&self) -> bool {
        !self.options.hide_code && self.trace.code().is_some()
    }

    fn current_line(&self) -> Option<u32> {
        self.trace.get(self.step).and_then(|step| step.line)
    }

    fn is_last(&self) -> bool {
        self.step + 1 >= self.navigable
    }

    fn output(&self) -> Cow<'_, str> {
        self.trace
            .visible_output(self.step, self.navigable, self.options.cumulative_mode)
    }
}

/// Screen regions for one paint pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Regions {
    pub code: Option<Rect>,
    pub output: Option<Rect>,
    pub stack: Option<Rect>,
    pub heap: Option<Rect>,
    pub status: Option<Rect>,
}

pub fn regions(area: Rect, scene: &Scene) -> Regions {
    let mut regions = Regions::default();

    let main = if scene.options.embedded_mode || area.height < 2 {
        area
    } else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(area);
        regions.status = Some(rows[1]);
        rows[0]
    };

    if scene.options.show_only_outputs {
        regions.output = Some(main);
        return regions;
    }

    let diagram = if scene.shows_code() {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(main);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);
        regions.code = Some(left[0]);
        regions.output = Some(left[1]);
        columns[1]
    } else {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(OUTPUT_ROWS)])
            .split(main);
        regions.output = Some(rows[1]);
        rows[0]
    };

    let (direction, constraints) = if scene.options.vertical_stack {
        (
            Direction::Vertical,
            [Constraint::Percentage(50), Constraint::Percentage(50)],
        )
    } else {
        (
            Direction::Horizontal,
            [Constraint::Percentage(35), Constraint::Percentage(65)],
        )
    };
    let parts = Layout::default()
        .direction(direction)
        .constraints(constraints)
        .split(diagram);
    regions.stack = Some(parts[0]);
    regions.heap = Some(parts[1]);
    regions
}

/// Paint every pane of `scene` into `container`
pub fn paint(container: &mut Container, scene: &Scene) {
    let area = container.area();
    let regions = regions(area, scene);
    let (buf, diagram) = container.begin_paint();

    if let Some(rect) = regions.code {
        source::paint(buf, rect, scene);
        diagram.register(ElementKey::CodePane, rect);
    }
    if let Some(rect) = regions.stack {
        FrameRenderer::new(scene.graph, scene.options).paint(buf, rect, diagram);
        diagram.register(ElementKey::StackPane, rect);
    }
    if let Some(rect) = regions.heap {
        HeapRenderer::new(scene.graph, scene.options).paint(buf, rect, diagram);
        diagram.register(ElementKey::HeapPane, rect);
    }
    if let Some(rect) = regions.output {
        terminal::paint(buf, rect, scene);
        diagram.register(ElementKey::OutputPane, rect);
    }
    if let Some(rect) = regions.status {
        status::paint(buf, rect, scene);
        diagram.register(ElementKey::StatusBar, rect);
    }

    container.finish_paint();
}

/// Rows needed to show the whole scene at `width` without clipping
pub fn content_height(scene: &Scene, width: u16) -> u16 {
    let chrome: u16 = if scene.options.embedded_mode { 0 } else { 1 };

    if scene.options.show_only_outputs {
        let lines = clamp_rows(scene.output().lines().count()).max(1);
        return lines.saturating_add(2).saturating_add(chrome);
    }

    let diagram_width = if scene.shows_code() {
        width.saturating_mul(3) / 5
    } else {
        width
    };
    let stack = FrameRenderer::new(scene.graph, scene.options).required_height();
    let heap_width = if scene.options.vertical_stack {
        diagram_width
    } else {
        diagram_width.saturating_mul(13) / 20
    };
    let heap = HeapRenderer::new(scene.graph, scene.options).required_height(heap_width);
    let diagram = if scene.options.vertical_stack {
        // Each half gets 50%, so the taller half decides
        stack.max(heap).saturating_mul(2)
    } else {
        stack.max(heap)
    };

    let main = if scene.shows_code() {
        let code_lines = clamp_rows(scene.trace.code().map_or(0, |code| code.lines().count()));
        // Code takes 70% of the left column
        let code_rows = u32::from(code_lines.saturating_add(2)) * 10 / 7;
        diagram.max(clamp_rows(code_rows as usize))
    } else {
        diagram.saturating_add(OUTPUT_ROWS)
    };
    main.saturating_add(chrome)
}

/// Row count clamped to what a buffer can hold
pub(crate) fn clamp_rows(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}

/// Text and style for a slot or field value
pub(crate) fn value_cell(value: &RenderValue, textual_labels: bool) -> (String, Style) {
    match value {
        RenderValue::Literal(text) | RenderValue::Inline { text, .. } => {
            let color = if text.starts_with('"') || text.starts_with('\'') {
                DEFAULT_THEME.string
            } else {
                DEFAULT_THEME.number
            };
            (text.clone(), Style::default().fg(color))
        }
        RenderValue::Reference { target, .. } => {
            let text = if textual_labels {
                target.label()
            } else {
                ANCHOR.to_string()
            };
            (text, Style::default().fg(DEFAULT_THEME.pointer))
        }
    }
}

/// Display width of a cell text, counted in characters
pub(crate) fn text_width(text: &str) -> u16 {
    text.chars().count().min(u16::MAX as usize) as u16
}

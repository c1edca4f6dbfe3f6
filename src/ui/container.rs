//! Host-sized drawing surface
//!
//! A [`Container`] is the cell grid the visualizer paints into. It keeps two
//! buffers: `base` holds the panes as painted, `surface` is `base` plus the
//! connectors drawn on top. Redrawing connectors always starts again from
//! `base`, so stale arrows never survive a redraw.

use super::layout::{Diagram, ElementKey};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    widgets::Widget,
};
use tracing::debug;

/// Size used when the host terminal cannot be queried
pub const DEFAULT_SIZE: (u16, u16) = (120, 40);

#[derive(Debug, Clone)]
pub struct Container {
    id: String,
    area: Rect,
    base: Buffer,
    surface: Buffer,
    diagram: Diagram,
    /// Area the current diagram was laid out for
    laid_out_for: Option<Rect>,
}

impl Container {
    pub fn new(id: impl Into<String>, width: u16, height: u16) -> Self {
        let area = Rect::new(0, 0, width, height);
        Container {
            id: id.into(),
            area,
            base: Buffer::empty(area),
            surface: Buffer::empty(area),
            diagram: Diagram::new(),
            laid_out_for: None,
        }
    }

    /// Container sized to the terminal the process runs in
    pub fn fit_to_host(id: impl Into<String>) -> Self {
        let (width, height) = match crossterm::terminal::size() {
            Ok(size) => size,
            Err(e) => {
                debug!(error = %e, "terminal size unavailable, using default");
                DEFAULT_SIZE
            }
        };
        Self::new(id, width, height)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn width(&self) -> u16 {
        self.area.width
    }

    pub fn height(&self) -> u16 {
        self.area.height
    }

    /// Change the size; positions are stale until the next paint
    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) == (self.area.width, self.area.height) {
            return;
        }
        debug!(container = %self.id, width, height, "container resized");
        self.area = Rect::new(0, 0, width, height);
        self.base.resize(self.area);
        self.surface.resize(self.area);
    }

    /// Whether the diagram was laid out for a different size than the current one
    pub fn is_stale(&self) -> bool {
        self.laid_out_for != Some(self.area)
    }

    /// Where an element was painted in the last layout pass
    pub fn position(&self, key: &ElementKey) -> Option<Rect> {
        self.diagram
            .get(key)
            .filter(|rect| self.area.intersection(*rect) == *rect)
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// Painted content including connectors
    pub fn buffer(&self) -> &Buffer {
        &self.surface
    }

    /// Clear both buffers and the diagram for a new paint pass
    pub(crate) fn begin_paint(&mut self) -> (&mut Buffer, &mut Diagram) {
        self.base = Buffer::empty(self.area);
        self.diagram.clear();
        (&mut self.base, &mut self.diagram)
    }

    /// Mark the paint pass as complete for the current size
    pub(crate) fn finish_paint(&mut self) {
        self.laid_out_for = Some(self.area);
        self.surface = self.base.clone();
    }

    /// Drop everything drawn over the painted panes and return the surface
    pub(crate) fn restore_base(&mut self) -> &mut Buffer {
        self.surface = self.base.clone();
        &mut self.surface
    }

    /// Symbol at a cell of the visible surface, blank when out of bounds
    pub fn symbol_at(&self, x: u16, y: u16) -> &str {
        self.surface
            .cell((x, y))
            .map(|cell| cell.symbol())
            .unwrap_or(" ")
    }

    /// Visible surface as plain text, trailing blanks trimmed
    pub fn to_text(&self) -> String {
        let mut lines: Vec<String> = (0..self.area.height)
            .map(|y| {
                let row: String = (0..self.area.width)
                    .map(|x| self.symbol_at(x, y))
                    .collect();
                row.trim_end().to_string()
            })
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }
        lines.join("\n")
    }
}

impl Widget for &Container {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = area.width.min(self.area.width);
        let height = area.height.min(self.area.height);
        for y in 0..height {
            for x in 0..width {
                let Some(source) = self.surface.cell((x, y)) else {
                    continue;
                };
                if let Some(target) = buf.cell_mut((area.x + x, area.y + y)) {
                    *target = source.clone();
                }
            }
        }
    }
}

//! Reference connectors
//!
//! [`ConnectorLayer`] draws one orthogonal connector per [`EdgeStyle::Arrow`]
//! edge, from the anchor cell right of a `●` to the border of the target box.
//! Positions are always read back from the [`Container`]'s last layout pass,
//! never cached across redraws.
//!
//! # Routing
//!
//! - Target to the right: run right, turn in a lane column just before the
//!   target, end in `►` against its left border.
//! - Target to the left or overlapping (back references, parent pointers):
//!   run right past the target, turn, come back and end in `◄` against its
//!   right border.
//!
//! Lanes come from the edge's position among the drawn edges, so the same
//! graph always routes the same way. Connectors only paint blank cells and
//! pass under boxes and text.

use super::container::Container;
use super::layout::ElementKey;
use super::theme::DEFAULT_THEME;
use crate::graph::{Edge, EdgeSource, EdgeStyle, EdgeTarget};
use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    style::Style,
};
use tracing::debug;

const ARROW_RIGHT: char = '►';
const ARROW_LEFT: char = '◄';
/// Distinct turn columns used before lanes repeat
const LANES: u16 = 3;

/// A routed connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    pub edge: Edge,
    /// First path cell, right of the source anchor
    pub start: Position,
    /// Arrow head cell, next to the target box
    pub end: Position,
    /// Every path cell with its glyph, arrow head last
    pub cells: Vec<(Position, char)>,
}

#[derive(Debug, Clone, Default)]
pub struct ConnectorLayer {
    edges: Vec<Edge>,
    connectors: Vec<Connector>,
}

impl ConnectorLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the edge set and draw it
    pub fn draw(&mut self, edges: &[Edge], container: &mut Container) {
        self.edges = edges.to_vec();
        self.redraw(container);
    }

    /// Drop drawn connectors and draw the current edges again from fresh positions
    pub fn redraw(&mut self, container: &mut Container) {
        let connectors: Vec<Connector> = self
            .edges
            .iter()
            .filter(|edge| edge.style == EdgeStyle::Arrow)
            .enumerate()
            .filter_map(|(lane, edge)| route(edge, lane, container))
            .collect();

        let skipped = self
            .edges
            .iter()
            .filter(|edge| edge.style == EdgeStyle::Arrow)
            .count()
            - connectors.len();

        let surface = container.restore_base();
        for connector in &connectors {
            paint(connector, surface);
        }
        debug!(
            drawn = connectors.len(),
            skipped,
            "connectors drawn"
        );
        self.connectors = connectors;
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    /// Start and end cells of every drawn connector, in draw order
    pub fn endpoints(&self) -> Vec<(Position, Position)> {
        self.connectors.iter().map(|c| (c.start, c.end)).collect()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.connectors.clear();
    }
}

fn source_anchor(source: &EdgeSource, container: &Container) -> Option<Position> {
    match source {
        EdgeSource::Slot { frame, slot } => {
            let rect = container.position(&ElementKey::Slot {
                frame: *frame,
                slot: *slot,
            })?;
            Some(Position::new(rect.right(), rect.y))
        }
        EdgeSource::Field { owner, field } => {
            let rect = container.position(&ElementKey::Field {
                owner: *owner,
                field: *field,
            })?;
            Some(Position::new(rect.right(), rect.y))
        }
        EdgeSource::Heap(id) => {
            let rect = container.position(&ElementKey::HeapBox(*id))?;
            Some(Position::new(rect.right(), rect.y + 1u16.min(rect.height.saturating_sub(1))))
        }
    }
}

fn target_rect(target: &EdgeTarget, container: &Container) -> Option<Rect> {
    match target {
        EdgeTarget::Heap(id) => container.position(&ElementKey::HeapBox(*id)),
        EdgeTarget::Frame(index) => container.position(&ElementKey::Frame(*index)),
    }
}

/// Route one edge; None when an endpoint is not laid out or cannot be reached
fn route(edge: &Edge, lane: usize, container: &Container) -> Option<Connector> {
    let start = source_anchor(&edge.source, container)?;
    let target = target_rect(&edge.target, container)?;
    let area = container.area();
    if area.width == 0 || start.x >= area.right() {
        return None;
    }
    let max_x = area.right() - 1;
    let lane = lane as u16 % LANES;
    let target_y = target.y + if target.height > 2 { 1 } else { 0 };

    let (end, head, turn_x) = if target.x >= start.x + 2 {
        let end = Position::new(target.x - 1, target_y);
        let turn_x = (end.x - 1).saturating_sub(lane).max(start.x);
        (end, ARROW_RIGHT, turn_x)
    } else {
        let end = Position::new(target.right(), target_y);
        let turn_x = (start.x.max(end.x + 1) + 1 + lane).min(max_x);
        if turn_x <= end.x {
            return None;
        }
        (end, ARROW_LEFT, turn_x)
    };
    let points = [
        start,
        Position::new(turn_x, start.y),
        Position::new(turn_x, target_y),
        end,
    ];

    let mut cells = rasterize(&points);
    cells.retain(|(p, _)| *p != end);
    cells.push((end, head));

    Some(Connector {
        edge: *edge,
        start,
        end,
        cells,
    })
}

/// Turn an axis-aligned polyline into glyph cells
fn rasterize(points: &[Position]) -> Vec<(Position, char)> {
    let mut points: Vec<Position> = points.to_vec();
    points.dedup();
    if points.len() == 1 {
        return vec![(points[0], '─')];
    }

    let mut cells = Vec::new();
    for i in 0..points.len() - 1 {
        let (a, b) = (points[i], points[i + 1]);
        let horizontal = a.y == b.y;
        let straight = if horizontal { '─' } else { '│' };
        for (k, p) in walk(a, b).into_iter().enumerate() {
            let glyph = if k == 0 && i > 0 {
                corner(points[i - 1], a, b)
            } else {
                straight
            };
            cells.push((p, glyph));
        }
    }

    let n = points.len();
    let last = points[n - 1];
    let glyph = if points[n - 2].y == last.y { '─' } else { '│' };
    cells.push((last, glyph));
    cells
}

/// Cells from `a` towards `b`, `b` excluded
fn walk(a: Position, b: Position) -> Vec<Position> {
    if a.y == b.y {
        if a.x <= b.x {
            (a.x..b.x).map(|x| Position::new(x, a.y)).collect()
        } else {
            ((b.x + 1)..=a.x).rev().map(|x| Position::new(x, a.y)).collect()
        }
    } else if a.y <= b.y {
        (a.y..b.y).map(|y| Position::new(a.x, y)).collect()
    } else {
        ((b.y + 1)..=a.y).rev().map(|y| Position::new(a.x, y)).collect()
    }
}

fn corner(previous: Position, at: Position, next: Position) -> char {
    let from_left = previous.x < at.x;
    let from_right = previous.x > at.x;
    let from_above = previous.y < at.y;
    let down = next.y > at.y;
    let up = next.y < at.y;
    let right = next.x > at.x;

    match () {
        _ if previous.y == at.y && next.y == at.y => '─',
        _ if previous.x == at.x && next.x == at.x => '│',
        _ if from_left && down => '┐',
        _ if from_left && up => '┘',
        _ if from_right && down => '┌',
        _ if from_right && up => '└',
        _ if from_above && right => '└',
        _ if from_above => '┘',
        _ if right => '┌',
        _ => '┐',
    }
}

fn paint(connector: &Connector, buf: &mut Buffer) {
    let style = Style::default().fg(DEFAULT_THEME.pointer);
    for (position, glyph) in &connector.cells {
        if let Some(cell) = buf.cell_mut(*position) {
            if cell.symbol() == " " {
                cell.set_char(*glyph).set_style(style);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeKind;
    use crate::memory::value::HeapId;

    fn slot_edge(style: EdgeStyle) -> Edge {
        Edge {
            source: EdgeSource::Slot { frame: 0, slot: 0 },
            target: EdgeTarget::Heap(HeapId(1)),
            kind: EdgeKind::Reference,
            style,
        }
    }

    fn container(target: Rect) -> Container {
        let mut container = Container::new("viz", 40, 10);
        {
            let (_, diagram) = container.begin_paint();
            diagram.register(ElementKey::Slot { frame: 0, slot: 0 }, Rect::new(5, 4, 1, 1));
            diagram.register(ElementKey::HeapBox(HeapId(1)), target);
        }
        container.finish_paint();
        container
    }

    #[test]
    fn test_arrow_ends_at_target_border() {
        let mut container = container(Rect::new(20, 1, 10, 5));
        let mut layer = ConnectorLayer::new();
        layer.draw(&[slot_edge(EdgeStyle::Arrow)], &mut container);

        assert_eq!(
            layer.endpoints(),
            vec![(Position::new(6, 4), Position::new(19, 2))]
        );
        assert_eq!(container.symbol_at(19, 2), "►");
        assert_eq!(container.symbol_at(6, 4), "─");
    }

    #[test]
    fn test_redraw_is_idempotent() {
        let mut container = container(Rect::new(20, 1, 10, 5));
        let mut layer = ConnectorLayer::new();
        layer.draw(&[slot_edge(EdgeStyle::Arrow)], &mut container);
        layer.redraw(&mut container);
        let first = layer.endpoints();
        let text = container.to_text();
        layer.redraw(&mut container);
        assert_eq!(layer.endpoints(), first);
        assert_eq!(container.to_text(), text);
    }

    #[test]
    fn test_back_reference_routes_around() {
        // Target left of the anchor
        let mut container = container(Rect::new(0, 0, 4, 3));
        let mut layer = ConnectorLayer::new();
        layer.draw(&[slot_edge(EdgeStyle::Arrow)], &mut container);
        let connector = &layer.connectors()[0];
        assert_eq!(connector.end, Position::new(4, 1));
        assert_eq!(connector.cells.last().unwrap().1, '◄');
    }

    #[test]
    fn test_unplaced_and_label_edges_are_skipped() {
        let mut container = Container::new("viz", 40, 10);
        container.begin_paint();
        container.finish_paint();
        let mut layer = ConnectorLayer::new();
        layer.draw(&[slot_edge(EdgeStyle::Arrow)], &mut container);
        assert!(layer.connectors().is_empty());

        let mut container = container_with_default();
        layer.draw(&[slot_edge(EdgeStyle::Label)], &mut container);
        assert!(layer.connectors().is_empty());
        assert_eq!(layer.edges().len(), 1);
    }

    fn container_with_default() -> Container {
        container(Rect::new(20, 1, 10, 5))
    }

    #[test]
    fn test_never_paints_over_content() {
        let mut container = Container::new("viz", 40, 10);
        {
            let (buf, diagram) = container.begin_paint();
            diagram.register(ElementKey::Slot { frame: 0, slot: 0 }, Rect::new(5, 4, 1, 1));
            diagram.register(ElementKey::HeapBox(HeapId(1)), Rect::new(20, 3, 10, 3));
            buf.set_string(10, 4, "X", Style::default());
        }
        container.finish_paint();
        let mut layer = ConnectorLayer::new();
        layer.draw(&[slot_edge(EdgeStyle::Arrow)], &mut container);
        assert_eq!(container.symbol_at(10, 4), "X");
        assert_eq!(container.symbol_at(11, 4), "─");
    }
}

//! Heap pane rendering
//!
//! Top-level boxes are laid out in columns by depth, depth 0 nearest the
//! frames. Within a column boxes stack top to bottom in display order, and a
//! box never starts above the box that first referenced it. Nested boxes are
//! drawn inside their parent, right below the field that claimed them.
//!
//! # Box Contents
//!
//! - Title: type label (when `includeTypes`) and `idN` (when `textualMemoryLabels`)
//! - One row per field: `key │ value`
//! - String, function, module and boxed-primitive boxes show a single row
//!   with no key

use super::{text_width, value_cell};
use crate::config::Options;
use crate::graph::{RenderBox, RenderGraph, RenderValue};
use crate::memory::value::HeapId;
use crate::ui::layout::{Diagram, ElementKey};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Widget},
};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

const SEPARATOR: &str = " │ ";
const MAX_BOX_WIDTH: u16 = 48;
/// Blank columns between depth columns, where connectors run
const COLUMN_GAP: u16 = 4;
/// Blank columns left of the first column, for arrow heads
const LEFT_MARGIN: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Size {
    width: u16,
    height: u16,
}

pub struct HeapRenderer<'a> {
    graph: &'a RenderGraph,
    options: &'a Options,
}

impl<'a> HeapRenderer<'a> {
    pub fn new(graph: &'a RenderGraph, options: &'a Options) -> Self {
        HeapRenderer { graph, options }
    }

    fn title(&self, b: &RenderBox) -> String {
        let mut parts = Vec::with_capacity(2);
        if let Some(label) = &b.label {
            parts.push(label.clone());
        }
        if self.options.textual_memory_labels {
            parts.push(b.id.label());
        }
        parts.join(" ")
    }

    fn key_width(b: &RenderBox) -> u16 {
        b.fields
            .iter()
            .filter_map(|f| f.key.as_deref())
            .map(text_width)
            .max()
            .unwrap_or(0)
    }

    /// Natural size of every box, nested children included
    ///
    /// A nested box is always claimed after its parent, so walking claim
    /// order backwards sizes children first.
    fn measure(&self) -> FxHashMap<HeapId, Size> {
        let mut sizes: FxHashMap<HeapId, Size> = FxHashMap::default();
        let separator = text_width(SEPARATOR);

        for b in self.graph.boxes.iter().rev() {
            let key_width = Self::key_width(b);
            let mut inner_width = text_width(&self.title(b)) + 2;
            let mut rows: u16 = 0;

            for field in &b.fields {
                let (text, _) = value_cell(&field.value, self.options.textual_memory_labels);
                let key_part = if key_width > 0 { key_width + separator } else { 0 };
                inner_width = inner_width.max(key_part.saturating_add(text_width(&text)));
                rows = rows.saturating_add(1);

                if let RenderValue::Reference {
                    target,
                    nested: true,
                } = field.value
                {
                    if let Some(child) = sizes.get(&target) {
                        inner_width = inner_width.max(child.width.saturating_add(2));
                        rows = rows.saturating_add(child.height);
                    }
                }
            }

            if b.fields.is_empty() {
                inner_width = inner_width.max(text_width("(empty)"));
            }
            sizes.insert(
                b.id,
                Size {
                    width: inner_width.saturating_add(2).min(MAX_BOX_WIDTH),
                    height: rows.max(1).saturating_add(2),
                },
            );
        }
        sizes
    }

    /// Rectangles of the top-level boxes that fit above `bottom`
    fn place(
        &self,
        sizes: &FxHashMap<HeapId, Size>,
        left: u16,
        top: u16,
        right: u16,
        bottom: u16,
    ) -> Vec<(HeapId, Rect)> {
        let mut columns: BTreeMap<usize, Vec<&RenderBox>> = BTreeMap::new();
        for b in self.graph.top_level_boxes() {
            columns.entry(b.depth().unwrap_or(0)).or_default().push(b);
        }

        let mut placed: FxHashMap<HeapId, Rect> = FxHashMap::default();
        let mut order = Vec::with_capacity(self.graph.top_level.len());
        let mut x = left;

        for boxes in columns.values() {
            if x >= right {
                break;
            }
            let column_width = boxes
                .iter()
                .filter_map(|b| sizes.get(&b.id))
                .map(|size| size.width)
                .max()
                .unwrap_or(0)
                .min(right - x);
            let mut cursor = top;

            for b in boxes {
                let Some(size) = sizes.get(&b.id) else {
                    continue;
                };
                let referrer_y = b
                    .first_referrer
                    .and_then(|id| placed.get(&id))
                    .map_or(top, |rect| rect.y);
                let y = cursor.max(referrer_y);
                if y as u32 + size.height as u32 > bottom as u32 {
                    continue;
                }
                let rect = Rect {
                    x,
                    y,
                    width: size.width.min(column_width),
                    height: size.height,
                };
                placed.insert(b.id, rect);
                order.push((b.id, rect));
                cursor = y.saturating_add(size.height).saturating_add(1);
            }
            x = x.saturating_add(column_width).saturating_add(COLUMN_GAP);
        }
        order
    }

    /// Rows needed to show every top-level box at `width`
    pub fn required_height(&self, width: u16) -> u16 {
        let sizes = self.measure();
        let placed = self.place(&sizes, LEFT_MARGIN, 1, width.max(LEFT_MARGIN + 1), u16::MAX);
        placed
            .iter()
            .map(|(_, rect)| rect.y.saturating_add(rect.height))
            .max()
            .unwrap_or(1)
    }

    pub fn paint(&self, buf: &mut Buffer, area: Rect, diagram: &mut Diagram) {
        if area.width <= LEFT_MARGIN + 4 || area.height < 4 {
            return;
        }
        buf.set_stringn(
            area.x + 1,
            area.y,
            "Objects",
            area.width as usize - 1,
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::BOLD),
        );

        let sizes = self.measure();
        let placed = self.place(
            &sizes,
            area.x + LEFT_MARGIN,
            area.y + 1,
            area.right(),
            area.bottom(),
        );
        if placed.len() < self.graph.top_level.len() {
            tracing::debug!(
                shown = placed.len(),
                total = self.graph.top_level.len(),
                "heap boxes clipped"
            );
        }

        let mut work: Vec<(HeapId, Rect)> = placed.into_iter().rev().collect();
        while let Some((id, rect)) = work.pop() {
            if let Some(b) = self.graph.get(id) {
                self.paint_box(buf, b, rect, &sizes, diagram, &mut work);
            }
        }
    }

    fn paint_box(
        &self,
        buf: &mut Buffer,
        b: &RenderBox,
        rect: Rect,
        sizes: &FxHashMap<HeapId, Size>,
        diagram: &mut Diagram,
        work: &mut Vec<(HeapId, Rect)>,
    ) {
        let title = self.title(b);
        let mut block = Block::bordered().border_style(Style::default().fg(DEFAULT_THEME.border_normal));
        if !title.is_empty() {
            block = block.title(Span::styled(
                format!(" {} ", title),
                Style::default().fg(DEFAULT_THEME.type_name),
            ));
        }
        let inner = block.inner(rect);
        block.render(rect, buf);
        diagram.register(ElementKey::HeapBox(b.id), rect);

        if b.fields.is_empty() {
            buf.set_stringn(
                inner.x,
                inner.y,
                "(empty)",
                inner.width as usize,
                Style::default().fg(DEFAULT_THEME.comment),
            );
            return;
        }

        let key_width = Self::key_width(b).min(inner.width / 2);
        let separator = text_width(SEPARATOR);
        let mut y = inner.y;

        for (index, field) in b.fields.iter().enumerate() {
            if y >= inner.bottom() {
                break;
            }
            let mut x = inner.x;
            if let Some(key) = &field.key {
                buf.set_stringn(
                    x,
                    y,
                    format!("{:>width$}", key, width = key_width as usize),
                    key_width as usize,
                    Style::default().fg(DEFAULT_THEME.comment),
                );
                buf.set_stringn(
                    x + key_width,
                    y,
                    SEPARATOR,
                    inner.width.saturating_sub(key_width) as usize,
                    Style::default().fg(DEFAULT_THEME.comment),
                );
                x += key_width + separator;
            }

            if x < inner.right() {
                let (text, style) = value_cell(&field.value, self.options.textual_memory_labels);
                let (end_x, _) = buf.set_stringn(x, y, &text, (inner.right() - x) as usize, style);
                diagram.register(
                    ElementKey::Field {
                        owner: b.id,
                        field: index,
                    },
                    Rect::new(x, y, (end_x - x).max(1), 1),
                );
            }
            y += 1;

            if let RenderValue::Reference {
                target,
                nested: true,
            } = field.value
            {
                let Some(size) = sizes.get(&target) else {
                    continue;
                };
                let child = Rect {
                    x: inner.x + 1,
                    y,
                    width: size.width.min(inner.width.saturating_sub(2)),
                    height: size.height.min(inner.bottom().saturating_sub(y)),
                };
                if child.width >= 5 && child.height >= 3 {
                    work.push((target, child));
                }
                y = y.saturating_add(size.height);
            }
        }
    }
}

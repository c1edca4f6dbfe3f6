//! Frame pane rendering
//!
//! Each frame is a bordered box titled with its function name, one row per
//! slot laid out as `name │ value`. Reference slots show the [`ANCHOR`]
//! glyph that connectors start from (or the `idN` label in textual mode).
//!
//! # Order
//!
//! Frames are listed outer-to-inner. With `verticalStack` the order flips so
//! the executing frame is on top and the global frame ends up at the bottom.
//!
//! [`ANCHOR`]: super::ANCHOR

use super::{clamp_rows, text_width, value_cell};
use crate::config::Options;
use crate::graph::{RenderFrame, RenderGraph};
use crate::memory::stack::RETURN_LABEL;
use crate::ui::layout::{Diagram, ElementKey};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Widget},
};

/// Separator between a slot name and its value
const SEPARATOR: &str = " │ ";

pub struct FrameRenderer<'a> {
    graph: &'a RenderGraph,
    options: &'a Options,
}

impl<'a> FrameRenderer<'a> {
    pub fn new(graph: &'a RenderGraph, options: &'a Options) -> Self {
        FrameRenderer { graph, options }
    }

    /// Frames in the order they are painted, top to bottom
    pub fn display_order(&self) -> Vec<&'a RenderFrame> {
        let mut frames: Vec<&RenderFrame> = self.graph.frames.iter().collect();
        if self.options.vertical_stack {
            frames.reverse();
        }
        frames
    }

    fn frame_height(frame: &RenderFrame) -> u16 {
        clamp_rows(frame.slots.len().max(1)).saturating_add(2)
    }

    /// Rows needed to show every frame, header included
    pub fn required_height(&self) -> u16 {
        self.graph
            .frames
            .iter()
            .fold(1u16, |rows, frame| {
                rows.saturating_add(Self::frame_height(frame)).saturating_add(1)
            })
    }

    pub fn paint(&self, buf: &mut Buffer, area: Rect, diagram: &mut Diagram) {
        if area.width < 6 || area.height < 2 {
            return;
        }
        buf.set_stringn(
            area.x + 1,
            area.y,
            "Frames",
            area.width as usize - 1,
            Style::default()
                .fg(DEFAULT_THEME.comment)
                .add_modifier(Modifier::BOLD),
        );

        let frames = self.display_order();
        // Leave room on the right for connectors leaving the slots
        let width = area.width.saturating_sub(2);
        let mut y = area.y + 1;

        for (i, frame) in frames.iter().enumerate() {
            let height = Self::frame_height(frame);
            if y.saturating_add(height) > area.bottom() {
                if y < area.bottom() {
                    buf.set_stringn(
                        area.x + 1,
                        y,
                        format!("… {} more frame(s)", frames.len() - i),
                        width as usize,
                        Style::default().fg(DEFAULT_THEME.comment),
                    );
                }
                break;
            }
            let rect = Rect::new(area.x, y, width, height);
            self.paint_frame(buf, rect, frame, diagram);
            y = y.saturating_add(height).saturating_add(1);
        }
    }

    fn paint_frame(&self, buf: &mut Buffer, rect: Rect, frame: &RenderFrame, diagram: &mut Diagram) {
        let border = if frame.is_highlighted {
            DEFAULT_THEME.border_active
        } else {
            DEFAULT_THEME.border_normal
        };
        let title_style = if frame.is_global {
            Style::default().fg(DEFAULT_THEME.comment)
        } else {
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD)
        };
        let block = Block::bordered()
            .border_style(Style::default().fg(border))
            .title(Span::styled(format!(" {} ", frame.title), title_style));
        let inner = block.inner(rect);
        block.render(rect, buf);
        diagram.register(ElementKey::Frame(frame.index), rect);

        if frame.slots.is_empty() {
            buf.set_stringn(
                inner.x,
                inner.y,
                "(no variables)",
                inner.width as usize,
                Style::default().fg(DEFAULT_THEME.comment),
            );
            return;
        }

        let name_width = frame
            .slots
            .iter()
            .map(|slot| text_width(&slot.name))
            .max()
            .unwrap_or(0)
            .min(inner.width / 2);
        let value_x = inner.x + name_width + text_width(SEPARATOR);

        for (index, slot) in frame.slots.iter().enumerate() {
            let y = inner.y + index as u16;
            if y >= inner.bottom() {
                break;
            }
            let name_style = if slot.name == RETURN_LABEL {
                Style::default().fg(DEFAULT_THEME.return_value)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            buf.set_stringn(
                inner.x,
                y,
                format!("{:>width$}", slot.name, width = name_width as usize),
                name_width as usize,
                name_style,
            );
            buf.set_stringn(
                inner.x + name_width,
                y,
                SEPARATOR,
                inner.width.saturating_sub(name_width) as usize,
                Style::default().fg(DEFAULT_THEME.comment),
            );

            if value_x >= inner.right() {
                continue;
            }
            let (text, style) = value_cell(&slot.value, self.options.textual_memory_labels);
            let available = inner.right() - value_x;
            let (end_x, _) = buf.set_stringn(value_x, y, &text, available as usize, style);
            let cell = Rect::new(value_x, y, (end_x - value_x).max(1), 1);
            diagram.register(
                ElementKey::Slot {
                    frame: frame.index,
                    slot: index,
                },
                cell,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{RenderSlot, RenderValue};
    use crate::memory::value::HeapId;

    fn graph() -> RenderGraph {
        let frame = |index: usize, title: &str, slots: Vec<RenderSlot>| RenderFrame {
            index,
            title: title.into(),
            is_global: index == 0,
            is_highlighted: false,
            frame_id: None,
            slots,
        };
        RenderGraph::from_parts(
            0,
            vec![
                frame(
                    0,
                    "Global frame",
                    vec![RenderSlot {
                        name: "count".into(),
                        value: RenderValue::Literal("3".into()),
                    }],
                ),
                frame(
                    1,
                    "main",
                    vec![RenderSlot {
                        name: "xs".into(),
                        value: RenderValue::Reference {
                            target: HeapId(1),
                            nested: false,
                        },
                    }],
                ),
            ],
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )
    }

    #[test]
    fn test_registers_frames_and_slots() {
        let graph = graph();
        let options = Options::default();
        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        let mut diagram = Diagram::new();
        FrameRenderer::new(&graph, &options).paint(&mut buf, area, &mut diagram);

        let global = diagram.get(&ElementKey::Frame(0)).unwrap();
        let main = diagram.get(&ElementKey::Frame(1)).unwrap();
        assert!(global.y < main.y);

        let anchor = diagram.get(&ElementKey::Slot { frame: 1, slot: 0 }).unwrap();
        assert_eq!(anchor.width, 1);
        assert_eq!(buf.cell((anchor.x, anchor.y)).unwrap().symbol(), "●");
    }

    #[test]
    fn test_vertical_stack_puts_innermost_first() {
        let graph = graph();
        let options = Options {
            vertical_stack: true,
            ..Options::default()
        };
        let renderer = FrameRenderer::new(&graph, &options);
        let order: Vec<usize> = renderer.display_order().iter().map(|f| f.index).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_required_height_saturates_for_deep_stacks() {
        let frames = (0..20_000)
            .map(|index| RenderFrame {
                index,
                title: format!("f{}", index),
                is_global: index == 0,
                is_highlighted: false,
                frame_id: None,
                slots: vec![RenderSlot {
                    name: "n".into(),
                    value: RenderValue::Literal(index.to_string()),
                }],
            })
            .collect();
        let graph = RenderGraph::from_parts(0, frames, Vec::new(), Vec::new(), Vec::new());
        let options = Options::default();
        assert_eq!(FrameRenderer::new(&graph, &options).required_height(), u16::MAX);

        let area = Rect::new(0, 0, 30, 12);
        let mut buf = Buffer::empty(area);
        let mut diagram = Diagram::new();
        FrameRenderer::new(&graph, &options).paint(&mut buf, area, &mut diagram);
        assert!(diagram.contains(&ElementKey::Frame(0)));
    }

    #[test]
    fn test_huge_frame_height_is_clamped() {
        let frame = RenderFrame {
            index: 0,
            title: "main".into(),
            is_global: false,
            is_highlighted: false,
            frame_id: None,
            slots: (0..70_000)
                .map(|i| RenderSlot {
                    name: format!("v{}", i),
                    value: RenderValue::Literal("0".into()),
                })
                .collect(),
        };
        assert_eq!(FrameRenderer::frame_height(&frame), u16::MAX);
    }

    #[test]
    fn test_clipped_frames_are_not_registered() {
        let graph = graph();
        let options = Options::default();
        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        let mut diagram = Diagram::new();
        FrameRenderer::new(&graph, &options).paint(&mut buf, area, &mut diagram);
        assert!(diagram.contains(&ElementKey::Frame(0)));
        assert!(!diagram.contains(&ElementKey::Slot { frame: 1, slot: 0 }));
    }
}

//! Program output pane rendering

use super::Scene;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Padding, Paragraph, Widget},
};

/// Paint the output of the current step, newest lines kept in view
pub fn paint(buf: &mut Buffer, area: Rect, scene: &Scene) {
    let title = if scene.options.cumulative_mode {
        " Output "
    } else {
        " Output (this step) "
    };
    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    let output = scene.output();
    let mut lines: Vec<Line> = output
        .lines()
        .map(|line| Line::styled(line.to_string(), Style::default().fg(DEFAULT_THEME.fg)))
        .collect();

    if scene.is_last() {
        if let Some(message) = scene.failure {
            lines.push(Line::styled(
                message.to_string(),
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD),
            ));
        }
    }

    if lines.is_empty() {
        Paragraph::new("(no output)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment))
            .render(area, buf);
        return;
    }

    let visible = area.height.saturating_sub(2).max(1) as usize;
    let skip = lines.len().saturating_sub(visible);
    let shown: Vec<Line> = lines.into_iter().skip(skip).collect();
    Paragraph::new(shown)
        .block(block.padding(Padding::new(1, 0, 0, 0)))
        .render(area, buf);
}

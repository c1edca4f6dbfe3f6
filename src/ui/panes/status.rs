//! Status bar rendering with keybindings and state indicators

use super::Scene;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

/// Render the status bar at the bottom
pub fn paint(buf: &mut Buffer, area: Rect, scene: &Scene) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let failed_here = scene.failure.is_some() && scene.is_last();
    let message = match (scene.notice, scene.failure) {
        (Some(notice), _) => notice.to_string(),
        (None, Some(failure)) if failed_here => failure.to_string(),
        _ => String::new(),
    };
    let counter_bg = if failed_here {
        DEFAULT_THEME.error
    } else {
        DEFAULT_THEME.primary
    };

    let left = vec![
        Span::styled(
            format!(" Step {}/{} ", scene.step + 1, scene.navigable),
            Style::default()
                .bg(counter_bg)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(if failed_here && scene.notice.is_none() {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.fg
                }),
        ),
    ];
    Paragraph::new(Line::from(left))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Left)
        .render(halves[0], buf);

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right = vec![
        Span::styled(" ←/→ ", key_style),
        Span::styled(" step ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ⎵ ", key_style),
        Span::styled(" play ", desc_style),
        Span::styled("│", sep_style),
        Span::styled(" ↵ / ⌫ ", key_style),
        Span::styled(" end/start ", desc_style),
        Span::styled("│", sep_style),
        Span::styled("q", key_style),
        Span::styled(" quit ", desc_style),
    ];

    let badge = if scene.playing {
        Some((" ▶ PLAYING ", DEFAULT_THEME.secondary))
    } else if scene.is_last() {
        Some((" END ", DEFAULT_THEME.error))
    } else if scene.step == 0 {
        Some((" START ", DEFAULT_THEME.success))
    } else {
        None
    };
    if let Some((text, color)) = badge {
        right.push(Span::styled("│", sep_style));
        right.push(Span::styled(
            text,
            Style::default()
                .bg(color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    Paragraph::new(Line::from(right))
        .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
        .alignment(Alignment::Right)
        .render(halves[1], buf);
}

//! Code pane rendering
//!
//! Shows the traced program with line numbers and a `→` marker on the line
//! the current step executes. With `highlightLines` that line also gets a
//! background highlight. The view scrolls so the marked line stays centered.

use super::Scene;
use crate::config::Lang;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

const KEYWORDS: &[&str] = &[
    "if", "else", "while", "for", "do", "switch", "case", "default", "break", "continue", "return",
    "class", "struct", "new", "def", "lambda", "function", "let", "var", "const", "import", "from",
    "public", "private", "protected", "static", "final", "try", "catch", "except", "finally",
    "raise", "throw", "in", "not", "and", "or", "end", "elif", "yield", "pass",
];

const TYPES: &[&str] = &[
    "int", "char", "void", "bool", "boolean", "float", "double", "long", "short", "byte", "String",
    "unsigned",
];

const CONSTANTS: &[&str] = &[
    "null", "NULL", "None", "nil", "true", "false", "True", "False", "undefined",
];

fn line_comment(lang: Lang) -> &'static str {
    match lang {
        Lang::Py2 | Lang::Py3 | Lang::Ruby => "#",
        _ => "//",
    }
}

fn word_style(word: &str, is_call: bool) -> Style {
    if KEYWORDS.contains(&word) {
        Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD)
    } else if TYPES.contains(&word) {
        Style::default().fg(DEFAULT_THEME.type_name)
    } else if CONSTANTS.contains(&word) || word.chars().all(|c| c.is_ascii_digit()) {
        Style::default().fg(DEFAULT_THEME.number)
    } else if is_call {
        Style::default().fg(DEFAULT_THEME.function)
    } else {
        Style::default().fg(DEFAULT_THEME.fg)
    }
}

/// Tokenize one line into styled spans
fn highlight(line: &str, lang: Lang) -> Line<'static> {
    let comment = line_comment(lang);
    let mut spans = Vec::new();
    let mut word = String::new();
    let mut rest = line;

    let flush = |word: &mut String, spans: &mut Vec<Span<'static>>, is_call: bool| {
        if !word.is_empty() {
            let style = word_style(word, is_call);
            spans.push(Span::styled(std::mem::take(word), style));
        }
    };

    while let Some(c) = rest.chars().next() {
        if rest.starts_with(comment) {
            flush(&mut word, &mut spans, false);
            spans.push(Span::styled(
                rest.to_string(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        if c == '"' || c == '\'' {
            flush(&mut word, &mut spans, false);
            let mut end = c.len_utf8();
            let mut escaped = false;
            for ch in rest[end..].chars() {
                end += ch.len_utf8();
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == c {
                    break;
                }
            }
            spans.push(Span::styled(
                rest[..end].to_string(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            rest = &rest[end..];
            continue;
        }

        if c.is_alphanumeric() || c == '_' {
            word.push(c);
        } else {
            flush(&mut word, &mut spans, c == '(');
            spans.push(Span::styled(c.to_string(), Style::default().fg(DEFAULT_THEME.fg)));
        }
        rest = &rest[c.len_utf8()..];
    }
    flush(&mut word, &mut spans, false);

    Line::from(spans)
}

/// First visible line so `current` (1-based) sits near the middle
fn scroll_offset(current: Option<u32>, total: usize, visible: usize) -> usize {
    let Some(current) = current else {
        return 0;
    };
    let index = (current as usize).saturating_sub(1);
    let offset = index.saturating_sub(visible / 2);
    offset.min(total.saturating_sub(visible))
}

pub fn paint(buf: &mut Buffer, area: Rect, scene: &Scene) {
    let block = Block::bordered()
        .title(" Code ")
        .border_style(Style::default().fg(DEFAULT_THEME.border_normal));

    let code = scene.trace.code().unwrap_or_default();
    let lines: Vec<&str> = code.lines().collect();
    let visible = area.height.saturating_sub(2).max(1) as usize;
    let current = scene.current_line();
    let offset = scroll_offset(current, lines.len(), visible);
    let failed_here = scene.failure.is_some() && scene.is_last();

    let rendered: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(idx, text)| {
            let number = idx + 1;
            let is_current = current == Some(number as u32);
            let marker = if is_current { "→" } else { " " };
            let marker_style = if is_current && failed_here {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            };
            let number_style = if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut content = highlight(text, scene.options.lang);
            if is_current && scene.options.highlight_lines {
                let background = Style::default().bg(DEFAULT_THEME.current_line_bg);
                for span in &mut content.spans {
                    span.style = span.style.patch(background);
                }
            }

            let mut spans = vec![
                Span::styled(marker, marker_style),
                Span::styled(format!("{:4} ", number), number_style),
            ];
            spans.extend(content.spans);
            Line::from(spans)
        })
        .collect();

    Paragraph::new(rendered).block(block).render(area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let source = r#"s = "a # b"  # note"#;
        let line = highlight(source, Lang::Py3);
        assert_eq!(text(&line), source);
        assert_eq!(line.spans.last().unwrap().content, "# note");
    }

    #[test]
    fn test_scroll_centers_current_line() {
        assert_eq!(scroll_offset(Some(50), 100, 10), 44);
        assert_eq!(scroll_offset(Some(2), 100, 10), 0);
        assert_eq!(scroll_offset(Some(100), 100, 10), 90);
        assert_eq!(scroll_offset(None, 100, 10), 0);
    }
}

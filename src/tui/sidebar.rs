/// History sidebar: collapsible left panel with the grouped article history.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};
use unicode_width::UnicodeWidthStr;

use super::AppState;

pub const SIDEBAR_WIDTH: u16 = 32;

pub fn draw_sidebar(f: &mut Frame, state: &AppState, area: Rect) {
    let view = &state.view;
    let focused = view.sidebar_focused;
    let border_color = if focused { Color::Cyan } else { Color::Rgb(40, 38, 60) };

    let block = Block::default()
        .borders(Borders::RIGHT)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(Color::Rgb(6, 6, 12)));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let w = inner.width as usize;
    let mut items: Vec<ListItem<'static>> = Vec::new();

    // Header
    let ctrl_hint = if focused { " Esc=exit" } else { " Tab=focus" };
    let header_pad = w.saturating_sub(8 + ctrl_hint.len());
    items.push(ListItem::new(Line::from(vec![
        Span::styled(" History", Style::default().fg(Color::Rgb(100, 95, 150)).add_modifier(Modifier::BOLD)),
        Span::styled(" ".repeat(header_pad), Style::default()),
        Span::styled(ctrl_hint.to_string(), Style::default().fg(Color::Rgb(50, 47, 75))),
    ])));

    let active_id = view.history.active();
    let mut index = 0usize;
    for section in view.history.sections() {
        items.push(ListItem::new(Line::raw("")));
        items.push(ListItem::new(Line::from(vec![Span::styled(
            format!(" {}", section.bucket.title()),
            Style::default().fg(Color::Rgb(140, 135, 200)).add_modifier(Modifier::BOLD),
        )])));

        for item in &section.entries {
            let selected = focused && index == view.history.selected();
            let active = active_id == Some(item.entry.id);
            index += 1;

            // Colour scheme: active = cyan; selected (focused) = bright highlight
            let (bg, name_fg, meta_fg) = if active && selected {
                (Color::Rgb(20, 40, 50), Color::Cyan, Color::Rgb(0, 200, 200))
            } else if active {
                (Color::Rgb(10, 22, 30), Color::Cyan, Color::Rgb(0, 170, 170))
            } else if selected {
                (Color::Rgb(28, 26, 48), Color::White, Color::Rgb(140, 135, 200))
            } else {
                (Color::Reset, Color::Rgb(150, 145, 190), Color::Rgb(70, 67, 100))
            };
            let mut name_style = Style::default().fg(name_fg).bg(bg);
            let mut meta_style = Style::default().fg(meta_fg).bg(bg);
            if active {
                name_style = name_style.add_modifier(Modifier::BOLD);
            }
            // Removal transition: dimmed and pushed right
            let indent = if item.leaving {
                name_style = name_style.add_modifier(Modifier::DIM | Modifier::CROSSED_OUT);
                meta_style = meta_style.add_modifier(Modifier::DIM);
                "   "
            } else {
                " "
            };

            let bullet = if active { "● " } else { "○ " };
            let when = item.entry.created_at.clone().unwrap_or_default();
            let when_w = if when.is_empty() { 0 } else { when.width() + 1 };
            let title_max = w.saturating_sub(indent.len() + 2 + when_w);
            let title = truncate_to_width(&item.entry.short_title, title_max);
            let gap = w.saturating_sub(indent.len() + 2 + title.width() + when_w);

            items.push(ListItem::new(Line::from(vec![
                Span::styled(indent.to_string(), Style::default().bg(bg)),
                Span::styled(bullet, name_style),
                Span::styled(title, name_style),
                Span::styled(" ".repeat(gap), Style::default().bg(bg)),
                Span::styled(if when.is_empty() { when } else { format!("{when} ") }, meta_style),
            ])));
        }
    }

    // Footer hint
    items.push(ListItem::new(Line::raw("")));
    let hint = if focused { " ↵ open  d delete" } else { " Ctrl+N new chat" };
    items.push(ListItem::new(Line::from(vec![Span::styled(
        hint,
        Style::default().fg(Color::Rgb(55, 52, 80)),
    )])));

    f.render_widget(List::new(items), inner);
}

/// Cut `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut used = 0usize;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw + 1 > max {
            break;
        }
        out.push(ch);
        used += cw;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("Markets rally after...", 10), "Markets r…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }
}

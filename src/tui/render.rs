/// Ratatui draw entry-point for QuickNews.
/// Thin dispatcher. The transcript lives in chat.rs, history in sidebar.rs.
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use super::AppState;
use super::chat::SPINNER_GLYPHS;
use super::sidebar::{SIDEBAR_WIDTH, truncate_to_width};

// ── Main draw entry point ─────────────────────────────────────────────────────

pub fn draw(f: &mut Frame, state: &AppState) {
    let area = f.area();

    // Horizontal split when sidebar is visible
    let main_area = if state.sidebar_visible {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);
        super::sidebar::draw_sidebar(f, state, cols[0]);
        cols[1]
    } else {
        area
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // chat title
            Constraint::Min(0),    // transcript
            Constraint::Length(1), // status bar
            Constraint::Length(3), // input box
        ])
        .split(main_area);

    draw_title_bar(f, state, chunks[0]);
    super::chat::draw_transcript(f, &state.view, chunks[1]);
    draw_status_bar(f, state, chunks[2]);
    draw_input(f, state, chunks[3]);
}

// ── Title bar ─────────────────────────────────────────────────────────────────

fn draw_title_bar(f: &mut Frame, state: &AppState, area: Rect) {
    let title = truncate_to_width(state.view.transcript.title(), (area.width as usize).saturating_sub(4));
    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(title, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
    ]);
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Rgb(14, 14, 24))),
        area,
    );
}

// ── Status bar ────────────────────────────────────────────────────────────────

fn draw_status_bar(f: &mut Frame, state: &AppState, area: Rect) {
    // Animated spinner glyph in status bar while a reply is pending or revealing
    let busy = state.view.indicator.is_visible() || state.view.transcript.is_typing();
    let (status_glyph, status_color) = if busy {
        let g = SPINNER_GLYPHS[(state.spinner_tick as usize) % SPINNER_GLYPHS.len()];
        (g, Color::Cyan)
    } else {
        ("▲", Color::White)
    };

    let search = state.controller.state().search_mode;
    let mode_span = if search {
        Span::styled(" SEARCH ", Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD))
    } else {
        Span::styled(" ARTICLE ", Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD))
    };

    let line = Line::from(vec![
        Span::raw(" "),
        Span::styled(status_glyph, Style::default().fg(status_color).add_modifier(Modifier::BOLD)),
        Span::styled(" quicknews", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(state.profile.clone(), Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(state.endpoint.clone(), Style::default().fg(Color::Rgb(100, 180, 220))),
        Span::raw("  "),
        mode_span,
        Span::styled(
            format!("  {} in history", state.view.history.len()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(Color::Rgb(14, 14, 24))),
        area,
    );
}

// ── Input box ─────────────────────────────────────────────────────────────────

fn draw_input(f: &mut Frame, state: &AppState, area: Rect) {
    let view = &state.view;
    let search = state.controller.state().search_mode;
    let can_send = !view.input.trim().is_empty() && !state.awaiting();

    let prompt_char = if search { "⌕" } else { "❯" };
    let prompt_color = if can_send {
        Color::Cyan
    } else {
        Color::Rgb(60, 60, 80)
    };
    let border_color = if view.sidebar_focused {
        Color::Rgb(40, 40, 60)
    } else {
        Color::Rgb(60, 60, 80)
    };

    let prompt_span = Span::styled(
        format!("  {prompt_char} "),
        Style::default().fg(prompt_color).add_modifier(Modifier::BOLD),
    );

    let content_span = if view.input.is_empty() {
        let hint = if search {
            "search the news · Ctrl+G article mode · Ctrl+N new chat"
        } else {
            "article URL or question · Ctrl+G search · Ctrl+N new chat · Ctrl+B history"
        };
        Span::styled(hint, Style::default().fg(Color::Rgb(70, 70, 90)))
    } else {
        Span::styled(view.input.clone(), Style::default().fg(Color::White))
    };

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(Color::Rgb(8, 8, 14)));

    let paragraph = Paragraph::new(Line::from(vec![prompt_span, content_span]))
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, area);

    // Position cursor at the actual edit cursor, not end of string
    if !view.sidebar_focused {
        // prompt is "  ❯ ", 4 cols wide
        let prompt_width: u16 = 4;
        let text_before_cursor = &view.input[..view.cursor.min(view.input.len())];
        let cursor_x = area.x + prompt_width + text_before_cursor.width() as u16;
        let cursor_y = area.y + 1; // +1 for top border
        if cursor_x < area.x + area.width {
            f.set_cursor_position((cursor_x, cursor_y));
        }
    }
}

/// Transcript pane rendering: build_items, draw_transcript, wrapping utilities.
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, List, ListItem},
};
use unicode_width::UnicodeWidthStr;

use super::View;
use crate::format::{self, MarkupLine};
use crate::indicator::IndicatorState;
use crate::transcript::{Message, Sender};

// ── Spinner ────────────────────────────────────────────────────────────────────

pub const SPINNER_GLYPHS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

const TYPING_CURSOR: &str = "▌";

const USER_BG: Color = Color::Rgb(28, 26, 52);
const USER_FG: Color = Color::Rgb(235, 232, 255);
const ASSISTANT_FG: Color = Color::Rgb(210, 230, 255);
const LABEL_FG: Color = Color::Rgb(0, 210, 210);
const LINK_FG: Color = Color::Rgb(100, 180, 255);
const DIM_FG: Color = Color::Rgb(70, 70, 90);

fn indicator_dots(state: IndicatorState) -> &'static str {
    match state {
        IndicatorState::One => "●  ∙  ∙",
        IndicatorState::Two => "∙  ●  ∙",
        IndicatorState::Three => "∙  ∙  ●",
    }
}

// ── Transcript items builder ───────────────────────────────────────────────────

pub fn build_items(view: &View, term_width: u16) -> Vec<ListItem<'static>> {
    let mut items: Vec<ListItem<'static>> = Vec::new();
    let width = term_width as usize;

    if view.transcript.shows_placeholder() {
        items.push(ListItem::new(Line::raw("")));
        items.push(ListItem::new(Line::from(Span::styled(
            "  Welcome to QuickNews",
            Style::default().fg(LABEL_FG).add_modifier(Modifier::BOLD),
        ))));
        for hint in [
            "  Paste an article URL to get its summary and sentiment,",
            "  or ask a question about the news.",
            "  Ctrl+G switches to search mode.",
        ] {
            items.push(ListItem::new(Line::from(Span::styled(
                hint,
                Style::default().fg(DIM_FG),
            ))));
        }
    }

    for msg in view.transcript.messages() {
        match msg.sender {
            Sender::User => push_user(&mut items, &msg.content, width),
            Sender::Assistant => push_assistant(&mut items, msg, width),
        }
        items.push(ListItem::new(Line::raw("")));
    }

    if let Some(state) = view.indicator.state() {
        items.push(ListItem::new(Line::from(vec![
            Span::styled("  ◆ ", Style::default().fg(LABEL_FG)),
            Span::styled(
                indicator_dots(state),
                Style::default().fg(LABEL_FG).add_modifier(Modifier::BOLD),
            ),
        ])));
    }

    items
}

/// Right-aligned bubble, at most two thirds of the pane.
fn push_user(items: &mut Vec<ListItem<'static>>, content: &str, width: usize) {
    let max_w = (width * 2 / 3).max(10);
    let wrapped: Vec<String> = content
        .lines()
        .flat_map(|line| wrap_text(line, max_w.saturating_sub(2)))
        .collect();
    let bubble_w = wrapped.iter().map(|l| l.width()).max().unwrap_or(0) + 2;
    let pad = width.saturating_sub(bubble_w + 1);
    let body = Style::default().fg(USER_FG).bg(USER_BG);
    for line in wrapped {
        let fill = bubble_w.saturating_sub(line.width() + 2);
        items.push(ListItem::new(Line::from(vec![
            Span::raw(" ".repeat(pad)),
            Span::styled(format!(" {line}{} ", " ".repeat(fill)), body),
        ])));
    }
}

fn push_assistant(items: &mut Vec<ListItem<'static>>, msg: &Message, width: usize) {
    let wrap_width = width.saturating_sub(6).max(20);
    let mut lines: Vec<Vec<Span<'static>>> = Vec::new();

    match msg.markup() {
        Some(markup) => {
            for line in format::parse_markup(&markup) {
                lines.extend(wrap_markup(&line, wrap_width));
            }
        }
        None => {
            // Typewriter in progress: raw characters plus a cursor
            let raw = format!("{}{TYPING_CURSOR}", msg.revealed_text());
            for src in raw.split('\n') {
                for w in wrap_text(src, wrap_width) {
                    lines.push(vec![Span::styled(w, Style::default().fg(ASSISTANT_FG))]);
                }
            }
        }
    }

    for (i, spans) in lines.into_iter().enumerate() {
        let gutter = if i == 0 {
            Span::styled("  ◆ ", Style::default().fg(LABEL_FG))
        } else {
            Span::raw("    ")
        };
        let mut row = vec![gutter];
        row.extend(spans);
        items.push(ListItem::new(Line::from(row)));
    }
}

// ── Draw ───────────────────────────────────────────────────────────────────────

pub fn draw_transcript(f: &mut Frame, view: &View, area: Rect) {
    let all_items = build_items(view, area.width);
    let total = all_items.len();
    let visible = area.height as usize;

    let skip = if total > visible {
        (total - visible).saturating_sub(view.transcript.scroll)
    } else {
        0
    };

    let sliced: Vec<ListItem<'static>> = all_items.into_iter().skip(skip).collect();
    let list = List::new(sliced)
        .block(Block::default().style(Style::default().bg(Color::Rgb(8, 8, 14))));
    f.render_widget(list, area);
}

// ── Utilities ──────────────────────────────────────────────────────────────────

/// Word-wrap a single line of text to `max_width` columns.
/// Splits on whitespace; never truncates mid-word unless the word alone exceeds max_width.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = word.width();
        if current_width == 0 {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + 1 + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += 1 + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

type Word = Vec<(String, Style)>;

fn segment_style(bold: bool, link: bool) -> Style {
    let mut style = Style::default().fg(if link { LINK_FG } else { ASSISTANT_FG });
    if bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if link {
        style = style.add_modifier(Modifier::UNDERLINED);
    }
    style
}

/// Split a styled line into words. A word may span several segments
/// ("**bold**," is one word in two styles). Link targets follow their label.
fn markup_words(line: &MarkupLine) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();
    let mut word: Word = Vec::new();
    for seg in line {
        let style = segment_style(seg.bold, seg.href.is_some());
        let mut piece = String::new();
        for ch in seg.text.chars() {
            if ch.is_whitespace() {
                if !piece.is_empty() {
                    word.push((std::mem::take(&mut piece), style));
                }
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
            } else {
                piece.push(ch);
            }
        }
        if !piece.is_empty() {
            word.push((piece, style));
        }
        if let Some(href) = &seg.href {
            if !word.is_empty() {
                words.push(std::mem::take(&mut word));
            }
            words.push(vec![(format!("‹{href}›"), Style::default().fg(DIM_FG))]);
        }
    }
    if !word.is_empty() {
        words.push(word);
    }
    words
}

/// Greedy word wrap over styled words.
pub fn wrap_markup(line: &MarkupLine, max_width: usize) -> Vec<Vec<Span<'static>>> {
    let mut lines: Vec<Vec<Span<'static>>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut current_width = 0usize;

    for word in markup_words(line) {
        let word_width: usize = word.iter().map(|(t, _)| t.width()).sum();
        if current_width > 0 && current_width + 1 + word_width > max_width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if current_width > 0 {
            current.push(Span::raw(" "));
            current_width += 1;
        }
        for (text, style) in word {
            current.push(Span::styled(text, style));
        }
        current_width += word_width;
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Segment;
    use pretty_assertions::assert_eq;

    fn text_of(spans: &[Span<'_>]) -> String {
        spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_text_counts_display_width() {
        assert_eq!(wrap_text("日本語 テキスト", 7), vec!["日本語", "テキスト"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("a b c", 3), vec!["a b", "c"]);
    }

    #[test]
    fn test_markup_word_spanning_segments_stays_joined() {
        let line = vec![
            Segment { text: "see ".into(), bold: false, href: None },
            Segment { text: "this".into(), bold: true, href: None },
            Segment { text: ", now".into(), bold: false, href: None },
        ];
        let wrapped = wrap_markup(&line, 80);
        assert_eq!(wrapped.len(), 1);
        assert_eq!(text_of(&wrapped[0]), "see this, now");
        assert!(wrapped[0][2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_link_shows_target_after_label() {
        let line = format::parse_markup(&format::format_content(
            "🔗 [Read Original Source](https://example.com/a)",
        ))
        .remove(0);
        let wrapped = wrap_markup(&line, 80);
        assert_eq!(
            text_of(&wrapped[0]),
            "🔗 Read Original Source ‹https://example.com/a›"
        );
    }

    #[test]
    fn test_wrap_markup_breaks_between_words() {
        let line = vec![Segment { text: "aaa bbb ccc".into(), bold: false, href: None }];
        let wrapped: Vec<String> = wrap_markup(&line, 7).iter().map(|l| text_of(l)).collect();
        assert_eq!(wrapped, vec!["aaa bbb", "ccc"]);
    }
}

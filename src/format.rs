/// Text → markup formatting for transcript rows.
///
/// `format_content` is the only place raw backend or user text becomes markup.
/// The terminal never interprets HTML; it reads the same markup back with
/// `parse_markup` so a row looks identical whether it was formatted once or
/// revealed by the typewriter and then formatted.
use std::sync::LazyLock;

use regex::Regex;

use crate::api::ArticleRecord;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("link pattern"));
static URL_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i-u)^(https?://)?",                            // scheme, ASCII only
        r"((([a-z\d]([a-z\d-]*[a-z\d])*)\.)+[a-z]{2,}|",   // domain
        r"((\d{1,3}\.){3}\d{1,3}))",                       // or ipv4
        r"(:\d+)?(/[-a-z\d%_.~+]*)*",                      // port and path
        r"(\?[;&a-z\d%_.~+=-]*)?",                         // query
        r"(#[-a-z\d_]*)?$",                                // fragment
    ))
    .expect("url pattern")
});

const LINK_MARKUP: &str =
    r#"<a href="$2" target="_blank" rel="noopener noreferrer" class="font-semibold">$1</a>"#;

// ── Formatter ─────────────────────────────────────────────────────────────────

/// Escape `<`/`>` first, then bold → link → newline. Substitution output is
/// never re-escaped.
pub fn format_content(raw: &str) -> String {
    let escaped = raw.replace('<', "&lt;").replace('>', "&gt;");
    let bolded = BOLD.replace_all(&escaped, "<strong>$1</strong>");
    let linked = LINK.replace_all(&bolded, LINK_MARKUP);
    linked.replace('\n', "<br>")
}

/// Assistant reply for a processed or reloaded article.
pub fn format_article_response(article: &ArticleRecord) -> String {
    format!(
        "**{}**\n\n👤 **Author(s):** {}\n📅 **Published:** {}\n😊 **Sentiment:** {}\n\n📝 **Summary:**\n{}\n\n🔗 [Read Original Source]({})",
        article.title,
        article.authors,
        article.publish_date.as_deref().unwrap_or("N/A"),
        article.sentiment,
        article.summary,
        article.url,
    )
}

/// True when the input looks like a web address (scheme optional).
pub fn is_url(text: &str) -> bool {
    URL_SHAPE.is_match(text)
}

/// Sidebar title derived from a full title: at most four words, `...` when cut.
pub fn short_title(title: &str) -> String {
    let words: Vec<&str> = title.split_whitespace().collect();
    if words.len() > 4 {
        format!("{}...", words[..4].join(" "))
    } else {
        words.join(" ")
    }
}

// ── Markup reader ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
    pub href: Option<String>,
}

pub type MarkupLine = Vec<Segment>;

/// Read `format_content` output back into lines of styled segments.
/// Tags other than the ones the formatter emits are kept as literal text.
pub fn parse_markup(markup: &str) -> Vec<MarkupLine> {
    let mut lines: Vec<MarkupLine> = vec![Vec::new()];
    let mut bold = false;
    let mut href: Option<String> = None;
    let mut text = String::new();
    let mut rest = markup;

    fn flush(lines: &mut [MarkupLine], text: &mut String, bold: bool, href: &Option<String>) {
        if text.is_empty() {
            return;
        }
        let seg = Segment {
            text: unescape(text),
            bold,
            href: href.clone(),
        };
        text.clear();
        if let Some(line) = lines.last_mut() {
            line.push(seg);
        }
    }

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix("<br>") {
            flush(&mut lines, &mut text, bold, &href);
            lines.push(Vec::new());
            rest = after;
        } else if let Some(after) = rest.strip_prefix("<strong>") {
            flush(&mut lines, &mut text, bold, &href);
            bold = true;
            rest = after;
        } else if let Some(after) = rest.strip_prefix("</strong>") {
            flush(&mut lines, &mut text, bold, &href);
            bold = false;
            rest = after;
        } else if let Some(after) = rest.strip_prefix("<a href=\"") {
            let Some(close) = after.find('"') else {
                text.push('<');
                rest = &rest[1..];
                continue;
            };
            let Some(tag_end) = after[close..].find('>') else {
                text.push('<');
                rest = &rest[1..];
                continue;
            };
            flush(&mut lines, &mut text, bold, &href);
            href = Some(unescape(&after[..close]));
            rest = &after[close + tag_end + 1..];
        } else if let Some(after) = rest.strip_prefix("</a>") {
            flush(&mut lines, &mut text, bold, &href);
            href = None;
            rest = after;
        } else {
            let Some(ch) = rest.chars().next() else { break };
            text.push(ch);
            rest = &rest[ch.len_utf8()..];
        }
    }
    flush(&mut lines, &mut text, bold, &href);
    lines
}

fn unescape(s: &str) -> String {
    s.replace("&lt;", "<").replace("&gt;", ">")
}

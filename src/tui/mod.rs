/// Ratatui-based TUI for QuickNews.
///
/// Architecture:
///   main task:     event loop over crossterm keys, backend replies, timer ticks
///   request tasks: tokio::spawn per backend call, sending a `Reply` back over mpsc
///   timer tasks:   owned by `TimerHandle`s, deliver `TimerKind` ticks over mpsc
///
/// Layout:
///   ┌──────────┬─────────────────────────────────────┐
///   │ history  │  chat title (1 line)                │
///   │ sidebar  ├─────────────────────────────────────┤
///   │ (Ctrl+B) │  transcript (scrollable, Min(0))    │
///   │          ├─────────────────────────────────────┤
///   │          │  status bar (1 line)                │
///   │          ├─────────────────────────────────────┤
///   │          │  input box (3 lines, fixed)         │
///   └──────────┴─────────────────────────────────────┘
pub mod chat;
pub mod render;
pub mod sidebar;

use std::io;
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;

use crate::api::Backend;
use crate::config::ResolvedConfig;
use crate::history::HistoryPanel;
use crate::indicator::TypingIndicator;
use crate::session::{Controller, HistoryOp, Phase, RenderPort, Reply, Request, TranscriptOp};
use crate::timer::{Scheduler, TimerKind, TokioScheduler};
use crate::transcript::Transcript;

/// Sidebar opens by default from this terminal width up
const SIDEBAR_MIN_WIDTH: u16 = 100;

// ── View: what the controller draws into ─────────────────────────────────────

pub struct View {
    pub transcript: Transcript,
    pub indicator: TypingIndicator,
    pub history: HistoryPanel,
    pub input: String,
    pub cursor: usize, // byte offset in input
    /// True = arrow keys drive the history sidebar instead of the transcript
    pub sidebar_focused: bool,
    scheduler: Box<dyn Scheduler>,
}

impl View {
    pub fn new(resolved: &ResolvedConfig, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            transcript: Transcript::new(resolved.typewriter_delay),
            indicator: TypingIndicator::new(resolved.indicator_interval),
            history: HistoryPanel::new(resolved.fade),
            input: String::new(),
            cursor: 0,
            sidebar_focused: false,
            scheduler,
        }
    }

    /// Apply a timer tick.
    pub fn on_timer(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Typewriter => {
                self.transcript.advance_typewriter();
            }
            TimerKind::Indicator => self.indicator.advance(),
            TimerKind::Fade(id) => {
                if self.history.finish_remove(id) {
                    tracing::debug!(%id, "history entry removed");
                }
            }
        }
    }
}

impl RenderPort for View {
    fn transcript(&mut self, op: TranscriptOp) {
        match op {
            TranscriptOp::Clear => self.transcript.clear(),
            TranscriptOp::ShowPlaceholder => self.transcript.show_placeholder(),
            TranscriptOp::Append { content, sender, animate } => {
                self.transcript
                    .append_message(content, sender, animate, self.scheduler.as_ref());
            }
            TranscriptOp::ShowIndicator => self.indicator.show(self.scheduler.as_ref()),
            TranscriptOp::HideIndicator => self.indicator.hide(),
            TranscriptOp::SetTitle(title) => self.transcript.set_title(title),
            TranscriptOp::ResetInput => {
                self.input.clear();
                self.cursor = 0;
                self.sidebar_focused = false;
            }
        }
    }

    fn history(&mut self, op: HistoryOp) {
        match op {
            HistoryOp::Rebuild(groups) => self.history.rebuild(groups),
            HistoryOp::MarkActive(id) => self.history.mark_active(id),
            HistoryOp::Remove(id) => self.history.begin_remove(id, self.scheduler.as_ref()),
        }
    }
}

// ── AppState ──────────────────────────────────────────────────────────────────

pub struct AppState {
    pub controller: Controller,
    pub view: View,
    pub profile: String,
    pub endpoint: String,
    /// Sidebar visible (collapsible history list on left)
    pub sidebar_visible: bool,
    /// Incremented every 120ms while a reply is pending or revealing, for the status spinner
    pub spinner_tick: u32,
}

impl AppState {
    pub fn new(resolved: &ResolvedConfig, scheduler: Box<dyn Scheduler>) -> Self {
        Self {
            controller: Controller::new(),
            view: View::new(resolved, scheduler),
            profile: resolved.profile_name.clone(),
            endpoint: resolved.endpoint.clone(),
            sidebar_visible: false, // set after terminal size check in event_loop
            spinner_tick: 0,
        }
    }

    pub fn awaiting(&self) -> bool {
        self.controller.phase() == Phase::AwaitingResponse
    }

    fn apply_reply(&mut self, reply: Reply) -> Vec<Request> {
        self.controller.handle_reply(reply, &mut self.view)
    }
}

// ── Terminal setup / teardown ─────────────────────────────────────────────────

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) {
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();
}

// ── Main TUI run loop ─────────────────────────────────────────────────────────

pub async fn run(resolved: ResolvedConfig, backend: Arc<dyn Backend>) -> Result<()> {
    let mut terminal = setup_terminal()?;

    // Panic hook: restore terminal before printing panic
    let orig_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        orig_hook(info);
    }));

    let result = event_loop(&mut terminal, resolved, backend).await;

    restore_terminal(&mut terminal);
    result
}

/// Spawn one task per request; each reports back on `tx`.
fn dispatch(
    requests: Vec<Request>,
    backend: &Arc<dyn Backend>,
    tx: &mpsc::UnboundedSender<Reply>,
) {
    for request in requests {
        let backend = backend.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = request.run(backend.as_ref()).await;
            let _ = tx.send(reply);
        });
    }
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    resolved: ResolvedConfig,
    backend: Arc<dyn Backend>,
) -> Result<()> {
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<Reply>();
    let (timer_tx, mut timer_rx) = mpsc::unbounded_channel::<TimerKind>();

    let mut state = AppState::new(&resolved, Box::new(TokioScheduler::new(timer_tx)));

    // Auto-show sidebar when terminal is wide enough
    if let Ok((w, _)) = crossterm::terminal::size() {
        state.sidebar_visible = w >= SIDEBAR_MIN_WIDTH;
    }

    tracing::info!(endpoint = %state.endpoint, profile = %state.profile, "tui started");
    dispatch(vec![state.controller.load_history()], &backend, &reply_tx);

    let mut crossterm_events = EventStream::new();
    let mut ticker = tokio::time::interval(tokio::time::Duration::from_millis(120));

    terminal.draw(|f| render::draw(f, &state))?;

    loop {
        tokio::select! {
            // ── Animation tick ────────────────────────────────────────────────
            _ = ticker.tick() => {
                if state.view.indicator.is_visible() || state.view.transcript.is_typing() {
                    state.spinner_tick = state.spinner_tick.wrapping_add(1);
                    terminal.draw(|f| render::draw(f, &state))?;
                }
            }

            // ── Backend replies ───────────────────────────────────────────────
            Some(reply) = reply_rx.recv() => {
                let follow = state.apply_reply(reply);
                dispatch(follow, &backend, &reply_tx);
                terminal.draw(|f| render::draw(f, &state))?;
            }

            // ── Typewriter / indicator / fade ticks ───────────────────────────
            Some(kind) = timer_rx.recv() => {
                state.view.on_timer(kind);
                terminal.draw(|f| render::draw(f, &state))?;
            }

            // ── Keyboard/resize events ────────────────────────────────────────
            Some(Ok(ev)) = crossterm_events.next() => {
                if let Event::Key(key) = ev {
                    match handle_key(key, &mut state) {
                        KeyOutcome::Quit => break,
                        KeyOutcome::Continue(requests) => dispatch(requests, &backend, &reply_tx),
                    }
                }
                terminal.draw(|f| render::draw(f, &state))?;
            }
        }
    }

    tracing::info!("tui exiting");
    Ok(())
}

// ── Key handler ───────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    Quit,
    Continue(Vec<Request>),
}

fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyOutcome {
    let mut requests = Vec::new();

    // ── Sidebar focused navigation ────────────────────────────────────────────
    if state.view.sidebar_focused && state.sidebar_visible {
        match key.code {
            KeyCode::Up => {
                state.view.history.select_prev();
                return KeyOutcome::Continue(requests);
            }
            KeyCode::Down => {
                state.view.history.select_next();
                return KeyOutcome::Continue(requests);
            }
            KeyCode::Enter => {
                if let Some(entry) = state.view.history.selected_entry().cloned() {
                    requests.extend(state.controller.select_history(&entry, &mut state.view));
                }
                return KeyOutcome::Continue(requests);
            }
            KeyCode::Delete | KeyCode::Char('d') if key.modifiers == KeyModifiers::NONE => {
                let id = state
                    .view
                    .history
                    .entries()
                    .nth(state.view.history.selected())
                    .filter(|e| !e.leaving)
                    .map(|e| e.entry.id);
                if let Some(id) = id {
                    requests.push(state.controller.delete_history(id));
                }
                return KeyOutcome::Continue(requests);
            }
            KeyCode::Esc | KeyCode::Tab => {
                state.view.sidebar_focused = false;
                return KeyOutcome::Continue(requests);
            }
            // Any other char typed while sidebar is focused: unfocus and pass through
            KeyCode::Char(_) if key.modifiers.difference(KeyModifiers::SHIFT).is_empty() => {
                state.view.sidebar_focused = false;
            }
            KeyCode::Char(_) => {}
            _ => return KeyOutcome::Continue(requests),
        }
    }

    let view = &mut state.view;
    match (key.modifiers, key.code) {
        // Ctrl+C / Ctrl+D — quit
        (KeyModifiers::CONTROL, KeyCode::Char('c')) | (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
            return KeyOutcome::Quit;
        }
        // Ctrl+B — toggle sidebar visible (does not change focus)
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => {
            state.sidebar_visible = !state.sidebar_visible;
            if !state.sidebar_visible {
                view.sidebar_focused = false;
            }
        }
        // Ctrl+N — new chat
        (KeyModifiers::CONTROL, KeyCode::Char('n')) => {
            state.controller.new_chat(view);
        }
        // Ctrl+G — search mode toggle
        (KeyModifiers::CONTROL, KeyCode::Char('g')) => {
            state.controller.toggle_search();
        }
        // Ctrl+R — reload history
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => {
            requests.push(state.controller.load_history());
        }
        // Tab — focus the sidebar
        (KeyModifiers::NONE, KeyCode::Tab) if state.sidebar_visible => {
            view.sidebar_focused = true;
        }
        // Enter — submit input
        (KeyModifiers::NONE, KeyCode::Enter) => {
            let text = view.input.clone();
            requests.extend(state.controller.send(&text, view));
        }
        (KeyModifiers::NONE, KeyCode::Backspace) => {
            input_backspace(&mut view.input, &mut view.cursor);
        }
        (KeyModifiers::NONE, KeyCode::Delete) => {
            input_delete_forward(&mut view.input, &mut view.cursor);
        }
        // Ctrl+Backspace — delete word before cursor
        (KeyModifiers::CONTROL, KeyCode::Backspace) | (KeyModifiers::CONTROL, KeyCode::Char('w')) => {
            input_delete_word(&mut view.input, &mut view.cursor);
        }
        (KeyModifiers::NONE, KeyCode::Left) => {
            view.cursor = prev_char_boundary(&view.input, view.cursor);
        }
        (KeyModifiers::NONE, KeyCode::Right) => {
            view.cursor = next_char_boundary(&view.input, view.cursor);
        }
        (KeyModifiers::CONTROL, KeyCode::Left) => {
            view.cursor = word_left(&view.input, view.cursor);
        }
        (KeyModifiers::CONTROL, KeyCode::Right) => {
            view.cursor = word_right(&view.input, view.cursor);
        }
        // Home / Ctrl+A — go to start of input
        (KeyModifiers::NONE, KeyCode::Home) | (KeyModifiers::CONTROL, KeyCode::Char('a')) => {
            view.cursor = 0;
        }
        // End / Ctrl+E — go to end of input
        (KeyModifiers::NONE, KeyCode::End) | (KeyModifiers::CONTROL, KeyCode::Char('e')) => {
            view.cursor = view.input.len();
        }
        // Ctrl+U — clear line before cursor
        (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
            view.input.drain(..view.cursor);
            view.cursor = 0;
        }
        // Ctrl+K — clear from cursor to end
        (KeyModifiers::CONTROL, KeyCode::Char('k')) => {
            view.input.truncate(view.cursor);
        }
        (KeyModifiers::NONE, KeyCode::Up) => view.transcript.scroll_up(3),
        (KeyModifiers::NONE, KeyCode::Down) => view.transcript.scroll_down(3),
        (KeyModifiers::NONE, KeyCode::PageUp) => view.transcript.scroll_up(10),
        (KeyModifiers::NONE, KeyCode::PageDown) => view.transcript.scroll_down(10),
        // Regular char input — insert at cursor
        (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
            let mut buf = [0u8; 4];
            let s = c.encode_utf8(&mut buf);
            view.input.insert_str(view.cursor, s);
            view.cursor += s.len();
        }
        _ => {}
    }

    KeyOutcome::Continue(requests)
}

// ── Input editing helpers ─────────────────────────────────────────────────────

/// Remove the character immediately before the cursor (UTF-8 safe).
fn input_backspace(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let prev = prev_char_boundary(input, *cursor);
    input.drain(prev..*cursor);
    *cursor = prev;
}

fn input_delete_forward(input: &mut String, cursor: &mut usize) {
    if *cursor >= input.len() {
        return;
    }
    let next = next_char_boundary(input, *cursor);
    input.drain(*cursor..next);
}

fn input_delete_word(input: &mut String, cursor: &mut usize) {
    if *cursor == 0 {
        return;
    }
    let start = word_left(input, *cursor);
    input.drain(start..*cursor);
    *cursor = start;
}

fn prev_char_boundary(s: &str, pos: usize) -> usize {
    s[..pos.min(s.len())]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn next_char_boundary(s: &str, pos: usize) -> usize {
    s.get(pos..)
        .and_then(|rest| rest.chars().next())
        .map(|c| pos + c.len_utf8())
        .unwrap_or(s.len())
}

/// Start of the previous word (skip trailing spaces, then the word).
fn word_left(s: &str, mut pos: usize) -> usize {
    let bytes = s.as_bytes();
    while pos > 0 && bytes[pos - 1].is_ascii_whitespace() {
        pos -= 1;
    }
    while pos > 0 && !bytes[pos - 1].is_ascii_whitespace() {
        pos -= 1;
    }
    pos
}

/// Past the end of the next word to the right.
fn word_right(s: &str, mut pos: usize) -> usize {
    let bytes = s.as_bytes();
    let len = s.len();
    while pos < len && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    while pos < len && !bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        ApiError, ArticleId, ArticleRecord, HistoryEntry, HistoryGroups, ProcessPayload,
        ProcessReply,
    };
    use crate::config::ConfigFile;
    use crate::history::Bucket;
    use crate::timer::manual::ManualScheduler;
    use pretty_assertions::assert_eq;

    fn app() -> (AppState, ManualScheduler) {
        let sched = ManualScheduler::default();
        let resolved = ResolvedConfig::resolve(&ConfigFile::default(), None, None, None);
        let mut state = AppState::new(&resolved, Box::new(sched.clone()));
        state.sidebar_visible = true;
        (state, sched)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            handle_key(key(KeyCode::Char(c)), state);
        }
    }

    fn requests(outcome: KeyOutcome) -> Vec<Request> {
        match outcome {
            KeyOutcome::Continue(r) => r,
            KeyOutcome::Quit => panic!("unexpected quit"),
        }
    }

    fn entry(id: i64) -> HistoryEntry {
        HistoryEntry {
            id: ArticleId(id),
            short_title: format!("Entry {id}"),
            created_at: Some("10:30".into()),
        }
    }

    fn article(id: i64) -> ArticleRecord {
        ArticleRecord {
            id: Some(ArticleId(id)),
            title: "Title".into(),
            short_title: Some("Title".into()),
            authors: "A".into(),
            publish_date: None,
            sentiment: "Positive".into(),
            summary: "Sum".into(),
            url: "https://example.com/x".into(),
            top_image: None,
        }
    }

    fn load(state: &mut AppState, groups: HistoryGroups) {
        state.apply_reply(Reply::History(Ok(groups)));
    }

    #[test]
    fn test_enter_sends_url_and_clears_input() {
        let (mut state, sched) = app();
        type_text(&mut state, "example.com/news");
        let reqs = requests(handle_key(key(KeyCode::Enter), &mut state));
        assert_eq!(reqs.len(), 1);
        assert!(matches!(
            &reqs[0],
            Request::Process { payload: ProcessPayload::Url(u), .. } if u == "example.com/news"
        ));
        assert!(state.view.input.is_empty());
        assert_eq!(state.view.cursor, 0);
        assert!(state.view.indicator.is_visible());
        assert_eq!(sched.live(), 1);
    }

    #[test]
    fn test_blank_enter_does_nothing() {
        let (mut state, sched) = app();
        type_text(&mut state, "   ");
        assert!(requests(handle_key(key(KeyCode::Enter), &mut state)).is_empty());
        assert_eq!(state.view.input, "   ");
        assert!(state.view.transcript.shows_placeholder());
        assert_eq!(sched.live(), 0);
    }

    #[test]
    fn test_reply_leaves_no_stray_timers() {
        let (mut state, sched) = app();
        type_text(&mut state, "what happened today");
        let reqs = requests(handle_key(key(KeyCode::Enter), &mut state));
        let epoch = match &reqs[0] {
            Request::Process { epoch, .. } => *epoch,
            other => panic!("unexpected {other:?}"),
        };
        let follow = state.apply_reply(Reply::Processed {
            epoch,
            result: Ok(ProcessReply::Article { article: article(1), from_cache: false }),
        });
        assert_eq!(follow, vec![Request::LoadHistory]);
        assert!(!state.view.indicator.is_visible());
        // Only the typewriter is running now
        assert_eq!(sched.live(), 1);
        while state.view.transcript.is_typing() {
            state.view.on_timer(TimerKind::Typewriter);
        }
        assert_eq!(sched.live(), 0);
        assert_eq!(state.view.transcript.title(), "Title");
    }

    #[test]
    fn test_error_reply_hides_indicator() {
        let (mut state, sched) = app();
        type_text(&mut state, "q");
        let reqs = requests(handle_key(key(KeyCode::Enter), &mut state));
        let Request::Process { epoch, .. } = reqs[0].clone() else { panic!() };
        state.apply_reply(Reply::Processed {
            epoch,
            result: Err(ApiError::Transport("refused".into())),
        });
        assert!(!state.view.indicator.is_visible());
        assert_eq!(sched.live(), 0);
        assert_eq!(state.controller.phase(), Phase::Idle);
        let last = state.view.transcript.messages().last().unwrap();
        assert!(last.content.starts_with("❌ **Network Error:**"));
    }

    #[test]
    fn test_new_chat_mid_reveal_cancels_everything() {
        let (mut state, sched) = app();
        type_text(&mut state, "q");
        let reqs = requests(handle_key(key(KeyCode::Enter), &mut state));
        let Request::Process { epoch, .. } = reqs[0].clone() else { panic!() };
        state.apply_reply(Reply::Processed {
            epoch,
            result: Ok(ProcessReply::Search(crate::api::SearchAnswer { answer: "long answer".into() })),
        });
        assert!(state.view.transcript.is_typing());
        handle_key(ctrl('n'), &mut state);
        assert_eq!(sched.live(), 0);
        assert!(state.view.transcript.shows_placeholder());
        assert_eq!(state.view.transcript.title(), "New Chat");

        // Pressing it again changes nothing observable
        handle_key(ctrl('n'), &mut state);
        assert!(state.view.transcript.shows_placeholder());
        assert_eq!(state.view.history.active(), None);
        assert_eq!(sched.live(), 0);
    }

    #[test]
    fn test_sidebar_select_and_delete_active_entry() {
        let (mut state, sched) = app();
        load(
            &mut state,
            HistoryGroups { today: vec![entry(1)], week: vec![entry(2)], older: vec![] },
        );
        assert_eq!(state.view.history.sections().len(), 2);

        handle_key(key(KeyCode::Tab), &mut state);
        assert!(state.view.sidebar_focused);
        handle_key(key(KeyCode::Down), &mut state);
        let reqs = requests(handle_key(key(KeyCode::Enter), &mut state));
        let Request::GetArticle { epoch, entry: picked } = reqs[0].clone() else { panic!() };
        assert_eq!(picked.id, ArticleId(2));
        assert_eq!(state.view.history.active(), Some(ArticleId(2)));

        state.apply_reply(Reply::Article { epoch, entry: picked, result: Ok(article(2)) });
        assert_eq!(state.view.transcript.messages().len(), 2);
        assert!(!state.view.transcript.is_typing());

        let reqs = requests(handle_key(key(KeyCode::Char('d')), &mut state));
        assert_eq!(reqs, vec![Request::Delete { id: ArticleId(2) }]);
        state.apply_reply(Reply::Deleted { id: ArticleId(2), result: Ok(()) });
        assert!(state.view.transcript.shows_placeholder());
        assert_eq!(state.view.history.active(), None);
        assert_eq!(sched.live(), 1);

        state.view.on_timer(TimerKind::Fade(ArticleId(2)));
        let buckets: Vec<Bucket> = state.view.history.sections().iter().map(|s| s.bucket).collect();
        assert_eq!(buckets, vec![Bucket::Today]);
        assert_eq!(sched.live(), 0);
    }

    #[test]
    fn test_typing_in_sidebar_returns_to_input() {
        let (mut state, _sched) = app();
        handle_key(key(KeyCode::Tab), &mut state);
        handle_key(key(KeyCode::Char('h')), &mut state);
        assert!(!state.view.sidebar_focused);
        assert_eq!(state.view.input, "h");
    }

    #[test]
    fn test_search_toggle_changes_route() {
        let (mut state, _sched) = app();
        handle_key(ctrl('g'), &mut state);
        type_text(&mut state, "https://example.com");
        let reqs = requests(handle_key(key(KeyCode::Enter), &mut state));
        assert!(matches!(&reqs[0], Request::Search { query, .. } if query == "https://example.com"));
    }

    #[test]
    fn test_ctrl_c_quits_and_ctrl_r_reloads() {
        let (mut state, _sched) = app();
        assert_eq!(handle_key(ctrl('c'), &mut state), KeyOutcome::Quit);
        assert_eq!(requests(handle_key(ctrl('r'), &mut state)), vec![Request::LoadHistory]);
    }

    #[test]
    fn test_input_editing_is_utf8_safe() {
        let mut s = String::from("héllo wörld");
        let mut cursor = s.len();
        input_delete_word(&mut s, &mut cursor);
        assert_eq!(s, "héllo ");
        input_backspace(&mut s, &mut cursor);
        input_backspace(&mut s, &mut cursor);
        input_backspace(&mut s, &mut cursor);
        input_backspace(&mut s, &mut cursor);
        assert_eq!(s, "hé");
        assert_eq!(prev_char_boundary(&s, s.len()), 1);
        assert_eq!(next_char_boundary(&s, 1), 3);
        cursor = 1;
        input_delete_forward(&mut s, &mut cursor);
        assert_eq!(s, "h");
        assert_eq!(word_right("ab  cd", 2), 6);
    }
}

/// Session controller: the conversation state machine.
///
/// The controller never touches the screen or the network directly:
///   - rendering goes through a `RenderPort` as `TranscriptOp` / `HistoryOp` values
///   - network work is returned as `Request` values; the caller runs them and
///     feeds the resulting `Reply` back into `handle_reply`
///
/// States: Idle → AwaitingResponse → Idle, with Error as a transient stop on
/// the failure path. `new_chat` and `select_history` start a new conversation
/// epoch; replies from an older epoch never render.
use crate::api::{
    ApiError, ArticleId, ArticleRecord, Backend, HistoryEntry, HistoryGroups, ProcessPayload,
    ProcessReply, SearchAnswer,
};
use crate::format;
use crate::transcript::Sender;

pub const NEW_CHAT_TITLE: &str = "New Chat";
pub const SEND_NETWORK_ERROR: &str = "❌ **Network Error:** Sorry, there was a problem connecting to the server. Please check your connection and try again.";
pub const LOAD_NETWORK_ERROR: &str = "❌ **Network Error:** Could not load the article.";

// ── Rendering port ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptOp {
    Clear,
    ShowPlaceholder,
    Append {
        content: String,
        sender: Sender,
        animate: bool,
    },
    ShowIndicator,
    HideIndicator,
    SetTitle(String),
    /// Empty the input box and give it focus
    ResetInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOp {
    Rebuild(HistoryGroups),
    MarkActive(Option<ArticleId>),
    Remove(ArticleId),
}

pub trait RenderPort {
    fn transcript(&mut self, op: TranscriptOp);
    fn history(&mut self, op: HistoryOp);
}

// ── Effects ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Epoch(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Process { epoch: Epoch, payload: ProcessPayload },
    Search { epoch: Epoch, query: String },
    LoadHistory,
    GetArticle { epoch: Epoch, entry: HistoryEntry },
    Delete { id: ArticleId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Processed { epoch: Epoch, result: Result<ProcessReply, ApiError> },
    Searched { epoch: Epoch, result: Result<SearchAnswer, ApiError> },
    History(Result<HistoryGroups, ApiError>),
    Article { epoch: Epoch, entry: HistoryEntry, result: Result<ArticleRecord, ApiError> },
    Deleted { id: ArticleId, result: Result<(), ApiError> },
}

impl Request {
    /// Perform the request against `backend`.
    pub async fn run(self, backend: &dyn Backend) -> Reply {
        match self {
            Request::Process { epoch, payload } => Reply::Processed {
                epoch,
                result: backend.process_article_or_query(&payload).await,
            },
            Request::Search { epoch, query } => Reply::Searched {
                epoch,
                result: backend.search_with_context(&query).await,
            },
            Request::LoadHistory => Reply::History(backend.get_history().await),
            Request::GetArticle { epoch, entry } => {
                let result = backend.get_article(entry.id).await;
                Reply::Article { epoch, entry, result }
            }
            Request::Delete { id } => Reply::Deleted {
                id,
                result: backend.delete_article(id).await,
            },
        }
    }
}

impl Reply {
    /// Whether handling this reply puts an error bubble in the transcript.
    /// History and delete failures are only logged.
    pub fn renders_error(&self) -> bool {
        match self {
            Reply::Processed { result, .. } => result.is_err(),
            Reply::Searched { result, .. } => result.is_err(),
            Reply::Article { result, .. } => result.is_err(),
            Reply::History(_) | Reply::Deleted { .. } => false,
        }
    }
}

/// Which endpoint a send goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Search(String),
    Process(ProcessPayload),
}

/// Search mode wins; otherwise URL-shaped input is a `{url}` payload.
pub fn route(text: &str, search_mode: bool) -> Route {
    if search_mode {
        Route::Search(text.to_string())
    } else if format::is_url(text) {
        Route::Process(ProcessPayload::Url(text.to_string()))
    } else {
        Route::Process(ProcessPayload::Query(text.to_string()))
    }
}

// ── State ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    AwaitingResponse,
    /// Transient: set while the error row is rendered, then back to Idle
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub phase: Phase,
    /// History entry of the conversation on screen; None = new chat
    pub active: Option<ArticleId>,
    pub search_mode: bool,
    pub epoch: Epoch,
}

#[derive(Debug, Default)]
pub struct Controller {
    state: SessionState,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Flip search mode; returns the new value.
    pub fn toggle_search(&mut self) -> bool {
        self.state.search_mode = !self.state.search_mode;
        tracing::debug!(search_mode = self.state.search_mode, "search mode toggled");
        self.state.search_mode
    }

    pub fn load_history(&self) -> Request {
        Request::LoadHistory
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase != phase {
            tracing::debug!(from = ?self.state.phase, to = ?phase, "session transition");
            self.state.phase = phase;
        }
    }

    fn next_epoch(&mut self) -> Epoch {
        self.state.epoch = Epoch(self.state.epoch.0 + 1);
        self.state.epoch
    }

    /// Idle --send(text)--> AwaitingResponse. Blank text, or a send while a
    /// reply is pending, does nothing.
    pub fn send(&mut self, text: &str, port: &mut dyn RenderPort) -> Option<Request> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if self.state.phase == Phase::AwaitingResponse {
            tracing::debug!("send ignored: reply pending");
            return None;
        }

        port.transcript(TranscriptOp::Append {
            content: text.to_string(),
            sender: Sender::User,
            animate: false,
        });
        port.transcript(TranscriptOp::ResetInput);
        port.transcript(TranscriptOp::ShowIndicator);
        self.set_phase(Phase::AwaitingResponse);

        let epoch = self.state.epoch;
        let request = match route(text, self.state.search_mode) {
            Route::Search(query) => Request::Search { epoch, query },
            Route::Process(payload) => Request::Process { epoch, payload },
        };
        tracing::debug!(?request, "send");
        Some(request)
    }

    /// Load a stored article into a fresh transcript. Selecting the entry that
    /// is already active does nothing.
    pub fn select_history(&mut self, entry: &HistoryEntry, port: &mut dyn RenderPort) -> Option<Request> {
        if self.state.active == Some(entry.id) {
            return None;
        }
        if self.state.phase == Phase::AwaitingResponse {
            port.transcript(TranscriptOp::HideIndicator);
        }
        let epoch = self.next_epoch();
        self.state.active = Some(entry.id);
        port.history(HistoryOp::MarkActive(Some(entry.id)));
        port.transcript(TranscriptOp::Clear);
        port.transcript(TranscriptOp::ShowIndicator);
        self.set_phase(Phase::AwaitingResponse);
        Some(Request::GetArticle { epoch, entry: entry.clone() })
    }

    /// Ask the backend to delete an entry. Nothing changes on screen until it answers.
    pub fn delete_history(&self, id: ArticleId) -> Request {
        Request::Delete { id }
    }

    /// any --new_chat--> Idle. Safe mid-request: the pending reply will not render.
    pub fn new_chat(&mut self, port: &mut dyn RenderPort) {
        if self.state.phase == Phase::AwaitingResponse {
            port.transcript(TranscriptOp::HideIndicator);
        }
        self.next_epoch();
        port.transcript(TranscriptOp::Clear);
        port.transcript(TranscriptOp::ShowPlaceholder);
        port.transcript(TranscriptOp::SetTitle(NEW_CHAT_TITLE.to_string()));
        self.state.active = None;
        port.history(HistoryOp::MarkActive(None));
        port.transcript(TranscriptOp::ResetInput);
        self.set_phase(Phase::Idle);
    }

    /// Apply a finished request. Returns follow-up requests (history reloads).
    pub fn handle_reply(&mut self, reply: Reply, port: &mut dyn RenderPort) -> Vec<Request> {
        match reply {
            Reply::Processed { epoch, result } => {
                if epoch != self.state.epoch {
                    return self.stale_process_reply(result);
                }
                self.settle(port);
                match result {
                    Ok(ProcessReply::Article { article, from_cache }) => {
                        self.show_article(article, from_cache, port)
                    }
                    Ok(ProcessReply::Search(answer)) => {
                        self.show_answer(answer, port);
                        Vec::new()
                    }
                    Err(e) => {
                        self.fail(&e, SEND_NETWORK_ERROR, port);
                        Vec::new()
                    }
                }
            }
            Reply::Searched { epoch, result } => {
                if epoch != self.state.epoch {
                    tracing::debug!("stale search reply dropped");
                    return Vec::new();
                }
                self.settle(port);
                match result {
                    Ok(answer) => self.show_answer(answer, port),
                    Err(e) => self.fail(&e, SEND_NETWORK_ERROR, port),
                }
                Vec::new()
            }
            Reply::History(Ok(groups)) => {
                port.history(HistoryOp::Rebuild(groups));
                port.history(HistoryOp::MarkActive(self.state.active));
                Vec::new()
            }
            Reply::History(Err(e)) => {
                tracing::warn!("history load failed: {e}");
                Vec::new()
            }
            Reply::Article { epoch, entry, result } => {
                if epoch != self.state.epoch {
                    tracing::debug!(id = %entry.id, "stale article reply dropped");
                    return Vec::new();
                }
                self.settle(port);
                match result {
                    Ok(article) => {
                        let title = match &article.short_title {
                            Some(t) if !t.trim().is_empty() => t.clone(),
                            _ => entry.short_title.clone(),
                        };
                        port.transcript(TranscriptOp::Append {
                            content: article.url.clone(),
                            sender: Sender::User,
                            animate: false,
                        });
                        port.transcript(TranscriptOp::Append {
                            content: format::format_article_response(&article),
                            sender: Sender::Assistant,
                            animate: false,
                        });
                        port.transcript(TranscriptOp::SetTitle(title));
                    }
                    Err(e) => self.fail(&e, LOAD_NETWORK_ERROR, port),
                }
                Vec::new()
            }
            Reply::Deleted { id, result: Ok(()) } => {
                if self.state.active == Some(id) {
                    self.new_chat(port);
                }
                port.history(HistoryOp::Remove(id));
                Vec::new()
            }
            Reply::Deleted { id, result: Err(e) } => {
                tracing::warn!(%id, "error deleting article: {e}");
                Vec::new()
            }
        }
    }

    /// AwaitingResponse → Idle: the indicator goes away before anything renders.
    fn settle(&mut self, port: &mut dyn RenderPort) {
        if self.state.phase == Phase::AwaitingResponse {
            port.transcript(TranscriptOp::HideIndicator);
        }
        self.set_phase(Phase::Idle);
    }

    fn show_article(
        &mut self,
        article: ArticleRecord,
        from_cache: bool,
        port: &mut dyn RenderPort,
    ) -> Vec<Request> {
        port.transcript(TranscriptOp::Append {
            content: format::format_article_response(&article),
            sender: Sender::Assistant,
            animate: true,
        });
        port.transcript(TranscriptOp::SetTitle(article.display_title()));
        self.state.active = article.id;
        port.history(HistoryOp::MarkActive(article.id));
        // Cache hits are assumed to be in the panel already
        if from_cache { Vec::new() } else { vec![Request::LoadHistory] }
    }

    fn show_answer(&mut self, answer: SearchAnswer, port: &mut dyn RenderPort) {
        port.transcript(TranscriptOp::Append {
            content: answer.answer,
            sender: Sender::Assistant,
            animate: true,
        });
    }

    fn stale_process_reply(&self, result: Result<ProcessReply, ApiError>) -> Vec<Request> {
        match result {
            Ok(ProcessReply::Article { from_cache: false, .. }) => {
                tracing::debug!("stale article reply: refreshing history only");
                vec![Request::LoadHistory]
            }
            _ => {
                tracing::debug!("stale process reply dropped");
                Vec::new()
            }
        }
    }

    /// AwaitingResponse --failure--> Error --render--> Idle
    fn fail(&mut self, err: &ApiError, network_message: &str, port: &mut dyn RenderPort) {
        self.set_phase(Phase::Error);
        let content = match err {
            ApiError::Application(msg) => format!("❌ **Error:** {msg}"),
            ApiError::Transport(reason) => {
                tracing::warn!("request failed: {reason}");
                network_message.to_string()
            }
        };
        port.transcript(TranscriptOp::Append {
            content,
            sender: Sender::Assistant,
            animate: false,
        });
        self.set_phase(Phase::Idle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct RecordingPort {
        transcript: Vec<TranscriptOp>,
        history: Vec<HistoryOp>,
    }

    impl RecordingPort {
        fn count(&self, op: &TranscriptOp) -> usize {
            self.transcript.iter().filter(|o| *o == op).count()
        }

        fn appended(&self) -> Vec<(String, Sender, bool)> {
            self.transcript
                .iter()
                .filter_map(|op| match op {
                    TranscriptOp::Append { content, sender, animate } => {
                        Some((content.clone(), *sender, *animate))
                    }
                    _ => None,
                })
                .collect()
        }
    }

    impl RenderPort for RecordingPort {
        fn transcript(&mut self, op: TranscriptOp) {
            self.transcript.push(op);
        }
        fn history(&mut self, op: HistoryOp) {
            self.history.push(op);
        }
    }

    fn article(id: i64) -> ArticleRecord {
        ArticleRecord {
            id: Some(ArticleId(id)),
            title: "Full title here".into(),
            short_title: Some("Short".into()),
            authors: "A".into(),
            publish_date: Some("May 01, 2025".into()),
            sentiment: "Neutral".into(),
            summary: "S".into(),
            url: "https://example.com/a".into(),
            top_image: None,
        }
    }

    fn entry(id: i64) -> HistoryEntry {
        HistoryEntry {
            id: ArticleId(id),
            short_title: format!("Entry {id}"),
            created_at: None,
        }
    }

    fn epoch_of(req: &Request) -> Epoch {
        match req {
            Request::Process { epoch, .. }
            | Request::Search { epoch, .. }
            | Request::GetArticle { epoch, .. } => *epoch,
            _ => panic!("request has no epoch: {req:?}"),
        }
    }

    #[test]
    fn test_route_by_input_shape() {
        assert_eq!(
            route("https://example.com/a", false),
            Route::Process(ProcessPayload::Url("https://example.com/a".into()))
        );
        assert_eq!(
            route("plain query", false),
            Route::Process(ProcessPayload::Query("plain query".into()))
        );
        assert_eq!(route("plain query", true), Route::Search("plain query".into()));
        assert_eq!(
            route("https://example.com/a", true),
            Route::Search("https://example.com/a".into())
        );
    }

    #[test]
    fn test_send_uses_search_toggle() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        assert!(c.toggle_search());
        let req = c.send("  plain query ", &mut port).unwrap();
        assert!(matches!(req, Request::Search { ref query, .. } if query == "plain query"));
        assert_eq!(c.phase(), Phase::AwaitingResponse);
        assert_eq!(
            port.transcript,
            vec![
                TranscriptOp::Append {
                    content: "plain query".into(),
                    sender: Sender::User,
                    animate: false
                },
                TranscriptOp::ResetInput,
                TranscriptOp::ShowIndicator,
            ]
        );
    }

    #[test]
    fn test_blank_send_is_noop() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        assert_eq!(c.send("   \n\t", &mut port), None);
        assert_eq!(c.phase(), Phase::Idle);
        assert!(port.transcript.is_empty());
    }

    #[test]
    fn test_send_while_awaiting_is_ignored() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        c.send("one", &mut port).unwrap();
        assert_eq!(c.send("two", &mut port), None);
        assert_eq!(port.count(&TranscriptOp::ShowIndicator), 1);
    }

    #[test]
    fn test_fresh_article_renders_and_reloads_history() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.send("https://example.com/a", &mut port).unwrap();
        let follow = c.handle_reply(
            Reply::Processed {
                epoch: epoch_of(&req),
                result: Ok(ProcessReply::Article { article: article(5), from_cache: false }),
            },
            &mut port,
        );
        assert_eq!(follow, vec![Request::LoadHistory]);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(c.state().active, Some(ArticleId(5)));
        assert_eq!(port.history, vec![HistoryOp::MarkActive(Some(ArticleId(5)))]);
        assert!(port.transcript.contains(&TranscriptOp::SetTitle("Short".into())));

        let appended = port.appended();
        let (reply, sender, animate) = appended.last().unwrap();
        assert_eq!(*sender, Sender::Assistant);
        assert!(*animate);
        assert!(reply.starts_with("**Full title here**"));

        // Indicator hidden before the reply row
        let hide = port.transcript.iter().position(|o| *o == TranscriptOp::HideIndicator);
        let last_append = port
            .transcript
            .iter()
            .rposition(|o| matches!(o, TranscriptOp::Append { .. }));
        assert!(hide < last_append);
    }

    #[test]
    fn test_cached_article_skips_history_reload() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.send("https://example.com/a", &mut port).unwrap();
        let follow = c.handle_reply(
            Reply::Processed {
                epoch: epoch_of(&req),
                result: Ok(ProcessReply::Article { article: article(5), from_cache: true }),
            },
            &mut port,
        );
        assert!(follow.is_empty());
    }

    #[test]
    fn test_article_without_id_clears_mark() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.send("https://example.com/a", &mut port).unwrap();
        let mut a = article(1);
        a.id = None;
        a.short_title = None;
        c.handle_reply(
            Reply::Processed {
                epoch: epoch_of(&req),
                result: Ok(ProcessReply::Article { article: a, from_cache: true }),
            },
            &mut port,
        );
        assert_eq!(c.state().active, None);
        assert_eq!(port.history, vec![HistoryOp::MarkActive(None)]);
        assert!(port.transcript.contains(&TranscriptOp::SetTitle("Full title here".into())));
    }

    #[test]
    fn test_search_answer_does_not_touch_history() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        c.toggle_search();
        let req = c.send("q", &mut port).unwrap();
        let follow = c.handle_reply(
            Reply::Searched {
                epoch: epoch_of(&req),
                result: Ok(SearchAnswer { answer: "42".into() }),
            },
            &mut port,
        );
        assert!(follow.is_empty());
        assert!(port.history.is_empty());
        assert_eq!(port.appended().last().unwrap(), &("42".to_string(), Sender::Assistant, true));
    }

    #[test]
    fn test_failures_render_error_and_return_to_idle() {
        for (err, expected) in [
            (
                ApiError::Application("Please enter a query or URL.".into()),
                "❌ **Error:** Please enter a query or URL.".to_string(),
            ),
            (ApiError::Transport("connection refused".into()), SEND_NETWORK_ERROR.to_string()),
        ] {
            let mut port = RecordingPort::default();
            let mut c = Controller::new();
            let req = c.send("plain query", &mut port).unwrap();
            let reply = Reply::Processed { epoch: epoch_of(&req), result: Err(err) };
            assert!(reply.renders_error());
            c.handle_reply(reply, &mut port);
            assert_eq!(c.phase(), Phase::Idle);
            assert_eq!(port.appended().last().unwrap(), &(expected, Sender::Assistant, false));
            assert_eq!(
                port.count(&TranscriptOp::ShowIndicator),
                port.count(&TranscriptOp::HideIndicator)
            );
        }
    }

    #[test]
    fn test_only_transcript_failures_render_errors() {
        let epoch = Epoch::default();
        let transport = || ApiError::Transport("timed out".into());
        assert!(Reply::Searched { epoch, result: Err(transport()) }.renders_error());
        assert!(Reply::Article { epoch, entry: entry(1), result: Err(transport()) }.renders_error());
        assert!(!Reply::History(Err(transport())).renders_error());
        assert!(!Reply::Deleted { id: ArticleId(1), result: Err(transport()) }.renders_error());
        assert!(
            !Reply::Processed {
                epoch,
                result: Ok(ProcessReply::Article { article: article(1), from_cache: true }),
            }
            .renders_error()
        );
    }

    #[test]
    fn test_new_chat_twice_matches_once() {
        let mut once = RecordingPort::default();
        let mut c1 = Controller::new();
        c1.new_chat(&mut once);

        let mut twice = RecordingPort::default();
        let mut c2 = Controller::new();
        c2.new_chat(&mut twice);
        let first_len = twice.transcript.len();
        c2.new_chat(&mut twice);

        assert_eq!(&twice.transcript[first_len..], &once.transcript[..]);
        assert_eq!(c1.phase(), c2.phase());
        assert_eq!(c1.state().active, c2.state().active);
        assert_eq!(c1.state().search_mode, c2.state().search_mode);
    }

    #[test]
    fn test_new_chat_mid_request_drops_the_reply() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.send("https://example.com/a", &mut port).unwrap();
        c.new_chat(&mut port);
        assert_eq!(c.phase(), Phase::Idle);
        assert_eq!(
            port.count(&TranscriptOp::ShowIndicator),
            port.count(&TranscriptOp::HideIndicator)
        );

        let ops_before = port.transcript.len();
        let history_before = port.history.len();
        let follow = c.handle_reply(
            Reply::Processed {
                epoch: epoch_of(&req),
                result: Ok(ProcessReply::Article { article: article(5), from_cache: false }),
            },
            &mut port,
        );
        assert_eq!(port.transcript.len(), ops_before);
        assert_eq!(port.history.len(), history_before);
        assert_eq!(c.state().active, None);
        assert_eq!(follow, vec![Request::LoadHistory]);
    }

    #[test]
    fn test_select_history_renders_without_typewriter() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.select_history(&entry(3), &mut port).unwrap();
        assert_eq!(c.phase(), Phase::AwaitingResponse);
        assert_eq!(port.history, vec![HistoryOp::MarkActive(Some(ArticleId(3)))]);
        assert_eq!(port.transcript, vec![TranscriptOp::Clear, TranscriptOp::ShowIndicator]);

        let mut a = article(3);
        a.short_title = None;
        c.handle_reply(
            Reply::Article { epoch: epoch_of(&req), entry: entry(3), result: Ok(a) },
            &mut port,
        );
        let appended = port.appended();
        assert_eq!(appended.len(), 2);
        assert_eq!(appended[0], ("https://example.com/a".to_string(), Sender::User, false));
        assert!(!appended[1].2);
        assert!(port.transcript.contains(&TranscriptOp::SetTitle("Entry 3".into())));
        assert_eq!(c.phase(), Phase::Idle);
    }

    #[test]
    fn test_select_active_entry_is_noop() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        c.select_history(&entry(3), &mut port).unwrap();
        assert_eq!(c.select_history(&entry(3), &mut port), None);
    }

    #[test]
    fn test_select_then_select_other_marks_only_latest() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let first = c.select_history(&entry(1), &mut port).unwrap();
        let second = c.select_history(&entry(2), &mut port).unwrap();
        assert_eq!(port.history.last(), Some(&HistoryOp::MarkActive(Some(ArticleId(2)))));
        assert_eq!(c.state().active, Some(ArticleId(2)));
        assert_eq!(
            port.count(&TranscriptOp::ShowIndicator),
            port.count(&TranscriptOp::HideIndicator) + 1
        );

        // The first load lands late and is dropped
        let ops = port.transcript.len();
        c.handle_reply(
            Reply::Article { epoch: epoch_of(&first), entry: entry(1), result: Ok(article(1)) },
            &mut port,
        );
        assert_eq!(port.transcript.len(), ops);

        c.handle_reply(
            Reply::Article { epoch: epoch_of(&second), entry: entry(2), result: Ok(article(2)) },
            &mut port,
        );
        assert_eq!(
            port.count(&TranscriptOp::ShowIndicator),
            port.count(&TranscriptOp::HideIndicator)
        );
    }

    #[test]
    fn test_select_failure_uses_load_message() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.select_history(&entry(3), &mut port).unwrap();
        c.handle_reply(
            Reply::Article {
                epoch: epoch_of(&req),
                entry: entry(3),
                result: Err(ApiError::Transport("timeout".into())),
            },
            &mut port,
        );
        assert_eq!(
            port.appended().last().unwrap(),
            &(LOAD_NETWORK_ERROR.to_string(), Sender::Assistant, false)
        );
    }

    #[test]
    fn test_delete_active_resets_to_new_chat() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        let req = c.select_history(&entry(3), &mut port).unwrap();
        c.handle_reply(
            Reply::Article { epoch: epoch_of(&req), entry: entry(3), result: Ok(article(3)) },
            &mut port,
        );
        let del = c.delete_history(ArticleId(3));
        assert_eq!(del, Request::Delete { id: ArticleId(3) });
        c.handle_reply(Reply::Deleted { id: ArticleId(3), result: Ok(()) }, &mut port);

        assert_eq!(c.state().active, None);
        assert!(port.transcript.contains(&TranscriptOp::ShowPlaceholder));
        assert_eq!(
            &port.history[port.history.len() - 2..],
            &[HistoryOp::MarkActive(None), HistoryOp::Remove(ArticleId(3))]
        );
    }

    #[test]
    fn test_delete_inactive_only_removes() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        c.handle_reply(Reply::Deleted { id: ArticleId(8), result: Ok(()) }, &mut port);
        assert!(port.transcript.is_empty());
        assert_eq!(port.history, vec![HistoryOp::Remove(ArticleId(8))]);
    }

    #[test]
    fn test_delete_failure_is_silent() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        c.handle_reply(
            Reply::Deleted { id: ArticleId(8), result: Err(ApiError::Application("nope".into())) },
            &mut port,
        );
        assert!(port.transcript.is_empty());
        assert!(port.history.is_empty());
    }

    #[test]
    fn test_history_reply_rebuilds_and_restores_mark() {
        let mut port = RecordingPort::default();
        let mut c = Controller::new();
        c.select_history(&entry(2), &mut port);
        port.history.clear();
        let groups = HistoryGroups { today: vec![entry(2)], ..Default::default() };
        c.handle_reply(Reply::History(Ok(groups.clone())), &mut port);
        assert_eq!(
            port.history,
            vec![HistoryOp::Rebuild(groups), HistoryOp::MarkActive(Some(ArticleId(2)))]
        );
    }
}

/// Conversation transcript: message rows, the welcome placeholder and the
/// typewriter reveal of assistant replies.
use std::time::Duration;

use crate::format;
use crate::timer::{Scheduler, TimerHandle, TimerKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub content: String,
    pub sender: Sender,
    /// False while the typewriter is still revealing raw characters
    pub rendered: bool,
    /// Byte offset of the revealed prefix
    revealed: usize,
}

impl Message {
    /// Formatted markup, once the row is fully rendered.
    pub fn markup(&self) -> Option<String> {
        self.rendered.then(|| format::format_content(&self.content))
    }

    /// Raw characters revealed so far.
    pub fn revealed_text(&self) -> &str {
        &self.content[..self.revealed]
    }
}

pub struct Transcript {
    messages: Vec<Message>,
    placeholder: bool,
    delay: Duration,
    typing: Option<(usize, TimerHandle)>,
    title: String,
    /// Lines scrolled up from the bottom
    pub scroll: usize,
}

impl Transcript {
    pub fn new(delay: Duration) -> Self {
        Self {
            messages: Vec::new(),
            placeholder: true,
            delay,
            typing: None,
            title: crate::session::NEW_CHAT_TITLE.to_string(),
            scroll: 0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn shows_placeholder(&self) -> bool {
        self.placeholder && self.messages.is_empty()
    }

    pub fn is_typing(&self) -> bool {
        self.typing.is_some()
    }

    pub fn append_message(
        &mut self,
        content: String,
        sender: Sender,
        animate: bool,
        scheduler: &dyn Scheduler,
    ) {
        self.placeholder = false;
        let typewriter = animate
            && sender == Sender::Assistant
            && !content.is_empty()
            && !self.delay.is_zero();
        if typewriter {
            // One reveal at a time: the previous one jumps to its final form
            self.finish_typewriter();
        }
        let revealed = if typewriter { 0 } else { content.len() };
        self.messages.push(Message {
            content,
            sender,
            rendered: !typewriter,
            revealed,
        });
        if typewriter {
            let handle = scheduler.every(TimerKind::Typewriter, self.delay);
            self.typing = Some((self.messages.len() - 1, handle));
        }
        self.scroll = 0;
    }

    /// Reveal one more character. Returns true while the reveal is still running.
    pub fn advance_typewriter(&mut self) -> bool {
        let Some((idx, _)) = &self.typing else { return false };
        let idx = *idx;
        let Some(msg) = self.messages.get_mut(idx) else {
            self.typing = None;
            return false;
        };
        if let Some(ch) = msg.content[msg.revealed..].chars().next() {
            msg.revealed += ch.len_utf8();
        }
        self.scroll = 0;
        if msg.revealed >= msg.content.len() {
            self.finish_typewriter();
            false
        } else {
            true
        }
    }

    fn finish_typewriter(&mut self) {
        if let Some((idx, timer)) = self.typing.take() {
            timer.cancel();
            if let Some(msg) = self.messages.get_mut(idx) {
                msg.revealed = msg.content.len();
                msg.rendered = true;
            }
        }
    }

    /// Remove every row, cancelling any running reveal.
    pub fn clear(&mut self) {
        if let Some((_, timer)) = self.typing.take() {
            timer.cancel();
        }
        self.messages.clear();
        self.placeholder = false;
        self.scroll = 0;
    }

    pub fn show_placeholder(&mut self) {
        self.placeholder = true;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll = self.scroll.saturating_sub(lines);
    }
}

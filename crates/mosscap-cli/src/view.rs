//! Terminal-independent state of the chat screen.
//!
//! The renderer in `app` only reads from [`ChatView`]; all editing and the
//! submit/result bookkeeping live here so they can be tested without a TTY.

use mosscap_core::{ContextBuilder, Transcript};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A line of UI feedback that is not part of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct ChatView {
    input: String,
    /// Cursor position in chars, not bytes.
    cursor: usize,
    input_history: Vec<String>,
    history_pos: Option<usize>,
    transcript: Transcript,
    pending: Option<String>,
    notices: Vec<Notice>,
    pub status_text: String,
    /// `usize::MAX` means "stick to the bottom".
    pub scroll_offset: usize,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            status_text: "Ready".into(),
            scroll_offset: usize::MAX,
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Approximate size of the history the next request will resend.
    pub fn context_tokens(&self, context: &ContextBuilder) -> usize {
        ContextBuilder::estimate_tokens(&context.build(&self.transcript, ""))
    }

    // ── Editing ─────────────────────────────────────────────────────────
    // The input is frozen while a submission is pending.

    pub fn insert_char(&mut self, c: char) {
        if self.is_pending() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
        self.history_pos = None;
    }

    pub fn backspace(&mut self) {
        if self.is_pending() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if !self.is_pending() && self.cursor < self.input.chars().count() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    pub fn clear_input(&mut self) {
        if self.is_pending() {
            return;
        }
        self.input.clear();
        self.cursor = 0;
        self.history_pos = None;
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        if self.is_pending() {
            return;
        }
        self.input = text.into();
        self.move_end();
    }

    pub fn history_prev(&mut self) {
        if self.is_pending() || self.input_history.is_empty() {
            return;
        }
        let pos = match self.history_pos {
            None => self.input_history.len() - 1,
            Some(0) => 0,
            Some(p) => p - 1,
        };
        self.history_pos = Some(pos);
        self.input = self.input_history[pos].clone();
        self.move_end();
    }

    pub fn history_next(&mut self) {
        if self.is_pending() {
            return;
        }
        match self.history_pos {
            None => {}
            Some(p) if p + 1 >= self.input_history.len() => {
                self.history_pos = None;
                self.input.clear();
                self.cursor = 0;
            }
            Some(p) => {
                self.history_pos = Some(p + 1);
                self.input = self.input_history[p + 1].clone();
                self.move_end();
            }
        }
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    // ── Submission ──────────────────────────────────────────────────────

    /// Hand the current input to the core. Returns `None` while a previous
    /// submission is still pending.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.pending.is_some() {
            return None;
        }
        let submitted = self.input.clone();
        self.pending = Some(submitted.clone());
        self.status_text = mosscap_core::constants::ui::THINKING.into();
        Some(submitted)
    }

    /// The core accepted the submission (a recorded turn, or a blank no-op).
    /// Clears the input and shows the latest transcript.
    pub fn finish_ok(&mut self, transcript: Transcript, recorded: bool) {
        if let Some(submitted) = self.pending.take() {
            if recorded {
                self.push_history(submitted.trim().to_string());
            }
        }
        self.transcript = transcript;
        self.clear_input();
        self.status_text = if recorded {
            format!("{} turns", self.transcript.len())
        } else {
            "Ready".into()
        };
        self.scroll_offset = usize::MAX;
    }

    /// The core rejected the submission. Puts the input back so it can be
    /// sent again, and reports the error.
    pub fn finish_err(&mut self, message: impl Into<String>) {
        if let Some(submitted) = self.pending.take() {
            self.input = submitted;
            self.move_end();
        }
        self.status_text = "Request failed".into();
        self.push_notice(NoticeKind::Error, message);
    }

    pub fn push_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notices.push(Notice {
            kind,
            text: text.into(),
        });
        self.scroll_offset = usize::MAX;
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push_notice(NoticeKind::Info, text);
    }

    fn push_history(&mut self, entry: String) {
        if entry.is_empty() || self.input_history.last() == Some(&entry) {
            return;
        }
        self.input_history.push(entry);
        self.history_pos = None;
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    /// Pin the scroll offset to the content actually rendered.
    pub fn resolve_scroll(&mut self, total_lines: usize, visible_height: usize) -> usize {
        let max_scroll = total_lines.saturating_sub(visible_height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }
        self.scroll_offset
    }
}

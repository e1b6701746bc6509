use knowledge_bot_core::{Conversation, PendingTurn, QueryClient};
use ratatui::layout::Rect;
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub conversation: Conversation,
    pub client: QueryClient,

    // Input box
    pub input: String,
    pub cursor: usize,

    // Chat pane
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    pub animation_frame: u8,
}

impl App {
    pub fn new(client: QueryClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            conversation: Conversation::new(),
            client,
            input: String::new(),
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    /// Append the typed text as a new turn and clear the input box.
    ///
    /// Returns the pending turn and the question to send, or `None` if the
    /// input is blank or a query is already outstanding (input is kept then).
    pub fn submit_input(&mut self) -> Option<(PendingTurn, String)> {
        let question = self.input.trim().to_string();
        let turn = self.conversation.append_user_turn(&question)?;

        self.input.clear();
        self.cursor = 0;
        self.scroll_chat_to_bottom();
        Some((turn, question))
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Rows the chat pane contents take once wrapped to the pane width
    pub fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 { self.chat_width } else { 50 };

        let rows = ui::chat_paragraph(ui::chat_text(self)).line_count(wrap_width);
        u16::try_from(rows).unwrap_or(u16::MAX)
    }

    /// Scroll chat to bottom so the newest turn is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let visible = if self.chat_height > 0 { self.chat_height } else { 10 };
        self.chat_scroll = self.chat_line_count().saturating_sub(visible);
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.chat_line_count().saturating_sub(self.chat_height.max(1));
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.chat_height / 2).max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use knowledge_bot_core::{QueryResponse, Source};

    fn app() -> App {
        App::new(QueryClient::new(None))
    }

    #[test]
    fn test_submit_clears_input_and_appends_turns() {
        let mut app = app();
        app.input = "  hello ".to_string();
        app.cursor = 8;

        let (turn, question) = app.submit_input().unwrap();

        assert_eq!(question, "hello");
        assert_eq!(turn.index(), 1);
        assert!(app.input.is_empty());
        assert_eq!(app.cursor, 0);
        assert_eq!(app.conversation.len(), 2);
        assert!(app.is_busy());
    }

    #[test]
    fn test_submit_while_busy_keeps_input() {
        let mut app = app();
        app.input = "first".to_string();
        app.submit_input().unwrap();

        app.input = "second".to_string();
        assert!(app.submit_input().is_none());
        assert_eq!(app.input, "second");
        assert_eq!(app.conversation.len(), 2);
    }

    #[test]
    fn test_blank_submit_is_ignored() {
        let mut app = app();
        app.input = "   ".to_string();
        assert!(app.submit_input().is_none());
        assert!(app.conversation.is_empty());
    }

    #[test]
    fn test_animation_only_runs_while_busy() {
        let mut app = app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.input = "q".to_string();
        app.submit_input();
        app.tick_animation();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);
    }

    #[test]
    fn test_line_count_wraps_long_lines() {
        let mut app = app();
        app.chat_width = 10;
        app.input = "x".repeat(25);
        let (turn, _) = app.submit_input().unwrap();
        app.conversation.resolve_pending(
            turn,
            QueryResponse {
                answer: "short".to_string(),
                sources: vec![],
            },
        );

        // user: role + 3 wrapped + blank, bot: role + 1 + blank
        assert_eq!(app.chat_line_count(), 8);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut app = app();
        // Wide enough that the welcome text fits in the pane
        app.chat_width = 200;
        app.chat_height = 5;
        app.scroll_down(10);
        assert_eq!(app.chat_scroll, 0);
        app.scroll_up(3);
        assert_eq!(app.chat_scroll, 0);
    }

    #[test]
    fn test_line_count_follows_word_wrapping() {
        let mut app = app();
        app.chat_width = 22;
        app.input = "q".to_string();
        let (turn, _) = app.submit_input().unwrap();
        // Two 13-char words can't share a 22-wide row, though 27 chars fit in two
        app.conversation.resolve_pending(
            turn,
            QueryResponse {
                answer: "aaaaaaaaaaaaa bbbbbbbbbbbbb".to_string(),
                sources: vec![],
            },
        );

        // user: role + 1 + blank, bot: role + 2 + blank
        assert_eq!(app.chat_line_count(), 7);
    }

    #[test]
    fn test_line_count_includes_multiline_sources() {
        let mut app = app();
        app.chat_width = 60;
        app.input = "q".to_string();
        let (turn, _) = app.submit_input().unwrap();
        app.conversation.resolve_pending(
            turn,
            QueryResponse {
                answer: "a".to_string(),
                sources: vec![Source(serde_json::json!("first line\nsecond line"))],
            },
        );

        // user: 3, bot: role + answer + "Sources:" + 2 source rows + blank
        assert_eq!(app.chat_line_count(), 9);
    }
}

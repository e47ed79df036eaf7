//! Application state for the chat TUI.
//!
//! `App` wraps the chat controller with everything the terminal needs
//! on top of it: the input buffer and cursor, sidebar selection, chat
//! scroll position, status/error lines, and the streaming spinner.

use quillgen_api::HttpBackend;
use quillgen_chat::{ChatController, ChatError, GenerationEvent, Phase};
use quillgen_core::SessionId;

/// Application state.
pub struct App {
    /// The interaction core.
    pub chat: ChatController<HttpBackend>,
    /// Current input buffer.
    pub input: String,
    /// Cursor position in the input buffer.
    pub cursor_position: usize,
    /// Highlighted row in the sessions sidebar.
    pub selected_session: Option<usize>,
    /// Chat scroll offset, in lines up from the bottom.
    pub chat_scroll: usize,
    /// Status message to display.
    pub status_message: Option<String>,
    /// Error message to display.
    pub error_message: Option<String>,
    /// Whether the app should quit.
    pub should_quit: bool,
    /// Animation frame counter for the streaming spinner.
    pub animation_frame: usize,
    backend_url: String,
    username: String,
}

impl App {
    /// Create the application state.
    pub fn new(
        chat: ChatController<HttpBackend>,
        backend_url: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            input: String::new(),
            cursor_position: 0,
            selected_session: None,
            chat_scroll: 0,
            status_message: None,
            error_message: None,
            should_quit: false,
            animation_frame: 0,
            backend_url: backend_url.into(),
            username: username.into(),
        }
    }

    /// Backend URL, for the header bar.
    #[must_use]
    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    /// Logged-in username, for the header bar.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Tick the animation frame (call on each render).
    pub fn tick_animation(&mut self) {
        self.animation_frame = self.animation_frame.wrapping_add(1);
    }

    /// Current spinner character for the streaming indicator.
    #[must_use]
    pub fn spinner_char(&self) -> &'static str {
        const SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER[self.animation_frame % SPINNER.len()]
    }

    /// Whether a generation is in flight (streaming or cancelling).
    #[must_use]
    pub fn is_generating(&self) -> bool {
        matches!(self.chat.phase(), Phase::Streaming | Phase::Cancelling)
    }

    /// Set the status message (also clears any error).
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.error_message = None;
    }

    /// Set the error message.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error_message = Some(message.into());
    }

    /// Clear the error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    // =========================================================================
    // Sidebar Navigation
    // =========================================================================

    /// Move selection up in the sessions list.
    pub fn select_prev_session(&mut self) {
        let count = self.chat.registry().sessions().len();
        if count == 0 {
            return;
        }
        self.selected_session = Some(match self.selected_session {
            Some(0) | None => count - 1,
            Some(i) => i - 1,
        });
    }

    /// Move selection down in the sessions list.
    pub fn select_next_session(&mut self) {
        let count = self.chat.registry().sessions().len();
        if count == 0 {
            return;
        }
        self.selected_session = Some(match self.selected_session {
            Some(i) if i + 1 < count => i + 1,
            _ => 0,
        });
    }

    /// Id of the highlighted session, if any.
    #[must_use]
    pub fn selected_session_id(&self) -> Option<SessionId> {
        let index = self.selected_session?;
        self.chat
            .registry()
            .sessions()
            .get(index)
            .map(|s| s.session_id)
    }

    /// Open the highlighted session, replacing the transcript.
    pub async fn open_selected_session(&mut self) {
        let Some(id) = self.selected_session_id() else {
            return;
        };
        match self.chat.select_session(id).await {
            Ok(()) => {
                self.chat_scroll = 0;
                self.set_status("Loaded session");
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Start a new conversation.
    pub fn new_chat(&mut self) {
        match self.chat.start_new_session() {
            Ok(_) => {
                self.chat_scroll = 0;
                self.set_status("New chat");
            }
            Err(e) => self.set_error(e.to_string()),
        }
    }

    /// Delete the highlighted session backend-side.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Auth`] when the credential is rejected.
    pub async fn delete_selected_session(&mut self) -> Result<(), ChatError> {
        let Some(id) = self.selected_session_id() else {
            return Ok(());
        };
        match self.chat.delete_session(id).await {
            Ok(()) => {
                self.selected_session = None;
                self.set_status("Session deleted");
                Ok(())
            }
            Err(e) if e.is_auth() => Err(e),
            Err(e) => {
                self.set_error(e.to_string());
                Ok(())
            }
        }
    }

    // =========================================================================
    // Chat Scrolling
    // =========================================================================

    /// Scroll chat up (view older messages).
    pub fn scroll_chat_up(&mut self, amount: usize) {
        self.chat_scroll = self.chat_scroll.saturating_add(amount);
    }

    /// Scroll chat down (view newer messages).
    pub fn scroll_chat_down(&mut self, amount: usize) {
        self.chat_scroll = self.chat_scroll.saturating_sub(amount);
    }

    // =========================================================================
    // Input Handling
    // =========================================================================

    /// Insert a character at the cursor position.
    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor_position, c);
        self.cursor_position += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let prev = self.input[..self.cursor_position]
                .chars()
                .next_back()
                .map_or(0, char::len_utf8);
            self.cursor_position -= prev;
            self.input.remove(self.cursor_position);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete_char_forward(&mut self) {
        if self.cursor_position < self.input.len() {
            self.input.remove(self.cursor_position);
        }
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        let prev = self.input[..self.cursor_position]
            .chars()
            .next_back()
            .map_or(0, char::len_utf8);
        self.cursor_position -= prev;
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        let next = self.input[self.cursor_position..]
            .chars()
            .next()
            .map_or(0, char::len_utf8);
        self.cursor_position += next;
    }

    /// Move cursor to the start.
    pub fn move_cursor_start(&mut self) {
        self.cursor_position = 0;
    }

    /// Move cursor to the end.
    pub fn move_cursor_end(&mut self) {
        self.cursor_position = self.input.len();
    }

    /// Clear the input.
    pub fn clear_input(&mut self) {
        self.input.clear();
        self.cursor_position = 0;
    }

    /// Take the current input (clears it).
    pub fn take_input(&mut self) -> String {
        let input = std::mem::take(&mut self.input);
        self.cursor_position = 0;
        input
    }

    // =========================================================================
    // Generation
    // =========================================================================

    /// Cancel the in-flight generation.
    pub fn cancel_generation(&mut self) {
        if self.chat.cancel() {
            self.set_status("Cancelling...");
        }
    }

    /// Apply one generation event.
    ///
    /// Returns `true` when the UI should redraw immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::Auth`] when the post-completion refresh
    /// finds the credential rejected.
    pub async fn handle_generation_event(
        &mut self,
        event: GenerationEvent,
    ) -> Result<bool, ChatError> {
        let status = match &event {
            GenerationEvent::Chunk(_) => None,
            GenerationEvent::Completed => Some("Ready"),
            GenerationEvent::Cancelled => Some("Cancelled"),
            GenerationEvent::Failed(_) => Some("Generation failed"),
        };
        self.chat.handle_event(event).await?;

        if let Some(status) = status {
            let refresh_error = self.chat.last_refresh_error().map(ToString::to_string);
            match refresh_error {
                Some(e) => self.set_error(e),
                None => self.set_status(status),
            }
        }
        self.chat_scroll = 0;
        Ok(true)
    }
}

//! UI rendering with ratatui.
//!
//! Two-column layout: sessions sidebar on the left, transcript and
//! input on the right, with a header and a status bar. Generated
//! content is rendered as plain text.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;

use quillgen_chat::Phase;

use crate::app::App;

/// Render the UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header_bar(frame, app, main_layout[0]);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(28), // Left: sessions
            Constraint::Percentage(72), // Right: transcript + input
        ])
        .split(main_layout[1]);

    render_sessions_panel(frame, app, content_layout[0]);
    render_chat_column(frame, app, content_layout[1]);
    render_status_bar(frame, app, main_layout[2]);
}

/// Truncate a string in the middle with ellipsis if it exceeds `max_len`.
fn truncate_middle(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    if max_len < 5 {
        return s.chars().take(max_len).collect();
    }
    let keep = (max_len - 3) / 2;
    let start: String = s.chars().take(keep).collect();
    let end: String = s
        .chars()
        .rev()
        .take(keep)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("{start}...{end}")
}

/// Render the header bar with app name, user, and backend URL.
fn render_header_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "QUILLGEN";
    let user = format!(" {}", app.username());

    let max_url_width = (area.width as usize / 2).saturating_sub(4);
    let display_url = truncate_middle(app.backend_url(), max_url_width);

    let right_text = format!("[{display_url}]");
    let used = title.len() + user.chars().count() + right_text.len();
    let padding = (area.width as usize).saturating_sub(used);

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(user, Style::default().fg(Color::Gray)),
        Span::raw(" ".repeat(padding)),
        Span::raw(right_text),
    ]);

    let header = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Render the sessions panel.
fn render_sessions_panel(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Sessions ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let active = app.chat.registry().active();
    let items: Vec<ListItem> = app
        .chat
        .registry()
        .sessions()
        .iter()
        .map(|session| {
            let marker = if Some(session.session_id) == active {
                Span::styled("* ", Style::default().fg(Color::Cyan))
            } else {
                Span::raw("  ")
            };
            ListItem::new(Line::from(vec![marker, Span::raw(session.label())]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.selected_session);

    frame.render_stateful_widget(list, area, &mut state);
}

/// Render the right column: transcript above, input below.
fn render_chat_column(frame: &mut Frame, app: &App, area: Rect) {
    let column = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    render_transcript(frame, app, column[0]);
    render_input(frame, app, column[1]);
}

/// Render the transcript pane.
fn render_transcript(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.chat.registry().active_session() {
        Some(session) => format!(" {} ", session.label()),
        None => " Chat ".to_string(),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let mut lines: Vec<Line> = Vec::new();
    let messages = app.chat.messages();
    let streaming = app.chat.transcript().has_open();

    for (i, message) in messages.iter().enumerate() {
        for (j, prompt_line) in message.prompt.lines().enumerate() {
            let prefix = if j == 0 { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(prefix, Style::default().fg(Color::Blue)),
                Span::styled(
                    prompt_line.to_string(),
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        let is_open = streaming && i + 1 == messages.len();
        if message.response.is_empty() && is_open {
            lines.push(Line::from(Span::raw("▌")));
        } else {
            let last_line = message.response.lines().count().saturating_sub(1);
            for (j, response_line) in message.response.lines().enumerate() {
                let mut text = response_line.to_string();
                if is_open && j == last_line {
                    text.push('▌');
                }
                lines.push(Line::from(Span::raw(text)));
            }
        }
        lines.push(Line::default());
    }

    // Pin the view to the bottom, minus the scroll offset.
    let height = area.height.saturating_sub(2) as usize;
    let offset = lines
        .len()
        .saturating_sub(height)
        .saturating_sub(app.chat_scroll);

    let transcript = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((u16::try_from(offset).unwrap_or(u16::MAX), 0));

    frame.render_widget(transcript, area);
}

/// Render the input line.
fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let (title, border_color) = match app.chat.phase() {
        Phase::Idle => (" Prompt ".to_string(), Color::Cyan),
        Phase::Submitting => (" Submitting... ".to_string(), Color::Yellow),
        Phase::Streaming => (
            format!(" {} Generating (Esc to cancel) ", app.spinner_char()),
            Color::Yellow,
        ),
        Phase::Cancelling => (" Cancelling... ".to_string(), Color::Red),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let input = Paragraph::new(app.input.as_str()).block(block);
    frame.render_widget(input, area);

    if app.chat.phase() == Phase::Idle {
        let cursor_x = app.input[..app.cursor_position].chars().count();
        frame.set_cursor_position((
            area.x + 1 + u16::try_from(cursor_x).unwrap_or(0),
            area.y + 1,
        ));
    }
}

/// Render the status bar.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(error) = &app.error_message {
        Line::from(vec![
            Span::styled("error: ", Style::default().fg(Color::Red)),
            Span::styled(error.clone(), Style::default().fg(Color::Red)),
        ])
    } else if let Some(status) = &app.status_message {
        Line::from(Span::raw(status.clone()))
    } else {
        Line::from(vec![
            Span::styled("Enter", Style::default().fg(Color::Yellow)),
            Span::raw(" send  "),
            Span::styled("^N", Style::default().fg(Color::Yellow)),
            Span::raw(" new chat  "),
            Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
            Span::raw(" sessions  "),
            Span::styled("^D", Style::default().fg(Color::Yellow)),
            Span::raw(" delete  "),
            Span::styled("^C", Style::default().fg(Color::Yellow)),
            Span::raw(" quit"),
        ])
    };

    let status = Paragraph::new(line).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_middle_short_strings_pass_through() {
        assert_eq!(truncate_middle("short", 20), "short");
    }

    #[test]
    fn truncate_middle_keeps_both_ends() {
        let out = truncate_middle("http://backend.example.com:8000", 15);
        assert!(out.starts_with("http"));
        assert!(out.contains("..."));
        assert!(out.len() <= 15);
    }
}

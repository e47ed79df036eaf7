//! Quillgen terminal client.
//!
//! This is the entry point for the `quill` binary: login, signup and
//! logout subcommands, and the chat TUI when run bare.

mod app;
mod ui;

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use quillgen_api::{ApiConfig, HttpBackend};
use quillgen_auth::{AuthClient, CredentialStore, Role};
use quillgen_chat::{ChatController, ChatError, GenerationEvent};

use app::App;

/// Quillgen - terminal client for the content-generation backend.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend URL.
    #[arg(
        long,
        env = "QUILLGEN_BACKEND",
        default_value = "http://127.0.0.1:8000"
    )]
    backend: String,

    /// Enable debug logging to stderr.
    #[arg(long, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and store the bearer token.
    Login {
        /// Account username.
        username: String,
    },
    /// Create an account and store the bearer token.
    Signup {
        /// Account username.
        username: String,
        /// Account role.
        #[arg(long, default_value_t = Role::Viewer)]
        role: Role,
    },
    /// Clear the stored bearer token.
    Logout,
}

/// Why the chat loop ended.
enum Outcome {
    /// The user quit.
    Quit,
    /// The backend rejected the credential; return to login.
    AuthRejected,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.debug {
        tracing_subscriber::fmt()
            .with_env_filter("quillgen=debug,warn")
            .with_writer(io::stderr)
            .init();
    }

    let store = CredentialStore::default_location()?;

    match &args.command {
        Some(Command::Login { username }) => login(&args.backend, &store, username).await,
        Some(Command::Signup { username, role }) => {
            signup(&args.backend, &store, username, *role).await
        }
        Some(Command::Logout) => {
            store.clear()?;
            println!("Logged out.");
            Ok(())
        }
        None => run_chat(&args, &store).await,
    }
}

/// Log in and persist the credential.
async fn login(backend: &str, store: &CredentialStore, username: &str) -> anyhow::Result<()> {
    let password = read_password("Password: ")?;
    let client = AuthClient::new(backend);

    match client.login(username, &password).await {
        Ok(credentials) => {
            store.save(&credentials)?;
            println!("Logged in as {username}.");
            Ok(())
        }
        Err(e) if e.is_rejection() => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Create an account and persist the credential.
async fn signup(
    backend: &str,
    store: &CredentialStore,
    username: &str,
    role: Role,
) -> anyhow::Result<()> {
    let password = read_password("Password: ")?;
    let client = AuthClient::new(backend);

    match client.signup(username, &password, role).await {
        Ok(credentials) => {
            store.save(&credentials)?;
            println!("Signed up as {username} ({role}).");
            Ok(())
        }
        Err(e) if e.is_rejection() => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Read a password from the terminal without echoing it.
fn read_password(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}");
    io::stderr().flush()?;

    enable_raw_mode()?;
    let mut password = String::new();
    let entered = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Enter => break Ok(std::mem::take(&mut password)),
                KeyCode::Backspace => {
                    password.pop();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    break Err(anyhow::anyhow!("interrupted"));
                }
                KeyCode::Char(c) => password.push(c),
                _ => {}
            },
            Ok(_) => {}
            Err(e) => break Err(e.into()),
        }
    };
    disable_raw_mode()?;
    eprintln!();
    entered
}

/// Run the chat TUI.
async fn run_chat(args: &Args, store: &CredentialStore) -> anyhow::Result<()> {
    let Some(credentials) = store.load()? else {
        eprintln!("Not logged in. Run `quill login <username>` first.");
        std::process::exit(2);
    };
    let username = credentials.username.clone();

    let backend = Arc::new(HttpBackend::new(ApiConfig::new(&args.backend), credentials));
    let mut app = App::new(ChatController::new(backend), &args.backend, username);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend_term = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend_term)?;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    match result? {
        Outcome::Quit => Ok(()),
        Outcome::AuthRejected => {
            store.clear()?;
            eprintln!("Credential rejected by the backend. Run `quill login <username>` to log in again.");
            std::process::exit(2);
        }
    }
}

/// Main event loop with real-time streaming support.
///
/// Generation events trigger an immediate redraw so streamed text
/// appears as it arrives.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<Outcome> {
    // Channel the generation pump task feeds into.
    let (gen_tx, mut gen_rx) = mpsc::channel::<GenerationEvent>(128);

    // Initial session load.
    if app.chat.refresh_sessions().await.is_err() {
        return Ok(Outcome::AuthRejected);
    }
    let initial_error = app.chat.last_refresh_error().map(ToString::to_string);
    if let Some(e) = initial_error {
        tracing::warn!(error = %e, "initial session load failed");
        app.set_error(e);
    }

    loop {
        app.tick_animation();
        terminal.draw(|f| ui::render(f, app))?;

        // Shorter tick while streaming keeps the spinner smooth.
        let tick_rate = if app.is_generating() {
            Duration::from_millis(80)
        } else {
            Duration::from_millis(100)
        };

        tokio::select! {
            // Terminal events - poll with short timeout
            () = tokio::time::sleep(tick_rate) => {
                while event::poll(Duration::from_millis(0)).unwrap_or(false) {
                    if let Ok(evt) = event::read() {
                        if let Some(outcome) = handle_input(app, evt, &gen_tx).await? {
                            return Ok(outcome);
                        }
                    }
                }
            }

            // Generation events - immediate redraw for live streaming
            Some(event) = gen_rx.recv() => {
                match app.handle_generation_event(event).await {
                    Ok(redraw) => {
                        if redraw {
                            terminal.draw(|f| ui::render(f, app))?;
                        }
                    }
                    Err(e) if e.is_auth() => return Ok(Outcome::AuthRejected),
                    Err(e) => app.set_error(e.to_string()),
                }
            }
        }

        if app.should_quit {
            return Ok(Outcome::Quit);
        }
    }
}

/// Handle one terminal event.
async fn handle_input(
    app: &mut App,
    event: Event,
    gen_tx: &mpsc::Sender<GenerationEvent>,
) -> anyhow::Result<Option<Outcome>> {
    match event {
        Event::Key(key) => {
            if key.kind != KeyEventKind::Press {
                return Ok(None);
            }
            return handle_key(app, key.code, key.modifiers, gen_tx).await;
        }
        Event::Mouse(mouse) => match mouse.kind {
            MouseEventKind::ScrollUp => app.scroll_chat_up(3),
            MouseEventKind::ScrollDown => app.scroll_chat_down(3),
            _ => {}
        },
        _ => {}
    }

    Ok(None)
}

/// Handle one key press.
async fn handle_key(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    gen_tx: &mpsc::Sender<GenerationEvent>,
) -> anyhow::Result<Option<Outcome>> {
    // Esc cancels a running generation, else dismisses an error.
    if code == KeyCode::Esc {
        if app.is_generating() {
            app.cancel_generation();
        } else if app.error_message.is_some() {
            app.clear_error();
        }
        return Ok(None);
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        match code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('n') => app.new_chat(),
            KeyCode::Char('d') => {
                if app.delete_selected_session().await.is_err() {
                    return Ok(Some(Outcome::AuthRejected));
                }
            }
            KeyCode::Char('a') => app.move_cursor_start(),
            KeyCode::Char('e') => app.move_cursor_end(),
            KeyCode::Char('u') => app.clear_input(),
            KeyCode::Char('w') => delete_word(app),
            _ => {}
        }
        return Ok(None);
    }

    match code {
        KeyCode::Up => app.select_prev_session(),
        KeyCode::Down => app.select_next_session(),
        KeyCode::PageUp => app.scroll_chat_up(10),
        KeyCode::PageDown => app.scroll_chat_down(10),
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                // Empty input: Enter opens the highlighted session.
                app.clear_input();
                app.open_selected_session().await;
            } else {
                return submit_input(app, gen_tx).await;
            }
        }
        KeyCode::Char(c) => app.insert_char(c),
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Delete => app.delete_char_forward(),
        KeyCode::Left => app.move_cursor_left(),
        KeyCode::Right => app.move_cursor_right(),
        KeyCode::Home => app.move_cursor_start(),
        KeyCode::End => app.move_cursor_end(),
        _ => {}
    }

    Ok(None)
}

/// Submit the input buffer as a prompt.
async fn submit_input(
    app: &mut App,
    gen_tx: &mpsc::Sender<GenerationEvent>,
) -> anyhow::Result<Option<Outcome>> {
    let input = app.take_input();

    match app.chat.submit(&input).await {
        Ok(mut rx) => {
            app.set_status("Generating... (Esc to cancel)");
            let gen_tx = gen_tx.clone();
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    if gen_tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
        }
        Err(ChatError::Auth) => return Ok(Some(Outcome::AuthRejected)),
        Err(e) => {
            // Put the prompt back so nothing typed is lost.
            app.input = input;
            app.move_cursor_end();
            app.set_error(e.to_string());
        }
    }

    Ok(None)
}

/// Delete the word before the cursor.
fn delete_word(app: &mut App) {
    while app.cursor_position > 0 {
        app.delete_char();
        if app.cursor_position > 0 {
            let prev_char = app.input[..app.cursor_position].chars().next_back();
            if prev_char == Some(' ') {
                break;
            }
        }
    }
}

pub mod render;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;

use crate::app::{App, Focus};

pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Tui {
    pub fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    pub fn run(&mut self, app: &mut App) -> Result<()> {
        while app.running {
            app.tick()?;
            self.terminal
                .draw(|frame| render::render(frame, app))
                .map_err(anyhow::Error::from)?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        handle_key_event(app, key)?;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Ctrl+C, Ctrl+P, Esc, Enter, Tab and arrows work everywhere; letter
/// shortcuts only apply while the playlist has focus.
fn handle_key_event(app: &mut App, key: KeyEvent) -> Result<()> {
    match (key.modifiers, key.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => app.request_quit()?,
        (KeyModifiers::CONTROL, KeyCode::Char('p')) => app.toggle_palette(),
        (_, KeyCode::Esc) => app.close_overlays(),
        (_, KeyCode::Enter) => report(app, |app| app.submit_current_input()),
        (_, KeyCode::Backspace) => app.backspace_input(),
        (_, KeyCode::Up) => app.select_previous(),
        (_, KeyCode::Down) => app.select_next(),
        (_, KeyCode::Tab) => app.toggle_focus(),
        (_, KeyCode::BackTab) => app.toggle_focus_backward(),
        (_, KeyCode::Char(c)) if app.focus == Focus::Playlist => handle_shortcut(app, c)?,
        (_, KeyCode::Char(c)) => app.push_char(c),
        _ => {}
    }

    Ok(())
}

fn handle_shortcut(app: &mut App, c: char) -> Result<()> {
    match c {
        'q' => app.request_quit()?,
        '/' => app.open_slash_input(),
        'k' => app.select_previous(),
        'j' => app.select_next(),
        ' ' => report(app, |app| app.toggle_play_pause()),
        's' => report(app, |app| app.stop_playback()),
        'n' => report(app, |app| app.next_track()),
        'p' => report(app, |app| app.previous_track()),
        '+' | '=' => report(app, |app| app.volume_up()),
        '-' => report(app, |app| app.volume_down()),
        'd' => report(app, |app| app.remove_selected()),
        _ => {}
    }
    Ok(())
}

fn report(app: &mut App, action: impl FnOnce(&mut App) -> Result<()>) {
    if let Err(err) = action(app) {
        app.status_message = format!("Error: {err}");
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = self.terminal.backend_mut().execute(LeaveAlternateScreen);
    }
}

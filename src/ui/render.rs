use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap};

use crate::app::{App, Focus};
use crate::domain::models::format_clock;

const PALETTE_PREVIEW: usize = 8;

pub fn render(frame: &mut ratatui::Frame<'_>, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(format!(
        "musicbox | Focus: {} | Space play/pause | n/p skip | +/- volume | / command | Ctrl+P palette",
        app.focus.label()
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .block(Block::default().borders(Borders::ALL).title("Music Player"));
    frame.render_widget(header, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let list_items: Vec<ListItem<'_>> = app
        .tracks()
        .iter()
        .enumerate()
        .map(|(idx, track)| {
            let marker = if app.current_index() == Some(idx) {
                "▶ "
            } else {
                "  "
            };
            let mut style = Style::default();
            if idx == app.selected_index {
                style = style.bg(Color::Blue).fg(Color::White);
            }
            if app.current_index() == Some(idx) {
                style = style.add_modifier(Modifier::BOLD);
            }
            ListItem::new(Line::from(format!(
                "{marker}{:>3}. {} [{}]",
                idx + 1,
                track.title,
                track.duration_label()
            )))
            .style(style)
        })
        .collect();

    let playlist_title = format!("Playlist ({})", app.tracks().len());
    let playlist =
        List::new(list_items).block(Block::default().borders(Borders::ALL).title(playlist_title));
    frame.render_widget(playlist, body[0]);

    if app.focus == Focus::Palette {
        render_palette(frame, app, body[1]);
    } else {
        render_now_playing(frame, app, body[1]);
    }

    let status = app.player_status();
    let (ratio, progress_label) = if status.duration > 0.0 {
        (
            (status.position / status.duration).clamp(0.0, 1.0),
            format!(
                "{} / {}",
                format_clock(status.position),
                format_clock(status.duration)
            ),
        )
    } else {
        (0.0, "--:-- / --:--".to_string())
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio)
        .label(progress_label);
    frame.render_widget(gauge, chunks[2]);

    let input_title = match app.focus {
        Focus::Slash => "Slash Command",
        Focus::Playlist => "Press / for commands",
        Focus::Palette => "Command Palette",
    };
    let input = Paragraph::new(Text::from(app.current_input()))
        .block(Block::default().borders(Borders::ALL).title(input_title));
    frame.render_widget(input, chunks[3]);

    let mut message = app.status_message.clone();
    if app.pending_downloads() > 0 {
        message = format!("{message} | downloads running: {}", app.pending_downloads());
    }
    let footer = Paragraph::new(message)
        .style(Style::default().fg(Color::Yellow))
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

fn render_now_playing(frame: &mut ratatui::Frame<'_>, app: &App, area: ratatui::layout::Rect) {
    let status = app.player_status();
    let mut lines = match app.now_playing() {
        Some(track) => vec![
            Line::from(format!("Title: {}", track.title)),
            Line::from(format!("File: {}", track.filename)),
            Line::from(format!("Length: {}", track.duration_label())),
        ],
        None => vec![Line::from("Nothing loaded")],
    };
    lines.push(Line::from(format!("Playback: {}", app.playback_state().label())));
    lines.push(Line::from(format!("Volume: {}%", status.volume)));

    let details = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Now Playing"))
        .wrap(Wrap { trim: true });
    frame.render_widget(details, area);
}

fn render_palette(frame: &mut ratatui::Frame<'_>, app: &App, area: ratatui::layout::Rect) {
    let items: Vec<ListItem<'_>> = app
        .palette_preview(PALETTE_PREVIEW)
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            let style = if idx == app.palette_selected_index() {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(item.label)).style(style)
        })
        .collect();

    let palette = List::new(items).block(Block::default().borders(Borders::ALL).title("Commands"));
    frame.render_widget(palette, area);
}

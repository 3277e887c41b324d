//! TUI for keysynth
//!
//! Draws the settings panel, the oscilloscope, and a key help bar. Purely a
//! view: everything it shows is gathered into [`View`] by the app loop.

mod panel;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};

use keysynth::{synth::NoteId, Settings};

use panel::render_panel;
use waveform::render_scope;

/// Samples shown by the scope.
pub const SCOPE_LEN: usize = 1024;

pub struct View<'a> {
    pub settings: Settings,
    pub active_notes: Vec<NoteId>,
    pub releasing: usize,
    pub nodes: usize,
    pub octave: u8,
    pub sample_rate: f32,
    pub engine_state: &'static str,
    pub release_events: bool,
    pub scope: &'a [f32],
}

pub fn render(frame: &mut Frame, view: &View) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Settings + voices
            Constraint::Min(8),    // Scope
            Constraint::Length(2), // Help
        ])
        .split(frame.area());

    render_panel(frame, chunks[0], view);
    render_scope(frame, chunks[1], view.scope);

    let hold = if view.release_events {
        ""
    } else {
        "  (no key-release events: notes auto-release)"
    };
    let help = Paragraph::new(vec![
        Line::from(format!(
            " [a-k] Play  [z/x] Octave  [1-4] Wave  [[ ]] LP  [; '] HP{hold}"
        )),
        Line::from(
            " [, .] Attack  [< >] Release  [- =] Volume  [Space] All off  [Bksp] Panic  [q] Quit",
        ),
    ])
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[2]);
}

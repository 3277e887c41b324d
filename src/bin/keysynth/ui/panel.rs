//! Settings and voice status panel

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::View;

pub fn render_panel(frame: &mut Frame, area: Rect, view: &View) {
    let block = Block::default().title(" keysynth ").borders(Borders::ALL);
    let s = &view.settings;

    let settings = Line::from(vec![
        Span::styled(format!(" {:<8}", s.waveform), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("LP {:>7.0} Hz  HP {:>7.0} Hz  ", s.low_cutoff_hz, s.high_cutoff_hz),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("A {:.2}s  R {:.2}s  ", s.attack_seconds, s.release_seconds),
            Style::default().fg(Color::Green),
        ),
        Span::styled(
            format!("Vol {:.0}%", s.master_volume * 100.0),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let notes = if view.active_notes.is_empty() {
        "-".to_string()
    } else {
        view.active_notes
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    };
    let voices = Line::from(vec![
        Span::styled(
            format!(" Octave {}  ", view.octave),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!("Sounding: {notes}  "), Style::default().fg(Color::Cyan)),
        Span::styled(
            format!("Releasing: {}  ", view.releasing),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Nodes: {}  {:.1}kHz  {}", view.nodes, view.sample_rate / 1000.0, view.engine_state),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let paragraph = Paragraph::new(vec![settings, voices]).block(block);
    frame.render_widget(paragraph, area);
}

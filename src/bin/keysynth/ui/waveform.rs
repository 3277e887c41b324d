//! Oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

/// Render the scope. `scope` holds the newest output samples, oldest first.
pub fn render_scope(frame: &mut Frame, area: Rect, scope: &[f32]) {
    let peak = scope.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
    let block = Block::default()
        .title(format!(" Scope  peak {peak:.2} "))
        .borders(Borders::ALL);

    let data: Vec<(f64, f64)> = scope
        .iter()
        .enumerate()
        .map(|(i, &sample)| {
            let x = i as f64 / scope.len().max(1) as f64;
            (x, sample as f64)
        })
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

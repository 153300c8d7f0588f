use ratatui::prelude::*;
use ratatui::widgets::*;

/// Blocking notification. Rendered above everything else; the event loop
/// routes every key to dismissal while one is up.
pub fn draw_alert(f: &mut Frame, area: Rect, text: &str) {
    let rect = centered_rect(50, 20, area);
    f.render_widget(Clear, rect);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            text.to_string(),
            crate::theme::text_error().add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to dismiss",
            crate::theme::text_muted(),
        ))
        .alignment(Alignment::Center),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(crate::theme::text_error());
    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    f.render_widget(p, rect);
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let v = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    let h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(v[1]);
    h[1]
}

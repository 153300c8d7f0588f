use ratatui::layout::Rect;
use ratatui::prelude::Frame;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::ui::AppState;

/// Top banner: centered logo lines (from config, or the crate name) over a
/// separating bottom border. The border picks up the accent color while a
/// request is in flight.
pub fn draw_header(f: &mut Frame, area: Rect, state: &AppState) {
    let border = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(if state.status_text.is_some() {
            state.theme.accent
        } else {
            state.theme.muted
        }));
    let inner = border.inner(area);

    let logo = if state.logo_lines.is_empty() {
        vec!["row-tui".to_string()]
    } else {
        state.logo_lines.clone()
    };
    let style = Style::default()
        .fg(Color::White)
        .add_modifier(Modifier::BOLD);
    let lines: Vec<Line> = logo
        .iter()
        .map(|s| Line::from(Span::styled(s.clone(), style)).alignment(ratatui::layout::Alignment::Center))
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
    f.render_widget(border, area);
}

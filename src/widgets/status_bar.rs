use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::*;

use crate::ui::{AppState, View};

pub fn draw_footer(f: &mut Frame, area: Rect, state: &AppState, help_text: &str) {
    let mut spans: Vec<Span> = Vec::new();
    if let Some(msg) = &state.status_text {
        let spinner = ["⠋", "⠙", "⠸", "⠴", "⠦", "⠇"][state.tick as usize % 6];
        spans.push(Span::raw(format!(" {spinner} {msg}")));
        spans.push(Span::raw("  |  "));
    }
    if let Some(t) = &state.toast {
        let color = state.theme.toast_color(t.level);
        let tag = match t.level {
            crate::ui::ToastLevel::Success => "[OK]",
            crate::ui::ToastLevel::Error => "[ERROR]",
            crate::ui::ToastLevel::Info => "[INFO]",
        };
        spans.push(Span::styled(
            format!("{tag} "),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(
            format!("{}  |  ", t.text),
            Style::default().fg(color),
        ));
    }
    let phase = match state.view {
        View::Idle => "idle",
        View::Fetching => "fetching",
        View::Editing => "editing",
        View::Submitting => "submitting",
    };
    spans.push(Span::styled(
        format!("{phase}  |  "),
        Style::default().fg(state.theme.secondary),
    ));
    spans.push(Span::styled(
        help_text.to_string(),
        crate::theme::text_muted(),
    ));
    let p = Paragraph::new(Line::from(spans));
    f.render_widget(p, area);
}

use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;

/// The row-id prompt plus its Load control. When Load is activated the
/// value is sent verbatim: no trimming, no validation.
#[derive(Clone, Debug, Default)]
pub struct IdPrompt {
    pub value: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum PromptSignal {
    Load,
}

impl IdPrompt {
    pub fn on_key(&mut self, key: KeyCode) -> Option<PromptSignal> {
        match key {
            KeyCode::Enter => return Some(PromptSignal::Load),
            KeyCode::Backspace => {
                self.value.pop();
            }
            KeyCode::Char(c) => self.value.push(c),
            _ => {}
        }
        None
    }
}

pub fn draw_prompt(f: &mut Frame, area: Rect, prompt: &IdPrompt, focused: bool, cursor_on: bool) {
    let mut val = prompt.value.clone();
    if focused && cursor_on {
        val.push('▏');
    }
    let value_style = if focused {
        crate::theme::text_editing_bold()
    } else {
        Style::default()
    };
    let load_style = if focused {
        crate::theme::text_active_bold()
    } else {
        crate::theme::text_muted()
    };
    let line = Line::from(vec![
        Span::raw(" Row id: "),
        Span::styled(val, value_style),
        Span::raw("   "),
        Span::styled("[ Load ⏎ ]", load_style),
    ]);
    let p = Paragraph::new(line).block(panel_block("Load a row", focused));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typing_edits_and_enter_loads() {
        let mut prompt = IdPrompt::default();
        prompt.on_key(KeyCode::Char('4'));
        prompt.on_key(KeyCode::Char('2'));
        assert_eq!(prompt.value, "42");
        prompt.on_key(KeyCode::Backspace);
        assert_eq!(prompt.value, "4");
        assert_eq!(prompt.on_key(KeyCode::Enter), Some(PromptSignal::Load));
        // the value is whatever was typed, spaces included
        prompt.on_key(KeyCode::Char(' '));
        assert_eq!(prompt.value, "4 ");
    }
}

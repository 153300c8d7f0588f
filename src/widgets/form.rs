use crate::model::Record;
use crate::widgets::chrome::panel_block;
use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::*;

/// One editable field. Records are flat string mappings, so every field
/// is a single-line text input named after its record key.
#[derive(Clone, Debug, PartialEq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, Default)]
pub struct FormState {
    pub title: String,
    pub fields: Vec<FormField>,
    pub selected: usize,
    pub editing: bool,
    pub message: Option<String>,
    pub disabled: bool,
    pub dirty: bool,
    pub initial: Vec<(String, String)>,
    pub confirm_reset: bool,
}

/// What a key press asks the host to do beyond mutating the form.
#[derive(Debug, PartialEq, Eq)]
pub enum FormSignal {
    Submit,
}

/// Build the form for a freshly loaded record: one input per field except
/// `id`, pre-filled with the current value.
pub fn form_from_record(row_id: &str, record: &Record) -> FormState {
    let fields: Vec<FormField> = record
        .edit_fields()
        .map(|(name, value)| FormField {
            name: name.to_string(),
            value,
        })
        .collect();
    let mut form = FormState {
        title: format!("Row {row_id}"),
        fields,
        ..Default::default()
    };
    capture_initial(&mut form);
    form
}

pub fn capture_initial(form: &mut FormState) {
    form.initial = form
        .fields
        .iter()
        .map(|f| (f.name.clone(), f.value.clone()))
        .collect();
    form.dirty = false;
}

pub fn compute_dirty(form: &mut FormState) -> bool {
    let any = form.fields.iter().any(|f| {
        form.initial
            .iter()
            .find(|(n, _)| *n == f.name)
            .map(|(_, v)| *v != f.value)
            .unwrap_or(true)
    });
    form.dirty = any;
    any
}

pub fn reset_to_initial(form: &mut FormState) {
    for f in &mut form.fields {
        if let Some((_, v)) = form.initial.iter().find(|(n, _)| *n == f.name) {
            f.value = v.clone();
        }
    }
    form.message = Some("Reset to loaded values".into());
    compute_dirty(form);
}

/// The submit payload: exactly the rendered field names mapped to their
/// current input values, in render order.
pub fn collect_values(form: &FormState) -> Vec<(String, String)> {
    form.fields
        .iter()
        .map(|f| (f.name.clone(), f.value.clone()))
        .collect()
}

const SAVE_HINT: &str = "Enter edit field • Ctrl+S save";

pub fn on_key(form: &mut FormState, key: KeyCode) -> Option<FormSignal> {
    if form.disabled {
        return None;
    }
    let save_idx = form.fields.len();
    let reset_idx = form.fields.len() + 1;
    match key {
        KeyCode::Up => {
            if !form.editing && form.selected > 0 {
                form.selected -= 1;
            }
        }
        KeyCode::Down => {
            if !form.editing && form.selected < reset_idx {
                form.selected += 1;
            }
        }
        KeyCode::Left => {
            if !form.editing && form.selected == reset_idx {
                form.selected = save_idx;
            }
        }
        KeyCode::Right => {
            if !form.editing && form.selected == save_idx {
                form.selected = reset_idx;
            }
        }
        KeyCode::Enter => {
            if form.editing {
                form.editing = false;
                compute_dirty(form);
            } else if form.selected == save_idx {
                form.confirm_reset = false;
                return Some(FormSignal::Submit);
            } else if form.selected == reset_idx {
                if form.dirty {
                    // two-step confirm
                    if form.confirm_reset {
                        reset_to_initial(form);
                        form.confirm_reset = false;
                    } else {
                        form.confirm_reset = true;
                        form.message = Some("Press Enter to confirm Reset • Esc to cancel".into());
                    }
                }
            } else if form.selected < form.fields.len() {
                form.editing = true;
                form.confirm_reset = false;
                form.message = None;
            }
        }
        KeyCode::Esc => {
            if form.editing {
                form.editing = false;
                compute_dirty(form);
            } else if form.confirm_reset {
                form.confirm_reset = false;
                form.message = None;
            }
        }
        KeyCode::Backspace => {
            if form.editing {
                if let Some(fld) = form.fields.get_mut(form.selected) {
                    fld.value.pop();
                    compute_dirty(form);
                }
            }
        }
        KeyCode::Char(c) => {
            if form.editing {
                if let Some(fld) = form.fields.get_mut(form.selected) {
                    fld.value.push(c);
                    compute_dirty(form);
                }
            }
        }
        _ => {}
    }
    None
}

pub fn draw_form(f: &mut Frame, area: Rect, form: &FormState, highlight: bool, cursor_on: bool) {
    let mut lines: Vec<Line> = Vec::new();
    for (i, fld) in form.fields.iter().enumerate() {
        let sel = if i == form.selected { '›' } else { ' ' };
        let mut val = fld.value.clone();
        if form.editing && i == form.selected && cursor_on {
            val.push('▏');
        }
        let value_style = if i == form.selected {
            if form.editing {
                crate::theme::text_editing_bold()
            } else {
                crate::theme::text_active_bold()
            }
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(format!("{sel} {}: ", fld.name)),
            Span::styled(val, value_style),
        ]));
    }
    // Buttons: Save | Reset
    if !form.fields.is_empty() {
        lines.push(Line::from(""));
    }
    let save_idx = form.fields.len();
    let reset_idx = form.fields.len() + 1;
    let can_save = !form.disabled;
    let can_reset = form.dirty && !form.disabled;
    let mut save_style = if can_save {
        crate::theme::text_active_bold()
    } else {
        crate::theme::text_muted()
    };
    let mut reset_style = if can_reset {
        crate::theme::text_active()
    } else {
        crate::theme::text_muted()
    };
    if form.selected == save_idx {
        save_style = crate::theme::list_cursor_style();
    }
    if form.selected == reset_idx {
        reset_style = crate::theme::list_cursor_style();
    }
    lines.push(Line::from(vec![
        Span::styled("  [ Save ]  ", save_style),
        Span::styled("Reset", reset_style),
    ]));
    if let Some(msg) = &form.message {
        lines.push(Line::from(Span::styled(
            msg.clone(),
            crate::theme::text_muted(),
        )));
    } else if highlight {
        lines.push(Line::from(Span::styled(
            SAVE_HINT,
            crate::theme::text_muted(),
        )));
    }
    let mut title = form.title.clone();
    if form.dirty {
        title.push_str(" *");
    }
    if form.editing {
        title.push_str(" — editing");
    }
    let block = panel_block(&title, highlight);
    let p = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> Record {
        Record::from_value(v).unwrap()
    }

    #[test]
    fn form_excludes_id_and_prefills_values() {
        let form = form_from_record(
            "42",
            &record(json!({"id": "42", "name": "Ana", "age": 33})),
        );
        let names: Vec<&str> = form.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["age", "name"]);
        assert_eq!(form.fields[0].value, "33");
        assert_eq!(form.fields[1].value, "Ana");
        assert!(!form.dirty);
    }

    #[test]
    fn collect_values_matches_rendered_fields() {
        let mut form = form_from_record("7", &record(json!({"id": "7", "name": "Ana"})));
        assert_eq!(
            collect_values(&form),
            vec![("name".to_string(), "Ana".to_string())]
        );
        form.fields[0].value = "Eva".into();
        assert_eq!(
            collect_values(&form),
            vec![("name".to_string(), "Eva".to_string())]
        );
    }

    #[test]
    fn typing_marks_dirty_and_reset_needs_confirm() {
        let mut form = form_from_record("7", &record(json!({"id": "7", "name": "Ana"})));
        // enter edit mode on the field, type one char
        assert!(on_key(&mut form, KeyCode::Enter).is_none());
        assert!(form.editing);
        on_key(&mut form, KeyCode::Char('!'));
        assert!(form.dirty);
        on_key(&mut form, KeyCode::Enter);
        assert!(!form.editing);
        // move to Reset and confirm twice
        on_key(&mut form, KeyCode::Down);
        on_key(&mut form, KeyCode::Right);
        on_key(&mut form, KeyCode::Enter);
        assert!(form.confirm_reset);
        assert_eq!(form.fields[0].value, "Ana!");
        on_key(&mut form, KeyCode::Enter);
        assert_eq!(form.fields[0].value, "Ana");
        assert!(!form.dirty);
    }

    #[test]
    fn save_submits_even_when_clean() {
        let mut form = form_from_record("7", &record(json!({"id": "7", "name": "Ana"})));
        form.selected = form.fields.len();
        assert_eq!(on_key(&mut form, KeyCode::Enter), Some(FormSignal::Submit));
    }

    #[test]
    fn disabled_form_ignores_keys() {
        let mut form = form_from_record("7", &record(json!({"id": "7", "name": "Ana"})));
        form.disabled = true;
        form.selected = form.fields.len();
        assert_eq!(on_key(&mut form, KeyCode::Enter), None);
    }
}

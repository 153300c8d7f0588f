use crate::model::Record;
use crate::services::api::LoadError;
use crate::ui::{AppState, Focus, View};
use crate::widgets::form::{self, FormState};

/// The single current editing session: the active row id and the form
/// derived from its record. Replaced wholesale on every successful load;
/// submits read it at submit time instead of capturing it at load time,
/// so "which id is active" is always this value and nothing else.
pub struct EditSession {
    pub row_id: String,
    pub form: FormState,
}

impl EditSession {
    pub fn new(row_id: String, record: &Record) -> Self {
        let form = form::form_from_record(&row_id, record);
        Self { row_id, form }
    }
}

pub enum AppMsg {
    /// The Load control was activated; the prompt's current text is taken
    /// as the row id, verbatim.
    LoadRequested,
    RowLoaded {
        row_id: String,
        outcome: Result<Record, LoadError>,
    },
    SubmitRequested,
    SubmitFinished {
        row_id: String,
        outcome: Result<(), String>,
    },
    AlertDismissed,
}

pub enum Effect {
    FetchRow {
        row_id: String,
    },
    SubmitRow {
        row_id: String,
        fields: Vec<(String, String)>,
    },
    OpenDocument {
        row_id: String,
    },
    ShowToast {
        text: String,
        level: crate::ui::ToastLevel,
        seconds: u64,
    },
}

pub fn update(state: &mut AppState, msg: AppMsg) -> Vec<Effect> {
    use AppMsg::*;
    let mut effects: Vec<Effect> = Vec::new();
    match msg {
        LoadRequested => {
            // The alert modal blocks everything until dismissed.
            if state.alert.is_some() {
                return effects;
            }
            let row_id = state.prompt.value.clone();
            state.view = View::Fetching;
            effects.push(Effect::FetchRow { row_id });
        }
        RowLoaded { row_id, outcome } => match outcome {
            Ok(record) => {
                // Responses apply in arrival order: a later-resolving load
                // replaces whatever session is current.
                state.session = Some(EditSession::new(row_id, &record));
                state.view = View::Editing;
                state.focus = Focus::Form;
            }
            Err(LoadError::RowMissing { status }) => {
                state.dbg(format!("load '{row_id}': HTTP {status}"));
                state.alert = Some("No existe esa fila".into());
                state.view = View::Idle;
            }
            Err(err) => {
                // Malformed bodies and transport faults are not "row
                // missing"; they surface only in the debug log.
                state.dbg(format!("load '{row_id}': {err}"));
                state.view = View::Idle;
            }
        },
        SubmitRequested => {
            if state.alert.is_some() {
                return effects;
            }
            if !matches!(state.view, View::Editing) {
                return effects;
            }
            if let Some(session) = &mut state.session {
                session.form.disabled = true;
                session.form.editing = false;
                session.form.message = Some("Submitting...".into());
                state.view = View::Submitting;
                effects.push(Effect::SubmitRow {
                    row_id: session.row_id.clone(),
                    fields: form::collect_values(&session.form),
                });
            }
        }
        SubmitFinished { row_id, outcome } => match outcome {
            Ok(()) => {
                effects.push(Effect::OpenDocument {
                    row_id: row_id.clone(),
                });
                effects.push(Effect::ShowToast {
                    text: format!("Opening document for row {row_id}"),
                    level: crate::ui::ToastLevel::Info,
                    seconds: 3,
                });
                // A load that resolved mid-submit owns the view now.
                if matches!(state.view, View::Submitting) {
                    state.session = None;
                    state.view = View::Idle;
                    state.focus = Focus::Prompt;
                }
            }
            Err(err) => {
                // The backend's refusal stays invisible to the user; it is
                // recorded here and nowhere else.
                state.dbg(format!("update '{row_id}': {err}"));
                if matches!(state.view, View::Submitting) {
                    if let Some(session) = &mut state.session {
                        session.form.disabled = false;
                        session.form.message = None;
                    }
                    state.view = View::Editing;
                }
            }
        },
        AlertDismissed => {
            state.alert = None;
        }
    }
    effects
}

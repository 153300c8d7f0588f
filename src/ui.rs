use crate::app::{update, AppMsg, EditSession, Effect};
use crate::model::AppConfig;
use crate::services::api::{ApiClient, LoadError};
use crate::widgets::alert::draw_alert;
use crate::widgets::form;
use crate::widgets::header::draw_header;
use crate::widgets::id_prompt::{draw_prompt, IdPrompt, PromptSignal};
use crate::widgets::status_bar::draw_footer;
use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

/// One finished backend call, reported by a worker thread.
pub(crate) struct LoadMsg {
    pub(crate) row_id: String,
    pub(crate) outcome: LoadOutcome,
}

pub(crate) enum LoadOutcome {
    Row(Result<crate::model::Record, LoadError>),
    Submit(Result<(), String>),
}

#[derive(Clone, Copy)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

pub struct Toast {
    pub text: String,
    pub level: ToastLevel,
    pub expires_at_tick: u64,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum View {
    #[default]
    Idle,
    Fetching,
    Editing,
    Submitting,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    #[default]
    Prompt,
    Form,
}

#[derive(Default)]
pub(crate) struct AppState {
    pub(crate) config: AppConfig,
    pub(crate) api: ApiClient,
    pub(crate) view: View,
    pub(crate) session: Option<EditSession>,
    pub(crate) prompt: IdPrompt,
    pub(crate) alert: Option<String>,
    pub(crate) focus: Focus,
    pub(crate) header_h: u16,
    pub(crate) logo_lines: Vec<String>,
    pub(crate) status_text: Option<String>,
    pub(crate) toast: Option<Toast>,
    pub(crate) tick: u64,
    tx: Option<Sender<LoadMsg>>,
    rx: Option<Receiver<LoadMsg>>,
    pub(crate) theme: crate::theme::Theme,
    pub(crate) show_debug: bool,
    // Debug log (rendered in the bottom debug pane)
    pub(crate) debug_log: VecDeque<String>,
}

impl AppState {
    pub fn dbg(&mut self, msg: impl Into<String>) {
        const MAX_LOG_LINES: usize = 200;
        if self.debug_log.len() >= MAX_LOG_LINES {
            self.debug_log.pop_front();
        }
        self.debug_log.push_back(msg.into());
    }
}

fn run_effects(state: &mut AppState, effects: Vec<Effect>) {
    for eff in effects {
        match eff {
            Effect::FetchRow { row_id } => {
                state.dbg(format!("fetch row '{row_id}'"));
                state.status_text = Some(format!("Loading row {row_id}…"));
                if let Some(tx) = &state.tx {
                    crate::services::api::spawn_fetch_row(state.api.clone(), row_id, tx.clone());
                }
            }
            Effect::SubmitRow { row_id, fields } => {
                state.dbg(format!("submit row '{row_id}' ({} fields)", fields.len()));
                state.status_text = Some("Submitting…".into());
                if let Some(tx) = &state.tx {
                    crate::services::api::spawn_submit_row(
                        state.api.clone(),
                        row_id,
                        fields,
                        tx.clone(),
                    );
                }
            }
            Effect::OpenDocument { row_id } => {
                let url = state.api.document_url(&row_id);
                state.dbg(format!("open document {url}"));
                // Fire-and-forget, off the render thread; opener failures
                // are not surfaced.
                std::thread::spawn(move || {
                    let _ = open::that(&url);
                });
            }
            Effect::ShowToast {
                text,
                level,
                seconds,
            } => {
                let ticks = seconds.saturating_mul(5); // ~200ms tick
                let exp = state.tick.saturating_add(ticks);
                state.toast = Some(Toast {
                    text,
                    level,
                    expires_at_tick: exp,
                });
            }
        }
    }
}

// Drain worker results and feed them through update(); arrival order is
// what makes the last-resolving load win.
fn pump_load_msgs(state: &mut AppState) {
    let mut drained: Vec<LoadMsg> = Vec::new();
    if let Some(rx) = &state.rx {
        while let Ok(msg) = rx.try_recv() {
            drained.push(msg);
        }
    }
    for msg in drained {
        state.status_text = None;
        let LoadMsg { row_id, outcome } = msg;
        let effects = match outcome {
            LoadOutcome::Row(outcome) => update(state, AppMsg::RowLoaded { row_id, outcome }),
            LoadOutcome::Submit(outcome) => {
                update(state, AppMsg::SubmitFinished { row_id, outcome })
            }
        };
        run_effects(state, effects);
    }
}

pub fn run() -> Result<()> {
    let cfg = load_config()?;
    let base_url = crate::services::api::expand_env(&cfg.base_url);
    crate::model::validate_base_url(&base_url).map_err(anyhow::Error::msg)?;
    let mut state = AppState {
        theme: crate::theme::Theme::from_name(cfg.theme.as_deref()),
        api: ApiClient::new(base_url.as_str()),
        config: cfg,
        header_h: 3,
        ..Default::default()
    };
    state.dbg(format!("backend: {base_url}"));
    init_logo_and_header(&mut state);
    let (tx, rx) = mpsc::channel::<LoadMsg>();
    state.tx = Some(tx);
    state.rx = Some(rx);

    // Headless smoke mode
    let headless = std::env::var("ROW_TUI_HEADLESS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
        .unwrap_or(false);
    if headless {
        let ticks: u64 = std::env::var("ROW_TUI_TICKS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);
        let load_id: Option<String> = std::env::var("ROW_TUI_HEADLESS_LOAD_ID").ok();
        let summary: bool = std::env::var("ROW_TUI_SMOKE_SUMMARY")
            .ok()
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("yes"))
            .unwrap_or(false);
        let backend = ratatui::backend::TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend)?;
        let tick_rate = Duration::from_millis(200);
        let mut load_done = false;
        for _ in 0..ticks {
            if !load_done {
                if let Some(id) = &load_id {
                    state.prompt.value = id.clone();
                    let effs = update(&mut state, AppMsg::LoadRequested);
                    run_effects(&mut state, effs);
                    load_done = true;
                }
            }
            terminal.draw(|f| ui(f, &mut state))?;
            pump_load_msgs(&mut state);
            state.tick = state.tick.wrapping_add(1);
            std::thread::sleep(tick_rate);
        }
        if summary {
            let view = match state.view {
                View::Idle => "Idle",
                View::Fetching => "Fetching",
                View::Editing => "Editing",
                View::Submitting => "Submitting",
            };
            let out = serde_json::json!({
                "ok": state.alert.is_none(),
                "view": view,
                "alert": state.alert,
                "fields": state.session.as_ref().map(|s| s.form.fields.len()).unwrap_or(0),
                "load_done": load_done,
            });
            println!("{out}");
        }
        return Ok(());
    }

    // Setup terminal (interactive)
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();
    let res = loop {
        terminal.draw(|f| ui(f, &mut state))?;
        pump_load_msgs(&mut state);
        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_millis(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                // The alert modal eats everything until dismissed.
                if state.alert.is_some() {
                    if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                        let effs = update(&mut state, AppMsg::AlertDismissed);
                        run_effects(&mut state, effs);
                    }
                    continue;
                }
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Char('c') if ctrl => break Ok(()),
                    KeyCode::Char('d') if ctrl => {
                        state.show_debug = !state.show_debug;
                    }
                    KeyCode::Char('y') if ctrl => {
                        if let Some(session) = &state.session {
                            let url = state.api.document_url(&session.row_id);
                            let toast = match arboard::Clipboard::new()
                                .and_then(|mut c| c.set_text(url.as_str()))
                            {
                                Ok(()) => Effect::ShowToast {
                                    text: "Copied to clipboard!".into(),
                                    level: ToastLevel::Success,
                                    seconds: 3,
                                },
                                Err(_) => Effect::ShowToast {
                                    text: "Clipboard unavailable".into(),
                                    level: ToastLevel::Error,
                                    seconds: 3,
                                },
                            };
                            run_effects(&mut state, vec![toast]);
                        }
                    }
                    KeyCode::Char('s') if ctrl => {
                        let effs = update(&mut state, AppMsg::SubmitRequested);
                        run_effects(&mut state, effs);
                    }
                    KeyCode::Tab => {
                        if state.session.is_some() {
                            state.focus = match state.focus {
                                Focus::Prompt => Focus::Form,
                                Focus::Form => Focus::Prompt,
                            };
                        }
                    }
                    KeyCode::Esc if matches!(state.focus, Focus::Prompt) => break Ok(()),
                    code => match state.focus {
                        Focus::Prompt => {
                            if let Some(PromptSignal::Load) = state.prompt.on_key(code) {
                                let effs = update(&mut state, AppMsg::LoadRequested);
                                run_effects(&mut state, effs);
                            }
                        }
                        Focus::Form => {
                            let mut signal = None;
                            if let Some(session) = &mut state.session {
                                signal = form::on_key(&mut session.form, code);
                            }
                            if let Some(form::FormSignal::Submit) = signal {
                                let effs = update(&mut state, AppMsg::SubmitRequested);
                                run_effects(&mut state, effs);
                            }
                        }
                    },
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            last_tick = Instant::now();
        }
    };
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    res
}

fn load_config() -> Result<AppConfig> {
    // 1) Explicit path wins
    if let Ok(path) = std::env::var("ROW_TUI_CONFIG") {
        let p = PathBuf::from(&path);
        let s = fs::read_to_string(&p).with_context(|| format!("reading {p:?}"))?;
        let cfg: AppConfig = serde_yaml::from_str(&s).with_context(|| format!("parsing {p:?}"))?;
        return Ok(cfg);
    }
    // 2) row-tui.yaml in CWD, then in ~/.config
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut candidates = vec![cwd.join("row-tui.yaml")];
    if let Some(home) = std::env::var("HOME")
        .ok()
        .or_else(|| std::env::var("USERPROFILE").ok())
        .map(PathBuf::from)
    {
        candidates.push(home.join(".config").join("row-tui.yaml"));
    }
    for p in &candidates {
        if p.exists() {
            let s = fs::read_to_string(p).with_context(|| format!("reading {p:?}"))?;
            let cfg: AppConfig =
                serde_yaml::from_str(&s).with_context(|| format!("parsing {p:?}"))?;
            return Ok(cfg);
        }
    }
    // 3) The widget works against the default backend with no config at all.
    Ok(AppConfig::default())
}

fn init_logo_and_header(state: &mut AppState) {
    let mut lines: Vec<String> = Vec::new();
    if let Some(path) = state.config.logo.clone() {
        let pb = PathBuf::from(&path);
        let full = if pb.is_absolute() {
            pb
        } else {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(&path)
        };
        if let Ok(s) = fs::read_to_string(&full) {
            lines = s.lines().map(|l| l.to_string()).collect();
        }
    }
    if lines.is_empty() {
        let title = state
            .config
            .header
            .clone()
            .unwrap_or_else(|| "row-tui".to_string());
        lines = vec![String::new(), title, String::new()];
    }
    // One extra row for the banner's bottom border.
    state.header_h = (lines.len() as u16).saturating_add(1);
    state.logo_lines = lines;
}

fn ui(f: &mut Frame, state: &mut AppState) {
    // Clear expired toast
    if let Some(t) = &state.toast {
        if state.tick >= t.expires_at_tick {
            state.toast = None;
        }
    }

    let screen = f.area();
    let bg = Block::default().style(state.theme.base_style());
    f.render_widget(bg, screen);

    // 5% side margins, content in the middle
    let layout_h = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(5),
            Constraint::Percentage(90),
            Constraint::Percentage(5),
        ])
        .split(screen);
    let content = layout_h[1];

    let mut constraints = vec![
        Constraint::Length(state.header_h),
        Constraint::Length(3),
        Constraint::Min(5),
    ];
    if state.show_debug {
        constraints.push(Constraint::Length(8));
    }
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(content);

    draw_header(f, chunks[0], state);
    let prompt_focused = matches!(state.focus, Focus::Prompt) && state.alert.is_none();
    draw_prompt(
        f,
        chunks[1],
        &state.prompt,
        prompt_focused,
        state.tick % 2 == 0,
    );

    let main = chunks[2];
    match state.view {
        View::Editing | View::Submitting => {
            if let Some(session) = &state.session {
                form::draw_form(
                    f,
                    main,
                    &session.form,
                    matches!(state.focus, Focus::Form),
                    state.tick % 2 == 0,
                );
            }
        }
        View::Idle | View::Fetching => {
            draw_welcome(f, main);
        }
    }

    if state.show_debug {
        draw_debug(f, chunks[3], state);
    }
    let footer = chunks[chunks.len() - 1];
    draw_footer(f, footer, state, help_text(state));

    // Alert goes on top of everything
    if let Some(msg) = &state.alert {
        draw_alert(f, content, msg);
    }
}

fn draw_welcome(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Type a row id above and press Enter to load it.",
            crate::theme::text_muted(),
        )),
        Line::from(Span::styled(
            "The row's fields become editable; saving opens the generated document.",
            crate::theme::text_muted(),
        )),
    ];
    let p = Paragraph::new(lines)
        .block(crate::widgets::chrome::panel_block("Fields", false))
        .wrap(Wrap { trim: true });
    f.render_widget(p, area);
}

fn draw_debug(f: &mut Frame, area: Rect, state: &AppState) {
    let h = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .debug_log
        .iter()
        .rev()
        .take(h.max(1))
        .rev()
        .map(|l| Line::from(Span::styled(l.clone(), crate::theme::text_muted())))
        .collect();
    let p = Paragraph::new(lines).block(crate::widgets::chrome::panel_block("debug", false));
    f.render_widget(p, area);
}

fn help_text(state: &AppState) -> &'static str {
    match state.focus {
        Focus::Prompt => "Enter load • Tab form • Ctrl+D debug • Esc quit",
        Focus::Form => "↑↓ fields • Enter edit/activate • Ctrl+S submit • Ctrl+Y copy doc URL • Tab prompt",
    }
}

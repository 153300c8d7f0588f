use regex::Regex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::mpsc::Sender;
use std::thread;

use crate::model::Record;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Expand `${VAR}` from the environment; special-case `${ROW_API}`
/// -> ROW_TUI_API or the default backend address.
pub fn expand_env(raw: &str) -> String {
    let re = Regex::new(r"\$\{([A-Z0-9_]+)\}").unwrap();
    let env_map: HashMap<String, String> = env::vars().collect();
    re.replace_all(raw, |caps: &regex::Captures| {
        let key = &caps[1];
        if key == "ROW_API" {
            if let Some(v) = env_map.get("ROW_TUI_API") {
                return v.clone();
            }
            return DEFAULT_BASE_URL.to_string();
        }
        env_map.get(key).cloned().unwrap_or_default()
    })
    .to_string()
}

/// Why a row load produced nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Backend answered with non-2xx: as far as the widget is concerned,
    /// the row does not exist. The body is not inspected.
    RowMissing { status: u16 },
    /// 2xx answer whose body did not parse as a record.
    Body(String),
    /// The request never completed.
    Transport(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::RowMissing { status } => write!(f, "row missing (HTTP {status})"),
            LoadError::Body(e) => write!(f, "bad record body: {e}"),
            LoadError::Transport(e) => write!(f, "transport: {e}"),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ApiClient {
    /// No explicit timeout: the transport's own defaults apply.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            base_url: base.trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    // The row id travels in the path exactly as typed: untrimmed,
    // unvalidated.
    pub fn row_url(&self, row_id: &str) -> String {
        format!("{}/api/row/{}", self.base_url, row_id)
    }

    pub fn document_url(&self, row_id: &str) -> String {
        format!("{}/api/row/{}/pdf", self.base_url, row_id)
    }

    /// GET the record for `row_id`.
    pub fn fetch_row(&self, row_id: &str) -> Result<Record, LoadError> {
        let resp = self
            .http
            .get(self.row_url(row_id))
            .send()
            .map_err(|e| LoadError::Transport(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LoadError::RowMissing {
                status: status.as_u16(),
            });
        }
        let v: JsonValue = resp.json().map_err(|e| LoadError::Body(e.to_string()))?;
        Record::from_value(v).map_err(LoadError::Body)
    }

    /// POST the rendered field values back to the row's endpoint. The
    /// response body is ignored; only the status matters.
    pub fn update_row(&self, row_id: &str, fields: &[(String, String)]) -> Result<(), String> {
        let body: serde_json::Map<String, JsonValue> = fields
            .iter()
            .map(|(k, v)| (k.clone(), JsonValue::String(v.clone())))
            .collect();
        let resp = self
            .http
            .post(self.row_url(row_id))
            .json(&body)
            .send()
            .map_err(|e| format!("transport: {e}"))?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("HTTP {}", status.as_u16()))
        }
    }
}

// Async wrappers: each call runs on its own short-lived worker and reports
// exactly one LoadMsg back to the event loop.
pub fn spawn_fetch_row(client: ApiClient, row_id: String, tx: Sender<crate::ui::LoadMsg>) {
    thread::spawn(move || {
        let outcome = client.fetch_row(&row_id);
        let _ = tx.send(crate::ui::LoadMsg {
            row_id,
            outcome: crate::ui::LoadOutcome::Row(outcome),
        });
    });
}

pub fn spawn_submit_row(
    client: ApiClient,
    row_id: String,
    fields: Vec<(String, String)>,
    tx: Sender<crate::ui::LoadMsg>,
) {
    thread::spawn(move || {
        let outcome = client.update_row(&row_id, &fields);
        let _ = tx.send(crate::ui::LoadMsg {
            row_id,
            outcome: crate::ui::LoadOutcome::Submit(outcome),
        });
    });
}

#[cfg(test)]
mod api_tests;

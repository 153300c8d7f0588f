use serde::Deserialize;
use serde_json::Value as JsonValue;

/// One row as served by the backend: a field-name to value mapping that
/// always carries an `id` key. Fetched fresh on every load and replaced
/// wholesale; nothing here is cached between sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: serde_json::Map<String, JsonValue>,
}

impl Record {
    pub fn from_value(v: JsonValue) -> Result<Self, String> {
        match v {
            JsonValue::Object(map) => {
                if !map.contains_key("id") {
                    return Err("record has no 'id' field".into());
                }
                Ok(Self { fields: map })
            }
            other => Err(format!("expected a JSON object, got: {other}")),
        }
    }

    /// The editable projection: every field except `id`, with values
    /// rendered as input text.
    pub fn edit_fields(&self) -> impl Iterator<Item = (&str, String)> {
        self.fields
            .iter()
            .filter(|(k, _)| k.as_str() != "id")
            .map(|(k, v)| (k.as_str(), field_text(v)))
    }
}

/// How a JSON value becomes input text: strings verbatim, anything else
/// via its compact JSON form (the same coercion the server's own web
/// client applies when interpolating values into inputs).
pub(crate) fn field_text(v: &JsonValue) -> String {
    match v {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    // Base address of the backend; ${VAR} references are expanded from the
    // environment before use.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub header: Option<String>,
    // Optional path to an ASCII-art logo file
    #[serde(default)]
    pub logo: Option<String>,
    // "dark" (default) or "light"
    #[serde(default)]
    pub theme: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            header: Some("ROW TUI".to_string()),
            logo: None,
            theme: None,
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

pub(crate) fn validate_base_url(base: &str) -> Result<(), String> {
    let trimmed = base.trim();
    if trimmed.is_empty() {
        return Err("base_url is empty".into());
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(format!("base_url must be http(s): '{base}'"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_requires_object_with_id() {
        let err = Record::from_value(json!([1, 2])).unwrap_err();
        assert!(err.contains("expected a JSON object"));
        let err = Record::from_value(json!({"name": "Ana"})).unwrap_err();
        assert!(err.contains("no 'id'"));
        assert!(Record::from_value(json!({"id": "42"})).is_ok());
    }

    #[test]
    fn edit_fields_excludes_id() {
        let rec = Record::from_value(json!({
            "id": "42",
            "name": "Ana",
            "city": "Quito"
        }))
        .unwrap();
        let names: Vec<&str> = rec.edit_fields().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["city", "name"]);
    }

    #[test]
    fn field_text_coerces_non_strings() {
        assert_eq!(field_text(&json!("Ana")), "Ana");
        assert_eq!(field_text(&json!(7)), "7");
        assert_eq!(field_text(&json!(true)), "true");
        assert_eq!(field_text(&json!(null)), "null");
    }

    #[test]
    fn validate_base_url_rejects_non_http() {
        assert!(validate_base_url("http://127.0.0.1:5000").is_ok());
        assert!(validate_base_url("https://rows.example.com").is_ok());
        assert!(validate_base_url("").is_err());
        assert!(validate_base_url("ftp://x").is_err());
    }
}

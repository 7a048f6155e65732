use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

/// Request body from an inline payload or a file. The text is sent exactly
/// as given once it parses as JSON, so the signed hash matches the bytes on
/// the wire. No payload means an empty body.
pub fn load(payload: Option<&str>, path: Option<&Path>) -> Result<String> {
    let body = match (payload, path) {
        (_, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("failed to read payload from {}", path.display()))?,
        (Some(payload), None) => payload.to_string(),
        (None, None) => return Ok(String::new()),
    };

    serde_json::from_str::<Value>(&body).context("payload is not valid JSON")?;
    Ok(body)
}

/// Pretty-printed JSON, or the text unchanged if it is not JSON.
pub fn pretty(text: &str) -> String {
    serde_json::from_str::<Value>(text)
        .and_then(|value| serde_json::to_string_pretty(&value))
        .unwrap_or_else(|_| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_payload_is_empty_body() {
        assert_eq!(load(None, None).unwrap(), "");
    }

    #[test]
    fn inline_payload_is_kept_verbatim() {
        let payload = r#"{ "zones" : [ ] }"#;
        assert_eq!(load(Some(payload), None).unwrap(), payload);
    }

    #[test]
    fn file_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        fs::write(&path, "{\"operations\":[]}\n").unwrap();
        assert_eq!(load(None, Some(&path)).unwrap(), "{\"operations\":[]}\n");
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = load(Some("{not json"), None).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load(None, Some(Path::new("/nonexistent/body.json"))).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/body.json"));
    }

    #[test]
    fn pretty_falls_back_to_raw_text() {
        assert_eq!(pretty("plain"), "plain");
        assert_eq!(pretty(r#"{"a":1}"#), "{\n  \"a\": 1\n}");
    }
}

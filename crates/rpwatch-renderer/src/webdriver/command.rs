//! Request/response plumbing for the W3C WebDriver wire protocol.
//!
//! Every response is a JSON envelope `{"value": ...}`. Failures carry
//! `{"value": {"error": "<code>", "message": "..."}}` with a non-2xx status.

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde_json::Value;

use crate::error::RendererError;

/// W3C web element identifier key.
pub(crate) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Send one WebDriver command and unwrap the `value` member of the envelope.
pub(crate) async fn execute(
    client: &Client,
    method: Method,
    url: Url,
    body: Option<&Value>,
    timeout: Duration,
    command: &str,
) -> Result<Value, RendererError> {
    let mut request = client.request(method, url).timeout(timeout);
    if let Some(body) = body {
        request = request.json(body);
    }

    let response = request
        .send()
        .await
        .map_err(|e| transport_error(e, command, timeout))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| transport_error(e, command, timeout))?;

    let envelope: Value =
        serde_json::from_str(&text).map_err(|e| RendererError::Deserialize {
            context: format!("{command} response (HTTP {})", status.as_u16()),
            source: e,
        })?;
    let value = envelope.get("value").cloned().unwrap_or(Value::Null);

    if !status.is_success() {
        return Err(command_error(command, &value, timeout));
    }
    Ok(value)
}

/// Map a failure envelope onto a typed error. Renderer-side timeouts become
/// [`RendererError::Timeout`] so callers see one shape for every elapsed bound.
pub(crate) fn command_error(command: &str, value: &Value, timeout: Duration) -> RendererError {
    let error = value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_owned();
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();

    if error == "timeout" || error == "script timeout" {
        return RendererError::Timeout {
            what: command.to_owned(),
            after_ms: millis(timeout),
        };
    }
    RendererError::Command {
        command: command.to_owned(),
        error,
        message,
    }
}

fn transport_error(err: reqwest::Error, command: &str, timeout: Duration) -> RendererError {
    if err.is_timeout() {
        RendererError::Timeout {
            what: command.to_owned(),
            after_ms: millis(timeout),
        }
    } else {
        RendererError::Http(err)
    }
}

/// Extract element handles from a `find elements` result.
pub(crate) fn element_ids(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get(ELEMENT_KEY).and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn millis(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn element_ids_reads_w3c_key() {
        let value = json!([
            { ELEMENT_KEY: "a-1" },
            { "ELEMENT": "legacy-only" },
            { ELEMENT_KEY: "a-2" }
        ]);
        assert_eq!(element_ids(&value), vec!["a-1", "a-2"]);
    }

    #[test]
    fn element_ids_of_non_array_is_empty() {
        assert!(element_ids(&Value::Null).is_empty());
    }

    #[test]
    fn command_error_maps_timeout_code() {
        let value = json!({ "error": "timeout", "message": "page load" });
        let err = command_error("navigate", &value, Duration::from_secs(3));
        assert!(
            matches!(err, RendererError::Timeout { ref what, after_ms: 3000 } if what == "navigate"),
            "got: {err:?}"
        );
    }

    #[test]
    fn command_error_keeps_code_and_message() {
        let value = json!({ "error": "no such element", "message": "gone" });
        let err = command_error("click", &value, Duration::from_secs(1));
        assert!(err.is_stale_element());
        assert_eq!(
            err.to_string(),
            "renderer command click failed (no such element): gone"
        );
    }
}

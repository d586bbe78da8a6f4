//! Turns non-success responses into [`AppError`]s with a readable message.

use serde_json::Value;

use crate::config::Config;
use crate::models::error::AppError;

/// Creates an error based on HTTP status code and response body.
pub fn error_for_status(status: u16, body: &str) -> AppError {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let message = || {
        json.as_ref()
            .and_then(extract_message)
            .unwrap_or_else(|| status_message(status))
    };

    match status {
        401 => AppError::Unauthorized(message()),
        404 => AppError::NotFound(message()),
        422 => AppError::Validation(
            json.as_ref()
                .and_then(|j| j.get("detail"))
                .and_then(validation_message)
                .unwrap_or_else(message),
        ),
        _ => AppError::Api {
            status,
            message: message(),
        },
    }
}

/// Finds a human-readable message in an error body.
///
/// Looks at `error.message`, then a string `detail`, then a top-level `message`.
pub fn extract_message(body: &Value) -> Option<String> {
    let candidates = [
        body.pointer("/error/message"),
        body.get("detail"),
        body.get("message"),
        body.get("error"),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|m| !m.is_empty())
        .map(str::to_string)
}

/// Flattens a 422 `detail` into one string.
///
/// A list of `{loc | field, msg | message}` entries becomes
/// `"field: msg; field: msg"`; a plain string is used as is.
pub fn validation_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(field_error).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("; "))
            }
        }
        _ => None,
    }
}

fn field_error(item: &Value) -> Option<String> {
    let message = item
        .get("msg")
        .or_else(|| item.get("message"))
        .and_then(Value::as_str)?;

    let field = item
        .get("field")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| item.get("loc").and_then(location_path));

    Some(match field {
        Some(field) if !field.is_empty() => format!("{field}: {message}"),
        _ => message.to_string(),
    })
}

/// `["body", "user", "email"]` -> `user.email`
fn location_path(loc: &Value) -> Option<String> {
    let segments: Vec<String> = loc
        .as_array()?
        .iter()
        .filter_map(|segment| match segment {
            Value::String(s) if s == "body" || s == "query" || s == "path" => None,
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect();
    Some(segments.join("."))
}

fn status_message(status: u16) -> String {
    if status == 0 {
        Config::GENERIC_ERROR_MESSAGE.to_string()
    } else {
        format!("Request failed with status code {status}")
    }
}

/// Message to display for any error, falling back to the generic text when empty.
pub fn display_message(error: &AppError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        Config::GENERIC_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

use base64::Engine as _;
use serde::Deserialize;
use serde_json::{Map, Value};
use url::Url;

/// Top-level fields that may hold the result, in priority order.
const RESULT_FIELDS: [&str; 3] = ["output", "result", "new_image_url"];

/// Keys searched inside an object-shaped result, in priority order.
const NESTED_URL_KEYS: [&str; 5] = ["result_url", "image_url", "output_url", "url", "image"];

const DUMP_LIMIT: usize = 300;

/// Where the finished image can be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultRef {
    Url(Url),
    Inline { mime: String, bytes: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("completed job carried no usable result: {dump}")]
pub struct MalformedResult {
    /// Raw payload, truncated for display.
    pub dump: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ResultField {
    Text(String),
    Object(Map<String, Value>),
    List(Vec<ResultField>),
    Other(Value),
}

/// Extracts the result reference from a completed job's status body.
pub fn classify_result(payload: &Value) -> Result<ResultRef, MalformedResult> {
    let malformed = || MalformedResult {
        dump: truncate(&payload.to_string(), DUMP_LIMIT),
    };

    let field = RESULT_FIELDS
        .iter()
        .find_map(|name| payload.get(*name).filter(|value| !value.is_null()))
        .ok_or_else(malformed)?;
    let field = ResultField::deserialize(field).map_err(|_| malformed())?;
    resolve(&field).ok_or_else(malformed)
}

fn resolve(field: &ResultField) -> Option<ResultRef> {
    match field {
        ResultField::Text(text) => parse_reference(text),
        ResultField::Object(map) => NESTED_URL_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find_map(parse_reference),
        ResultField::List(items) => items.iter().find_map(resolve),
        ResultField::Other(_) => None,
    }
}

fn parse_reference(raw: &str) -> Option<ResultRef> {
    let raw = raw.trim();
    if let Some(data) = raw.strip_prefix("data:") {
        return parse_data_uri(data);
    }
    let url = Url::parse(raw).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(ResultRef::Url(url))
}

/// Accepts `<mime>;base64,<payload>` (the part after `data:`).
fn parse_data_uri(data: &str) -> Option<ResultRef> {
    let (header, encoded) = data.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(ResultRef::Inline {
        mime: mime.to_string(),
        bytes,
    })
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

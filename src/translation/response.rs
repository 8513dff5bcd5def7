use serde::Serialize;
use serde_json::Value;

use super::{same_language, Detection, TranslationError};

#[derive(Debug, Serialize)]
pub struct TranslateQuery<'a> {
    pub client: &'static str,
    pub sl: &'static str,
    pub tl: &'a str,
    pub dt: &'static str,
    pub q: &'a str,
}

impl<'a> TranslateQuery<'a> {
    pub fn new(text: &'a str, target: &'a str) -> Self {
        Self {
            client: "gtx",
            sl: "auto",
            tl: target,
            dt: "t",
            q: text,
        }
    }
}

/// The endpoint answers with a positional JSON array:
/// `[[["translated", "source", ...], ...], null, "detected-lang", ...]`.
pub fn parse_detected_language(body: &Value) -> Result<String, TranslationError> {
    body.get(2)
        .and_then(Value::as_str)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TranslationError::Malformed("missing detected language".into()))
}

pub fn parse_translation(body: &Value) -> Result<String, TranslationError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::Malformed("missing translation segments".into()))?;

    let text: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if text.is_empty() {
        return Err(TranslationError::Malformed("empty translation".into()));
    }
    Ok(text)
}

/// Reads both answers from a single response. The translation is dropped
/// when the source language already matches `target`.
pub fn parse_detection(body: &Value, target: &str) -> Result<Detection, TranslationError> {
    let language = parse_detected_language(body)?;
    let translation = if same_language(&language, target) {
        None
    } else {
        Some(parse_translation(body)?)
    };
    Ok(Detection {
        language,
        translation,
    })
}

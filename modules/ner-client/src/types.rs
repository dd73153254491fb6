use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct EntRequest<'a> {
    pub text: &'a str,
    pub model: &'a str,
}

/// One span from `/ent`. Offsets are character (code point) offsets into the
/// submitted text; `text` is only sent by some server builds.
#[derive(Debug, Clone, Deserialize)]
pub struct EntSpan {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type", alias = "label")]
    pub label: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// A recognized entity with its surface text resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

pub mod error;
pub mod types;

pub use error::{NerError, Result};
pub use types::{EntRequest, EntSpan, Entity};

use std::time::Duration;

pub const DEFAULT_MODEL: &str = "en_core_web_sm";

pub struct NerClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl NerClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Tag every entity in `text`. Empty input short-circuits without a request.
    pub async fn entities(&self, text: &str) -> Result<Vec<Entity>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let endpoint = format!("{}/ent", self.base_url);
        let resp = self
            .client
            .post(&endpoint)
            .json(&EntRequest {
                text,
                model: &self.model,
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NerError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let spans: Vec<EntSpan> = serde_json::from_str(&resp.text().await?)?;
        tracing::trace!(spans = spans.len(), "NER response");
        Ok(resolve_spans(text, spans))
    }
}

/// Attach surface text to spans, slicing the input by character offsets when
/// the server did not echo it. Spans that fall outside the text are dropped.
pub fn resolve_spans(text: &str, spans: Vec<EntSpan>) -> Vec<Entity> {
    spans
        .into_iter()
        .filter_map(|span| {
            let surface = match span.text {
                Some(t) => t,
                None => slice_chars(text, span.start, span.end)?,
            };
            Some(Entity {
                text: surface,
                label: span.label,
            })
        })
        .collect()
}

fn slice_chars(text: &str, start: usize, end: usize) -> Option<String> {
    if end <= start || end > text.chars().count() {
        return None;
    }
    Some(text.chars().skip(start).take(end - start).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_text_by_character_offsets() {
        let text = "Flooding in São Paulo and Rio";
        let spans: Vec<EntSpan> = serde_json::from_str(
            r#"[{"start": 12, "end": 21, "type": "GPE"}, {"start": 26, "end": 29, "type": "GPE"}]"#,
        )
        .unwrap();
        let entities = resolve_spans(text, spans);
        assert_eq!(
            entities,
            vec![
                Entity { text: "São Paulo".into(), label: "GPE".into() },
                Entity { text: "Rio".into(), label: "GPE".into() },
            ]
        );
    }

    #[test]
    fn prefers_echoed_text_and_accepts_label_alias() {
        let spans: Vec<EntSpan> = serde_json::from_str(
            r#"[{"start": 0, "end": 3, "label": "ORG", "text": "UN"}]"#,
        )
        .unwrap();
        let entities = resolve_spans("UN says", spans);
        assert_eq!(entities[0].text, "UN");
        assert_eq!(entities[0].label, "ORG");
    }

    #[test]
    fn out_of_range_spans_are_dropped() {
        let spans = vec![
            EntSpan { start: 4, end: 2, label: "GPE".into(), text: None },
            EntSpan { start: 0, end: 99, label: "GPE".into(), text: None },
        ];
        assert!(resolve_spans("short", spans).is_empty());
    }
}

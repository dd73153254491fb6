//! Deduplication and noise filtering.
//!
//! Pre-resolution: one pass over classified articles in arrival order that
//! drops repeated URLs, repeated titles, denylisted URLs and noisy titles.
//! Post-resolution: one record per (date, category, location) occurrence.

use std::collections::HashSet;

use anyhow::{Context, Result};
use regex::Regex;

use geonews_common::file_config::FiltersConfig;
use geonews_common::{ClassifiedArticle, ResolvedEvent};

/// Why the pre-resolution pass dropped an article.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    DuplicateUrl,
    DuplicateTitle,
    DeniedUrl,
    NoisyTitle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterCounts {
    pub duplicate_url: u32,
    pub duplicate_title: u32,
    pub denied_url: u32,
    pub noisy_title: u32,
}

impl FilterCounts {
    fn record(&mut self, reason: DropReason) {
        match reason {
            DropReason::DuplicateUrl => self.duplicate_url += 1,
            DropReason::DuplicateTitle => self.duplicate_title += 1,
            DropReason::DeniedUrl => self.denied_url += 1,
            DropReason::NoisyTitle => self.noisy_title += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.duplicate_url + self.duplicate_title + self.denied_url + self.noisy_title
    }
}

/// Case-insensitive "contains any of" matcher. `None` when the list is empty.
fn any_term_regex(terms: &[String]) -> Result<Option<Regex>> {
    let escaped: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if escaped.is_empty() {
        return Ok(None);
    }
    let pattern = format!("(?i){}", escaped.join("|"));
    Regex::new(&pattern)
        .map(Some)
        .with_context(|| format!("Invalid filter pattern: {pattern}"))
}

pub struct ArticleFilter {
    url_denylist: Option<Regex>,
    title_noise: Option<Regex>,
}

impl ArticleFilter {
    pub fn new(config: &FiltersConfig) -> Result<Self> {
        Ok(Self {
            url_denylist: any_term_regex(&config.url_denylist)?,
            title_noise: any_term_regex(&config.title_noise)?,
        })
    }

    fn content_verdict(&self, article: &ClassifiedArticle) -> Option<DropReason> {
        if self
            .url_denylist
            .as_ref()
            .is_some_and(|re| re.is_match(&article.url))
        {
            return Some(DropReason::DeniedUrl);
        }
        if self
            .title_noise
            .as_ref()
            .is_some_and(|re| re.is_match(&article.title))
        {
            return Some(DropReason::NoisyTitle);
        }
        None
    }

    /// Keep the first article per URL and per exact title, then drop
    /// denylisted URLs and noisy titles. Seen-sets are updated before the
    /// content checks, so a dropped article still claims its URL and title.
    pub fn apply<T>(&self, items: Vec<T>) -> (Vec<T>, FilterCounts)
    where
        T: AsRef<ClassifiedArticle>,
    {
        let mut seen_urls = HashSet::new();
        let mut seen_titles = HashSet::new();
        let mut counts = FilterCounts::default();

        let kept = items
            .into_iter()
            .filter(|item| {
                let article = item.as_ref();
                let verdict = if !seen_urls.insert(article.url.clone()) {
                    Some(DropReason::DuplicateUrl)
                } else if !seen_titles.insert(article.title.clone()) {
                    Some(DropReason::DuplicateTitle)
                } else {
                    self.content_verdict(article)
                };
                match verdict {
                    Some(reason) => {
                        tracing::debug!(url = %article.url, ?reason, "Article filtered");
                        counts.record(reason);
                        false
                    }
                    None => true,
                }
            })
            .collect();

        (kept, counts)
    }
}

/// One record per (UTC date, category, location); first seen wins.
/// Returns the kept records and how many were collapsed.
pub fn collapse_occurrences(events: Vec<ResolvedEvent>) -> (Vec<ResolvedEvent>, u32) {
    let before = events.len();
    let mut seen = HashSet::new();
    let kept: Vec<ResolvedEvent> = events
        .into_iter()
        .filter(|e| seen.insert(e.occurrence_key()))
        .collect();
    let collapsed = (before - kept.len()) as u32;
    (kept, collapsed)
}

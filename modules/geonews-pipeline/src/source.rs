use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use geonews_common::RawArticle;
use newsapi_client::{Article, EverythingQuery, NewsApiClient};

use crate::traits::ArticleSource;

/// NewsAPI-backed article source. The window always ends at call time.
pub struct NewsApiSource {
    client: NewsApiClient,
    language: String,
}

impl NewsApiSource {
    pub fn new(client: NewsApiClient, language: &str) -> Self {
        Self {
            client,
            language: language.to_string(),
        }
    }
}

#[async_trait]
impl ArticleSource for NewsApiSource {
    async fn fetch(&self, keyword: &str, window_days: u32) -> Result<Vec<RawArticle>> {
        let query =
            EverythingQuery::trailing_window(keyword, window_days, Utc::now()).language(&self.language);
        let articles = self.client.everything(&query).await?;
        Ok(articles.into_iter().map(raw_article).collect())
    }
}

pub(crate) fn raw_article(article: Article) -> RawArticle {
    RawArticle {
        published_at: article.published_at_utc(),
        title: article.title,
        description: article.description,
        source_name: article.source.name,
        url: article.url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use newsapi_client::ArticleSource as SourceRef;

    #[test]
    fn maps_newsapi_fields_onto_raw_article() {
        let article = Article {
            source: SourceRef {
                id: None,
                name: Some("BBC News".into()),
            },
            author: None,
            title: Some("Tornado tears through Oklahoma".into()),
            description: None,
            url: "https://bbc.example/t".into(),
            published_at: Some("2024-05-07T10:00:00Z".into()),
            content: None,
        };
        let raw = raw_article(article);
        assert_eq!(raw.source_name.as_deref(), Some("BBC News"));
        assert_eq!(raw.title.as_deref(), Some("Tornado tears through Oklahoma"));
        assert_eq!(
            raw.published_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 7, 10, 0, 0).unwrap())
        );
    }
}

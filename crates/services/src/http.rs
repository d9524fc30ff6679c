use anyhow::{Context, Result};
use async_trait::async_trait;
use ivory_domain::{Difficulty, ExamSession, Lesson, QuizSession};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::provider::ContentProvider;

/// Fetches content from a remote generator at `GET {endpoint}/{lesson,exam,quiz}`.
#[derive(Clone)]
pub struct HttpContentProvider {
    pub endpoint: String,
    client: Client,
}

impl HttpContentProvider {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn url(&self, resource: &str) -> String {
        format!("{}/{resource}", self.endpoint)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let url = self.url(resource);
        info!(url = %url, ?query, "requesting content");
        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("request {url}"))?;
        if response.status() == StatusCode::NOT_FOUND {
            warn!(url = %url, "provider has no content for request");
            return Ok(None);
        }
        let body = response
            .error_for_status()
            .with_context(|| format!("provider rejected {url}"))?
            .json::<T>()
            .await
            .with_context(|| format!("decode {resource} from {url}"))?;
        Ok(Some(body))
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    async fn generate_lesson(
        &self,
        difficulty: Difficulty,
        topic: &str,
        lang: &str,
    ) -> Result<Option<Lesson>> {
        self.fetch(
            "lesson",
            &[
                ("difficulty", difficulty.as_str()),
                ("topic", topic),
                ("lang", lang),
            ],
        )
        .await
    }

    async fn generate_exam(&self, topics: &[String], lang: &str) -> Result<Option<ExamSession>> {
        let topics = topics.join(",");
        self.fetch("exam", &[("topics", topics.as_str()), ("lang", lang)])
            .await
    }

    async fn generate_quiz(&self, topic: &str, lang: &str) -> Result<Option<QuizSession>> {
        self.fetch("quiz", &[("topic", topic), ("lang", lang)]).await
    }
}

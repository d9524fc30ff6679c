use anyhow::Result;
use async_trait::async_trait;
use ivory_domain::{Content, ContentRequest, Difficulty, ExamSession, Lesson, QuizSession};

/// Source of generated or curated content. `Ok(None)` means the provider had
/// nothing for the request; errors are transport or decoding failures.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn generate_lesson(
        &self,
        difficulty: Difficulty,
        topic: &str,
        lang: &str,
    ) -> Result<Option<Lesson>>;

    async fn generate_exam(&self, topics: &[String], lang: &str) -> Result<Option<ExamSession>>;

    async fn generate_quiz(&self, topic: &str, lang: &str) -> Result<Option<QuizSession>>;

    async fn fulfil(&self, request: &ContentRequest) -> Result<Option<Content>> {
        Ok(match request {
            ContentRequest::Lesson {
                difficulty,
                topic,
                lang,
            } => self
                .generate_lesson(*difficulty, topic, lang)
                .await?
                .map(Content::Lesson),
            ContentRequest::Exam { topics, lang } => {
                self.generate_exam(topics, lang).await?.map(Content::Exam)
            }
            ContentRequest::Quiz { topic, lang } => {
                self.generate_quiz(topic, lang).await?.map(Content::Quiz)
            }
        })
    }
}

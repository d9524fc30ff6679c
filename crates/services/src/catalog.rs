use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use ivory_domain::{ContentFormat, Difficulty, ExamSession, Lesson, QuizSession};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::provider::ContentProvider;

fn default_lang() -> String {
    "en".to_string()
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry<T> {
    pub topic: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    /// Lessons only; an entry without one serves every difficulty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    pub content: T,
}

impl<T> CatalogEntry<T> {
    pub fn new(topic: impl Into<String>, lang: impl Into<String>, content: T) -> Self {
        Self {
            topic: topic.into(),
            lang: lang.into(),
            difficulty: None,
            content,
        }
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }
}

/// Curated content held in memory, looked up by topic and language.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct StaticCatalog {
    #[serde(default)]
    pub lessons: Vec<CatalogEntry<Lesson>>,
    #[serde(default)]
    pub exams: Vec<CatalogEntry<ExamSession>>,
    #[serde(default)]
    pub quizzes: Vec<CatalogEntry<QuizSession>>,
}

/// Exact language first, then the same topic in any language.
fn lookup<'a, T>(
    entries: &'a [CatalogEntry<T>],
    topic: &str,
    lang: &str,
    accept: impl Fn(&CatalogEntry<T>) -> bool,
) -> Option<&'a CatalogEntry<T>> {
    let matching =
        |entry: &&CatalogEntry<T>| entry.topic.eq_ignore_ascii_case(topic) && accept(entry);
    entries
        .iter()
        .filter(&matching)
        .find(|entry| entry.lang.eq_ignore_ascii_case(lang))
        .or_else(|| entries.iter().find(&matching))
}

impl StaticCatalog {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read catalog {}", path.display()))?;
        let catalog: StaticCatalog = match ContentFormat::from_path(path) {
            ContentFormat::Yaml => serde_yaml::from_slice(&bytes)
                .with_context(|| format!("parse catalog {}", path.display()))?,
            ContentFormat::Json => serde_json::from_slice(&bytes)
                .with_context(|| format!("parse catalog {}", path.display()))?,
        };
        info!(
            lessons = catalog.lessons.len(),
            exams = catalog.exams.len(),
            quizzes = catalog.quizzes.len(),
            "loaded content catalog"
        );
        Ok(catalog)
    }

    pub fn with_lesson(mut self, entry: CatalogEntry<Lesson>) -> Self {
        self.lessons.push(entry);
        self
    }

    pub fn with_exam(mut self, entry: CatalogEntry<ExamSession>) -> Self {
        self.exams.push(entry);
        self
    }

    pub fn with_quiz(mut self, entry: CatalogEntry<QuizSession>) -> Self {
        self.quizzes.push(entry);
        self
    }
}

#[async_trait]
impl ContentProvider for StaticCatalog {
    async fn generate_lesson(
        &self,
        difficulty: Difficulty,
        topic: &str,
        lang: &str,
    ) -> Result<Option<Lesson>> {
        let entry = lookup(&self.lessons, topic, lang, |entry| {
            entry.difficulty.map_or(true, |level| level == difficulty)
        });
        debug!(topic, lang, %difficulty, found = entry.is_some(), "catalog lesson lookup");
        Ok(entry.map(|entry| entry.content.clone()))
    }

    async fn generate_exam(&self, topics: &[String], lang: &str) -> Result<Option<ExamSession>> {
        let found: Vec<&ExamSession> = topics
            .iter()
            .filter_map(|topic| lookup(&self.exams, topic, lang, |_| true))
            .map(|entry| &entry.content)
            .collect();
        debug!(?topics, lang, found = found.len(), "catalog exam lookup");
        let Some(first) = found.first() else {
            return Ok(None);
        };
        if found.len() == 1 {
            return Ok(Some((*first).clone()));
        }
        let title = found
            .iter()
            .map(|exam| exam.title.as_str())
            .collect::<Vec<_>>()
            .join(" + ");
        let questions = found
            .iter()
            .flat_map(|exam| exam.questions.iter().cloned())
            .collect();
        Ok(Some(ExamSession::new(title, questions)))
    }

    async fn generate_quiz(&self, topic: &str, lang: &str) -> Result<Option<QuizSession>> {
        let entry = lookup(&self.quizzes, topic, lang, |_| true);
        debug!(topic, lang, found = entry.is_some(), "catalog quiz lookup");
        Ok(entry.map(|entry| entry.content.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivory_domain::{Content, ContentRequest, ExamQuestion, LessonStep, QuestionKind, QuizQuestion};

    fn catalog() -> StaticCatalog {
        StaticCatalog::default()
            .with_lesson(CatalogEntry::new(
                "intervals",
                "en",
                Lesson::new(
                    "intervals-en",
                    "Intervals",
                    "",
                    vec![LessonStep::new("Third", "").with_targets(["C4", "E4"])],
                ),
            ))
            .with_lesson(
                CatalogEntry::new(
                    "intervals",
                    "de",
                    Lesson::new("intervals-de", "Intervalle", "", Vec::new()),
                )
                .with_difficulty(Difficulty::Advanced),
            )
            .with_exam(CatalogEntry::new(
                "triads",
                "en",
                ExamSession::new(
                    "Triads",
                    vec![ExamQuestion::played("t1", "Major", QuestionKind::Chord, vec![0, 4, 7])],
                ),
            ))
            .with_exam(CatalogEntry::new(
                "seconds",
                "en",
                ExamSession::new(
                    "Seconds",
                    vec![ExamQuestion::played("s1", "Minor second", QuestionKind::Interval, vec![0, 1])],
                ),
            ))
            .with_quiz(CatalogEntry::new(
                "theory",
                "fr",
                QuizSession::new(
                    "Théorie",
                    vec![QuizQuestion::new("q", "?", vec!["a".into(), "b".into()], 0)],
                ),
            ))
    }

    #[tokio::test]
    async fn falls_back_to_other_languages() {
        let catalog = catalog();
        let lesson = catalog
            .generate_lesson(Difficulty::Beginner, "Intervals", "de")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lesson.id, "intervals-en");
        let lesson = catalog
            .generate_lesson(Difficulty::Advanced, "intervals", "de")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(lesson.id, "intervals-de");
        let quiz = catalog.generate_quiz("theory", "en").await.unwrap();
        assert_eq!(quiz.unwrap().title, "Théorie");
        assert!(catalog.generate_quiz("rhythm", "en").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn exams_combine_requested_topics() {
        let catalog = catalog();
        let topics = vec!["triads".to_string(), "unknown".to_string(), "seconds".to_string()];
        let exam = catalog.generate_exam(&topics, "en").await.unwrap().unwrap();
        assert_eq!(exam.title, "Triads + Seconds");
        let ids: Vec<&str> = exam.questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "s1"]);
        assert!(catalog
            .generate_exam(&["unknown".to_string()], "en")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn fulfil_dispatches_on_request_kind() {
        let content = catalog()
            .fulfil(&ContentRequest::Quiz {
                topic: "theory".into(),
                lang: "fr".into(),
            })
            .await
            .unwrap();
        assert!(matches!(content, Some(Content::Quiz(_))));
    }

    #[test]
    fn loads_yaml_catalog() {
        let path = std::env::temp_dir().join(format!("ivory-catalog-{}.yaml", std::process::id()));
        let yaml = r#"
lessons:
  - topic: scales
    content:
      id: major
      title: Major scale
      steps:
        - title: Start
          explanation: Play C
          targets: [C4]
"#;
        std::fs::write(&path, yaml).unwrap();
        let catalog = StaticCatalog::from_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(catalog.lessons.len(), 1);
        assert_eq!(catalog.lessons[0].lang, "en");
        assert_eq!(catalog.lessons[0].content.steps[0].targets, vec!["C4"]);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{error::DomainError, exam::ExamSession, lesson::Lesson, quiz::QuizSession};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Lesson,
    Exam,
    Quiz,
}

/// What the session asks a content provider for.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ContentRequest {
    Lesson {
        difficulty: Difficulty,
        topic: String,
        lang: String,
    },
    Exam {
        topics: Vec<String>,
        lang: String,
    },
    Quiz {
        topic: String,
        lang: String,
    },
}

impl ContentRequest {
    pub fn kind(&self) -> ContentKind {
        match self {
            ContentRequest::Lesson { .. } => ContentKind::Lesson,
            ContentRequest::Exam { .. } => ContentKind::Exam,
            ContentRequest::Quiz { .. } => ContentKind::Quiz,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Content {
    Lesson(Lesson),
    Exam(ExamSession),
    Quiz(QuizSession),
}

impl Content {
    pub fn kind(&self) -> ContentKind {
        match self {
            Content::Lesson(_) => ContentKind::Lesson,
            Content::Exam(_) => ContentKind::Exam,
            Content::Quiz(_) => ContentKind::Quiz,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Content::Lesson(lesson) => &lesson.title,
            Content::Exam(exam) => &exam.title,
            Content::Quiz(quiz) => &quiz.title,
        }
    }

    /// Rejects content with nothing to practise.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Content::Lesson(lesson) => lesson.validate(),
            Content::Exam(exam) => exam.validate(),
            Content::Quiz(quiz) => quiz.validate(),
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    #[serde(default)]
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn new(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            options,
            correct_index,
            explanation: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizSession {
    #[serde(default)]
    pub title: String,
    pub questions: Vec<QuizQuestion>,
}

impl QuizSession {
    pub fn new(title: impl Into<String>, questions: Vec<QuizQuestion>) -> Self {
        Self {
            title: title.into(),
            questions,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.questions.is_empty() {
            return Err(DomainError::validation(format!("quiz {:?} has no questions", self.title)));
        }
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::note::Note;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Interval,
    Chord,
    Scale,
    Quiz,
}

impl QuestionKind {
    /// Discrete-choice questions are answered by picking an option, not by playing.
    pub fn is_choice(self) -> bool {
        matches!(self, QuestionKind::Quiz)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamQuestion {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Semitones relative to an unspecified root.
    #[serde(default)]
    pub pattern: Vec<i32>,
    #[serde(default)]
    pub example_solution: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
}

impl ExamQuestion {
    pub fn played(
        id: impl Into<String>,
        question: impl Into<String>,
        kind: QuestionKind,
        pattern: Vec<i32>,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            kind,
            pattern,
            example_solution: Vec::new(),
            options: None,
            correct_index: None,
        }
    }

    pub fn choice(
        id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
    ) -> Self {
        Self {
            id: id.into(),
            question: question.into(),
            kind: QuestionKind::Quiz,
            pattern: Vec::new(),
            example_solution: Vec::new(),
            options: Some(options),
            correct_index: Some(correct_index),
        }
    }

    pub fn with_example<I, S>(mut self, solution: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.example_solution = solution.into_iter().map(Into::into).collect();
        self
    }

    pub fn solution_midis(&self) -> Vec<u8> {
        self.example_solution
            .iter()
            .filter_map(|name| Note::parse(name).ok())
            .map(|note| note.midi)
            .collect()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExamSession {
    #[serde(default)]
    pub title: String,
    pub questions: Vec<ExamQuestion>,
}

impl ExamSession {
    pub fn new(title: impl Into<String>, questions: Vec<ExamQuestion>) -> Self {
        Self {
            title: title.into(),
            questions,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.questions.is_empty() {
            return Err(DomainError::validation(format!("exam {:?} has no questions", self.title)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_kind_uses_type_field() {
        let json = r#"{"id":"q1","question":"Play a minor triad","type":"chord","pattern":[0,3,7],"exampleSolution":["C4","Eb4","G4"]}"#;
        let question: ExamQuestion = serde_json::from_str(json).unwrap();
        assert_eq!(question.kind, QuestionKind::Chord);
        assert_eq!(question.solution_midis(), vec![60, 63, 67]);
        assert!(question.options.is_none());
    }

    #[test]
    fn choice_questions_are_flagged() {
        let question = ExamQuestion::choice("q", "Which?", vec!["a".into(), "b".into()], 1);
        assert!(question.kind.is_choice());
        assert!(!QuestionKind::Scale.is_choice());
    }
}

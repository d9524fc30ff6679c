use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::note::{normalize, Note};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LessonStep {
    pub title: String,
    pub explanation: String,
    #[serde(default)]
    pub targets: Vec<String>,
    /// Notes to light up on the keyboard. Empty with targets present means a blind test.
    #[serde(default)]
    pub highlight: Vec<String>,
}

impl LessonStep {
    pub fn new(title: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            explanation: explanation.into(),
            targets: Vec::new(),
            highlight: Vec::new(),
        }
    }

    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_highlight<I, S>(mut self, highlight: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.highlight = highlight.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_blind(&self) -> bool {
        self.highlight.is_empty() && !self.targets.is_empty()
    }

    pub fn contains_target(&self, note: &Note) -> bool {
        let played = note.to_string();
        self.targets.iter().any(|target| normalize(target) == played)
    }

    pub fn highlight_midis(&self) -> Vec<u8> {
        self.highlight
            .iter()
            .filter_map(|name| Note::parse(name).ok())
            .map(|note| note.midi)
            .collect()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub steps: Vec<LessonStep>,
}

impl Lesson {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<LessonStep>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            steps,
        }
    }

    pub fn step(&self, index: usize) -> Option<&LessonStep> {
        self.steps.get(index)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.steps.is_empty() {
            return Err(DomainError::validation(format!("lesson {:?} has no steps", self.title)));
        }
        Ok(())
    }
}

use ivory_domain::{QuizQuestion, QuizSession};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum QuizFeedback {
    #[default]
    None,
    Correct,
    Wrong,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct QuizProgress {
    session: QuizSession,
    current_index: usize,
    selected_option: Option<usize>,
    feedback: QuizFeedback,
    correct_answers: usize,
    finished: bool,
}

impl QuizProgress {
    pub fn new(session: QuizSession) -> Self {
        let finished = session.questions.is_empty();
        Self {
            session,
            current_index: 0,
            selected_option: None,
            feedback: QuizFeedback::None,
            correct_answers: 0,
            finished,
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    pub fn current(&self) -> Option<&QuizQuestion> {
        if self.finished {
            return None;
        }
        self.session.questions.get(self.current_index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn total(&self) -> usize {
        self.session.questions.len()
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn feedback(&self) -> QuizFeedback {
        self.feedback
    }

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Records a choice. Only the first choice per question counts.
    pub fn select(&mut self, index: usize) -> Option<bool> {
        if self.feedback != QuizFeedback::None {
            return None;
        }
        let question = self.current()?;
        if index >= question.options.len() {
            return None;
        }
        let correct = question.correct_index == index;
        self.selected_option = Some(index);
        if correct {
            self.feedback = QuizFeedback::Correct;
            self.correct_answers += 1;
        } else {
            self.feedback = QuizFeedback::Wrong;
        }
        Some(correct)
    }

    /// Moves on. Returns true once the last question has been passed.
    pub fn advance(&mut self) -> bool {
        if self.finished {
            return true;
        }
        self.current_index += 1;
        self.selected_option = None;
        self.feedback = QuizFeedback::None;
        if self.current_index >= self.total() {
            self.finished = true;
        }
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> QuizSession {
        QuizSession::new(
            "Theory",
            vec![
                QuizQuestion::new("a", "Semitones in a major third?", vec!["3".into(), "4".into()], 1),
                QuizQuestion::new("b", "Notes in a triad?", vec!["3".into(), "4".into()], 0),
            ],
        )
    }

    #[test]
    fn first_choice_counts() {
        let mut progress = QuizProgress::new(quiz());
        assert_eq!(progress.select(1), Some(true));
        assert_eq!(progress.select(0), None);
        assert_eq!(progress.feedback(), QuizFeedback::Correct);
        assert_eq!(progress.correct_answers(), 1);
        assert!(!progress.advance());
        assert_eq!(progress.select(9), None);
        assert_eq!(progress.select(1), Some(false));
        assert_eq!(progress.feedback(), QuizFeedback::Wrong);
        assert!(progress.advance());
        assert!(progress.current().is_none());
        assert_eq!(progress.correct_answers(), 1);
    }
}

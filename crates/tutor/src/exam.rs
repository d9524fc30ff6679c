use ivory_domain::{ExamQuestion, ExamSession};
use serde::{Deserialize, Serialize};

use crate::matcher::{classify, HeldNotes, PatternVerdict};

/// Staged hint reveal. Phases only move forward one at a time and start over
/// at `Idle` for every question.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum HintPhase {
    #[default]
    Idle,
    HintReady,
    HintActive,
    SkipReady,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Feedback {
    #[default]
    None,
    Success,
    Failure,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExamProgress {
    session: ExamSession,
    current_index: usize,
    correct_answers: usize,
    finished: bool,
    feedback: Feedback,
    hint_phase: HintPhase,
    selected_option: Option<usize>,
}

impl ExamProgress {
    pub fn new(session: ExamSession) -> Self {
        let finished = session.questions.is_empty();
        Self {
            session,
            current_index: 0,
            correct_answers: 0,
            finished,
            feedback: Feedback::None,
            hint_phase: HintPhase::Idle,
            selected_option: None,
        }
    }

    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    pub fn current(&self) -> Option<&ExamQuestion> {
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

    pub fn correct_answers(&self) -> usize {
        self.correct_answers
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn feedback(&self) -> Feedback {
        self.feedback
    }

    pub fn hint_phase(&self) -> HintPhase {
        self.hint_phase
    }

    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    pub fn is_choice_question(&self) -> bool {
        self.current()
            .map(|question| question.kind.is_choice())
            .unwrap_or(false)
    }

    pub fn evaluate(&mut self, held: &HeldNotes) -> Option<PatternVerdict> {
        if self.feedback != Feedback::None {
            return None;
        }
        let question = self.current()?;
        if question.kind.is_choice() {
            return None;
        }
        let verdict = classify(held, &question.pattern);
        if verdict == PatternVerdict::Complete {
            self.feedback = Feedback::Success;
            self.correct_answers += 1;
        }
        Some(verdict)
    }

    pub fn select_option(&mut self, index: usize) -> Option<bool> {
        if self.feedback != Feedback::None {
            return None;
        }
        let question = self.current()?;
        if !question.kind.is_choice() {
            return None;
        }
        let option_count = question.options.as_ref().map(Vec::len).unwrap_or(0);
        if index >= option_count {
            return None;
        }
        let correct = question.correct_index == Some(index);
        self.selected_option = Some(index);
        if correct {
            self.feedback = Feedback::Success;
            self.correct_answers += 1;
        } else {
            self.feedback = Feedback::Failure;
        }
        Some(correct)
    }

    pub fn hint_ready(&mut self) -> bool {
        if self.hint_phase != HintPhase::Idle
            || self.feedback != Feedback::None
            || self.current().is_none()
            || self.is_choice_question()
        {
            return false;
        }
        self.hint_phase = HintPhase::HintReady;
        true
    }

    pub fn reveal_hint(&mut self) -> bool {
        if self.hint_phase != HintPhase::HintReady {
            return false;
        }
        self.hint_phase = HintPhase::HintActive;
        true
    }

    pub fn skip_ready(&mut self) -> bool {
        if self.hint_phase != HintPhase::HintActive {
            return false;
        }
        self.hint_phase = HintPhase::SkipReady;
        true
    }

    pub fn can_advance(&self) -> bool {
        !self.finished
            && (self.feedback != Feedback::None || self.hint_phase == HintPhase::SkipReady)
    }

    pub fn advance(&mut self) -> bool {
        if self.finished {
            return true;
        }
        self.current_index += 1;
        self.feedback = Feedback::None;
        self.hint_phase = HintPhase::Idle;
        self.selected_option = None;
        if self.current_index >= self.total() {
            self.finished = true;
        }
        self.finished
    }

    pub fn hint_notes(&self) -> Vec<u8> {
        match self.hint_phase {
            HintPhase::HintActive | HintPhase::SkipReady => self
                .current()
                .map(ExamQuestion::solution_midis)
                .unwrap_or_default(),
            HintPhase::Idle | HintPhase::HintReady => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ivory_domain::QuestionKind;

    fn held(notes: &[u8]) -> HeldNotes {
        notes.iter().copied().collect()
    }

    fn exam() -> ExamSession {
        ExamSession::new(
            "Chords",
            vec![
                ExamQuestion::played("q1", "Minor triad", QuestionKind::Chord, vec![0, 3, 7])
                    .with_example(["C4", "Eb4", "G4"]),
                ExamQuestion::choice("q2", "Which is a fifth?", vec!["C-G".into(), "C-F".into()], 0),
            ],
        )
    }

    #[test]
    fn subset_is_in_progress_and_full_set_succeeds() {
        let mut progress = ExamProgress::new(exam());
        assert_eq!(progress.evaluate(&held(&[60, 63])), Some(PatternVerdict::InProgress));
        assert_eq!(progress.evaluate(&held(&[60, 65])), Some(PatternVerdict::Mistake));
        assert_eq!(progress.feedback(), Feedback::None);
        assert_eq!(progress.evaluate(&held(&[60, 63, 67])), Some(PatternVerdict::Complete));
        assert_eq!(progress.feedback(), Feedback::Success);
        assert_eq!(progress.correct_answers(), 1);
        assert_eq!(progress.evaluate(&held(&[60])), None);
    }

    #[test]
    fn hint_phases_advance_in_order() {
        let mut progress = ExamProgress::new(exam());
        assert!(!progress.skip_ready());
        assert!(!progress.reveal_hint());
        assert!(progress.hint_notes().is_empty());
        assert!(progress.hint_ready());
        assert!(!progress.hint_ready());
        assert!(progress.reveal_hint());
        assert_eq!(progress.hint_notes(), vec![60, 63, 67]);
        assert!(progress.skip_ready());
        assert!(progress.can_advance());
        assert!(!progress.advance());
        assert_eq!(progress.hint_phase(), HintPhase::Idle);
    }

    #[test]
    fn answered_questions_do_not_offer_hints() {
        let mut progress = ExamProgress::new(exam());
        progress.evaluate(&held(&[60, 63, 67]));
        assert!(!progress.hint_ready());
    }

    #[test]
    fn choice_questions_skip_the_matcher() {
        let mut progress = ExamProgress::new(exam());
        progress.advance();
        assert!(progress.is_choice_question());
        assert_eq!(progress.evaluate(&held(&[60])), None);
        assert!(!progress.hint_ready());
        assert_eq!(progress.select_option(5), None);
        assert_eq!(progress.select_option(1), Some(false));
        assert_eq!(progress.feedback(), Feedback::Failure);
        assert_eq!(progress.select_option(0), None);
        assert!(progress.advance());
        assert!(progress.is_finished());
        assert!(progress.current().is_none());
    }

    #[test]
    fn empty_exam_starts_finished() {
        let progress = ExamProgress::new(ExamSession::new("none", Vec::new()));
        assert!(progress.is_finished());
        assert!(!progress.can_advance());
    }
}

use ivory_domain::{ContentKind, ExamQuestion, KeyWindow, LessonStep, QuizQuestion};
use serde::Serialize;

use crate::exam::{ExamProgress, Feedback, HintPhase};
use crate::history::HistoryEntry;
use crate::lesson::LessonProgress;
use crate::matcher::PatternVerdict;
use crate::quiz::{QuizFeedback, QuizProgress};

/// Whether content is on its way, or why it did not arrive.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ContentStatus {
    Idle,
    Loading { kind: ContentKind },
    Unavailable { kind: ContentKind },
    Failed { kind: ContentKind, message: String },
}

/// Read-only picture of the session handed to the view layer after each change.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SessionSnapshot {
    pub mode: ModeView,
    pub held: Vec<u8>,
    pub history: Vec<HistoryEntry>,
    pub base_octave: i32,
    pub octave_shift: i32,
    pub windows: Vec<KeyWindow>,
    pub content: ContentStatus,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ModeView {
    Menu,
    Lesson(LessonView),
    Exam(ExamView),
    Quiz(QuizView),
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LessonView {
    pub title: String,
    pub step_index: usize,
    pub step_count: usize,
    pub step: Option<LessonStep>,
    pub highlight: Vec<u8>,
    pub blind: bool,
    pub cursor: usize,
    pub step_complete: bool,
    pub override_available: bool,
    pub progress: f32,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ExamView {
    pub title: String,
    pub index: usize,
    pub total: usize,
    pub question: Option<ExamQuestion>,
    pub feedback: Feedback,
    pub hint_phase: HintPhase,
    pub hint_notes: Vec<u8>,
    /// How the currently held notes fit the question, for colouring held keys.
    pub input: Option<PatternVerdict>,
    pub selected_option: Option<usize>,
    pub correct_answers: usize,
    pub progress: f32,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct QuizView {
    pub title: String,
    pub index: usize,
    pub total: usize,
    pub question: Option<QuizQuestion>,
    pub selected_option: Option<usize>,
    pub feedback: QuizFeedback,
    pub correct_answers: usize,
    pub progress: f32,
}

fn fraction(index: usize, total: usize) -> f32 {
    if total == 0 {
        0.0
    } else {
        index as f32 / total as f32
    }
}

impl LessonView {
    pub fn from_progress(progress: &LessonProgress) -> Self {
        let step = progress.step().cloned();
        Self {
            title: progress.lesson().title.clone(),
            step_index: progress.current_step_index(),
            step_count: progress.step_count(),
            highlight: step
                .as_ref()
                .map(LessonStep::highlight_midis)
                .unwrap_or_default(),
            blind: step.as_ref().map(LessonStep::is_blind).unwrap_or(false),
            step,
            cursor: progress.cursor(),
            step_complete: progress.is_step_complete(),
            override_available: progress.override_unlocked(),
            progress: fraction(progress.current_step_index(), progress.step_count()),
        }
    }
}

impl ExamView {
    pub fn from_progress(progress: &ExamProgress, input: Option<PatternVerdict>) -> Self {
        Self {
            title: progress.session().title.clone(),
            index: progress.current_index(),
            total: progress.total(),
            question: progress.current().cloned(),
            feedback: progress.feedback(),
            hint_phase: progress.hint_phase(),
            hint_notes: progress.hint_notes(),
            input,
            selected_option: progress.selected_option(),
            correct_answers: progress.correct_answers(),
            progress: fraction(progress.current_index(), progress.total()),
        }
    }
}

impl QuizView {
    pub fn from_progress(progress: &QuizProgress) -> Self {
        Self {
            title: progress.session().title.clone(),
            index: progress.current_index(),
            total: progress.total(),
            question: progress.current().cloned(),
            selected_option: progress.selected_option(),
            feedback: progress.feedback(),
            correct_answers: progress.correct_answers(),
            progress: fraction(progress.current_index(), progress.total()),
        }
    }
}

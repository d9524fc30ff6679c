pub mod content;
pub mod error;
pub mod exam;
pub mod io;
pub mod keyboard;
pub mod lesson;
pub mod note;
pub mod quiz;

pub use crate::content::{Content, ContentKind, ContentRequest, Difficulty};
pub use crate::error::DomainError;
pub use crate::exam::{ExamQuestion, ExamSession, QuestionKind};
pub use crate::io::{decode_content, encode_content, ContentFormat};
pub use crate::keyboard::{
    ControlKey, KeyCode, KeyWindow, KeyboardMapper, PianoKey, ShiftDirection,
};
pub use crate::lesson::{Lesson, LessonStep};
pub use crate::note::{
    canonical_name, display_name, frequency_of, normalize, AccidentalStyle, Note,
};
pub use crate::quiz::{QuizQuestion, QuizSession};

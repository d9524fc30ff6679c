pub mod config;
pub mod exam;
pub mod history;
pub mod lesson;
pub mod matcher;
pub mod midi;
pub mod quiz;
pub mod session;
pub mod snapshot;
pub mod timer;

pub use config::{ConfigError, TutorConfig};
pub use exam::{ExamProgress, Feedback, HintPhase};
pub use history::{EntryStatus, HistoryEntry, HistoryLedger};
pub use lesson::{LessonProgress, StepChange, StepUpdate};
pub use matcher::{classify, matches, HeldNotes, PatternVerdict};
pub use midi::{MidiDevice, MidiManager, MidiNoteEvent};
pub use quiz::{QuizFeedback, QuizProgress};
pub use session::{
    Mode, ModeKind, RequestTicket, ResolveOutcome, SessionEvent, SessionOrchestrator,
};
pub use snapshot::{ContentStatus, ExamView, LessonView, ModeView, QuizView, SessionSnapshot};
pub use timer::{TimerId, TimerQueue};

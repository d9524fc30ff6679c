use std::collections::BTreeMap;
use std::time::Instant;

use ivory_audio::{ToneEngine, Velocity};
use ivory_domain::{
    Content, ContentKind, ContentRequest, ControlKey, ExamSession, KeyCode, KeyboardMapper,
    Lesson, Note, QuizSession, ShiftDirection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::TutorConfig;
use crate::exam::{ExamProgress, HintPhase};
use crate::history::{EntryStatus, HistoryLedger};
use crate::lesson::{LessonProgress, StepChange, StepUpdate};
use crate::matcher::{HeldNotes, PatternVerdict};
use crate::midi::MidiNoteEvent;
use crate::quiz::QuizProgress;
use crate::snapshot::{ContentStatus, ExamView, LessonView, ModeView, QuizView, SessionSnapshot};
use crate::timer::TimerQueue;

#[derive(Clone, Debug, PartialEq)]
pub enum Mode {
    Menu,
    Lesson(LessonProgress),
    Exam(ExamProgress),
    Quiz(QuizProgress),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModeKind {
    Menu,
    Lesson,
    Exam,
    Quiz,
}

impl Mode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Mode::Menu => ModeKind::Menu,
            Mode::Lesson(_) => ModeKind::Lesson,
            Mode::Exam(_) => ModeKind::Exam,
            Mode::Quiz(_) => ModeKind::Quiz,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    SessionStarted { kind: ModeKind },
    ReturnedToMenu,
    StepCompleted { step: usize },
    OverrideAvailable { step: usize },
    LessonFinished,
    Mistake,
    HintAvailable { question: usize },
    SkipAvailable { question: usize },
    ExamAnswered { question: usize, correct: bool },
    ExamFinished { correct: usize, total: usize },
    QuizAnswered { question: usize, correct: bool },
    QuizFinished { correct: usize, total: usize },
    ContentUnavailable { kind: ContentKind },
    ContentFailed { kind: ContentKind },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionTimer {
    HintReady { question: usize },
    SkipReady { question: usize },
    OverrideUnlock { step: usize },
    AutoAdvance { question: usize },
}

/// Identifies one content request. Only the most recent ticket is honoured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    id: u64,
    kind: ContentKind,
}

impl RequestTicket {
    pub fn kind(&self) -> ContentKind {
        self.kind
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    Applied,
    Discarded,
    Unavailable,
    Failed,
}

pub struct SessionOrchestrator {
    config: TutorConfig,
    tone: Box<dyn ToneEngine>,
    mapper: KeyboardMapper,
    mode: Mode,
    held: HeldNotes,
    active_keys: BTreeMap<KeyCode, u8>,
    history: HistoryLedger,
    timers: TimerQueue<SessionTimer>,
    content: ContentStatus,
    next_ticket: u64,
    pending_ticket: Option<RequestTicket>,
    exam_input: Option<PatternVerdict>,
    events: Vec<SessionEvent>,
}

impl SessionOrchestrator {
    pub fn new(config: TutorConfig, tone: Box<dyn ToneEngine>) -> Self {
        Self {
            mapper: KeyboardMapper::new(config.base_octave),
            history: HistoryLedger::new(config.history_capacity, config.fade()),
            config,
            tone,
            mode: Mode::Menu,
            held: HeldNotes::new(),
            active_keys: BTreeMap::new(),
            timers: TimerQueue::new(),
            content: ContentStatus::Idle,
            next_ticket: 0,
            pending_ticket: None,
            exam_input: None,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn mode_kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn held_notes(&self) -> &HeldNotes {
        &self.held
    }

    pub fn history(&self) -> &HistoryLedger {
        &self.history
    }

    pub fn mapper(&self) -> &KeyboardMapper {
        &self.mapper
    }

    pub fn content_status(&self) -> &ContentStatus {
        &self.content
    }

    pub fn lesson(&self) -> Option<&LessonProgress> {
        match &self.mode {
            Mode::Lesson(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn exam(&self) -> Option<&ExamProgress> {
        match &self.mode {
            Mode::Exam(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn quiz(&self) -> Option<&QuizProgress> {
        match &self.mode {
            Mode::Quiz(progress) => Some(progress),
            _ => None,
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.history.next_deadline(), self.timers.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub async fn initialize_audio(&mut self) {
        self.tone.initialize().await;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mode = match &self.mode {
            Mode::Menu => ModeView::Menu,
            Mode::Lesson(progress) => ModeView::Lesson(LessonView::from_progress(progress)),
            Mode::Exam(progress) => ModeView::Exam(ExamView::from_progress(progress, self.exam_input)),
            Mode::Quiz(progress) => ModeView::Quiz(QuizView::from_progress(progress)),
        };
        SessionSnapshot {
            mode,
            held: self.held.iter().copied().collect(),
            history: self.history.entries().cloned().collect(),
            base_octave: self.mapper.base_octave(),
            octave_shift: self.mapper.shift(),
            windows: self.mapper.windows(),
            content: self.content.clone(),
        }
    }

    // ---- session lifecycle ----

    pub fn start_lesson(&mut self, lesson: Lesson, now: Instant) -> bool {
        if let Err(err) = lesson.validate() {
            warn!(error = %err, "lesson not started");
            return false;
        }
        self.reset_session();
        info!(title = %lesson.title, steps = lesson.steps.len(), "starting lesson");
        self.mode = Mode::Lesson(LessonProgress::new(lesson));
        self.events.push(SessionEvent::SessionStarted {
            kind: ModeKind::Lesson,
        });
        self.enter_step(now);
        true
    }

    pub fn start_exam(&mut self, exam: ExamSession, now: Instant) -> bool {
        if let Err(err) = exam.validate() {
            warn!(error = %err, "exam not started");
            return false;
        }
        self.reset_session();
        info!(title = %exam.title, questions = exam.questions.len(), "starting exam");
        self.mode = Mode::Exam(ExamProgress::new(exam));
        self.events.push(SessionEvent::SessionStarted {
            kind: ModeKind::Exam,
        });
        self.start_question(now);
        true
    }

    pub fn start_quiz(&mut self, quiz: QuizSession, _now: Instant) -> bool {
        if let Err(err) = quiz.validate() {
            warn!(error = %err, "quiz not started");
            return false;
        }
        self.reset_session();
        info!(title = %quiz.title, questions = quiz.questions.len(), "starting quiz");
        self.mode = Mode::Quiz(QuizProgress::new(quiz));
        self.events.push(SessionEvent::SessionStarted {
            kind: ModeKind::Quiz,
        });
        true
    }

    pub fn start_content(&mut self, content: Content, now: Instant) -> bool {
        match content {
            Content::Lesson(lesson) => self.start_lesson(lesson, now),
            Content::Exam(exam) => self.start_exam(exam, now),
            Content::Quiz(quiz) => self.start_quiz(quiz, now),
        }
    }

    pub fn return_to_menu(&mut self) {
        let was_active = self.mode != Mode::Menu;
        self.reset_session();
        self.mode = Mode::Menu;
        if was_active {
            info!("returned to menu");
            self.events.push(SessionEvent::ReturnedToMenu);
        }
    }

    fn reset_session(&mut self) {
        for midi in std::mem::take(&mut self.held) {
            self.tone.stop_note(midi);
        }
        self.active_keys.clear();
        self.history.clear();
        self.timers.invalidate();
        self.exam_input = None;
        self.pending_ticket = None;
        self.content = ContentStatus::Idle;
    }

    // ---- content requests ----

    pub fn begin_request(&mut self, request: &ContentRequest) -> RequestTicket {
        let ticket = RequestTicket {
            id: self.next_ticket,
            kind: request.kind(),
        };
        self.next_ticket += 1;
        self.pending_ticket = Some(ticket);
        self.content = ContentStatus::Loading { kind: ticket.kind };
        info!(?request, ticket = ticket.id, "requesting content");
        ticket
    }

    pub fn cancel_request(&mut self) -> bool {
        let cancelled = self.pending_ticket.take().is_some();
        if cancelled {
            debug!("content request cancelled");
            self.content = ContentStatus::Idle;
        }
        cancelled
    }

    #[instrument(skip_all, fields(ticket = ticket.id, kind = ?ticket.kind))]
    pub fn resolve_request(
        &mut self,
        ticket: RequestTicket,
        result: anyhow::Result<Option<Content>>,
        now: Instant,
    ) -> ResolveOutcome {
        if self.pending_ticket != Some(ticket) {
            debug!("discarding stale content response");
            return ResolveOutcome::Discarded;
        }
        self.pending_ticket = None;
        match result {
            Err(err) => {
                warn!(error = %err, "content provider failed");
                self.content = ContentStatus::Failed {
                    kind: ticket.kind,
                    message: err.to_string(),
                };
                self.events
                    .push(SessionEvent::ContentFailed { kind: ticket.kind });
                ResolveOutcome::Failed
            }
            Ok(Some(content)) if self.start_content(content.clone(), now) => ResolveOutcome::Applied,
            Ok(_) => {
                info!(kind = ?ticket.kind, "content unavailable");
                self.content = ContentStatus::Unavailable { kind: ticket.kind };
                self.events
                    .push(SessionEvent::ContentUnavailable { kind: ticket.kind });
                ResolveOutcome::Unavailable
            }
        }
    }

    // ---- input ----

    pub fn key_down(&mut self, key: KeyCode, now: Instant) {
        if let Some(control) = key.control() {
            match control {
                ControlKey::ShiftUp => self.mapper.set_shift(ShiftDirection::Up, true),
                ControlKey::ShiftDown => self.mapper.set_shift(ShiftDirection::Down, true),
                ControlKey::OctaveDown => {
                    self.mapper.nudge_octave(-1);
                }
                ControlKey::OctaveUp => {
                    self.mapper.nudge_octave(1);
                }
                ControlKey::Advance => self.advance(now),
                ControlKey::Menu => self.return_to_menu(),
            }
            return;
        }
        if self.accepts_choice() {
            if let Some(index) = key.choice_index() {
                self.select_option(index, now);
                return;
            }
        }
        if self.active_keys.contains_key(&key) {
            return;
        }
        if let Some(midi) = self.mapper.resolve(key) {
            self.active_keys.insert(key, midi);
            self.note_on(midi, self.default_velocity(), now);
        }
    }

    pub fn key_up(&mut self, key: KeyCode, now: Instant) {
        match key.control() {
            Some(ControlKey::ShiftUp) => self.mapper.set_shift(ShiftDirection::Up, false),
            Some(ControlKey::ShiftDown) => self.mapper.set_shift(ShiftDirection::Down, false),
            _ => {
                if let Some(midi) = self.active_keys.remove(&key) {
                    self.note_off(midi, now);
                }
            }
        }
    }

    pub fn pointer_down(&mut self, midi: u8, now: Instant) {
        self.note_on(midi, self.default_velocity(), now);
    }

    pub fn pointer_up(&mut self, midi: u8, now: Instant) {
        self.note_off(midi, now);
    }

    pub fn midi_message(&mut self, message: &[u8], now: Instant) {
        match MidiNoteEvent::decode(message) {
            Some(MidiNoteEvent::On { note, velocity }) => {
                self.note_on(note, Some(Velocity::from_midi(velocity)), now)
            }
            Some(MidiNoteEvent::Off { note }) => self.note_off(note, now),
            None => {}
        }
    }

    pub fn note_on(&mut self, midi: u8, velocity: Option<Velocity>, now: Instant) {
        if midi > ivory_domain::note::MIDI_MAX {
            return;
        }
        self.tone.play_note(midi, velocity);
        self.held.insert(midi);
        let note = Note::from_midi(midi);
        let label = note.display(self.config.accidentals);
        debug!(midi, note = %label, "note on");

        if matches!(self.mode, Mode::Exam(_)) {
            self.history.append(midi, label, EntryStatus::Neutral);
            self.validate_exam(now);
            return;
        }
        let Mode::Lesson(progress) = &mut self.mode else {
            self.history.append(midi, label, EntryStatus::Neutral);
            return;
        };
        let status = if progress.is_target(&note) {
            EntryStatus::Success
        } else {
            EntryStatus::Neutral
        };
        self.history.append(midi, label, status);
        let step = progress.current_step_index();
        match progress.register_note(&note) {
            StepUpdate::Completed => {
                info!(step, "lesson step completed");
                self.timers
                    .cancel_where(|timer| matches!(timer, SessionTimer::OverrideUnlock { .. }));
                self.events.push(SessionEvent::StepCompleted { step });
            }
            update => debug!(step, ?update, cursor = progress.cursor(), "lesson input"),
        }
    }

    pub fn note_off(&mut self, midi: u8, now: Instant) {
        self.tone.stop_note(midi);
        self.held.remove(&midi);
        self.history.release(midi, self.config.release_hold(), now);
        if matches!(self.mode, Mode::Exam(_)) {
            self.validate_exam(now);
        }
    }

    /// Releasing a note can leave a held set that no longer fits any root,
    /// which counts as a mistake just like a wrong press.
    fn validate_exam(&mut self, now: Instant) {
        let Mode::Exam(progress) = &mut self.mode else {
            return;
        };
        let question = progress.current_index();
        let verdict = progress.evaluate(&self.held);
        if verdict.is_some() {
            self.exam_input = verdict;
        }
        match verdict {
            Some(PatternVerdict::Complete) => {
                info!(question, "exam question answered");
                let held = &self.held;
                self.history
                    .mark_success(|entry| held.contains(&entry.midi) && !entry.is_released, now);
                self.cancel_hint_timers();
                self.events.push(SessionEvent::ExamAnswered {
                    question,
                    correct: true,
                });
            }
            Some(PatternVerdict::Mistake) => {
                debug!(question, held = ?self.held, "exam mistake");
                self.history
                    .schedule_reset(self.config.mistake_reset(), now);
                self.events.push(SessionEvent::Mistake);
            }
            _ => {}
        }
    }

    fn accepts_choice(&self) -> bool {
        match &self.mode {
            Mode::Quiz(_) => true,
            Mode::Exam(progress) => progress.is_choice_question(),
            Mode::Menu | Mode::Lesson(_) => false,
        }
    }

    fn default_velocity(&self) -> Option<Velocity> {
        self.config.default_velocity.map(Velocity::new)
    }

    // ---- actions ----

    pub fn advance(&mut self, now: Instant) {
        match &mut self.mode {
            Mode::Lesson(progress) => {
                if !progress.is_step_complete() {
                    if !progress.override_unlocked() {
                        return;
                    }
                    let step = progress.current_step_index();
                    progress.force_complete();
                    info!(step, "lesson step completed by override");
                    self.events.push(SessionEvent::StepCompleted { step });
                }
                self.next_step(now);
            }
            Mode::Exam(progress) => {
                if progress.can_advance() {
                    self.advance_exam(now);
                } else if progress.hint_phase() == HintPhase::HintReady {
                    self.request_hint(now);
                }
            }
            Mode::Quiz(_) | Mode::Menu => {}
        }
    }

    pub fn manual_override(&mut self) -> bool {
        let Mode::Lesson(progress) = &mut self.mode else {
            return false;
        };
        if !progress.override_unlocked() {
            return false;
        }
        let step = progress.current_step_index();
        if progress.force_complete() {
            self.events.push(SessionEvent::StepCompleted { step });
            return true;
        }
        false
    }

    pub fn next_step(&mut self, now: Instant) {
        let Mode::Lesson(progress) = &mut self.mode else {
            return;
        };
        match progress.next_step() {
            StepChange::Moved(step) => {
                debug!(step, "moved to lesson step");
                self.enter_step(now);
            }
            StepChange::Finished => {
                info!(title = %progress.lesson().title, "lesson finished");
                self.events.push(SessionEvent::LessonFinished);
                self.return_to_menu();
            }
        }
    }

    pub fn previous_step(&mut self, now: Instant) {
        if let Mode::Lesson(progress) = &mut self.mode {
            if progress.previous_step() {
                self.enter_step(now);
            }
        }
    }

    pub fn go_to_step(&mut self, index: usize, now: Instant) -> bool {
        let Mode::Lesson(progress) = &mut self.mode else {
            return false;
        };
        if !progress.go_to_step(index) {
            return false;
        }
        self.enter_step(now);
        true
    }

    fn enter_step(&mut self, now: Instant) {
        self.timers
            .cancel_where(|timer| matches!(timer, SessionTimer::OverrideUnlock { .. }));
        if let Mode::Lesson(progress) = &self.mode {
            if !progress.is_step_complete() {
                let step = progress.current_step_index();
                self.timers.schedule(
                    now + self.config.override_grace(),
                    SessionTimer::OverrideUnlock { step },
                );
            }
        }
    }

    pub fn request_hint(&mut self, now: Instant) -> bool {
        let Mode::Exam(progress) = &mut self.mode else {
            return false;
        };
        if !progress.reveal_hint() {
            return false;
        }
        let question = progress.current_index();
        debug!(question, "hint revealed");
        self.timers.schedule(
            now + self.config.skip_delay(),
            SessionTimer::SkipReady { question },
        );
        true
    }

    pub fn select_option(&mut self, index: usize, now: Instant) -> Option<bool> {
        let (question, correct) = match &mut self.mode {
            Mode::Quiz(progress) => {
                let question = progress.current_index();
                let correct = progress.select(index)?;
                self.events
                    .push(SessionEvent::QuizAnswered { question, correct });
                (question, correct)
            }
            Mode::Exam(progress) => {
                let question = progress.current_index();
                let correct = progress.select_option(index)?;
                self.events
                    .push(SessionEvent::ExamAnswered { question, correct });
                (question, correct)
            }
            Mode::Lesson(_) | Mode::Menu => return None,
        };
        info!(question, option = index, correct, "choice selected");
        self.timers.schedule(
            now + self.config.choice_advance(),
            SessionTimer::AutoAdvance { question },
        );
        Some(correct)
    }

    fn start_question(&mut self, now: Instant) {
        self.cancel_hint_timers();
        self.exam_input = None;
        if let Mode::Exam(progress) = &self.mode {
            if progress.current().is_some() && !progress.is_choice_question() {
                self.timers.schedule(
                    now + self.config.hint_delay(),
                    SessionTimer::HintReady {
                        question: progress.current_index(),
                    },
                );
            }
        }
    }

    fn cancel_hint_timers(&mut self) {
        self.timers.cancel_where(|timer| {
            matches!(
                timer,
                SessionTimer::HintReady { .. }
                    | SessionTimer::SkipReady { .. }
                    | SessionTimer::AutoAdvance { .. }
            )
        });
    }

    fn advance_exam(&mut self, now: Instant) {
        let Mode::Exam(progress) = &mut self.mode else {
            return;
        };
        if progress.advance() {
            let (correct, total) = (progress.correct_answers(), progress.total());
            info!(correct, total, "exam finished");
            self.events.push(SessionEvent::ExamFinished { correct, total });
            self.return_to_menu();
        } else {
            self.start_question(now);
        }
    }

    fn advance_quiz(&mut self) {
        let Mode::Quiz(progress) = &mut self.mode else {
            return;
        };
        if progress.advance() {
            let (correct, total) = (progress.correct_answers(), progress.total());
            info!(correct, total, "quiz finished");
            self.events.push(SessionEvent::QuizFinished { correct, total });
            self.return_to_menu();
        }
    }

    // ---- time ----

    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.history.tick(now);
        for timer in self.timers.drain_due(now) {
            changed |= self.fire(timer, now);
        }
        changed
    }

    fn fire(&mut self, timer: SessionTimer, now: Instant) -> bool {
        match timer {
            SessionTimer::HintReady { question } => {
                let Mode::Exam(progress) = &mut self.mode else {
                    return false;
                };
                if progress.current_index() != question || !progress.hint_ready() {
                    return false;
                }
                debug!(question, "hint available");
                self.events.push(SessionEvent::HintAvailable { question });
                true
            }
            SessionTimer::SkipReady { question } => {
                let Mode::Exam(progress) = &mut self.mode else {
                    return false;
                };
                if progress.current_index() != question || !progress.skip_ready() {
                    return false;
                }
                debug!(question, "skip available");
                self.events.push(SessionEvent::SkipAvailable { question });
                true
            }
            SessionTimer::OverrideUnlock { step } => {
                let Mode::Lesson(progress) = &mut self.mode else {
                    return false;
                };
                if progress.current_step_index() != step || !progress.unlock_override() {
                    return false;
                }
                debug!(step, "manual override available");
                self.events.push(SessionEvent::OverrideAvailable { step });
                true
            }
            SessionTimer::AutoAdvance { question } => {
                let target = match &self.mode {
                    Mode::Exam(progress) if progress.current_index() == question => ModeKind::Exam,
                    Mode::Quiz(progress) if progress.current_index() == question => ModeKind::Quiz,
                    _ => {
                        debug!(question, "dropping auto-advance for a stale question");
                        return false;
                    }
                };
                if target == ModeKind::Exam {
                    self.advance_exam(now);
                } else {
                    self.advance_quiz();
                }
                true
            }
        }
    }
}

use ivory_domain::{normalize, Lesson, LessonStep, Note};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum StepUpdate {
    Advanced,
    /// The note matched the first target, so the attempt starts over from it.
    Restarted,
    Completed,
    Ignored,
    AlreadyComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepChange {
    Moved(usize),
    Finished,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LessonProgress {
    lesson: Lesson,
    current_step: usize,
    step_complete: bool,
    max_completed_step: Option<usize>,
    cursor: usize,
    override_unlocked: bool,
}

impl LessonProgress {
    pub fn new(lesson: Lesson) -> Self {
        Self {
            lesson,
            current_step: 0,
            step_complete: false,
            max_completed_step: None,
            cursor: 0,
            override_unlocked: false,
        }
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn current_step_index(&self) -> usize {
        self.current_step
    }

    pub fn step(&self) -> Option<&LessonStep> {
        self.lesson.step(self.current_step)
    }

    pub fn step_count(&self) -> usize {
        self.lesson.steps.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_step_complete(&self) -> bool {
        self.step_complete
    }

    pub fn max_completed_step(&self) -> Option<usize> {
        self.max_completed_step
    }

    pub fn override_unlocked(&self) -> bool {
        self.override_unlocked
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step + 1 >= self.step_count()
    }

    pub fn is_target(&self, note: &Note) -> bool {
        self.step()
            .map(|step| step.contains_target(note))
            .unwrap_or(false)
    }

    pub fn register_note(&mut self, note: &Note) -> StepUpdate {
        if self.step_complete {
            return StepUpdate::AlreadyComplete;
        }
        let Some(step) = self.lesson.step(self.current_step) else {
            return StepUpdate::Ignored;
        };
        let targets = &step.targets;
        let Some(expected) = targets.get(self.cursor) else {
            return StepUpdate::Ignored;
        };
        let played = note.to_string();
        if normalize(expected) == played {
            self.cursor += 1;
            if self.cursor == targets.len() {
                self.complete_step();
                return StepUpdate::Completed;
            }
            return StepUpdate::Advanced;
        }
        if targets
            .first()
            .map(|first| normalize(first) == played)
            .unwrap_or(false)
        {
            self.cursor = 1;
            return StepUpdate::Restarted;
        }
        StepUpdate::Ignored
    }

    pub fn unlock_override(&mut self) -> bool {
        if self.step_complete || self.override_unlocked {
            return false;
        }
        self.override_unlocked = true;
        true
    }

    pub fn force_complete(&mut self) -> bool {
        if self.step_complete {
            return false;
        }
        self.complete_step();
        true
    }

    pub fn go_to_step(&mut self, index: usize) -> bool {
        if index >= self.step_count() {
            return false;
        }
        self.current_step = index;
        self.cursor = 0;
        self.override_unlocked = false;
        self.step_complete = self
            .max_completed_step
            .map(|max| index <= max)
            .unwrap_or(false);
        true
    }

    pub fn next_step(&mut self) -> StepChange {
        let next = self.current_step + 1;
        if self.go_to_step(next) {
            StepChange::Moved(next)
        } else {
            StepChange::Finished
        }
    }

    pub fn previous_step(&mut self) -> bool {
        match self.current_step.checked_sub(1) {
            Some(previous) => self.go_to_step(previous),
            None => false,
        }
    }

    fn complete_step(&mut self) {
        self.step_complete = true;
        self.override_unlocked = false;
        self.max_completed_step = Some(
            self.max_completed_step
                .map_or(self.current_step, |max| max.max(self.current_step)),
        );
    }
}

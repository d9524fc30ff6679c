use std::collections::BTreeSet;
use std::fmt;

use ivory_domain::{Content, ExamQuestion, ExamSession, Lesson, Note, QuizSession};
use ivory_tutor::{matches, HeldNotes};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Where in the document, e.g. `steps[2].targets[0]`.
    pub location: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}: {}", self.location, self.message)
    }
}

#[derive(Default)]
struct Findings(Vec<Finding>);

impl Findings {
    fn error(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, location.into(), message.into());
    }

    fn warn(&mut self, location: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, location.into(), message.into());
    }

    fn push(&mut self, severity: Severity, location: String, message: String) {
        self.0.push(Finding {
            severity,
            location,
            message,
        });
    }

    fn note_names(&mut self, location: &str, names: &[String]) {
        for (index, name) in names.iter().enumerate() {
            if let Err(err) = Note::parse(name) {
                self.error(format!("{location}[{index}]"), err.to_string());
            }
        }
    }

    fn options(&mut self, location: &str, options: &[String], correct: Option<usize>) {
        if options.is_empty() {
            self.error(format!("{location}.options"), "no options to choose from");
        }
        match correct {
            None => self.error(format!("{location}.correctIndex"), "missing"),
            Some(index) if index >= options.len() => self.error(
                format!("{location}.correctIndex"),
                format!("{index} is out of range for {} options", options.len()),
            ),
            Some(_) => {}
        }
        if options.len() > 9 {
            self.warn(
                format!("{location}.options"),
                "only the first nine options have digit shortcuts",
            );
        }
    }
}

pub fn lint(content: &Content) -> Vec<Finding> {
    let mut findings = Findings::default();
    match content {
        Content::Lesson(lesson) => lint_lesson(lesson, &mut findings),
        Content::Exam(exam) => lint_exam(exam, &mut findings),
        Content::Quiz(quiz) => lint_quiz(quiz, &mut findings),
    }
    findings.0
}

fn lint_lesson(lesson: &Lesson, findings: &mut Findings) {
    if lesson.steps.is_empty() {
        findings.error("steps", "lesson has no steps");
    }
    for (index, step) in lesson.steps.iter().enumerate() {
        let location = format!("steps[{index}]");
        if step.targets.is_empty() {
            findings.warn(
                format!("{location}.targets"),
                "nothing to play; the step only completes by manual override",
            );
        }
        findings.note_names(&format!("{location}.targets"), &step.targets);
        findings.note_names(&format!("{location}.highlight"), &step.highlight);
    }
}

fn lint_played(question: &ExamQuestion, location: &str, findings: &mut Findings) {
    if question.pattern.is_empty() {
        findings.error(format!("{location}.pattern"), "empty pattern can never be answered");
        return;
    }
    let distinct: BTreeSet<i32> = question.pattern.iter().copied().collect();
    if distinct.len() != question.pattern.len() {
        findings.warn(
            format!("{location}.pattern"),
            "repeated intervals are counted once",
        );
    }
    if !distinct.contains(&0) {
        findings.error(
            format!("{location}.pattern"),
            "pattern has no 0 so no held note can act as its root",
        );
    }
    let solution = format!("{location}.exampleSolution");
    findings.note_names(&solution, &question.example_solution);
    let held: HeldNotes = question.solution_midis().into_iter().collect();
    if held.len() == question.example_solution.len()
        && !held.is_empty()
        && !matches(&held, &question.pattern, true)
    {
        findings.warn(solution, "example solution does not fit the pattern");
    }
}

fn lint_exam(exam: &ExamSession, findings: &mut Findings) {
    if exam.questions.is_empty() {
        findings.error("questions", "exam has no questions");
    }
    for (index, question) in exam.questions.iter().enumerate() {
        let location = format!("questions[{index}]");
        if question.kind.is_choice() {
            let options = question.options.as_deref().unwrap_or_default();
            findings.options(&location, options, question.correct_index);
        } else {
            lint_played(question, &location, findings);
        }
    }
}

fn lint_quiz(quiz: &QuizSession, findings: &mut Findings) {
    if quiz.questions.is_empty() {
        findings.error("questions", "quiz has no questions");
    }
    for (index, question) in quiz.questions.iter().enumerate() {
        findings.options(
            &format!("questions[{index}]"),
            &question.options,
            Some(question.correct_index),
        );
    }
}

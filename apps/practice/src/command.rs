use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Error, Result};
use ivory_domain::{ContentRequest, Difficulty, KeyCode};

/// One line of practice input.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Press and release in one go.
    Tap(KeyCode),
    NoteOn(u8),
    NoteOff(u8),
    Enter,
    Hint,
    Override,
    Choose(usize),
    Previous,
    Step(usize),
    Wait(Duration),
    Menu,
    State,
    Request(ContentRequest),
    Cancel,
}

fn key(arg: Option<&str>) -> Result<KeyCode> {
    let arg = arg.ok_or_else(|| anyhow!("missing key"))?;
    KeyCode::from_code(arg).ok_or_else(|| anyhow!("unknown key {arg:?}"))
}

fn number<T: FromStr>(arg: Option<&str>, what: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    arg.ok_or_else(|| anyhow!("missing {what}"))?
        .parse()
        .with_context(|| format!("invalid {what}"))
}

fn difficulty(arg: Option<&str>) -> Result<Difficulty> {
    match arg.map(str::to_ascii_lowercase).as_deref() {
        None | Some("beginner") => Ok(Difficulty::Beginner),
        Some("intermediate") => Ok(Difficulty::Intermediate),
        Some("advanced") => Ok(Difficulty::Advanced),
        Some(other) => bail!("unknown difficulty {other:?}"),
    }
}

impl Command {
    /// Parses a line, filling content requests with `lang`. Blank lines and
    /// `#` comments yield `None`.
    pub fn parse(line: &str, lang: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_ascii_lowercase();
        let arg = words.next();
        let command = match verb.as_str() {
            "down" => Command::KeyDown(key(arg)?),
            "up" => Command::KeyUp(key(arg)?),
            "tap" => Command::Tap(key(arg)?),
            "on" => Command::NoteOn(number(arg, "MIDI note")?),
            "off" => Command::NoteOff(number(arg, "MIDI note")?),
            "enter" | "next" => Command::Enter,
            "hint" => Command::Hint,
            "override" => Command::Override,
            "choose" => {
                let choice: usize = number(arg, "option")?;
                if choice == 0 {
                    bail!("options are numbered from 1");
                }
                Command::Choose(choice - 1)
            }
            "prev" => Command::Previous,
            "step" => Command::Step(number(arg, "step")?),
            "wait" => Command::Wait(Duration::from_millis(number(arg, "milliseconds")?)),
            "menu" | "esc" => Command::Menu,
            "state" => Command::State,
            "cancel" => Command::Cancel,
            "lesson" => Command::Request(ContentRequest::Lesson {
                topic: arg.ok_or_else(|| anyhow!("missing topic"))?.to_string(),
                difficulty: difficulty(words.next())?,
                lang: lang.to_string(),
            }),
            "exam" => Command::Request(ContentRequest::Exam {
                topics: arg
                    .ok_or_else(|| anyhow!("missing topics"))?
                    .split(',')
                    .map(str::to_string)
                    .collect(),
                lang: lang.to_string(),
            }),
            "quiz" => Command::Request(ContentRequest::Quiz {
                topic: arg.ok_or_else(|| anyhow!("missing topic"))?.to_string(),
                lang: lang.to_string(),
            }),
            other => bail!("unknown command {other:?}"),
        };
        Ok(Some(command))
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        Command::parse(line, "en")?.ok_or_else(|| anyhow!("empty command"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_input_commands() {
        assert_eq!("down z".parse::<Command>().unwrap(), Command::KeyDown(KeyCode::KeyZ));
        assert_eq!("up KeyC".parse::<Command>().unwrap(), Command::KeyUp(KeyCode::KeyC));
        assert_eq!("down shift".parse::<Command>().unwrap(), Command::KeyDown(KeyCode::ShiftLeft));
        assert_eq!("on 60".parse::<Command>().unwrap(), Command::NoteOn(60));
        assert_eq!("choose 2".parse::<Command>().unwrap(), Command::Choose(1));
        assert_eq!(
            "wait 1500".parse::<Command>().unwrap(),
            Command::Wait(Duration::from_millis(1500))
        );
        assert_eq!("ENTER".parse::<Command>().unwrap(), Command::Enter);
    }

    #[test]
    fn builds_content_requests() {
        assert_eq!(
            Command::parse("lesson intervals advanced", "de").unwrap(),
            Some(Command::Request(ContentRequest::Lesson {
                difficulty: Difficulty::Advanced,
                topic: "intervals".into(),
                lang: "de".into(),
            }))
        );
        assert_eq!(
            Command::parse("exam triads,seconds", "en").unwrap(),
            Some(Command::Request(ContentRequest::Exam {
                topics: vec!["triads".into(), "seconds".into()],
                lang: "en".into(),
            }))
        );
    }

    #[test]
    fn rejects_bad_lines() {
        assert!(Command::parse("   ", "en").unwrap().is_none());
        assert!(Command::parse("# comment", "en").unwrap().is_none());
        assert!("on 300".parse::<Command>().is_err());
        assert!("choose 0".parse::<Command>().is_err());
        assert!("down".parse::<Command>().is_err());
        assert!("dance".parse::<Command>().is_err());
        assert!("lesson scales expert".parse::<Command>().is_err());
    }
}

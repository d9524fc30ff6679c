use std::fmt;

use serde::{Deserialize, Serialize};

use crate::DomainError;

pub const MIDI_MAX: u8 = 127;
pub const CONCERT_A_MIDI: u8 = 69;
pub const CONCERT_A_HZ: f64 = 440.0;

const SHARP_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];
const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccidentalStyle {
    #[default]
    Sharp,
    Flat,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Note {
    pub name: String,
    pub octave: i32,
    pub midi: u8,
}

impl Note {
    pub fn from_midi(midi: u8) -> Self {
        let midi = midi.min(MIDI_MAX);
        Self {
            name: SHARP_NAMES[(midi % 12) as usize].to_string(),
            octave: i32::from(midi / 12) - 1,
            midi,
        }
    }

    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let spelling = Spelling::parse(input).ok_or_else(|| DomainError::invalid_note(input))?;
        let value = spelling
            .absolute()
            .ok_or_else(|| DomainError::invalid_note(input))?;
        if !(0..=i32::from(MIDI_MAX)).contains(&value) {
            return Err(DomainError::invalid_note(input));
        }
        Ok(Self::from_midi(value as u8))
    }

    pub fn pitch_class(&self) -> u8 {
        self.midi % 12
    }

    pub fn is_black(&self) -> bool {
        is_black_key(self.midi)
    }

    pub fn frequency(&self) -> f64 {
        frequency_of(self.midi)
    }

    pub fn display(&self, style: AccidentalStyle) -> String {
        spelled(i32::from(self.midi), style)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

pub fn frequency_of(midi: u8) -> f64 {
    let offset = f64::from(midi) - f64::from(CONCERT_A_MIDI);
    CONCERT_A_HZ * 2f64.powf(offset / 12.0)
}

pub fn canonical_name(midi: u8) -> String {
    Note::from_midi(midi).to_string()
}

pub fn is_black_key(midi: u8) -> bool {
    matches!(midi % 12, 1 | 3 | 6 | 8 | 10)
}

/// Octave-crossing spellings are resolved by pitch, so `Cb4` becomes `B3` and
/// `B#3` becomes `C4`. Names without an octave normalize to a bare pitch class.
pub fn normalize(name: &str) -> String {
    match Spelling::parse(name) {
        Some(spelling) => match spelling.absolute() {
            Some(value) => spelled(value, AccidentalStyle::Sharp),
            None => SHARP_NAMES[spelling.offset.rem_euclid(12) as usize].to_string(),
        },
        None => name.trim().to_string(),
    }
}

pub fn display_name(name: &str, style: AccidentalStyle) -> String {
    match Spelling::parse(name) {
        Some(spelling) => match spelling.absolute() {
            Some(value) => spelled(value, style),
            None => {
                let table = match style {
                    AccidentalStyle::Sharp => &SHARP_NAMES,
                    AccidentalStyle::Flat => &FLAT_NAMES,
                };
                table[spelling.offset.rem_euclid(12) as usize].to_string()
            }
        },
        None => name.to_string(),
    }
}

fn spelled(value: i32, style: AccidentalStyle) -> String {
    let table = match style {
        AccidentalStyle::Sharp => &SHARP_NAMES,
        AccidentalStyle::Flat => &FLAT_NAMES,
    };
    let pitch_class = value.rem_euclid(12) as usize;
    let octave = value.div_euclid(12) - 1;
    format!("{}{}", table[pitch_class], octave)
}

struct Spelling {
    /// Semitones above the C of the written octave; may be -1 (`Cb`) or 12 (`B#`).
    offset: i32,
    absolute: Option<i32>,
}

impl Spelling {
    fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let mut chars = trimmed.chars();
        let letter = match chars.next()?.to_ascii_uppercase() {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let rest = chars.as_str();
        let mut accidental = 0;
        let mut consumed = 0;
        for ch in rest.chars() {
            match ch {
                '#' | '♯' => accidental += 1,
                'b' | '♭' => accidental -= 1,
                _ => break,
            }
            consumed += ch.len_utf8();
        }
        let octave_text = &rest[consumed..];
        let offset = letter + accidental;
        let absolute = if octave_text.is_empty() {
            None
        } else {
            let octave = octave_text.parse::<i32>().ok()?;
            Some(octave.checked_add(1)?.checked_mul(12)?.checked_add(offset)?)
        };
        Some(Self { offset, absolute })
    }

    fn absolute(&self) -> Option<i32> {
        self.absolute
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn frequency_matches_equal_temperament() {
        assert_relative_eq!(frequency_of(69), 440.0);
        assert_relative_eq!(frequency_of(81), 880.0);
        assert_relative_eq!(frequency_of(60), 261.625_565, epsilon = 1e-5);
    }

    #[test]
    fn canonical_names_use_sharps() {
        assert_eq!(canonical_name(60), "C4");
        assert_eq!(canonical_name(61), "C#4");
        assert_eq!(canonical_name(0), "C-1");
        assert_eq!(canonical_name(127), "G9");
    }

    #[test]
    fn normalize_flats_to_sharps() {
        assert_eq!(normalize("Eb4"), "D#4");
        assert_eq!(normalize("D#4"), "D#4");
        assert_eq!(normalize("Db"), "C#");
        assert_eq!(normalize("bb3"), "A#3");
        assert_eq!(normalize("Fb4"), "E4");
        assert_eq!(normalize("E#4"), "F4");
    }

    #[test]
    fn normalize_resolves_octave_crossing_spellings() {
        assert_eq!(normalize("Cb4"), "B3");
        assert_eq!(normalize("B#3"), "C4");
        assert_eq!(normalize("Cb"), "B");
    }

    #[test]
    fn normalize_is_idempotent() {
        for name in [
            "C4", "Db4", "Cb4", "B#3", "E#", "Gb-1", "A♭2", "F♯5", "nonsense", " Eb4 ", "",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once, "input {name:?}");
        }
    }

    #[test]
    fn parse_computes_midi() {
        assert_eq!(Note::parse("C4").unwrap().midi, 60);
        assert_eq!(Note::parse("Eb4").unwrap().midi, 63);
        assert_eq!(Note::parse("Cb4").unwrap().midi, 59);
        assert!(Note::parse("H4").is_err());
        assert!(Note::parse("C").is_err());
        assert!(Note::parse("G#9").is_err());
    }

    #[test]
    fn display_name_respells_for_flats() {
        assert_eq!(display_name("C#4", AccidentalStyle::Flat), "Db4");
        assert_eq!(display_name("C#4", AccidentalStyle::Sharp), "C#4");
        assert_eq!(display_name("A#", AccidentalStyle::Flat), "Bb");
        assert_eq!(Note::from_midi(70).display(AccidentalStyle::Flat), "Bb4");
    }

    #[test]
    fn huge_octaves_are_not_note_names() {
        for name in ["C999999999", "C-999999999", "B#2147483646"] {
            assert!(matches!(Note::parse(name), Err(DomainError::InvalidNote(_))));
            assert_eq!(normalize(name), name);
            assert_eq!(display_name(name, AccidentalStyle::Flat), name);
        }
    }
}

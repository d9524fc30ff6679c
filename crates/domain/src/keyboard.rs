use serde::{Deserialize, Serialize};

use crate::note::{Note, MIDI_MAX};

pub const MIN_BASE_OCTAVE: i32 = 1;
pub const MAX_BASE_OCTAVE: i32 = 7;
pub const DEFAULT_BASE_OCTAVE: i32 = 4;
/// Semitones added or removed while an octave-shift modifier is held.
pub const OCTAVE_JUMP: i32 = 24;
pub const WINDOW_SPAN: i32 = 24;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyCode {
    KeyZ,
    KeyS,
    KeyX,
    KeyD,
    KeyC,
    KeyV,
    KeyG,
    KeyB,
    KeyH,
    KeyN,
    KeyJ,
    KeyM,
    KeyQ,
    Digit2,
    KeyW,
    Digit3,
    KeyE,
    KeyR,
    Digit5,
    KeyT,
    Digit6,
    KeyY,
    Digit7,
    KeyU,
    Digit1,
    Digit4,
    Digit8,
    Digit9,
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    ArrowLeft,
    ArrowRight,
    Enter,
    Escape,
}

const NOTE_LAYOUT: [KeyCode; 24] = [
    KeyCode::KeyZ,
    KeyCode::KeyS,
    KeyCode::KeyX,
    KeyCode::KeyD,
    KeyCode::KeyC,
    KeyCode::KeyV,
    KeyCode::KeyG,
    KeyCode::KeyB,
    KeyCode::KeyH,
    KeyCode::KeyN,
    KeyCode::KeyJ,
    KeyCode::KeyM,
    KeyCode::KeyQ,
    KeyCode::Digit2,
    KeyCode::KeyW,
    KeyCode::Digit3,
    KeyCode::KeyE,
    KeyCode::KeyR,
    KeyCode::Digit5,
    KeyCode::KeyT,
    KeyCode::Digit6,
    KeyCode::KeyY,
    KeyCode::Digit7,
    KeyCode::KeyU,
];

const ALL_KEYS: [KeyCode; 36] = [
    KeyCode::KeyZ,
    KeyCode::KeyS,
    KeyCode::KeyX,
    KeyCode::KeyD,
    KeyCode::KeyC,
    KeyCode::KeyV,
    KeyCode::KeyG,
    KeyCode::KeyB,
    KeyCode::KeyH,
    KeyCode::KeyN,
    KeyCode::KeyJ,
    KeyCode::KeyM,
    KeyCode::KeyQ,
    KeyCode::Digit2,
    KeyCode::KeyW,
    KeyCode::Digit3,
    KeyCode::KeyE,
    KeyCode::KeyR,
    KeyCode::Digit5,
    KeyCode::KeyT,
    KeyCode::Digit6,
    KeyCode::KeyY,
    KeyCode::Digit7,
    KeyCode::KeyU,
    KeyCode::Digit1,
    KeyCode::Digit4,
    KeyCode::Digit8,
    KeyCode::Digit9,
    KeyCode::ShiftLeft,
    KeyCode::ShiftRight,
    KeyCode::ControlLeft,
    KeyCode::ControlRight,
    KeyCode::ArrowLeft,
    KeyCode::ArrowRight,
    KeyCode::Enter,
    KeyCode::Escape,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlKey {
    ShiftUp,
    ShiftDown,
    OctaveDown,
    OctaveUp,
    Advance,
    Menu,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShiftDirection {
    Up,
    Down,
}

impl KeyCode {
    pub fn all() -> &'static [KeyCode] {
        &ALL_KEYS
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let trimmed = code.trim();
        if let Some(key) = ALL_KEYS
            .iter()
            .copied()
            .find(|key| format!("{key:?}").eq_ignore_ascii_case(trimmed))
        {
            return Some(key);
        }
        let lowered = trimmed.to_ascii_lowercase();
        let key = match lowered.as_str() {
            "shift" => KeyCode::ShiftLeft,
            "ctrl" | "control" => KeyCode::ControlLeft,
            "left" => KeyCode::ArrowLeft,
            "right" => KeyCode::ArrowRight,
            "esc" => KeyCode::Escape,
            single if single.chars().count() == 1 => {
                let ch = single.chars().next()?;
                let name = if ch.is_ascii_digit() {
                    format!("Digit{ch}")
                } else {
                    format!("Key{}", ch.to_ascii_uppercase())
                };
                return ALL_KEYS.iter().copied().find(|key| format!("{key:?}") == name);
            }
            _ => return None,
        };
        Some(key)
    }

    pub fn note_offset(self) -> Option<u8> {
        NOTE_LAYOUT
            .iter()
            .position(|key| *key == self)
            .map(|index| index as u8)
    }

    pub fn choice_index(self) -> Option<usize> {
        match self {
            KeyCode::Digit1 => Some(0),
            KeyCode::Digit2 => Some(1),
            KeyCode::Digit3 => Some(2),
            KeyCode::Digit4 => Some(3),
            KeyCode::Digit5 => Some(4),
            KeyCode::Digit6 => Some(5),
            KeyCode::Digit7 => Some(6),
            KeyCode::Digit8 => Some(7),
            KeyCode::Digit9 => Some(8),
            _ => None,
        }
    }

    pub fn control(self) -> Option<ControlKey> {
        match self {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(ControlKey::ShiftUp),
            KeyCode::ControlLeft | KeyCode::ControlRight => Some(ControlKey::ShiftDown),
            KeyCode::ArrowLeft => Some(ControlKey::OctaveDown),
            KeyCode::ArrowRight => Some(ControlKey::OctaveUp),
            KeyCode::Enter => Some(ControlKey::Advance),
            KeyCode::Escape => Some(ControlKey::Menu),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PianoKey {
    pub note: Note,
    pub is_black: bool,
    pub key: Option<KeyCode>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyWindow {
    pub base_octave: i32,
    pub live: bool,
    pub keys: Vec<PianoKey>,
}

pub fn window_start_midi(base_octave: i32) -> i32 {
    (base_octave + 1) * 12
}

/// Keys of the two-octave window starting at `base_octave`'s C. Pitches outside
/// the MIDI range are left out.
pub fn generate_keys(base_octave: i32, bind: bool) -> Vec<PianoKey> {
    let start = window_start_midi(base_octave);
    NOTE_LAYOUT
        .iter()
        .enumerate()
        .filter_map(|(offset, key)| {
            let midi = start + offset as i32;
            if !(0..=i32::from(MIDI_MAX)).contains(&midi) {
                return None;
            }
            let note = Note::from_midi(midi as u8);
            Some(PianoKey {
                is_black: note.is_black(),
                note,
                key: bind.then_some(*key),
            })
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyboardMapper {
    base_octave: i32,
    shift_up: bool,
    shift_down: bool,
}

impl KeyboardMapper {
    pub fn new(base_octave: i32) -> Self {
        Self {
            base_octave: base_octave.clamp(MIN_BASE_OCTAVE, MAX_BASE_OCTAVE),
            shift_up: false,
            shift_down: false,
        }
    }

    pub fn base_octave(&self) -> i32 {
        self.base_octave
    }

    pub fn nudge_octave(&mut self, delta: i32) -> bool {
        let next = (self.base_octave + delta).clamp(MIN_BASE_OCTAVE, MAX_BASE_OCTAVE);
        let changed = next != self.base_octave;
        self.base_octave = next;
        changed
    }

    pub fn set_shift(&mut self, direction: ShiftDirection, held: bool) {
        match direction {
            ShiftDirection::Up => self.shift_up = held,
            ShiftDirection::Down => self.shift_down = held,
        }
    }

    pub fn release_modifiers(&mut self) {
        self.shift_up = false;
        self.shift_down = false;
    }

    pub fn shift_allowed(&self, direction: ShiftDirection) -> bool {
        let start = window_start_midi(self.base_octave);
        match direction {
            ShiftDirection::Up => start + WINDOW_SPAN - 1 + OCTAVE_JUMP <= i32::from(MIDI_MAX),
            ShiftDirection::Down => start - OCTAVE_JUMP >= 0,
        }
    }

    pub fn shift(&self) -> i32 {
        let mut shift = 0;
        if self.shift_up && self.shift_allowed(ShiftDirection::Up) {
            shift += OCTAVE_JUMP;
        }
        if self.shift_down && self.shift_allowed(ShiftDirection::Down) {
            shift -= OCTAVE_JUMP;
        }
        shift
    }

    pub fn resolve(&self, key: KeyCode) -> Option<u8> {
        let offset = key.note_offset()?;
        let midi = window_start_midi(self.base_octave) + i32::from(offset) + self.shift();
        u8::try_from(midi).ok().filter(|midi| *midi <= MIDI_MAX)
    }

    pub fn windows(&self) -> Vec<KeyWindow> {
        [self.base_octave - 2, self.base_octave, self.base_octave + 2]
            .into_iter()
            .map(|base_octave| {
                let live = base_octave == self.base_octave;
                KeyWindow {
                    base_octave,
                    live,
                    keys: generate_keys(base_octave, live),
                }
            })
            .filter(|window| !window.keys.is_empty())
            .collect()
    }
}

impl Default for KeyboardMapper {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_OCTAVE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_keys_starts_at_base_c() {
        let keys = generate_keys(4, true);
        assert_eq!(keys.len(), 24);
        assert_eq!(keys[0].note.midi, 60);
        assert_eq!(keys[0].key, Some(KeyCode::KeyZ));
        assert_eq!(keys[23].note.midi, 83);
        assert!(keys[1].is_black);
        assert!(generate_keys(4, false).iter().all(|k| k.key.is_none()));
    }

    #[test]
    fn resolve_applies_base_and_shift() {
        let mut mapper = KeyboardMapper::new(4);
        assert_eq!(mapper.resolve(KeyCode::KeyZ), Some(60));
        assert_eq!(mapper.resolve(KeyCode::KeyQ), Some(72));
        assert_eq!(mapper.resolve(KeyCode::Enter), None);

        mapper.set_shift(ShiftDirection::Up, true);
        assert_eq!(mapper.resolve(KeyCode::KeyZ), Some(84));
        mapper.set_shift(ShiftDirection::Up, false);
        mapper.set_shift(ShiftDirection::Down, true);
        assert_eq!(mapper.resolve(KeyCode::KeyZ), Some(36));
    }

    #[test]
    fn octave_nudge_is_clamped() {
        let mut mapper = KeyboardMapper::new(7);
        assert!(!mapper.nudge_octave(1));
        assert_eq!(mapper.base_octave(), 7);
        assert!(mapper.nudge_octave(-1));
        assert_eq!(mapper.base_octave(), 6);
        assert_eq!(KeyboardMapper::new(0).base_octave(), MIN_BASE_OCTAVE);
    }

    #[test]
    fn shift_is_ignored_at_the_top() {
        let mut mapper = KeyboardMapper::new(7);
        assert!(!mapper.shift_allowed(ShiftDirection::Up));
        mapper.set_shift(ShiftDirection::Up, true);
        assert_eq!(mapper.resolve(KeyCode::KeyU), Some(119));
        for key in KeyCode::all() {
            if let Some(midi) = mapper.resolve(*key) {
                assert!(midi <= MIDI_MAX);
            }
        }
        assert!(KeyboardMapper::new(5).shift_allowed(ShiftDirection::Up));
        assert!(KeyboardMapper::new(1).shift_allowed(ShiftDirection::Down));
    }

    #[test]
    fn windows_drop_out_of_range_neighbours() {
        let windows = KeyboardMapper::new(4).windows();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows.iter().filter(|w| w.live).count(), 1);

        let top = KeyboardMapper::new(7).windows();
        let upper = top.last().unwrap();
        assert_eq!(upper.base_octave, 9);
        assert!(upper.keys.iter().all(|k| k.note.midi <= MIDI_MAX));
        assert_eq!(upper.keys.len(), 8);
    }

    #[test]
    fn key_codes_parse_from_text() {
        assert_eq!(KeyCode::from_code("z"), Some(KeyCode::KeyZ));
        assert_eq!(KeyCode::from_code("KeyQ"), Some(KeyCode::KeyQ));
        assert_eq!(KeyCode::from_code("2"), Some(KeyCode::Digit2));
        assert_eq!(KeyCode::from_code("enter"), Some(KeyCode::Enter));
        assert_eq!(KeyCode::from_code("shift"), Some(KeyCode::ShiftLeft));
        assert_eq!(KeyCode::from_code("k"), None);
        assert_eq!(KeyCode::Digit2.choice_index(), Some(1));
        assert_eq!(KeyCode::Digit2.note_offset(), Some(13));
    }
}

use std::sync::mpsc::{self, Receiver};

use anyhow::{anyhow, Context, Result};
use midir::{Ignore, MidiInput, MidiInputConnection};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MidiDevice {
    pub name: String,
}

pub struct MidiManager;

impl MidiManager {
    pub fn list_inputs() -> Result<Vec<MidiDevice>> {
        let input = MidiInput::new("ivory").context("create MIDI input client")?;
        Ok(input
            .ports()
            .iter()
            .map(|port| MidiDevice {
                name: input.port_name(port).unwrap_or_else(|_| "Unknown".into()),
            })
            .collect())
    }

    pub fn connect(name: &str) -> Result<(MidiInputConnection<()>, Receiver<Vec<u8>>)> {
        let mut input = MidiInput::new("ivory").context("create MIDI input client")?;
        input.ignore(Ignore::All);
        let port = input
            .ports()
            .into_iter()
            .find(|port| input.port_name(port).map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow!("MIDI port {name:?} not found"))?;
        let (tx, rx) = mpsc::channel();
        let connection = input
            .connect(
                &port,
                "ivory-input",
                move |_stamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )
            .map_err(|err| anyhow!("connect to MIDI port {name:?}: {err}"))?;
        info!(port = name, "MIDI input connected");
        Ok((connection, rx))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MidiNoteEvent {
    On { note: u8, velocity: u8 },
    Off { note: u8 },
}

impl MidiNoteEvent {
    /// Decodes note on/off on any channel; everything else is `None`.
    /// A note-on with zero velocity is a note-off.
    pub fn decode(message: &[u8]) -> Option<Self> {
        let (&status, data) = message.split_first()?;
        let &[note, velocity, ..] = data else {
            return None;
        };
        let note = note & 0x7F;
        match status & 0xF0 {
            0x90 if velocity & 0x7F > 0 => Some(MidiNoteEvent::On {
                note,
                velocity: velocity & 0x7F,
            }),
            0x90 | 0x80 => Some(MidiNoteEvent::Off { note }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_inputs_does_not_panic() {
        // MIDI input availability varies by environment; just ensure no panic.
        let _ = MidiManager::list_inputs();
    }

    #[test]
    fn decodes_note_messages() {
        assert_eq!(
            MidiNoteEvent::decode(&[0x90, 60, 100]),
            Some(MidiNoteEvent::On { note: 60, velocity: 100 })
        );
        assert_eq!(
            MidiNoteEvent::decode(&[0x93, 64, 0]),
            Some(MidiNoteEvent::Off { note: 64 })
        );
        assert_eq!(
            MidiNoteEvent::decode(&[0x80, 67, 40]),
            Some(MidiNoteEvent::Off { note: 67 })
        );
        assert_eq!(MidiNoteEvent::decode(&[0xB0, 64, 127]), None);
        assert_eq!(MidiNoteEvent::decode(&[0x90, 60]), None);
        assert_eq!(MidiNoteEvent::decode(&[]), None);
    }
}

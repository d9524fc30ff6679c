use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_VELOCITY: f32 = 0.8;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Velocity(f32);

impl Velocity {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn from_midi(value: u8) -> Self {
        Self::new(f32::from(value.min(127)) / 127.0)
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Velocity {
    fn default() -> Self {
        Self(DEFAULT_VELOCITY)
    }
}

/// Sound output for played notes. Calls are best-effort: implementations swallow
/// their own failures so input handling never depends on audio.
#[async_trait]
pub trait ToneEngine: Send {
    async fn initialize(&mut self);
    fn is_ready(&self) -> bool;
    fn play_note(&mut self, midi: u8, velocity: Option<Velocity>);
    fn stop_note(&mut self, midi: u8);
}

#[derive(Debug, Default)]
pub struct NullToneEngine {
    ready: bool,
}

impl NullToneEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToneEngine for NullToneEngine {
    async fn initialize(&mut self) {
        if !self.ready {
            debug!("initializing null tone engine");
            self.ready = true;
        }
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn play_note(&mut self, midi: u8, velocity: Option<Velocity>) {
        debug!(midi, velocity = ?velocity.map(Velocity::value), "note on");
    }

    fn stop_note(&mut self, midi: u8) {
        debug!(midi, "note off");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_is_clamped() {
        assert_eq!(Velocity::new(1.5).value(), 1.0);
        assert_eq!(Velocity::new(-0.2).value(), 0.0);
        assert_eq!(Velocity::new(f32::NAN), Velocity::default());
        assert_eq!(Velocity::from_midi(127).value(), 1.0);
        assert_eq!(Velocity::from_midi(0).value(), 0.0);
    }

    #[tokio::test]
    async fn initialize_is_idempotent() {
        let mut engine = NullToneEngine::new();
        assert!(!engine.is_ready());
        engine.initialize().await;
        engine.initialize().await;
        assert!(engine.is_ready());
        engine.play_note(60, None);
        engine.stop_note(60);
    }
}

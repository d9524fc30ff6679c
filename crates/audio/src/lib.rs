pub mod engine;

pub use engine::{NullToneEngine, ToneEngine, Velocity, DEFAULT_VELOCITY};

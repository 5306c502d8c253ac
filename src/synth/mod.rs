// Synthesis - drum voices rendered inside the audio callback

pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod params;
pub mod voice;
pub mod voice_manager;

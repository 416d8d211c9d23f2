//! Microphone capture constraints

/// Parameters requested from the microphone source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioConstraints {
    pub sample_rate: u32,
    pub channel_count: u16,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl AudioConstraints {
    /// True if any of the voice-processing toggles is on
    pub fn wants_voice_processing(&self) -> bool {
        self.echo_cancellation || self.noise_suppression || self.auto_gain_control
    }
}

impl Default for AudioConstraints {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            channel_count: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

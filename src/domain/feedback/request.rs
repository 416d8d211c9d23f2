//! Process-recording request body

use serde::Serialize;

use crate::domain::recording::{AudioFormat, AudioPayload};

/// JSON body posted to the feedback service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRecordingRequest {
    /// Base64 of the complete recording
    pub audio_data: String,
    /// Container identifier, always `webm` for this recorder
    pub audio_format: AudioFormat,
    /// Capture sample rate in Hz
    pub sample_rate: u32,
}

impl ProcessRecordingRequest {
    /// Build the request for a drained recording
    pub fn from_payload(payload: &AudioPayload, sample_rate: u32) -> Self {
        Self {
            audio_data: payload.to_base64(),
            audio_format: payload.format(),
            sample_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_names() {
        let payload = AudioPayload::new(vec![1, 2, 3, 4], AudioFormat::Webm);
        let request = ProcessRecordingRequest::from_payload(&payload, 8000);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "audioData": "AQIDBA==",
                "audioFormat": "webm",
                "sampleRate": 8000
            })
        );
    }
}

//! Encoded audio payload value object

use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Container format identifiers understood by the feedback service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Webm,
}

impl AudioFormat {
    /// Wire identifier sent as `audioFormat`
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
        }
    }

    /// Container MIME type
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The finished recording: every captured chunk concatenated in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    data: Vec<u8>,
    format: AudioFormat,
}

impl AudioPayload {
    /// Create a payload from raw container bytes
    pub fn new(data: Vec<u8>, format: AudioFormat) -> Self {
        Self { data, format }
    }

    /// Concatenate chunks in order into one payload
    pub fn concat<I>(chunks: I, format: AudioFormat) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let data = chunks.into_iter().fold(Vec::new(), |mut acc, chunk| {
            acc.extend_from_slice(&chunk);
            acc
        });
        Self { data, format }
    }

    /// Get the raw bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get the container format
    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// Size in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// True when nothing was captured
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes();
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }

    /// Encode the payload as standard base64
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_preserves_order() {
        let payload = AudioPayload::concat(vec![vec![1, 2], vec![3], vec![4, 5, 6]], AudioFormat::Webm);
        assert_eq!(payload.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(payload.size_bytes(), 6);
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        let payload = AudioPayload::concat(Vec::<Vec<u8>>::new(), AudioFormat::Webm);
        assert!(payload.is_empty());
        assert_eq!(payload.to_base64(), "");
    }

    #[test]
    fn human_readable_sizes() {
        assert_eq!(AudioPayload::new(vec![0u8; 500], AudioFormat::Webm).human_readable_size(), "500 B");
        assert_eq!(AudioPayload::new(vec![0u8; 2048], AudioFormat::Webm).human_readable_size(), "2.0 KB");
        assert_eq!(
            AudioPayload::new(vec![0u8; 2 * 1024 * 1024], AudioFormat::Webm).human_readable_size(),
            "2.0 MB"
        );
    }

    #[test]
    fn to_base64_is_standard_alphabet() {
        let payload = AudioPayload::new(vec![0xfb, 0xff, 0x00], AudioFormat::Webm);
        assert_eq!(payload.to_base64(), "+/8A");
    }

    #[test]
    fn format_identifiers() {
        assert_eq!(AudioFormat::Webm.as_str(), "webm");
        assert_eq!(AudioFormat::Webm.mime_type(), "audio/webm");
        assert_eq!(serde_json::to_string(&AudioFormat::Webm).unwrap(), "\"webm\"");
    }
}

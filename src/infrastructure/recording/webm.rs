//! Streaming WebM (Matroska) muxer for a single Opus track
//!
//! Output is meant to be concatenated: the first flush carries the EBML
//! header, an unknown-size Segment, Info and Tracks; every flush after that
//! carries whole Clusters only.

/// Matroska timecode scale: one tick per millisecond
const TIMECODE_SCALE_NS: u64 = 1_000_000;

/// Opus seek pre-roll (80 ms) in nanoseconds
const OPUS_SEEK_PRE_ROLL_NS: u64 = 80_000_000;

/// Opus in Matroska always declares 48 kHz
const OPUS_OUTPUT_RATE: f64 = 48_000.0;

/// Pre-skip is counted in 48 kHz samples
const OPUS_PRE_SKIP_RATE: u64 = 48_000;

const WRITING_APP: &str = concat!("presentation-practice ", env!("CARGO_PKG_VERSION"));

mod id {
    pub const EBML: u32 = 0x1A45_DFA3;
    pub const EBML_VERSION: u32 = 0x4286;
    pub const EBML_READ_VERSION: u32 = 0x42F7;
    pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
    pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
    pub const DOC_TYPE: u32 = 0x4282;
    pub const DOC_TYPE_VERSION: u32 = 0x4287;
    pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

    pub const SEGMENT: u32 = 0x1853_8067;
    pub const INFO: u32 = 0x1549_A966;
    pub const TIMECODE_SCALE: u32 = 0x2A_D7B1;
    pub const MUXING_APP: u32 = 0x4D80;
    pub const WRITING_APP: u32 = 0x5741;

    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const TRACK_ENTRY: u32 = 0xAE;
    pub const TRACK_NUMBER: u32 = 0xD7;
    pub const TRACK_UID: u32 = 0x73C5;
    pub const TRACK_TYPE: u32 = 0x83;
    pub const CODEC_ID: u32 = 0x86;
    pub const CODEC_PRIVATE: u32 = 0x63A2;
    pub const CODEC_DELAY: u32 = 0x56AA;
    pub const SEEK_PRE_ROLL: u32 = 0x56BB;
    pub const AUDIO: u32 = 0xE1;
    pub const SAMPLING_FREQUENCY: u32 = 0xB5;
    pub const CHANNELS: u32 = 0x9F;

    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const TIMECODE: u32 = 0xE7;
    pub const SIMPLE_BLOCK: u32 = 0xA3;
}

/// Segment size meaning "unknown, runs to end of stream"
const UNKNOWN_SIZE: [u8; 8] = [0x01, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];

/// Track number as a one-byte vint
const TRACK_NUMBER_VINT: u8 = 0x81;

/// SimpleBlock flags: keyframe
const KEYFRAME: u8 = 0x80;

/// Muxer for one Opus audio track
#[derive(Debug)]
pub struct WebmMuxer {
    channels: u8,
    input_sample_rate: u32,
    pre_skip: u16,
    header_written: bool,
    cluster_start_ms: Option<u64>,
    blocks: Vec<u8>,
    ready: Vec<u8>,
}

impl WebmMuxer {
    /// `pre_skip` is the encoder delay in 48 kHz samples; it lands in both
    /// the OpusHead and the track's CodecDelay.
    pub fn new(channels: u8, input_sample_rate: u32, pre_skip: u16) -> Self {
        Self {
            channels,
            input_sample_rate,
            pre_skip,
            header_written: false,
            cluster_start_ms: None,
            blocks: Vec::new(),
            ready: Vec::new(),
        }
    }

    /// Queue one encoded Opus packet at the given presentation time
    pub fn push_frame(&mut self, timestamp_ms: u64, packet: &[u8]) {
        let start = match self.cluster_start_ms {
            Some(start) if timestamp_ms.saturating_sub(start) <= i16::MAX as u64 => start,
            Some(_) => {
                self.close_cluster();
                self.cluster_start_ms = Some(timestamp_ms);
                timestamp_ms
            }
            None => {
                self.cluster_start_ms = Some(timestamp_ms);
                timestamp_ms
            }
        };

        let relative = (timestamp_ms - start) as i16;
        let mut block = Vec::with_capacity(4 + packet.len());
        block.push(TRACK_NUMBER_VINT);
        block.extend_from_slice(&relative.to_be_bytes());
        block.push(KEYFRAME);
        block.extend_from_slice(packet);
        write_element(&mut self.blocks, id::SIMPLE_BLOCK, &block);
    }

    /// Everything muxed since the last flush. The first call always
    /// includes the stream header, even with no frames queued.
    pub fn flush(&mut self) -> Vec<u8> {
        self.close_cluster();

        let mut out = Vec::new();
        if !self.header_written {
            out = self.header();
            self.header_written = true;
        }
        out.append(&mut self.ready);
        out
    }

    fn close_cluster(&mut self) {
        let Some(start) = self.cluster_start_ms.take() else {
            return;
        };

        let mut body = Vec::with_capacity(self.blocks.len() + 10);
        write_uint(&mut body, id::TIMECODE, start);
        body.append(&mut self.blocks);
        write_element(&mut self.ready, id::CLUSTER, &body);
    }

    fn header(&self) -> Vec<u8> {
        let mut ebml = Vec::new();
        write_uint(&mut ebml, id::EBML_VERSION, 1);
        write_uint(&mut ebml, id::EBML_READ_VERSION, 1);
        write_uint(&mut ebml, id::EBML_MAX_ID_LENGTH, 4);
        write_uint(&mut ebml, id::EBML_MAX_SIZE_LENGTH, 8);
        write_string(&mut ebml, id::DOC_TYPE, "webm");
        write_uint(&mut ebml, id::DOC_TYPE_VERSION, 4);
        write_uint(&mut ebml, id::DOC_TYPE_READ_VERSION, 2);

        let mut info = Vec::new();
        write_uint(&mut info, id::TIMECODE_SCALE, TIMECODE_SCALE_NS);
        write_string(&mut info, id::MUXING_APP, WRITING_APP);
        write_string(&mut info, id::WRITING_APP, WRITING_APP);

        let mut audio = Vec::new();
        write_float(&mut audio, id::SAMPLING_FREQUENCY, OPUS_OUTPUT_RATE);
        write_uint(&mut audio, id::CHANNELS, u64::from(self.channels));

        let mut entry = Vec::new();
        write_uint(&mut entry, id::TRACK_NUMBER, 1);
        write_uint(&mut entry, id::TRACK_UID, 1);
        write_uint(&mut entry, id::TRACK_TYPE, 2);
        write_string(&mut entry, id::CODEC_ID, "A_OPUS");
        write_element(
            &mut entry,
            id::CODEC_PRIVATE,
            &opus_head(self.channels, self.input_sample_rate, self.pre_skip),
        );
        write_uint(&mut entry, id::CODEC_DELAY, self.codec_delay_ns());
        write_uint(&mut entry, id::SEEK_PRE_ROLL, OPUS_SEEK_PRE_ROLL_NS);
        write_element(&mut entry, id::AUDIO, &audio);

        let mut tracks = Vec::new();
        write_element(&mut tracks, id::TRACK_ENTRY, &entry);

        let mut out = Vec::new();
        write_element(&mut out, id::EBML, &ebml);
        write_id(&mut out, id::SEGMENT);
        out.extend_from_slice(&UNKNOWN_SIZE);
        write_element(&mut out, id::INFO, &info);
        write_element(&mut out, id::TRACKS, &tracks);
        out
    }

    fn codec_delay_ns(&self) -> u64 {
        u64::from(self.pre_skip) * 1_000_000_000 / OPUS_PRE_SKIP_RATE
    }
}

/// Opus identification header used as CodecPrivate
fn opus_head(channels: u8, input_sample_rate: u32, pre_skip: u16) -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&input_sample_rate.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // mapping family
    head
}

fn write_id(buf: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(3);
    buf.extend_from_slice(&bytes[skip..]);
}

/// Element data size as the shortest EBML vint
fn write_size(buf: &mut Vec<u8>, size: u64) {
    let len = (1..=8u32)
        .find(|&len| size < (1u64 << (7 * len)) - 1)
        .unwrap_or(8);
    let marked = size | (1u64 << (7 * len));
    buf.extend_from_slice(&marked.to_be_bytes()[(8 - len as usize)..]);
}

fn write_element(buf: &mut Vec<u8>, id: u32, payload: &[u8]) {
    write_id(buf, id);
    write_size(buf, payload.len() as u64);
    buf.extend_from_slice(payload);
}

fn write_uint(buf: &mut Vec<u8>, id: u32, value: u64) {
    let bytes = value.to_be_bytes();
    let skip = bytes.iter().take_while(|&&b| b == 0).count().min(7);
    write_element(buf, id, &bytes[skip..]);
}

fn write_float(buf: &mut Vec<u8>, id: u32, value: f64) {
    write_element(buf, id, &value.to_be_bytes());
}

fn write_string(buf: &mut Vec<u8>, id: u32, value: &str) {
    write_element(buf, id, value.as_bytes());
}

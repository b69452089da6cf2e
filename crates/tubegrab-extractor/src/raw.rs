//! Raw resolver output before normalization.
//!
//! Resolvers come in two shapes. [`RawStreams::Native`] is a flat list where
//! every format already carries a native itag and a direct URL.
//! [`RawStreams::Split`] is one audio stream plus an array of video streams
//! without identifiers.

/// Video metadata as reported by a resolver.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawVideoDetails {
    pub title: String,
    /// Smallest first; the last entry is used as the thumbnail.
    pub thumbnails: Vec<String>,
    pub length_secs: u64,
    pub author: String,
    pub view_count: u64,
}

/// A format carrying a native itag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeFormat {
    pub itag: u32,
    pub url: String,
    pub quality_label: Option<String>,
    pub height: Option<u32>,
    pub audio_bitrate: Option<u32>,
    pub mime_type: Option<String>,
    pub content_length: Option<u64>,
    pub has_audio: bool,
    pub has_video: bool,
    pub container: String,
}

/// A stream reference from a resolver without native identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitStream {
    pub url: String,
    pub quality_label: Option<String>,
    pub mime_type: Option<String>,
    pub content_length: Option<u64>,
    /// kbps
    pub bitrate: Option<u32>,
    /// Only meaningful for video streams; muxed streams carry audio too.
    pub has_audio: bool,
    pub container: Option<String>,
}

/// Stream listing in one of the two resolver shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawStreams {
    Native(Vec<NativeFormat>),
    Split {
        audio: Option<SplitStream>,
        video: Vec<SplitStream>,
    },
}

impl RawStreams {
    /// Total number of selectable streams.
    pub fn len(&self) -> usize {
        match self {
            RawStreams::Native(formats) => formats.len(),
            RawStreams::Split { audio, video } => video.len() + usize::from(audio.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Label for logs.
    pub fn shape(&self) -> &'static str {
        match self {
            RawStreams::Native(_) => "native",
            RawStreams::Split { .. } => "split",
        }
    }
}

/// Everything one resolution produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResolution {
    pub details: RawVideoDetails,
    pub streams: RawStreams,
}

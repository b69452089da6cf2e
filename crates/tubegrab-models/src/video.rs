//! Video summary and format descriptor models.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One selectable quality/container combination of a video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatDescriptor {
    /// Unique within one [`VideoSummary`]; see [`crate::itag`].
    pub itag: u32,
    /// e.g. `1080p` or `128kbps`
    pub quality: String,
    /// Mime family, e.g. `video/mp4`
    pub format: String,
    /// `N MB` or `Unknown`
    pub size: String,
    pub has_audio: bool,
    pub has_video: bool,
    /// Container extension, e.g. `mp4`
    pub container: String,
    /// Direct media URL, only when the resolver exposes a pre-resolved link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl FormatDescriptor {
    /// Audio without a video track.
    pub fn is_audio_only(&self) -> bool {
        self.has_audio && !self.has_video
    }
}

/// Normalized video metadata returned by the info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub title: String,
    pub thumbnail: String,
    /// `HH:MM:SS` or `MM:SS`
    pub duration: String,
    pub author: String,
    /// Grouped with `,`
    pub view_count: String,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

impl VideoSummary {
    /// Keep at most `max` formats.
    pub fn truncate_formats(&mut self, max: usize) {
        self.formats.truncate(max);
    }

    /// Check the list invariants: unique itags, every format carries audio or video.
    pub fn formats_are_consistent(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.formats.len());
        self.formats
            .iter()
            .all(|f| (f.has_audio || f.has_video) && seen.insert(f.itag))
    }
}

/// Stable partition: formats with video first, resolver order kept within each group.
pub fn order_video_first(formats: &mut [FormatDescriptor]) {
    formats.sort_by_key(|f| !f.has_video);
}

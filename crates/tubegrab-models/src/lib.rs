//! Shared data models for the tubegrab backend.
//!
//! This crate provides:
//! - Serde wire types for the info endpoint (video summary, format descriptors)
//! - The itag partition shared by the info and download endpoints
//! - YouTube URL parsing and normalization
//! - Display formatting for durations, view counts and sizes

pub mod display;
pub mod itag;
pub mod utils;
pub mod video;

// Re-export common types
pub use display::{format_duration, format_size, format_view_count, mime_family, quality_label};
pub use itag::{ItagKind, SYNTHETIC_AUDIO_ITAG, SYNTHETIC_VIDEO_BASE};
pub use utils::{
    canonical_watch_url, extract_youtube_id, is_youtube_url, normalize_youtube_url,
    YoutubeUrlError, YoutubeUrlResult,
};
pub use video::{order_video_first, FormatDescriptor, VideoSummary};

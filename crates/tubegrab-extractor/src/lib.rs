//! YouTube stream resolution.
//!
//! This crate provides:
//! - The [`StreamResolver`] trait wrapping an external resolver
//! - A yt-dlp backend (native itags) and a Piped backend (split streams)
//! - Format selection with collision-free itags and its inverse
//! - The [`ExtractorAdapter`] endpoints use to resolve and locate streams

pub mod adapter;
pub mod error;
pub mod piped;
pub mod raw;
pub mod resolver;
pub mod selector;
pub mod ytdlp;

pub use adapter::{ExtractorAdapter, LocatedStream};
pub use error::{ExtractError, ExtractResult};
pub use piped::PipedResolver;
pub use raw::{NativeFormat, RawResolution, RawStreams, RawVideoDetails, SplitStream};
pub use resolver::StreamResolver;
pub use selector::{describe, select, SelectedStream};
pub use ytdlp::YtDlpResolver;

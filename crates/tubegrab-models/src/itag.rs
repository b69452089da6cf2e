//! Itag partitioning.
//!
//! Native itags supplied by the resolver are always below
//! [`SYNTHETIC_VIDEO_BASE`]. Resolvers without native identifiers get
//! positional ids: video stream `i` becomes `1000 + i`, the single audio
//! stream becomes [`SYNTHETIC_AUDIO_ITAG`].

/// First synthesized video itag.
pub const SYNTHETIC_VIDEO_BASE: u32 = 1000;

/// Itag of the synthesized audio-only format.
pub const SYNTHETIC_AUDIO_ITAG: u32 = 2000;

/// What an itag refers to once classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItagKind {
    /// Resolver-native identifier, matched exactly.
    Native(u32),
    /// Position in the resolver's video stream array.
    VideoIndex(usize),
    /// The single audio-only stream.
    Audio,
}

impl ItagKind {
    /// Classify an itag according to the numeric partition.
    pub fn classify(itag: u32) -> Self {
        if itag >= SYNTHETIC_AUDIO_ITAG {
            ItagKind::Audio
        } else if itag >= SYNTHETIC_VIDEO_BASE {
            ItagKind::VideoIndex((itag - SYNTHETIC_VIDEO_BASE) as usize)
        } else {
            ItagKind::Native(itag)
        }
    }
}

/// Synthesize the itag for the video stream at `index`.
///
/// Returns `None` once the index would spill into the audio range.
pub fn synthetic_video_itag(index: usize) -> Option<u32> {
    let index = u32::try_from(index).ok()?;
    let itag = SYNTHETIC_VIDEO_BASE.checked_add(index)?;
    (itag < SYNTHETIC_AUDIO_ITAG).then_some(itag)
}

/// Whether a native itag fits below the synthesized range.
pub fn is_native_itag(itag: u32) -> bool {
    itag < SYNTHETIC_VIDEO_BASE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(ItagKind::classify(22), ItagKind::Native(22));
        assert_eq!(ItagKind::classify(999), ItagKind::Native(999));
        assert_eq!(ItagKind::classify(1000), ItagKind::VideoIndex(0));
        assert_eq!(ItagKind::classify(1005), ItagKind::VideoIndex(5));
        assert_eq!(ItagKind::classify(1999), ItagKind::VideoIndex(999));
        assert_eq!(ItagKind::classify(2000), ItagKind::Audio);
        assert_eq!(ItagKind::classify(4242), ItagKind::Audio);
    }

    #[test]
    fn test_synthetic_video_itag_inverts_classify() {
        for index in [0usize, 1, 7, 999] {
            let itag = synthetic_video_itag(index).unwrap();
            assert_eq!(ItagKind::classify(itag), ItagKind::VideoIndex(index));
        }
        assert_eq!(synthetic_video_itag(1000), None);
    }
}

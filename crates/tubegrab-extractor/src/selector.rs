//! Format selection and itag mapping.
//!
//! [`describe`] turns raw streams into format descriptors with collision-free
//! itags; [`select`] inverts the same mapping on a fresh resolution.

use std::collections::HashSet;

use tracing::debug;
use tubegrab_models::itag::{is_native_itag, synthetic_video_itag};
use tubegrab_models::{
    format_size, mime_family, quality_label, FormatDescriptor, ItagKind, SYNTHETIC_AUDIO_ITAG,
};

use crate::error::{ExtractError, ExtractResult};
use crate::raw::{NativeFormat, RawStreams, SplitStream};

/// Container used when a split stream does not name one.
const DEFAULT_CONTAINER: &str = "mp4";

/// A stream located for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStream {
    pub itag: u32,
    pub url: String,
    pub mime_type: Option<String>,
    pub container: String,
    pub content_length: Option<u64>,
    pub has_video: bool,
}

/// Build format descriptors in resolver order.
pub fn describe(streams: &RawStreams) -> Vec<FormatDescriptor> {
    match streams {
        RawStreams::Native(formats) => describe_native(formats),
        RawStreams::Split { audio, video } => describe_split(audio.as_ref(), video),
    }
}

fn describe_native(formats: &[NativeFormat]) -> Vec<FormatDescriptor> {
    let mut seen = HashSet::with_capacity(formats.len());
    let mut descriptors = Vec::with_capacity(formats.len());

    for format in formats {
        if !format.has_audio && !format.has_video {
            continue;
        }
        if !is_native_itag(format.itag) {
            debug!(itag = format.itag, "Skipping native itag outside the native range");
            continue;
        }
        if !seen.insert(format.itag) {
            debug!(itag = format.itag, "Skipping duplicate native itag");
            continue;
        }

        descriptors.push(FormatDescriptor {
            itag: format.itag,
            quality: quality_label(
                format.quality_label.as_deref(),
                format.height,
                format.audio_bitrate,
            ),
            format: mime_family(format.mime_type.as_deref()),
            size: format_size(format.content_length),
            has_audio: format.has_audio,
            has_video: format.has_video,
            container: format.container.clone(),
            url: Some(format.url.clone()),
        });
    }

    descriptors
}

fn describe_split(audio: Option<&SplitStream>, video: &[SplitStream]) -> Vec<FormatDescriptor> {
    let mut descriptors = Vec::with_capacity(video.len() + 1);

    for (index, stream) in video.iter().enumerate() {
        let Some(itag) = synthetic_video_itag(index) else {
            debug!(index, "Video stream index exceeds the synthesized itag range");
            break;
        };
        descriptors.push(split_descriptor(stream, itag, stream.has_audio, true));
    }

    if let Some(stream) = audio {
        descriptors.push(split_descriptor(stream, SYNTHETIC_AUDIO_ITAG, true, false));
    }

    descriptors
}

fn split_descriptor(
    stream: &SplitStream,
    itag: u32,
    has_audio: bool,
    has_video: bool,
) -> FormatDescriptor {
    FormatDescriptor {
        itag,
        quality: quality_label(stream.quality_label.as_deref(), None, stream.bitrate),
        format: mime_family(stream.mime_type.as_deref()),
        size: format_size(stream.content_length),
        has_audio,
        has_video,
        container: split_container(stream),
        // Positional ids are re-resolved at download time.
        url: None,
    }
}

fn split_container(stream: &SplitStream) -> String {
    stream
        .container
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTAINER.to_string())
}

/// Locate the stream an itag refers to in a fresh resolution.
pub fn select(streams: &RawStreams, itag: u32) -> ExtractResult<SelectedStream> {
    match (streams, ItagKind::classify(itag)) {
        (RawStreams::Native(formats), ItagKind::Native(native)) => {
            let format = formats
                .iter()
                .find(|f| f.itag == native)
                .ok_or_else(|| ExtractError::format_not_found(format!("itag {} not offered", native)))?;
            Ok(SelectedStream {
                itag,
                url: non_empty_url(&format.url)?,
                mime_type: format.mime_type.clone(),
                container: format.container.clone(),
                content_length: format.content_length,
                has_video: format.has_video,
            })
        }
        (RawStreams::Split { video, .. }, ItagKind::VideoIndex(index)) => {
            let stream = video.get(index).ok_or_else(|| {
                ExtractError::format_not_found(format!(
                    "video stream {} requested but only {} available",
                    index,
                    video.len()
                ))
            })?;
            split_selection(stream, itag, true)
        }
        (RawStreams::Split { audio, .. }, ItagKind::Audio) => {
            let stream = audio
                .as_ref()
                .ok_or_else(|| ExtractError::format_not_found("No audio stream available"))?;
            split_selection(stream, itag, false)
        }
        (streams, _) => Err(ExtractError::format_not_found(format!(
            "itag {} is not valid for a {} resolver",
            itag,
            streams.shape()
        ))),
    }
}

fn split_selection(stream: &SplitStream, itag: u32, has_video: bool) -> ExtractResult<SelectedStream> {
    Ok(SelectedStream {
        itag,
        url: non_empty_url(&stream.url)?,
        mime_type: stream.mime_type.clone(),
        container: split_container(stream),
        content_length: stream.content_length,
        has_video,
    })
}

fn non_empty_url(url: &str) -> ExtractResult<String> {
    if url.trim().is_empty() {
        Err(ExtractError::format_not_found("Stream URL not available"))
    } else {
        Ok(url.to_string())
    }
}

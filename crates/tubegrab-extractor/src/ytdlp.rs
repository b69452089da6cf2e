//! Resolver backed by the yt-dlp CLI.
//!
//! Runs `yt-dlp --dump-json` once per resolution and maps its format list to
//! the native shape: YouTube format ids are the platform's numeric itags and
//! every progressive format carries a direct, signed URL.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};
use tubegrab_models::itag::is_native_itag;

use crate::error::{ExtractError, ExtractResult};
use crate::raw::{NativeFormat, RawResolution, RawStreams, RawVideoDetails};
use crate::resolver::StreamResolver;

/// Protocols that can be fetched with a single GET.
const DIRECT_PROTOCOLS: &[&str] = &["https", "http"];

/// yt-dlp `--dump-json` output (fields we use).
#[derive(Debug, Deserialize)]
struct YtDlpVideo {
    #[serde(default)]
    title: String,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<YtDlpThumbnail>,
    duration: Option<f64>,
    uploader: Option<String>,
    channel: Option<String>,
    view_count: Option<u64>,
    #[serde(default)]
    formats: Vec<YtDlpFormat>,
}

#[derive(Debug, Deserialize)]
struct YtDlpThumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct YtDlpFormat {
    format_id: String,
    url: Option<String>,
    ext: Option<String>,
    vcodec: Option<String>,
    acodec: Option<String>,
    format_note: Option<String>,
    height: Option<u32>,
    abr: Option<f64>,
    filesize: Option<u64>,
    filesize_approx: Option<u64>,
    protocol: Option<String>,
}

/// Resolver that shells out to yt-dlp.
pub struct YtDlpResolver {
    binary: PathBuf,
    cookies: Option<PathBuf>,
}

impl YtDlpResolver {
    /// Create a resolver, locating yt-dlp on `PATH` when no binary is given.
    pub fn new(binary: Option<PathBuf>, cookies: Option<PathBuf>) -> ExtractResult<Self> {
        let binary = match binary {
            Some(path) => path,
            None => which::which("yt-dlp")
                .map_err(|_| ExtractError::ResolverNotFound("yt-dlp".to_string()))?,
        };

        info!("Using yt-dlp at {}", binary.display());
        if let Some(path) = &cookies {
            info!("Passing cookies file {} to yt-dlp", path.display());
        }

        Ok(Self { binary, cookies })
    }

    /// Path of the yt-dlp binary in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    async fn dump_json(&self, url: &str) -> ExtractResult<RawResolution> {
        debug!(url = %url, "Running yt-dlp --dump-json");

        let mut command = Command::new(&self.binary);
        command
            .arg("--dump-json")
            .arg("--no-download")
            .arg("--no-warnings")
            .arg("--no-playlist");
        if let Some(cookies) = &self.cookies {
            command.arg("--cookies").arg(cookies);
        }

        // A dropped request future must not leave yt-dlp running.
        let output = command
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            let diagnostic = last_error_line(&stderr)
                .map(str::to_string)
                .unwrap_or_else(|| format!("yt-dlp exited with {}", output.status));
            warn!(url = %url, diagnostic = %diagnostic, "yt-dlp resolution failed");
            return Err(ExtractError::classify(diagnostic));
        }

        parse_dump(&String::from_utf8_lossy(&output.stdout))
    }
}

#[async_trait]
impl StreamResolver for YtDlpResolver {
    fn id(&self) -> &'static str {
        "ytdlp"
    }

    async fn fetch_info(&self, url: &str) -> ExtractResult<RawVideoDetails> {
        Ok(self.dump_json(url).await?.details)
    }

    async fn fetch_streams(&self, url: &str) -> ExtractResult<RawStreams> {
        Ok(self.dump_json(url).await?.streams)
    }

    async fn resolve_raw(&self, url: &str) -> ExtractResult<RawResolution> {
        self.dump_json(url).await
    }

    async fn health_check(&self) -> ExtractResult<()> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ExtractError::unavailable(format!(
                "yt-dlp --version exited with {}",
                output.status
            )))
        }
    }
}

/// The last `ERROR:` line, else the last non-empty line.
fn last_error_line(stderr: &str) -> Option<&str> {
    let mut lines = stderr.lines().map(str::trim).filter(|l| !l.is_empty());
    let last = lines.clone().last();
    lines.filter(|l| l.starts_with("ERROR")).last().or(last)
}

/// Parse `--dump-json` output into the native shape.
pub(crate) fn parse_dump(json: &str) -> ExtractResult<RawResolution> {
    let video: YtDlpVideo = serde_json::from_str(json.trim())?;

    let mut thumbnails: Vec<String> = video.thumbnails.into_iter().map(|t| t.url).collect();
    // yt-dlp's `thumbnail` is its preferred pick; keep it last.
    if let Some(best) = video.thumbnail {
        thumbnails.retain(|t| t != &best);
        thumbnails.push(best);
    }

    let details = RawVideoDetails {
        title: video.title,
        thumbnails,
        length_secs: video.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
        author: video.uploader.or(video.channel).unwrap_or_default(),
        view_count: video.view_count.unwrap_or(0),
    };

    let formats = video
        .formats
        .into_iter()
        .filter_map(native_format)
        .collect();

    Ok(RawResolution {
        details,
        streams: RawStreams::Native(formats),
    })
}

fn native_format(format: YtDlpFormat) -> Option<NativeFormat> {
    let itag: u32 = format.format_id.parse().ok()?;
    if !is_native_itag(itag) {
        return None;
    }

    let protocol = format.protocol.as_deref().unwrap_or("https");
    if !DIRECT_PROTOCOLS.contains(&protocol) {
        return None;
    }

    let url = format.url.filter(|u| !u.is_empty())?;
    let has_video = has_codec(format.vcodec.as_deref());
    let has_audio = has_codec(format.acodec.as_deref());
    if !has_video && !has_audio {
        return None;
    }

    let container = format.ext.unwrap_or_else(|| "mp4".to_string());
    let mime_type = Some(mime_for(&container, has_video));

    Some(NativeFormat {
        itag,
        url,
        quality_label: if has_video { format.format_note } else { None },
        height: format.height,
        audio_bitrate: format.abr.map(|abr| abr.round() as u32),
        mime_type,
        content_length: format.filesize.or(format.filesize_approx),
        has_audio,
        has_video,
        container,
    })
}

fn has_codec(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.is_empty() && c != "none")
}

fn mime_for(ext: &str, has_video: bool) -> String {
    match (ext, has_video) {
        ("m4a", _) => "audio/mp4".to_string(),
        (ext, true) => format!("video/{}", ext),
        (ext, false) => format!("audio/{}", ext),
    }
}

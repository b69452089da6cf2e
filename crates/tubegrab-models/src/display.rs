//! Human-readable formatting for summary fields.

/// Bytes per reported megabyte.
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Format a length in seconds as `HH:MM:SS`, or `MM:SS` under one hour.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Format a view count with `,` thousands grouping.
pub fn format_view_count(views: u64) -> String {
    let digits = views.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    grouped
}

/// Approximate size in whole megabytes, or `Unknown`.
pub fn format_size(bytes: Option<u64>) -> String {
    match bytes {
        Some(bytes) if bytes > 0 => format!("{} MB", (bytes as f64 / BYTES_PER_MB).round() as u64),
        _ => "Unknown".to_string(),
    }
}

/// The mime type without codec parameters (`video/mp4; codecs=".."` -> `video/mp4`).
pub fn mime_family(mime_type: Option<&str>) -> String {
    mime_type
        .and_then(|m| m.split(';').next())
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// Container extension derived from a mime type (`audio/webm` -> `webm`).
pub fn container_from_mime(mime_type: Option<&str>) -> Option<String> {
    let family = mime_family(mime_type);
    let (_, subtype) = family.split_once('/')?;
    let subtype = subtype.trim();
    (!subtype.is_empty()).then(|| subtype.to_ascii_lowercase())
}

/// Pick a quality label: explicit label, then height, then audio bitrate.
pub fn quality_label(
    label: Option<&str>,
    height: Option<u32>,
    audio_kbps: Option<u32>,
) -> String {
    if let Some(label) = label.map(str::trim).filter(|l| !l.is_empty()) {
        return label.to_string();
    }
    if let Some(height) = height.filter(|h| *h > 0) {
        return format!("{}p", height);
    }
    if let Some(kbps) = audio_kbps.filter(|k| *k > 0) {
        return format!("{}kbps", kbps);
    }
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(212), "03:32");
        assert_eq!(format_duration(3599), "59:59");
        assert_eq!(format_duration(3600), "01:00:00");
        assert_eq!(format_duration(90061), "25:01:01");
    }

    #[test]
    fn test_format_view_count() {
        assert_eq!(format_view_count(0), "0");
        assert_eq!(format_view_count(999), "999");
        assert_eq!(format_view_count(1000), "1,000");
        assert_eq!(format_view_count(1234567), "1,234,567");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "Unknown");
        assert_eq!(format_size(Some(0)), "Unknown");
        assert_eq!(format_size(Some(44_040_192)), "42 MB");
        assert_eq!(format_size(Some(700_000)), "1 MB");
    }

    #[test]
    fn test_mime_helpers() {
        assert_eq!(mime_family(Some("video/mp4; codecs=\"avc1.64001F\"")), "video/mp4");
        assert_eq!(mime_family(None), "unknown");
        assert_eq!(container_from_mime(Some("audio/webm; codecs=\"opus\"")).as_deref(), Some("webm"));
        assert_eq!(container_from_mime(Some("garbage")), None);
    }

    #[test]
    fn test_quality_label_fallbacks() {
        assert_eq!(quality_label(Some("1080p60"), Some(1080), None), "1080p60");
        assert_eq!(quality_label(None, Some(720), None), "720p");
        assert_eq!(quality_label(Some(" "), None, Some(128)), "128kbps");
        assert_eq!(quality_label(None, None, None), "unknown");
    }
}

//! Container/codec negotiation.

/// Formats to try, most preferred first
pub const PREFERRED_FORMATS: &[&str] = &[
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm;codecs=vp9",
    "video/webm;codecs=vp8",
    "video/webm",
    "video/mp4",
];

/// Used when neither negotiation nor the recorder names a type
pub const DEFAULT_MIME_TYPE: &str = "video/webm";

/// Pick the first candidate the predicate accepts
///
/// `None` means "unspecified": the recorder is still constructed and chooses
/// its own format.
pub fn select_format<S, F>(candidates: &[S], is_supported: F) -> Option<String>
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    candidates
        .iter()
        .map(|candidate| candidate.as_ref())
        .find(|candidate| is_supported(candidate))
        .map(str::to_string)
}

/// File extension matching a mime type's container
pub fn extension_for(mime_type: &str) -> &'static str {
    let container = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match container.as_str() {
        "video/mp4" | "audio/mp4" => "mp4",
        "video/x-matroska" => "mkv",
        _ => "webm",
    }
}
